use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    Incident,
    Defect,
    Bug,
    Other(String),
}

impl IssueType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "故障" => IssueType::Incident,
            "缺陷" => IssueType::Defect,
            "Bug" | "bug" => IssueType::Bug,
            other => IssueType::Other(other.to_string()),
        }
    }

    /// Incidents, defects and bugs all count as bugs in the reports.
    pub fn is_bug(&self) -> bool {
        matches!(self, IssueType::Incident | IssueType::Defect | IssueType::Bug)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueStatus {
    Done,
    Todo,
    InProgress,
    Suspended,
    Reopened,
    Other(String),
}

impl IssueStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "完成" => IssueStatus::Done,
            "待办" => IssueStatus::Todo,
            "处理中" => IssueStatus::InProgress,
            "挂起中" => IssueStatus::Suspended,
            "重新打开" => IssueStatus::Reopened,
            other => IssueStatus::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            IssueStatus::Done => "完成",
            IssueStatus::Todo => "待办",
            IssueStatus::InProgress => "处理中",
            IssueStatus::Suspended => "挂起中",
            IssueStatus::Reopened => "重新打开",
            IssueStatus::Other(raw) => raw,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, IssueStatus::Done)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityTier {
    P0,
    P1,
    P2,
    P3,
}

impl SeverityTier {
    pub const ALL: [SeverityTier; 4] = [SeverityTier::P0, SeverityTier::P1, SeverityTier::P2, SeverityTier::P3];

    pub fn code(&self) -> &'static str {
        match self {
            SeverityTier::P0 => "P0",
            SeverityTier::P1 => "P1",
            SeverityTier::P2 => "P2",
            SeverityTier::P3 => "P3",
        }
    }
}

/// Tracker severity: the free-text label it was exported with, e.g.
/// `P0（阻塞性问题）`, and the tier found in it. Labels without a tier are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Severity {
    pub tier: Option<SeverityTier>,
    pub label: String,
}

impl Severity {
    /// `None` only for a blank cell.
    pub fn parse(raw: &str) -> Option<Self> {
        let label = raw.trim();
        if label.is_empty() {
            return None;
        }
        let tier = SeverityTier::ALL.iter().copied().find(|tier| label.contains(tier.code()));
        Some(Severity { tier, label: label.to_string() })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub issue_type: IssueType,
    pub summary: String,
    pub description: String,
    pub creation_date: Option<NaiveDate>,
    pub status: IssueStatus,
    pub severity: Option<Severity>,
    pub customer_name: Option<String>,
    pub discovery_environment: Option<String>,
    pub defect_types: Vec<String>,
    pub root_cause: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    pub solution: Option<String>,
}

impl IssueRecord {
    pub fn has_tier(&self, tier: SeverityTier) -> bool {
        self.severity.as_ref().is_some_and(|s| s.tier == Some(tier))
    }

    /// Summary, description and customer name joined into the single string
    /// the reconciler searches.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {}",
            self.summary,
            self.description,
            self.customer_name.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tracker_labels() {
        assert_eq!(IssueType::parse("故障"), IssueType::Incident);
        assert_eq!(IssueType::parse("bug"), IssueType::Bug);
        assert!(!IssueType::parse("需求").is_bug());
        assert_eq!(IssueStatus::parse("挂起中"), IssueStatus::Suspended);
        assert_eq!(IssueStatus::parse("已关闭").label(), "已关闭");
    }

    #[test]
    fn severity_keeps_label_and_tier() {
        let sev = Severity::parse("P1（核心功能问题）").expect("tier");
        assert_eq!(sev.tier, Some(SeverityTier::P1));
        assert_eq!(sev.label, "P1（核心功能问题）");

        let urgent = Severity::parse(" 紧急 ").expect("label");
        assert_eq!(urgent.tier, None);
        assert_eq!(urgent.label, "紧急");
        assert!(Severity::parse("  ").is_none());
    }

    #[test]
    fn searchable_text_tolerates_missing_customer() {
        let issue = IssueRecord {
            issue_type: IssueType::Incident,
            summary: "滴滴登录失败".to_string(),
            description: "同步异常".to_string(),
            creation_date: None,
            status: IssueStatus::Todo,
            severity: None,
            customer_name: None,
            discovery_environment: None,
            defect_types: Vec::new(),
            root_cause: None,
            assignee: None,
            priority: None,
            solution: None,
        };
        assert_eq!(issue.searchable_text(), "滴滴登录失败 同步异常 ");
    }
}
