use crate::models::incident::IncidentRecord;
use crate::models::issue::{IssueRecord, IssueType};
use crate::models::reconciliation::{MatchResult, Reconciliation};
use serde::{Deserialize, Serialize};

/// A keyword added to an incident's set when any trigger occurs in its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTerm {
    pub keyword: String,
    pub triggers: Vec<String>,
}

impl DomainTerm {
    fn new(keyword: &str, triggers: &[&str]) -> Self {
        Self {
            keyword: keyword.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Drops blank triggers. `None` when the keyword is blank or no trigger is left.
    pub fn without_blanks(mut self) -> Option<Self> {
        self.triggers.retain(|t| !t.trim().is_empty());
        if self.keyword.trim().is_empty() || self.triggers.is_empty() {
            return None;
        }
        Some(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileConfig {
    pub customer_tokens: Vec<String>,
    pub domain_terms: Vec<DomainTerm>,
    pub strip_words: Vec<String>,
    pub null_customer: String,
    pub name_prefix_min_chars: usize,
    pub name_prefix_chars: usize,
    pub name_prefix_bonus: usize,
    pub match_threshold: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        let customer_tokens = [
            "猿辅导", "好未来", "小红书", "京东", "OPPO", "边锋", "博纳", "广东电信", "北京凯读",
            "滴滴", "招商", "融云", "东风", "格力", "360", "玉溪",
        ];
        Self {
            customer_tokens: customer_tokens.iter().map(|t| t.to_string()).collect(),
            domain_terms: vec![
                DomainTerm::new("表格", &["表格", "表单"]),
                DomainTerm::new("文档", &["文档", "文件"]),
                DomainTerm::new("同步", &["同步"]),
                DomainTerm::new("登录", &["登录"]),
                DomainTerm::new("白屏", &["白屏"]),
            ],
            strip_words: vec!["故障报告".to_string(), "的".to_string()],
            null_customer: "nan".to_string(),
            name_prefix_min_chars: 5,
            name_prefix_chars: 10,
            name_prefix_bonus: 2,
            match_threshold: 2,
        }
    }
}

pub fn derive_keywords(incident: &IncidentRecord, config: &ReconcileConfig) -> Vec<String> {
    let name = incident.report_name.as_str();
    let mut keywords: Vec<String> = config
        .customer_tokens
        .iter()
        .filter(|token| !token.trim().is_empty() && name.contains(token.as_str()))
        .cloned()
        .collect();

    for term in &config.domain_terms {
        if term.keyword.trim().is_empty() {
            continue;
        }
        if term.triggers.iter().any(|t| !t.trim().is_empty() && name.contains(t.as_str())) {
            keywords.push(term.keyword.clone());
        }
    }

    if let Some(customer) = incident.customer.as_deref() {
        if !customer.trim().is_empty() && customer != config.null_customer {
            keywords.push(customer.to_string());
        }
    }

    keywords
}

/// The report name with generic words removed, cut to the configured prefix
/// length. `None` when the remainder is too short to be distinctive.
pub fn name_prefix(report_name: &str, config: &ReconcileConfig) -> Option<String> {
    let mut stripped = report_name.to_string();
    for word in &config.strip_words {
        stripped = stripped.replace(word.as_str(), "");
    }
    let stripped = stripped.trim();

    if stripped.chars().count() <= config.name_prefix_min_chars {
        return None;
    }
    Some(stripped.chars().take(config.name_prefix_chars).collect())
}

pub fn match_count(keywords: &[String], prefix: Option<&str>, text: &str, config: &ReconcileConfig) -> usize {
    let mut count = keywords.iter().filter(|kw| text.contains(kw.as_str())).count();
    if prefix.is_some_and(|p| text.contains(p)) {
        count += config.name_prefix_bonus;
    }
    count
}

/// Binds each incident to the first tracker incident whose score reaches the
/// threshold. Candidates are scanned in source order; no backtracking.
pub fn reconcile<'a>(
    incidents: &'a [IncidentRecord],
    issues: &'a [IssueRecord],
    config: &ReconcileConfig,
) -> Reconciliation<'a> {
    let candidates: Vec<(&IssueRecord, String)> = issues
        .iter()
        .filter(|issue| issue.issue_type == IssueType::Incident)
        .map(|issue| (issue, issue.searchable_text()))
        .collect();

    let results = incidents
        .iter()
        .map(|incident| {
            let keywords = derive_keywords(incident, config);
            let prefix = name_prefix(&incident.report_name, config);

            candidates
                .iter()
                .find(|(_, text)| {
                    match_count(&keywords, prefix.as_deref(), text, config) >= config.match_threshold
                })
                .map(|(issue, _)| MatchResult::matched(incident, issue))
                .unwrap_or_else(|| MatchResult::unmatched(incident))
        })
        .collect::<Vec<_>>();

    let reconciliation = Reconciliation { results };
    log::info!(
        "Reconciled {} incidents against {} tracker incidents: {} matched, {} unmatched",
        reconciliation.total(),
        candidates.len(),
        reconciliation.matched_count(),
        reconciliation.unmatched_count()
    );
    reconciliation
}
