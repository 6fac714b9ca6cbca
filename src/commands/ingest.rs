use crate::commands::settings::LensSettings;
use crate::error::{LensError, LensResult};
use crate::models::incident::{IncidentLevel, IncidentRecord};
use crate::models::issue::{IssueRecord, IssueStatus, IssueType, Severity};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const COL_ISSUE_TYPE: &str = "问题类型";
pub const COL_SUMMARY: &str = "概要";
pub const COL_STATUS: &str = "状态";
pub const COL_DESCRIPTION: &str = "描述";
pub const COL_CREATED: &str = "创建日期";
pub const COL_SEVERITY: &str = "自定义字段(严重程度)";
pub const COL_CUSTOMER: &str = "自定义字段(客户名称)";
pub const COL_ENVIRONMENT: &str = "自定义字段(缺陷发现环境)";
pub const COL_ROOT_CAUSE: &str = "自定义字段(根本原因)";
pub const COL_ASSIGNEE: &str = "经办人";
pub const COL_PRIORITY: &str = "优先级";
pub const COL_SOLUTION: &str = "自定义字段(解决办法)";
pub const DEFECT_TYPE_MARKER: &str = "缺陷类型";

pub const COL_INCIDENT_NAME: &str = "故障报告名称";
pub const COL_INCIDENT_DATE: &str = "故障日期";
pub const COL_INCIDENT_LEVEL: &str = "故障等级";
pub const COL_INCIDENT_CUSTOMER: &str = "客户";
pub const COL_INCIDENT_TEAM: &str = "归属团队";

/// Both sources, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub issues: Vec<IssueRecord>,
    pub incidents: Vec<IncidentRecord>,
}

impl Dataset {
    pub fn bugs(&self) -> Vec<&IssueRecord> {
        self.issues.iter().filter(|i| i.issue_type.is_bug()).collect()
    }

    pub fn tracker_incidents(&self) -> Vec<&IssueRecord> {
        self.issues
            .iter()
            .filter(|i| i.issue_type == IssueType::Incident)
            .collect()
    }
}

pub fn load_dataset(settings: &LensSettings, with_incidents: bool) -> LensResult<Dataset> {
    let issues = load_issues(&settings.paths.issues_csv)?;
    let incidents = if with_incidents {
        load_incidents(&settings.paths.incidents_csv)?
    } else {
        Vec::new()
    };
    Ok(Dataset { issues, incidents })
}

struct HeaderIndex {
    names: Vec<String>,
}

impl HeaderIndex {
    fn new(headers: &StringRecord) -> Self {
        let names = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        Self { names }
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.names.iter().position(|n| n == column)
    }

    fn require(&self, column: &str, source: &str) -> LensResult<usize> {
        self.position(column).ok_or_else(|| LensError::MissingColumn {
            file: source.to_string(),
            column: column.to_string(),
        })
    }

    fn containing(&self, marker: &str) -> Vec<usize> {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, n)| n.contains(marker))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Trimmed cell value; blank and missing cells are `None`.
fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    let value = record.get(idx?)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

pub fn load_issues(path: &Path) -> LensResult<Vec<IssueRecord>> {
    let file = File::open(path)?;
    let issues = read_issues(file, &path.display().to_string())?;
    log::info!("Loaded {} tracker rows from {}", issues.len(), path.display());
    Ok(issues)
}

pub fn read_issues<R: Read>(reader: R, source: &str) -> LensResult<Vec<IssueRecord>> {
    let mut rdr = csv_reader(reader);
    let headers = HeaderIndex::new(rdr.headers()?);

    let issue_type = headers.require(COL_ISSUE_TYPE, source)?;
    let summary = headers.require(COL_SUMMARY, source)?;
    let status = headers.require(COL_STATUS, source)?;
    let description = headers.position(COL_DESCRIPTION);
    let created = headers.position(COL_CREATED);
    let severity = headers.position(COL_SEVERITY);
    let customer = headers.position(COL_CUSTOMER);
    let environment = headers.position(COL_ENVIRONMENT);
    let root_cause = headers.position(COL_ROOT_CAUSE);
    let assignee = headers.position(COL_ASSIGNEE);
    let priority = headers.position(COL_PRIORITY);
    let solution = headers.position(COL_SOLUTION);
    let defect_columns = headers.containing(DEFECT_TYPE_MARKER);

    let mut issues = Vec::new();
    for row in rdr.records() {
        let record = row?;
        issues.push(IssueRecord {
            issue_type: IssueType::parse(&cell(&record, Some(issue_type)).unwrap_or_default()),
            summary: cell(&record, Some(summary)).unwrap_or_default(),
            description: cell(&record, description).unwrap_or_default(),
            creation_date: cell(&record, created).as_deref().and_then(parse_date),
            status: IssueStatus::parse(&cell(&record, Some(status)).unwrap_or_default()),
            severity: cell(&record, severity).as_deref().and_then(Severity::parse),
            customer_name: cell(&record, customer),
            discovery_environment: cell(&record, environment),
            defect_types: defect_columns
                .iter()
                .filter_map(|idx| cell(&record, Some(*idx)))
                .collect(),
            root_cause: cell(&record, root_cause),
            assignee: cell(&record, assignee),
            priority: cell(&record, priority),
            solution: cell(&record, solution),
        });
    }
    Ok(issues)
}

pub fn load_incidents(path: &Path) -> LensResult<Vec<IncidentRecord>> {
    let file = File::open(path)?;
    let incidents = read_incidents(file, &path.display().to_string())?;
    log::info!("Loaded {} incident log rows from {}", incidents.len(), path.display());
    Ok(incidents)
}

/// Rows without a report name are dropped.
pub fn read_incidents<R: Read>(reader: R, source: &str) -> LensResult<Vec<IncidentRecord>> {
    let mut rdr = csv_reader(reader);
    let headers = HeaderIndex::new(rdr.headers()?);

    let name = headers.require(COL_INCIDENT_NAME, source)?;
    let date = headers.position(COL_INCIDENT_DATE);
    let level = headers.position(COL_INCIDENT_LEVEL);
    let customer = headers.position(COL_INCIDENT_CUSTOMER);
    let team = headers.position(COL_INCIDENT_TEAM);

    let mut incidents = Vec::new();
    let mut skipped = 0usize;
    for row in rdr.records() {
        let record = row?;
        let Some(report_name) = cell(&record, Some(name)) else {
            skipped += 1;
            continue;
        };
        let raw_date = cell(&record, date);
        incidents.push(IncidentRecord {
            report_name,
            incident_date: raw_date.as_deref().and_then(parse_date),
            incident_date_raw: raw_date,
            severity_level: cell(&record, level).as_deref().and_then(IncidentLevel::parse),
            customer: cell(&record, customer),
            owning_team: cell(&record, team),
        });
    }
    if skipped > 0 {
        log::debug!("Skipped {skipped} incident rows without a report name");
    }
    Ok(incidents)
}

const DATE_FORMATS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日", "%Y%m%d", "%d/%b/%y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Lenient date parsing for spreadsheet exports. Unparseable input is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    let first = raw.split_whitespace().next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(first, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::SeverityTier;

    const ISSUES: &str = "\u{feff}问题类型,概要,状态,描述,创建日期,自定义字段(严重程度),自定义字段(客户名称),自定义字段(缺陷发现环境),自定义字段(缺陷类型),自定义字段(缺陷类型),经办人
故障,滴滴登录失败,完成,同步异常,2025-03-04 10:22:00,P0（阻塞性问题）,滴滴,私有化客户生产环境,代码问题,配置问题,张三
缺陷,表格卡顿,待办,,2025/04/01,,,, , ,
";

    #[test]
    fn reads_issue_rows_with_optional_columns() {
        let issues = read_issues(ISSUES.as_bytes(), "issues.csv").expect("issues");
        assert_eq!(issues.len(), 2);

        let first = &issues[0];
        assert_eq!(first.issue_type, IssueType::Incident);
        assert_eq!(first.status, IssueStatus::Done);
        assert_eq!(first.creation_date, NaiveDate::from_ymd_opt(2025, 3, 4));
        assert!(first.has_tier(SeverityTier::P0));
        assert_eq!(first.defect_types, vec!["代码问题", "配置问题"]);
        assert_eq!(first.assignee.as_deref(), Some("张三"));
        assert!(first.priority.is_none());

        let second = &issues[1];
        assert_eq!(second.issue_type, IssueType::Defect);
        assert!(second.customer_name.is_none());
        assert!(second.defect_types.is_empty());
        assert_eq!(second.creation_date, NaiveDate::from_ymd_opt(2025, 4, 1));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let err = read_issues("问题类型,概要\n故障,x\n".as_bytes(), "jira.csv").expect_err("missing");
        assert!(matches!(
            err,
            LensError::MissingColumn { ref column, .. } if column == "状态"
        ));
    }

    #[test]
    fn incident_rows_without_name_are_dropped() {
        let raw = "故障报告名称,故障日期,故障等级,客户,归属团队
滴滴文档同步故障报告,2025-01-05,P1,滴滴,后端
,2025-01-06,P0,,
  ,2025-01-07,P0,,
白屏问题,上周,P3,,前端
";
        let incidents = read_incidents(raw.as_bytes(), "incidents.csv").expect("incidents");
        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].severity_level, Some(IncidentLevel::P1));
        assert_eq!(incidents[1].severity_level, None);
        assert_eq!(incidents[1].incident_date, None);
        assert_eq!(incidents[1].incident_date_raw.as_deref(), Some("上周"));
    }

    #[test]
    fn parses_common_export_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 9);
        assert_eq!(parse_date("2025-01-09"), expected);
        assert_eq!(parse_date("2025/1/9"), expected);
        assert_eq!(parse_date("2025年01月09日"), expected);
        assert_eq!(parse_date("2025-01-09T08:00:00+08:00"), expected);
        assert_eq!(parse_date("2025/01/09 18:30"), expected);
        assert_eq!(parse_date("09/Jan/25 10:00 AM"), expected);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }
}
