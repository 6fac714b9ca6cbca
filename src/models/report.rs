use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Quality,
    Summary,
    Deployment,
    Bugs,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Quality,
        ReportKind::Summary,
        ReportKind::Deployment,
        ReportKind::Bugs,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ReportKind::Quality => "quality_report.md",
            ReportKind::Summary => "annual_summary.md",
            ReportKind::Deployment => "deployment_comparison.txt",
            ReportKind::Bugs => "bug_overview.txt",
        }
    }

    /// Reports that read the incident log in addition to the tracker export.
    pub fn needs_incidents(&self) -> bool {
        matches!(self, ReportKind::Quality | ReportKind::Summary)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProgress {
    pub current: usize,
    pub total: usize,
    pub report: ReportKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    pub kind: ReportKind,
    pub path: PathBuf,
    pub body: String,
}
