use crate::models::incident::IncidentRecord;
use crate::models::issue::IssueRecord;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult<'a> {
    pub incident: &'a IncidentRecord,
    pub issue: Option<&'a IssueRecord>,
    pub matched: bool,
}

impl<'a> MatchResult<'a> {
    pub fn matched(incident: &'a IncidentRecord, issue: &'a IssueRecord) -> Self {
        Self {
            incident,
            issue: Some(issue),
            matched: true,
        }
    }

    pub fn unmatched(incident: &'a IncidentRecord) -> Self {
        Self {
            incident,
            issue: None,
            matched: false,
        }
    }
}

/// One result per incident, in incident order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation<'a> {
    pub results: Vec<MatchResult<'a>>,
}

impl<'a> Reconciliation<'a> {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn matched(&self) -> impl Iterator<Item = &MatchResult<'a>> {
        self.results.iter().filter(|r| r.matched)
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &MatchResult<'a>> {
        self.results.iter().filter(|r| !r.matched)
    }

    pub fn matched_count(&self) -> usize {
        self.matched().count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched().count()
    }

    /// Share of incidents with no tracker counterpart, in percent.
    pub fn inconsistency_rate(&self) -> f64 {
        crate::analysis::distribution::percent(self.unmatched_count(), self.total())
    }
}
