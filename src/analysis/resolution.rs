use crate::analysis::distribution::{percent, value_counts};
use crate::models::issue::{IssueRecord, IssueStatus, SeverityTier};
use crate::models::summary::{Distribution, ResolutionStats, TierResolution};

/// Statuses the quality report and bug overview treat as open.
pub const OPEN_STATUSES: [IssueStatus; 4] = [
    IssueStatus::Todo,
    IssueStatus::InProgress,
    IssueStatus::Suspended,
    IssueStatus::Reopened,
];

/// Statuses the annual summary treats as open. Reopened is left out there.
pub const SUMMARY_OPEN_STATUSES: [IssueStatus; 3] =
    [IssueStatus::Todo, IssueStatus::InProgress, IssueStatus::Suspended];

pub fn tier_resolution(issues: &[&IssueRecord], tier: SeverityTier) -> TierResolution {
    let in_tier: Vec<&&IssueRecord> = issues.iter().filter(|i| i.has_tier(tier)).collect();
    let resolved = in_tier.iter().filter(|i| i.status.is_resolved()).count();
    TierResolution {
        total: in_tier.len(),
        resolved,
        rate: percent(resolved, in_tier.len()),
    }
}

pub fn resolution_stats(issues: &[&IssueRecord], open_statuses: &[IssueStatus]) -> ResolutionStats {
    let resolved = issues.iter().filter(|i| i.status.is_resolved()).count();
    let unresolved_count = issues
        .iter()
        .filter(|i| open_statuses.contains(&i.status))
        .count();

    ResolutionStats {
        total: issues.len(),
        resolved,
        resolution_rate: percent(resolved, issues.len()),
        p0: tier_resolution(issues, SeverityTier::P0),
        p1: tier_resolution(issues, SeverityTier::P1),
        unresolved_count,
        status_dist: status_counts(issues),
    }
}

pub fn status_counts(issues: &[&IssueRecord]) -> Distribution {
    value_counts(issues.iter().map(|i| i.status.label()))
}

/// Every defect-type tag across the issues, one count per tag occurrence.
pub fn defect_type_counts(issues: &[&IssueRecord]) -> Distribution {
    value_counts(issues.iter().flat_map(|i| i.defect_types.iter().map(String::as_str)))
}

pub fn severity_counts(issues: &[&IssueRecord]) -> Distribution {
    value_counts(
        issues
            .iter()
            .filter_map(|i| i.severity.as_ref().map(|s| s.label.as_str())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::tests::issue;
    use crate::models::issue::Severity;

    fn bug(status: IssueStatus, severity: Option<&str>, defects: &[&str]) -> IssueRecord {
        let mut record = issue("", "");
        record.status = status;
        record.severity = severity.and_then(Severity::parse);
        record.defect_types = defects.iter().map(|d| d.to_string()).collect();
        record
    }

    #[test]
    fn resolution_counts_tiers_and_open_statuses() {
        let records = vec![
            bug(IssueStatus::Done, Some("P0（阻塞性问题）"), &["代码问题"]),
            bug(IssueStatus::Todo, Some("P0（阻塞性问题）"), &[]),
            bug(IssueStatus::Reopened, Some("P1（核心功能问题）"), &["配置问题", "代码问题"]),
            bug(IssueStatus::Done, None, &[]),
        ];
        let refs: Vec<&IssueRecord> = records.iter().collect();

        let stats = resolution_stats(&refs, &OPEN_STATUSES);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.resolution_rate, 50.0);
        assert_eq!(stats.p0, TierResolution { total: 2, resolved: 1, rate: 50.0 });
        assert_eq!(stats.p1, TierResolution { total: 1, resolved: 0, rate: 0.0 });
        assert_eq!(stats.unresolved_count, 2);
        assert_eq!(stats.status_dist.get("完成"), 2);

        let summary = resolution_stats(&refs, &SUMMARY_OPEN_STATUSES);
        assert_eq!(summary.unresolved_count, 1);

        let defects = defect_type_counts(&refs);
        assert_eq!(defects.entries[0], ("代码问题".to_string(), 2));
        assert_eq!(severity_counts(&refs).total(), 3);
    }

    #[test]
    fn untiered_severity_labels_are_counted_but_not_tiered() {
        let records = vec![
            bug(IssueStatus::Todo, Some("紧急"), &[]),
            bug(IssueStatus::Done, Some("P0（阻塞性问题）"), &[]),
            bug(IssueStatus::Todo, Some("紧急"), &[]),
        ];
        let refs: Vec<&IssueRecord> = records.iter().collect();

        let severities = severity_counts(&refs);
        assert_eq!(severities.entries[0], ("紧急".to_string(), 2));
        assert_eq!(severities.get("P0（阻塞性问题）"), 1);

        let stats = resolution_stats(&refs, &OPEN_STATUSES);
        assert_eq!(stats.p0.total, 1);
        assert_eq!(stats.p1.total, 0);
    }

    #[test]
    fn empty_input_has_zero_rates() {
        let stats = resolution_stats(&[], &OPEN_STATUSES);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.resolution_rate, 0.0);
        assert_eq!(stats.p0.rate, 0.0);
    }
}
