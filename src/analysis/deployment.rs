use crate::analysis::classifier::{classify, ClassificationRule};
use crate::analysis::distribution::{monthly_in_year, option_counts};
use crate::analysis::resolution::{defect_type_counts, resolution_stats, severity_counts};
use crate::models::deployment::DeploymentClass;
use crate::models::issue::{IssueRecord, IssueStatus, SeverityTier};
use crate::models::summary::{DeploymentComparison, DeploymentSlice};

/// Splits bugs by deployment class, preserving input order within each class.
pub fn partition_by_class<'a>(
    bugs: &[&'a IssueRecord],
    rules: &[ClassificationRule],
) -> [Vec<&'a IssueRecord>; 3] {
    let mut saas = Vec::new();
    let mut private = Vec::new();
    let mut unclassified = Vec::new();
    for bug in bugs {
        match classify(bug, rules) {
            DeploymentClass::Saas => saas.push(*bug),
            DeploymentClass::Private => private.push(*bug),
            DeploymentClass::Unclassified => unclassified.push(*bug),
        }
    }
    [saas, private, unclassified]
}

pub fn deployment_slice(
    class: DeploymentClass,
    issues: &[&IssueRecord],
    open_statuses: &[IssueStatus],
    report_year: i32,
) -> DeploymentSlice {
    let p0: Vec<&IssueRecord> = issues
        .iter()
        .copied()
        .filter(|i| i.has_tier(SeverityTier::P0))
        .collect();

    DeploymentSlice {
        class,
        total: issues.len(),
        resolution: resolution_stats(issues, open_statuses),
        severity_dist: severity_counts(issues),
        defect_types: defect_type_counts(issues),
        customers: option_counts(issues.iter().map(|i| i.customer_name.as_deref())),
        p0_customers: option_counts(p0.iter().map(|i| i.customer_name.as_deref())),
        monthly: monthly_in_year(issues.iter().map(|i| i.creation_date), report_year),
    }
}

pub fn compare_deployments(
    bugs: &[&IssueRecord],
    rules: &[ClassificationRule],
    open_statuses: &[IssueStatus],
    report_year: i32,
) -> DeploymentComparison {
    let [saas, private, unclassified] = partition_by_class(bugs, rules);
    log::debug!(
        "Classified {} bugs: {} SaaS, {} private, {} unclassified",
        bugs.len(),
        saas.len(),
        private.len(),
        unclassified.len()
    );

    DeploymentComparison {
        total_bugs: bugs.len(),
        saas: deployment_slice(DeploymentClass::Saas, &saas, open_statuses, report_year),
        private: deployment_slice(DeploymentClass::Private, &private, open_statuses, report_year),
        unclassified: deployment_slice(
            DeploymentClass::Unclassified,
            &unclassified,
            open_statuses,
            report_year,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::default_rules;
    use crate::analysis::classifier::tests::issue;
    use crate::analysis::resolution::OPEN_STATUSES;
    use crate::models::issue::Severity;
    use chrono::NaiveDate;

    #[test]
    fn comparison_splits_and_aggregates_per_class() {
        let mut saas_p0 = issue("SaaS生产环境", "");
        saas_p0.severity = Severity::parse("P0（阻塞性问题）");
        saas_p0.status = IssueStatus::Done;
        saas_p0.creation_date = NaiveDate::from_ymd_opt(2025, 3, 4);

        let mut private_p0 = issue("", "福田");
        private_p0.severity = Severity::parse("P0（阻塞性问题）");
        private_p0.creation_date = NaiveDate::from_ymd_opt(2024, 3, 4);

        let mut private_other = issue("私有化客户生产环境", "好未来");
        private_other.creation_date = NaiveDate::from_ymd_opt(2025, 11, 2);
        private_other.defect_types = vec!["兼容性".to_string()];

        let blank = issue("", "");

        let records = [saas_p0, private_p0, private_other, blank];
        let refs: Vec<&IssueRecord> = records.iter().collect();
        let cmp = compare_deployments(&refs, &default_rules(), &OPEN_STATUSES, 2025);

        assert_eq!(cmp.total_bugs, 4);
        assert_eq!(cmp.saas.total, 1);
        assert_eq!(cmp.saas.resolution.p0.rate, 100.0);
        assert_eq!(cmp.saas.monthly.get(3), 1);

        let private = cmp.slice(DeploymentClass::Private);
        assert_eq!(private.total, 2);
        assert_eq!(private.monthly.total(), 1);
        assert_eq!(private.monthly.get(11), 1);
        assert_eq!(private.p0_customers.entries, vec![("福田".to_string(), 1)]);
        assert_eq!(private.customers.entries.len(), 2);
        assert_eq!(private.defect_types.get("兼容性"), 1);

        assert_eq!(cmp.unclassified.total, 1);
    }
}
