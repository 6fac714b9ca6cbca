use crate::analysis::distribution::{monthly_in_year, option_counts, value_counts};
use crate::analysis::resolution::{
    defect_type_counts, resolution_stats, severity_counts, status_counts, OPEN_STATUSES,
};
use crate::commands::ingest::Dataset;
use crate::commands::output::{banner, pct};
use crate::commands::settings::LensSettings;
use crate::models::issue::{IssueRecord, SeverityTier};
use crate::models::summary::{Distribution, MonthlyCounts, ResolutionStats};

pub struct TierBreakdown {
    pub count: usize,
    pub statuses: Distribution,
    pub customers: Distribution,
    pub defect_types: Distribution,
}

pub struct BugOverview {
    pub resolution: ResolutionStats,
    pub priorities: Distribution,
    pub severities: Distribution,
    pub defect_types: Distribution,
    pub root_causes: Distribution,
    pub environments: Distribution,
    pub assignees: Distribution,
    pub customers: Distribution,
    pub monthly: MonthlyCounts,
    pub p0: TierBreakdown,
    pub p1: TierBreakdown,
    pub unresolved_statuses: Distribution,
    pub unresolved_severities: Distribution,
}

fn tier_breakdown(bugs: &[&IssueRecord], tier: SeverityTier) -> TierBreakdown {
    let in_tier: Vec<&IssueRecord> = bugs.iter().copied().filter(|b| b.has_tier(tier)).collect();
    TierBreakdown {
        count: in_tier.len(),
        statuses: status_counts(&in_tier),
        customers: option_counts(in_tier.iter().map(|b| b.customer_name.as_deref())),
        defect_types: defect_type_counts(&in_tier),
    }
}

pub fn analyze_bugs(data: &Dataset, settings: &LensSettings) -> BugOverview {
    let bugs = data.bugs();
    let unresolved: Vec<&IssueRecord> = bugs
        .iter()
        .copied()
        .filter(|b| OPEN_STATUSES.contains(&b.status))
        .collect();

    BugOverview {
        resolution: resolution_stats(&bugs, &OPEN_STATUSES),
        priorities: option_counts(bugs.iter().map(|b| b.priority.as_deref())),
        severities: severity_counts(&bugs),
        defect_types: defect_type_counts(&bugs),
        root_causes: option_counts(bugs.iter().map(|b| b.root_cause.as_deref())),
        environments: option_counts(bugs.iter().map(|b| b.discovery_environment.as_deref())),
        assignees: option_counts(bugs.iter().map(|b| b.assignee.as_deref())),
        customers: option_counts(bugs.iter().map(|b| b.customer_name.as_deref())),
        monthly: monthly_in_year(bugs.iter().map(|b| b.creation_date), settings.report_year),
        p0: tier_breakdown(&bugs, SeverityTier::P0),
        p1: tier_breakdown(&bugs, SeverityTier::P1),
        unresolved_statuses: value_counts(unresolved.iter().map(|b| b.status.label())),
        unresolved_severities: severity_counts(&unresolved),
    }
}

fn push_dist(out: &mut Vec<String>, title: &str, dist: &Distribution, limit: usize) {
    out.push(format!("\n【{title}】"));
    for (key, count) in dist.top(limit) {
        out.push(format!("  {key}: {count}"));
    }
}

pub fn render_bug_overview(overview: &BugOverview, settings: &LensSettings) -> String {
    let year = settings.report_year;
    let res = &overview.resolution;
    let mut out: Vec<String> = Vec::new();

    out.extend(banner("一、Bug总体情况").into_iter().skip(1));
    out.push(format!("总Bug数量: {}", res.total));
    push_dist(&mut out, "状态分布", &res.status_dist, usize::MAX);
    push_dist(&mut out, "优先级分布", &overview.priorities, usize::MAX);
    push_dist(&mut out, "严重程度分布", &overview.severities, usize::MAX);

    out.extend(banner("二、Bug类型分析"));
    push_dist(&mut out, "缺陷类型分布", &overview.defect_types, 15);
    push_dist(&mut out, "根本原因分布", &overview.root_causes, 10);

    out.extend(banner("三、Bug环境分析"));
    push_dist(&mut out, "缺陷发现环境分布", &overview.environments, usize::MAX);

    out.extend(banner("四、归属分析"));
    push_dist(&mut out, "经办人分布(Top15)", &overview.assignees, 15);
    push_dist(&mut out, "客户分布(Top15)", &overview.customers, 15);

    out.extend(banner("五、时间趋势分析"));
    out.push(format!("\n【月度Bug创建趋势({year}年)】"));
    for (month, count) in overview.monthly.active_months() {
        out.push(format!("  {year}-{month:02}: {count}"));
    }

    out.extend(banner("六、P0/P1高优先级Bug分析"));
    out.push(format!("\n【P0 Bug数量】: {}", overview.p0.count));
    push_dist(&mut out, "P0 Bug状态分布", &overview.p0.statuses, usize::MAX);
    push_dist(&mut out, "P0 Bug客户分布(Top10)", &overview.p0.customers, 10);
    push_dist(&mut out, "P0 Bug缺陷类型分布", &overview.p0.defect_types, 10);
    out.push(format!("\n【P1 Bug数量】: {}", overview.p1.count));
    push_dist(&mut out, "P1 Bug状态分布", &overview.p1.statuses, usize::MAX);

    out.extend(banner("七、未解决Bug分析"));
    out.push(format!("\n【未解决Bug数量】: {}", res.unresolved_count));
    push_dist(&mut out, "未解决Bug状态分布", &overview.unresolved_statuses, usize::MAX);
    push_dist(&mut out, "未解决Bug严重程度分布", &overview.unresolved_severities, usize::MAX);

    out.extend(banner("八、年度关键指标汇总"));
    out.push(format!("\n  总Bug数: {}", res.total));
    out.push(format!("  已解决Bug数: {}", res.resolved));
    out.push(format!("  总体解决率: {}", pct(res.resolution_rate)));
    for (code, tier) in [("P0", &res.p0), ("P1", &res.p1)] {
        out.push(format!("\n  {code} Bug总数: {}", tier.total));
        out.push(format!("  {code} Bug已解决: {}", tier.resolved));
        out.push(format!("  {code} 解决率: {}", pct(tier.rate)));
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::tests::issue;
    use crate::models::issue::{IssueStatus, Severity};
    use chrono::NaiveDate;
    use std::path::Path;

    #[test]
    fn overview_counts_open_and_high_severity_bugs() {
        let mut a = issue("", "滴滴");
        a.severity = Severity::parse("P0（阻塞性问题）");
        a.status = IssueStatus::Suspended;
        a.assignee = Some("李四".to_string());
        a.priority = Some("High".to_string());
        a.creation_date = NaiveDate::from_ymd_opt(2025, 2, 14);
        let mut b = issue("", "");
        b.severity = Severity::parse("P1（核心功能问题）");
        b.status = IssueStatus::Done;
        b.creation_date = NaiveDate::from_ymd_opt(2024, 2, 14);

        let data = Dataset {
            issues: vec![a, b],
            incidents: Vec::new(),
        };
        let settings = LensSettings::defaults_for(Path::new("/ws")).expect("settings");
        let overview = analyze_bugs(&data, &settings);
        assert_eq!(overview.p0.count, 1);
        assert_eq!(overview.p0.customers.get("滴滴"), 1);
        assert_eq!(overview.unresolved_statuses.entries, vec![("挂起中".to_string(), 1)]);
        assert_eq!(overview.monthly.total(), 1);

        let body = render_bug_overview(&overview, &settings);
        assert!(body.starts_with(&"=".repeat(80)));
        assert!(body.contains("总Bug数量: 2"));
        assert!(body.contains("  2025-02: 1"));
        assert!(body.contains("【未解决Bug数量】: 1"));
        assert!(body.contains("  P1 解决率: 100.0%"));
        assert!(body.contains("  李四: 1"));
    }
}
