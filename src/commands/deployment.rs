use crate::analysis::deployment::compare_deployments;
use crate::analysis::distribution::percent;
use crate::analysis::resolution::OPEN_STATUSES;
use crate::commands::ingest::Dataset;
use crate::commands::output::{banner, pct};
use crate::commands::settings::LensSettings;
use crate::models::deployment::DeploymentClass;
use crate::models::summary::{DeploymentComparison, DeploymentSlice, Distribution};

pub fn analyze_deployments(data: &Dataset, settings: &LensSettings) -> DeploymentComparison {
    compare_deployments(
        &data.bugs(),
        &settings.classification_rules,
        &OPEN_STATUSES,
        settings.report_year,
    )
}

fn push_dist(out: &mut Vec<String>, title: &str, dist: &Distribution, limit: usize) {
    out.push(format!("\n【{title}】"));
    for (key, count) in dist.top(limit) {
        out.push(format!("  {key}: {count}"));
    }
}

fn push_slice(out: &mut Vec<String>, heading: &str, slice: &DeploymentSlice, year: i32) {
    let label = slice.class.label();
    out.extend(banner(heading));
    out.push(format!("\n【{label} Bug总数】: {}", slice.total));

    push_dist(out, "状态分布", &slice.resolution.status_dist, usize::MAX);
    push_dist(out, "严重程度分布", &slice.severity_dist, usize::MAX);
    push_dist(out, "缺陷类型分布", &slice.defect_types, 10);

    out.push(format!("\n【月度趋势({year}年)】"));
    for month in 1..=12 {
        out.push(format!("  {month}月: {}", slice.monthly.get(month)));
    }
    out.push("\n【季度汇总】".to_string());
    for quarter in 1..=4 {
        out.push(format!("  Q{quarter}: {}", slice.monthly.quarter(quarter)));
    }

    if slice.class == DeploymentClass::Private {
        push_dist(out, "私有化客户Bug分布Top15", &slice.customers, 15);
    }

    let res = &slice.resolution;
    out.push(format!("\n【{label}关键指标】"));
    out.push(format!(
        "  总数: {}, 已解决: {}, 解决率: {}",
        res.total,
        res.resolved,
        pct(res.resolution_rate)
    ));
    out.push(format!("  P0: {}, 已解决: {}, 解决率: {}", res.p0.total, res.p0.resolved, pct(res.p0.rate)));
    out.push(format!("  P1: {}, 已解决: {}, 解决率: {}", res.p1.total, res.p1.resolved, pct(res.p1.rate)));

    if slice.class == DeploymentClass::Private {
        push_dist(out, "私有化P0问题客户分布", &slice.p0_customers, usize::MAX);
    }
}

pub fn render_deployment_comparison(cmp: &DeploymentComparison, settings: &LensSettings) -> String {
    let year = settings.report_year;
    let (saas, private) = (&cmp.saas, &cmp.private);
    let rule = "=".repeat(80);
    let mut out = vec![
        rule.clone(),
        format!("{year}年度Bug分析报告 - SaaS vs 私有化对比"),
        rule,
    ];

    out.push("\n【数据分类概况】".to_string());
    out.push(format!("  SaaS Bug数量: {}", saas.total));
    out.push(format!("  私有化 Bug数量: {}", private.total));
    out.push(format!("  未分类 Bug数量: {}", cmp.unclassified.total));
    out.push(format!("  总计: {}", cmp.total_bugs));

    push_slice(&mut out, "一、SaaS Bug分析", saas, year);
    push_slice(&mut out, "二、私有化 Bug分析", private, year);

    out.extend(banner("三、SaaS vs 私有化 对比汇总"));
    out.push("\n【Bug数量对比】".to_string());
    for slice in [saas, private] {
        out.push(format!(
            "  {}: {} ({})",
            slice.class.label(),
            slice.total,
            pct(percent(slice.total, cmp.total_bugs))
        ));
    }
    out.push("\n【解决率对比】".to_string());
    for slice in [saas, private] {
        out.push(format!("  {}: {}", slice.class.label(), pct(slice.resolution.resolution_rate)));
    }
    out.push("\n【P0解决率对比】".to_string());
    for slice in [saas, private] {
        let p0 = &slice.resolution.p0;
        out.push(format!("  {} P0: {}个, 解决率 {}", slice.class.label(), p0.total, pct(p0.rate)));
    }
    out.push("\n【P1解决率对比】".to_string());
    for slice in [saas, private] {
        let p1 = &slice.resolution.p1;
        out.push(format!("  {} P1: {}个, 解决率 {}", slice.class.label(), p1.total, pct(p1.rate)));
    }

    out.join("\n")
}
