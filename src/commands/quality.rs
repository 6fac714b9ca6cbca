use crate::analysis::distribution::{monthly_in_year, option_counts, percent, truncate_chars};
use crate::analysis::incidents::incident_stats;
use crate::analysis::reconcile::reconcile;
use crate::analysis::resolution::{defect_type_counts, resolution_stats, OPEN_STATUSES};
use crate::commands::ingest::Dataset;
use crate::commands::output::{md_header, md_row, pct};
use crate::commands::settings::LensSettings;
use crate::models::incident::IncidentLevel;
use crate::models::reconciliation::Reconciliation;
use crate::models::summary::{Distribution, IncidentStats, MonthlyCounts, ResolutionStats};

/// Everything the quality report shows, computed up front.
pub struct QualityFindings<'a> {
    pub reconciliation: Reconciliation<'a>,
    pub incidents: IncidentStats,
    pub tracker_row_count: usize,
    pub tracker_incident_count: usize,
    pub tracker_monthly: MonthlyCounts,
    pub environments: Distribution,
    pub root_causes: Distribution,
    pub defect_types: Distribution,
    pub resolution: ResolutionStats,
}

pub fn analyze_quality<'a>(data: &'a Dataset, settings: &LensSettings) -> QualityFindings<'a> {
    let tracker_incidents = data.tracker_incidents();

    QualityFindings {
        reconciliation: reconcile(&data.incidents, &data.issues, &settings.reconcile),
        incidents: incident_stats(&data.incidents),
        tracker_row_count: data.issues.len(),
        tracker_incident_count: tracker_incidents.len(),
        tracker_monthly: monthly_in_year(
            tracker_incidents.iter().map(|i| i.creation_date),
            settings.report_year,
        ),
        environments: option_counts(tracker_incidents.iter().map(|i| i.discovery_environment.as_deref())),
        root_causes: option_counts(tracker_incidents.iter().map(|i| i.root_cause.as_deref())),
        defect_types: defect_type_counts(&tracker_incidents),
        resolution: resolution_stats(&tracker_incidents, &OPEN_STATUSES),
    }
}

fn month_table(out: &mut Vec<String>, monthly: &MonthlyCounts) {
    out.extend(md_header(&["月份", "故障数量"]));
    for (month, count) in monthly.active_months() {
        out.push(md_row([format!("{month}月"), count.to_string()]));
    }
    out.push(String::new());
}

pub fn render_quality_report(
    findings: &QualityFindings<'_>,
    settings: &LensSettings,
    generated_at: &str,
) -> String {
    let year = settings.report_year;
    let rec = &findings.reconciliation;
    let total = rec.total();
    let mut out: Vec<String> = Vec::new();

    out.push(format!("# {year}年度研发质量体系分析报告\n"));
    out.push(format!("**生成时间**: {generated_at}\n"));

    out.push("## 一、执行摘要\n".to_string());
    out.push("本报告基于两个核心数据源进行分析：".to_string());
    out.push(format!("- **线上故障问题表**：{total}条重大线上故障记录"));
    out.push(format!(
        "- **Jira项目管理数据**：共{}条记录，其中故障类型{}条\n",
        findings.tracker_row_count, findings.tracker_incident_count
    ));

    out.push("## 二、数据源对比分析\n".to_string());
    out.push("### 2.1 匹配结果统计\n".to_string());
    out.extend(md_header(&["指标", "数量", "占比"]));
    out.push(md_row(["线上故障记录总数".to_string(), total.to_string(), "100%".to_string()]));
    out.push(md_row([
        "在Jira中有对应记录".to_string(),
        rec.matched_count().to_string(),
        pct(percent(rec.matched_count(), total)),
    ]));
    out.push(md_row([
        "在Jira中无对应记录".to_string(),
        rec.unmatched_count().to_string(),
        pct(percent(rec.unmatched_count(), total)),
    ]));
    out.push(String::new());

    out.push("### 2.2 未在Jira中记录的故障清单\n".to_string());
    if rec.unmatched_count() > 0 {
        out.extend(md_header(&["序号", "故障名称", "故障日期", "故障等级", "客户"]));
        for (idx, result) in rec.unmatched().enumerate() {
            let incident = result.incident;
            out.push(md_row([
                (idx + 1).to_string(),
                truncate_chars(&incident.report_name, 30),
                incident.incident_date_raw.clone().unwrap_or_default(),
                incident.severity_level.map(|l| l.code().to_string()).unwrap_or_default(),
                incident.customer.clone().unwrap_or_default(),
            ]));
        }
        out.push(String::new());
    } else {
        out.push("所有线上故障均已在Jira中找到对应记录。\n".to_string());
    }

    out.push("### 2.3 数据一致性问题分析\n".to_string());
    out.push(format!("- **记录缺失率**: {}", pct(rec.inconsistency_rate())));
    out.push("- **可能原因**:".to_string());
    out.push("  1. 故障处理流程未规范化，部分故障未同步录入Jira".to_string());
    out.push("  2. 线上故障表为人工维护，存在记录遗漏或延迟".to_string());
    out.push("  3. 两套系统的故障命名规范不统一，导致匹配困难".to_string());
    out.push(String::new());

    out.push("## 三、故障分布分析\n".to_string());
    out.push("### 3.1 月度故障趋势\n".to_string());
    out.push("**线上故障问题表 - 月度分布**\n".to_string());
    month_table(&mut out, &findings.incidents.monthly);
    out.push(format!("**Jira故障记录 - 月度分布（{year}年）**\n"));
    month_table(&mut out, &findings.tracker_monthly);

    out.push("### 3.2 团队故障分布\n".to_string());
    out.extend(md_header(&["团队", "故障数量", "占比"]));
    let team_total = findings.incidents.team_dist.total();
    for (team, count) in &findings.incidents.team_dist.entries {
        out.push(md_row([team.clone(), count.to_string(), pct(percent(*count, team_total))]));
    }
    out.push(String::new());

    out.push("### 3.3 故障等级分布\n".to_string());
    out.extend(md_header(&["等级", "数量", "占比", "说明"]));
    let levels = findings.incidents.levels;
    let graded = levels.p0 + levels.p1 + levels.p2;
    for level in IncidentLevel::ALL {
        let count = levels.get(level);
        out.push(md_row([
            level.code().to_string(),
            count.to_string(),
            pct(percent(count, graded)),
            level.description().to_string(),
        ]));
    }
    out.push(String::new());

    out.push("### 3.4 客户故障分布\n".to_string());
    out.extend(md_header(&["客户", "故障数量"]));
    for (customer, count) in findings.incidents.customer_dist.top(15) {
        out.push(md_row([customer.clone(), count.to_string()]));
    }
    out.push(String::new());

    out.push("### 3.5 故障发现环境分布\n".to_string());
    out.extend(md_header(&["环境", "数量"]));
    for (env, count) in findings.environments.top(10) {
        out.push(md_row([env.clone(), count.to_string()]));
    }
    out.push(String::new());

    out.push("## 四、根本原因分析\n".to_string());
    out.push("### 4.1 故障根本原因分布\n".to_string());
    out.extend(md_header(&["根本原因", "数量", "占比"]));
    let cause_total = findings.root_causes.total();
    for (cause, count) in findings.root_causes.top(15) {
        out.push(md_row([cause.clone(), count.to_string(), pct(percent(*count, cause_total))]));
    }
    out.push(String::new());

    out.push("### 4.2 缺陷类型分布\n".to_string());
    out.extend(md_header(&["缺陷类型", "数量"]));
    for (kind, count) in findings.defect_types.top(10) {
        out.push(md_row([kind.clone(), count.to_string()]));
    }
    out.push(String::new());

    let res = &findings.resolution;
    out.push("## 五、故障解决效率分析\n".to_string());
    out.push("### 5.1 整体解决情况\n".to_string());
    out.extend(md_header(&["指标", "数值"]));
    out.push(md_row(["故障总数".to_string(), res.total.to_string()]));
    out.push(md_row(["已解决".to_string(), res.resolved.to_string()]));
    out.push(md_row(["解决率".to_string(), pct(res.resolution_rate)]));
    out.push(md_row(["未解决".to_string(), res.unresolved_count.to_string()]));
    out.push(String::new());

    out.push("### 5.2 按严重程度的解决情况\n".to_string());
    out.extend(md_header(&["等级", "总数", "已解决", "解决率"]));
    for (code, tier) in [("P0", &res.p0), ("P1", &res.p1)] {
        out.push(md_row([
            code.to_string(),
            tier.total.to_string(),
            tier.resolved.to_string(),
            pct(tier.rate),
        ]));
    }
    out.push(String::new());

    out.push("### 5.3 故障状态分布\n".to_string());
    out.extend(md_header(&["状态", "数量"]));
    for (status, count) in &res.status_dist.entries {
        out.push(md_row([status.clone(), count.to_string()]));
    }
    out.push(String::new());

    out.push("## 六、质量体系结论\n".to_string());
    out.push(format!(
        "1. 线上故障问题表与Jira记录存在{}的不一致率（{}/{}条未匹配）",
        pct(rec.inconsistency_rate()),
        rec.unmatched_count(),
        total
    ));
    out.push(format!("2. 整体故障解决率为{}", pct(res.resolution_rate)));
    out.push(format!("3. P0级别故障解决率为{}，P1级别为{}", pct(res.p0.rate), pct(res.p1.rate)));
    out.push(format!("4. 仍有{}个故障处于未解决状态", res.unresolved_count));
    if let Some((cause, count)) = findings.root_causes.entries.first() {
        out.push(format!("5. 最主要的根本原因为「{cause}」，共{count}条"));
    }
    out.push(String::new());

    out.push("## 七、附录\n".to_string());
    out.push("### 数据来源说明\n".to_string());
    out.push(format!("- 线上故障问题表：{}", file_label(&settings.paths.incidents_csv)));
    out.push(format!("- Jira项目管理数据：{}", file_label(&settings.paths.issues_csv)));
    out.push(format!("- 分析时间范围：{year}年1月-12月"));
    out.push(String::new());

    out.join("\n")
}

pub(crate) fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::reconcile::tests::{incident, tracker_incident};
    use crate::models::issue::{IssueStatus, Severity};
    use std::path::Path;

    fn dataset() -> Dataset {
        let mut matched = incident("滴滴文档同步故障报告", Some("滴滴"));
        matched.severity_level = Some(IncidentLevel::P0);
        matched.owning_team = Some("后端".to_string());
        let mut orphan = incident("某客户附件预览服务长时间不可用的故障报告", None);
        orphan.incident_date_raw = Some("2025-02-03".to_string());
        orphan.severity_level = Some(IncidentLevel::P2);

        let mut issue = tracker_incident("滴滴反馈同步失败", "", Some("滴滴"));
        issue.severity = Severity::parse("P0（阻塞性问题）");
        issue.root_cause = Some("代码问题".to_string());
        let mut open = tracker_incident("表格卡顿", "", None);
        open.status = IssueStatus::Todo;

        Dataset {
            issues: vec![issue, open],
            incidents: vec![matched, orphan],
        }
    }

    #[test]
    fn report_lists_unmatched_incidents_and_rates() {
        let data = dataset();
        let settings = LensSettings::defaults_for(Path::new("/ws")).expect("settings");
        let findings = analyze_quality(&data, &settings);
        assert_eq!(findings.reconciliation.matched_count(), 1);
        assert_eq!(findings.resolution.unresolved_count, 1);

        let body = render_quality_report(&findings, &settings, "2025-12-31 09:00:00");
        assert!(body.starts_with("# 2025年度研发质量体系分析报告"));
        assert!(body.contains("| 在Jira中有对应记录 | 1 | 50.0% |"));
        assert!(body.contains("| 1 | 某客户附件预览服务长时间不可用的故障报告 | 2025-02-03 | P2 |  |"));
        assert!(body.contains("- **记录缺失率**: 50.0%"));
        assert!(body.contains("| P0 | 1 | 50.0% | 阻塞性问题 |"));
        assert!(body.contains("| P0 | 1 | 1 | 100.0% |"));
        assert!(body.contains("- Jira项目管理数据：issues.csv"));
    }
}
