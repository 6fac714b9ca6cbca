use crate::analysis::deployment::compare_deployments;
use crate::analysis::distribution::percent;
use crate::analysis::incidents::incident_stats;
use crate::analysis::resolution::{defect_type_counts, resolution_stats, SUMMARY_OPEN_STATUSES};
use crate::commands::ingest::Dataset;
use crate::commands::output::{md_header, md_row, pct};
use crate::commands::quality::file_label;
use crate::commands::settings::LensSettings;
use crate::models::incident::IncidentLevel;
use crate::models::summary::{
    DeploymentComparison, DeploymentSlice, Distribution, IncidentStats, LevelCounts, ResolutionStats,
};

pub struct AnnualSummary {
    pub incidents: IncidentStats,
    pub bugs: ResolutionStats,
    pub deployments: DeploymentComparison,
    pub defect_types: Distribution,
}

pub fn analyze_summary(data: &Dataset, settings: &LensSettings) -> AnnualSummary {
    let bugs = data.bugs();
    AnnualSummary {
        incidents: incident_stats(&data.incidents),
        bugs: resolution_stats(&bugs, &SUMMARY_OPEN_STATUSES),
        deployments: compare_deployments(
            &bugs,
            &settings.classification_rules,
            &SUMMARY_OPEN_STATUSES,
            settings.report_year,
        ),
        defect_types: defect_type_counts(&bugs),
    }
}

fn bold(text: &str) -> String {
    format!("**{text}**")
}

fn slice_row(label: &str, slice: &DeploymentSlice, total_bugs: usize) -> String {
    md_row([
        bold(label),
        slice.total.to_string(),
        slice.resolution.resolved.to_string(),
        pct(slice.resolution.resolution_rate),
        pct(percent(slice.total, total_bugs)),
    ])
}

fn tier_row(label: &str, slice: &DeploymentSlice) -> String {
    let res = &slice.resolution;
    md_row([
        bold(label),
        res.p0.total.to_string(),
        res.p0.resolved.to_string(),
        pct(res.p0.rate),
        res.p1.total.to_string(),
        res.p1.resolved.to_string(),
        pct(res.p1.rate),
    ])
}

fn level_split_row(label: &str, counts: &LevelCounts, total: usize) -> String {
    md_row([
        bold(label),
        counts.total.to_string(),
        counts.p0.to_string(),
        counts.p1.to_string(),
        pct(percent(counts.total, total)),
    ])
}

pub fn render_annual_summary(summary: &AnnualSummary, settings: &LensSettings, generated_on: &str) -> String {
    let year = settings.report_year;
    let inc = &summary.incidents;
    let inc_total = inc.levels.total;
    let bugs = &summary.bugs;
    let saas = &summary.deployments.saas;
    let private = &summary.deployments.private;
    let unclassified = &summary.deployments.unclassified;
    let total_bugs = summary.deployments.total_bugs;
    let mut out: Vec<String> = Vec::new();

    out.push(format!("# {year}年度研发质量体系年终总结\n"));
    out.push(format!("**生成时间**: {generated_on}\n"));

    out.push("## 一、年度质量核心指标\n".to_string());
    out.push("### 1.1 关键数据一览\n".to_string());
    out.extend(md_header(&["指标", "数值", "说明"]));
    out.push(md_row(["线上重大故障总数".to_string(), bold(&format!("{inc_total}个")), "全年累计".to_string()]));
    out.push(md_row([
        "P0阻塞性故障".to_string(),
        bold(&format!("{}个", inc.levels.p0)),
        format!("占比{}", pct(percent(inc.levels.p0, inc_total))),
    ]));
    out.push(md_row([
        "P1核心功能故障".to_string(),
        bold(&format!("{}个", inc.levels.p1)),
        format!("占比{}", pct(percent(inc.levels.p1, inc_total))),
    ]));
    out.push(md_row(["Jira Bug总数".to_string(), bold(&format!("{}个", bugs.total)), "含故障+缺陷".to_string()]));
    out.push(md_row(["Bug解决率".to_string(), bold(&pct(bugs.resolution_rate)), "已完成/总数".to_string()]));
    out.push(md_row(["P0故障解决率".to_string(), bold(&pct(bugs.p0.rate)), "高优先级及时处理".to_string()]));
    out.push(md_row(["P1故障解决率".to_string(), bold(&pct(bugs.p1.rate)), "核心功能保障".to_string()]));
    out.push(String::new());

    out.push("## 二、SaaS与私有化Bug对比分析\n".to_string());
    out.push("### 2.1 Bug数量对比\n".to_string());
    out.extend(md_header(&["环境", "Bug总数", "已解决", "解决率", "占比"]));
    out.push(slice_row("SaaS", saas, total_bugs));
    out.push(slice_row("私有化", private, total_bugs));
    if unclassified.total > 0 {
        out.push(md_row([
            "其他/未标记".to_string(),
            unclassified.total.to_string(),
            "-".to_string(),
            "-".to_string(),
            pct(percent(unclassified.total, total_bugs)),
        ]));
    }
    out.push(String::new());

    out.push("### 2.2 P0/P1故障对比\n".to_string());
    out.extend(md_header(&["环境", "P0总数", "P0已解决", "P0解决率", "P1总数", "P1已解决", "P1解决率"]));
    out.push(tier_row("SaaS", saas));
    out.push(tier_row("私有化", private));
    out.push(String::new());

    out.push("### 2.3 月度Bug趋势对比\n".to_string());
    out.extend(md_header(&["月份", "SaaS", "私有化"]));
    for month in 1..=12 {
        let (s, p) = (saas.monthly.get(month), private.monthly.get(month));
        if s > 0 || p > 0 {
            out.push(md_row([format!("{month}月"), s.to_string(), p.to_string()]));
        }
    }
    out.push(String::new());

    out.push("### 2.4 缺陷类型对比\n".to_string());
    for (label, slice) in [("SaaS", saas), ("私有化", private)] {
        out.push(format!("**{label}缺陷类型Top5：**\n"));
        out.extend(md_header(&["缺陷类型", "数量"]));
        for (kind, count) in slice.defect_types.top(5) {
            out.push(md_row([kind.clone(), count.to_string()]));
        }
        out.push(String::new());
    }

    out.push("## 三、线上重大故障分析\n".to_string());
    out.push("### 3.1 故障等级分布\n".to_string());
    out.extend(md_header(&["等级", "数量", "占比", "定义"]));
    for level in IncidentLevel::ALL {
        let count = inc.levels.get(level);
        out.push(md_row([
            level.code().to_string(),
            count.to_string(),
            pct(percent(count, inc_total)),
            level.description().to_string(),
        ]));
    }
    out.push(String::new());

    out.push("### 3.2 SaaS vs 私有化故障对比\n".to_string());
    out.extend(md_header(&["类型", "故障数", "P0数", "P1数", "占比"]));
    out.push(level_split_row("SaaS", &inc.saas, inc_total));
    out.push(level_split_row("私有化", &inc.private, inc_total));
    out.push(String::new());

    out.push("### 3.3 团队归属分布\n".to_string());
    out.extend(md_header(&["团队", "故障数", "占比"]));
    for (team, count) in &inc.team_dist.entries {
        out.push(md_row([team.clone(), count.to_string(), pct(percent(*count, inc_total))]));
    }
    out.push(String::new());

    out.push("## 四、根本原因分析\n".to_string());
    out.push("### 4.1 整体缺陷类型分布\n".to_string());
    out.extend(md_header(&["缺陷类型", "数量", "占比"]));
    let top_defects = summary.defect_types.top(10);
    let shown: usize = top_defects.iter().map(|(_, c)| c).sum();
    for (kind, count) in top_defects {
        out.push(md_row([kind.clone(), count.to_string(), pct(percent(*count, shown))]));
    }
    out.push(String::new());

    out.push("## 五、故障解决效率\n".to_string());
    out.push("### 5.1 整体解决状态\n".to_string());
    out.extend(md_header(&["状态", "数量", "占比"]));
    for (status, count) in bugs.status_dist.top(8) {
        out.push(md_row([status.clone(), count.to_string(), pct(percent(*count, bugs.total))]));
    }
    out.push(String::new());

    out.push("### 5.2 解决率汇总\n".to_string());
    out.extend(md_header(&["维度", "总数", "已解决", "解决率"]));
    let rows = [
        ("整体", bugs.total, bugs.resolved, bugs.resolution_rate),
        ("SaaS", saas.total, saas.resolution.resolved, saas.resolution.resolution_rate),
        ("私有化", private.total, private.resolution.resolved, private.resolution.resolution_rate),
        ("P0", bugs.p0.total, bugs.p0.resolved, bugs.p0.rate),
        ("P1", bugs.p1.total, bugs.p1.resolved, bugs.p1.rate),
    ];
    for (label, total, resolved, rate) in rows {
        out.push(md_row([label.to_string(), total.to_string(), resolved.to_string(), pct(rate)]));
    }
    out.push(String::new());
    out.push(format!("未解决Bug（待办/处理中/挂起中）：{}个\n", bugs.unresolved_count));

    out.push("\n---\n".to_string());
    out.push("**数据来源**：".to_string());
    out.push(format!("- 线上故障问题表：{}", file_label(&settings.paths.incidents_csv)));
    out.push(format!("- Jira项目管理数据：{}", file_label(&settings.paths.issues_csv)));
    out.push(format!("- 统计周期：{year}年1月-12月"));

    out.join("\n")
}
