use crate::analysis::weekly::{
    client_health, date_range, incident_digest, parse_report, personnel_digest, product_progress,
    search_by_client, search_by_keyword,
};
use crate::commands::output::write_output;
use crate::commands::settings::LensSettings;
use crate::error::{LensError, LensResult};
use crate::models::weekly::{HealthStatus, WeeklyAnalysis, WeeklyEntry};
use std::fs;
use std::path::{Path, PathBuf};

pub const EXPORT_FILE_NAME: &str = "weekly_report_analysis.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeeklyCommand {
    Summary,
    Client(String),
    Search(String),
    Incidents,
    Products,
    Export,
}

/// Every `*.md` file under the weekly directory, in path order.
pub fn load_weekly_entries(settings: &LensSettings) -> LensResult<Vec<WeeklyEntry>> {
    // The directory is literal; only the file name is a pattern.
    let dir = glob::Pattern::escape(&settings.paths.weekly_dir.to_string_lossy());
    let pattern = Path::new(&dir).join("*.md");
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        files.push(entry.map_err(|e| e.into_error())?);
    }
    files.sort();

    let mut entries = Vec::new();
    for file in &files {
        let content = fs::read_to_string(file)?;
        let parsed = parse_report(&content, &settings.weekly);
        log::info!("Loaded {} weekly entries from {}", parsed.len(), file.display());
        entries.extend(parsed);
    }
    Ok(entries)
}

pub fn build_weekly_analysis(
    entries: &[WeeklyEntry],
    settings: &LensSettings,
    generated_at: &str,
) -> WeeklyAnalysis {
    WeeklyAnalysis {
        generated_at: generated_at.to_string(),
        total_entries: entries.len(),
        date_range: date_range(entries),
        client_health: client_health(entries),
        product_progress: product_progress(entries, &settings.weekly),
        incidents: incident_digest(entries),
        personnel: personnel_digest(entries),
    }
}

fn heading(out: &mut Vec<String>, title: &str) {
    out.push(String::new());
    out.push(title.to_string());
    out.push("-".repeat(title.chars().count().max(12)));
}

pub fn render_executive_summary(analysis: &WeeklyAnalysis) -> String {
    let rule = "=".repeat(80);
    let mut out = vec![
        rule.clone(),
        format!("{:^80}", "WEEKLY REPORT ANALYSIS SUMMARY"),
        rule.clone(),
    ];

    heading(&mut out, "📊 OVERVIEW");
    let range = &analysis.date_range;
    out.push(format!(
        "• Analysis Period: {} - {}",
        range.start.as_deref().unwrap_or("N/A"),
        range.end.as_deref().unwrap_or("N/A")
    ));
    out.push(format!("• Total Weekly Reports Analyzed: {}", analysis.total_entries));
    out.push(format!("• Total Clients Tracked: {}", analysis.client_health.len()));
    out.push(format!("• Total Incidents Recorded: {}", analysis.incidents.total_incidents));

    heading(&mut out, "👥 TOP 10 CLIENTS BY ENGAGEMENT");
    if analysis.client_health.is_empty() {
        out.push("  No clients found".to_string());
    }
    for (idx, health) in analysis.client_health.iter().take(10).enumerate() {
        out.push(format!(
            "  {:2}. {} {}: {} mentions, {} incidents",
            idx + 1,
            health.health_status.icon(),
            health.client,
            health.total_mentions,
            health.incident_count
        ));
    }

    heading(&mut out, "⚠️  CLIENTS REQUIRING ATTENTION");
    let attention: Vec<_> = analysis
        .client_health
        .iter()
        .filter(|h| h.health_status != HealthStatus::Healthy)
        .collect();
    if attention.is_empty() {
        out.push("  ✅ All clients are in healthy status".to_string());
    }
    for health in attention.iter().take(5) {
        out.push(format!(
            "  • {}: incident ratio {:.0}%",
            health.client,
            health.incident_ratio * 100.0
        ));
    }

    heading(&mut out, "🚀 PRODUCT LINE ACTIVITY");
    let mut active = analysis.product_progress.clone();
    active.sort_by(|a, b| b.weekly_mentions.cmp(&a.weekly_mentions));
    for product in active.iter().take(5) {
        out.push(format!(
            "  {} {}: {} weeks active ({})",
            product.activity_level.icon(),
            product.product,
            product.weekly_mentions,
            product.activity_level.as_str()
        ));
    }
    if active.is_empty() {
        out.push("  No product activity tracked".to_string());
    }

    heading(&mut out, "📉 INCIDENT TRENDS (Monthly)");
    let monthly = &analysis.incidents.monthly_distribution;
    if monthly.is_empty() {
        out.push("  No incidents recorded".to_string());
    }
    for (month, count) in monthly.iter().skip(monthly.len().saturating_sub(6)) {
        let bar = "█".repeat((count / 2).min(20));
        out.push(format!("  {month}: {bar} ({count})"));
    }

    heading(&mut out, "👔 PERSONNEL CHANGES");
    let personnel = &analysis.personnel;
    out.push(format!("Total Personnel Events: {}", personnel.total_events));
    out.push("Recent Events:".to_string());
    let recent = &personnel.events[personnel.events.len().saturating_sub(5)..];
    if recent.is_empty() {
        out.push("  No recent personnel events".to_string());
    }
    for event in recent {
        let text: String = event.text.chars().take(60).collect();
        out.push(format!("  • [{}] {text}...", event.date));
    }

    out.push(String::new());
    out.push(rule);
    out.join("\n")
}

pub fn render_client_search(entries: &[WeeklyEntry], client: &str) -> String {
    let hits = search_by_client(entries, client);
    let mut out = vec![format!("Found {} weekly entries mentioning {client}", hits.len())];
    for hit in &hits {
        out.push(String::new());
        out.push(format!("[{}]", hit.date));
        for incident in &hit.incidents {
            out.push(format!("  ! {incident}"));
        }
        for line in &hit.relevant_content {
            out.push(format!("  {line}"));
        }
    }
    out.join("\n")
}

pub fn render_keyword_search(entries: &[WeeklyEntry], keyword: &str) -> String {
    let hits = search_by_keyword(entries, keyword);
    let mut out = vec![format!("Found {} weekly entries containing {keyword}", hits.len())];
    for hit in &hits {
        out.push(String::new());
        out.push(format!("[{}]", hit.date));
        out.extend(hit.matches.iter().map(|line| format!("  {line}")));
    }
    out.join("\n")
}

pub fn render_incidents(analysis: &WeeklyAnalysis) -> String {
    let digest = &analysis.incidents;
    let mut out = vec![format!("Total incidents: {}", digest.total_incidents)];

    heading(&mut out, "Monthly distribution");
    for (month, count) in &digest.monthly_distribution {
        out.push(format!("  {month}: {count}"));
    }
    heading(&mut out, "Clients by incidents");
    for (client, count) in &digest.client_incidents {
        out.push(format!("  {client}: {count}"));
    }
    heading(&mut out, "Recent incidents");
    for line in &digest.recent_incidents {
        out.push(format!("  [{}] {}", line.date, line.text));
    }
    out.join("\n")
}

pub fn render_products(analysis: &WeeklyAnalysis) -> String {
    let mut out = Vec::new();
    for product in &analysis.product_progress {
        out.push(format!(
            "{} {}: {} weeks active ({})",
            product.activity_level.icon(),
            product.product,
            product.weekly_mentions,
            product.activity_level.as_str()
        ));
        for (date, line) in &product.recent_activities {
            out.push(format!("  [{date}] {line}"));
        }
    }
    out.join("\n")
}

pub fn export_weekly_analysis(analysis: &WeeklyAnalysis, settings: &LensSettings) -> LensResult<PathBuf> {
    let body = serde_json::to_string_pretty(analysis)?;
    write_output(&settings.paths.output_dir, EXPORT_FILE_NAME, &body)
}

/// Runs one weekly subcommand and returns the text to print.
pub fn run_weekly(command: &WeeklyCommand, settings: &LensSettings, generated_at: &str) -> LensResult<String> {
    let entries = load_weekly_entries(settings)?;
    if entries.is_empty() {
        return Err(LensError::NoData(format!(
            "no dated sections found under {}",
            settings.paths.weekly_dir.display()
        )));
    }

    let text = match command {
        WeeklyCommand::Summary => render_executive_summary(&build_weekly_analysis(&entries, settings, generated_at)),
        WeeklyCommand::Client(name) => render_client_search(&entries, name),
        WeeklyCommand::Search(keyword) => render_keyword_search(&entries, keyword),
        WeeklyCommand::Incidents => render_incidents(&build_weekly_analysis(&entries, settings, generated_at)),
        WeeklyCommand::Products => render_products(&build_weekly_analysis(&entries, settings, generated_at)),
        WeeklyCommand::Export => {
            let analysis = build_weekly_analysis(&entries, settings, generated_at);
            let path = export_weekly_analysis(&analysis, settings)?;
            format!("Analysis exported to {}", path.display())
        }
    };
    Ok(text)
}
