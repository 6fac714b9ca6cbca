use crate::commands::bugs::{analyze_bugs, render_bug_overview};
use crate::commands::deployment::{analyze_deployments, render_deployment_comparison};
use crate::commands::ingest::{load_dataset, Dataset};
use crate::commands::output::write_output;
use crate::commands::quality::{analyze_quality, render_quality_report};
use crate::commands::settings::LensSettings;
use crate::commands::summary::{analyze_summary, render_annual_summary};
use crate::error::LensResult;
use crate::models::report::{ReportKind, ReportOutput, ReportProgress};
use chrono::NaiveDateTime;

pub fn render_report(
    kind: ReportKind,
    data: &Dataset,
    settings: &LensSettings,
    generated_at: NaiveDateTime,
) -> String {
    match kind {
        ReportKind::Quality => {
            let findings = analyze_quality(data, settings);
            let stamp = generated_at.format("%Y-%m-%d %H:%M:%S").to_string();
            render_quality_report(&findings, settings, &stamp)
        }
        ReportKind::Summary => {
            let summary = analyze_summary(data, settings);
            let stamp = generated_at.format("%Y-%m-%d").to_string();
            render_annual_summary(&summary, settings, &stamp)
        }
        ReportKind::Deployment => render_deployment_comparison(&analyze_deployments(data, settings), settings),
        ReportKind::Bugs => render_bug_overview(&analyze_bugs(data, settings), settings),
    }
}

/// Loads the inputs once and writes each requested report, reporting progress
/// before each one.
pub fn run_reports_internal<F>(
    settings: &LensSettings,
    kinds: &[ReportKind],
    generated_at: NaiveDateTime,
    mut emit_progress: F,
) -> LensResult<Vec<ReportOutput>>
where
    F: FnMut(ReportProgress),
{
    let with_incidents = kinds.iter().any(ReportKind::needs_incidents);
    let data = load_dataset(settings, with_incidents)?;
    log::info!(
        "Loaded {} tracker rows and {} incidents",
        data.issues.len(),
        data.incidents.len()
    );

    let total = kinds.len();
    let mut outputs = Vec::with_capacity(total);
    for (index, kind) in kinds.iter().enumerate() {
        emit_progress(ReportProgress {
            current: index + 1,
            total,
            report: *kind,
        });

        let body = render_report(*kind, &data, settings, generated_at);
        let path = write_output(&settings.paths.output_dir, kind.file_name(), &body)?;
        outputs.push(ReportOutput {
            kind: *kind,
            path,
            body,
        });
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LensError;
    use std::fs;

    #[test]
    fn bug_reports_skip_the_incident_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = dir.path().join("data");
        fs::create_dir_all(&data).expect("mkdir");
        fs::write(data.join("issues.csv"), "问题类型,概要,状态\nBug,登录失败,完成\n").expect("write");
        let settings = LensSettings::defaults_for(dir.path()).expect("settings");
        let now = chrono::NaiveDate::from_ymd_opt(2025, 12, 31)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("timestamp");

        let mut seen = Vec::new();
        let outputs = run_reports_internal(&settings, &[ReportKind::Deployment, ReportKind::Bugs], now, |p| {
            seen.push((p.current, p.total, p.report));
        })
        .expect("reports");

        assert_eq!(
            seen,
            vec![(1, 2, ReportKind::Deployment), (2, 2, ReportKind::Bugs)]
        );
        assert_eq!(outputs.len(), 2);
        assert!(outputs[1].path.ends_with("reports/bug_overview.txt"));
        assert!(outputs[1].body.contains("总Bug数量: 1"));

        let err = run_reports_internal(&settings, &[ReportKind::Quality], now, |_| {}).expect_err("no incidents");
        assert!(matches!(err, LensError::Io(_)));
    }
}
