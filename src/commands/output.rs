use crate::error::LensResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a report into `output_dir`, creating the directory if needed.
pub fn write_output(output_dir: &Path, file_name: &str, body: &str) -> LensResult<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(file_name);
    fs::write(&path, body)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

/// Markdown table row from already formatted cells.
pub fn md_row<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let inner: Vec<String> = cells.into_iter().map(|c| c.as_ref().to_string()).collect();
    format!("| {} |", inner.join(" | "))
}

pub fn md_header(columns: &[&str]) -> Vec<String> {
    vec![
        md_row(columns.iter()),
        md_row(columns.iter().map(|c| "-".repeat(c.chars().count().max(3) * 2))),
    ]
}

pub fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

/// Section banner used by the plain-text reports.
pub fn banner(title: &str) -> Vec<String> {
    let rule = "=".repeat(80);
    vec![String::new(), rule.clone(), title.to_string(), rule]
}
