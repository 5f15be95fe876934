use std::path::{Path, PathBuf};

use shared::ErrorLogRequest;

const SEPARATOR_WIDTH: usize = 50;

/// Write a client error report to `<dir>/frontend_error_<timestamp>_<id>.log`.
///
/// The random suffix keeps reports from the same millisecond apart.
///
/// Returns the path of the written file.
pub async fn write_report(dir: &Path, report: &ErrorLogRequest) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
    let id = uuid::Uuid::new_v4().simple().to_string();
    let path = dir.join(format!("frontend_error_{}_{}.log", stamp, &id[..8]));
    tokio::fs::write(&path, render_report(report)).await?;
    Ok(path)
}

pub fn render_report(report: &ErrorLogRequest) -> String {
    let rule = "-".repeat(SEPARATOR_WIDTH);
    let mut out = format!(
        "TIMESTAMP: {}\nSOURCE: {}\nERROR: {}\n{}\n",
        report.timestamp, report.source, report.error, rule
    );
    if let Some(code) = report.code.as_deref() {
        out.push_str("CODE THAT CAUSED ERROR:\n");
        out.push_str(code);
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
    }
    out
}
