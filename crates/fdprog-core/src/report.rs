//! Report lines: what the tracker produces each tick and how it is printed.

use serde::Serialize;
use std::path::PathBuf;

use crate::config::ReportFormat;
use crate::tracker::Eta;

/// Progress of one file at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressLine {
    pub path: PathBuf,
    /// offset / size * 100; may exceed 100 when the cached size is stale.
    pub percent: f64,
    pub eta: Option<Eta>,
}

/// JSON shape of a report line.
#[derive(Debug, Serialize)]
struct JsonLine {
    path: String,
    percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    eta_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eta: Option<String>,
}

/// `PATH NN.NN%` followed by ` ETA H:MM:SS` when an ETA is known.
pub fn format_text(line: &ProgressLine) -> String {
    let mut out = format!("{} {:.2}%", line.path.display(), line.percent);
    if let Some(eta) = line.eta {
        out.push_str(&format!(" ETA {}", eta));
    }
    out
}

/// One-line JSON object; percent is the same two-decimal value the text form prints.
pub fn format_json(line: &ProgressLine) -> String {
    let json = JsonLine {
        path: line.path.display().to_string(),
        percent: format!("{:.2}", line.percent)
            .parse()
            .unwrap_or(line.percent),
        eta_secs: line.eta.map(|e| e.as_secs()),
        eta: line.eta.map(|e| e.to_string()),
    };
    // A struct of strings and numbers cannot fail to serialize.
    serde_json::to_string(&json).unwrap_or_default()
}

pub fn format_line(line: &ProgressLine, format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => format_text(line),
        ReportFormat::Json => format_json(line),
    }
}
