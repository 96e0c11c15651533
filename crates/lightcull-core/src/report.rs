use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use crate::error::{CullError, Result};
use crate::model::{Action, RejectReason, ResultRow, Status};

pub const BEGIN_MARKER: &str = "--- BEGIN VISUALIZATION DATA ---";
pub const END_MARKER: &str = "--- END VISUALIZATION DATA ---";

/// Aggregate counts for the human-readable summary block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    pub kept: usize,
    pub rejected_snr: usize,
    pub rejected_trail: usize,
    pub rejected_other: usize,
    pub with_trails: usize,
}

impl RunSummary {
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        let mut summary = Self {
            total: rows.len(),
            ..Self::default()
        };
        for row in rows {
            match row.status {
                Status::Ok => summary.ok += 1,
                Status::Error => summary.errors += 1,
            }
            if row.has_trails {
                summary.with_trails += 1;
            }
            match row.action {
                Some(Action::Kept) => summary.kept += 1,
                Some(Action::Rejected) => match row.rejected_reason {
                    Some(RejectReason::LowSnr) => summary.rejected_snr += 1,
                    Some(RejectReason::TrailDetected) => summary.rejected_trail += 1,
                    _ => summary.rejected_other += 1,
                },
                None => {}
            }
        }
        summary
    }

    pub fn kept_percent(&self) -> f64 {
        if self.ok == 0 {
            0.0
        } else {
            100.0 * self.kept as f64 / self.ok as f64
        }
    }
}

/// Append a complete run report to the log: free-text header, per-file
/// table, summary, then the fenced JSON block a later session reloads.
///
/// Write failures propagate: a missing block breaks the reload contract
/// every front-end depends on.
pub fn write_log(path: &Path, rows: &[ResultRow]) -> Result<()> {
    let summary = RunSummary::from_rows(rows);
    let mut text = String::new();

    let _ = writeln!(text, "Analysis started: {} file(s)", rows.len());
    let _ = writeln!(text);
    let _ = writeln!(text, "Individual analysis:");
    let _ = writeln!(
        text,
        "{:<40} {:>7} {:>9} {:>7} {:>6} {:>7} {:>7}  {}",
        "file", "status", "snr", "fwhm", "ecc", "stars", "trails", "action"
    );
    for row in rows {
        let _ = writeln!(
            text,
            "{:<40} {:>7} {:>9} {:>7} {:>6} {:>7} {:>7}  {}",
            row.rel_path,
            row.status,
            fmt_opt(row.snr, 2),
            fmt_opt(row.fwhm, 2),
            fmt_opt(row.ecc, 3),
            row.starcount.map(|v| v.to_string()).unwrap_or_default(),
            row.num_trails,
            row.action.map(|a| a.to_string()).unwrap_or_default(),
        );
    }

    let _ = writeln!(text);
    let _ = writeln!(
        text,
        "Analysis summary: {} ok, {} error(s), {} with trails",
        summary.ok, summary.errors, summary.with_trails
    );
    // Both existing front-ends grep for this exact French phrasing.
    let _ = writeln!(
        text,
        "Sélection SNR : {} images conservées sur {} ({:.1} %)",
        summary.kept,
        summary.ok,
        summary.kept_percent()
    );
    if summary.rejected_snr + summary.rejected_trail + summary.rejected_other > 0 {
        let _ = writeln!(
            text,
            "Rejected: {} low SNR, {} trails, {} other",
            summary.rejected_snr, summary.rejected_trail, summary.rejected_other
        );
    }

    let _ = writeln!(text);
    let _ = writeln!(text, "{BEGIN_MARKER}");
    let json = serde_json::to_string_pretty(rows)?;
    text.push_str(&json);
    let _ = writeln!(text);
    let _ = writeln!(text, "{END_MARKER}");
    let _ = writeln!(text);

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => String::new(),
    }
}

/// Reload the result rows from a log file.
///
/// Scans for the last END marker and the nearest preceding BEGIN marker:
/// when several runs appended blocks, only the most recent one counts.
pub fn reload_rows(path: &Path) -> Result<Vec<ResultRow>> {
    let text = std::fs::read_to_string(path)?;

    let end = text.rfind(END_MARKER).ok_or_else(|| {
        CullError::Report(format!("no '{END_MARKER}' block in {}", path.display()))
    })?;
    let begin = text[..end].rfind(BEGIN_MARKER).ok_or_else(|| {
        CullError::Report(format!(
            "'{END_MARKER}' without matching '{BEGIN_MARKER}' in {}",
            path.display()
        ))
    })?;

    let body = text[begin + BEGIN_MARKER.len()..end].trim();
    let rows: Vec<ResultRow> = serde_json::from_str(body)?;
    Ok(rows)
}
