use console::Style;
use lightcull_core::model::{Action, RejectReason, ResultRow, Status};
use lightcull_core::report::RunSummary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    kept: Style,
    rejected: Style,
    error: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            kept: Style::new().green(),
            rejected: Style::new().yellow(),
            error: Style::new().red(),
        }
    }
}

/// Styled per-run summary block printed after an analysis or reload.
pub fn print_run_summary(rows: &[ResultRow]) {
    let s = Styles::new();
    let summary = RunSummary::from_rows(rows);

    println!();
    println!("  {}", s.title.apply_to("Run Summary"));
    println!("  {}", s.title.apply_to("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}"));
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Analyzed"),
        s.value.apply_to(summary.total)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Kept"),
        s.kept
            .apply_to(format!("{} ({:.1}%)", summary.kept, summary.kept_percent()))
    );
    if summary.rejected_snr > 0 {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Low SNR"),
            s.rejected.apply_to(summary.rejected_snr)
        );
    }
    if summary.rejected_trail > 0 {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Trails"),
            s.rejected.apply_to(summary.rejected_trail)
        );
    }
    if summary.rejected_other > 0 {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Other"),
            s.rejected.apply_to(summary.rejected_other)
        );
    }
    if summary.errors > 0 {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Errors"),
            s.error.apply_to(summary.errors)
        );
    }
    println!();
}

/// Full per-file table, one line per row.
pub fn print_result_table(rows: &[ResultRow]) {
    let s = Styles::new();

    println!(
        "  {}",
        s.header.apply_to(format!(
            "{:<40} {:>9} {:>7} {:>6} {:>7} {:>7}  {}",
            "file", "snr", "fwhm", "ecc", "stars", "trails", "action"
        ))
    );
    for row in rows {
        let action = match (row.status, row.action) {
            (Status::Error, _) => s.error.apply_to("error".to_string()),
            (_, Some(Action::Kept)) => s.kept.apply_to("kept".to_string()),
            (_, Some(Action::Rejected)) => {
                s.rejected.apply_to(reason_label(row.rejected_reason))
            }
            (_, None) => s.label.apply_to("pending".to_string()),
        };
        println!(
            "  {:<40} {:>9} {:>7} {:>6} {:>7} {:>7}  {}",
            row.rel_path,
            fmt_opt(row.snr, 2),
            fmt_opt(row.fwhm, 2),
            fmt_opt(row.ecc, 3),
            row.starcount.map(|v| v.to_string()).unwrap_or_default(),
            row.num_trails,
            action
        );
    }
    println!();
}

fn reason_label(reason: Option<RejectReason>) -> String {
    match reason {
        Some(r) => format!("rejected ({r})"),
        None => "rejected".to_string(),
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => String::new(),
    }
}
