mod common;

use common::{error_row, row_with_snr};
use lightcull_core::model::{Action, RejectReason, ResultRow};
use lightcull_core::report::{reload_rows, write_log, RunSummary, BEGIN_MARKER, END_MARKER};

fn selected_rows() -> Vec<ResultRow> {
    let mut rows: Vec<ResultRow> = (0..5).map(|i| row_with_snr(i, 10.0 + i as f64)).collect();
    for row in rows.iter_mut().take(4) {
        row.action = Some(Action::Kept);
    }
    rows[4].action = Some(Action::Rejected);
    rows[4].rejected_reason = Some(RejectReason::LowSnr);
    rows[2].fwhm = Some(2.7);
    rows[2].ecc = Some(0.31);
    rows[2].starcount = Some(412);
    rows.push(error_row(5));
    rows
}

#[test]
fn test_round_trip_preserves_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("session.log");

    let rows = selected_rows();
    write_log(&log, &rows).expect("write log");

    let reloaded = reload_rows(&log).expect("reload");
    assert_eq!(reloaded, rows);
}

#[test]
fn test_reload_takes_last_block() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("session.log");

    let first = selected_rows();
    write_log(&log, &first).expect("first write");

    let second: Vec<ResultRow> = (0..2).map(|i| row_with_snr(i, 50.0 + i as f64)).collect();
    write_log(&log, &second).expect("second write");

    let reloaded = reload_rows(&log).expect("reload");
    assert_eq!(reloaded, second, "append mode: only the last block counts");

    // Both runs remain in the text.
    let text = std::fs::read_to_string(&log).expect("read");
    assert_eq!(text.matches(BEGIN_MARKER).count(), 2);
    assert_eq!(text.matches(END_MARKER).count(), 2);
}

#[test]
fn test_log_contains_selection_summary_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("session.log");
    write_log(&log, &selected_rows()).expect("write log");

    let text = std::fs::read_to_string(&log).expect("read");
    // 4 kept of 5 ok rows (the error row does not count as analyzed-ok).
    assert!(
        text.contains("Sélection SNR : 4 images conservées sur 5 (80.0 %)"),
        "summary line missing or wrong:\n{text}"
    );
    assert!(text.contains("Individual analysis:"));
}

#[test]
fn test_reload_without_block_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("session.log");
    std::fs::write(&log, "just some notes\n").expect("write");

    assert!(reload_rows(&log).is_err());
}

#[test]
fn test_reload_end_without_begin_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("session.log");
    std::fs::write(&log, format!("{END_MARKER}\n")).expect("write");

    assert!(reload_rows(&log).is_err());
}

#[test]
fn test_summary_counts() {
    let rows = selected_rows();
    let summary = RunSummary::from_rows(&rows);
    assert_eq!(summary.total, 6);
    assert_eq!(summary.ok, 5);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.kept, 4);
    assert_eq!(summary.rejected_snr, 1);
    assert_eq!(summary.rejected_trail, 0);
    assert!((summary.kept_percent() - 80.0).abs() < 1e-9);
}

#[test]
fn test_summary_empty_rows() {
    let summary = RunSummary::from_rows(&[]);
    assert_eq!(summary.total, 0);
    assert!(summary.kept_percent().abs() < 1e-9);
}
