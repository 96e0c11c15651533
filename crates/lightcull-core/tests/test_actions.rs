mod common;

use std::path::Path;

use common::row_with_snr;
use lightcull_core::actions::{apply_rejected_files, unique_destination, RejectDisposition};
use lightcull_core::model::{Action, RejectReason, ResultRow};

fn rejected_row(path: &Path, reason: RejectReason) -> ResultRow {
    let file = path.file_name().unwrap().to_string_lossy().into_owned();
    let mut row = ResultRow::pending(
        file.clone(),
        path.to_string_lossy().into_owned(),
        file,
    );
    row.action = Some(Action::Rejected);
    row.rejected_reason = Some(reason);
    row
}

#[test]
fn test_unique_destination_suffixes_on_collision() {
    let dir = tempfile::tempdir().expect("tempdir");

    let first = unique_destination(dir.path(), "light.png");
    assert_eq!(first, dir.path().join("light.png"));
    std::fs::write(&first, b"x").expect("write");

    let second = unique_destination(dir.path(), "light.png");
    assert_eq!(second, dir.path().join("light__01.png"));
    std::fs::write(&second, b"x").expect("write");

    let third = unique_destination(dir.path(), "light.png");
    assert_eq!(third, dir.path().join("light__02.png"));

    // No extension: suffix goes at the end.
    std::fs::write(dir.path().join("notes"), b"x").expect("write");
    assert_eq!(
        unique_destination(dir.path(), "notes"),
        dir.path().join("notes__01")
    );
}

#[test]
fn test_move_rejected_files() {
    let src = tempfile::tempdir().expect("tempdir");
    let reject = src.path().join("rejected");

    let a = src.path().join("a.png");
    let b = src.path().join("b.png");
    std::fs::write(&a, b"a").expect("write");
    std::fs::write(&b, b"b").expect("write");

    let mut kept = row_with_snr(0, 20.0);
    kept.action = Some(Action::Kept);
    let rows = vec![
        rejected_row(&a, RejectReason::LowSnr),
        rejected_row(&b, RejectReason::LowSnr),
        kept,
    ];

    let acted = apply_rejected_files(
        &rows,
        RejectReason::LowSnr,
        RejectDisposition::Move,
        Some(&reject),
    )
    .expect("apply");

    assert_eq!(acted, 2);
    assert!(!a.exists());
    assert!(!b.exists());
    assert!(reject.join("a.png").exists());
    assert!(reject.join("b.png").exists());
}

#[test]
fn test_move_collides_into_suffixed_name() {
    let src = tempfile::tempdir().expect("tempdir");
    let reject = src.path().join("rejected");
    std::fs::create_dir_all(&reject).expect("mkdir");
    std::fs::write(reject.join("a.png"), b"old").expect("write");

    let a = src.path().join("a.png");
    std::fs::write(&a, b"new").expect("write");
    let rows = vec![rejected_row(&a, RejectReason::TrailDetected)];

    let acted = apply_rejected_files(
        &rows,
        RejectReason::TrailDetected,
        RejectDisposition::Move,
        Some(&reject),
    )
    .expect("apply");

    assert_eq!(acted, 1);
    assert!(reject.join("a__01.png").exists());
    assert_eq!(
        std::fs::read(reject.join("a.png")).expect("read"),
        b"old",
        "existing file must not be clobbered"
    );
}

#[test]
fn test_delete_rejected_files() {
    let src = tempfile::tempdir().expect("tempdir");
    let a = src.path().join("a.png");
    std::fs::write(&a, b"a").expect("write");

    let rows = vec![rejected_row(&a, RejectReason::LowSnr)];
    let acted =
        apply_rejected_files(&rows, RejectReason::LowSnr, RejectDisposition::Delete, None)
            .expect("apply");

    assert_eq!(acted, 1);
    assert!(!a.exists());
}

#[test]
fn test_only_matching_reason_acted_on() {
    let src = tempfile::tempdir().expect("tempdir");
    let a = src.path().join("a.png");
    std::fs::write(&a, b"a").expect("write");

    let rows = vec![rejected_row(&a, RejectReason::TrailDetected)];
    let acted =
        apply_rejected_files(&rows, RejectReason::LowSnr, RejectDisposition::Delete, None)
            .expect("apply");

    assert_eq!(acted, 0);
    assert!(a.exists(), "trail-rejected file must survive the SNR pass");
}

#[test]
fn test_missing_source_skipped() {
    let src = tempfile::tempdir().expect("tempdir");
    let gone = src.path().join("gone.png");
    let rows = vec![rejected_row(&gone, RejectReason::LowSnr)];

    // Second pass over already-moved files is a no-op, not an error.
    let acted =
        apply_rejected_files(&rows, RejectReason::LowSnr, RejectDisposition::Delete, None)
            .expect("apply");
    assert_eq!(acted, 0);
}
