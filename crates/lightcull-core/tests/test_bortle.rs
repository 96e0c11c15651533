use approx::assert_abs_diff_eq;

use lightcull_core::bortle::{ucd_to_sqm, BortleScale};

#[test]
fn test_default_scale_classification() {
    let scale = BortleScale::default();
    assert_eq!(scale.class_for_sqm(22.0), 1);
    assert_eq!(scale.class_for_sqm(21.8), 2);
    assert_eq!(scale.class_for_sqm(21.0), 4);
    assert_eq!(scale.class_for_sqm(19.0), 7);
    assert_eq!(scale.class_for_sqm(10.0), 9);
}

#[test]
fn test_luminance_conversion() {
    // 174 ucd/m^2 is the reference luminance for SQM 22.0.
    assert_abs_diff_eq!(ucd_to_sqm(174.0), 22.0, epsilon = 1e-9);
    // Brighter sky, lower SQM.
    assert!(ucd_to_sqm(1740.0) < 22.0);
    assert_eq!(BortleScale::default().class_for_luminance(174.0), 1);
}

#[test]
fn test_threshold_override_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bortle.json");
    std::fs::write(&path, r#"{"1": 21.0, "5": 18.0, "9": 0.0}"#).expect("write");

    let scale = BortleScale::load(Some(&path)).expect("load");
    assert_eq!(scale.class_for_sqm(21.5), 1);
    assert_eq!(scale.class_for_sqm(19.0), 5);
    assert_eq!(scale.class_for_sqm(5.0), 9);
}

#[test]
fn test_missing_override_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(BortleScale::load(Some(&dir.path().join("nope.json"))).is_err());
}

#[test]
fn test_no_override_uses_defaults() {
    let scale = BortleScale::load(None).expect("load");
    assert_eq!(scale.class_for_sqm(22.0), 1);
}
