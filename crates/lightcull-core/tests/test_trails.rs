mod common;

use common::{add_diagonal_streak, add_gaussian_star, flat_image};
use lightcull_core::trails::{availability, detect, Availability, TrailParams};

fn probe_like_params() -> TrailParams {
    TrailParams {
        line_len: 60,
        ..TrailParams::default()
    }
}

#[test]
fn test_streak_is_detected() {
    let mut img = flat_image(128, 128, 0.0);
    add_diagonal_streak(&mut img, 1.0);

    let report = detect(&img, &probe_like_params());
    assert!(report.has_trails, "full-frame streak must be found");
    assert!(report.num_trails >= 1);
}

#[test]
fn test_blank_image_has_no_trails() {
    let img = flat_image(128, 128, 0.1);
    let report = detect(&img, &probe_like_params());
    assert!(!report.has_trails);
    assert_eq!(report.num_trails, 0);
}

#[test]
fn test_stars_alone_are_not_trails() {
    let mut img = flat_image(128, 128, 0.1);
    add_gaussian_star(&mut img, 40.0, 40.0, 1.5, 0.6);
    add_gaussian_star(&mut img, 80.0, 90.0, 1.5, 0.6);
    add_gaussian_star(&mut img, 100.0, 30.0, 1.5, 0.6);

    let report = detect(&img, &TrailParams::default());
    assert!(
        !report.has_trails,
        "compact sources must not register as trails"
    );
}

#[test]
fn test_tiny_image_reports_nothing() {
    let img = flat_image(4, 4, 0.5);
    let report = detect(&img, &TrailParams::default());
    assert!(!report.has_trails);
}

#[test]
fn test_short_streak_rejected_by_line_len() {
    let mut img = flat_image(128, 128, 0.0);
    // 30-pixel diagonal segment, well under line_len = 60.
    for i in 40..70 {
        img[[i, i]] = 1.0;
        img[[i, i + 1]] = 1.0;
    }

    let report = detect(&img, &probe_like_params());
    assert!(!report.has_trails);
}

#[test]
fn test_self_probe_reports_available() {
    assert_eq!(availability(), Availability::Available);
    // Cached: the second call must agree.
    assert_eq!(availability(), Availability::Available);
}
