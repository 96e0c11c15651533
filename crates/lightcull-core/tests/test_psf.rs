mod common;

use common::{add_elliptical_star, add_gaussian_star, flat_image};
use lightcull_core::consts::{FWHM_PER_SIGMA, PSF_BOX_RADIUS};
use lightcull_core::detect::StarCandidate;
use lightcull_core::psf::measure;

fn candidate_at(x: f64, y: f64) -> StarCandidate {
    StarCandidate {
        x,
        y,
        flux: 1.0,
        sharpness: 0.5,
        roundness1: 0.0,
        roundness2: 0.0,
    }
}

#[test]
fn test_round_star_fwhm_matches_sigma() {
    let sigma = 1.2;
    let mut img = flat_image(32, 32, 0.0);
    add_gaussian_star(&mut img, 16.0, 16.0, sigma, 0.5);

    let summary = measure(&img, &[candidate_at(16.0, 16.0)], 0.0, PSF_BOX_RADIUS);
    assert_eq!(summary.n_used, 1);

    let expected = FWHM_PER_SIGMA * sigma;
    let rel_err = (summary.fwhm - expected).abs() / expected;
    assert!(
        rel_err < 0.05,
        "fwhm {} vs expected {expected} (rel err {rel_err})",
        summary.fwhm
    );
    assert!(
        summary.ecc < 0.2,
        "round star should be near-circular, got ecc {}",
        summary.ecc
    );
}

#[test]
fn test_elongated_star_has_high_eccentricity() {
    let mut img = flat_image(32, 32, 0.0);
    add_elliptical_star(&mut img, 16.0, 16.0, 1.0, 2.0, 0.5);

    let summary = measure(&img, &[candidate_at(16.0, 16.0)], 0.0, PSF_BOX_RADIUS);
    assert_eq!(summary.n_used, 1);
    assert!(
        summary.ecc > 0.7 && summary.ecc < 0.95,
        "2:1 axis ratio should land well off-circular, got {}",
        summary.ecc
    );
}

#[test]
fn test_median_aggregation_over_stars() {
    let mut img = flat_image(64, 64, 0.0);
    add_gaussian_star(&mut img, 16.0, 16.0, 1.0, 0.5);
    add_gaussian_star(&mut img, 16.0, 48.0, 1.2, 0.5);
    add_gaussian_star(&mut img, 48.0, 16.0, 1.4, 0.5);

    let candidates = [
        candidate_at(16.0, 16.0),
        candidate_at(48.0, 16.0),
        candidate_at(16.0, 48.0),
    ];
    let summary = measure(&img, &candidates, 0.0, PSF_BOX_RADIUS);
    assert_eq!(summary.n_used, 3);

    // The middle star (sigma = 1.2) sets the median.
    let expected = FWHM_PER_SIGMA * 1.2;
    let rel_err = (summary.fwhm - expected).abs() / expected;
    assert!(rel_err < 0.06, "median fwhm {} vs {expected}", summary.fwhm);
}

#[test]
fn test_no_stars_yields_nan_summary() {
    let img = flat_image(32, 32, 0.1);
    let summary = measure(&img, &[], 0.1, PSF_BOX_RADIUS);
    assert_eq!(summary.n_used, 0);
    assert!(summary.fwhm.is_nan());
    assert!(summary.ecc.is_nan());
}

#[test]
fn test_star_without_positive_flux_is_skipped() {
    // Candidate points at pure background: nothing above it to weigh.
    let img = flat_image(32, 32, 0.1);
    let summary = measure(&img, &[candidate_at(16.0, 16.0)], 0.1, PSF_BOX_RADIUS);
    assert_eq!(summary.n_used, 0);
    assert!(summary.fwhm.is_nan());
}

#[test]
fn test_candidate_near_border_is_clamped() {
    let mut img = flat_image(32, 32, 0.0);
    add_gaussian_star(&mut img, 1.0, 1.0, 1.0, 0.5);

    // Cutout clamps to the image without panicking.
    let summary = measure(&img, &[candidate_at(1.0, 1.0)], 0.0, PSF_BOX_RADIUS);
    assert_eq!(summary.n_used, 1);
    assert!(summary.fwhm.is_finite());
}
