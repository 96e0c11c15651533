pub mod observer;
pub mod options;

pub use observer::{AnalysisObserver, NoOpObserver, ProgressUpdate};
pub use options::AnalysisOptions;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::actions::{apply_rejected_files, RejectDisposition};
use crate::bortle::BortleScale;
use crate::consts::PSF_BOX_RADIUS;
use crate::error::{CullError, Result};
use crate::io::{is_supported_extension, load_image};
use crate::model::{metric, RejectReason, ResultRow};
use crate::report;
use crate::selection::{
    apply_snr_selection, apply_trail_rejection, finalize_pending, SnrSelectionMode,
};
use crate::trails::{self, Availability};
use crate::{detect, psf, snr, stats};

/// Discover analyzable files under `input_dir`, sorted by path so result
/// order is stable across runs.
pub fn discover_files(input_dir: &Path, include_subfolders: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_dir(input_dir, include_subfolders, &mut files).map_err(|e| CullError::InputDir {
        path: input_dir.to_path_buf(),
        message: e.to_string(),
    })?;
    files.sort();
    Ok(files)
}

fn collect_dir(dir: &Path, recurse: bool, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if recurse {
                collect_dir(&path, recurse, out)?;
            }
        } else if is_supported_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Run a full analysis pass: discover, score every file, select, persist.
///
/// Per-file failures become `status=error` rows and never abort the batch.
/// Cross-cutting failures (unreadable input dir, unwritable log) propagate.
/// Cancellation is honored between files; the partial result list is still
/// selected, persisted, and returned, and `finished(true)` fires.
pub fn run_analysis(
    options: &AnalysisOptions,
    observer: &dyn AnalysisObserver,
) -> Result<Vec<ResultRow>> {
    observer.progress(ProgressUpdate::Indeterminate);
    observer.status("Scanning input directory");

    let files = discover_files(&options.input_dir, options.include_subfolders)?;
    let total = files.len();
    info!(total, input = %options.input_dir.display(), "starting analysis");
    observer.log(&format!("Found {total} file(s) to analyze"));

    let trails_enabled = options.detect_trails && {
        let state = trails::availability();
        if state != Availability::Available {
            warn!(?state, "trail detection requested but unavailable");
            observer.log("Trail detection unavailable; continuing without it");
        }
        state == Availability::Available
    };

    let bortle = if options.use_bortle {
        Some(BortleScale::load(options.bortle_path.as_deref())?)
    } else {
        None
    };

    let mut rows: Vec<ResultRow> = Vec::with_capacity(total);
    let mut cancelled = false;

    observer.status("Analyzing files");
    for (index, path) in files.iter().enumerate() {
        if observer.is_cancelled() {
            info!(processed = index, total, "analysis cancelled");
            cancelled = true;
            break;
        }

        let mut row = match analyze_file(path, options, trails_enabled) {
            Ok(row) => row,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "file failed to analyze");
                let (file, abs, rel) = identity(path, &options.input_dir);
                ResultRow::failed(file, abs, rel, e.to_string())
            }
        };

        if let (Some(scale), Some(sqm)) = (&bortle, options.site_sqm) {
            row.bortle = Some(scale.class_for_sqm(sqm));
        }

        observer.log(&format!(
            "{}: snr={} fwhm={} stars={} trails={}",
            row.rel_path,
            row.snr.map(|v| format!("{v:.2}")).unwrap_or_default(),
            row.fwhm.map(|v| format!("{v:.2}")).unwrap_or_default(),
            row.starcount.map(|v| v.to_string()).unwrap_or_default(),
            row.num_trails,
        ));
        rows.push(row);
        observer.progress(ProgressUpdate::Percent(
            100.0 * (index + 1) as f64 / total.max(1) as f64,
        ));
    }

    observer.status("Applying selection");
    if options.analyze_snr {
        apply_snr_selection(&mut rows, &options.snr_selection);
    }
    if trails_enabled {
        apply_trail_rejection(&mut rows);
    }
    finalize_pending(&mut rows);

    if options.apply_snr_action_immediately && options.analyze_snr {
        apply_disposition(
            &rows,
            RejectReason::LowSnr,
            options,
            options.snr_reject_dir.as_deref(),
        )?;
    }
    if options.apply_trail_action_immediately && trails_enabled {
        apply_disposition(
            &rows,
            RejectReason::TrailDetected,
            options,
            options.trail_reject_dir.as_deref(),
        )?;
    }

    observer.status("Writing report");
    report::write_log(&options.output_log, &rows)?;
    info!(rows = rows.len(), cancelled, log = %options.output_log.display(), "analysis finished");

    observer.finished(cancelled);
    Ok(rows)
}

fn apply_disposition(
    rows: &[ResultRow],
    reason: RejectReason,
    options: &AnalysisOptions,
    reject_dir: Option<&Path>,
) -> Result<()> {
    let disposition = if options.delete_rejected {
        RejectDisposition::Delete
    } else if options.move_rejected {
        RejectDisposition::Move
    } else {
        return Ok(());
    };
    let acted = apply_rejected_files(rows, reason, disposition, reject_dir)?;
    debug!(?reason, acted, "applied reject disposition");
    Ok(())
}

fn identity(path: &Path, input_dir: &Path) -> (String, String, String) {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let abs = path.to_string_lossy().into_owned();
    let rel = path
        .strip_prefix(input_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned();
    (file, abs, rel)
}

/// Score one file. Errors here are downgraded to an error row by the
/// caller; metric-invalid states (flat frame, zero stars) come back as
/// `None` fields on an ok row.
fn analyze_file(
    path: &Path,
    options: &AnalysisOptions,
    trails_enabled: bool,
) -> Result<ResultRow> {
    let (file, abs, rel) = identity(path, &options.input_dir);
    let mut row = ResultRow::pending(file, abs, rel);

    let frame = load_image(path)?;
    row.ra = frame.metadata.ra;
    row.dec = frame.metadata.dec;
    row.exposure = frame.metadata.exposure;
    row.filter = frame.metadata.filter.clone();
    row.temperature = frame.metadata.temperature;
    row.date_obs = frame.metadata.date_obs.clone();
    row.telescope = frame.metadata.telescope.clone();

    // One stats pass feeds star detection, PSF shape, and SNR alike.
    let image_stats = stats::estimate(&frame.data);
    row.sky_bg = metric(image_stats.background);
    row.sky_noise = metric(image_stats.noise);

    if image_stats.is_usable() {
        let candidates = detect::find_stars(
            &frame.data,
            &options.starfind,
            image_stats.background,
            image_stats.noise,
        );
        row.starcount = Some(candidates.len() as u64);

        let shape = psf::measure(
            &frame.data,
            &candidates,
            image_stats.background,
            PSF_BOX_RADIUS,
        );
        row.fwhm = metric(shape.fwhm);
        row.ecc = metric(shape.ecc);
        row.n_star_ecc = Some(shape.n_used);

        if options.analyze_snr {
            let estimate = snr::estimate(&frame.data, image_stats.background, image_stats.noise);
            row.snr = metric(estimate.snr);
            row.signal_pixels = Some(estimate.signal_pixels);
        }
    } else {
        debug!(file = %row.rel_path, "unusable background statistics; metrics skipped");
    }

    if trails_enabled {
        let trail_report = trails::detect(&frame.data, &options.trail);
        row.has_trails = trail_report.has_trails;
        row.num_trails = trail_report.num_trails;
    }

    Ok(row)
}

/// Keep-all guard used by option validation in front-ends: percent and
/// threshold modes need a finite value.
pub fn validate_options(options: &AnalysisOptions) -> Result<()> {
    if options.analyze_snr
        && options.snr_selection.mode != SnrSelectionMode::KeepAll
        && !options.snr_selection.value.is_finite()
    {
        return Err(CullError::InvalidOption(
            "SNR selection value must be finite".into(),
        ));
    }
    if options.analyze_snr
        && options.snr_selection.mode == SnrSelectionMode::Percent
        && !(0.0..=100.0).contains(&options.snr_selection.value)
    {
        return Err(CullError::InvalidOption(
            "SNR percent value must be in [0, 100]".into(),
        ));
    }
    Ok(())
}
