use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::model::{RejectReason, ResultRow, Status};

/// What to do with files whose row was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectDisposition {
    Move,
    Delete,
}

/// Destination path that does not collide with an existing file: the
/// original name first, then `stem__01.ext`, `stem__02.ext`, ...
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let first = dir.join(file_name);
    if !first.exists() {
        return first;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), Some(ext.to_string())),
        None => (file_name.to_string(), None),
    };

    for counter in 1u32.. {
        let name = match &ext {
            Some(ext) => format!("{stem}__{counter:02}.{ext}"),
            None => format!("{stem}__{counter:02}"),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("counter space exhausted");
}

/// Move or delete the files of rows rejected for `reason`. Per-file
/// filesystem errors are logged and skipped so one locked file does not
/// abort the batch; returns the number of files acted on.
///
/// Idempotent in practice: a file already moved away no longer exists at
/// `row.path` and is skipped on a second pass.
pub fn apply_rejected_files(
    rows: &[ResultRow],
    reason: RejectReason,
    disposition: RejectDisposition,
    reject_dir: Option<&Path>,
) -> Result<usize> {
    let mut acted = 0usize;

    for row in rows {
        if row.status != Status::Ok || row.rejected_reason != Some(reason) {
            continue;
        }
        let source = Path::new(&row.path);
        if !source.exists() {
            continue;
        }

        match disposition {
            RejectDisposition::Delete => match std::fs::remove_file(source) {
                Ok(()) => {
                    info!(file = %row.rel_path, "deleted rejected file");
                    acted += 1;
                }
                Err(e) => warn!(file = %row.rel_path, error = %e, "could not delete"),
            },
            RejectDisposition::Move => {
                let Some(dir) = reject_dir else {
                    warn!(file = %row.rel_path, "no reject directory configured; skipping move");
                    continue;
                };
                std::fs::create_dir_all(dir)?;
                let dest = unique_destination(dir, &row.file);
                match std::fs::rename(source, &dest) {
                    Ok(()) => {
                        info!(file = %row.rel_path, dest = %dest.display(), "moved rejected file");
                        acted += 1;
                    }
                    Err(e) => warn!(file = %row.rel_path, error = %e, "could not move"),
                }
            }
        }
    }

    Ok(acted)
}
