/// Progress report emitted between files.
///
/// `Indeterminate` means "switch to indeterminate display"; callers that
/// cannot render that mode simply ignore it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressUpdate {
    /// Percentage of files processed, in [0, 100].
    Percent(f64),
    Indeterminate,
}

/// Narrow callback surface between the analysis worker and its caller.
///
/// All methods have default no-op implementations; `is_cancelled` is polled
/// between files and is the only cooperative cancellation point. Any
/// runtime (thread, channel bridge, GUI event loop) can implement this
/// without the core depending on a scheduler.
pub trait AnalysisObserver: Send + Sync {
    /// Short human-readable phase description ("Scanning input", ...).
    fn status(&self, _message: &str) {}

    fn progress(&self, _update: ProgressUpdate) {}

    /// One log line, already formatted.
    fn log(&self, _line: &str) {}

    /// Terminal callback: fired exactly once per run, on normal completion
    /// and on cancellation alike.
    fn finished(&self, _cancelled: bool) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Stand-in when the caller does not care about feedback.
pub struct NoOpObserver;

impl AnalysisObserver for NoOpObserver {}
