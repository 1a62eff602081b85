/// Trait for reporting scheduling progress.
///
/// The CLI implements it with indicatif spinners. All methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_complete(&self, _total_files: usize, _empty_directories: usize, _duration_secs: f64) {}
    fn on_partition_start(&self, _total_files: usize) {}
    fn on_partition_progress(&self, _files_buffered: usize, _tasks_submitted: usize) {}
    fn on_partition_complete(&self, _tasks_submitted: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
