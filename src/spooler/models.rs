use std::collections::BTreeMap;

/// Printer name -> job ids currently queued. Rebuilt on every poll tick,
/// never persisted.
pub type PrinterQueueSnapshot = BTreeMap<String, Vec<i32>>;

/// One print job as the print server reports it at a point in time.
/// The server owns the job; these records are rebuilt on every query
/// and never mutated by us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJobRecord {
    pub id: i32,
    pub document: String,
    /// Total page count; 0 while the job is still spooling.
    pub pages: u32,
    pub copies: u32,
    pub color: bool,
    pub spooling: bool,
}

/// Result of a job control command (hold/release/cancel).
///
/// `AlreadyGone` maps the IPP not-found/gone status codes: the job left the
/// queue before we could act on it. For a hold this is the escape signal,
/// for a release or cancel it is success-equivalent. It must never be folded
/// into `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobControl {
    Applied,
    AlreadyGone,
    Failed,
}
