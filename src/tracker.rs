use std::collections::HashSet;

use dashmap::{DashMap, DashSet};

use crate::spooler::models::PrinterQueueSnapshot;

/// Per-printer known-job-id sets plus the processed-job dedup set.
///
/// The dedup set, not the print server, is what enforces at-most-once
/// billing per (printer, job id). Entries are pruned as soon as an id
/// leaves the live queue, which bounds memory and makes OS-level id reuse
/// safe: a reused id only reappears after the old job is gone, so treating
/// it as a new job is correct.
///
/// Backed by sharded maps so a future concurrent-per-printer tick does not
/// need one coarse lock around unrelated printers.
#[derive(Default)]
pub struct JobTracker {
    known: DashMap<String, HashSet<i32>>,
    processed: DashSet<(String, i32)>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record everything currently queued so jobs that predate monitoring
    /// are never billed. Must run once before the first poll tick.
    pub fn seed(&self, snapshot: &PrinterQueueSnapshot) {
        for (printer, ids) in snapshot {
            self.known.insert(printer.clone(), ids.iter().copied().collect());
        }
    }

    /// Ids in `live` not yet known for `printer`, in queue order. Updates
    /// the known set to `live` and prunes dead entries from the dedup set.
    pub fn diff(&self, printer: &str, live: &[i32]) -> Vec<i32> {
        let live_set: HashSet<i32> = live.iter().copied().collect();
        let mut entry = self.known.entry(printer.to_string()).or_default();
        let new: Vec<i32> = live.iter().filter(|id| !entry.contains(id)).copied().collect();
        *entry = live_set.clone();
        drop(entry);

        self.processed.retain(|(p, id)| p != printer || live_set.contains(id));
        new
    }

    /// Claim a (printer, id) for processing. `false` means it was already
    /// claimed and the caller must not run the billing protocol again.
    pub fn mark_processed(&self, printer: &str, id: i32) -> bool {
        self.processed.insert((printer.to_string(), id))
    }

    pub fn clear(&self) {
        self.known.clear();
        self.processed.clear();
    }
}
