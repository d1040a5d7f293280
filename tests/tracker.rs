use cupsmeter::spooler::models::PrinterQueueSnapshot;
use cupsmeter::tracker::JobTracker;

fn snapshot(printer: &str, ids: &[i32]) -> PrinterQueueSnapshot {
    let mut snapshot = PrinterQueueSnapshot::new();
    snapshot.insert(printer.to_string(), ids.to_vec());
    snapshot
}

#[test]
fn seeded_jobs_are_not_new() {
    let tracker = JobTracker::new();
    tracker.seed(&snapshot("office", &[1, 2]));

    assert_eq!(tracker.diff("office", &[1, 2, 3]), vec![3]);
}

#[test]
fn diff_reports_each_id_once() {
    let tracker = JobTracker::new();
    tracker.seed(&snapshot("office", &[]));

    assert_eq!(tracker.diff("office", &[7]), vec![7]);
    assert_eq!(tracker.diff("office", &[7]), Vec::<i32>::new());
}

#[test]
fn unknown_printer_starts_empty() {
    let tracker = JobTracker::new();
    assert_eq!(tracker.diff("lobby", &[5, 6]), vec![5, 6]);
}

#[test]
fn mark_processed_claims_exactly_once() {
    let tracker = JobTracker::new();
    assert!(tracker.mark_processed("office", 7));
    assert!(!tracker.mark_processed("office", 7));
    // Same id on another printer is a different job.
    assert!(tracker.mark_processed("lobby", 7));
}

#[test]
fn pruned_id_can_be_reused_as_a_new_job() {
    let tracker = JobTracker::new();
    tracker.diff("office", &[7]);
    assert!(tracker.mark_processed("office", 7));

    // Job 7 leaves the queue; its dedup entry is pruned.
    tracker.diff("office", &[]);

    // The server hands the numeric id to a fresh job later.
    assert_eq!(tracker.diff("office", &[7]), vec![7]);
    assert!(tracker.mark_processed("office", 7));
}

#[test]
fn clear_drops_all_tracking_state() {
    let tracker = JobTracker::new();
    tracker.seed(&snapshot("office", &[1]));
    tracker.mark_processed("office", 1);

    tracker.clear();

    assert_eq!(tracker.diff("office", &[1]), vec![1]);
    assert!(tracker.mark_processed("office", 1));
}
