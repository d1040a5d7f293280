use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use rust_decimal::Decimal;

use crate::ledger::BudgetLedger;
use crate::notify::models::{JobAllowed, JobBlocked};
use crate::notify::Notifier;
use crate::pricing::PricingPolicy;
use crate::spooler::models::{JobControl, PrintJobRecord, PrinterQueueSnapshot};
use crate::spooler::SpoolerGateway;
use crate::tracker::JobTracker;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub poll_interval: Duration,
    pub spool_wait_checks: u32,
    pub spool_wait_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            spool_wait_checks: 6,
            spool_wait_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Paused, billed, released.
    Approved,
    /// Paused, insufficient balance, cancelled without deduction.
    Denied,
    /// Escaped interception, billed retroactively (balance may go negative).
    Charged,
    /// Billing failed; the job was cancelled defensively rather than
    /// released unbilled.
    ErrorAborted,
}

/// Terminal result of processing one job. Emitted once, never replayed.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingOutcome {
    pub kind: OutcomeKind,
    pub billable_pages: u32,
    pub charge: Decimal,
    pub balance: Decimal,
}

/// Polls the printer fleet and runs the pause-then-decide protocol on every
/// newly detected job, synchronously within the tick that detected it.
///
/// Pausing a single job never throttles the shared printer itself, so
/// blocking one tick on the bounded spool-wait is a deliberate trade:
/// it buys an accurate page count without affecting other workstations.
pub struct InterceptionEngine {
    gateway: Box<dyn SpoolerGateway>,
    notifier: Box<dyn Notifier>,
    ledger: BudgetLedger,
    pricing: PricingPolicy,
    tracker: JobTracker,
    config: EngineConfig,
    stop: Arc<AtomicBool>,
}

impl InterceptionEngine {
    pub fn new(
        gateway: Box<dyn SpoolerGateway>,
        notifier: Box<dyn Notifier>,
        ledger: BudgetLedger,
        pricing: PricingPolicy,
        config: EngineConfig,
    ) -> Self {
        Self {
            gateway,
            notifier,
            ledger,
            pricing,
            tracker: JobTracker::new(),
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag shared with the host application; setting it halts [`run`](Self::run)
    /// after the current tick.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Seed the tracker from the current queues, then poll until stopped.
    /// Jobs already queued at startup are never billed. In-flight paused
    /// jobs are left to the print server on stop; a restart re-detects
    /// anything still queued.
    pub fn run(&mut self) {
        self.seed();
        info!("Monitoring started, polling every {}", humantime::format_duration(self.config.poll_interval));

        while !self.stop.load(Ordering::Relaxed) {
            self.tick();
            thread::sleep(self.config.poll_interval);
        }

        self.tracker.clear();
        info!("Monitoring stopped");
    }

    /// Record everything currently queued as pre-existing, so it is never
    /// billed. [`run`](Self::run) does this before its first tick.
    pub fn seed(&self) {
        self.tracker.seed(&self.snapshot());
    }

    pub fn snapshot(&self) -> PrinterQueueSnapshot {
        let mut snapshot = PrinterQueueSnapshot::new();
        for printer in self.gateway.list_printers() {
            let ids = self.gateway.list_jobs(&printer).iter().map(|j| j.id).collect();
            snapshot.insert(printer, ids);
        }
        snapshot
    }

    /// One poll pass. A failure on one printer degrades to an empty list in
    /// the gateway and never aborts the others; new jobs across printers are
    /// processed sequentially, each to a terminal outcome.
    pub fn tick(&mut self) {
        let printers = self.gateway.list_printers();
        if printers.is_empty() {
            debug!("Nothing to monitor this tick");
            return;
        }

        for printer in printers {
            let jobs = self.gateway.list_jobs(&printer);
            let live: Vec<i32> = jobs.iter().map(|j| j.id).collect();

            for id in self.tracker.diff(&printer, &live) {
                if !self.tracker.mark_processed(&printer, id) {
                    continue;
                }
                let Some(detected) = jobs.iter().find(|j| j.id == id) else {
                    continue;
                };
                let outcome = self.process_job(&printer, detected);
                debug!("Job {} on {}: {:?}", id, printer, outcome);
            }
        }
    }

    /// The pause-then-decide protocol. Pausing comes before any metadata
    /// read: every query we skip shrinks the window in which a fast job can
    /// finish printing unbilled.
    fn process_job(&mut self, printer: &str, detected: &PrintJobRecord) -> BillingOutcome {
        info!("New job {} ({:?}) on {}", detected.id, detected.document, printer);

        match self.gateway.pause(printer, detected.id) {
            JobControl::Applied => self.bill_paused(printer, detected),
            // A pause that failed for any reason is treated as escaped:
            // wrongly assuming "still queued" could release a job unbilled,
            // wrongly assuming "escaped" merely charges without holding.
            JobControl::AlreadyGone | JobControl::Failed => self.bill_escaped(printer, detected),
        }
    }

    /// The job is held, so metadata can be read at leisure and the decision
    /// made before a single page comes out.
    fn bill_paused(&mut self, printer: &str, detected: &PrintJobRecord) -> BillingOutcome {
        let record = self.spool_wait(printer, detected);
        let (billable_pages, cost) = self.price(&record);
        let balance = self.ledger.balance(true);

        if balance < cost {
            if self.gateway.cancel(printer, detected.id) == JobControl::Failed {
                error!("Could not cancel denied job {} on {}", detected.id, printer);
            }
            info!("Denied job {} on {}: cost {} exceeds balance {}", detected.id, printer, cost, balance);
            self.notifier.job_blocked(&JobBlocked {
                document: record.document.clone(),
                billable_pages,
                cost,
                current_balance: balance,
            });
            return BillingOutcome { kind: OutcomeKind::Denied, billable_pages, charge: Decimal::ZERO, balance };
        }

        match self.ledger.deduct(cost, false) {
            Some(remaining) => {
                if self.gateway.resume(printer, detected.id) == JobControl::Failed {
                    warn!("Billed job {} on {} but could not release it; it may stay held", detected.id, printer);
                }
                self.notifier.job_allowed(&JobAllowed {
                    document: record.document.clone(),
                    billable_pages,
                    cost,
                    remaining_balance: remaining,
                });
                BillingOutcome { kind: OutcomeKind::Approved, billable_pages, charge: cost, balance: remaining }
            },
            None => {
                // Never release a job that could not be billed.
                if self.gateway.cancel(printer, detected.id) == JobControl::Failed {
                    error!("Could not cancel unbilled job {} on {}", detected.id, printer);
                }
                let message = format!("Could not bill job {:?} ({} pages, {}), cancelled it", record.document, billable_pages, cost);
                error!("{}", message);
                self.notifier.error(&message);
                BillingOutcome { kind: OutcomeKind::ErrorAborted, billable_pages, charge: Decimal::ZERO, balance }
            }
        }
    }

    /// The job printed (or is printing) before we could hold it. Only the
    /// detection snapshot's metadata is available; the charge is
    /// unconditional, with the balance allowed to go negative, because
    /// refusing would let a user print for free by being fast.
    fn bill_escaped(&mut self, printer: &str, detected: &PrintJobRecord) -> BillingOutcome {
        warn!("Job {} on {} escaped interception, charging retroactively", detected.id, printer);
        let (billable_pages, cost) = self.price(detected);

        match self.ledger.deduct(cost, true) {
            Some(remaining) => {
                if remaining < Decimal::ZERO {
                    warn!("Retroactive charge of {} left {:?} with a debt of {}", cost, detected.document, -remaining);
                }
                self.notifier.job_allowed(&JobAllowed {
                    document: detected.document.clone(),
                    billable_pages,
                    cost,
                    remaining_balance: remaining,
                });
                BillingOutcome { kind: OutcomeKind::Charged, billable_pages, charge: cost, balance: remaining }
            },
            None => {
                let message = format!("Could not charge escaped job {:?} ({} pages, {})", detected.document, billable_pages, cost);
                error!("{}", message);
                self.notifier.error(&message);
                BillingOutcome { kind: OutcomeKind::ErrorAborted, billable_pages, charge: Decimal::ZERO, balance: Decimal::ZERO }
            }
        }
    }

    /// Billable pages and cost, with the never-free defaults applied: an
    /// undeterminable page count bills as 1 page, copies as 1, color as
    /// monochrome (the cheaper rate).
    fn price(&self, record: &PrintJobRecord) -> (u32, Decimal) {
        let pages = record.pages.max(1);
        let copies = record.copies.max(1);
        // The server controls both factors; saturate rather than trust them
        // to stay small. The cost itself multiplies in Decimal.
        let billable_pages = pages.saturating_mul(copies);
        let cost = self.pricing.cost(pages, copies, record.color);
        (billable_pages, cost)
    }

    /// Bounded wait for the held job's page count to settle: done when the
    /// server drops the spooling flag or reports the same non-zero count
    /// twice in a row. Falls back to the last metadata seen if the job
    /// vanishes mid-wait or the count never settles.
    fn spool_wait(&self, printer: &str, detected: &PrintJobRecord) -> PrintJobRecord {
        // A record that already stopped spooling at detection time is
        // settled; don't hold the job for an extra interval.
        if !detected.spooling {
            return detected.clone();
        }

        let mut last_seen = detected.clone();
        let mut previous_pages: Option<u32> = None;

        for attempt in 0..self.config.spool_wait_checks {
            if attempt > 0 {
                thread::sleep(self.config.spool_wait_interval);
            }

            let Some(record) = self.gateway.get_job(printer, detected.id) else {
                return last_seen;
            };

            if !record.spooling {
                return record;
            }
            if record.pages > 0 && previous_pages == Some(record.pages) {
                return record;
            }

            previous_pages = (record.pages > 0).then_some(record.pages);
            last_seen = record;
        }

        last_seen
    }
}
