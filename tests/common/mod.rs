#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde_json::json;

use cupsmeter::ledger::{KeyValueStore, StoreError};
use cupsmeter::notify::models::{JobAllowed, JobBlocked};
use cupsmeter::notify::Notifier;
use cupsmeter::spooler::models::{JobControl, PrintJobRecord};
use cupsmeter::spooler::SpoolerGateway;

pub fn job(id: i32, pages: u32, copies: u32, color: bool) -> PrintJobRecord {
    PrintJobRecord {
        id,
        document: format!("doc-{}", id),
        pages,
        copies,
        color,
        spooling: false,
    }
}

// /////////////// //
// Spooler gateway //
// /////////////// //

#[derive(Default)]
pub struct SpoolerState {
    pub queues: HashMap<String, Vec<PrintJobRecord>>,
    /// (printer, id) pairs every operation reports as already gone.
    pub gone: HashSet<(String, i32)>,
    /// Pairs only resume/cancel/get_job report as gone (pause still works),
    /// for jobs that disappear after being held.
    pub gone_after_pause: HashSet<(String, i32)>,
    /// Pairs whose pause fails for a non-"gone" reason.
    pub fail_pause: HashSet<(String, i32)>,
    /// Scripted get_job responses, popped front first; falls back to the
    /// queue record when empty.
    pub metadata: HashMap<(String, i32), VecDeque<PrintJobRecord>>,
    pub paused: Vec<(String, i32)>,
    pub resumed: Vec<(String, i32)>,
    pub cancelled: Vec<(String, i32)>,
}

#[derive(Clone, Default)]
pub struct FakeSpooler(pub Arc<Mutex<SpoolerState>>);

impl FakeSpooler {
    pub fn with_queue(printer: &str, jobs: Vec<PrintJobRecord>) -> Self {
        let fake = Self::default();
        fake.0.lock().unwrap().queues.insert(printer.to_string(), jobs);
        fake
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, SpoolerState> {
        self.0.lock().unwrap()
    }
}

impl SpoolerGateway for FakeSpooler {
    fn list_printers(&self) -> Vec<String> {
        let mut printers: Vec<String> = self.state().queues.keys().cloned().collect();
        printers.sort();
        printers
    }

    fn list_jobs(&self, printer: &str) -> Vec<PrintJobRecord> {
        self.state().queues.get(printer).cloned().unwrap_or_default()
    }

    fn get_job(&self, printer: &str, id: i32) -> Option<PrintJobRecord> {
        let key = (printer.to_string(), id);
        let mut state = self.state();
        if state.gone.contains(&key) || state.gone_after_pause.contains(&key) {
            return None;
        }
        if let Some(scripted) = state.metadata.get_mut(&key) {
            if let Some(record) = scripted.pop_front() {
                return Some(record);
            }
        }
        state.queues.get(printer).and_then(|jobs| jobs.iter().find(|j| j.id == id).cloned())
    }

    fn pause(&self, printer: &str, id: i32) -> JobControl {
        let key = (printer.to_string(), id);
        let mut state = self.state();
        if state.gone.contains(&key) {
            return JobControl::AlreadyGone;
        }
        if state.fail_pause.contains(&key) {
            return JobControl::Failed;
        }
        state.paused.push(key);
        JobControl::Applied
    }

    fn resume(&self, printer: &str, id: i32) -> JobControl {
        let key = (printer.to_string(), id);
        let mut state = self.state();
        if state.gone.contains(&key) || state.gone_after_pause.contains(&key) {
            return JobControl::AlreadyGone;
        }
        state.resumed.push(key);
        JobControl::Applied
    }

    fn cancel(&self, printer: &str, id: i32) -> JobControl {
        let key = (printer.to_string(), id);
        let mut state = self.state();
        if state.gone.contains(&key) || state.gone_after_pause.contains(&key) {
            return JobControl::AlreadyGone;
        }
        state.cancelled.push(key);
        JobControl::Applied
    }
}

// ////////////// //
// Key-path store //
// ////////////// //

#[derive(Default)]
pub struct StoreState {
    pub data: HashMap<String, serde_json::Value>,
    pub reads: usize,
    pub writes: usize,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

#[derive(Clone, Default)]
pub struct MemoryStore(pub Arc<Mutex<StoreState>>);

impl MemoryStore {
    pub fn with_balance(path: &str, balance: Decimal) -> Self {
        let store = Self::default();
        store.0.lock().unwrap().data.insert(path.to_string(), json!({ "print_balance": balance }));
        store
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.0.lock().unwrap()
    }

    pub fn balance_at(&self, path: &str) -> Decimal {
        let state = self.state();
        let value = state.data.get(path).and_then(|v| v.get("print_balance")).cloned().unwrap();
        serde_json::from_value(value).unwrap()
    }

    pub fn reads(&self) -> usize {
        self.state().reads
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, path: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let mut state = self.state();
        state.reads += 1;
        if state.fail_reads {
            return Err(StoreError::Read { path: path.to_string(), message: "unreachable".to_string() });
        }
        Ok(state.data.get(path).cloned())
    }

    fn update(&self, path: &str, fields: serde_json::Value) -> Result<(), StoreError> {
        let mut state = self.state();
        state.writes += 1;
        if state.fail_writes {
            return Err(StoreError::Write { path: path.to_string(), message: "unreachable".to_string() });
        }
        let entry = state.data.entry(path.to_string()).or_insert_with(|| json!({}));
        if let (Some(existing), Some(new)) = (entry.as_object_mut(), fields.as_object()) {
            for (key, value) in new {
                existing.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    fn set(&self, path: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let mut state = self.state();
        state.writes += 1;
        if state.fail_writes {
            return Err(StoreError::Write { path: path.to_string(), message: "unreachable".to_string() });
        }
        state.data.insert(path.to_string(), value);
        Ok(())
    }
}

// //////// //
// Notifier //
// //////// //

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Allowed(JobAllowed),
    Blocked(JobBlocked),
    Error(String),
}

#[derive(Clone, Default)]
pub struct RecordingNotifier(pub Arc<Mutex<Vec<Event>>>);

impl RecordingNotifier {
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn job_allowed(&self, event: &JobAllowed) {
        self.0.lock().unwrap().push(Event::Allowed(event.clone()));
    }

    fn job_blocked(&self, event: &JobBlocked) {
        self.0.lock().unwrap().push(Event::Blocked(event.clone()));
    }

    fn error(&self, message: &str) {
        self.0.lock().unwrap().push(Event::Error(message.to_string()));
    }
}
