pub mod client;
pub mod models;
mod tls;

use models::{JobAllowed, JobBlocked};

/// Outbound channel to the host application. Implementations absorb their
/// own delivery failures (logging them); the engine never blocks or aborts
/// on a notification.
pub trait Notifier {
    fn job_allowed(&self, event: &JobAllowed);
    fn job_blocked(&self, event: &JobBlocked);
    fn error(&self, message: &str);
}
