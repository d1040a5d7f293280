pub mod client;
pub mod models;

use models::{JobControl, PrintJobRecord};

/// The only seam through which the engine talks to the print server.
///
/// All methods fail soft: enumeration errors degrade to empty lists (logged
/// by the implementation), a missing job is `None`, and control commands
/// report the tagged [`JobControl`] instead of raising.
pub trait SpoolerGateway {
    fn list_printers(&self) -> Vec<String>;
    fn list_jobs(&self, printer: &str) -> Vec<PrintJobRecord>;
    fn get_job(&self, printer: &str, id: i32) -> Option<PrintJobRecord>;
    fn pause(&self, printer: &str, id: i32) -> JobControl;
    fn resume(&self, printer: &str, id: i32) -> JobControl;
    fn cancel(&self, printer: &str, id: i32) -> JobControl;
}
