use std::collections::HashMap;

use anyhow::{Context, Result};
use ipp::model::StatusCode;
use ipp::prelude::*;
use log::{error, warn};
use url::Url;

use crate::config::models::Cups;

use super::models::{JobControl, PrintJobRecord};
use super::SpoolerGateway;

pub fn build_cups_url(cups_settings: &Cups, queue_id: Option<&str>) -> String {
    let mut cups_url = Url::parse(&cups_settings.uri).unwrap();
    if !cups_settings.username.is_empty() && !cups_settings.password.is_empty() {
        cups_url.set_username(&cups_settings.username).unwrap();
        cups_url.set_password(Some(&cups_settings.password)).unwrap();
    }

    match queue_id {
        Some(queue_id) => cups_url.join("printers/").unwrap().join(queue_id).unwrap(),
        None => cups_url,
    }.to_string()
}

/// Send an IPP request to do `op` to the given `uri` and get the response.
///
/// # Arguments
///
/// * `uri`: Printer or server URI
/// * `op`: Operation
///
/// returns: Result<IppRequestResponse, IppError>
fn send_ipp_request(uri: String, ignore_tls_errors: bool, op: Operation) -> Result<IppRequestResponse> {
    let uri_p: Uri = uri.parse()?;
    let req = IppRequestResponse::new(
        IppVersion::v1_1(),
        op,
        Some(uri_p.clone())
    );
    let client = IppClient::builder(uri_p).ignore_tls_errors(ignore_tls_errors).build();
    let resp = client.send(req);
    Ok(resp?)
}

/// Send an IPP request to do `op` to job `job_id` to the given `uri` and get the response.
///
/// # Arguments
///
/// * `uri`: Printer or server URI
/// * `op`: Operation
/// * `job_id`: Job id
///
/// returns: Result<IppRequestResponse, IppError>
fn send_ipp_job_request(uri: String, ignore_tls_errors: bool, op: Operation, job_id: i32) -> Result<IppRequestResponse> {
    let uri_p: Uri = uri.parse()?;
    let mut req = IppRequestResponse::new(
        IppVersion::v1_1(),
        op,
        Some(uri_p.clone())
    );
    req.attributes_mut().add(
        DelimiterTag::OperationAttributes,
        IppAttribute::new(IppAttribute::JOB_ID, IppValue::Integer(job_id)),
    );

    let client = IppClient::builder(uri_p).ignore_tls_errors(ignore_tls_errors).build();
    let resp = client.send(req);
    Ok(resp?)
}

/// Run a job control operation and fold the response into the tagged
/// [`JobControl`]. Not-found/gone stays distinct from every other failure;
/// transport errors log and degrade to `Failed`.
fn job_control(uri: String, ignore_tls_errors: bool, op: Operation, job_id: i32) -> JobControl {
    match send_ipp_job_request(uri, ignore_tls_errors, op, job_id) {
        Ok(resp) => {
            let status = resp.header().status_code();
            if status.is_success() {
                JobControl::Applied
            } else if matches!(status, StatusCode::ClientErrorNotFound | StatusCode::ClientErrorGone) {
                JobControl::AlreadyGone
            } else {
                warn!("{:?} on job {} returned {:?}", op, job_id, status);
                JobControl::Failed
            }
        },
        Err(e) => {
            error!("{:?} on job {} failed: {:?}", op, job_id, e);
            JobControl::Failed
        }
    }
}

fn get_printer_names(uri: String, ignore_tls_errors: bool) -> Result<Vec<String>> {
    let resp = send_ipp_request(uri, ignore_tls_errors, Operation::CupsGetPrinters)?;
    let mut vec: Vec<String> = Vec::new();

    for printer in resp.attributes().groups_of(DelimiterTag::PrinterAttributes) {
        let group = printer.attributes().clone();
        vec.push(group["printer-name"].value().to_string().clone());
    }

    Ok(vec)
}

/// Build a fully-populated job record from a job attribute group, applying
/// the metadata defaults (1 copy, monochrome) in one place so the engine
/// never sees a partially-populated record. Page count stays 0 while the
/// job is spooling; the engine applies its own never-free default later.
fn job_record_from_attributes(attributes: &HashMap<String, IppAttribute>) -> Result<PrintJobRecord> {
    let id = attributes.get("job-id")
        .and_then(|a| a.value().as_integer())
        .context("Could not convert job-id to i32")?
        .clone();

    // Not every job seems to have a name
    let document = attributes.get("job-name")
        .map(|a| a.value().to_string())
        .unwrap_or_default();

    let pages = attributes.get("job-impressions")
        .and_then(|a| a.value().as_integer())
        .map(|v| (*v).max(0) as u32)
        .unwrap_or(0);

    let copies = attributes.get("copies")
        .and_then(|a| a.value().as_integer())
        .map(|v| (*v).max(1) as u32)
        .unwrap_or(1);

    let color = attributes.get("print-color-mode")
        .map(|a| a.value().to_string() == "color")
        .unwrap_or(false);

    let spooling = attributes.get("job-state-reasons")
        .map(|a| a.value().to_string().contains("job-incoming"))
        .unwrap_or(false);

    Ok(PrintJobRecord { id, document, pages, copies, color, spooling })
}

fn get_job_record(uri: String, ignore_tls_errors: bool, job_id: i32) -> Result<Option<PrintJobRecord>> {
    let resp = send_ipp_job_request(uri, ignore_tls_errors, Operation::GetJobAttributes, job_id)?;

    let status = resp.header().status_code();
    if matches!(status, StatusCode::ClientErrorNotFound | StatusCode::ClientErrorGone) {
        return Ok(None);
    }

    let group = resp.attributes().groups_of(DelimiterTag::JobAttributes).next().context("Invalid group returned")?;
    let attributes = group.attributes().clone();

    Ok(Some(job_record_from_attributes(&attributes)?))
}

fn get_job_records(uri: String, ignore_tls_errors: bool) -> Result<Vec<PrintJobRecord>> {
    let resp = send_ipp_request(uri.clone(), ignore_tls_errors, Operation::GetJobs)?;
    let mut vec: Vec<PrintJobRecord> = Vec::new();

    for job in resp.attributes().groups_of(DelimiterTag::JobAttributes) {
        let job_id = job.attributes()["job-id"].value().as_integer().context("Could not convert job-id to i32")?.clone();
        // The job can complete between Get-Jobs and Get-Job-Attributes.
        if let Some(record) = get_job_record(uri.clone(), ignore_tls_errors, job_id)? {
            vec.push(record);
        }
    }

    Ok(vec)
}

/// CUPS-backed gateway. Fail-soft policy lives here: enumeration failures
/// log and degrade to empty lists so one broken printer (or a CUPS restart)
/// never aborts a poll tick.
pub struct IppSpooler {
    settings: Cups,
}

impl IppSpooler {
    pub fn new(settings: Cups) -> Self {
        Self { settings }
    }

    fn printer_uri(&self, queue: &str) -> String {
        build_cups_url(&self.settings, Some(queue))
    }
}

impl SpoolerGateway for IppSpooler {
    fn list_printers(&self) -> Vec<String> {
        let uri = build_cups_url(&self.settings, None);
        match get_printer_names(uri, self.settings.ignore_tls_errors) {
            Ok(names) => {
                if self.settings.print_queues.is_empty() {
                    names
                } else {
                    names.into_iter().filter(|n| self.settings.print_queues.contains(n)).collect()
                }
            },
            Err(e) => {
                error!("Could not enumerate printers: {:?}", e);
                Vec::new()
            }
        }
    }

    fn list_jobs(&self, printer: &str) -> Vec<PrintJobRecord> {
        match get_job_records(self.printer_uri(printer), self.settings.ignore_tls_errors) {
            Ok(jobs) => jobs,
            Err(e) => {
                error!("Could not list jobs on {}: {:?}", printer, e);
                Vec::new()
            }
        }
    }

    fn get_job(&self, printer: &str, id: i32) -> Option<PrintJobRecord> {
        match get_job_record(self.printer_uri(printer), self.settings.ignore_tls_errors, id) {
            Ok(record) => record,
            Err(e) => {
                error!("Could not fetch job {} on {}: {:?}", id, printer, e);
                None
            }
        }
    }

    fn pause(&self, printer: &str, id: i32) -> JobControl {
        job_control(self.printer_uri(printer), self.settings.ignore_tls_errors, Operation::HoldJob, id)
    }

    fn resume(&self, printer: &str, id: i32) -> JobControl {
        job_control(self.printer_uri(printer), self.settings.ignore_tls_errors, Operation::ReleaseJob, id)
    }

    fn cancel(&self, printer: &str, id: i32) -> JobControl {
        job_control(self.printer_uri(printer), self.settings.ignore_tls_errors, Operation::CancelJob, id)
    }
}
