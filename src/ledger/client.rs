use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use url::Url;

use crate::config::models::Ledger;

use super::{KeyValueStore, StoreError};

/// HTTPS key-path store client. Paths map onto the REST tree of the remote
/// ledger (`users/{uid}`, `orgs/{org}/pricing`, ...); the bearer credential
/// is supplied by the host application's configuration and assumed valid.
pub struct RestStore {
    client: Client,
    base_url: Url,
    token: String,
}

impl RestStore {
    pub fn new(settings: &Ledger) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        let base_url = Url::parse(&settings.base_url).unwrap();
        Self { client, base_url, token: settings.token.clone() }
    }

    fn url(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url.join(path).map_err(|e| StoreError::Read {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn check_write(&self, path: &str, resp: Result<Response, reqwest::Error>) -> Result<(), StoreError> {
        let resp = resp.map_err(|e| StoreError::Write { path: path.to_string(), message: e.to_string() })?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Write { path: path.to_string(), message: format!("status {}", resp.status()) })
        }
    }
}

impl KeyValueStore for RestStore {
    fn get(&self, path: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let resp = self.client.get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| StoreError::Read { path: path.to_string(), message: e.to_string() })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(StoreError::Read { path: path.to_string(), message: format!("status {}", resp.status()) });
        }

        let value: serde_json::Value = resp.json()
            .map_err(|e| StoreError::Read { path: path.to_string(), message: e.to_string() })?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    fn update(&self, path: &str, fields: serde_json::Value) -> Result<(), StoreError> {
        let url = self.url(path).map_err(|e| StoreError::Write { path: path.to_string(), message: e.to_string() })?;
        debug!("PATCH {}", url);
        let resp = self.client.patch(url)
            .bearer_auth(&self.token)
            .json(&fields)
            .send();
        self.check_write(path, resp)
    }

    fn set(&self, path: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let url = self.url(path).map_err(|e| StoreError::Write { path: path.to_string(), message: e.to_string() })?;
        debug!("PUT {}", url);
        let resp = self.client.put(url)
            .bearer_auth(&self.token)
            .json(&value)
            .send();
        self.check_write(path, resp)
    }
}
