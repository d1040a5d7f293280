use std::time::Duration;

use serde_derive::Deserialize;

// When changing anything here, make sure to add
// #[serde(alias = "ihavenounderscores")]
// where needed, so it can be read from the ENV vars.

#[derive(Debug, Clone, Deserialize)]
pub struct Mqtt {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    #[serde(alias = "ignoretlserrors")]
    pub ignore_tls_errors: bool,
    pub username: String,
    pub password: String,
    #[serde(alias = "clientid")]
    pub client_id: String,
    #[serde(alias = "roottopic")]
    pub root_topic: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cups {
    pub uri: String,
    #[serde(alias = "ignoretlserrors")]
    pub ignore_tls_errors: bool,
    pub username: String,
    pub password: String,
    #[serde(alias = "printqueues", default)]
    pub print_queues: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ledger {
    #[serde(alias = "baseurl")]
    pub base_url: String,
    pub token: String,
    #[serde(alias = "userid")]
    pub user_id: String,
    #[serde(alias = "orgid")]
    pub org_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Engine {
    #[serde(alias = "pollinterval", with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(alias = "spoolwaitchecks")]
    pub spool_wait_checks: u32,
    #[serde(alias = "spoolwaitinterval", with = "humantime_serde")]
    pub spool_wait_interval: Duration,
    #[serde(alias = "balancettl", with = "humantime_serde")]
    pub balance_ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub mqtt: Mqtt,
    pub cups: Cups,
    pub ledger: Ledger,
    pub engine: Engine,
    #[serde(alias = "sentrydsn")]
    pub sentry_dsn: Option<String>,
}
