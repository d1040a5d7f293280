pub mod config;
pub mod engine;
pub mod ledger;
pub mod notify;
pub mod pricing;
pub mod spooler;
pub mod tracker;
