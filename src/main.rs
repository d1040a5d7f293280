use std::sync::Arc;

use backon::BlockingRetryable;
use backon::ExponentialBuilder;
use clap::Parser;
use log::error;

use cupsmeter::config::models::Settings;
use cupsmeter::engine::{EngineConfig, InterceptionEngine};
use cupsmeter::ledger::client::RestStore;
use cupsmeter::ledger::{BudgetLedger, KeyValueStore};
use cupsmeter::notify::client::MqttNotifier;
use cupsmeter::pricing::PricingPolicy;
use cupsmeter::spooler::client::IppSpooler;
use cupsmeter::spooler::SpoolerGateway;
use cupsmeter::config;

mod cli;

fn main() {
    colog::init();
    let settings = config::loading::load_config();

    let _sentry = settings.sentry_dsn.as_deref()
        .filter(|dsn| !dsn.is_empty())
        .map(|dsn| sentry::init((dsn, sentry::ClientOptions::default())));

    let gateway = IppSpooler::new(settings.cups.clone());

    match cli::Cli::parse().command {
        Some(cli::Commands::Dump) => dump(&gateway),
        None => run(settings, gateway),
    }
}

fn run(settings: Settings, gateway: IppSpooler) {
    let store: Arc<dyn KeyValueStore> = Arc::new(RestStore::new(&settings.ledger));

    // The pricing record is read once per monitoring session; retry the
    // startup read before degrading to the fallback rates.
    let pricing = (|| PricingPolicy::fetch(store.as_ref(), &settings.ledger.org_id))
        .retry(&ExponentialBuilder::default().with_factor(4.0))
        .call()
        .unwrap_or_else(|e| {
            error!("Pricing source unreachable: {}, using defaults", e);
            PricingPolicy::fallback()
        });

    let ledger = BudgetLedger::new(
        store,
        format!("users/{}", settings.ledger.user_id),
        settings.engine.balance_ttl,
    );

    let notifier = MqttNotifier::new(&settings.mqtt);

    let engine_config = EngineConfig {
        poll_interval: settings.engine.poll_interval,
        spool_wait_checks: settings.engine.spool_wait_checks,
        spool_wait_interval: settings.engine.spool_wait_interval,
    };

    let mut engine = InterceptionEngine::new(
        Box::new(gateway),
        Box::new(notifier),
        ledger,
        pricing,
        engine_config,
    );
    engine.run();
}

fn dump(gateway: &dyn SpoolerGateway) {
    for printer in gateway.list_printers() {
        println!("Monitored queue: {}", printer);
        for job in gateway.list_jobs(&printer) {
            println!("  {:?}", job);
        }
    }
}
