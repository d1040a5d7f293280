pub mod client;
pub mod models;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, error, info};
use rust_decimal::Decimal;
use serde_json::json;
use snafu::Snafu;

use models::UserBudget;

/// Authenticated key-path JSON store (get/update/set). The production
/// implementation is [`client::RestStore`]; tests substitute an in-memory one.
pub trait KeyValueStore {
    fn get(&self, path: &str) -> Result<Option<serde_json::Value>, StoreError>;
    fn update(&self, path: &str, fields: serde_json::Value) -> Result<(), StoreError>;
    fn set(&self, path: &str, value: serde_json::Value) -> Result<(), StoreError>;
}

// ////// //
// Errors //
// ////// //

#[derive(Debug, Snafu)]
pub enum StoreError {
    #[snafu(display("remote read of {path} failed: {message}"))]
    Read { path: String, message: String },
    #[snafu(display("remote write of {path} failed: {message}"))]
    Write { path: String, message: String },
}

// ///////////// //
// Budget ledger //
// ///////////// //

/// Read-through proxy for one user's print balance.
///
/// The remote ledger stays authoritative: the cached value expires after
/// `ttl` and every deduction force-refreshes before computing the new
/// balance, shrinking (not closing) the lost-update window. The wider
/// session model assumes one workstation per user, so no compare-and-swap.
pub struct BudgetLedger {
    store: Arc<dyn KeyValueStore>,
    user_path: String,
    ttl: Duration,
    cached: Option<(Decimal, Instant)>,
}

impl BudgetLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, user_path: String, ttl: Duration) -> Self {
        Self { store, user_path, ttl, cached: None }
    }

    /// Current balance. Serves the cache while it is fresh and `force` is
    /// unset; a remote failure logs and returns 0 so a broken ledger denies
    /// printing instead of allowing it for free.
    pub fn balance(&mut self, force: bool) -> Decimal {
        if !force {
            if let Some((value, fetched)) = self.cached {
                if fetched.elapsed() < self.ttl {
                    debug!("Serving cached balance {} for {}", value, self.user_path);
                    return value;
                }
            }
        }

        match self.refresh() {
            Ok(value) => value,
            Err(e) => {
                error!("Balance read failed, denying by default: {}", e);
                Decimal::ZERO
            }
        }
    }

    /// Deduct `amount`, clamping at zero unless `allow_negative` (the
    /// retroactive-charge path, where the resulting debt is intentional).
    /// Returns the new balance on success; `None` means the refresh or the
    /// remote write failed and nothing was charged. Deducting from the
    /// fail-closed zero instead would clobber the real balance.
    pub fn deduct(&mut self, amount: Decimal, allow_negative: bool) -> Option<Decimal> {
        let balance = match self.refresh() {
            Ok(balance) => balance,
            Err(e) => {
                error!("Balance refresh before deduction failed: {}", e);
                return None;
            }
        };
        let new_balance = if allow_negative {
            balance - amount
        } else {
            (balance - amount).max(Decimal::ZERO)
        };

        let fields = json!({
            "print_balance": new_balance,
            "balance_updated_at": Utc::now(),
        });

        match self.store.update(&self.user_path, fields) {
            Ok(()) => {
                // Write-through, so the next job within the TTL sees the
                // debited balance without a remote round-trip.
                self.cached = Some((new_balance, Instant::now()));
                info!("Deducted {} from {}, balance now {}", amount, self.user_path, new_balance);
                Some(new_balance)
            },
            Err(e) => {
                error!("Balance write failed: {}", e);
                None
            }
        }
    }

    fn refresh(&mut self) -> Result<Decimal, StoreError> {
        let value = self.fetch()?;
        self.cached = Some((value, Instant::now()));
        Ok(value)
    }

    fn fetch(&self) -> Result<Decimal, StoreError> {
        let value = self.store.get(&self.user_path)?;
        let budget = match value {
            Some(value) => serde_json::from_value::<UserBudget>(value)
                .map_err(|e| StoreError::Read { path: self.user_path.clone(), message: e.to_string() })?,
            None => {
                info!("No budget record at {}, treating as empty balance", self.user_path);
                return Ok(Decimal::ZERO);
            }
        };
        Ok(budget.print_balance)
    }
}
