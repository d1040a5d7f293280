use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The user-scoped slice of the remote store this subsystem touches.
/// The ledger owns the balance; we only ever read it or write it back
/// together with a fresh timestamp.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserBudget {
    #[serde(alias = "printBalance", default)]
    pub print_balance: Decimal,
    #[serde(alias = "balanceUpdatedAt", default, skip_serializing_if = "Option::is_none")]
    pub balance_updated_at: Option<DateTime<Utc>>,
}
