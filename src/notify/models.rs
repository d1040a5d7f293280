use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// /////////////// //
// Outbound events //
// /////////////// //

// The engine's entire user-visible surface is these three payloads; every
// processed job ends in exactly one of them.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAllowed {
    pub document: String,
    pub billable_pages: u32,
    pub cost: Decimal,
    /// Negative after a retroactive charge: the job escaped interception
    /// and the shortfall is now a debt.
    pub remaining_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobBlocked {
    pub document: String,
    pub billable_pages: u32,
    pub cost: Decimal,
    pub current_balance: Decimal,
}
