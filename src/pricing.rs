use log::{error, info, warn};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::ledger::{KeyValueStore, StoreError};

fn default_mono_rate() -> Decimal {
    Decimal::ONE
}

fn default_color_rate() -> Decimal {
    Decimal::from(3)
}

/// Two-tier page pricing, loaded once per monitoring session from the
/// org-scoped configuration record. Re-pricing requires a restart.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingPolicy {
    #[serde(alias = "monoPricePerPage", default = "default_mono_rate")]
    pub mono_rate: Decimal,
    #[serde(alias = "colorPricePerPage", default = "default_color_rate")]
    pub color_rate: Decimal,
}

impl PricingPolicy {
    /// Non-zero defaults: a misconfigured pricing source degrades to a
    /// conservative price, never to free printing.
    pub fn fallback() -> Self {
        Self { mono_rate: default_mono_rate(), color_rate: default_color_rate() }
    }

    /// One-shot read of `orgs/{org}/pricing` from the remote store.
    pub fn fetch(store: &dyn KeyValueStore, org_id: &str) -> Result<Self, StoreError> {
        let path = format!("orgs/{}/pricing", org_id);
        let value = store.get(&path)?;
        let policy = match value {
            Some(value) => match serde_json::from_value::<PricingPolicy>(value) {
                Ok(policy) => policy,
                Err(e) => {
                    warn!("Malformed pricing record at {}: {}, using defaults", path, e);
                    Self::fallback()
                }
            },
            None => {
                warn!("No pricing record at {}, using defaults", path);
                Self::fallback()
            }
        };
        info!("Pricing: {} per mono page, {} per color page", policy.mono_rate, policy.color_rate);
        Ok(policy)
    }

    /// Like [`fetch`](Self::fetch), but an unreachable source degrades to
    /// the fallback rates instead of failing startup.
    pub fn load(store: &dyn KeyValueStore, org_id: &str) -> Self {
        Self::fetch(store, org_id).unwrap_or_else(|e| {
            error!("Pricing source unreachable: {}, using defaults", e);
            Self::fallback()
        })
    }

    pub fn cost(&self, pages: u32, copies: u32, color: bool) -> Decimal {
        let rate = if color { self.color_rate } else { self.mono_rate };
        Decimal::from(pages) * Decimal::from(copies) * rate
    }
}
