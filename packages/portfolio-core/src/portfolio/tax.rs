//! Tax-loss harvesting candidate detection.

use crate::types::TaxLot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Holdings must be held longer than this many days before harvesting.
pub const DEFAULT_HARVEST_WINDOW_DAYS: i64 = 30;

/// Recommended action for a holding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HarvestAction {
    /// Realize the loss now
    Harvest,
    /// In a loss, but still inside the holding window
    Wait,
    /// Not in a loss
    Hold,
}

/// Harvesting assessment of a single holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarvestOpportunity {
    pub symbol: String,
    /// `current_price - cost_basis`; negative means an unrealized loss
    pub loss: f64,
    pub days_held: i64,
    pub action: HarvestAction,
}

/// Classify each holding as a harvesting candidate.
///
/// A holding in a loss is `Harvest` once held for more than `window_days`
/// as of `as_of`, `Wait` before that. Holdings at or above cost are `Hold`.
pub fn harvesting_opportunities(
    lots: &[TaxLot],
    as_of: DateTime<Utc>,
    window_days: i64,
) -> Vec<HarvestOpportunity> {
    lots.iter()
        .map(|lot| {
            let loss = lot.current_price - lot.cost_basis;
            let days_held = (as_of - lot.purchase_date).num_days();

            let action = if loss < 0.0 && days_held > window_days {
                HarvestAction::Harvest
            } else if loss < 0.0 {
                HarvestAction::Wait
            } else {
                HarvestAction::Hold
            };

            HarvestOpportunity {
                symbol: lot.symbol.clone(),
                loss,
                days_held,
                action,
            }
        })
        .collect()
}
