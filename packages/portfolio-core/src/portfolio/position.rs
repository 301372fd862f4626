//! Position derivation from transaction history.

use crate::types::{Transaction, TransactionKind};
use serde::{Deserialize, Serialize};

/// A position derived by reducing an asset's transactions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Net shares held; negative when sells exceed recorded buys
    pub shares: f64,
    /// Average cost per share over buy transactions
    pub average_cost: f64,
}

impl Position {
    /// Cost basis of the shares currently held.
    pub fn cost_basis(&self) -> f64 {
        self.shares * self.average_cost
    }

    /// Market value at the given price.
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }
}

/// Net shares held: buys add, sells subtract.
///
/// There is no floor at zero. A sell larger than the recorded buys yields a
/// negative share count, which callers treat as an empty position.
pub fn shares_held(transactions: &[Transaction]) -> f64 {
    transactions.iter().fold(0.0, |shares, tx| match tx.kind {
        TransactionKind::Buy => shares + tx.shares,
        TransactionKind::Sell => shares - tx.shares,
    })
}

/// Average purchase price including commissions, over buy transactions only.
///
/// Returns `0.0` when there are no buys.
pub fn average_cost(transactions: &[Transaction]) -> f64 {
    let (total_cost, total_shares) = transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Buy)
        .fold((0.0, 0.0), |(cost, shares), tx| {
            (cost + tx.total_cost(), shares + tx.shares)
        });

    if total_shares > 0.0 {
        total_cost / total_shares
    } else {
        0.0
    }
}

/// Derive the full position for a set of transactions.
pub fn position(transactions: &[Transaction]) -> Position {
    Position {
        shares: shares_held(transactions),
        average_cost: average_cost(transactions),
    }
}
