//! Portfolio storage: a repository trait, an in-memory implementation and
//! the JSON portfolio book it persists to.

use crate::market::QuoteBook;
use crate::portfolio::{
    holding_valuations, period_returns, position, weighted_series, HoldingValuation,
};
use crate::types::{Asset, ManualAssetValue, TaxLot, Transaction, TransactionKind};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A stored record with its assigned id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record<T> {
    pub id: u64,
    #[serde(flatten)]
    pub data: T,
}

/// Keyed CRUD over assets, transactions and manual valuations.
pub trait PortfolioStore {
    fn assets(&self) -> Vec<Asset>;

    fn asset(&self, id: u64) -> Result<Asset>;

    /// Store a new asset under a freshly assigned id.
    fn create_asset(&mut self, asset: Asset) -> Result<Asset>;

    fn update_asset(&mut self, asset: Asset) -> Result<Asset>;

    /// Delete an asset together with its transactions and manual values.
    fn delete_asset(&mut self, id: u64) -> Result<Asset>;

    fn transactions(&self) -> Vec<Record<Transaction>>;

    fn transactions_for(&self, asset_id: u64) -> Vec<Record<Transaction>>;

    fn create_transaction(&mut self, transaction: Transaction) -> Result<Record<Transaction>>;

    fn delete_transaction(&mut self, id: u64) -> Result<Record<Transaction>>;

    fn manual_values_for(&self, asset_id: u64) -> Vec<Record<ManualAssetValue>>;

    fn create_manual_value(&mut self, value: ManualAssetValue) -> Result<Record<ManualAssetValue>>;
}

/// Serializable snapshot of a portfolio and its market data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioBook {
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub transactions: Vec<Record<Transaction>>,
    #[serde(default)]
    pub manual_values: Vec<Record<ManualAssetValue>>,
    #[serde(default)]
    pub market: QuoteBook,
    /// When the book was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the book was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PortfolioBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a book from disk. A missing file yields an empty book.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the book to disk, creating parent directories as needed.
    pub fn save_to_path(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        if self.created_at.is_none() {
            self.created_at = Some(Utc::now());
        }
        self.updated_at = Some(Utc::now());

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "portfolio book saved");
        Ok(())
    }

    /// Plain transaction records, without ids.
    pub fn transaction_list(&self) -> Vec<Transaction> {
        self.transactions.iter().map(|r| r.data.clone()).collect()
    }

    /// Plain manual valuations, without ids.
    pub fn manual_value_list(&self) -> Vec<ManualAssetValue> {
        self.manual_values.iter().map(|r| r.data.clone()).collect()
    }

    /// Value every holding against the book's quotes and manual valuations.
    pub fn valuations(&self) -> Vec<HoldingValuation> {
        holding_valuations(
            &self.assets,
            &self.transaction_list(),
            &self.market.quotes,
            &self.manual_value_list(),
        )
    }

    /// Period returns of every symbol with a price history.
    pub fn return_history(&self) -> BTreeMap<String, Vec<f64>> {
        self.market
            .history
            .iter()
            .map(|(symbol, points)| {
                let values: Vec<f64> = points.iter().map(|p| p.value).collect();
                (symbol.clone(), period_returns(&values))
            })
            .collect()
    }

    /// Portfolio weight of each market holding, as a fraction of market value.
    pub fn market_weights(valuations: &[HoldingValuation]) -> Vec<(String, f64)> {
        let market: Vec<&HoldingValuation> = valuations
            .iter()
            .filter(|v| !v.is_manual && v.value > 0.0)
            .collect();
        let total: f64 = market.iter().map(|v| v.value).sum();
        if total <= 0.0 {
            return Vec::new();
        }

        market
            .into_iter()
            .map(|v| (v.symbol.clone(), v.value / total))
            .collect()
    }

    /// Weighted period returns of the market holdings.
    pub fn portfolio_returns(&self) -> Vec<f64> {
        let weights = Self::market_weights(&self.valuations());
        weighted_series(&weights, &self.return_history())
    }

    /// Open market positions as tax lots priced at their latest quote.
    ///
    /// The purchase date is the earliest buy; the cost basis is the average cost.
    pub fn tax_lots(&self) -> Vec<TaxLot> {
        let transactions = self.transaction_list();

        self.assets
            .iter()
            .filter(|asset| !asset.is_manual)
            .filter_map(|asset| {
                let symbol = asset.symbol().to_string();
                let quote = self.market.quotes.get(&symbol)?;
                let asset_txs: Vec<Transaction> = transactions
                    .iter()
                    .filter(|t| t.asset_id == asset.id)
                    .cloned()
                    .collect();

                let pos = position(&asset_txs);
                if pos.shares <= 0.0 {
                    return None;
                }
                let purchase_date = asset_txs
                    .iter()
                    .filter(|t| t.kind == TransactionKind::Buy)
                    .map(|t| t.date)
                    .min()?;

                Some(TaxLot {
                    symbol,
                    current_price: quote.price,
                    cost_basis: pos.average_cost,
                    purchase_date,
                })
            })
            .collect()
    }
}

/// [`PortfolioStore`] backed by an in-memory [`PortfolioBook`].
///
/// Ids are assigned from one counter shared by all record kinds.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    book: PortfolioBook,
    next_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::from_book(PortfolioBook::default())
    }

    /// Wrap an existing book, continuing ids after the largest one in use.
    pub fn from_book(book: PortfolioBook) -> Self {
        let max_id = book
            .assets
            .iter()
            .map(|a| a.id)
            .chain(book.transactions.iter().map(|r| r.id))
            .chain(book.manual_values.iter().map(|r| r.id))
            .max()
            .unwrap_or(0);

        Self {
            book,
            next_id: max_id + 1,
        }
    }

    pub fn book(&self) -> &PortfolioBook {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut PortfolioBook {
        &mut self.book
    }

    pub fn into_book(self) -> PortfolioBook {
        self.book
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn ensure_asset(&self, id: u64) -> Result<()> {
        if self.book.assets.iter().any(|a| a.id == id) {
            Ok(())
        } else {
            Err(Error::NotFound { entity: "asset", id })
        }
    }
}

impl PortfolioStore for InMemoryStore {
    fn assets(&self) -> Vec<Asset> {
        self.book.assets.clone()
    }

    fn asset(&self, id: u64) -> Result<Asset> {
        self.book
            .assets
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(Error::NotFound { entity: "asset", id })
    }

    fn create_asset(&mut self, mut asset: Asset) -> Result<Asset> {
        if asset.is_manual == asset.ticker.is_none() {
            asset.id = self.allocate_id();
            self.book.assets.push(asset.clone());
            Ok(asset)
        } else {
            Err(Error::InvalidOperation(format!(
                "asset '{}' must have a ticker unless it is manually valued",
                asset.name
            )))
        }
    }

    fn update_asset(&mut self, asset: Asset) -> Result<Asset> {
        let slot = self
            .book
            .assets
            .iter_mut()
            .find(|a| a.id == asset.id)
            .ok_or(Error::NotFound {
                entity: "asset",
                id: asset.id,
            })?;
        *slot = asset.clone();
        Ok(asset)
    }

    fn delete_asset(&mut self, id: u64) -> Result<Asset> {
        let idx = self
            .book
            .assets
            .iter()
            .position(|a| a.id == id)
            .ok_or(Error::NotFound { entity: "asset", id })?;

        self.book.transactions.retain(|r| r.data.asset_id != id);
        self.book.manual_values.retain(|r| r.data.asset_id != id);
        Ok(self.book.assets.remove(idx))
    }

    fn transactions(&self) -> Vec<Record<Transaction>> {
        self.book.transactions.clone()
    }

    fn transactions_for(&self, asset_id: u64) -> Vec<Record<Transaction>> {
        self.book
            .transactions
            .iter()
            .filter(|r| r.data.asset_id == asset_id)
            .cloned()
            .collect()
    }

    fn create_transaction(&mut self, transaction: Transaction) -> Result<Record<Transaction>> {
        self.ensure_asset(transaction.asset_id)?;

        if transaction.shares <= 0.0 || transaction.price <= 0.0 {
            return Err(Error::InvalidOperation(
                "shares and price must be positive".to_string(),
            ));
        }
        if transaction.commission.is_some_and(|c| c < 0.0) {
            return Err(Error::InvalidOperation(
                "commission cannot be negative".to_string(),
            ));
        }

        let record = Record {
            id: self.allocate_id(),
            data: transaction,
        };
        self.book.transactions.push(record.clone());
        Ok(record)
    }

    fn delete_transaction(&mut self, id: u64) -> Result<Record<Transaction>> {
        let idx = self
            .book
            .transactions
            .iter()
            .position(|r| r.id == id)
            .ok_or(Error::NotFound {
                entity: "transaction",
                id,
            })?;
        Ok(self.book.transactions.remove(idx))
    }

    fn manual_values_for(&self, asset_id: u64) -> Vec<Record<ManualAssetValue>> {
        self.book
            .manual_values
            .iter()
            .filter(|r| r.data.asset_id == asset_id)
            .cloned()
            .collect()
    }

    fn create_manual_value(&mut self, value: ManualAssetValue) -> Result<Record<ManualAssetValue>> {
        self.ensure_asset(value.asset_id)?;

        let record = Record {
            id: self.allocate_id(),
            data: value,
        };
        self.book.manual_values.push(record.clone());
        Ok(record)
    }
}
