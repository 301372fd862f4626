//! Core data types for the portfolio tracker.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Broad class an asset belongs to, used for allocation breakdowns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Cash,
    Bonds,
    RealEstate,
    Commodities,
    Alternatives,
    Other,
}

impl AssetClass {
    /// Display label used in dashboards.
    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Equity => "Equities",
            AssetClass::Cash => "Cash",
            AssetClass::Bonds => "Bonds",
            AssetClass::RealEstate => "Real Estate",
            AssetClass::Commodities => "Commodities",
            AssetClass::Alternatives => "Alternatives",
            AssetClass::Other => "Other",
        }
    }
}

impl FromStr for AssetClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "equity" | "equities" | "stock" | "stocks" => Ok(AssetClass::Equity),
            "cash" => Ok(AssetClass::Cash),
            "bonds" | "bond" => Ok(AssetClass::Bonds),
            "real_estate" => Ok(AssetClass::RealEstate),
            "commodities" | "commodity" => Ok(AssetClass::Commodities),
            "alternatives" | "alternative" => Ok(AssetClass::Alternatives),
            "other" => Ok(AssetClass::Other),
            _ => Err(Error::InvalidOperation(format!("unknown asset class: {s}"))),
        }
    }
}

/// A tracked asset. Market assets carry a ticker; manual assets are valued by hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: u64,
    /// Stock ticker symbol (uppercase)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub name: String,
    pub asset_class: AssetClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Valued from manual entries rather than market quotes
    #[serde(default)]
    pub is_manual: bool,
}

impl Asset {
    /// Create a market-priced asset identified by its ticker.
    pub fn market(id: u64, ticker: &str, name: &str, asset_class: AssetClass) -> Self {
        Self {
            id,
            ticker: Some(ticker.to_uppercase()),
            name: name.to_string(),
            asset_class,
            sector: None,
            is_manual: false,
        }
    }

    /// Create a manually valued asset (real estate, private holdings, ...).
    pub fn manual(id: u64, name: &str, asset_class: AssetClass) -> Self {
        Self {
            id,
            ticker: None,
            name: name.to_string(),
            asset_class,
            sector: None,
            is_manual: true,
        }
    }

    /// Attach a sector label.
    pub fn with_sector(mut self, sector: &str) -> Self {
        self.sector = Some(sector.to_string());
        self
    }

    /// Ticker if present, otherwise the asset name.
    pub fn symbol(&self) -> &str {
        self.ticker.as_deref().unwrap_or(&self.name)
    }
}

/// Transaction direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(TransactionKind::Buy),
            "sell" => Ok(TransactionKind::Sell),
            _ => Err(Error::InvalidOperation(format!("unknown transaction type: {s}"))),
        }
    }
}

/// A single buy or sell of an asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub asset_id: u64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Number of shares, always positive
    pub shares: f64,
    /// Price per share, always positive
    pub price: f64,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission: Option<f64>,
}

impl Transaction {
    /// Create a new transaction without commission.
    pub fn new(
        asset_id: u64,
        kind: TransactionKind,
        shares: f64,
        price: f64,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            asset_id,
            kind,
            shares,
            price,
            date,
            commission: None,
        }
    }

    /// Set the commission paid on this transaction.
    pub fn with_commission(mut self, commission: f64) -> Self {
        self.commission = Some(commission);
        self
    }

    /// Gross value of the trade including commission.
    pub fn total_cost(&self) -> f64 {
        self.shares * self.price + self.commission.unwrap_or(0.0)
    }
}

/// A hand-entered valuation for a manual asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManualAssetValue {
    pub asset_id: u64,
    pub value: f64,
    pub date: DateTime<Utc>,
}

/// Latest market quote for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Quote {
    /// Create a quote with only a price.
    pub fn new(symbol: &str, price: f64) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            price,
            change: 0.0,
            change_percent: 0.0,
            previous_close: None,
            last_updated: None,
        }
    }
}

/// A dated value (portfolio value, closing price, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// A dated cash flow into the portfolio.
///
/// Money-weighted returns expect contributions (purchases, deposits) as
/// positive amounts, compounded forward to the final portfolio value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CashFlow {
    pub amount: f64,
    pub date: DateTime<Utc>,
}

impl CashFlow {
    pub fn new(amount: f64, date: DateTime<Utc>) -> Self {
        Self { amount, date }
    }
}

/// A single dividend payment per share.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DividendPayment {
    pub amount: f64,
    pub date: DateTime<Utc>,
}

/// A holding considered for tax-loss harvesting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxLot {
    pub symbol: String,
    pub current_price: f64,
    pub cost_basis: f64,
    pub purchase_date: DateTime<Utc>,
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_market() {
        let asset = Asset::market(1, "aapl", "Apple", AssetClass::Equity).with_sector("Technology");
        assert_eq!(asset.ticker.as_deref(), Some("AAPL"));
        assert_eq!(asset.symbol(), "AAPL");
        assert_eq!(asset.sector.as_deref(), Some("Technology"));
        assert!(!asset.is_manual);
    }

    #[test]
    fn test_asset_manual_symbol_falls_back_to_name() {
        let asset = Asset::manual(2, "Lake House", AssetClass::RealEstate);
        assert!(asset.is_manual);
        assert_eq!(asset.symbol(), "Lake House");
    }

    #[test]
    fn test_transaction_total_cost() {
        let tx = Transaction::new(1, TransactionKind::Buy, 10.0, 150.0, Utc::now())
            .with_commission(5.0);
        assert_eq!(tx.total_cost(), 1505.0);
    }

    #[test]
    fn test_transaction_serde_shape() {
        let tx = Transaction::new(7, TransactionKind::Sell, 2.0, 50.0, Utc::now());
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "sell");
        assert_eq!(value["assetId"], 7);
        assert!(value.get("commission").is_none());
    }

    #[test]
    fn test_asset_class_labels() {
        assert_eq!(AssetClass::RealEstate.label(), "Real Estate");
        let json = serde_json::to_string(&AssetClass::RealEstate).unwrap();
        assert_eq!(json, "\"real_estate\"");
    }

    #[test]
    fn test_parse_asset_class_and_kind() {
        assert_eq!("Real Estate".parse::<AssetClass>().unwrap(), AssetClass::RealEstate);
        assert_eq!("stocks".parse::<AssetClass>().unwrap(), AssetClass::Equity);
        assert!("crypto".parse::<AssetClass>().is_err());
        assert_eq!("SELL".parse::<TransactionKind>().unwrap(), TransactionKind::Sell);
        assert!("hold".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
