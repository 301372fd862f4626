//! Portfolio Core - Portfolio analytics library.
//!
//! This crate provides the computational core of a personal portfolio tracker:
//!
//! - **Positions**: Share counts and average cost from transaction history
//! - **Valuation**: Market value, gain/loss, allocation and top holdings
//! - **Returns**: Time-weighted and money-weighted (IRR) returns
//! - **Risk metrics**: Volatility, VaR, max drawdown, Sharpe/Treynor/information ratios
//! - **Attribution**: Allocation, selection and interaction effects
//! - **Scenarios and tax**: Scenario projections, dividend metrics, tax-loss harvesting
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use portfolio_core::portfolio::{average_cost, gain_loss, shares_held};
//! use portfolio_core::{Transaction, TransactionKind};
//!
//! let transactions = vec![
//!     Transaction::new(1, TransactionKind::Buy, 10.0, 100.0, Utc::now()),
//!     Transaction::new(1, TransactionKind::Sell, 4.0, 120.0, Utc::now()),
//! ];
//!
//! assert_eq!(shares_held(&transactions), 6.0);
//! assert_eq!(average_cost(&transactions), 100.0);
//!
//! let pl = gain_loss(&transactions, 110.0);
//! assert_eq!(pl.value, 60.0);
//! ```

pub mod config;
pub mod market;
pub mod portfolio;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::FolioConfig;
pub use market::{MarketData, QuoteBook, RateLimited, RateLimiter};
pub use store::{InMemoryStore, PortfolioBook, PortfolioStore, Record};
pub use types::{
    ApiResponse, Asset, AssetClass, CashFlow, DividendPayment, ManualAssetValue, PricePoint,
    Quote, TaxLot, Transaction, TransactionKind,
};

// Re-export main functionality
pub use portfolio::{
    asset_allocation, attribution, average_cost, brinson_attribution, dividend_metrics, gain_loss,
    harvesting_opportunities, holding_valuations, max_drawdown, money_weighted_return,
    portfolio_value, risk_metrics, scenario_analysis, sector_diversification, shares_held,
    sharpe_ratio, time_weighted_return, top_holdings, value_at_risk, volatility,
    PortfolioSummary, RiskMetrics, Scenario,
};

/// Error types for portfolio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: u64 },

    #[error("No market data for {0}")]
    MissingMarketData(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Numerical instability at iteration {iteration} (last estimate {estimate})")]
    NumericalInstability { estimate: f64, iteration: usize },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}

/// Result type for portfolio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
