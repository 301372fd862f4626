//! Folio CLI - Command line interface for portfolio analytics.
//!
//! Every command prints a JSON `ApiResponse` on stdout; logs go to stderr.

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use portfolio_core::portfolio::{
    conditional_value_at_risk, holding_period_return, period_returns, DEFAULT_CONFIDENCE,
};
use portfolio_core::{
    asset_allocation, harvesting_opportunities, max_drawdown, risk_metrics, scenario_analysis,
    sector_diversification, time_weighted_return, top_holdings, value_at_risk, volatility,
    ApiResponse, Asset, AssetClass, Error, FolioConfig, InMemoryStore, ManualAssetValue,
    PortfolioBook, PortfolioStore, PortfolioSummary, PricePoint, Quote, QuoteBook, RateLimited,
    RateLimiter, Scenario, Transaction, TransactionKind,
};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio portfolio CLI - valuation, returns and risk analytics")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.folio/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Portfolio book (overrides the configured data file)
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Portfolio summary metrics
    Summary,
    /// Allocation by asset class
    Allocation,
    /// Allocation by sector
    Sectors,
    /// Most valuable holdings
    Top {
        /// Number of holdings (defaults to the configured value)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Return metrics for a value series
    Returns {
        /// Comma-separated portfolio values, oldest first
        #[arg(short, long)]
        values: String,
    },
    /// Risk metrics for a return series
    Risk {
        /// Comma-separated period returns
        #[arg(short, long)]
        returns: String,
        /// Comma-separated benchmark returns
        #[arg(short, long)]
        benchmark: Option<String>,
        /// Confidence level for VaR (defaults to the configured value)
        #[arg(short, long)]
        confidence: Option<f64>,
    },
    /// Tax-loss harvesting candidates
    Harvest,
    /// Project the portfolio under a market scenario
    Scenario {
        /// bear-market, bull-market, recession or recovery
        #[arg(short, long)]
        kind: String,
    },
    /// Manage assets, transactions and prices in the book
    Book {
        #[command(subcommand)]
        action: BookAction,
    },
}

#[derive(Subcommand)]
enum BookAction {
    /// List assets and transactions
    Show,
    /// Add an asset
    AddAsset {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Ticker symbol; omit for manually valued assets
        #[arg(short, long)]
        ticker: Option<String>,
        /// Asset class (equity, bonds, real-estate, ...)
        #[arg(short = 'k', long, default_value = "equity")]
        class: String,
        /// Sector label
        #[arg(short, long)]
        sector: Option<String>,
    },
    /// Remove an asset and everything recorded against it
    RemoveAsset {
        #[arg(short, long)]
        id: u64,
    },
    /// Record a buy or sell
    Trade {
        #[arg(short, long)]
        asset: u64,
        /// buy or sell
        #[arg(short = 'k', long, default_value = "buy")]
        kind: String,
        #[arg(short = 'n', long)]
        shares: f64,
        #[arg(short, long)]
        price: f64,
        #[arg(short, long)]
        commission: Option<f64>,
    },
    /// Record a manual valuation
    Value {
        #[arg(short, long)]
        asset: u64,
        #[arg(short, long)]
        value: f64,
    },
    /// Record daily closing prices for a symbol, ending today
    History {
        #[arg(short, long)]
        symbol: String,
        /// Comma-separated closing prices, oldest first
        #[arg(short, long)]
        values: String,
    },
    /// Refresh quotes and histories of the book's tickers from a JSON feed
    Refresh {
        /// Exported quote book to read from
        #[arg(short, long)]
        source: PathBuf,
    },
    /// Set the latest quote for a symbol
    Quote {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        price: f64,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => FolioConfig::load_from_path(path),
        None => FolioConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            println!("{}", respond::<()>(Err(e)));
            return;
        }
    };
    let data_file = cli.data.unwrap_or_else(|| config.data_file());
    tracing::debug!(path = %data_file.display(), "using portfolio book");

    let output = match cli.command {
        Commands::Summary => respond(handle_summary(&config, &data_file)),
        Commands::Allocation => respond(
            load_book(&data_file)
                .map(|book| json!({ "allocation": asset_allocation(&book.valuations()) })),
        ),
        Commands::Sectors => respond(
            load_book(&data_file)
                .map(|book| json!({ "sectors": sector_diversification(&book.valuations()) })),
        ),
        Commands::Top { limit } => {
            let limit = limit.unwrap_or(config.top_holdings);
            respond(
                load_book(&data_file)
                    .map(|book| json!({ "holdings": top_holdings(&book.valuations(), limit) })),
            )
        }
        Commands::Returns { values } => respond(handle_returns(&values)),
        Commands::Risk {
            returns,
            benchmark,
            confidence,
        } => respond(handle_risk(
            &config,
            &returns,
            benchmark.as_deref(),
            confidence.unwrap_or(config.var_confidence),
        )),
        Commands::Harvest => respond(load_book(&data_file).map(|book| {
            json!({
                "opportunities": harvesting_opportunities(
                    &book.tax_lots(),
                    Utc::now(),
                    config.harvest_window_days,
                ),
            })
        })),
        Commands::Scenario { kind } => respond(handle_scenario(&data_file, &kind)),
        Commands::Book { action } => respond(handle_book(&config, &data_file, action)),
    };

    println!("{}", output);
}

/// Serialize a result into a pretty-printed `ApiResponse`.
fn respond<T: Serialize>(result: Result<T, Error>) -> String {
    let rendered = match result {
        Ok(data) => serde_json::to_string_pretty(&ApiResponse::ok(data)),
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            serde_json::to_string_pretty(&ApiResponse::<()>::err(e.to_string()))
        }
    };
    rendered.unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"{e}\"}}"))
}

fn load_book(path: &Path) -> Result<PortfolioBook, Error> {
    PortfolioBook::load_from_path(path)
}

fn parse_series(input: &str) -> Result<Vec<f64>, Error> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| Error::InvalidOperation(format!("not a number: {s}")))
        })
        .collect()
}

fn handle_summary(config: &FolioConfig, data_file: &Path) -> Result<PortfolioSummary, Error> {
    let book = load_book(data_file)?;
    let returns = book.portfolio_returns();
    Ok(PortfolioSummary::build(
        &book.valuations(),
        &returns,
        config.risk_free_rate,
    ))
}

fn handle_returns(values: &str) -> Result<serde_json::Value, Error> {
    let values = parse_series(values)?;
    if values.len() < 2 {
        return Err(Error::InsufficientData(
            "at least two values are required".to_string(),
        ));
    }

    let returns = period_returns(&values);
    Ok(json!({
        "periodReturns": returns,
        "timeWeightedReturn": time_weighted_return(&returns),
        "holdingPeriodReturn": holding_period_return(values[0], values[values.len() - 1]),
        "maxDrawdown": max_drawdown(&values),
    }))
}

fn handle_risk(
    config: &FolioConfig,
    returns: &str,
    benchmark: Option<&str>,
    confidence: f64,
) -> Result<serde_json::Value, Error> {
    let returns = parse_series(returns)?;
    let benchmark = benchmark.map(parse_series).transpose()?.unwrap_or_default();
    let confidence = if confidence > 0.0 && confidence < 1.0 {
        confidence
    } else {
        tracing::warn!(confidence, "confidence out of range, using default");
        DEFAULT_CONFIDENCE
    };

    Ok(json!({
        "metrics": risk_metrics(&returns, &benchmark, config.risk_free_rate),
        "volatility": volatility(&returns),
        "valueAtRisk": value_at_risk(&returns, confidence),
        "conditionalValueAtRisk": conditional_value_at_risk(&returns, confidence),
        "confidence": confidence,
    }))
}

fn handle_scenario(data_file: &Path, kind: &str) -> Result<serde_json::Value, Error> {
    let scenario: Scenario = kind.parse()?;
    let book = load_book(data_file)?;
    let weights = PortfolioBook::market_weights(&book.valuations());

    Ok(json!({
        "scenario": scenario,
        "result": scenario_analysis(&weights, &book.return_history(), scenario),
    }))
}

fn handle_book(
    config: &FolioConfig,
    data_file: &Path,
    action: BookAction,
) -> Result<serde_json::Value, Error> {
    let mut store = InMemoryStore::from_book(load_book(data_file)?);

    let result = match action {
        BookAction::Show => {
            return Ok(json!({
                "assets": store.assets(),
                "transactions": store.transactions(),
                "quotes": store.book().market.quotes,
            }));
        }
        BookAction::AddAsset {
            name,
            ticker,
            class,
            sector,
        } => {
            let class: AssetClass = class.parse()?;
            let mut asset = match ticker.as_deref() {
                Some(ticker) => Asset::market(0, ticker, &name, class),
                None => Asset::manual(0, &name, class),
            };
            if let Some(sector) = sector.as_deref() {
                asset = asset.with_sector(sector);
            }
            json!({ "asset": store.create_asset(asset)? })
        }
        BookAction::RemoveAsset { id } => json!({ "removed": store.delete_asset(id)? }),
        BookAction::Trade {
            asset,
            kind,
            shares,
            price,
            commission,
        } => {
            let kind: TransactionKind = kind.parse()?;
            let mut transaction = Transaction::new(asset, kind, shares, price, Utc::now());
            if let Some(commission) = commission {
                transaction = transaction.with_commission(commission);
            }
            json!({ "transaction": store.create_transaction(transaction)? })
        }
        BookAction::Value { asset, value } => {
            let record = store.create_manual_value(ManualAssetValue {
                asset_id: asset,
                value,
                date: Utc::now(),
            })?;
            json!({ "value": record })
        }
        BookAction::History { symbol, values } => {
            let values = parse_series(&values)?;
            let today = Utc::now();
            let last = values.len().saturating_sub(1);
            let points: Vec<PricePoint> = values
                .iter()
                .enumerate()
                .map(|(i, &value)| PricePoint {
                    date: today - Duration::days((last - i) as i64),
                    value,
                })
                .collect();
            store.book_mut().market.insert_history(&symbol, points);
            json!({ "symbol": symbol.to_uppercase(), "points": values.len() })
        }
        BookAction::Refresh { source } => {
            let feed = RateLimited::new(
                QuoteBook::load_from_path(&source)?,
                RateLimiter::per_minute(config.requests_per_minute),
            );
            let tickers: Vec<String> = store
                .assets()
                .iter()
                .filter_map(|a| a.ticker.clone())
                .collect();
            let symbols: Vec<&str> = tickers.iter().map(String::as_str).collect();
            let updated = store.book_mut().market.refresh(&feed, &symbols);
            json!({ "updated": updated, "symbols": tickers.len() })
        }
        BookAction::Quote { symbol, price } => {
            let quote = Quote::new(&symbol, price);
            store.book_mut().market.insert_quote(quote.clone());
            json!({ "quote": quote })
        }
    };

    store.book_mut().save_to_path(data_file)?;
    Ok(result)
}
