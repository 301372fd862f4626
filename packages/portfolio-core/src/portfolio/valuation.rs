//! Valuation, profit/loss and dashboard breakdowns.

use super::position::{position, shares_held};
use super::risk::{mean, sharpe_ratio, volatility};
use crate::types::{Asset, AssetClass, ManualAssetValue, Quote, Transaction};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Unrealized gain or loss of a position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct GainLoss {
    /// Gain/loss in currency units
    pub value: f64,
    /// Gain/loss as a percentage of cost basis
    pub percentage: f64,
}

/// Unrealized gain/loss of an asset's transactions at `current_price`.
///
/// Returns zero when there is no meaningful position (no shares held or no
/// buy history to derive a cost from).
pub fn gain_loss(transactions: &[Transaction], current_price: f64) -> GainLoss {
    let pos = position(transactions);
    if pos.shares <= 0.0 || pos.average_cost <= 0.0 {
        return GainLoss::default();
    }

    let cost_basis = pos.cost_basis();
    let value = pos.market_value(current_price) - cost_basis;

    GainLoss {
        value,
        percentage: (value / cost_basis) * 100.0,
    }
}

/// Most recent manual valuation for an asset, if any.
///
/// Among valuations sharing the newest date, the earliest entry wins.
pub fn latest_manual_value(asset_id: u64, manual_values: &[ManualAssetValue]) -> Option<f64> {
    manual_values
        .iter()
        .filter(|v| v.asset_id == asset_id)
        .rev()
        .max_by_key(|v| v.date)
        .map(|v| v.value)
}

fn transactions_for(asset_id: u64, transactions: &[Transaction]) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.asset_id == asset_id)
        .cloned()
        .collect()
}

fn quote_for<'a>(asset: &Asset, quotes: &'a HashMap<String, Quote>) -> Option<&'a Quote> {
    asset.ticker.as_ref().and_then(|ticker| quotes.get(ticker))
}

/// Total portfolio value.
///
/// Manual assets contribute their latest manual value; market assets
/// contribute `shares_held * quote.price` when a quote exists for the ticker.
/// Anything else contributes zero.
pub fn portfolio_value(
    assets: &[Asset],
    transactions: &[Transaction],
    quotes: &HashMap<String, Quote>,
    manual_values: &[ManualAssetValue],
) -> f64 {
    assets
        .iter()
        .map(|asset| {
            if asset.is_manual {
                latest_manual_value(asset.id, manual_values).unwrap_or(0.0)
            } else if let Some(quote) = quote_for(asset, quotes) {
                shares_held(&transactions_for(asset.id, transactions)) * quote.price
            } else {
                0.0
            }
        })
        .sum()
}

/// Valuation of a single holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingValuation {
    pub asset_id: u64,
    pub symbol: String,
    pub name: String,
    pub asset_class: AssetClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    pub is_manual: bool,
    /// Shares held (zero for manual assets)
    pub shares: f64,
    /// Current market or manual value
    pub value: f64,
    /// Cost basis (zero for manual assets)
    pub cost_basis: f64,
    pub gain_loss: GainLoss,
}

/// Value every asset that has a price source.
///
/// Market assets without a quote and manual assets without any valuation are
/// skipped.
pub fn holding_valuations(
    assets: &[Asset],
    transactions: &[Transaction],
    quotes: &HashMap<String, Quote>,
    manual_values: &[ManualAssetValue],
) -> Vec<HoldingValuation> {
    let mut valuations = Vec::with_capacity(assets.len());

    for asset in assets {
        let valuation = if asset.is_manual {
            let Some(value) = latest_manual_value(asset.id, manual_values) else {
                tracing::debug!(asset_id = asset.id, "manual asset has no valuation, skipping");
                continue;
            };
            HoldingValuation {
                asset_id: asset.id,
                symbol: asset.symbol().to_string(),
                name: asset.name.clone(),
                asset_class: asset.asset_class,
                sector: asset.sector.clone(),
                is_manual: true,
                shares: 0.0,
                value,
                cost_basis: 0.0,
                gain_loss: GainLoss::default(),
            }
        } else {
            let Some(quote) = quote_for(asset, quotes) else {
                tracing::warn!(symbol = asset.symbol(), "no quote for market asset, skipping");
                continue;
            };
            let asset_txs = transactions_for(asset.id, transactions);
            let pos = position(&asset_txs);
            let gain_loss = gain_loss(&asset_txs, quote.price);
            HoldingValuation {
                asset_id: asset.id,
                symbol: asset.symbol().to_string(),
                name: asset.name.clone(),
                asset_class: asset.asset_class,
                sector: asset.sector.clone(),
                is_manual: false,
                shares: pos.shares,
                value: pos.market_value(quote.price),
                cost_basis: if pos.shares > 0.0 && pos.average_cost > 0.0 {
                    pos.cost_basis()
                } else {
                    0.0
                },
                gain_loss,
            }
        };
        valuations.push(valuation);
    }

    valuations
}

/// Dashboard summary of a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: f64,
    /// Total unrealized gain/loss of market holdings
    pub gain_loss: f64,
    /// Gain/loss as a percentage of total cost basis
    pub gain_loss_percent: f64,
    pub sharpe_ratio: f64,
    /// Volatility of period returns, in percent
    pub volatility: f64,
    pub position_count: usize,
    pub positions_in_profit: usize,
    pub positions_in_loss: usize,
}

impl PortfolioSummary {
    /// Summarise holding valuations together with the portfolio's period returns.
    pub fn build(valuations: &[HoldingValuation], returns: &[f64], risk_free_rate: f64) -> Self {
        let total_value = valuations.iter().map(|v| v.value).sum();
        let total_cost: f64 = valuations.iter().map(|v| v.cost_basis).sum();
        let gain_loss: f64 = valuations.iter().map(|v| v.gain_loss.value).sum();

        let gain_loss_percent = if total_cost > 0.0 {
            (gain_loss / total_cost) * 100.0
        } else {
            0.0
        };

        let std_dev = volatility(returns);

        Self {
            total_value,
            gain_loss,
            gain_loss_percent,
            sharpe_ratio: sharpe_ratio(mean(returns), risk_free_rate, std_dev),
            volatility: std_dev * 100.0,
            position_count: valuations.len(),
            positions_in_profit: valuations.iter().filter(|v| v.gain_loss.value > 0.0).count(),
            positions_in_loss: valuations.iter().filter(|v| v.gain_loss.value < 0.0).count(),
        }
    }
}

/// One slice of an allocation breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationSlice {
    pub label: String,
    pub value: f64,
    /// Share of total portfolio value, in percent
    pub percentage: f64,
}

fn breakdown<'a>(
    valuations: &'a [HoldingValuation],
    key: impl Fn(&'a HoldingValuation) -> &'a str,
) -> Vec<AllocationSlice> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for v in valuations.iter().filter(|v| v.value > 0.0) {
        *groups.entry(key(v)).or_insert(0.0) += v.value;
    }

    let total: f64 = groups.values().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut slices: Vec<AllocationSlice> = groups
        .into_iter()
        .map(|(label, value)| AllocationSlice {
            label: label.to_string(),
            value,
            percentage: value / total * 100.0,
        })
        .collect();
    slices.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    slices
}

/// Allocation by asset class, largest first.
pub fn asset_allocation(valuations: &[HoldingValuation]) -> Vec<AllocationSlice> {
    breakdown(valuations, |v| v.asset_class.label())
}

/// Allocation by sector, largest first. Holdings without a sector count as "Other".
pub fn sector_diversification(valuations: &[HoldingValuation]) -> Vec<AllocationSlice> {
    breakdown(valuations, |v| v.sector.as_deref().unwrap_or("Other"))
}

/// A row of the top-holdings table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopHolding {
    pub asset_id: u64,
    pub symbol: String,
    pub name: String,
    pub value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
    /// Share of total portfolio value, in percent
    pub percentage: f64,
}

/// The `limit` most valuable holdings.
pub fn top_holdings(valuations: &[HoldingValuation], limit: usize) -> Vec<TopHolding> {
    let total: f64 = valuations.iter().map(|v| v.value).filter(|v| *v > 0.0).sum();

    let mut ranked: Vec<&HoldingValuation> = valuations.iter().filter(|v| v.value > 0.0).collect();
    ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));

    ranked
        .into_iter()
        .take(limit)
        .map(|v| TopHolding {
            asset_id: v.asset_id,
            symbol: v.symbol.clone(),
            name: v.name.clone(),
            value: v.value,
            gain_loss: v.gain_loss.value,
            gain_loss_percent: v.gain_loss.percentage,
            percentage: if total > 0.0 { v.value / total * 100.0 } else { 0.0 },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn buy(asset_id: u64, shares: f64, price: f64) -> Transaction {
        Transaction::new(asset_id, TransactionKind::Buy, shares, price, Utc::now())
    }

    fn sell(asset_id: u64, shares: f64, price: f64) -> Transaction {
        Transaction::new(asset_id, TransactionKind::Sell, shares, price, Utc::now())
    }

    fn sample() -> (Vec<Asset>, Vec<Transaction>, HashMap<String, Quote>, Vec<ManualAssetValue>) {
        let assets = vec![
            Asset::market(1, "AAPL", "Apple", AssetClass::Equity).with_sector("Technology"),
            Asset::market(2, "XOM", "Exxon", AssetClass::Equity).with_sector("Energy"),
            Asset::manual(3, "Lake House", AssetClass::RealEstate),
            Asset::market(4, "NOQT", "No Quote Inc", AssetClass::Equity),
        ];
        let transactions = vec![
            buy(1, 10.0, 150.0),
            buy(2, 20.0, 100.0),
            sell(2, 5.0, 110.0),
            buy(4, 3.0, 10.0),
        ];
        let quotes = HashMap::from([
            ("AAPL".to_string(), Quote::new("AAPL", 175.0)),
            ("XOM".to_string(), Quote::new("XOM", 90.0)),
        ]);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let manual_values = vec![
            ManualAssetValue { asset_id: 3, value: 5000.0, date: base },
            ManualAssetValue { asset_id: 3, value: 6000.0, date: base + Duration::days(30) },
            ManualAssetValue { asset_id: 3, value: 5500.0, date: base + Duration::days(10) },
        ];
        (assets, transactions, quotes, manual_values)
    }

    #[test]
    fn test_gain_loss() {
        let txs = vec![buy(1, 10.0, 150.0)];
        let pl = gain_loss(&txs, 175.0);
        assert_eq!(pl.value, 250.0);
        assert_relative_eq!(pl.percentage, 16.666666666666668, epsilon = 1e-9);
    }

    #[test]
    fn test_gain_loss_empty() {
        assert_eq!(gain_loss(&[], 100.0), GainLoss { value: 0.0, percentage: 0.0 });
    }

    #[test]
    fn test_gain_loss_closed_or_short_position() {
        let closed = vec![buy(1, 10.0, 150.0), sell(1, 10.0, 160.0)];
        assert_eq!(gain_loss(&closed, 200.0), GainLoss::default());

        let short = vec![sell(1, 5.0, 160.0)];
        assert_eq!(gain_loss(&short, 200.0), GainLoss::default());
    }

    #[test]
    fn test_latest_manual_value_uses_newest_date() {
        let (_, _, _, manual_values) = sample();
        assert_eq!(latest_manual_value(3, &manual_values), Some(6000.0));
        assert_eq!(latest_manual_value(99, &manual_values), None);
    }

    #[test]
    fn test_latest_manual_value_tie_keeps_first_entry() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let manual_values = vec![
            ManualAssetValue { asset_id: 3, value: 7000.0, date },
            ManualAssetValue { asset_id: 3, value: 7100.0, date },
        ];
        assert_eq!(latest_manual_value(3, &manual_values), Some(7000.0));
    }

    #[test]
    fn test_portfolio_value() {
        let (assets, transactions, quotes, manual_values) = sample();
        // AAPL 10 * 175 + XOM 15 * 90 + house 6000 + no-quote 0
        let total = portfolio_value(&assets, &transactions, &quotes, &manual_values);
        assert_eq!(total, 1750.0 + 1350.0 + 6000.0);
    }

    #[test]
    fn test_holding_valuations_skip_unpriced() {
        let (assets, transactions, quotes, manual_values) = sample();
        let valuations = holding_valuations(&assets, &transactions, &quotes, &manual_values);

        assert_eq!(valuations.len(), 3);
        let xom = valuations.iter().find(|v| v.symbol == "XOM").unwrap();
        assert_eq!(xom.shares, 15.0);
        assert_eq!(xom.value, 1350.0);
        assert_eq!(xom.cost_basis, 1500.0);
        assert_eq!(xom.gain_loss.value, -150.0);

        let house = valuations.iter().find(|v| v.is_manual).unwrap();
        assert_eq!(house.value, 6000.0);
        assert_eq!(house.cost_basis, 0.0);
    }

    #[test]
    fn test_summary() {
        let (assets, transactions, quotes, manual_values) = sample();
        let valuations = holding_valuations(&assets, &transactions, &quotes, &manual_values);
        let summary = PortfolioSummary::build(&valuations, &[], 0.02);

        assert_eq!(summary.total_value, 9100.0);
        assert_eq!(summary.gain_loss, 100.0); // 250 - 150
        assert_relative_eq!(summary.gain_loss_percent, 100.0 / 3000.0 * 100.0, epsilon = 1e-9);
        assert_eq!(summary.sharpe_ratio, 0.0);
        assert_eq!(summary.volatility, 0.0);
        assert_eq!(summary.positions_in_profit, 1);
        assert_eq!(summary.positions_in_loss, 1);
    }

    #[test]
    fn test_breakeven_holding_keeps_cost_basis() {
        let assets = vec![
            Asset::market(1, "AAA", "Flat Co", AssetClass::Equity),
            Asset::market(2, "BBB", "Up Co", AssetClass::Equity),
        ];
        let transactions = vec![buy(1, 10.0, 100.0), buy(2, 10.0, 100.0)];
        let quotes = HashMap::from([
            ("AAA".to_string(), Quote::new("AAA", 100.0)),
            ("BBB".to_string(), Quote::new("BBB", 110.0)),
        ]);

        let valuations = holding_valuations(&assets, &transactions, &quotes, &[]);
        let flat = valuations.iter().find(|v| v.symbol == "AAA").unwrap();
        assert_eq!(flat.gain_loss, GainLoss::default());
        assert_eq!(flat.cost_basis, 1000.0);

        let summary = PortfolioSummary::build(&valuations, &[], 0.02);
        assert_eq!(summary.gain_loss, 100.0);
        assert_relative_eq!(summary.gain_loss_percent, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_asset_allocation() {
        let (assets, transactions, quotes, manual_values) = sample();
        let valuations = holding_valuations(&assets, &transactions, &quotes, &manual_values);
        let allocation = asset_allocation(&valuations);

        assert_eq!(allocation.len(), 2);
        assert_eq!(allocation[0].label, "Real Estate");
        assert_relative_eq!(allocation[0].percentage, 6000.0 / 9100.0 * 100.0, epsilon = 1e-9);
        assert_eq!(allocation[1].label, "Equities");
        let total: f64 = allocation.iter().map(|s| s.percentage).sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sector_diversification_defaults_to_other() {
        let (assets, transactions, quotes, manual_values) = sample();
        let valuations = holding_valuations(&assets, &transactions, &quotes, &manual_values);
        let sectors = sector_diversification(&valuations);

        let labels: Vec<&str> = sectors.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Other", "Technology", "Energy"]);
    }

    #[test]
    fn test_allocation_empty() {
        assert!(asset_allocation(&[]).is_empty());
        assert!(top_holdings(&[], 5).is_empty());
    }

    #[test]
    fn test_top_holdings() {
        let (assets, transactions, quotes, manual_values) = sample();
        let valuations = holding_valuations(&assets, &transactions, &quotes, &manual_values);
        let top = top_holdings(&valuations, 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].symbol, "Lake House");
        assert_eq!(top[1].symbol, "AAPL");
        assert_eq!(top[1].gain_loss, 250.0);
        assert_relative_eq!(top[1].percentage, 1750.0 / 9100.0 * 100.0, epsilon = 1e-9);
    }
}
