//! Portfolio analytics module.
//!
//! Provides position derivation, valuation, return series, risk metrics,
//! attribution, scenario projections and tax utilities. Every function here is
//! pure: identical inputs always yield identical outputs.

mod attribution;
mod dividends;
mod performance;
mod position;
mod risk;
mod scenario;
mod tax;
mod valuation;

pub use attribution::{
    attribution, brinson_attribution, Attribution, AttributionDetail, BrinsonAttribution,
    SegmentAttribution, SegmentReturns,
};
pub use dividends::{dividend_metrics, DividendFrequency, DividendMetrics};
pub use performance::{
    annualize_return, holding_period_return, money_weighted_return, performance_series,
    period_returns, time_weighted_return, try_money_weighted_return, PerformancePoint,
};
pub use position::{average_cost, position, shares_held, Position};
pub use risk::{
    conditional_value_at_risk, correlation, max_drawdown, mean, norm_ppf,
    parametric_value_at_risk, risk_metrics, sharpe_ratio, sortino_ratio, value_at_risk,
    volatility, RiskMetrics, DEFAULT_CONFIDENCE, DEFAULT_RISK_FREE_RATE,
};
pub use scenario::{scenario_analysis, weighted_series, Scenario, ScenarioResult};
pub use tax::{
    harvesting_opportunities, HarvestAction, HarvestOpportunity, DEFAULT_HARVEST_WINDOW_DAYS,
};
pub use valuation::{
    asset_allocation, gain_loss, holding_valuations, latest_manual_value, portfolio_value,
    sector_diversification, top_holdings, AllocationSlice, GainLoss, HoldingValuation,
    PortfolioSummary, TopHolding,
};
