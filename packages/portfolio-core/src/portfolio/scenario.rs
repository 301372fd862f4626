//! Scenario projections over historical return series.

use super::risk::{max_drawdown, mean, volatility};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Market scenario used to stress baseline return and risk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Scenario {
    BearMarket,
    BullMarket,
    Recession,
    Recovery,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::BearMarket,
        Scenario::BullMarket,
        Scenario::Recession,
        Scenario::Recovery,
    ];

    /// Multiplier applied to the baseline return.
    pub fn return_multiplier(&self) -> f64 {
        match self {
            Scenario::BearMarket => 0.8,
            Scenario::BullMarket => 1.2,
            Scenario::Recession => 0.7,
            Scenario::Recovery => 1.3,
        }
    }

    /// Multiplier applied to baseline risk, drawdown and volatility.
    pub fn risk_multiplier(&self) -> f64 {
        match self {
            Scenario::BearMarket => 1.5,
            Scenario::BullMarket => 0.8,
            Scenario::Recession => 1.8,
            Scenario::Recovery => 0.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::BearMarket => "bearMarket",
            Scenario::BullMarket => "bullMarket",
            Scenario::Recession => "recession",
            Scenario::Recovery => "recovery",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    /// Accepts camelCase (`bearMarket`) and kebab/snake case (`bear-market`, `bear_market`).
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str().to_lowercase() == normalized)
            .ok_or_else(|| Error::UnknownScenario(s.to_string()))
    }
}

/// Projected outcome of a scenario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub expected_return: f64,
    pub risk_level: f64,
    pub drawdown: f64,
    pub volatility: f64,
}

/// Per-period weighted sum of each symbol's returns.
///
/// Symbols without history are ignored. The result is truncated to the
/// shortest contributing series so every period has every symbol.
pub fn weighted_series(
    weights: &[(String, f64)],
    historical_data: &BTreeMap<String, Vec<f64>>,
) -> Vec<f64> {
    let series: Vec<(f64, &Vec<f64>)> = weights
        .iter()
        .filter_map(|(symbol, weight)| historical_data.get(symbol).map(|s| (*weight, s)))
        .collect();

    let Some(len) = series.iter().map(|(_, s)| s.len()).min() else {
        return Vec::new();
    };

    (0..len)
        .map(|i| series.iter().map(|(w, s)| w * s[i]).sum())
        .collect()
}

/// Project portfolio return and risk under a scenario.
///
/// Baseline return is `Σ w·mean(series)` and baseline risk is
/// `Σ w·volatility(series)` over symbols present in `historical_data`.
/// Drawdown and volatility come from the weighted aggregate series, the
/// drawdown measured on its compounded value path. Return figures scale by
/// the scenario's return multiplier, risk figures by its risk multiplier.
pub fn scenario_analysis(
    weights: &[(String, f64)],
    historical_data: &BTreeMap<String, Vec<f64>>,
    scenario: Scenario,
) -> ScenarioResult {
    let mut baseline_return = 0.0;
    let mut baseline_risk = 0.0;
    for (symbol, weight) in weights {
        match historical_data.get(symbol) {
            Some(series) => {
                baseline_return += weight * mean(series);
                baseline_risk += weight * volatility(series);
            }
            None => tracing::debug!(symbol = %symbol, "no history for scenario symbol"),
        }
    }

    let aggregate = weighted_series(weights, historical_data);
    let mut path = Vec::with_capacity(aggregate.len() + 1);
    path.push(1.0);
    for r in &aggregate {
        let last = path[path.len() - 1];
        path.push(last * (1.0 + r));
    }

    ScenarioResult {
        expected_return: baseline_return * scenario.return_multiplier(),
        risk_level: baseline_risk * scenario.risk_multiplier(),
        drawdown: max_drawdown(&path) * scenario.risk_multiplier(),
        volatility: volatility(&aggregate) * scenario.risk_multiplier(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn history() -> BTreeMap<String, Vec<f64>> {
        BTreeMap::from([
            ("AAA".to_string(), vec![0.10, -0.20, 0.05, 0.01]),
            ("BBB".to_string(), vec![0.02, 0.02, 0.02]),
        ])
    }

    #[test]
    fn test_multipliers() {
        assert_eq!(Scenario::BearMarket.return_multiplier(), 0.8);
        assert_eq!(Scenario::BearMarket.risk_multiplier(), 1.5);
        assert_eq!(Scenario::BullMarket.return_multiplier(), 1.2);
        assert_eq!(Scenario::BullMarket.risk_multiplier(), 0.8);
        assert_eq!(Scenario::Recession.return_multiplier(), 0.7);
        assert_eq!(Scenario::Recession.risk_multiplier(), 1.8);
        assert_eq!(Scenario::Recovery.return_multiplier(), 1.3);
        assert_eq!(Scenario::Recovery.risk_multiplier(), 0.9);
    }

    #[test]
    fn test_scenario_parse() {
        assert_eq!("bearMarket".parse::<Scenario>().unwrap(), Scenario::BearMarket);
        assert_eq!("bull-market".parse::<Scenario>().unwrap(), Scenario::BullMarket);
        assert_eq!("RECESSION".parse::<Scenario>().unwrap(), Scenario::Recession);
        assert!(matches!(
            "crash".parse::<Scenario>(),
            Err(Error::UnknownScenario(_))
        ));
        assert_eq!(Scenario::Recovery.to_string(), "recovery");
    }

    #[test]
    fn test_weighted_series_truncates_to_shortest() {
        let weights = vec![("AAA".to_string(), 0.5), ("BBB".to_string(), 0.5)];
        let series = weighted_series(&weights, &history());
        assert_eq!(series.len(), 3);
        assert_relative_eq!(series[0], 0.06, epsilon = 1e-12);
        assert_relative_eq!(series[1], -0.09, epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_series_missing_symbols() {
        let weights = vec![("ZZZ".to_string(), 1.0)];
        assert!(weighted_series(&weights, &history()).is_empty());
    }

    #[test]
    fn test_single_symbol_scenario() {
        let weights = vec![("AAA".to_string(), 1.0)];
        let data = history();
        let result = scenario_analysis(&weights, &data, Scenario::BearMarket);

        let series = &data["AAA"];
        assert_relative_eq!(result.expected_return, mean(series) * 0.8, epsilon = 1e-12);
        assert_relative_eq!(result.risk_level, volatility(series) * 1.5, epsilon = 1e-12);
        assert_relative_eq!(result.volatility, volatility(series) * 1.5, epsilon = 1e-12);
        // Path 1.0 -> 1.1 -> 0.88: 20% drawdown
        assert_relative_eq!(result.drawdown, 0.2 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_diversified_drawdown_uses_all_symbols() {
        let weights = vec![("AAA".to_string(), 0.5), ("BBB".to_string(), 0.5)];
        let result = scenario_analysis(&weights, &history(), Scenario::Recovery);

        // Path 1.0 -> 1.06 -> 0.9646: (1.06 - 0.9646) / 1.06 = 0.09
        assert_relative_eq!(result.drawdown, 0.09 * 0.9, epsilon = 1e-12);
        assert!(result.volatility > 0.0);
    }

    #[test]
    fn test_empty_portfolio() {
        let result = scenario_analysis(&[], &history(), Scenario::Recession);
        assert_eq!(result, ScenarioResult::default());
    }
}
