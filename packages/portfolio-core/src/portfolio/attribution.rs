//! Performance attribution against a benchmark.

use serde::{Deserialize, Serialize};

/// Per-index attribution effects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AttributionDetail {
    pub allocation: f64,
    pub selection: f64,
    pub interaction: f64,
}

/// Aggregated attribution with its per-index breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Attribution {
    pub allocation: f64,
    pub selection: f64,
    pub interaction: f64,
    pub details: Vec<AttributionDetail>,
}

/// Attribute active return from aligned portfolio returns, benchmark returns and weights.
///
/// All three slices must be non-empty and of equal length, otherwise the
/// all-zero result is returned. Selection is `w·(p − b)` per index.
///
/// Allocation and interaction compare the benchmark series against itself
/// and are therefore always zero; callers needing a real allocation effect
/// must supply per-segment benchmark data to [`brinson_attribution`].
pub fn attribution(
    portfolio_returns: &[f64],
    benchmark_returns: &[f64],
    weights: &[f64],
) -> Attribution {
    if portfolio_returns.is_empty()
        || portfolio_returns.len() != benchmark_returns.len()
        || portfolio_returns.len() != weights.len()
    {
        tracing::debug!(
            portfolio = portfolio_returns.len(),
            benchmark = benchmark_returns.len(),
            weights = weights.len(),
            "attribution inputs misaligned"
        );
        return Attribution::default();
    }

    let details: Vec<AttributionDetail> = portfolio_returns
        .iter()
        .zip(benchmark_returns)
        .zip(weights)
        .map(|((&p, &b), &w)| {
            let benchmark_spread = b - b;
            AttributionDetail {
                allocation: w * benchmark_spread,
                selection: w * (p - b),
                interaction: w * (p - b) * benchmark_spread,
            }
        })
        .collect();

    Attribution {
        allocation: details.iter().map(|d| d.allocation).sum(),
        selection: details.iter().map(|d| d.selection).sum(),
        interaction: details.iter().map(|d| d.interaction).sum(),
        details,
    }
}

/// Weights and returns of one segment (sector, asset class) on both sides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentReturns {
    pub name: String,
    pub portfolio_weight: f64,
    pub benchmark_weight: f64,
    pub portfolio_return: f64,
    pub benchmark_return: f64,
}

/// Brinson effects for one segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentAttribution {
    pub name: String,
    pub allocation: f64,
    pub selection: f64,
    pub interaction: f64,
    pub total: f64,
}

/// Brinson-Fachler decomposition of active return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BrinsonAttribution {
    pub portfolio_return: f64,
    pub benchmark_return: f64,
    pub active_return: f64,
    pub allocation: f64,
    pub selection: f64,
    pub interaction: f64,
    pub segments: Vec<SegmentAttribution>,
}

/// Brinson-Fachler attribution over explicit segment data.
///
/// - allocation: `(wp − wb)·(rb − Rb)`
/// - selection: `wb·(rp − rb)`
/// - interaction: `(wp − wb)·(rp − rb)`
///
/// where `Rb` is the total benchmark return. The three effects sum to the
/// active return `Σwp·rp − Σwb·rb`.
pub fn brinson_attribution(segments: &[SegmentReturns]) -> BrinsonAttribution {
    if segments.is_empty() {
        return BrinsonAttribution::default();
    }

    let portfolio_return: f64 = segments
        .iter()
        .map(|s| s.portfolio_weight * s.portfolio_return)
        .sum();
    let benchmark_return: f64 = segments
        .iter()
        .map(|s| s.benchmark_weight * s.benchmark_return)
        .sum();

    let mut result = BrinsonAttribution {
        portfolio_return,
        benchmark_return,
        active_return: portfolio_return - benchmark_return,
        segments: Vec::with_capacity(segments.len()),
        ..Default::default()
    };

    for s in segments {
        let weight_diff = s.portfolio_weight - s.benchmark_weight;
        let allocation = weight_diff * (s.benchmark_return - benchmark_return);
        let selection = s.benchmark_weight * (s.portfolio_return - s.benchmark_return);
        let interaction = weight_diff * (s.portfolio_return - s.benchmark_return);

        result.allocation += allocation;
        result.selection += selection;
        result.interaction += interaction;
        result.segments.push(SegmentAttribution {
            name: s.name.clone(),
            allocation,
            selection,
            interaction,
            total: allocation + selection + interaction,
        });
    }

    result
}
