//! Portfolio risk metrics calculation.
//!
//! Provides volatility, historical and parametric VaR, CVaR, max drawdown,
//! Sharpe, Sortino, Treynor and information ratios, alpha/beta and tracking
//! error. Ratios whose denominator is zero degrade to `0.0`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default risk-free rate used by Sharpe and alpha calculations.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Default confidence level for Value at Risk.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Risk-adjusted performance of a return series against a benchmark.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    /// Jensen's alpha per period
    pub alpha: f64,
    /// Sensitivity to benchmark moves
    pub beta: f64,
    pub sharpe_ratio: f64,
    /// Excess return per unit of systematic risk
    pub treynor_ratio: f64,
    /// Active return per unit of tracking error
    pub information_ratio: f64,
    /// Standard deviation of active returns
    pub tracking_error: f64,
}

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation of returns.
///
/// Uses the `n - 1` denominator; returns `0.0` for fewer than two returns.
pub fn volatility(returns: &[f64]) -> f64 {
    if returns.len() <= 1 {
        return 0.0;
    }

    let mean = mean(returns);
    let squared: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum();

    (squared / (returns.len() - 1) as f64).sqrt()
}

fn sorted_ascending(returns: &[f64]) -> Vec<f64> {
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

fn tail_index(confidence: f64, n: usize) -> usize {
    let idx = ((1.0 - confidence) * n as f64).floor();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(n - 1)
    }
}

/// Value at Risk by historical simulation.
///
/// Sorts returns ascending and takes the return at index
/// `floor((1 - confidence) * n)`. The result is the loss magnitude, so a
/// `-5%` tail return yields `0.05`.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let sorted = sorted_ascending(returns);
    -sorted[tail_index(confidence, sorted.len())]
}

/// Conditional VaR (expected shortfall): mean loss over the VaR tail.
///
/// The tail includes the VaR observation itself, so the result is never
/// smaller than [`value_at_risk`] at the same confidence.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let sorted = sorted_ascending(returns);
    let tail = &sorted[..=tail_index(confidence, sorted.len())];
    -mean(tail)
}

/// Value at Risk using the parametric (variance-covariance) method.
///
/// # Arguments
///
/// * `returns` - Period returns
/// * `portfolio_value` - Current portfolio value
/// * `confidence` - Confidence level (e.g., 0.95 for 95%)
///
/// # Returns
///
/// VaR in currency units (positive number representing potential loss).
pub fn parametric_value_at_risk(returns: &[f64], portfolio_value: f64, confidence: f64) -> f64 {
    if returns.len() <= 1 || portfolio_value <= 0.0 {
        return 0.0;
    }

    let z = norm_ppf(1.0 - confidence);
    -(mean(returns) + z * volatility(returns)) * portfolio_value
}

/// Maximum peak-to-trough decline of a value series.
///
/// Returns the drawdown as a fraction (e.g., 0.25 for 25%), or `0.0` when
/// there are fewer than two points. Non-positive peaks are skipped.
pub fn max_drawdown(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let mut peak = values[0];
    let mut max_drawdown = 0.0_f64;

    for &value in values {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            max_drawdown = max_drawdown.max((peak - value) / peak);
        }
    }

    max_drawdown
}

/// Sharpe ratio: `(portfolio_return - risk_free_rate) / std_dev`.
///
/// Returns `0.0` when `std_dev` is zero.
pub fn sharpe_ratio(portfolio_return: f64, risk_free_rate: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (portfolio_return - risk_free_rate) / std_dev
}

/// Sortino ratio: excess mean return over downside deviation.
///
/// Downside deviation is the root mean square of negative returns. Returns
/// `0.0` when there are no negative returns.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();
    if downside.is_empty() {
        return 0.0;
    }

    let downside_variance =
        downside.iter().map(|r| r.powi(2)).sum::<f64>() / downside.len() as f64;
    let downside_dev = downside_variance.sqrt();
    if downside_dev <= 0.0 {
        return 0.0;
    }

    (mean(returns) - risk_free_rate) / downside_dev
}

/// Pearson correlation over the common prefix of two series.
///
/// Returns `0.0` when either series has no variance.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n <= 1 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);

    let (mean_a, mean_b) = (mean(a), mean(b));
    let covariance = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (n - 1) as f64;

    let denom = volatility(a) * volatility(b);
    if denom == 0.0 {
        return 0.0;
    }
    covariance / denom
}

/// Alpha, beta and risk-adjusted ratios of `returns` against `benchmark_returns`.
///
/// Series are paired over their common prefix. Fewer than two pairs yields
/// all-zero metrics.
pub fn risk_metrics(
    returns: &[f64],
    benchmark_returns: &[f64],
    risk_free_rate: f64,
) -> RiskMetrics {
    let n = returns.len().min(benchmark_returns.len());
    if n < 2 {
        tracing::debug!(pairs = n, "not enough paired returns for risk metrics");
        return RiskMetrics::default();
    }
    let (returns, benchmark) = (&returns[..n], &benchmark_returns[..n]);

    let mean_return = mean(returns);
    let mean_benchmark = mean(benchmark);
    let std_return = volatility(returns);
    let std_benchmark = volatility(benchmark);

    let beta = if std_benchmark == 0.0 {
        0.0
    } else {
        correlation(returns, benchmark) * std_return / std_benchmark
    };

    let alpha = mean_return - (risk_free_rate + beta * (mean_benchmark - risk_free_rate));

    let treynor_ratio = if beta == 0.0 {
        0.0
    } else {
        (mean_return - risk_free_rate) / beta
    };

    let active: Vec<f64> = returns.iter().zip(benchmark).map(|(r, b)| r - b).collect();
    let tracking_error = volatility(&active);

    let information_ratio = if tracking_error == 0.0 {
        0.0
    } else {
        (mean_return - mean_benchmark) / tracking_error
    };

    RiskMetrics {
        alpha,
        beta,
        sharpe_ratio: sharpe_ratio(mean_return, risk_free_rate, std_return),
        treynor_ratio,
        information_ratio,
        tracking_error,
    }
}

/// Inverse cumulative distribution function for standard normal distribution.
///
/// Uses Acklam's rational approximation.
pub fn norm_ppf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];

    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];

    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];

    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_norm_ppf() {
        assert!(norm_ppf(0.5).abs() < 0.001);
        assert!((norm_ppf(0.95) - 1.645).abs() < 0.01);
        assert!((norm_ppf(0.975) - 1.96).abs() < 0.01);
        assert!((norm_ppf(0.99) - 2.326).abs() < 0.01);
        // Symmetry
        assert!((norm_ppf(0.05) + 1.645).abs() < 0.01);
        assert!((norm_ppf(0.01) + 2.326).abs() < 0.01);
    }

    #[test]
    fn test_volatility_degenerate() {
        assert_eq!(volatility(&[]), 0.0);
        assert_eq!(volatility(&[0.42]), 0.0);
        assert_eq!(volatility(&[1.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_volatility_sample() {
        assert_eq!(volatility(&[1.0, -1.0]), 2.0_f64.sqrt());
        // mean 2, squared diffs 1+0+1, / 2 = 1
        assert_relative_eq!(volatility(&[1.0, 2.0, 3.0]), 1.0);
    }

    #[test]
    fn test_value_at_risk_historical() {
        let returns = vec![-0.05, -0.02, 0.0, 0.01, 0.03];
        assert_eq!(value_at_risk(&returns, 0.95), 0.05);

        let shuffled = vec![0.03, 0.0, -0.02, 0.01, -0.05];
        assert_eq!(value_at_risk(&shuffled, 0.95), 0.05);
    }

    #[test]
    fn test_value_at_risk_index_selection() {
        // 20 returns: floor(0.25 * 20) = 5 -> sixth smallest
        let returns: Vec<f64> = (0..20).map(|i| (i as f64 - 10.0) / 100.0).collect();
        assert_relative_eq!(value_at_risk(&returns, 0.75), 0.05, epsilon = 1e-12);
        assert_eq!(value_at_risk(&[], 0.95), 0.0);
    }

    #[test]
    fn test_value_at_risk_low_confidence_clamped() {
        assert_eq!(value_at_risk(&[-0.01, 0.02], 0.0), -0.02);
    }

    #[test]
    fn test_cvar_at_least_var() {
        let returns: Vec<f64> = (0..20).map(|i| (i as f64 - 10.0) / 100.0).collect();
        let var = value_at_risk(&returns, 0.75);
        let cvar = conditional_value_at_risk(&returns, 0.75);
        assert!(cvar >= var);
        // mean of -0.10..=-0.05
        assert_relative_eq!(cvar, 0.075, epsilon = 1e-12);
    }

    #[test]
    fn test_parametric_var() {
        let returns = vec![0.01, -0.01, 0.02, -0.02, 0.01, -0.01, 0.015, -0.015, 0.005, -0.005];
        let var = parametric_value_at_risk(&returns, 100_000.0, 0.95);
        assert!(var > 0.0);
        assert!(var < 100_000.0);
        assert_eq!(parametric_value_at_risk(&returns, 0.0, 0.95), 0.0);
    }

    #[test]
    fn test_max_drawdown() {
        assert_eq!(max_drawdown(&[100.0, 120.0, 90.0, 110.0]), 0.25);
    }

    #[test]
    fn test_max_drawdown_degenerate() {
        assert_eq!(max_drawdown(&[]), 0.0);
        assert_eq!(max_drawdown(&[100.0]), 0.0);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0, 4.0]), 0.0);
        assert_eq!(max_drawdown(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_max_drawdown_keeps_worst() {
        // 100 -> 80 (20%), then 150 -> 135 (10%)
        assert_relative_eq!(max_drawdown(&[100.0, 80.0, 150.0, 135.0]), 0.2);
    }

    #[test]
    fn test_sharpe_ratio() {
        assert_relative_eq!(sharpe_ratio(0.12, 0.02, 0.2), 0.5);
        assert_eq!(sharpe_ratio(0.12, 0.02, 0.0), 0.0);
        assert!(sharpe_ratio(0.01, 0.02, 0.1) < 0.0);
    }

    #[test]
    fn test_sortino_ratio() {
        let all_positive: Vec<f64> = (0..10).map(|_| 0.01).collect();
        assert_eq!(sortino_ratio(&all_positive, 0.0), 0.0);

        let mixed = vec![0.03, -0.01, 0.02, -0.02];
        assert!(sortino_ratio(&mixed, 0.0) > 0.0);
    }

    #[test]
    fn test_correlation() {
        let a = vec![0.01, -0.02, 0.03, 0.0];
        let b: Vec<f64> = a.iter().map(|x| x * 3.0).collect();
        assert_relative_eq!(correlation(&a, &b), 1.0, epsilon = 1e-12);

        let inverse: Vec<f64> = a.iter().map(|x| -x).collect();
        assert_relative_eq!(correlation(&a, &inverse), -1.0, epsilon = 1e-12);

        assert_eq!(correlation(&a, &[0.01, 0.01, 0.01, 0.01]), 0.0);
    }

    #[test]
    fn test_risk_metrics_leveraged_benchmark() {
        let benchmark = vec![0.01, -0.02, 0.03, 0.0];
        let returns: Vec<f64> = benchmark.iter().map(|b| b * 2.0).collect();

        let metrics = risk_metrics(&returns, &benchmark, 0.0);
        assert_relative_eq!(metrics.beta, 2.0, epsilon = 1e-12);
        // alpha = mean_r - beta * mean_b = 0
        assert_relative_eq!(metrics.alpha, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.tracking_error, volatility(&benchmark), epsilon = 1e-12);
        assert_relative_eq!(metrics.treynor_ratio, mean(&returns) / 2.0, epsilon = 1e-12);
        assert_relative_eq!(
            metrics.information_ratio,
            mean(&benchmark) / volatility(&benchmark),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_risk_metrics_perfect_tracking() {
        let series = vec![0.01, 0.02, -0.01, 0.005];
        let metrics = risk_metrics(&series, &series, 0.0);
        assert_relative_eq!(metrics.beta, 1.0, epsilon = 1e-12);
        assert_eq!(metrics.tracking_error, 0.0);
        assert_eq!(metrics.information_ratio, 0.0);
    }

    #[test]
    fn test_risk_metrics_flat_benchmark_guards() {
        let returns = vec![0.01, 0.02, -0.01];
        let flat = vec![0.0, 0.0, 0.0];
        let metrics = risk_metrics(&returns, &flat, 0.02);

        assert_eq!(metrics.beta, 0.0);
        assert_eq!(metrics.treynor_ratio, 0.0);
        assert!(metrics.alpha.is_finite());
        assert!(metrics.information_ratio.is_finite());
    }

    #[test]
    fn test_risk_metrics_insufficient() {
        assert_eq!(risk_metrics(&[0.01], &[0.02], 0.02), RiskMetrics::default());
        assert_eq!(risk_metrics(&[], &[], 0.02), RiskMetrics::default());
    }

    #[test]
    fn test_idempotent() {
        let returns = vec![0.03, -0.01, 0.02, -0.04, 0.01];
        let benchmark = vec![0.02, -0.02, 0.01, -0.03, 0.02];
        assert_eq!(
            risk_metrics(&returns, &benchmark, 0.01),
            risk_metrics(&returns, &benchmark, 0.01)
        );
        assert_eq!(value_at_risk(&returns, 0.9), value_at_risk(&returns, 0.9));
    }
}
