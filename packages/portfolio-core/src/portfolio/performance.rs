//! Return series analytics: TWR, MWR (IRR) and dashboard performance series.

use crate::types::{CashFlow, PricePoint};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MWR_INITIAL_GUESS: f64 = 0.10;
const MWR_MAX_ITERATIONS: usize = 100;
const MWR_TOLERANCE: f64 = 1e-4;
const MIN_DERIVATIVE: f64 = 1e-12;
const MILLIS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Time-weighted return of per-period fractional returns.
///
/// Compounds `(1 + acc)(1 + r) - 1` from a zero accumulator, so a single
/// period `[r]` returns exactly `r` and an empty slice returns `0.0`. Period
/// returns must already be isolated from external cash flows.
pub fn time_weighted_return(period_returns: &[f64]) -> f64 {
    // Expanded form keeps the single-period case exact in floating point.
    period_returns
        .iter()
        .fold(0.0, |acc, r| acc + r + acc * r)
}

/// Money-weighted return (IRR) of dated cash flows and a final value.
///
/// Contributions into the portfolio are positive amounts; they are grown to
/// the final value. Best-effort: on numerical instability the last
/// Newton-Raphson estimate is returned and a warning is logged. See
/// [`try_money_weighted_return`].
pub fn money_weighted_return(cash_flows: &[CashFlow], final_value: f64) -> f64 {
    solve_mwr(cash_flows, final_value).unwrap_or_else(|Unstable { estimate, iteration }| {
        tracing::warn!(estimate, iteration, "MWR solver hit a flat derivative");
        estimate
    })
}

/// Solve `0 = -final_value + Σ cf_j·(1+r)^t_j` for `r` by Newton-Raphson.
///
/// Contributions must be positive. `t_j` is the year fraction (365-day years)
/// from the first cash flow. Starts at 10%, stops when `|NPV| < 1e-4` or after
/// 100 iterations, and returns the last estimate either way. The only error is
/// [`Error::NumericalInstability`], raised on a zero or non-finite derivative
/// and carrying the current estimate.
pub fn try_money_weighted_return(cash_flows: &[CashFlow], final_value: f64) -> Result<f64> {
    solve_mwr(cash_flows, final_value).map_err(|Unstable { estimate, iteration }| {
        Error::NumericalInstability {
            estimate,
            iteration,
        }
    })
}

/// Solver state at the point the derivative became unusable.
struct Unstable {
    estimate: f64,
    iteration: usize,
}

fn solve_mwr(cash_flows: &[CashFlow], final_value: f64) -> std::result::Result<f64, Unstable> {
    let Some(first) = cash_flows.first() else {
        return Ok(0.0);
    };

    let years: Vec<f64> = cash_flows
        .iter()
        .map(|cf| year_fraction(first.date, cf.date))
        .collect();

    let mut rate = MWR_INITIAL_GUESS;
    for iteration in 0..MWR_MAX_ITERATIONS {
        let (npv, derivative) = cash_flows.iter().zip(&years).fold(
            (-final_value, 0.0),
            |(npv, derivative), (cf, &t)| {
                (
                    npv + cf.amount * (1.0 + rate).powf(t),
                    derivative + t * cf.amount * (1.0 + rate).powf(t - 1.0),
                )
            },
        );

        if npv.abs() < MWR_TOLERANCE {
            tracing::debug!(rate, iteration, "MWR converged");
            return Ok(rate);
        }

        if !npv.is_finite() || !derivative.is_finite() || derivative.abs() < MIN_DERIVATIVE {
            return Err(Unstable {
                estimate: rate,
                iteration,
            });
        }

        rate -= npv / derivative;
    }

    tracing::debug!(rate, "MWR iteration budget exhausted");
    Ok(rate)
}

fn year_fraction(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_YEAR
}

/// Period-over-period fractional returns of a value series.
///
/// A period starting from a non-positive value contributes `0.0`.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Calculate holding period return in percent.
pub fn holding_period_return(initial_value: f64, final_value: f64) -> f64 {
    if initial_value <= 0.0 {
        return 0.0;
    }
    ((final_value - initial_value) / initial_value) * 100.0
}

/// Annualize a percent return given the number of periods and periods per year.
pub fn annualize_return(return_pct: f64, periods: usize, periods_per_year: usize) -> f64 {
    if periods == 0 || periods_per_year == 0 {
        return 0.0;
    }

    let years = periods as f64 / periods_per_year as f64;
    let total_return = 1.0 + (return_pct / 100.0);

    (total_return.powf(1.0 / years) - 1.0) * 100.0
}

/// A point on the performance chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PerformancePoint {
    pub date: DateTime<Utc>,
    pub value: f64,
    /// Cumulative change since the first point, in percent
    pub percentage: f64,
}

/// Cumulative percent change of each point relative to the first.
pub fn performance_series(points: &[PricePoint]) -> Vec<PerformancePoint> {
    let Some(base) = points.first().map(|p| p.value) else {
        return Vec::new();
    };

    points
        .iter()
        .map(|p| PerformancePoint {
            date: p.date,
            value: p.value,
            percentage: holding_period_return(base, p.value),
        })
        .collect()
}
