//! Dividend history metrics.

use crate::types::DividendPayment;
use serde::{Deserialize, Serialize};

/// Detected payment cadence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DividendFrequency {
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
    #[default]
    Unknown,
}

impl DividendFrequency {
    /// Classify from the mean number of days between payments.
    pub fn from_mean_gap_days(days: f64) -> Self {
        match days {
            d if d <= 0.0 => DividendFrequency::Unknown,
            d if d <= 45.0 => DividendFrequency::Monthly,
            d if d <= 135.0 => DividendFrequency::Quarterly,
            d if d <= 270.0 => DividendFrequency::SemiAnnual,
            _ => DividendFrequency::Annual,
        }
    }
}

/// Summary of a dividend payment history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DividendMetrics {
    /// Latest payment annualized over four quarters, as a fraction
    #[serde(rename = "yield")]
    pub dividend_yield: f64,
    /// Change from the previous payment, in percent
    pub growth: f64,
    pub next_payment_estimate: f64,
    pub frequency: DividendFrequency,
}

/// Derive yield, growth, next-payment estimate and cadence from a payment history.
///
/// Needs at least two payments; otherwise returns the default metrics with
/// an `Unknown` frequency. Input order does not matter.
pub fn dividend_metrics(history: &[DividendPayment]) -> DividendMetrics {
    if history.len() < 2 {
        return DividendMetrics::default();
    }

    let mut sorted = history.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let latest = sorted[0].amount;
    let previous = sorted[1].amount;

    let growth = if previous != 0.0 {
        (latest - previous) / previous * 100.0
    } else {
        0.0
    };

    let span_days = (sorted[0].date - sorted[sorted.len() - 1].date).num_days() as f64;
    let mean_gap = span_days / (sorted.len() - 1) as f64;

    DividendMetrics {
        // Assumes quarterly payments regardless of detected frequency
        dividend_yield: latest * 4.0 / 100.0,
        growth,
        next_payment_estimate: latest * 1.02,
        frequency: DividendFrequency::from_mean_gap_days(mean_gap),
    }
}
