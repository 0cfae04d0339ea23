//! Variance-adaptive signal weights.
//!
//! A signal that separates files strongly (high variance) earns a larger
//! share of the score; a signal that is the same everywhere earns nothing.

use std::collections::BTreeMap;

use serde::Serialize;

use super::signals::{FileSignals, Signal};

/// Weight of one signal together with the variance it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalWeight {
    pub signal: Signal,
    pub variance: f64,
    pub weight: f64,
}

/// Weights for all signals, in [`Signal::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Weights {
    entries: Vec<SignalWeight>,
}

impl Default for Weights {
    fn default() -> Self {
        Self::from_variances(&[0.0; 5])
    }
}

impl Weights {
    /// Weights from the population variance of each signal across `files`.
    pub fn from_signals(files: &BTreeMap<String, FileSignals>) -> Self {
        let variances: Vec<f64> = Signal::ALL
            .iter()
            .map(|&signal| {
                let values: Vec<f64> = files.values().map(|s| s.get(signal)).collect();
                population_variance(&values)
            })
            .collect();
        Self::from_variances(&variances)
    }

    fn from_variances(variances: &[f64]) -> Self {
        let total: f64 = variances.iter().sum();
        // Degenerate population: every weight becomes zero.
        let total = if total == 0.0 { 1.0 } else { total };

        let entries = Signal::ALL
            .iter()
            .zip(variances)
            .map(|(&signal, &variance)| SignalWeight {
                signal,
                variance,
                weight: variance / total,
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, signal: Signal) -> f64 {
        self.entries
            .iter()
            .find(|e| e.signal == signal)
            .map_or(0.0, |e| e.weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalWeight> {
        self.entries.iter()
    }

    /// Sum of all weights: 1 for a non-degenerate population, else 0.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }
}

/// Population variance (divides by N). Zero for an empty slice.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance_sum: f64 = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum();
    variance_sum / n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(pairs: &[(&str, f64, f64)]) -> BTreeMap<String, FileSignals> {
        pairs
            .iter()
            .map(|&(id, mods, churn)| {
                (
                    id.to_string(),
                    FileSignals {
                        mod_frequency: mods,
                        churn,
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_population_variance() {
        assert_eq!(population_variance(&[]), 0.0);
        assert_eq!(population_variance(&[3.0]), 0.0);
        assert!((population_variance(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
        assert!((population_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_weights_proportional_to_variance() {
        // mod_frequency variance 1, churn variance 9.
        let weights = Weights::from_signals(&signals(&[("a.rs", 1.0, 0.0), ("b.rs", 3.0, 6.0)]));
        assert!((weights.get(Signal::ModFrequency) - 0.1).abs() < 1e-12);
        assert!((weights.get(Signal::Churn) - 0.9).abs() < 1e-12);
        assert_eq!(weights.get(Signal::RecencyFix), 0.0);
        assert!((weights.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_population_yields_zero_weights() {
        let weights = Weights::from_signals(&signals(&[("only.rs", 2.0, 13.0)]));
        assert_eq!(weights.total(), 0.0);
        assert!(weights.iter().all(|e| e.weight == 0.0 && e.variance == 0.0));

        let weights = Weights::from_signals(&BTreeMap::new());
        assert_eq!(weights.total(), 0.0);
        assert_eq!(weights, Weights::default());
    }

    #[test]
    fn test_weights_report_in_signal_order() {
        let weights = Weights::default();
        let order: Vec<Signal> = weights.iter().map(|e| e.signal).collect();
        assert_eq!(order, Signal::ALL.to_vec());
    }
}
