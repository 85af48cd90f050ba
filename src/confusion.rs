/**
This module contains the confusion matrix used by the POS and lemma metrics. Rows are predicted
labels, columns are gold labels. Every derived view (label sets, marginal counts, per-label
metrics) is computed from the counts on demand.
*/
use ahash::AHashMap;
use ndarray::Array1;
use ndarray_stats::SummaryStatisticsExt;
use num::Float;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::ops::AddAssign;

/// Divides `numerator` by `denominator`, returning 0 when the denominator is 0.
pub(crate) fn safe_divide<F: Float>(numerator: F, denominator: F) -> F {
    if denominator.is_zero() {
        F::zero()
    } else {
        numerator / denominator
    }
}

/// Harmonic mean of the precision and the recall. Returns 0 when both are 0.
pub(crate) fn harmonic_mean<F: Float>(precision: F, recall: F) -> F {
    let two = F::one() + F::one();
    safe_divide(two * precision * recall, precision + recall)
}

#[derive(Debug, Clone, Default)]
pub struct ConfusionMatrix {
    cells: AHashMap<(String, String), usize>,
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` to the cell of the predicted label `predicted` and the gold label `gold`.
    pub fn add<P: Into<String>, G: Into<String>>(&mut self, predicted: P, gold: G, count: usize) {
        *self
            .cells
            .entry((predicted.into(), gold.into()))
            .or_insert(0) += count;
    }

    /// Builds the matrix of two parallel label sequences.
    pub fn from_sequences<S: AsRef<str>>(predicted: &[S], gold: &[S]) -> Self {
        let mut matrix = Self::new();
        for (p, g) in predicted.iter().zip(gold.iter()) {
            matrix.add(p.as_ref(), g.as_ref(), 1);
        }
        matrix
    }

    /// Adds the counts of every cell of `other`.
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        for ((predicted, gold), count) in other.cells.iter() {
            self.add(predicted.as_str(), gold.as_str(), *count);
        }
    }

    pub fn get(&self, predicted: &str, gold: &str) -> Option<usize> {
        self.cells
            .get(&(predicted.to_string(), gold.to_string()))
            .copied()
    }

    /// Labels seen as predictions.
    pub fn predicted_labels(&self) -> BTreeSet<&str> {
        self.cells.keys().map(|(p, _)| p.as_str()).collect()
    }

    /// Labels seen in the gold annotation.
    pub fn gold_labels(&self) -> BTreeSet<&str> {
        self.cells.keys().map(|(_, g)| g.as_str()).collect()
    }

    /// Union of the predicted and gold labels.
    pub fn labels(&self) -> BTreeSet<&str> {
        self.cells
            .keys()
            .flat_map(|(p, g)| [p.as_str(), g.as_str()])
            .collect()
    }

    /// Total count per predicted label.
    pub fn predicted_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for ((p, _), count) in self.cells.iter() {
            *counts.entry(p.as_str()).or_insert(0) += count;
        }
        counts
    }

    /// Total count per gold label.
    pub fn gold_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for ((_, g), count) in self.cells.iter() {
            *counts.entry(g.as_str()).or_insert(0) += count;
        }
        counts
    }

    /// True positives per label, over the union of the labels.
    pub fn matched_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts: BTreeMap<&str, usize> = self.labels().into_iter().map(|l| (l, 0)).collect();
        for ((p, g), count) in self.cells.iter() {
            if p == g {
                *counts.entry(p.as_str()).or_insert(0) += count;
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.cells.values().sum()
    }

    pub fn trace(&self) -> usize {
        self.cells
            .iter()
            .filter(|((p, g), _)| p == g)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn precisions(&self) -> BTreeMap<&str, f64> {
        let predicted = self.predicted_counts();
        self.matched_counts()
            .into_iter()
            .map(|(label, tp)| {
                let total = predicted.get(label).copied().unwrap_or(0);
                (label, safe_divide(tp as f64, total as f64))
            })
            .collect()
    }

    pub fn recalls(&self) -> BTreeMap<&str, f64> {
        let gold = self.gold_counts();
        self.matched_counts()
            .into_iter()
            .map(|(label, tp)| {
                let total = gold.get(label).copied().unwrap_or(0);
                (label, safe_divide(tp as f64, total as f64))
            })
            .collect()
    }

    pub fn f1s(&self) -> BTreeMap<&str, f64> {
        let recalls = self.recalls();
        self.precisions()
            .into_iter()
            .map(|(label, p)| {
                let r = recalls.get(label).copied().unwrap_or(0.0);
                (label, harmonic_mean(p, r))
            })
            .collect()
    }

    pub fn precision(&self, label: &str) -> f64 {
        self.precisions().get(label).copied().unwrap_or(0.0)
    }

    pub fn recall(&self, label: &str) -> f64 {
        self.recalls().get(label).copied().unwrap_or(0.0)
    }

    pub fn f1(&self, label: &str) -> f64 {
        self.f1s().get(label).copied().unwrap_or(0.0)
    }

    /// Sum of the diagonal over the sum of all the cells. Returns 0 on an empty matrix.
    pub fn accuracy(&self) -> f64 {
        safe_divide(self.trace() as f64, self.total() as f64)
    }

    /// Unweighted mean over the labels.
    fn macro_average(per_label: &BTreeMap<&str, f64>) -> f64 {
        let values: Array1<f64> = per_label.values().copied().collect();
        values.mean().unwrap_or(0.0)
    }

    /// Mean over the labels weighted by their gold frequency. A label absent from the gold
    /// annotation has no weight.
    fn weighted_average(&self, per_label: &BTreeMap<&str, f64>) -> f64 {
        let gold = self.gold_counts();
        let values: Array1<f64> = per_label.values().copied().collect();
        let weights: Array1<f64> = per_label
            .keys()
            .map(|label| gold.get(label).copied().unwrap_or(0) as f64)
            .collect();
        if weights.sum() == 0.0 {
            return 0.0;
        }
        values.weighted_mean(&weights).unwrap_or(0.0)
    }

    pub fn macro_precision(&self) -> f64 {
        Self::macro_average(&self.precisions())
    }

    pub fn macro_recall(&self) -> f64 {
        Self::macro_average(&self.recalls())
    }

    pub fn macro_f1(&self) -> f64 {
        Self::macro_average(&self.f1s())
    }

    pub fn weighted_precision(&self) -> f64 {
        self.weighted_average(&self.precisions())
    }

    pub fn weighted_recall(&self) -> f64 {
        self.weighted_average(&self.recalls())
    }

    pub fn weighted_f1(&self) -> f64 {
        self.weighted_average(&self.f1s())
    }

    /// Chance-corrected agreement between the predicted and the gold labels (Cohen's kappa). The
    /// expected agreement comes from the marginal distribution of each side. Returns 0 when the
    /// matrix is empty or when the expected agreement is 1.
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let observed = self.trace() as f64 / total;
        let predicted = self.predicted_counts();
        let gold = self.gold_counts();
        let expected: f64 = predicted
            .iter()
            .map(|(label, p_count)| {
                let g_count = gold.get(label).copied().unwrap_or(0);
                (*p_count as f64) * (g_count as f64)
            })
            .sum::<f64>()
            / (total * total);
        safe_divide(observed - expected, 1.0 - expected)
    }
}

impl AddAssign<&ConfusionMatrix> for ConfusionMatrix {
    fn add_assign(&mut self, other: &ConfusionMatrix) {
        self.merge(other)
    }
}
