/**
This module contains the task metrics. Every metric scores one sentence pair at a time with
`TaskMetric::single` and keeps running totals, from which `TaskMetric::aggregate` computes the
scores of every sentence seen so far. Metrics never share state.
*/
use crate::align::RangeMismatchError;
use crate::boundary::DegenerateAgreementError;
use crate::config::{Mode, Task};
use crate::confusion::{harmonic_mean, safe_divide};
use crate::entity::{EntityParsingError, EntityScores, PrecisionRecall};
use crate::item::Item;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Display};

mod labels;
mod lemma;
mod ner;
mod pos;
mod token;

pub use labels::MISALIGNED;
pub use lemma::LemmaMetric;
pub use ner::NerMetric;
pub use pos::PosMetric;
pub use token::{TokenAgreementMetric, TokenReferenceMetric};

/// A stateful scorer of one task.
pub trait TaskMetric {
    /// The task scored by this metric.
    fn task(&self) -> Task;
    /// Scores one sentence pair and adds it to the running totals.
    ///
    /// * `a`: Gold sentence in reference mode, first annotator in agreement mode.
    /// * `b`: Predicted sentence in reference mode, second annotator in agreement mode.
    fn single(&mut self, a: &[Item], b: &[Item]) -> Result<Scores, EvaluationError>;
    /// Scores every sentence pair seen so far.
    fn aggregate(&self) -> Result<Scores, EvaluationError>;
}

/// Precision, recall and their harmonic mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Prf {
    pub precision: f64,
    pub recall: f64,
    pub fscore: f64,
}

impl Prf {
    pub fn new(precision: f64, recall: f64) -> Self {
        Self {
            precision,
            recall,
            fscore: harmonic_mean(precision, recall),
        }
    }

    /// Scores of `correct` matches among `n_pred` predictions and `n_gold` references.
    pub fn from_counts(correct: usize, n_pred: usize, n_gold: usize) -> Self {
        let (correct, n_pred, n_gold) = (correct as f64, n_pred as f64, n_gold as f64);
        Self {
            precision: safe_divide(correct, n_pred),
            recall: safe_divide(correct, n_gold),
            fscore: safe_divide(2.0 * correct, n_pred + n_gold),
        }
    }

    fn rows(&self, prefix: &str) -> Vec<(String, f64)> {
        vec![
            (format!("{}precision", prefix), self.precision),
            (format!("{}recall", prefix), self.recall),
            (format!("{}fscore", prefix), self.fscore),
        ]
    }
}

impl From<PrecisionRecall> for Prf {
    fn from(value: PrecisionRecall) -> Self {
        Prf::new(value.precision, value.recall)
    }
}

/// Entity-level scores, overall and per entity type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityReport {
    pub overall: Prf,
    pub per_label: BTreeMap<String, Prf>,
}

impl From<EntityScores> for EntityReport {
    fn from(value: EntityScores) -> Self {
        Self {
            overall: value.overall.into(),
            per_label: value
                .per_label
                .into_iter()
                .map(|(label, scores)| (label, scores.into()))
                .collect(),
        }
    }
}

/// Scores of one task, over one sentence or over a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scores {
    /// Token segmentation against a reference.
    Segmentation(Prf),
    /// Token segmentation agreement between two annotators.
    BoundaryAgreement { boundary_edit_kappa: f64 },
    /// POS tags against a reference. `per_label` holds the scores of each tag.
    Classification {
        accuracy: f64,
        precision: f64,
        recall: f64,
        fscore: f64,
        per_label: BTreeMap<String, Prf>,
    },
    /// Lemmas against a reference.
    Accuracy { accuracy: f64 },
    /// POS tags or lemmas agreement between two annotators.
    Agreement { kappa: f64 },
    Entities(EntityReport),
    /// The sentence pair could not be scored and contributed nothing to the totals.
    Skipped,
}

impl Scores {
    /// Named values of the scores. Entity scores are prefixed by `overall.` or by their label, and
    /// so are the scores of each POS tag.
    pub fn rows(&self) -> Vec<(String, f64)> {
        match self {
            Scores::Segmentation(prf) => prf.rows(""),
            Scores::BoundaryAgreement {
                boundary_edit_kappa,
            } => vec![(String::from("boundary_edit_kappa"), *boundary_edit_kappa)],
            Scores::Classification {
                accuracy,
                precision,
                recall,
                fscore,
                per_label,
            } => {
                let mut rows = vec![(String::from("accuracy"), *accuracy)];
                rows.extend(Prf::rows(
                    &Prf {
                        precision: *precision,
                        recall: *recall,
                        fscore: *fscore,
                    },
                    "",
                ));
                for (label, prf) in per_label.iter() {
                    rows.extend(prf.rows(&format!("{}.", label)));
                }
                rows
            }
            Scores::Accuracy { accuracy } => vec![(String::from("accuracy"), *accuracy)],
            Scores::Agreement { kappa } => vec![(String::from("kappa"), *kappa)],
            Scores::Entities(report) => {
                let mut rows = report.overall.rows("overall.");
                for (label, prf) in report.per_label.iter() {
                    rows.extend(prf.rows(&format!("{}.", label)));
                }
                rows
            }
            Scores::Skipped => vec![],
        }
    }

    /// Value of a named score, such as `"precision"` or `"PER.recall"`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.rows()
            .into_iter()
            .find(|(row, _)| row == name)
            .map(|(_, value)| value)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Scores::Skipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The metric of a task was asked to work in a mode it does not support.
pub struct UnsupportedModeError {
    pub task: Task,
    pub mode: Mode,
}

impl Display for UnsupportedModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The {} task does not support the {} mode",
            self.task, self.mode
        )
    }
}

impl Error for UnsupportedModeError {}

#[derive(Debug, Clone, PartialEq)]
/// Enum error encompassing every failure that can happen while scoring sentence pairs.
pub enum EvaluationError {
    RangeMismatch(RangeMismatchError),
    DegenerateAgreement(DegenerateAgreementError),
    UnsupportedMode(UnsupportedModeError),
    EntityParsing(EntityParsingError),
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RangeMismatch(err) => Display::fmt(err, f),
            Self::DegenerateAgreement(err) => Display::fmt(err, f),
            Self::UnsupportedMode(err) => Display::fmt(err, f),
            Self::EntityParsing(err) => Display::fmt(err, f),
        }
    }
}

impl Error for EvaluationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RangeMismatch(err) => Some(err),
            Self::DegenerateAgreement(err) => Some(err),
            Self::UnsupportedMode(err) => Some(err),
            Self::EntityParsing(err) => Some(err),
        }
    }
}

impl From<RangeMismatchError> for EvaluationError {
    fn from(value: RangeMismatchError) -> Self {
        Self::RangeMismatch(value)
    }
}

impl From<DegenerateAgreementError> for EvaluationError {
    fn from(value: DegenerateAgreementError) -> Self {
        Self::DegenerateAgreement(value)
    }
}

impl From<UnsupportedModeError> for EvaluationError {
    fn from(value: UnsupportedModeError) -> Self {
        Self::UnsupportedMode(value)
    }
}

impl From<EntityParsingError> for EvaluationError {
    fn from(value: EntityParsingError) -> Self {
        Self::EntityParsing(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_prf_from_counts() {
        let prf = Prf::from_counts(2, 4, 2);
        assert_eq!(prf.precision, 0.5);
        assert_eq!(prf.recall, 1.0);
        assert!((prf.fscore - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(Prf::from_counts(0, 0, 0), Prf::default());
    }

    #[test]
    fn test_entity_rows() {
        let mut per_label = BTreeMap::new();
        per_label.insert(String::from("PER"), Prf::new(1.0, 0.5));
        let scores = Scores::Entities(EntityReport {
            overall: Prf::new(1.0, 0.5),
            per_label,
        });
        assert_eq!(scores.rows().len(), 6);
        assert_eq!(scores.get("overall.precision"), Some(1.0));
        assert_eq!(scores.get("PER.recall"), Some(0.5));
        assert_eq!(scores.get("LOC.recall"), None);
    }

    #[test]
    fn test_classification_rows() {
        let scores = Scores::Classification {
            accuracy: 0.75,
            precision: 0.5,
            recall: 0.25,
            fscore: 0.1,
            per_label: BTreeMap::from([(String::from("NOUN"), Prf::new(1.0, 0.5))]),
        };
        let names: Vec<String> = scores.rows().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "accuracy",
                "precision",
                "recall",
                "fscore",
                "NOUN.precision",
                "NOUN.recall",
                "NOUN.fscore"
            ]
        );
        assert_eq!(scores.get("recall"), Some(0.25));
        assert_eq!(scores.get("NOUN.recall"), Some(0.5));
        assert!(Scores::Skipped.rows().is_empty());
    }

    #[test]
    fn test_scores_serialize_without_tag() {
        let scores = Scores::Agreement { kappa: 0.5 };
        let value = serde_json::to_value(&scores).unwrap();
        assert_eq!(value, serde_json::json!({"kappa": 0.5}));
        let value = serde_json::to_value(Scores::Skipped).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_error_display_and_conversion() {
        let err: EvaluationError = UnsupportedModeError {
            task: Task::Ner,
            mode: Mode::Agreement,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "The ner task does not support the agreement mode"
        );
        assert!(err.source().is_some());
    }
}
