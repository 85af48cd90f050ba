use super::labels::{aligned_labels, normalize_label, sentence_matrix};
use super::{EvaluationError, Prf, Scores, TaskMetric};
use crate::config::{Average, Mode, Task};
use crate::confusion::ConfusionMatrix;
use crate::item::Item;
use log::debug;

/// Part-of-speech tags of the minimum tokens. In reference mode the tags of the second sentence
/// are scored against the tags of the first one; in agreement mode both are compared with Cohen's
/// kappa.
#[derive(Debug, Clone)]
pub struct PosMetric {
    mode: Mode,
    average: Average,
    skip_unaligned: bool,
    strict: bool,
    matrix: ConfusionMatrix,
}

impl PosMetric {
    pub fn new(mode: Mode, average: Average, skip_unaligned: bool, strict: bool) -> Self {
        Self {
            mode,
            average,
            skip_unaligned,
            strict,
            matrix: ConfusionMatrix::new(),
        }
    }

    fn score(&self, matrix: &ConfusionMatrix) -> Scores {
        match self.mode {
            Mode::Reference => {
                let accuracy = matrix.accuracy();
                let (precision, recall, fscore) = match self.average {
                    Average::Micro => (accuracy, accuracy, accuracy),
                    Average::Macro => (
                        matrix.macro_precision(),
                        matrix.macro_recall(),
                        matrix.macro_f1(),
                    ),
                    Average::Weighted => (
                        matrix.weighted_precision(),
                        matrix.weighted_recall(),
                        matrix.weighted_f1(),
                    ),
                };
                let recalls = matrix.recalls();
                let per_label = matrix
                    .precisions()
                    .into_iter()
                    .map(|(label, precision)| {
                        let recall = recalls.get(label).copied().unwrap_or(0.0);
                        (label.to_string(), Prf::new(precision, recall))
                    })
                    .collect();
                Scores::Classification {
                    accuracy,
                    precision,
                    recall,
                    fscore,
                    per_label,
                }
            }
            Mode::Agreement => Scores::Agreement {
                kappa: matrix.kappa(),
            },
        }
    }
}

impl TaskMetric for PosMetric {
    fn task(&self) -> Task {
        Task::Pos
    }

    fn single(&mut self, a: &[Item], b: &[Item]) -> Result<Scores, EvaluationError> {
        let strict = self.strict;
        let (tags_a, tags_b) = aligned_labels(a, b, self.skip_unaligned, |it| {
            normalize_label(&it.pos, strict)
        })?;
        debug!("Comparing {} POS tags", tags_a.len());
        let matrix = sentence_matrix(&tags_a, &tags_b);
        let scores = self.score(&matrix);
        self.matrix += &matrix;
        Ok(scores)
    }

    fn aggregate(&self) -> Result<Scores, EvaluationError> {
        Ok(self.score(&self.matrix))
    }
}
