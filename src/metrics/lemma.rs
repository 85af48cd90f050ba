use super::labels::{aligned_labels, normalize_label, sentence_matrix};
use super::{EvaluationError, Scores, TaskMetric};
use crate::config::{Mode, Task};
use crate::confusion::ConfusionMatrix;
use crate::item::Item;
use log::debug;

/// Lemmas of the minimum tokens, scored by accuracy in reference mode and by Cohen's kappa in
/// agreement mode.
#[derive(Debug, Clone)]
pub struct LemmaMetric {
    mode: Mode,
    skip_unaligned: bool,
    strict: bool,
    matrix: ConfusionMatrix,
}

impl LemmaMetric {
    pub fn new(mode: Mode, skip_unaligned: bool, strict: bool) -> Self {
        Self {
            mode,
            skip_unaligned,
            strict,
            matrix: ConfusionMatrix::new(),
        }
    }

    fn score(&self, matrix: &ConfusionMatrix) -> Scores {
        match self.mode {
            Mode::Reference => Scores::Accuracy {
                accuracy: matrix.accuracy(),
            },
            Mode::Agreement => Scores::Agreement {
                kappa: matrix.kappa(),
            },
        }
    }
}

impl TaskMetric for LemmaMetric {
    fn task(&self) -> Task {
        Task::Lemma
    }

    fn single(&mut self, a: &[Item], b: &[Item]) -> Result<Scores, EvaluationError> {
        let strict = self.strict;
        let (lemmas_a, lemmas_b) = aligned_labels(a, b, self.skip_unaligned, |it| {
            normalize_label(&it.lemma, strict)
        })?;
        debug!("Comparing {} lemmas", lemmas_a.len());
        let matrix = sentence_matrix(&lemmas_a, &lemmas_b);
        let scores = self.score(&matrix);
        self.matrix += &matrix;
        Ok(scores)
    }

    fn aggregate(&self) -> Result<Scores, EvaluationError> {
        Ok(self.score(&self.matrix))
    }
}
