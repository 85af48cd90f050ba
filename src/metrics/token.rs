use super::{EvaluationError, Prf, Scores, TaskMetric};
use crate::boundary::{boundary_array, boundary_edit_kappa, count_edits, EditCounter};
use crate::config::Task;
use crate::item::{minimum_tokens, Item};
use log::debug;
use ndarray::s;
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TokenCounter {
    correct: usize,
    n_gold: usize,
    n_pred: usize,
}

impl AddAssign for TokenCounter {
    fn add_assign(&mut self, rhs: Self) {
        self.correct += rhs.correct;
        self.n_gold += rhs.n_gold;
        self.n_pred += rhs.n_pred;
    }
}

impl TokenCounter {
    fn scores(&self) -> Scores {
        Scores::Segmentation(Prf::from_counts(self.correct, self.n_pred, self.n_gold))
    }
}

/// Segmentation against a reference: a predicted token is correct when a gold token has the same
/// start and end offsets.
#[derive(Debug, Clone, Default)]
pub struct TokenReferenceMetric {
    counter: TokenCounter,
}

impl TokenReferenceMetric {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskMetric for TokenReferenceMetric {
    fn task(&self) -> Task {
        Task::Token
    }

    fn single(&mut self, a: &[Item], b: &[Item]) -> Result<Scores, EvaluationError> {
        let gold = minimum_tokens(a);
        let pred = minimum_tokens(b);
        let mut counter = TokenCounter {
            correct: 0,
            n_gold: gold.len(),
            n_pred: pred.len(),
        };
        let (mut gold_ix, mut pred_ix) = (0, 0);
        while gold_ix < gold.len() && pred_ix < pred.len() {
            let (g, p) = (gold[gold_ix], pred[pred_ix]);
            match g.start.cmp(&p.start) {
                std::cmp::Ordering::Less => gold_ix += 1,
                std::cmp::Ordering::Greater => pred_ix += 1,
                std::cmp::Ordering::Equal => {
                    if g.end == p.end {
                        counter.correct += 1;
                    }
                    gold_ix += 1;
                    pred_ix += 1;
                }
            }
        }
        debug!(
            "{} of {} predicted tokens match the {} gold tokens",
            counter.correct, counter.n_pred, counter.n_gold
        );
        self.counter += counter;
        Ok(counter.scores())
    }

    fn aggregate(&self) -> Result<Scores, EvaluationError> {
        Ok(self.counter.scores())
    }
}

/// Segmentation agreement between two annotators, measured on the boundaries of their minimum
/// tokens. Edits are summed over the sentences and the aggregate coefficient is computed once
/// from the totals.
#[derive(Debug, Clone)]
pub struct TokenAgreementMetric {
    window: usize,
    skip_unaligned: bool,
    counts: EditCounter,
}

impl TokenAgreementMetric {
    /// * `window`: Maximum distance between the two halves of a transposition.
    /// * `skip_unaligned`: Skip the sentences whose boundary arrays have different lengths
    ///    instead of truncating the longer one.
    pub fn new(window: usize, skip_unaligned: bool) -> Self {
        Self {
            window,
            skip_unaligned,
            counts: EditCounter::default(),
        }
    }

    /// Edits summed over every sentence seen so far.
    pub fn counts(&self) -> &EditCounter {
        &self.counts
    }
}

impl TaskMetric for TokenAgreementMetric {
    fn task(&self) -> Task {
        Task::Token
    }

    fn single(&mut self, a: &[Item], b: &[Item]) -> Result<Scores, EvaluationError> {
        let boundaries_a = boundary_array(&minimum_tokens(a));
        let boundaries_b = boundary_array(&minimum_tokens(b));
        if boundaries_a.len() != boundaries_b.len() {
            debug!(
                "Boundary arrays of different lengths ({} and {})",
                boundaries_a.len(),
                boundaries_b.len()
            );
            if self.skip_unaligned {
                return Ok(Scores::Skipped);
            }
        }
        let length = boundaries_a.len().min(boundaries_b.len());
        let counts = count_edits(
            boundaries_a.slice(s![..length]),
            boundaries_b.slice(s![..length]),
            self.window,
        );
        self.counts += counts;
        let kappa = boundary_edit_kappa(&counts)?;
        Ok(Scores::BoundaryAgreement {
            boundary_edit_kappa: kappa,
        })
    }

    fn aggregate(&self) -> Result<Scores, EvaluationError> {
        let kappa = boundary_edit_kappa(&self.counts)?;
        Ok(Scores::BoundaryAgreement {
            boundary_edit_kappa: kappa,
        })
    }
}
