use super::{EntityReport, EvaluationError, Scores, TaskMetric, UnsupportedModeError};
use crate::bio::{items_to_bio, tag_root, OUTSIDE};
use crate::config::{Mode, Task};
use crate::entity::EntityScorer;
use crate::item::Item;
use log::debug;
use std::collections::BTreeSet;

/// Named entities, scored at the entity level against a reference. Both sentences are converted
/// to BIO tags and handed over to an `EntityScorer`. Only the reference mode is supported.
pub struct NerMetric<'s> {
    scorer: &'s dyn EntityScorer,
    skip_unaligned: bool,
    gold: Vec<Vec<String>>,
    pred: Vec<Vec<String>>,
    labels: BTreeSet<String>,
}

impl<'s> NerMetric<'s> {
    /// * `mode`: Must be `Mode::Reference`.
    /// * `skip_unaligned`: Skip the sentences whose BIO sequences have different lengths instead of
    ///    truncating the longer one.
    /// * `scorer`: Entity-level scorer.
    pub fn new(
        mode: Mode,
        skip_unaligned: bool,
        scorer: &'s dyn EntityScorer,
    ) -> Result<Self, UnsupportedModeError> {
        if mode != Mode::Reference {
            return Err(UnsupportedModeError {
                task: Task::Ner,
                mode,
            });
        }
        Ok(Self {
            scorer,
            skip_unaligned,
            gold: Vec::new(),
            pred: Vec::new(),
            labels: BTreeSet::from([String::from(OUTSIDE)]),
        })
    }

    /// Labels seen so far, `O` included.
    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }
}

impl<'s> TaskMetric for NerMetric<'s> {
    fn task(&self) -> Task {
        Task::Ner
    }

    fn single(&mut self, a: &[Item], b: &[Item]) -> Result<Scores, EvaluationError> {
        let mut gold = items_to_bio(a);
        let mut pred = items_to_bio(b);
        if gold.len() != pred.len() {
            debug!(
                "BIO sequences of different lengths ({} and {})",
                gold.len(),
                pred.len()
            );
            if self.skip_unaligned {
                return Ok(Scores::Skipped);
            }
            let length = gold.len().min(pred.len());
            gold.truncate(length);
            pred.truncate(length);
        }
        let sentence_labels: BTreeSet<String> = gold
            .iter()
            .chain(pred.iter())
            .map(|tag| tag_root(tag).to_string())
            .collect();
        let gold = vec![gold];
        let pred = vec![pred];
        let scores = self.scorer.score(&gold, &pred, &sentence_labels)?;

        self.labels.extend(sentence_labels);
        self.gold.extend(gold);
        self.pred.extend(pred);
        Ok(Scores::Entities(EntityReport::from(scores)))
    }

    fn aggregate(&self) -> Result<Scores, EvaluationError> {
        let scores = self.scorer.score(&self.gold, &self.pred, &self.labels)?;
        Ok(Scores::Entities(EntityReport::from(scores)))
    }
}
