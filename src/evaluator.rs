/**
This module runs the selected task metrics over a dataset of sentence pairs. Metrics are built
fresh for every evaluation, fed every pair in dataset order and finally aggregated.
*/
use crate::config::{EvaluatorConfig, Mode, Task};
use crate::entity::{EntityScorer, ExactMatchScorer};
use crate::item::SentencePair;
use crate::metrics::{
    EvaluationError, LemmaMetric, NerMetric, PosMetric, Scores, TaskMetric, TokenAgreementMetric,
    TokenReferenceMetric,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Scores of one sentence pair, per task. `None` marks a sentence whose agreement coefficient is
/// undefined; its counts still contribute to the aggregate.
pub type SentenceScores = BTreeMap<Task, Option<Scores>>;

/// Output of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResults {
    /// Scores over the whole dataset, per task.
    pub scores: BTreeMap<Task, Scores>,
    /// Scores of every sentence pair, per task and in dataset order. Only kept on request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentences: Option<BTreeMap<Task, Vec<Option<Scores>>>>,
}

impl EvaluationResults {
    /// Value of a named score of a task, such as `(Task::Token, "precision")`.
    pub fn get(&self, task: Task, name: &str) -> Option<f64> {
        self.scores.get(&task).and_then(|scores| scores.get(name))
    }
}

/// Main entrypoint of the library. The evaluator holds the configuration and the entity scorer;
/// it can evaluate any number of datasets.
///
/// #Example
/// ```rust
/// use segeval::{Evaluator, EvaluatorConfigBuilder, Item, SentencePair, Task};
///
/// let sentence = vec![
///     Item::new("Hello", 0, 5).with_pos("INTJ").with_lemma("hello"),
///     Item::new("Ada", 6, 9).with_pos("PROPN").with_lemma("Ada").with_entity("PER"),
/// ];
/// let pairs = vec![SentencePair::new(sentence.clone(), sentence)];
/// let config = EvaluatorConfigBuilder::default().build();
/// let results = Evaluator::new(config).evaluate(&pairs).unwrap();
///
/// assert_eq!(results.get(Task::Token, "fscore"), Some(1.0));
/// assert_eq!(results.get(Task::Lemma, "accuracy"), Some(1.0));
/// assert_eq!(results.get(Task::Ner, "overall.recall"), Some(1.0));
/// ```
pub struct Evaluator {
    config: EvaluatorConfig,
    entity_scorer: Box<dyn EntityScorer>,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self {
            config,
            entity_scorer: Box::new(ExactMatchScorer),
        }
    }

    /// Replaces the scorer used by the NER task.
    pub fn with_entity_scorer<S: EntityScorer + 'static>(mut self, scorer: S) -> Self {
        self.entity_scorer = Box::new(scorer);
        self
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    fn build_metric(&self, task: Task) -> Result<Box<dyn TaskMetric + '_>, EvaluationError> {
        let config = &self.config;
        let skip_unaligned = config.skip_unaligned(task);
        let metric: Box<dyn TaskMetric + '_> = match (task, config.mode()) {
            (Task::Token, Mode::Reference) => Box::new(TokenReferenceMetric::new()),
            (Task::Token, Mode::Agreement) => Box::new(TokenAgreementMetric::new(
                config.transposition_window(),
                skip_unaligned,
            )),
            (Task::Pos, mode) => Box::new(PosMetric::new(
                mode,
                config.average(),
                skip_unaligned,
                config.strict(),
            )),
            (Task::Lemma, mode) => Box::new(LemmaMetric::new(mode, skip_unaligned, config.strict())),
            (Task::Ner, mode) => Box::new(NerMetric::new(
                mode,
                skip_unaligned,
                self.entity_scorer.as_ref(),
            )?),
        };
        Ok(metric)
    }

    /// Evaluates every sentence pair and returns the scores of each selected task.
    pub fn evaluate(&self, pairs: &[SentencePair]) -> Result<EvaluationResults, EvaluationError> {
        self.evaluate_with(pairs, |_, _| {})
    }

    /// Same as `evaluate`, calling `callback` with the index and the scores of every sentence pair
    /// as soon as it has been scored.
    pub fn evaluate_with<F>(
        &self,
        pairs: &[SentencePair],
        mut callback: F,
    ) -> Result<EvaluationResults, EvaluationError>
    where
        F: FnMut(usize, &SentenceScores),
    {
        info!(
            "Evaluating {} sentence pairs in {} mode",
            pairs.len(),
            self.config.mode()
        );
        let mut metrics = self
            .config
            .tasks()
            .iter()
            .map(|task| self.build_metric(*task))
            .collect::<Result<Vec<_>, _>>()?;
        let keep = self.config.keep_sentence_scores();
        let mut sentences: BTreeMap<Task, Vec<Option<Scores>>> = BTreeMap::new();

        for (index, pair) in pairs.iter().enumerate() {
            let mut sentence_scores = SentenceScores::new();
            for metric in metrics.iter_mut() {
                let task = metric.task();
                let scores = match metric.single(&pair.gold, &pair.pred) {
                    Ok(scores) => Some(scores),
                    Err(EvaluationError::DegenerateAgreement(err)) => {
                        warn!("Sentence {}, task {}: {}", index, task, err);
                        None
                    }
                    Err(err) => return Err(err),
                };
                if matches!(scores, Some(Scores::Skipped)) {
                    debug!("Sentence {}, task {}: skipped", index, task);
                }
                sentence_scores.insert(task, scores);
            }
            callback(index, &sentence_scores);
            if keep {
                for (task, scores) in sentence_scores {
                    sentences.entry(task).or_default().push(scores);
                }
            }
        }

        let mut scores = BTreeMap::new();
        for metric in metrics.iter() {
            scores.insert(metric.task(), metric.aggregate()?);
        }
        info!("Evaluated {} tasks", scores.len());
        Ok(EvaluationResults {
            scores,
            sentences: keep.then_some(sentences),
        })
    }
}

/// Evaluates `pairs` with the default entity scorer.
pub fn evaluate(
    pairs: &[SentencePair],
    config: EvaluatorConfig,
) -> Result<EvaluationResults, EvaluationError> {
    Evaluator::new(config).evaluate(pairs)
}
