/*!
This library scores linguistic annotations produced by a pipeline (tokenization, part-of-speech
tags, lemmas and named entities) against a reference annotation, or measures how much two
annotators agree on them.

# MODES
* Reference: the first sentence of every pair is the gold annotation and the second one is scored
    against it with precision, recall, fscore and accuracy.
* Agreement: both sentences are treated symmetrically and a chance-corrected agreement
    coefficient is computed. Segmentation uses a boundary-edit kappa, part-of-speech tags and
    lemmas use Cohen's kappa. Named entities are not supported in this mode.

# Terminology
* An item is a span of the text with its offsets, its annotations and a flag telling if it is a
    minimum token. Items that are not minimum tokens are containers (multi-word expressions,
    entities spanning several tokens, etc.).
* A boundary array has one boolean per gap between two characters of the text, set where a token
    ends.
* The spans of two sentences are aligned by sweeping their end offsets: a group closes at the
    first end offset reached by both sides. A group is one-to-one when each side holds exactly one
    item. The labels of any other group (split or merged spans) are paired by an edit distance, a
    label without counterpart facing `MISALIGNED`.
* Entities are converted to BIO tags before being handed over to an `EntityScorer`.

# Example
```rust
use segeval::{evaluate, EvaluatorConfigBuilder, Item, Mode, SentencePair, Task};

let gold = vec![
    Item::new("New", 0, 3).with_pos("PROPN"),
    Item::new("York", 4, 8).with_pos("PROPN"),
    Item::new("New York", 0, 8).container().with_entity("LOC"),
];
let pred = vec![Item::new("New York", 0, 8).with_pos("PROPN").with_entity("ORG")];
let pairs = vec![SentencePair::new(gold, pred)];
let config = EvaluatorConfigBuilder::default()
    .tasks([Task::Token, Task::Ner])
    .mode(Mode::Reference)
    .build();
let results = evaluate(&pairs, config).unwrap();

assert_eq!(results.get(Task::Token, "precision"), Some(0.0));
assert_eq!(results.get(Task::Ner, "overall.fscore"), Some(0.0));
```
*/

mod align;
mod bio;
mod boundary;
mod config;
mod confusion;
mod dataset;
mod entity;
mod evaluator;
mod item;
mod metrics;
mod reporter;

// The public api starts here
pub use item::{EntityTag, Item, Sentence, SentencePair};

pub use dataset::{load_dataset, load_dataset_from_str, DatasetError};

pub use align::{align_items, edit_ops, is_contiguous, AlignmentGroup, RangeMismatchError};

pub use boundary::{
    boundary_array, boundary_edit_kappa, count_edits, DegenerateAgreementError, EditCounter,
};

pub use confusion::ConfusionMatrix;

pub use bio::{items_to_bio, tag_root, OUTSIDE};

pub use entity::{
    get_entities, Entity, EntityParsingError, EntityScorer, EntityScores, ExactMatchScorer,
    PrecisionRecall,
};

pub use metrics::{
    EntityReport, EvaluationError, LemmaMetric, NerMetric, PosMetric, Prf, Scores, TaskMetric,
    TokenAgreementMetric, TokenReferenceMetric, UnsupportedModeError, MISALIGNED,
};

pub use config::{
    Average, AverageParsingError, EvaluatorConfig, EvaluatorConfigBuilder, Mode, ModeParsingError,
    Task, TaskParsingError,
};

pub use evaluator::{evaluate, EvaluationResults, Evaluator, SentenceScores};

pub use reporter::{Report, ReportLine};
