/*
 * This modules contains the configuration of an evaluation. Most importantly, it contains the
 * `EvaluatorConfig` struct, which implements the default trait, and its builder. The enums selecting
 * the tasks, the mode and the averaging strategy can be parsed from strings.
*/
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// Annotation layer scored by the evaluator.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Sequence, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Token,
    Pos,
    Lemma,
    Ner,
}

impl Task {
    /// Whether split or merged spans are left out of the scores when no explicit choice is made.
    pub fn default_skip_unaligned(&self) -> bool {
        !matches!(self, Task::Ner)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Task::Token => "token",
            Task::Pos => "pos",
            Task::Lemma => "lemma",
            Task::Ner => "ner",
        }
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Task {
    type Err = TaskParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "token" | "tokens" => Ok(Task::Token),
            "pos" => Ok(Task::Pos),
            "lemma" | "lemmas" => Ok(Task::Lemma),
            "ner" => Ok(Task::Ner),
            _ => Err(TaskParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TaskParsingError(String);

impl Display for TaskParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into a Task. Expected one of token, pos, lemma, ner",
            self.0
        )
    }
}

impl Error for TaskParsingError {}

/// How the two sides of a sentence pair relate to each other.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The first side is the gold annotation, the second one a prediction.
    #[default]
    Reference,
    /// Both sides are independent annotations of equal standing.
    Agreement,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Reference => write!(f, "reference"),
            Mode::Agreement => write!(f, "agreement"),
        }
    }
}

impl FromStr for Mode {
    type Err = ModeParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reference" | "ref" => Ok(Mode::Reference),
            "agreement" => Ok(Mode::Agreement),
            _ => Err(ModeParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ModeParsingError(String);

impl Display for ModeParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into a Mode. Expected reference or agreement",
            self.0
        )
    }
}

impl Error for ModeParsingError {}

/// Enumeration of the averaging strategies of the POS precision, recall and fscore. &str can be
/// parsed to create an `Average`.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Average {
    /// Global counts. Precision, recall and fscore all equal the accuracy.
    #[default]
    Micro,
    /// Unweighted mean over the labels.
    Macro,
    /// Mean over the labels weighted by their gold frequency.
    Weighted,
}

impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AverageParsingError(String);

impl Display for AverageParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into an Average",
            self.0
        )
    }
}

impl Error for AverageParsingError {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Config struct used to describe an evaluation. It implements the default trait: every task is
/// evaluated in reference mode with micro averaging.
pub struct EvaluatorConfig {
    /// Tasks to evaluate.
    tasks: BTreeSet<Task>,
    /// Relation between the two sides of a sentence pair.
    mode: Mode,
    /// Averaging of the POS precision, recall and fscore. Only used in reference mode.
    average: Average,
    /// When set, decides for every task whether split or merged spans (token, POS, lemma) and
    /// sequences of different lengths (token agreement, NER) are skipped. When unset, each task
    /// uses `Task::default_skip_unaligned`.
    skip_unaligned: Option<bool>,
    /// Maximum distance between the two halves of a boundary transposition.
    transposition_window: usize,
    /// Keep the scores of every sentence in the results.
    keep_sentence_scores: bool,
    /// Compare POS tags and lemmas as they are, instead of lowercased, trimmed and without accents.
    strict: bool,
    /// Display progress. The library itself never prints anything.
    verbose: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            tasks: all::<Task>().collect(),
            mode: Mode::default(),
            average: Average::default(),
            skip_unaligned: None,
            transposition_window: 1,
            keep_sentence_scores: false,
            strict: false,
            verbose: false,
        }
    }
}

impl EvaluatorConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn tasks(&self) -> &BTreeSet<Task> {
        &self.tasks
    }
    pub fn mode(&self) -> Mode {
        self.mode
    }
    pub fn average(&self) -> Average {
        self.average
    }
    /// Whether `task` skips what it cannot align.
    pub fn skip_unaligned(&self, task: Task) -> bool {
        self.skip_unaligned
            .unwrap_or_else(|| task.default_skip_unaligned())
    }
    pub fn transposition_window(&self) -> usize {
        self.transposition_window
    }
    pub fn keep_sentence_scores(&self) -> bool {
        self.keep_sentence_scores
    }
    pub fn strict(&self) -> bool {
        self.strict
    }
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

impl Display for EvaluatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tasks: Vec<&str> = self.tasks.iter().map(Task::as_str).collect();
        let skip = match self.skip_unaligned {
            Some(skip) => skip.to_string(),
            None => String::from("task default"),
        };
        write!(f, "Tasks: {}\n Mode: {}\n Average: {}\n Skipping unaligned spans: {}\n Transposition window: {}\n Keeping sentence scores: {}\n Strict: {}\n Verbose: {}", tasks.join(", "), self.mode, self.average, skip, self.transposition_window, self.keep_sentence_scores, self.strict, self.verbose)
    }
}

impl From<EvaluatorConfigBuilder> for EvaluatorConfig {
    fn from(value: EvaluatorConfigBuilder) -> Self {
        Self {
            tasks: value.tasks.unwrap_or_else(|| all::<Task>().collect()),
            mode: value.mode,
            average: value.average,
            skip_unaligned: value.skip_unaligned,
            transposition_window: value.transposition_window,
            keep_sentence_scores: value.keep_sentence_scores,
            strict: value.strict,
            verbose: value.verbose,
        }
    }
}

/// This builder can be used to build and customize an `EvaluatorConfig` structure.
#[derive(Clone, Debug)]
pub struct EvaluatorConfigBuilder {
    tasks: Option<BTreeSet<Task>>,
    mode: Mode,
    average: Average,
    skip_unaligned: Option<bool>,
    transposition_window: usize,
    keep_sentence_scores: bool,
    strict: bool,
    verbose: bool,
}

impl Default for EvaluatorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorConfigBuilder {
    /// Replaces the evaluated tasks.
    pub fn tasks<I: IntoIterator<Item = Task>>(mut self, tasks: I) -> Self {
        self.tasks = Some(tasks.into_iter().collect());
        self
    }
    /// Adds a task to the ones set so far. The first call starts from an empty set.
    pub fn task(mut self, task: Task) -> Self {
        self.tasks.get_or_insert_with(BTreeSet::new).insert(task);
        self
    }
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
    pub fn average(mut self, average: Average) -> Self {
        self.average = average;
        self
    }
    pub fn skip_unaligned(mut self, skip_unaligned: bool) -> Self {
        self.skip_unaligned = Some(skip_unaligned);
        self
    }
    pub fn transposition_window(mut self, window: usize) -> Self {
        self.transposition_window = window;
        self
    }
    pub fn keep_sentence_scores(mut self, keep: bool) -> Self {
        self.keep_sentence_scores = keep;
        self
    }
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
    pub fn new() -> Self {
        Self {
            tasks: None,
            mode: Mode::default(),
            average: Average::default(),
            skip_unaligned: None,
            transposition_window: 1,
            keep_sentence_scores: false,
            strict: false,
            verbose: false,
        }
    }
    pub fn build(self) -> EvaluatorConfig {
        EvaluatorConfig::from(self)
    }
}
