/**
This modules gives a few tools to prettyprint the scores of an evaluation.
*/
use crate::config::Task;
use crate::evaluator::EvaluationResults;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The report holds one line per score of every evaluated task. It can be used to display the
/// results as if they were collected into a dataframe.
///
/// # Example
///
/// ```rust
/// use segeval::{evaluate, EvaluatorConfigBuilder, Item, Report, SentencePair, Task};
///
/// let sentence = vec![Item::new("Hi", 0, 2), Item::new("there", 3, 8)];
/// let pairs = vec![SentencePair::new(sentence.clone(), sentence)];
/// let config = EvaluatorConfigBuilder::default().task(Task::Token).build();
/// let report = Report::from(&evaluate(&pairs, config).unwrap());
///
/// let expected_report = "Task, Score, Value
/// token, precision, 1
/// token, recall, 1
/// token, fscore, 1\n";
///
/// assert_eq!(expected_report, report.to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Report {
    lines: Vec<ReportLine>,
}

impl Report {
    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&EvaluationResults> for Report {
    fn from(value: &EvaluationResults) -> Self {
        let lines = value
            .scores
            .iter()
            .flat_map(|(task, scores)| {
                scores.rows().into_iter().map(|(score, value)| ReportLine {
                    task: *task,
                    score,
                    value,
                })
            })
            .collect();
        Self { lines }
    }
}

/// The Report struct acts as a dataframe when displayed.
impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Task, Score, Value")?;
        for line in self.lines.iter() {
            writeln!(f, "{}", line)?
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
/// A single named score of a task.
pub struct ReportLine {
    pub task: Task,
    /// Name of the score, such as `precision` or `PER.recall`
    pub score: String,
    pub value: f64,
}

/// The ReportLine struct acts as a line in a dataframe when displayed.
impl Display for ReportLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.task, self.score, self.value)
    }
}
