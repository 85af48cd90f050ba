//! Scores a dataset of sentence pairs from the command line.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use segeval::{
    load_dataset, Average, Evaluator, EvaluatorConfig, EvaluatorConfigBuilder, Mode, Report, Task,
};
use std::path::PathBuf;

/// Scores token segmentation, POS tags, lemmas and named entities against a reference, or
/// measures the agreement of two annotators.
#[derive(Debug, Parser)]
#[command(name = "segeval", version, about)]
struct Args {
    /// Dataset of sentence pairs: a JSON array, or JSON Lines when the extension is `jsonl`
    #[arg(value_name = "DATASET")]
    dataset: PathBuf,

    /// Tasks to evaluate
    #[arg(short, long, value_delimiter = ',', default_value = "token,pos,lemma,ner")]
    tasks: Vec<Task>,

    /// Reference or agreement
    #[arg(short, long, default_value = "reference")]
    mode: Mode,

    /// Averaging of the POS precision, recall and fscore
    #[arg(short, long, default_value = "micro")]
    average: Average,

    /// Score split and merged spans instead of leaving them out
    #[arg(long, conflicts_with = "skip_unaligned")]
    keep_unaligned: bool,

    /// Leave split and merged spans out of every task, NER included
    #[arg(long)]
    skip_unaligned: bool,

    /// Maximum distance between the two halves of a boundary transposition
    #[arg(short, long, default_value_t = 1)]
    window: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Include the scores of every sentence pair (JSON output only)
    #[arg(long)]
    sentences: bool,

    /// Compare POS tags and lemmas exactly, without lowercasing, trimming or stripping accents
    #[arg(long)]
    strict: bool,

    /// Suppress the progress bar and the logs
    #[arg(short, long)]
    quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// One line per score
    Text,
    /// Scores as a JSON document
    Json,
}

impl Args {
    fn init_logging(&self) {
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        if !self.quiet {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
                .init();
        }
    }

    fn config(&self) -> EvaluatorConfig {
        let mut builder = EvaluatorConfigBuilder::default()
            .tasks(self.tasks.iter().copied())
            .mode(self.mode)
            .average(self.average)
            .transposition_window(self.window)
            .keep_sentence_scores(self.sentences)
            .strict(self.strict)
            .verbose(!self.quiet);
        if self.keep_unaligned {
            builder = builder.skip_unaligned(false);
        } else if self.skip_unaligned {
            builder = builder.skip_unaligned(true);
        }
        builder.build()
    }
}

fn progress_bar(config: &EvaluatorConfig, len: usize) -> Result<ProgressBar> {
    if !config.verbose() {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} sentences {msg}")?
            .progress_chars("##-"),
    );
    Ok(bar)
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.init_logging();
    log::debug!("Arguments: {:?}", args);

    let pairs = load_dataset(&args.dataset)
        .with_context(|| format!("Failed to load {}", args.dataset.display()))?;
    let config = args.config();
    log::info!("Configuration: {}", config);

    let bar = progress_bar(&config, pairs.len())?;
    let results = Evaluator::new(config)
        .evaluate_with(&pairs, |_, _| bar.inc(1))
        .context("Evaluation failed")?;
    bar.finish_and_clear();

    match args.format {
        OutputFormat::Text => print!("{}", Report::from(&results)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["segeval", "data.json"]).unwrap();
        let config = args.config();
        assert_eq!(config.tasks().len(), 4);
        assert_eq!(config.mode(), Mode::Reference);
        assert!(config.skip_unaligned(Task::Pos));
        assert!(!config.skip_unaligned(Task::Ner));
        assert!(!config.strict());
        assert!(config.verbose());
    }

    #[test]
    fn test_quiet_hides_the_progress_bar() {
        let args = Args::try_parse_from(["segeval", "data.json", "--quiet", "--strict"]).unwrap();
        let config = args.config();
        assert!(!config.verbose());
        assert!(config.strict());
        assert!(progress_bar(&config, 10).unwrap().is_hidden());
    }

    #[test]
    fn test_parse_agreement_options() {
        let args = Args::try_parse_from([
            "segeval",
            "data.jsonl",
            "--tasks",
            "token,pos",
            "--mode",
            "agreement",
            "--window",
            "3",
            "--keep-unaligned",
        ])
        .unwrap();
        let config = args.config();
        assert_eq!(
            config.tasks().iter().copied().collect::<Vec<_>>(),
            vec![Task::Token, Task::Pos]
        );
        assert_eq!(config.mode(), Mode::Agreement);
        assert_eq!(config.transposition_window(), 3);
        assert!(!config.skip_unaligned(Task::Token));
    }

    #[test]
    fn test_unaligned_flags_conflict() {
        let res = Args::try_parse_from([
            "segeval",
            "data.json",
            "--keep-unaligned",
            "--skip-unaligned",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_unknown_task_is_rejected() {
        let res = Args::try_parse_from(["segeval", "data.json", "--tasks", "chunks"]);
        assert!(res.is_err());
    }
}
