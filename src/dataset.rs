/**
This module loads datasets of sentence pairs. A dataset is either a JSON array of `{"gold": [...],
"pred": [...]}` records or a JSON Lines file (`.jsonl`) with one record per line.
*/
use crate::item::SentencePair;
use serde_jsonlines::json_lines;
use std::error::Error;
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug)]
/// Enum error encompassing the failures that can happen when loading a dataset.
pub enum DatasetError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The content is not a valid dataset.
    Json(serde_json::Error),
    /// A span does not satisfy `start < end`.
    InvalidSpan {
        pair: usize,
        text: String,
        start: usize,
        end: usize,
    },
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Could not read the dataset: {}", err),
            Self::Json(err) => write!(f, "Could not parse the dataset: {}", err),
            Self::InvalidSpan {
                pair,
                text,
                start,
                end,
            } => write!(
                f,
                "Sentence pair {} contains the span `{}` with start offset {} not smaller than its end offset {}",
                pair, text, start, end
            ),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::InvalidSpan { .. } => None,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

fn validate(pairs: Vec<SentencePair>) -> Result<Vec<SentencePair>, DatasetError> {
    for (index, pair) in pairs.iter().enumerate() {
        if let Some(item) = pair
            .gold
            .iter()
            .chain(pair.pred.iter())
            .find(|it| it.start >= it.end)
        {
            return Err(DatasetError::InvalidSpan {
                pair: index,
                text: item.text.clone(),
                start: item.start,
                end: item.end,
            });
        }
    }
    Ok(pairs)
}

/// Loads a dataset from a file. Files with the `jsonl` extension are read line by line, any other
/// file is read as a single JSON array.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<SentencePair>, DatasetError> {
    let path = path.as_ref();
    let is_json_lines = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));
    let pairs: Vec<SentencePair> = if is_json_lines {
        json_lines::<SentencePair, _>(path)?.collect::<Result<Vec<_>, _>>()?
    } else {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)?
    };
    validate(pairs)
}

/// Parses a dataset held in memory as a JSON array.
pub fn load_dataset_from_str(content: &str) -> Result<Vec<SentencePair>, DatasetError> {
    let pairs: Vec<SentencePair> = serde_json::from_str(content)?;
    validate(pairs)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    const PAIR: &str = r#"{"gold": [{"item": "Hi", "startOffSet": 0, "endOffSet": 2, "pos": "INTJ", "lemma": "hi", "isMinimumToken": true, "isStopWord": false, "ner": ""}], "pred": [{"item": "Hi", "startOffset": 0, "endOffset": 2, "isMinimumToken": true, "ner": ""}]}"#;

    #[test]
    fn test_load_from_str() {
        let pairs = load_dataset_from_str(&format!("[{}, {}]", PAIR, PAIR)).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].gold[0].pos, "INTJ");
        assert_eq!(pairs[0].pred[0].pos, "");
    }

    #[test]
    fn test_invalid_span() {
        let content = PAIR.replace(r#""endOffSet": 2"#, r#""endOffSet": 0"#);
        let res = load_dataset_from_str(&format!("[{}]", content));
        assert!(matches!(
            res,
            Err(DatasetError::InvalidSpan {
                pair: 0,
                start: 0,
                end: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_json() {
        let res = load_dataset_from_str(r#"[{"gold": []}]"#);
        assert!(matches!(res, Err(DatasetError::Json(_))));
    }

    #[test]
    fn test_load_json_lines_file() {
        let path = std::env::temp_dir().join(format!("segeval-{}.jsonl", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "{}", PAIR).unwrap();
            writeln!(file, "{}", PAIR).unwrap();
        }
        let pairs = load_dataset(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let res = load_dataset("does/not/exist.json");
        assert!(matches!(res, Err(DatasetError::Io(_))));
    }
}
