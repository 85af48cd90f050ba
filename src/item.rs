/**
This module contains the span model shared by every metric. The dataset spells its keys in
camel case (`startOffSet`, `isMinimumToken`, ...) and sometimes uses an alternative spelling for
the offsets; both are normalized here so the algorithms only ever see one representation.
*/
use either::Either;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;

/// One entity annotation carried by an `Item`. Only the `ner` field is used for scoring; any other
/// key found in the record is kept in `attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTag {
    pub ner: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl EntityTag {
    pub fn new<S: Into<String>>(ner: S) -> Self {
        Self {
            ner: ner.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// An annotated span of text. The span covers the characters `[start, end)` of its sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "item")]
    pub text: String,
    #[serde(rename = "startOffSet", alias = "startOffset")]
    pub start: usize,
    #[serde(rename = "endOffSet", alias = "endOffset")]
    pub end: usize,
    #[serde(default)]
    pub pos: String,
    #[serde(default)]
    pub lemma: String,
    #[serde(rename = "isMinimumToken")]
    pub is_minimum_token: bool,
    #[serde(rename = "isStopWord", default)]
    pub is_stop_word: bool,
    /// Ordered entity tags. An empty vector means the span is not an entity. The first named
    /// tag is the one used when building BIO sequences.
    #[serde(default, with = "ner_field")]
    pub ner: Vec<EntityTag>,
}

impl Item {
    /// Builds a minimum token without any annotation.
    pub fn new<S: Into<String>>(text: S, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            pos: String::new(),
            lemma: String::new(),
            is_minimum_token: true,
            is_stop_word: false,
            ner: Vec::new(),
        }
    }

    pub fn with_pos<S: Into<String>>(mut self, pos: S) -> Self {
        self.pos = pos.into();
        self
    }

    pub fn with_lemma<S: Into<String>>(mut self, lemma: S) -> Self {
        self.lemma = lemma.into();
        self
    }

    pub fn with_entity<S: Into<String>>(mut self, ner: S) -> Self {
        self.ner.push(EntityTag::new(ner));
        self
    }

    /// Marks the item as a container span (e.g. a multi-word entity) rather than a minimum token.
    pub fn container(mut self) -> Self {
        self.is_minimum_token = false;
        self
    }

    /// The authoritative entity type of this span, if any. Tags without a name are ignored.
    pub fn entity(&self) -> Option<&str> {
        self.ner
            .iter()
            .map(|tag| tag.ner.as_str())
            .find(|name| !name.is_empty())
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort key putting a span before every span it contains.
    pub(crate) fn sort_key(&self) -> (usize, std::cmp::Reverse<usize>) {
        (self.start, std::cmp::Reverse(self.end))
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.text, self.start, self.end)
    }
}

/// A sentence is the ordered list of spans annotated over one text unit.
pub type Sentence = Vec<Item>;

/// Two annotations of the same sentence. In reference mode `gold` is authoritative; in agreement
/// mode both sides are independent annotators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    pub gold: Sentence,
    pub pred: Sentence,
}

impl SentencePair {
    pub fn new(gold: Sentence, pred: Sentence) -> Self {
        Self { gold, pred }
    }
}

/// Keeps only the minimum tokens of a sentence, sorted by `(start, -end)`.
pub(crate) fn minimum_tokens(items: &[Item]) -> Vec<&Item> {
    let mut tokens: Vec<&Item> = items.iter().filter(|it| it.is_minimum_token).collect();
    tokens.sort_by_key(|it| it.sort_key());
    tokens
}

/// The `ner` key is either `""` or a list of tag records. A bare non-empty string is accepted as
/// a single tag. Records with an empty name are dropped.
mod ner_field {
    use super::*;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<EntityTag>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Either<String, Vec<EntityTag>> =
            either::serde_untagged::deserialize(deserializer)?;
        Ok(match raw {
            Either::Left(name) if name.is_empty() => Vec::new(),
            Either::Left(name) => vec![EntityTag::new(name)],
            Either::Right(tags) => tags.into_iter().filter(|tag| !tag.ner.is_empty()).collect(),
        })
    }

    pub(super) fn serialize<S>(tags: &[EntityTag], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if tags.is_empty() {
            serializer.serialize_str("")
        } else {
            tags.serialize(serializer)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_deserialize_dataset_keys() {
        let raw = r#"{
            "item": "Paris",
            "startOffSet": 0,
            "endOffSet": 5,
            "pos": "PROPN",
            "lemma": "paris",
            "isMinimumToken": true,
            "ner": [{"ner": "LOC", "score": 0.9}]
        }"#;
        let item: Item = serde_json::from_str(raw).unwrap();
        assert_eq!(item.text, "Paris");
        assert_eq!((item.start, item.end), (0, 5));
        assert!(item.is_minimum_token);
        assert!(!item.is_stop_word);
        assert_eq!(item.entity(), Some("LOC"));
        assert_eq!(item.ner[0].attributes.get("score"), Some(&Value::from(0.9)));
    }

    #[rstest]
    #[case(r#""""#, None)]
    #[case(r#""PER""#, Some("PER"))]
    #[case(r#"[{"ner": "ORG"}, {"ner": "LOC"}]"#, Some("ORG"))]
    #[case(r#"[]"#, None)]
    #[case(r#"[{"ner": ""}]"#, None)]
    #[case(r#"[{"ner": ""}, {"ner": "LOC"}]"#, Some("LOC"))]
    fn test_deserialize_ner_shapes(#[case] ner: &str, #[case] expected: Option<&str>) {
        let raw = format!(
            r#"{{"item": "x", "startOffset": 2, "endOffset": 3, "isMinimumToken": false, "isStopWord": true, "ner": {}}}"#,
            ner
        );
        let item: Item = serde_json::from_str(&raw).unwrap();
        assert_eq!((item.start, item.end), (2, 3));
        assert!(item.is_stop_word);
        assert_eq!(item.entity(), expected);
    }

    #[test]
    fn test_nameless_tags_are_not_entities() {
        let raw = r#"{"item": "x", "startOffset": 0, "endOffset": 1, "isMinimumToken": false, "ner": [{"ner": ""}]}"#;
        let item: Item = serde_json::from_str(raw).unwrap();
        assert!(item.ner.is_empty());
        assert_eq!(Item::new("x", 0, 1).with_entity("").entity(), None);
    }

    #[test]
    fn test_serialize_empty_ner_as_empty_string() {
        let item = Item::new("a", 0, 1);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["ner"], Value::from(""));
        assert_eq!(value["startOffSet"], Value::from(0));
    }

    #[test]
    fn test_minimum_tokens_are_sorted_and_filtered() {
        let items = vec![
            Item::new("b", 2, 4),
            Item::new("ab", 0, 4).container(),
            Item::new("a", 0, 2),
        ];
        let tokens: Vec<_> = minimum_tokens(&items)
            .into_iter()
            .map(|it| it.text.as_str())
            .collect();
        assert_eq!(tokens, vec!["a", "b"]);
    }
}
