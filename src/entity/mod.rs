/**
This module scores entities found in BIO sequences. The scoring itself sits behind the
`EntityScorer` trait; `ExactMatchScorer` is the scorer used when no other one is supplied. It
extracts the chunks of every sequence leniently (any `I` tag can open a chunk) and counts a
predicted entity as correct only if its sentence, boundaries and type match a gold entity.
*/
use crate::bio::OUTSIDE;
use crate::confusion::safe_divide;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// An entity represent a named object found in a sequence of tags. It contains the index of the
/// sequence it was found in, a start and an end (inclusive indices of its first and last tags) and
/// a tag, which is the associated entity type (such as `LOC`, `PER`, etc.).
#[derive(Debug, Hash, Clone, PartialEq, Eq)]
pub struct Entity<'a> {
    pub(crate) sent_id: usize,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) tag: Cow<'a, str>,
}

impl<'a> Entity<'a> {
    pub(crate) fn new(sent_id: usize, start: usize, end: usize, tag: Cow<'a, str>) -> Self {
        Entity {
            sent_id,
            start,
            end,
            tag,
        }
    }

    /// Returns `(sent_id, start, end, tag)`.
    pub fn as_tuple(&self) -> (usize, usize, usize, &str) {
        (self.sent_id, self.start, self.end, self.tag.as_ref())
    }
}

impl<'a> Display for Entity<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.sent_id, self.tag, self.start, self.end
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A tag could not be split into a known prefix and an entity type.
pub struct EntityParsingError(pub String);

impl Display for EntityParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Could not parse the tag `{}`. Expected `O` or a prefix among `B`, `I`, `E`, `S` followed by `-` and a type",
            self.0
        )
    }
}

impl Error for EntityParsingError {}

#[derive(Debug, PartialEq, Hash, Clone, Copy, Eq)]
/// Position of a tag in its chunk.
enum Prefix {
    I,
    O,
    B,
    E,
    S,
}

impl FromStr for Prefix {
    type Err = EntityParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(Self::I),
            "O" => Ok(Self::O),
            "B" => Ok(Self::B),
            "E" => Ok(Self::E),
            "S" => Ok(Self::S),
            _ => Err(EntityParsingError(String::from(s))),
        }
    }
}

/// Splits a tag into its prefix and its type. `O` has an empty type.
fn split_tag(tag: &str) -> Result<(Prefix, &str), EntityParsingError> {
    let (raw_prefix, kind) = tag.split_once('-').unwrap_or((tag, ""));
    let prefix = Prefix::from_str(raw_prefix).map_err(|_| EntityParsingError(tag.to_string()))?;
    if kind.is_empty() != (prefix == Prefix::O) {
        return Err(EntityParsingError(tag.to_string()));
    }
    Ok((prefix, kind))
}

/// This struct iterates over a *single* sequence of tags and returns the chunks found in it. An
/// `O` tag is virtually appended at the end of the sequence to close the last chunk.
struct ChunkIter<'a, S: AsRef<str>> {
    tags: &'a [S],
    sent_id: usize,
    /// The prefix of the previous tag (e.g. 'I')
    prev_prefix: Prefix,
    /// The type of the previous tag (e.g. `"PER"`)
    prev_type: &'a str,
    begin_offset: usize,
    index: usize,
}

impl<'a, S: AsRef<str>> ChunkIter<'a, S> {
    fn new(tags: &'a [S], sent_id: usize) -> Self {
        ChunkIter {
            tags,
            sent_id,
            prev_prefix: Prefix::O,
            prev_type: "",
            begin_offset: 0,
            index: 0,
        }
    }

    /// Checks if a chunk ended between the previous and the current tag.
    fn end_of_chunk(&self, current_prefix: Prefix, current_type: &str) -> bool {
        match (self.prev_prefix, current_prefix) {
            (Prefix::E, _) => true,
            (Prefix::S, _) => true,
            (Prefix::B, Prefix::B) => true,
            (Prefix::B, Prefix::S) => true,
            (Prefix::B, Prefix::O) => true,
            (Prefix::I, Prefix::B) => true,
            (Prefix::I, Prefix::S) => true,
            (Prefix::I, Prefix::O) => true,
            (prev_prefix, _) => prev_prefix != Prefix::O && self.prev_type != current_type,
        }
    }

    /// Checks if a chunk started between the previous and the current tag.
    fn start_of_chunk(&self, current_prefix: Prefix, current_type: &str) -> bool {
        match (self.prev_prefix, current_prefix) {
            (_, Prefix::B) => true,
            (_, Prefix::S) => true,
            (Prefix::E, Prefix::E) => true,
            (Prefix::E, Prefix::I) => true,
            (Prefix::S, Prefix::E) => true,
            (Prefix::S, Prefix::I) => true,
            (Prefix::O, Prefix::E) => true,
            (Prefix::O, Prefix::I) => true,
            (_, current_prefix) => current_prefix != Prefix::O && self.prev_type != current_type,
        }
    }
}

impl<'a, S: AsRef<str>> Iterator for ChunkIter<'a, S> {
    type Item = Result<Entity<'a>, EntityParsingError>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.index > self.tags.len() {
                return None;
            }
            let raw = self.tags.get(self.index).map_or(OUTSIDE, |t| t.as_ref());
            let (prefix, kind) = match split_tag(raw) {
                Ok(v) => v,
                Err(e) => {
                    // An invalid tag ends the iteration.
                    self.index = self.tags.len() + 1;
                    return Some(Err(e));
                }
            };
            let ended = if self.end_of_chunk(prefix, kind) {
                Some(Entity::new(
                    self.sent_id,
                    self.begin_offset,
                    self.index - 1,
                    Cow::Borrowed(self.prev_type),
                ))
            } else {
                None
            };
            if self.start_of_chunk(prefix, kind) {
                self.begin_offset = self.index;
            }
            self.prev_prefix = prefix;
            self.prev_type = kind;
            self.index += 1;
            if let Some(entity) = ended {
                return Some(Ok(entity));
            }
        }
    }
}

/// Retrieves the entities of every sequence. Entities of different sequences never compare equal,
/// since they carry the index of their sequence.
pub fn get_entities<S: AsRef<str>>(
    sequences: &[Vec<S>],
) -> Result<Vec<Entity<'_>>, EntityParsingError> {
    let mut entities = Vec::new();
    for (sent_id, sequence) in sequences.iter().enumerate() {
        for entity in ChunkIter::new(sequence, sent_id) {
            entities.push(entity?);
        }
    }
    Ok(entities)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecall {
    pub precision: f64,
    pub recall: f64,
}

impl PrecisionRecall {
    fn from_counts(true_positives: usize, n_pred: usize, n_true: usize) -> Self {
        Self {
            precision: safe_divide(true_positives as f64, n_pred as f64),
            recall: safe_divide(true_positives as f64, n_true as f64),
        }
    }
}

/// Output of an `EntityScorer`: the overall scores and the scores of every label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityScores {
    pub overall: PrecisionRecall,
    pub per_label: BTreeMap<String, PrecisionRecall>,
}

/// Computes entity-level precision and recall from two parallel lists of BIO sequences.
///
/// * `gold`: Reference sequences.
/// * `pred`: Predicted sequences. Must have as many sequences as `gold`, each of the same length
///    as its gold counterpart.
/// * `labels`: Entity types to report. `O` is never reported.
pub trait EntityScorer {
    fn score(
        &self,
        gold: &[Vec<String>],
        pred: &[Vec<String>],
        labels: &BTreeSet<String>,
    ) -> Result<EntityScores, EntityParsingError>;
}

/// Strict entity matching. Overall scores are micro-averaged over the requested labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatchScorer;

impl EntityScorer for ExactMatchScorer {
    fn score(
        &self,
        gold: &[Vec<String>],
        pred: &[Vec<String>],
        labels: &BTreeSet<String>,
    ) -> Result<EntityScores, EntityParsingError> {
        let labels: BTreeSet<&str> = labels
            .iter()
            .map(String::as_str)
            .filter(|l| *l != OUTSIDE)
            .collect();
        let true_entities: AHashSet<Entity> = get_entities(gold)?
            .into_iter()
            .filter(|e| labels.contains(e.tag.as_ref()))
            .collect();
        let pred_entities: AHashSet<Entity> = get_entities(pred)?
            .into_iter()
            .filter(|e| labels.contains(e.tag.as_ref()))
            .collect();

        let count_tag = |set: &AHashSet<Entity>, label: &str| {
            set.iter().filter(|e| e.tag.as_ref() == label).count()
        };
        let per_label = labels
            .iter()
            .map(|&label| {
                let true_positives = true_entities
                    .intersection(&pred_entities)
                    .filter(|e| e.tag.as_ref() == label)
                    .count();
                let scores = PrecisionRecall::from_counts(
                    true_positives,
                    count_tag(&pred_entities, label),
                    count_tag(&true_entities, label),
                );
                (label.to_string(), scores)
            })
            .collect();
        let overall = PrecisionRecall::from_counts(
            true_entities.intersection(&pred_entities).count(),
            pred_entities.len(),
            true_entities.len(),
        );
        Ok(EntityScores { overall, per_label })
    }
}
