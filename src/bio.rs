/**
This module turns a sentence of spans into a flat sequence of BIO tags. A span carrying an entity
opens a region: the spans nested in that region continue the entity instead of producing tags of
their own.
*/
use crate::item::Item;

pub const OUTSIDE: &str = "O";

/// Converts the spans of a sentence into BIO tags. The spans are sorted by `(start, -end)` first,
/// so a container span always comes before the spans it contains.
///
/// * `items`: Spans of one sentence, in any order.
pub fn items_to_bio(items: &[Item]) -> Vec<String> {
    let mut sorted: Vec<&Item> = items.iter().collect();
    sorted.sort_by_key(|it| it.sort_key());

    let mut tags = Vec::with_capacity(sorted.len());
    let mut spans = sorted.into_iter().peekable();
    while let Some(span) = spans.next() {
        let entity = match span.entity() {
            None => {
                tags.push(String::from(OUTSIDE));
                continue;
            }
            Some(entity) => entity,
        };
        tags.push(format!("B-{}", entity));
        let (region_start, region_end) = (span.start, span.end);
        while let Some(inner) = spans.next_if(|it| it.end <= region_end) {
            if inner.start != region_start {
                tags.push(format!("I-{}", entity));
            }
        }
    }
    tags
}

/// Strips the `B-` or `I-` prefix of a tag. `O` is returned as is.
pub fn tag_root(tag: &str) -> &str {
    tag.strip_prefix("B-")
        .or_else(|| tag.strip_prefix("I-"))
        .unwrap_or(tag)
}
