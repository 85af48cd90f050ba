use crate::align::{align_items, edit_ops, RangeMismatchError};
use crate::confusion::ConfusionMatrix;
use crate::item::{minimum_tokens, Item};
use std::borrow::Cow;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Label given to the side of a split or merged span that has no counterpart.
pub const MISALIGNED: &str = "MISALIGNED";

/// Label as compared by the metrics. Unless `strict`, accents are stripped (canonical
/// decomposition, then combining marks dropped), the label is lowercased and the surrounding
/// whitespace is trimmed.
pub(crate) fn normalize_label(label: &str, strict: bool) -> Cow<'_, str> {
    if strict {
        return Cow::Borrowed(label);
    }
    let stripped: String = label.nfd().filter(|c| !is_combining_mark(*c)).collect();
    Cow::Owned(stripped.to_lowercase().trim().to_string())
}

/// Pairs up the labels of the minimum tokens of two sentences. Spans aligned one to one are paired
/// directly. Split or merged spans are either left out (`skip_unaligned`) or paired by a minimum
/// edit distance alignment of their labels, an unmatched label facing `MISALIGNED`.
///
/// * `a`: First sentence
/// * `b`: Second sentence
/// * `skip_unaligned`: Leave out the spans that are not aligned one to one.
/// * `label`: Label of a span, such as its POS tag or its lemma.
pub(crate) fn aligned_labels<'a, F>(
    a: &'a [Item],
    b: &'a [Item],
    skip_unaligned: bool,
    label: F,
) -> Result<(Vec<Cow<'a, str>>, Vec<Cow<'a, str>>), RangeMismatchError>
where
    F: Fn(&'a Item) -> Cow<'a, str>,
{
    let tokens_a = minimum_tokens(a);
    let tokens_b = minimum_tokens(b);
    let alignment = align_items(&tokens_a, &tokens_b)?;

    let mut labels_a = Vec::with_capacity(tokens_a.len());
    let mut labels_b = Vec::with_capacity(tokens_b.len());
    for group in alignment {
        if group.is_one_to_one() {
            labels_a.push(label(group.a[0]));
            labels_b.push(label(group.b[0]));
            continue;
        }
        if skip_unaligned {
            continue;
        }
        let group_a: Vec<Cow<'a, str>> = group.a.iter().map(|&it| label(it)).collect();
        let group_b: Vec<Cow<'a, str>> = group.b.iter().map(|&it| label(it)).collect();
        for (label_a, label_b) in edit_ops(&group_a, &group_b) {
            labels_a.push(label_a.cloned().unwrap_or(Cow::Borrowed(MISALIGNED)));
            labels_b.push(label_b.cloned().unwrap_or(Cow::Borrowed(MISALIGNED)));
        }
    }
    Ok((labels_a, labels_b))
}

/// Confusion matrix of one sentence, the labels of `b` being the predictions.
pub(crate) fn sentence_matrix<'a>(a: &[Cow<'a, str>], b: &[Cow<'a, str>]) -> ConfusionMatrix {
    ConfusionMatrix::from_sequences(b, a)
}
