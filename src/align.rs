/**
This module reconciles two annotations that do not necessarily share the same tokenization. The
`align_items` function groups spans of both sides covering the same characters, and `edit_ops`
pairs up two label sequences with a minimum edit distance alignment when the groups are not
one-to-one.
*/
use crate::item::Item;
use itertools::Itertools;
use ndarray::Array2;
use std::error::Error;
use std::fmt::Display;

/// Moves stored in the backpointer matrix of `edit_ops`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    /// Diagonal move, the two elements are equal
    Equal,
    /// Diagonal move, the element of `a` is replaced by the element of `b`
    Substitution,
    /// Vertical move, the element of `a` has no counterpart
    Insertion,
    /// Horizontal move, the element of `b` has no counterpart
    Deletion,
}

/// Collects the edits needed to transform `a` into `b`. Each returned pair contains an element of
/// `a` and an element of `b`, or `None` on the side without counterpart. Matches cost nothing,
/// every other edit costs 1. When several edits have the same cost, insertions are preferred over
/// deletions, which are preferred over substitutions.
///
/// * `a`: Source sequence
/// * `b`: Target sequence
pub fn edit_ops<'a, T: PartialEq>(a: &'a [T], b: &'a [T]) -> Vec<(Option<&'a T>, Option<&'a T>)> {
    let (m, n) = (a.len(), b.len());
    let mut costs = Array2::<usize>::zeros((m + 1, n + 1));
    let mut backpointers = Array2::from_elem((m + 1, n + 1), Move::Deletion);
    for i in 0..=m {
        costs[[i, 0]] = i;
        backpointers[[i, 0]] = Move::Insertion;
    }
    for j in 0..=n {
        costs[[0, j]] = j;
        backpointers[[0, j]] = Move::Deletion;
    }

    for i in 1..=m {
        for j in 1..=n {
            if a[i - 1] == b[j - 1] {
                costs[[i, j]] = costs[[i - 1, j - 1]];
                backpointers[[i, j]] = Move::Equal;
                continue;
            }
            let candidates = [
                (costs[[i - 1, j]], Move::Insertion),
                (costs[[i, j - 1]], Move::Deletion),
                (costs[[i - 1, j - 1]], Move::Substitution),
            ];
            // `min_by_key` keeps the first minimum, which gives the tie-break order.
            let (cost, step) = candidates
                .into_iter()
                .min_by_key(|(cost, _)| *cost)
                .unwrap_or((0, Move::Substitution));
            costs[[i, j]] = cost + 1;
            backpointers[[i, j]] = step;
        }
    }

    let mut edits = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        match backpointers[[i, j]] {
            Move::Equal | Move::Substitution => {
                edits.push((Some(&a[i - 1]), Some(&b[j - 1])));
                i -= 1;
                j -= 1;
            }
            Move::Insertion => {
                edits.push((Some(&a[i - 1]), None));
                i -= 1;
            }
            Move::Deletion => {
                edits.push((None, Some(&b[j - 1])));
                j -= 1;
            }
        }
    }
    edits.reverse();
    edits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Error returned when two span sequences do not cover the same total range. The ranges are
/// `(start, end)`, and `None` for an empty sequence.
pub struct RangeMismatchError {
    pub a: Option<(usize, usize)>,
    pub b: Option<(usize, usize)>,
}

impl Display for RangeMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_range = |range: Option<(usize, usize)>| match range {
            Some((start, end)) => format!("[{}, {})", start, end),
            None => String::from("nothing"),
        };
        write!(
            f,
            "Both span sequences must cover the same total range. `a` covers {}, `b` covers {}",
            fmt_range(self.a),
            fmt_range(self.b)
        )
    }
}

impl Error for RangeMismatchError {}

/// A group of spans from both sides covering the same characters. In the ideal case, both sides
/// are singletons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlignmentGroup<'a> {
    pub a: Vec<&'a Item>,
    pub b: Vec<&'a Item>,
}

impl<'a> AlignmentGroup<'a> {
    /// Is the group made of exactly one span on each side?
    pub fn is_one_to_one(&self) -> bool {
        self.a.len() == 1 && self.b.len() == 1
    }
}

fn covered_range<'a, I: IntoIterator<Item = &'a Item>>(items: I) -> Option<(usize, usize)> {
    items
        .into_iter()
        .fold(None, |range, it| match range {
            None => Some((it.start, it.end)),
            Some((start, end)) => Some((start.min(it.start), end.max(it.end))),
        })
}

/// Checks whether all the spans of a sorted sequence are adjacent to each other.
pub fn is_contiguous(items: &[&Item]) -> bool {
    items
        .iter()
        .tuple_windows()
        .all(|(prev, next)| prev.end == next.start)
}

/// Aligns the spans of `a` and `b`. Both sequences are assumed to be made of contiguous and
/// non-overlapping spans covering the same total range. Each returned group contains spans of `a`
/// and spans of `b` covering the same sub-range.
///
/// * `a`: Spans of the first annotation
/// * `b`: Spans of the second annotation
pub fn align_items<'a>(
    a: &[&'a Item],
    b: &[&'a Item],
) -> Result<Vec<AlignmentGroup<'a>>, RangeMismatchError> {
    let a_sorted: Vec<&Item> = a.iter().copied().sorted_by_key(|it| it.sort_key()).collect();
    let b_sorted: Vec<&Item> = b.iter().copied().sorted_by_key(|it| it.sort_key()).collect();

    let range_a = covered_range(a_sorted.iter().copied());
    let range_b = covered_range(b_sorted.iter().copied());
    if range_a != range_b {
        return Err(RangeMismatchError {
            a: range_a,
            b: range_b,
        });
    }

    let mut groups = Vec::new();
    let mut current = AlignmentGroup::default();
    let (mut a_ix, mut b_ix) = (0, 0);
    while a_ix < a_sorted.len() && b_ix < b_sorted.len() {
        let (curr_a, curr_b) = (a_sorted[a_ix], b_sorted[b_ix]);
        match curr_a.end.cmp(&curr_b.end) {
            std::cmp::Ordering::Equal => {
                current.a.push(curr_a);
                current.b.push(curr_b);
                groups.push(std::mem::take(&mut current));
                a_ix += 1;
                b_ix += 1;
            }
            std::cmp::Ordering::Less => {
                current.a.push(curr_a);
                a_ix += 1;
            }
            std::cmp::Ordering::Greater => {
                current.b.push(curr_b);
                b_ix += 1;
            }
        }
    }
    // Only reachable when a side is not contiguous; the leftovers close the last group.
    current.a.extend_from_slice(&a_sorted[a_ix..]);
    current.b.extend_from_slice(&b_sorted[b_ix..]);
    if !current.a.is_empty() || !current.b.is_empty() {
        groups.push(current);
    }
    Ok(groups)
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{self, TestResult};
    use rstest::rstest;

    fn tokens(bounds: &[(usize, usize)]) -> Vec<Item> {
        bounds
            .iter()
            .map(|(start, end)| Item::new(format!("{}-{}", start, end), *start, *end))
            .collect()
    }

    fn spans(group: &[&Item]) -> Vec<(usize, usize)> {
        group.iter().map(|it| (it.start, it.end)).collect()
    }

    #[test]
    fn test_edit_ops_insertion_in_the_middle() {
        let a = vec!["a", "b"];
        let b = vec!["a", "c", "b"];
        let actual = edit_ops(&a, &b);
        let expected = vec![
            (Some(&"a"), Some(&"a")),
            (None, Some(&"c")),
            (Some(&"b"), Some(&"b")),
        ];
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case(vec![], vec![], 0)]
    #[case(vec!["x"], vec![], 1)]
    #[case(vec![], vec!["x", "y"], 2)]
    #[case(vec!["x", "y"], vec!["z"], 2)]
    fn test_edit_ops_length(
        #[case] a: Vec<&str>,
        #[case] b: Vec<&str>,
        #[case] expected_len: usize,
    ) {
        let actual = edit_ops(&a, &b);
        assert_eq!(actual.len(), expected_len);
        let from_a: Vec<_> = actual.iter().filter_map(|(x, _)| *x).collect();
        let from_b: Vec<_> = actual.iter().filter_map(|(_, y)| *y).collect();
        assert_eq!(from_a, a.iter().collect::<Vec<_>>());
        assert_eq!(from_b, b.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_edit_ops_prefers_insertion_then_deletion() {
        // A substitution is only taken when it is strictly cheaper.
        let a = vec!["x"];
        let b = vec!["y"];
        assert_eq!(edit_ops(&a, &b), vec![(Some(&"x"), Some(&"y"))]);
        let a = vec!["x", "y"];
        let b = vec!["y"];
        assert_eq!(edit_ops(&a, &b), vec![(Some(&"x"), None), (Some(&"y"), Some(&"y"))]);
    }

    #[test]
    fn test_propertie_edit_ops_identity() {
        fn propertie_edit_ops_identity(seq: Vec<u8>) -> TestResult {
            let edits = edit_ops(&seq, &seq);
            if edits.len() != seq.len() {
                return TestResult::failed();
            }
            let all_matched = edits
                .iter()
                .all(|(x, y)| x.is_some() && y.is_some() && x == y);
            TestResult::from_bool(all_matched)
        }
        let mut qc = quickcheck::QuickCheck::new().tests(500);
        qc.quickcheck(propertie_edit_ops_identity as fn(Vec<u8>) -> TestResult)
    }

    #[test]
    fn test_align_identical_sequences() {
        let a = tokens(&[(0, 3), (3, 4), (4, 9)]);
        let refs: Vec<&Item> = a.iter().collect();
        let groups = align_items(&refs, &refs).unwrap();
        assert_eq!(groups.len(), 3);
        for (group, item) in groups.iter().zip(a.iter()) {
            assert!(group.is_one_to_one());
            assert_eq!(spans(&group.a), vec![(item.start, item.end)]);
            assert_eq!(spans(&group.b), vec![(item.start, item.end)]);
        }
    }

    #[test]
    fn test_align_split_and_merge() {
        let a = tokens(&[(0, 2), (2, 4), (4, 6)]);
        let b = tokens(&[(0, 4), (4, 5), (5, 6)]);
        let a_refs: Vec<&Item> = a.iter().collect();
        let b_refs: Vec<&Item> = b.iter().rev().collect();
        let groups = align_items(&a_refs, &b_refs).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(spans(&groups[0].a), vec![(0, 2), (2, 4)]);
        assert_eq!(spans(&groups[0].b), vec![(0, 4)]);
        assert_eq!(spans(&groups[1].a), vec![(4, 6)]);
        assert_eq!(spans(&groups[1].b), vec![(4, 5), (5, 6)]);
    }

    #[rstest]
    #[case(vec![(0, 10)], vec![(0, 9)])]
    #[case(vec![(0, 5), (5, 10)], vec![(1, 10)])]
    #[case(vec![(0, 5)], vec![])]
    fn test_align_range_mismatch(
        #[case] a_bounds: Vec<(usize, usize)>,
        #[case] b_bounds: Vec<(usize, usize)>,
    ) {
        let a = tokens(&a_bounds);
        let b = tokens(&b_bounds);
        let a_refs: Vec<&Item> = a.iter().collect();
        let b_refs: Vec<&Item> = b.iter().collect();
        let err = align_items(&a_refs, &b_refs).unwrap_err();
        assert_eq!(err.a, covered_range(a.iter()));
        assert_eq!(err.b, covered_range(b.iter()));
    }

    #[test]
    fn test_align_empty_sequences() {
        let groups = align_items(&[], &[]).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_is_contiguous() {
        let contiguous = tokens(&[(0, 2), (2, 3)]);
        let gap = tokens(&[(0, 2), (3, 4)]);
        assert!(is_contiguous(&contiguous.iter().collect::<Vec<_>>()));
        assert!(!is_contiguous(&gap.iter().collect::<Vec<_>>()));
    }
}
