/**
This module measures how much two tokenizations of the same text agree. A tokenization is turned
into a boundary array (one boolean per gap between two characters), the edits needed to go from
one array to the other are counted, and the counts are turned into a chance-corrected agreement
coefficient.
*/
use crate::item::Item;
use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Counts of the edits between two boundary arrays. Counters can be summed; the zero value is the
/// `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditCounter {
    /// Positions where both arrays have a boundary
    pub n_match: usize,
    /// Additions and deletions
    pub n_ad: usize,
    /// Transpositions
    pub n_trans: usize,
    /// Transpositions weighted by their distance
    pub w_trans: f64,
    /// Number of potential boundaries, i.e. the length of the arrays
    pub n_pot_bounds: usize,
    /// Number of boundaries in the first array
    pub n_bounds_a: usize,
    /// Number of boundaries in the second array
    pub n_bounds_b: usize,
}

impl Add for EditCounter {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for EditCounter {
    fn add_assign(&mut self, rhs: Self) {
        self.n_match += rhs.n_match;
        self.n_ad += rhs.n_ad;
        self.n_trans += rhs.n_trans;
        self.w_trans += rhs.w_trans;
        self.n_pot_bounds += rhs.n_pot_bounds;
        self.n_bounds_a += rhs.n_bounds_a;
        self.n_bounds_b += rhs.n_bounds_b;
    }
}

impl Sum for EditCounter {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, counter| acc + counter)
    }
}

impl<'a> Sum<&'a EditCounter> for EditCounter {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// The chance agreement of the counts is 1: both arrays have a boundary at every position and the
/// chance-corrected coefficient is undefined.
pub struct DegenerateAgreementError(pub EditCounter);

impl Display for DegenerateAgreementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Boundary agreement is undefined: chance agreement is 1 ({} and {} boundaries over {} positions)",
            self.0.n_bounds_a, self.0.n_bounds_b, self.0.n_pot_bounds
        )
    }
}

impl Error for DegenerateAgreementError {}

/// Converts a list of spans into an array of boundary marks. The array has one element less than
/// the number of characters covered, starting at character 0. A gap before a span is treated as a
/// span of its own. The boundary after the last character is not part of the array.
///
/// * `items`: Spans of the tokenization, in any order.
pub fn boundary_array(items: &[&Item]) -> Array1<bool> {
    let mut sorted: Vec<&Item> = items.to_vec();
    sorted.sort_by_key(|it| it.sort_key());

    let mut masses = Vec::with_capacity(sorted.len() * 2);
    let mut prev_end = 0;
    for it in sorted {
        if it.start > prev_end {
            masses.push(it.start - prev_end);
        }
        masses.push(it.len());
        prev_end = it.end;
    }
    let length = masses.iter().sum::<usize>().saturating_sub(1);
    let mut array = Array1::from_elem(length, false);
    let mut position = 0;
    for mass in masses {
        if let Some(last_char) = (position + mass).checked_sub(1) {
            if last_char < length {
                array[last_char] = true;
            }
        }
        position += mass;
    }
    array
}

/// Counts the edits needed to align the boundaries of `a` and `b`, which must have the same
/// length. Two disagreements at most `window` positions apart and crossing each other (one
/// array has the first boundary, the other array the second one) count as one transposition of
/// weight `1 - offset / (window + 1)`. Every other disagreement is an addition or a deletion.
///
/// * `a`: First boundary array
/// * `b`: Second boundary array
/// * `window`: Maximum distance between the two halves of a transposition
pub fn count_edits(a: ArrayView1<bool>, b: ArrayView1<bool>, window: usize) -> EditCounter {
    debug_assert_eq!(a.len(), b.len());
    let substitutions: Array1<bool> = Zip::from(&a).and(&b).map_collect(|&x, &y| x ^ y);
    let n_match = Zip::from(&a)
        .and(&b)
        .fold(0, |acc, &x, &y| acc + usize::from(x && y));

    let length = substitutions.len();
    let mut n_trans = 0;
    let mut w_trans = 0.0;
    let mut i = 0;
    while i < length {
        if !substitutions[i] {
            i += 1;
            continue;
        }
        for offset in 1..=window {
            let j = i + offset;
            if j >= length {
                break;
            }
            if substitutions[j] && ((a[i] && b[j]) || (b[i] && a[j])) {
                n_trans += 1;
                w_trans += 1.0 - offset as f64 / (window + 1) as f64;
                i += offset;
                break;
            }
        }
        i += 1;
    }

    let n_disagreements = substitutions.iter().filter(|&&s| s).count();
    EditCounter {
        n_match,
        n_ad: n_disagreements - 2 * n_trans,
        n_trans,
        w_trans,
        n_pot_bounds: length,
        n_bounds_a: a.iter().filter(|&&x| x).count(),
        n_bounds_b: b.iter().filter(|&&x| x).count(),
    }
}

/// Chance-corrected agreement on the boundaries (a Cohen's kappa). The chance agreement uses the
/// empirical boundary rate of each side. The observed agreement and the chance agreement fall
/// back to 0 when their denominator is 0; a chance agreement of 1 is an error.
///
/// Two identical arrays without any boundary (e.g. two single-token sentences) therefore score 0,
/// not 1: there is no boundary to agree on. Cohen's kappa of the POS tags and lemmas behaves the
/// same way when both sides only use one label.
pub fn boundary_edit_kappa(counts: &EditCounter) -> Result<f64, DegenerateAgreementError> {
    let n_pot_bounds = counts.n_pot_bounds;
    if n_pot_bounds > 0 && counts.n_bounds_a * counts.n_bounds_b == n_pot_bounds * n_pot_bounds {
        return Err(DegenerateAgreementError(*counts));
    }
    let observed_denominator = (counts.n_ad + counts.n_trans + counts.n_match) as f64;
    let observed = if observed_denominator == 0.0 {
        0.0
    } else {
        1.0 - (counts.n_ad as f64 + counts.w_trans) / observed_denominator
    };
    let chance = if n_pot_bounds == 0 {
        0.0
    } else {
        (counts.n_bounds_a * counts.n_bounds_b) as f64 / (n_pot_bounds * n_pot_bounds) as f64
    };
    Ok((observed - chance) / (1.0 - chance))
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;
    use quickcheck::{self, TestResult};
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn tokens(bounds: &[(usize, usize)]) -> Vec<Item> {
        bounds
            .iter()
            .map(|(start, end)| Item::new("", *start, *end))
            .collect()
    }

    #[rstest]
    #[case(vec![(0, 2), (2, 3), (3, 6)], array![false, true, true, false, false])]
    #[case(vec![(0, 6)], array![false, false, false, false, false])]
    #[case(vec![(1, 3), (4, 5)], array![true, false, true, true])]
    #[case(vec![], Array1::from_vec(vec![]))]
    fn test_boundary_array(#[case] bounds: Vec<(usize, usize)>, #[case] expected: Array1<bool>) {
        let items = tokens(&bounds);
        let refs: Vec<&Item> = items.iter().collect();
        assert_eq!(boundary_array(&refs), expected);
    }

    #[test]
    fn test_count_edits_with_transposition() {
        let a = array![true, false, false, true, false];
        let b = array![false, true, false, true, false];
        let counts = count_edits(a.view(), b.view(), 1);
        assert_eq!(counts.n_match, 1);
        assert_eq!(counts.n_trans, 1);
        assert_eq!(counts.n_ad, 0);
        assert!((counts.w_trans - 0.5).abs() < EPS);
        assert_eq!(counts.n_pot_bounds, 5);
        assert_eq!((counts.n_bounds_a, counts.n_bounds_b), (2, 2));
    }

    #[test]
    fn test_count_edits_same_side_is_not_a_transposition() {
        let a = array![true, true, false];
        let b = array![false, false, false];
        let counts = count_edits(a.view(), b.view(), 1);
        assert_eq!(counts.n_trans, 0);
        assert_eq!(counts.n_ad, 2);
    }

    #[test]
    fn test_count_edits_window() {
        let a = array![true, false, false, false];
        let b = array![false, false, true, false];
        assert_eq!(count_edits(a.view(), b.view(), 1).n_trans, 0);
        let counts = count_edits(a.view(), b.view(), 2);
        assert_eq!(counts.n_trans, 1);
        assert!((counts.w_trans - 1.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_kappa_identical_arrays() {
        let a = array![true, false, true, false];
        let counts = count_edits(a.view(), a.view(), 1);
        assert!((boundary_edit_kappa(&counts).unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_kappa_disjoint_arrays() {
        let a = array![true, false, false, false];
        let b = array![false, false, true, false];
        let counts = count_edits(a.view(), b.view(), 1);
        assert!(boundary_edit_kappa(&counts).unwrap() <= 0.0);
    }

    #[test]
    fn test_kappa_degenerate() {
        let a = array![true, true, true];
        let counts = count_edits(a.view(), a.view(), 1);
        let err = boundary_edit_kappa(&counts).unwrap_err();
        assert_eq!(err.0, counts);
    }

    #[test]
    fn test_kappa_without_boundaries_falls_back_to_zero() {
        let a = array![false, false];
        let counts = count_edits(a.view(), a.view(), 1);
        assert_eq!(boundary_edit_kappa(&counts).unwrap(), 0.0);
        assert_eq!(boundary_edit_kappa(&EditCounter::default()).unwrap(), 0.0);
    }

    #[test]
    fn test_counter_sum() {
        let first = EditCounter {
            n_match: 1,
            n_ad: 2,
            n_trans: 1,
            w_trans: 0.5,
            n_pot_bounds: 9,
            n_bounds_a: 3,
            n_bounds_b: 2,
        };
        let total: EditCounter = [first, first, EditCounter::default()].iter().sum();
        assert_eq!(total.n_match, 2);
        assert_eq!(total.n_pot_bounds, 18);
        assert!((total.w_trans - 1.0).abs() < EPS);
        assert_eq!(first + EditCounter::default(), first);
    }

    #[test]
    fn test_counter_rejects_unknown_fields() {
        let raw = r#"{"n_match": 1, "n_ad": 0, "n_trans": 0, "w_trans": 0.0, "n_pot_bounds": 2,
                      "n_bounds_a": 1, "n_bounds_b": 1, "pot_bounds": 3}"#;
        assert!(serde_json::from_str::<EditCounter>(raw).is_err());
        let missing = r#"{"n_match": 1}"#;
        assert!(serde_json::from_str::<EditCounter>(missing).is_err());
    }

    #[test]
    fn test_propertie_identical_arrays_agree() {
        fn propertie_identical_arrays_agree(marks: Vec<bool>) -> TestResult {
            let n_bounds = marks.iter().filter(|&&x| x).count();
            if n_bounds == 0 || n_bounds == marks.len() {
                return TestResult::discard();
            }
            let a = Array1::from_vec(marks);
            let counts = count_edits(a.view(), a.view(), 1);
            match boundary_edit_kappa(&counts) {
                Ok(kappa) => TestResult::from_bool((kappa - 1.0).abs() < EPS),
                Err(_) => TestResult::failed(),
            }
        }
        let mut qc = quickcheck::QuickCheck::new().tests(1000);
        qc.quickcheck(propertie_identical_arrays_agree as fn(Vec<bool>) -> TestResult)
    }

    #[test]
    fn test_propertie_edits_account_for_every_disagreement() {
        fn propertie_edits_account(pairs: Vec<(bool, bool)>, window: u8) -> TestResult {
            let window = usize::from(window % 4) + 1;
            let a: Array1<bool> = pairs.iter().map(|(x, _)| *x).collect();
            let b: Array1<bool> = pairs.iter().map(|(_, y)| *y).collect();
            let counts = count_edits(a.view(), b.view(), window);
            let disagreements = pairs.iter().filter(|(x, y)| x != y).count();
            let consistent = counts.n_ad + 2 * counts.n_trans == disagreements
                && counts.w_trans <= counts.n_trans as f64
                && counts.n_match <= counts.n_bounds_a.min(counts.n_bounds_b);
            TestResult::from_bool(consistent)
        }
        let mut qc = quickcheck::QuickCheck::new().tests(1000);
        qc.quickcheck(propertie_edits_account as fn(Vec<(bool, bool)>, u8) -> TestResult)
    }
}
