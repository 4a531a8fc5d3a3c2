//! Resolution of the two isoforms implied by a splicing event.
//!
//! Isoform 1 and isoform 2 of the supported splice types are defined as follows:
//!
//! | type | isoform 1                 | isoform 2                         |
//! |------|---------------------------|-----------------------------------|
//! | SE   | exons 1, 3 (exon skipped) | exons 1, 2, 3 (exon included)     |
//! | MXE  | exons 1, 3, 4 (far exon)  | exons 1, 2, 4 (near exon)         |

use std::hash::Hash;

use indexmap::IndexSet;

use crate::parser::SpliceType;

pub use crate::isoform::error::Error;

mod error {
    use thiserror::Error;

    /// Error type for isoform resolution.
    #[derive(Error, Debug, PartialEq)]
    pub enum Error {
        #[error("{splice_type} events have {expected} exon positions, found {actual}")]
        CountMismatch {
            splice_type: String,
            expected: usize,
            actual: usize,
        },
    }
}

/// The two isoforms of an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IsoformPair<T> {
    pub isoform1: T,
    pub isoform2: T,
}

impl<T> IsoformPair<T> {
    /// Both isoforms with their 1-based number.
    pub fn numbered(&self) -> [(usize, &T); 2] {
        [(1, &self.isoform1), (2, &self.isoform2)]
    }
}

fn check_count(splice_type: SpliceType, actual: usize) -> Result<(), Error> {
    if actual != splice_type.n_exons() {
        Err(Error::CountMismatch {
            splice_type: splice_type.name().to_string(),
            expected: splice_type.n_exons(),
            actual,
        })
    } else {
        Ok(())
    }
}

fn intersection<T: Eq + Hash + Clone>(sets: &[&IndexSet<T>]) -> IndexSet<T> {
    match sets.split_first() {
        Some((first, rest)) => first
            .iter()
            .filter(|value| rest.iter().all(|set| set.contains(*value)))
            .cloned()
            .collect(),
        None => IndexSet::new(),
    }
}

/// Select the exons (or CDS) making up each isoform, in exon order.
///
/// ```
/// use splice_annotator::isoform::splice_type_exons;
/// use splice_annotator::parser::SpliceType;
///
/// let pair = splice_type_exons(SpliceType::SkippedExon, &["e1", "e2", "e3"]).unwrap();
/// assert_eq!(pair.isoform1, vec!["e1", "e3"]);
/// assert_eq!(pair.isoform2, vec!["e1", "e2", "e3"]);
/// ```
pub fn splice_type_exons<T: Clone>(
    splice_type: SpliceType,
    exons: &[T],
) -> Result<IsoformPair<Vec<T>>, Error> {
    check_count(splice_type, exons.len())?;
    let pick = |idx: &[usize]| idx.iter().map(|i| exons[*i].clone()).collect::<Vec<_>>();
    Ok(match splice_type {
        SpliceType::SkippedExon => IsoformPair {
            isoform1: pick(&[0, 2]),
            isoform2: pick(&[0, 1, 2]),
        },
        SpliceType::MutuallyExclusiveExon => IsoformPair {
            isoform1: pick(&[0, 2, 3]),
            isoform2: pick(&[0, 1, 3]),
        },
    })
}

/// Select the candidates (e.g., transcripts) supporting each isoform.
///
/// `candidates` holds the candidates of each exon position, e.g., the transcripts
/// containing that exon.  The resulting sets may overlap; see `exclusive_isoforms`.
pub fn splice_type_isoforms<T: Eq + Hash + Clone>(
    splice_type: SpliceType,
    candidates: &[IndexSet<T>],
) -> Result<IsoformPair<IndexSet<T>>, Error> {
    check_count(splice_type, candidates.len())?;
    let c = candidates;
    Ok(match splice_type {
        SpliceType::SkippedExon => {
            let isoform1 = intersection(&[&c[0], &c[2]]);
            let isoform2 = intersection(&[&c[1], &isoform1]);
            IsoformPair { isoform1, isoform2 }
        }
        SpliceType::MutuallyExclusiveExon => IsoformPair {
            isoform1: intersection(&[&c[0], &c[2], &c[3]]),
            isoform2: intersection(&[&c[0], &c[1], &c[3]]),
        },
    })
}

/// Like `splice_type_isoforms`, but drops candidates consistent with both isoforms.
pub fn exclusive_isoforms<T: Eq + Hash + Clone>(
    splice_type: SpliceType,
    candidates: &[IndexSet<T>],
) -> Result<IsoformPair<IndexSet<T>>, Error> {
    let IsoformPair { isoform1, isoform2 } = splice_type_isoforms(splice_type, candidates)?;
    let ambiguous = intersection(&[&isoform1, &isoform2]);
    Ok(IsoformPair {
        isoform1: isoform1.difference(&ambiguous).cloned().collect(),
        isoform2: isoform2.difference(&ambiguous).cloned().collect(),
    })
}
