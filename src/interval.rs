//! Exon and intron intervals of splicing events.
//!
//! For each exon position of a splice type, the intervals of all events form one
//! `IntervalSet`, and likewise for each intron position between consecutive exons.
//! Intervals are 0-based and half-open, rendered as six-column BED lines.

use std::fmt::Display;
use std::io::Write;

use crate::data::interface::GenomeProvider;
use crate::parser::{EventId, ExonSpec, Strand};
use crate::sequences::revcomp;

pub use crate::interval::error::Error;

mod error {
    use thiserror::Error;

    /// Error type for interval construction.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("expected {expected} coordinate tuples (one per event), found {actual}")]
        CountMismatch { expected: usize, actual: usize },
        #[error("intron {position} does not exist in event {event} with {n_exons} exons")]
        InvalidIntronPosition {
            position: usize,
            event: String,
            n_exons: usize,
        },
        #[error("could not extract sequence: {0}")]
        Data(#[from] crate::data::error::Error),
        #[error("could not write sequences: {0}")]
        Io(#[from] std::io::Error),
    }
}

/// Default BED score of event intervals.
pub const DEFAULT_SCORE: u32 = 1000;

/// A 0-based, half-open genomic interval labeled with its event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenomicInterval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    /// The event identifier.
    pub name: String,
    pub score: u32,
}

impl GenomicInterval {
    /// Interval of an exon of an identifier, with its bounds in ascending order.
    pub fn from_exon(exon: &ExonSpec, name: &str, score: u32) -> Self {
        let (start, end) = exon.bounds();
        Self {
            chrom: exon.chrom.clone(),
            start: start - 1,
            end,
            strand: exon.strand,
            name: name.to_string(),
            score,
        }
    }

    /// Sequence name as written by `bedtools getfasta -s`, e.g., `chr1:99-200(+)`.
    pub fn sequence_name(&self) -> String {
        format!(
            "{}:{}-{}({})",
            self.chrom,
            self.start,
            self.end,
            self.strand.symbol()
        )
    }

    /// Extract the interval's sequence, reverse-complemented on the minus strand.
    pub fn sequence(&self, genome: &dyn GenomeProvider) -> Result<String, Error> {
        let seq = genome.get_seq_part(&self.chrom, self.start, self.end)?;
        Ok(match self.strand {
            Strand::Plus => seq,
            Strand::Minus => revcomp(&seq),
        })
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.start,
            self.end,
            self.name,
            self.score,
            self.strand.symbol()
        )
    }
}

/// A named sequence extracted for an interval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: String,
    pub seq: String,
}

/// The intervals at one exon or intron position, one per event, in event order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntervalSet {
    pub intervals: Vec<GenomicInterval>,
}

impl IntervalSet {
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenomicInterval> {
        self.intervals.iter()
    }

    /// Render as BED text, one line per interval.
    pub fn to_bed(&self) -> String {
        self.intervals
            .iter()
            .map(|interval| format!("{interval}\n"))
            .collect()
    }

    /// Extract the sequences of all intervals, named by `GenomicInterval::sequence_name`.
    pub fn sequences(&self, genome: &dyn GenomeProvider) -> Result<Vec<SequenceRecord>, Error> {
        self.intervals
            .iter()
            .map(|interval| {
                Ok(SequenceRecord {
                    name: interval.sequence_name(),
                    seq: interval.sequence(genome)?,
                })
            })
            .collect()
    }

    /// Write the interval sequences as FASTA.
    pub fn write_fasta<W: Write>(
        &self,
        genome: &dyn GenomeProvider,
        writer: &mut W,
    ) -> Result<(), Error> {
        for record in self.sequences(genome)? {
            writeln!(writer, ">{}\n{}", record.name, record.seq)?;
        }
        Ok(())
    }
}

impl FromIterator<GenomicInterval> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = GenomicInterval>>(iter: T) -> Self {
        Self {
            intervals: iter.into_iter().collect(),
        }
    }
}

/// Build the exon intervals at one exon position.
///
/// # Arguments
///
/// * `names` -- event identifiers
/// * `exons` -- the exon at the position for each event, in the same order
/// * `score` -- BED score of all intervals
pub fn exon_intervals(
    names: &[&str],
    exons: &[&ExonSpec],
    score: u32,
) -> Result<IntervalSet, Error> {
    if names.len() != exons.len() {
        return Err(Error::CountMismatch {
            expected: names.len(),
            actual: exons.len(),
        });
    }
    Ok(names
        .iter()
        .zip(exons.iter())
        .map(|(name, exon)| {
            if exon.start > exon.end {
                log::warn!(
                    "exon {} of event {} has start after end; swapping",
                    exon,
                    name
                );
            }
            GenomicInterval::from_exon(exon, name, score)
        })
        .collect())
}

/// Build the exon intervals for every exon position of the events.
///
/// All events must have `n_exons` exons.
pub fn all_exon_intervals(
    events: &[EventId],
    n_exons: usize,
    score: u32,
) -> Result<Vec<IntervalSet>, Error> {
    let names = events.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
    (0..n_exons)
        .map(|i| {
            let exons = events
                .iter()
                .filter_map(|event| event.exons.get(i))
                .collect::<Vec<_>>();
            exon_intervals(&names, &exons, score)
        })
        .collect()
}

/// Build the intron intervals at the 1-based intron position `k`, between exon `k` and
/// exon `k + 1` of each event.
pub fn intron_intervals(events: &[EventId], k: usize, score: u32) -> Result<IntervalSet, Error> {
    events
        .iter()
        .map(|event| {
            let n_exons = event.exons.len();
            if k == 0 || k >= n_exons {
                return Err(Error::InvalidIntronPosition {
                    position: k,
                    event: event.name.clone(),
                    n_exons,
                });
            }
            Ok(intron_interval(
                &event.name,
                &event.exons[k - 1],
                &event.exons[k],
                score,
            ))
        })
        .collect()
}

/// Interval of the intron between two consecutive exons of one event.
fn intron_interval(
    name: &str,
    upstream: &ExonSpec,
    downstream: &ExonSpec,
    score: u32,
) -> GenomicInterval {
    let (mut start, mut end) = match upstream.strand {
        Strand::Plus => (upstream.end, downstream.start),
        Strand::Minus => (downstream.end, upstream.start),
    };
    if start > end {
        log::warn!(
            "intron between {} and {} of event {} has start {} after end {}; swapping",
            upstream,
            downstream,
            name,
            start,
            end
        );
        std::mem::swap(&mut start, &mut end);
    }
    GenomicInterval {
        chrom: upstream.chrom.clone(),
        start,
        end,
        strand: upstream.strand,
        name: name.to_string(),
        score,
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::data::fasta::InMemoryGenome;
    use crate::parser::SpliceType;

    fn event(id: &str) -> EventId {
        EventId::parse_unchecked(id).unwrap()
    }

    #[test]
    fn exon_interval_round_trip() -> Result<(), Error> {
        let ev = event(
            "chr2:9624561:9624679|9624700:+@chr2:9627585:9627676:+@chr2:9628276:9628591:+",
        );
        let sets = all_exon_intervals(&[ev.clone()], 3, DEFAULT_SCORE)?;

        assert_eq!(sets.len(), 3);
        for (set, exon) in sets.iter().zip(ev.exons.iter()) {
            let interval = &set.intervals[0];
            assert_eq!((interval.start + 1, interval.end), (exon.start, exon.end));
            assert_eq!(interval.name, ev.name);
            assert_eq!(interval.score, 1000);
        }
        assert_eq!(
            sets[0].to_bed(),
            format!("chr2\t9624560\t9624679\t{}\t1000\t+\n", ev.name)
        );

        Ok(())
    }

    #[test]
    fn exon_intervals_count_mismatch() {
        let ev = event("chr1:1:2:+");
        assert!(matches!(
            exon_intervals(&["a", "b"], &[&ev.exons[0]], DEFAULT_SCORE),
            Err(Error::CountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn exon_inverted_swapped() -> Result<(), Error> {
        let ev = event("chr15:42565276:42565087:-");
        let set = exon_intervals(&[ev.name.as_str()], &[&ev.exons[0]], 1)?;
        assert_eq!(
            (set.intervals[0].start, set.intervals[0].end),
            (42565086, 42565276)
        );
        assert_eq!(
            set.to_bed(),
            "chr15\t42565086\t42565276\tchr15:42565276:42565087:-\t1\t-\n"
        );

        Ok(())
    }

    #[test]
    fn intron_plus_strand() -> Result<(), Error> {
        let events = vec![event("chr1:100:200:+@chr1:300:400:+")];
        let set = intron_intervals(&events, 1, DEFAULT_SCORE)?;

        assert_eq!((set.intervals[0].start, set.intervals[0].end), (200, 300));
        assert_eq!(set.intervals[0].strand, Strand::Plus);

        Ok(())
    }

    #[test]
    fn intron_minus_strand() -> Result<(), Error> {
        let events = vec![
            event("chr1:500:600:-@chr1:300:400:-"),
            // exons written in the wrong order, bounds get swapped
            event("chr1:300:400:-@chr1:500:600:-"),
        ];
        let set = intron_intervals(&events, 1, DEFAULT_SCORE)?;

        assert_eq!((set.intervals[0].start, set.intervals[0].end), (400, 500));
        assert_eq!((set.intervals[1].start, set.intervals[1].end), (300, 600));

        Ok(())
    }

    #[test]
    fn intron_inverted_plus_strand_swapped() -> Result<(), Error> {
        let events = vec![event("chr1:300:400:+@chr1:100:200:+")];
        let set = intron_intervals(&events, 1, DEFAULT_SCORE)?;

        assert_eq!((set.intervals[0].start, set.intervals[0].end), (100, 400));

        Ok(())
    }

    #[test]
    fn intron_position_out_of_range() {
        let id = "chr1:100:200:+@chr1:300:400:+@chr1:500:600:+";
        let events = vec![EventId::parse(id, SpliceType::SkippedExon).unwrap()];

        assert!(intron_intervals(&events, 2, DEFAULT_SCORE).is_ok());
        assert!(matches!(
            intron_intervals(&events, 3, DEFAULT_SCORE),
            Err(Error::InvalidIntronPosition { position: 3, .. })
        ));
        assert!(matches!(
            intron_intervals(&events, 0, DEFAULT_SCORE),
            Err(Error::InvalidIntronPosition { position: 0, .. })
        ));
    }

    #[test]
    fn sequences_and_fasta() -> Result<(), Error> {
        let genome = InMemoryGenome::from_iter(vec![(
            "chr1".to_string(),
            "AAAACCCCGGGGTTTT".to_string(),
        )]);
        let events = vec![event("chr1:3:6:+"), event("chr1:3:6:-")];
        let exons = events.iter().map(|e| &e.exons[0]).collect::<Vec<_>>();
        let names = events.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        let set = exon_intervals(&names, &exons, DEFAULT_SCORE)?;

        assert_eq!(
            set.sequences(&genome)?,
            vec![
                SequenceRecord {
                    name: "chr1:2-6(+)".to_string(),
                    seq: "AACC".to_string()
                },
                SequenceRecord {
                    name: "chr1:2-6(-)".to_string(),
                    seq: "GGTT".to_string()
                },
            ]
        );

        let mut buf = Vec::new();
        set.write_fasta(&genome, &mut buf)?;
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            ">chr1:2-6(+)\nAACC\n>chr1:2-6(-)\nGGTT\n"
        );

        Ok(())
    }
}
