//! Data structures for representing splicing event identifiers.

use serde::{Deserialize, Serialize};

/// Strand of an exon or feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    /// The single-character symbol, `'+'` or `'-'`.
    pub fn symbol(&self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Plus),
            '-' => Some(Strand::Minus),
            _ => None,
        }
    }
}

/// Supported types of alternative splicing events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpliceType {
    /// Skipped exon, `SE`.
    #[serde(rename = "SE")]
    SkippedExon,
    /// Mutually exclusive exons, `MXE`.
    #[serde(rename = "MXE")]
    MutuallyExclusiveExon,
}

impl SpliceType {
    /// Number of exons in an identifier of this type.
    pub fn n_exons(&self) -> usize {
        match self {
            SpliceType::SkippedExon => 3,
            SpliceType::MutuallyExclusiveExon => 4,
        }
    }

    /// Short name as used by MISO, e.g., `"SE"`.
    pub fn name(&self) -> &'static str {
        match self {
            SpliceType::SkippedExon => "SE",
            SpliceType::MutuallyExclusiveExon => "MXE",
        }
    }
}

/// One exon of an event identifier, e.g., `chr2:9624561:9624679:+`.
///
/// Coordinates are 1-based and inclusive, kept in the order written.  Identifiers of
/// minus-strand events may list `start > end`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExonSpec {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl ExonSpec {
    /// Feature store identifier of the exon, e.g., `exon:chr2:9624561-9624679:+`.
    pub fn exon_id(&self) -> String {
        format!("exon:{}", self.region_key())
    }

    /// Feature store identifier of the CDS with the exon's span.
    pub fn cds_id(&self) -> String {
        format!("CDS:{}", self.region_key())
    }

    /// Lower and upper coordinate, irrespective of the order written.
    pub fn bounds(&self) -> (u64, u64) {
        (self.start.min(self.end), self.start.max(self.end))
    }

    fn region_key(&self) -> String {
        format!(
            "{}:{}-{}:{}",
            self.chrom,
            self.start,
            self.end,
            self.strand.symbol()
        )
    }
}

/// A parsed splicing event identifier.
///
/// The raw identifier string is kept as the event name; alternative coordinates are
/// already resolved in `exons`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventId {
    pub name: String,
    pub exons: Vec<ExonSpec>,
}

impl EventId {
    /// Chromosome of the first exon.
    pub fn chrom(&self) -> Option<&str> {
        self.exons.first().map(|exon| exon.chrom.as_str())
    }

    /// Strand of the first exon.
    pub fn strand(&self) -> Option<Strand> {
        self.exons.first().map(|exon| exon.strand)
    }

    /// Feature store exon identifiers of all exons, in identifier order.
    pub fn exon_ids(&self) -> Vec<String> {
        self.exons.iter().map(ExonSpec::exon_id).collect()
    }
}
