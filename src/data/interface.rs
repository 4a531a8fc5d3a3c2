//! Definition of the interfaces for accessing annotation features and genome sequences.

use std::fmt::Display;

use indexmap::IndexSet;

use crate::data::error::Error;
use crate::parser::Strand;
use crate::sequences::revcomp;

/// Type of an annotation feature (column 3 of a GTF file).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FeatureType {
    Gene,
    Transcript,
    Exon,
    Cds,
    Other(String),
}

impl FeatureType {
    pub fn as_str(&self) -> &str {
        match self {
            FeatureType::Gene => "gene",
            FeatureType::Transcript => "transcript",
            FeatureType::Exon => "exon",
            FeatureType::Cds => "CDS",
            FeatureType::Other(value) => value,
        }
    }
}

impl From<&str> for FeatureType {
    fn from(value: &str) -> Self {
        match value {
            "gene" => FeatureType::Gene,
            "transcript" => FeatureType::Transcript,
            "exon" => FeatureType::Exon,
            "CDS" => FeatureType::Cds,
            _ => FeatureType::Other(value.to_string()),
        }
    }
}

impl Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The attributes of a feature that are used for annotation.
///
/// Each attribute may carry several values (e.g., an exon shared by several
/// transcripts); an empty list means that the attribute is missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureAttributes {
    /// Versioned gene identifiers, e.g., `ENSG00000115970.14`.
    pub gene_id: Vec<String>,
    pub gene_name: Vec<String>,
    /// Gene biotype, e.g., `protein_coding`.
    pub gene_type: Vec<String>,
    /// Versioned transcript identifiers, e.g., `ENST00000379959.7`.
    pub transcript_id: Vec<String>,
}

impl FeatureAttributes {
    /// Add all values from `other` that are not present yet.
    pub fn merge(&mut self, other: &FeatureAttributes) {
        fn extend_unique(target: &mut Vec<String>, values: &[String]) {
            for value in values {
                if !target.contains(value) {
                    target.push(value.clone());
                }
            }
        }

        extend_unique(&mut self.gene_id, &other.gene_id);
        extend_unique(&mut self.gene_name, &other.gene_name);
        extend_unique(&mut self.gene_type, &other.gene_type);
        extend_unique(&mut self.transcript_id, &other.transcript_id);
    }
}

/// A record from the annotation feature store.
///
/// ```text
/// id         | exon:chr2:9624561-9624679:+
/// featuretype | exon
/// chrom      | chr2
/// start      | 9624561
/// end        | 9624679
/// strand     | +
/// frame      | .
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: String,
    pub featuretype: FeatureType,
    pub chrom: String,
    /// 1-based start position.
    pub start: u64,
    /// 1-based, inclusive end position.
    pub end: u64,
    /// `None` for unstranded features (`.` in GTF).
    pub strand: Option<Strand>,
    /// Reading frame of CDS features.
    pub frame: Option<u8>,
    pub attributes: FeatureAttributes,
}

impl Feature {
    /// Extract the feature's sequence, reverse-complemented on the minus strand.
    pub fn sequence(&self, genome: &dyn GenomeProvider) -> Result<String, Error> {
        let seq = genome.get_seq_part(&self.chrom, self.start - 1, self.end)?;
        Ok(match self.strand {
            Some(Strand::Minus) => revcomp(&seq),
            _ => seq,
        })
    }
}

/// A genomic region with 1-based, inclusive coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    pub fn new(chrom: &str, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.to_string(),
            start,
            end,
        }
    }
}

/// Interface for annotation feature stores, modeled after a `gffutils` database.
pub trait FeatureStore {
    /// Return the feature with the given identifier.
    ///
    /// # Arguments
    ///
    /// * `id` -- feature identifier, e.g., `exon:chr2:9624561-9624679:+`
    ///
    /// # Errors
    ///
    /// `Error::FeatureNotFound` if there is no such feature.
    fn feature(&self, id: &str) -> Result<Feature, Error>;

    /// Return features of the given type, optionally limited to a strand and to
    /// features overlapping a region.  Features are ordered by start position.
    fn features_of_type(
        &self,
        featuretype: &FeatureType,
        strand: Option<Strand>,
        region: Option<&Region>,
    ) -> Result<Vec<Feature>, Error>;

    /// Return the parents of the given type of a feature, e.g., the transcripts
    /// containing an exon.
    fn parents(&self, id: &str, featuretype: &FeatureType) -> Result<Vec<Feature>, Error>;

    /// Return the children of the given type of a feature ordered by start position,
    /// descending if `reverse` is set.
    fn children(
        &self,
        id: &str,
        featuretype: &FeatureType,
        reverse: bool,
    ) -> Result<Vec<Feature>, Error>;
}

/// Interface for genome sequence access.
pub trait GenomeProvider {
    /// Names of all chromosomes (sequences) of the genome.
    fn chromosomes(&self) -> IndexSet<String>;

    /// Whether the genome has a sequence of the given name.
    fn has_chromosome(&self, chrom: &str) -> bool {
        self.chromosomes().contains(chrom)
    }

    /// Return sequence part for the given chromosome.
    ///
    /// # Arguments
    ///
    /// * `chrom` -- chromosome name
    /// * `start` -- 0-based start position
    /// * `end` -- 0-based, exclusive end position
    fn get_seq_part(&self, chrom: &str, start: u64, end: u64) -> Result<String, Error>;
}
