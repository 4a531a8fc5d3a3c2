//! Error type definition.

use thiserror::Error;

/// Error type for data.
#[derive(Error, Debug)]
pub enum Error {
    /// No feature with the given identifier in the store.
    #[error("feature not found: {0}")]
    FeatureNotFound(String),
    #[error("could not open GTF file: {0}")]
    GtfOpen(String),
    #[error("could not read GTF input: {0}")]
    GtfRead(String),
    #[error("invalid GTF record in line {0}: {1}")]
    GtfParse(usize, String),
    #[error("could not open FASTA file {0}: {1}")]
    FastaOpen(String, String),
    #[error("could not read FASTA sequence {0}: {1}")]
    FastaRead(String, String),
    #[error("chromosome not in genome: {0}")]
    UnknownChromosome(String),
    #[error("region {0}:{1}-{2} is outside of the sequence bounds")]
    SequenceOutOfBounds(String, u64, u64),
}
