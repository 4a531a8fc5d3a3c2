//! Error type definition.

use thiserror::Error;

/// Error type for parsing of splicing event identifiers.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    /// The identifier (or one of its exon fields) does not follow the grammar.
    #[error("{0} is not a valid event identifier: {1}")]
    MalformedIdentifier(String, String),
    #[error("{0} is not a valid BED sequence name")]
    MalformedSequenceName(String),
    #[error("unsupported splice type: {0} (expected SE or MXE)")]
    UnknownSpliceType(String),
}
