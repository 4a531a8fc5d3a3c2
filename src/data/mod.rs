//! Data providers: annotation feature stores and genome sequences.

pub mod error;
pub mod fasta;
pub mod gtf;
pub mod interface;
