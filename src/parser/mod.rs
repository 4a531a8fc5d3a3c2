//! Parsing of MISO-style splicing event identifiers.
//!
//! An identifier lists the exons of an event separated by `@`, each exon written as
//! `chrom:start:end:strand` (or `chrom:start-end:strand` for retained introns).  Any
//! coordinate may list alternatives separated by `|`, of which the first is used.
//!
//! ```
//! use splice_annotator::parser::{EventId, SpliceType};
//!
//! let event = EventId::parse(
//!     "chr2:9624561:9624679|9624700:+@chr2:9627585:9627676:+@chr2:9628276:9628591:+",
//!     SpliceType::SkippedExon,
//! ).unwrap();
//! assert_eq!(event.exons[0].end, 9624679);
//! ```

mod display;
mod ds;
mod error;
mod impl_parse;

pub use crate::parser::ds::*;
pub use crate::parser::error::Error;
pub use crate::parser::impl_parse::{
    exon_ids, seq_name_to_exon_id, ALTERNATIVE_SEPARATOR, EXON_SEPARATOR,
};
