pub mod annotator;
pub mod data;
pub mod interval;
pub mod isoform;
pub mod lookup;
pub mod mapping;
pub mod parser;
pub mod sashimi;
pub mod sequences;
