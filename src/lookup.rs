//! Annotation of splicing events with gene and transcript attributes.

use std::fmt::Display;

use enum_map::{Enum, EnumMap};
use indexmap::IndexSet;

use crate::data::error::Error as DataError;
use crate::data::interface::{Feature, FeatureStore, FeatureType, Region};
use crate::parser::{EventId, ExonSpec};

pub use crate::lookup::error::Error;

mod error {
    use thiserror::Error;

    /// Error type for event annotation.
    #[derive(Error, Debug)]
    pub enum Error {
        /// No gene found for any exon of the event.
        #[error("no annotation found for event {0}")]
        NoAnnotationFound(String),
        #[error("feature store query failed: {0}")]
        Data(#[from] crate::data::error::Error),
    }
}

/// The attributes collected for each event.
#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Versioned gene identifier, e.g., `ENSG00000115970.14`.
    GencodeGene,
    /// Gene identifier without version, e.g., `ENSG00000115970`.
    EnsemblGene,
    GeneName,
    GeneType,
    GencodeTranscript,
    EnsemblTranscript,
}

impl AttributeKind {
    /// All kinds, in output order.
    pub const ALL: [AttributeKind; 6] = [
        AttributeKind::GencodeGene,
        AttributeKind::EnsemblGene,
        AttributeKind::GeneName,
        AttributeKind::GeneType,
        AttributeKind::GencodeTranscript,
        AttributeKind::EnsemblTranscript,
    ];

    /// Name as used in output file names and headers.
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::GencodeGene => "gencode_gene",
            AttributeKind::EnsemblGene => "ensembl_gene",
            AttributeKind::GeneName => "gene_name",
            AttributeKind::GeneType => "gene_type",
            AttributeKind::GencodeTranscript => "gencode_transcript",
            AttributeKind::EnsemblTranscript => "ensembl_transcript",
        }
    }

    /// Whether value-to-events tables are written for this kind.
    pub fn is_invertible(&self) -> bool {
        matches!(
            self,
            AttributeKind::EnsemblGene | AttributeKind::GeneName | AttributeKind::GencodeGene
        )
    }
}

impl Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Strip the version suffix of an identifier, `ENSG00000115970.14` becomes
/// `ENSG00000115970`.
pub fn strip_version(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}

/// Attribute values collected for one event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventAnnotation {
    values: EnumMap<AttributeKind, IndexSet<String>>,
}

impl EventAnnotation {
    pub fn get(&self, kind: AttributeKind) -> &IndexSet<String> {
        &self.values[kind]
    }

    /// Values of the kind joined by commas.
    pub fn joined(&self, kind: AttributeKind) -> String {
        self.values[kind]
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether any gene was found.
    pub fn has_genes(&self) -> bool {
        !self.values[AttributeKind::GencodeGene].is_empty()
    }

    /// Add the attributes of a feature.
    pub fn add_feature(&mut self, feature: &Feature) {
        let attrs = &feature.attributes;
        for gene_id in &attrs.gene_id {
            self.insert(AttributeKind::GencodeGene, gene_id);
            self.insert(AttributeKind::EnsemblGene, strip_version(gene_id));
        }
        for gene_name in &attrs.gene_name {
            self.insert(AttributeKind::GeneName, gene_name);
        }
        for gene_type in &attrs.gene_type {
            self.insert(AttributeKind::GeneType, gene_type);
        }
        for transcript_id in &attrs.transcript_id {
            self.insert(AttributeKind::GencodeTranscript, transcript_id);
            self.insert(AttributeKind::EnsemblTranscript, strip_version(transcript_id));
        }
    }

    fn insert(&mut self, kind: AttributeKind, value: &str) {
        if !self.values[kind].contains(value) {
            self.values[kind].insert(value.to_string());
        }
    }
}

/// Transcripts on the exon's strand overlapping its span.
pub fn overlapping_transcripts(
    store: &dyn FeatureStore,
    exon: &ExonSpec,
) -> Result<Vec<Feature>, DataError> {
    let (start, end) = exon.bounds();
    let region = Region::new(&exon.chrom, start, end);
    store.features_of_type(&FeatureType::Transcript, Some(exon.strand), Some(&region))
}

/// Collect the gene and transcript attributes of all exons of an event.
///
/// Exons missing from the store are represented by the transcripts overlapping them,
/// and skipped if there are none.
///
/// # Errors
///
/// `Error::NoAnnotationFound` if no gene could be found for any of the exons.
pub fn annotate_event(store: &dyn FeatureStore, event: &EventId) -> Result<EventAnnotation, Error> {
    let mut annotation = EventAnnotation::default();
    for exon in &event.exons {
        match store.feature(&exon.exon_id()) {
            Ok(feature) => annotation.add_feature(&feature),
            Err(DataError::FeatureNotFound(id)) => {
                let transcripts = overlapping_transcripts(store, exon)?;
                if transcripts.is_empty() {
                    log::debug!("{} is not annotated and overlaps no transcript", id);
                }
                for transcript in &transcripts {
                    annotation.add_feature(transcript);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    if annotation.has_genes() {
        Ok(annotation)
    } else {
        Err(Error::NoAnnotationFound(event.name.clone()))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::data::gtf::GtfFeatureStore;
    use crate::parser::SpliceType;

    fn values(annotation: &EventAnnotation, kind: AttributeKind) -> Vec<&str> {
        annotation.get(kind).iter().map(String::as_str).collect()
    }

    #[test]
    fn strip_version_examples() {
        assert_eq!(strip_version("ENSG00000115970.14"), "ENSG00000115970");
        assert_eq!(strip_version("ENSG00000115970"), "ENSG00000115970");
        assert_eq!(strip_version(""), "");
    }

    #[test]
    fn kind_names() {
        assert_eq!(
            AttributeKind::ALL.iter().map(|k| k.name()).collect::<Vec<_>>(),
            vec![
                "gencode_gene",
                "ensembl_gene",
                "gene_name",
                "gene_type",
                "gencode_transcript",
                "ensembl_transcript"
            ]
        );
        assert_eq!(
            AttributeKind::ALL
                .iter()
                .filter(|k| k.is_invertible())
                .count(),
            3
        );
    }

    #[test]
    fn annotate_exact_exons() -> Result<(), Error> {
        let store = GtfFeatureStore::from_path("tests/data/annotation.gtf")?;
        let event = EventId::parse(
            "chr1:21:30:+@chr1:51:60:+@chr1:81:90:+",
            SpliceType::SkippedExon,
        )
        .unwrap();
        let annotation = annotate_event(&store, &event)?;

        assert_eq!(values(&annotation, AttributeKind::GencodeGene), vec!["ENSG0001.1"]);
        assert_eq!(values(&annotation, AttributeKind::EnsemblGene), vec!["ENSG0001"]);
        assert_eq!(values(&annotation, AttributeKind::GeneName), vec!["GENEA"]);
        assert_eq!(values(&annotation, AttributeKind::GeneType), vec!["protein_coding"]);
        assert_eq!(
            annotation.joined(AttributeKind::GencodeTranscript),
            "ENST0001.1,ENST0002.1"
        );
        assert_eq!(
            annotation.joined(AttributeKind::EnsemblTranscript),
            "ENST0001,ENST0002"
        );

        Ok(())
    }

    #[test]
    fn annotate_overlap_fallback() -> Result<(), Error> {
        let store = GtfFeatureStore::from_path("tests/data/annotation.gtf")?;
        // first exon unknown to the store, minus-strand event written with start > end
        let event = EventId::parse(
            "chr2:108:102:-@chr2:71:80:-@chr2:125:128:-",
            SpliceType::SkippedExon,
        )
        .unwrap();
        let annotation = annotate_event(&store, &event)?;

        assert_eq!(values(&annotation, AttributeKind::GeneName), vec!["GENEB"]);
        assert_eq!(
            values(&annotation, AttributeKind::GencodeTranscript),
            vec!["ENST0003.1", "ENST0004.1"]
        );

        Ok(())
    }

    #[test]
    fn annotate_unknown() -> Result<(), anyhow::Error> {
        let store = GtfFeatureStore::from_path("tests/data/annotation.gtf")?;
        let event = EventId::parse(
            "chr1:111:112:+@chr1:115:116:+@chr1:120:121:+",
            SpliceType::SkippedExon,
        )?;

        assert!(matches!(
            annotate_event(&store, &event),
            Err(Error::NoAnnotationFound(name)) if name == event.name
        ));
        // wrong strand does not overlap either
        let event = EventId::parse(
            "chr1:22:29:-@chr1:52:59:-@chr1:82:89:-",
            SpliceType::SkippedExon,
        )?;
        assert!(matches!(
            annotate_event(&store, &event),
            Err(Error::NoAnnotationFound(_))
        ));

        Ok(())
    }
}
