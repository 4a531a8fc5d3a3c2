//! Annotation of a batch of splicing events of one splice type.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};

use crate::data::error::Error as DataError;
use crate::data::interface::{Feature, FeatureStore, FeatureType, GenomeProvider};
use crate::interval::{self, IntervalSet, SequenceRecord};
use crate::isoform::{exclusive_isoforms, splice_type_exons, IsoformPair};
use crate::mapping::{self, MappingTables};
use crate::parser::{EventId, SpliceType, Strand};
use crate::sequences::{translate_in_frame, TranslationTable};

pub use crate::annotator::error::Error;

mod error {
    use thiserror::Error;

    /// Error type for the splice annotator.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("invalid event identifier: {0}")]
        Parser(#[from] crate::parser::Error),
        #[error("interval construction failed: {0}")]
        Interval(#[from] crate::interval::Error),
        #[error("isoform resolution failed: {0}")]
        Isoform(#[from] crate::isoform::Error),
        #[error("data access failed: {0}")]
        Data(#[from] crate::data::error::Error),
        #[error("mapping tables failed: {0}")]
        Mapping(#[from] crate::mapping::Error),
        #[error("translation failed: {0}")]
        Translation(#[from] crate::sequences::Error),
        #[error("a genome is required to extract sequences")]
        NoGenome,
    }
}

/// Configuration for the `SpliceAnnotator`.
#[derive(Debug, Clone)]
pub struct Config {
    /// BED score of exon and intron intervals.
    pub score: u32,
    /// Number of events between progress messages when converting, `0` for none.
    pub progress_every: usize,
    /// Skip malformed identifiers instead of failing.
    pub skip_malformed: bool,
    pub translation_table: TranslationTable,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            score: interval::DEFAULT_SCORE,
            progress_every: mapping::DEFAULT_PROGRESS_EVERY,
            skip_malformed: false,
            translation_table: TranslationTable::Standard,
        }
    }
}

/// Counts of identifiers removed when setting up the annotator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Identifiers on chromosomes missing from the genome.
    pub removed_unknown_chromosome: usize,
    /// Identifiers that could not be parsed, with `Config::skip_malformed`.
    pub removed_malformed: usize,
}

/// Translation outcome of one transcript of an isoform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Protein(String),
    /// The transcript's coding exons do not match the isoform.
    NoTranslation,
}

/// A protein sequence named `<event>_isoform<n>_<transcript>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinRecord {
    pub name: String,
    pub seq: String,
}

/// Protein translations of all events' isoforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoformTranslations {
    /// Distinct proteins of each isoform.
    pub records: IsoformPair<Vec<ProteinRecord>>,
    /// Translations of each isoform by transcript.
    pub by_transcript: IsoformPair<IndexMap<String, Vec<Translation>>>,
}

impl Default for IsoformTranslations {
    fn default() -> Self {
        Self {
            records: IsoformPair {
                isoform1: Vec::new(),
                isoform2: Vec::new(),
            },
            by_transcript: IsoformPair {
                isoform1: IndexMap::new(),
                isoform2: IndexMap::new(),
            },
        }
    }
}

impl IsoformTranslations {
    fn add(&mut self, isoform: usize, transcript: &str, name: String, translation: Translation) {
        let (records, by_transcript) = match isoform {
            1 => (&mut self.records.isoform1, &mut self.by_transcript.isoform1),
            _ => (&mut self.records.isoform2, &mut self.by_transcript.isoform2),
        };
        if let Translation::Protein(seq) = &translation {
            if !records.iter().any(|record| &record.seq == seq) {
                records.push(ProteinRecord {
                    name,
                    seq: seq.clone(),
                });
            }
        }
        by_transcript
            .entry(transcript.to_string())
            .or_default()
            .push(translation);
    }
}

/// Annotates the events of one splice type.
///
/// Identifiers on chromosomes missing from the genome are dropped on construction, so
/// that events, intervals, and sequences line up.
pub struct SpliceAnnotator<'a> {
    splice_type: SpliceType,
    events: Vec<EventId>,
    exon_intervals: Vec<IntervalSet>,
    intron_intervals: Vec<IntervalSet>,
    genome: Option<&'a dyn GenomeProvider>,
    config: Config,
    diagnostics: Diagnostics,
}

impl<'a> SpliceAnnotator<'a> {
    /// Parse the identifiers and build exon and intron intervals.
    ///
    /// # Arguments
    ///
    /// * `ids` -- event identifiers, e.g., `chr1:100:200:+@chr1:300:400:+@chr1:500:600:+`
    /// * `splice_type` -- type of all events
    /// * `genome` -- genome for filtering identifiers and extracting sequences
    /// * `config` -- annotator configuration
    pub fn new<S: AsRef<str>>(
        ids: &[S],
        splice_type: SpliceType,
        genome: Option<&'a dyn GenomeProvider>,
        config: Config,
    ) -> Result<Self, Error> {
        let mut diagnostics = Diagnostics::default();

        let ids = match genome {
            Some(genome) => {
                let chromosomes = genome.chromosomes();
                let (kept, removed): (Vec<&str>, Vec<&str>) = ids
                    .iter()
                    .map(|id| id.as_ref())
                    .partition(|id| chromosomes.contains(id.split(':').next().unwrap_or("")));
                if !removed.is_empty() {
                    log::warn!(
                        "Removing {} event ids whose chromosomes are not in the genome",
                        removed.len()
                    );
                }
                diagnostics.removed_unknown_chromosome = removed.len();
                kept
            }
            None => ids.iter().map(|id| id.as_ref()).collect(),
        };

        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            match EventId::parse(id, splice_type) {
                Ok(event) => events.push(event),
                Err(e) if config.skip_malformed => {
                    log::warn!("Skipping event id: {}", e);
                    diagnostics.removed_malformed += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let n_exons = splice_type.n_exons();
        let exon_intervals = interval::all_exon_intervals(&events, n_exons, config.score)?;
        let intron_intervals = (1..n_exons)
            .map(|k| interval::intron_intervals(&events, k, config.score))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "Set up {} {} events ({:?})",
            events.len(),
            splice_type,
            diagnostics
        );

        Ok(Self {
            splice_type,
            events,
            exon_intervals,
            intron_intervals,
            genome,
            config,
            diagnostics,
        })
    }

    pub fn splice_type(&self) -> SpliceType {
        self.splice_type
    }

    pub fn events(&self) -> &[EventId] {
        &self.events
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Exon intervals, one set per exon position.
    pub fn exon_intervals(&self) -> &[IntervalSet] {
        &self.exon_intervals
    }

    /// Intron intervals, one set per intron position.
    pub fn intron_intervals(&self) -> &[IntervalSet] {
        &self.intron_intervals
    }

    fn genome(&self) -> Result<&'a dyn GenomeProvider, Error> {
        self.genome.ok_or(Error::NoGenome)
    }

    /// Exon sequences, one list per exon position.
    pub fn exon_sequences(&self) -> Result<Vec<Vec<SequenceRecord>>, Error> {
        let genome = self.genome()?;
        Ok(self
            .exon_intervals
            .iter()
            .map(|set| set.sequences(genome))
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Intron sequences, one list per intron position.
    pub fn intron_sequences(&self) -> Result<Vec<Vec<SequenceRecord>>, Error> {
        let genome = self.genome()?;
        Ok(self
            .intron_intervals
            .iter()
            .map(|set| set.sequences(genome))
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Write the mapping tables of the events into `out_dir`.
    pub fn convert(
        &self,
        store: &dyn FeatureStore,
        out_dir: &Path,
    ) -> Result<MappingTables, Error> {
        Ok(mapping::convert_events(
            store,
            &self.events,
            self.splice_type.name(),
            out_dir,
            self.config.progress_every,
        )?)
    }

    /// Translate the coding sequences of the transcripts supporting each isoform.
    ///
    /// A transcript is translated when the CDS of the isoform's exons are consecutive
    /// coding exons of the transcript; its complete coding sequence is translated from
    /// the frame of its first CDS.  Events with exons missing from the store are skipped.
    pub fn isoform_translations(
        &self,
        store: &dyn FeatureStore,
    ) -> Result<IsoformTranslations, Error> {
        let genome = self.genome()?;
        let mut result = IsoformTranslations::default();

        for event in &self.events {
            let Some(candidates) = exon_transcripts(store, event)? else {
                log::debug!("Skipping translation of {}, exons not annotated", event.name);
                continue;
            };
            let transcripts = exclusive_isoforms(self.splice_type, &candidates)?;
            let cds_ids = event
                .exons
                .iter()
                .map(|exon| exon.cds_id())
                .collect::<Vec<_>>();
            let cds_ids = splice_type_exons(self.splice_type, &cds_ids)?;
            let reverse = event.strand() == Some(Strand::Minus);

            for ((isoform, transcripts), (_, cds_isoform)) in transcripts
                .numbered()
                .into_iter()
                .zip(cds_ids.numbered().into_iter())
            {
                for transcript in transcripts {
                    let name = format!("{}_isoform{}_{}", event.name, isoform, transcript);
                    let cds = store.children(transcript, &FeatureType::Cds, reverse)?;
                    let translation = if cds_match_isoform(&cds, cds_isoform) {
                        Translation::Protein(self.translate(&cds, genome)?)
                    } else {
                        Translation::NoTranslation
                    };
                    result.add(isoform, transcript, name, translation);
                }
            }
        }

        Ok(result)
    }

    fn translate(&self, cds: &[Feature], genome: &dyn GenomeProvider) -> Result<String, Error> {
        let frame = cds.first().and_then(|c| c.frame).unwrap_or(0);
        let seq = cds
            .iter()
            .map(|c| c.sequence(genome))
            .collect::<Result<String, _>>()?;
        Ok(translate_in_frame(&seq, frame, self.config.translation_table)?)
    }
}

/// Transcripts containing each exon of the event, `None` if an exon is not in the store.
fn exon_transcripts(
    store: &dyn FeatureStore,
    event: &EventId,
) -> Result<Option<Vec<IndexSet<String>>>, Error> {
    let mut result = Vec::with_capacity(event.exons.len());
    for exon_id in event.exon_ids() {
        match store.parents(&exon_id, &FeatureType::Transcript) {
            Ok(transcripts) => result.push(transcripts.into_iter().map(|t| t.id).collect()),
            Err(DataError::FeatureNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Some(result))
}

/// Whether all CDS of the isoform occur as consecutive coding exons.
fn cds_match_isoform(cds: &[Feature], cds_isoform: &[String]) -> bool {
    let positions = cds
        .iter()
        .enumerate()
        .filter(|(_, c)| cds_isoform.contains(&c.id))
        .map(|(i, _)| i)
        .collect::<Vec<_>>();
    positions.len() == cds_isoform.len() && positions.windows(2).all(|w| w[0] + 1 == w[1])
}
