//! Genome sequence access from FASTA files.

use std::cell::RefCell;
use std::fs::File;
use std::path::Path;

use bio::io::fasta;
use indexmap::{IndexMap, IndexSet};

use crate::data::error::Error;
use crate::data::interface::GenomeProvider;

/// Check that `start..end` is a valid range in a sequence of length `len`.
fn check_bounds(chrom: &str, start: u64, end: u64, len: u64) -> Result<(), Error> {
    if start > end || end > len {
        Err(Error::SequenceOutOfBounds(chrom.to_string(), start, end))
    } else {
        Ok(())
    }
}

/// Genome provider for a `samtools faidx`-indexed FASTA file.
///
/// The index is expected next to the FASTA file, with a `.fai` suffix appended.
pub struct IndexedFasta {
    path: String,
    /// Chromosome lengths in index order.
    lengths: IndexMap<String, u64>,
    reader: RefCell<fasta::IndexedReader<File>>,
}

impl IndexedFasta {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        log::debug!("Opening indexed FASTA file {:?}", path);
        let reader = fasta::IndexedReader::from_file(&path)
            .map_err(|e| Error::FastaOpen(path_str.clone(), e.to_string()))?;
        let lengths = reader
            .index
            .sequences()
            .into_iter()
            .map(|seq| (seq.name, seq.len))
            .collect::<IndexMap<_, _>>();
        log::debug!("FASTA index of {} lists {} sequences", path_str, lengths.len());

        Ok(Self {
            path: path_str,
            lengths,
            reader: RefCell::new(reader),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl GenomeProvider for IndexedFasta {
    fn chromosomes(&self) -> IndexSet<String> {
        self.lengths.keys().cloned().collect()
    }

    fn has_chromosome(&self, chrom: &str) -> bool {
        self.lengths.contains_key(chrom)
    }

    fn get_seq_part(&self, chrom: &str, start: u64, end: u64) -> Result<String, Error> {
        let len = *self
            .lengths
            .get(chrom)
            .ok_or_else(|| Error::UnknownChromosome(chrom.to_string()))?;
        check_bounds(chrom, start, end, len)?;

        let mut reader = self.reader.borrow_mut();
        let mut seq = Vec::with_capacity((end - start) as usize);
        reader
            .fetch(chrom, start, end)
            .map_err(|e| Error::FastaRead(chrom.to_string(), e.to_string()))?;
        reader
            .read(&mut seq)
            .map_err(|e| Error::FastaRead(chrom.to_string(), e.to_string()))?;
        String::from_utf8(seq).map_err(|e| Error::FastaRead(chrom.to_string(), e.to_string()))
    }
}

/// Genome provider holding all sequences in memory.
///
/// Useful for small genomes and for tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryGenome {
    sequences: IndexMap<String, String>,
}

impl InMemoryGenome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all records of a (non-indexed) FASTA file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let reader = fasta::Reader::from_file(path)
            .map_err(|e| Error::FastaOpen(path.display().to_string(), e.to_string()))?;
        let mut genome = Self::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| Error::FastaRead(path.display().to_string(), e.to_string()))?;
            let seq = String::from_utf8(record.seq().to_vec())
                .map_err(|e| Error::FastaRead(record.id().to_string(), e.to_string()))?;
            genome.insert(record.id(), &seq);
        }
        Ok(genome)
    }

    pub fn insert(&mut self, chrom: &str, seq: &str) {
        self.sequences.insert(chrom.to_string(), seq.to_string());
    }
}

impl FromIterator<(String, String)> for InMemoryGenome {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            sequences: iter.into_iter().collect(),
        }
    }
}

impl GenomeProvider for InMemoryGenome {
    fn chromosomes(&self) -> IndexSet<String> {
        self.sequences.keys().cloned().collect()
    }

    fn has_chromosome(&self, chrom: &str) -> bool {
        self.sequences.contains_key(chrom)
    }

    fn get_seq_part(&self, chrom: &str, start: u64, end: u64) -> Result<String, Error> {
        let seq = self
            .sequences
            .get(chrom)
            .ok_or_else(|| Error::UnknownChromosome(chrom.to_string()))?;
        check_bounds(chrom, start, end, seq.len() as u64)?;
        Ok(seq[(start as usize)..(end as usize)].to_string())
    }
}
