//! In-memory annotation feature store loaded from GTF files.
//!
//! Features get `gffutils`-style identifiers: genes are keyed by `gene_id`,
//! transcripts by `transcript_id`, and all other features by type and position,
//! e.g., `exon:chr2:9624561-9624679:+` or `CDS:chr2:9624561-9624679:+`.  Exons and
//! CDS records shared between transcripts are merged into one feature with all
//! transcripts as parents.  Transcripts and genes that are only referenced from
//! attributes are inferred, spanning their children.

use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use ahash::AHashMap;
use bio::data_structures::interval_tree::ArrayBackedIntervalTree;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::data::error::Error;
use crate::data::interface::{Feature, FeatureAttributes, FeatureStore, FeatureType, Region};
use crate::parser::Strand;

lazy_static::lazy_static! {
    /// GTF attribute column entries, `key "value";` or `key value;`.
    static ref ATTRIBUTE_RE: Regex =
        Regex::new(r#"([A-Za-z0-9_.]+)\s+(?:"([^"]*)"|([^;\s]+))"#).expect("invalid regex");
}

/// Type alias for interval trees.
type IntervalTree = ArrayBackedIntervalTree<u64, String>;

/// Identifier of a positional feature, e.g., `exon:chr1:100-200:+`.
fn positional_id(
    featuretype: &str,
    chrom: &str,
    start: u64,
    end: u64,
    strand: Option<Strand>,
) -> String {
    let strand = strand.map(|s| s.symbol()).unwrap_or('.');
    format!("{featuretype}:{chrom}:{start}-{end}:{strand}")
}

/// Parse the attribute column into the fixed attribute record.
fn parse_attributes(column: &str) -> FeatureAttributes {
    let mut result = FeatureAttributes::default();
    let mut gene_biotype = Vec::new();
    for caps in ATTRIBUTE_RE.captures_iter(column) {
        let key = &caps[1];
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let target = match key {
            "gene_id" => &mut result.gene_id,
            "gene_name" => &mut result.gene_name,
            "gene_type" => &mut result.gene_type,
            "gene_biotype" => &mut gene_biotype,
            "transcript_id" => &mut result.transcript_id,
            _ => continue,
        };
        if !target.contains(&value) {
            target.push(value);
        }
    }
    // Ensembl GTF files name the gene type `gene_biotype`.
    if result.gene_type.is_empty() {
        result.gene_type = gene_biotype;
    }
    result
}

/// Parse one tab-separated GTF line.
fn parse_line(line_no: usize, line: &str) -> Result<Feature, Error> {
    let fields = line.split('\t').collect::<Vec<_>>();
    if fields.len() != 9 {
        return Err(Error::GtfParse(
            line_no,
            format!("expected 9 columns, found {}", fields.len()),
        ));
    }
    let start = u64::from_str(fields[3])
        .map_err(|_e| Error::GtfParse(line_no, format!("invalid start {:?}", fields[3])))?;
    let end = u64::from_str(fields[4])
        .map_err(|_e| Error::GtfParse(line_no, format!("invalid end {:?}", fields[4])))?;
    if start == 0 || start > end {
        return Err(Error::GtfParse(
            line_no,
            format!("invalid coordinates {start}-{end}"),
        ));
    }
    let strand = fields[6].chars().next().and_then(Strand::from_symbol);
    let frame = match fields[7] {
        "." => None,
        value => Some(
            u8::from_str(value)
                .ok()
                .filter(|frame| *frame < 3)
                .ok_or_else(|| Error::GtfParse(line_no, format!("invalid frame {value:?}")))?,
        ),
    };
    let featuretype = FeatureType::from(fields[2]);
    let attributes = parse_attributes(fields[8]);
    let chrom = fields[0].to_string();

    let id = match &featuretype {
        FeatureType::Gene => attributes.gene_id.first().cloned(),
        FeatureType::Transcript => attributes.transcript_id.first().cloned(),
        _ => None,
    }
    .unwrap_or_else(|| positional_id(featuretype.as_str(), &chrom, start, end, strand));

    Ok(Feature {
        id,
        featuretype,
        chrom,
        start,
        end,
        strand,
        frame,
        attributes,
    })
}

/// Annotation feature store backed by a GTF file.
#[derive(Default)]
pub struct GtfFeatureStore {
    /// Features by identifier, in file order.
    features: IndexMap<String, Feature>,
    /// Parent identifiers for each feature.
    parents: AHashMap<String, IndexSet<String>>,
    /// Child identifiers for each feature.
    children: AHashMap<String, IndexSet<String>>,
    /// Interval tree for each feature type and chromosome.
    interval_trees: AHashMap<(String, String), IntervalTree>,
}

impl GtfFeatureStore {
    /// Load from a GTF file, gzip-compressed if the name ends in `.gz`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        log::debug!("Loading GTF features from {:?}", path);
        let file = std::fs::File::open(path)
            .map_err(|_e| Error::GtfOpen(path.display().to_string()))?;
        if path.extension().map(|ext| ext == "gz").unwrap_or(false) {
            Self::from_reader(std::io::BufReader::new(flate2::read::MultiGzDecoder::new(
                file,
            )))
        } else {
            Self::from_reader(std::io::BufReader::new(file))
        }
    }

    /// Load from GTF text.
    pub fn from_gtf_str(text: &str) -> Result<Self, Error> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let start = Instant::now();
        let mut store = Self::default();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::GtfRead(e.to_string()))?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            store.insert(parse_line(i + 1, line)?);
        }
        store.infer_missing_parents();
        store.build_interval_trees();
        log::debug!(
            "GtfFeatureStore -- #features = {} (loaded in {:?})",
            store.features.len(),
            start.elapsed()
        );
        Ok(store)
    }

    /// Number of features in the store.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn insert(&mut self, feature: Feature) {
        let parent_ids = match feature.featuretype {
            FeatureType::Gene => Vec::new(),
            FeatureType::Transcript => feature.attributes.gene_id.clone(),
            _ => feature.attributes.transcript_id.clone(),
        };
        for parent_id in parent_ids {
            self.link(&parent_id, &feature.id);
        }

        match self.features.get_mut(&feature.id) {
            Some(existing) => existing.attributes.merge(&feature.attributes),
            None => {
                self.features.insert(feature.id.clone(), feature);
            }
        }
    }

    fn link(&mut self, parent_id: &str, child_id: &str) {
        self.parents
            .entry(child_id.to_string())
            .or_default()
            .insert(parent_id.to_string());
        self.children
            .entry(parent_id.to_string())
            .or_default()
            .insert(child_id.to_string());
    }

    /// Add transcripts and genes that are referenced but have no record of their own.
    fn infer_missing_parents(&mut self) {
        for featuretype in [FeatureType::Transcript, FeatureType::Gene] {
            let missing = self
                .children
                .keys()
                .filter(|id| !self.features.contains_key(*id))
                .filter(|id| self.inferred_type(id) == Some(featuretype.clone()))
                .cloned()
                .collect::<Vec<_>>();
            for id in missing {
                if let Some(feature) = self.infer_feature(&id, featuretype.clone()) {
                    log::trace!("inferred {} {}", featuretype, id);
                    let grandparents = match featuretype {
                        FeatureType::Transcript => feature.attributes.gene_id.clone(),
                        _ => Vec::new(),
                    };
                    for grandparent in grandparents {
                        self.link(&grandparent, &id);
                    }
                    self.features.insert(id, feature);
                }
            }
        }
    }

    /// Type of a referenced-only parent, derived from how its children refer to it.
    fn inferred_type(&self, id: &str) -> Option<FeatureType> {
        let child = self.children.get(id)?.iter().find_map(|c| self.features.get(c))?;
        match child.featuretype {
            FeatureType::Transcript => Some(FeatureType::Gene),
            FeatureType::Gene => None,
            _ => Some(FeatureType::Transcript),
        }
    }

    fn infer_feature(&self, id: &str, featuretype: FeatureType) -> Option<Feature> {
        let children = self
            .children
            .get(id)?
            .iter()
            .filter_map(|c| self.features.get(c))
            .collect::<Vec<_>>();
        let first = children.first()?;
        let mut attributes = FeatureAttributes::default();
        for child in &children {
            attributes.merge(&child.attributes);
        }
        if featuretype == FeatureType::Gene {
            attributes.transcript_id.clear();
            attributes.gene_id = vec![id.to_string()];
        } else {
            attributes.transcript_id = vec![id.to_string()];
        }
        Some(Feature {
            id: id.to_string(),
            featuretype,
            chrom: first.chrom.clone(),
            start: children.iter().map(|c| c.start).min()?,
            end: children.iter().map(|c| c.end).max()?,
            strand: first.strand,
            frame: None,
            attributes,
        })
    }

    fn build_interval_trees(&mut self) {
        let start = Instant::now();
        log::debug!("Building interval trees...");

        let mut result: AHashMap<(String, String), IntervalTree> = AHashMap::new();
        for feature in self.features.values() {
            let key = (
                feature.featuretype.as_str().to_string(),
                feature.chrom.clone(),
            );
            result
                .entry(key)
                .or_insert_with(IntervalTree::new)
                .insert((feature.start - 1)..feature.end, feature.id.clone());
        }
        for tree in result.values_mut() {
            tree.index();
        }
        self.interval_trees = result;

        log::debug!("Built interval trees in {:?}", start.elapsed());
    }

    fn lookup_all(&self, ids: impl Iterator<Item = String>) -> Vec<Feature> {
        ids.filter_map(|id| self.features.get(&id).cloned()).collect()
    }
}

impl FeatureStore for GtfFeatureStore {
    fn feature(&self, id: &str) -> Result<Feature, Error> {
        self.features
            .get(id)
            .cloned()
            .ok_or_else(|| Error::FeatureNotFound(id.to_string()))
    }

    fn features_of_type(
        &self,
        featuretype: &FeatureType,
        strand: Option<Strand>,
        region: Option<&Region>,
    ) -> Result<Vec<Feature>, Error> {
        let mut result = match region {
            Some(region) => {
                let key = (featuretype.as_str().to_string(), region.chrom.clone());
                match self.interval_trees.get(&key) {
                    Some(tree) => self.lookup_all(
                        tree.find((region.start.saturating_sub(1))..region.end)
                            .into_iter()
                            .map(|entry| entry.data().clone()),
                    ),
                    None => Vec::new(),
                }
            }
            None => self
                .features
                .values()
                .filter(|feature| &feature.featuretype == featuretype)
                .cloned()
                .collect(),
        };
        if let Some(strand) = strand {
            result.retain(|feature| feature.strand == Some(strand));
        }
        result.sort_by(|a, b| (&a.chrom, a.start, &a.id).cmp(&(&b.chrom, b.start, &b.id)));
        Ok(result)
    }

    fn parents(&self, id: &str, featuretype: &FeatureType) -> Result<Vec<Feature>, Error> {
        if !self.features.contains_key(id) {
            return Err(Error::FeatureNotFound(id.to_string()));
        }
        let mut result = Vec::new();
        let mut frontier = vec![id.to_string()];
        let mut seen = IndexSet::new();
        // walk up, e.g., from an exon to its genes
        while let Some(current) = frontier.pop() {
            for parent_id in self.parents.get(&current).into_iter().flatten() {
                if !seen.insert(parent_id.clone()) {
                    continue;
                }
                if let Some(parent) = self.features.get(parent_id) {
                    if &parent.featuretype == featuretype {
                        result.push(parent.clone());
                    }
                }
                frontier.push(parent_id.clone());
            }
        }
        Ok(result)
    }

    fn children(
        &self,
        id: &str,
        featuretype: &FeatureType,
        reverse: bool,
    ) -> Result<Vec<Feature>, Error> {
        if !self.features.contains_key(id) {
            return Err(Error::FeatureNotFound(id.to_string()));
        }
        let mut result = self
            .lookup_all(self.children.get(id).into_iter().flatten().cloned())
            .into_iter()
            .filter(|feature| &feature.featuretype == featuretype)
            .collect::<Vec<_>>();
        result.sort_by_key(|feature| feature.start);
        if reverse {
            result.reverse();
        }
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    fn ids(features: &[Feature]) -> Vec<&str> {
        features.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn attributes_gencode_and_ensembl() {
        let attrs = parse_attributes(concat!(
            r#"gene_id "ENSG1.2"; transcript_id "ENST1.1"; gene_type "protein_coding"; "#,
            r#"gene_name "ABC"; exon_number 2;"#,
        ));
        assert_eq!(attrs.gene_id, vec!["ENSG1.2"]);
        assert_eq!(attrs.transcript_id, vec!["ENST1.1"]);
        assert_eq!(attrs.gene_type, vec!["protein_coding"]);
        assert_eq!(attrs.gene_name, vec!["ABC"]);

        let attrs = parse_attributes(r#"gene_id "ENSG1"; gene_biotype "lincRNA";"#);
        assert_eq!(attrs.gene_type, vec!["lincRNA"]);
    }

    #[test]
    fn parse_line_errors() {
        assert!(matches!(
            parse_line(3, "chr1\tsrc\texon\t100"),
            Err(Error::GtfParse(3, _))
        ));
        assert!(matches!(
            parse_line(1, "chr1\tsrc\texon\t200\t100\t.\t+\t.\tgene_id \"G\";"),
            Err(Error::GtfParse(1, _))
        ));
        assert!(matches!(
            parse_line(1, "chr1\tsrc\tCDS\t100\t200\t.\t+\t4\tgene_id \"G\";"),
            Err(Error::GtfParse(1, _))
        ));
    }

    #[test]
    fn load_fixture() -> Result<(), Error> {
        let store = GtfFeatureStore::from_path("tests/data/annotation.gtf")?;
        assert!(!store.is_empty());

        let exon = store.feature("exon:chr1:21-30:+")?;
        assert_eq!(exon.featuretype, FeatureType::Exon);
        assert_eq!(exon.attributes.gene_id, vec!["ENSG0001.1"]);
        // shared by all transcripts of the gene
        assert_eq!(
            exon.attributes.transcript_id,
            vec!["ENST0001.1", "ENST0002.1"]
        );
        assert!(matches!(
            store.feature("exon:chr1:1-2:+"),
            Err(Error::FeatureNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn load_gzip_fixture() -> Result<(), Error> {
        let plain = GtfFeatureStore::from_path("tests/data/annotation.gtf")?;
        let gzip = GtfFeatureStore::from_path("tests/data/annotation.gtf.gz")?;
        assert_eq!(plain.len(), gzip.len());

        Ok(())
    }

    #[test]
    fn parents_and_children() -> Result<(), Error> {
        let store = GtfFeatureStore::from_path("tests/data/annotation.gtf")?;

        let transcripts = store.parents("exon:chr1:51-60:+", &FeatureType::Transcript)?;
        assert_eq!(ids(&transcripts), vec!["ENST0001.1"]);
        let genes = store.parents("exon:chr1:51-60:+", &FeatureType::Gene)?;
        assert_eq!(ids(&genes), vec!["ENSG0001.1"]);

        let cds = store.children("ENST0001.1", &FeatureType::Cds, false)?;
        assert_eq!(
            ids(&cds),
            vec!["CDS:chr1:21-30:+", "CDS:chr1:51-60:+", "CDS:chr1:81-90:+"]
        );
        let cds = store.children("ENST0001.1", &FeatureType::Cds, true)?;
        assert_eq!(ids(&cds)[0], "CDS:chr1:81-90:+");

        assert!(store.children("nonexisting", &FeatureType::Cds, false).is_err());

        Ok(())
    }

    #[test]
    fn overlap_queries() -> Result<(), Error> {
        let store = GtfFeatureStore::from_path("tests/data/annotation.gtf")?;

        let region = Region::new("chr1", 55, 56);
        let transcripts =
            store.features_of_type(&FeatureType::Transcript, Some(Strand::Plus), Some(&region))?;
        assert_eq!(ids(&transcripts), vec!["ENST0001.1", "ENST0002.1"]);

        let transcripts =
            store.features_of_type(&FeatureType::Transcript, Some(Strand::Minus), Some(&region))?;
        assert!(transcripts.is_empty());

        let region = Region::new("chrUn", 1, 100);
        assert!(store
            .features_of_type(&FeatureType::Transcript, None, Some(&region))?
            .is_empty());

        Ok(())
    }

    #[test]
    fn infers_missing_transcripts_and_genes() -> Result<(), Error> {
        let attributes = r#"gene_id "G1"; transcript_id "T1"; gene_name "GENE1";"#;
        let gtf = format!(
            "chr3\tsrc\texon\t10\t20\t.\t-\t.\t{attributes}\n\
             chr3\tsrc\texon\t40\t50\t.\t-\t.\t{attributes}\n"
        );
        let store = GtfFeatureStore::from_gtf_str(&gtf)?;

        let transcript = store.feature("T1")?;
        assert_eq!(transcript.featuretype, FeatureType::Transcript);
        assert_eq!((transcript.start, transcript.end), (10, 50));
        assert_eq!(transcript.strand, Some(Strand::Minus));
        assert_eq!(transcript.attributes.gene_name, vec!["GENE1"]);

        let gene = store.feature("G1")?;
        assert_eq!(gene.featuretype, FeatureType::Gene);
        assert_eq!(ids(&store.parents("T1", &FeatureType::Gene)?), vec!["G1"]);

        Ok(())
    }
}
