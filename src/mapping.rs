//! Tables mapping events to gene and transcript attributes, and back.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use enum_map::EnumMap;
use indexmap::IndexMap;

use crate::data::interface::FeatureStore;
use crate::lookup::{self, annotate_event, AttributeKind, EventAnnotation};
use crate::parser::EventId;

pub use crate::mapping::error::Error;

mod error {
    use thiserror::Error;

    /// Error type for building and writing mapping tables.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("could not write {path}: {source}")]
        Io {
            path: String,
            #[source]
            source: std::io::Error,
        },
        #[error("feature store query failed: {0}")]
        Data(#[from] crate::data::error::Error),
    }
}

/// Value written for events without any gene.
pub const UNKNOWN: &str = "unknown";

/// Default number of events between progress messages.
pub const DEFAULT_PROGRESS_EVERY: usize = 100;

/// Path of the event-to-values table, `<out_dir>/miso_<type>_to_<kind>.tsv`.
pub fn forward_path(out_dir: &Path, event_type: &str, kind: AttributeKind) -> PathBuf {
    out_dir.join(format!(
        "miso_{}_to_{}.tsv",
        event_type.to_lowercase(),
        kind.name()
    ))
}

/// Path of the value-to-events table, `<out_dir>/<kind>_to_miso_<type>.tsv`.
pub fn inverse_path(out_dir: &Path, event_type: &str, kind: AttributeKind) -> PathBuf {
    out_dir.join(format!(
        "{}_to_miso_{}.tsv",
        kind.name(),
        event_type.to_lowercase()
    ))
}

/// Event-to-attribute tables and their inverses.
#[derive(Debug, Default)]
pub struct MappingTables {
    /// Comma-joined values per event, `None` for events without genes.
    forward: EnumMap<AttributeKind, IndexMap<String, Option<String>>>,
    /// Events per value, for invertible kinds only.
    inverse: EnumMap<AttributeKind, IndexMap<String, Vec<String>>>,
}

impl MappingTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the annotation of an event, `None` if no gene was found.
    pub fn add(&mut self, event: &str, annotation: Option<&EventAnnotation>) {
        for kind in AttributeKind::ALL {
            let value = annotation.map(|annotation| annotation.joined(kind));
            self.forward[kind].insert(event.to_string(), value);
        }
        let Some(annotation) = annotation else {
            return;
        };
        for kind in AttributeKind::ALL.into_iter().filter(|k| k.is_invertible()) {
            for value in annotation.get(kind) {
                self.inverse[kind]
                    .entry(value.clone())
                    .or_default()
                    .push(event.to_string());
            }
        }
    }

    /// Number of events recorded.
    pub fn len(&self) -> usize {
        self.forward[AttributeKind::GencodeGene].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn forward(&self, kind: AttributeKind) -> &IndexMap<String, Option<String>> {
        &self.forward[kind]
    }

    pub fn inverse(&self, kind: AttributeKind) -> &IndexMap<String, Vec<String>> {
        &self.inverse[kind]
    }

    /// Write all tables into `out_dir` and return the written paths.
    pub fn write(&self, out_dir: &Path, event_type: &str) -> Result<Vec<PathBuf>, Error> {
        let mut written = Vec::new();
        for kind in AttributeKind::ALL {
            let path = forward_path(out_dir, event_type, kind);
            write_lines(&path, self.forward_lines(kind))?;
            log::info!("Wrote {}", path.display());
            written.push(path);
        }
        for kind in AttributeKind::ALL.into_iter().filter(|k| k.is_invertible()) {
            let path = inverse_path(out_dir, event_type, kind);
            write_lines(
                &path,
                self.inverse[kind]
                    .iter()
                    .map(|(value, events)| format!("{}\t{}", value, events.join("\t"))),
            )?;
            log::info!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }

    fn forward_lines(&self, kind: AttributeKind) -> impl Iterator<Item = String> + '_ {
        std::iter::once(format!("event_name\t{}", kind.name())).chain(
            self.forward[kind].iter().map(|(event, value)| {
                format!("{}\t{}", event, value.as_deref().unwrap_or(UNKNOWN))
            }),
        )
    }
}

fn write_lines(path: &Path, lines: impl Iterator<Item = String>) -> Result<(), Error> {
    let to_error = |source| Error::Io {
        path: path.display().to_string(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(to_error)?);
    for line in lines {
        writeln!(writer, "{}", line).map_err(to_error)?;
    }
    writer.flush().map_err(to_error)
}

/// Annotate all events, in order.
pub fn build_tables(
    store: &dyn FeatureStore,
    events: &[EventId],
    progress_every: usize,
) -> Result<MappingTables, Error> {
    let mut tables = MappingTables::new();
    for (i, event) in events.iter().enumerate() {
        if progress_every > 0 && i % progress_every == 0 {
            log::info!("On {}/{} events", i, events.len());
        }
        match annotate_event(store, event) {
            Ok(annotation) => tables.add(&event.name, Some(&annotation)),
            Err(lookup::Error::NoAnnotationFound(_)) => tables.add(&event.name, None),
            Err(lookup::Error::Data(e)) => return Err(e.into()),
        }
    }
    Ok(tables)
}

/// Annotate events and write the mapping tables of the event type into `out_dir`.
///
/// # Arguments
///
/// * `store` -- annotation feature store
/// * `events` -- events to convert
/// * `event_type` -- type of the events, only used for naming the files, e.g., `SE`
/// * `out_dir` -- existing output directory
/// * `progress_every` -- number of events between progress messages, `0` for none
pub fn convert_events(
    store: &dyn FeatureStore,
    events: &[EventId],
    event_type: &str,
    out_dir: &Path,
    progress_every: usize,
) -> Result<MappingTables, Error> {
    log::info!(
        "Converting {} {} events into {}",
        events.len(),
        event_type.to_lowercase(),
        out_dir.display()
    );
    let tables = build_tables(store, events, progress_every)?;
    tables.write(out_dir, event_type)?;
    Ok(tables)
}
