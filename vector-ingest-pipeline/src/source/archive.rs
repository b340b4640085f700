//! Archive reader implementation.
//!
//! The archive is a ZIP container whose entries are grouped by object id:
//!
//! ```text
//! <id>/object              JSON object of scalar properties
//! <id>/vector_<slot>       packed little-endian f32 values
//! ```
//!
//! Groups are yielded in the order their first entry appears in the central
//! directory. Only entry names are read on open; payloads are decoded one
//! record at a time.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::errors::IngestError;
use crate::source::SourceMessage;
use vector_ingest_shared::{IngestionRecord, PropertyMap, PropertyValue, VectorMap};

/// Name of the properties entry inside a group.
pub const OBJECT_ENTRY: &str = "object";

/// Prefix of vector entries inside a group.
pub const VECTOR_ENTRY_PREFIX: &str = "vector_";

const F32_WIDTH: usize = std::mem::size_of::<f32>();

/// Entry indices belonging to one object id.
#[derive(Debug)]
struct EntryGroup {
    id: String,
    object: Option<usize>,
    vectors: Vec<(String, usize)>,
}

/// Lazy reader over the records in an archive.
///
/// Yields `Result<IngestionRecord, IngestError>` in archive order. The file
/// handle is owned by the reader and closed when it is dropped. To read the
/// archive again, open a new reader.
pub struct ArchiveReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    groups: Vec<EntryGroup>,
    position: usize,
    dimensions: HashMap<String, usize>,
}

impl ArchiveReader {
    /// Open an archive and index its groups.
    ///
    /// # Returns
    ///
    /// * `Ok(ArchiveReader)` - Positioned before the first record
    /// * `Err(IngestError::ArchiveOpenError)` - The file cannot be opened or is not a ZIP container
    /// * `Err(IngestError::ArchiveFormatError)` - A vector entry has no slot name
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(|e| IngestError::archive_open(format!("{}: {}", path.display(), e)))?;
        let archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| IngestError::archive_open(format!("{}: {}", path.display(), e)))?;

        let groups = index_groups(&archive)?;

        info!(
            path = %path.display(),
            entries = archive.len(),
            records = groups.len(),
            "Opened archive"
        );

        Ok(Self {
            path,
            archive,
            groups,
            position: 0,
            dimensions: HashMap::new(),
        })
    }

    /// Total number of records in the archive.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records not yet read.
    pub fn remaining(&self) -> usize {
        self.groups.len() - self.position
    }

    /// Read every record and send it down `sender`, then `End`.
    ///
    /// Blocking; run it on a blocking thread. Stops after the first decode
    /// error or as soon as the receiver is dropped.
    pub fn stream_into(mut self, sender: mpsc::Sender<SourceMessage>) {
        while let Some(item) = self.next() {
            let (message, fatal) = match item {
                Ok(record) => (SourceMessage::Record(record), false),
                Err(e) => (SourceMessage::Error(e), true),
            };

            if sender.blocking_send(message).is_err() {
                debug!(path = %self.path.display(), "Receiver dropped, closing archive");
                return;
            }

            if fatal {
                return;
            }
        }

        let _ = sender.blocking_send(SourceMessage::End);
    }

    /// Read the bytes of the entry at `index`.
    fn read_entry(&mut self, index: usize) -> Result<Vec<u8>, String> {
        let mut entry = self.archive.by_index(index).map_err(|e| e.to_string())?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf).map_err(|e| e.to_string())?;
        Ok(buf)
    }

    fn read_record(&mut self, group_index: usize) -> Result<IngestionRecord, IngestError> {
        let id = self.groups[group_index].id.clone();
        let object_index = self.groups[group_index].object.ok_or_else(|| {
            IngestError::archive_format(format!("{}: missing '{}' entry", id, OBJECT_ENTRY))
        })?;

        let blob = self
            .read_entry(object_index)
            .map_err(|e| IngestError::archive_format(format!("{}/{}: {}", id, OBJECT_ENTRY, e)))?;
        let properties = decode_properties(&id, &blob)?;

        let vector_entries = self.groups[group_index].vectors.clone();
        let mut vectors = VectorMap::new();
        for (slot, index) in vector_entries {
            let bytes = self
                .read_entry(index)
                .map_err(|e| IngestError::vector_decode(&id, &slot, e))?;
            let vector =
                decode_vector(&bytes).map_err(|e| IngestError::vector_decode(&id, &slot, e))?;

            match self.dimensions.get(&slot) {
                Some(&expected) if expected != vector.len() => {
                    return Err(IngestError::vector_decode(
                        &id,
                        &slot,
                        format!("expected dimension {}, found {}", expected, vector.len()),
                    ));
                }
                Some(_) => {}
                None => {
                    debug!(slot = %slot, dimension = vector.len(), "Recorded vector dimension");
                    self.dimensions.insert(slot.clone(), vector.len());
                }
            }

            vectors.insert(slot, vector);
        }

        Ok(IngestionRecord::new(id, properties, vectors))
    }
}

impl Iterator for ArchiveReader {
    type Item = Result<IngestionRecord, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.groups.len() {
            return None;
        }

        let index = self.position;
        self.position += 1;
        Some(self.read_record(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

/// Group entry indices by object id, keeping first-appearance order.
fn index_groups(archive: &ZipArchive<BufReader<File>>) -> Result<Vec<EntryGroup>, IngestError> {
    let mut groups: Vec<EntryGroup> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for index in 0..archive.len() {
        let Some(name) = archive.name_for_index(index) else {
            continue;
        };

        if name.ends_with('/') {
            continue;
        }

        let Some((id, entry)) = name.split_once('/') else {
            warn!(entry = %name, "Ignoring entry outside of an object group");
            continue;
        };

        if id.is_empty() || entry.contains('/') {
            warn!(entry = %name, "Ignoring nested entry");
            continue;
        }

        let group_index = *by_id.entry(id.to_string()).or_insert_with(|| {
            groups.push(EntryGroup {
                id: id.to_string(),
                object: None,
                vectors: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[group_index];

        if entry == OBJECT_ENTRY {
            group.object = Some(index);
        } else if let Some(slot) = entry.strip_prefix(VECTOR_ENTRY_PREFIX) {
            if slot.is_empty() {
                return Err(IngestError::archive_format(format!(
                    "{}: vector entry without a slot name",
                    name
                )));
            }
            group.vectors.push((slot.to_string(), index));
        }
    }

    Ok(groups)
}

/// Decode a properties blob into scalar properties.
fn decode_properties(id: &str, blob: &[u8]) -> Result<PropertyMap, IngestError> {
    let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(blob)
        .map_err(|e| IngestError::archive_format(format!("{}/{}: {}", id, OBJECT_ENTRY, e)))?;

    let mut properties = PropertyMap::new();
    for (name, value) in raw {
        let value = PropertyValue::from_json(value).ok_or_else(|| {
            IngestError::archive_format(format!(
                "{}/{}: property '{}' is not a scalar",
                id, OBJECT_ENTRY, name
            ))
        })?;
        properties.insert(name, value);
    }

    Ok(properties)
}

/// Decode packed little-endian `f32` values.
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>, String> {
    if bytes.is_empty() {
        return Err("empty vector".to_string());
    }
    if bytes.len() % F32_WIDTH != 0 {
        return Err(format!(
            "{} bytes is not a whole number of f32 values",
            bytes.len()
        ));
    }

    Ok(bytes
        .chunks_exact(F32_WIDTH)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Encode a vector as packed little-endian `f32` values.
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}
