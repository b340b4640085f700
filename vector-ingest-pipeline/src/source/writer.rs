//! Archive writer.
//!
//! Produces archives in the layout `ArchiveReader` consumes. Used to build
//! fixtures and to repackage datasets.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::IngestError;
use crate::source::archive::{encode_vector, OBJECT_ENTRY, VECTOR_ENTRY_PREFIX};
use vector_ingest_shared::{PropertyMap, VectorMap};

/// Writes object groups into a new archive.
pub struct ArchiveWriter {
    zip: ZipWriter<BufWriter<File>>,
    options: SimpleFileOptions,
}

impl ArchiveWriter {
    /// Create (or truncate) the archive at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| IngestError::archive_write(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            zip: ZipWriter::new(BufWriter::new(file)),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        })
    }

    /// Append one object group: its properties blob and one entry per vector slot.
    pub fn add_object(
        &mut self,
        id: &str,
        properties: &PropertyMap,
        vectors: &VectorMap,
    ) -> Result<(), IngestError> {
        let blob = serde_json::to_vec(properties)
            .map_err(|e| IngestError::archive_write(format!("{}: {}", id, e)))?;
        self.add_raw_entry(&format!("{}/{}", id, OBJECT_ENTRY), &blob)?;

        for (slot, vector) in vectors {
            self.add_raw_entry(
                &format!("{}/{}{}", id, VECTOR_ENTRY_PREFIX, slot),
                &encode_vector(vector),
            )?;
        }

        Ok(())
    }

    /// Append an entry with arbitrary contents.
    pub fn add_raw_entry(&mut self, name: &str, contents: &[u8]) -> Result<(), IngestError> {
        self.zip
            .start_file(name, self.options)
            .map_err(|e| IngestError::archive_write(format!("{}: {}", name, e)))?;
        self.zip
            .write_all(contents)
            .map_err(|e| IngestError::archive_write(format!("{}: {}", name, e)))
    }

    /// Write the central directory and close the file.
    pub fn finish(self) -> Result<(), IngestError> {
        let mut inner = self
            .zip
            .finish()
            .map_err(|e| IngestError::archive_write(e.to_string()))?;
        inner
            .flush()
            .map_err(|e| IngestError::archive_write(e.to_string()))
    }
}
