//! Writer for the binary vector store format read by [`VectorStore`].
//!
//! Vectors are streamed one at a time; the vector count in the header is patched in
//! by [`VectorStoreWriter::finish`].
//!
//! [`VectorStore`]: crate::vector::store::VectorStore

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, WriteBytesExt};
use log::debug;

use crate::error::{CuratorError, Result};

/// Streaming writer producing a big-endian vector store file.
#[derive(Debug)]
pub struct VectorStoreWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    dim: usize,
    count: usize,
}

impl VectorStoreWriter {
    /// Create (or truncate) a store at `path` for vectors of dimension `dim`.
    pub fn create<P: AsRef<Path>>(path: P, dim: usize) -> Result<Self> {
        if dim > i32::MAX as usize {
            return Err(CuratorError::invalid_argument(format!(
                "dimension {dim} does not fit the 32-bit header"
            )));
        }

        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writer.write_i32::<BigEndian>(0)?;
        writer.write_i32::<BigEndian>(dim as i32)?;

        Ok(VectorStoreWriter {
            path,
            writer,
            dim,
            count: 0,
        })
    }

    /// Append one vector. Its length must equal the store dimension.
    pub fn append(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(CuratorError::invalid_argument(format!(
                "vector {} has dimension {}, store expects {}",
                self.count,
                vector.len(),
                self.dim
            )));
        }
        if self.count == i32::MAX as usize {
            return Err(CuratorError::out_of_range(
                "vector count exceeds the 32-bit header",
            ));
        }

        for &value in vector {
            self.writer.write_f32::<BigEndian>(value)?;
        }
        self.count += 1;
        Ok(())
    }

    /// Number of vectors appended so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Write the final vector count into the header and flush. Returns the count.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| CuratorError::Io(e.into_error()))?;
        file.seek(SeekFrom::Start(0))?;
        file.write_i32::<BigEndian>(self.count as i32)?;
        file.sync_all()?;

        debug!(
            "Wrote vector store {} ({} vectors, dim {})",
            self.path.display(),
            self.count,
            self.dim
        );
        Ok(self.count)
    }

    /// Convenience wrapper writing every vector in `vectors` to `path`.
    pub fn write_all<P: AsRef<Path>>(path: P, dim: usize, vectors: &[Vec<f32>]) -> Result<usize> {
        let mut writer = Self::create(path, dim)?;
        for vector in vectors {
            writer.append(vector)?;
        }
        writer.finish()
    }
}
