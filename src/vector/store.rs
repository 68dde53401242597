//! Random-access reader for the binary vector store format.
//!
//! # Format
//!
//! ```text
//! +----------------+----------------+---------------------------------------+
//! | i32 numVectors | i32 dim        | numVectors × dim f32 (row-major)      |
//! | big-endian     | big-endian     | big-endian, no padding or delimiters  |
//! +----------------+----------------+---------------------------------------+
//! ```
//!
//! The total file length is always `8 + 4 · numVectors · dim`. Vector `i` starts at
//! byte offset `8 + 4 · dim · i`.
//!
//! The file is memory-mapped once when the store is opened and unmapped when the
//! store is dropped. Reads only borrow the map, so a store can be shared between
//! threads and every call to [`VectorStore::load_vector`] with the same index
//! returns the same values.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder};
use log::debug;
use memmap2::{Mmap, MmapOptions};

use crate::error::{CuratorError, Result};
use crate::vector::Vector;

/// Size of the `numVectors` + `dim` header in bytes.
pub const HEADER_LEN: usize = 8;

/// Size of one encoded component in bytes.
pub const FLOAT_LEN: usize = 4;

/// A read-only, memory-mapped store of equal-length vectors.
pub struct VectorStore {
    path: PathBuf,
    mmap: Mmap,
    num_vectors: usize,
    dim: usize,
}

impl VectorStore {
    /// Open a vector store and validate its header against the file length.
    ///
    /// # Errors
    ///
    /// - [`CuratorError::NotFound`] if the file does not exist
    /// - [`CuratorError::Storage`] if the header is truncated, negative, or does not
    ///   match the file length
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CuratorError::from_open(e, path))?;
        let file_len = file.metadata()?.len();

        if file_len < HEADER_LEN as u64 {
            return Err(CuratorError::storage(format!(
                "corrupt vector store {}: {} bytes is shorter than the {}-byte header",
                path.display(),
                file_len,
                HEADER_LEN
            )));
        }

        // SAFETY: the map is read-only and the store owns it for its whole lifetime.
        // The file is an input artifact that is not rewritten while a store is open.
        let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(|e| {
            CuratorError::storage(format!("failed to map {}: {e}", path.display()))
        })?;

        let raw_count = BigEndian::read_i32(&mmap[0..4]);
        let raw_dim = BigEndian::read_i32(&mmap[4..8]);
        if raw_count < 0 || raw_dim < 0 {
            return Err(CuratorError::storage(format!(
                "corrupt vector store {}: negative header values ({raw_count}, {raw_dim})",
                path.display()
            )));
        }

        let num_vectors = raw_count as usize;
        let dim = raw_dim as usize;
        let expected = HEADER_LEN as u64 + (FLOAT_LEN as u64) * (num_vectors as u64) * (dim as u64);
        if expected != file_len {
            return Err(CuratorError::storage(format!(
                "corrupt vector store {}: header declares {num_vectors} x {dim} \
                 ({expected} bytes) but file has {file_len} bytes",
                path.display()
            )));
        }

        debug!(
            "Opened vector store {} ({} vectors, dim {})",
            path.display(),
            num_vectors,
            dim
        );

        Ok(VectorStore {
            path: path.to_path_buf(),
            mmap,
            num_vectors,
            dim,
        })
    }

    /// Number of vectors declared in the header.
    pub fn vector_count(&self) -> usize {
        self.num_vectors
    }

    /// Dimension of every vector in the store.
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Path the store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the vector at `index`.
    ///
    /// # Errors
    ///
    /// [`CuratorError::OutOfRange`] when `index < 0` or `index >= vector_count()`.
    pub fn load_vector(&self, index: i64) -> Result<Vector> {
        if index < 0 || index as u64 >= self.num_vectors as u64 {
            return Err(CuratorError::out_of_range(format!(
                "vector index {index} is outside [0, {}) in {}",
                self.num_vectors,
                self.path.display()
            )));
        }

        let start = HEADER_LEN + FLOAT_LEN * self.dim * index as usize;
        let end = start + FLOAT_LEN * self.dim;
        let mut data = vec![0.0f32; self.dim];
        BigEndian::read_f32_into(&self.mmap[start..end], &mut data);

        Ok(Vector::new(data))
    }
}

impl fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorStore")
            .field("path", &self.path)
            .field("num_vectors", &self.num_vectors)
            .field("dim", &self.dim)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::thread;

    use tempfile::TempDir;

    use super::*;
    use crate::vector::writer::VectorStoreWriter;

    fn sample_vectors() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 1.0, -2.5, 3.25],
            vec![1e-7, f32::MAX, -0.0, 42.0],
            vec![0.125, 0.25, 0.5, 1.0],
        ]
    }

    fn write_store(dir: &TempDir, vectors: &[Vec<f32>], dim: usize) -> PathBuf {
        let path = dir.path().join("vectors.bin");
        let mut writer = VectorStoreWriter::create(&path, dim).unwrap();
        for v in vectors {
            writer.append(v).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_round_trip_three_by_four() {
        let dir = TempDir::new().unwrap();
        let vectors = sample_vectors();
        let path = write_store(&dir, &vectors, 4);

        let store = VectorStore::open(&path).unwrap();
        assert_eq!(store.vector_count(), 3);
        assert_eq!(store.dimension(), 4);
        for (i, expected) in vectors.iter().enumerate() {
            let loaded = store.load_vector(i as i64).unwrap();
            assert_eq!(&loaded.data, expected);
        }
    }

    #[test]
    fn test_file_length_matches_header() {
        let dir = TempDir::new().unwrap();
        let path = write_store(&dir, &sample_vectors(), 4);
        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, 8 + 4 * 3 * 4);
    }

    #[test]
    fn test_out_of_range() {
        let dir = TempDir::new().unwrap();
        let path = write_store(&dir, &sample_vectors(), 4);
        let store = VectorStore::open(&path).unwrap();

        assert!(matches!(store.load_vector(-1), Err(CuratorError::OutOfRange(_))));
        assert!(matches!(store.load_vector(3), Err(CuratorError::OutOfRange(_))));
        assert!(matches!(store.load_vector(i64::MAX), Err(CuratorError::OutOfRange(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = VectorStore::open(dir.path().join("absent.bin"));
        assert!(matches!(result, Err(CuratorError::NotFound(_))));
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.bin");
        let mut file = File::create(&path).unwrap();
        // header says 2 x 2 but only one float follows
        file.write_all(&[0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 0]).unwrap();
        drop(file);

        assert!(matches!(VectorStore::open(&path), Err(CuratorError::Storage(_))));
    }

    #[test]
    fn test_repeated_and_concurrent_reads_are_identical() {
        let dir = TempDir::new().unwrap();
        let vectors: Vec<Vec<f32>> = (0..64)
            .map(|i| (0..8).map(|j| (i * 8 + j) as f32 * 0.5).collect())
            .collect();
        let path = write_store(&dir, &vectors, 8);
        let store = Arc::new(VectorStore::open(&path).unwrap());

        let first = store.load_vector(17).unwrap();
        assert_eq!(first, store.load_vector(17).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..64)
                        .filter(|i| i % 4 == t)
                        .map(|i| (i, store.load_vector(i as i64).unwrap()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for (i, v) in handle.join().unwrap() {
                assert_eq!(v.data, vectors[i]);
            }
        }
    }

    #[test]
    fn test_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = write_store(&dir, &[], 16);
        let store = VectorStore::open(&path).unwrap();
        assert_eq!(store.vector_count(), 0);
        assert_eq!(store.dimension(), 16);
        assert!(store.load_vector(0).is_err());
    }
}
