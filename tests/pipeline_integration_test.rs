//! End-to-end tests: CSV + vector store -> index on disk -> search.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use curator::augment::{GeminiAugmenter, NoAugmenter};
use curator::config::{AugmentationConfig, CuratorConfig};
use curator::index::{IndexReader, SegmentReader};
use curator::prelude::*;
use curator::storage::{FileStorage, StorageConfig};
use curator::vector::store::VectorStore;
use curator::vector::writer::VectorStoreWriter;
use tempfile::TempDir;

const ART_CSV: &str = "\
TITLE,AUTHOR,LOCATION,analysis
Water Lilies,Claude Monet,Paris,\"A calm pond covered in lilies, soft light and reflections\"
The Scream,Edvard Munch,Oslo,\"A figure in anguish and despair under a burning red sky\"
Ophelia,John Everett Millais,London,\"Sorrow and melancholy as a drowned woman floats in a stream\"
";

fn write_fixture(dir: &Path, csv: &str, vectors: usize, dim: usize) -> (PathBuf, PathBuf) {
    let data = dir.join("art_metadata_filtered.csv");
    fs::write(&data, csv).unwrap();

    let store = dir.join("embeddings_bert_sentence.bin");
    let rows: Vec<Vec<f32>> = (0..vectors)
        .map(|i| (0..dim).map(|j| (i * dim + j) as f32 / 10.0).collect())
        .collect();
    VectorStoreWriter::write_all(&store, dim, &rows).unwrap();
    (data, store)
}

fn offline_config() -> CuratorConfig {
    CuratorConfig {
        augmentation: AugmentationConfig {
            endpoint: "http://127.0.0.1:9/v1/models".to_string(),
            api_key: Some("unused".to_string()),
            timeout_secs: Some(2),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_index_then_search_three_rows() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let (data, vectors) = write_fixture(dir.path(), ART_CSV, 3, 4);
    let index_dir = dir.path().join("index");

    let config = CuratorConfig::default();
    let storage = Arc::new(FileStorage::new(&index_dir, StorageConfig::default())?);
    let report = IndexingPipeline::new(&config).run(storage.clone(), &data, &vectors)?;
    assert_eq!(report.documents, 3);
    assert_eq!(report.vector_dimension, 4);

    // every document carries its own row's vector
    let reader = SegmentReader::open(storage.as_ref())?;
    let store = VectorStore::open(&vectors)?;
    for i in 0..3u32 {
        let doc = reader.document(i).unwrap();
        assert_eq!(
            doc.get_vector("embedding").unwrap(),
            &store.load_vector(i as i64)?
        );
    }

    // a fresh handle on the same directory sees the committed index
    let reopened = FileStorage::open(&index_dir, StorageConfig::default())?;
    let executor = SearchExecutor::new(&config, Box::new(NoAugmenter));
    let results = executor.search(&reopened, "sorrow", 20, false)?;
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].title(), Some("Ophelia"));

    let results = executor.search(&reopened, "a", 1, false)?;
    assert_eq!(results.total_hits, 3);
    assert_eq!(results.hits.len(), 1);
    Ok(())
}

#[test]
fn test_rebuild_replaces_previous_index() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let (data, vectors) = write_fixture(dir.path(), ART_CSV, 3, 2);
    let index_dir = dir.path().join("index");
    let config = CuratorConfig::default();

    let storage = Arc::new(FileStorage::new(&index_dir, StorageConfig::default())?);
    IndexingPipeline::new(&config).run(storage.clone(), &data, &vectors)?;

    let smaller = "TITLE,AUTHOR,LOCATION,analysis\nIrises,Van Gogh,Los Angeles,blue flowers\n";
    let (data, vectors) = write_fixture(dir.path(), smaller, 1, 2);
    let report = IndexingPipeline::new(&config).run(storage.clone(), &data, &vectors)?;
    assert_eq!(report.documents, 1);

    let executor = SearchExecutor::new(&config, Box::new(NoAugmenter));
    assert_eq!(executor.search(storage.as_ref(), "sorrow", 20, false)?.total_hits, 0);
    let results = executor.search(storage.as_ref(), "flowers", 20, false)?;
    assert_eq!(results.hits[0].title(), Some("Irises"));
    Ok(())
}

#[test]
fn test_row_vector_mismatch_aborts_before_commit() {
    let dir = TempDir::new().unwrap();
    let csv = "TITLE,AUTHOR,LOCATION,analysis\n\
               a,x,p,one\nb,x,p,two\nc,x,p,three\nd,x,p,four\ne,x,p,five\n";
    let config = CuratorConfig::default();

    // 5 rows and 5 vectors index fine
    let (data, vectors) = write_fixture(dir.path(), csv, 5, 3);
    let good_dir = dir.path().join("good");
    let storage = Arc::new(FileStorage::new(&good_dir, StorageConfig::default()).unwrap());
    let report = IndexingPipeline::new(&config)
        .run(storage, &data, &vectors)
        .unwrap();
    assert_eq!(report.documents, 5);

    // 5 rows and 3 vectors fail without leaving an index behind
    let (data, vectors) = write_fixture(dir.path(), csv, 3, 3);
    let bad_dir = dir.path().join("bad");
    let storage = Arc::new(FileStorage::new(&bad_dir, StorageConfig::default()).unwrap());
    let result = IndexingPipeline::new(&config).run(storage.clone(), &data, &vectors);
    assert!(matches!(result, Err(CuratorError::OutOfRange(_))));
    assert!(storage.list_files().unwrap().is_empty());

    let executor = SearchExecutor::new(&config, Box::new(NoAugmenter));
    assert!(matches!(
        executor.search(storage.as_ref(), "one", 20, false),
        Err(CuratorError::Index(_))
    ));
}

#[test]
fn test_augmentation_failure_falls_back_to_plain_search() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let (data, vectors) = write_fixture(dir.path(), ART_CSV, 3, 2);
    let config = offline_config();

    let storage = Arc::new(FileStorage::new(dir.path().join("index"), StorageConfig::default())?);
    IndexingPipeline::new(&config).run(storage.clone(), &data, &vectors)?;

    let augmenter = GeminiAugmenter::new(&config.augmentation)?;
    let executor = SearchExecutor::new(&config, Box::new(augmenter));

    let augmented = executor.execute(storage.as_ref(), "despair", 20, true)?;
    let plain = executor.execute(storage.as_ref(), "despair", 20, false)?;

    assert!(!augmented.augmented);
    assert!(matches!(
        augmented.augmentation,
        Some(Augmentation::Unavailable(_))
    ));
    assert_eq!(augmented.results, plain.results);
    assert_eq!(plain.results.hits[0].title(), Some("The Scream"));
    Ok(())
}
