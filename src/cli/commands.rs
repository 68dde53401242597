//! Command implementations for the curator CLI.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::augment::{NoAugmenter, QueryAugmenter, augmenter_from_config};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::CuratorConfig;
use crate::error::{CuratorError, Result};
use crate::indexing::IndexingPipeline;
use crate::search::SearchExecutor;
use crate::storage::{FileStorage, StorageConfig};

/// Execute a CLI command.
pub fn execute_command(args: CuratorArgs) -> Result<()> {
    let config = load_config(&args)?;
    match &args.command {
        Command::Index(index_args) => build_index(index_args, config, &args),
        Command::Search(search_args) => search_index(search_args, config, &args),
    }
}

fn load_config(args: &CuratorArgs) -> Result<CuratorConfig> {
    match &args.config {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            CuratorConfig::from_file(path)
        }
        None => Ok(CuratorConfig::default()),
    }
}

/// Build (or rebuild) the index.
fn build_index(
    args: &IndexArgs,
    mut config: CuratorConfig,
    cli_args: &CuratorArgs,
) -> Result<()> {
    if let Some(data) = &args.data {
        config.data_path = data.clone();
    }
    if let Some(vectors) = &args.vectors {
        config.vectors_path = vectors.clone();
    }
    if let Some(index_dir) = &args.index_dir {
        config.index_dir = index_dir.clone();
    }

    if cli_args.verbosity() > 1 {
        println!(
            "Indexing {} with vectors from {}",
            config.data_path.display(),
            config.vectors_path.display()
        );
    }

    let storage = Arc::new(FileStorage::new(&config.index_dir, StorageConfig::default())?);
    let report = IndexingPipeline::new(&config).run(
        storage,
        &config.data_path,
        &config.vectors_path,
    )?;

    output_indexing(
        &IndexingOutput::new(config.index_dir.display().to_string(), &report),
        cli_args,
    )
}

/// Search the index once per pass of the selected mode.
fn search_index(
    args: &SearchArgs,
    mut config: CuratorConfig,
    cli_args: &CuratorArgs,
) -> Result<()> {
    if let Some(index_dir) = &args.index_dir {
        config.index_dir = index_dir.clone();
    }
    if let Some(api_key) = &args.api_key {
        config.augmentation.api_key = Some(api_key.clone());
    }
    let limit = args.limit.unwrap_or(config.max_hits);

    let query = match &args.query {
        Some(query) => query.clone(),
        None => prompt_query()?,
    };

    let storage = FileStorage::open(&config.index_dir, StorageConfig::default()).map_err(|e| {
        match e {
            CuratorError::NotFound(_) => CuratorError::index(format!(
                "no index at {}; run `curator index` first",
                config.index_dir.display()
            )),
            other => other,
        }
    })?;

    let wants_augmentation = args.mode.passes().contains(&true);
    let augmenter: Box<dyn QueryAugmenter> = if wants_augmentation {
        augmenter_from_config(&config.augmentation)?
    } else {
        Box::new(NoAugmenter)
    };
    let executor = SearchExecutor::new(&config, augmenter);

    for &augment in args.mode.passes() {
        let start = Instant::now();
        let report = executor.execute(&storage, &query, limit, augment)?;
        let output = SearchOutput::new(&report, duration_ms(start.elapsed()));
        output_search(&output, cli_args)?;
    }

    Ok(())
}

/// Read one query line from stdin.
fn prompt_query() -> Result<String> {
    print!("Input your query: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
