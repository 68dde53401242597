//! Output formatting for CLI commands.

use std::time::Duration;

use serde::Serialize;

use crate::cli::args::{CuratorArgs, OutputFormat};
use crate::error::Result;
use crate::indexing::IndexingReport;
use crate::search::SearchReport;

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
pub fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Result structure for an indexing run.
#[derive(Debug, Serialize)]
pub struct IndexingOutput {
    pub index_dir: String,
    pub documents: u64,
    pub vector_dimension: usize,
    pub duration_ms: u64,
}

impl IndexingOutput {
    pub fn new(index_dir: String, report: &IndexingReport) -> Self {
        IndexingOutput {
            index_dir,
            documents: report.documents,
            vector_dimension: report.vector_dimension,
            duration_ms: duration_ms(report.elapsed),
        }
    }
}

/// One ranked hit.
#[derive(Debug, Serialize)]
pub struct HitOutput {
    pub rank: usize,
    pub title: Option<String>,
    pub score: f32,
}

/// Result structure for one search pass.
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub augmented: bool,
    pub executed_query: String,
    pub total_hits: u64,
    pub hits: Vec<HitOutput>,
    pub duration_ms: u64,
}

impl SearchOutput {
    pub fn new(report: &SearchReport, duration_ms: u64) -> Self {
        SearchOutput {
            query: report.query.clone(),
            augmented: report.augmented,
            executed_query: report.executed_query.clone(),
            total_hits: report.results.total_hits,
            hits: report
                .results
                .hits
                .iter()
                .enumerate()
                .map(|(i, hit)| HitOutput {
                    rank: i + 1,
                    title: hit.title().map(str::to_string),
                    score: hit.score,
                })
                .collect(),
            duration_ms,
        }
    }
}

/// Print the result of an indexing run.
pub fn output_indexing(result: &IndexingOutput, args: &CuratorArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(result, args),
        OutputFormat::Human => {
            println!(
                "Indexed {} documents into {} in {} ms",
                result.documents, result.index_dir, result.duration_ms
            );
            if args.verbosity() > 1 {
                println!("Vector dimension: {}", result.vector_dimension);
            }
            Ok(())
        }
    }
}

/// Print the result of one search pass.
pub fn output_search(result: &SearchOutput, args: &CuratorArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(result, args),
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                let label = if result.augmented {
                    "Augmented search"
                } else {
                    "Plain search"
                };
                println!("{label}: {}", result.query);
            }
            if args.verbosity() > 1 {
                println!("Query: {}", result.executed_query);
            }

            println!("{} total matching documents", result.total_hits);
            for hit in &result.hits {
                println!(
                    "{} | Score: {}",
                    hit.title.as_deref().unwrap_or("<untitled>"),
                    hit.score
                );
            }

            if args.verbosity() > 1 {
                println!("({} ms)", result.duration_ms);
            }
            println!();
            Ok(())
        }
    }
}

fn output_json<T: Serialize>(result: &T, args: &CuratorArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_micros(2_500)), 2);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }
}
