//! Batch orchestration: run the extractor over many sources, skipping
//! failures, and collect the surviving records as a table.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use crate::audio;
use crate::features::{self, TrackFeatures};

/// One table row: the feature record plus the source it came from.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    #[serde(flatten)]
    pub features: TrackFeatures,
    pub filename: String,
}

/// Analyze every source in order. Items that fail to decode or extract are
/// logged and dropped; the survivors keep their original relative order.
pub fn run(sources: &[String], jobs: Option<usize>) -> Result<Vec<BatchRow>> {
    match jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            Ok(pool.install(|| process(sources)))
        }
        None => Ok(process(sources)),
    }
}

fn process(sources: &[String]) -> Vec<BatchRow> {
    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );

    let rows: Vec<Option<BatchRow>> = sources
        .par_iter()
        .map(|source| {
            let row = analyze_one(source);
            pb.inc(1);
            row
        })
        .collect();

    pb.finish_and_clear();
    rows.into_iter().flatten().collect()
}

fn analyze_one(source: &str) -> Option<BatchRow> {
    let result = audio::acquire(source).and_then(|waveform| features::extract(&waveform));
    match result {
        Ok(features) => Some(BatchRow {
            features,
            filename: source.to_string(),
        }),
        Err(err) => {
            log::warn!("Skipping {}: {}", source, err);
            None
        }
    }
}
