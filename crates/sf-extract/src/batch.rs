//! Batch Extraction
//!
//! Fans whole files out over a rayon pool. Each job runs one independent
//! pipeline; a failing file yields its own error without stopping the
//! batch.

use std::path::Path;

use rayon::prelude::*;

use crate::config::ExtractorConfig;
use crate::pipeline::{FeatureExtractor, FeatureSet};
use crate::{ExtractError, ExtractResult};

/// Extract features from many WAV files in parallel.
///
/// The outer `Result` covers configuration and pool construction; the
/// inner per-file `Result`s are positionally aligned with `paths`.
pub fn extract_files<P: AsRef<Path> + Sync>(
    paths: &[P],
    config: &ExtractorConfig,
) -> ExtractResult<Vec<ExtractResult<FeatureSet>>> {
    let extractor = FeatureExtractor::new(config.clone())?;
    let threads = if config.threads == 0 {
        num_cpus::get()
    } else {
        config.threads
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| ExtractError::Io(std::io::Error::other(e.to_string())))?;

    log::info!(
        "batch extraction: {} file(s) over {threads} thread(s)",
        paths.len()
    );
    let results = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let result = extractor.extract_file(path.as_ref());
                if let Err(ref e) = result {
                    log::warn!("{}: {e}", path.as_ref().display());
                }
                result
            })
            .collect()
    });
    Ok(results)
}
