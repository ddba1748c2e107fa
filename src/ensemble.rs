//! Averaged predictions over a directory of training checkpoints.
//!
//! Each checkpoint is tested by its own sampler on its own worker thread.
//! Workers share nothing; the reduction happens on the calling thread once
//! every worker has returned.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::checkpoint;
use crate::config::SamplerConfig;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::predictions::PredictionTable;
use crate::sampler::Sampler;

/// Every `*.zip` directly under `dir`, sorted by path.
pub fn checkpoints(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io("list checkpoints", dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io("list checkpoints", dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "zip") {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        return Err(Error::Config(format!(
            "no checkpoints found in {}",
            dir.display()
        )));
    }
    Ok(paths)
}

/// Out-of-matrix predictions for `corpus`, averaged over every checkpoint
/// in `checkpoint_dir`. Each worker's table is also written to
/// `partial_dir/{stem}.txt`.
pub fn run(
    config: &SamplerConfig,
    corpus: &Corpus,
    checkpoint_dir: &Path,
    partial_dir: &Path,
) -> Result<PredictionTable> {
    let paths = checkpoints(checkpoint_dir)?;
    std::fs::create_dir_all(partial_dir)
        .map_err(|e| Error::io("create partial directory", partial_dir, e))?;
    info!(
        checkpoints = paths.len(),
        dir = %checkpoint_dir.display(),
        "ensemble test"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(paths.len())
        .build()
        .map_err(|e| Error::Config(format!("cannot start ensemble workers: {}", e)))?;
    let tables = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let partial = partial_dir.join(format!("{}.txt", checkpoint::stem(path)));
                let mut sampler = Sampler::new(config.clone(), corpus.clone())?;
                sampler.test(path, Some(&partial), None)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    average(&tables, checkpoint_dir)
}

/// In-matrix predictions averaged over training checkpoints, one after
/// the other on the calling thread.
pub fn average_in_matrix(
    config: &SamplerConfig,
    corpus: &Corpus,
    checkpoint_dir: &Path,
) -> Result<PredictionTable> {
    let paths = checkpoints(checkpoint_dir)?;
    let mut tables = Vec::with_capacity(paths.len());
    for path in &paths {
        let mut sampler = Sampler::new(config.clone(), corpus.clone())?;
        checkpoint::load_state(&mut sampler, path)?;
        tables.push(sampler.predict_in_matrix());
    }
    average(&tables, checkpoint_dir)
}

fn average(tables: &[PredictionTable], dir: &Path) -> Result<PredictionTable> {
    let table = PredictionTable::average(tables.iter())
        .ok_or_else(|| Error::Config(format!("no predictions from {}", dir.display())))?;
    info!(entries = table.len(), replicas = tables.len(), "ensemble averaged");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{short_config, two_bloc_corpus};

    fn trained_checkpoint(dir: &Path) -> PathBuf {
        trained_with(short_config(2), dir)
    }

    fn trained_with(config: SamplerConfig, dir: &Path) -> PathBuf {
        let mut trainer = Sampler::new(config, two_bloc_corpus(4, 2)).unwrap();
        let summary = trainer.train(Some(dir)).unwrap();
        summary.checkpoints.last().unwrap().clone()
    }

    #[test]
    fn test_identical_checkpoints_average_to_single_prediction() {
        let work = tempfile::tempdir().unwrap();
        let source = trained_checkpoint(work.path());
        let replicas = work.path().join("replicas");
        std::fs::create_dir_all(&replicas).unwrap();
        for name in ["a.zip", "b.zip", "c.zip"] {
            std::fs::copy(&source, replicas.join(name)).unwrap();
        }

        let heldout = two_bloc_corpus(2, 2);
        let partials = work.path().join("partial");
        let averaged = run(&short_config(2), &heldout, &replicas, &partials).unwrap();

        let mut single = Sampler::new(short_config(2), heldout).unwrap();
        let expected = single.test(&source, None, None).unwrap();
        assert_eq!(averaged.len(), expected.len());
        for (a, b, p) in expected.iter() {
            let q = averaged.get(a, b).unwrap();
            assert!((p - q).abs() < 1e-12, "({a}, {b}): {p} vs {q}");
        }
        for stem in ["a", "b", "c"] {
            let partial = PredictionTable::read(&partials.join(format!("{stem}.txt"))).unwrap();
            assert_eq!(partial.len(), expected.len());
        }
    }

    #[test]
    fn test_lexical_replicas_average_to_single_prediction() {
        let work = tempfile::tempdir().unwrap();
        let mut config = short_config(2);
        config.lexical_l2 = 0.1;
        let source = trained_with(config.clone(), work.path());
        let replicas = work.path().join("replicas");
        std::fs::create_dir_all(&replicas).unwrap();
        for name in ["a.zip", "b.zip"] {
            std::fs::copy(&source, replicas.join(name)).unwrap();
        }

        let heldout = two_bloc_corpus(2, 2);
        let averaged = run(&config, &heldout, &replicas, &work.path().join("partial")).unwrap();
        let plain = run(&short_config(2), &heldout, &replicas, &work.path().join("plain")).unwrap();

        let mut single = Sampler::new(config, heldout).unwrap();
        let expected = single.test(&source, None, None).unwrap();
        assert!(single.lexical().is_some());
        assert_eq!(averaged.len(), expected.len());
        for (a, b, p) in expected.iter() {
            let q = averaged.get(a, b).unwrap();
            assert!((p - q).abs() < 1e-12, "({a}, {b}): {p} vs {q}");
        }
        assert!(averaged
            .iter()
            .any(|(a, b, p)| (p - plain.get(a, b).unwrap()).abs() > 1e-9));
    }

    #[test]
    fn test_in_matrix_average_over_one_checkpoint() {
        let work = tempfile::tempdir().unwrap();
        let source = trained_checkpoint(work.path());
        let only = work.path().join("only");
        std::fs::create_dir_all(&only).unwrap();
        std::fs::copy(&source, only.join("iter-6.zip")).unwrap();

        let table = average_in_matrix(&short_config(2), &two_bloc_corpus(4, 2), &only).unwrap();
        assert_eq!(table.len(), 4 * 2);
        assert!(table.iter().all(|(_, _, p)| p > 0.0 && p < 1.0));
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &short_config(2),
            &two_bloc_corpus(2, 2),
            dir.path(),
            &dir.path().join("partial"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no checkpoints"), "{err}");
    }
}
