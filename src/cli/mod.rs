pub mod ensemble;
pub mod train;

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use textideal::{metrics, Corpus, PredictionTable, Result, SamplerConfig};

/// Inputs every subcommand needs.
#[derive(Args)]
pub struct CommonArgs {
    /// Sampler configuration (TOML)
    #[arg(short, long)]
    pub config: PathBuf,
    /// Corpus with documents and votes (JSON)
    #[arg(long)]
    pub corpus: PathBuf,
}

impl CommonArgs {
    pub fn load(&self) -> Result<(SamplerConfig, Corpus)> {
        let config = SamplerConfig::from_file(&self.config)?;
        let corpus = Corpus::from_json_file(&self.corpus)?;
        info!(
            config = %self.config.display(),
            corpus = %self.corpus.display(),
            authors = corpus.num_authors,
            bills = corpus.num_bills,
            documents = corpus.num_documents(),
            "loaded inputs"
        );
        Ok((config, corpus))
    }
}

/// Log every metric of `predictions` against the corpus votes and
/// optionally write the table.
pub fn finish(corpus: &Corpus, predictions: &PredictionTable, out: Option<&Path>) -> Result<()> {
    for m in metrics::evaluate(&corpus.votes, predictions) {
        info!(metric = m.name, value = m.value, "evaluation");
    }
    if let Some(path) = out {
        predictions.write(path)?;
        info!(path = %path.display(), entries = predictions.len(), "predictions written");
    }
    Ok(())
}
