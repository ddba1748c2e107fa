use std::path::PathBuf;

use clap::Args;
use tracing::info;

use textideal::{checkpoint, Error, Result, Sampler};

use super::CommonArgs;

#[derive(Args)]
pub struct TrainArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Output directory for checkpoints and reports
    #[arg(short, long)]
    pub output: PathBuf,
    /// Seed word distributions, one per topic (JSON array of arrays)
    #[arg(long, value_name = "PATH", conflicts_with = "resume")]
    pub topics: Option<PathBuf>,
    /// Continue training from a checkpoint
    #[arg(long, value_name = "PATH")]
    pub resume: Option<PathBuf>,
}

pub fn cmd_train(args: TrainArgs) -> Result<()> {
    let (config, corpus) = args.common.load()?;
    let mut sampler = Sampler::new(config, corpus)?;

    if let Some(path) = &args.resume {
        checkpoint::load_state(&mut sampler, path)?;
    } else if let Some(path) = &args.topics {
        let seeds = read_topics(path)?;
        sampler.initialize_with_topics(Some(&seeds), Some(&args.output))?;
    }

    let summary = sampler.train(Some(&args.output))?;
    info!(
        iterations = summary.iterations,
        llh = summary.log_likelihood,
        alpha = summary.hyperparameters.alpha,
        beta = summary.hyperparameters.beta,
        checkpoints = summary.checkpoints.len(),
        "done"
    );
    Ok(())
}

fn read_topics(path: &std::path::Path) -> Result<Vec<Vec<f64>>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io("read seed topics", path, e))?;
    serde_json::from_str(&text)
        .map_err(|e| Error::Config(format!("seed topics {}: {}", path.display(), e)))
}
