use std::path::PathBuf;

use clap::Args;

use textideal::{ensemble, Result};

use super::CommonArgs;

#[derive(Args)]
pub struct EnsembleArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Directory of training checkpoints
    #[arg(long)]
    pub checkpoints: PathBuf,
    /// Directory for per-checkpoint predictions
    #[arg(long, default_value = "partial")]
    pub partial: PathBuf,
    /// Write averaged predictions here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Average in-matrix predictions of the training corpus instead
    #[arg(long)]
    pub in_matrix: bool,
}

pub fn cmd_ensemble(args: EnsembleArgs) -> Result<()> {
    let (config, corpus) = args.common.load()?;
    let predictions = if args.in_matrix {
        ensemble::average_in_matrix(&config, &corpus, &args.checkpoints)?
    } else {
        ensemble::run(&config, &corpus, &args.checkpoints, &args.partial)?
    };
    super::finish(&corpus, &predictions, args.output.as_deref())
}
