use std::process;

use clap::{Parser, Subcommand};
use tracing::{error, Level};

mod cli;

#[derive(Parser)]
#[command(
    name = "textideal",
    version,
    about = "Topic-driven ideal points: predict votes from what legislators say"
)]
struct Cli {
    /// Log per-sweep statistics
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a sampler on a corpus with observed votes
    Train(cli::train::TrainArgs),
    /// Predict held-out votes from one training checkpoint
    Test(cli::test::TestArgs),
    /// Average predictions over a directory of checkpoints
    Ensemble(cli::ensemble::EnsembleArgs),
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Train(args) => cli::train::cmd_train(args),
        Command::Test(args) => cli::test::cmd_test(args),
        Command::Ensemble(args) => cli::ensemble::cmd_ensemble(args),
    };
    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
