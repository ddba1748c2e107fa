pub mod checkpoint;
pub mod config;
pub mod corpus;
pub mod ensemble;
pub mod error;
pub mod metrics;
pub mod optim;
pub mod predictions;
pub mod report;
pub mod sampler;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SamplerConfig;
pub use corpus::{Corpus, Document, VoteMatrix};
pub use error::{Error, Result};
pub use predictions::PredictionTable;
pub use sampler::{Phase, Sampler, TrainSummary};
