//! Joint sampler for topic assignments and ideal points.
//!
//! One `Sampler` owns every piece of mutable state for one chain: the
//! collapsed topic-word and document-topic counts, per-token assignments,
//! per-author topic profiles (`za`), the topic regression weights (`eta`),
//! author ideal points (`us`) and bill positions (`xs`, intercept last).
//! The corpus and configuration are owned copies, so independent samplers
//! can run on separate threads without sharing anything.
//!
//! Submodules add behaviour to `Sampler` by stage:
//!
//! - `init` / `lda`: model and data structures, random or LDA warm start
//! - `sweep`: the per-token Gibbs draw with its Metropolis-Hastings check
//! - `update`: eta refit and gradient ascent over `us` and `xs`
//! - `lexical`: optional per-bill sparse word regression
//! - `likelihood` / `hyper`: joint log-likelihood, validation, slice sampling
//! - `predict` / `run`: predictions and the train/test drivers

mod hyper;
mod init;
mod lda;
mod lexical;
mod likelihood;
mod predict;
mod run;
mod sweep;
mod update;

#[cfg(test)]
mod tests;

use std::fmt;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::SamplerConfig;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::stats::{DirMult, TopicProfile};

pub use hyper::Hyperparams;
pub use lexical::{LexicalObjective, LexicalState};
pub use likelihood::LikelihoodBreakdown;
pub use run::TrainSummary;
pub use sweep::{SweepPlan, SweepStats};
pub use update::EtaObjective;

/// Lifecycle of a sampler.
///
/// Training runs `Uninitialized -> Initialized -> Iterating -> Terminal`;
/// testing runs `LoadedForTest -> TestIterating -> Terminal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Iterating,
    Terminal,
    LoadedForTest,
    TestIterating,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Initialized => "initialized",
            Phase::Iterating => "iterating",
            Phase::Terminal => "terminal",
            Phase::LoadedForTest => "loaded for test",
            Phase::TestIterating => "test iterating",
        };
        f.write_str(s)
    }
}

pub struct Sampler {
    pub(crate) config: SamplerConfig,
    pub(crate) corpus: Corpus,
    pub(crate) rng: Xoshiro256PlusPlus,
    pub(crate) phase: Phase,
    pub(crate) hyper: Hyperparams,
    pub(crate) sampled_hyper: Vec<Hyperparams>,

    /// `[K]` word distributions, dimension V.
    pub(crate) topic_words: Vec<DirMult>,
    /// `[D]` topic counts, dimension K.
    pub(crate) doc_topics: Vec<DirMult>,
    /// `[D][N_d]` topic of every token.
    pub(crate) z: Vec<Vec<usize>>,
    /// `[A]` normalized topic usage.
    pub(crate) za: Vec<TopicProfile>,
    /// `[K]`
    pub(crate) eta: Vec<f64>,
    /// `[A][K]`
    pub(crate) us: Vec<Vec<f64>>,
    /// `[B][K + 1]`, intercept at index K.
    pub(crate) xs: Vec<Vec<f64>>,

    pub(crate) valid_authors: Vec<bool>,
    pub(crate) valid_bills: Vec<bool>,
    pub(crate) lexical: Option<LexicalState>,

    pub(crate) trace: Vec<f64>,
    pub(crate) iteration: usize,
}

impl Sampler {
    /// Allocate an uninitialized sampler over `corpus`.
    ///
    /// Rejects an invalid configuration or corpus before anything is drawn.
    pub fn new(config: SamplerConfig, corpus: Corpus) -> Result<Self> {
        config.validate()?;
        corpus.check()?;

        let hyper = Hyperparams {
            alpha: config.alpha,
            beta: config.beta,
        };
        let k = config.num_topics;
        let valid_authors = corpus.votes.valid_authors();
        let valid_bills = corpus.votes.valid_bills();

        let mut sampler = Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(config.seed),
            phase: Phase::Uninitialized,
            hyper,
            sampled_hyper: Vec::new(),
            topic_words: Vec::new(),
            doc_topics: Vec::new(),
            z: Vec::new(),
            za: Vec::new(),
            eta: vec![0.0; k],
            us: vec![vec![0.0; k]; corpus.num_authors],
            xs: vec![vec![0.0; k + 1]; corpus.num_bills],
            valid_authors,
            valid_bills,
            lexical: None,
            trace: Vec::new(),
            iteration: 0,
            config,
            corpus,
        };
        sampler.topic_words = sampler.empty_topic_words(None)?;
        sampler.reset_data_structures();
        Ok(sampler)
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn num_topics(&self) -> usize {
        self.config.num_topics
    }

    pub fn hyperparameters(&self) -> Hyperparams {
        self.hyper
    }

    /// Hyperparameter values accepted by each slice-sampling round.
    pub fn sampled_hyperparameters(&self) -> &[Hyperparams] {
        &self.sampled_hyper
    }

    pub fn topic_words(&self) -> &[DirMult] {
        &self.topic_words
    }

    pub fn doc_topics(&self) -> &[DirMult] {
        &self.doc_topics
    }

    pub fn assignments(&self) -> &[Vec<usize>] {
        &self.z
    }

    pub fn profiles(&self) -> &[TopicProfile] {
        &self.za
    }

    pub fn eta(&self) -> &[f64] {
        &self.eta
    }

    pub fn author_points(&self) -> &[Vec<f64>] {
        &self.us
    }

    pub fn bill_points(&self) -> &[Vec<f64>] {
        &self.xs
    }

    pub fn lexical(&self) -> Option<&LexicalState> {
        self.lexical.as_ref()
    }

    /// Joint log-likelihood recorded at every report interval.
    pub fn trace(&self) -> &[f64] {
        &self.trace
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Fresh per-topic word distributions, optionally centered on seeds.
    pub(crate) fn empty_topic_words(&self, seeded: Option<&[Vec<f64>]>) -> Result<Vec<DirMult>> {
        let k = self.config.num_topics;
        let v = self.corpus.vocab_size;
        let concentration = self.hyper.beta * v as f64;
        match seeded {
            None => Ok((0..k).map(|_| DirMult::uniform(v, concentration)).collect()),
            Some(seeds) => {
                if seeds.len() != k {
                    return Err(Error::mismatch("seeded topic count", k, seeds.len()));
                }
                seeds
                    .iter()
                    .map(|mean| {
                        if mean.len() != v {
                            return Err(Error::mismatch("seeded topic dimension", v, mean.len()));
                        }
                        Ok(DirMult::centered(concentration, mean.clone()))
                    })
                    .collect()
            }
        }
    }

    /// Reset everything that depends on the documents: assignments,
    /// document-topic counts and author profiles.
    pub(crate) fn reset_data_structures(&mut self) {
        let k = self.config.num_topics;
        let concentration = self.hyper.alpha * k as f64;
        self.z = self
            .corpus
            .documents
            .iter()
            .map(|d| vec![0; d.tokens.len()])
            .collect();
        self.doc_topics = (0..self.corpus.num_documents())
            .map(|_| DirMult::uniform(k, concentration))
            .collect();
        self.za = self
            .corpus
            .author_token_totals()
            .into_iter()
            .map(TopicProfile::new)
            .collect();
    }

    pub(crate) fn lexical_score(&self, author: usize, bill: usize) -> f64 {
        self.lexical
            .as_ref()
            .map_or(0.0, |lex| lex.score(author, bill))
    }

    /// Vote score from the fitted ideal point `u`.
    pub(crate) fn in_matrix_score(&self, author: usize, bill: usize) -> f64 {
        let k = self.config.num_topics;
        let x = &self.xs[bill];
        let dot: f64 = self.us[author].iter().zip(&x[..k]).map(|(u, x)| u * x).sum();
        x[k] + dot + self.lexical_score(author, bill)
    }

    /// Vote score from the text-predicted ideal point `za * eta`.
    pub(crate) fn out_matrix_score(&self, author: usize, bill: usize) -> f64 {
        let k = self.config.num_topics;
        let x = &self.xs[bill];
        let dot: f64 = self.za[author]
            .iter()
            .map(|(t, w)| w * self.eta[t] * x[t])
            .sum();
        x[k] + dot + self.lexical_score(author, bill)
    }

    pub(crate) fn require_phase(&self, operation: &'static str, allowed: &[Phase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(Error::Phase {
                operation,
                phase: self.phase.to_string(),
            })
        }
    }
}
