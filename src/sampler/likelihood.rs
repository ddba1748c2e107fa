use tracing::debug;

use super::update::outcome;
use super::{Hyperparams, Sampler};
use crate::error::{Error, Result};
use crate::stats;

/// Tolerance on a complete author profile summing to one.
const PROFILE_TOLERANCE: f64 = 1e-5;

/// Components of the joint log-likelihood.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LikelihoodBreakdown {
    pub word: f64,
    pub topic: f64,
    pub vote: f64,
    pub u_prior: f64,
    pub eta_prior: f64,
    pub x_prior: f64,
}

impl LikelihoodBreakdown {
    pub fn total(&self) -> f64 {
        self.word + self.topic + self.vote + self.u_prior + self.eta_prior + self.x_prior
    }
}

impl Sampler {
    pub fn joint_log_likelihood(&self) -> f64 {
        self.likelihood_breakdown().total()
    }

    /// Joint log-likelihood under substitute hyperparameters, at the
    /// current latent state.
    pub fn joint_log_likelihood_with(&self, hyper: Hyperparams) -> f64 {
        self.breakdown_with(hyper).total()
    }

    pub fn likelihood_breakdown(&self) -> LikelihoodBreakdown {
        self.breakdown_with(self.hyper)
    }

    fn breakdown_with(&self, hyper: Hyperparams) -> LikelihoodBreakdown {
        let k = self.config.num_topics;
        let v = self.corpus.vocab_size;
        let word_conc = hyper.beta * v as f64;
        let topic_conc = hyper.alpha * k as f64;

        let word = self
            .topic_words
            .iter()
            .map(|tw| tw.log_likelihood_with(word_conc))
            .sum();
        let topic = self
            .doc_topics
            .iter()
            .map(|dt| dt.log_likelihood_with(topic_conc))
            .sum();

        let mut vote = 0.0;
        for a in 0..self.corpus.num_authors {
            for b in 0..self.corpus.num_bills {
                if let Some(y) = self.corpus.votes.observed(a, b) {
                    vote += stats::log_bernoulli(outcome(y), self.in_matrix_score(a, b));
                }
            }
        }

        let mut u_prior = 0.0;
        for (a, u) in self.us.iter().enumerate() {
            if !self.valid_authors[a] {
                continue;
            }
            for (t, &ut) in u.iter().enumerate() {
                let mean = self.za[a].weight(t) * self.eta[t];
                u_prior += stats::log_normal(ut, mean, self.config.rho);
            }
        }

        let eta_prior = self
            .eta
            .iter()
            .map(|&e| stats::log_normal(e, 0.0, self.config.sigma))
            .sum();

        let mut x_prior = 0.0;
        for (b, x) in self.xs.iter().enumerate() {
            if !self.valid_bills[b] {
                continue;
            }
            x_prior += x
                .iter()
                .map(|&xv| stats::log_normal(xv, 0.0, self.config.gamma))
                .sum::<f64>();
        }

        LikelihoodBreakdown {
            word,
            topic,
            vote,
            u_prior,
            eta_prior,
            x_prior,
        }
    }

    /// Check every count table and profile against the assignments.
    pub fn validate(&self, context: &str) -> Result<()> {
        debug!(context, "validating");
        let k = self.config.num_topics;
        let fail = |message: String| Error::consistency(context, message);

        for (t, tw) in self.topic_words.iter().enumerate() {
            tw.validate().map_err(|e| fail(format!("topic {}: {}", t, e)))?;
        }

        let mut assigned = 0usize;
        for (d, dt) in self.doc_topics.iter().enumerate() {
            dt.validate().map_err(|e| fail(format!("document {}: {}", d, e)))?;
            let len = self.corpus.documents[d].tokens.len();
            if dt.total() as usize != len {
                return Err(fail(format!(
                    "document {} has {} counted tokens but length {}",
                    d,
                    dt.total(),
                    len
                )));
            }
            if let Some(&bad) = self.z[d].iter().find(|&&t| t >= k) {
                return Err(fail(format!(
                    "document {} has assignment {} outside {} topics",
                    d, bad, k
                )));
            }
            assigned += dt.total() as usize;
        }
        if assigned != self.corpus.num_tokens() {
            return Err(fail(format!(
                "{} tokens assigned but corpus has {}",
                assigned,
                self.corpus.num_tokens()
            )));
        }

        for (a, profile) in self.za.iter().enumerate() {
            if profile.is_empty() {
                continue;
            }
            let sum = profile.sum();
            if (sum - 1.0).abs() > PROFILE_TOLERANCE {
                return Err(fail(format!("profile of author {} sums to {}", a, sum)));
            }
        }
        Ok(())
    }
}
