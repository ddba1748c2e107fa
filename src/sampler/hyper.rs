use tracing::info;

use super::Sampler;
use crate::stats::slice::{slice_step, SliceConfig};

/// Dirichlet pseudo-counts: `alpha` over topics per document, `beta` over
/// words per topic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hyperparams {
    pub alpha: f64,
    pub beta: f64,
}

impl Sampler {
    /// One slice step for `alpha`, then one for `beta`, each leveled at the
    /// current joint log-likelihood. Values that cannot match that level
    /// are left unchanged.
    pub fn slice_sample_hyperparameters(&mut self) {
        let config = SliceConfig::default();
        let mut rng = self.rng.clone();
        let start = self.hyper;

        let current = self.joint_log_likelihood_with(start);
        let alpha = slice_step(
            start.alpha,
            current,
            |alpha| self.joint_log_likelihood_with(Hyperparams { alpha, ..start }),
            &config,
            &mut rng,
        );
        let after_alpha = Hyperparams {
            alpha: alpha.value,
            ..start
        };

        let beta = slice_step(
            after_alpha.beta,
            alpha.log_target,
            |beta| self.joint_log_likelihood_with(Hyperparams { beta, ..after_alpha }),
            &config,
            &mut rng,
        );
        let sampled = Hyperparams {
            beta: beta.value,
            ..after_alpha
        };

        self.rng = rng;
        self.update_hyperparameters(sampled);
        self.sampled_hyper.push(sampled);
        info!(
            alpha = sampled.alpha,
            beta = sampled.beta,
            llh = beta.log_target,
            "hyperparameters sampled"
        );
    }

    /// Set hyperparameters and every concentration derived from them.
    pub fn update_hyperparameters(&mut self, hyper: Hyperparams) {
        let k = self.config.num_topics as f64;
        let v = self.corpus.vocab_size as f64;
        self.hyper = hyper;
        for dt in self.doc_topics.iter_mut() {
            dt.set_concentration(hyper.alpha * k);
        }
        for tw in self.topic_words.iter_mut() {
            tw.set_concentration(hyper.beta * v);
        }
    }
}
