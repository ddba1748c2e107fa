use tracing::debug;

use super::Sampler;
use crate::optim::{DiffFunction, Owlqn, OwlqnConfig};
use crate::stats::{self, TopicProfile};

/// Ridge fit of `eta` so that `za * eta` tracks the fitted ideal points.
///
/// `Σ_{valid a} Σ_k ½ (u[a][k] - za[a][k] eta[k])² / rho + Σ_k ½ eta[k]² / sigma`
pub struct EtaObjective<'a> {
    pub num_topics: usize,
    pub profiles: &'a [TopicProfile],
    pub points: &'a [Vec<f64>],
    pub valid: &'a [bool],
    pub rho: f64,
    pub sigma: f64,
}

impl DiffFunction for EtaObjective<'_> {
    fn dimension(&self) -> usize {
        self.num_topics
    }

    fn evaluate(&self, eta: &[f64], grad: &mut [f64]) -> f64 {
        let mut value = 0.0;
        for (k, g) in grad.iter_mut().enumerate() {
            value += 0.5 * eta[k] * eta[k] / self.sigma;
            *g = eta[k] / self.sigma;
        }
        for ((profile, u), _) in self
            .profiles
            .iter()
            .zip(self.points)
            .zip(self.valid)
            .filter(|(_, &valid)| valid)
        {
            for (k, &uk) in u.iter().enumerate() {
                let w = profile.weight(k);
                let diff = uk - w * eta[k];
                value += 0.5 * diff * diff / self.rho;
                grad[k] -= diff * w / self.rho;
            }
        }
        value
    }
}

impl Sampler {
    /// Refit the topic regression weights with the current `us` and `za`.
    pub fn update_etas(&mut self) {
        let objective = EtaObjective {
            num_topics: self.config.num_topics,
            profiles: &self.za,
            points: &self.us,
            valid: &self.valid_authors,
            rho: self.config.rho,
            sigma: self.config.sigma,
        };
        let solver = Owlqn::new(OwlqnConfig::with_max_iters(self.config.eta_max_iters));
        let min = solver.minimize(&objective, &self.eta, 0.0);
        debug!(
            value = min.value,
            iterations = min.iterations,
            termination = ?min.termination,
            "eta update"
        );
        self.eta = min.x;
    }

    /// `num_steps` gradient-ascent passes: every valid author, then every
    /// valid bill.
    pub fn update_ux(&mut self) {
        for _ in 0..self.config.num_steps {
            self.update_us();
            self.update_xs();
        }
    }

    fn update_us(&mut self) {
        let k = self.config.num_topics;
        let rate = self.config.learning_rate;
        let rho = self.config.rho;
        for a in 0..self.corpus.num_authors {
            if !self.valid_authors[a] {
                continue;
            }
            let mut grad = vec![0.0; k];
            for b in 0..self.corpus.num_bills {
                let Some(vote) = self.corpus.votes.observed(a, b) else {
                    continue;
                };
                let residual = outcome(vote) - stats::sigmoid(self.in_matrix_score(a, b));
                for (g, x) in grad.iter_mut().zip(&self.xs[b][..k]) {
                    *g += x * residual;
                }
            }
            let profile = &self.za[a];
            for (t, g) in grad.iter_mut().enumerate() {
                *g -= (self.us[a][t] - profile.weight(t) * self.eta[t]) / rho;
            }
            for (u, g) in self.us[a].iter_mut().zip(&grad) {
                *u += rate * g;
            }
        }
    }

    fn update_xs(&mut self) {
        let k = self.config.num_topics;
        let rate = self.config.learning_rate;
        let gamma = self.config.gamma;
        for b in 0..self.corpus.num_bills {
            if !self.valid_bills[b] {
                continue;
            }
            let mut grad = vec![0.0; k + 1];
            for a in 0..self.corpus.num_authors {
                let Some(vote) = self.corpus.votes.observed(a, b) else {
                    continue;
                };
                let residual = outcome(vote) - stats::sigmoid(self.in_matrix_score(a, b));
                for (g, u) in grad.iter_mut().zip(&self.us[a]) {
                    *g += u * residual;
                }
                grad[k] += residual;
            }
            for (x, g) in self.xs[b].iter_mut().zip(grad.iter_mut()) {
                *g -= *x / gamma;
                *x += rate * *g;
            }
        }
    }
}

pub(crate) fn outcome(vote: bool) -> f64 {
    if vote {
        1.0
    } else {
        0.0
    }
}
