//! Distributions and numeric helpers used by the sampler.
//!
//! - `DirMult`: count-based Dirichlet-multinomial with closed-form
//!   predictive probability and marginal log-likelihood.
//! - `TopicProfile`: exact per-author topic usage (`za`).
//! - `SparseVector`: sorted sparse weights for the lexical regression.
//! - `MinMaxNormalizer`: per-feature min-max scaling fit on training rows.
//! - `slice`: shrinking slice step for positive hyperparameters.

mod dirmult;
mod normalize;
mod profile;
pub mod slice;
mod sparse;

use rand::Rng;
use statrs::distribution::{Continuous, Normal};

use crate::error::{Error, Result};

pub use dirmult::DirMult;
pub use normalize::MinMaxNormalizer;
pub use profile::TopicProfile;
pub use sparse::SparseVector;

/// Probabilities handed to callers never touch 0 or 1.
pub const PROB_EPSILON: f64 = 1e-12;

/// Log-density of `N(mean, variance)` at `x`.
pub fn log_normal(x: f64, mean: f64, variance: f64) -> f64 {
    match Normal::new(mean, variance.sqrt()) {
        Ok(normal) => normal.ln_pdf(x),
        Err(_) => f64::NEG_INFINITY,
    }
}

/// Logistic function, evaluated without overflow on either tail.
pub fn sigmoid(score: f64) -> f64 {
    if score >= 0.0 {
        1.0 / (1.0 + (-score).exp())
    } else {
        let e = score.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^s)`.
pub fn softplus(score: f64) -> f64 {
    score.max(0.0) + (-score.abs()).exp().ln_1p()
}

/// Bernoulli log-likelihood of `outcome` under a logistic link.
pub fn log_bernoulli(outcome: f64, score: f64) -> f64 {
    outcome * score - softplus(score)
}

/// Sigmoid clamped into the open unit interval.
pub fn probability(score: f64) -> f64 {
    sigmoid(score).clamp(PROB_EPSILON, 1.0 - PROB_EPSILON)
}

/// Draw an index from unnormalized non-negative weights.
///
/// Only indices with positive weight are ever returned. When rounding
/// leaves the draw past the end, the last positive index is taken.
pub fn sample_scaled<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Result<usize> {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return Err(Error::Numeric(format!(
            "cannot sample from weights summing to {} over {} outcomes",
            total,
            weights.len()
        )));
    }
    let target = rng.gen::<f64>() * total;
    let mut acc = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        acc += w;
        if w > 0.0 && target < acc {
            return Ok(i);
        }
    }
    weights
        .iter()
        .rposition(|&w| w > 0.0)
        .ok_or_else(|| Error::Numeric("no positive weight".into()))
}

/// `min(1, exp(log_proposed - log_current))`, clamped to [0, 1].
pub fn acceptance_ratio(log_current: f64, log_proposed: f64) -> f64 {
    let ratio = (log_proposed - log_current).exp();
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}
