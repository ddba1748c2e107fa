//! Evaluation of predicted vote probabilities against observed outcomes.

use crate::corpus::VoteMatrix;
use crate::predictions::PredictionTable;
use crate::stats::PROB_EPSILON;

#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub name: &'static str,
    pub value: f64,
}

/// Accuracy at 0.5, mean log-likelihood, and ROC AUC over masked pairs that
/// have both an outcome and a prediction.
pub fn evaluate(votes: &VoteMatrix, predictions: &PredictionTable) -> Vec<Measurement> {
    let pairs: Vec<(bool, f64)> = votes
        .masked_pairs()
        .filter_map(|(a, b)| Some((votes.observed(a, b)?, predictions.get(a, b)?)))
        .collect();
    vec![
        Measurement {
            name: "count",
            value: pairs.len() as f64,
        },
        Measurement {
            name: "accuracy",
            value: accuracy(&pairs),
        },
        Measurement {
            name: "loglikelihood",
            value: mean_log_likelihood(&pairs),
        },
        Measurement {
            name: "auc",
            value: auc(&pairs),
        },
    ]
}

fn accuracy(pairs: &[(bool, f64)]) -> f64 {
    if pairs.is_empty() {
        return f64::NAN;
    }
    let correct = pairs.iter().filter(|&&(y, p)| (p >= 0.5) == y).count();
    correct as f64 / pairs.len() as f64
}

fn mean_log_likelihood(pairs: &[(bool, f64)]) -> f64 {
    if pairs.is_empty() {
        return f64::NAN;
    }
    let total: f64 = pairs
        .iter()
        .map(|&(y, p)| {
            let p = p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
            if y {
                p.ln()
            } else {
                (1.0 - p).ln()
            }
        })
        .sum();
    total / pairs.len() as f64
}

/// Rank-sum AUC with tied scores sharing their average rank.
fn auc(pairs: &[(bool, f64)]) -> f64 {
    let positives = pairs.iter().filter(|(y, _)| *y).count();
    let negatives = pairs.len() - positives;
    if positives == 0 || negatives == 0 {
        return f64::NAN;
    }
    let mut sorted: Vec<(bool, f64)> = pairs.to_vec();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1].1 == sorted[i].1 {
            j += 1;
        }
        // Ranks i+1 ..= j+1 share their mean.
        let rank = (i + j) as f64 / 2.0 + 1.0;
        rank_sum += rank * sorted[i..=j].iter().filter(|(y, _)| *y).count() as f64;
        i = j + 1;
    }
    let p = positives as f64;
    (rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
}
