use rand::Rng;
use tracing::debug;

use super::Sampler;
use crate::error::{Error, Result};
use crate::stats::{self, DirMult, TopicProfile};

/// Which counts a sweep touches, and whether proposals face the
/// ideal-point likelihood.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepPlan {
    pub remove_from_model: bool,
    pub add_to_model: bool,
    pub remove_from_data: bool,
    pub add_to_data: bool,
    pub observe: bool,
}

impl SweepPlan {
    /// First pass over unassigned tokens.
    pub const INITIAL: SweepPlan = SweepPlan {
        remove_from_model: false,
        add_to_model: true,
        remove_from_data: false,
        add_to_data: true,
        observe: false,
    };

    /// Full training sweep with the Metropolis-Hastings correction.
    pub const TRAIN: SweepPlan = SweepPlan {
        remove_from_model: true,
        add_to_model: true,
        remove_from_data: true,
        add_to_data: true,
        observe: true,
    };

    /// Test-time sweep against a frozen model.
    pub fn test(first: bool) -> SweepPlan {
        SweepPlan {
            remove_from_model: false,
            add_to_model: false,
            remove_from_data: !first,
            add_to_data: true,
            observe: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub tokens: usize,
    pub accepted: usize,
    pub changed: usize,
}

impl Sampler {
    /// Visit every token once, in document then token order.
    pub fn sample_sweep(&mut self, plan: SweepPlan) -> Result<SweepStats> {
        let alpha = self.hyper.alpha;
        let rho = self.config.rho;
        let mut stats = SweepStats::default();

        for (d, doc) in self.corpus.documents.iter().enumerate() {
            let a = doc.author;
            let observe = plan.observe && self.valid_authors[a];
            for (n, &word) in doc.tokens.iter().enumerate() {
                let current = self.z[d][n];
                if plan.remove_from_model {
                    self.topic_words[current]
                        .decrement(word)
                        .map_err(|e| token_error("topic-word", d, n, e))?;
                }
                if plan.remove_from_data {
                    self.doc_topics[d]
                        .decrement(current)
                        .map_err(|e| token_error("document-topic", d, n, e))?;
                    self.za[a]
                        .remove(current)
                        .map_err(|e| token_error("author profile", d, n, e))?;
                }

                let probs = topic_weights(&self.doc_topics[d], &self.topic_words, word, alpha);
                let proposed = stats::sample_scaled(&probs, &mut self.rng)?;

                let accept = !observe
                    || accept_proposal(
                        &self.za[a],
                        &self.us[a],
                        &self.eta,
                        rho,
                        current,
                        proposed,
                        &mut self.rng,
                    );
                let chosen = if accept {
                    stats.accepted += 1;
                    if proposed != current {
                        stats.changed += 1;
                    }
                    proposed
                } else {
                    current
                };
                self.z[d][n] = chosen;
                stats.tokens += 1;

                if plan.add_to_model {
                    self.topic_words[chosen].increment(word);
                }
                if plan.add_to_data {
                    self.doc_topics[d].increment(chosen);
                    self.za[a].add(chosen);
                }
            }
        }

        debug!(
            tokens = stats.tokens,
            accepted = stats.accepted,
            changed = stats.changed,
            "sweep"
        );
        Ok(stats)
    }
}

fn token_error(counts: &str, doc: usize, token: usize, message: String) -> Error {
    Error::consistency(format!("{} counts at document {} token {}", counts, doc, token), message)
}

/// Metropolis-Hastings test of moving one token from `current` to
/// `proposed`, given the author's profile with the token removed.
///
/// Only the two affected dimensions of `u` change mean between the two
/// hypotheses, so the ratio is taken over exactly those.
fn accept_proposal<R: Rng + ?Sized>(
    profile: &TopicProfile,
    u: &[f64],
    eta: &[f64],
    rho: f64,
    current: usize,
    proposed: usize,
    rng: &mut R,
) -> bool {
    if current == proposed {
        return true;
    }
    let unit = profile.unit();
    let mean = |topic: usize, extra: f64| (profile.weight(topic) + extra) * eta[topic];

    let log_current = stats::log_normal(u[current], mean(current, unit), rho)
        + stats::log_normal(u[proposed], mean(proposed, 0.0), rho);
    let log_proposed = stats::log_normal(u[current], mean(current, 0.0), rho)
        + stats::log_normal(u[proposed], mean(proposed, unit), rho);

    rng.gen::<f64>() < stats::acceptance_ratio(log_current, log_proposed)
}

/// Predictive weights `(n_dk + alpha) * P(word | k)`.
pub(crate) fn topic_weights(doc: &DirMult, topics: &[DirMult], word: usize, alpha: f64) -> Vec<f64> {
    topics
        .iter()
        .enumerate()
        .map(|(t, tw)| (doc.count(t) as f64 + alpha) * tw.probability(word))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn proposal_equal_to_current_is_always_accepted() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let p = TopicProfile::new(4);
        assert!(accept_proposal(&p, &[100.0, -100.0], &[1.0, 1.0], 1.0, 1, 1, &mut rng));
    }

    #[test]
    fn proposal_toward_ideal_point_is_accepted() {
        // u pulls strongly toward topic 1: moving a token there only helps.
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let mut p = TopicProfile::new(2);
        p.add(0);
        for _ in 0..50 {
            assert!(accept_proposal(&p, &[0.0, 5.0], &[5.0, 5.0], 1.0, 0, 1, &mut rng));
        }
    }

    #[test]
    fn proposal_away_from_ideal_point_is_mostly_rejected() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);
        let mut p = TopicProfile::new(2);
        p.add(0);
        let accepted = (0..200)
            .filter(|_| accept_proposal(&p, &[10.0, -10.0], &[10.0, 10.0], 0.1, 0, 1, &mut rng))
            .count();
        assert!(accepted < 5, "accepted = {accepted}");
    }

    #[test]
    fn test_plans_freeze_the_model() {
        let first = SweepPlan::test(true);
        assert!(!first.remove_from_data && first.add_to_data && !first.add_to_model);
        let later = SweepPlan::test(false);
        assert!(later.remove_from_data && !later.remove_from_model && !later.observe);
    }

    #[test]
    fn topic_weights_follow_predictive() {
        let mut doc = DirMult::uniform(2, 1.0);
        doc.increment(1);
        let topics = vec![DirMult::uniform(3, 3.0), DirMult::uniform(3, 3.0)];
        let w = topic_weights(&doc, &topics, 0, 0.5);
        assert!((w[0] - 0.5 / 3.0).abs() < 1e-12);
        assert!((w[1] - 1.5 / 3.0).abs() < 1e-12);
    }
}
