//! Per-bill sparse word regression added to every vote score.
//!
//! Each author is described by their L1-normalized word counts; each bill
//! carries a min-max normalizer fit over the authors who voted on it and a
//! sparse weight vector. The author-bill dot products are cached in
//! `scores` and refreshed whenever weights or features change.

use std::path::Path;

use tracing::{debug, info};

use super::update::outcome;
use super::Sampler;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::optim::{DiffFunction, Owlqn, OwlqnConfig};
use crate::stats::{self, MinMaxNormalizer, SparseVector};

/// File in the output directory holding a fitted regression for reuse.
pub const INIT_LEXREG_FILE: &str = "init-lexreg.txt";

#[derive(Clone, Debug, PartialEq)]
pub struct LexicalState {
    /// `[A]` raw L1-normalized word counts.
    pub(crate) features: Vec<SparseVector>,
    /// `[B]`
    pub(crate) normalizers: Vec<MinMaxNormalizer>,
    /// `[B]` word weights.
    pub(crate) weights: Vec<SparseVector>,
    /// `[A][B]` cached `normalized(f_a) . w_b`.
    pub(crate) scores: Vec<Vec<f64>>,
}

impl LexicalState {
    /// Features for `corpus` with no fitted bills yet.
    pub fn empty(corpus: &Corpus) -> Self {
        Self {
            features: author_word_features(corpus),
            normalizers: vec![MinMaxNormalizer::default(); corpus.num_bills],
            weights: vec![SparseVector::new(); corpus.num_bills],
            scores: vec![vec![0.0; corpus.num_bills]; corpus.num_authors],
        }
    }

    /// Fit every bill's normalizer over the authors with observed votes on it.
    pub fn fit_normalizers(&mut self, corpus: &Corpus) {
        for (b, normalizer) in self.normalizers.iter_mut().enumerate() {
            let rows = (0..corpus.num_authors)
                .filter(|&a| corpus.votes.observed(a, b).is_some())
                .map(|a| &self.features[a]);
            *normalizer = MinMaxNormalizer::fit(rows);
        }
    }

    /// Replace normalizers and weights with previously fitted ones.
    pub fn install(&mut self, normalizers: Vec<MinMaxNormalizer>, weights: Vec<SparseVector>) {
        self.normalizers = normalizers;
        self.weights = weights;
        self.refresh_scores();
    }

    pub fn normalizers(&self) -> &[MinMaxNormalizer] {
        &self.normalizers
    }

    pub fn weights(&self) -> &[SparseVector] {
        &self.weights
    }

    pub fn score(&self, author: usize, bill: usize) -> f64 {
        self.scores[author][bill]
    }

    /// Author `a`'s features as seen by bill `b`.
    pub fn design_row(&self, author: usize, bill: usize) -> SparseVector {
        self.normalizers[bill].transform(&self.features[author])
    }

    pub fn refresh_scores(&mut self) {
        for a in 0..self.features.len() {
            for b in 0..self.weights.len() {
                self.scores[a][b] = if self.weights[b].is_empty() {
                    0.0
                } else {
                    self.design_row(a, b).dot_sparse(&self.weights[b])
                };
            }
        }
    }
}

/// L1-normalized word counts of every author over all of their documents.
pub fn author_word_features(corpus: &Corpus) -> Vec<SparseVector> {
    let mut features = vec![SparseVector::new(); corpus.num_authors];
    for doc in &corpus.documents {
        for &w in &doc.tokens {
            features[doc.author].change(w, 1.0);
        }
    }
    for f in features.iter_mut() {
        f.normalize();
    }
    features
}

/// Penalized logistic loss of one bill's word weights.
///
/// `-Σ_a [y s - ln(1 + e^s)] + l2 |w|²` with `s = base_a + f_a . w`; the L1
/// part is left to the solver.
pub struct LexicalObjective {
    pub vocab_size: usize,
    pub l2: f64,
    /// `(normalized features, base score, outcome)` per observed vote.
    pub rows: Vec<(SparseVector, f64, f64)>,
}

impl DiffFunction for LexicalObjective {
    fn dimension(&self) -> usize {
        self.vocab_size
    }

    fn evaluate(&self, w: &[f64], grad: &mut [f64]) -> f64 {
        let mut value = 0.0;
        for (g, &wi) in grad.iter_mut().zip(w) {
            value += self.l2 * wi * wi;
            *g = 2.0 * self.l2 * wi;
        }
        for (row, base, y) in &self.rows {
            let s = base + row.dot(w);
            value -= stats::log_bernoulli(*y, s);
            let residual = y - stats::sigmoid(s);
            for (i, f) in row.iter() {
                grad[i] -= f * residual;
            }
        }
        value
    }
}

impl Sampler {
    /// Fit every bill's word weights against its observed votes, holding
    /// topics and bill positions fixed.
    pub fn update_lexical_regression(&mut self) {
        let Some(lexical) = self.lexical.as_ref() else {
            return;
        };
        let solver = Owlqn::new(OwlqnConfig::with_max_iters(self.config.lexical_max_iters));
        let mut weights = Vec::with_capacity(self.corpus.num_bills);
        for b in 0..self.corpus.num_bills {
            let rows: Vec<(SparseVector, f64, f64)> = (0..self.corpus.num_authors)
                .filter_map(|a| {
                    let vote = self.corpus.votes.observed(a, b)?;
                    Some((
                        lexical.design_row(a, b),
                        self.topic_score(a, b),
                        outcome(vote),
                    ))
                })
                .collect();
            if rows.is_empty() {
                weights.push(SparseVector::new());
                continue;
            }
            let objective = LexicalObjective {
                vocab_size: self.corpus.vocab_size,
                l2: self.config.lexical_l2,
                rows,
            };
            let start = lexical.weights[b].to_dense(self.corpus.vocab_size);
            let min = solver.minimize(&objective, &start, self.config.lexical_l1);
            debug!(
                bill = b,
                value = min.value,
                iterations = min.iterations,
                "lexical fit"
            );
            weights.push(SparseVector::from_dense(&min.x));
        }
        if let Some(lexical) = self.lexical.as_mut() {
            lexical.weights = weights;
            lexical.refresh_scores();
        }
    }

    /// Out-of-matrix score without the lexical term.
    fn topic_score(&self, author: usize, bill: usize) -> f64 {
        let k = self.config.num_topics;
        let x = &self.xs[bill];
        x[k] + self.za[author]
            .iter()
            .map(|(t, w)| w * self.eta[t] * x[t])
            .sum::<f64>()
    }

    /// Build lexical state after assignments exist: reuse a cached fit from
    /// `output_dir` when present, otherwise fit and cache it.
    pub(crate) fn initialize_lexical(&mut self, output_dir: Option<&Path>) -> Result<()> {
        let mut lexical = LexicalState::empty(&self.corpus);
        let cache = output_dir.map(|dir| dir.join(INIT_LEXREG_FILE));

        if let Some(path) = cache.as_deref().filter(|p| p.exists()) {
            info!(path = %path.display(), "loading cached lexical regression");
            let text = std::fs::read_to_string(path)
                .map_err(|e| Error::io("read lexical cache", path, e))?;
            let (normalizers, weights) = crate::checkpoint::codec::decode_lexical(
                &text,
                self.corpus.num_bills,
                self.corpus.vocab_size,
            )
            .map_err(|e| e.in_checkpoint(path))?;
            lexical.install(normalizers, weights);
            self.lexical = Some(lexical);
            return Ok(());
        }

        info!("fitting lexical regression");
        lexical.fit_normalizers(&self.corpus);
        self.lexical = Some(lexical);
        self.update_lexical_regression();

        if let (Some(path), Some(lexical)) = (cache, self.lexical.as_ref()) {
            let text = crate::checkpoint::codec::encode_lexical(
                &lexical.normalizers,
                &lexical.weights,
                self.corpus.vocab_size,
            );
            std::fs::write(&path, text).map_err(|e| Error::io("write lexical cache", &path, e))?;
        }
        Ok(())
    }
}
