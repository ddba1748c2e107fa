//! Plain collapsed-Gibbs LDA, used only to seed assignments.

use rand::Rng;
use tracing::debug;

use super::sweep::topic_weights;
use crate::corpus::Document;
use crate::error::{Error, Result};
use crate::stats::{self, DirMult};

pub(crate) struct Lda {
    alpha: f64,
    topic_words: Vec<DirMult>,
    doc_topics: Vec<DirMult>,
    z: Vec<Vec<usize>>,
}

impl Lda {
    pub(crate) fn new(documents: &[Document], k: usize, v: usize, alpha: f64, beta: f64) -> Self {
        Self {
            alpha,
            topic_words: (0..k).map(|_| DirMult::uniform(v, beta * v as f64)).collect(),
            doc_topics: documents
                .iter()
                .map(|_| DirMult::uniform(k, alpha * k as f64))
                .collect(),
            z: documents.iter().map(|d| vec![0; d.tokens.len()]).collect(),
        }
    }

    /// One add-only pass followed by `iterations` full sweeps.
    pub(crate) fn run<R: Rng + ?Sized>(
        mut self,
        documents: &[Document],
        iterations: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<usize>>> {
        self.sweep(documents, false, rng)?;
        for iter in 0..iterations {
            let changed = self.sweep(documents, true, rng)?;
            debug!(iter, changed, "lda sweep");
        }
        Ok(self.z)
    }

    fn sweep<R: Rng + ?Sized>(
        &mut self,
        documents: &[Document],
        remove: bool,
        rng: &mut R,
    ) -> Result<usize> {
        let mut changed = 0;
        for (d, doc) in documents.iter().enumerate() {
            for (n, &word) in doc.tokens.iter().enumerate() {
                let current = self.z[d][n];
                if remove {
                    self.topic_words[current]
                        .decrement(word)
                        .and_then(|_| self.doc_topics[d].decrement(current))
                        .map_err(|e| Error::consistency(format!("lda document {}", d), e))?;
                }
                let probs = topic_weights(&self.doc_topics[d], &self.topic_words, word, self.alpha);
                let chosen = stats::sample_scaled(&probs, rng)?;
                if remove && chosen != current {
                    changed += 1;
                }
                self.z[d][n] = chosen;
                self.topic_words[chosen].increment(word);
                self.doc_topics[d].increment(chosen);
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn lda_separates_disjoint_vocabularies() {
        let docs: Vec<Document> = (0..10)
            .map(|i| Document {
                author: 0,
                tokens: if i % 2 == 0 {
                    vec![0, 1, 0, 1, 0, 1, 0, 1]
                } else {
                    vec![2, 3, 2, 3, 2, 3, 2, 3]
                },
            })
            .collect();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let z = Lda::new(&docs, 2, 4, 0.1, 0.01).run(&docs, 50, &mut rng).unwrap();
        assert_eq!(z.len(), 10);
        assert!(z.iter().flatten().all(|&t| t < 2));
        // Each document ends up dominated by a single topic.
        for doc in &z {
            let ones = doc.iter().filter(|&&t| t == 1).count();
            assert!(ones <= 1 || ones >= doc.len() - 1, "{doc:?}");
        }
    }
}
