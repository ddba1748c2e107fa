use super::Sampler;
use crate::predictions::PredictionTable;
use crate::stats;

impl Sampler {
    /// Vote probabilities for masked pairs from the fitted ideal points.
    pub fn predict_in_matrix(&self) -> PredictionTable {
        self.predict_with(|a, b| self.in_matrix_score(a, b))
    }

    /// Vote probabilities for masked pairs from `za * eta`, for authors
    /// known only through their text.
    pub fn predict_out_matrix(&self) -> PredictionTable {
        self.predict_with(|a, b| self.out_matrix_score(a, b))
    }

    fn predict_with(&self, score: impl Fn(usize, usize) -> f64) -> PredictionTable {
        let mut table = PredictionTable::new();
        for (a, b) in self.corpus.votes.masked_pairs() {
            table.set(a, b, stats::probability(score(a, b)));
        }
        table
    }

    /// `za[a] * eta` for every author.
    pub fn predicted_ideal_points(&self) -> Vec<Vec<f64>> {
        let k = self.config.num_topics;
        self.za
            .iter()
            .map(|profile| (0..k).map(|t| profile.weight(t) * self.eta[t]).collect())
            .collect()
    }

    /// `2K` features per author: `za` followed by `za * eta`.
    pub fn author_features(&self) -> Vec<Vec<f64>> {
        let k = self.config.num_topics;
        self.za
            .iter()
            .map(|profile| {
                let mut row = profile.dense(k);
                row.extend((0..k).map(|t| profile.weight(t) * self.eta[t]));
                row
            })
            .collect()
    }
}
