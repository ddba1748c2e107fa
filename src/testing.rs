//! Small synthetic corpora shared by unit tests.

use crate::config::{SamplerConfig, Schedule};
use crate::corpus::{Corpus, Document, VoteMatrix};

/// Two blocs of authors with disjoint vocabularies and opposite votes.
///
/// Authors `0..num_authors/2` use words `0..3` and vote yes on every
/// bill; the rest use words `3..6` and vote no.
pub(crate) fn two_bloc_corpus(num_authors: usize, num_bills: usize) -> Corpus {
    let mut documents = Vec::new();
    let mut outcomes = Vec::new();
    for a in 0..num_authors {
        let left = a < num_authors / 2;
        let base = if left { 0 } else { 3 };
        for d in 0..2 {
            let tokens = (0..6).map(|n| base + (n + d + a) % 3).collect();
            documents.push(Document { author: a, tokens });
        }
        outcomes.push(vec![Some(left); num_bills]);
    }
    Corpus {
        vocab_size: 6,
        num_authors,
        num_bills,
        documents,
        votes: VoteMatrix::fully_masked(outcomes),
        vocab: Some((0..6).map(|v| format!("w{}", v)).collect()),
        author_names: None,
        bill_names: None,
    }
}

pub(crate) fn short_config(num_topics: usize) -> SamplerConfig {
    let mut config = SamplerConfig::new(num_topics);
    config.seed = 17;
    config.num_steps = 5;
    config.eta_max_iters = 20;
    config.lexical_max_iters = 20;
    config.debug = true;
    config.schedule = Schedule {
        burn_in: 2,
        max_iter: 6,
        sample_lag: 2,
        report_interval: 2,
    };
    config.test_schedule = Some(Schedule {
        burn_in: 1,
        max_iter: 3,
        sample_lag: 1,
        report_interval: 1,
    });
    config.lda.max_iter = 5;
    config
}
