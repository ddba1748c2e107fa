//! Sampler checkpoints: a zip archive of named text segments.
//!
//! | entry | contents |
//! |---|---|
//! | `{stem}.model` | eta and word counts per topic |
//! | `{stem}.assignment` | topic counts and assignments per document |
//! | `{stem}.bill` | bill positions, `K + 1` per bill |
//! | `{stem}.author` | author ideal points, `K` per author |
//! | `{stem}.lexical` | per-bill normalizer and word weights (lexical runs only) |
//!
//! Any disagreement with the sampler's dimensions is fatal and reported
//! with the checkpoint path.

mod archive;
pub(crate) mod codec;
#[cfg(test)]
mod tests;

use std::path::Path;

use tracing::info;

pub use archive::{stem, Archive, SegmentKind};

use crate::error::Result;
use crate::sampler::{Hyperparams, LexicalState, Phase, Sampler};
use crate::stats::{DirMult, TopicProfile};

/// Write every segment of `sampler`'s state.
pub fn save(sampler: &Sampler, path: &Path) -> Result<()> {
    info!(path = %path.display(), "writing checkpoint");
    let k = sampler.config.num_topics;
    let mut segments = vec![
        (
            SegmentKind::Model,
            codec::encode_model(&sampler.topic_words, &sampler.eta, sampler.corpus.vocab_size),
        ),
        (
            SegmentKind::Assignment,
            codec::encode_assignments(&sampler.doc_topics, &sampler.z),
        ),
        (SegmentKind::Bill, codec::encode_points(&sampler.xs, k + 1)),
        (SegmentKind::Author, codec::encode_points(&sampler.us, k)),
    ];
    if let Some(lex) = &sampler.lexical {
        segments.push((
            SegmentKind::Lexical,
            codec::encode_lexical(&lex.normalizers, &lex.weights, sampler.corpus.vocab_size),
        ));
    }
    archive::write(path, &segments)
}

/// Restore a full training state, e.g. to resume or to predict in-matrix.
pub fn load_state(sampler: &mut Sampler, path: &Path) -> Result<()> {
    sampler.require_phase("load state", &[Phase::Uninitialized, Phase::Initialized])?;
    info!(path = %path.display(), "loading checkpoint state");
    restore_state(sampler, path).map_err(|e| e.in_checkpoint(path))?;
    sampler.phase = Phase::Initialized;
    Ok(())
}

fn restore_state(sampler: &mut Sampler, path: &Path) -> Result<()> {
    let archive = Archive::open(path)?;
    let k = sampler.config.num_topics;
    let corpus = &sampler.corpus;

    let (topic_words, eta) = codec::decode_model(
        archive.segment(SegmentKind::Model)?,
        k,
        corpus.vocab_size,
    )?;
    let lengths: Vec<usize> = corpus.documents.iter().map(|d| d.tokens.len()).collect();
    let (doc_topics, z) =
        codec::decode_assignments(archive.segment(SegmentKind::Assignment)?, &lengths, k)?;
    let xs = codec::decode_points(archive.segment(SegmentKind::Bill)?, "bill", corpus.num_bills, k + 1)?;
    let us = codec::decode_points(archive.segment(SegmentKind::Author)?, "author", corpus.num_authors, k)?;
    let lexical = read_lexical(sampler, &archive)?;

    let mut za: Vec<TopicProfile> = corpus
        .author_token_totals()
        .into_iter()
        .map(TopicProfile::new)
        .collect();
    for (doc, zd) in corpus.documents.iter().zip(&z) {
        for &t in zd {
            za[doc.author].add(t);
        }
    }

    sampler.hyper = stored_hyperparameters(sampler, &topic_words, Some(&doc_topics));
    sampler.topic_words = topic_words;
    sampler.eta = eta;
    sampler.doc_topics = doc_topics;
    sampler.z = z;
    sampler.za = za;
    sampler.xs = xs;
    sampler.us = us;
    sampler.lexical = lexical;
    Ok(())
}

/// Load what a test run needs: model, bill positions and lexical weights.
/// Per-document structures are reset and author points zeroed.
pub fn load_for_test(sampler: &mut Sampler, path: &Path) -> Result<()> {
    sampler.require_phase("load for test", &[Phase::Uninitialized])?;
    info!(path = %path.display(), "loading checkpoint for test");
    restore_for_test(sampler, path).map_err(|e| e.in_checkpoint(path))?;
    sampler.phase = Phase::LoadedForTest;
    Ok(())
}

fn restore_for_test(sampler: &mut Sampler, path: &Path) -> Result<()> {
    let archive = Archive::open(path)?;
    let k = sampler.config.num_topics;
    let (topic_words, eta) = codec::decode_model(
        archive.segment(SegmentKind::Model)?,
        k,
        sampler.corpus.vocab_size,
    )?;
    let xs = codec::decode_points(
        archive.segment(SegmentKind::Bill)?,
        "bill",
        sampler.corpus.num_bills,
        k + 1,
    )?;
    let lexical = read_lexical(sampler, &archive)?;

    sampler.hyper = stored_hyperparameters(sampler, &topic_words, None);
    sampler.topic_words = topic_words;
    sampler.eta = eta;
    sampler.xs = xs;
    sampler.lexical = lexical;
    sampler.reset_data_structures();
    for u in sampler.us.iter_mut() {
        u.iter_mut().for_each(|v| *v = 0.0);
    }
    Ok(())
}

/// Lexical weights when the configuration asks for them; features come
/// from the sampler's own corpus.
fn read_lexical(sampler: &Sampler, archive: &Archive) -> Result<Option<LexicalState>> {
    if !sampler.config.lexical_enabled() {
        return Ok(None);
    }
    let (normalizers, weights) = codec::decode_lexical(
        archive.segment(SegmentKind::Lexical)?,
        sampler.corpus.num_bills,
        sampler.corpus.vocab_size,
    )?;
    let mut lexical = LexicalState::empty(&sampler.corpus);
    lexical.install(normalizers, weights);
    Ok(Some(lexical))
}

/// Recover `alpha` and `beta` from the stored concentrations, which carry
/// any slice-sampled values.
fn stored_hyperparameters(
    sampler: &Sampler,
    topic_words: &[DirMult],
    doc_topics: Option<&[DirMult]>,
) -> Hyperparams {
    let k = sampler.config.num_topics as f64;
    let v = sampler.corpus.vocab_size as f64;
    let mut hyper = sampler.hyper;
    if let Some(tw) = topic_words.first() {
        hyper.beta = tw.concentration() / v;
    }
    if let Some(dt) = doc_topics.and_then(|d| d.first()) {
        hyper.alpha = dt.concentration() / k;
    }
    hyper
}

/// Test-time assignments only, as a single `{stem}.assignment` entry.
pub fn write_assignments(sampler: &Sampler, path: &Path) -> Result<()> {
    info!(path = %path.display(), "writing assignments");
    archive::write(
        path,
        &[(
            SegmentKind::Assignment,
            codec::encode_assignments(&sampler.doc_topics, &sampler.z),
        )],
    )
}
