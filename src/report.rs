//! Plain-text dumps written next to the checkpoints.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::{Error, Result};
use crate::sampler::Sampler;

pub const TRACE_FILE: &str = "llh.txt";
pub const AUTHORS_FILE: &str = "authors.txt";
pub const BILLS_FILE: &str = "bills.txt";
pub const TOP_WORDS_FILE: &str = "top-words.txt";

/// Topics ranked by `eta` descending, each as `[Topic k, count, eta]`
/// followed by its `n` most probable words.
pub fn top_words(sampler: &Sampler, n: usize) -> String {
    let corpus = sampler.corpus();
    let eta = sampler.eta();
    let mut topics: Vec<usize> = (0..sampler.num_topics()).collect();
    topics.sort_by(|&a, &b| eta[b].total_cmp(&eta[a]));

    let mut out = String::new();
    for t in topics {
        let tw = &sampler.topic_words()[t];
        let mut words: Vec<usize> = (0..corpus.vocab_size).collect();
        words.sort_by(|&a, &b| tw.probability(b).total_cmp(&tw.probability(a)).then(a.cmp(&b)));
        let ranked: Vec<String> = words.into_iter().take(n).map(|w| corpus.word(w)).collect();
        let _ = writeln!(out, "[Topic {}, {}, {}]", t, tw.total(), eta[t]);
        let _ = writeln!(out, "{}", ranked.join("\t"));
        out.push('\n');
    }
    out
}

pub fn write_top_words(path: &Path, sampler: &Sampler, n: usize) -> Result<()> {
    write(path, "write top words", &top_words(sampler, n))
}

/// One name line per row, then `row<TAB>dim<TAB>value` for each coordinate.
fn points(names: impl Iterator<Item = String>, rows: &[Vec<f64>]) -> String {
    let mut out = String::new();
    for (i, (name, row)) in names.zip(rows).enumerate() {
        let _ = writeln!(out, "{}", name);
        for (k, v) in row.iter().enumerate() {
            let _ = writeln!(out, "{}\t{}\t{}", i, k, v);
        }
    }
    out
}

pub fn write_author_points(path: &Path, sampler: &Sampler) -> Result<()> {
    let corpus = sampler.corpus();
    let names = (0..corpus.num_authors).map(|a| corpus.author_name(a));
    write(path, "write author points", &points(names, sampler.author_points()))
}

pub fn write_bill_points(path: &Path, sampler: &Sampler) -> Result<()> {
    let corpus = sampler.corpus();
    let names = (0..corpus.num_bills).map(|b| corpus.bill_name(b));
    write(path, "write bill points", &points(names, sampler.bill_points()))
}

/// One log-likelihood per line.
pub fn write_trace(path: &Path, trace: &[f64]) -> Result<()> {
    let mut out = String::new();
    for llh in trace {
        let _ = writeln!(out, "{}", llh);
    }
    write(path, "write likelihood trace", &out)
}

fn write(path: &Path, action: &'static str, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| Error::io(action, path, e))
}
