//! Input contract: tokenized documents, their authors, and the vote matrix.
//!
//! The corpus is immutable once loaded. Train/test and known/unknown author
//! partitions are expressed through `VoteMatrix::mask`, never by dropping
//! rows, so indices stay stable across every stage.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub author: usize,
    pub tokens: Vec<usize>,
}

/// Outcome matrix `[author][bill]` with a parallel validity mask.
///
/// A vote is *observed* when its mask entry is set and its outcome is
/// present; only observed votes enter optimisation and the likelihood.
/// Prediction covers every masked pair.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteMatrix {
    pub outcomes: Vec<Vec<Option<bool>>>,
    pub mask: Vec<Vec<bool>>,
}

impl VoteMatrix {
    /// Matrix with every present outcome masked in.
    pub fn fully_masked(outcomes: Vec<Vec<Option<bool>>>) -> Self {
        let mask = outcomes
            .iter()
            .map(|row| row.iter().map(|o| o.is_some()).collect())
            .collect();
        Self { outcomes, mask }
    }

    pub fn num_authors(&self) -> usize {
        self.outcomes.len()
    }

    pub fn num_bills(&self) -> usize {
        self.outcomes.first().map_or(0, Vec::len)
    }

    pub fn is_masked(&self, author: usize, bill: usize) -> bool {
        self.mask[author][bill]
    }

    /// Outcome of a masked, present vote.
    pub fn observed(&self, author: usize, bill: usize) -> Option<bool> {
        if self.mask[author][bill] {
            self.outcomes[author][bill]
        } else {
            None
        }
    }

    /// Same outcomes under a different mask.
    pub fn with_mask(&self, mask: Vec<Vec<bool>>) -> Self {
        Self {
            outcomes: self.outcomes.clone(),
            mask,
        }
    }

    /// Authors with at least one observed vote.
    pub fn valid_authors(&self) -> Vec<bool> {
        (0..self.num_authors())
            .map(|a| (0..self.num_bills()).any(|b| self.observed(a, b).is_some()))
            .collect()
    }

    /// Bills with at least one observed vote.
    pub fn valid_bills(&self) -> Vec<bool> {
        (0..self.num_bills())
            .map(|b| (0..self.num_authors()).any(|a| self.observed(a, b).is_some()))
            .collect()
    }

    /// Masked `(author, bill)` pairs in row-major order.
    pub fn masked_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.mask.iter().enumerate().flat_map(|(a, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, &m)| m)
                .map(move |(b, _)| (a, b))
        })
    }

    fn check_shape(&self, authors: usize, bills: usize) -> Result<()> {
        if self.outcomes.len() != authors || self.mask.len() != authors {
            return Err(Error::Corpus(format!(
                "vote matrix has {} outcome rows and {} mask rows, expected {}",
                self.outcomes.len(),
                self.mask.len(),
                authors
            )));
        }
        for (a, (row, mask)) in self.outcomes.iter().zip(&self.mask).enumerate() {
            if row.len() != bills || mask.len() != bills {
                return Err(Error::Corpus(format!(
                    "vote row {} has {} outcomes and {} mask entries, expected {}",
                    a,
                    row.len(),
                    mask.len(),
                    bills
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub vocab_size: usize,
    pub num_authors: usize,
    pub num_bills: usize,
    pub documents: Vec<Document>,
    pub votes: VoteMatrix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_names: Option<Vec<String>>,
}

impl Corpus {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let corpus: Corpus =
            serde_json::from_str(content).map_err(|e| Error::Corpus(e.to_string()))?;
        corpus.check()?;
        Ok(corpus)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::io("read corpus", path, e))?;
        Self::from_json_str(&content)
    }

    /// Reject out-of-range ids and a vote matrix of the wrong shape.
    pub fn check(&self) -> Result<()> {
        for (d, doc) in self.documents.iter().enumerate() {
            if doc.author >= self.num_authors {
                return Err(Error::Corpus(format!(
                    "document {} has author {} but there are {} authors",
                    d, doc.author, self.num_authors
                )));
            }
            if let Some(&t) = doc.tokens.iter().find(|&&t| t >= self.vocab_size) {
                return Err(Error::Corpus(format!(
                    "document {} has token {} outside vocabulary of {}",
                    d, t, self.vocab_size
                )));
            }
        }
        self.votes.check_shape(self.num_authors, self.num_bills)?;
        if let Some(vocab) = &self.vocab {
            if vocab.len() != self.vocab_size {
                return Err(Error::Corpus(format!(
                    "vocabulary lists {} words, vocab_size is {}",
                    vocab.len(),
                    self.vocab_size
                )));
            }
        }
        Ok(())
    }

    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }

    pub fn num_tokens(&self) -> usize {
        self.documents.iter().map(|d| d.tokens.len()).sum()
    }

    /// Token count of every author over all of their documents.
    pub fn author_token_totals(&self) -> Vec<u32> {
        let mut totals = vec![0u32; self.num_authors];
        for doc in &self.documents {
            totals[doc.author] += doc.tokens.len() as u32;
        }
        totals
    }

    /// Same documents scored against another vote matrix.
    pub fn with_votes(&self, votes: VoteMatrix) -> Result<Self> {
        let corpus = Self {
            votes,
            ..self.clone()
        };
        corpus.check()?;
        Ok(corpus)
    }

    pub fn word(&self, v: usize) -> String {
        match &self.vocab {
            Some(vocab) => vocab[v].clone(),
            None => v.to_string(),
        }
    }

    pub fn author_name(&self, a: usize) -> String {
        match &self.author_names {
            Some(names) => names[a].clone(),
            None => a.to_string(),
        }
    }

    pub fn bill_name(&self, b: usize) -> String {
        match &self.bill_names {
            Some(names) => names[b].clone(),
            None => b.to_string(),
        }
    }
}
