//! Text encoding of checkpoint segments.
//!
//! Every segment opens with a tab-separated header of its dimensions.
//! Decoding checks the header against the expected dimensions, every
//! declared index against its position, and rejects trailing rows.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::stats::{DirMult, MinMaxNormalizer, SparseVector};

/// Line reader that reports 1-based line numbers.
struct Cursor<'a> {
    segment: &'static str,
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(segment: &'static str, text: &'a str) -> Self {
        Self {
            segment,
            lines: text.lines().enumerate(),
        }
    }

    fn malformed(&self, line: usize, message: impl Into<String>) -> Error {
        Error::Malformed {
            segment: self.segment,
            line,
            message: message.into(),
        }
    }

    fn next(&mut self) -> Result<(usize, &'a str)> {
        match self.lines.next() {
            Some((i, line)) => Ok((i + 1, line)),
            None => Err(Error::Malformed {
                segment: self.segment,
                line: 0,
                message: "unexpected end of segment".into(),
            }),
        }
    }

    fn parse<T>(&self, line: usize, field: &str, raw: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        raw.trim()
            .parse()
            .map_err(|e| self.malformed(line, format!("bad {} '{}': {}", field, raw, e)))
    }

    /// Header line of named dimensions, each checked against its expected value.
    fn header(&mut self, dims: &[(&str, usize)]) -> Result<()> {
        let (line, text) = self.next()?;
        let fields: Vec<&str> = text.split('\t').collect();
        if fields.len() != dims.len() {
            return Err(self.malformed(
                line,
                format!("header has {} fields, expected {}", fields.len(), dims.len()),
            ));
        }
        for (raw, (name, expected)) in fields.iter().zip(dims) {
            let found: usize = self.parse(line, name, raw)?;
            if found != *expected {
                return Err(Error::mismatch(
                    format!("{} {}", self.segment, name),
                    expected,
                    found,
                ));
            }
        }
        Ok(())
    }

    /// Index line that must equal its position in the sequence.
    fn index(&mut self, what: &str, expected: usize) -> Result<()> {
        let (line, text) = self.next()?;
        let found: usize = self.parse(line, what, text)?;
        if found != expected {
            return Err(Error::mismatch(
                format!("{} {} index", self.segment, what),
                expected,
                found,
            ));
        }
        Ok(())
    }

    fn dirmult(&mut self, dim: usize) -> Result<DirMult> {
        let (line, text) = self.next()?;
        let d = DirMult::decode(text).map_err(|e| self.malformed(line, e))?;
        if d.dim() != dim {
            return Err(Error::mismatch(
                format!("{} distribution dimension", self.segment),
                dim,
                d.dim(),
            ));
        }
        Ok(d)
    }

    fn finish(mut self) -> Result<()> {
        for (i, line) in self.lines.by_ref() {
            if !line.trim().is_empty() {
                return Err(Error::Malformed {
                    segment: self.segment,
                    line: i + 1,
                    message: "trailing row after last declared entry".into(),
                });
            }
        }
        Ok(())
    }
}

/// `K<TAB>V`, then per topic: index, eta, word distribution.
pub fn encode_model(topic_words: &[DirMult], eta: &[f64], vocab_size: usize) -> String {
    let mut out = format!("{}\t{}\n", topic_words.len(), vocab_size);
    for (t, (tw, e)) in topic_words.iter().zip(eta).enumerate() {
        out.push_str(&format!("{}\n{}\n{}\n", t, e, tw.encode()));
    }
    out
}

pub fn decode_model(text: &str, k: usize, v: usize) -> Result<(Vec<DirMult>, Vec<f64>)> {
    let mut cur = Cursor::new("model", text);
    cur.header(&[("topic count", k), ("vocabulary size", v)])?;
    let mut topic_words = Vec::with_capacity(k);
    let mut eta = Vec::with_capacity(k);
    for t in 0..k {
        cur.index("topic", t)?;
        let (line, raw) = cur.next()?;
        eta.push(cur.parse(line, "eta", raw)?);
        topic_words.push(cur.dirmult(v)?);
    }
    cur.finish()?;
    Ok((topic_words, eta))
}

/// `D`, then per document: index, topic counts, tab-separated assignments.
pub fn encode_assignments(doc_topics: &[DirMult], z: &[Vec<usize>]) -> String {
    let mut out = format!("{}\n", doc_topics.len());
    for (d, (dt, zd)) in doc_topics.iter().zip(z).enumerate() {
        let assignments: Vec<String> = zd.iter().map(|t| t.to_string()).collect();
        out.push_str(&format!("{}\n{}\n{}\n", d, dt.encode(), assignments.join("\t")));
    }
    out
}

/// Decode against the corpus document lengths; counts must agree with
/// the assignments they summarize.
pub fn decode_assignments(
    text: &str,
    doc_lengths: &[usize],
    k: usize,
) -> Result<(Vec<DirMult>, Vec<Vec<usize>>)> {
    let mut cur = Cursor::new("assignment", text);
    cur.header(&[("document count", doc_lengths.len())])?;
    let mut doc_topics = Vec::with_capacity(doc_lengths.len());
    let mut z = Vec::with_capacity(doc_lengths.len());
    for (d, &len) in doc_lengths.iter().enumerate() {
        cur.index("document", d)?;
        let dt = cur.dirmult(k)?;
        let (line, raw) = cur.next()?;
        let zd = raw
            .split('\t')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                let t: usize = cur.parse(line, "assignment", s)?;
                if t >= k {
                    return Err(cur.malformed(line, format!("assignment {} outside {} topics", t, k)));
                }
                Ok(t)
            })
            .collect::<Result<Vec<usize>>>()?;
        if zd.len() != len {
            return Err(Error::mismatch(
                format!("token count of document {}", d),
                len,
                zd.len(),
            ));
        }
        let mut counts = vec![0u32; k];
        for &t in &zd {
            counts[t] += 1;
        }
        if let Some(t) = (0..k).find(|&t| counts[t] != dt.count(t)) {
            return Err(Error::mismatch(
                format!("topic {} count of document {}", t, d),
                counts[t],
                dt.count(t),
            ));
        }
        doc_topics.push(dt);
        z.push(zd);
    }
    cur.finish()?;
    Ok((doc_topics, z))
}

/// `N<TAB>dim`, then one `row<TAB>col<TAB>value` line per entry.
pub fn encode_points(rows: &[Vec<f64>], dim: usize) -> String {
    let mut out = format!("{}\t{}\n", rows.len(), dim);
    for (i, row) in rows.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            out.push_str(&format!("{}\t{}\t{}\n", i, j, v));
        }
    }
    out
}

/// Decode a bill (`segment = "bill"`) or author point matrix.
pub fn decode_points(text: &str, segment: &'static str, n: usize, dim: usize) -> Result<Vec<Vec<f64>>> {
    let mut cur = Cursor::new(segment, text);
    cur.header(&[("count", n), ("dimension", dim)])?;
    let mut rows = vec![vec![0.0; dim]; n];
    for (i, row) in rows.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            let (line, raw) = cur.next()?;
            let fields: Vec<&str> = raw.split('\t').collect();
            if fields.len() != 3 {
                return Err(cur.malformed(line, format!("expected 3 fields, found {}", fields.len())));
            }
            let fi: usize = cur.parse(line, "row", fields[0])?;
            let fj: usize = cur.parse(line, "column", fields[1])?;
            if (fi, fj) != (i, j) {
                return Err(Error::mismatch(
                    format!("{} entry", segment),
                    format!("{}:{}", i, j),
                    format!("{}:{}", fi, fj),
                ));
            }
            *value = cur.parse(line, "value", fields[2])?;
        }
    }
    cur.finish()?;
    Ok(rows)
}

/// `B<TAB>V`, then per bill: index, normalizer, sparse weights.
pub fn encode_lexical(
    normalizers: &[MinMaxNormalizer],
    weights: &[SparseVector],
    vocab_size: usize,
) -> String {
    let mut out = format!("{}\t{}\n", weights.len(), vocab_size);
    for (b, (n, w)) in normalizers.iter().zip(weights).enumerate() {
        out.push_str(&format!("{}\n{}\n{}\n", b, n.encode(), w.encode()));
    }
    out
}

pub fn decode_lexical(
    text: &str,
    num_bills: usize,
    vocab_size: usize,
) -> Result<(Vec<MinMaxNormalizer>, Vec<SparseVector>)> {
    let mut cur = Cursor::new("lexical", text);
    cur.header(&[("bill count", num_bills), ("vocabulary size", vocab_size)])?;
    let mut normalizers = Vec::with_capacity(num_bills);
    let mut weights = Vec::with_capacity(num_bills);
    for b in 0..num_bills {
        cur.index("bill", b)?;
        let (line, raw) = cur.next()?;
        let n = MinMaxNormalizer::decode(raw).map_err(|e| cur.malformed(line, e))?;
        if let Some(i) = n.max_feature().filter(|&i| i >= vocab_size) {
            return Err(cur.malformed(line, format!("normalizer feature {} outside vocabulary", i)));
        }
        normalizers.push(n);
        let (line, raw) = cur.next()?;
        let w = SparseVector::decode(raw).map_err(|e| cur.malformed(line, e))?;
        if let Some(i) = w.max_index().filter(|&i| i >= vocab_size) {
            return Err(cur.malformed(line, format!("weight index {} outside vocabulary", i)));
        }
        weights.push(w);
    }
    cur.finish()?;
    Ok((normalizers, weights))
}
