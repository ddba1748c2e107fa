//! Sparse `(author, bill) -> probability` tables.
//!
//! Text form, one author per line:
//!
//! ```text
//! 3	0:0.81 4:0.12
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PredictionTable {
    rows: BTreeMap<usize, BTreeMap<usize, f64>>,
}

impl PredictionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, author: usize, bill: usize, probability: f64) {
        self.rows.entry(author).or_default().insert(bill, probability);
    }

    pub fn get(&self, author: usize, bill: usize) -> Option<f64> {
        self.rows.get(&author).and_then(|r| r.get(&bill)).copied()
    }

    /// Number of `(author, bill)` entries.
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in author then bill order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .flat_map(|(&a, row)| row.iter().map(move |(&b, &p)| (a, b, p)))
    }

    /// Elementwise sum; entries missing on one side count as zero.
    pub fn add(&mut self, other: &PredictionTable) {
        for (a, b, p) in other.iter() {
            *self.rows.entry(a).or_default().entry(b).or_insert(0.0) += p;
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for row in self.rows.values_mut() {
            for p in row.values_mut() {
                *p *= factor;
            }
        }
    }

    /// Elementwise mean of `tables`; `None` when there are none.
    pub fn average<'a, I>(tables: I) -> Option<PredictionTable>
    where
        I: IntoIterator<Item = &'a PredictionTable>,
    {
        let mut sum = PredictionTable::new();
        let mut count = 0usize;
        for t in tables {
            sum.add(t);
            count += 1;
        }
        if count == 0 {
            return None;
        }
        sum.scale(1.0 / count as f64);
        Some(sum)
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (a, row) in &self.rows {
            let entries: Vec<String> = row.iter().map(|(b, p)| format!("{}:{}", b, p)).collect();
            out.push_str(&format!("{}\t{}\n", a, entries.join(" ")));
        }
        out
    }

    pub fn decode(text: &str) -> Result<Self> {
        let malformed = |line: usize, message: String| Error::Malformed {
            segment: "prediction",
            line: line + 1,
            message,
        };
        let mut table = PredictionTable::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (author, entries) = line.split_once('\t').unwrap_or((line, ""));
            let author: usize = author
                .trim()
                .parse()
                .map_err(|e| malformed(i, format!("bad author '{}': {}", author, e)))?;
            table.rows.entry(author).or_default();
            for pair in entries.split_whitespace() {
                let (bill, p) = pair
                    .split_once(':')
                    .ok_or_else(|| malformed(i, format!("bad entry '{}'", pair)))?;
                let bill: usize = bill
                    .parse()
                    .map_err(|e| malformed(i, format!("bad bill '{}': {}", bill, e)))?;
                let p: f64 = p
                    .parse()
                    .map_err(|e| malformed(i, format!("bad probability '{}': {}", p, e)))?;
                table.set(author, bill, p);
            }
        }
        Ok(table)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.encode()).map_err(|e| Error::io("write predictions", path, e))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| Error::io("read predictions", path, e))?;
        Self::decode(&text)
    }
}
