use std::collections::BTreeMap;

/// Sparse real vector keyed by feature index, kept in index order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVector {
    entries: BTreeMap<usize, f64>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the non-zero entries of a dense vector.
    pub fn from_dense(values: &[f64]) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .collect();
        Self { entries }
    }

    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut out = vec![0.0; dim];
        for (&i, &v) in &self.entries {
            if i < dim {
                out[i] = v;
            }
        }
        out
    }

    pub fn get(&self, index: usize) -> f64 {
        self.entries.get(&index).copied().unwrap_or(0.0)
    }

    /// Set an entry; zero removes it.
    pub fn set(&mut self, index: usize, value: f64) {
        if value == 0.0 {
            self.entries.remove(&index);
        } else {
            self.entries.insert(index, value);
        }
    }

    pub fn change(&mut self, index: usize, delta: f64) {
        let v = self.get(index) + delta;
        self.set(index, v);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().map(|(&i, &v)| (i, v))
    }

    pub fn sum(&self) -> f64 {
        self.entries.values().sum()
    }

    pub fn max_index(&self) -> Option<usize> {
        self.entries.keys().next_back().copied()
    }

    /// Scale so the entries sum to one (no-op on an all-zero vector).
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum != 0.0 {
            for v in self.entries.values_mut() {
                *v /= sum;
            }
        }
    }

    /// Dot product with a dense vector.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter(|(&i, _)| i < dense.len())
            .map(|(&i, &v)| v * dense[i])
            .sum()
    }

    /// Dot product with another sparse vector.
    pub fn dot_sparse(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().map(|(i, v)| v * large.get(i)).sum()
    }

    /// Space-separated `index:value` pairs.
    pub fn encode(&self) -> String {
        self.entries
            .iter()
            .map(|(i, v)| format!("{}:{}", i, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn decode(line: &str) -> Result<Self, String> {
        let mut out = SparseVector::new();
        for pair in line.split_whitespace() {
            let (i, v) = pair
                .split_once(':')
                .ok_or_else(|| format!("bad sparse entry '{}'", pair))?;
            let i: usize = i.parse().map_err(|e| format!("bad index '{}': {}", i, e))?;
            let v: f64 = v.parse().map_err(|e| format!("bad value '{}': {}", v, e))?;
            out.set(i, v);
        }
        Ok(out)
    }
}
