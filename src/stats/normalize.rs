use std::collections::BTreeMap;

use super::SparseVector;

/// Per-feature min-max scaling fit on a set of sparse rows.
///
/// Features never observed in the fitting rows, or with zero range, map
/// to 0 on transform.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinMaxNormalizer {
    ranges: BTreeMap<usize, (f64, f64)>,
}

impl MinMaxNormalizer {
    /// Fit on `rows`; absent entries count as explicit zeros.
    pub fn fit<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a SparseVector>,
    {
        let mut ranges: BTreeMap<usize, (f64, f64)> = BTreeMap::new();
        let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
        let mut n_rows = 0usize;
        for row in rows {
            n_rows += 1;
            for (i, v) in row.iter() {
                let r = ranges.entry(i).or_insert((v, v));
                r.0 = r.0.min(v);
                r.1 = r.1.max(v);
                *seen.entry(i).or_insert(0) += 1;
            }
        }
        for (i, r) in ranges.iter_mut() {
            if seen.get(i).copied().unwrap_or(0) < n_rows {
                r.0 = r.0.min(0.0);
                r.1 = r.1.max(0.0);
            }
        }
        ranges.retain(|_, r| r.1 > r.0);
        Self { ranges }
    }

    pub fn range(&self, feature: usize) -> Option<(f64, f64)> {
        self.ranges.get(&feature).copied()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Largest feature index with a fitted range.
    pub fn max_feature(&self) -> Option<usize> {
        self.ranges.keys().next_back().copied()
    }

    pub fn transform(&self, row: &SparseVector) -> SparseVector {
        let mut out = SparseVector::new();
        for (&i, &(lo, hi)) in &self.ranges {
            let v = (row.get(i) - lo) / (hi - lo);
            out.set(i, v);
        }
        out
    }

    /// Space-separated `feature:min:max` triples.
    pub fn encode(&self) -> String {
        self.ranges
            .iter()
            .map(|(i, (lo, hi))| format!("{}:{}:{}", i, lo, hi))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn decode(line: &str) -> Result<Self, String> {
        let mut ranges = BTreeMap::new();
        for triple in line.split_whitespace() {
            let parts: Vec<&str> = triple.split(':').collect();
            if parts.len() != 3 {
                return Err(format!("bad normalizer entry '{}'", triple));
            }
            let i: usize = parts[0]
                .parse()
                .map_err(|e| format!("bad feature '{}': {}", parts[0], e))?;
            let lo: f64 = parts[1]
                .parse()
                .map_err(|e| format!("bad min '{}': {}", parts[1], e))?;
            let hi: f64 = parts[2]
                .parse()
                .map_err(|e| format!("bad max '{}': {}", parts[2], e))?;
            ranges.insert(i, (lo, hi));
        }
        Ok(Self { ranges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_zeros_widen_the_range() {
        let rows = [
            SparseVector::from_dense(&[0.5, 0.2]),
            SparseVector::from_dense(&[1.0, 0.0]),
        ];
        let n = MinMaxNormalizer::fit(rows.iter());
        assert_eq!(n.range(0), Some((0.5, 1.0)));
        assert_eq!(n.range(1), Some((0.0, 0.2)));

        let t = n.transform(&rows[0]);
        assert_eq!(t.get(0), 0.0);
        assert!((t.get(1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_features_are_dropped() {
        let rows = [
            SparseVector::from_dense(&[0.3]),
            SparseVector::from_dense(&[0.3]),
        ];
        let n = MinMaxNormalizer::fit(rows.iter());
        assert!(n.is_empty());
        assert!(n.transform(&rows[0]).is_empty());
    }

    #[test]
    fn text_form_parses_back() {
        let rows = [
            SparseVector::from_dense(&[0.0, 0.25, 0.75]),
            SparseVector::from_dense(&[0.5, 0.5, 0.0]),
        ];
        let n = MinMaxNormalizer::fit(rows.iter());
        assert_eq!(MinMaxNormalizer::decode(&n.encode()).unwrap(), n);
    }
}
