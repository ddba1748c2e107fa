use std::collections::BTreeMap;

/// Normalized topic usage of one author across all of their tokens.
///
/// Held as integer counts over the author's token total, so a topic's
/// entry disappears exactly when its last token leaves and the weights sum
/// to `assigned / total` without drift.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopicProfile {
    counts: BTreeMap<usize, u32>,
    assigned: u32,
    total: u32,
}

impl TopicProfile {
    /// Profile for an author owning `total` tokens.
    pub fn new(total: u32) -> Self {
        Self {
            counts: BTreeMap::new(),
            assigned: 0,
            total,
        }
    }

    pub fn add(&mut self, topic: usize) {
        *self.counts.entry(topic).or_insert(0) += 1;
        self.assigned += 1;
    }

    pub fn remove(&mut self, topic: usize) -> Result<(), String> {
        match self.counts.get_mut(&topic) {
            Some(c) if *c > 1 => *c -= 1,
            Some(_) => {
                self.counts.remove(&topic);
            }
            None => return Err(format!("topic {} has no mass in profile", topic)),
        }
        self.assigned -= 1;
        Ok(())
    }

    /// `za[topic]`.
    pub fn weight(&self, topic: usize) -> f64 {
        match self.counts.get(&topic) {
            Some(&c) if self.total > 0 => c as f64 / self.total as f64,
            _ => 0.0,
        }
    }

    /// Weight one extra token would add.
    pub fn unit(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            1.0 / self.total as f64
        }
    }

    pub fn sum(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.assigned as f64 / self.total as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn assigned(&self) -> u32 {
        self.assigned
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Non-zero `(topic, weight)` pairs in topic order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        let total = self.total.max(1) as f64;
        self.counts.iter().map(move |(&k, &c)| (k, c as f64 / total))
    }

    /// Dense `za` over `k` topics.
    pub fn dense(&self, k: usize) -> Vec<f64> {
        let mut out = vec![0.0; k];
        for (topic, w) in self.iter() {
            out[topic] = w;
        }
        out
    }

    /// `Σ_k za[k] * coeffs[k]`.
    pub fn dot(&self, coeffs: &[f64]) -> f64 {
        self.iter().map(|(k, w)| w * coeffs[k]).sum()
    }
}
