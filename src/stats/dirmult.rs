use statrs::function::gamma::ln_gamma;

/// Base measure of a Dirichlet prior.
#[derive(Clone, Debug, PartialEq)]
enum Mean {
    Uniform,
    /// Explicit center vector (sums to 1), e.g. a seeded topic.
    Vector(Vec<f64>),
}

/// Dirichlet-multinomial over `dim` outcomes, tracked by counts.
///
/// The prior pseudo-count of outcome `k` is `concentration * mean[k]`.
#[derive(Clone, Debug, PartialEq)]
pub struct DirMult {
    counts: Vec<u32>,
    total: u32,
    concentration: f64,
    mean: Mean,
}

impl DirMult {
    /// Symmetric prior: every outcome gets `concentration / dim`.
    pub fn uniform(dim: usize, concentration: f64) -> Self {
        Self {
            counts: vec![0; dim],
            total: 0,
            concentration,
            mean: Mean::Uniform,
        }
    }

    /// Prior centered on `mean`, which must be a distribution over `dim` outcomes.
    pub fn centered(concentration: f64, mean: Vec<f64>) -> Self {
        Self {
            counts: vec![0; mean.len()],
            total: 0,
            concentration,
            mean: Mean::Vector(mean),
        }
    }

    pub fn dim(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, k: usize) -> u32 {
        self.counts[k]
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn set_concentration(&mut self, concentration: f64) {
        self.concentration = concentration;
    }

    pub fn increment(&mut self, k: usize) {
        self.counts[k] += 1;
        self.total += 1;
    }

    /// Remove one observation of `k`. Fails instead of going negative.
    pub fn decrement(&mut self, k: usize) -> Result<(), String> {
        if self.counts[k] == 0 {
            return Err(format!("count of outcome {} is already zero", k));
        }
        self.counts[k] -= 1;
        self.total -= 1;
        Ok(())
    }

    fn mean_at(&self, k: usize) -> f64 {
        match &self.mean {
            Mean::Uniform => 1.0 / self.counts.len() as f64,
            Mean::Vector(m) => m[k],
        }
    }

    /// Posterior predictive probability of outcome `k`.
    pub fn probability(&self, k: usize) -> f64 {
        (self.counts[k] as f64 + self.concentration * self.mean_at(k))
            / (self.total as f64 + self.concentration)
    }

    /// Marginal log-likelihood of the current counts.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood_with(self.concentration)
    }

    /// Marginal log-likelihood with a substitute concentration.
    ///
    /// Outcomes with zero count contribute nothing, so only observed
    /// outcomes are visited.
    pub fn log_likelihood_with(&self, concentration: f64) -> f64 {
        let mut llh = ln_gamma(concentration) - ln_gamma(self.total as f64 + concentration);
        for (k, &c) in self.counts.iter().enumerate() {
            if c == 0 {
                continue;
            }
            let prior = concentration * self.mean_at(k);
            llh += ln_gamma(c as f64 + prior) - ln_gamma(prior);
        }
        llh
    }

    /// Count total and per-outcome counts agree.
    pub fn validate(&self) -> Result<(), String> {
        let sum: u64 = self.counts.iter().map(|&c| c as u64).sum();
        if sum != self.total as u64 {
            return Err(format!("counts sum to {} but total is {}", sum, self.total));
        }
        Ok(())
    }

    /// Single-line text form: `dim<TAB>concentration<TAB>mean<TAB>counts`.
    pub fn encode(&self) -> String {
        let mean = match &self.mean {
            Mean::Uniform => "*".to_string(),
            Mean::Vector(m) => m
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
        };
        let counts = self
            .counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(k, c)| format!("{}:{}", k, c))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}\t{}\t{}\t{}", self.dim(), self.concentration, mean, counts)
    }

    pub fn decode(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 4 {
            return Err(format!("expected 4 fields, found {}", fields.len()));
        }
        let dim: usize = fields[0]
            .parse()
            .map_err(|e| format!("bad dimension '{}': {}", fields[0], e))?;
        let concentration: f64 = fields[1]
            .parse()
            .map_err(|e| format!("bad concentration '{}': {}", fields[1], e))?;
        let mean = if fields[2] == "*" {
            Mean::Uniform
        } else {
            let m = fields[2]
                .split(',')
                .map(|v| v.parse::<f64>().map_err(|e| format!("bad mean '{}': {}", v, e)))
                .collect::<Result<Vec<_>, _>>()?;
            if m.len() != dim {
                return Err(format!("mean has {} entries, dimension is {}", m.len(), dim));
            }
            Mean::Vector(m)
        };

        let mut counts = vec![0u32; dim];
        let mut total = 0u32;
        for pair in fields[3].split_whitespace() {
            let (k, c) = pair
                .split_once(':')
                .ok_or_else(|| format!("bad count entry '{}'", pair))?;
            let k: usize = k.parse().map_err(|e| format!("bad outcome '{}': {}", k, e))?;
            let c: u32 = c.parse().map_err(|e| format!("bad count '{}': {}", c, e))?;
            if k >= dim {
                return Err(format!("outcome {} out of range for dimension {}", k, dim));
            }
            counts[k] = c;
            total += c;
        }

        Ok(Self {
            counts,
            total,
            concentration,
            mean,
        })
    }
}
