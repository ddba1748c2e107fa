//! Sampler configuration, loaded from TOML.
//!
//! ```toml
//! num_topics = 25
//! alpha = 0.1
//! beta = 0.1
//! rho = 1.0
//! sigma = 1.0
//! gamma = 1.0
//! init = "preset"
//!
//! [schedule]
//! burn_in = 50
//! max_iter = 500
//! sample_lag = 25
//! report_interval = 10
//! ```
//!
//! Every field except `num_topics` has a default. Unknown `init` or
//! `optimizer` strings fail at parse time; `validate` rejects values that
//! would make the model improper before any sampling runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};


/// How topic assignments are seeded before the first sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitMode {
    /// One sweep drawing from the empty-count predictive.
    #[default]
    Random,
    /// Assignments from an auxiliary unsupervised LDA run.
    Preset,
}

impl std::fmt::Display for InitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Preset => write!(f, "preset"),
        }
    }
}

/// Solver used for the η and lexical fits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Owlqn,
}

/// Iteration schedule for training or test sampling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub burn_in: usize,
    pub max_iter: usize,
    pub sample_lag: usize,
    pub report_interval: usize,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            burn_in: 250,
            max_iter: 500,
            sample_lag: 25,
            report_interval: 25,
        }
    }
}

impl Schedule {
    fn validate(&self, name: &str) -> Result<()> {
        if self.sample_lag == 0 {
            return Err(Error::Config(format!("{}.sample_lag must be positive", name)));
        }
        if self.report_interval == 0 {
            return Err(Error::Config(format!(
                "{}.report_interval must be positive",
                name
            )));
        }
        Ok(())
    }
}

/// Auxiliary LDA run used by `InitMode::Preset`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdaSchedule {
    pub max_iter: usize,
}

impl Default for LdaSchedule {
    fn default() -> Self {
        Self { max_iter: 100 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Number of topics (and ideal-point dimensions), K.
    pub num_topics: usize,
    /// Document-topic Dirichlet pseudo-count.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Topic-word Dirichlet pseudo-count.
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Variance of an author's ideal point around `za * eta`.
    #[serde(default = "default_variance")]
    pub rho: f64,
    /// Variance of the topic regression weights.
    #[serde(default = "default_variance")]
    pub sigma: f64,
    /// Variance of the bill positions.
    #[serde(default = "default_variance")]
    pub gamma: f64,
    #[serde(default)]
    pub lexical_l1: f64,
    #[serde(default)]
    pub lexical_l2: f64,
    #[serde(default)]
    pub init: InitMode,
    #[serde(default)]
    pub optimizer: OptimizerKind,
    /// Slice-sample alpha and beta after burn-in.
    #[serde(default)]
    pub optimize_hyperparameters: bool,
    /// Gradient passes over U and X per outer iteration.
    #[serde(default = "default_num_steps")]
    pub num_steps: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_solver_iters")]
    pub eta_max_iters: usize,
    #[serde(default = "default_solver_iters")]
    pub lexical_max_iters: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Run `validate` after every iteration.
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub schedule: Schedule,
    /// Test-time schedule; the training schedule when absent.
    #[serde(default)]
    pub test_schedule: Option<Schedule>,
    #[serde(default)]
    pub lda: LdaSchedule,
}

fn default_alpha() -> f64 {
    0.1
}

fn default_beta() -> f64 {
    0.1
}

fn default_variance() -> f64 {
    1.0
}

fn default_num_steps() -> usize {
    20
}

fn default_learning_rate() -> f64 {
    0.01
}

fn default_solver_iters() -> usize {
    100
}

fn default_seed() -> u64 {
    0x5EED_1DEA_0F0E_2024
}

impl SamplerConfig {
    /// Defaults for everything but the topic count.
    pub fn new(num_topics: usize) -> Self {
        Self {
            num_topics,
            alpha: default_alpha(),
            beta: default_beta(),
            rho: default_variance(),
            sigma: default_variance(),
            gamma: default_variance(),
            lexical_l1: 0.0,
            lexical_l2: 0.0,
            init: InitMode::default(),
            optimizer: OptimizerKind::default(),
            optimize_hyperparameters: false,
            num_steps: default_num_steps(),
            learning_rate: default_learning_rate(),
            eta_max_iters: default_solver_iters(),
            lexical_max_iters: default_solver_iters(),
            seed: default_seed(),
            debug: false,
            schedule: Schedule::default(),
            test_schedule: None,
            lda: LdaSchedule::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SamplerConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::io("read config", path, e))?;
        Self::from_toml_str(&content)
    }

    /// Lexical regression runs when either penalty is positive.
    pub fn lexical_enabled(&self) -> bool {
        self.lexical_l1 > 0.0 || self.lexical_l2 > 0.0
    }

    pub fn test_schedule(&self) -> &Schedule {
        self.test_schedule.as_ref().unwrap_or(&self.schedule)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_topics == 0 {
            return Err(Error::Config("num_topics must be positive".into()));
        }
        for (name, v) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("rho", self.rho),
            ("sigma", self.sigma),
            ("gamma", self.gamma),
            ("learning_rate", self.learning_rate),
        ] {
            if !(v > 0.0 && v.is_finite()) {
                return Err(Error::Config(format!("{} must be positive, got {}", name, v)));
            }
        }
        for (name, v) in [
            ("lexical_l1", self.lexical_l1),
            ("lexical_l2", self.lexical_l2),
        ] {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(Error::Config(format!(
                    "{} must be non-negative, got {}",
                    name, v
                )));
            }
        }
        self.schedule.validate("schedule")?;
        if let Some(test) = &self.test_schedule {
            test.validate("test_schedule")?;
        }
        Ok(())
    }

    /// Run name encoding the settings, used for output folders.
    pub fn name(&self) -> String {
        format!(
            "{}_B-{}_M-{}_L-{}_K-{}_a-{}_b-{}_r-{}_s-{}_g-{}_ll1-{}_ll2-{}_opt-{}",
            self.init,
            self.schedule.burn_in,
            self.schedule.max_iter,
            self.schedule.sample_lag,
            self.num_topics,
            self.alpha,
            self.beta,
            self.rho,
            self.sigma,
            self.gamma,
            self.lexical_l1,
            self.lexical_l2,
            self.optimize_hyperparameters,
        )
    }
}
