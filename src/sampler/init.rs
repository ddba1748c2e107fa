use std::path::Path;

use rand_distr::{Distribution, Normal};
use tracing::info;

use super::lda::Lda;
use super::{Phase, Sampler, SweepPlan};
use crate::config::InitMode;
use crate::error::{Error, Result};

/// Variance of the Gaussian draws for `eta`, `us` and `xs` at start.
const INIT_VARIANCE: f64 = 3.0;

impl Sampler {
    /// Draw the continuous parameters and seed the assignments.
    ///
    /// `output_dir` is where a cached lexical regression is looked for and
    /// written.
    pub fn initialize(&mut self, output_dir: Option<&Path>) -> Result<()> {
        self.initialize_with_topics(None, output_dir)
    }

    /// As `initialize`, with each topic's word prior centered on a seed
    /// distribution. The number of seeds must equal `num_topics`.
    pub fn initialize_with_topics(
        &mut self,
        seeded_topics: Option<&[Vec<f64>]>,
        output_dir: Option<&Path>,
    ) -> Result<()> {
        self.require_phase("initialize", &[Phase::Uninitialized])?;
        info!(
            topics = self.config.num_topics,
            documents = self.corpus.num_documents(),
            tokens = self.corpus.num_tokens(),
            init = %self.config.init,
            "initializing"
        );

        self.initialize_model_structure(seeded_topics)?;
        self.reset_data_structures();
        self.initialize_author_points()?;
        match self.config.init {
            InitMode::Random => {
                self.sample_sweep(SweepPlan::INITIAL)?;
            }
            InitMode::Preset => self.initialize_preset_assignments()?,
        }
        if self.config.lexical_enabled() {
            self.initialize_lexical(output_dir)?;
        }
        if self.config.debug {
            self.validate("initialized")?;
        }

        self.phase = Phase::Initialized;
        info!(llh = self.joint_log_likelihood(), "initialized");
        Ok(())
    }

    fn initialize_model_structure(&mut self, seeded_topics: Option<&[Vec<f64>]>) -> Result<()> {
        self.topic_words = self.empty_topic_words(seeded_topics)?;
        let normal = init_normal()?;
        for eta in self.eta.iter_mut() {
            *eta = normal.sample(&mut self.rng);
        }
        for (x, _) in self
            .xs
            .iter_mut()
            .zip(&self.valid_bills)
            .filter(|(_, &valid)| valid)
        {
            for v in x.iter_mut() {
                *v = normal.sample(&mut self.rng);
            }
        }
        Ok(())
    }

    fn initialize_author_points(&mut self) -> Result<()> {
        let normal = init_normal()?;
        for (u, &valid) in self.us.iter_mut().zip(&self.valid_authors) {
            for v in u.iter_mut() {
                *v = if valid { normal.sample(&mut self.rng) } else { 0.0 };
            }
        }
        Ok(())
    }

    /// Copy assignments from an auxiliary LDA run into every count table.
    fn initialize_preset_assignments(&mut self) -> Result<()> {
        info!(iterations = self.config.lda.max_iter, "running lda for preset assignments");
        let lda = Lda::new(
            &self.corpus.documents,
            self.config.num_topics,
            self.corpus.vocab_size,
            self.hyper.alpha,
            self.hyper.beta,
        );
        let z = lda.run(&self.corpus.documents, self.config.lda.max_iter, &mut self.rng)?;
        for (d, doc) in self.corpus.documents.iter().enumerate() {
            if z[d].len() != doc.tokens.len() {
                return Err(Error::mismatch(
                    format!("lda assignment count of document {}", d),
                    doc.tokens.len(),
                    z[d].len(),
                ));
            }
            for (&word, &topic) in doc.tokens.iter().zip(&z[d]) {
                self.topic_words[topic].increment(word);
                self.doc_topics[d].increment(topic);
                self.za[doc.author].add(topic);
            }
        }
        self.z = z;
        Ok(())
    }
}

fn init_normal() -> Result<Normal<f64>> {
    Normal::new(0.0, INIT_VARIANCE.sqrt()).map_err(|e| Error::Config(e.to_string()))
}
