use std::path::{Path, PathBuf};

use tracing::info;

use super::{Hyperparams, Phase, Sampler, SweepPlan};
use crate::checkpoint;
use crate::error::{Error, Result};
use crate::metrics;
use crate::predictions::PredictionTable;
use crate::report;

/// Subdirectory of the output directory receiving checkpoints and dumps.
pub const REPORT_DIR: &str = "report";

/// Number of words listed per topic in the top-words report.
const NUM_TOP_WORDS: usize = 15;

/// Outcome of a training run.
#[derive(Clone, Debug)]
pub struct TrainSummary {
    pub iterations: usize,
    pub log_likelihood: f64,
    pub trace: Vec<f64>,
    pub hyperparameters: Hyperparams,
    /// Checkpoints written, in order, the final one last.
    pub checkpoints: Vec<PathBuf>,
}

impl Sampler {
    /// Run the training schedule, initializing first if needed.
    ///
    /// With an output directory, checkpoints go to `report/iter-{n}.zip`
    /// at every lag after burn-in and once more after the last iteration.
    pub fn train(&mut self, output_dir: Option<&Path>) -> Result<TrainSummary> {
        self.require_phase("train", &[Phase::Uninitialized, Phase::Initialized])?;
        let report_dir = match output_dir {
            Some(dir) => {
                let report_dir = dir.join(REPORT_DIR);
                std::fs::create_dir_all(&report_dir)
                    .map_err(|e| Error::io("create report directory", &report_dir, e))?;
                Some(report_dir)
            }
            None => None,
        };
        if self.phase == Phase::Uninitialized {
            self.initialize(output_dir)?;
        }

        let schedule = self.config.schedule.clone();
        info!(
            run = %self.config.name(),
            burn_in = schedule.burn_in,
            max_iter = schedule.max_iter,
            sample_lag = schedule.sample_lag,
            "training"
        );
        self.phase = Phase::Iterating;
        let mut checkpoints = Vec::new();

        for iter in 0..schedule.max_iter {
            self.iteration = iter;
            if iter % schedule.report_interval == 0 {
                self.report_progress(iter, iter < schedule.burn_in);
            }

            self.update_etas();
            self.update_ux();
            self.sample_sweep(SweepPlan::TRAIN)?;

            let at_lag = iter % schedule.sample_lag == 0 && iter > schedule.burn_in;
            if at_lag && self.config.optimize_hyperparameters {
                self.slice_sample_hyperparameters();
            }
            if self.config.debug {
                self.validate(&format!("iter {}", iter))?;
            }
            if let (true, Some(dir)) = (at_lag, report_dir.as_deref()) {
                checkpoints.push(self.write_snapshot(dir, iter)?);
            }
        }

        self.iteration = schedule.max_iter;
        if let Some(dir) = report_dir.as_deref() {
            checkpoints.push(self.write_snapshot(dir, schedule.max_iter)?);
            report::write_trace(&dir.join(report::TRACE_FILE), &self.trace)?;
            report::write_author_points(&dir.join(report::AUTHORS_FILE), self)?;
            report::write_bill_points(&dir.join(report::BILLS_FILE), self)?;
        }
        self.phase = Phase::Terminal;

        let log_likelihood = self.joint_log_likelihood();
        info!(llh = log_likelihood, "training finished");
        Ok(TrainSummary {
            iterations: schedule.max_iter,
            log_likelihood,
            trace: self.trace.clone(),
            hyperparameters: self.hyper,
            checkpoints,
        })
    }

    /// Sample assignments for this sampler's documents against the model in
    /// `checkpoint`, then predict every masked vote from `za * eta`.
    pub fn test(
        &mut self,
        checkpoint_path: &Path,
        predictions_out: Option<&Path>,
        assignments_out: Option<&Path>,
    ) -> Result<PredictionTable> {
        self.require_phase("test", &[Phase::Uninitialized])?;
        checkpoint::load_for_test(self, checkpoint_path)?;

        let schedule = self.config.test_schedule().clone();
        info!(
            checkpoint = %checkpoint_path.display(),
            max_iter = schedule.max_iter,
            "testing"
        );
        self.phase = Phase::TestIterating;
        for iter in 0..schedule.max_iter {
            self.iteration = iter;
            let stats = self.sample_sweep(SweepPlan::test(iter == 0))?;
            if iter % schedule.report_interval == 0 {
                info!(
                    iter,
                    burn_in = iter < schedule.burn_in,
                    tokens = stats.tokens,
                    changed = stats.changed,
                    "test sweep"
                );
            }
            if self.config.debug {
                self.validate(&format!("test iter {}", iter))?;
            }
        }

        if let Some(path) = assignments_out {
            checkpoint::write_assignments(self, path)?;
        }
        let predictions = self.predict_out_matrix();
        if let Some(path) = predictions_out {
            predictions.write(path)?;
        }
        self.phase = Phase::Terminal;
        Ok(predictions)
    }

    fn report_progress(&mut self, iter: usize, burning_in: bool) {
        let llh = self.likelihood_breakdown();
        self.trace.push(llh.total());
        info!(
            iter,
            burning_in,
            llh = llh.total(),
            word = llh.word,
            topic = llh.topic,
            vote = llh.vote,
            u_prior = llh.u_prior,
            eta_prior = llh.eta_prior,
            x_prior = llh.x_prior,
            "progress"
        );
        let votes = &self.corpus.votes;
        for (matrix, predictions) in [
            ("i", self.predict_in_matrix()),
            ("o", self.predict_out_matrix()),
        ] {
            for m in metrics::evaluate(votes, &predictions) {
                info!(matrix, metric = m.name, value = m.value, "evaluation");
            }
        }
    }

    fn write_snapshot(&self, dir: &Path, iter: usize) -> Result<PathBuf> {
        let path = dir.join(format!("iter-{}.zip", iter));
        checkpoint::save(self, &path)?;
        report::write_top_words(
            &dir.join(format!("iter-{}-{}", iter, report::TOP_WORDS_FILE)),
            self,
            NUM_TOP_WORDS,
        )?;
        Ok(path)
    }
}
