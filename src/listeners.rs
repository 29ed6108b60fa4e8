//! Listener adapters for policy iteration
//!
//! Composable telemetry for the policy-iteration loop without coupling the
//! driver to an output format: a progress bar for interactive feedback, an
//! in-memory metrics collector, and a JSON Lines trace writer.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::policy_iteration::PolicyIterationListener;

/// Progress bar listener - shows iteration progress.
pub struct ProgressListener {
    progress_bar: Option<ProgressBar>,
    max_iterations: Option<usize>,
}

impl ProgressListener {
    /// Create a progress listener. With a known iteration cap the display is
    /// a bounded bar, otherwise a spinner.
    pub fn new(max_iterations: Option<usize>) -> Self {
        Self {
            progress_bar: None,
            max_iterations,
        }
    }
}

impl<P, V> PolicyIterationListener<P, V> for ProgressListener {
    fn on_initial_evaluation(
        &mut self,
        _policy: &P,
        _vfunc: &V,
        _generation_time: Duration,
        _evaluation_time: Duration,
    ) -> Result<()> {
        let pb = match self.max_iterations {
            Some(cap) => {
                let pb = ProgressBar::new(cap as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} iterations ({msg})")
                        .map_err(|e| Error::ProgressBarTemplate {
                            message: e.to_string(),
                        })?
                        .progress_chars("=>-"),
                );
                pb
            }
            None => ProgressBar::new_spinner(),
        };
        pb.set_message("initial policy evaluated");
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_iteration(
        &mut self,
        iteration: usize,
        _old_policy: &P,
        _old_vfunc: &V,
        _new_policy: &P,
        _new_vfunc: &V,
        _improvement_time: Duration,
        _evaluation_time: Duration,
    ) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.set_position(iteration as u64);
            pb.set_message(format!("iteration {iteration}"));
        }
        Ok(())
    }

    fn on_finished(&mut self, _policy: &P, _vfunc: &V) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message("finished");
        }
        Ok(())
    }
}

/// Summary of a policy-iteration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyIterationSummary {
    /// Completed improvement rounds.
    pub iterations: usize,
    /// Time spent generating the initial policy, in milliseconds.
    pub generation_ms: u64,
    /// Time spent evaluating the initial policy, in milliseconds.
    pub initial_evaluation_ms: u64,
    /// Total time spent in policy improvement, in milliseconds.
    pub total_improvement_ms: u64,
    /// Total time spent re-evaluating improved policies, in milliseconds.
    pub total_evaluation_ms: u64,
    /// True once the run has terminated.
    pub finished: bool,
}

/// Metrics listener - tracks iteration counts and elapsed times.
///
/// The listener is a shared handle: clone it, register one clone with the
/// driver and read [`MetricsListener::summary`] from the other after the run.
#[derive(Debug, Clone, Default)]
pub struct MetricsListener {
    summary: Rc<RefCell<PolicyIterationSummary>>,
}

impl MetricsListener {
    /// Create a metrics listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// The metrics collected so far.
    pub fn summary(&self) -> PolicyIterationSummary {
        self.summary.borrow().clone()
    }
}

impl<P, V> PolicyIterationListener<P, V> for MetricsListener {
    fn on_initial_evaluation(
        &mut self,
        _policy: &P,
        _vfunc: &V,
        generation_time: Duration,
        evaluation_time: Duration,
    ) -> Result<()> {
        let mut summary = self.summary.borrow_mut();
        summary.generation_ms = generation_time.as_millis() as u64;
        summary.initial_evaluation_ms = evaluation_time.as_millis() as u64;
        Ok(())
    }

    fn on_iteration(
        &mut self,
        iteration: usize,
        _old_policy: &P,
        _old_vfunc: &V,
        _new_policy: &P,
        _new_vfunc: &V,
        improvement_time: Duration,
        evaluation_time: Duration,
    ) -> Result<()> {
        let mut summary = self.summary.borrow_mut();
        summary.iterations = iteration;
        summary.total_improvement_ms += improvement_time.as_millis() as u64;
        summary.total_evaluation_ms += evaluation_time.as_millis() as u64;
        Ok(())
    }

    fn on_finished(&mut self, _policy: &P, _vfunc: &V) -> Result<()> {
        self.summary.borrow_mut().finished = true;
        Ok(())
    }
}

/// One policy-iteration lifecycle event, as written by [`JsonLinesListener`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// The initial policy was generated and evaluated.
    InitialEvaluation {
        generation_ms: u64,
        evaluation_ms: u64,
    },
    /// One improvement round completed.
    Iteration {
        iteration: usize,
        improvement_ms: u64,
        evaluation_ms: u64,
    },
    /// The termination rule fired.
    Finished { iterations: usize },
}

/// JSON Lines listener - writes one event record per line to a sink.
pub struct JsonLinesListener<W: Write> {
    writer: W,
    iterations: usize,
}

impl<W: Write> JsonLinesListener<W> {
    /// Create a listener writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            iterations: 0,
        }
    }

    fn write_event(&mut self, event: &TraceEvent) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<P, V, W: Write> PolicyIterationListener<P, V> for JsonLinesListener<W> {
    fn on_initial_evaluation(
        &mut self,
        _policy: &P,
        _vfunc: &V,
        generation_time: Duration,
        evaluation_time: Duration,
    ) -> Result<()> {
        self.write_event(&TraceEvent::InitialEvaluation {
            generation_ms: generation_time.as_millis() as u64,
            evaluation_ms: evaluation_time.as_millis() as u64,
        })
    }

    fn on_iteration(
        &mut self,
        iteration: usize,
        _old_policy: &P,
        _old_vfunc: &V,
        _new_policy: &P,
        _new_vfunc: &V,
        improvement_time: Duration,
        evaluation_time: Duration,
    ) -> Result<()> {
        self.iterations = iteration;
        self.write_event(&TraceEvent::Iteration {
            iteration,
            improvement_ms: improvement_time.as_millis() as u64,
            evaluation_ms: evaluation_time.as_millis() as u64,
        })
    }

    fn on_finished(&mut self, _policy: &P, _vfunc: &V) -> Result<()> {
        self.write_event(&TraceEvent::Finished {
            iterations: self.iterations,
        })
    }
}
