use super::Dispatcher;
use crate::core::job::Job;
use crate::core::manager::Manager;
use crate::core::types::{JobId, SimulationTime};
use std::any::Any;

/// Fills the line up to `factor` jobs per station, then replaces every
/// completed job with the next waiting one.
///
/// Fractional factors are allowed; the fill level is rounded down.
#[derive(Debug, Clone)]
pub struct PullDispatcher {
    factor: f64,
}

impl PullDispatcher {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Number of jobs the line is filled up to
    pub fn target(&self, stations: usize) -> usize {
        // negative and NaN products saturate to zero
        (stations as f64 * self.factor).floor() as usize
    }
}

impl Dispatcher for PullDispatcher {
    fn name(&self) -> &str {
        "pull"
    }

    fn initial_releases(&mut self, line: &Manager) -> Vec<JobId> {
        let target = self.target(line.stations().len());
        let count = target.saturating_sub(line.active_jobs().len());
        line.waiting_jobs().iter().take(count).copied().collect()
    }

    fn handle_job_completion(
        &mut self,
        _completed: &Job,
        waiting: &[JobId],
        _line: &Manager,
    ) -> Option<JobId> {
        waiting.first().copied()
    }

    fn handle_next_tick(&mut self, _time: SimulationTime, _line: &Manager) -> Option<JobId> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
