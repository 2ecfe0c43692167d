//! Job release policies
//!
//! A dispatcher only decides which waiting job enters the line next. The
//! [`Manager`] performs the release itself, so policies read the line through
//! shared references and never mutate it.

pub mod pull;
pub mod push;
pub mod score_based;

pub use pull::PullDispatcher;
pub use push::PushDispatcher;
pub use score_based::ScoreBasedPullDispatcher;

use super::error::SimulationError;
use super::job::Job;
use super::manager::Manager;
use super::types::{JobId, SimulationTime};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Release policy driving the manager
pub trait Dispatcher {
    fn name(&self) -> &str;

    /// Jobs released as soon as the policy is attached to a line
    fn initial_releases(&mut self, _line: &Manager) -> Vec<JobId> {
        Vec::new()
    }

    /// Releases scheduled up front when a batch run starts at `start`
    fn batch_releases(
        &mut self,
        _start: SimulationTime,
        _waiting: &[JobId],
    ) -> Vec<(JobId, SimulationTime)> {
        Vec::new()
    }

    /// Called whenever a job left the line
    fn handle_job_completion(
        &mut self,
        completed: &Job,
        waiting: &[JobId],
        line: &Manager,
    ) -> Option<JobId>;

    /// Called on every real-time tick
    fn handle_next_tick(&mut self, time: SimulationTime, line: &Manager) -> Option<JobId>;

    /// True if a tick alone can make the policy release a waiting job
    fn releases_on_tick(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// Serializable policy selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DispatcherConfig {
    Push {
        interval: SimulationTime,
    },
    Pull {
        factor: f64,
    },
    ScoreBased {
        card_budget: usize,
        cycle_size: usize,
        workload_weight: f64,
        due_date_weight: f64,
    },
}

impl DispatcherConfig {
    /// Instantiate the configured policy
    pub fn build(&self) -> Result<Box<dyn Dispatcher>, SimulationError> {
        Ok(match *self {
            DispatcherConfig::Push { interval } => Box::new(PushDispatcher::new(interval)),
            DispatcherConfig::Pull { factor } => Box::new(PullDispatcher::new(factor)),
            DispatcherConfig::ScoreBased {
                card_budget,
                cycle_size,
                workload_weight,
                due_date_weight,
            } => Box::new(ScoreBasedPullDispatcher::new(
                card_budget,
                cycle_size,
                workload_weight,
                due_date_weight,
            )?),
        })
    }

    /// Short human readable description
    pub fn label(&self) -> String {
        match self {
            DispatcherConfig::Push { interval } => format!("push({})", interval),
            DispatcherConfig::Pull { factor } => format!("pull({})", factor),
            DispatcherConfig::ScoreBased {
                card_budget,
                cycle_size,
                workload_weight,
                due_date_weight,
            } => format!(
                "score_based({}, {}, {}, {})",
                card_budget, cycle_size, workload_weight, due_date_weight
            ),
        }
    }
}
