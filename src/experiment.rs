//! Side-by-side policy evaluation
//!
//! Every policy gets its own freshly built line, run as a dry run. Lines share
//! nothing, so with [`ConcurrencyMode::Rayon`] the runs are spread over a
//! thread pool and yield the same reports as a sequential evaluation.

use crate::core::config::{ClockMode, ConcurrencyMode, SimulationConfig};
use crate::core::dispatcher::DispatcherConfig;
use crate::core::error::SimulationError;
use crate::core::manager::Manager;
use crate::core::metrics::{MetricsCollector, SimulationReport};
use log::info;
use rayon::prelude::*;

/// Build a line for `policy` and run it to completion in batch mode
pub fn run_policy<F>(
    config: &SimulationConfig,
    build_line: &F,
    policy: &DispatcherConfig,
) -> Result<SimulationReport, SimulationError>
where
    F: Fn(&mut Manager) -> Result<(), SimulationError>,
{
    let mut line = Manager::new(config.clone());
    line.set_clock_mode(ClockMode::Batch);
    build_line(&mut line)?;
    line.add_observer(Box::new(MetricsCollector::new()));
    line.attach_dispatcher(policy.build()?)?;
    line.perform_dry_run();
    let report = SimulationReport::from_line(policy.label(), &line);
    info!(
        "{}: {} jobs completed, mean throughput {:?}",
        report.policy, report.completed_jobs, report.mean_throughput_time
    );
    Ok(report)
}

/// Evaluate every policy on an identical line, reports in policy order
pub fn compare_policies<F>(
    config: &SimulationConfig,
    build_line: F,
    policies: &[DispatcherConfig],
) -> Result<Vec<SimulationReport>, SimulationError>
where
    F: Fn(&mut Manager) -> Result<(), SimulationError> + Sync,
{
    match config.concurrency_mode {
        ConcurrencyMode::Sequential => policies
            .iter()
            .map(|policy| run_policy(config, &build_line, policy))
            .collect(),
        ConcurrencyMode::Rayon => {
            let evaluate = || {
                policies
                    .par_iter()
                    .map(|policy| run_policy(config, &build_line, policy))
                    .collect::<Result<Vec<_>, _>>()
            };
            match config.thread_pool_size {
                Some(size) => {
                    let pool = rayon::ThreadPoolBuilder::new()
                        .num_threads(size)
                        .build()
                        .map_err(|err| {
                            SimulationError::InvalidConfiguration(format!(
                                "thread pool: {}",
                                err
                            ))
                        })?;
                    pool.install(evaluate)
                }
                None => evaluate(),
            }
        }
    }
}
