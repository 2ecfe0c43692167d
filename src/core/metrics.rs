//! Run analytics
//!
//! [`MetricsCollector`] listens to the event stream of one line and keeps the
//! history needed for the per-run [`SimulationReport`].

use super::event::SimEvent;
use super::job::Job;
use super::manager::Manager;
use super::observer::SimulationObserver;
use super::station::Station;
use super::types::{JobId, SimulationTime};
use serde::Serialize;
use std::any::Any;

/// Number of released jobs still on the line at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveJobsSample {
    pub time: SimulationTime,
    pub count: usize,
}

/// Dispatch-to-completion time of one job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputSample {
    pub job: String,
    pub throughput_time: SimulationTime,
}

/// Accumulated time of completed jobs by activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimeDistribution {
    pub waiting: SimulationTime,
    pub transport: SimulationTime,
    pub working: SimulationTime,
}

impl TimeDistribution {
    pub fn add_job(&mut self, job: &Job) {
        let metrics = job.metrics();
        self.waiting += metrics.waiting_time;
        self.transport += metrics.transport_time;
        self.working += metrics.working_time;
    }

    pub fn total(&self) -> SimulationTime {
        self.waiting + self.transport + self.working
    }
}

/// Observer tracking releases and completions
#[derive(Debug, Default, Clone)]
pub struct MetricsCollector {
    active_history: Vec<ActiveJobsSample>,
    release_order: Vec<JobId>,
    throughput_times: Vec<ThroughputSample>,
    time_distribution: TimeDistribution,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_history(&self) -> &[ActiveJobsSample] {
        &self.active_history
    }

    /// Jobs in the order they were dispatched
    pub fn release_order(&self) -> &[JobId] {
        &self.release_order
    }

    pub fn throughput_times(&self) -> &[ThroughputSample] {
        &self.throughput_times
    }

    pub fn time_distribution(&self) -> TimeDistribution {
        self.time_distribution
    }

    /// Highest number of simultaneously active jobs
    pub fn peak_active_jobs(&self) -> usize {
        self.active_history
            .iter()
            .map(|sample| sample.count)
            .max()
            .unwrap_or(0)
    }

    fn track_active(&mut self, time: SimulationTime, delta: isize) {
        let last = self.active_history.last().map_or(0, |sample| sample.count);
        let count = (last as isize + delta).max(0) as usize;
        self.active_history.push(ActiveJobsSample { time, count });
    }
}

impl SimulationObserver for MetricsCollector {
    fn on_event(&mut self, time: SimulationTime, event: &SimEvent, line: &Manager) {
        match *event {
            SimEvent::JobDispatched { job } => {
                self.track_active(time, 1);
                self.release_order.push(job);
            }
            SimEvent::JobCompleted { job } => {
                self.track_active(time, -1);
                let Some(job) = line.job(job) else {
                    return;
                };
                if let Some(throughput_time) = job.metrics().throughput_time() {
                    self.throughput_times.push(ThroughputSample {
                        job: job.key().to_string(),
                        throughput_time,
                    });
                }
                self.time_distribution.add_job(job);
            }
            _ => {}
        }
    }

    fn on_reset(&mut self) {
        *self = Self::default();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Phase totals of one station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub name: String,
    pub setup_time: SimulationTime,
    pub process_time: SimulationTime,
    pub follow_up_time: SimulationTime,
    pub disabled: bool,
}

impl StationSummary {
    fn from_station(station: &Station) -> Self {
        Self {
            name: station.name().to_string(),
            setup_time: station.setup_time(),
            process_time: station.process_time(),
            follow_up_time: station.follow_up_time(),
            disabled: station.is_disabled(),
        }
    }

    /// Share of `elapsed` the station spent in any phase
    pub fn utilization(&self, elapsed: SimulationTime) -> f64 {
        if elapsed <= 0.0 {
            return 0.0;
        }
        (self.setup_time + self.process_time + self.follow_up_time) / elapsed
    }
}

/// Outcome of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub policy: String,
    pub end_time: SimulationTime,
    pub completed_jobs: usize,
    pub unfinished_jobs: usize,
    pub infeasible_jobs: usize,
    pub release_order: Vec<String>,
    pub completion_order: Vec<String>,
    pub mean_throughput_time: Option<SimulationTime>,
    pub max_throughput_time: Option<SimulationTime>,
    pub makespan: Option<SimulationTime>,
    pub peak_active_jobs: usize,
    pub active_history: Vec<ActiveJobsSample>,
    pub time_distribution: TimeDistribution,
    pub stations: Vec<StationSummary>,
}

impl SimulationReport {
    /// Summarise the current state of the line.
    ///
    /// Release order and active-job history come from an attached
    /// [`MetricsCollector`] and stay empty without one.
    pub fn from_line(policy: impl Into<String>, line: &Manager) -> Self {
        let completed: Vec<&Job> = line
            .completed_jobs()
            .iter()
            .filter_map(|job| line.job(*job))
            .collect();

        let throughput: Vec<SimulationTime> = completed
            .iter()
            .filter_map(|job| job.metrics().throughput_time())
            .collect();
        let mean_throughput_time = if throughput.is_empty() {
            None
        } else {
            Some(throughput.iter().sum::<f64>() / throughput.len() as f64)
        };
        let max_throughput_time = throughput.iter().copied().reduce(f64::max);
        let makespan = completed
            .iter()
            .filter_map(|job| job.metrics().completed_at)
            .reduce(f64::max);

        let mut time_distribution = TimeDistribution::default();
        for job in &completed {
            time_distribution.add_job(job);
        }

        let collector = line.observer::<MetricsCollector>();
        let release_order = collector
            .map(|collector| {
                collector
                    .release_order()
                    .iter()
                    .filter_map(|job| line.job(*job))
                    .map(|job| job.key().to_string())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            policy: policy.into(),
            end_time: line.time(),
            completed_jobs: completed.len(),
            unfinished_jobs: line.waiting_jobs().len() + line.active_jobs().len(),
            infeasible_jobs: line.jobs().iter().filter(|job| job.is_infeasible()).count(),
            release_order,
            completion_order: completed.iter().map(|job| job.key().to_string()).collect(),
            mean_throughput_time,
            max_throughput_time,
            makespan,
            peak_active_jobs: collector.map_or(0, MetricsCollector::peak_active_jobs),
            active_history: collector
                .map(|collector| collector.active_history().to_vec())
                .unwrap_or_default(),
            time_distribution,
            stations: line.stations().iter().map(StationSummary::from_station).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::job::JobSpec;
    use crate::core::operation::Operation;
    use crate::core::station::StationSpec;
    use crate::core::transport::FixedTransport;

    fn single_station_line() -> Manager {
        let mut line = Manager::new(SimulationConfig::batch())
            .with_transport(Box::new(FixedTransport::new(5.0)));
        let drill = line.register_capability("drill");
        line.register_station(StationSpec::new("S1").with_capability(drill))
            .unwrap();
        let op = line
            .register_operation(Operation::new("A", 10.0).requires(drill))
            .unwrap();
        let product = line.register_product("P", 1, vec![op]).unwrap();
        line.add_job(JobSpec::new(product).with_key("J1")).unwrap();
        line.add_observer(Box::new(MetricsCollector::new()));
        line
    }

    #[test]
    fn test_active_history_never_negative() {
        let mut collector = MetricsCollector::new();
        collector.track_active(0.0, -1);
        collector.track_active(1.0, 1);
        collector.track_active(2.0, 1);
        let counts: Vec<usize> = collector.active_history().iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![0, 1, 2]);
        assert_eq!(collector.peak_active_jobs(), 2);
    }

    #[test]
    fn test_collects_single_job_run() {
        let mut line = single_station_line();
        let job = line.find_job("J1").unwrap();
        line.dispatch_job(job, None).unwrap();
        line.run();

        let collector = line.observer::<MetricsCollector>().unwrap();
        assert_eq!(collector.release_order(), &[job]);
        assert_eq!(collector.throughput_times().len(), 1);
        // source -> queue, queue -> slot, slot -> sink
        let sample = &collector.throughput_times()[0];
        assert_eq!(sample.job, "J1");
        assert_eq!(sample.throughput_time, 25.0);

        // the pull into the slot is spent waiting, not in transport
        let distribution = collector.time_distribution();
        assert_eq!(distribution.transport, 10.0);
        assert_eq!(distribution.working, 10.0);
        assert_eq!(distribution.waiting, 5.0);
        assert_eq!(distribution.total(), sample.throughput_time);
        assert_eq!(collector.active_history().last().map(|s| s.count), Some(0));
    }

    #[test]
    fn test_report_from_line() {
        let mut line = single_station_line();
        let job = line.find_job("J1").unwrap();
        line.dispatch_job(job, None).unwrap();
        line.run();

        let report = SimulationReport::from_line("manual", &line);
        assert_eq!(report.policy, "manual");
        assert_eq!(report.completed_jobs, 1);
        assert_eq!(report.unfinished_jobs, 0);
        assert_eq!(report.release_order, vec!["J1".to_string()]);
        assert_eq!(report.completion_order, vec!["J1".to_string()]);
        assert_eq!(report.mean_throughput_time, Some(25.0));
        assert_eq!(report.makespan, Some(25.0));
        assert_eq!(report.peak_active_jobs, 1);
        assert_eq!(report.stations.len(), 1);
        assert_eq!(report.stations[0].process_time, 10.0);
        assert_eq!(report.stations[0].utilization(25.0), 0.4);
    }
}
