use super::Dispatcher;
use crate::core::job::Job;
use crate::core::manager::Manager;
use crate::core::types::{JobId, SimulationTime};
use std::any::Any;

/// Releases the head of the waiting list at a fixed interval, regardless of
/// the state of the line
#[derive(Debug, Clone)]
pub struct PushDispatcher {
    interval: SimulationTime,
    last_release: SimulationTime,
}

impl PushDispatcher {
    pub fn new(interval: SimulationTime) -> Self {
        Self {
            interval,
            last_release: 0.0,
        }
    }

    pub fn interval(&self) -> SimulationTime {
        self.interval
    }

    pub fn last_release(&self) -> SimulationTime {
        self.last_release
    }
}

impl Dispatcher for PushDispatcher {
    fn name(&self) -> &str {
        "push"
    }

    fn batch_releases(
        &mut self,
        start: SimulationTime,
        waiting: &[JobId],
    ) -> Vec<(JobId, SimulationTime)> {
        waiting
            .iter()
            .enumerate()
            .map(|(i, job)| (*job, start + i as f64 * self.interval))
            .collect()
    }

    fn handle_job_completion(
        &mut self,
        _completed: &Job,
        _waiting: &[JobId],
        _line: &Manager,
    ) -> Option<JobId> {
        None
    }

    fn handle_next_tick(&mut self, time: SimulationTime, line: &Manager) -> Option<JobId> {
        if time - self.last_release > self.interval {
            // the interval restarts even when nothing is left to release
            self.last_release = time;
            return line.waiting_jobs().first().copied();
        }
        None
    }

    fn releases_on_tick(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::job::JobSpec;

    fn line_with_jobs(count: usize) -> Manager {
        let mut line = Manager::new(SimulationConfig::new());
        let product = line.register_product("empty", 1, Vec::new()).unwrap();
        for _ in 0..count {
            line.add_job(JobSpec::new(product)).unwrap();
        }
        line
    }

    #[test]
    fn test_release_only_after_interval_passed() {
        let line = line_with_jobs(2);
        let mut push = PushDispatcher::new(50.0);

        assert_eq!(push.handle_next_tick(10.0, &line), None);
        assert_eq!(push.handle_next_tick(50.0, &line), None);
        assert_eq!(
            push.handle_next_tick(50.5, &line),
            Some(line.waiting_jobs()[0])
        );
        assert_eq!(push.last_release(), 50.5);
        assert_eq!(push.handle_next_tick(100.5, &line), None);
        assert!(push.handle_next_tick(101.0, &line).is_some());
    }

    #[test]
    fn test_interval_restarts_without_waiting_jobs() {
        let line = line_with_jobs(0);
        let mut push = PushDispatcher::new(5.0);
        assert_eq!(push.handle_next_tick(6.0, &line), None);
        assert_eq!(push.last_release(), 6.0);
    }

    #[test]
    fn test_batch_releases_are_spaced_by_interval() {
        let line = line_with_jobs(3);
        let mut push = PushDispatcher::new(50.0);
        let times: Vec<SimulationTime> = push
            .batch_releases(10.0, line.waiting_jobs())
            .into_iter()
            .map(|(_, at)| at)
            .collect();
        assert_eq!(times, vec![10.0, 60.0, 110.0]);
    }

    #[test]
    fn test_completions_are_ignored() {
        let line = line_with_jobs(2);
        let mut push = PushDispatcher::new(50.0);
        let job = line.job(line.waiting_jobs()[0]).unwrap().clone();
        assert_eq!(
            push.handle_job_completion(&job, line.waiting_jobs(), &line),
            None
        );
    }
}
