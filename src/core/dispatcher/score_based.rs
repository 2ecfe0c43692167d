use super::Dispatcher;
use crate::core::error::SimulationError;
use crate::core::job::Job;
use crate::core::manager::Manager;
use crate::core::types::{JobId, SimulationTime};
use log::debug;
use std::any::Any;
use std::collections::HashSet;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// CONWIP style pull policy.
///
/// Releasing a job consumes one card per operation of its product, completed
/// jobs return their cards. Waiting jobs are ordered rush first, then by due
/// date, and drawn in volume cycles of `cycle_size` jobs; within a cycle the
/// job with the best combined workload and due date score is released.
#[derive(Debug, Clone)]
pub struct ScoreBasedPullDispatcher {
    card_budget: usize,
    initial_card_budget: usize,
    cycle_size: usize,
    workload_weight: f64,
    due_date_weight: f64,
    sorted_waiting: Vec<JobId>,
    active_cycle: Vec<JobId>,
    released: HashSet<JobId>,
}

impl ScoreBasedPullDispatcher {
    /// Fails unless both weights add up to one
    pub fn new(
        card_budget: usize,
        cycle_size: usize,
        workload_weight: f64,
        due_date_weight: f64,
    ) -> Result<Self, SimulationError> {
        if (workload_weight + due_date_weight - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(SimulationError::InvalidConfiguration(format!(
                "workload weight {} and due date weight {} must add up to 1",
                workload_weight, due_date_weight
            )));
        }
        Ok(Self {
            card_budget,
            initial_card_budget: card_budget,
            cycle_size,
            workload_weight,
            due_date_weight,
            sorted_waiting: Vec::new(),
            active_cycle: Vec::new(),
            released: HashSet::new(),
        })
    }

    /// Cards currently available
    pub fn card_budget(&self) -> usize {
        self.card_budget
    }

    pub fn initial_card_budget(&self) -> usize {
        self.initial_card_budget
    }

    /// Jobs released by this policy that have not completed yet
    pub fn released_jobs(&self) -> &HashSet<JobId> {
        &self.released
    }

    /// Cards held by released, uncompleted jobs
    pub fn outstanding_cards(&self, line: &Manager) -> usize {
        self.released
            .iter()
            .map(|job| line.operation_count(*job))
            .sum()
    }

    pub fn sorted_waiting(&self) -> &[JobId] {
        &self.sorted_waiting
    }

    pub fn active_cycle(&self) -> &[JobId] {
        &self.active_cycle
    }

    /// Rush jobs first, each group ordered by due date, ties kept in
    /// waiting order
    fn sort_waiting(line: &Manager) -> Vec<JobId> {
        let (mut rush, mut regular): (Vec<&Job>, Vec<&Job>) = line
            .waiting_jobs()
            .iter()
            .filter_map(|id| line.job(*id))
            .partition(|job| job.is_rush());
        rush.sort_by(|a, b| a.due_date().total_cmp(&b.due_date()));
        regular.sort_by(|a, b| a.due_date().total_cmp(&b.due_date()));
        rush.into_iter()
            .chain(regular)
            .map(|job| job.id())
            .collect()
    }

    fn generate_volume_cycle(&mut self) -> Vec<JobId> {
        let size = self.cycle_size.min(self.sorted_waiting.len());
        self.sorted_waiting.drain(..size).collect()
    }

    /// Workload of the stations the job would visit, weighted by how busy
    /// they currently are
    fn workload_score(job: &Job, line: &Manager, now: SimulationTime) -> f64 {
        let Some(product) = line.product(job.product()) else {
            return 0.0;
        };
        line.stations()
            .iter()
            .map(|station| {
                let potential: f64 = product
                    .operations()
                    .iter()
                    .filter_map(|op| line.operation(*op))
                    .filter(|operation| station.is_capable_of(operation))
                    .map(|operation| {
                        operation.processing_time()
                            + station.setup_time()
                            + station.follow_up_time()
                    })
                    .sum();
                potential * station.remaining_time(now)
            })
            .sum()
    }

    /// Release score of a job, higher is better
    pub fn release_score(&self, job: &Job, line: &Manager) -> f64 {
        let now = line.time();
        let workload = Self::workload_score(job, line, now);
        let due_date = job.due_date() - now;
        1000.0 / (self.workload_weight * workload + self.due_date_weight * due_date)
    }
}

impl Dispatcher for ScoreBasedPullDispatcher {
    fn name(&self) -> &str {
        "score_based_pull"
    }

    fn initial_releases(&mut self, line: &Manager) -> Vec<JobId> {
        self.sorted_waiting = Self::sort_waiting(line);
        let mut releases = Vec::new();
        while let Some(&head) = self.sorted_waiting.first() {
            let cards = line.operation_count(head);
            if cards > self.card_budget {
                break;
            }
            self.card_budget -= cards;
            self.released.insert(head);
            self.sorted_waiting.remove(0);
            releases.push(head);
        }
        releases
    }

    fn handle_job_completion(
        &mut self,
        completed: &Job,
        _waiting: &[JobId],
        line: &Manager,
    ) -> Option<JobId> {
        if self.released.remove(&completed.id()) {
            self.card_budget += line.operation_count(completed.id());
        }
        if self.active_cycle.is_empty() {
            self.active_cycle = self.generate_volume_cycle();
        }

        let mut best: Option<(usize, f64)> = None;
        let mut first_fitting: Option<usize> = None;
        for (index, id) in self.active_cycle.iter().enumerate() {
            if line.operation_count(*id) > self.card_budget {
                continue;
            }
            let Some(job) = line.job(*id) else {
                continue;
            };
            first_fitting.get_or_insert(index);
            let score = self.release_score(job, line);
            debug!("release score of {} at {:.2}: {}", job.key(), line.time(), score);
            // non-positive or non-finite scores carry no preference
            if score.is_finite() && score > 0.0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        let index = best.map(|(index, _)| index).or(first_fitting)?;
        let job = self.active_cycle.remove(index);
        self.card_budget -= line.operation_count(job);
        self.released.insert(job);
        Some(job)
    }

    fn handle_next_tick(&mut self, _time: SimulationTime, _line: &Manager) -> Option<JobId> {
        None
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
    use crate::core::operation::Operation;

    /// product "big" with 4 operations, product "small" with 3
    fn line(jobs: &[(&str, usize, f64, bool)]) -> Manager {
        let mut line = Manager::new(SimulationConfig::batch());
        let ops: Vec<_> = (0..4)
            .map(|i| {
                line.register_operation(Operation::new(format!("op{}", i), 10.0))
                    .unwrap()
            })
            .collect();
        let big = line.register_product("big", 1, ops.clone()).unwrap();
        let small = line.register_product("small", 1, ops[..3].to_vec()).unwrap();
        for (key, product, due, rush) in jobs {
            let product = if *product == 4 { big } else { small };
            line.add_job(
                JobSpec::new(product)
                    .with_key(*key)
                    .with_due_date(*due)
                    .with_rush(*rush),
            )
            .unwrap();
        }
        line
    }

    fn keys(line: &Manager, jobs: &[JobId]) -> Vec<String> {
        jobs.iter()
            .map(|id| line.job(*id).unwrap().key().to_string())
            .collect()
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        assert!(ScoreBasedPullDispatcher::new(10, 5, 0.3, 0.7).is_ok());
        let err = ScoreBasedPullDispatcher::new(10, 5, 0.3, 0.6).unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_rush_jobs_sorted_ahead() {
        let line = line(&[
            ("a", 4, 30.0, false),
            ("b", 3, 10.0, false),
            ("c", 3, 50.0, true),
            ("d", 4, 20.0, true),
            ("e", 3, 10.0, false),
        ]);
        let sorted = ScoreBasedPullDispatcher::sort_waiting(&line);
        assert_eq!(keys(&line, &sorted), vec!["d", "c", "b", "e", "a"]);
    }

    #[test]
    fn test_initial_release_stops_at_first_misfit() {
        let line = line(&[
            ("a", 4, 10.0, false),
            ("b", 4, 20.0, false),
            ("c", 3, 30.0, false),
        ]);
        let mut dispatcher = ScoreBasedPullDispatcher::new(10, 5, 0.1, 0.9).unwrap();
        let released = dispatcher.initial_releases(&line);

        // "c" would fit the remaining 2 cards but no skipping ahead
        assert_eq!(keys(&line, &released), vec!["a", "b"]);
        assert_eq!(dispatcher.card_budget(), 2);
        assert_eq!(dispatcher.sorted_waiting().len(), 1);
        assert_eq!(
            dispatcher.card_budget() + dispatcher.outstanding_cards(&line),
            dispatcher.initial_card_budget()
        );
    }

    #[test]
    fn test_completion_returns_cards_and_prefers_early_due_date() {
        let line = line(&[
            ("a", 4, 10.0, false),
            ("b", 4, 90.0, false),
            ("c", 3, 40.0, false),
            ("d", 3, 20.0, false),
        ]);
        let mut dispatcher = ScoreBasedPullDispatcher::new(4, 5, 0.1, 0.9).unwrap();
        let released = dispatcher.initial_releases(&line);
        assert_eq!(keys(&line, &released), vec!["a"]);
        assert_eq!(dispatcher.card_budget(), 0);

        let done = line.job(released[0]).unwrap().clone();
        let next = dispatcher
            .handle_job_completion(&done, line.waiting_jobs(), &line)
            .unwrap();
        assert_eq!(line.job(next).unwrap().key(), "d");
        assert_eq!(dispatcher.card_budget(), 1);
        assert_eq!(keys(&line, dispatcher.active_cycle()), vec!["c", "b"]);
    }

    #[test]
    fn test_cards_of_foreign_jobs_are_not_returned() {
        let line = line(&[("a", 4, 10.0, false), ("b", 4, 20.0, false)]);
        let mut dispatcher = ScoreBasedPullDispatcher::new(3, 5, 0.1, 0.9).unwrap();
        assert!(dispatcher.initial_releases(&line).is_empty());

        let foreign = line.job(line.waiting_jobs()[0]).unwrap().clone();
        assert_eq!(
            dispatcher.handle_job_completion(&foreign, line.waiting_jobs(), &line),
            None
        );
        assert_eq!(dispatcher.card_budget(), 3);
    }

    #[test]
    fn test_overdue_jobs_fall_back_to_first_fitting() {
        // negative due date scores are degenerate and carry no preference
        let line = line(&[
            ("a", 3, 10.0, false),
            ("b", 3, -5.0, false),
            ("c", 3, -1.0, false),
        ]);
        let mut dispatcher = ScoreBasedPullDispatcher::new(3, 5, 0.0, 1.0).unwrap();
        let released = dispatcher.initial_releases(&line);
        assert_eq!(keys(&line, &released), vec!["b"]);

        let done = line.job(released[0]).unwrap().clone();
        let next = dispatcher
            .handle_job_completion(&done, line.waiting_jobs(), &line)
            .unwrap();
        // "c" (-1) scores negative, "a" (10) is the only positive one
        assert_eq!(line.job(next).unwrap().key(), "a");

        let mut dispatcher = ScoreBasedPullDispatcher::new(3, 5, 0.0, 1.0).unwrap();
        dispatcher.sorted_waiting = vec![line.waiting_jobs()[1], line.waiting_jobs()[2]];
        let next = dispatcher
            .handle_job_completion(&done, line.waiting_jobs(), &line)
            .unwrap();
        assert_eq!(line.job(next).unwrap().key(), "b");
    }

    #[test]
    fn test_empty_cycle_releases_nothing() {
        let line = line(&[("a", 3, 10.0, false)]);
        let mut dispatcher = ScoreBasedPullDispatcher::new(3, 5, 0.1, 0.9).unwrap();
        let released = dispatcher.initial_releases(&line);
        let done = line.job(released[0]).unwrap().clone();
        assert_eq!(
            dispatcher.handle_job_completion(&done, line.waiting_jobs(), &line),
            None
        );
        assert_eq!(dispatcher.card_budget(), 3);
    }
}
