use super::operation::{Operation, Product};
use super::types::{
    Coordinate, JobId, JobOperation, OperationId, ProductId, SimulationTime, StationId,
    StationOperation, TransitId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Waiting,
    Queued,
    Moving,
    Processing,
    Completed,
}

/// Last metric checkpoint of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricMark {
    Arrived,
    Processing,
}

/// Key job metrics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobMetrics {
    pub dispatched_at: Option<SimulationTime>,
    pub completed_at: Option<SimulationTime>,
    pub transport_time: SimulationTime,
    pub working_time: SimulationTime,
    pub waiting_time: SimulationTime,
    pub last_time: SimulationTime,
    pub last_mark: Option<MetricMark>,
}

impl JobMetrics {
    /// Time between release and completion, once both are known
    pub fn throughput_time(&self) -> Option<SimulationTime> {
        match (self.dispatched_at, self.completed_at) {
            (Some(dispatched), Some(completed)) => Some(completed - dispatched),
            _ => None,
        }
    }
}

/// Movement of a job between two coordinates.
///
/// The position of the job is updated on departure; the arrival continuation
/// carries `id` and is only honoured while this transit is still current.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transit {
    pub id: TransitId,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub departed_at: SimulationTime,
    pub eta: SimulationTime,
}

impl Transit {
    pub fn duration(&self) -> SimulationTime {
        self.eta - self.departed_at
    }
}

/// Order instance of a product
#[derive(Debug, Clone)]
pub struct Job {
    pub(crate) id: JobId,
    pub(crate) key: String,
    pub(crate) product: ProductId,
    pub(crate) status: JobStatus,
    pub(crate) completed_operations: Vec<OperationId>,
    pub(crate) planned: Option<StationOperation>,
    pub(crate) due_date: f64,
    pub(crate) rush: bool,
    pub(crate) infeasible: bool,
    pub(crate) position: Coordinate,
    pub(crate) transit: Option<Transit>,
    pub(crate) metrics: JobMetrics,
}

impl Job {
    pub(crate) fn from_spec(id: JobId, spec: JobSpec, position: Coordinate) -> Self {
        Self {
            id,
            key: spec.key.unwrap_or_else(|| Uuid::new_v4().to_string()),
            product: spec.product,
            status: JobStatus::Waiting,
            completed_operations: Vec::new(),
            planned: None,
            due_date: spec.due_date,
            rush: spec.rush,
            infeasible: false,
            position: spec.position.unwrap_or(position),
            transit: None,
            metrics: JobMetrics::default(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// External order key
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn product(&self) -> ProductId {
        self.product
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Completed operations in completion order
    pub fn completed_operations(&self) -> &[OperationId] {
        &self.completed_operations
    }

    /// Operation and station the job is currently heading for or occupying
    pub fn planned(&self) -> Option<StationOperation> {
        self.planned
    }

    pub fn planned_job_operation(&self) -> Option<JobOperation> {
        self.planned
            .map(|planned| JobOperation::new(self.id, planned.operation))
    }

    pub fn due_date(&self) -> f64 {
        self.due_date
    }

    pub fn is_rush(&self) -> bool {
        self.rush
    }

    /// Set once planning found no capable, enabled station for the remaining work
    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    pub fn transit(&self) -> Option<&Transit> {
        self.transit.as_ref()
    }

    pub fn metrics(&self) -> &JobMetrics {
        &self.metrics
    }

    /// Operations of the product not yet completed, in product order
    pub fn uncompleted_operations(&self, product: &Product) -> Vec<OperationId> {
        product
            .operations
            .iter()
            .copied()
            .filter(|op| !self.completed_operations.contains(op))
            .collect()
    }

    /// Uncompleted operations whose predecessors within the product are all
    /// completed
    pub fn next_operations(&self, product: &Product, operations: &[Operation]) -> Vec<OperationId> {
        self.uncompleted_operations(product)
            .into_iter()
            .filter(|op| {
                operations[op.index()]
                    .predecessors
                    .iter()
                    .filter(|pred| product.operations.contains(pred))
                    .all(|pred| self.completed_operations.contains(pred))
            })
            .collect()
    }

    /// Ranking used by stations to pick the next queued job; earlier due
    /// dates rank higher
    pub fn score_for_job_operation(&self, _job_operation: &JobOperation) -> f64 {
        1.0 / self.due_date
    }

    pub(crate) fn set_queued(&mut self) {
        self.status = JobStatus::Queued;
    }

    /// Enter the processing phase and book the time spent waiting since arrival
    pub(crate) fn set_processing(&mut self, now: SimulationTime) {
        if self.metrics.last_mark == Some(MetricMark::Arrived) {
            self.metrics.waiting_time += now - self.metrics.last_time;
        }
        self.metrics.last_mark = Some(MetricMark::Processing);
        self.metrics.last_time = now;
        self.status = JobStatus::Processing;
    }

    /// Record a finished operation; the caller re-plans the job afterwards
    pub(crate) fn record_completed_operation(
        &mut self,
        operation: OperationId,
        duration: SimulationTime,
    ) {
        self.metrics.working_time += duration;
        self.completed_operations.push(operation);
    }

    pub(crate) fn mark_arrived(&mut self, at: SimulationTime) {
        self.metrics.last_mark = Some(MetricMark::Arrived);
        self.metrics.last_time = at;
    }

    /// Book a movement along the line, towards a station queue or the sink.
    ///
    /// Moves in and out of a station slot are handling, not transport.
    pub(crate) fn record_transport(&mut self, transit: &Transit) {
        self.metrics.transport_time += transit.duration();
    }

    /// Start a transit and move the job to its destination
    pub(crate) fn depart(
        &mut self,
        id: TransitId,
        destination: Coordinate,
        now: SimulationTime,
        duration: SimulationTime,
    ) -> Transit {
        let transit = Transit {
            id,
            origin: self.position,
            destination,
            departed_at: now,
            eta: now + duration,
        };
        self.position = destination;
        self.transit = Some(transit);
        transit
    }

    /// True while `transit` is the job's current movement
    pub(crate) fn is_current_transit(&self, transit: TransitId) -> bool {
        self.transit.map_or(false, |current| current.id == transit)
    }

    /// True if `job_operation` at `station` is still the job's plan
    pub(crate) fn plans(&self, job_operation: &JobOperation, station: StationId) -> bool {
        self.planned.map_or(false, |planned| {
            planned.station == station && planned.operation == job_operation.operation
        })
    }
}

/// Description of a job to be added to the manager
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub product: ProductId,
    pub key: Option<String>,
    pub due_date: f64,
    pub rush: bool,
    pub position: Option<Coordinate>,
}

impl JobSpec {
    /// Job of `product` with due date 1, no rush and a generated key,
    /// starting at the line source
    pub fn new(product: ProductId) -> Self {
        Self {
            product,
            key: None,
            due_date: 1.0,
            rush: false,
            position: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_due_date(mut self, due_date: f64) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_rush(mut self, rush: bool) -> Self {
        self.rush = rush;
        self
    }

    pub fn at(mut self, position: Coordinate) -> Self {
        self.position = Some(position);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> (Product, Vec<Operation>) {
        // 0 -> 2, 1 -> 2, 3 requires an operation outside the product
        let mut operations = vec![
            Operation::new("left door", 40.0),
            Operation::new("right door", 40.0),
            Operation::new("spoiler", 20.0),
            Operation::new("paint", 5.0),
        ];
        operations[2].add_predecessor(OperationId(0));
        operations[2].add_predecessor(OperationId(1));
        operations[3].add_predecessor(OperationId(9));
        let product = Product {
            name: "A-Klasse".to_string(),
            quantity: 1,
            operations: vec![OperationId(0), OperationId(1), OperationId(2), OperationId(3)],
        };
        (product, operations)
    }

    fn job() -> Job {
        Job::from_spec(
            JobId(0),
            JobSpec::new(ProductId(0)).with_key("7").with_due_date(4.0),
            Coordinate::new(-200.0, -200.0),
        )
    }

    #[test]
    fn test_new_job_defaults() {
        let job = Job::from_spec(JobId(1), JobSpec::new(ProductId(0)), Coordinate::new(1.0, 2.0));
        assert_eq!(job.status(), JobStatus::Waiting);
        assert_eq!(job.due_date(), 1.0);
        assert!(!job.is_rush());
        assert_eq!(job.position(), Coordinate::new(1.0, 2.0));
        assert!(Uuid::parse_str(job.key()).is_ok());
    }

    #[test]
    fn test_next_operations_respect_predecessors() {
        let (product, operations) = line();
        let mut job = job();

        // predecessors outside the product are ignored
        assert_eq!(
            job.next_operations(&product, &operations),
            vec![OperationId(0), OperationId(1), OperationId(3)]
        );

        job.record_completed_operation(OperationId(0), 40.0);
        assert!(!job.next_operations(&product, &operations).contains(&OperationId(2)));

        job.record_completed_operation(OperationId(1), 40.0);
        assert_eq!(
            job.next_operations(&product, &operations),
            vec![OperationId(2), OperationId(3)]
        );
        assert_eq!(job.metrics().working_time, 80.0);
    }

    #[test]
    fn test_score_prefers_early_due_dates() {
        let job = job();
        let jo = JobOperation::new(job.id(), OperationId(0));
        assert_eq!(job.score_for_job_operation(&jo), 0.25);
    }

    #[test]
    fn test_depart_moves_job_and_tracks_transport() {
        let mut job = job();
        let transit = job.depart(3, Coordinate::new(0.0, 0.0), 10.0, 4.0);

        assert_eq!(transit.eta, 14.0);
        assert_eq!(transit.duration(), 4.0);
        assert_eq!(job.position(), Coordinate::new(0.0, 0.0));
        assert!(job.is_current_transit(3));
        assert!(!job.is_current_transit(2));
        // only booked moves count as transport
        assert_eq!(job.metrics().transport_time, 0.0);
        job.record_transport(&transit);
        assert_eq!(job.metrics().transport_time, 4.0);
    }

    #[test]
    fn test_waiting_time_counts_from_arrival() {
        let mut job = job();
        let transit = job.depart(0, Coordinate::new(0.0, 0.0), 0.0, 5.0);
        job.mark_arrived(transit.eta);
        // pulling into the slot does not restart the waiting clock
        job.depart(1, Coordinate::new(10.0, 0.0), 8.0, 2.0);
        job.set_processing(12.0);
        assert_eq!(job.metrics().waiting_time, 7.0);
        assert_eq!(job.status(), JobStatus::Processing);

        // no arrival in between, nothing more to book
        job.set_processing(20.0);
        assert_eq!(job.metrics().waiting_time, 7.0);
    }
}
