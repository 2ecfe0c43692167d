use super::event::{Emission, SimEvent};
use super::job::Job;
use super::operation::Operation;
use super::types::{CapabilityId, Coordinate, JobId, JobOperation, SimulationTime, StationId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STATION_WIDTH: f64 = 120.0;
pub const DEFAULT_STATION_HEIGHT: f64 = 100.0;

/// Phase of a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationStatus {
    Vacant,
    Setup,
    Processing,
    FollowUp,
    Disabled,
}

/// Where a queued job waits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueuePosition {
    InStation,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedJobOperation {
    pub job_operation: JobOperation,
    pub position: QueuePosition,
}

/// Description of a station to be registered with the manager
#[derive(Debug, Clone, PartialEq)]
pub struct StationSpec {
    pub name: String,
    pub capabilities: Vec<CapabilityId>,
    pub position: Coordinate,
    pub width: f64,
    pub height: f64,
}

impl StationSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
            position: Coordinate::default(),
            width: DEFAULT_STATION_WIDTH,
            height: DEFAULT_STATION_HEIGHT,
        }
    }

    pub fn with_capability(mut self, capability: CapabilityId) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Coordinate::new(x, y);
        self
    }

    pub fn with_dimensions(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Assembly station with its moving, queued and active job operations
#[derive(Debug, Clone)]
pub struct Station {
    pub(crate) id: StationId,
    pub(crate) name: String,
    pub(crate) capabilities: Vec<CapabilityId>,
    pub(crate) position: Coordinate,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) status: StationStatus,
    pub(crate) disabled: bool,
    pub(crate) occupied: bool,
    pub(crate) moving: Vec<JobOperation>,
    pub(crate) queued: Vec<QueuedJobOperation>,
    pub(crate) active: Option<JobOperation>,
    pub(crate) expected_finish_time: SimulationTime,
    pub(crate) active_action_duration: SimulationTime,
    pub(crate) setup_time: SimulationTime,
    pub(crate) process_time: SimulationTime,
    pub(crate) follow_up_time: SimulationTime,
    pub(crate) pulling_job_in: bool,
}

impl Station {
    pub(crate) fn from_spec(id: StationId, spec: StationSpec) -> Self {
        Self {
            id,
            name: spec.name,
            capabilities: spec.capabilities,
            position: spec.position,
            width: spec.width,
            height: spec.height,
            status: StationStatus::Vacant,
            disabled: false,
            occupied: false,
            moving: Vec::new(),
            queued: Vec::new(),
            active: None,
            expected_finish_time: -1.0,
            active_action_duration: -1.0,
            setup_time: 0.0,
            process_time: 0.0,
            follow_up_time: 0.0,
            pulling_job_in: false,
        }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &[CapabilityId] {
        &self.capabilities
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    pub fn status(&self) -> StationStatus {
        self.status
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn moving(&self) -> &[JobOperation] {
        &self.moving
    }

    pub fn queued(&self) -> &[QueuedJobOperation] {
        &self.queued
    }

    pub fn active(&self) -> Option<JobOperation> {
        self.active
    }

    pub fn expected_finish_time(&self) -> SimulationTime {
        self.expected_finish_time
    }

    /// Accumulated setup time of all completed setups
    pub fn setup_time(&self) -> SimulationTime {
        self.setup_time
    }

    pub fn process_time(&self) -> SimulationTime {
        self.process_time
    }

    pub fn follow_up_time(&self) -> SimulationTime {
        self.follow_up_time
    }

    pub fn is_pulling_job_in(&self) -> bool {
        self.pulling_job_in
    }

    /// Centre of the station, where jobs are processed
    pub fn origin(&self) -> Coordinate {
        Coordinate::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }

    /// Left-bottom edge, where displaced jobs wait
    pub fn queue_position(&self) -> Coordinate {
        Coordinate::new(
            self.position.x - self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }

    /// True if the station carries every given capability
    pub fn is_capable_of(&self, operation: &Operation) -> bool {
        operation
            .required_capabilities
            .iter()
            .all(|capability| self.capabilities.contains(capability))
    }

    /// No active job and no job being pulled in
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && !self.pulling_job_in
    }

    /// Progress of the running phase in percent
    pub fn active_action_progress(&self, now: SimulationTime) -> f64 {
        if self.active_action_duration > 0.0 && self.expected_finish_time > -1.0 {
            let started = self.expected_finish_time - self.active_action_duration;
            ((now - started) / self.active_action_duration * 100.0).round()
        } else {
            0.0
        }
    }

    /// Time until the running phase ends, zero when vacant
    pub fn remaining_time(&self, now: SimulationTime) -> SimulationTime {
        if self.occupied {
            self.expected_finish_time - now
        } else {
            0.0
        }
    }

    /// Estimated completion time of `operation` if it were sent here now,
    /// transport excluded
    pub fn max_completion_time_for(
        &self,
        operation: &Operation,
        operations: &[Operation],
        now: SimulationTime,
    ) -> SimulationTime {
        let remaining = (self.expected_finish_time - now).max(0.0);
        let queued: SimulationTime = self
            .queued
            .iter()
            .map(|queued| operations[queued.job_operation.operation.index()].total_duration())
            .sum();
        let moving: SimulationTime = self
            .moving
            .iter()
            .map(|jo| operations[jo.operation.index()].total_duration())
            .sum();
        remaining + queued + moving + operation.processing_time
    }

    /// Register a job heading for the station
    pub(crate) fn register_moving_job(&mut self, job_operation: JobOperation) -> Option<SimEvent> {
        if self.moving.contains(&job_operation) {
            return None;
        }
        self.moving.push(job_operation);
        Some(SimEvent::JobRegistered {
            job_operation,
            station: self.id,
        })
    }

    /// Remove a job from the moving list, else from the queue, else from the
    /// active slot
    pub(crate) fn deregister_job(&mut self, job: JobId) {
        if let Some(index) = self.moving.iter().position(|jo| jo.job == job) {
            self.moving.remove(index);
            return;
        }
        if let Some(index) = self.queued.iter().position(|q| q.job_operation.job == job) {
            self.queued.remove(index);
            self.pulling_job_in = false;
            return;
        }
        if self.active.map_or(false, |jo| jo.job == job) {
            self.reset();
        }
    }

    /// Remove the exact job operation from the moving list
    pub(crate) fn take_moving(&mut self, job_operation: &JobOperation) -> bool {
        match self.moving.iter().position(|jo| jo == job_operation) {
            Some(index) => {
                self.moving.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn queue_job_operation(
        &mut self,
        job_operation: JobOperation,
        position: QueuePosition,
    ) -> Option<SimEvent> {
        if self.queued.iter().any(|q| q.job_operation == job_operation) {
            return None;
        }
        self.queued.push(QueuedJobOperation {
            job_operation,
            position,
        });
        Some(SimEvent::JobQueued {
            job_operation,
            station: self.id,
        })
    }

    /// Queued job operation with the highest job score, first one on ties
    pub fn best_job_operation(&self, jobs: &[Job]) -> Option<JobOperation> {
        let mut best: Option<(JobOperation, f64)> = None;
        for queued in &self.queued {
            let jo = queued.job_operation;
            let score = jobs[jo.job.index()].score_for_job_operation(&jo);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((jo, score)),
            }
        }
        best.map(|(jo, _)| jo)
    }

    /// Take out a job of another order still sitting in the station slot
    pub(crate) fn take_displaced(&mut self, selected: JobId) -> Option<JobOperation> {
        let index = self.queued.iter().position(|q| {
            q.position == QueuePosition::InStation && q.job_operation.job != selected
        })?;
        Some(self.queued.remove(index).job_operation)
    }

    pub(crate) fn remove_queued(&mut self, job: JobId) {
        if let Some(index) = self.queued.iter().position(|q| q.job_operation.job == job) {
            self.queued.remove(index);
        }
    }

    /// True if `job_operation` is active and the station is in `status`
    pub(crate) fn is_in_phase(&self, job_operation: &JobOperation, status: StationStatus) -> bool {
        self.active.as_ref() == Some(job_operation) && self.status == status
    }

    pub(crate) fn start_setup(
        &mut self,
        operation: &Operation,
        now: SimulationTime,
    ) -> Vec<Emission> {
        let Some(job_operation) = self.active else {
            return Vec::new();
        };
        self.pulling_job_in = false;
        self.active_action_duration = operation.setup_time;
        self.expected_finish_time = now + operation.setup_time;
        self.status = StationStatus::Setup;
        self.occupied = true;
        vec![
            (
                SimEvent::SetUpStarted {
                    station: self.id,
                    job_operation,
                },
                now,
            ),
            (
                SimEvent::SetUpCompleted {
                    station: self.id,
                    job_operation,
                },
                self.expected_finish_time,
            ),
        ]
    }

    pub(crate) fn complete_setup(
        &mut self,
        operation: &Operation,
        now: SimulationTime,
    ) -> Vec<Emission> {
        self.setup_time += operation.setup_time;
        self.start_processing(operation, now)
    }

    pub(crate) fn start_processing(
        &mut self,
        operation: &Operation,
        now: SimulationTime,
    ) -> Vec<Emission> {
        let Some(job_operation) = self.active else {
            return Vec::new();
        };
        self.status = StationStatus::Processing;
        self.active_action_duration = operation.processing_time;
        self.expected_finish_time = now + operation.processing_time;
        vec![
            (
                SimEvent::ProcessingStarted {
                    station: self.id,
                    job_operation,
                },
                now,
            ),
            (
                SimEvent::ProcessingCompleted {
                    station: self.id,
                    job_operation,
                },
                self.expected_finish_time,
            ),
        ]
    }

    pub(crate) fn complete_processing(
        &mut self,
        operation: &Operation,
        now: SimulationTime,
    ) -> Vec<Emission> {
        self.process_time += operation.processing_time;
        self.start_follow_up(operation, now)
    }

    pub(crate) fn start_follow_up(
        &mut self,
        operation: &Operation,
        now: SimulationTime,
    ) -> Vec<Emission> {
        let Some(job_operation) = self.active else {
            return Vec::new();
        };
        self.status = StationStatus::FollowUp;
        self.active_action_duration = operation.follow_up_time;
        self.expected_finish_time = now + operation.follow_up_time;
        vec![
            (
                SimEvent::FollowUpStarted {
                    station: self.id,
                    job_operation,
                },
                now,
            ),
            (
                SimEvent::FollowUpCompleted {
                    station: self.id,
                    job_operation,
                },
                self.expected_finish_time,
            ),
        ]
    }

    /// Book the follow-up and free the station; the caller evaluates the queue
    pub(crate) fn complete_follow_up(&mut self, operation: &Operation) {
        self.follow_up_time += operation.follow_up_time;
        self.reset();
    }

    /// Take the station out of service, dropping its active, queued and
    /// moving jobs
    pub(crate) fn disable(&mut self) -> SimEvent {
        self.disabled = true;
        self.reset();
        self.queued.clear();
        self.moving.clear();
        self.status = StationStatus::Disabled;
        SimEvent::StationDisabled { station: self.id }
    }

    pub(crate) fn enable(&mut self) -> SimEvent {
        self.disabled = false;
        self.status = StationStatus::Vacant;
        SimEvent::StationReactivated { station: self.id }
    }

    /// Drop a completed job from the queue
    pub(crate) fn purge_job(&mut self, job: JobId) {
        self.queued.retain(|q| q.job_operation.job != job);
    }

    /// Back to vacant, keeping queue and totals
    pub(crate) fn reset(&mut self) {
        self.status = StationStatus::Vacant;
        self.occupied = false;
        self.active = None;
        self.pulling_job_in = false;
        self.expected_finish_time = -1.0;
        self.active_action_duration = -1.0;
    }

    /// Return to the freshly registered state
    pub(crate) fn restore(&mut self) {
        self.reset();
        self.disabled = false;
        self.moving.clear();
        self.queued.clear();
        self.setup_time = 0.0;
        self.process_time = 0.0;
        self.follow_up_time = 0.0;
    }
}
