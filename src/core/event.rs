use super::types::{JobId, JobOperation, OperationId, SimulationTime, StationId, TransitId};

pub const JOB_DISPATCHED_EVENT: &str = "job:dispatched";
pub const JOB_STARTED_MOVING_EVENT: &str = "job:started_movement";
pub const JOB_STOPPED_MOVING_EVENT: &str = "job:stopped_movement";
pub const JOB_STARTED_PROCESSING_EVENT: &str = "job:started_processing";
pub const JOB_ARRIVED_EVENT: &str = "job:arrived_at_station";
pub const JOB_IN_STATION_EVENT: &str = "job:in_station";
pub const JOB_ABORT_EVENT: &str = "job:abort";
pub const JOB_COMPLETED_EVENT: &str = "job:completed";
pub const JOB_REGISTERED_EVENT: &str = "station:job_registered";
pub const JOB_QUEUED_EVENT: &str = "station:job_queued";
pub const SET_UP_STARTED_EVENT: &str = "station:set_up_started";
pub const SET_UP_COMPLETED_EVENT: &str = "station:set_up_completed";
pub const PROCESSING_STARTED_EVENT: &str = "station:processing_started";
pub const PROCESSING_COMPLETED_EVENT: &str = "station:processing_completed";
pub const FOLLOW_UP_STARTED_EVENT: &str = "station:follow_up_started";
pub const FOLLOW_UP_COMPLETED_EVENT: &str = "station:follow_up_completed";
pub const STATION_DISABLED_EVENT: &str = "station:disabled";
pub const STATION_REACTIVATED_EVENT: &str = "station:reactivated";

/// Domain events exchanged between jobs, stations and the dispatcher.
///
/// Every variant maps to one of the published event names above. Transit
/// related variants carry the transit id that produced them so a handler can
/// recognise continuations of a movement that has since been cancelled.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    JobDispatched {
        job: JobId,
    },
    JobStartedMoving {
        job: JobId,
        operation: Option<OperationId>,
        station: Option<StationId>,
    },
    JobStoppedMoving {
        job_operation: JobOperation,
        station: StationId,
    },
    JobStartedProcessing {
        job: JobId,
    },
    JobArrived {
        job_operation: JobOperation,
        station: StationId,
        transit: TransitId,
    },
    JobInStation {
        job_operation: JobOperation,
        station: StationId,
        transit: TransitId,
    },
    JobAbort {
        job_operation: JobOperation,
        station: StationId,
    },
    JobCompleted {
        job: JobId,
    },
    JobRegistered {
        job_operation: JobOperation,
        station: StationId,
    },
    JobQueued {
        job_operation: JobOperation,
        station: StationId,
    },
    SetUpStarted {
        station: StationId,
        job_operation: JobOperation,
    },
    SetUpCompleted {
        station: StationId,
        job_operation: JobOperation,
    },
    ProcessingStarted {
        station: StationId,
        job_operation: JobOperation,
    },
    ProcessingCompleted {
        station: StationId,
        job_operation: JobOperation,
    },
    FollowUpStarted {
        station: StationId,
        job_operation: JobOperation,
    },
    FollowUpCompleted {
        station: StationId,
        job_operation: JobOperation,
    },
    StationDisabled {
        station: StationId,
    },
    StationReactivated {
        station: StationId,
    },
}

impl SimEvent {
    /// Published name of the event
    pub fn name(&self) -> &'static str {
        match self {
            SimEvent::JobDispatched { .. } => JOB_DISPATCHED_EVENT,
            SimEvent::JobStartedMoving { .. } => JOB_STARTED_MOVING_EVENT,
            SimEvent::JobStoppedMoving { .. } => JOB_STOPPED_MOVING_EVENT,
            SimEvent::JobStartedProcessing { .. } => JOB_STARTED_PROCESSING_EVENT,
            SimEvent::JobArrived { .. } => JOB_ARRIVED_EVENT,
            SimEvent::JobInStation { .. } => JOB_IN_STATION_EVENT,
            SimEvent::JobAbort { .. } => JOB_ABORT_EVENT,
            SimEvent::JobCompleted { .. } => JOB_COMPLETED_EVENT,
            SimEvent::JobRegistered { .. } => JOB_REGISTERED_EVENT,
            SimEvent::JobQueued { .. } => JOB_QUEUED_EVENT,
            SimEvent::SetUpStarted { .. } => SET_UP_STARTED_EVENT,
            SimEvent::SetUpCompleted { .. } => SET_UP_COMPLETED_EVENT,
            SimEvent::ProcessingStarted { .. } => PROCESSING_STARTED_EVENT,
            SimEvent::ProcessingCompleted { .. } => PROCESSING_COMPLETED_EVENT,
            SimEvent::FollowUpStarted { .. } => FOLLOW_UP_STARTED_EVENT,
            SimEvent::FollowUpCompleted { .. } => FOLLOW_UP_COMPLETED_EVENT,
            SimEvent::StationDisabled { .. } => STATION_DISABLED_EVENT,
            SimEvent::StationReactivated { .. } => STATION_REACTIVATED_EVENT,
        }
    }

    /// Job the event refers to, if any
    pub fn job(&self) -> Option<JobId> {
        match self {
            SimEvent::JobDispatched { job }
            | SimEvent::JobStartedMoving { job, .. }
            | SimEvent::JobStartedProcessing { job }
            | SimEvent::JobCompleted { job } => Some(*job),
            SimEvent::JobStoppedMoving { job_operation, .. }
            | SimEvent::JobArrived { job_operation, .. }
            | SimEvent::JobInStation { job_operation, .. }
            | SimEvent::JobAbort { job_operation, .. }
            | SimEvent::JobRegistered { job_operation, .. }
            | SimEvent::JobQueued { job_operation, .. }
            | SimEvent::SetUpStarted { job_operation, .. }
            | SimEvent::SetUpCompleted { job_operation, .. }
            | SimEvent::ProcessingStarted { job_operation, .. }
            | SimEvent::ProcessingCompleted { job_operation, .. }
            | SimEvent::FollowUpStarted { job_operation, .. }
            | SimEvent::FollowUpCompleted { job_operation, .. } => Some(job_operation.job),
            SimEvent::StationDisabled { .. } | SimEvent::StationReactivated { .. } => None,
        }
    }

    /// Operation the event refers to, if any
    pub fn operation(&self) -> Option<OperationId> {
        match self {
            SimEvent::JobStartedMoving { operation, .. } => *operation,
            SimEvent::JobStoppedMoving { job_operation, .. }
            | SimEvent::JobArrived { job_operation, .. }
            | SimEvent::JobInStation { job_operation, .. }
            | SimEvent::JobAbort { job_operation, .. }
            | SimEvent::JobRegistered { job_operation, .. }
            | SimEvent::JobQueued { job_operation, .. }
            | SimEvent::SetUpStarted { job_operation, .. }
            | SimEvent::SetUpCompleted { job_operation, .. }
            | SimEvent::ProcessingStarted { job_operation, .. }
            | SimEvent::ProcessingCompleted { job_operation, .. }
            | SimEvent::FollowUpStarted { job_operation, .. }
            | SimEvent::FollowUpCompleted { job_operation, .. } => Some(job_operation.operation),
            SimEvent::JobDispatched { .. }
            | SimEvent::JobStartedProcessing { .. }
            | SimEvent::JobCompleted { .. }
            | SimEvent::StationDisabled { .. }
            | SimEvent::StationReactivated { .. } => None,
        }
    }

    /// Station the event refers to, if any
    pub fn station(&self) -> Option<StationId> {
        match self {
            SimEvent::JobDispatched { .. }
            | SimEvent::JobStartedProcessing { .. }
            | SimEvent::JobCompleted { .. } => None,
            SimEvent::JobStartedMoving { station, .. } => *station,
            SimEvent::JobStoppedMoving { station, .. }
            | SimEvent::JobArrived { station, .. }
            | SimEvent::JobInStation { station, .. }
            | SimEvent::JobAbort { station, .. }
            | SimEvent::JobRegistered { station, .. }
            | SimEvent::JobQueued { station, .. }
            | SimEvent::SetUpStarted { station, .. }
            | SimEvent::SetUpCompleted { station, .. }
            | SimEvent::ProcessingStarted { station, .. }
            | SimEvent::ProcessingCompleted { station, .. }
            | SimEvent::FollowUpStarted { station, .. }
            | SimEvent::FollowUpCompleted { station, .. }
            | SimEvent::StationDisabled { station }
            | SimEvent::StationReactivated { station } => Some(*station),
        }
    }
}

/// Event produced by a component together with the time it becomes available
pub type Emission = (SimEvent, SimulationTime);

/// Component that put an event on the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSender {
    Manager,
    Station(StationId),
    Job(JobId),
}
