use super::Manager;
use crate::core::event::SimEvent;
use crate::core::job::JobStatus;
use crate::core::station::{QueuePosition, StationStatus};
use crate::core::types::{JobId, JobOperation, StationId, TransitId};
use log::debug;

impl Manager {
    pub(super) fn handle_started_moving(
        &mut self,
        job_operation: JobOperation,
        station: StationId,
    ) {
        if !self.jobs[job_operation.job.index()].plans(&job_operation, station) {
            return;
        }
        if let Some(event) = self.stations[station.index()].register_moving_job(job_operation) {
            let now = self.time();
            self.emit(event, now);
        }
    }

    pub(super) fn handle_job_queued(&mut self, job_operation: JobOperation, station: StationId) {
        let job = &mut self.jobs[job_operation.job.index()];
        if job.plans(&job_operation, station) {
            job.set_queued();
        }
    }

    /// Queue an arriving job and pull it in right away if the station is idle
    pub(super) fn handle_job_arrival(
        &mut self,
        job_operation: JobOperation,
        station: StationId,
        transit: TransitId,
    ) {
        let job = &self.jobs[job_operation.job.index()];
        if !job.is_current_transit(transit) || !job.plans(&job_operation, station) {
            debug!("ignoring stale arrival of {} at {}", job.key, station);
            return;
        }
        let job_x = job.position.x;
        if self.stations[station.index()].disabled {
            self.prepare_next_operation(job_operation.job);
            return;
        }

        let now = self.time();
        let target = &mut self.stations[station.index()];
        let position = if target.take_moving(&job_operation) {
            if job_x > target.position.x {
                QueuePosition::Right
            } else {
                QueuePosition::Left
            }
        } else {
            QueuePosition::InStation
        };
        let queued = target.queue_job_operation(job_operation, position);
        if let Some(event) = queued {
            self.emit(event, now);
        }
        if self.stations[station.index()].is_idle() {
            self.evaluate_queue(station);
        }
    }

    /// Pull the best queued job into the station
    pub(super) fn evaluate_queue(&mut self, station: StationId) {
        let Some(best) = self.stations[station.index()].best_job_operation(&self.jobs) else {
            return;
        };
        let now = self.time();
        self.stations[station.index()].pulling_job_in = true;

        // a job of another order still in the slot goes back to the queue
        if let Some(displaced) = self.stations[station.index()].take_displaced(best.job) {
            let target = &mut self.stations[station.index()];
            let registered = target.register_moving_job(displaced);
            let queue_position = target.queue_position();
            if let Some(event) = registered {
                self.emit(event, now);
            }
            let transit = self.start_transit(displaced.job, queue_position);
            self.emit(
                SimEvent::JobArrived {
                    job_operation: displaced,
                    station,
                    transit: transit.id,
                },
                transit.eta,
            );
        }
        self.select_job_operation(station, best);
    }

    fn select_job_operation(&mut self, station: StationId, job_operation: JobOperation) {
        if self.stations[station.index()].active.is_some() {
            self.stations[station.index()].pulling_job_in = false;
            return;
        }
        let origin = self.stations[station.index()].origin();
        let transit = self.start_transit(job_operation.job, origin);
        let target = &mut self.stations[station.index()];
        target.remove_queued(job_operation.job);
        target.active = Some(job_operation);
        self.emit(
            SimEvent::JobInStation {
                job_operation,
                station,
                transit: transit.id,
            },
            transit.eta,
        );
    }

    pub(super) fn handle_job_in_station(
        &mut self,
        job_operation: JobOperation,
        station: StationId,
        transit: TransitId,
    ) {
        if !self.jobs[job_operation.job.index()].is_current_transit(transit)
            || self.stations[station.index()].active != Some(job_operation)
        {
            return;
        }
        let now = self.time();
        let emissions = self.stations[station.index()]
            .start_setup(&self.operations[job_operation.operation.index()], now);
        self.emit_all(emissions);
    }

    pub(super) fn handle_setup_completed(
        &mut self,
        station: StationId,
        job_operation: JobOperation,
    ) {
        if !self.stations[station.index()].is_in_phase(&job_operation, StationStatus::Setup) {
            return;
        }
        let now = self.time();
        let emissions = self.stations[station.index()]
            .complete_setup(&self.operations[job_operation.operation.index()], now);
        self.emit_all(emissions);
    }

    pub(super) fn handle_processing_started(
        &mut self,
        station: StationId,
        job_operation: JobOperation,
    ) {
        if !self.stations[station.index()].is_in_phase(&job_operation, StationStatus::Processing) {
            return;
        }
        let now = self.time();
        self.jobs[job_operation.job.index()].set_processing(now);
        self.emit(
            SimEvent::JobStartedProcessing {
                job: job_operation.job,
            },
            now,
        );
    }

    /// The job moves on to its next step while the station does its follow-up
    pub(super) fn handle_processing_completed(
        &mut self,
        station: StationId,
        job_operation: JobOperation,
    ) {
        if !self.stations[station.index()].is_in_phase(&job_operation, StationStatus::Processing) {
            return;
        }
        self.complete_job_operation(job_operation);
        let now = self.time();
        let emissions = self.stations[station.index()]
            .complete_processing(&self.operations[job_operation.operation.index()], now);
        self.emit_all(emissions);
    }

    pub(super) fn handle_follow_up_completed(
        &mut self,
        station: StationId,
        job_operation: JobOperation,
    ) {
        if !self.stations[station.index()].is_in_phase(&job_operation, StationStatus::FollowUp) {
            return;
        }
        self.stations[station.index()]
            .complete_follow_up(&self.operations[job_operation.operation.index()]);
        self.evaluate_queue(station);
    }

    /// Abort every active job planned at the disabled station
    pub(super) fn handle_station_disabled(&mut self, station: StationId) {
        let affected: Vec<JobId> = self
            .active
            .iter()
            .copied()
            .filter(|job| {
                self.jobs[job.index()]
                    .planned
                    .map_or(false, |planned| planned.station == station)
            })
            .collect();
        for job in affected {
            self.abort_job(job);
        }
    }

    /// Give parked jobs and jobs queued elsewhere a chance to use the
    /// reactivated station
    pub(super) fn handle_station_reactivated(&mut self, station: StationId) {
        let active = self.active.clone();
        for job in active {
            let (planned, status, dispatched) = {
                let job = &self.jobs[job.index()];
                (job.planned, job.status, job.metrics.dispatched_at.is_some())
            };
            match planned {
                None if dispatched && status != JobStatus::Completed => {
                    self.prepare_next_operation(job);
                }
                Some(planned) if planned.station != station && status == JobStatus::Queued => {
                    self.abort_job(job);
                }
                _ => {}
            }
        }
    }
}
