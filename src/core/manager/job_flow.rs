use super::Manager;
use crate::core::event::SimEvent;
use crate::core::job::{JobStatus, Transit};
use crate::core::station::QueuePosition;
use crate::core::types::{Coordinate, JobId, JobOperation, SimulationTime, StationOperation};
use log::{debug, warn};

impl Manager {
    /// Best {operation, station} pair for the job's next eligible operations.
    ///
    /// Candidates are scanned operation by operation in product order, then
    /// station by station in registry order; the first candidate wins ties.
    pub fn find_next_station(&self, job: JobId) -> Option<StationOperation> {
        let job = self.job(job)?;
        let product = self.product(job.product)?;
        let now = self.time();

        let mut best: Option<(StationOperation, f64)> = None;
        for operation_id in job.next_operations(product, &self.operations) {
            let operation = &self.operations[operation_id.index()];
            for station in self.stations.iter().filter(|s| !s.disabled) {
                if !station.is_capable_of(operation) {
                    continue;
                }
                let completion =
                    station.max_completion_time_for(operation, &self.operations, now);
                let transport = self
                    .transport
                    .transport_duration(job.position, station.origin());
                let score = 1.0 / (completion + transport);
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((StationOperation::new(station.id, operation_id), score));
                }
            }
        }
        best.map(|(planned, _)| planned)
    }

    pub(super) fn handle_job_dispatched(&mut self, job: JobId) {
        let now = self.time();
        self.jobs[job.index()].metrics.dispatched_at = Some(now);
        self.prepare_next_operation(job);
    }

    /// Plan the job's next step: head for the best station, park it as
    /// infeasible, or send it to the sink once all work is done
    pub(super) fn prepare_next_operation(&mut self, job: JobId) {
        let previous = self.jobs[job.index()].planned;
        match self.find_next_station(job) {
            Some(planned) => self.head_for_station(job, planned, previous),
            None => {
                let remaining = {
                    let job = &self.jobs[job.index()];
                    job.uncompleted_operations(&self.products[job.product.index()])
                };
                if remaining.is_empty() {
                    self.send_to_sink(job);
                } else {
                    let job = &mut self.jobs[job.index()];
                    job.planned = None;
                    job.infeasible = true;
                    warn!(
                        "job {} is infeasible, {} operations left without a station",
                        job.key,
                        remaining.len()
                    );
                }
            }
        }
    }

    fn head_for_station(
        &mut self,
        job: JobId,
        planned: StationOperation,
        previous: Option<StationOperation>,
    ) {
        let now = self.time();
        let station = planned.station;
        let job_operation = JobOperation::new(job, planned.operation);
        {
            let job = &mut self.jobs[job.index()];
            job.planned = Some(planned);
            job.infeasible = false;
        }
        if let Some(event) = self.stations[station.index()].register_moving_job(job_operation) {
            self.emit(event, now);
        }

        if previous.map(|previous| previous.station) == Some(station) {
            // next operation at the same station, the job never leaves
            let target = &mut self.stations[station.index()];
            target.take_moving(&job_operation);
            let queued = target.queue_job_operation(job_operation, QueuePosition::InStation);
            if let Some(event) = queued {
                self.emit(event, now);
            }
            if self.stations[station.index()].is_idle() {
                self.evaluate_queue(station);
            }
            return;
        }

        let origin = self.stations[station.index()].origin();
        let position = self.jobs[job.index()].position;
        let side = if position.x > origin.x { 1.0 } else { -1.0 };
        let waiting = Coordinate::new(origin.x + self.config.line.queue_offset * side, origin.y);

        let transit = if position != waiting {
            self.emit(
                SimEvent::JobStartedMoving {
                    job,
                    operation: Some(planned.operation),
                    station: Some(station),
                },
                now,
            );
            self.jobs[job.index()].status = JobStatus::Moving;
            let transit = self.start_transit(job, waiting);
            self.emit(
                SimEvent::JobStoppedMoving {
                    job_operation,
                    station,
                },
                transit.eta,
            );
            transit
        } else {
            self.start_transit(job, waiting)
        };
        {
            // waiting starts once the job reaches the station queue
            let job = &mut self.jobs[job.index()];
            job.record_transport(&transit);
            job.mark_arrived(transit.eta);
        }
        self.emit(
            SimEvent::JobArrived {
                job_operation,
                station,
                transit: transit.id,
            },
            transit.eta,
        );
    }

    fn send_to_sink(&mut self, job: JobId) {
        let now = self.time();
        self.jobs[job.index()].planned = None;
        self.emit(
            SimEvent::JobStartedMoving {
                job,
                operation: None,
                station: None,
            },
            now,
        );
        let sink = self.config.line.sink;
        let transit = self.start_transit(job, sink);
        {
            let job = &mut self.jobs[job.index()];
            job.record_transport(&transit);
            job.status = JobStatus::Completed;
            job.metrics.completed_at = Some(transit.eta);
        }
        self.active.retain(|active| *active != job);
        self.completed.push(job);
        for station in &mut self.stations {
            station.purge_job(job);
        }
        debug!(
            "{} leaves the line, completes at {:.2}",
            self.jobs[job.index()].key,
            transit.eta
        );
        self.emit(SimEvent::JobCompleted { job }, transit.eta);
    }

    /// Move the job towards `destination`; its position is updated right away
    pub(super) fn start_transit(&mut self, job: JobId, destination: Coordinate) -> Transit {
        let now = self.time();
        let origin = self.jobs[job.index()].position;
        let duration: SimulationTime = if origin == destination {
            0.0
        } else {
            self.transport.transport_duration(origin, destination)
        };
        let id = self.next_transit;
        self.next_transit += 1;
        self.jobs[job.index()].depart(id, destination, now, duration)
    }

    /// Cancel the job's planned assignment and plan again
    pub(super) fn abort_job(&mut self, job: JobId) {
        let Some(planned) = self.jobs[job.index()].planned else {
            return;
        };
        let now = self.time();
        let job_operation = JobOperation::new(job, planned.operation);
        // pending arrivals of the cancelled transit are ignored from now on
        self.jobs[job.index()].transit = None;
        self.stations[planned.station.index()].deregister_job(job);
        self.emit(
            SimEvent::JobAbort {
                job_operation,
                station: planned.station,
            },
            now,
        );
        self.jobs[job.index()].planned = None;

        // a job taken out of the slot leaves the station free for its queue
        let station = &self.stations[planned.station.index()];
        if !station.disabled && station.is_idle() {
            self.evaluate_queue(planned.station);
        }
        self.prepare_next_operation(job);
    }

    pub(super) fn complete_job_operation(&mut self, job_operation: JobOperation) {
        let duration = self.operations[job_operation.operation.index()].total_duration();
        self.jobs[job_operation.job.index()]
            .record_completed_operation(job_operation.operation, duration);
        self.prepare_next_operation(job_operation.job);
    }

    pub(super) fn handle_job_completed(&mut self, job: JobId) {
        if let Some(mut dispatcher) = self.dispatcher.take() {
            let choice =
                dispatcher.handle_job_completion(&self.jobs[job.index()], &self.waiting, self);
            self.dispatcher = Some(dispatcher);
            self.release(choice);
        }
        if self.active.is_empty() {
            self.stop();
        }
    }
}
