//! Line manager
//!
//! The [`Manager`] owns every registry of the line (capabilities, operations,
//! products, stations and jobs) together with the clock, the dispatcher and
//! the observers. It is the only place that schedules events and the only
//! writer of simulation state: jobs and stations are plain data and their
//! transitions are driven from the event handlers in `job_flow` and
//! `station_flow`.

mod job_flow;
mod station_flow;

use super::clock::Clock;
use super::config::{ClockMode, SimulationConfig};
use super::dispatcher::Dispatcher;
use super::error::SimulationError;
use super::event::{Emission, EventSender, SimEvent};
use super::job::{Job, JobSpec};
use super::observer::SimulationObserver;
use super::operation::{Capability, Operation, Product};
use super::station::{Station, StationSpec};
use super::transport::{LinearTransport, TransportModel};
use super::types::{
    CapabilityId, JobId, JobOperation, OperationId, ProductId, SimulationTime, StationId,
    TransitId,
};
use log::{debug, info, warn};

/// Orchestrates jobs, stations and the release policy of one line
pub struct Manager {
    config: SimulationConfig,
    clock: Clock,
    transport: Box<dyn TransportModel>,
    capabilities: Vec<Capability>,
    operations: Vec<Operation>,
    products: Vec<Product>,
    stations: Vec<Station>,
    jobs: Vec<Job>,
    waiting: Vec<JobId>,
    active: Vec<JobId>,
    completed: Vec<JobId>,
    dispatcher: Option<Box<dyn Dispatcher>>,
    observers: Vec<Box<dyn SimulationObserver>>,
    next_transit: TransitId,
    batch_prepared: bool,
}

impl Manager {
    /// Create an empty line using straight-line transport
    pub fn new(config: SimulationConfig) -> Self {
        let transport = Box::new(LinearTransport::from_line(&config.line));
        Self {
            clock: Clock::new(config.clock.clone()),
            config,
            transport,
            capabilities: Vec::new(),
            operations: Vec::new(),
            products: Vec::new(),
            stations: Vec::new(),
            jobs: Vec::new(),
            waiting: Vec::new(),
            active: Vec::new(),
            completed: Vec::new(),
            dispatcher: None,
            observers: Vec::new(),
            next_transit: 0,
            batch_prepared: false,
        }
    }

    /// Replace the transport model
    pub fn with_transport(mut self, transport: Box<dyn TransportModel>) -> Self {
        self.transport = transport;
        self
    }

    pub fn set_transport(&mut self, transport: Box<dyn TransportModel>) {
        self.transport = transport;
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Current simulation time
    pub fn time(&self) -> SimulationTime {
        self.clock.time()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn set_clock_mode(&mut self, mode: ClockMode) {
        self.clock.set_mode(mode);
    }

    // ---------------------------------------------------------------------
    // Registration

    /// Register a capability, returning the existing one for a known label
    pub fn register_capability(&mut self, label: impl Into<String>) -> CapabilityId {
        let label = label.into();
        if let Some(existing) = self.find_capability(&label) {
            return existing;
        }
        let id = CapabilityId(self.capabilities.len());
        self.capabilities.push(Capability { id, label });
        id
    }

    /// Register a station, returning the existing one for a known name
    pub fn register_station(&mut self, spec: StationSpec) -> Result<StationId, SimulationError> {
        if let Some(existing) = self.find_station(&spec.name) {
            return Ok(existing);
        }
        for capability in &spec.capabilities {
            self.check_capability(*capability)?;
        }
        let id = StationId(self.stations.len());
        debug!("registered station {} at {}", spec.name, spec.position);
        self.stations.push(Station::from_spec(id, spec));
        Ok(id)
    }

    /// Register an operation, returning the existing one for a known name
    pub fn register_operation(
        &mut self,
        operation: Operation,
    ) -> Result<OperationId, SimulationError> {
        if let Some(existing) = self.find_operation(&operation.name) {
            return Ok(existing);
        }
        for capability in &operation.required_capabilities {
            self.check_capability(*capability)?;
        }
        for predecessor in &operation.predecessors {
            self.check_operation(*predecessor)?;
        }
        let id = OperationId(self.operations.len());
        self.operations.push(operation);
        Ok(id)
    }

    /// Add `predecessor` to the operations that must precede `operation`
    pub fn require_operation(
        &mut self,
        operation: OperationId,
        predecessor: OperationId,
    ) -> Result<(), SimulationError> {
        self.check_operation(operation)?;
        self.check_operation(predecessor)?;
        self.operations[operation.index()].add_predecessor(predecessor);
        Ok(())
    }

    /// Register a product, returning the existing one for a known name
    pub fn register_product(
        &mut self,
        name: impl Into<String>,
        quantity: u32,
        operations: Vec<OperationId>,
    ) -> Result<ProductId, SimulationError> {
        let name = name.into();
        if let Some(existing) = self.products.iter().position(|p| p.name == name) {
            return Ok(ProductId(existing));
        }
        for operation in &operations {
            self.check_operation(*operation)?;
        }
        let id = ProductId(self.products.len());
        self.products.push(Product {
            name,
            quantity,
            operations,
        });
        Ok(id)
    }

    /// Add a job to the waiting pool
    pub fn add_job(&mut self, spec: JobSpec) -> Result<JobId, SimulationError> {
        if self.product(spec.product).is_none() {
            return Err(SimulationError::UnknownProduct(spec.product.to_string()));
        }
        let id = JobId(self.jobs.len());
        let job = Job::from_spec(id, spec, self.config.line.source);
        self.jobs.push(job);
        self.waiting.push(id);
        Ok(id)
    }

    fn check_capability(&self, id: CapabilityId) -> Result<(), SimulationError> {
        match self.capability(id) {
            Some(_) => Ok(()),
            None => Err(SimulationError::UnknownCapability(id.to_string())),
        }
    }

    fn check_operation(&self, id: OperationId) -> Result<(), SimulationError> {
        match self.operation(id) {
            Some(_) => Ok(()),
            None => Err(SimulationError::UnknownOperation(id.to_string())),
        }
    }

    fn check_job(&self, id: JobId) -> Result<(), SimulationError> {
        match self.job(id) {
            Some(_) => Ok(()),
            None => Err(SimulationError::UnknownJob(id.to_string())),
        }
    }

    fn check_station(&self, id: StationId) -> Result<(), SimulationError> {
        match self.station(id) {
            Some(_) => Ok(()),
            None => Err(SimulationError::UnknownStation(id.to_string())),
        }
    }

    // ---------------------------------------------------------------------
    // Lookup

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn capability(&self, id: CapabilityId) -> Option<&Capability> {
        self.capabilities.get(id.index())
    }

    pub fn find_capability(&self, label: &str) -> Option<CapabilityId> {
        self.capabilities
            .iter()
            .find(|capability| capability.label == label)
            .map(|capability| capability.id)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(id.index())
    }

    pub fn find_operation(&self, name: &str) -> Option<OperationId> {
        self.operations
            .iter()
            .position(|operation| operation.name == name)
            .map(OperationId)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(id.index())
    }

    /// Product lookup ignoring case
    pub fn find_product(&self, name: &str) -> Option<ProductId> {
        self.products
            .iter()
            .position(|product| product.name.eq_ignore_ascii_case(name))
            .map(ProductId)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    pub fn find_station(&self, name: &str) -> Option<StationId> {
        self.stations
            .iter()
            .find(|station| station.name == name)
            .map(|station| station.id)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(id.index())
    }

    pub fn find_job(&self, key: &str) -> Option<JobId> {
        self.jobs.iter().find(|job| job.key == key).map(|job| job.id)
    }

    /// Jobs not yet released, in release order
    pub fn waiting_jobs(&self) -> &[JobId] {
        &self.waiting
    }

    /// Released jobs still on the line
    pub fn active_jobs(&self) -> &[JobId] {
        &self.active
    }

    /// Jobs that left the line, in completion order
    pub fn completed_jobs(&self) -> &[JobId] {
        &self.completed
    }

    /// Stations carrying every capability the operation requires, disabled
    /// ones included
    pub fn capable_stations(&self, operation: OperationId) -> Vec<StationId> {
        let Some(operation) = self.operation(operation) else {
            return Vec::new();
        };
        self.stations
            .iter()
            .filter(|station| station.is_capable_of(operation))
            .map(|station| station.id)
            .collect()
    }

    /// Number of operations of the job's product, zero for unknown jobs
    pub fn operation_count(&self, job: JobId) -> usize {
        self.job(job)
            .and_then(|job| self.product(job.product))
            .map_or(0, Product::operation_count)
    }

    // ---------------------------------------------------------------------
    // Scheduling

    /// Schedule a domain event, now unless `available_at` is given.
    ///
    /// Events naming a job, station or operation this line does not own are
    /// rejected.
    pub fn dispatch_event(
        &mut self,
        event: SimEvent,
        available_at: Option<SimulationTime>,
    ) -> Result<(), SimulationError> {
        if let Some(job) = event.job() {
            self.check_job(job)?;
        }
        if let Some(station) = event.station() {
            self.check_station(station)?;
        }
        if let Some(operation) = event.operation() {
            self.check_operation(operation)?;
        }
        let at = available_at.unwrap_or_else(|| self.time());
        self.clock.schedule(event, at, EventSender::Manager);
        Ok(())
    }

    /// Schedule an event on behalf of the job or station it concerns
    fn emit(&mut self, event: SimEvent, at: SimulationTime) {
        let sender = if event.name().starts_with("station:") {
            event.station().map_or(EventSender::Manager, EventSender::Station)
        } else {
            event.job().map_or(EventSender::Manager, EventSender::Job)
        };
        self.clock.schedule(event, at, sender);
    }

    fn emit_all(&mut self, emissions: Vec<Emission>) {
        for (event, at) in emissions {
            self.emit(event, at);
        }
    }

    /// Release a waiting job into the line
    pub fn dispatch_job(
        &mut self,
        job: JobId,
        available_at: Option<SimulationTime>,
    ) -> Result<(), SimulationError> {
        let Some(index) = self.waiting.iter().position(|waiting| *waiting == job) else {
            return Err(match self.job(job) {
                Some(known) => SimulationError::JobNotWaiting(known.key.clone()),
                None => SimulationError::UnknownJob(job.to_string()),
            });
        };
        self.waiting.remove(index);
        self.active.push(job);
        debug!("released {} for {:?}", self.jobs[job.index()].key, available_at);
        self.dispatch_event(SimEvent::JobDispatched { job }, available_at)
    }

    /// Install a release policy and carry out its initial releases
    pub fn attach_dispatcher(
        &mut self,
        mut dispatcher: Box<dyn Dispatcher>,
    ) -> Result<(), SimulationError> {
        let releases = dispatcher.initial_releases(self);
        info!(
            "attached {} dispatcher, {} initial releases",
            dispatcher.name(),
            releases.len()
        );
        self.dispatcher = Some(dispatcher);
        for job in releases {
            self.dispatch_job(job, None)?;
        }
        Ok(())
    }

    pub fn dispatcher(&self) -> Option<&dyn Dispatcher> {
        self.dispatcher.as_deref()
    }

    /// Attached dispatcher as its concrete policy type
    pub fn dispatcher_as<T: 'static>(&self) -> Option<&T> {
        self.dispatcher
            .as_ref()
            .and_then(|dispatcher| dispatcher.as_any().downcast_ref::<T>())
    }

    fn release(&mut self, choice: Option<JobId>) {
        if let Some(job) = choice {
            if let Err(err) = self.dispatch_job(job, None) {
                warn!("ignoring release chosen by dispatcher: {}", err);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Station control

    pub fn disable_station(&mut self, station: StationId) -> Result<(), SimulationError> {
        self.check_station(station)?;
        if !self.stations[station.index()].disabled {
            let event = self.stations[station.index()].disable();
            info!(
                "disabled {} at {:.2}",
                self.stations[station.index()].name,
                self.time()
            );
            let now = self.time();
            self.emit(event, now);
        }
        Ok(())
    }

    pub fn enable_station(&mut self, station: StationId) -> Result<(), SimulationError> {
        self.check_station(station)?;
        if self.stations[station.index()].disabled {
            let event = self.stations[station.index()].enable();
            info!(
                "reactivated {} at {:.2}",
                self.stations[station.index()].name,
                self.time()
            );
            let now = self.time();
            self.emit(event, now);
        }
        Ok(())
    }

    pub fn toggle_station(&mut self, station: StationId) -> Result<(), SimulationError> {
        self.check_station(station)?;
        if self.stations[station.index()].disabled {
            self.enable_station(station)
        } else {
            self.disable_station(station)
        }
    }

    // ---------------------------------------------------------------------
    // Observers

    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    /// First observer of the given type
    pub fn observer<T: 'static>(&self) -> Option<&T> {
        self.observers
            .iter()
            .find_map(|observer| observer.as_any().downcast_ref::<T>())
    }

    fn notify_tick(&mut self, time: SimulationTime) {
        for observer in &mut self.observers {
            observer.on_tick(time);
        }
    }

    fn notify_reset(&mut self) {
        for observer in &mut self.observers {
            observer.on_reset();
        }
    }

    fn notify_event(&mut self, event: &SimEvent) {
        let mut observers = std::mem::take(&mut self.observers);
        let time = self.time();
        for observer in &mut observers {
            observer.on_event(time, event, self);
        }
        self.observers = observers;
    }

    // ---------------------------------------------------------------------
    // Run control

    /// Start the clock. In batch mode the dispatcher may schedule its
    /// releases up front, once per run.
    pub fn start(&mut self) {
        if self.clock.mode() == ClockMode::Batch && !self.batch_prepared {
            self.batch_prepared = true;
            if let Some(mut dispatcher) = self.dispatcher.take() {
                let releases = dispatcher.batch_releases(self.time(), &self.waiting);
                self.dispatcher = Some(dispatcher);
                for (job, at) in releases {
                    if let Err(err) = self.dispatch_job(job, Some(at)) {
                        warn!("skipping batch release: {}", err);
                    }
                }
            }
        }
        self.clock.start();
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Advance the clock once and handle every event that became available.
    ///
    /// Returns false once the simulation is stopped.
    pub fn tick(&mut self) -> bool {
        if !self.clock.is_running() {
            return false;
        }
        let Some(time) = self.clock.advance() else {
            // empty queue in batch mode
            self.stop();
            return false;
        };
        self.notify_tick(time);

        if self.clock.mode() == ClockMode::RealTime {
            if let Some(mut dispatcher) = self.dispatcher.take() {
                let choice = dispatcher.handle_next_tick(time, self);
                self.dispatcher = Some(dispatcher);
                self.release(choice);
            }
        }

        // events scheduled by the handlers wait for the next tick
        for scheduled in self.clock.drain_ready() {
            self.handle_event(&scheduled.event);
            self.notify_event(&scheduled.event);
        }

        if self.clock.reached_time_limit() {
            self.stop();
        }
        self.clock.is_running()
    }

    /// Start if necessary and perform a single tick
    pub fn step(&mut self) -> bool {
        if !self.clock.is_running() {
            self.start();
        }
        self.tick()
    }

    /// Run until the simulation stops.
    ///
    /// Real-time runs also end once the line is settled: nothing is
    /// scheduled and no waiting job can be released by a tick alone.
    pub fn run(&mut self) {
        self.start();
        while self.tick() {
            if self.clock.mode() == ClockMode::RealTime && self.is_settled() {
                info!("line settled at {:.2}", self.time());
                self.stop();
            }
        }
    }

    /// True when only a new event could change the line
    fn is_settled(&self) -> bool {
        if self.clock.has_pending_events() {
            return false;
        }
        self.waiting.is_empty()
            || !self
                .dispatcher
                .as_ref()
                .map_or(false, |dispatcher| dispatcher.releases_on_tick())
    }

    /// Run until `until`, leaving the clock running
    pub fn run_until(&mut self, until: SimulationTime) {
        self.start();
        match self.clock.mode() {
            ClockMode::Batch => {
                while self.clock.is_running() {
                    match self.clock.next_event_time() {
                        Some(next) if next <= until => {
                            self.tick();
                        }
                        _ => break,
                    }
                }
                self.clock.advance_to(until);
            }
            ClockMode::RealTime => {
                let increment = self.clock.config().tick_increment();
                while self.clock.is_running() && self.time() + increment <= until + 1e-9 {
                    self.tick();
                }
            }
        }
    }

    /// Evaluate the line end-to-end without real-time pacing
    pub fn perform_dry_run(&mut self) {
        self.clock.set_mode(ClockMode::Batch);
        info!("starting dry run with {} waiting jobs", self.waiting.len());
        self.run();
        info!(
            "dry run finished at {:.2}, {} jobs completed",
            self.time(),
            self.completed.len()
        );
    }

    /// Drop all jobs and recreate `quantity` fresh jobs per product.
    ///
    /// Recreated jobs take over key, due date and rush flag of the earlier
    /// jobs of their product, in creation order, so repeated runs report the
    /// same keys. Stations return to their registered state, the clock is
    /// rewound, the dispatcher is detached and observers are reset.
    pub fn reset_jobs(&mut self) {
        self.clock.reset();
        let previous = std::mem::take(&mut self.jobs);
        self.waiting.clear();
        self.active.clear();
        self.completed.clear();
        self.dispatcher = None;
        self.batch_prepared = false;
        for station in &mut self.stations {
            station.restore();
        }
        let source = self.config.line.source;
        for (index, product) in self.products.iter().enumerate() {
            let product_id = ProductId(index);
            let mut earlier = previous.iter().filter(|job| job.product == product_id);
            for _ in 0..product.quantity {
                let spec = match earlier.next() {
                    Some(job) => JobSpec::new(product_id)
                        .with_key(job.key.clone())
                        .with_due_date(job.due_date)
                        .with_rush(job.rush),
                    None => JobSpec::new(product_id),
                };
                let id = JobId(self.jobs.len());
                self.jobs.push(Job::from_spec(id, spec, source));
                self.waiting.push(id);
            }
        }
        self.notify_reset();
        info!("reset line with {} jobs", self.jobs.len());
    }

    /// Remove every registry entry, the dispatcher and all scheduled events.
    ///
    /// Observers stay attached but are reset.
    pub fn clear(&mut self) {
        self.clock.reset();
        self.capabilities.clear();
        self.operations.clear();
        self.products.clear();
        self.stations.clear();
        self.jobs.clear();
        self.waiting.clear();
        self.active.clear();
        self.completed.clear();
        self.dispatcher = None;
        self.batch_prepared = false;
        self.next_transit = 0;
        self.notify_reset();
    }

    // ---------------------------------------------------------------------
    // Event routing

    fn handle_event(&mut self, event: &SimEvent) {
        debug!(
            "Event {} at {:.2} {}",
            event.name(),
            self.time(),
            event
                .job()
                .and_then(|job| self.job(job))
                .map_or("", |job| job.key.as_str())
        );
        match *event {
            SimEvent::JobDispatched { job } => self.handle_job_dispatched(job),
            SimEvent::JobStartedMoving {
                job,
                operation: Some(operation),
                station: Some(station),
            } => self.handle_started_moving(JobOperation::new(job, operation), station),
            SimEvent::JobArrived {
                job_operation,
                station,
                transit,
            } => self.handle_job_arrival(job_operation, station, transit),
            SimEvent::JobInStation {
                job_operation,
                station,
                transit,
            } => self.handle_job_in_station(job_operation, station, transit),
            SimEvent::JobCompleted { job } => self.handle_job_completed(job),
            SimEvent::JobQueued {
                job_operation,
                station,
            } => self.handle_job_queued(job_operation, station),
            SimEvent::SetUpCompleted {
                station,
                job_operation,
            } => self.handle_setup_completed(station, job_operation),
            SimEvent::ProcessingStarted {
                station,
                job_operation,
            } => self.handle_processing_started(station, job_operation),
            SimEvent::ProcessingCompleted {
                station,
                job_operation,
            } => self.handle_processing_completed(station, job_operation),
            SimEvent::FollowUpCompleted {
                station,
                job_operation,
            } => self.handle_follow_up_completed(station, job_operation),
            SimEvent::StationDisabled { station } => self.handle_station_disabled(station),
            SimEvent::StationReactivated { station } => self.handle_station_reactivated(station),
            // informational only
            SimEvent::JobStartedMoving { .. }
            | SimEvent::JobStoppedMoving { .. }
            | SimEvent::JobStartedProcessing { .. }
            | SimEvent::JobAbort { .. }
            | SimEvent::JobRegistered { .. }
            | SimEvent::SetUpStarted { .. }
            | SimEvent::FollowUpStarted { .. } => {}
        }
    }
}
