use super::config::{ClockConfig, ClockMode};
use super::event::{EventSender, SimEvent};
use super::event_scheduler::{EventScheduler, ScheduledEvent};
use super::types::SimulationTime;
use log::info;

/// Global simulation clock owning the event queue
#[derive(Debug)]
pub struct Clock {
    time: SimulationTime,
    config: ClockConfig,
    running: bool,
    scheduler: EventScheduler,
}

impl Clock {
    /// Create a stopped clock at time zero
    pub fn new(config: ClockConfig) -> Self {
        Self {
            time: 0.0,
            config,
            running: false,
            scheduler: EventScheduler::new(),
        }
    }

    pub fn time(&self) -> SimulationTime {
        self.time
    }

    pub fn mode(&self) -> ClockMode {
        self.config.mode
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn set_mode(&mut self, mode: ClockMode) {
        self.config.mode = mode;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            info!("started simulation at {:.2}", self.time);
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("stopped simulation at {:.2}", self.time);
        }
    }

    /// Stop, drop all queued events and rewind to zero
    pub fn reset(&mut self) {
        self.stop();
        self.scheduler.clear();
        self.time = 0.0;
    }

    /// Add an event to the queue
    pub fn schedule(&mut self, event: SimEvent, available_at: SimulationTime, sender: EventSender) {
        self.scheduler.schedule_event(event, available_at, sender);
    }

    /// Advance time according to the clock mode.
    ///
    /// Returns the new time, or `None` in batch mode once the queue is empty
    /// (normal termination).
    pub fn advance(&mut self) -> Option<SimulationTime> {
        match self.config.mode {
            ClockMode::RealTime => {
                self.time += self.config.tick_increment();
                Some(self.time)
            }
            ClockMode::Batch => {
                let next = self.scheduler.next_available_at()?;
                // events scheduled in the past are drained right away
                self.time = self.time.max(next);
                Some(self.time)
            }
        }
    }

    /// Move time forward without handling anything
    pub fn advance_to(&mut self, time: SimulationTime) {
        self.time = self.time.max(time);
    }

    /// Remove and return every event available at the current time
    pub fn drain_ready(&mut self) -> Vec<ScheduledEvent> {
        self.scheduler.take_available(self.time)
    }

    pub fn has_pending_events(&self) -> bool {
        self.scheduler.has_events()
    }

    pub fn next_event_time(&self) -> Option<SimulationTime> {
        self.scheduler.next_available_at()
    }

    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    /// True once a real-time run reached its configured time limit
    pub fn reached_time_limit(&self) -> bool {
        self.config.max_time.map_or(false, |max| self.time >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::JobId;

    fn event(job: usize) -> SimEvent {
        SimEvent::JobDispatched { job: JobId(job) }
    }

    #[test]
    fn test_real_time_advances_by_fixed_increment() {
        let mut clock = Clock::new(ClockConfig::new().with_speed(100.0));
        assert_eq!(clock.advance(), Some(1.0));
        assert_eq!(clock.advance(), Some(2.0));
        assert_eq!(clock.time(), 2.0);
    }

    #[test]
    fn test_batch_jumps_to_next_event() {
        let mut clock = Clock::new(ClockConfig::new().with_mode(ClockMode::Batch));
        clock.schedule(event(0), 12.5, EventSender::Manager);
        clock.schedule(event(1), 4.0, EventSender::Manager);

        assert_eq!(clock.advance(), Some(4.0));
        let ready = clock.drain_ready();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].event, event(1));

        assert_eq!(clock.advance(), Some(12.5));
        assert_eq!(clock.drain_ready().len(), 1);

        // empty queue is the terminal state
        assert_eq!(clock.advance(), None);
        assert_eq!(clock.time(), 12.5);
    }

    #[test]
    fn test_batch_never_moves_backwards() {
        let mut clock = Clock::new(ClockConfig::new().with_mode(ClockMode::Batch));
        clock.schedule(event(0), 10.0, EventSender::Manager);
        clock.advance();
        clock.drain_ready();
        clock.schedule(event(1), 3.0, EventSender::Manager);
        assert_eq!(clock.advance(), Some(10.0));
        assert_eq!(clock.drain_ready().len(), 1);
    }

    #[test]
    fn test_reset_clears_queue_and_time() {
        let mut clock = Clock::new(ClockConfig::new());
        clock.start();
        clock.schedule(event(0), 3.0, EventSender::Manager);
        clock.advance();
        clock.reset();
        assert_eq!(clock.time(), 0.0);
        assert!(!clock.is_running());
        assert!(!clock.has_pending_events());
    }

    #[test]
    fn test_advance_to_only_moves_forward() {
        let mut clock = Clock::new(ClockConfig::new().with_mode(ClockMode::Batch));
        clock.advance_to(8.0);
        clock.advance_to(3.0);
        assert_eq!(clock.time(), 8.0);
    }

    #[test]
    fn test_time_limit() {
        let mut clock = Clock::new(ClockConfig::new().with_speed(100.0).with_max_time(2.0));
        assert!(!clock.reached_time_limit());
        clock.advance();
        clock.advance();
        assert!(clock.reached_time_limit());
    }
}
