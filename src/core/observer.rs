use super::event::SimEvent;
use super::manager::Manager;
use super::types::SimulationTime;
use std::any::Any;

/// Read-only collaborator notified of clock ticks and handled events
pub trait SimulationObserver {
    /// Called after the clock advanced
    fn on_tick(&mut self, _time: SimulationTime) {}

    /// Called after an event has been handled by the manager
    fn on_event(&mut self, time: SimulationTime, event: &SimEvent, line: &Manager);

    /// Called when the manager drops its jobs, recorded state refers to
    /// jobs that no longer exist
    fn on_reset(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

/// Entry of the event log
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub time: SimulationTime,
    pub event: SimEvent,
}

/// Records every handled event, used to compare runs
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<RecordedEvent>,
    ticks: usize,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Recorded events with the given published name
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RecordedEvent> + 'a {
        self.events
            .iter()
            .filter(move |recorded| recorded.event.name() == name)
    }
}

impl SimulationObserver for EventRecorder {
    fn on_tick(&mut self, _time: SimulationTime) {
        self.ticks += 1;
    }

    fn on_event(&mut self, time: SimulationTime, event: &SimEvent, _line: &Manager) {
        self.events.push(RecordedEvent {
            time,
            event: event.clone(),
        });
    }

    fn on_reset(&mut self) {
        self.events.clear();
        self.ticks = 0;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
