use super::event::{EventSender, SimEvent};
use super::types::SimulationTime;

/// Event waiting on the queue until the clock reaches `available_at`
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub event: SimEvent,
    pub available_at: SimulationTime,
    pub sender: EventSender,
    pub sequence_num: u64,
    /// Revoked events are never handed out. Nothing in the core revokes an
    /// event; the flag exists for collaborators that build on the queue.
    pub revoked: bool,
}

/// Time-stamped event queue.
///
/// Events are kept in insertion order. Reads filter by time and never
/// re-sort, so events that become available together are handed out in the
/// order they were scheduled, regardless of their individual timestamps.
#[derive(Debug, Default)]
pub struct EventScheduler {
    event_queue: Vec<ScheduledEvent>,
    sequence_counter: u64,
}

impl EventScheduler {
    /// Create a new EventScheduler
    pub fn new() -> Self {
        Self {
            event_queue: Vec::new(),
            sequence_counter: 0,
        }
    }

    /// Schedule an event to become available at the given time
    pub fn schedule_event(
        &mut self,
        event: SimEvent,
        available_at: SimulationTime,
        sender: EventSender,
    ) -> u64 {
        let sequence_num = self.sequence_counter;
        self.event_queue.push(ScheduledEvent {
            event,
            available_at,
            sender,
            sequence_num,
            revoked: false,
        });
        self.sequence_counter += 1;
        sequence_num
    }

    /// Events available at `time`, in insertion order, without removing them
    pub fn available_events(&self, time: SimulationTime) -> Vec<&ScheduledEvent> {
        self.event_queue
            .iter()
            .filter(|scheduled| Self::is_available(scheduled, time))
            .collect()
    }

    /// Remove and return the events available at `time`, in insertion order
    pub fn take_available(&mut self, time: SimulationTime) -> Vec<ScheduledEvent> {
        let (ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.event_queue)
            .into_iter()
            .partition(|scheduled| Self::is_available(scheduled, time));
        self.event_queue = pending;
        ready
    }

    /// Earliest time at which a pending event becomes available
    pub fn next_available_at(&self) -> Option<SimulationTime> {
        self.event_queue
            .iter()
            .filter(|scheduled| !scheduled.revoked)
            .map(|scheduled| scheduled.available_at)
            .fold(None, |earliest: Option<SimulationTime>, time| match earliest {
                Some(current) if current <= time => Some(current),
                _ => Some(time),
            })
    }

    /// Check if any event can still be handed out
    pub fn has_events(&self) -> bool {
        self.event_queue.iter().any(|scheduled| !scheduled.revoked)
    }

    /// Number of queued events, revoked ones included
    pub fn len(&self) -> usize {
        self.event_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }

    /// Drop every queued event
    pub fn clear(&mut self) {
        self.event_queue.clear();
    }

    fn is_available(scheduled: &ScheduledEvent, time: SimulationTime) -> bool {
        !scheduled.revoked && scheduled.available_at <= time
    }
}
