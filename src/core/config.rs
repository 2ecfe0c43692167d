//! Configuration for linesim runs
//!
//! This module provides configuration types for the simulation clock, the
//! line layout and the execution of several runs side by side.

use super::types::{Coordinate, SimulationTime};
use serde::{Deserialize, Serialize};

/// How the clock advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockMode {
    /// Fixed time increment per tick, dispatcher receives every tick
    RealTime,
    /// Jump straight to the next scheduled event (dry run)
    Batch,
}

impl Default for ClockMode {
    fn default() -> Self {
        ClockMode::RealTime
    }
}

/// Clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    pub mode: ClockMode,
    /// Factor applied to the tick interval in real-time mode
    pub speed: f64,
    /// Length of one real-time tick in milliseconds
    pub tick_interval_ms: f64,
    /// Upper bound on simulation time for real-time runs
    pub max_time: Option<SimulationTime>,
}

impl ClockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ClockMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_tick_interval_ms(mut self, tick_interval_ms: f64) -> Self {
        self.tick_interval_ms = tick_interval_ms;
        self
    }

    pub fn with_max_time(mut self, max_time: SimulationTime) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Simulation time added by one real-time tick
    pub fn tick_increment(&self) -> SimulationTime {
        self.speed * self.tick_interval_ms / 1000.0
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mode: ClockMode::RealTime,
            speed: 20.0,
            tick_interval_ms: 10.0,
            max_time: None,
        }
    }
}

/// Layout of the line around the stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Where new jobs start
    pub source: Coordinate,
    /// Where completed jobs leave the line
    pub sink: Coordinate,
    /// Horizontal distance between a station origin and its waiting position
    pub queue_offset: f64,
    /// Layout units per meter, used by the linear transport model
    pub pixels_per_meter: f64,
    /// Transport speed in meters per time unit
    pub driving_speed: f64,
}

impl LineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Coordinate) -> Self {
        self.source = source;
        self
    }

    pub fn with_sink(mut self, sink: Coordinate) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_queue_offset(mut self, queue_offset: f64) -> Self {
        self.queue_offset = queue_offset;
        self
    }

    pub fn with_driving_speed(mut self, driving_speed: f64) -> Self {
        self.driving_speed = driving_speed;
        self
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            source: Coordinate::new(-200.0, -200.0),
            sink: Coordinate::new(1000.0, -200.0),
            // waiting jobs keep 1.3 chassis widths (75) away from the origin
            queue_offset: (75.0_f64 * 1.3).round(),
            pixels_per_meter: 50.0,
            driving_speed: 1.0,
        }
    }
}

/// Enumeration of supported concurrency modes for evaluating several runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Runs are evaluated one after another on the calling thread
    Sequential,
    /// Runs are evaluated concurrently using Rayon, one run per task
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Sequential
    }
}

/// Configuration for simulation execution
///
/// Each simulation run is single-threaded; the concurrency settings only
/// control how independent runs are spread over threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub clock: ClockConfig,
    pub line: LineConfig,
    /// The concurrency mode to use when evaluating several runs
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel evaluation
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    ///
    /// Default configuration uses a real-time clock and sequential evaluation
    pub fn new() -> Self {
        Self {
            clock: ClockConfig::default(),
            line: LineConfig::default(),
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }

    /// Shorthand for a configuration whose clock runs in batch mode
    pub fn batch() -> Self {
        Self::new().with_clock(ClockConfig::default().with_mode(ClockMode::Batch))
    }

    pub fn with_clock(mut self, clock: ClockConfig) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_line(mut self, line: LineConfig) -> Self {
        self.line = line;
        self
    }

    /// Set the concurrency mode used to evaluate several runs
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel evaluation
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
