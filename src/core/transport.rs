use super::config::LineConfig;
use super::types::{Coordinate, SimulationTime};

/// Transit duration between two points of the line layout.
///
/// The core only consumes durations; how a job visually travels between the
/// points is up to the renderer.
pub trait TransportModel: Send {
    fn transport_duration(&self, origin: Coordinate, destination: Coordinate) -> SimulationTime;
}

/// Straight-line travel at constant speed
#[derive(Debug, Clone)]
pub struct LinearTransport {
    pixels_per_meter: f64,
    driving_speed: f64,
}

impl LinearTransport {
    pub fn new(pixels_per_meter: f64, driving_speed: f64) -> Self {
        Self {
            pixels_per_meter,
            driving_speed,
        }
    }

    pub fn from_line(line: &LineConfig) -> Self {
        Self::new(line.pixels_per_meter, line.driving_speed)
    }
}

impl TransportModel for LinearTransport {
    fn transport_duration(&self, origin: Coordinate, destination: Coordinate) -> SimulationTime {
        let meters = origin.distance_to(&destination) / self.pixels_per_meter;
        meters / self.driving_speed
    }
}

/// Every non-empty move takes the same time
#[derive(Debug, Clone)]
pub struct FixedTransport {
    duration: SimulationTime,
}

impl FixedTransport {
    pub fn new(duration: SimulationTime) -> Self {
        Self { duration }
    }
}

impl TransportModel for FixedTransport {
    fn transport_duration(&self, origin: Coordinate, destination: Coordinate) -> SimulationTime {
        if origin == destination {
            0.0
        } else {
            self.duration
        }
    }
}
