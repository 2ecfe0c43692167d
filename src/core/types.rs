use serde::{Deserialize, Serialize};

/// Simulation time in abstract time units (seconds in the reference line)
pub type SimulationTime = f64;

/// Identifier of a single transit (job movement between two coordinates)
pub type TransitId = u64;

crate::registry_id!(
    /// Handle of a registered station capability (station module)
    CapabilityId,
    "capability"
);

crate::registry_id!(
    /// Handle of a registered operation
    OperationId,
    "operation"
);

crate::registry_id!(
    /// Handle of a registered product
    ProductId,
    "product"
);

crate::registry_id!(
    /// Handle of a registered assembly station
    StationId,
    "station"
);

crate::registry_id!(
    /// Handle of a job owned by the manager
    JobId,
    "job"
);

/// Point on the line layout
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to another coordinate
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Combination of a job and one of its operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobOperation {
    pub job: JobId,
    pub operation: OperationId,
}

impl JobOperation {
    pub fn new(job: JobId, operation: OperationId) -> Self {
        Self { job, operation }
    }
}

/// Combination of an operation and the station planned to perform it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationOperation {
    pub station: StationId,
    pub operation: OperationId,
}

impl StationOperation {
    pub fn new(station: StationId, operation: OperationId) -> Self {
        Self { station, operation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_uses_prefix() {
        assert_eq!(StationId(3).to_string(), "station#3");
        assert_eq!(JobId(0).to_string(), "job#0");
    }

    #[test]
    fn test_distance() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }
}
