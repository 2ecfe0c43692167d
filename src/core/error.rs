/// Errors surfaced by the simulation core and its collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Referenced capability is not registered
    UnknownCapability(String),
    /// Referenced operation is not registered
    UnknownOperation(String),
    /// Referenced product is not registered
    UnknownProduct(String),
    /// Referenced station is not registered
    UnknownStation(String),
    /// Referenced job is not owned by the manager
    UnknownJob(String),
    /// Job cannot be released because it is not in the waiting pool
    JobNotWaiting(String),
    /// Configuration values are inconsistent
    InvalidConfiguration(String),
    /// Predecessor graph of the operations contains a cycle
    PrecedenceCycle(String),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::UnknownCapability(msg) => write!(f, "Unknown capability: {}", msg),
            SimulationError::UnknownOperation(msg) => write!(f, "Unknown operation: {}", msg),
            SimulationError::UnknownProduct(msg) => write!(f, "Unknown product: {}", msg),
            SimulationError::UnknownStation(msg) => write!(f, "Unknown station: {}", msg),
            SimulationError::UnknownJob(msg) => write!(f, "Unknown job: {}", msg),
            SimulationError::JobNotWaiting(msg) => write!(f, "Job is not waiting: {}", msg),
            SimulationError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
            SimulationError::PrecedenceCycle(msg) => write!(f, "Precedence cycle: {}", msg),
        }
    }
}

impl std::error::Error for SimulationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SimulationError::InvalidConfiguration("weights sum to 0.8".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: weights sum to 0.8");

        let err = SimulationError::UnknownProduct("A-Klasse".to_string());
        assert_eq!(err.to_string(), "Unknown product: A-Klasse");
    }
}
