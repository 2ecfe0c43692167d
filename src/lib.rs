pub mod core;
pub mod experiment;
pub mod import;
pub mod macros;
pub mod orders;
pub mod reference_line;

// Re-export commonly used types
pub use crate::core::config::{
    ClockConfig, ClockMode, ConcurrencyMode, LineConfig, SimulationConfig,
};
pub use crate::core::dispatcher::{
    Dispatcher, DispatcherConfig, PullDispatcher, PushDispatcher, ScoreBasedPullDispatcher,
};
pub use crate::core::error::SimulationError;
pub use crate::core::event::SimEvent;
pub use crate::core::job::{Job, JobSpec, JobStatus};
pub use crate::core::manager::Manager;
pub use crate::core::metrics::{MetricsCollector, SimulationReport};
pub use crate::core::observer::{EventRecorder, SimulationObserver};
pub use crate::core::operation::Operation;
pub use crate::core::station::{StationSpec, StationStatus};
pub use crate::core::types::{Coordinate, JobId, OperationId, ProductId, SimulationTime, StationId};
