use super::types::{CapabilityId, OperationId, SimulationTime};

/// Feature or module of a station, e.g. a lifting platform
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    pub(crate) id: CapabilityId,
    pub(crate) label: String,
}

impl Capability {
    pub fn id(&self) -> CapabilityId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Atomic unit of assembly work
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub(crate) name: String,
    pub(crate) processing_time: SimulationTime,
    pub(crate) setup_time: SimulationTime,
    pub(crate) follow_up_time: SimulationTime,
    pub(crate) required_capabilities: Vec<CapabilityId>,
    pub(crate) predecessors: Vec<OperationId>,
}

impl Operation {
    /// Create an operation without setup, follow-up or requirements
    pub fn new(name: impl Into<String>, processing_time: SimulationTime) -> Self {
        Self {
            name: name.into(),
            processing_time,
            setup_time: 0.0,
            follow_up_time: 0.0,
            required_capabilities: Vec::new(),
            predecessors: Vec::new(),
        }
    }

    pub fn with_setup_time(mut self, setup_time: SimulationTime) -> Self {
        self.setup_time = setup_time;
        self
    }

    pub fn with_follow_up_time(mut self, follow_up_time: SimulationTime) -> Self {
        self.follow_up_time = follow_up_time;
        self
    }

    /// Add a capability a station needs to perform this operation
    pub fn requires(mut self, capability: CapabilityId) -> Self {
        if !self.required_capabilities.contains(&capability) {
            self.required_capabilities.push(capability);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processing_time(&self) -> SimulationTime {
        self.processing_time
    }

    pub fn setup_time(&self) -> SimulationTime {
        self.setup_time
    }

    pub fn follow_up_time(&self) -> SimulationTime {
        self.follow_up_time
    }

    pub fn required_capabilities(&self) -> &[CapabilityId] {
        &self.required_capabilities
    }

    pub fn predecessors(&self) -> &[OperationId] {
        &self.predecessors
    }

    /// Setup, processing and follow-up combined
    pub fn total_duration(&self) -> SimulationTime {
        self.setup_time + self.processing_time + self.follow_up_time
    }

    pub(crate) fn add_predecessor(&mut self, predecessor: OperationId) {
        if !self.predecessors.contains(&predecessor) {
            self.predecessors.push(predecessor);
        }
    }
}

/// Product variant and the operations each of its jobs must go through
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub(crate) name: String,
    pub(crate) quantity: u32,
    pub(crate) operations: Vec<OperationId>,
}

impl Product {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn operations(&self) -> &[OperationId] {
        &self.operations
    }

    /// Number of operations, also the number of kanban cards a job consumes
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_builder() {
        let op = Operation::new("Boden montieren", 10.0)
            .with_setup_time(5.0)
            .with_follow_up_time(5.0)
            .requires(CapabilityId(0))
            .requires(CapabilityId(0));

        assert_eq!(op.total_duration(), 20.0);
        assert_eq!(op.required_capabilities(), &[CapabilityId(0)]);
        assert!(op.predecessors().is_empty());
    }

    #[test]
    fn test_predecessors_are_deduplicated() {
        let mut op = Operation::new("Spoiler", 20.0);
        op.add_predecessor(OperationId(1));
        op.add_predecessor(OperationId(2));
        op.add_predecessor(OperationId(1));
        assert_eq!(op.predecessors(), &[OperationId(1), OperationId(2)]);
    }
}
