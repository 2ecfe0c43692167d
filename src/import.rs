//! Line snapshot import
//!
//! A [`LineSnapshot`] is the parsed form of an external line description:
//! station modules, stations, operations, products and an optional job list.
//! [`apply_snapshot`] replaces everything registered on a [`Manager`] with the
//! snapshot's content. Rows referring to unknown entities are skipped with a
//! warning and counted in the returned [`ImportSummary`].

use crate::core::error::SimulationError;
use crate::core::job::JobSpec;
use crate::core::manager::Manager;
use crate::core::operation::Operation;
use crate::core::station::StationSpec;
use crate::core::types::{OperationId, ProductId, SimulationTime};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub name: String,
    pub modules: Vec<String>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub name: String,
    pub processing_time: SimulationTime,
    #[serde(default)]
    pub setup_time: SimulationTime,
    #[serde(default)]
    pub follow_up_time: SimulationTime,
    #[serde(default)]
    pub predecessors: Vec<String>,
    #[serde(default)]
    pub required_modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub quantity: u32,
    pub operations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub product: String,
    pub due_date: f64,
    #[serde(default)]
    pub rush: bool,
}

/// Parsed line description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub modules: Vec<String>,
    pub stations: Vec<StationRecord>,
    pub operations: Vec<OperationRecord>,
    pub products: Vec<ProductRecord>,
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
}

/// What an import registered and how many references it had to drop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub stations: usize,
    pub operations: usize,
    pub products: usize,
    pub jobs: usize,
    pub skipped: usize,
}

/// Replace the line's content with the snapshot.
///
/// The precedence graph is validated before the manager is touched, so a
/// failed import leaves the line unchanged.
pub fn apply_snapshot(
    line: &mut Manager,
    snapshot: &LineSnapshot,
) -> Result<ImportSummary, SimulationError> {
    validate_precedence(&snapshot.operations)?;

    line.clear();
    let mut summary = ImportSummary::default();

    for module in &snapshot.modules {
        line.register_capability(module.as_str());
    }

    for record in &snapshot.stations {
        let mut spec = StationSpec::new(record.name.as_str()).at(record.x, record.y);
        for module in &record.modules {
            match line.find_capability(module) {
                Some(capability) => spec = spec.with_capability(capability),
                None => {
                    warn!("station {} refers to unknown module {}", record.name, module);
                    summary.skipped += 1;
                }
            }
        }
        line.register_station(spec)?;
        summary.stations += 1;
    }

    let mut registered: HashMap<&str, OperationId> = HashMap::new();
    for record in &snapshot.operations {
        let mut operation = Operation::new(record.name.as_str(), record.processing_time)
            .with_setup_time(record.setup_time)
            .with_follow_up_time(record.follow_up_time);
        for module in &record.required_modules {
            match line.find_capability(module) {
                Some(capability) => operation = operation.requires(capability),
                None => {
                    warn!("operation {} requires unknown module {}", record.name, module);
                    summary.skipped += 1;
                }
            }
        }
        let id = line.register_operation(operation)?;
        registered.insert(record.name.as_str(), id);
        summary.operations += 1;
    }

    // predecessors may be declared after the operations depending on them
    for record in &snapshot.operations {
        let Some(&operation) = registered.get(record.name.as_str()) else {
            continue;
        };
        for predecessor in &record.predecessors {
            match registered.get(predecessor.as_str()) {
                Some(&predecessor) => line.require_operation(operation, predecessor)?,
                None => {
                    warn!(
                        "operation {} has unknown predecessor {}",
                        record.name, predecessor
                    );
                    summary.skipped += 1;
                }
            }
        }
    }

    for record in &snapshot.products {
        let mut operations = Vec::with_capacity(record.operations.len());
        for name in &record.operations {
            match registered.get(name.as_str()) {
                Some(&operation) => operations.push(operation),
                None => {
                    warn!("product {} lists unknown operation {}", record.name, name);
                    summary.skipped += 1;
                }
            }
        }
        line.register_product(record.name.as_str(), record.quantity, operations)?;
        summary.products += 1;
    }

    if snapshot.jobs.is_empty() {
        for index in 0..line.products().len() {
            let product = ProductId(index);
            let quantity = line.products()[index].quantity();
            for _ in 0..quantity {
                line.add_job(JobSpec::new(product))?;
                summary.jobs += 1;
            }
        }
    } else {
        for record in &snapshot.jobs {
            let Some(product) = line.find_product(&record.product) else {
                warn!("job {} refers to unknown product {}", record.id, record.product);
                summary.skipped += 1;
                continue;
            };
            line.add_job(
                JobSpec::new(product)
                    .with_key(record.id.as_str())
                    .with_due_date(record.due_date)
                    .with_rush(record.rush),
            )?;
            summary.jobs += 1;
        }
    }

    info!(
        "imported {} stations, {} operations, {} products, {} jobs ({} skipped)",
        summary.stations, summary.operations, summary.products, summary.jobs, summary.skipped
    );
    Ok(summary)
}

/// Reject precedence relations that can never be satisfied.
///
/// Kahn's algorithm over the known predecessor edges; whatever cannot be
/// ordered sits on a cycle.
fn validate_precedence(operations: &[OperationRecord]) -> Result<(), SimulationError> {
    let index: HashMap<&str, usize> = operations
        .iter()
        .enumerate()
        .map(|(position, record)| (record.name.as_str(), position))
        .collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); operations.len()];
    let mut in_degree = vec![0usize; operations.len()];
    for (position, record) in operations.iter().enumerate() {
        for predecessor in &record.predecessors {
            if let Some(&from) = index.get(predecessor.as_str()) {
                successors[from].push(position);
                in_degree[position] += 1;
            }
        }
    }

    let mut ready: Vec<usize> = (0..operations.len())
        .filter(|position| in_degree[*position] == 0)
        .collect();
    let mut ordered = 0;
    while let Some(position) = ready.pop() {
        ordered += 1;
        for &next in &successors[position] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(next);
            }
        }
    }

    if ordered == operations.len() {
        return Ok(());
    }
    let blocked: Vec<&str> = operations
        .iter()
        .enumerate()
        .filter(|(position, _)| in_degree[*position] > 0)
        .map(|(_, record)| record.name.as_str())
        .collect();
    Err(SimulationError::PrecedenceCycle(blocked.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    fn operation(name: &str, predecessors: &[&str]) -> OperationRecord {
        OperationRecord {
            name: name.to_string(),
            processing_time: 10.0,
            setup_time: 0.0,
            follow_up_time: 0.0,
            predecessors: predecessors.iter().map(|p| p.to_string()).collect(),
            required_modules: vec!["Roboter".to_string()],
        }
    }

    fn snapshot() -> LineSnapshot {
        LineSnapshot {
            modules: vec!["Roboter".to_string()],
            stations: vec![StationRecord {
                name: "station1".to_string(),
                modules: vec!["Roboter".to_string()],
                x: 150.0,
                y: 0.0,
            }],
            operations: vec![operation("floor", &[]), operation("doors", &["floor"])],
            products: vec![ProductRecord {
                name: "Kombi".to_string(),
                quantity: 2,
                operations: vec!["floor".to_string(), "doors".to_string()],
            }],
            jobs: Vec::new(),
        }
    }

    #[test]
    fn test_quantity_jobs_without_job_table() {
        let mut line = Manager::new(SimulationConfig::batch());
        let summary = apply_snapshot(&mut line, &snapshot()).unwrap();
        assert_eq!(summary.stations, 1);
        assert_eq!(summary.operations, 2);
        assert_eq!(summary.jobs, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(line.waiting_jobs().len(), 2);

        let doors = line.find_operation("doors").unwrap();
        let floor = line.find_operation("floor").unwrap();
        assert_eq!(line.operation(doors).unwrap().predecessors(), &[floor]);
    }

    #[test]
    fn test_job_table_lookup_ignores_case() {
        let mut data = snapshot();
        data.jobs = vec![
            JobRecord {
                id: "1".to_string(),
                product: "kombi".to_string(),
                due_date: 90.0,
                rush: true,
            },
            JobRecord {
                id: "2".to_string(),
                product: "Limousine".to_string(),
                due_date: 50.0,
                rush: false,
            },
        ];
        let mut line = Manager::new(SimulationConfig::batch());
        let summary = apply_snapshot(&mut line, &data).unwrap();
        assert_eq!(summary.jobs, 1);
        assert_eq!(summary.skipped, 1);

        let job = line.job(line.find_job("1").unwrap()).unwrap();
        assert!(job.is_rush());
        assert_eq!(job.due_date(), 90.0);
    }

    #[test]
    fn test_unknown_references_are_skipped() {
        let mut data = snapshot();
        data.stations[0].modules.push("Laser".to_string());
        data.operations[1].predecessors.push("paint".to_string());
        data.products[0].operations.push("polish".to_string());

        let mut line = Manager::new(SimulationConfig::batch());
        let summary = apply_snapshot(&mut line, &data).unwrap();
        assert_eq!(summary.skipped, 3);
        assert_eq!(line.products()[0].operation_count(), 2);
    }

    #[test]
    fn test_cycle_rejected_before_clearing() {
        let mut line = Manager::new(SimulationConfig::batch());
        apply_snapshot(&mut line, &snapshot()).unwrap();

        let mut data = snapshot();
        data.operations[0].predecessors.push("doors".to_string());
        let result = apply_snapshot(&mut line, &data);
        assert!(matches!(result, Err(SimulationError::PrecedenceCycle(_))));
        // previous import untouched
        assert_eq!(line.waiting_jobs().len(), 2);
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "modules": ["Roboter"],
            "stations": [{"name": "station1", "modules": ["Roboter"], "x": 150, "y": 0}],
            "operations": [{"name": "floor", "processing_time": 10, "required_modules": ["Roboter"]}],
            "products": [{"name": "Kombi", "quantity": 1, "operations": ["floor"]}]
        }"#;
        let data: LineSnapshot = serde_json::from_str(json).unwrap();
        assert!(data.jobs.is_empty());
        assert_eq!(data.operations[0].setup_time, 0.0);
    }
}
