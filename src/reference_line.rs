//! Reference assembly line
//!
//! Two rows of four stations building two car body variants from five
//! operations, plus a fixed order book of twenty jobs. Used by the policy
//! comparison demo and the scenario tests.

use crate::core::dispatcher::DispatcherConfig;
use crate::core::error::SimulationError;
use crate::core::job::JobSpec;
use crate::core::manager::Manager;
use crate::core::operation::Operation;
use crate::core::station::StationSpec;
use crate::core::types::ProductId;

pub const ROBOT: &str = "Roboter";
pub const ELECTRONICS: &str = "Elektronik";
pub const SCREWDRIVER: &str = "Akkuschrauber";

pub const FLOOR: &str = "Boden montieren";
pub const CABLES: &str = "Kabelstrang montieren";
pub const LEFT_DOOR: &str = "Linke Tür montieren";
pub const RIGHT_DOOR: &str = "Rechte Tür montieren";
pub const SPOILER: &str = "Spoiler montieren";

pub const S_CLASS: &str = "S-Klasse";
pub const A_CLASS: &str = "A-Klasse";

/// Vertical distance between two station rows
pub const ROW_SPACING: f64 = 200.0;

/// (key, product index, due date, rush)
const ORDER_BOOK: [(&str, usize, f64, bool); 20] = [
    ("1", 0, 90.0, true),
    ("2", 0, 130.0, true),
    ("3", 0, 110.0, false),
    ("4", 0, 140.0, false),
    ("5", 0, 200.0, true),
    ("6", 0, 450.0, false),
    ("7", 0, 350.0, false),
    ("8", 0, 600.0, false),
    ("9", 0, 400.0, false),
    ("10", 0, 900.0, false),
    ("11", 1, 50.0, false),
    ("12", 1, 550.0, false),
    ("13", 1, 210.0, false),
    ("14", 1, 380.0, false),
    ("15", 1, 870.0, false),
    ("16", 1, 620.0, false),
    ("17", 1, 420.0, false),
    ("18", 1, 500.0, false),
    ("19", 1, 610.0, false),
    ("20", 1, 250.0, false),
];

/// Register the reference layout with `rows` station rows, without jobs.
///
/// Stations are named `station1`, `station2`, … in row order.
pub fn build_layout(line: &mut Manager, rows: usize) -> Result<[ProductId; 2], SimulationError> {
    let robot = line.register_capability(ROBOT);
    let electronics = line.register_capability(ELECTRONICS);
    let screwdriver = line.register_capability(SCREWDRIVER);

    let floor = line.register_operation(
        Operation::new(FLOOR, 10.0)
            .with_setup_time(5.0)
            .with_follow_up_time(5.0)
            .requires(robot),
    )?;
    let cables = line.register_operation(
        Operation::new(CABLES, 30.0)
            .with_setup_time(8.0)
            .with_follow_up_time(6.0)
            .requires(electronics),
    )?;
    let left_door =
        line.register_operation(Operation::new(LEFT_DOOR, 40.0).requires(screwdriver))?;
    let right_door = line.register_operation(
        Operation::new(RIGHT_DOOR, 40.0)
            .with_setup_time(5.0)
            .requires(robot),
    )?;
    let spoiler = line.register_operation(
        Operation::new(SPOILER, 20.0)
            .with_setup_time(10.0)
            .requires(screwdriver),
    )?;

    line.require_operation(floor, cables)?;
    line.require_operation(spoiler, left_door)?;
    line.require_operation(spoiler, right_door)?;

    let s_class =
        line.register_product(S_CLASS, 1, vec![floor, cables, left_door, right_door])?;
    let a_class = line.register_product(A_CLASS, 1, vec![left_door, right_door, spoiler])?;

    let row_layout = [
        (150.0, vec![screwdriver]),
        (550.0, vec![electronics, robot]),
        (950.0, vec![robot]),
        (1350.0, vec![electronics, screwdriver]),
    ];
    for row in 0..rows {
        let y = row as f64 * ROW_SPACING;
        for (column, (x, capabilities)) in row_layout.iter().enumerate() {
            let name = format!("station{}", row * row_layout.len() + column + 1);
            let spec = capabilities
                .iter()
                .fold(StationSpec::new(name).at(*x, y), |spec, capability| {
                    spec.with_capability(*capability)
                });
            line.register_station(spec)?;
        }
    }
    Ok([s_class, a_class])
}

/// Add the twenty reference orders to the waiting pool
pub fn add_reference_jobs(
    line: &mut Manager,
    products: [ProductId; 2],
) -> Result<(), SimulationError> {
    for (key, product, due_date, rush) in ORDER_BOOK {
        line.add_job(
            JobSpec::new(products[product])
                .with_key(key)
                .with_due_date(due_date)
                .with_rush(rush),
        )?;
    }
    Ok(())
}

/// Two station rows with the reference order book
pub fn build(line: &mut Manager) -> Result<(), SimulationError> {
    let products = build_layout(line, 2)?;
    add_reference_jobs(line, products)
}

/// The three release policies compared on the reference line
pub fn reference_policies() -> Vec<DispatcherConfig> {
    vec![
        DispatcherConfig::Push { interval: 50.0 },
        DispatcherConfig::Pull { factor: 1.0 },
        DispatcherConfig::ScoreBased {
            card_budget: 11,
            cycle_size: 5,
            workload_weight: 0.1,
            due_date_weight: 0.9,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    #[test]
    fn test_reference_line_layout() {
        let mut line = Manager::new(SimulationConfig::batch());
        build(&mut line).unwrap();

        assert_eq!(line.stations().len(), 8);
        assert_eq!(line.operations().len(), 5);
        assert_eq!(line.waiting_jobs().len(), 20);
        let station5 = line.station(line.find_station("station5").unwrap()).unwrap();
        assert_eq!(station5.position().y, ROW_SPACING);

        let floor = line.find_operation(FLOOR).unwrap();
        let cables = line.find_operation(CABLES).unwrap();
        assert_eq!(line.operation(floor).unwrap().predecessors(), &[cables]);

        // the spoiler can only be mounted by screwdriver stations
        let spoiler = line.find_operation(SPOILER).unwrap();
        let capable: Vec<&str> = line
            .capable_stations(spoiler)
            .into_iter()
            .map(|id| line.station(id).unwrap().name())
            .collect();
        assert_eq!(capable, vec!["station1", "station4", "station5", "station8"]);
    }

    #[test]
    fn test_rush_orders() {
        let mut line = Manager::new(SimulationConfig::batch());
        build(&mut line).unwrap();
        let rush: Vec<&str> = line
            .jobs()
            .iter()
            .filter(|job| job.is_rush())
            .map(|job| job.key())
            .collect();
        assert_eq!(rush, vec!["1", "2", "5"]);
    }

    #[test]
    fn test_policies_build() {
        for policy in reference_policies() {
            assert!(policy.build().is_ok(), "{} should build", policy.label());
        }
    }
}
