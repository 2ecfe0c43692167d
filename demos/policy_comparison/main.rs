use linesim::core::config::{ConcurrencyMode, SimulationConfig};
use linesim::core::error::SimulationError;
use linesim::core::manager::Manager;
use linesim::core::metrics::SimulationReport;
use linesim::experiment::compare_policies;
use linesim::orders::{OrderGenerator, OrderGeneratorConfig};
use linesim::reference_line;

fn print_reports(title: &str, reports: &[SimulationReport]) {
    println!("{}", title);
    println!(
        "  {:<28} {:>6} {:>9} {:>11} {:>9} {:>5}",
        "policy", "done", "makespan", "throughput", "waiting", "peak"
    );
    for report in reports {
        println!(
            "  {:<28} {:>6} {:>9.1} {:>11.1} {:>9.1} {:>5}",
            report.policy,
            report.completed_jobs,
            report.makespan.unwrap_or(0.0),
            report.mean_throughput_time.unwrap_or(0.0),
            report.time_distribution.waiting,
            report.peak_active_jobs
        );
    }
    println!();
}

fn print_stations(report: &SimulationReport) {
    let elapsed = report.makespan.unwrap_or(0.0);
    println!("Station utilization under {}:", report.policy);
    for station in &report.stations {
        println!(
            "  {:<10} setup {:>6.1}  process {:>6.1}  follow-up {:>6.1}  {:>5.1}%",
            station.name,
            station.setup_time,
            station.process_time,
            station.follow_up_time,
            station.utilization(elapsed) * 100.0
        );
    }
    println!();
}

/// Reference layout with a random order book instead of the fixed one
fn generated_line(line: &mut Manager) -> Result<(), SimulationError> {
    reference_line::build_layout(line, 2)?;
    let config = OrderGeneratorConfig::new()
        .with_seed(7)
        .with_count(40)
        .with_due_dates(500.0, 200.0);
    OrderGenerator::new(config)?.generate(line)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    println!("Comparing release policies on the reference line");
    println!();

    let policies = reference_line::reference_policies();
    let config = SimulationConfig::batch();
    let reports = compare_policies(&config, reference_line::build, &policies)?;
    print_reports("Reference order book (20 jobs):", &reports);
    if let Some(report) = reports.last() {
        print_stations(report);
    }

    let parallel = SimulationConfig::batch().with_concurrency(ConcurrencyMode::Rayon);
    let reports = compare_policies(&parallel, generated_line, &policies)?;
    print_reports("Generated order book (40 jobs, evaluated in parallel):", &reports);

    Ok(())
}
