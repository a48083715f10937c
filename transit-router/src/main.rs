use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use transit_router::domain::{AccessEgress, TransitLeg};
use transit_router::optimize::TransferOptimizationConfigurator;
use transit_router::raptor::{DefaultSlackProvider, RangeRaptorWorker};
use transit_router::scenario::Scenario;

/// Search a scenario file for journeys and print them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario JSON file
    scenario: PathBuf,

    /// Print paths as found by the search, without transfer optimization
    #[arg(long)]
    no_optimize: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(&args.scenario)?;
    info!(
        stops = scenario.data.number_of_stops(),
        patterns = scenario.data.timetables().len(),
        "loaded scenario"
    );

    let slack = DefaultSlackProvider::from(&scenario.raptor.slack);
    let worker = RangeRaptorWorker::new(&scenario.data, &scenario.raptor, &slack)
        .with_transfer_service(&scenario.transfers);
    let response = worker.route(&scenario.request, &AtomicBool::new(false))?;
    info!(
        paths = response.paths.len(),
        iterations = response.iterations,
        "search complete"
    );

    if args.no_optimize || !scenario.optimization.enabled() {
        for path in &response.paths {
            println!("{} -> {}", path.departure_time, path.arrival_time);
            print_legs(&scenario, &path.access, &path.legs, &path.egress);
        }
        return Ok(());
    }

    let mut configurator = TransferOptimizationConfigurator::new(
        &scenario.data,
        &slack,
        &scenario.cost,
        &scenario.optimization,
    )
    .with_transfer_service(&scenario.transfers)
    .with_pass_through_points(scenario.pass_through_points.clone());
    if let Some(costs) = &scenario.stop_board_alight_costs {
        configurator = configurator.with_stop_board_alight_costs(costs.clone());
    }

    for path in configurator.build().optimize(&response.paths) {
        print!(
            "{} -> {}  cost {:.0}",
            path.departure_time,
            path.arrival_time,
            path.generalized_cost as f64 / 100.0
        );
        match path.wait_time_optimized_cost {
            Some(cost) => println!("  wait-optimized {:.0}", cost as f64 / 100.0),
            None => println!(),
        }
        print_legs(&scenario, &path.access, &path.legs, &path.egress);
    }
    Ok(())
}

fn print_legs(
    scenario: &Scenario,
    access: &AccessEgress,
    legs: &[TransitLeg],
    egress: &AccessEgress,
) {
    if !access.duration.is_zero() {
        let to = scenario.stop_name(access.stop);
        println!("  walk {}m to {to}", access.duration.num_minutes());
    }
    for leg in legs {
        println!(
            "  {:<8} {} {} -> {} {}",
            leg.trip.id(),
            scenario.stop_name(leg.board_stop()),
            leg.board_time(),
            scenario.stop_name(leg.alight_stop()),
            leg.alight_time()
        );
    }
    if !egress.duration.is_zero() {
        let from = scenario.stop_name(egress.stop);
        println!("  walk {}m from {from}", egress.duration.num_minutes());
    }
}
