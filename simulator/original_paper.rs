// Original paper experiment: one node, no traversal, uniform selection.
//
// Replays the single-urn election the completion heuristic was derived for,
// sweeping the population from 1000 to 10000 with ten runs per size.

use simple_logger::SimpleLogger;

use infection_sim::distribution::Placement;
use infection_sim::graph::Graph;
use infection_sim::simulator::{Simulator, SimulatorConfig};
use infection_sim::time_step::NodeSelection;

fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init()
        .unwrap();

    let mut graph = Graph::new();
    graph.add_node();

    let config = SimulatorConfig {
        population_lower: 1000,
        population_upper: 10_001,
        runs_per_population: 10,
        term_a: 4,
        term_b: 0,
        max_time_steps: 600_000,
        node_selection: NodeSelection::Uniform,
        placement: Some(Placement::Single),
        single_node: Some(0),
        description: Some("original paper single-node experiment".into()),
        ..SimulatorConfig::default()
    };

    let mut sim = Simulator::new(graph, config).unwrap_or_else(|e| {
        eprintln!("Invalid experiment: {e}");
        std::process::exit(1);
    });

    let report = sim.execute().unwrap_or_else(|e| {
        eprintln!("Sweep failed: {e}");
        std::process::exit(1);
    });

    report.print_summary();
}
