// Chain experiment: two chained nodes, weighted node selection.
//
// The smallest topology where traversal matters at all. Matches the chain
// study the simulator was originally built to explore.

use simple_logger::SimpleLogger;

use infection_sim::distribution::Placement;
use infection_sim::generators;
use infection_sim::generators::GraphKind;
use infection_sim::simulator::{Simulator, SimulatorConfig};
use infection_sim::time_step::NodeSelection;

fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init()
        .unwrap();

    let graph = generators::chain(2, false, false, false);

    let config = SimulatorConfig {
        population_lower: 1000,
        population_upper: 10_001,
        runs_per_population: 10,
        term_a: 4,
        term_b: 0,
        max_time_steps: 1_200_000,
        node_selection: NodeSelection::Weighted,
        placement: Some(Placement::Single),
        single_node: Some(0),
        graph_kind: GraphKind::Chain,
        description: Some("two-node chain experiment".into()),
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
