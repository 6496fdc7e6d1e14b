// Sweep Runner - Load and execute sweep scenario YAML files
//
// Usage:
//   cargo run --bin sweep_runner scenarios/chain_ends.yaml
//   cargo run --bin sweep_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin sweep_runner scenarios/chain_ends.yaml --seed 0x1234...

mod scenario;

use std::env;
use std::fs;
use std::path::Path;

use scenario::ScenarioFile;
use simple_logger::SimpleLogger;

use infection_sim::random::RandomSource;
use infection_sim::report::{JsonFileSink, ResultSink};
use infection_sim::simulator::Simulator;

fn main() {
    SimpleLogger::new().init().unwrap();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED_HEX]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/chain_ends.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/chain_ends.yaml --seed 0x123456...", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);

    // Parse optional seed
    let seed: Option<[u8; 32]> = if args.len() >= 4 && args[2] == "--seed" {
        Some(parse_seed_hex(&args[3]))
    } else {
        None
    };

    if path.is_file() {
        run_scenario_file(path, seed);
    } else if path.is_dir() {
        run_scenario_directory(path, seed);
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    }
}

fn run_scenario_directory(dir: &Path, seed: Option<[u8; 32]>) {
    let mut scenarios = Vec::new();

    // Find all .yaml files
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("yaml")
                || path.extension().and_then(|s| s.to_str()) == Some("yml")
            {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        std::process::exit(1);
    }

    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        run_scenario_file(scenario_path, seed);
    }

    println!("\nAll scenarios complete");
}

fn run_scenario_file(path: &Path, seed: Option<[u8; 32]>) {
    println!("Loading scenario from: {}", path.display());

    // Load and parse YAML
    let yaml_content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path.display(), e);
        std::process::exit(1);
    });

    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path.display(), e);
        std::process::exit(1);
    });

    // Print scenario header
    println!("\n╔════════════════════════════════════════════════════════╗");
    if let Some(ref name) = scenario.meta.name {
        println!("║  {name}");
    } else {
        println!("║  Scenario: {}", path.file_stem().unwrap().to_str().unwrap());
    }
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{desc}\n");
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {hypothesis}\n");
    }

    // Build graph and configuration
    let config = scenario.simulator_config(seed);

    let mut generator_rng = match seed {
        Some(s) => RandomSource::from_seed(s),
        None => RandomSource::from_entropy(),
    };
    let graph = scenario.config.graph.build(&mut generator_rng);

    println!("Configuration:");
    println!("  Graph: {:?} ({} nodes)", config.graph_kind, graph.node_count());
    println!(
        "  Population: {}..{} x {} run(s) each",
        config.population_lower, config.population_upper, config.runs_per_population
    );
    println!("  Term A: {}, Term B: {}", config.term_a, config.term_b);
    println!("  Node selection: {:?}", config.node_selection);
    println!("\nStarting simulation...\n");

    // Run the sweep
    let mut sim = Simulator::new(graph, config).unwrap_or_else(|e| {
        eprintln!("Invalid experiment: {e}");
        std::process::exit(1);
    });

    let report = sim.execute().unwrap_or_else(|e| {
        eprintln!("Sweep failed: {e}");
        std::process::exit(1);
    });

    report.print_summary();

    // Persist if requested
    if let Some(ref json_path) = scenario.output.json_path {
        JsonFileSink::new(json_path)
            .write(&report)
            .unwrap_or_else(|e| {
                eprintln!("Failed to write {json_path}: {e}");
                std::process::exit(1);
            });
        println!("Report written to {json_path}");
    }

    println!("\n✓ Scenario complete!\n");
}

fn parse_seed_hex(hex: &str) -> [u8; 32] {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut seed = [0u8; 32];

    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte_str = std::str::from_utf8(chunk).unwrap();
        seed[i] = u8::from_str_radix(byte_str, 16).unwrap_or_else(|e| {
            eprintln!("Invalid hex seed: {}", e);
            std::process::exit(1);
        });
    }

    seed
}
