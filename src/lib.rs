//! # infection-sim - Gossip Leader Election Simulator
//!
//! Simulates a randomized, gossip-style leader-election ("infection
//! spreading") protocol over the nodes of a graph, to study empirically how
//! fast a distinguished agent becomes recognized as leader by all others.
//!
//! ## Core Components
//!
//! - **Graph/Agent model**: nodes hold mutable sets of agents; agents carry
//!   their election belief state
//! - **RandomSource**: single seeded RNG stream for all uniform and weighted
//!   selection during a sweep
//! - **AgentDistribution**: initial-placement strategies executed before
//!   every run
//! - **TimeStep**: the per-tick state machine executing interact/traverse
//!   actions and latching convergence markers
//! - **Simulator**: orchestrates repetitions across a population-size range
//!   and aggregates the results
//!
//! ## Usage
//!
//! ```no_run
//! use infection_sim::distribution::Placement;
//! use infection_sim::generators;
//! use infection_sim::simulator::{Simulator, SimulatorConfig};
//!
//! let graph = generators::chain(10, false, false, false);
//!
//! let config = SimulatorConfig {
//!     population_lower: 100,
//!     population_upper: 101,
//!     runs_per_population: 5,
//!     placement: Some(Placement::ChainEnds),
//!     ..SimulatorConfig::default()
//! };
//!
//! let mut sim = Simulator::new(graph, config).expect("valid experiment");
//! let report = sim.execute().expect("sweep completes");
//! report.print_summary();
//! ```
//!
//! Scenario-driven sweeps (YAML configuration, JSON result export) live in
//! the `sweep_runner` binary under `simulator/`.

pub mod agent;
pub mod distribution;
pub mod error;
pub mod generators;
pub mod graph;
pub mod observer;
pub mod random;
pub mod report;
pub mod run_record;
pub mod simulator;
pub mod time_step;

// Re-export commonly used types
pub use agent::{Agent, AgentId};
pub use distribution::{AgentDistribution, Placement};
pub use error::SimError;
pub use generators::GraphKind;
pub use graph::{Edge, EdgeId, Graph, Node, NodeId};
pub use observer::{GraphObserver, LoggingObserver, NoOpObserver};
pub use random::RandomSource;
pub use report::{JsonFileSink, ResultSink};
pub use run_record::{Marker, RunRecord, SweepMetadata, SweepReport};
pub use simulator::{Simulator, SimulatorConfig};
pub use time_step::{NodeSelection, RunContext, StepAction, TimeStep};
