// Per-run results and sweep-wide metadata

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::distribution::Placement;
use crate::generators::GraphKind;
use crate::graph::NodeId;
use crate::time_step::NodeSelection;

// ============================================================================
// Markers
// ============================================================================

/// A latched convergence event: the first step and interaction count at
/// which the event became true. Zero in both fields means it never fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub step: usize,
    pub interactions: usize,
}

impl Marker {
    pub fn at(step: usize, interactions: usize) -> Self {
        Self { step, interactions }
    }
}

// ============================================================================
// Run record
// ============================================================================

/// All data from a single simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRecord {
    /// Agent population of this run
    pub population: usize,

    /// Agents infected by the true leader's claim at run end
    pub infections: usize,

    /// Agents believing the election complete at run end
    pub election_complete_count: usize,

    /// Interaction actions performed
    pub interactions: usize,

    /// Traversal actions performed
    pub traversals: usize,

    /// First time every agent believed the true leader's claim
    pub infection_complete: Marker,

    /// First time the true leader declared the election complete
    pub leader_election_complete: Marker,

    /// First time every agent believed the election complete
    pub all_election_complete: Marker,

    /// Step -> infection count, in occurrence order. Chart fodder.
    pub infection_timeline: IndexMap<usize, usize>,
}

// ============================================================================
// Sweep metadata and report
// ============================================================================

/// Metadata about a whole sweep. This is the file you look at to get a view
/// of how the simulation turned out.
#[derive(Debug, Clone, Serialize)]
pub struct SweepMetadata {
    /// Simulator version
    pub version: &'static str,

    /// Optional description of the experiment
    pub description: Option<String>,

    /// Seed the sweep's random stream started from
    pub seed_used: [u8; 32],

    pub graph_kind: GraphKind,
    pub node_count: usize,
    pub node_selection: NodeSelection,
    pub distribution: Option<Placement>,

    /// Target node, when the single-node distribution was used
    pub single_node: Option<NodeId>,

    pub interact_probability: f64,
    pub traversal_probability: f64,

    /// Half-open population range swept
    pub population_lower: usize,
    pub population_upper: usize,

    pub term_a: i64,
    pub term_b: i64,
    pub max_time_steps: usize,
    pub runs_per_population: usize,
    pub total_runs: usize,

    /// Average fraction of the population infected at run end, in percent
    pub avg_infection_level: f64,

    /// Fraction of runs where the leader declared completion before full
    /// infection (or infection never completed), in percent
    pub avg_leader_error: f64,
}

/// Ordered run records plus sweep metadata, as handed to a result sink.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub metadata: SweepMetadata,
    pub runs: Vec<RunRecord>,
}

impl SweepReport {
    /// Print a summary of the sweep results.
    pub fn print_summary(&self) {
        let m = &self.metadata;

        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║        Infection Simulation Results                    ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration:");
        println!("  Graph: {:?} ({} nodes)", m.graph_kind, m.node_count);
        println!(
            "  Population: {}..{} x {} run(s) each",
            m.population_lower, m.population_upper, m.runs_per_population
        );
        println!("  Term A: {}, Term B: {}", m.term_a, m.term_b);
        println!("  Max time steps: {}", m.max_time_steps);
        println!("  Node selection: {:?}", m.node_selection);
        println!(
            "  Action probabilities: interact={:.2}, traverse={:.2}",
            m.interact_probability, m.traversal_probability
        );
        if let Some(dist) = m.distribution {
            println!("  Distribution: {dist:?}");
        }
        println!();

        println!("Results:");
        println!("  Total runs: {}", m.total_runs);
        println!("  Avg infection level: {:.2}%", m.avg_infection_level);
        println!("  Avg leader error: {:.2}%", m.avg_leader_error);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_default_means_never() {
        let m = Marker::default();
        assert_eq!(m.step, 0);
        assert_eq!(m.interactions, 0);
    }

    #[test]
    fn test_run_record_serializes_markers_and_timeline() {
        let mut record = RunRecord {
            population: 10,
            infections: 10,
            election_complete_count: 9,
            interactions: 40,
            traversals: 11,
            infection_complete: Marker::at(17, 12),
            ..RunRecord::default()
        };
        record.infection_timeline.insert(3, 2);
        record.infection_timeline.insert(9, 3);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"infection_complete\":{\"step\":17,\"interactions\":12}"));
        assert!(json.contains("\"infection_timeline\":{\"3\":2,\"9\":3}"));

        let back: RunRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.population, 10);
        assert_eq!(back.infection_timeline.get(&9), Some(&3));
    }
}
