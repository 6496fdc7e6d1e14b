// Scenario file format for the sweep runner

use infection_sim::distribution::Placement;
use infection_sim::generators::{self, GraphKind};
use infection_sim::graph::Graph;
use infection_sim::random::RandomSource;
use infection_sim::simulator::SimulatorConfig;
use infection_sim::time_step::NodeSelection;

// ============================================================================
// Scenario file schema
// ============================================================================

/// A sweep scenario loaded from YAML.
#[derive(Debug, serde::Deserialize)]
pub struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    pub meta: ScenarioMeta,

    /// Sweep configuration
    pub config: ScenarioConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hypothesis: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ScenarioConfig {
    /// Half-open population range
    pub population: PopulationRange,

    #[serde(default = "default_runs")]
    pub runs_per_population: usize,

    #[serde(default = "default_term_a")]
    pub term_a: i64,

    #[serde(default)]
    pub term_b: i64,

    #[serde(default = "default_max_time_steps")]
    pub max_time_steps: usize,

    #[serde(default)]
    pub node_selection: NodeSelection,

    /// Unset keeps the 50/50 coin flip
    #[serde(default)]
    pub action_probabilities: Option<ActionProbabilities>,

    pub distribution: DistributionSpec,

    pub graph: GraphSpec,
}

#[derive(Debug, serde::Deserialize)]
pub struct PopulationRange {
    pub lower: usize,
    pub upper: usize,
}

#[derive(Debug, serde::Deserialize)]
pub struct ActionProbabilities {
    pub interact: f64,
    pub traverse: f64,
}

#[derive(Debug, serde::Deserialize)]
pub struct DistributionSpec {
    pub placement: Placement,

    /// Target node for single-node placement
    #[serde(default)]
    pub single_node: Option<usize>,
}

/// Graph to generate for the sweep.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphSpec {
    /// A single node and no edges, the original-paper setting
    SingleNode,

    Chain {
        nodes: usize,
        #[serde(default)]
        directed: bool,
        #[serde(default)]
        doubly_linked: bool,
        #[serde(default)]
        loop_back: bool,
    },

    Grid {
        side: usize,
        #[serde(default)]
        directed: bool,
        #[serde(default)]
        cross_edges: bool,
    },

    FullyConnected {
        nodes: usize,
        #[serde(default)]
        directed: bool,
        #[serde(default)]
        randomly_directed: bool,
    },
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct OutputConfig {
    /// Where to write the JSON sweep report; unset skips persistence
    pub json_path: Option<String>,
}

fn default_runs() -> usize {
    1
}

fn default_term_a() -> i64 {
    4
}

fn default_max_time_steps() -> usize {
    600_000
}

// ============================================================================
// Building the experiment
// ============================================================================

impl GraphSpec {
    pub fn kind(&self) -> GraphKind {
        match self {
            GraphSpec::SingleNode => GraphKind::Custom,
            GraphSpec::Chain { .. } => GraphKind::Chain,
            GraphSpec::Grid { .. } => GraphKind::Grid,
            GraphSpec::FullyConnected { .. } => GraphKind::FullyConnected,
        }
    }

    /// Generate the graph. Random edge directions draw from `rs`.
    pub fn build(&self, rs: &mut RandomSource) -> Graph {
        match *self {
            GraphSpec::SingleNode => {
                let mut g = Graph::new();
                g.add_node();
                g
            }
            GraphSpec::Chain {
                nodes,
                directed,
                doubly_linked,
                loop_back,
            } => generators::chain(nodes, directed, doubly_linked, loop_back),
            GraphSpec::Grid {
                side,
                directed,
                cross_edges,
            } => generators::grid(side, directed, cross_edges),
            GraphSpec::FullyConnected {
                nodes,
                directed,
                randomly_directed,
            } => generators::fully_connected(nodes, directed, randomly_directed, rs),
        }
    }
}

impl ScenarioFile {
    /// Assemble the simulator configuration, with an optional seed override
    /// from the command line.
    pub fn simulator_config(&self, seed: Option<[u8; 32]>) -> SimulatorConfig {
        let (interact, traverse) = match self.config.action_probabilities {
            Some(ActionProbabilities { interact, traverse }) => (interact, traverse),
            None => (0.50, 0.50),
        };

        SimulatorConfig {
            population_lower: self.config.population.lower,
            population_upper: self.config.population.upper,
            runs_per_population: self.config.runs_per_population,
            term_a: self.config.term_a,
            term_b: self.config.term_b,
            max_time_steps: self.config.max_time_steps,
            node_selection: self.config.node_selection,
            interact_probability: interact,
            traversal_probability: traverse,
            placement: Some(self.config.distribution.placement),
            single_node: self.config.distribution.single_node,
            graph_kind: self.config.graph.kind(),
            seed,
            description: self.meta.description.clone(),
        }
    }
}
