// The orchestrator: single point of contact for running a sweep.

use log::{info, warn};

use crate::distribution::{AgentDistribution, Placement};
use crate::error::SimError;
use crate::generators::GraphKind;
use crate::graph::{Graph, NodeId};
use crate::observer::{GraphObserver, NoOpObserver};
use crate::random::RandomSource;
use crate::run_record::{RunRecord, SweepMetadata, SweepReport};
use crate::time_step::{ActionSelection, ActionSpread, NodeSelection, RunContext, TimeStep};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration of a sweep: the population range, repetitions, heuristic
/// buffer terms and selection policies.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Half-open range of population sizes to sweep
    pub population_lower: usize,
    pub population_upper: usize,

    /// Repetitions per population size
    pub runs_per_population: usize,

    /// Multiplicative buffer factor of the completion heuristic
    pub term_a: i64,

    /// Additive buffer factor of the completion heuristic
    pub term_b: i64,

    /// Hard iteration bound per run
    pub max_time_steps: usize,

    pub node_selection: NodeSelection,

    /// Action probabilities; must sum to exactly 1.0. 50/50 keeps the
    /// cheaper uniform coin flip instead of the weighted draw.
    pub interact_probability: f64,
    pub traversal_probability: f64,

    /// Initial agent placement; unset falls back to single-node placement
    /// with a warning
    pub placement: Option<Placement>,

    /// Target node for single-node placement
    pub single_node: Option<NodeId>,

    /// Shape of the graph, recorded in the sweep metadata
    pub graph_kind: GraphKind,

    /// Explicit seed for reproducible sweeps; unset seeds from OS entropy
    pub seed: Option<[u8; 32]>,

    /// Free-form experiment description for the report
    pub description: Option<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            population_lower: 1000,
            population_upper: 1001,
            runs_per_population: 1,
            term_a: 4,
            term_b: 0,
            max_time_steps: 600_000,
            node_selection: NodeSelection::Uniform,
            interact_probability: 0.50,
            traversal_probability: 0.50,
            placement: None,
            single_node: None,
            graph_kind: GraphKind::Custom,
            seed: None,
            description: None,
        }
    }
}

// ============================================================================
// Simulator
// ============================================================================

/// Runs the full sweep: for every population size in range, for every
/// repetition, reset state, distribute agents and drive the step engine.
pub struct Simulator {
    config: SimulatorConfig,
    graph: Graph,
    random: RandomSource,
    distribution: AgentDistribution,
    records: Vec<RunRecord>,
}

impl Simulator {
    /// Create a simulator, validating the fatal preconditions before any
    /// step can execute: the graph must be connected and the action
    /// probabilities must sum to exactly 1.0.
    pub fn new(graph: Graph, config: SimulatorConfig) -> Result<Self, SimError> {
        if config.interact_probability + config.traversal_probability != 1.0 {
            return Err(SimError::ActionProbabilities {
                interact: config.interact_probability,
                traverse: config.traversal_probability,
            });
        }

        if !graph.is_connected() {
            // Some node is unreachable, so some agents could never be
            // infected; running would only produce misleading data
            return Err(SimError::GraphNotConnected);
        }

        let random = match config.seed {
            Some(seed) => RandomSource::from_seed(seed),
            None => RandomSource::from_entropy(),
        };
        let distribution = AgentDistribution::new(config.placement, config.single_node);

        info!("simulator created");
        Ok(Self {
            config,
            graph,
            random,
            distribution,
            records: Vec::new(),
        })
    }

    /// Run the sweep headless.
    pub fn execute(&mut self) -> Result<SweepReport, SimError> {
        self.execute_with(&mut NoOpObserver)
    }

    /// Run the sweep, notifying the observer of every graph mutation.
    pub fn execute_with(
        &mut self,
        observer: &mut dyn GraphObserver,
    ) -> Result<SweepReport, SimError> {
        info!(
            "simulation settings: term_a={}, term_b={}, max_time_steps={}, population={}..{}, runs={}",
            self.config.term_a,
            self.config.term_b,
            self.config.max_time_steps,
            self.config.population_lower,
            self.config.population_upper,
            self.config.runs_per_population,
        );

        if self.graph.has_dead_end() {
            warn!("the graph has a dead end");
        }
        if self.graph.node_count() == 1 {
            warn!("single-node graph - no traverse actions possible");
        }

        let engine = TimeStep::new(
            self.config.term_a,
            self.config.term_b,
            self.config.node_selection,
            self.action_selection(),
        );

        for population in self.config.population_lower..self.config.population_upper {
            self.graph.set_population(population);

            for run in 0..self.config.runs_per_population {
                info!("----------------------------------------------------");
                info!(
                    "starting run {}/{} at population {population}",
                    run + 1,
                    self.config.runs_per_population
                );

                self.graph.reset();
                self.distribution
                    .execute(&mut self.graph, &mut self.random, observer);

                let mut ctx = RunContext::new();
                for _ in 0..self.config.max_time_steps {
                    engine.step(&mut self.graph, &mut ctx, &mut self.random, observer)?;

                    // The cutoff deliberately ignores the infection-complete
                    // marker: once the leader declares early, infection
                    // stops spreading anyway and the run would idle until
                    // the step cap. Early declarations are surfaced as the
                    // leader-error statistic instead.
                    if ctx.leader_declared() && ctx.all_declared() {
                        info!("step {}: cutting off run - all actions complete", ctx.step());
                        break;
                    }
                }

                self.records.push(engine.end(&self.graph, ctx));
                info!(
                    "ending run {}/{} at population {population}",
                    run + 1,
                    self.config.runs_per_population
                );
            }
        }

        info!("all simulation runs complete");
        Ok(self.postmortem())
    }

    /// Run records collected so far.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    fn action_selection(&self) -> ActionSelection {
        // No point in a weighted draw when the split is 50/50
        if self.config.interact_probability == self.config.traversal_probability {
            ActionSelection::Uniform
        } else {
            ActionSelection::Weighted(ActionSpread::new(
                self.config.interact_probability,
                self.config.traversal_probability,
            ))
        }
    }

    /// Aggregate the sweep statistics and assemble the report.
    fn postmortem(&self) -> SweepReport {
        let total_runs = self.records.len();

        let mut avg_infection_level = 0.0;
        let mut leader_error = 0.0;

        for r in &self.records {
            let infection = r.infection_complete.interactions;
            let leader = r.leader_election_complete.interactions;

            // Leader declared completion before full infection
            if infection > leader && leader != 0 && infection != 0 {
                leader_error += 1.0;
            }

            // Infection never completed, so the leader was wrong by default
            if infection == 0 {
                leader_error += 1.0;
            }

            avg_infection_level += r.infections as f64 / r.population as f64;
        }

        if total_runs > 0 {
            avg_infection_level = avg_infection_level / total_runs as f64 * 100.0;
            leader_error = leader_error / total_runs as f64 * 100.0;
        }

        let single_node = match self.distribution.placement() {
            Some(Placement::Single) => self.distribution.single_node(),
            _ => None,
        };

        SweepReport {
            metadata: SweepMetadata {
                version: env!("CARGO_PKG_VERSION"),
                description: self.config.description.clone(),
                seed_used: self.random.seed(),
                graph_kind: self.config.graph_kind,
                node_count: self.graph.node_count(),
                node_selection: self.config.node_selection,
                distribution: self.distribution.placement(),
                single_node,
                interact_probability: self.config.interact_probability,
                traversal_probability: self.config.traversal_probability,
                population_lower: self.config.population_lower,
                population_upper: self.config.population_upper,
                term_a: self.config.term_a,
                term_b: self.config.term_b,
                max_time_steps: self.config.max_time_steps,
                runs_per_population: self.config.runs_per_population,
                total_runs,
                avg_infection_level,
                avg_leader_error: leader_error,
            },
            runs: self.records.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators;
    use crate::run_record::Marker;

    const SEED: [u8; 32] = [42u8; 32];

    fn config() -> SimulatorConfig {
        SimulatorConfig {
            seed: Some(SEED),
            ..SimulatorConfig::default()
        }
    }

    #[test]
    fn test_disconnected_graph_is_fatal() {
        let mut g = Graph::new();
        g.add_nodes(2);

        let err = Simulator::new(g, config()).err().unwrap();
        assert_eq!(err, SimError::GraphNotConnected);
    }

    #[test]
    fn test_bad_action_probabilities_are_fatal() {
        let g = generators::chain(3, false, false, false);
        let cfg = SimulatorConfig {
            interact_probability: 0.3,
            traversal_probability: 0.6,
            ..config()
        };

        let err = Simulator::new(g, cfg).err().unwrap();
        assert!(matches!(err, SimError::ActionProbabilities { .. }));
    }

    #[test]
    fn test_deterministic_two_agent_sweep() {
        // One node, two agents, zeroed buffer terms: the election resolves
        // in exactly three interactions for any seed
        let mut g = Graph::new();
        g.add_node();

        let cfg = SimulatorConfig {
            population_lower: 2,
            population_upper: 3,
            term_a: 0,
            term_b: 0,
            max_time_steps: 1000,
            placement: Some(Placement::Single),
            single_node: Some(0),
            ..config()
        };

        let mut sim = Simulator::new(g, cfg).unwrap();
        let report = sim.execute().unwrap();

        assert_eq!(report.runs.len(), 1);
        let r = &report.runs[0];
        assert_eq!(r.population, 2);
        assert_eq!(r.interactions, 3);
        assert_eq!(r.traversals, 0);
        assert_eq!(r.infections, 2);
        assert_eq!(r.election_complete_count, 2);
        assert_eq!(r.infection_complete, Marker::at(0, 1));
        assert_eq!(r.leader_election_complete, Marker::at(1, 2));
        assert_eq!(r.all_election_complete, Marker::at(2, 3));

        // Leader declared after full infection, so no leader error
        assert_eq!(report.metadata.total_runs, 1);
        assert_eq!(report.metadata.avg_infection_level, 100.0);
        assert_eq!(report.metadata.avg_leader_error, 0.0);
    }

    #[test]
    fn test_sweep_produces_record_per_cell() {
        let g = generators::fully_connected(3, false, false, &mut RandomSource::from_seed(SEED));
        let cfg = SimulatorConfig {
            population_lower: 4,
            population_upper: 7,
            runs_per_population: 2,
            term_a: 1,
            term_b: 0,
            max_time_steps: 50_000,
            placement: Some(Placement::EvenSpread),
            ..config()
        };

        let mut sim = Simulator::new(g, cfg).unwrap();
        let report = sim.execute().unwrap();

        assert_eq!(report.runs.len(), 6);
        let populations: Vec<usize> = report.runs.iter().map(|r| r.population).collect();
        assert_eq!(populations, vec![4, 4, 5, 5, 6, 6]);

        for r in &report.runs {
            let steps = r.interactions + r.traversals;
            assert!(steps > 0);
            assert!(steps <= 50_000, "runs stop at the step cap");
            assert!(r.infections <= r.population);
        }
    }

    #[test]
    fn test_weighted_sweep_runs() {
        let g = generators::chain(4, false, false, false);
        let cfg = SimulatorConfig {
            population_lower: 6,
            population_upper: 7,
            term_a: 1,
            term_b: 0,
            max_time_steps: 50_000,
            node_selection: NodeSelection::Weighted,
            interact_probability: 0.7,
            traversal_probability: 0.3,
            placement: Some(Placement::ChainEnds),
            ..config()
        };

        let mut sim = Simulator::new(g, cfg).unwrap();
        let report = sim.execute().unwrap();

        assert_eq!(report.runs.len(), 1);
        let r = &report.runs[0];
        assert!(r.interactions > r.traversals, "interact is favored 70/30");
    }

    #[test]
    fn test_same_seed_reproduces_sweep() {
        let make = || {
            let g = generators::chain(3, false, false, false);
            let cfg = SimulatorConfig {
                population_lower: 5,
                population_upper: 6,
                term_a: 1,
                term_b: 0,
                max_time_steps: 50_000,
                placement: Some(Placement::RandomSpread),
                ..config()
            };
            let mut sim = Simulator::new(g, cfg).unwrap();
            sim.execute().unwrap()
        };

        let a = make();
        let b = make();
        assert_eq!(a.runs[0].interactions, b.runs[0].interactions);
        assert_eq!(a.runs[0].traversals, b.runs[0].traversals);
        assert_eq!(a.runs[0].infection_complete, b.runs[0].infection_complete);
    }
}
