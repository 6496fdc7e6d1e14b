// Initial placement of agents across the graph, before a run starts.
//
// Agents are given ids from 0 to n - 1, where n is the population.

use std::collections::VecDeque;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::graph::{Graph, NodeId};
use crate::observer::GraphObserver;
use crate::random::RandomSource;

/// The five mutually exclusive placement strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// All agents in one user-designated node
    Single,

    /// All agents in one uniformly random node, chosen fresh each run
    RandomSingle,

    /// Agents spread evenly across the nodes in construction order; the
    /// first `population % nodes` nodes take one extra agent each
    EvenSpread,

    /// Agents assigned to random nodes in random-sized batches
    RandomSpread,

    /// Population split between the first and last node of a chain; with an
    /// odd population the tail takes the extra agent
    ChainEnds,
}

/// Placement strategy plus its bookkeeping. One instance per simulator,
/// re-executed at the start of every run.
pub struct AgentDistribution {
    placement: Option<Placement>,

    /// Target node for `Single` placement. Repaired in place if the
    /// configured node does not exist.
    single_node: Option<NodeId>,

    /// Node picked by the most recent `RandomSingle` run
    random_single_node: Option<NodeId>,
}

impl AgentDistribution {
    pub fn new(placement: Option<Placement>, single_node: Option<NodeId>) -> Self {
        Self {
            placement,
            single_node,
            random_single_node: None,
        }
    }

    /// The strategy in effect (set on construction, or repaired by the
    /// fallback in `execute`).
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    /// The `Single` target node currently in effect.
    pub fn single_node(&self) -> Option<NodeId> {
        self.single_node
    }

    /// The node picked by the most recent `RandomSingle` execution.
    pub fn random_single_node(&self) -> Option<NodeId> {
        self.random_single_node
    }

    /// Create the run's agents and place them on the graph.
    ///
    /// Falls back to `Single` on node 0 (with a warning) if no strategy was
    /// configured.
    pub fn execute(
        &mut self,
        g: &mut Graph,
        rs: &mut RandomSource,
        observer: &mut dyn GraphObserver,
    ) {
        let placement = match self.placement {
            Some(p) => p,
            None => {
                warn!("agent distribution not set - defaulting to single with all agents in node 0");
                self.placement = Some(Placement::Single);
                self.single_node = Some(0);
                Placement::Single
            }
        };

        info!("{placement:?} distribution of agents - begin");

        match placement {
            Placement::Single => self.single(g, observer),
            Placement::RandomSingle => self.random_single(g, rs, observer),
            Placement::EvenSpread => even_spread(g, observer),
            Placement::RandomSpread => random_spread(g, rs, observer),
            Placement::ChainEnds => chain_ends(g, observer),
        }

        info!("{placement:?} distribution of agents - complete");
    }

    fn single(&mut self, g: &mut Graph, observer: &mut dyn GraphObserver) {
        let target = match self.single_node.filter(|&id| g.node(id).is_some()) {
            Some(id) => id,
            None => {
                warn!("single-placement node id invalid or unset - falling back to node 0");
                self.single_node = Some(0);
                0
            }
        };

        let agents = create_agents(g.population());
        g.node_mut(target).set_agents(agents);
        observer.node_changed(target, g.population());
    }

    fn random_single(
        &mut self,
        g: &mut Graph,
        rs: &mut RandomSource,
        observer: &mut dyn GraphObserver,
    ) {
        let target = rs.next_node(g);
        let agents = create_agents(g.population());
        g.node_mut(target).set_agents(agents);
        self.random_single_node = Some(target);

        info!("all agents placed in node {target}");
        observer.node_changed(target, g.population());
    }
}

fn even_spread(g: &mut Graph, observer: &mut dyn GraphObserver) {
    let num_nodes = g.node_count();
    let mut agents: VecDeque<Agent> = create_agents(g.population()).into();

    // Population may not divide evenly over the nodes
    let remainder = g.population() % num_nodes;
    if remainder != 0 {
        info!(
            "population not evenly divisible by node count - first {remainder} nodes take an extra agent"
        );

        for id in 0..remainder {
            let agent = agents.pop_front().expect("remainder below population");
            g.node_mut(id).add_agent(agent);
        }
    }

    // The rest splits into equal contiguous blocks, one per node in order
    let allocation = agents.len() / num_nodes;
    info!("adding {allocation} agents to each node");

    for id in 0..num_nodes {
        let block: Vec<Agent> = agents.drain(..allocation).collect();
        g.node_mut(id).add_agents(block);
        observer.node_changed(id, g.node(id).map_or(0, |n| n.agent_count()));
    }
}

fn random_spread(g: &mut Graph, rs: &mut RandomSource, observer: &mut dyn GraphObserver) {
    let mut agents: VecDeque<Agent> = create_agents(g.population()).into();

    while !agents.is_empty() {
        let target = rs.next_node(g);

        // The last agent is placed directly instead of drawing a batch size
        // of zero or one
        let allocate = if agents.len() == 1 {
            1
        } else {
            rs.next_inclusive(agents.len())
        };

        let batch: Vec<Agent> = agents.drain(..allocate).collect();
        g.node_mut(target).add_agents(batch);
        debug!("allocated {allocate} agents to node {target}");

        observer.node_changed(target, g.node(target).map_or(0, |n| n.agent_count()));
    }

    for n in g.nodes() {
        debug!("node {}: {} agents at start", n.id(), n.agent_count());
    }
}

fn chain_ends(g: &mut Graph, observer: &mut dyn GraphObserver) {
    let head = 0;
    let tail = g.node_count() - 1;

    if head == tail {
        warn!("chain-ends placement on a single node - all agents land in node 0");
        let agents = create_agents(g.population());
        g.node_mut(head).set_agents(agents);
        observer.node_changed(head, g.population());
        return;
    }

    // Head takes the floor half; with an odd population the tail takes the
    // extra agent
    let mut agents = create_agents(g.population());
    let tail_agents = agents.split_off(g.population() / 2);

    let head_count = agents.len();
    let tail_count = tail_agents.len();

    g.node_mut(head).set_agents(agents);
    g.node_mut(tail).set_agents(tail_agents);

    observer.node_changed(head, head_count);
    observer.node_changed(tail, tail_count);
}

/// Create the run's agents, ids 0 to population - 1.
fn create_agents(population: usize) -> Vec<Agent> {
    (0..population).map(Agent::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoOpObserver;

    const SEED: [u8; 32] = [3u8; 32];

    fn line_graph(nodes: usize, population: usize) -> Graph {
        let mut g = Graph::new();
        g.add_nodes(nodes);
        for i in 1..nodes {
            g.add_edge(i - 1, i, false);
        }
        g.set_population(population);
        g
    }

    fn agent_counts(g: &Graph) -> Vec<usize> {
        g.nodes().iter().map(|n| n.agent_count()).collect()
    }

    fn assert_ids_complete(g: &Graph, population: usize) {
        let mut ids: Vec<usize> = g
            .nodes()
            .iter()
            .flat_map(|n| n.agents().iter().map(|a| a.id()))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..population).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_places_everything_in_designated_node() {
        let mut g = line_graph(4, 10);
        let mut rs = RandomSource::from_seed(SEED);
        let mut dist = AgentDistribution::new(Some(Placement::Single), Some(2));

        dist.execute(&mut g, &mut rs, &mut NoOpObserver);

        assert_eq!(agent_counts(&g), vec![0, 0, 10, 0]);
        assert_ids_complete(&g, 10);
    }

    #[test]
    fn test_single_falls_back_to_first_node() {
        let mut g = line_graph(3, 5);
        let mut rs = RandomSource::from_seed(SEED);
        let mut dist = AgentDistribution::new(Some(Placement::Single), Some(99));

        dist.execute(&mut g, &mut rs, &mut NoOpObserver);

        assert_eq!(agent_counts(&g), vec![5, 0, 0]);
        assert_eq!(dist.single_node(), Some(0), "repaired target is recorded");
    }

    #[test]
    fn test_unset_strategy_defaults_to_single_node_zero() {
        let mut g = line_graph(3, 4);
        let mut rs = RandomSource::from_seed(SEED);
        let mut dist = AgentDistribution::new(None, None);

        dist.execute(&mut g, &mut rs, &mut NoOpObserver);

        assert_eq!(dist.placement(), Some(Placement::Single));
        assert_eq!(agent_counts(&g), vec![4, 0, 0]);
    }

    #[test]
    fn test_random_single_records_chosen_node() {
        let mut g = line_graph(5, 7);
        let mut rs = RandomSource::from_seed(SEED);
        let mut dist = AgentDistribution::new(Some(Placement::RandomSingle), None);

        dist.execute(&mut g, &mut rs, &mut NoOpObserver);

        let chosen = dist.random_single_node().expect("node recorded");
        assert_eq!(g.node(chosen).unwrap().agent_count(), 7);
        assert_eq!(g.agent_count(), 7);
    }

    #[test]
    fn test_even_spread_deterministic_split() {
        // 23 agents over 10 nodes: nodes 0-2 take 3 each, nodes 3-9 take 2
        let mut g = line_graph(10, 23);
        let mut rs = RandomSource::from_seed(SEED);
        let mut dist = AgentDistribution::new(Some(Placement::EvenSpread), None);

        dist.execute(&mut g, &mut rs, &mut NoOpObserver);

        assert_eq!(agent_counts(&g), vec![3, 3, 3, 2, 2, 2, 2, 2, 2, 2]);
        assert_ids_complete(&g, 23);
    }

    #[test]
    fn test_even_spread_exact_division() {
        let mut g = line_graph(5, 20);
        let mut rs = RandomSource::from_seed(SEED);
        let mut dist = AgentDistribution::new(Some(Placement::EvenSpread), None);

        dist.execute(&mut g, &mut rs, &mut NoOpObserver);

        assert_eq!(agent_counts(&g), vec![4, 4, 4, 4, 4]);
    }

    #[test]
    fn test_chain_ends_odd_population() {
        // 1017 agents: head takes 508, tail takes 509
        let mut g = line_graph(6, 1017);
        let mut rs = RandomSource::from_seed(SEED);
        let mut dist = AgentDistribution::new(Some(Placement::ChainEnds), None);

        dist.execute(&mut g, &mut rs, &mut NoOpObserver);

        assert_eq!(agent_counts(&g), vec![508, 0, 0, 0, 0, 509]);
        assert_ids_complete(&g, 1017);
    }

    #[test]
    fn test_chain_ends_even_population() {
        let mut g = line_graph(4, 10);
        let mut rs = RandomSource::from_seed(SEED);
        let mut dist = AgentDistribution::new(Some(Placement::ChainEnds), None);

        dist.execute(&mut g, &mut rs, &mut NoOpObserver);

        assert_eq!(agent_counts(&g), vec![5, 0, 0, 5]);
    }

    #[test]
    fn test_random_spread_conserves_population() {
        let mut g = line_graph(7, 100);
        let mut rs = RandomSource::from_seed(SEED);
        let mut dist = AgentDistribution::new(Some(Placement::RandomSpread), None);

        dist.execute(&mut g, &mut rs, &mut NoOpObserver);

        assert_eq!(g.agent_count(), 100);
        assert_ids_complete(&g, 100);
    }
}
