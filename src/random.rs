// Random selection wrapper. The sole source of nondeterminism in a sweep.
//
// "Anyone who considers arithmetical methods of producing random digits is,
//  of course, in a state of sin."
//
//  - John Von Neumann, 1951

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SimError;
use crate::graph::{EdgeId, Graph, Node, NodeId};
use crate::time_step::{ActionSpread, StepAction};

/// Cap on rejection-sampling retries. Generous enough that legal draws never
/// hit it; illegal draws (no node can satisfy the action) surface as an error
/// instead of an endless loop.
const MAX_DRAWS: usize = 1 << 20;

/// Wrapper around a seeded `StdRng` so that all random choices in a sweep
/// come from one stream. Seeded once per `Simulator`; successive runs are
/// decorrelated draws from the same stream, never reseeded.
pub struct RandomSource {
    rng: StdRng,
    seed: [u8; 32],
}

impl RandomSource {
    /// Seed from OS entropy.
    pub fn from_entropy() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill(&mut seed);
        Self::from_seed(seed)
    }

    /// Seed explicitly, for reproducible sweeps.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: StdRng::from_seed(seed),
            seed,
        }
    }

    /// The seed this source was created with.
    pub fn seed(&self) -> [u8; 32] {
        self.seed
    }

    // ========================================================================
    // Node selection
    // ========================================================================

    /// Uniform pick among all nodes.
    pub fn next_node(&mut self, g: &Graph) -> NodeId {
        self.rng.gen_range(0..g.node_count())
    }

    /// Uniform pick among all nodes, rejecting nodes that cannot host the
    /// action (interact needs two agents; traverse needs an agent and a way
    /// out).
    pub fn next_node_for(&mut self, g: &Graph, action: StepAction) -> Result<NodeId, SimError> {
        for _ in 0..MAX_DRAWS {
            let id = self.next_node(g);
            let n = &g.nodes()[id];

            if satisfies(n, action) {
                debug!("{action:?}: node {id} selected");
                return Ok(id);
            }
        }

        Err(SimError::DrawBudgetExhausted {
            what: "uniform node",
        })
    }

    /// Weighted pick: each node's selection probability is proportional to
    /// the number of agents in it. Nodes failing the action's occupancy
    /// constraint are rejected and the draw repeated.
    pub fn next_node_weighted(
        &mut self,
        g: &Graph,
        action: StepAction,
    ) -> Result<NodeId, SimError> {
        // The spread only changes when agents move, never between retries
        let spread = g.agent_probability_spread();

        for _ in 0..MAX_DRAWS {
            let r = self.rng.gen::<f64>();

            let Some(&(id, _)) = spread.iter().find(|(_, range)| range.contains(&r)) else {
                continue;
            };
            let n = &g.nodes()[id];

            if satisfies(n, action) {
                debug!("{action:?}: node {id} selected (weighted)");
                return Ok(id);
            }
        }

        Err(SimError::DrawBudgetExhausted {
            what: "weighted node",
        })
    }

    // ========================================================================
    // Action selection
    // ========================================================================

    /// Coin flip between the two actions.
    pub fn next_action(&mut self) -> StepAction {
        if self.rng.gen_range(0..2) == 0 {
            StepAction::Interact
        } else {
            StepAction::Traverse
        }
    }

    /// Pick an action according to the configured probability spread.
    pub fn next_action_weighted(&mut self, spread: &ActionSpread) -> StepAction {
        spread.pick(self.rng.gen::<f64>())
    }

    // ========================================================================
    // Agent and edge selection
    // ========================================================================

    /// Index of a uniformly random agent in the node.
    pub fn next_agent_index(&mut self, n: &Node) -> usize {
        self.rng.gen_range(0..n.agent_count())
    }

    /// Two distinct agents from the node, by index, retrying on accidental
    /// self-pairing. The node must hold at least two agents.
    pub fn next_agent_pair(&mut self, n: &Node) -> Result<(usize, usize), SimError> {
        let count = n.agent_count();

        for _ in 0..MAX_DRAWS {
            let i = self.rng.gen_range(0..count);
            let j = self.rng.gen_range(0..count);

            if n.agents()[i].id() != n.agents()[j].id() {
                return Ok((i, j));
            }
        }

        Err(SimError::DrawBudgetExhausted { what: "agent pair" })
    }

    /// Uniform pick among the node's leaving edges.
    pub fn next_leaving_edge(&mut self, n: &Node) -> EdgeId {
        n.out_edges()[self.rng.gen_range(0..n.out_degree())]
    }

    // ========================================================================
    // Plain draws
    // ========================================================================

    /// Uniform integer in `[0, bound]`, both ends inclusive.
    pub fn next_inclusive(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..=bound)
    }
}

fn satisfies(n: &Node, action: StepAction) -> bool {
    match action {
        StepAction::Interact => n.agent_count() >= 2,
        StepAction::Traverse => n.agent_count() >= 1 && n.out_degree() >= 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;

    const SEED: [u8; 32] = [7u8; 32];

    fn weighted_graph() -> Graph {
        // Two nodes, both legal for interact, holding 6 and 2 agents
        let mut g = Graph::new();
        g.add_nodes(2);
        g.add_edge(0, 1, false);
        g.set_population(8);
        g.node_mut(0).set_agents((0..6).map(Agent::new).collect());
        g.node_mut(1).set_agents((6..8).map(Agent::new).collect());
        g
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = RandomSource::from_seed(SEED);
        let mut b = RandomSource::from_seed(SEED);
        let g = weighted_graph();

        for _ in 0..100 {
            assert_eq!(a.next_node(&g), b.next_node(&g));
        }
    }

    #[test]
    fn test_weighted_selection_fairness() {
        let mut rs = RandomSource::from_seed(SEED);
        let g = weighted_graph();

        let draws = 20_000;
        let mut hits = 0usize;
        for _ in 0..draws {
            if rs.next_node_weighted(&g, StepAction::Interact).unwrap() == 0 {
                hits += 1;
            }
        }

        // Node 0 holds 6 of 8 agents, so its empirical frequency should
        // converge to 0.75
        let freq = hits as f64 / draws as f64;
        assert!((freq - 0.75).abs() < 0.02, "frequency {freq} too far from 0.75");
    }

    #[test]
    fn test_rejection_honors_interact_constraint() {
        let mut g = Graph::new();
        g.add_nodes(3);
        g.add_edge(0, 1, false);
        g.add_edge(1, 2, false);
        g.set_population(3);
        // Only node 1 has two or more agents
        g.node_mut(0).set_agents(vec![Agent::new(0)]);
        g.node_mut(1).set_agents(vec![Agent::new(1), Agent::new(2)]);

        let mut rs = RandomSource::from_seed(SEED);
        for _ in 0..200 {
            assert_eq!(rs.next_node_for(&g, StepAction::Interact).unwrap(), 1);
            assert_eq!(rs.next_node_weighted(&g, StepAction::Interact).unwrap(), 1);
        }
    }

    #[test]
    fn test_rejection_honors_traverse_constraint() {
        // Node 1 holds agents but is a dead end; node 0 has the way out
        let mut g = Graph::new();
        g.add_nodes(2);
        g.add_edge(0, 1, true);
        g.set_population(3);
        g.node_mut(0).set_agents(vec![Agent::new(0)]);
        g.node_mut(1).set_agents(vec![Agent::new(1), Agent::new(2)]);

        let mut rs = RandomSource::from_seed(SEED);
        for _ in 0..200 {
            assert_eq!(rs.next_node_for(&g, StepAction::Traverse).unwrap(), 0);
        }
    }

    #[test]
    fn test_agent_pair_is_distinct() {
        let mut g = Graph::new();
        g.add_node();
        g.set_population(3);
        g.node_mut(0).set_agents((0..3).map(Agent::new).collect());

        let mut rs = RandomSource::from_seed(SEED);
        let n = g.node(0).unwrap();
        for _ in 0..500 {
            let (i, j) = rs.next_agent_pair(n).unwrap();
            assert_ne!(i, j);
        }
    }

    #[test]
    fn test_uniform_action_is_roughly_even() {
        let mut rs = RandomSource::from_seed(SEED);
        let draws = 10_000;
        let interacts = (0..draws)
            .filter(|_| rs.next_action() == StepAction::Interact)
            .count();

        let freq = interacts as f64 / draws as f64;
        assert!((freq - 0.5).abs() < 0.03, "frequency {freq} too far from 0.5");
    }
}
