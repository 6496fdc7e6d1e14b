// Agent belief state for the gossip election

/// Unique agent identifier, assigned 0..population-1 at creation.
pub type AgentId = usize;

/// An autonomous agent participating in the election.
///
/// Every agent starts out believing it is the leader itself. Interactions
/// spread the highest believed leader id through the population; the agent
/// with the highest id (population - 1) is the true leader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    /// Unique agent id, immutable for the lifetime of a run
    id: AgentId,

    /// Who this agent currently believes is the leader
    pub believed_leader: AgentId,

    /// Number of agents this agent has converted (infected) with its
    /// believed leader while still believing itself the leader
    pub conversions: u64,

    /// Number of tie interactions met while still believing itself the leader
    pub met_followers: u64,

    /// Set once the completion heuristic fires for this agent
    pub is_leader: bool,

    /// Set once this agent believes the election has concluded, either via
    /// its own heuristic or by being told by a peer
    pub election_complete: bool,
}

impl Agent {
    /// Create an agent that believes itself the leader, with zeroed counters.
    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            believed_leader: id,
            conversions: 0,
            met_followers: 0,
            is_leader: false,
            election_complete: false,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Does this agent still believe it is the leader itself?
    pub fn believes_self_leader(&self) -> bool {
        self.believed_leader == self.id
    }

    /// Agent converted (infected) another. Bumps the conversions counter.
    pub fn converted(&mut self) {
        self.conversions += 1;
    }

    /// Agent met a follower of its own claim. Bumps the met-followers counter.
    pub fn met_follower(&mut self) {
        self.met_followers += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_believes_itself_leader() {
        let a = Agent::new(7);
        assert_eq!(a.id(), 7);
        assert_eq!(a.believed_leader, 7);
        assert!(a.believes_self_leader());
        assert_eq!(a.conversions, 0);
        assert_eq!(a.met_followers, 0);
        assert!(!a.is_leader);
        assert!(!a.election_complete);
    }

    #[test]
    fn test_counters_increment() {
        let mut a = Agent::new(0);
        a.converted();
        a.converted();
        a.met_follower();
        assert_eq!(a.conversions, 2);
        assert_eq!(a.met_followers, 1);
    }

    #[test]
    fn test_infected_agent_no_longer_believes_itself() {
        let mut a = Agent::new(3);
        a.believed_leader = 9;
        assert!(!a.believes_self_leader());
    }
}
