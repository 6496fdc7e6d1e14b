// Heart beat of the simulator: the per-step state machine.

use std::cmp::Ordering;
use std::ops::Range;

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::error::SimError;
use crate::graph::{Graph, NodeId};
use crate::observer::GraphObserver;
use crate::random::RandomSource;
use crate::run_record::{Marker, RunRecord};

// ============================================================================
// Actions and selection policies
// ============================================================================

/// The two things that can happen in a time step: two agents in one node
/// interact, or one agent traverses an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Interact,
    Traverse,
}

/// How the engine picks the node an action happens in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSelection {
    /// All nodes equiprobable
    #[default]
    Uniform,

    /// Selection probability proportional to the number of agents in each
    /// node
    Weighted,
}

/// Cumulative probability partition of `[0, 1)` over the two actions:
/// `[0, interact)` selects interact, the complement selects traverse.
#[derive(Debug, Clone)]
pub struct ActionSpread {
    interact: Range<f64>,
}

impl ActionSpread {
    /// Build from per-action probabilities. The probabilities must sum to
    /// 1.0, validated where the configuration enters the system.
    pub fn new(interact: f64, traverse: f64) -> Self {
        debug_assert_eq!(interact + traverse, 1.0);
        Self {
            interact: 0.0..interact,
        }
    }

    /// Locate the action whose sub-interval contains `r`.
    pub fn pick(&self, r: f64) -> StepAction {
        if self.interact.contains(&r) {
            StepAction::Interact
        } else {
            StepAction::Traverse
        }
    }
}

/// How the engine picks between the two actions.
#[derive(Debug, Clone, Default)]
pub enum ActionSelection {
    /// 50/50 coin flip
    #[default]
    Uniform,

    /// Weighted by configured action probabilities
    Weighted(ActionSpread),
}

// ============================================================================
// Run context
// ============================================================================

/// Mutable per-run state, threaded through `TimeStep::step`. Owning this as
/// one value keeps every run independently resettable and testable.
#[derive(Debug)]
pub struct RunContext {
    /// The current time step
    step: usize,

    interactions: usize,
    traversals: usize,

    /// Agents currently believing the true leader's claim. The true leader
    /// counts itself from the start.
    infected: usize,

    /// Agents with the election-complete flag set
    election_complete: usize,

    /// Sticky: every agent is trapped in a node with no way out, so only
    /// interact is legal from here on
    dead_ended: bool,

    /// Set when the true leader's completion heuristic fires
    leader_declared: bool,

    infection_complete: Option<Marker>,
    leader_election_complete: Option<Marker>,
    all_election_complete: Option<Marker>,

    /// Step -> infection count, recorded as the infection spreads
    infection_timeline: IndexMap<usize, usize>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            step: 0,
            interactions: 0,
            traversals: 0,
            infected: 1,
            election_complete: 0,
            dead_ended: false,
            leader_declared: false,
            infection_complete: None,
            leader_election_complete: None,
            all_election_complete: None,
            infection_timeline: IndexMap::new(),
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn interactions(&self) -> usize {
        self.interactions
    }

    pub fn traversals(&self) -> usize {
        self.traversals
    }

    pub fn dead_ended(&self) -> bool {
        self.dead_ended
    }

    /// Has the true leader declared the election complete?
    pub fn leader_declared(&self) -> bool {
        self.leader_election_complete.is_some()
    }

    /// Do all agents believe the election is complete?
    pub fn all_declared(&self) -> bool {
        self.all_election_complete.is_some()
    }

    pub fn infection_complete(&self) -> Option<Marker> {
        self.infection_complete
    }

    pub fn leader_election_complete(&self) -> Option<Marker> {
        self.leader_election_complete
    }

    pub fn all_election_complete(&self) -> Option<Marker> {
        self.all_election_complete
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Time step engine
// ============================================================================

/// The per-run step engine. Holds the run's immutable tuning (terms and
/// selection policies); all mutable state lives in the `RunContext`.
pub struct TimeStep {
    /// Multiplicative buffer factor of the completion heuristic
    term_a: i64,

    /// Additive buffer factor of the completion heuristic
    term_b: i64,

    node_selection: NodeSelection,
    action_selection: ActionSelection,
}

impl TimeStep {
    pub fn new(
        term_a: i64,
        term_b: i64,
        node_selection: NodeSelection,
        action_selection: ActionSelection,
    ) -> Self {
        debug!("time step engine created: term_a={term_a}, term_b={term_b}");
        Self {
            term_a,
            term_b,
            node_selection,
            action_selection,
        }
    }

    /// A single step of the simulation (tick or heart beat).
    pub fn step(
        &self,
        g: &mut Graph,
        ctx: &mut RunContext,
        rs: &mut RandomSource,
        observer: &mut dyn GraphObserver,
    ) -> Result<(), SimError> {
        debug!("step {} begin", ctx.step);

        // Once every agent is trapped in a dead end, traversal is gone for
        // the rest of the run. The flag is sticky so the full graph scan
        // runs at most once per run.
        if !ctx.dead_ended {
            if let Some(node) = g.agent_dead_end() {
                warn!("all agents have hit dead-end node {node} - no more traverse actions");
                ctx.dead_ended = true;
            }
        }

        let action = if ctx.dead_ended {
            StepAction::Interact
        } else {
            match &self.action_selection {
                ActionSelection::Uniform => rs.next_action(),
                ActionSelection::Weighted(spread) => rs.next_action_weighted(spread),
            }
        };
        debug!("action: {action:?}");

        let node = match self.node_selection {
            NodeSelection::Uniform => rs.next_node_for(g, action)?,
            NodeSelection::Weighted => rs.next_node_weighted(g, action)?,
        };

        match action {
            StepAction::Interact => self.interact(g, ctx, rs, node, observer)?,
            StepAction::Traverse => self.traverse(g, ctx, rs, node, observer),
        }

        self.check_markers(g, ctx);

        debug_assert_eq!(g.agent_count(), g.population(), "agents must be conserved");

        debug!("step {} complete", ctx.step);
        ctx.step += 1;
        Ok(())
    }

    /// Simulation run complete: finalize the run record.
    pub fn end(&self, g: &Graph, ctx: RunContext) -> RunRecord {
        info!("simulation run complete");

        let record = RunRecord {
            population: g.population(),
            infections: g.infection_count(),
            election_complete_count: g.election_complete_count(),
            interactions: ctx.interactions,
            traversals: ctx.traversals,
            infection_complete: ctx.infection_complete.unwrap_or_default(),
            leader_election_complete: ctx.leader_election_complete.unwrap_or_default(),
            all_election_complete: ctx.all_election_complete.unwrap_or_default(),
            infection_timeline: ctx.infection_timeline,
        };

        info!("infected agents: {}/{}", record.infections, record.population);
        info!(
            "agents believing election complete: {}/{}",
            record.election_complete_count, record.population
        );
        info!("interactions: {}", record.interactions);
        info!("traversals: {}", record.traversals);
        info!(
            "marker - infection complete: step {}, interactions {}",
            record.infection_complete.step, record.infection_complete.interactions
        );
        info!(
            "marker - leader election complete: step {}, interactions {}",
            record.leader_election_complete.step, record.leader_election_complete.interactions
        );
        info!(
            "marker - all election complete: step {}, interactions {}",
            record.all_election_complete.step, record.all_election_complete.interactions
        );

        record
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Two randomly selected agents in node `node` interact.
    fn interact(
        &self,
        g: &mut Graph,
        ctx: &mut RunContext,
        rs: &mut RandomSource,
        node: NodeId,
        observer: &mut dyn GraphObserver,
    ) -> Result<(), SimError> {
        let leader = g.leader_id();
        let n = g.node_mut(node);
        let (i, j) = rs.next_agent_pair(n)?;
        let agents = n.agents_mut();

        if agents[i].election_complete || agents[j].election_complete {
            // One of them already believes the election is over: spread the
            // word to the other
            for k in [i, j] {
                if !agents[k].election_complete {
                    agents[k].election_complete = true;
                    ctx.election_complete += 1;
                }
            }
            debug!(
                "election-complete flag spread between agents {} and {}",
                agents[i].id(),
                agents[j].id()
            );
        } else {
            match agents[i].believed_leader.cmp(&agents[j].believed_leader) {
                Ordering::Greater => self.infect(ctx, agents, i, j, leader),
                Ordering::Less => self.infect(ctx, agents, j, i, leader),
                Ordering::Equal => {
                    debug!("tie, both infected by the same claim");

                    for k in [i, j] {
                        if agents[k].believes_self_leader() {
                            agents[k].met_follower();
                        }
                    }

                    // The heuristic must also re-run on ties. The true leader
                    // only ever sees ties once its claim has spread, so
                    // without this its counters would never cross the
                    // threshold.
                    self.check_completion(ctx, &mut agents[i], leader);
                    self.check_completion(ctx, &mut agents[j], leader);
                }
            }
        }

        ctx.interactions += 1;

        let count = n.agent_count();
        observer.node_changed(node, count);
        Ok(())
    }

    /// A randomly selected agent in node `node` traverses a leaving edge.
    fn traverse(
        &self,
        g: &mut Graph,
        ctx: &mut RunContext,
        rs: &mut RandomSource,
        node: NodeId,
        observer: &mut dyn GraphObserver,
    ) {
        let n = g.node_mut(node);
        let index = rs.next_agent_index(n);
        let agent = n.remove_agent(index);
        let edge = rs.next_leaving_edge(n);
        let from_count = n.agent_count();

        let target = g.edge(edge).opposite(node);
        let t = g.node_mut(target);
        t.add_agent(agent);
        let to_count = t.agent_count();

        ctx.traversals += 1;

        observer.node_changed(node, from_count);
        observer.edge_traversed(edge, true);
        observer.node_changed(target, to_count);
        observer.edge_traversed(edge, false);

        debug!("agent traversed edge {edge}: node {node} -> node {target}");
    }

    // ========================================================================
    // Election logic
    // ========================================================================

    /// The winner overwrites the loser's believed leader. A winner still
    /// backing its own claim counts a conversion and re-checks its
    /// completion heuristic.
    fn infect(
        &self,
        ctx: &mut RunContext,
        agents: &mut [Agent],
        winner: usize,
        loser: usize,
        leader: AgentId,
    ) {
        agents[loser].believed_leader = agents[winner].believed_leader;
        debug!(
            "agent {} infected agent {} with claim {}",
            agents[winner].id(),
            agents[loser].id(),
            agents[winner].believed_leader
        );

        if agents[winner].believed_leader == leader {
            ctx.infected += 1;
            ctx.infection_timeline.insert(ctx.step, ctx.infected);
        }

        if agents[winner].believes_self_leader() {
            agents[winner].converted();
            debug!("possible leader: agent {}", agents[winner].id());
            self.check_completion(ctx, &mut agents[winner], leader);
        }
    }

    /// The election completion heuristic:
    /// `term_b + term_a * conversions < met_followers`.
    fn check_completion(&self, ctx: &mut RunContext, agent: &mut Agent, leader: AgentId) {
        if self.term_b + self.term_a * agent.conversions as i64 >= agent.met_followers as i64 {
            return;
        }

        agent.is_leader = true;
        if !agent.election_complete {
            agent.election_complete = true;
            ctx.election_complete += 1;
        }

        // Is this the real leader declaring?
        if agent.id() == leader {
            ctx.leader_declared = true;
        }

        info!(
            "step {}: agent {} believes election is complete and is the leader",
            ctx.step,
            agent.id()
        );
    }

    // ========================================================================
    // Markers
    // ========================================================================

    /// Latch each convergence marker the first time it becomes true.
    fn check_markers(&self, g: &Graph, ctx: &mut RunContext) {
        debug_assert_eq!(ctx.infected, g.infection_count());
        debug_assert_eq!(ctx.election_complete, g.election_complete_count());

        let population = g.population();
        let marker = Marker::at(ctx.step, ctx.interactions);

        if ctx.infection_complete.is_none() && ctx.infected == population {
            info!("step {}: all agents infected", ctx.step);
            ctx.infection_complete = Some(marker);
        }

        if ctx.leader_election_complete.is_none() && ctx.leader_declared {
            info!("step {}: leader declared election complete", ctx.step);
            ctx.leader_election_complete = Some(marker);
        }

        if ctx.all_election_complete.is_none() && ctx.election_complete == population {
            info!("step {}: all agents believe election is complete", ctx.step);
            ctx.all_election_complete = Some(marker);
        }
    }
}
