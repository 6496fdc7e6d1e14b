// Observation boundary for graph mutations (visualization front-ends)

use log::debug;

use crate::graph::{EdgeId, NodeId};

/// Observer notified after every node/edge mutation. Purely observational:
/// implementations must never mutate simulation state and must not block the
/// step loop.
pub trait GraphObserver {
    /// A node's agent set changed; `agent_count` is the new count.
    fn node_changed(&mut self, node: NodeId, agent_count: usize);

    /// An agent entered (`active = true`) or finished crossing
    /// (`active = false`) an edge.
    fn edge_traversed(&mut self, edge: EdgeId, active: bool);
}

/// No-op observer for headless sweeps (zero overhead).
pub struct NoOpObserver;

impl GraphObserver for NoOpObserver {
    #[inline(always)]
    fn node_changed(&mut self, _node: NodeId, _agent_count: usize) {
        // Intentionally empty - compiler should optimize this away
    }

    #[inline(always)]
    fn edge_traversed(&mut self, _edge: EdgeId, _active: bool) {
        // Intentionally empty
    }
}

/// Observer that logs mutations at debug level. Stands in for a real
/// rendering front-end when eyeballing small runs.
pub struct LoggingObserver;

impl GraphObserver for LoggingObserver {
    fn node_changed(&mut self, node: NodeId, agent_count: usize) {
        debug!("node {node} now holds {agent_count} agents");
    }

    fn edge_traversed(&mut self, edge: EdgeId, active: bool) {
        if active {
            debug!("edge {edge} traversal started");
        } else {
            debug!("edge {edge} traversal finished");
        }
    }
}

/// Records every notification. Test-only, for asserting observer wiring.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingObserver {
    pub node_events: Vec<(NodeId, usize)>,
    pub edge_events: Vec<(EdgeId, bool)>,
}

#[cfg(test)]
impl GraphObserver for RecordingObserver {
    fn node_changed(&mut self, node: NodeId, agent_count: usize) {
        self.node_events.push((node, agent_count));
    }

    fn edge_traversed(&mut self, edge: EdgeId, active: bool) {
        self.edge_events.push((edge, active));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_observer_accepts_events() {
        let mut obs = NoOpObserver;
        obs.node_changed(0, 10);
        obs.edge_traversed(3, true);
    }

    #[test]
    fn test_recording_observer_orders_events() {
        let mut obs = RecordingObserver::default();
        obs.node_changed(1, 2);
        obs.edge_traversed(0, true);
        obs.edge_traversed(0, false);

        assert_eq!(obs.node_events, vec![(1, 2)]);
        assert_eq!(obs.edge_events, vec![(0, true), (0, false)]);
    }
}
