// Simulation errors

use std::error::Error;
use std::fmt;

/// Errors that abort a simulation. These all indicate a misconfigured
/// experiment; none of them should be silently recovered from, as the
/// resulting data would be misleading.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// The graph is not a single connected component, so some agents could
    /// never be reached
    GraphNotConnected,

    /// Configured action probabilities do not sum to exactly 1.0
    ActionProbabilities { interact: f64, traverse: f64 },

    /// A bounded rejection-sampling loop exhausted its draw budget. In
    /// practice this means no node can satisfy the requested action.
    DrawBudgetExhausted { what: &'static str },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::GraphNotConnected => write!(f, "graph is not connected"),
            SimError::ActionProbabilities { interact, traverse } => write!(
                f,
                "action probabilities do not sum to 1.0: interact={interact}, traverse={traverse}"
            ),
            SimError::DrawBudgetExhausted { what } => {
                write!(f, "draw budget exhausted while selecting {what}")
            }
        }
    }
}

impl Error for SimError {}
