use std::fmt::{self, Display};

use serde::Serialize;

/// How a solution was derived from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Neighborhood {
    Initial,
    /// One cargo moved to the end of another vehicle's list.
    Reassign,
    /// Two cargo exchanged positions inside one vehicle's list.
    Swap,
    /// Nothing to perturb, the parent is returned as is.
    Idle,
}

impl Display for Neighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Initial => "Initial",
                Self::Reassign => "Reassign",
                Self::Swap => "Swap",
                Self::Idle => "Idle",
            }
        )
    }
}
