use thiserror::Error;

use crate::world::{Position, WorldError};

/// Errors raised while binding, refreshing or creating directives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("no colony can own directive {name} at {pos}")]
    ColonyUnresolvable { name: String, pos: Position },

    #[error("marker for directive {name} is gone")]
    MarkerMissing { name: String },

    #[error("directive {name} references unknown waypoint {waypoint}")]
    InvalidWaypoint { name: String, waypoint: String },

    #[error("a directive named {name} already exists")]
    NameCollision { name: String },

    #[error("could not move directive {name} to {target}: {source}")]
    RelocationFailed {
        name: String,
        target: Position,
        #[source]
        source: WorldError,
    },

    #[error("path from colony {colony} to {target} is incomplete")]
    IncompletePath { colony: String, target: Position },

    #[error("directive {name} expired at tick {expiration}")]
    Expired { name: String, expiration: u64 },

    #[error("directive {name} is suspended until tick {until}")]
    Suspended { name: String, until: u64 },

    #[error("no observable room near {target} can hold a marker")]
    NoSubstitutePosition { target: Position },

    #[error(transparent)]
    World(#[from] WorldError),
}

impl DirectiveError {
    /// Outcomes that end the directive rather than signal a fault
    pub fn is_lifecycle_outcome(&self) -> bool {
        matches!(
            self,
            DirectiveError::Expired { .. } | DirectiveError::Suspended { .. }
        )
    }
}
