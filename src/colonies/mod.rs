// Colony registry and the directive-to-colony assignment algorithm

pub mod registry;
pub mod routing;

pub use registry::{Colony, ColonyRegistry};
pub use routing::{
    AssignmentRequest, AssignmentSettings, AssignmentSource, ColonyAssigner, ColonyAssignment,
};
