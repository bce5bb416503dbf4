// Colony Directives Library - directive lifecycle and colony assignment
// This exposes the core components for testing and integration

pub mod colonies;
pub mod config;
pub mod directive_lifecycle;
pub mod errors;
pub mod kinds;
pub mod observability;
pub mod persistence;
pub mod presence;
pub mod telemetry;
pub mod world;

// Re-export key types for easy access
pub use colonies::{AssignmentSettings, AssignmentSource, Colony, ColonyAssigner, ColonyAssignment, ColonyRegistry};
pub use crate::config::{config, ColonyDirectivesConfig};
pub use directive_lifecycle::{
    CreateOptions, CycleHealth, CycleReport, Directive, DirectiveEngine, DirectiveKind, DirectiveVariant,
    Phase, PresenceScope, RemovalOutcome, RunOutcome, Services, WorkUnit,
};
pub use errors::DirectiveError;
pub use observability::{engine_metrics, EngineMetrics, OperationTimer};
pub use persistence::{DirectiveMemory, MemoryStore, PersistenceError};
pub use presence::DirectivePresence;
pub use telemetry::{create_cycle_span, generate_correlation_id, init_telemetry};
pub use world::{Marker, Position, RoomName, World, WorldError};
