// Directive Lifecycle Module
//
// Wraps world markers into directives, binds them to colonies and keeps them
// alive, suspended or retired across evaluation cycles.

pub mod directive;
pub mod engine;
pub mod state_machine;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod mocks;

#[cfg(test)]
pub mod tests;

pub use directive::Directive;
pub use engine::{CycleHealth, CycleReport, DirectiveEngine};
pub use state_machine::{DirectiveLifecycle, LifecycleEvent, Phase};
pub use traits::{DirectiveKind, DirectiveView, Services};
pub use types::{
    CreateOptions, DirectiveVariant, PresenceScope, RemovalOutcome, RunOutcome, WorkUnit, WorkUnits,
};
