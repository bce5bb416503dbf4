use anyhow::{bail, Result};

use crate::colonies::Colony;
use crate::directive_lifecycle::{DirectiveKind, DirectiveVariant, DirectiveView, RunOutcome, WorkUnit, WorkUnits};

/// Lowest colony level able to field a defender
pub const GUARD_MIN_LEVEL: u8 = 2;

/// Keep a defender stationed at the marker.
///
/// An optional `guardUntil` tick in the durable record retires the directive
/// once passed.
#[derive(Debug, Default)]
pub struct GuardDirective;

impl GuardDirective {
    pub fn new() -> Self {
        Self
    }
}

impl DirectiveKind for GuardDirective {
    fn variant(&self) -> DirectiveVariant {
        DirectiveVariant::Guard
    }

    fn accepts_colony(&self, colony: &Colony) -> bool {
        colony.level >= GUARD_MIN_LEVEL
    }

    fn spawn_work_units(&mut self, view: &DirectiveView<'_>, units: &mut WorkUnits) {
        let name = view.unit_name("guard");
        units.insert(name.clone(), WorkUnit::new(name, "guard", &view.colony.name, 2));
    }

    fn run(&mut self, view: &DirectiveView<'_>) -> Result<RunOutcome> {
        let Some(value) = view.memory.extra.get("guardUntil") else {
            return Ok(RunOutcome::Continue);
        };
        let Some(until) = value.as_u64() else {
            bail!("{}: guardUntil must be a tick, got {}", view.name, value);
        };
        if view.tick >= until {
            return Ok(RunOutcome::Retire);
        }
        Ok(RunOutcome::Continue)
    }
}
