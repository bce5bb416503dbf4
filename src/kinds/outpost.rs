use anyhow::Result;

use crate::directive_lifecycle::{DirectiveKind, DirectiveVariant, DirectiveView, RunOutcome, WorkUnit, WorkUnits};

/// Reserve a remote room and keep it scouted
#[derive(Debug, Default)]
pub struct OutpostDirective;

impl OutpostDirective {
    pub fn new() -> Self {
        Self
    }
}

impl DirectiveKind for OutpostDirective {
    fn variant(&self) -> DirectiveVariant {
        DirectiveVariant::Outpost
    }

    fn spawn_work_units(&mut self, view: &DirectiveView<'_>, units: &mut WorkUnits) {
        for (role, priority) in [("reserver", 4), ("scout", 6)] {
            let name = view.unit_name(role);
            units.insert(name.clone(), WorkUnit::new(name, role, &view.colony.name, priority));
        }
    }

    fn run(&mut self, _view: &DirectiveView<'_>) -> Result<RunOutcome> {
        Ok(RunOutcome::Continue)
    }
}
