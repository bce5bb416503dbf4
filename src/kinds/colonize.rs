use anyhow::Result;
use tracing::info;

use crate::colonies::Colony;
use crate::directive_lifecycle::{DirectiveKind, DirectiveVariant, DirectiveView, RunOutcome, WorkUnit, WorkUnits};

/// Lowest colony level able to send a claimer
pub const COLONIZE_MIN_LEVEL: u8 = 3;

/// Claim the marker's room and bootstrap it until it runs as its own colony
#[derive(Debug, Default)]
pub struct ColonizeDirective;

impl ColonizeDirective {
    pub fn new() -> Self {
        Self
    }
}

impl DirectiveKind for ColonizeDirective {
    fn variant(&self) -> DirectiveVariant {
        DirectiveVariant::Colonize
    }

    fn accepts_colony(&self, colony: &Colony) -> bool {
        colony.level >= COLONIZE_MIN_LEVEL
    }

    fn spawn_work_units(&mut self, view: &DirectiveView<'_>, units: &mut WorkUnits) {
        for (role, priority) in [("claimer", 1), ("pioneer", 3)] {
            let name = view.unit_name(role);
            units.insert(name.clone(), WorkUnit::new(name, role, &view.colony.name, priority));
        }
    }

    fn run(&mut self, view: &DirectiveView<'_>) -> Result<RunOutcome> {
        // Done once the target room is a colony in its own right
        let claimed = view
            .room_owner
            .is_some_and(|owner| owner.name == view.pos.room.as_str() && owner.name != view.colony.name);
        if claimed {
            info!(directive = %view.name, room = %view.pos.room, "Room claimed, retiring colonize directive");
            return Ok(RunOutcome::Retire);
        }
        Ok(RunOutcome::Continue)
    }
}
