// Seams between the lifecycle engine, directive kinds and the outside world

use anyhow::Result;

use super::types::{DirectiveVariant, RunOutcome, WorkUnits};
use crate::colonies::Colony;
use crate::persistence::{DirectiveMemory, MemoryStore};
use crate::world::{DistanceOracle, Notifier, Position, ProcessTable, World};

/// Behavior of one directive variant
pub trait DirectiveKind {
    fn variant(&self) -> DirectiveVariant;

    /// Colony filter consulted by ownership and nearest-colony resolution
    fn accepts_colony(&self, _colony: &Colony) -> bool {
        true
    }

    /// Create the work units this directive needs. Called on every (re)bind
    /// with an empty map.
    fn spawn_work_units(&mut self, view: &DirectiveView<'_>, units: &mut WorkUnits);

    /// Per-cycle setup, before any directive runs
    fn init(&mut self, _view: &DirectiveView<'_>) -> Result<()> {
        Ok(())
    }

    /// Per-cycle behavior
    fn run(&mut self, view: &DirectiveView<'_>) -> Result<RunOutcome>;
}

/// Everything a directive may touch while it is processed
pub struct Services<'a> {
    pub world: &'a mut dyn World,
    pub memory: &'a mut MemoryStore,
    pub oracle: &'a dyn DistanceOracle,
    pub processes: &'a mut dyn ProcessTable,
    pub notifier: &'a mut dyn Notifier,
}

/// Read-only snapshot of a bound directive handed to its kind
#[derive(Debug, Clone, Copy)]
pub struct DirectiveView<'a> {
    pub name: &'a str,
    pub variant: DirectiveVariant,
    pub pos: &'a Position,
    pub memory: &'a DirectiveMemory,
    pub waypoints: &'a [Position],
    pub colony: &'a Colony,
    /// Colony that owns the directive's room, if any
    pub room_owner: Option<&'a Colony>,
    pub tick: u64,
}

impl DirectiveView<'_> {
    pub fn unit_name(&self, role: &str) -> String {
        format!("{}:{}", self.name, role)
    }
}
