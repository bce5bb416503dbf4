// Mock implementations for testing - no side effects

use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::colonies::Colony;
use crate::directive_lifecycle::traits::*;
use crate::directive_lifecycle::types::*;
use crate::persistence::MemoryStore;
use crate::world::sim::{LogNotifier, RecordingProcessTable, SimWorld};
use crate::world::{DistanceOracle, PathOptions, PathResult, Position, RoomName};

/// Oracle answering with scripted path lengths per origin room.
/// Unscripted origins yield incomplete paths.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    pub lengths: RefCell<BTreeMap<RoomName, u32>>,
    pub calls: RefCell<Vec<(Position, Position)>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_length(&self, origin: &str, length: u32) {
        self.lengths.borrow_mut().insert(RoomName::from(origin), length);
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl DistanceOracle for ScriptedOracle {
    fn find_path(&self, origin: &Position, goal: &Position, _options: &PathOptions) -> PathResult {
        self.calls.borrow_mut().push((origin.clone(), goal.clone()));
        match self.lengths.borrow().get(&origin.room) {
            Some(&length) => PathResult {
                path: vec![goal.clone(); length as usize],
                incomplete: false,
            },
            None => PathResult {
                path: Vec::new(),
                incomplete: true,
            },
        }
    }
}

/// What a scripted kind was asked to do
#[derive(Debug, Default)]
pub struct KindCalls {
    pub spawned: Vec<String>,
    pub inits: u32,
    pub runs: u32,
}

/// Directive kind whose behavior is set up by the test
#[derive(Debug, Clone)]
pub struct ScriptedKind {
    pub variant: DirectiveVariant,
    pub rejected_colonies: Vec<String>,
    pub fail_run: bool,
    pub retire: bool,
    pub calls: Rc<RefCell<KindCalls>>,
}

impl ScriptedKind {
    pub fn new(variant: DirectiveVariant) -> Self {
        Self {
            variant,
            rejected_colonies: Vec::new(),
            fail_run: false,
            retire: false,
            calls: Rc::new(RefCell::new(KindCalls::default())),
        }
    }

    pub fn rejecting(mut self, colony: &str) -> Self {
        self.rejected_colonies.push(colony.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_run = true;
        self
    }

    pub fn retiring(mut self) -> Self {
        self.retire = true;
        self
    }

    pub fn boxed(&self) -> Box<dyn DirectiveKind> {
        Box::new(self.clone())
    }
}

impl DirectiveKind for ScriptedKind {
    fn variant(&self) -> DirectiveVariant {
        self.variant
    }

    fn accepts_colony(&self, colony: &Colony) -> bool {
        !self.rejected_colonies.contains(&colony.name)
    }

    fn spawn_work_units(&mut self, view: &DirectiveView<'_>, units: &mut WorkUnits) {
        let name = view.unit_name("worker");
        self.calls.borrow_mut().spawned.push(view.colony.name.clone());
        units.insert(name.clone(), WorkUnit::new(name, "worker", &view.colony.name, 5));
    }

    fn init(&mut self, _view: &DirectiveView<'_>) -> Result<()> {
        self.calls.borrow_mut().inits += 1;
        Ok(())
    }

    fn run(&mut self, view: &DirectiveView<'_>) -> Result<RunOutcome> {
        self.calls.borrow_mut().runs += 1;
        if self.fail_run {
            return Err(anyhow!("{} failed on purpose", view.name));
        }
        Ok(if self.retire {
            RunOutcome::Retire
        } else {
            RunOutcome::Continue
        })
    }
}

/// All collaborators of a directive, backed by in-memory fakes
#[derive(Debug, Default)]
pub struct TestHarness {
    pub world: SimWorld,
    pub memory: MemoryStore,
    pub oracle: ScriptedOracle,
    pub processes: RecordingProcessTable,
    pub notifier: LogNotifier,
}

impl TestHarness {
    pub fn new<R: Into<RoomName>>(tick: u64, observable: impl IntoIterator<Item = R>) -> Self {
        Self {
            world: SimWorld::new(tick).with_observable(observable),
            ..Default::default()
        }
    }

    pub fn services(&mut self) -> Services<'_> {
        Services {
            world: &mut self.world,
            memory: &mut self.memory,
            oracle: &self.oracle,
            processes: &mut self.processes,
            notifier: &mut self.notifier,
        }
    }
}
