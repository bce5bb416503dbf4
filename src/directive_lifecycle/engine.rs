use serde::Serialize;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use super::directive::Directive;
use super::state_machine::Phase;
use super::traits::Services;
use super::types::{DirectiveVariant, RemovalOutcome, RunOutcome};
use crate::colonies::{AssignmentSettings, ColonyAssigner, ColonyRegistry};
use crate::kinds;
use crate::observability::{engine_metrics, OperationTimer};
use crate::telemetry::{create_cycle_span, create_directive_span, generate_correlation_id};
use crate::world::{Position, RoomName};

/// Exceptions raised so far in the current cycle. Destructive decisions are
/// deferred while it is non-zero.
#[derive(Debug, Default)]
pub struct CycleHealth {
    exceptions: Cell<u32>,
}

impl CycleHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_exception(&self) {
        self.exceptions.set(self.exceptions.get().saturating_add(1));
    }

    pub fn exception_count(&self) -> u32 {
        self.exceptions.get()
    }

    pub fn is_stable(&self) -> bool {
        self.exceptions.get() == 0
    }
}

/// What happened to directives during one cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub tick: u64,
    pub correlation_id: String,
    pub refreshed: Vec<String>,
    pub constructed: Vec<String>,
    pub removed: Vec<String>,
    pub suspended: Vec<String>,
    pub deferred: Vec<String>,
    pub exceptions: u32,
}

impl CycleReport {
    fn record(&mut self, name: String, phase: Phase) {
        match phase {
            Phase::Removed | Phase::Expired => self.removed.push(name),
            Phase::Suspended => self.suspended.push(name),
            Phase::Pending | Phase::Bound => self.deferred.push(name),
            Phase::Active => {}
        }
    }
}

/// Colony registry plus the index of active directives
#[derive(Debug)]
pub struct DirectiveEngine {
    colonies: ColonyRegistry,
    directives: BTreeMap<String, Directive>,
    assigner: ColonyAssigner,
}

impl DirectiveEngine {
    pub fn new(colonies: ColonyRegistry, settings: AssignmentSettings) -> Self {
        Self {
            colonies,
            directives: BTreeMap::new(),
            assigner: ColonyAssigner::new(settings),
        }
    }

    pub fn colonies(&self) -> &ColonyRegistry {
        &self.colonies
    }

    /// Colonies may be added or removed between cycles
    pub fn colonies_mut(&mut self) -> &mut ColonyRegistry {
        &mut self.colonies
    }

    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.directives.get(name)
    }

    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.directives.values()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn find_in_room(&self, variant: DirectiveVariant, room: &RoomName) -> Vec<&Directive> {
        self.directives
            .values()
            .filter(|directive| directive.variant() == variant && directive.pos().is_in_room(room))
            .collect()
    }

    pub fn find_at_pos(&self, variant: DirectiveVariant, pos: &Position) -> Option<&Directive> {
        self.directives
            .values()
            .find(|directive| directive.variant() == variant && directive.pos() == pos)
    }

    /// Remove an indexed directive. Unknown names are a no-op.
    pub fn remove_directive(&mut self, name: &str, force: bool, services: &mut Services<'_>) -> RemovalOutcome {
        let Some(directive) = self.directives.get_mut(name) else {
            return RemovalOutcome::Noop;
        };
        let outcome = directive.remove(force, &mut self.colonies, services);
        if directive.phase() == Phase::Removed {
            self.directives.remove(name);
        }
        outcome
    }

    /// Refresh every indexed directive, wrap new markers, then run hooks.
    pub fn run_cycle(&mut self, services: &mut Services<'_>, health: &CycleHealth) -> CycleReport {
        let tick = services.world.tick();
        let correlation_id = generate_correlation_id();
        let span = create_cycle_span(tick, &correlation_id);
        let _enter = span.enter();
        let timer = OperationTimer::new("directive_cycle");
        engine_metrics().record_cycle();

        let mut report = CycleReport {
            tick,
            correlation_id,
            ..Default::default()
        };
        let mut handled = BTreeSet::new();

        let names: Vec<String> = self.directives.keys().cloned().collect();
        for name in names {
            handled.insert(name.clone());
            let Some(directive) = self.directives.get_mut(&name) else {
                continue;
            };
            let _span = create_directive_span(&name, directive.colony()).entered();
            if let Err(err) = directive.refresh(&mut self.colonies, &self.assigner, services, health) {
                if err.is_lifecycle_outcome() {
                    debug!(directive = %name, "{}", err);
                } else {
                    warn!(directive = %name, error = %err, "Refresh failed");
                }
            }

            match directive.phase() {
                Phase::Active => report.refreshed.push(name),
                phase => {
                    self.directives.remove(&name);
                    report.record(name, phase);
                }
            }
        }

        for marker in services.world.markers() {
            if handled.contains(&marker.name) || self.directives.contains_key(&marker.name) {
                continue;
            }
            let Some(kind) = kinds::for_tag(marker.tag) else {
                continue;
            };

            let name = marker.name.clone();
            let directive = Directive::construct(marker, kind, &mut self.colonies, &self.assigner, services, health);
            match directive.phase() {
                Phase::Active => {
                    report.constructed.push(name.clone());
                    self.directives.insert(name, directive);
                }
                phase => report.record(name, phase),
            }
        }

        self.init_directives(tick, health);
        for name in self.run_directives(tick, health) {
            if self.remove_directive(&name, false, services) == RemovalOutcome::Removed {
                report.removed.push(name);
            }
        }

        report.exceptions = health.exception_count();
        let elapsed = timer.finish();
        info!(
            tick = tick,
            active = self.directives.len(),
            constructed = report.constructed.len(),
            removed = report.removed.len(),
            deferred = report.deferred.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "Directive cycle complete"
        );
        report
    }

    /// Forward `init` to every active directive
    pub fn init_directives(&mut self, tick: u64, health: &CycleHealth) {
        for directive in self.directives.values_mut() {
            directive.init(&self.colonies, tick, health);
        }
    }

    /// Forward `run` to every active directive. Returns the directives that
    /// asked to be retired.
    pub fn run_directives(&mut self, tick: u64, health: &CycleHealth) -> Vec<String> {
        let mut retiring = Vec::new();
        for directive in self.directives.values_mut() {
            if directive.run(&self.colonies, tick, health) == RunOutcome::Retire {
                debug!(directive = %directive.name(), "Directive asked to retire");
                retiring.push(directive.name().to_string());
            }
        }
        retiring
    }
}
