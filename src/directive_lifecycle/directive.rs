use statig::prelude::*;
use std::fmt;
use tracing::{debug, error, info, warn};

use super::engine::CycleHealth;
use super::state_machine::{phase_of, DirectiveLifecycle, LifecycleEvent, Phase};
use super::traits::{DirectiveKind, DirectiveView, Services};
use super::types::{DirectiveVariant, RemovalOutcome, RunOutcome, WorkUnits};
use crate::colonies::{AssignmentRequest, Colony, ColonyAssigner, ColonyRegistry};
use crate::errors::DirectiveError;
use crate::observability::engine_metrics;
use crate::persistence::{DirectiveMemory, MemoryStore};
use crate::world::{AlertPriority, Marker, Position, RoomName, World};

/// A marker wrapped with its durable record, colony binding and kind behavior
pub struct Directive {
    name: String,
    variant: DirectiveVariant,
    pos: Position,
    room: Option<RoomName>,
    memory: DirectiveMemory,
    colony: Option<String>,
    waypoint_names: Option<Vec<String>>,
    waypoints: Vec<Position>,
    work_units: WorkUnits,
    kind: Box<dyn DirectiveKind>,
    lifecycle: StateMachine<DirectiveLifecycle>,
    registered: bool,
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("name", &self.name)
            .field("variant", &self.variant)
            .field("pos", &self.pos)
            .field("colony", &self.colony)
            .field("phase", &self.phase())
            .field("work_units", &self.work_units.len())
            .finish()
    }
}

impl Directive {
    /// Wrap a freshly observed marker.
    ///
    /// The returned directive is `Active` when a colony was found. Otherwise
    /// it ends `Removed`, `Suspended`, or `Pending` when removal was deferred
    /// because the cycle is unstable.
    pub fn construct(
        marker: Marker,
        kind: Box<dyn DirectiveKind>,
        colonies: &mut ColonyRegistry,
        assigner: &ColonyAssigner,
        services: &mut Services<'_>,
        health: &CycleHealth,
    ) -> Self {
        let tick = services.world.tick();
        let memory = services.memory.record(&marker.name);
        let mut directive = Self {
            lifecycle: DirectiveLifecycle::new(marker.name.as_str()).state_machine(),
            variant: kind.variant(),
            name: marker.name,
            pos: marker.pos.clone(),
            room: None,
            memory,
            colony: None,
            waypoint_names: None,
            waypoints: Vec::new(),
            work_units: WorkUnits::new(),
            kind,
            registered: false,
        };
        engine_metrics().record_construction();

        if directive.memory.is_expired(tick) {
            directive.expire(colonies, services);
            return directive;
        }

        if let Some(until) = directive.memory.suspended_until(tick) {
            directive.lifecycle.handle(&LifecycleEvent::Suspend { until });
            return directive;
        }
        directive.memory.suspend_until = None;

        if directive.memory.created.is_none() {
            directive.memory.created = Some(tick);
        }

        directive.load_waypoints(&*services.world);
        directive.observe(&marker.pos, services);
        directive.save(services.memory);

        if let Err(err) = directive.resolve_colony(colonies, assigner, services, health) {
            debug!(directive = %directive.name, error = %err, "Construction ended without a colony");
        }
        directive
    }

    /// Bring the directive up to date with its marker and durable record.
    /// Call once per cycle.
    pub fn refresh(
        &mut self,
        colonies: &mut ColonyRegistry,
        assigner: &ColonyAssigner,
        services: &mut Services<'_>,
        health: &CycleHealth,
    ) -> Result<(), DirectiveError> {
        if self.phase().is_terminal() {
            return Ok(());
        }
        let tick = services.world.tick();

        let Some(marker) = services.world.marker(&self.name) else {
            warn!(directive = %self.name, "Marker disappeared, removing directive");
            self.remove(true, colonies, services);
            return Err(DirectiveError::MarkerMissing {
                name: self.name.clone(),
            });
        };

        self.memory = services.memory.record(&self.name);

        if self.memory.is_expired(tick) {
            let expiration = self.memory.expiration.unwrap_or_default();
            self.expire(colonies, services);
            return Err(DirectiveError::Expired {
                name: self.name.clone(),
                expiration,
            });
        }

        if let Some(until) = self.memory.suspended_until(tick) {
            self.release(colonies, services);
            self.lifecycle.handle(&LifecycleEvent::Suspend { until });
            return Err(DirectiveError::Suspended {
                name: self.name.clone(),
                until,
            });
        }
        if self.memory.suspend_until.take().is_some() && self.phase() == Phase::Suspended {
            self.lifecycle.handle(&LifecycleEvent::Resume);
        }

        self.observe(&marker.pos, services);

        if self.memory.waypoints != self.waypoint_names {
            self.load_waypoints(&*services.world);
        }

        let result = if self.needs_rebind(colonies) {
            // The colony this directive was bound to is gone, look again
            if let Some(bound) = &self.colony {
                if !colonies.contains(bound) && self.memory.colony.as_ref() == Some(bound) {
                    self.memory.colony = None;
                }
            }
            self.release(colonies, services);
            self.resolve_colony(colonies, assigner, services, health)
        } else {
            Ok(())
        };

        self.save(services.memory);
        result
    }

    /// Tear the directive down. Removing twice, or removing a persistent
    /// directive without `force`, does nothing.
    pub fn remove(
        &mut self,
        force: bool,
        colonies: &mut ColonyRegistry,
        services: &mut Services<'_>,
    ) -> RemovalOutcome {
        if self.phase() == Phase::Removed {
            return RemovalOutcome::Noop;
        }
        if self.memory.persistent && !force {
            debug!(directive = %self.name, "Persistent directive kept");
            return RemovalOutcome::Noop;
        }

        self.release(colonies, services);
        if services.world.remove_marker(&self.name) {
            debug!(directive = %self.name, "Deleted marker");
        }
        services.memory.remove(&self.name);
        self.lifecycle.handle(&LifecycleEvent::Remove);

        engine_metrics().record_removal();
        info!(directive = %self.name, pos = %self.pos, forced = force, "Directive removed");
        RemovalOutcome::Removed
    }

    /// Forward the per-cycle setup hook to the kind
    pub fn init(&mut self, colonies: &ColonyRegistry, tick: u64, health: &CycleHealth) {
        if self.phase() != Phase::Active {
            return;
        }
        let Some(colony) = self.colony.as_deref().and_then(|name| colonies.get(name)) else {
            return;
        };
        let room_owner = colonies.colony_for_room(&self.pos.room);
        let (view, kind, _) = self.split_view(colony, room_owner, tick);
        if let Err(err) = kind.init(&view) {
            health.record_exception();
            error!(directive = %view.name, error = %err, "Directive init failed");
        }
    }

    /// Forward the per-cycle behavior hook to the kind. Kind errors are
    /// counted against the cycle and never propagate.
    pub fn run(&mut self, colonies: &ColonyRegistry, tick: u64, health: &CycleHealth) -> RunOutcome {
        if self.phase() != Phase::Active {
            return RunOutcome::Continue;
        }
        let Some(colony) = self.colony.as_deref().and_then(|name| colonies.get(name)) else {
            return RunOutcome::Continue;
        };
        let room_owner = colonies.colony_for_room(&self.pos.room);
        let (view, kind, _) = self.split_view(colony, room_owner, tick);
        match kind.run(&view) {
            Ok(outcome) => outcome,
            Err(err) => {
                health.record_exception();
                error!(directive = %view.name, error = %err, "Directive run failed");
                RunOutcome::Continue
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variant(&self) -> DirectiveVariant {
        self.variant
    }

    /// Effective position: the pending relocation target while a move is in flight
    pub fn pos(&self) -> &Position {
        &self.pos
    }

    /// Room at the position, when it is observable
    pub fn room(&self) -> Option<&RoomName> {
        self.room.as_ref()
    }

    pub fn memory(&self) -> &DirectiveMemory {
        &self.memory
    }

    pub fn colony(&self) -> Option<&str> {
        self.colony.as_deref()
    }

    pub fn work_units(&self) -> &WorkUnits {
        &self.work_units
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    pub fn phase(&self) -> Phase {
        phase_of(self.lifecycle.state())
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Ticks since the directive was first wrapped
    pub fn age(&self, tick: u64) -> u64 {
        tick.saturating_sub(self.memory.created.unwrap_or(tick))
    }

    fn resolve_colony(
        &mut self,
        colonies: &mut ColonyRegistry,
        assigner: &ColonyAssigner,
        services: &mut Services<'_>,
        health: &CycleHealth,
    ) -> Result<(), DirectiveError> {
        let kind = &self.kind;
        let filter = |colony: &Colony| kind.accepts_colony(colony);
        let request = AssignmentRequest {
            name: &self.name,
            pos: &self.pos,
            filter: &filter,
        };

        match assigner.assign(&request, &mut self.memory, colonies, services.oracle) {
            Ok(assignment) => {
                self.bind(assignment.colony, colonies, services);
                Ok(())
            }
            Err(err) => {
                self.handle_unresolvable(&err, colonies, services, health);
                Err(err)
            }
        }
    }

    fn bind(&mut self, colony_name: String, colonies: &mut ColonyRegistry, services: &mut Services<'_>) {
        let tick = services.world.tick();
        if let Some(colony) = colonies.get_mut(&colony_name) {
            colony.attach_flag(&self.name);
        }
        self.colony = Some(colony_name.clone());
        self.work_units.clear();
        self.lifecycle.handle(&LifecycleEvent::Bind {
            colony: colony_name.clone(),
        });
        services.processes.register_directive(self);
        self.registered = true;

        if let Some(colony) = colonies.get(&colony_name) {
            let room_owner = colonies.colony_for_room(&self.pos.room);
            let (view, kind, units) = self.split_view(colony, room_owner, tick);
            kind.spawn_work_units(&view, units);
        }

        self.lifecycle.handle(&LifecycleEvent::Activate);
        self.save(services.memory);
        debug!(
            directive = %self.name,
            colony = %colony_name,
            work_units = self.work_units.len(),
            "Directive active"
        );
    }

    fn handle_unresolvable(
        &mut self,
        err: &DirectiveError,
        colonies: &mut ColonyRegistry,
        services: &mut Services<'_>,
        health: &CycleHealth,
    ) {
        if !health.is_stable() {
            engine_metrics().record_deferred_removal();
            warn!(
                directive = %self.name,
                exceptions = health.exception_count(),
                "No colony for directive, deferring removal while the cycle is unstable"
            );
            self.release(colonies, services);
            return;
        }

        warn!(directive = %self.name, error = %err, "No colony for directive, removing");
        services.notifier.alert(
            &format!("{} at {} has no colony, removing", self.name, self.pos),
            &self.pos.room,
            AlertPriority::Normal,
        );
        // Assignment failure overrides `persistent`
        self.remove(true, colonies, services);
    }

    /// Drop registration, colony flag and work units
    fn release(&mut self, colonies: &mut ColonyRegistry, services: &mut Services<'_>) {
        if self.registered {
            services.processes.remove_directive(&self.name);
            self.registered = false;
        }
        if let Some(colony) = self.colony.take() {
            if let Some(colony) = colonies.get_mut(&colony) {
                colony.detach_flag(&self.name);
            }
        }
        self.work_units.clear();
        self.lifecycle.handle(&LifecycleEvent::Release);
    }

    fn expire(&mut self, colonies: &mut ColonyRegistry, services: &mut Services<'_>) {
        info!(
            directive = %self.name,
            expiration = ?self.memory.expiration,
            tick = services.world.tick(),
            "Directive expired"
        );
        self.lifecycle.handle(&LifecycleEvent::Expire);
        self.remove(true, colonies, services);
    }

    fn needs_rebind(&self, colonies: &ColonyRegistry) -> bool {
        match (&self.memory.colony, &self.colony) {
            (Some(cached), Some(bound)) => cached != bound || !colonies.contains(bound),
            _ => true,
        }
    }

    /// Take the marker's true position and follow up on any pending move
    fn observe(&mut self, marker_pos: &Position, services: &mut Services<'_>) {
        self.pos = match self.memory.pending_relocation.clone() {
            None => marker_pos.clone(),
            Some(target) if &target == marker_pos => {
                debug!(directive = %self.name, pos = %target, "Relocation confirmed");
                self.memory.pending_relocation = None;
                target
            }
            Some(target) => match services.world.set_marker_position(&self.name, &target) {
                Ok(()) => {
                    debug!(directive = %self.name, from = %marker_pos, to = %target, "Relocation requested");
                    target
                }
                Err(source) => {
                    engine_metrics().record_relocation_failure();
                    let err = DirectiveError::RelocationFailed {
                        name: self.name.clone(),
                        target,
                        source,
                    };
                    warn!(directive = %self.name, "{}, retrying next cycle", err);
                    marker_pos.clone()
                }
            },
        };

        self.room = services
            .world
            .is_observable(&self.pos.room)
            .then(|| self.pos.room.clone());
    }

    fn load_waypoints(&mut self, world: &dyn World) {
        self.waypoint_names = self.memory.waypoints.clone();
        self.waypoints.clear();

        let Some(names) = &self.memory.waypoints else {
            return;
        };
        for waypoint in names {
            match world.marker(waypoint) {
                Some(marker) => self.waypoints.push(marker.pos),
                None => {
                    let err = DirectiveError::InvalidWaypoint {
                        name: self.name.clone(),
                        waypoint: waypoint.clone(),
                    };
                    warn!("{}, ignoring waypoints", err);
                    self.waypoints.clear();
                    return;
                }
            }
        }
    }

    fn save(&self, store: &mut MemoryStore) {
        if self.phase() != Phase::Removed {
            store.put(&self.name, self.memory.clone());
        }
    }

    fn split_view<'a>(
        &'a mut self,
        colony: &'a Colony,
        room_owner: Option<&'a Colony>,
        tick: u64,
    ) -> (DirectiveView<'a>, &'a mut Box<dyn DirectiveKind>, &'a mut WorkUnits) {
        let Directive {
            name,
            variant,
            pos,
            memory,
            waypoints,
            work_units,
            kind,
            ..
        } = self;
        let view = DirectiveView {
            name,
            variant: *variant,
            pos,
            memory,
            waypoints,
            colony,
            room_owner,
            tick,
        };
        (view, kind, work_units)
    }
}
