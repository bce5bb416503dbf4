// Tests for the directive lifecycle: construction, refresh, removal and the engine cycle

#[cfg(test)]
mod tests {
    use super::super::engine::*;
    use super::super::mocks::*;
    use super::super::types::*;
    use super::super::{Directive, Phase};
    use crate::colonies::{AssignmentSettings, Colony, ColonyAssigner, ColonyRegistry};
    use crate::errors::DirectiveError;
    use crate::persistence::DirectiveMemory;
    use crate::presence::DirectivePresence;
    use crate::world::sim::ProcessEvent;
    use crate::world::{Marker, Position, World};

    const TICK: u64 = 100;

    fn colonies() -> ColonyRegistry {
        let mut registry = ColonyRegistry::new();
        registry.insert(
            Colony::new("E1S1", Position::new("E1S1", 25, 25))
                .with_outposts(["E1S2"])
                .with_level(4),
        );
        registry.insert(Colony::new("E3S1", Position::new("E3S1", 25, 25)).with_level(4));
        registry
    }

    fn harness() -> TestHarness {
        TestHarness::new(TICK, ["E1S1", "E1S2", "E3S1", "E5S1"])
    }

    fn place(harness: &mut TestHarness, name: &str, pos: Position, variant: DirectiveVariant) -> Marker {
        let marker = Marker::new(name, pos, variant.tag());
        harness.world.place_marker(marker.clone());
        marker
    }

    fn construct(
        harness: &mut TestHarness,
        colonies: &mut ColonyRegistry,
        marker: Marker,
        kind: &ScriptedKind,
        health: &CycleHealth,
    ) -> Directive {
        Directive::construct(
            marker,
            kind.boxed(),
            colonies,
            &ColonyAssigner::default(),
            &mut harness.services(),
            health,
        )
    }

    fn refresh(
        harness: &mut TestHarness,
        colonies: &mut ColonyRegistry,
        directive: &mut Directive,
    ) -> Result<(), DirectiveError> {
        directive.refresh(
            colonies,
            &ColonyAssigner::default(),
            &mut harness.services(),
            &CycleHealth::new(),
        )
    }

    #[test]
    fn test_construct_binds_by_ownership() {
        let mut harness = harness();
        let mut colonies = colonies();
        let kind = ScriptedKind::new(DirectiveVariant::Guard);
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);

        let directive = construct(&mut harness, &mut colonies, marker, &kind, &CycleHealth::new());

        assert_eq!(directive.phase(), Phase::Active);
        assert_eq!(directive.colony(), Some("E1S1"));
        assert_eq!(directive.room().map(|room| room.as_str()), Some("E1S2"));
        assert!(directive.is_registered());
        assert!(harness.processes.is_registered("guard:aa"));
        assert!(directive.work_units().contains_key("guard:aa:worker"));
        assert_eq!(colonies.get("E1S1").unwrap().flags(), ["guard:aa".to_string()]);

        let record = harness.memory.get("guard:aa").unwrap();
        assert_eq!(record.colony.as_deref(), Some("E1S1"));
        assert_eq!(record.created, Some(TICK));
    }

    #[test]
    fn test_cached_colony_is_used_without_path_queries() {
        let mut harness = harness();
        let mut colonies = colonies();
        harness.memory.put(
            "guard:far",
            DirectiveMemory {
                colony: Some("E3S1".to_string()),
                ..Default::default()
            },
        );
        let marker = place(&mut harness, "guard:far", Position::new("E9S9", 5, 5), DirectiveVariant::Guard);

        let directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        assert_eq!(directive.colony(), Some("E3S1"));
        assert_eq!(harness.oracle.call_count(), 0);
    }

    #[test]
    fn test_expired_directive_is_removed_before_binding() {
        let mut harness = harness();
        let mut colonies = colonies();
        harness.memory.put(
            "guard:old",
            DirectiveMemory {
                expiration: Some(TICK - 1),
                ..Default::default()
            },
        );
        let marker = place(&mut harness, "guard:old", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);

        let directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        assert_eq!(directive.phase(), Phase::Removed);
        assert!(harness.world.marker("guard:old").is_none());
        assert!(!harness.memory.contains("guard:old"));
        assert!(harness.processes.events().is_empty());
    }

    #[test]
    fn test_persistent_directive_ignores_expiration() {
        let mut harness = harness();
        let mut colonies = colonies();
        harness.memory.put(
            "guard:keep",
            DirectiveMemory {
                expiration: Some(TICK - 1),
                persistent: true,
                ..Default::default()
            },
        );
        let marker = place(&mut harness, "guard:keep", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);

        let directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );
        assert_eq!(directive.phase(), Phase::Active);
    }

    #[test]
    fn test_future_suspension_keeps_directive_unbound() {
        let mut harness = harness();
        let mut colonies = colonies();
        harness.memory.put(
            "guard:zz",
            DirectiveMemory {
                suspend_until: Some(TICK + 50),
                ..Default::default()
            },
        );
        let marker = place(&mut harness, "guard:zz", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);

        let directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        assert_eq!(directive.phase(), Phase::Suspended);
        assert_eq!(directive.colony(), None);
        assert!(!harness.processes.is_registered("guard:zz"));
        assert_eq!(harness.memory.get("guard:zz").unwrap().suspend_until, Some(TICK + 50));
    }

    #[test]
    fn test_elapsed_suspension_is_cleared() {
        let mut harness = harness();
        let mut colonies = colonies();
        harness.memory.put(
            "guard:zz",
            DirectiveMemory {
                suspend_until: Some(TICK),
                ..Default::default()
            },
        );
        let marker = place(&mut harness, "guard:zz", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);

        let directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        assert_eq!(directive.phase(), Phase::Active);
        assert_eq!(harness.memory.get("guard:zz").unwrap().suspend_until, None);
    }

    #[test]
    fn test_unresolvable_directive_is_removed_when_cycle_is_stable() {
        let mut harness = harness();
        let mut colonies = colonies();
        let marker = place(&mut harness, "guard:lost", Position::new("E9S9", 5, 5), DirectiveVariant::Guard);

        let directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        assert_eq!(directive.phase(), Phase::Removed);
        assert!(harness.world.marker("guard:lost").is_none());
        assert!(!harness.memory.contains("guard:lost"));
        assert_eq!(harness.notifier.alerts().len(), 1);
        // Both in-range colonies were asked for a path
        assert_eq!(harness.oracle.call_count(), 2);
    }

    #[test]
    fn test_unresolvable_directive_is_deferred_when_cycle_is_unstable() {
        let mut harness = harness();
        let mut colonies = colonies();
        let marker = place(&mut harness, "guard:lost", Position::new("E9S9", 5, 5), DirectiveVariant::Guard);
        let health = CycleHealth::new();
        health.record_exception();

        let directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &health,
        );

        assert_eq!(directive.phase(), Phase::Pending);
        assert!(!directive.is_registered());
        assert!(harness.world.marker("guard:lost").is_some());
        let record = harness.memory.get("guard:lost").unwrap();
        assert_eq!(record.colony, None);
        assert_eq!(record.created, Some(TICK));
        assert!(harness.notifier.alerts().is_empty());
    }

    #[test]
    fn test_persistent_directive_is_removed_when_resolution_fails() {
        let mut harness = harness();
        let mut colonies = colonies();
        harness.memory.put(
            "guard:lost",
            DirectiveMemory {
                persistent: true,
                ..Default::default()
            },
        );
        let marker = place(&mut harness, "guard:lost", Position::new("E9S9", 5, 5), DirectiveVariant::Guard);

        let directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        assert_eq!(directive.phase(), Phase::Removed);
        assert!(harness.world.marker("guard:lost").is_none());
        assert!(!harness.memory.contains("guard:lost"));
        assert_eq!(harness.notifier.alerts().len(), 1);
    }

    #[test]
    fn test_missing_marker_forces_removal() {
        let mut harness = harness();
        let mut colonies = colonies();
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        harness.world.remove_marker("guard:aa");
        let err = refresh(&mut harness, &mut colonies, &mut directive).unwrap_err();

        assert_eq!(
            err,
            DirectiveError::MarkerMissing {
                name: "guard:aa".to_string()
            }
        );
        assert_eq!(directive.phase(), Phase::Removed);
        assert!(!harness.processes.is_registered("guard:aa"));
        assert!(colonies.get("E1S1").unwrap().flags().is_empty());
        assert!(directive.work_units().is_empty());
    }

    #[test]
    fn test_expiration_set_between_ticks_removes_on_refresh() {
        let mut harness = harness();
        let mut colonies = colonies();
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        harness.memory.update("guard:aa", |record| record.expiration = Some(TICK - 10));
        let err = refresh(&mut harness, &mut colonies, &mut directive).unwrap_err();

        assert!(matches!(err, DirectiveError::Expired { expiration: 90, .. }));
        assert_eq!(directive.phase(), Phase::Removed);
        assert!(harness.world.marker("guard:aa").is_none());
        assert!(!harness.memory.contains("guard:aa"));
    }

    #[test]
    fn test_new_suspension_releases_directive() {
        let mut harness = harness();
        let mut colonies = colonies();
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        harness.memory.update("guard:aa", |record| record.suspend_until = Some(TICK + 20));
        let err = refresh(&mut harness, &mut colonies, &mut directive).unwrap_err();

        assert!(err.is_lifecycle_outcome());
        assert_eq!(directive.phase(), Phase::Suspended);
        assert!(!harness.processes.is_registered("guard:aa"));
        assert!(harness.world.marker("guard:aa").is_some());
    }

    #[test]
    fn test_relocation_is_confirmed_next_tick() {
        let mut harness = harness();
        let mut colonies = colonies();
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );
        let target = Position::new("E1S1", 30, 30);

        harness.memory.request_relocation("guard:aa", target.clone());
        refresh(&mut harness, &mut colonies, &mut directive).unwrap();
        assert_eq!(directive.pos(), &target);
        assert_eq!(harness.world.pending_move("guard:aa"), Some(&target));
        assert_eq!(
            harness.memory.get("guard:aa").unwrap().pending_relocation,
            Some(target.clone())
        );

        harness.world.advance();
        refresh(&mut harness, &mut colonies, &mut directive).unwrap();
        assert_eq!(directive.pos(), &target);
        assert_eq!(harness.world.marker("guard:aa").unwrap().pos, target);
        assert_eq!(harness.memory.get("guard:aa").unwrap().pending_relocation, None);
    }

    #[test]
    fn test_rejected_relocation_keeps_stale_position() {
        let mut harness = harness();
        let mut colonies = colonies();
        let origin = Position::new("E1S2", 10, 10);
        let marker = place(&mut harness, "guard:aa", origin.clone(), DirectiveVariant::Guard);
        let mut directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );
        let hidden = Position::new("E7S7", 30, 30);

        harness.memory.request_relocation("guard:aa", hidden.clone());
        refresh(&mut harness, &mut colonies, &mut directive).unwrap();

        assert_eq!(directive.pos(), &origin);
        assert_eq!(directive.phase(), Phase::Active);
        assert_eq!(harness.memory.get("guard:aa").unwrap().pending_relocation, Some(hidden));
    }

    #[test]
    fn test_waypoints_resolve_or_fall_back_to_empty() {
        let mut harness = harness();
        let mut colonies = colonies();
        place(&mut harness, "wp:1", Position::new("E1S1", 1, 1), DirectiveVariant::Outpost);
        place(&mut harness, "wp:2", Position::new("E1S1", 2, 2), DirectiveVariant::Outpost);
        harness.memory.put(
            "guard:aa",
            DirectiveMemory {
                waypoints: Some(vec!["wp:1".to_string(), "wp:2".to_string()]),
                ..Default::default()
            },
        );
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );
        assert_eq!(
            directive.waypoints(),
            [Position::new("E1S1", 1, 1), Position::new("E1S1", 2, 2)]
        );

        harness
            .memory
            .update("guard:aa", |record| record.waypoints = Some(vec!["wp:missing".to_string()]));
        refresh(&mut harness, &mut colonies, &mut directive).unwrap();
        assert!(directive.waypoints().is_empty());
        assert_eq!(directive.phase(), Phase::Active);
    }

    #[test]
    fn test_changed_cache_rebinds() {
        let mut harness = harness();
        let mut colonies = colonies();
        let kind = ScriptedKind::new(DirectiveVariant::Guard);
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(&mut harness, &mut colonies, marker, &kind, &CycleHealth::new());

        harness
            .memory
            .update("guard:aa", |record| record.colony = Some("E3S1".to_string()));
        refresh(&mut harness, &mut colonies, &mut directive).unwrap();

        assert_eq!(directive.colony(), Some("E3S1"));
        assert!(colonies.get("E1S1").unwrap().flags().is_empty());
        assert_eq!(colonies.get("E3S1").unwrap().flags(), ["guard:aa".to_string()]);
        assert_eq!(kind.calls.borrow().spawned, vec!["E1S1", "E3S1"]);
        assert_eq!(
            harness.processes.events(),
            [
                ProcessEvent::Registered {
                    name: "guard:aa".to_string(),
                    colony: Some("E1S1".to_string())
                },
                ProcessEvent::Removed {
                    name: "guard:aa".to_string()
                },
                ProcessEvent::Registered {
                    name: "guard:aa".to_string(),
                    colony: Some("E3S1".to_string())
                },
            ]
        );
    }

    #[test]
    fn test_cleared_cache_is_resolved_again() {
        let mut harness = harness();
        let mut colonies = colonies();
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        harness.memory.update("guard:aa", |record| record.colony = None);
        refresh(&mut harness, &mut colonies, &mut directive).unwrap();

        assert_eq!(directive.colony(), Some("E1S1"));
        assert_eq!(harness.memory.get("guard:aa").unwrap().colony.as_deref(), Some("E1S1"));
    }

    #[test]
    fn test_vanished_colony_is_replaced() {
        let mut harness = harness();
        let mut colonies = colonies();
        harness.oracle.set_length("E3S1", 40);
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        colonies.remove("E1S1");
        refresh(&mut harness, &mut colonies, &mut directive).unwrap();

        assert_eq!(directive.colony(), Some("E3S1"));
        assert_eq!(harness.memory.get("guard:aa").unwrap().colony.as_deref(), Some("E3S1"));
    }

    #[test]
    fn test_remove_respects_persistence_and_is_idempotent() {
        let mut harness = harness();
        let mut colonies = colonies();
        harness.memory.put(
            "guard:aa",
            DirectiveMemory {
                persistent: true,
                ..Default::default()
            },
        );
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        assert_eq!(
            directive.remove(false, &mut colonies, &mut harness.services()),
            RemovalOutcome::Noop
        );
        assert_eq!(directive.phase(), Phase::Active);

        assert_eq!(
            directive.remove(true, &mut colonies, &mut harness.services()),
            RemovalOutcome::Removed
        );
        assert_eq!(directive.phase(), Phase::Removed);
        assert!(harness.world.marker("guard:aa").is_none());
        assert!(!harness.memory.contains("guard:aa"));

        assert_eq!(
            directive.remove(true, &mut colonies, &mut harness.services()),
            RemovalOutcome::Noop
        );
    }

    #[test]
    fn test_reconstruction_round_trip() {
        let mut harness = harness();
        let mut colonies = colonies();
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let first = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );
        let (pos, colony, memory) = (
            first.pos().clone(),
            first.colony().map(str::to_string),
            first.memory().clone(),
        );
        drop(first);

        harness.world.set_tick(TICK + 5);
        let marker = harness.world.marker("guard:aa").unwrap();
        let second = construct(
            &mut harness,
            &mut colonies,
            marker,
            &ScriptedKind::new(DirectiveVariant::Guard),
            &CycleHealth::new(),
        );

        assert_eq!(second.pos(), &pos);
        assert_eq!(second.colony().map(str::to_string), colony);
        assert_eq!(second.memory(), &memory);
        assert_eq!(second.age(TICK + 5), 5);
    }

    #[test]
    fn test_run_errors_are_counted_not_raised() {
        let mut harness = harness();
        let mut colonies = colonies();
        let kind = ScriptedKind::new(DirectiveVariant::Guard).failing();
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);
        let mut directive = construct(&mut harness, &mut colonies, marker, &kind, &CycleHealth::new());

        let health = CycleHealth::new();
        directive.init(&colonies, TICK, &health);
        assert_eq!(directive.run(&colonies, TICK, &health), RunOutcome::Continue);
        assert_eq!(health.exception_count(), 1);
        assert!(!health.is_stable());
        assert_eq!(kind.calls.borrow().inits, 1);
        assert_eq!(kind.calls.borrow().runs, 1);
    }

    #[test]
    fn test_kind_filter_is_honoured() {
        let mut harness = harness();
        let mut colonies = colonies();
        harness.oracle.set_length("E3S1", 60);
        let kind = ScriptedKind::new(DirectiveVariant::Guard).rejecting("E1S1");
        let marker = place(&mut harness, "guard:aa", Position::new("E1S2", 10, 10), DirectiveVariant::Guard);

        let directive = construct(&mut harness, &mut colonies, marker, &kind, &CycleHealth::new());
        assert_eq!(directive.colony(), Some("E3S1"));
    }

    #[test]
    fn test_engine_wraps_markers_once() {
        let mut harness = harness();
        let presence = DirectivePresence::new(DirectiveVariant::Outpost);
        let pos = Position::new("E1S2", 20, 20);

        let first = presence
            .create_if_not_present(&mut harness.services(), &pos, PresenceScope::Room, CreateOptions::default())
            .unwrap();
        let second = presence
            .create_if_not_present(&mut harness.services(), &pos, PresenceScope::Room, CreateOptions::default())
            .unwrap();
        let name = first.unwrap();
        assert_eq!(second, None);

        let mut engine = DirectiveEngine::new(colonies(), AssignmentSettings::default());
        let report = engine.run_cycle(&mut harness.services(), &CycleHealth::new());
        assert_eq!(report.constructed, vec![name.clone()]);
        assert_eq!(engine.len(), 1);

        let directive = engine.get(&name).unwrap();
        assert_eq!(directive.colony(), Some("E1S1"));
        assert_eq!(directive.work_units().len(), 2);
        assert_eq!(engine.find_in_room(DirectiveVariant::Outpost, &"E1S2".into()).len(), 1);
        assert!(engine.find_at_pos(DirectiveVariant::Outpost, &pos).is_some());

        harness.world.advance();
        let report = engine.run_cycle(&mut harness.services(), &CycleHealth::new());
        assert_eq!(report.refreshed, vec![name]);
        assert!(report.constructed.is_empty());
    }

    #[test]
    fn test_engine_defers_then_removes_unresolvable() {
        let mut harness = harness();
        place(&mut harness, "guard:lost", Position::new("E9S9", 5, 5), DirectiveVariant::Guard);
        let mut engine = DirectiveEngine::new(colonies(), AssignmentSettings::default());

        let unstable = CycleHealth::new();
        unstable.record_exception();
        let report = engine.run_cycle(&mut harness.services(), &unstable);
        assert_eq!(report.deferred, vec!["guard:lost".to_string()]);
        assert!(engine.is_empty());
        assert!(harness.world.marker("guard:lost").is_some());

        harness.world.advance();
        let report = engine.run_cycle(&mut harness.services(), &CycleHealth::new());
        assert_eq!(report.removed, vec!["guard:lost".to_string()]);
        assert!(harness.world.marker("guard:lost").is_none());
    }

    #[test]
    fn test_engine_retires_finished_guard() {
        let mut harness = harness();
        let mut memory = DirectiveMemory::default();
        memory.extra.insert("guardUntil".to_string(), serde_json::json!(TICK));
        harness.memory.put("guard:E1S1", memory);
        place(&mut harness, "guard:E1S1", Position::new("E1S1", 10, 10), DirectiveVariant::Guard);

        let mut engine = DirectiveEngine::new(colonies(), AssignmentSettings::default());
        let report = engine.run_cycle(&mut harness.services(), &CycleHealth::new());

        assert_eq!(report.constructed, vec!["guard:E1S1".to_string()]);
        assert_eq!(report.removed, vec!["guard:E1S1".to_string()]);
        assert!(engine.is_empty());
        assert!(harness.world.marker("guard:E1S1").is_none());
    }

    #[test]
    fn test_engine_retires_colonize_once_room_is_a_colony() {
        let mut harness = harness();
        harness.oracle.set_length("E3S1", 120);
        place(&mut harness, "colonize:abc", Position::new("E5S1", 25, 25), DirectiveVariant::Colonize);

        let mut engine = DirectiveEngine::new(colonies(), AssignmentSettings::default());
        engine.run_cycle(&mut harness.services(), &CycleHealth::new());
        assert_eq!(engine.get("colonize:abc").unwrap().colony(), Some("E3S1"));

        engine
            .colonies_mut()
            .insert(Colony::new("E5S1", Position::new("E5S1", 25, 25)));
        harness.world.advance();
        let report = engine.run_cycle(&mut harness.services(), &CycleHealth::new());

        assert_eq!(report.removed, vec!["colonize:abc".to_string()]);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_engine_remove_directive() {
        let mut harness = harness();
        place(&mut harness, "outpost:E1S1", Position::new("E1S2", 5, 5), DirectiveVariant::Outpost);
        let mut engine = DirectiveEngine::new(colonies(), AssignmentSettings::default());
        engine.run_cycle(&mut harness.services(), &CycleHealth::new());
        assert_eq!(engine.len(), 1);

        assert_eq!(
            engine.remove_directive("outpost:E1S1", false, &mut harness.services()),
            RemovalOutcome::Removed
        );
        assert_eq!(
            engine.remove_directive("outpost:E1S1", false, &mut harness.services()),
            RemovalOutcome::Noop
        );
        assert!(engine.colonies().get("E1S1").unwrap().flags().is_empty());
    }
}
