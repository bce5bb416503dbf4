use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::decisions::{is_closer, name_affinity};
use super::filters::within_linear_range;
use crate::colonies::{Colony, ColonyRegistry};
use crate::errors::DirectiveError;
use crate::observability::engine_metrics;
use crate::persistence::{DirectiveMemory, DEFAULT_MAX_LINEAR_RANGE, DEFAULT_MAX_PATH_LENGTH};
use crate::world::{DistanceOracle, PathOptions, Position};

/// Limits used when a directive's durable record does not override them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSettings {
    pub default_max_path_length: u32,
    pub default_max_linear_range: u32,
    pub path_max_ops: u32,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            default_max_path_length: DEFAULT_MAX_PATH_LENGTH,
            default_max_linear_range: DEFAULT_MAX_LINEAR_RANGE,
            path_max_ops: 20_000,
        }
    }
}

/// What a directive brings to colony resolution
pub struct AssignmentRequest<'a> {
    pub name: &'a str,
    pub pos: &'a Position,
    /// Colony filter supplied by the directive kind
    pub filter: &'a dyn Fn(&Colony) -> bool,
}

/// Which resolution step produced the binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentSource {
    Cached,
    NameAffinity,
    Ownership,
    Nearest { path_length: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColonyAssignment {
    pub colony: String,
    pub source: AssignmentSource,
}

/// Binds directives to colonies: cached id, then name affinity, then room
/// ownership, then the nearest colony by path length.
#[derive(Debug, Clone, Default)]
pub struct ColonyAssigner {
    settings: AssignmentSettings,
}

impl ColonyAssigner {
    pub fn new(settings: AssignmentSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AssignmentSettings {
        &self.settings
    }

    /// Resolve the owning colony. Success is cached in `memory`; failure
    /// leaves it untouched so the next cycle can retry.
    pub fn assign(
        &self,
        request: &AssignmentRequest<'_>,
        memory: &mut DirectiveMemory,
        colonies: &ColonyRegistry,
        oracle: &dyn DistanceOracle,
    ) -> Result<ColonyAssignment, DirectiveError> {
        if let Some(cached) = memory.colony.as_deref() {
            // A stale cached id is not second-guessed
            return match colonies.get(cached) {
                Some(colony) => {
                    engine_metrics().record_cache_hit();
                    Ok(ColonyAssignment {
                        colony: colony.name.clone(),
                        source: AssignmentSource::Cached,
                    })
                }
                None => {
                    warn!(directive = %request.name, colony = %cached, "Cached colony no longer exists");
                    Err(self.unresolvable(request))
                }
            };
        }

        let assignment = self
            .by_name_affinity(request, colonies)
            .or_else(|| self.by_ownership(request, colonies))
            .or_else(|| self.by_nearest(request, memory, colonies, oracle));

        match assignment {
            Some(assignment) => {
                info!(
                    directive = %request.name,
                    colony = %assignment.colony,
                    source = ?assignment.source,
                    "Resolved colony"
                );
                memory.colony = Some(assignment.colony.clone());
                Ok(assignment)
            }
            None => Err(self.unresolvable(request)),
        }
    }

    fn by_name_affinity(&self, request: &AssignmentRequest<'_>, colonies: &ColonyRegistry) -> Option<ColonyAssignment> {
        name_affinity(request.name, colonies.names()).map(|colony| ColonyAssignment {
            colony: colony.to_string(),
            source: AssignmentSource::NameAffinity,
        })
    }

    fn by_ownership(&self, request: &AssignmentRequest<'_>, colonies: &ColonyRegistry) -> Option<ColonyAssignment> {
        colonies
            .colony_for_room(&request.pos.room)
            .filter(|colony| (request.filter)(colony))
            .map(|colony| ColonyAssignment {
                colony: colony.name.clone(),
                source: AssignmentSource::Ownership,
            })
    }

    fn by_nearest(
        &self,
        request: &AssignmentRequest<'_>,
        memory: &DirectiveMemory,
        colonies: &ColonyRegistry,
        oracle: &dyn DistanceOracle,
    ) -> Option<ColonyAssignment> {
        engine_metrics().record_nearest_search();

        let max_path_length = memory.max_path_length_or(self.settings.default_max_path_length);
        let max_linear_range = memory.max_linear_range_or(self.settings.default_max_linear_range);
        let options = PathOptions {
            max_ops: self.settings.path_max_ops,
        };

        let mut best: Option<(&Colony, u32)> = None;
        for colony in colonies.iter() {
            if !within_linear_range(&colony.anchor.room, &request.pos.room, max_linear_range, memory.allow_portals) {
                continue;
            }
            if !(request.filter)(colony) {
                continue;
            }

            engine_metrics().record_oracle_query();
            let path = oracle.find_path(&colony.anchor, request.pos, &options);
            if path.incomplete {
                engine_metrics().record_incomplete_path();
                let skipped = DirectiveError::IncompletePath {
                    colony: colony.name.clone(),
                    target: request.pos.clone(),
                };
                debug!(directive = %request.name, "Skipping candidate: {}", skipped);
                continue;
            }

            let length = path.length();
            if is_closer(length, max_path_length, best.map(|(_, current)| current)) {
                best = Some((colony, length));
            }
        }

        best.map(|(colony, path_length)| ColonyAssignment {
            colony: colony.name.clone(),
            source: AssignmentSource::Nearest { path_length },
        })
    }

    fn unresolvable(&self, request: &AssignmentRequest<'_>) -> DirectiveError {
        DirectiveError::ColonyUnresolvable {
            name: request.name.to_string(),
            pos: request.pos.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::traits::MockDistanceOracle;
    use crate::world::PathResult;

    fn path_of(length: usize) -> PathResult {
        PathResult {
            path: vec![Position::new("E0S0", 0, 0); length],
            incomplete: false,
        }
    }

    fn accept_all(_: &Colony) -> bool {
        true
    }

    fn colonies() -> ColonyRegistry {
        let mut registry = ColonyRegistry::new();
        registry.insert(Colony::new("E1S1", Position::new("E1S1", 25, 25)).with_outposts(["E1S2"]));
        registry.insert(Colony::new("E4S1", Position::new("E4S1", 25, 25)));
        registry
    }

    #[test]
    fn test_cached_colony_skips_oracle() {
        let mut oracle = MockDistanceOracle::new();
        oracle.expect_find_path().times(0);

        let pos = Position::new("E9S9", 10, 10);
        let request = AssignmentRequest {
            name: "guard:abc",
            pos: &pos,
            filter: &accept_all,
        };
        let mut memory = DirectiveMemory {
            colony: Some("E4S1".to_string()),
            ..Default::default()
        };

        let assignment = ColonyAssigner::default()
            .assign(&request, &mut memory, &colonies(), &oracle)
            .unwrap();
        assert_eq!(assignment.colony, "E4S1");
        assert_eq!(assignment.source, AssignmentSource::Cached);
    }

    #[test]
    fn test_missing_cached_colony_does_not_fall_through() {
        let mut oracle = MockDistanceOracle::new();
        oracle.expect_find_path().times(0);

        let pos = Position::new("E1S1", 10, 10);
        let request = AssignmentRequest {
            name: "outpost:E1S1",
            pos: &pos,
            filter: &accept_all,
        };
        let mut memory = DirectiveMemory {
            colony: Some("W7N7".to_string()),
            ..Default::default()
        };

        let err = ColonyAssigner::default()
            .assign(&request, &mut memory, &colonies(), &oracle)
            .unwrap_err();
        assert!(matches!(err, DirectiveError::ColonyUnresolvable { .. }));
        assert_eq!(memory.colony.as_deref(), Some("W7N7"));
    }

    #[test]
    fn test_name_affinity_beats_ownership() {
        let oracle = MockDistanceOracle::new();
        let pos = Position::new("E1S2", 10, 10);
        let request = AssignmentRequest {
            name: "outpost:E4S1",
            pos: &pos,
            filter: &accept_all,
        };
        let mut memory = DirectiveMemory::default();

        let assignment = ColonyAssigner::default()
            .assign(&request, &mut memory, &colonies(), &oracle)
            .unwrap();
        assert_eq!(assignment.source, AssignmentSource::NameAffinity);
        assert_eq!(memory.colony.as_deref(), Some("E4S1"));
    }

    #[test]
    fn test_ownership_respects_filter() {
        let mut oracle = MockDistanceOracle::new();
        oracle.expect_find_path().returning(|_, _, _| path_of(40));

        let pos = Position::new("E1S2", 10, 10);
        let reject_e1s1 = |colony: &Colony| colony.name != "E1S1";
        let request = AssignmentRequest {
            name: "guard:abc",
            pos: &pos,
            filter: &reject_e1s1,
        };
        let mut memory = DirectiveMemory::default();

        let assignment = ColonyAssigner::default()
            .assign(&request, &mut memory, &colonies(), &oracle)
            .unwrap();
        assert_eq!(assignment.colony, "E4S1");
        assert_eq!(assignment.source, AssignmentSource::Nearest { path_length: 40 });
    }

    #[test]
    fn test_nearest_prefers_shortest_complete_path_in_range() {
        let mut registry = ColonyRegistry::new();
        registry.insert(Colony::new("E10S10", Position::new("E10S10", 25, 25)));
        registry.insert(Colony::new("E11S10", Position::new("E11S10", 25, 25)));
        registry.insert(Colony::new("E30S10", Position::new("E30S10", 25, 25)));

        let mut oracle = MockDistanceOracle::new();
        oracle
            .expect_find_path()
            .returning(|origin, _, _| match origin.room.as_str() {
                "E10S10" => path_of(50),
                "E11S10" => path_of(30),
                _ => path_of(20),
            });

        let pos = Position::new("E12S12", 5, 5);
        let request = AssignmentRequest {
            name: "guard:xyz",
            pos: &pos,
            filter: &accept_all,
        };
        let mut memory = DirectiveMemory::default();

        let assignment = ColonyAssigner::default()
            .assign(&request, &mut memory, &registry, &oracle)
            .unwrap();
        assert_eq!(assignment.colony, "E11S10");
    }

    #[test]
    fn test_incomplete_and_too_long_paths_fail() {
        let mut oracle = MockDistanceOracle::new();
        oracle
            .expect_find_path()
            .returning(|origin, _, _| match origin.room.as_str() {
                "E1S1" => PathResult {
                    path: Vec::new(),
                    incomplete: true,
                },
                _ => path_of(700),
            });

        let pos = Position::new("E3S3", 5, 5);
        let request = AssignmentRequest {
            name: "guard:xyz",
            pos: &pos,
            filter: &accept_all,
        };
        let mut memory = DirectiveMemory::default();

        let err = ColonyAssigner::default()
            .assign(&request, &mut memory, &colonies(), &oracle)
            .unwrap_err();
        assert!(matches!(err, DirectiveError::ColonyUnresolvable { .. }));
        assert!(memory.colony.is_none());
    }

    #[test]
    fn test_memory_overrides_path_limit() {
        let mut oracle = MockDistanceOracle::new();
        oracle.expect_find_path().returning(|_, _, _| path_of(700));

        let pos = Position::new("E3S3", 5, 5);
        let request = AssignmentRequest {
            name: "guard:xyz",
            pos: &pos,
            filter: &accept_all,
        };
        let mut memory = DirectiveMemory {
            max_path_length: Some(800),
            ..Default::default()
        };

        let assignment = ColonyAssigner::default()
            .assign(&request, &mut memory, &colonies(), &oracle)
            .unwrap();
        // Equal lengths keep the first colony in order
        assert_eq!(assignment.colony, "E1S1");
    }
}
