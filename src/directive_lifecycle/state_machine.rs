use serde::{Deserialize, Serialize};
use statig::prelude::*;

/// Externally visible lifecycle phase of a directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Suspended,
    Pending,
    Bound,
    Active,
    Expired,
    Removed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Expired | Phase::Removed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    Suspend { until: u64 },
    Resume,
    Expire,
    Bind { colony: String },
    Activate,
    /// Drop the colony binding and wait for the next resolution attempt
    Release,
    Remove,
}

#[derive(Debug, Default)]
pub struct DirectiveLifecycle {
    pub name: String,
}

impl DirectiveLifecycle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[state_machine(initial = "State::pending()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl DirectiveLifecycle {
    #[state]
    fn pending(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Suspend { until } => {
                tracing::info!(directive = %self.name, until = until, "Directive suspended");
                Transition(State::suspended())
            }
            LifecycleEvent::Expire => {
                tracing::info!(directive = %self.name, "Directive expired before binding");
                Transition(State::expired())
            }
            LifecycleEvent::Bind { colony } => {
                tracing::info!(directive = %self.name, colony = %colony, "Directive bound");
                Transition(State::bound())
            }
            LifecycleEvent::Remove => Transition(State::removed()),
            _ => Handled,
        }
    }

    #[state]
    fn suspended(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Resume => {
                tracing::info!(directive = %self.name, "Directive resumed");
                Transition(State::pending())
            }
            LifecycleEvent::Expire => {
                tracing::info!(directive = %self.name, "Suspended directive expired");
                Transition(State::expired())
            }
            LifecycleEvent::Remove => Transition(State::removed()),
            _ => Handled,
        }
    }

    #[state]
    fn bound(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Activate => {
                tracing::debug!(directive = %self.name, "Directive active");
                Transition(State::active())
            }
            LifecycleEvent::Release => Transition(State::pending()),
            LifecycleEvent::Expire => Transition(State::expired()),
            LifecycleEvent::Remove => Transition(State::removed()),
            _ => Handled,
        }
    }

    #[state]
    fn active(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Suspend { until } => {
                tracing::info!(directive = %self.name, until = until, "Active directive suspended");
                Transition(State::suspended())
            }
            LifecycleEvent::Expire => {
                tracing::info!(directive = %self.name, "Directive expired");
                Transition(State::expired())
            }
            LifecycleEvent::Release => {
                tracing::info!(directive = %self.name, "Directive released its colony");
                Transition(State::pending())
            }
            LifecycleEvent::Remove => Transition(State::removed()),
            _ => Handled,
        }
    }

    #[state]
    fn expired(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Remove => Transition(State::removed()),
            _ => Handled,
        }
    }

    #[state]
    fn removed(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        tracing::trace!(directive = %self.name, event = ?event, "Ignoring event for removed directive");
        Handled
    }
}

/// Map the machine's current state onto its phase
pub fn phase_of(state: &State) -> Phase {
    match state {
        State::Pending { .. } => Phase::Pending,
        State::Suspended { .. } => Phase::Suspended,
        State::Bound { .. } => Phase::Bound,
        State::Active { .. } => Phase::Active,
        State::Expired { .. } => Phase::Expired,
        State::Removed { .. } => Phase::Removed,
    }
}
