use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::persistence::DirectiveMemory;
use crate::world::{Color, VariantTag};

/// Directive kinds known to the engine, each identified on markers by its tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveVariant {
    /// Reserve and scout a remote room for a colony
    Outpost,
    /// Claim a new room and bootstrap it into a colony
    Colonize,
    /// Keep a defender stationed at a position
    Guard,
}

impl DirectiveVariant {
    pub const ALL: [DirectiveVariant; 3] = [
        DirectiveVariant::Outpost,
        DirectiveVariant::Colonize,
        DirectiveVariant::Guard,
    ];

    pub const fn tag(self) -> VariantTag {
        match self {
            DirectiveVariant::Outpost => VariantTag::new(Color::Purple, Color::Purple),
            DirectiveVariant::Colonize => VariantTag::new(Color::Purple, Color::Grey),
            DirectiveVariant::Guard => VariantTag::new(Color::Blue, Color::Blue),
        }
    }

    pub fn from_tag(tag: VariantTag) -> Option<Self> {
        Self::ALL.into_iter().find(|variant| variant.matches(tag))
    }

    /// Both tag values must be equal
    pub fn matches(self, tag: VariantTag) -> bool {
        self.tag() == tag
    }

    /// Prefix of generated directive names
    pub fn prefix(self) -> &'static str {
        match self {
            DirectiveVariant::Outpost => "outpost",
            DirectiveVariant::Colonize => "colonize",
            DirectiveVariant::Guard => "guard",
        }
    }
}

impl fmt::Display for DirectiveVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// How close two directives must be to count as the same presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceScope {
    #[serde(rename = "room")]
    Room,
    #[serde(rename = "pos")]
    Position,
}

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Initial durable record
    pub memory: Option<DirectiveMemory>,
    /// Explicit name. A random `<variant>:<hex>` name is used otherwise.
    pub name: Option<String>,
    /// Suppress the creation log line
    pub quiet: bool,
}

impl CreateOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_memory(mut self, memory: DirectiveMemory) -> Self {
        self.memory = Some(memory);
        self
    }
}

/// Behavior payload a directive asks its colony to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    pub name: String,
    pub role: String,
    pub colony: String,
    pub priority: u8,
}

impl WorkUnit {
    pub fn new(name: impl Into<String>, role: impl Into<String>, colony: impl Into<String>, priority: u8) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            colony: colony.into(),
            priority,
        }
    }
}

pub type WorkUnits = BTreeMap<String, WorkUnit>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalOutcome {
    Removed,
    Noop,
}

/// What a kind's `run` hook wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Continue,
    Retire,
}
