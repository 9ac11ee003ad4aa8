//! Objective kinds and objective keys.
//!
//! An objective key is the join key of the whole subsystem: templates,
//! instance progress maps, and event dispatch all meet on it. The
//! legacy form is a plain string (`kill_slime`, `reach_level`); the
//! typed form is [`Objective`], with pure conversions both ways for
//! persistence compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// The kind of countable condition a quest objective tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Defeat monsters of a given type
    Kill,
    /// Collect items of a given type
    Collect,
    /// Reach a player level
    ReachLevel,
    /// Explore a location
    Explore,
    /// Deliver an item to a destination
    Deliver,
}

impl ObjectiveKind {
    /// All kinds, in a stable order.
    pub const ALL: [Self; 5] = [
        Self::Kill,
        Self::Collect,
        Self::ReachLevel,
        Self::Explore,
        Self::Deliver,
    ];

    /// Key prefix used when encoding objectives as legacy strings.
    #[must_use]
    pub const fn action_prefix(self) -> &'static str {
        match self {
            Self::Kill => "kill",
            Self::Collect => "collect",
            Self::ReachLevel => "reach_level",
            Self::Explore => "explore",
            Self::Deliver => "deliver",
        }
    }

    /// Verb used when synthesizing quest titles ("Hunt 5 slime").
    #[must_use]
    pub const fn phrase_verb(self) -> &'static str {
        match self {
            Self::Kill => "Hunt",
            Self::Collect => "Gather",
            Self::ReachLevel => "Reach",
            Self::Explore => "Scout",
            Self::Deliver => "Deliver",
        }
    }

    /// Verb used when synthesizing quest descriptions ("Defeat 5 slime").
    #[must_use]
    pub const fn describe_verb(self) -> &'static str {
        match self {
            Self::Kill => "Defeat",
            Self::Collect => "Collect",
            Self::ReachLevel => "Reach",
            Self::Explore => "Explore",
            Self::Deliver => "Deliver",
        }
    }

    /// Strict parse from a template type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "kill" => Some(Self::Kill),
            "collect" => Some(Self::Collect),
            "reach_level" => Some(Self::ReachLevel),
            "explore" => Some(Self::Explore),
            "deliver" => Some(Self::Deliver),
            _ => None,
        }
    }

    /// Lenient parse used at the template-loading boundary.
    ///
    /// A malformed template degrades rather than crashes quest
    /// generation: unknown names fall back to [`ObjectiveKind::Kill`]
    /// and log a warning.
    #[must_use]
    pub fn from_name_lossy(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warn!(kind = name, "unknown objective kind, defaulting to kill");
            Self::Kill
        })
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_prefix())
    }
}

/// A typed objective: what to do, and to/with what.
///
/// For [`ObjectiveKind::ReachLevel`] the target is empty; the key
/// carries no payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Objective {
    /// Objective kind
    pub kind: ObjectiveKind,
    /// Target identifier (monster, item, or location id)
    pub target: String,
}

impl Objective {
    /// Creates a new objective.
    #[must_use]
    pub fn new(kind: ObjectiveKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }

    /// Creates a reach-level objective (no target payload).
    #[must_use]
    pub fn reach_level() -> Self {
        Self::new(ObjectiveKind::ReachLevel, "")
    }

    /// Encodes this objective as its legacy string key.
    #[must_use]
    pub fn key(&self) -> String {
        match self.kind {
            ObjectiveKind::ReachLevel => ObjectiveKind::ReachLevel.action_prefix().to_owned(),
            kind => format!("{}_{}", kind.action_prefix(), self.target),
        }
    }

    /// Decodes a legacy string key back into a typed objective.
    ///
    /// Returns `None` for keys that match no known prefix; such keys
    /// still flow through progress maps untyped (custom events).
    #[must_use]
    pub fn parse_key(key: &str) -> Option<Self> {
        if key == ObjectiveKind::ReachLevel.action_prefix() {
            return Some(Self::reach_level());
        }
        for kind in [
            ObjectiveKind::Kill,
            ObjectiveKind::Collect,
            ObjectiveKind::Explore,
            ObjectiveKind::Deliver,
        ] {
            if let Some(target) = key.strip_prefix(kind.action_prefix()) {
                if let Some(target) = target.strip_prefix('_') {
                    if !target.is_empty() {
                        return Some(Self::new(kind, target));
                    }
                }
            }
        }
        None
    }
}
