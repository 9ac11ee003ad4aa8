//! ID types for game content referenced by the quest subsystem.
//!
//! Content ids are strings rather than integers: quest ids embed
//! category/date/tier information that must remain parseable, and
//! monster/item/location ids join objective keys textually.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from a raw value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw ID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the ID, returning the raw string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id! {
    /// Unique identifier for an item type in the game.
    ItemId
}

string_id! {
    /// Unique identifier for a monster type.
    MonsterId
}

string_id! {
    /// Unique identifier for an explorable location.
    LocationId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_roundtrip() {
        let id = ItemId::new("healing_herb");
        assert_eq!(id.as_str(), "healing_herb");
        assert_eq!(id.to_string(), "healing_herb");
        assert_eq!(id.into_inner(), "healing_herb");
    }

    #[test]
    fn test_id_equality() {
        assert_eq!(MonsterId::new("slime"), MonsterId::from("slime"));
        assert_ne!(MonsterId::new("slime"), MonsterId::new("goblin"));
    }

    #[test]
    fn test_location_id_from_string() {
        let id = LocationId::from(String::from("north_cave"));
        assert_eq!(id.as_str(), "north_cave");
    }
}
