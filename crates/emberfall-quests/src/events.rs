//! Routing of game-world events onto quest objective keys.
//!
//! Combat, exploration, and shop collaborators report what happened;
//! the router turns each event into exactly one objective-key update
//! against the lifecycle engine.

use crate::lifecycle::LifecycleEngine;
use crate::objective::{Objective, ObjectiveKind};
use emberfall_common::{ItemId, LocationId, MonsterId};
use serde::{Deserialize, Serialize};

/// A game-world event the quest subsystem reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A monster was defeated
    MonsterDefeated {
        /// Monster type id
        monster: MonsterId,
    },
    /// Items were collected
    ItemCollected {
        /// Item type id
        item: ItemId,
        /// Quantity collected
        quantity: u32,
    },
    /// The player reached a level
    LevelReached {
        /// New player level
        level: u32,
    },
    /// A location was explored
    LocationExplored {
        /// Location id
        location: LocationId,
    },
    /// Custom event keyed directly by objective key
    Custom {
        /// Objective key
        key: String,
        /// Progress amount
        amount: u32,
    },
}

impl WorldEvent {
    /// The objective key this event updates.
    #[must_use]
    pub fn objective_key(&self) -> String {
        match self {
            Self::MonsterDefeated { monster } => {
                Objective::new(ObjectiveKind::Kill, monster.as_str()).key()
            },
            Self::ItemCollected { item, .. } => {
                Objective::new(ObjectiveKind::Collect, item.as_str()).key()
            },
            Self::LevelReached { .. } => Objective::reach_level().key(),
            Self::LocationExplored { location } => {
                Objective::new(ObjectiveKind::Explore, location.as_str()).key()
            },
            Self::Custom { key, .. } => key.clone(),
        }
    }
}

/// Maps world events to progress updates on the lifecycle engine.
#[derive(Debug, Default)]
pub struct ProgressRouter;

impl ProgressRouter {
    /// Creates a router.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Dispatches an event; returns ids of quests it completed.
    pub fn dispatch(&self, engine: &mut LifecycleEngine, event: &WorldEvent) -> Vec<String> {
        let key = event.objective_key();
        match event {
            // Level events carry an absolute total, not a delta.
            WorldEvent::LevelReached { level } => engine.raise_progress(&key, *level),
            WorldEvent::MonsterDefeated { .. } | WorldEvent::LocationExplored { .. } => {
                engine.update_progress(&key, 1)
            },
            WorldEvent::ItemCollected { quantity, .. } => engine.update_progress(&key, *quantity),
            WorldEvent::Custom { amount, .. } => engine.update_progress(&key, *amount),
        }
    }

    /// A monster was defeated.
    pub fn on_monster_defeated(
        &self,
        engine: &mut LifecycleEngine,
        monster: &MonsterId,
    ) -> Vec<String> {
        self.dispatch(
            engine,
            &WorldEvent::MonsterDefeated {
                monster: monster.clone(),
            },
        )
    }

    /// Items were collected.
    pub fn on_item_collected(
        &self,
        engine: &mut LifecycleEngine,
        item: &ItemId,
        quantity: u32,
    ) -> Vec<String> {
        self.dispatch(
            engine,
            &WorldEvent::ItemCollected {
                item: item.clone(),
                quantity,
            },
        )
    }

    /// The player reached a level.
    pub fn on_level_reached(&self, engine: &mut LifecycleEngine, level: u32) -> Vec<String> {
        self.dispatch(engine, &WorldEvent::LevelReached { level })
    }

    /// A location was explored.
    pub fn on_location_explored(
        &self,
        engine: &mut LifecycleEngine,
        location: &LocationId,
    ) -> Vec<String> {
        self.dispatch(
            engine,
            &WorldEvent::LocationExplored {
                location: location.clone(),
            },
        )
    }

    /// A custom event keyed directly by objective key.
    pub fn on_custom_event(
        &self,
        engine: &mut LifecycleEngine,
        key: &str,
        amount: u32,
    ) -> Vec<String> {
        self.dispatch(
            engine,
            &WorldEvent::Custom {
                key: key.to_owned(),
                amount,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::QuestInstance;
    use crate::reward::Reward;
    use crate::template::QuestCategory;
    use std::collections::HashMap;

    fn engine_with(id: &str, key: &str, target: u32) -> LifecycleEngine {
        let mut objectives = HashMap::new();
        objectives.insert(key.to_owned(), target);
        let mut engine = LifecycleEngine::new();
        engine.publish(QuestInstance::new(
            id,
            "Test",
            "Test",
            ObjectiveKind::Kill,
            QuestCategory::Side,
            1,
            objectives,
            Reward::new(),
        ));
        engine.accept(id, 1);
        engine
    }

    #[test]
    fn test_event_keys() {
        assert_eq!(
            WorldEvent::MonsterDefeated {
                monster: MonsterId::new("slime")
            }
            .objective_key(),
            "kill_slime"
        );
        assert_eq!(
            WorldEvent::ItemCollected {
                item: ItemId::new("herb"),
                quantity: 2
            }
            .objective_key(),
            "collect_herb"
        );
        assert_eq!(WorldEvent::LevelReached { level: 9 }.objective_key(), "reach_level");
        assert_eq!(
            WorldEvent::LocationExplored {
                location: LocationId::new("old_mine")
            }
            .objective_key(),
            "explore_old_mine"
        );
    }

    #[test]
    fn test_monster_defeated_increments_by_one() {
        let mut engine = engine_with("q", "kill_slime", 3);
        let router = ProgressRouter::new();
        router.on_monster_defeated(&mut engine, &MonsterId::new("slime"));
        router.on_monster_defeated(&mut engine, &MonsterId::new("goblin"));
        assert_eq!(engine.get("q").map(|q| q.progress("kill_slime")), Some(1));
    }

    #[test]
    fn test_item_collected_uses_quantity() {
        let mut engine = engine_with("q", "collect_herb", 10);
        let router = ProgressRouter::new();
        router.on_item_collected(&mut engine, &ItemId::new("herb"), 4);
        assert_eq!(engine.get("q").map(|q| q.progress("collect_herb")), Some(4));
    }

    #[test]
    fn test_level_reached_is_absolute() {
        let mut engine = engine_with("q", "reach_level", 10);
        let router = ProgressRouter::new();
        router.on_level_reached(&mut engine, 6);
        assert_eq!(engine.get("q").map(|q| q.progress("reach_level")), Some(6));
        // A stale lower event never regresses progress.
        router.on_level_reached(&mut engine, 4);
        assert_eq!(engine.get("q").map(|q| q.progress("reach_level")), Some(6));
        let done = router.on_level_reached(&mut engine, 10);
        assert_eq!(done, vec!["q".to_owned()]);
    }

    #[test]
    fn test_location_explored_completes() {
        let mut engine = engine_with("q", "explore_old_mine", 1);
        let router = ProgressRouter::new();
        let done = router.on_location_explored(&mut engine, &LocationId::new("old_mine"));
        assert_eq!(done, vec!["q".to_owned()]);
    }

    #[test]
    fn test_custom_event() {
        let mut engine = engine_with("q", "ritual_offerings", 3);
        let router = ProgressRouter::new();
        router.on_custom_event(&mut engine, "ritual_offerings", 2);
        assert_eq!(
            engine.get("q").map(|q| q.progress("ritual_offerings")),
            Some(2)
        );
    }
}
