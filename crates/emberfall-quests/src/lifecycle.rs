//! Quest lifecycle engine.
//!
//! Holds the available / active / completed-unclaimed collections and
//! the claimed history, and implements accept, progress broadcast,
//! completion detection, and reward claiming.

use crate::instance::{QuestInstance, QuestStatus};
use crate::reward::{ItemCatalog, QuestInventory, QuestPlayer, RewardResolver};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// The quest lifecycle state machine.
///
/// Precondition failures (wrong status, level too low) are user-facing
/// UI decision points, not programming errors: operations return
/// `false` rather than an error.
#[derive(Debug, Default)]
pub struct LifecycleEngine {
    /// Published, not yet accepted
    available: HashMap<String, QuestInstance>,
    /// Accepted, tracking progress
    active: HashMap<String, QuestInstance>,
    /// All objectives satisfied, reward unclaimed
    completed: HashMap<String, QuestInstance>,
    /// Historical record of quests whose rewards were claimed
    claimed: HashSet<String>,
}

impl LifecycleEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a quest into the available set.
    ///
    /// An id already tracked anywhere (including already claimed) is
    /// a no-op returning false; this is what makes same-day daily
    /// regeneration idempotent.
    pub fn publish(&mut self, quest: QuestInstance) -> bool {
        if self.is_tracked(&quest.id) {
            debug!(quest = %quest.id, "publish skipped, id already tracked");
            return false;
        }
        self.available.insert(quest.id.clone(), quest);
        true
    }

    /// Returns whether an id is known to any collection.
    #[must_use]
    pub fn is_tracked(&self, id: &str) -> bool {
        self.available.contains_key(id)
            || self.active.contains_key(id)
            || self.completed.contains_key(id)
            || self.claimed.contains(id)
    }

    /// Accepts an available quest: `Available -> Active`, guarded by
    /// the player's level. Returns false when the quest is missing,
    /// not available, or the level requirement is unmet.
    pub fn accept(&mut self, id: &str, player_level: u32) -> bool {
        let Some(quest) = self.available.get(id) else {
            return false;
        };
        if player_level < quest.required_level {
            debug!(
                quest = %id,
                player_level,
                required = quest.required_level,
                "accept refused, level too low"
            );
            return false;
        }
        let Some(mut quest) = self.available.remove(id) else {
            return false;
        };
        if !quest.activate() {
            return false;
        }
        info!(quest = %id, "quest accepted");
        self.active.insert(quest.id.clone(), quest);
        true
    }

    /// Adds progress toward one objective key on every active quest
    /// that tracks it. Quests satisfied by this update move to the
    /// completed set; every matching quest completes (not just the
    /// first match). Returns the ids of newly completed quests.
    pub fn update_progress(&mut self, key: &str, delta: u32) -> Vec<String> {
        self.broadcast(|quest| quest.apply_progress(key, delta))
    }

    /// Raises progress toward one objective key to an absolute value
    /// on every active quest that tracks it (level-reached events).
    /// Returns the ids of newly completed quests.
    pub fn raise_progress(&mut self, key: &str, value: u32) -> Vec<String> {
        self.broadcast(|quest| quest.raise_progress(key, value))
    }

    fn broadcast(&mut self, mut update: impl FnMut(&mut QuestInstance) -> bool) -> Vec<String> {
        let mut newly_completed = Vec::new();
        for (id, quest) in &mut self.active {
            if update(quest) {
                newly_completed.push(id.clone());
            }
        }
        for id in &newly_completed {
            if let Some(quest) = self.active.remove(id) {
                info!(quest = %id, "quest completed");
                self.completed.insert(id.clone(), quest);
            }
        }
        newly_completed
    }

    /// Claims the reward of a completed quest. Only valid from
    /// `Completed`; on grant failure (inventory full) the quest stays
    /// completed so the player can retry. Experience and currency
    /// already granted by a failed claim are not rolled back.
    pub fn claim_reward<C: ItemCatalog>(
        &mut self,
        id: &str,
        resolver: &RewardResolver<C>,
        player: &mut dyn QuestPlayer,
        inventory: &mut dyn QuestInventory,
    ) -> bool {
        let Some(quest) = self.completed.get(id) else {
            return false;
        };
        if !resolver.grant(&quest.reward, player, inventory) {
            debug!(quest = %id, "reward grant incomplete, quest stays claimable");
            return false;
        }
        if let Some(mut quest) = self.completed.remove(id) {
            quest.claim();
            self.claimed.insert(quest.id);
            info!(quest = %id, "reward claimed");
        }
        true
    }

    /// Fails a quest out of the available or active set (expiry,
    /// story branch). Returns the failed instance for history.
    pub fn fail(&mut self, id: &str) -> Option<QuestInstance> {
        let mut quest = self
            .available
            .remove(id)
            .or_else(|| self.active.remove(id))?;
        quest.fail();
        info!(quest = %id, "quest failed");
        Some(quest)
    }

    /// Returns whether a quest's reward has been claimed.
    #[must_use]
    pub fn is_claimed(&self, id: &str) -> bool {
        self.claimed.contains(id)
    }

    /// Looks up a tracked quest instance in any live collection.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&QuestInstance> {
        self.available
            .get(id)
            .or_else(|| self.active.get(id))
            .or_else(|| self.completed.get(id))
    }

    /// Number of available quests.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Number of active quests.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of completed, unclaimed quests.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Iterates over available quests.
    pub fn iter_available(&self) -> impl Iterator<Item = &QuestInstance> {
        self.available.values()
    }

    /// Iterates over active quests.
    pub fn iter_active(&self) -> impl Iterator<Item = &QuestInstance> {
        self.active.values()
    }

    /// Iterates over completed, unclaimed quests.
    pub fn iter_completed(&self) -> impl Iterator<Item = &QuestInstance> {
        self.completed.values()
    }

    /// Iterates over claimed quest ids.
    pub fn iter_claimed(&self) -> impl Iterator<Item = &str> {
        self.claimed.iter().map(String::as_str)
    }

    /// Re-inserts a restored instance into the collection matching its
    /// status. Claimed/failed instances are recorded by id only.
    pub(crate) fn insert_restored(&mut self, quest: QuestInstance) {
        match quest.status() {
            QuestStatus::Available => {
                self.available.insert(quest.id.clone(), quest);
            },
            QuestStatus::Active => {
                self.active.insert(quest.id.clone(), quest);
            },
            QuestStatus::Completed => {
                self.completed.insert(quest.id.clone(), quest);
            },
            QuestStatus::Claimed => {
                self.claimed.insert(quest.id);
            },
            // Failed quests live in the save history, not the engine.
            QuestStatus::Failed => {},
        }
    }

    /// Restores the claimed-id history.
    pub(crate) fn restore_claimed(&mut self, ids: impl IntoIterator<Item = String>) {
        self.claimed.extend(ids);
    }
}
