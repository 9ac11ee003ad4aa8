//! Quest rewards and the resolver that grants them.
//!
//! The resolver talks to the rest of the game through narrow traits:
//! the player stat model, the inventory, and the item catalog are all
//! external collaborators injected by the session.

use emberfall_common::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A reward granted when a quest is claimed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Experience points
    #[serde(default)]
    pub experience: u32,
    /// Currency (gold)
    #[serde(default)]
    pub currency: u32,
    /// Item rewards (item id -> quantity, quantity >= 1)
    #[serde(default)]
    pub items: HashMap<ItemId, u32>,
}

impl Reward {
    /// Creates an empty reward.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the experience component.
    #[must_use]
    pub const fn with_experience(mut self, amount: u32) -> Self {
        self.experience = amount;
        self
    }

    /// Sets the currency component.
    #[must_use]
    pub const fn with_currency(mut self, amount: u32) -> Self {
        self.currency = amount;
        self
    }

    /// Adds an item reward. Zero quantities are ignored.
    #[must_use]
    pub fn with_item(mut self, item: ItemId, quantity: u32) -> Self {
        if quantity > 0 {
            self.items.insert(item, quantity);
        }
        self
    }

    /// Returns whether the reward grants nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experience == 0 && self.currency == 0 && self.items.is_empty()
    }
}

/// Player-side operations the quest subsystem is allowed to perform.
pub trait QuestPlayer {
    /// Grants experience (may trigger a level-up inside the player model).
    fn grant_experience(&mut self, amount: u32);

    /// Grants currency.
    fn grant_currency(&mut self, amount: u32);

    /// Returns the player's current level.
    fn level(&self) -> u32;
}

/// Inventory-side operations the quest subsystem is allowed to perform.
pub trait QuestInventory {
    /// Attempts to add items; returns false when there is no space.
    fn try_add_item(&mut self, item: &ItemId, quantity: u32) -> bool;
}

/// Catalog of item definitions, used to validate reward item ids
/// before attempting inventory insertion.
pub trait ItemCatalog {
    /// Returns whether an item id names a real item.
    fn exists(&self, item: &ItemId) -> bool;
}

/// Grants rewards against a player and inventory.
#[derive(Debug)]
pub struct RewardResolver<C> {
    catalog: C,
}

impl<C: ItemCatalog> RewardResolver<C> {
    /// Creates a resolver backed by the given item catalog.
    #[must_use]
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Grants a reward. Returns true only when every component landed.
    ///
    /// Order: experience, currency, then items. Experience and
    /// currency already granted are not rolled back when a later item
    /// insertion fails; the caller keeps the quest claimable so the
    /// player can free space and retry.
    pub fn grant(
        &self,
        reward: &Reward,
        player: &mut dyn QuestPlayer,
        inventory: &mut dyn QuestInventory,
    ) -> bool {
        if reward.experience > 0 {
            player.grant_experience(reward.experience);
        }
        if reward.currency > 0 {
            player.grant_currency(reward.currency);
        }

        let mut all_granted = true;
        for (item, &quantity) in &reward.items {
            if !self.catalog.exists(item) {
                warn!(item = %item, "reward item not in catalog, skipping grant");
                all_granted = false;
                continue;
            }
            if !inventory.try_add_item(item, quantity) {
                warn!(item = %item, quantity, "inventory rejected reward item");
                all_granted = false;
            }
        }

        debug!(
            experience = reward.experience,
            currency = reward.currency,
            items = reward.items.len(),
            complete = all_granted,
            "reward grant resolved"
        );
        all_granted
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{FakeCatalog, FakeInventory, FakePlayer, OpenCatalog};
    use super::*;

    #[test]
    fn test_reward_builder() {
        let reward = Reward::new()
            .with_experience(50)
            .with_currency(100)
            .with_item(ItemId::new("potion"), 3);
        assert_eq!(reward.experience, 50);
        assert_eq!(reward.currency, 100);
        assert_eq!(reward.items.get(&ItemId::new("potion")), Some(&3));
    }

    #[test]
    fn test_reward_empty() {
        assert!(Reward::new().is_empty());
        assert!(!Reward::new().with_experience(1).is_empty());
        assert!(!Reward::new().with_currency(1).is_empty());
        assert!(!Reward::new().with_item(ItemId::new("potion"), 1).is_empty());
        // Zero-quantity items do not count
        assert!(Reward::new().with_item(ItemId::new("potion"), 0).is_empty());
    }

    #[test]
    fn test_grant_full_success() {
        let resolver = RewardResolver::new(OpenCatalog);
        let reward = Reward::new()
            .with_experience(50)
            .with_currency(100)
            .with_item(ItemId::new("potion"), 2);
        let mut player = FakePlayer::at_level(1);
        let mut inventory = FakeInventory::with_slots(5);

        assert!(resolver.grant(&reward, &mut player, &mut inventory));
        assert_eq!(player.experience, 50);
        assert_eq!(player.currency, 100);
        assert_eq!(inventory.items.len(), 1);
    }

    #[test]
    fn test_grant_inventory_full_keeps_exp_and_gold() {
        let resolver = RewardResolver::new(OpenCatalog);
        let reward = Reward::new()
            .with_experience(50)
            .with_currency(100)
            .with_item(ItemId::new("potion"), 2);
        let mut player = FakePlayer::at_level(1);
        let mut inventory = FakeInventory::with_slots(0);

        assert!(!resolver.grant(&reward, &mut player, &mut inventory));
        // Partial-failure policy: already-granted exp/gold stay granted.
        assert_eq!(player.experience, 50);
        assert_eq!(player.currency, 100);
        assert!(inventory.items.is_empty());
    }

    #[test]
    fn test_grant_unknown_item_fails_gracefully() {
        let resolver = RewardResolver::new(FakeCatalog::with_items(&["potion"]));
        let reward = Reward::new()
            .with_item(ItemId::new("potion"), 1)
            .with_item(ItemId::new("sword_of_nothing"), 1);
        let mut player = FakePlayer::at_level(1);
        let mut inventory = FakeInventory::with_slots(5);

        assert!(!resolver.grant(&reward, &mut player, &mut inventory));
        // The known item still lands.
        assert_eq!(inventory.items.len(), 1);
        assert_eq!(inventory.items[0].0, ItemId::new("potion"));
    }

    #[test]
    fn test_grant_empty_reward_succeeds() {
        let resolver = RewardResolver::new(OpenCatalog);
        let mut player = FakePlayer::at_level(1);
        let mut inventory = FakeInventory::with_slots(0);
        assert!(resolver.grant(&Reward::new(), &mut player, &mut inventory));
        assert_eq!(player.experience, 0);
    }
}
