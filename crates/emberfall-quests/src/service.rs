//! Session-owned quest service.
//!
//! One explicitly constructed object wires the template store,
//! converter, daily generator, lifecycle engine, progress router and
//! reward resolver together. The game session owns it; there are no
//! process-wide singletons.

use crate::convert::TemplateConverter;
use crate::daily::DailyQuestGenerator;
use crate::events::{ProgressRouter, WorldEvent};
use crate::lifecycle::LifecycleEngine;
use crate::reward::{ItemCatalog, QuestInventory, QuestPlayer, RewardResolver};
use crate::save::{PersistenceCodec, QuestRecord, QuestSaveData, RestoreStats};
use crate::template::{QuestCategory, TemplateStore};
use chrono::{Local, NaiveDate};
use tracing::info;

/// The quest subsystem as one injectable service.
#[derive(Debug)]
pub struct QuestService<C> {
    store: TemplateStore,
    converter: TemplateConverter,
    generator: DailyQuestGenerator,
    router: ProgressRouter,
    engine: LifecycleEngine,
    resolver: RewardResolver<C>,
    history: Vec<QuestRecord>,
}

impl<C: ItemCatalog> QuestService<C> {
    /// Creates a service over a loaded template store and item catalog.
    #[must_use]
    pub fn new(store: TemplateStore, catalog: C) -> Self {
        Self::with_converter(store, catalog, TemplateConverter::new())
    }

    /// Creates a service with a caller-provided converter (seeded in
    /// tests for deterministic variable resolution).
    #[must_use]
    pub fn with_converter(store: TemplateStore, catalog: C, converter: TemplateConverter) -> Self {
        Self {
            store,
            converter,
            generator: DailyQuestGenerator::new(),
            router: ProgressRouter::new(),
            engine: LifecycleEngine::new(),
            resolver: RewardResolver::new(catalog),
            history: Vec::new(),
        }
    }

    /// Read access to the lifecycle engine (UI listings, counts).
    #[must_use]
    pub const fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    /// Expired/failed quest records kept for history.
    #[must_use]
    pub fn history(&self) -> &[QuestRecord] {
        &self.history
    }

    /// Publishes every story (main/side) template whose prerequisites
    /// have been claimed and that is not already tracked. Returns the
    /// number of quests newly published.
    pub fn publish_story_quests(&mut self) -> usize {
        let mut published = 0;
        for category in [QuestCategory::Main, QuestCategory::Side] {
            let ready: Vec<String> = self
                .store
                .by_category(category)
                .into_iter()
                .filter(|t| !self.engine.is_tracked(&t.id))
                .filter(|t| t.prerequisites.iter().all(|p| self.engine.is_claimed(p)))
                .map(|t| t.id.clone())
                .collect();
            for id in ready {
                if let Some(template) = self.store.get(&id) {
                    let quest = self.converter.convert(template);
                    if self.engine.publish(quest) {
                        published += 1;
                    }
                }
            }
        }
        published
    }

    /// Generates and publishes the daily quest set for a date.
    /// Re-running on the same day is a no-op because the generated
    /// ids embed the date. Returns the number newly published.
    pub fn refresh_daily_quests(&mut self, player_level: u32, date: NaiveDate) -> usize {
        let mut published = 0;
        for quest in self.generator.generate(player_level, date) {
            if self.engine.publish(quest) {
                published += 1;
            }
        }
        if published > 0 {
            info!(player_level, %date, published, "daily quests refreshed");
        }
        published
    }

    /// [`Self::refresh_daily_quests`] for the local calendar date.
    pub fn refresh_daily_quests_today(&mut self, player_level: u32) -> usize {
        self.refresh_daily_quests(player_level, Local::now().date_naive())
    }

    /// Accepts an available quest for the player.
    pub fn accept(&mut self, quest_id: &str, player: &dyn QuestPlayer) -> bool {
        self.engine.accept(quest_id, player.level())
    }

    /// Claims a completed quest's reward.
    pub fn claim_reward(
        &mut self,
        quest_id: &str,
        player: &mut dyn QuestPlayer,
        inventory: &mut dyn QuestInventory,
    ) -> bool {
        self.engine
            .claim_reward(quest_id, &self.resolver, player, inventory)
    }

    /// Handles a game-world event; returns ids of quests it completed.
    pub fn handle_event(&mut self, event: &WorldEvent) -> Vec<String> {
        self.router.dispatch(&mut self.engine, event)
    }

    /// Captures quest state for embedding in the save document.
    #[must_use]
    pub fn capture_save(&mut self) -> QuestSaveData {
        let codec = PersistenceCodec::new(&self.store, &mut self.converter, &self.generator);
        QuestSaveData::capture(&self.engine, &codec, self.history.clone())
    }

    /// Restores quest state from a save document. Stale daily/weekly
    /// records land in the history log; corrupt records are dropped
    /// individually and never fail the whole load.
    pub fn restore_save(&mut self, save: &QuestSaveData, today: NaiveDate) -> RestoreStats {
        let mut codec = PersistenceCodec::new(&self.store, &mut self.converter, &self.generator);
        save.restore_into(&mut self.engine, &mut codec, today, &mut self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveKind;
    use crate::reward::test_support::{FakeInventory, FakePlayer, OpenCatalog};
    use crate::reward::Reward;
    use crate::template::QuestTemplate;
    use emberfall_common::MonsterId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn story_store() -> TemplateStore {
        TemplateStore::from_templates([
            QuestTemplate::new("quest_001", "First Blood", ObjectiveKind::Kill, QuestCategory::Main)
                .with_objective("kill_slime", 5)
                .with_reward(Reward::new().with_experience(50).with_currency(100)),
            QuestTemplate::new(
                "quest_002",
                "Deeper Trouble",
                ObjectiveKind::Kill,
                QuestCategory::Main,
            )
            .with_objective("kill_cave_bat", 3)
            .with_prerequisite("quest_001"),
        ])
        .expect("valid store")
    }

    fn seeded_service() -> QuestService<OpenCatalog> {
        QuestService::with_converter(story_store(), OpenCatalog, TemplateConverter::with_seed(7))
    }

    #[test]
    fn test_prerequisites_gate_publishing() {
        let mut service = seeded_service();
        assert_eq!(service.publish_story_quests(), 1);
        assert!(service.engine().get("quest_001").is_some());
        assert!(service.engine().get("quest_002").is_none());
    }

    #[test]
    fn test_full_story_quest_flow() {
        let mut service = seeded_service();
        service.publish_story_quests();

        let mut player = FakePlayer::at_level(1);
        let mut inventory = FakeInventory::with_slots(5);

        assert!(service.accept("quest_001", &player));
        for _ in 0..5 {
            service.handle_event(&WorldEvent::MonsterDefeated {
                monster: MonsterId::new("slime"),
            });
        }
        assert!(service.claim_reward("quest_001", &mut player, &mut inventory));
        assert_eq!(player.experience, 50);
        assert_eq!(player.currency, 100);

        // Claiming quest_001 unlocks its dependent.
        assert_eq!(service.publish_story_quests(), 1);
        assert!(service.engine().get("quest_002").is_some());
    }

    #[test]
    fn test_daily_refresh_is_idempotent_same_day() {
        let mut service = seeded_service();
        let today = date(2026, 8, 27);
        assert_eq!(service.refresh_daily_quests(7, today), 3);
        assert_eq!(service.refresh_daily_quests(7, today), 0);
        // Next day brings a fresh set alongside the old ids.
        assert_eq!(service.refresh_daily_quests(7, date(2026, 8, 28)), 3);
    }

    #[test]
    fn test_save_restore_cycle() {
        let today = date(2026, 8, 27);
        let mut service = seeded_service();
        service.publish_story_quests();
        service.refresh_daily_quests(7, today);

        let player = FakePlayer::at_level(7);
        service.accept("quest_001", &player);
        service.accept("daily_kill_20260827_B01", &player);
        service.handle_event(&WorldEvent::MonsterDefeated {
            monster: MonsterId::new("slime"),
        });

        let save = service.capture_save();

        let mut reloaded = seeded_service();
        let stats = reloaded.restore_save(&save, today);
        assert_eq!(stats.restored, 2);
        assert_eq!(stats.dropped, 0);
        assert_eq!(reloaded.engine().active_count(), 2);
        assert_eq!(
            reloaded
                .engine()
                .get("quest_001")
                .map(|q| q.progress("kill_slime")),
            Some(1)
        );
        assert_eq!(
            reloaded
                .engine()
                .get("daily_kill_20260827_B01")
                .map(|q| q.progress("kill_slime")),
            Some(1)
        );
    }

    #[test]
    fn test_restore_expires_stale_dailies() {
        let mut service = seeded_service();
        service.refresh_daily_quests(7, date(2026, 8, 25));
        let player = FakePlayer::at_level(7);
        service.accept("daily_kill_20260825_B01", &player);

        let save = service.capture_save();

        // Loading two days later: the daily is history, not active.
        let mut reloaded = seeded_service();
        let stats = reloaded.restore_save(&save, date(2026, 8, 27));
        assert_eq!(stats.expired, 1);
        assert_eq!(reloaded.engine().active_count(), 0);
        assert!(reloaded
            .history()
            .iter()
            .any(|r| r.id == "daily_kill_20260825_B01"));
    }
}
