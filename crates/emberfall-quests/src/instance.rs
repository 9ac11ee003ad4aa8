//! Concrete quest instances and their status state machine.

use crate::objective::ObjectiveKind;
use crate::reward::Reward;
use crate::template::QuestCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of a quest instance.
///
/// The happy path is `Available -> Active -> Completed -> Claimed`;
/// `Failed` is an orthogonal terminal state. No transition skips a
/// state, and `Available`/`Claimed` are never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Published but not yet accepted
    #[default]
    Available,
    /// Accepted and tracking progress
    Active,
    /// All objectives satisfied, reward unclaimed
    Completed,
    /// Reward granted
    Claimed,
    /// Expired or otherwise failed
    Failed,
}

impl QuestStatus {
    /// String form used in save records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Claimed => "claimed",
            Self::Failed => "failed",
        }
    }

    /// Parses the save-record string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "claimed" => Some(Self::Claimed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether the status is terminal (no further transitions).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Claimed | Self::Failed)
    }
}

/// A concrete, stateful quest a player can accept and complete.
///
/// Invariants: progress values are monotonically non-decreasing and
/// never exceed their objective target; the status is `Completed`
/// exactly when every objective's progress has reached its target
/// (until the quest is claimed or failed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestInstance {
    /// Quest id (template id, or a synthesized dynamic id)
    pub id: String,
    /// Display title
    pub title: String,
    /// Display description
    pub description: String,
    /// Primary objective kind
    pub kind: ObjectiveKind,
    /// Quest category
    pub category: QuestCategory,
    /// Minimum player level to accept
    pub required_level: u32,
    /// Resolved objectives (objective key -> target count)
    pub objectives: HashMap<String, u32>,
    /// Reward granted on claim
    pub reward: Reward,
    /// Accumulated progress (objective key -> current count)
    progress: HashMap<String, u32>,
    /// Current lifecycle status
    status: QuestStatus,
}

impl QuestInstance {
    /// Creates a new instance in the `Available` state.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: ObjectiveKind,
        category: QuestCategory,
        required_level: u32,
        objectives: HashMap<String, u32>,
        reward: Reward,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            kind,
            category,
            required_level,
            objectives,
            reward,
            progress: HashMap::new(),
            status: QuestStatus::Available,
        }
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> QuestStatus {
        self.status
    }

    /// Returns accumulated progress for an objective key.
    #[must_use]
    pub fn progress(&self, key: &str) -> u32 {
        self.progress.get(key).copied().unwrap_or(0)
    }

    /// Returns the full progress map.
    #[must_use]
    pub const fn progress_map(&self) -> &HashMap<String, u32> {
        &self.progress
    }

    /// Returns (current, target) for an objective key, if tracked.
    #[must_use]
    pub fn objective_status(&self, key: &str) -> Option<(u32, u32)> {
        let target = self.objectives.get(key)?;
        Some((self.progress(key), *target))
    }

    /// Returns whether every objective's progress has reached its target.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.objectives
            .iter()
            .all(|(key, &target)| self.progress(key) >= target)
    }

    /// Transitions `Available -> Active`. Returns false otherwise.
    pub fn activate(&mut self) -> bool {
        if self.status == QuestStatus::Available {
            self.status = QuestStatus::Active;
            true
        } else {
            false
        }
    }

    /// Adds progress toward one objective key, capped at its target.
    ///
    /// Only `Active` quests accumulate progress. Returns true when
    /// this call newly satisfied every objective (the quest moves to
    /// `Completed`).
    pub fn apply_progress(&mut self, key: &str, delta: u32) -> bool {
        if self.status != QuestStatus::Active || delta == 0 {
            return false;
        }
        let Some(&target) = self.objectives.get(key) else {
            return false;
        };
        let current = self.progress(key);
        self.progress
            .insert(key.to_owned(), current.saturating_add(delta).min(target));

        if self.is_satisfied() {
            self.status = QuestStatus::Completed;
            true
        } else {
            false
        }
    }

    /// Sets progress toward one objective to an absolute value, never
    /// decreasing it and capped at the target. Used for level-reached
    /// style events where the event carries a total, not a delta.
    pub fn raise_progress(&mut self, key: &str, value: u32) -> bool {
        if self.status != QuestStatus::Active {
            return false;
        }
        let Some(&target) = self.objectives.get(key) else {
            return false;
        };
        let current = self.progress(key);
        self.progress
            .insert(key.to_owned(), current.max(value).min(target));

        if self.is_satisfied() {
            self.status = QuestStatus::Completed;
            true
        } else {
            false
        }
    }

    /// Transitions `Completed -> Claimed`. Returns false otherwise.
    pub fn claim(&mut self) -> bool {
        if self.status == QuestStatus::Completed {
            self.status = QuestStatus::Claimed;
            true
        } else {
            false
        }
    }

    /// Transitions into the terminal `Failed` state, from any
    /// non-terminal state.
    pub fn fail(&mut self) -> bool {
        if self.status.is_terminal() {
            false
        } else {
            self.status = QuestStatus::Failed;
            true
        }
    }

    /// Overlays saved progress and status onto a freshly constructed
    /// instance. Progress is clamped to each objective's target and
    /// unknown keys are ignored, so a damaged record cannot break the
    /// instance invariants.
    pub(crate) fn overlay_saved(&mut self, progress: &HashMap<String, u32>, status: QuestStatus) {
        for (key, &value) in progress {
            if let Some(&target) = self.objectives.get(key) {
                self.progress.insert(key.clone(), value.min(target));
            }
        }
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Objective;
    use proptest::prelude::*;

    fn kill_quest(target_count: u32) -> QuestInstance {
        let mut objectives = HashMap::new();
        objectives.insert("kill_slime".to_owned(), target_count);
        QuestInstance::new(
            "quest_001",
            "Slime Hunt",
            "Defeat the slimes",
            ObjectiveKind::Kill,
            QuestCategory::Main,
            1,
            objectives,
            Reward::new().with_experience(50).with_currency(100),
        )
    }

    fn two_objective_quest() -> QuestInstance {
        let mut objectives = HashMap::new();
        objectives.insert("kill_slime".to_owned(), 3);
        objectives.insert("collect_herb".to_owned(), 2);
        QuestInstance::new(
            "quest_002",
            "Field Work",
            "Cull and gather",
            ObjectiveKind::Kill,
            QuestCategory::Side,
            1,
            objectives,
            Reward::new(),
        )
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            QuestStatus::Available,
            QuestStatus::Active,
            QuestStatus::Completed,
            QuestStatus::Claimed,
            QuestStatus::Failed,
        ] {
            assert_eq!(QuestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QuestStatus::parse("bogus"), None);
    }

    #[test]
    fn test_new_instance_is_available() {
        let quest = kill_quest(5);
        assert_eq!(quest.status(), QuestStatus::Available);
        assert_eq!(quest.progress("kill_slime"), 0);
        assert!(!quest.is_satisfied());
    }

    #[test]
    fn test_progress_requires_active() {
        let mut quest = kill_quest(5);
        assert!(!quest.apply_progress("kill_slime", 1));
        assert_eq!(quest.progress("kill_slime"), 0);

        assert!(quest.activate());
        quest.apply_progress("kill_slime", 1);
        assert_eq!(quest.progress("kill_slime"), 1);
    }

    #[test]
    fn test_progress_clamps_to_target() {
        let mut quest = kill_quest(5);
        quest.activate();
        quest.apply_progress("kill_slime", 3);
        // Delta larger than remaining-to-target clamps, never overshoots.
        quest.apply_progress("kill_slime", 10);
        assert_eq!(quest.progress("kill_slime"), 5);
    }

    #[test]
    fn test_completion_on_final_delta() {
        let mut quest = kill_quest(5);
        quest.activate();
        assert!(!quest.apply_progress("kill_slime", 4));
        assert_eq!(quest.status(), QuestStatus::Active);
        assert!(quest.apply_progress("kill_slime", 1));
        assert_eq!(quest.status(), QuestStatus::Completed);
    }

    #[test]
    fn test_completion_requires_all_objectives() {
        let mut quest = two_objective_quest();
        quest.activate();
        assert!(!quest.apply_progress("kill_slime", 3));
        assert_eq!(quest.status(), QuestStatus::Active);
        assert!(quest.apply_progress("collect_herb", 2));
        assert_eq!(quest.status(), QuestStatus::Completed);
    }

    #[test]
    fn test_unknown_key_ignored() {
        let mut quest = kill_quest(5);
        quest.activate();
        assert!(!quest.apply_progress("kill_goblin", 5));
        assert_eq!(quest.progress("kill_goblin"), 0);
    }

    #[test]
    fn test_activate_only_from_available() {
        let mut quest = kill_quest(1);
        assert!(quest.activate());
        assert!(!quest.activate());
        quest.apply_progress("kill_slime", 1);
        assert!(!quest.activate());
    }

    #[test]
    fn test_claim_only_from_completed() {
        let mut quest = kill_quest(1);
        assert!(!quest.claim());
        quest.activate();
        assert!(!quest.claim());
        quest.apply_progress("kill_slime", 1);
        assert!(quest.claim());
        assert_eq!(quest.status(), QuestStatus::Claimed);
        assert!(!quest.claim());
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut quest = kill_quest(1);
        quest.activate();
        assert!(quest.fail());
        assert_eq!(quest.status(), QuestStatus::Failed);
        assert!(!quest.activate());
        assert!(!quest.apply_progress("kill_slime", 1));
        assert!(!quest.fail());
    }

    #[test]
    fn test_raise_progress_never_decreases() {
        let mut objectives = HashMap::new();
        objectives.insert(Objective::reach_level().key(), 10);
        let mut quest = QuestInstance::new(
            "quest_levels",
            "Grow Stronger",
            "Reach level 10",
            ObjectiveKind::ReachLevel,
            QuestCategory::Side,
            1,
            objectives,
            Reward::new(),
        );
        quest.activate();
        quest.raise_progress("reach_level", 7);
        assert_eq!(quest.progress("reach_level"), 7);
        quest.raise_progress("reach_level", 4);
        assert_eq!(quest.progress("reach_level"), 7);
        assert!(quest.raise_progress("reach_level", 25));
        assert_eq!(quest.progress("reach_level"), 10);
        assert_eq!(quest.status(), QuestStatus::Completed);
    }

    #[test]
    fn test_overlay_saved_clamps() {
        let mut quest = kill_quest(5);
        let mut saved = HashMap::new();
        saved.insert("kill_slime".to_owned(), 99);
        saved.insert("kill_ghost".to_owned(), 2);
        quest.overlay_saved(&saved, QuestStatus::Active);
        assert_eq!(quest.progress("kill_slime"), 5);
        assert_eq!(quest.progress("kill_ghost"), 0);
        assert_eq!(quest.status(), QuestStatus::Active);
    }

    proptest! {
        /// Random progress sequences never overshoot targets, and the
        /// quest reports Completed exactly when every objective is
        /// satisfied.
        #[test]
        fn prop_progress_capped_and_completion_consistent(
            deltas in prop::collection::vec((0u32..3, 0u32..7), 0..40)
        ) {
            let mut quest = two_objective_quest();
            quest.activate();
            let keys = ["kill_slime", "collect_herb"];

            for (key_idx, delta) in deltas {
                let key = keys[(key_idx % 2) as usize];
                quest.apply_progress(key, delta);

                prop_assert!(quest.progress("kill_slime") <= 3);
                prop_assert!(quest.progress("collect_herb") <= 2);

                let completed = quest.status() == QuestStatus::Completed;
                prop_assert_eq!(completed, quest.is_satisfied());
            }
        }
    }
}
