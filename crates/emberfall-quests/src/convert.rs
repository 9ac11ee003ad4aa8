//! Template-to-instance conversion.
//!
//! Fixed templates convert deterministically. Variable templates
//! resolve one random target and a random quantity, then synthesize
//! the objective key and display text. Repeatable (daily/weekly)
//! templates get a fresh timestamped id so each generation cycle
//! yields a distinct instance.

use crate::instance::QuestInstance;
use crate::objective::{Objective, ObjectiveKind};
use crate::template::{QuantityRange, QuestTemplate};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Converts quest templates into concrete instances.
///
/// Owns its RNG; constructed and injected by the session rather than
/// accessed through a global, so tests can seed it.
#[derive(Debug)]
pub struct TemplateConverter {
    rng: fastrand::Rng,
}

impl Default for TemplateConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateConverter {
    /// Creates a converter with an OS-seeded RNG.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Creates a converter with a fixed seed (deterministic tests).
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Expands a template into a concrete quest instance.
    pub fn convert(&mut self, template: &QuestTemplate) -> QuestInstance {
        let (objectives, resolved) = self.resolve_objectives(template);

        let (title, description) = match &resolved {
            Some((target, quantity)) => synthesize_text(template.kind, target, *quantity),
            None => (template.title.clone(), template.description.clone()),
        };

        QuestInstance::new(
            self.instance_id(template),
            title,
            description,
            template.kind,
            template.category,
            template.required_level,
            objectives,
            template.reward.clone(),
        )
    }

    /// Resolves the objective map, returning the (target, quantity)
    /// pair when a variable substitution happened.
    fn resolve_objectives(
        &mut self,
        template: &QuestTemplate,
    ) -> (HashMap<String, u32>, Option<(String, u32)>) {
        if !template.is_variable() {
            return (template.objectives.clone(), None);
        }

        let quantity = template
            .variable_quantity
            .map_or(1, |range| self.roll_quantity(range));

        if template.variable_targets.is_empty() {
            // Quantity-only variability: re-roll the counts on the
            // template's fixed keys.
            let objectives = template
                .objectives
                .keys()
                .map(|key| (key.clone(), quantity))
                .collect();
            return (objectives, None);
        }

        let index = self.rng.usize(..template.variable_targets.len());
        let target = template.variable_targets[index].clone();
        let key = Objective::new(template.kind, target.as_str()).key();

        let mut objectives = HashMap::new();
        objectives.insert(key, quantity);
        (objectives, Some((target, quantity)))
    }

    /// Rolls a quantity uniformly in `[min, max]` inclusive; a
    /// degenerate range yields `min`.
    fn roll_quantity(&mut self, range: QuantityRange) -> u32 {
        if range.min >= range.max {
            range.min
        } else {
            self.rng.u32(range.min..=range.max)
        }
    }

    /// Returns the instance id: the template id for one-shot quests,
    /// a fresh `{category}_{kind}_{epochMillis}` id for repeatable
    /// cyclic templates.
    fn instance_id(&self, template: &QuestTemplate) -> String {
        if template.repeatable && template.category.is_cyclic() {
            format!(
                "{}_{}_{}",
                template.category.as_str(),
                template.kind.action_prefix(),
                epoch_millis()
            )
        } else {
            template.id.clone()
        }
    }
}

/// Synthesizes title and description for a resolved variable objective.
pub(crate) fn synthesize_text(kind: ObjectiveKind, target: &str, quantity: u32) -> (String, String) {
    let display_target = target.replace('_', " ");
    match kind {
        ObjectiveKind::ReachLevel => (
            format!("Reach level {quantity}"),
            format!("Grow strong enough to reach level {quantity}."),
        ),
        kind => (
            format!("{} {quantity} {display_target}", kind.phrase_verb()),
            format!("{} {quantity} {display_target}.", kind.describe_verb()),
        ),
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::Reward;
    use crate::template::QuestCategory;

    fn fixed_template() -> QuestTemplate {
        QuestTemplate::new("quest_001", "First Blood", ObjectiveKind::Kill, QuestCategory::Main)
            .with_description("Defeat the slimes menacing the farm.")
            .with_objective("kill_slime", 5)
            .with_reward(Reward::new().with_experience(50).with_currency(100))
    }

    fn variable_template() -> QuestTemplate {
        QuestTemplate::new(
            "quest_daily_gather",
            "Herbalist's Request",
            ObjectiveKind::Collect,
            QuestCategory::Daily,
        )
        .with_variable_targets(vec!["healing_herb".to_owned(), "moon_blossom".to_owned()])
        .with_variable_quantity(3, 8)
    }

    #[test]
    fn test_fixed_template_is_deterministic() {
        let template = fixed_template();
        let mut converter = TemplateConverter::with_seed(7);
        let a = converter.convert(&template);
        let b = converter.convert(&template);

        assert_eq!(a.id, "quest_001");
        assert_eq!(a.objectives, template.objectives);
        assert_eq!(a.objectives, b.objectives);
        assert_eq!(a.title, "First Blood");
        assert_eq!(a.reward.experience, 50);
    }

    #[test]
    fn test_variable_quantity_in_range() {
        let template = variable_template();
        let mut converter = TemplateConverter::with_seed(42);
        for _ in 0..50 {
            let quest = converter.convert(&template);
            assert_eq!(quest.objectives.len(), 1);
            let (key, &count) = quest.objectives.iter().next().expect("one objective");
            assert!(key == "collect_healing_herb" || key == "collect_moon_blossom");
            assert!((3..=8).contains(&count), "quantity {count} out of range");
        }
    }

    #[test]
    fn test_degenerate_range_yields_min() {
        let template = variable_template().with_variable_quantity(6, 2);
        let mut converter = TemplateConverter::with_seed(1);
        for _ in 0..10 {
            let quest = converter.convert(&template);
            let (_, &count) = quest.objectives.iter().next().expect("one objective");
            assert_eq!(count, 6);
        }
    }

    #[test]
    fn test_synthesized_text() {
        let template = variable_template();
        let mut converter = TemplateConverter::with_seed(3);
        let quest = converter.convert(&template);
        let (key, &count) = quest.objectives.iter().next().expect("one objective");
        let target = key.strip_prefix("collect_").expect("collect key");
        let display = target.replace('_', " ");
        assert_eq!(quest.title, format!("Gather {count} {display}"));
        assert_eq!(quest.description, format!("Collect {count} {display}."));
    }

    #[test]
    fn test_repeatable_gets_fresh_id() {
        let template = variable_template();
        let mut converter = TemplateConverter::with_seed(9);
        let quest = converter.convert(&template);
        assert!(
            quest.id.starts_with("daily_collect_"),
            "unexpected id {}",
            quest.id
        );
        assert_ne!(quest.id, template.id);
    }

    #[test]
    fn test_non_cyclic_keeps_template_id() {
        let template = fixed_template().repeatable(true);
        let mut converter = TemplateConverter::with_seed(9);
        // Repeatable but Main category: id stays stable.
        assert_eq!(converter.convert(&template).id, "quest_001");
    }

    #[test]
    fn test_quantity_only_variability_rerolls_counts() {
        let template = QuestTemplate::new(
            "quest_cull",
            "Cull the Pack",
            ObjectiveKind::Kill,
            QuestCategory::Side,
        )
        .with_objective("kill_wolf", 1)
        .with_variable_quantity(4, 4);

        let mut converter = TemplateConverter::with_seed(5);
        let quest = converter.convert(&template);
        assert_eq!(quest.objectives.get("kill_wolf"), Some(&4));
        // Fixed title survives when no target substitution happened.
        assert_eq!(quest.title, "Cull the Pack");
    }

    #[test]
    fn test_reach_level_text() {
        let (title, description) = synthesize_text(ObjectiveKind::ReachLevel, "", 10);
        assert_eq!(title, "Reach level 10");
        assert!(description.contains("level 10"));
    }
}
