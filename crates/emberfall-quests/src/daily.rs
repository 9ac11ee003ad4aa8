//! Tiered daily quest generation.
//!
//! Daily quests come from fixed per-tier tables rather than templates:
//! a player's level selects one of five tiers, each with its own hunt
//! and gather targets and baseline rewards. Generation is
//! deterministic for a given (tier, date), and the generated id
//! embeds kind, date, tier and sequence so a saved id alone is enough
//! to rebuild the quest or classify it as expired.

use crate::instance::QuestInstance;
use crate::objective::{Objective, ObjectiveKind};
use crate::reward::Reward;
use crate::template::QuestCategory;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

/// Experience gained per player level on top of the tier baseline.
pub const EXP_COEFFICIENT: u32 = 8;

/// Gold gained per player level on top of the tier baseline.
pub const GOLD_COEFFICIENT: u32 = 5;

/// Tiers whose minimum level is at least this get a bonus dungeon quest.
pub const HIGH_TIER_MIN_LEVEL: u32 = 41;

/// Date format embedded in daily quest ids.
const ID_DATE_FORMAT: &str = "%Y%m%d";

/// A hunt target entry in a tier table.
#[derive(Debug, Clone, Copy)]
struct HuntEntry {
    monster: &'static str,
    count: u32,
    exp: u32,
    gold: u32,
}

/// The gather target entry in a tier table.
#[derive(Debug, Clone, Copy)]
struct GatherEntry {
    item: &'static str,
    count: u32,
    exp: u32,
    gold: u32,
}

/// A difficulty tier: a level-range bucket of daily content.
#[derive(Debug)]
pub struct Tier {
    /// Display name
    pub name: &'static str,
    /// Single-letter code embedded in quest ids
    pub code: char,
    /// Minimum level of the bucket
    pub min_level: u32,
    /// Maximum level of the bucket
    pub max_level: u32,
    hunts: &'static [HuntEntry],
    gather: GatherEntry,
    dungeon: &'static str,
}

/// The five fixed tiers, ordered by level range.
static TIERS: [Tier; 5] = [
    Tier {
        name: "Bronze",
        code: 'B',
        min_level: 1,
        max_level: 10,
        hunts: &[
            HuntEntry { monster: "slime", count: 8, exp: 40, gold: 25 },
            HuntEntry { monster: "cave_bat", count: 6, exp: 45, gold: 30 },
        ],
        gather: GatherEntry { item: "healing_herb", count: 5, exp: 35, gold: 20 },
        dungeon: "old_mine",
    },
    Tier {
        name: "Silver",
        code: 'S',
        min_level: 11,
        max_level: 20,
        hunts: &[
            HuntEntry { monster: "goblin", count: 8, exp: 90, gold: 60 },
            HuntEntry { monster: "forest_wolf", count: 6, exp: 100, gold: 70 },
        ],
        gather: GatherEntry { item: "iron_ore", count: 6, exp: 80, gold: 55 },
        dungeon: "sunken_crypt",
    },
    Tier {
        name: "Gold",
        code: 'G',
        min_level: 21,
        max_level: 30,
        hunts: &[
            HuntEntry { monster: "orc_warrior", count: 7, exp: 180, gold: 120 },
            HuntEntry { monster: "stone_golem", count: 5, exp: 200, gold: 140 },
        ],
        gather: GatherEntry { item: "mythril_shard", count: 4, exp: 160, gold: 110 },
        dungeon: "ember_caverns",
    },
    Tier {
        name: "Platinum",
        code: 'P',
        min_level: 31,
        max_level: 40,
        hunts: &[
            HuntEntry { monster: "wyvern", count: 6, exp: 320, gold: 210 },
            HuntEntry { monster: "dark_knight", count: 5, exp: 350, gold: 230 },
        ],
        gather: GatherEntry { item: "dragon_scale", count: 4, exp: 280, gold: 190 },
        dungeon: "shattered_spire",
    },
    Tier {
        name: "Diamond",
        code: 'D',
        min_level: 41,
        max_level: 50,
        hunts: &[
            HuntEntry { monster: "void_reaper", count: 4, exp: 520, gold: 340 },
            HuntEntry { monster: "elder_dragon", count: 3, exp: 600, gold: 400 },
        ],
        gather: GatherEntry { item: "celestial_essence", count: 3, exp: 460, gold: 300 },
        dungeon: "abyssal_depths",
    },
];

/// Returns the tier for a player level, clamping levels outside 1-50
/// into the nearest bucket.
#[must_use]
pub fn tier_for_level(player_level: u32) -> &'static Tier {
    TIERS
        .iter()
        .find(|tier| player_level <= tier.max_level)
        .unwrap_or(&TIERS[4])
}

/// Returns the tier with the given id code.
#[must_use]
pub fn tier_for_code(code: char) -> Option<&'static Tier> {
    TIERS.iter().find(|tier| tier.code == code)
}

/// Parsed form of a dynamic daily quest id:
/// `daily_{kind}_{yyyyMMdd}_{tierCode}{sequence:02}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyQuestId {
    /// Objective kind of the quest
    pub kind: ObjectiveKind,
    /// Date the quest was generated
    pub date: NaiveDate,
    /// Tier code
    pub tier_code: char,
    /// Sequence within the day's generation (1-based)
    pub sequence: u32,
}

impl DailyQuestId {
    /// Creates a new daily quest id.
    #[must_use]
    pub const fn new(kind: ObjectiveKind, date: NaiveDate, tier_code: char, sequence: u32) -> Self {
        Self {
            kind,
            date,
            tier_code,
            sequence,
        }
    }

    /// Parses an id string; `None` when it is not a daily id.
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        let rest = id.strip_prefix("daily_")?;
        // Kind prefixes may themselves contain underscores, so match
        // against known prefixes instead of splitting.
        let (kind, rest) = ObjectiveKind::ALL.iter().find_map(|&kind| {
            rest.strip_prefix(kind.action_prefix())
                .and_then(|r| r.strip_prefix('_'))
                .map(|r| (kind, r))
        })?;

        let (date_part, tail) = rest.split_once('_')?;
        let date = NaiveDate::parse_from_str(date_part, ID_DATE_FORMAT).ok()?;

        let mut chars = tail.chars();
        let tier_code = chars.next()?;
        tier_for_code(tier_code)?;
        let digits = chars.as_str();
        // u32::from_str accepts a leading `+`; the sequence is exactly
        // two ASCII digits.
        if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let sequence: u32 = digits.parse().ok()?;

        Some(Self::new(kind, date, tier_code, sequence))
    }
}

impl fmt::Display for DailyQuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "daily_{}_{}_{}{:02}",
            self.kind.action_prefix(),
            self.date.format(ID_DATE_FORMAT),
            self.tier_code,
            self.sequence
        )
    }
}

/// Generates the fixed daily quest set for a player level and date.
#[derive(Debug, Default)]
pub struct DailyQuestGenerator;

impl DailyQuestGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generates the day's quests: one kill quest per hunt entry, one
    /// collect quest, and a bonus dungeon quest for the highest tier.
    #[must_use]
    pub fn generate(&self, player_level: u32, date: NaiveDate) -> Vec<QuestInstance> {
        let tier = tier_for_level(player_level);
        self.generate_for_tier(tier, player_level, date)
    }

    /// Rebuilds a single quest from its parsed id. The reward is
    /// re-scaled against the given player level; everything else is
    /// fixed by the id's tier and sequence.
    #[must_use]
    pub fn rebuild(&self, id: &DailyQuestId, player_level: u32) -> Option<QuestInstance> {
        let tier = tier_for_code(id.tier_code)?;
        self.generate_for_tier(tier, player_level, id.date)
            .into_iter()
            .find(|quest| quest.id == id.to_string())
    }

    fn generate_for_tier(
        &self,
        tier: &'static Tier,
        player_level: u32,
        date: NaiveDate,
    ) -> Vec<QuestInstance> {
        let mut quests = Vec::new();
        let mut sequence = 0u32;

        for hunt in tier.hunts {
            sequence += 1;
            quests.push(self.hunt_quest(tier, hunt, player_level, date, sequence));
        }

        sequence += 1;
        quests.push(self.gather_quest(tier, player_level, date, sequence));

        if tier.min_level >= HIGH_TIER_MIN_LEVEL {
            sequence += 1;
            quests.push(self.dungeon_quest(tier, player_level, date, sequence));
        }

        quests
    }

    fn hunt_quest(
        &self,
        tier: &'static Tier,
        hunt: &HuntEntry,
        player_level: u32,
        date: NaiveDate,
        sequence: u32,
    ) -> QuestInstance {
        let id = DailyQuestId::new(ObjectiveKind::Kill, date, tier.code, sequence);
        let display = hunt.monster.replace('_', " ");
        let mut objectives = HashMap::new();
        objectives.insert(
            Objective::new(ObjectiveKind::Kill, hunt.monster).key(),
            hunt.count,
        );
        QuestInstance::new(
            id.to_string(),
            format!("Hunt {} {display}", hunt.count),
            format!("Defeat {} {display} before the day ends.", hunt.count),
            ObjectiveKind::Kill,
            QuestCategory::Daily,
            tier.min_level,
            objectives,
            scaled_reward(hunt.exp, hunt.gold, player_level),
        )
    }

    fn gather_quest(
        &self,
        tier: &'static Tier,
        player_level: u32,
        date: NaiveDate,
        sequence: u32,
    ) -> QuestInstance {
        let gather = tier.gather;
        let id = DailyQuestId::new(ObjectiveKind::Collect, date, tier.code, sequence);
        let display = gather.item.replace('_', " ");
        let mut objectives = HashMap::new();
        objectives.insert(
            Objective::new(ObjectiveKind::Collect, gather.item).key(),
            gather.count,
        );
        QuestInstance::new(
            id.to_string(),
            format!("Gather {} {display}", gather.count),
            format!("Collect {} {display} before the day ends.", gather.count),
            ObjectiveKind::Collect,
            QuestCategory::Daily,
            tier.min_level,
            objectives,
            scaled_reward(gather.exp, gather.gold, player_level),
        )
    }

    fn dungeon_quest(
        &self,
        tier: &'static Tier,
        player_level: u32,
        date: NaiveDate,
        sequence: u32,
    ) -> QuestInstance {
        let id = DailyQuestId::new(ObjectiveKind::Explore, date, tier.code, sequence);
        let display = tier.dungeon.replace('_', " ");
        let mut objectives = HashMap::new();
        objectives.insert(
            Objective::new(ObjectiveKind::Explore, tier.dungeon).key(),
            1,
        );
        // Bonus quest pays double the gather baseline.
        let gather = tier.gather;
        QuestInstance::new(
            id.to_string(),
            format!("Clear the {display}"),
            format!("Brave the {display} and return alive."),
            ObjectiveKind::Explore,
            QuestCategory::Daily,
            tier.min_level,
            objectives,
            scaled_reward(gather.exp * 2, gather.gold * 2, player_level),
        )
    }
}

fn scaled_reward(base_exp: u32, base_gold: u32, player_level: u32) -> Reward {
    Reward::new()
        .with_experience(base_exp + player_level * EXP_COEFFICIENT)
        .with_currency(base_gold + player_level * GOLD_COEFFICIENT)
}
