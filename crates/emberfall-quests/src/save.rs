//! Compact quest persistence.
//!
//! A live quest saves as `{id, progress, status}` only; titles,
//! descriptions, objective targets and rewards are re-derived from
//! the id at load time. Converter-randomized quests additionally
//! persist their resolved objective map, because random target and
//! quantity selection is not re-derivable. Stale daily/weekly records
//! are classified as expired and moved to a history list; a corrupt
//! record is dropped with a warning and never fails the whole load.

use crate::convert::{synthesize_text, TemplateConverter};
use crate::daily::{DailyQuestGenerator, DailyQuestId};
use crate::instance::{QuestInstance, QuestStatus};
use crate::lifecycle::LifecycleEngine;
use crate::objective::{Objective, ObjectiveKind};
use crate::template::{QuestCategory, QuestTemplate, TemplateStore};
use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur reading or writing quest save data.
#[derive(Debug, Error)]
pub enum SaveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Atomic write failed
    #[error("Atomic write failed: {0}")]
    AtomicWriteFailed(String),
}

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// On-disk shape of one quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRecord {
    /// Quest id
    pub id: String,
    /// Progress map (objective key -> accumulated count)
    #[serde(default)]
    pub progress: HashMap<String, u32>,
    /// Status string (see [`QuestStatus::as_str`])
    pub status: String,
    /// Resolved objectives, present only for converter-randomized
    /// quests whose objective map cannot be re-derived from the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objectives: Option<HashMap<String, u32>>,
}

/// How a quest id was produced, recovered by parsing the id itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestIdKind {
    /// A template id; the template store re-derives everything
    Static,
    /// A tiered daily id with embedded date/tier/sequence
    Daily(DailyQuestId),
    /// A converter-synthesized `{category}_{kind}_{epochMillis}` id
    Cycle {
        /// Daily or Weekly
        category: QuestCategory,
        /// Objective kind embedded in the id
        kind: ObjectiveKind,
        /// Generation time in Unix epoch milliseconds
        epoch_millis: i64,
    },
}

impl QuestIdKind {
    /// Classifies a quest id.
    #[must_use]
    pub fn classify(id: &str) -> Self {
        if let Some(daily) = DailyQuestId::parse(id) {
            return Self::Daily(daily);
        }
        if let Some(cycle) = Self::parse_cycle(id) {
            return cycle;
        }
        Self::Static
    }

    fn parse_cycle(id: &str) -> Option<Self> {
        let (category, rest) = if let Some(rest) = id.strip_prefix("daily_") {
            (QuestCategory::Daily, rest)
        } else if let Some(rest) = id.strip_prefix("weekly_") {
            (QuestCategory::Weekly, rest)
        } else {
            return None;
        };
        let (kind, rest) = ObjectiveKind::ALL.iter().find_map(|&kind| {
            rest.strip_prefix(kind.action_prefix())
                .and_then(|r| r.strip_prefix('_'))
                .map(|r| (kind, r))
        })?;
        let epoch_millis: i64 = rest.parse().ok()?;
        Some(Self::Cycle {
            category,
            kind,
            epoch_millis,
        })
    }

    /// The generation date embedded in a dynamic id, if any.
    #[must_use]
    pub fn generation_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Static => None,
            Self::Daily(daily) => Some(daily.date),
            Self::Cycle { epoch_millis, .. } => {
                DateTime::from_timestamp_millis(*epoch_millis).map(|dt| dt.date_naive())
            },
        }
    }

    /// Whether a record with this id is stale relative to `today`.
    /// Daily content expires on date change, weekly on ISO-week change.
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        match self {
            Self::Static => false,
            Self::Daily(daily) => daily.date < today,
            Self::Cycle { category, .. } => {
                let Some(generated) = self.generation_date() else {
                    return true;
                };
                match category {
                    QuestCategory::Weekly => {
                        generated.iso_week() != today.iso_week()
                            && generated < today
                    },
                    _ => generated < today,
                }
            },
        }
    }
}

/// Outcome of decoding one saved quest record.
#[derive(Debug)]
pub enum RestoreOutcome {
    /// Fully reconstructed quest with progress and status replayed
    Restored(QuestInstance),
    /// Recognized but stale; belongs in the history log
    Expired(QuestRecord),
    /// Unparseable or unknown; logged and skipped
    Dropped,
}

/// Converts live quests to records and records back to live quests.
#[derive(Debug)]
pub struct PersistenceCodec<'a> {
    store: &'a TemplateStore,
    converter: &'a mut TemplateConverter,
    generator: &'a DailyQuestGenerator,
}

impl<'a> PersistenceCodec<'a> {
    /// Creates a codec over the given generation collaborators.
    pub fn new(
        store: &'a TemplateStore,
        converter: &'a mut TemplateConverter,
        generator: &'a DailyQuestGenerator,
    ) -> Self {
        Self {
            store,
            converter,
            generator,
        }
    }

    /// Encodes a live quest as its compact record. Only quests whose
    /// objective map came from a random roll (variable templates and
    /// converter cycle ids) carry their resolved objectives; static
    /// and tiered-daily maps are re-derivable from the id alone.
    #[must_use]
    pub fn to_record(&self, quest: &QuestInstance) -> QuestRecord {
        let objectives = match QuestIdKind::classify(&quest.id) {
            QuestIdKind::Daily(_) => None,
            QuestIdKind::Static => self
                .store
                .get(&quest.id)
                .map_or(true, QuestTemplate::is_variable)
                .then(|| quest.objectives.clone()),
            QuestIdKind::Cycle { .. } => Some(quest.objectives.clone()),
        };
        QuestRecord {
            id: quest.id.clone(),
            progress: quest.progress_map().clone(),
            status: quest.status().as_str().to_owned(),
            objectives,
        }
    }

    /// Decodes one record into a live quest, classifying stale dynamic
    /// records as expired rather than silently dropping them.
    pub fn from_record(&mut self, record: &QuestRecord, today: NaiveDate) -> RestoreOutcome {
        let Some(status) = QuestStatus::parse(&record.status) else {
            warn!(quest = %record.id, status = %record.status, "unknown status in save record, dropping");
            return RestoreOutcome::Dropped;
        };

        let id_kind = QuestIdKind::classify(&record.id);
        if id_kind.is_expired(today) {
            info!(quest = %record.id, "saved quest expired");
            return RestoreOutcome::Expired(record.clone());
        }

        let instance = match &id_kind {
            QuestIdKind::Static => self.rebuild_static(record),
            QuestIdKind::Daily(daily) => self.rebuild_daily(record, daily),
            QuestIdKind::Cycle { category, kind, .. } => {
                self.rebuild_cycle(record, *category, *kind)
            },
        };

        match instance {
            Some(mut quest) => {
                quest.overlay_saved(&record.progress, status);
                RestoreOutcome::Restored(quest)
            },
            None => {
                warn!(quest = %record.id, "could not rebuild saved quest, dropping");
                RestoreOutcome::Dropped
            },
        }
    }

    fn rebuild_static(&mut self, record: &QuestRecord) -> Option<QuestInstance> {
        let template = self.store.get(&record.id)?;
        let mut quest = self.converter.convert(template);
        // Variable templates re-roll on convert; the persisted
        // resolved map restores the original roll exactly, and the
        // display text must describe that roll, not the fresh one.
        if let Some(objectives) = &record.objectives {
            if !template.variable_targets.is_empty() {
                let text = objectives.iter().next().and_then(|(key, &count)| {
                    Objective::parse_key(key)
                        .map(|obj| synthesize_text(obj.kind, &obj.target, count))
                });
                if let Some((title, description)) = text {
                    quest.title = title;
                    quest.description = description;
                }
            }
            quest.objectives = objectives.clone();
        }
        Some(quest)
    }

    fn rebuild_daily(&self, record: &QuestRecord, daily: &DailyQuestId) -> Option<QuestInstance> {
        // Reward scaling re-derives against the tier's entry level;
        // the tier is fixed by the id, the player's level is not stored.
        let tier_level = crate::daily::tier_for_code(daily.tier_code)?.min_level;
        let quest = self.generator.rebuild(daily, tier_level);
        if quest.is_none() {
            debug!(quest = %record.id, "daily id parsed but matched no generated quest");
        }
        quest
    }

    fn rebuild_cycle(
        &self,
        record: &QuestRecord,
        category: QuestCategory,
        kind: ObjectiveKind,
    ) -> Option<QuestInstance> {
        // The random roll is not re-derivable; the record must carry it.
        let objectives = record.objectives.clone()?;
        let template = self.find_cycle_template(category, kind);

        let (title, description) = objectives
            .iter()
            .next()
            .and_then(|(key, &count)| {
                Objective::parse_key(key).map(|obj| synthesize_text(kind, &obj.target, count))
            })
            .unwrap_or_else(|| {
                template.map_or_else(
                    || (record.id.clone(), String::new()),
                    |t| (t.title.clone(), t.description.clone()),
                )
            });

        Some(QuestInstance::new(
            record.id.clone(),
            title,
            description,
            kind,
            category,
            template.map_or(1, |t| t.required_level),
            objectives,
            template.map(|t| t.reward.clone()).unwrap_or_default(),
        ))
    }

    /// Finds the template a cycle id was most plausibly stamped from:
    /// the lowest-id repeatable template of the same category and kind.
    fn find_cycle_template(
        &self,
        category: QuestCategory,
        kind: ObjectiveKind,
    ) -> Option<&QuestTemplate> {
        self.store
            .by_category(category)
            .into_iter()
            .filter(|t| t.kind == kind && t.repeatable)
            .min_by(|a, b| a.id.cmp(&b.id))
    }
}

/// Quest state embedded inside the larger save-file document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestSaveData {
    /// Records for active and completed-unclaimed quests
    #[serde(default)]
    pub records: Vec<QuestRecord>,
    /// Ids of quests whose rewards were claimed
    #[serde(default)]
    pub claimed: Vec<String>,
    /// Expired/failed quest records kept for history
    #[serde(default)]
    pub history: Vec<QuestRecord>,
}

/// Counts from replaying a save into an engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreStats {
    /// Quests fully reconstructed
    pub restored: usize,
    /// Records classified as expired and moved to history
    pub expired: usize,
    /// Records dropped as unreadable
    pub dropped: usize,
}

impl QuestSaveData {
    /// Captures the live engine state.
    #[must_use]
    pub fn capture(
        engine: &LifecycleEngine,
        codec: &PersistenceCodec<'_>,
        history: Vec<QuestRecord>,
    ) -> Self {
        let records = engine
            .iter_active()
            .chain(engine.iter_completed())
            .map(|quest| codec.to_record(quest))
            .collect();
        let mut claimed: Vec<String> = engine.iter_claimed().map(str::to_owned).collect();
        claimed.sort();
        Self {
            records,
            claimed,
            history,
        }
    }

    /// Replays this save into an engine, returning per-record stats.
    /// Expired records are appended to `self`-independent `history`
    /// on the returned data; dropped records are logged only.
    pub fn restore_into(
        &self,
        engine: &mut LifecycleEngine,
        codec: &mut PersistenceCodec<'_>,
        today: NaiveDate,
        history: &mut Vec<QuestRecord>,
    ) -> RestoreStats {
        let mut stats = RestoreStats::default();
        for record in &self.records {
            match codec.from_record(record, today) {
                RestoreOutcome::Restored(quest) => {
                    engine.insert_restored(quest);
                    stats.restored += 1;
                },
                RestoreOutcome::Expired(record) => {
                    history.push(record);
                    stats.expired += 1;
                },
                RestoreOutcome::Dropped => {
                    stats.dropped += 1;
                },
            }
        }
        engine.restore_claimed(self.claimed.iter().cloned());
        history.extend(self.history.iter().cloned());
        info!(
            restored = stats.restored,
            expired = stats.expired,
            dropped = stats.dropped,
            "quest save restored"
        );
        stats
    }

    /// Writes the quest save as pretty JSON, atomically
    /// (temp file + rename).
    pub fn write_to_path(&self, path: &Path) -> SaveResult<()> {
        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)
                .map_err(|e| SaveError::Serialization(e.to_string()))?;
            writer.flush()?;
        }
        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            SaveError::AtomicWriteFailed(e.to_string())
        })?;
        debug!(path = %path.display(), "quest save written");
        Ok(())
    }

    /// Reads a quest save written by [`QuestSaveData::write_to_path`].
    pub fn read_from_path(path: &Path) -> SaveResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| SaveError::Deserialization(e.to_string()))
    }
}
