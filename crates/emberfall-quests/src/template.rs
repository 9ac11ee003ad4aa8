//! Quest templates and the template store.
//!
//! Templates are immutable definitions loaded once at startup from a
//! JSON document grouped by category. A schema error degrades to a
//! minimal built-in fallback set rather than aborting startup.

use crate::objective::ObjectiveKind;
use crate::reward::Reward;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

/// Errors that can occur while loading templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// I/O error reading the template source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Template document failed to parse
    #[error("Template parse error: {0}")]
    Parse(String),

    /// Two templates share an id
    #[error("Duplicate template id: {0}")]
    DuplicateId(String),
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Category a quest belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestCategory {
    /// Main storyline quest
    Main,
    /// Optional side quest
    Side,
    /// Regenerated each day
    Daily,
    /// Regenerated each week
    Weekly,
}

impl QuestCategory {
    /// String form, used in synthesized quest ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Side => "side",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Whether quests in this category regenerate on a cycle.
    #[must_use]
    pub const fn is_cyclic(self) -> bool {
        matches!(self, Self::Daily | Self::Weekly)
    }
}

/// Inclusive quantity range for variable-quantity objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityRange {
    /// Minimum quantity
    pub min: u32,
    /// Maximum quantity
    pub max: u32,
}

impl QuantityRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Immutable definition used to stamp out quest instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestTemplate {
    /// Unique template id
    pub id: String,
    /// Display title
    pub title: String,
    /// Display description
    pub description: String,
    /// Primary objective kind
    pub kind: ObjectiveKind,
    /// Category
    pub category: QuestCategory,
    /// Minimum player level to accept
    pub required_level: u32,
    /// Fixed objectives (objective key -> target count)
    pub objectives: HashMap<String, u32>,
    /// Candidate targets for variable objectives
    pub variable_targets: Vec<String>,
    /// Quantity range for variable objectives
    pub variable_quantity: Option<QuantityRange>,
    /// Reward specification
    pub reward: Reward,
    /// Whether the quest regenerates after completion
    pub repeatable: bool,
    /// Optional time limit in hours
    pub time_limit_hours: Option<u32>,
    /// Freeform tags
    pub tags: Vec<String>,
    /// Template ids that must be completed first
    pub prerequisites: Vec<String>,
    /// Template ids unlocked by completing this quest
    pub unlocks: Vec<String>,
}

impl QuestTemplate {
    /// Creates a minimal template; refine with the builder methods.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: ObjectiveKind,
        category: QuestCategory,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            kind,
            category,
            required_level: 1,
            objectives: HashMap::new(),
            variable_targets: Vec::new(),
            variable_quantity: None,
            reward: Reward::new(),
            repeatable: category.is_cyclic(),
            time_limit_hours: None,
            tags: Vec::new(),
            prerequisites: Vec::new(),
            unlocks: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the required level.
    #[must_use]
    pub const fn with_required_level(mut self, level: u32) -> Self {
        self.required_level = level;
        self
    }

    /// Adds a fixed objective.
    #[must_use]
    pub fn with_objective(mut self, key: impl Into<String>, target: u32) -> Self {
        self.objectives.insert(key.into(), target);
        self
    }

    /// Sets the variable target candidates.
    #[must_use]
    pub fn with_variable_targets(mut self, targets: Vec<String>) -> Self {
        self.variable_targets = targets;
        self
    }

    /// Sets the variable quantity range.
    #[must_use]
    pub const fn with_variable_quantity(mut self, min: u32, max: u32) -> Self {
        self.variable_quantity = Some(QuantityRange::new(min, max));
        self
    }

    /// Sets the reward.
    #[must_use]
    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.reward = reward;
        self
    }

    /// Sets whether the quest is repeatable.
    #[must_use]
    pub const fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }

    /// Adds a prerequisite template id.
    #[must_use]
    pub fn with_prerequisite(mut self, id: impl Into<String>) -> Self {
        self.prerequisites.push(id.into());
        self
    }

    /// Returns whether the template needs variable resolution.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        !self.variable_targets.is_empty() || self.variable_quantity.is_some()
    }
}

/// Raw template definition as it appears in the JSON document. The
/// kind is a free string here so a malformed value degrades instead
/// of failing the whole document.
#[derive(Debug, Deserialize)]
struct TemplateDef {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_required_level")]
    required_level: u32,
    #[serde(default)]
    objectives: HashMap<String, u32>,
    #[serde(default)]
    variable_targets: Vec<String>,
    #[serde(default)]
    variable_quantity: Option<QuantityRange>,
    #[serde(default)]
    reward: Reward,
    #[serde(default)]
    repeatable: Option<bool>,
    #[serde(default)]
    time_limit_hours: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default)]
    unlocks: Vec<String>,
}

const fn default_required_level() -> u32 {
    1
}

/// Template document: records grouped by category.
#[derive(Debug, Default, Deserialize)]
struct TemplateDocument {
    #[serde(default)]
    main: Vec<TemplateDef>,
    #[serde(default)]
    side: Vec<TemplateDef>,
    #[serde(default)]
    daily: Vec<TemplateDef>,
    #[serde(default)]
    weekly: Vec<TemplateDef>,
}

impl TemplateDef {
    fn into_template(self, category: QuestCategory) -> QuestTemplate {
        QuestTemplate {
            id: self.id,
            title: self.title,
            description: self.description,
            kind: ObjectiveKind::from_name_lossy(&self.kind),
            category,
            required_level: self.required_level,
            objectives: self.objectives,
            variable_targets: self.variable_targets,
            variable_quantity: self.variable_quantity,
            reward: self.reward,
            repeatable: self.repeatable.unwrap_or(category.is_cyclic()),
            time_limit_hours: self.time_limit_hours,
            tags: self.tags,
            prerequisites: self.prerequisites,
            unlocks: self.unlocks,
        }
    }
}

/// Lookup store for immutable quest templates.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<String, QuestTemplate>,
    by_category: HashMap<QuestCategory, Vec<String>>,
}

impl TemplateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from already-constructed templates.
    pub fn from_templates(
        templates: impl IntoIterator<Item = QuestTemplate>,
    ) -> TemplateResult<Self> {
        let mut store = Self::new();
        for template in templates {
            store.insert(template)?;
        }
        Ok(store)
    }

    /// Parses a JSON template document.
    pub fn from_json_str(json: &str) -> TemplateResult<Self> {
        let document: TemplateDocument =
            serde_json::from_str(json).map_err(|e| TemplateError::Parse(e.to_string()))?;
        Self::from_document(document)
    }

    /// Parses a JSON template document from a reader.
    pub fn from_json_reader(reader: impl Read) -> TemplateResult<Self> {
        let document: TemplateDocument =
            serde_json::from_reader(reader).map_err(|e| TemplateError::Parse(e.to_string()))?;
        Self::from_document(document)
    }

    /// Loads templates from a JSON file, degrading to the built-in
    /// fallback set on any error. Startup never aborts on bad quest
    /// data; it logs and continues with the fallback.
    #[must_use]
    pub fn load_or_fallback(path: &Path) -> Self {
        let result = File::open(path)
            .map_err(TemplateError::from)
            .and_then(|file| Self::from_json_reader(BufReader::new(file)));
        match result {
            Ok(store) => {
                info!(path = %path.display(), count = store.len(), "loaded quest templates");
                store
            },
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load quest templates, using fallback set");
                Self::fallback()
            },
        }
    }

    /// The built-in fallback set: one basic kill quest.
    #[must_use]
    pub fn fallback() -> Self {
        let template = QuestTemplate::new(
            "quest_fallback_001",
            "Pest Control",
            ObjectiveKind::Kill,
            QuestCategory::Side,
        )
        .with_description("Thin out the slimes around the village.")
        .with_objective("kill_slime", 5)
        .with_reward(Reward::new().with_experience(50).with_currency(100));

        let mut store = Self::new();
        // Single hand-built template cannot collide.
        let _ = store.insert(template);
        store
    }

    fn from_document(document: TemplateDocument) -> TemplateResult<Self> {
        let mut store = Self::new();
        let groups = [
            (QuestCategory::Main, document.main),
            (QuestCategory::Side, document.side),
            (QuestCategory::Daily, document.daily),
            (QuestCategory::Weekly, document.weekly),
        ];
        for (category, defs) in groups {
            for def in defs {
                store.insert(def.into_template(category))?;
            }
        }
        Ok(store)
    }

    fn insert(&mut self, template: QuestTemplate) -> TemplateResult<()> {
        if self.templates.contains_key(&template.id) {
            return Err(TemplateError::DuplicateId(template.id));
        }
        self.by_category
            .entry(template.category)
            .or_default()
            .push(template.id.clone());
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    /// Looks up a template by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&QuestTemplate> {
        self.templates.get(id)
    }

    /// Returns all templates in a category, in document order.
    #[must_use]
    pub fn by_category(&self, category: QuestCategory) -> Vec<&QuestTemplate> {
        self.by_category
            .get(&category)
            .map(|ids| ids.iter().filter_map(|id| self.templates.get(id)).collect())
            .unwrap_or_default()
    }

    /// Returns the number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterates over all templates.
    pub fn iter(&self) -> impl Iterator<Item = &QuestTemplate> {
        self.templates.values()
    }
}
