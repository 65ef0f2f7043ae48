use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::types::{Level, Mood, Region, Tense};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PracticeMode {
    #[default]
    Mixed,
    Specific,
    Theme,
}

impl PracticeMode {
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        match s.trim().to_lowercase().as_str() {
            "mixed" => Ok(Self::Mixed),
            "specific" => Ok(Self::Specific),
            "theme" => Ok(Self::Theme),
            other => Err(SettingsError::UnknownPracticeMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerbTypeFilter {
    #[default]
    #[serde(alias = "mixed")]
    All,
    Regular,
    Irregular,
}

impl VerbTypeFilter {
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        match s.trim().to_lowercase().as_str() {
            "all" | "mixed" => Ok(Self::All),
            "regular" => Ok(Self::Regular),
            "irregular" => Ok(Self::Irregular),
            other => Err(SettingsError::UnknownVerbType(other.to_string())),
        }
    }
}

/// Person rotation pointer carried between successive selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarietyState {
    pub rotation_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSettings {
    pub level: Level,
    pub region: Region,
    pub practice_mode: PracticeMode,
    pub specific_mood: Option<Mood>,
    pub specific_tense: Option<Tense>,
    pub verb_type: VerbTypeFilter,
    pub selected_family: Option<String>,
    pub allowed_lemmas: Option<HashSet<String>>,
    pub came_from_tema: bool,
    pub enable_futuro_subj_prod: bool,
    /// Chance (0-100) of attaching an enclitic pronoun to an affirmative imperative.
    /// `None` defers to the engine default; `Some(0)` turns enclitics off.
    pub clitics_percentage: Option<u8>,
    /// Cell id -> due date, supplied by the scheduler.
    pub due_schedule: HashMap<String, DateTime<Utc>>,
    pub variety: VarietyState,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            level: Level::A1,
            region: Region::LaGeneral,
            practice_mode: PracticeMode::Mixed,
            specific_mood: None,
            specific_tense: None,
            verb_type: VerbTypeFilter::All,
            selected_family: None,
            allowed_lemmas: None,
            came_from_tema: false,
            enable_futuro_subj_prod: false,
            clitics_percentage: None,
            due_schedule: HashMap::new(),
            variety: VarietyState::default(),
        }
    }
}

impl SelectionSettings {
    pub fn new(level: Level, region: Region) -> Self {
        Self {
            level,
            region,
            ..Self::default()
        }
    }

    pub fn specific(level: Level, region: Region, mood: Mood, tense: Option<Tense>) -> Self {
        Self {
            level,
            region,
            practice_mode: PracticeMode::Specific,
            specific_mood: Some(mood),
            specific_tense: tense,
            ..Self::default()
        }
    }

    /// Theme picks and specific requests arriving from a theme skip the level table.
    pub fn bypasses_curriculum(&self) -> bool {
        match self.practice_mode {
            PracticeMode::Theme => true,
            PracticeMode::Specific => self.came_from_tema,
            PracticeMode::Mixed => false,
        }
    }

    pub fn is_specific(&self) -> bool {
        self.practice_mode == PracticeMode::Specific && self.specific_mood.is_some()
    }

    pub fn is_pure_regular(&self) -> bool {
        self.verb_type == VerbTypeFilter::Regular
    }

    pub fn is_due(&self, cell_id: &str, now: DateTime<Utc>) -> bool {
        self.due_schedule
            .get(cell_id)
            .map_or(false, |due_at| *due_at <= now)
    }
}

/// Loosely typed input as it arrives from a client or the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettings {
    pub level: Option<String>,
    pub region: Option<String>,
    pub practice_mode: Option<String>,
    pub specific_mood: Option<String>,
    pub specific_tense: Option<String>,
    pub verb_type: Option<String>,
    pub selected_family: Option<String>,
    pub allowed_lemmas: Option<Vec<String>>,
    #[serde(default)]
    pub came_from_tema: bool,
    #[serde(default)]
    pub enable_futuro_subj_prod: bool,
    pub clitics_percentage: Option<u32>,
}

impl TryFrom<RawSettings> for SelectionSettings {
    type Error = SettingsError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let defaults = SelectionSettings::default();

        let level = match raw.level.as_deref() {
            Some(s) => Level::parse(s).ok_or_else(|| SettingsError::UnknownLevel(s.to_string()))?,
            None => defaults.level,
        };
        let region = match raw.region.as_deref() {
            Some(s) => {
                Region::parse(s).ok_or_else(|| SettingsError::UnknownRegion(s.to_string()))?
            }
            None => defaults.region,
        };
        let practice_mode = match raw.practice_mode.as_deref() {
            Some(s) => PracticeMode::parse(s)?,
            None => defaults.practice_mode,
        };
        let verb_type = match raw.verb_type.as_deref() {
            Some(s) => VerbTypeFilter::parse(s)?,
            None => defaults.verb_type,
        };
        let specific_mood = raw
            .specific_mood
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| Mood::parse(s).ok_or_else(|| SettingsError::UnknownMood(s.to_string())))
            .transpose()?;
        let specific_tense = raw
            .specific_tense
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| Tense::parse(s).ok_or_else(|| SettingsError::UnknownTense(s.to_string())))
            .transpose()?;

        if practice_mode == PracticeMode::Specific && specific_mood.is_none() {
            return Err(SettingsError::MissingSpecificMood);
        }
        if let (Some(mood), Some(tense)) = (specific_mood, specific_tense) {
            if tense.mood() != mood {
                return Err(SettingsError::TenseOutsideMood {
                    mood: mood.to_string(),
                    tense: tense.to_string(),
                });
            }
        }

        let clitics_percentage = match raw.clitics_percentage {
            Some(p) if p > 100 => return Err(SettingsError::CliticsPercentage(p)),
            Some(p) => Some(p as u8),
            None => defaults.clitics_percentage,
        };

        Ok(Self {
            level,
            region,
            practice_mode,
            specific_mood,
            specific_tense,
            verb_type,
            selected_family: raw.selected_family.filter(|f| !f.trim().is_empty()),
            allowed_lemmas: raw
                .allowed_lemmas
                .map(|lemmas| lemmas.into_iter().collect::<HashSet<_>>())
                .filter(|set| !set.is_empty()),
            came_from_tema: raw.came_from_tema,
            enable_futuro_subj_prod: raw.enable_futuro_subj_prod,
            clitics_percentage,
            due_schedule: HashMap::new(),
            variety: VarietyState::default(),
        })
    }
}
