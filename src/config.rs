use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::settings::{RawSettings, SelectionSettings};

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse::<T>().ok())
}

/// Process-level settings for the drill binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub dataset_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub rounds: usize,
    pub user_id: String,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub session: RawSettings,
}

impl Config {
    pub fn from_env() -> Self {
        let log_level = env_string("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let session = RawSettings {
            level: env_string("DRILL_LEVEL"),
            region: env_string("DRILL_REGION"),
            practice_mode: env_string("DRILL_MODE"),
            verb_type: env_string("DRILL_VERB_TYPE"),
            specific_mood: env_string("DRILL_MOOD"),
            specific_tense: env_string("DRILL_TENSE"),
            selected_family: env_string("DRILL_FAMILY"),
            ..RawSettings::default()
        };

        Self {
            log_level,
            dataset_path: env_string("DATASET_PATH").map(PathBuf::from),
            seed: env_parse("DRILL_SEED"),
            rounds: env_parse("DRILL_ROUNDS").unwrap_or(20),
            user_id: env_string("DRILL_USER_ID").unwrap_or_else(|| "local".to_string()),
            cache_capacity: env_parse("DATASET_CACHE_CAPACITY").unwrap_or(512),
            cache_ttl_secs: env_parse("DATASET_CACHE_TTL_SECS").unwrap_or(300),
            session,
        }
    }

    pub fn session_settings(&self) -> Result<SelectionSettings, SettingsError> {
        SelectionSettings::try_from(self.session.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionWeights {
    /// Target share of regular verbs when both types are drilled.
    pub regular_ratio: f64,
    /// Upper bound on the resampled pool produced by the balance step.
    pub balance_sample_size: usize,
    /// Probability of keeping present-tense forms over participles at A1.
    pub early_present_bias: f64,
    pub due_boost: usize,
    pub low_mastery_boost: usize,
    pub low_mastery_threshold: f64,
    pub rotation_boost: usize,
    pub ir_bucket_chance: f64,
    pub er_bucket_chance: f64,
    pub double_clitic_chance: f64,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            regular_ratio: 0.3,
            balance_sample_size: 40,
            early_present_bias: 0.99,
            due_boost: 3,
            low_mastery_boost: 1,
            low_mastery_threshold: 60.0,
            rotation_boost: 4,
            ir_bucket_chance: 0.3,
            er_bucket_chance: 0.3,
            double_clitic_chance: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasteryParams {
    pub recency_tau_days: f64,
    pub regular_difficulty: f64,
    pub irregular_difficulty: f64,
    pub frequency_adjustment: f64,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    pub neutral_score: f64,
    pub hint_penalty: f64,
    pub hint_penalty_cap: f64,
    pub medium_confidence: f64,
    pub high_confidence: f64,
    pub achieved_threshold: f64,
    pub attention_threshold: f64,
    pub slow_latency_ms: f64,
}

impl Default for MasteryParams {
    fn default() -> Self {
        Self {
            recency_tau_days: 10.0,
            regular_difficulty: 1.0,
            irregular_difficulty: 1.2,
            frequency_adjustment: 0.05,
            min_difficulty: 0.8,
            max_difficulty: 1.3,
            neutral_score: 50.0,
            hint_penalty: 5.0,
            hint_penalty_cap: 15.0,
            medium_confidence: 8.0,
            high_confidence: 20.0,
            achieved_threshold: 80.0,
            attention_threshold: 60.0,
            slow_latency_ms: 6000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerParams {
    /// Delay before a missed cell comes back.
    pub relearn_minutes: i64,
    pub ladder_days: Vec<i64>,
    /// Interval multipliers for the achieved / attention / critical bands.
    pub achieved_factor: f64,
    pub attention_factor: f64,
    pub critical_factor: f64,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            relearn_minutes: 10,
            ladder_days: vec![1, 3, 7, 14, 30],
            achieved_factor: 1.5,
            attention_factor: 1.0,
            critical_factor: 0.5,
        }
    }
}

/// Tunable constants for selection, scoring and scheduling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub selection: SelectionWeights,
    pub mastery: MasteryParams,
    pub scheduler: SchedulerParams,
    /// Enclitic percentage for sessions that leave theirs unset.
    pub clitics_percentage: u8,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ratio) = env_parse::<f64>("ENGINE_REGULAR_RATIO") {
            config.selection.regular_ratio = ratio.clamp(0.0, 1.0);
        }
        if let Some(tau) = env_parse::<f64>("ENGINE_RECENCY_TAU_DAYS") {
            if tau > 0.0 {
                config.mastery.recency_tau_days = tau;
            }
        }
        if let Some(pct) = env_parse::<u8>("ENGINE_CLITICS_PERCENT") {
            config.clitics_percentage = pct.min(100);
        }

        config
    }
}
