use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown level: {0}")]
    UnknownLevel(String),
    #[error("unknown region: {0}")]
    UnknownRegion(String),
    #[error("unknown practice mode: {0}")]
    UnknownPracticeMode(String),
    #[error("unknown verb type: {0}")]
    UnknownVerbType(String),
    #[error("unknown mood: {0}")]
    UnknownMood(String),
    #[error("unknown tense: {0}")]
    UnknownTense(String),
    #[error("specific practice requires a mood")]
    MissingSpecificMood,
    #[error("tense {tense} does not belong to mood {mood}")]
    TenseOutsideMood { mood: String, tense: String },
    #[error("clitics percentage must be within 0..=100, got {0}")]
    CliticsPercentage(u32),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategorizationError {
    #[error("empty lemma")]
    EmptyLemma,
    #[error("lemma has no infinitive ending: {0}")]
    NoInfinitiveEnding(String),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("duplicate verb: {0}")]
    DuplicateVerb(String),
    #[error("form references unknown verb: {0}")]
    UnknownVerb(String),
    #[error("form for {lemma} has an empty value")]
    EmptyForm { lemma: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
