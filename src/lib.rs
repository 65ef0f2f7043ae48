pub mod config;
pub mod curriculum;
pub mod dataset;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod families;
pub mod logging;
pub mod mastery;
pub mod morphology;
pub mod selector;
pub mod settings;
pub mod srs;
pub mod store;
pub mod types;

pub use config::{Config, EngineConfig};
pub use dataset::{InMemoryDataset, VerbDataset};
pub use engine::{AnswerReport, DrillEngine};
pub use settings::SelectionSettings;
pub use types::{Form, Level, Mood, Person, Region, Tense};

/// Built-in dataset used when no `DATASET_PATH` is configured.
pub const SAMPLE_DATASET: &str = include_str!("../data/sample_verbs.json");
