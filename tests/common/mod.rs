#![allow(dead_code)]

use conjugation_engine::config::EngineConfig;
use conjugation_engine::dataset::{InMemoryDataset, VerbDataset};
use conjugation_engine::eligibility::VerbIndex;
use conjugation_engine::engine::DrillEngine;
use conjugation_engine::srs::IntervalScheduler;
use conjugation_engine::store::InMemoryStore;
use conjugation_engine::types::Form;
use conjugation_engine::SAMPLE_DATASET;

pub type TestEngine = DrillEngine<InMemoryDataset, InMemoryStore, IntervalScheduler>;

pub fn sample_dataset() -> InMemoryDataset {
    InMemoryDataset::from_json_str(SAMPLE_DATASET).expect("sample dataset parses")
}

pub async fn sample_forms() -> (VerbIndex, Vec<Form>) {
    let dataset = sample_dataset();
    let forms = dataset.get_all_forms().await;
    (dataset.verb_index().clone(), forms)
}

pub async fn create_test_engine(seed: u64) -> TestEngine {
    let config = EngineConfig::default();
    let srs = IntervalScheduler::new(&config);
    DrillEngine::new(sample_dataset(), InMemoryStore::new(), srs, config, Some(seed)).await
}
