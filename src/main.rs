use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use conjugation_engine::config::{Config, EngineConfig};
use conjugation_engine::dataset::InMemoryDataset;
use conjugation_engine::engine::DrillEngine;
use conjugation_engine::error::DatasetError;
use conjugation_engine::logging::init_tracing;
use conjugation_engine::srs::IntervalScheduler;
use conjugation_engine::store::{InMemoryStore, PracticeStore};
use conjugation_engine::types::{Form, VerbType};
use conjugation_engine::SAMPLE_DATASET;

async fn load_dataset(config: &Config) -> Result<InMemoryDataset, DatasetError> {
    let ttl = Duration::from_secs(config.cache_ttl_secs);
    match &config.dataset_path {
        Some(path) => InMemoryDataset::load(path, config.cache_capacity, ttl).await,
        None => {
            tracing::info!("DATASET_PATH not set, using built-in sample verbs");
            let doc = serde_json::from_str(SAMPLE_DATASET)?;
            InMemoryDataset::with_cache(doc, config.cache_capacity, ttl)
        }
    }
}

/// Stand-in learner: gets better at cells it has mastered, worse at irregulars.
fn simulate_answer<R: Rng + ?Sized>(form: &Form, mastery: f64, rng: &mut R) -> (bool, u64, u32) {
    let irregular = form.verb_type == Some(VerbType::Irregular);
    let base = if irregular { 0.55 } else { 0.75 };
    let p_correct = (base + (mastery - 50.0) / 200.0).clamp(0.05, 0.95);
    let correct = rng.random::<f64>() < p_correct;
    let floor_ms = if irregular { 3500 } else { 2200 };
    let latency = floor_ms + rng.random_range(0..4000u64);
    let hints = if correct { 0 } else { rng.random_range(0..=2u32) };
    (correct, latency, hints)
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let mut settings = match config.session_settings() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "invalid session settings");
            std::process::exit(2);
        }
    };

    let dataset = match load_dataset(&config).await {
        Ok(dataset) => dataset,
        Err(e) => {
            tracing::error!(error = %e, "failed to load dataset");
            std::process::exit(1);
        }
    };

    let engine_config = EngineConfig::from_env();
    let srs = IntervalScheduler::new(&engine_config);
    let mut engine = DrillEngine::new(dataset, InMemoryStore::new(), srs, engine_config, config.seed).await;
    let mut learner = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_os_rng(),
    };

    tracing::info!(
        user = %config.user_id,
        level = %settings.level,
        region = %settings.region,
        rounds = config.rounds,
        verbs = engine.verbs().len(),
        "drill session starting"
    );

    let mut previous: Option<Form> = None;
    let mut correct_count = 0usize;
    let mut placeholders = 0usize;

    for round in 0..config.rounds {
        let form = engine
            .next_item(&config.user_id, &mut settings, previous.as_ref())
            .await;
        if form.is_sentinel() {
            placeholders += 1;
            tracing::warn!(round, mood = %form.mood, tense = %form.tense, "no practice data for request");
            continue;
        }

        let mastery = match engine.store().mastery(&config.user_id, &form.cell().id()).await {
            Ok(Some(snapshot)) => snapshot.score,
            _ => 50.0,
        };
        let (correct, latency_ms, hints) = simulate_answer(&form, mastery, &mut learner);
        match engine
            .record_answer(&config.user_id, &form, correct, latency_ms, hints)
            .await
        {
            Ok(report) => {
                if correct {
                    correct_count += 1;
                }
                tracing::info!(
                    round,
                    lemma = %form.lemma,
                    value = %form.value,
                    correct,
                    score = report.cell.score,
                    band = ?report.assessment.band,
                    "round complete"
                );
            }
            Err(e) => tracing::error!(round, error = %e, "failed to record answer"),
        }
        previous = Some(form);
    }

    let cells: Vec<_> = engine
        .store()
        .snapshots_for(&config.user_id)
        .into_iter()
        .map(|(cell, snap)| {
            json!({
                "cell": cell,
                "score": snap.score,
                "attempts": snap.n,
                "confidence": engine.scorer().confidence(snap.weighted_attempts).level,
            })
        })
        .collect();
    let summary = json!({
        "user": config.user_id,
        "level": settings.level,
        "region": settings.region,
        "rounds": config.rounds,
        "correct": correct_count,
        "placeholders": placeholders,
        "scheduled": engine.srs().due_schedule(&config.user_id).len(),
        "cells": cells,
    });

    match serde_json::to_string_pretty(&summary) {
        Ok(out) => println!("{out}"),
        Err(e) => tracing::error!(error = %e, "failed to render summary"),
    }
}
