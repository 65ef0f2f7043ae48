use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::dataset::VerbDataset;
use crate::eligibility::{filter_with_report, FilterContext, VerbIndex};
use crate::error::StoreError;
use crate::fallback::{EmergencyFallbackProvider, FallbackPreferences};
use crate::mastery::{
    average_latency_ms, calculate_mastery_for_cell, calculate_mastery_for_item, CellScore,
    Confidence, ItemScore, MasteryAssessment, MasteryScorer,
};
use crate::selector::{SelectionContext, WeightedSelector};
use crate::settings::SelectionSettings;
use crate::srs::{ReviewOutcome, SpacedRepetition};
use crate::store::PracticeStore;
use crate::types::{Attempt, Form, MasterySnapshot};

/// Everything recomputed after one answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReport {
    pub item: ItemScore,
    pub cell: CellScore,
    pub snapshot: MasterySnapshot,
    pub confidence: Confidence,
    pub assessment: MasteryAssessment,
    pub next_due: DateTime<Utc>,
}

pub struct DrillEngine<D, S, Q> {
    dataset: D,
    store: S,
    srs: Q,
    verbs: VerbIndex,
    config: EngineConfig,
    scorer: MasteryScorer,
    rng: StdRng,
    regular_ratio: Option<f64>,
}

impl<D, S, Q> DrillEngine<D, S, Q>
where
    D: VerbDataset,
    S: PracticeStore,
    Q: SpacedRepetition,
{
    pub async fn new(dataset: D, store: S, srs: Q, config: EngineConfig, seed: Option<u64>) -> Self {
        let verbs: VerbIndex = dataset
            .get_all_verbs()
            .await
            .into_iter()
            .map(|v| (v.lemma.clone(), v))
            .collect();
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let scorer = MasteryScorer::new(config.mastery.clone());

        Self {
            dataset,
            store,
            srs,
            verbs,
            config,
            scorer,
            rng,
            regular_ratio: None,
        }
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn srs(&self) -> &Q {
        &self.srs
    }

    pub fn verbs(&self) -> &VerbIndex {
        &self.verbs
    }

    pub fn scorer(&self) -> &MasteryScorer {
        &self.scorer
    }

    /// External adaptive-difficulty signal for the regular share; clamped to [0, 1].
    pub fn set_regular_ratio(&mut self, ratio: Option<f64>) {
        self.regular_ratio = ratio.map(|r| r.clamp(0.0, 1.0));
    }

    pub async fn next_item(
        &mut self,
        user_id: &str,
        settings: &mut SelectionSettings,
        previous: Option<&Form>,
    ) -> Form {
        self.next_item_at(user_id, settings, previous, Utc::now()).await
    }

    /// Always returns something renderable; see `EmergencyFallbackProvider`.
    pub async fn next_item_at(
        &mut self,
        user_id: &str,
        settings: &mut SelectionSettings,
        previous: Option<&Form>,
        now: DateTime<Utc>,
    ) -> Form {
        let all_forms = self.dataset.get_all_forms().await;

        let due: HashSet<String> = match self.srs.get_due_items(user_id, now).await {
            Ok(cells) => cells.iter().map(|c| c.id()).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "due items unavailable, selecting without SRS");
                HashSet::new()
            }
        };
        let mastery: HashMap<String, f64> = match self.store.mastery_scores(user_id).await {
            Ok(scores) => scores,
            Err(e) => {
                tracing::warn!(error = %e, "mastery scores unavailable");
                HashMap::new()
            }
        };

        let (eligible, _) = filter_with_report(&all_forms, settings, FilterContext::new(&self.verbs));
        tracing::debug!(
            total = all_forms.len(),
            eligible = eligible.len(),
            due = due.len(),
            "selection pool ready"
        );

        let ctx = SelectionContext {
            verbs: &self.verbs,
            previous,
            due_cells: Some(&due),
            mastery: Some(&mastery),
            regular_ratio: self.regular_ratio,
            default_clitics_percentage: self.config.clitics_percentage,
            now,
        };
        let fallback = EmergencyFallbackProvider::new(&self.dataset, &self.verbs);
        let selector = WeightedSelector::new(&self.config.selection);

        let selected = selector
            .select_form(&eligible, &all_forms, settings, &ctx, &fallback, &mut self.rng)
            .await;

        match selected {
            Some(form) => form,
            None => {
                tracing::info!(level = %settings.level, region = %settings.region, "eligible pool empty");
                let prefs = FallbackPreferences::from(&*settings);
                fallback.resolve(&all_forms, &prefs, &mut self.rng).await
            }
        }
    }

    pub async fn record_answer(
        &self,
        user_id: &str,
        form: &Form,
        correct: bool,
        latency_ms: u64,
        hints_used: u32,
    ) -> Result<AnswerReport, StoreError> {
        self.record_answer_at(user_id, form, correct, latency_ms, hints_used, Utc::now())
            .await
    }

    pub async fn record_answer_at(
        &self,
        user_id: &str,
        form: &Form,
        correct: bool,
        latency_ms: u64,
        hints_used: u32,
        now: DateTime<Utc>,
    ) -> Result<AnswerReport, StoreError> {
        let cell = form.cell();
        let cell_id = cell.id();
        let item_id = form.item_id();
        let verb = self.verbs.get(&form.lemma);

        let attempt = Attempt::new(&item_id, correct, latency_ms, hints_used, now);
        self.store.record_attempt(user_id, &cell_id, attempt).await?;

        let item = calculate_mastery_for_item(
            &self.store,
            &self.scorer,
            user_id,
            &item_id,
            verb,
            form.tense,
            now,
        )
        .await?;
        let cell_score =
            calculate_mastery_for_cell(&self.store, &self.scorer, user_id, &cell, &self.verbs, now).await?;

        let snapshot = MasterySnapshot {
            score: cell_score.score,
            n: cell_score.n,
            weighted_attempts: cell_score.weighted_n,
            updated_at: now,
        };
        self.store.save_mastery(user_id, &cell_id, snapshot.clone()).await?;

        let entry = self
            .srs
            .update_schedule(
                user_id,
                &cell,
                ReviewOutcome {
                    correct,
                    score: cell_score.score,
                },
                now,
            )
            .await?;

        let attempts = self.store.attempts_for_item(user_id, &item_id).await?;
        let confidence = self.scorer.confidence(cell_score.weighted_n);
        let assessment =
            self.scorer
                .classify(cell_score.score, cell_score.weighted_n, average_latency_ms(&attempts));

        tracing::info!(
            user = user_id,
            cell = %cell_id,
            correct,
            score = cell_score.score,
            confidence = ?confidence.level,
            next_due = %entry.due_at,
            "answer recorded"
        );

        Ok(AnswerReport {
            item,
            cell: cell_score,
            snapshot,
            confidence,
            assessment,
            next_due: entry.due_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::allowed_combos;
    use crate::dataset::InMemoryDataset;
    use crate::srs::IntervalScheduler;
    use crate::store::InMemoryStore;
    use crate::types::{FormKind, Level, Mood, Person, Region, Tense};
    use chrono::Duration;

    const DOC: &str = r#"{
        "verbs": [
            { "lemma": "hablar", "type": "regular", "frequency": "high" },
            { "lemma": "comer", "type": "regular" },
            { "lemma": "vivir", "type": "regular" }
        ]
    }"#;

    async fn engine() -> DrillEngine<InMemoryDataset, InMemoryStore, IntervalScheduler> {
        let config = EngineConfig::default();
        let dataset = InMemoryDataset::from_json_str(DOC).unwrap();
        let srs = IntervalScheduler::new(&config);
        DrillEngine::new(dataset, InMemoryStore::new(), srs, config, Some(7)).await
    }

    #[tokio::test]
    async fn next_item_respects_level_and_dialect() {
        let mut engine = engine().await;
        let mut settings = SelectionSettings::new(Level::A1, Region::Rioplatense);
        let combos = allowed_combos(Level::A1);
        let mut previous: Option<Form> = None;

        for _ in 0..30 {
            let form = engine
                .next_item("ana", &mut settings, previous.as_ref())
                .await;
            assert_eq!(form.kind, FormKind::Practice);
            assert!(combos.contains(&(form.mood, form.tense)));
            assert_ne!(form.person, Some(Person::SecondSingularTu));
            assert_ne!(form.person, Some(Person::SecondPluralVosotros));
            previous = Some(form);
        }
    }

    #[tokio::test]
    async fn starved_pool_falls_back_within_requested_mood() {
        let mut engine = engine().await;
        let mut settings =
            SelectionSettings::specific(Level::C2, Region::LaGeneral, Mood::Subjunctive, Some(Tense::SubjPlusc));
        // an empty whitelist starves the eligible pool
        settings.allowed_lemmas = Some(Default::default());
        let form = engine.next_item("ana", &mut settings, None).await;
        assert_eq!(form.mood, Mood::Subjunctive);
    }

    #[tokio::test]
    async fn recording_answers_updates_mastery_and_schedule() {
        let engine = engine().await;
        let now = Utc::now();
        let form = Form::new(
            "hablar",
            Mood::Indicative,
            Tense::Pres,
            Some(Person::FirstSingular),
            "hablo",
        );

        let first = engine
            .record_answer_at("ana", &form, true, 2000, 0, now)
            .await
            .unwrap();
        assert_eq!(first.cell.n, 1);
        assert!(first.next_due > now);

        let miss = engine
            .record_answer_at("ana", &form, false, 2000, 0, now)
            .await
            .unwrap();
        assert_eq!(miss.cell.n, 2);
        assert!(miss.snapshot.score < first.snapshot.score);
        assert_eq!(miss.next_due, now + Duration::minutes(10));

        let stored = engine
            .store()
            .mastery("ana", &form.cell().id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.score, miss.snapshot.score);

        let due = engine
            .srs()
            .get_due_items("ana", now + Duration::minutes(11))
            .await
            .unwrap();
        assert_eq!(due, vec![form.cell()]);
    }
}
