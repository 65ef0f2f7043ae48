use std::collections::HashSet;

use rand::Rng;

use crate::curriculum;
use crate::dataset::{InMemoryDataset, VerbDataset};
use crate::eligibility::VerbIndex;
use crate::selector::weighting::is_regular_typed;
use crate::settings::{SelectionSettings, VerbTypeFilter};
use crate::types::{Form, Level, Mood, Person, Region, Tense};

/// What the caller originally asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPreferences {
    pub level: Level,
    pub region: Region,
    pub verb_type: VerbTypeFilter,
    pub mood: Option<Mood>,
    pub tense: Option<Tense>,
    pub enable_futuro_subj_prod: bool,
}

impl From<&SelectionSettings> for FallbackPreferences {
    fn from(settings: &SelectionSettings) -> Self {
        let (mood, tense) = if settings.is_specific() {
            (settings.specific_mood, settings.specific_tense)
        } else {
            (None, None)
        };
        Self {
            level: settings.level,
            region: settings.region,
            verb_type: settings.verb_type,
            mood,
            tense,
            enable_futuro_subj_prod: settings.enable_futuro_subj_prod,
        }
    }
}

impl FallbackPreferences {
    fn target_mood(&self) -> Mood {
        self.mood
            .or_else(|| self.tense.map(|t| t.mood()))
            .unwrap_or(Mood::Indicative)
    }

    fn target_tense(&self) -> Tense {
        self.tense
            .unwrap_or_else(|| self.target_mood().most_common_tense())
    }

    /// The archaic subjunctive future stays hidden at every tier unless switched on.
    fn tense_producible(&self, tense: Tense) -> bool {
        tense != Tense::SubjFut || self.enable_futuro_subj_prod
    }
}

/// Constraints dropped so far, in the order they are given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Relaxation {
    Nothing,
    Level,
    VerbType,
    Tense,
    Mood,
}

impl Relaxation {
    pub const LADDER: [Relaxation; 5] = [
        Self::Nothing,
        Self::Level,
        Self::VerbType,
        Self::Tense,
        Self::Mood,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTier {
    Relaxed(Relaxation),
    DatasetRescan,
    Sentinel,
}

/// Last-resort resolution for an empty pool or an unsatisfiable specific request.
pub struct EmergencyFallbackProvider<'a, D> {
    dataset: Option<&'a D>,
    verbs: &'a VerbIndex,
}

impl<'a> EmergencyFallbackProvider<'a, InMemoryDataset> {
    /// Provider with no dataset behind it; tier 2 is skipped.
    pub fn pool_only(verbs: &'a VerbIndex) -> Self {
        Self {
            dataset: None,
            verbs,
        }
    }
}

impl<'a, D: VerbDataset> EmergencyFallbackProvider<'a, D> {
    pub fn new(dataset: &'a D, verbs: &'a VerbIndex) -> Self {
        Self {
            dataset: Some(dataset),
            verbs,
        }
    }

    fn dialect_legal(form: &Form, persons: &HashSet<Person>, region: Region) -> bool {
        let person_ok = !form.is_finite() || form.person.map_or(true, |p| persons.contains(&p));
        person_ok && region.accepts_tag(form.region_tag)
    }

    fn admits(
        &self,
        form: &Form,
        prefs: &FallbackPreferences,
        relaxed: Relaxation,
        combos: &HashSet<(Mood, Tense)>,
        persons: &HashSet<Person>,
    ) -> bool {
        if form.is_sentinel() || form.is_infinitive() || !prefs.tense_producible(form.tense) {
            return false;
        }
        if !Self::dialect_legal(form, persons, prefs.region) {
            return false;
        }
        if relaxed < Relaxation::Level && !combos.contains(&(form.mood, form.tense)) {
            return false;
        }
        if relaxed < Relaxation::VerbType {
            let regular = is_regular_typed(form, self.verbs);
            let type_ok = match prefs.verb_type {
                VerbTypeFilter::All => true,
                VerbTypeFilter::Regular => regular,
                VerbTypeFilter::Irregular => !regular,
            };
            if !type_ok {
                return false;
            }
        }
        if relaxed < Relaxation::Tense && !prefs.tense.map_or(true, |t| form.tense.satisfies(t)) {
            return false;
        }
        if relaxed < Relaxation::Mood && !prefs.mood.map_or(true, |m| form.mood == m) {
            return false;
        }
        true
    }

    /// Tier 1: widen the original pool one constraint at a time, keeping what was
    /// already given up.
    pub fn relax<'f, R: Rng + ?Sized>(
        &self,
        all_forms: &'f [Form],
        prefs: &FallbackPreferences,
        rng: &mut R,
    ) -> Option<(Relaxation, &'f Form)> {
        let combos = curriculum::allowed_combos(prefs.level);
        let persons = curriculum::allowed_persons(prefs.region);

        for step in Relaxation::LADDER {
            let pool: Vec<&Form> = all_forms
                .iter()
                .filter(|f| self.admits(f, prefs, step, &combos, &persons))
                .collect();
            if !pool.is_empty() {
                let pick = pool[rng.random_range(0..pool.len())];
                return Some((step, pick));
            }
        }
        None
    }

    async fn rescan<R: Rng + ?Sized>(
        &self,
        prefs: &FallbackPreferences,
        rng: &mut R,
    ) -> Option<Form> {
        let dataset = self.dataset?;
        let persons = curriculum::allowed_persons(prefs.region);
        let mood = prefs.target_mood();
        let requested = prefs.target_tense();

        let mut tenses = vec![requested];
        let common = mood.most_common_tense();
        if common != requested {
            tenses.push(common);
        }

        for tense in tenses {
            let matches: Vec<Form> = dataset
                .forms_for(mood, tense)
                .await
                .into_iter()
                .filter(|f| {
                    !f.is_sentinel()
                        && !f.is_infinitive()
                        && prefs.tense_producible(f.tense)
                        && Self::dialect_legal(f, &persons, prefs.region)
                })
                .collect();
            if !matches.is_empty() {
                let idx = rng.random_range(0..matches.len());
                return matches.into_iter().nth(idx);
            }
        }
        None
    }

    pub async fn resolve_with_tier<R: Rng + ?Sized>(
        &self,
        all_forms: &[Form],
        prefs: &FallbackPreferences,
        rng: &mut R,
    ) -> (Form, FallbackTier) {
        if let Some((step, form)) = self.relax(all_forms, prefs, rng) {
            tracing::info!(relaxed = ?step, lemma = %form.lemma, "fallback: relaxed pool");
            return (form.clone(), FallbackTier::Relaxed(step));
        }

        if let Some(form) = self.rescan(prefs, rng).await {
            tracing::warn!(
                mood = %form.mood,
                tense = %form.tense,
                lemma = %form.lemma,
                "fallback: dataset rescan"
            );
            return (form, FallbackTier::DatasetRescan);
        }

        let mood = prefs.target_mood();
        let tense = prefs.target_tense();
        tracing::error!(%mood, %tense, "fallback: no forms anywhere, returning sentinel");
        (Form::sentinel(mood, tense), FallbackTier::Sentinel)
    }

    /// Never fails; the worst case is a visibly marked placeholder.
    pub async fn resolve<R: Rng + ?Sized>(
        &self,
        all_forms: &[Form],
        prefs: &FallbackPreferences,
        rng: &mut R,
    ) -> Form {
        self.resolve_with_tier(all_forms, prefs, rng).await.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Verb, VerbType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn prefs(level: Level, mood: Option<Mood>, tense: Option<Tense>) -> FallbackPreferences {
        FallbackPreferences {
            level,
            region: Region::LaGeneral,
            verb_type: VerbTypeFilter::All,
            mood,
            tense,
            enable_futuro_subj_prod: false,
        }
    }

    fn verbs() -> VerbIndex {
        let mut v = VerbIndex::new();
        v.insert("hablar".into(), Verb::new("hablar", VerbType::Regular));
        v
    }

    #[tokio::test]
    async fn relaxes_level_before_anything_else() {
        let verbs = verbs();
        let provider = EmergencyFallbackProvider::pool_only(&verbs);
        let forms = vec![
            Form::new(
                "hablar",
                Mood::Subjunctive,
                Tense::SubjImpf,
                Some(Person::FirstSingular),
                "hablara",
            ),
            Form::new(
                "hablar",
                Mood::Indicative,
                Tense::Pres,
                Some(Person::FirstSingular),
                "hablo",
            ),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let p = prefs(Level::A1, Some(Mood::Subjunctive), Some(Tense::SubjImpf));
        let (form, tier) = provider.resolve_with_tier(&forms, &p, &mut rng).await;
        assert_eq!(tier, FallbackTier::Relaxed(Relaxation::Level));
        assert_eq!(form.value, "hablara");
    }

    #[tokio::test]
    async fn never_crosses_dialect_or_returns_infinitives() {
        let verbs = verbs();
        let provider = EmergencyFallbackProvider::pool_only(&verbs);
        let forms = vec![
            Form::new(
                "hablar",
                Mood::Indicative,
                Tense::Pres,
                Some(Person::SecondSingularVos),
                "hablás",
            ),
            Form::new("hablar", Mood::Nonfinite, Tense::Inf, None, "hablar"),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let p = prefs(Level::C2, None, None);
        let (form, tier) = provider.resolve_with_tier(&forms, &p, &mut rng).await;
        assert_eq!(tier, FallbackTier::Sentinel);
        assert!(form.is_sentinel());
        assert_eq!(form.mood, Mood::Indicative);
        assert_eq!(form.tense, Tense::Pres);
    }

    #[tokio::test]
    async fn relaxing_never_revives_the_subjunctive_future() {
        let verbs = verbs();
        let provider = EmergencyFallbackProvider::pool_only(&verbs);
        let forms = vec![
            Form::new(
                "hablar",
                Mood::Subjunctive,
                Tense::SubjFut,
                Some(Person::ThirdPlural),
                "hablaren",
            ),
            Form::new("hablar", Mood::Nonfinite, Tense::Inf, None, "hablar"),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = prefs(Level::C2, None, None);
        let (form, tier) = provider.resolve_with_tier(&forms, &p, &mut rng).await;
        assert_eq!(tier, FallbackTier::Sentinel);
        assert!(form.is_sentinel());

        p.enable_futuro_subj_prod = true;
        let (form, tier) = provider.resolve_with_tier(&forms, &p, &mut rng).await;
        assert_eq!(tier, FallbackTier::Relaxed(Relaxation::Nothing));
        assert_eq!(form.value, "hablaren");
    }

    #[tokio::test]
    async fn rescans_dataset_at_most_common_tense() {
        let dataset = InMemoryDataset::from_json_str(
            r#"{ "verbs": [ {
                "lemma": "ser",
                "type": "irregular",
                "forms": [
                    { "mood": "subjunctive", "tense": "subjPres", "person": "1s", "value": "sea" },
                    { "mood": "subjunctive", "tense": "subjPres", "person": "3s", "value": "sea" }
                ]
            } ] }"#,
        )
        .unwrap();
        let provider = EmergencyFallbackProvider::new(&dataset, dataset.verb_index());
        let mut rng = StdRng::seed_from_u64(9);
        // ser has no subjImpf forms, so the rescan drops to subjPres
        let p = prefs(Level::C2, Some(Mood::Subjunctive), Some(Tense::SubjImpf));
        let (form, tier) = provider.resolve_with_tier(&[], &p, &mut rng).await;
        assert_eq!(tier, FallbackTier::DatasetRescan);
        assert_eq!(form.tense, Tense::SubjPres);
        assert_eq!(form.value, "sea");
    }
}
