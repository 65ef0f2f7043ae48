//! Weighted draw over the eligible pool.
//!
//! Steps run in a fixed order: repeat exclusion, regular/irregular balance, the A1
//! present-tense override, participle tie-break, curriculum and SRS weighting, the
//! regular purity pass, person rotation, the draw, enclitic attachment and finally
//! strict validation of specific requests.

pub mod clitics;
pub mod variety;
pub mod weighting;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::SelectionWeights;
use crate::dataset::VerbDataset;
use crate::eligibility::VerbIndex;
use crate::fallback::{EmergencyFallbackProvider, FallbackPreferences};
use crate::morphology::Conjugation;
use crate::settings::{SelectionSettings, VerbTypeFilter};
use crate::types::{Form, Level};

/// Per-call signals from outside the pool.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub verbs: &'a VerbIndex,
    pub previous: Option<&'a Form>,
    /// Cell ids the scheduler reports as due.
    pub due_cells: Option<&'a HashSet<String>>,
    /// Cell id -> mastery score.
    pub mastery: Option<&'a HashMap<String, f64>>,
    /// Adaptive override of the regular share, clamped to [0, 1].
    pub regular_ratio: Option<f64>,
    /// Enclitic chance for sessions that leave theirs unset.
    pub default_clitics_percentage: u8,
    pub now: DateTime<Utc>,
}

impl<'a> SelectionContext<'a> {
    pub fn new(verbs: &'a VerbIndex, now: DateTime<Utc>) -> Self {
        Self {
            verbs,
            previous: None,
            due_cells: None,
            mastery: None,
            regular_ratio: None,
            default_clitics_percentage: 0,
            now,
        }
    }

    pub fn is_due(&self, cell_id: &str) -> bool {
        self.due_cells.map_or(false, |due| due.contains(cell_id))
    }

    pub fn mastery_of(&self, cell_id: &str) -> Option<f64> {
        self.mastery.and_then(|m| m.get(cell_id).copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Drawn(Form),
    /// The draw missed a specific request and an exact match was taken instead.
    Retried(Form),
    /// Specific request with no exact match in the eligible pool.
    Unsatisfied,
}

/// Splits by ending and picks a bucket with a fixed skew against -ar.
fn draw_by_ending<'a, R: Rng + ?Sized>(
    pool: &[&'a Form],
    weights: &SelectionWeights,
    rng: &mut R,
) -> Option<&'a Form> {
    let bucket = |c: Conjugation| -> Vec<&'a Form> {
        pool.iter()
            .copied()
            .filter(|f| Conjugation::of(&f.lemma) == Some(c))
            .collect()
    };
    let ir = bucket(Conjugation::Ir);
    let er = bucket(Conjugation::Er);
    let ar = bucket(Conjugation::Ar);

    let chosen = if rng.random::<f64>() < weights.ir_bucket_chance && !ir.is_empty() {
        ir
    } else if rng.random::<f64>() < weights.er_bucket_chance && !er.is_empty() {
        er
    } else if !ar.is_empty() {
        ar
    } else if !ir.is_empty() {
        ir
    } else {
        er
    };

    if chosen.is_empty() {
        return None;
    }
    Some(chosen[rng.random_range(0..chosen.len())])
}

/// Uniform over the (possibly repeated) pool.
pub fn draw<'a, R: Rng + ?Sized>(
    pool: &[&'a Form],
    settings: &SelectionSettings,
    weights: &SelectionWeights,
    rng: &mut R,
) -> Option<&'a Form> {
    if pool.is_empty() {
        return None;
    }
    if settings.is_specific() && settings.is_pure_regular() {
        if let Some(form) = draw_by_ending(pool, weights, rng) {
            return Some(form);
        }
    }
    Some(pool[rng.random_range(0..pool.len())])
}

pub struct WeightedSelector<'a> {
    weights: &'a SelectionWeights,
}

impl<'a> WeightedSelector<'a> {
    pub fn new(weights: &'a SelectionWeights) -> Self {
        Self { weights }
    }

    /// `None` only for an empty pool. Advances the rotation pointer in `settings`.
    pub fn select<R: Rng + ?Sized>(
        &self,
        eligible: &[Form],
        settings: &mut SelectionSettings,
        ctx: &SelectionContext<'_>,
        rng: &mut R,
    ) -> Option<Selection> {
        if eligible.is_empty() {
            return None;
        }
        let specific = settings.is_specific();

        let mut pool: Vec<&Form> = eligible.iter().collect();
        pool = weighting::exclude_repeat(pool, ctx.previous, specific);

        if settings.verb_type == VerbTypeFilter::All {
            let ratio = ctx.regular_ratio.unwrap_or(self.weights.regular_ratio);
            pool = weighting::balance_verb_types(
                pool,
                ratio,
                self.weights.balance_sample_size,
                ctx.verbs,
                rng,
            );
        }

        pool = weighting::early_level_override(
            pool,
            settings.level,
            self.weights.early_present_bias,
            rng,
        );
        pool = weighting::collapse_participle_variants(pool);
        pool = weighting::curriculum_weighting(pool, settings, ctx, self.weights);

        if settings.is_pure_regular() {
            pool = weighting::regular_purity(pool);
        }

        if settings.level.is_at_least(Level::C2) {
            pool = variety::rotate_persons(
                pool,
                settings.region,
                &mut settings.variety,
                ctx.previous,
                self.weights.rotation_boost,
            );
        }

        let drawn = draw(&pool, settings, self.weights, rng)?.clone();

        let form = if settings.level.is_at_least(Level::C1) {
            clitics::maybe_attach(
                drawn,
                settings
                    .clitics_percentage
                    .unwrap_or(ctx.default_clitics_percentage),
                self.weights.double_clitic_chance,
                rng,
            )
        } else {
            drawn
        };

        if !specific || form.matches_request(settings.specific_mood, settings.specific_tense) {
            return Some(Selection::Drawn(form));
        }

        tracing::debug!(
            lemma = %form.lemma,
            mood = %form.mood,
            tense = %form.tense,
            "drawn form misses the specific request, retrying"
        );
        let exact: Vec<&Form> = eligible
            .iter()
            .filter(|f| f.matches_request(settings.specific_mood, settings.specific_tense))
            .collect();
        if exact.is_empty() {
            return Some(Selection::Unsatisfied);
        }
        let pick = exact[rng.random_range(0..exact.len())].clone();
        Some(Selection::Retried(pick))
    }

    /// Full selection contract: an unsatisfiable specific request goes to the
    /// fallback provider instead of ever returning a mismatched item.
    #[allow(clippy::too_many_arguments)]
    pub async fn select_form<D: VerbDataset, R: Rng + ?Sized>(
        &self,
        eligible: &[Form],
        all_forms: &[Form],
        settings: &mut SelectionSettings,
        ctx: &SelectionContext<'_>,
        fallback: &EmergencyFallbackProvider<'_, D>,
        rng: &mut R,
    ) -> Option<Form> {
        match self.select(eligible, settings, ctx, rng)? {
            Selection::Drawn(form) | Selection::Retried(form) => Some(form),
            Selection::Unsatisfied => {
                let prefs = FallbackPreferences::from(&*settings);
                Some(fallback.resolve(all_forms, &prefs, rng).await)
            }
        }
    }
}
