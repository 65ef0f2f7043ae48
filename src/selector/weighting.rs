//! Pool-shaping steps that run before the draw.
//!
//! Weighting is repetition: a form that should be twice as likely appears twice, and
//! the draw stays uniform over whatever list comes out of here.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::SelectionWeights;
use crate::eligibility::VerbIndex;
use crate::morphology;
use crate::settings::SelectionSettings;
use crate::types::{Cell, Form, Level, Mood, Tense, VerbType};

use super::SelectionContext;

/// Drops the previously shown item (or its whole lemma in specific practice).
pub fn exclude_repeat<'a>(
    pool: Vec<&'a Form>,
    previous: Option<&Form>,
    whole_lemma: bool,
) -> Vec<&'a Form> {
    let Some(previous) = previous else {
        return pool;
    };
    let kept: Vec<&Form> = pool
        .iter()
        .copied()
        .filter(|form| {
            if whole_lemma {
                form.lemma != previous.lemma
            } else {
                !form.same_item(previous)
            }
        })
        .collect();
    if kept.is_empty() {
        pool
    } else {
        kept
    }
}

/// Regular only when the form or its verb's tense entry says so; unknown counts as irregular.
pub fn is_regular_typed(form: &Form, verbs: &VerbIndex) -> bool {
    match form.verb_type {
        Some(t) => t == VerbType::Regular,
        None => verbs
            .get(&form.lemma)
            .map_or(false, |v| !v.is_irregular_in(form.tense)),
    }
}

/// Resamples toward `ratio` regular forms without replacement, back-filling from the
/// other sub-pool when one side runs short.
pub fn balance_verb_types<'a, R: Rng + ?Sized>(
    pool: Vec<&'a Form>,
    ratio: f64,
    sample_size: usize,
    verbs: &VerbIndex,
    rng: &mut R,
) -> Vec<&'a Form> {
    let (mut regular, mut irregular): (Vec<&'a Form>, Vec<&'a Form>) = pool
        .iter()
        .copied()
        .partition(|form| is_regular_typed(form, verbs));
    if regular.is_empty() || irregular.is_empty() {
        return pool;
    }

    let target = pool.len().min(sample_size.max(1));
    let ratio = ratio.clamp(0.0, 1.0);
    let regular_quota = ((target as f64) * ratio).round() as usize;
    let irregular_quota = target - regular_quota;

    regular.shuffle(rng);
    irregular.shuffle(rng);

    let take_regular = regular_quota.min(regular.len());
    let take_irregular = irregular_quota.min(irregular.len());
    let mut out: Vec<&Form> = Vec::with_capacity(target);
    out.extend(regular.drain(..take_regular));
    out.extend(irregular.drain(..take_irregular));

    let shortfall = target - out.len();
    if shortfall > 0 {
        let mut leftovers: Vec<&Form> = regular.into_iter().chain(irregular).collect();
        leftovers.truncate(shortfall);
        out.extend(leftovers);
    }

    tracing::debug!(
        pool = pool.len(),
        target,
        regular_quota,
        irregular_quota,
        "balanced verb types"
    );
    out
}

/// At A1, participles stay out of the way until verbs themselves are taught.
pub fn early_level_override<'a, R: Rng + ?Sized>(
    pool: Vec<&'a Form>,
    level: Level,
    present_bias: f64,
    rng: &mut R,
) -> Vec<&'a Form> {
    if level != Level::A1 {
        return pool;
    }
    let is_present = |f: &Form| f.mood == Mood::Indicative && f.tense == Tense::Pres;
    let is_participle = |f: &Form| f.tense == Tense::Part;

    let has_present = pool.iter().any(|f| is_present(*f));
    let has_participle = pool.iter().any(|f| is_participle(*f));
    if !(has_present && has_participle) {
        return pool;
    }

    if rng.random::<f64>() < present_bias {
        pool.into_iter().filter(|f| is_present(*f)).collect()
    } else {
        pool.into_iter().filter(|f| is_participle(*f)).collect()
    }
}

/// Keeps the first-listed spelling when a cell has several accepted participles.
pub fn collapse_participle_variants(pool: Vec<&Form>) -> Vec<&Form> {
    let mut seen: HashSet<Cell> = HashSet::new();
    pool.into_iter()
        .filter(|form| form.tense != Tense::Part || seen.insert(form.cell()))
        .collect()
}

/// Copies per form from the level table.
pub fn level_weight(level: Level, tense: Tense) -> usize {
    match level {
        Level::A1 => 1,
        Level::A2 => match tense {
            Tense::PretIndef => 3,
            Tense::Impf | Tense::Fut => 2,
            _ => 1,
        },
        Level::B1 => match tense {
            Tense::SubjPres => 4,
            Tense::ImpNeg => 3,
            t if t.is_compound() => 1,
            _ => 2,
        },
        Level::B2 => match tense {
            Tense::SubjImpf | Tense::SubjPres | Tense::ImpNeg => 3,
            t if t.is_compound() => 1,
            _ => 2,
        },
        Level::C1 | Level::C2 | Level::All => match tense {
            Tense::SubjImpf | Tense::SubjPlusc => 3,
            _ => 2,
        },
    }
}

/// Repeats each form by its level weight plus SRS boosts.
pub fn curriculum_weighting<'a>(
    pool: Vec<&'a Form>,
    settings: &SelectionSettings,
    ctx: &SelectionContext<'_>,
    weights: &SelectionWeights,
) -> Vec<&'a Form> {
    let mut out: Vec<&Form> = Vec::with_capacity(pool.len() * 2);
    let mut boosted = 0usize;

    for form in pool {
        let mut copies = level_weight(settings.level, form.tense);
        let cell_id = form.cell().id();

        if ctx.is_due(&cell_id) || settings.is_due(&cell_id, ctx.now) {
            copies += weights.due_boost;
            boosted += 1;
        }
        if ctx
            .mastery_of(&cell_id)
            .map_or(false, |score| score < weights.low_mastery_threshold)
        {
            copies += weights.low_mastery_boost;
        }

        out.extend(std::iter::repeat(form).take(copies));
    }

    if boosted > 0 {
        tracing::debug!(boosted, "due cells boosted");
    }
    out
}

/// Narrows to forms that verify as regular, unless nothing would survive.
pub fn regular_purity(pool: Vec<&Form>) -> Vec<&Form> {
    let pure: Vec<&Form> = pool
        .iter()
        .copied()
        .filter(|form| morphology::is_regular_form(form))
        .collect();
    if pure.is_empty() {
        pool
    } else {
        pure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Person, Verb};
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn pres(lemma: &str, person: Person, value: &str) -> Form {
        Form::new(lemma, Mood::Indicative, Tense::Pres, Some(person), value)
    }

    #[test]
    fn repeat_exclusion_never_empties_pool() {
        let only = pres("hablar", Person::FirstSingular, "hablo");
        let pool = vec![&only];
        let out = exclude_repeat(pool, Some(&only), false);
        assert_eq!(out.len(), 1);

        let other = pres("hablar", Person::ThirdSingular, "habla");
        let out = exclude_repeat(vec![&only, &other], Some(&only), false);
        assert_eq!(out, vec![&other]);

        let comer = pres("comer", Person::FirstSingular, "como");
        let out = exclude_repeat(vec![&only, &other, &comer], Some(&only), true);
        assert_eq!(out, vec![&comer]);
    }

    #[test]
    fn balance_respects_quota_and_backfills() {
        let mut verbs: VerbIndex = HashMap::new();
        verbs.insert("hablar".into(), Verb::new("hablar", VerbType::Regular));
        verbs.insert("tener".into(), Verb::new("tener", VerbType::Irregular));

        let regular: Vec<Form> = (0..20)
            .map(|i| pres("hablar", Person::ThirdSingular, &format!("r{i}")))
            .collect();
        let irregular: Vec<Form> = (0..20)
            .map(|i| pres("tener", Person::ThirdSingular, &format!("i{i}")))
            .collect();
        let pool: Vec<&Form> = regular.iter().chain(irregular.iter()).collect();

        let mut rng = StdRng::seed_from_u64(1);
        let out = balance_verb_types(pool.clone(), 0.3, 10, &verbs, &mut rng);
        assert_eq!(out.len(), 10);
        assert_eq!(out.iter().filter(|f| f.lemma == "hablar").count(), 3);

        // only two irregulars available: the shortfall comes from the regular side
        let pool: Vec<&Form> = regular.iter().chain(irregular.iter().take(2)).collect();
        let out = balance_verb_types(pool, 0.3, 10, &verbs, &mut rng);
        assert_eq!(out.len(), 10);
        assert_eq!(out.iter().filter(|f| f.lemma == "tener").count(), 2);
        let distinct: HashSet<&str> = out.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(distinct.len(), 10);
    }

    #[test]
    fn untagged_forms_are_typed_per_tense() {
        let mut pensar = Verb::new("pensar", VerbType::Irregular);
        pensar.irregularity.insert(Tense::Impf, false);
        let mut verbs: VerbIndex = HashMap::new();
        verbs.insert("pensar".into(), pensar);

        let impf = Form::new("pensar", Mood::Indicative, Tense::Impf, Some(Person::FirstSingular), "pensaba");
        let present = pres("pensar", Person::FirstSingular, "pienso");
        assert!(is_regular_typed(&impf, &verbs));
        assert!(!is_regular_typed(&present, &verbs));
        // an explicit tag on the form wins
        assert!(!is_regular_typed(&impf.clone().with_type(VerbType::Irregular), &verbs));
        assert!(!is_regular_typed(&pres("nadie", Person::FirstSingular, "x"), &verbs));
    }

    #[test]
    fn early_level_prefers_present() {
        let p = pres("hablar", Person::FirstSingular, "hablo");
        let part = Form::new("hablar", Mood::Nonfinite, Tense::Part, None, "hablado");
        let mut rng = StdRng::seed_from_u64(3);
        let out = early_level_override(vec![&p, &part], Level::A1, 1.0, &mut rng);
        assert_eq!(out, vec![&p]);
        let out = early_level_override(vec![&p, &part], Level::A1, 0.0, &mut rng);
        assert_eq!(out, vec![&part]);
        let out = early_level_override(vec![&p, &part], Level::A2, 0.0, &mut rng);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn participle_variants_collapse_to_first() {
        let first = Form::new("imprimir", Mood::Nonfinite, Tense::Part, None, "impreso");
        let second = Form::new("imprimir", Mood::Nonfinite, Tense::Part, None, "imprimido");
        let out = collapse_participle_variants(vec![&first, &second]);
        assert_eq!(out, vec![&first]);
    }

    #[test]
    fn weighting_favours_salient_tenses_and_due_cells() {
        assert!(level_weight(Level::B1, Tense::SubjPres) > level_weight(Level::B1, Tense::PretPerf));
        assert!(level_weight(Level::B2, Tense::Pres) > level_weight(Level::B2, Tense::CondPerf));

        let subj = Form::new(
            "hablar",
            Mood::Subjunctive,
            Tense::SubjPres,
            Some(Person::FirstSingular),
            "hable",
        );
        let perf = Form::new(
            "hablar",
            Mood::Indicative,
            Tense::PretPerf,
            Some(Person::FirstSingular),
            "he hablado",
        );
        let weights = SelectionWeights::default();
        let verbs = VerbIndex::new();
        let due: HashSet<String> = [perf.cell().id()].into_iter().collect();
        let ctx = SelectionContext {
            due_cells: Some(&due),
            ..SelectionContext::new(&verbs, Utc::now())
        };
        let settings = SelectionSettings::new(Level::B1, crate::types::Region::LaGeneral);
        let out = curriculum_weighting(vec![&subj, &perf], &settings, &ctx, &weights);
        assert_eq!(out.iter().filter(|f| f.tense == Tense::SubjPres).count(), 4);
        assert_eq!(out.iter().filter(|f| f.tense == Tense::PretPerf).count(), 1 + 3);
    }

    #[test]
    fn purity_pass_drops_irregular_surface_forms() {
        let good = pres("hablar", Person::FirstSingular, "hablo");
        let bad = pres("tener", Person::FirstSingular, "tengo");
        assert_eq!(regular_purity(vec![&good, &bad]), vec![&good]);
        assert_eq!(regular_purity(vec![&bad]), vec![&bad]);
    }
}
