mod common;

use std::collections::HashSet;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use conjugation_engine::config::SelectionWeights;
use conjugation_engine::curriculum::allowed_combos;
use conjugation_engine::eligibility::{filter_eligible_forms, filter_with_report, FilterContext};
use conjugation_engine::selector::{Selection, SelectionContext, WeightedSelector};
use conjugation_engine::settings::{SelectionSettings, VerbTypeFilter};
use conjugation_engine::types::{Level, Mood, Person, Region, Tense, VerbType};

use common::sample_forms;

#[tokio::test]
async fn a1_pool_is_present_and_participle_only() {
    let (verbs, forms) = sample_forms().await;
    let settings = SelectionSettings::new(Level::A1, Region::LaGeneral);
    let eligible = filter_eligible_forms(&forms, &settings, FilterContext::new(&verbs));

    assert!(!eligible.is_empty());
    let combos = allowed_combos(Level::A1);
    for form in &eligible {
        assert!(combos.contains(&(form.mood, form.tense)), "{form:?}");
        assert_ne!(form.person, Some(Person::SecondSingularVos));
        assert_ne!(form.person, Some(Person::SecondPluralVosotros));
    }
}

#[tokio::test]
async fn dialect_tagged_forms_only_reach_their_region() {
    let (verbs, forms) = sample_forms().await;

    let rio = SelectionSettings::new(Level::B1, Region::Rioplatense);
    let rio_pool = filter_eligible_forms(&forms, &rio, FilterContext::new(&verbs));
    let rio_values: HashSet<&str> = rio_pool.iter().map(|f| f.value.as_str()).collect();
    assert!(rio_values.contains("tenés"));
    assert!(!rio_values.contains("tenéis"));
    assert!(rio_pool
        .iter()
        .all(|f| f.person != Some(Person::SecondSingularTu)));

    let pen = SelectionSettings::new(Level::B1, Region::Peninsular);
    let pen_pool = filter_eligible_forms(&forms, &pen, FilterContext::new(&verbs));
    let pen_values: HashSet<&str> = pen_pool.iter().map(|f| f.value.as_str()).collect();
    assert!(pen_values.contains("tenéis"));
    assert!(!pen_values.contains("tenés"));
}

#[tokio::test]
async fn report_and_plain_filter_agree() {
    let (verbs, forms) = sample_forms().await;
    let mut settings = SelectionSettings::new(Level::B2, Region::Peninsular);
    settings.verb_type = VerbTypeFilter::Irregular;

    let plain = filter_eligible_forms(&forms, &settings, FilterContext::new(&verbs));
    let (reported, stages) = filter_with_report(&forms, &settings, FilterContext::new(&verbs));

    assert_eq!(plain, reported);
    assert!(!plain.is_empty());
    assert!(plain
        .iter()
        .all(|f| f.verb_type == Some(VerbType::Irregular)));
    let removed: usize = stages.iter().map(|s| s.removed()).sum();
    assert_eq!(removed + plain.len(), forms.len());
}

#[tokio::test]
async fn family_selection_narrows_to_matching_lemmas() {
    let (verbs, forms) = sample_forms().await;
    let mut settings = SelectionSettings::new(Level::B1, Region::LaGeneral);
    settings.selected_family = Some("E_I_IR".to_string());

    let pool = filter_eligible_forms(&forms, &settings, FilterContext::new(&verbs));
    assert!(pool.iter().any(|f| f.lemma == "pedir"));
    assert!(pool.iter().all(|f| f.lemma != "hablar" && f.lemma != "comer"));
}

#[tokio::test]
async fn specific_request_is_always_honoured() {
    let (verbs, forms) = sample_forms().await;
    let mut settings =
        SelectionSettings::specific(Level::B1, Region::LaGeneral, Mood::Subjunctive, Some(Tense::SubjPres));
    let eligible = filter_eligible_forms(&forms, &settings, FilterContext::new(&verbs));
    assert!(eligible.iter().all(|f| f.tense == Tense::SubjPres));

    let weights = SelectionWeights::default();
    let selector = WeightedSelector::new(&weights);
    let ctx = SelectionContext::new(&verbs, Utc::now());
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..50 {
        match selector.select(&eligible, &mut settings, &ctx, &mut rng) {
            Some(Selection::Drawn(form)) | Some(Selection::Retried(form)) => {
                assert_eq!(form.mood, Mood::Subjunctive);
                assert_eq!(form.tense, Tense::SubjPres);
            }
            other => panic!("unexpected selection: {other:?}"),
        }
    }
}

#[tokio::test]
async fn previous_form_is_not_repeated() {
    let (verbs, forms) = sample_forms().await;
    let mut settings = SelectionSettings::new(Level::A1, Region::LaGeneral);
    let eligible = filter_eligible_forms(&forms, &settings, FilterContext::new(&verbs));

    let weights = SelectionWeights::default();
    let selector = WeightedSelector::new(&weights);
    let mut rng = StdRng::seed_from_u64(3);
    let mut previous = eligible[0].clone();

    for _ in 0..40 {
        let mut ctx = SelectionContext::new(&verbs, Utc::now());
        ctx.previous = Some(&previous);
        let next = match selector.select(&eligible, &mut settings, &ctx, &mut rng) {
            Some(Selection::Drawn(form)) | Some(Selection::Retried(form)) => form,
            other => panic!("unexpected selection: {other:?}"),
        };
        assert!(!next.same_item(&previous));
        previous = next;
    }
}

#[tokio::test]
async fn regular_only_requests_never_draw_irregular_forms() {
    let (verbs, forms) = sample_forms().await;
    let mut settings = SelectionSettings::new(Level::B2, Region::LaGeneral);
    settings.verb_type = VerbTypeFilter::Regular;
    let eligible = filter_eligible_forms(&forms, &settings, FilterContext::new(&verbs));
    assert!(!eligible.is_empty());

    let weights = SelectionWeights::default();
    let selector = WeightedSelector::new(&weights);
    let ctx = SelectionContext::new(&verbs, Utc::now());
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..60 {
        match selector.select(&eligible, &mut settings, &ctx, &mut rng) {
            Some(Selection::Drawn(form)) => assert_eq!(form.verb_type, Some(VerbType::Regular)),
            other => panic!("unexpected selection: {other:?}"),
        }
    }
}
