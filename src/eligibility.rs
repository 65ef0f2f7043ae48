//! Eligibility filter: an ordered pipeline of independent predicates.
//!
//! A form survives only if every stage admits it. The order only affects which
//! stage is reported as having consumed a form.

use std::collections::HashMap;

use serde::Serialize;

use crate::curriculum::CurriculumGate;
use crate::families::{self, FamilySelection};
use crate::morphology;
use crate::settings::{SelectionSettings, VerbTypeFilter};
use crate::types::{Form, Level, Tense, Verb, VerbType};

pub type VerbIndex = HashMap<String, Verb>;

/// Lookup data the filter needs besides the forms themselves.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub verbs: &'a VerbIndex,
}

impl<'a> FilterContext<'a> {
    pub fn new(verbs: &'a VerbIndex) -> Self {
        Self { verbs }
    }

    pub fn verb(&self, lemma: &str) -> Option<&'a Verb> {
        self.verbs.get(lemma)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validity,
    CurriculumDialect,
    RareTense,
    VerbType,
    LevelAppropriate,
    Family,
    LemmaAllowList,
    SpecificPractice,
    NonfiniteExclusion,
}

impl Stage {
    pub const PIPELINE: [Stage; 9] = [
        Self::Validity,
        Self::CurriculumDialect,
        Self::RareTense,
        Self::VerbType,
        Self::LevelAppropriate,
        Self::Family,
        Self::LemmaAllowList,
        Self::SpecificPractice,
        Self::NonfiniteExclusion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validity => "validity",
            Self::CurriculumDialect => "curriculum_dialect",
            Self::RareTense => "rare_tense",
            Self::VerbType => "verb_type",
            Self::LevelAppropriate => "level_appropriate",
            Self::Family => "family",
            Self::LemmaAllowList => "lemma_allow_list",
            Self::SpecificPractice => "specific_practice",
            Self::NonfiniteExclusion => "nonfinite_exclusion",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterReport {
    pub stage: Stage,
    pub before: usize,
    pub after: usize,
}

impl FilterReport {
    pub fn removed(&self) -> usize {
        self.before - self.after
    }
}

/// Per-request filter state; built once, applied to every form.
pub struct EligibilityFilter<'a> {
    settings: &'a SelectionSettings,
    ctx: FilterContext<'a>,
    gate: CurriculumGate,
    family: Option<FamilySelection>,
}

impl<'a> EligibilityFilter<'a> {
    pub fn new(settings: &'a SelectionSettings, ctx: FilterContext<'a>) -> Self {
        Self {
            settings,
            ctx,
            gate: CurriculumGate::new(settings),
            family: settings
                .selected_family
                .as_deref()
                .map(families::expand_selection),
        }
    }

    pub fn admits(&self, stage: Stage, form: &Form) -> bool {
        match stage {
            Stage::Validity => !form.value.trim().is_empty(),
            Stage::CurriculumDialect => self.curriculum_dialect(form),
            Stage::RareTense => form.tense != Tense::SubjFut || self.settings.enable_futuro_subj_prod,
            Stage::VerbType => self.verb_type(form),
            Stage::LevelAppropriate => self.level_appropriate(form),
            Stage::Family => self.family(form),
            Stage::LemmaAllowList => self.lemma_allowed(form),
            Stage::SpecificPractice => self.specific(form),
            Stage::NonfiniteExclusion => !form.is_infinitive(),
        }
    }

    pub fn admits_all(&self, form: &Form) -> bool {
        Stage::PIPELINE.iter().all(|stage| self.admits(*stage, form))
    }

    fn curriculum_dialect(&self, form: &Form) -> bool {
        if self.settings.bypasses_curriculum() {
            return self.gate.admits_dialect(form);
        }
        self.gate.admits(form)
    }

    /// The form's own tag, else the verb's irregularity in that tense.
    fn form_type(&self, form: &Form) -> Option<VerbType> {
        form.verb_type.or_else(|| {
            self.ctx.verb(&form.lemma).map(|v| {
                if v.is_irregular_in(form.tense) {
                    VerbType::Irregular
                } else {
                    VerbType::Regular
                }
            })
        })
    }

    fn verb_type(&self, form: &Form) -> bool {
        match self.settings.verb_type {
            VerbTypeFilter::All => true,
            VerbTypeFilter::Regular => {
                form.verb_type == Some(VerbType::Regular) && morphology::is_regular_form(form)
            }
            VerbTypeFilter::Irregular => self.form_type(form) == Some(VerbType::Irregular),
        }
    }

    fn level_appropriate(&self, form: &Form) -> bool {
        // Regularity outranks level gating.
        if self.settings.is_pure_regular() {
            return true;
        }
        let level = self.settings.level;
        let families = match families::categorize(&form.lemma, self.ctx.verb(&form.lemma)) {
            Ok(families) => families,
            Err(_) => return true,
        };
        if !families::is_defective_or_unipersonal(&families) {
            return true;
        }
        match level {
            Level::A1 | Level::A2 | Level::B1 => false,
            _ => !form.is_finite() || form.person.map_or(false, |p| p.is_third()),
        }
    }

    fn family(&self, form: &Form) -> bool {
        let Some(selection) = &self.family else {
            return true;
        };
        match families::family_admits(form, self.ctx.verb(&form.lemma), selection) {
            Ok(admitted) => admitted,
            Err(err) => {
                tracing::debug!(lemma = %form.lemma, error = %err, "family categorization failed, admitting form");
                true
            }
        }
    }

    fn lemma_allowed(&self, form: &Form) -> bool {
        if self.settings.bypasses_curriculum() {
            return true;
        }
        match &self.settings.allowed_lemmas {
            Some(lemmas) => lemmas.contains(&form.lemma),
            None => true,
        }
    }

    fn specific(&self, form: &Form) -> bool {
        if !self.settings.is_specific() {
            return true;
        }
        form.matches_request(self.settings.specific_mood, self.settings.specific_tense)
    }

    /// Runs the pipeline stage by stage, recording how many forms each one consumed.
    pub fn apply_with_report(&self, forms: &[Form]) -> (Vec<Form>, Vec<FilterReport>) {
        let mut pool: Vec<&Form> = forms.iter().collect();
        let mut reports = Vec::with_capacity(Stage::PIPELINE.len());

        for stage in Stage::PIPELINE {
            let before = pool.len();
            pool.retain(|form| self.admits(stage, form));
            let report = FilterReport {
                stage,
                before,
                after: pool.len(),
            };
            if report.removed() > 0 {
                tracing::debug!(
                    stage = stage.as_str(),
                    removed = report.removed(),
                    remaining = report.after,
                    "eligibility stage"
                );
            }
            reports.push(report);
        }

        (pool.into_iter().cloned().collect(), reports)
    }
}

pub fn filter_with_report(
    forms: &[Form],
    settings: &SelectionSettings,
    ctx: FilterContext<'_>,
) -> (Vec<Form>, Vec<FilterReport>) {
    EligibilityFilter::new(settings, ctx).apply_with_report(forms)
}

pub fn filter_eligible_forms(
    forms: &[Form],
    settings: &SelectionSettings,
    ctx: FilterContext<'_>,
) -> Vec<Form> {
    let filter = EligibilityFilter::new(settings, ctx);
    forms
        .iter()
        .filter(|form| filter.admits_all(form))
        .cloned()
        .collect()
}
