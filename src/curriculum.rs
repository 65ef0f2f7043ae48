//! Curriculum and dialect legality.
//!
//! A level unlocks every (mood, tense) combination whose canonical level is at or
//! below it; a region fixes which grammatical persons are in use.

use std::collections::HashSet;

use crate::settings::SelectionSettings;
use crate::types::{Form, Level, Mood, Person, Region, Tense};

/// Canonical level at which each combination is introduced.
pub const CURRICULUM: &[(Level, Mood, Tense)] = &[
    (Level::A1, Mood::Indicative, Tense::Pres),
    (Level::A1, Mood::Nonfinite, Tense::Part),
    (Level::A2, Mood::Indicative, Tense::PretIndef),
    (Level::A2, Mood::Indicative, Tense::Impf),
    (Level::A2, Mood::Indicative, Tense::Fut),
    (Level::A2, Mood::Imperative, Tense::ImpAff),
    (Level::A2, Mood::Nonfinite, Tense::Ger),
    (Level::B1, Mood::Indicative, Tense::PretPerf),
    (Level::B1, Mood::Indicative, Tense::Plusc),
    (Level::B1, Mood::Indicative, Tense::FutPerf),
    (Level::B1, Mood::Subjunctive, Tense::SubjPres),
    (Level::B1, Mood::Conditional, Tense::Cond),
    (Level::B1, Mood::Imperative, Tense::ImpNeg),
    (Level::B2, Mood::Subjunctive, Tense::SubjImpf),
    (Level::B2, Mood::Subjunctive, Tense::SubjPerf),
    (Level::B2, Mood::Conditional, Tense::CondPerf),
    (Level::C1, Mood::Subjunctive, Tense::SubjPlusc),
    (Level::C2, Mood::Subjunctive, Tense::SubjFut),
];

const RIOPLATENSE_PERSONS: &[Person] = &[
    Person::FirstSingular,
    Person::SecondSingularVos,
    Person::ThirdSingular,
    Person::FirstPlural,
    Person::ThirdPlural,
];

const LA_GENERAL_PERSONS: &[Person] = &[
    Person::FirstSingular,
    Person::SecondSingularTu,
    Person::ThirdSingular,
    Person::FirstPlural,
    Person::ThirdPlural,
];

const PENINSULAR_PERSONS: &[Person] = &[
    Person::FirstSingular,
    Person::SecondSingularTu,
    Person::ThirdSingular,
    Person::FirstPlural,
    Person::SecondPluralVosotros,
    Person::ThirdPlural,
];

pub fn allowed_combos(level: Level) -> HashSet<(Mood, Tense)> {
    CURRICULUM
        .iter()
        .filter(|(canonical, _, _)| level.is_at_least(*canonical))
        .map(|(_, mood, tense)| (*mood, *tense))
        .collect()
}

/// String entry point; unknown levels fail closed.
pub fn allowed_combos_for(level: &str) -> HashSet<(Mood, Tense)> {
    match Level::parse(level) {
        Some(level) => allowed_combos(level),
        None => HashSet::new(),
    }
}

pub fn allowed_persons(region: Region) -> HashSet<Person> {
    let persons: &[Person] = match region {
        Region::Rioplatense => RIOPLATENSE_PERSONS,
        Region::LaGeneral => LA_GENERAL_PERSONS,
        Region::Peninsular => PENINSULAR_PERSONS,
        Region::Other => &Person::ALL,
    };
    persons.iter().copied().collect()
}

/// String entry point; unknown regions get the full person set.
pub fn allowed_persons_for(region: &str) -> HashSet<Person> {
    allowed_persons(Region::parse(region).unwrap_or(Region::Other))
}

/// Ordered person sequence for a region, in conjugation-table order.
pub fn person_sequence(region: Region) -> Vec<Person> {
    let allowed = allowed_persons(region);
    Person::ALL
        .into_iter()
        .filter(|p| allowed.contains(p))
        .collect()
}

/// Legality sets resolved once per request.
#[derive(Debug, Clone)]
pub struct CurriculumGate {
    combos: HashSet<(Mood, Tense)>,
    persons: HashSet<Person>,
    region: Region,
    bypass_curriculum: bool,
    specific: Option<(Mood, Option<Tense>)>,
}

impl CurriculumGate {
    pub fn new(settings: &SelectionSettings) -> Self {
        let specific = if settings.is_specific() && !settings.came_from_tema {
            settings.specific_mood.map(|mood| (mood, settings.specific_tense))
        } else {
            None
        };

        Self {
            combos: allowed_combos(settings.level),
            persons: allowed_persons(settings.region),
            region: settings.region,
            bypass_curriculum: settings.bypasses_curriculum(),
            specific,
        }
    }

    pub fn combos(&self) -> &HashSet<(Mood, Tense)> {
        &self.combos
    }

    pub fn persons(&self) -> &HashSet<Person> {
        &self.persons
    }

    pub fn admits_combo(&self, form: &Form) -> bool {
        self.bypass_curriculum || self.combos.contains(&(form.mood, form.tense))
    }

    /// Person-less forms are always dialect-legal.
    pub fn admits_person(&self, form: &Form) -> bool {
        if !form.is_finite() {
            return true;
        }
        match form.person {
            Some(person) => self.persons.contains(&person),
            None => true,
        }
    }

    pub fn admits_region_tag(&self, form: &Form) -> bool {
        self.region.accepts_tag(form.region_tag)
    }

    pub fn admits_specific(&self, form: &Form) -> bool {
        match self.specific {
            Some((mood, tense)) => form.matches_request(Some(mood), tense),
            None => true,
        }
    }

    /// Dialect legality alone; used where the level table is deliberately skipped.
    pub fn admits_dialect(&self, form: &Form) -> bool {
        self.admits_person(form) && self.admits_region_tag(form)
    }

    pub fn admits(&self, form: &Form) -> bool {
        self.admits_combo(form) && self.admits_dialect(form) && self.admits_specific(form)
    }

    pub fn apply(&self, forms: &[Form]) -> Vec<Form> {
        forms.iter().filter(|f| self.admits(f)).cloned().collect()
    }
}
