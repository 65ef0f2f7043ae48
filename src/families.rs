//! Irregularity families.
//!
//! Learners pick a simplified group ("stem changes"); the filter works on the
//! technical families a group expands to.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CategorizationError;
use crate::morphology::Conjugation;
use crate::types::{Form, Person, Tense, Verb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Family {
    DiphtEIe,
    DiphtOUe,
    DiphtUUe,
    EIIr,
    OUGerIr,
    GVerbs,
    ZcoVerbs,
    UirY,
    HiatusY,
    PretUv,
    PretU,
    PretI,
    PretJ,
    PretSuppl,
    IrregGerund,
    IrregParticiple,
    Defective,
    Unipersonal,
    OrthCar,
    OrthGar,
    OrthZar,
    OrthGuar,
    OrthGerGir,
    OrthCerCir,
    IarVerbs,
    UarVerbs,
    Suppletive,
}

impl Family {
    pub const ALL: [Family; 27] = [
        Self::DiphtEIe,
        Self::DiphtOUe,
        Self::DiphtUUe,
        Self::EIIr,
        Self::OUGerIr,
        Self::GVerbs,
        Self::ZcoVerbs,
        Self::UirY,
        Self::HiatusY,
        Self::PretUv,
        Self::PretU,
        Self::PretI,
        Self::PretJ,
        Self::PretSuppl,
        Self::IrregGerund,
        Self::IrregParticiple,
        Self::Defective,
        Self::Unipersonal,
        Self::OrthCar,
        Self::OrthGar,
        Self::OrthZar,
        Self::OrthGuar,
        Self::OrthGerGir,
        Self::OrthCerCir,
        Self::IarVerbs,
        Self::UarVerbs,
        Self::Suppletive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiphtEIe => "DIPHT_E_IE",
            Self::DiphtOUe => "DIPHT_O_UE",
            Self::DiphtUUe => "DIPHT_U_UE",
            Self::EIIr => "E_I_IR",
            Self::OUGerIr => "O_U_GER_IR",
            Self::GVerbs => "G_VERBS",
            Self::ZcoVerbs => "ZCO_VERBS",
            Self::UirY => "UIR_Y",
            Self::HiatusY => "HIATUS_Y",
            Self::PretUv => "PRET_UV",
            Self::PretU => "PRET_U",
            Self::PretI => "PRET_I",
            Self::PretJ => "PRET_J",
            Self::PretSuppl => "PRET_SUPPL",
            Self::IrregGerund => "IRREG_GERUND",
            Self::IrregParticiple => "IRREG_PARTICIPLE",
            Self::Defective => "DEFECTIVE",
            Self::Unipersonal => "UNIPERSONAL",
            Self::OrthCar => "ORTH_CAR",
            Self::OrthGar => "ORTH_GAR",
            Self::OrthZar => "ORTH_ZAR",
            Self::OrthGuar => "ORTH_GUAR",
            Self::OrthGerGir => "ORTH_GER_GIR",
            Self::OrthCerCir => "ORTH_CER_CIR",
            Self::IarVerbs => "IAR_VERBS",
            Self::UarVerbs => "UAR_VERBS",
            Self::Suppletive => "SUPPLETIVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    pub fn is_strong_preterite(&self) -> bool {
        matches!(
            self,
            Self::PretUv | Self::PretU | Self::PretI | Self::PretJ | Self::PretSuppl
        )
    }
}

/// Simplified group -> technical families.
pub const GROUPS: &[(&str, &[Family])] = &[
    (
        "STEM_CHANGES",
        &[
            Family::DiphtEIe,
            Family::DiphtOUe,
            Family::DiphtUUe,
            Family::EIIr,
            Family::OUGerIr,
        ],
    ),
    (
        "FIRST_PERSON_IRREGULAR",
        &[
            Family::GVerbs,
            Family::ZcoVerbs,
            Family::OrthGerGir,
            Family::OrthCerCir,
        ],
    ),
    (
        "STRONG_PRETERITES",
        &[
            Family::PretUv,
            Family::PretU,
            Family::PretI,
            Family::PretJ,
            Family::PretSuppl,
        ],
    ),
    (
        "ORTHOGRAPHIC",
        &[
            Family::OrthCar,
            Family::OrthGar,
            Family::OrthZar,
            Family::OrthGuar,
            Family::OrthGerGir,
            Family::OrthCerCir,
        ],
    ),
    ("Y_INSERTION", &[Family::UirY, Family::HiatusY]),
    ("ACCENTUATION", &[Family::IarVerbs, Family::UarVerbs]),
    (
        "IRREGULAR_NONFINITE",
        &[Family::IrregGerund, Family::IrregParticiple],
    ),
    ("HIGHLY_IRREGULAR", &[Family::Suppletive]),
];

/// A drill with its own inclusion and exclusion lists rather than a plain group.
#[derive(Debug, Clone, Copy)]
pub struct DrillRule {
    pub id: &'static str,
    pub include: &'static [Family],
    pub exclude: &'static [Family],
    pub tense: Tense,
    pub persons: &'static [Person],
}

// Hardcoded family lists; a data-driven rule table would replace this if more drills appear.
pub const THIRD_PERSON_PRETERITE: DrillRule = DrillRule {
    id: "PRETERITE_THIRD_PERSON",
    include: &[Family::EIIr, Family::OUGerIr, Family::HiatusY, Family::UirY],
    exclude: &[
        Family::PretUv,
        Family::PretU,
        Family::PretI,
        Family::PretJ,
        Family::PretSuppl,
        Family::Suppletive,
    ],
    tense: Tense::PretIndef,
    persons: &[Person::ThirdSingular, Person::ThirdPlural],
};

pub const DRILL_RULES: &[DrillRule] = &[THIRD_PERSON_PRETERITE];

#[derive(Debug, Clone)]
pub enum FamilySelection {
    Families(HashSet<Family>),
    Drill(DrillRule),
    /// Unrecognised selection; the filter does not restrict anything.
    Unknown,
}

pub fn expand_selection(selected: &str) -> FamilySelection {
    let key = selected.trim().to_uppercase();
    if let Some(rule) = DRILL_RULES.iter().find(|r| r.id == key) {
        return FamilySelection::Drill(*rule);
    }
    if let Some((_, families)) = GROUPS.iter().find(|(id, _)| *id == key) {
        return FamilySelection::Families(families.iter().copied().collect());
    }
    match Family::parse(&key) {
        Some(family) => FamilySelection::Families(HashSet::from([family])),
        None => FamilySelection::Unknown,
    }
}

const KNOWN_VERBS: &[(&str, &[Family])] = &[
    ("ser", &[Family::Suppletive, Family::PretSuppl]),
    ("ir", &[Family::Suppletive, Family::PretSuppl, Family::IrregGerund]),
    ("dar", &[Family::PretSuppl]),
    ("estar", &[Family::PretUv]),
    ("andar", &[Family::PretUv]),
    ("tener", &[Family::GVerbs, Family::DiphtEIe, Family::PretUv]),
    ("poner", &[Family::GVerbs, Family::PretU, Family::IrregParticiple]),
    ("hacer", &[Family::GVerbs, Family::PretI, Family::IrregParticiple]),
    (
        "decir",
        &[
            Family::GVerbs,
            Family::EIIr,
            Family::PretJ,
            Family::IrregParticiple,
            Family::IrregGerund,
        ],
    ),
    (
        "venir",
        &[Family::GVerbs, Family::DiphtEIe, Family::PretI, Family::IrregGerund],
    ),
    ("salir", &[Family::GVerbs]),
    ("valer", &[Family::GVerbs]),
    ("traer", &[Family::GVerbs, Family::PretJ, Family::HiatusY]),
    ("caer", &[Family::GVerbs, Family::HiatusY]),
    ("oír", &[Family::GVerbs, Family::HiatusY]),
    ("saber", &[Family::PretU]),
    ("caber", &[Family::PretU]),
    ("poder", &[Family::DiphtOUe, Family::PretU, Family::IrregGerund]),
    ("querer", &[Family::DiphtEIe, Family::PretI]),
    ("pedir", &[Family::EIIr]),
    ("servir", &[Family::EIIr]),
    ("repetir", &[Family::EIIr]),
    ("seguir", &[Family::EIIr]),
    ("vestir", &[Family::EIIr]),
    ("freír", &[Family::EIIr, Family::IrregParticiple]),
    ("sentir", &[Family::DiphtEIe, Family::EIIr]),
    ("preferir", &[Family::DiphtEIe, Family::EIIr]),
    ("mentir", &[Family::DiphtEIe, Family::EIIr]),
    ("dormir", &[Family::DiphtOUe, Family::OUGerIr]),
    (
        "morir",
        &[Family::DiphtOUe, Family::OUGerIr, Family::IrregParticiple],
    ),
    ("pensar", &[Family::DiphtEIe]),
    ("cerrar", &[Family::DiphtEIe]),
    ("empezar", &[Family::DiphtEIe, Family::OrthZar]),
    ("entender", &[Family::DiphtEIe]),
    ("contar", &[Family::DiphtOUe]),
    ("volver", &[Family::DiphtOUe, Family::IrregParticiple]),
    ("jugar", &[Family::DiphtUUe, Family::OrthGar]),
    ("leer", &[Family::HiatusY]),
    ("creer", &[Family::HiatusY]),
    ("llover", &[Family::DiphtOUe, Family::Unipersonal]),
    ("nevar", &[Family::DiphtEIe, Family::Unipersonal]),
    ("granizar", &[Family::Unipersonal, Family::OrthZar]),
    ("soler", &[Family::DiphtOUe, Family::Defective]),
    ("abolir", &[Family::Defective]),
    ("escribir", &[Family::IrregParticiple]),
    ("abrir", &[Family::IrregParticiple]),
    ("ver", &[Family::IrregParticiple]),
    ("romper", &[Family::IrregParticiple]),
    ("imprimir", &[Family::IrregParticiple]),
    ("enviar", &[Family::IarVerbs]),
    ("continuar", &[Family::UarVerbs]),
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú')
}

fn heuristic_families(lemma: &str) -> HashSet<Family> {
    let mut out = HashSet::new();
    let chars: Vec<char> = lemma.chars().collect();
    let before = |n: usize| chars.len().checked_sub(n).and_then(|i| chars.get(i)).copied();

    if lemma.ends_with("cer") || lemma.ends_with("cir") {
        match before(4) {
            Some(c) if is_vowel(c) => {
                out.insert(Family::ZcoVerbs);
                if lemma.ends_with("ducir") {
                    out.insert(Family::PretJ);
                }
            }
            Some(_) => {
                out.insert(Family::OrthCerCir);
            }
            None => {}
        }
    }
    if lemma.ends_with("uir") && !lemma.ends_with("guir") {
        out.insert(Family::UirY);
    }
    if lemma.ends_with("guar") {
        out.insert(Family::OrthGuar);
    } else if lemma.ends_with("car") {
        out.insert(Family::OrthCar);
    } else if lemma.ends_with("gar") {
        out.insert(Family::OrthGar);
    } else if lemma.ends_with("zar") {
        out.insert(Family::OrthZar);
    }
    if lemma.ends_with("ger") || lemma.ends_with("gir") {
        out.insert(Family::OrthGerGir);
    }
    out
}

/// Families of a verb: explicit dataset tags win, then the known-verb table, then
/// ending heuristics. Fails for lemmas that are not infinitives.
pub fn categorize(lemma: &str, verb: Option<&Verb>) -> Result<HashSet<Family>, CategorizationError> {
    let lemma = lemma.trim();
    if lemma.is_empty() {
        return Err(CategorizationError::EmptyLemma);
    }
    if Conjugation::of(lemma).is_none() {
        return Err(CategorizationError::NoInfinitiveEnding(lemma.to_string()));
    }

    if let Some(verb) = verb {
        let tagged: HashSet<Family> = verb
            .families
            .iter()
            .filter_map(|tag| Family::parse(tag))
            .collect();
        if !tagged.is_empty() {
            return Ok(tagged);
        }
    }

    if let Some((_, families)) = KNOWN_VERBS.iter().find(|(known, _)| *known == lemma) {
        return Ok(families.iter().copied().collect());
    }

    Ok(heuristic_families(lemma))
}

pub fn is_defective_or_unipersonal(families: &HashSet<Family>) -> bool {
    families.contains(&Family::Defective) || families.contains(&Family::Unipersonal)
}

/// Whether a form belongs to the selected family or drill.
pub fn family_admits(
    form: &Form,
    verb: Option<&Verb>,
    selection: &FamilySelection,
) -> Result<bool, CategorizationError> {
    match selection {
        FamilySelection::Unknown => Ok(true),
        FamilySelection::Families(wanted) => {
            let families = categorize(&form.lemma, verb)?;
            Ok(!families.is_disjoint(wanted))
        }
        FamilySelection::Drill(rule) => {
            let families = categorize(&form.lemma, verb)?;
            let included = rule.include.iter().any(|f| families.contains(f));
            let excluded = rule.exclude.iter().any(|f| families.contains(f));
            if !included || excluded {
                return Ok(false);
            }
            if form.tense == rule.tense {
                return Ok(form.person.map_or(false, |p| rule.persons.contains(&p)));
            }
            Ok(true)
        }
    }
}
