//! Regular conjugation for -ar/-er/-ir verbs.
//!
//! Used to generate paradigms of regular verbs and to verify independently that a
//! form's surface string is what the regular pattern predicts, since the verb-level
//! type flag of a dataset is not always complete.

use crate::types::{Form, Mood, Person, Tense, VerbType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conjugation {
    Ar,
    Er,
    Ir,
}

impl Conjugation {
    pub fn of(lemma: &str) -> Option<Self> {
        let lemma = lemma.trim();
        if lemma.ends_with("ar") {
            Some(Self::Ar)
        } else if lemma.ends_with("er") {
            Some(Self::Er)
        } else if lemma.ends_with("ir") || lemma.ends_with("ír") {
            Some(Self::Ir)
        } else {
            None
        }
    }
}

type Endings = [&'static str; 7];

const PRES_AR: Endings = ["o", "as", "ás", "a", "amos", "áis", "an"];
const PRES_ER: Endings = ["o", "es", "és", "e", "emos", "éis", "en"];
const PRES_IR: Endings = ["o", "es", "ís", "e", "imos", "ís", "en"];
const PRET_AR: Endings = ["é", "aste", "aste", "ó", "amos", "asteis", "aron"];
const PRET_ER_IR: Endings = ["í", "iste", "iste", "ió", "imos", "isteis", "ieron"];
const IMPF_AR: Endings = ["aba", "abas", "abas", "aba", "ábamos", "abais", "aban"];
const IMPF_ER_IR: Endings = ["ía", "ías", "ías", "ía", "íamos", "íais", "ían"];
const FUT: Endings = ["é", "ás", "ás", "á", "emos", "éis", "án"];
const COND: Endings = ["ía", "ías", "ías", "ía", "íamos", "íais", "ían"];
const SUBJ_PRES_AR: Endings = ["e", "es", "es", "e", "emos", "éis", "en"];
const SUBJ_PRES_ER_IR: Endings = ["a", "as", "as", "a", "amos", "áis", "an"];
const SUBJ_IMPF_RA_AR: Endings = ["ara", "aras", "aras", "ara", "áramos", "arais", "aran"];
const SUBJ_IMPF_SE_AR: Endings = ["ase", "ases", "ases", "ase", "ásemos", "aseis", "asen"];
const SUBJ_IMPF_RA_ER_IR: Endings = [
    "iera", "ieras", "ieras", "iera", "iéramos", "ierais", "ieran",
];
const SUBJ_IMPF_SE_ER_IR: Endings = [
    "iese", "ieses", "ieses", "iese", "iésemos", "ieseis", "iesen",
];
const SUBJ_FUT_AR: Endings = ["are", "ares", "ares", "are", "áremos", "areis", "aren"];
const SUBJ_FUT_ER_IR: Endings = [
    "iere", "ieres", "ieres", "iere", "iéremos", "iereis", "ieren",
];
const IMP_AFF_AR: Endings = ["", "a", "á", "e", "emos", "ad", "en"];
const IMP_AFF_ER: Endings = ["", "e", "é", "a", "amos", "ed", "an"];
const IMP_AFF_IR: Endings = ["", "e", "í", "a", "amos", "id", "an"];

const HABER_PRES: Endings = ["he", "has", "has", "ha", "hemos", "habéis", "han"];
const HABER_IMPF: Endings = [
    "había", "habías", "habías", "había", "habíamos", "habíais", "habían",
];
const HABER_FUT: Endings = [
    "habré", "habrás", "habrás", "habrá", "habremos", "habréis", "habrán",
];
const HABER_COND: Endings = [
    "habría", "habrías", "habrías", "habría", "habríamos", "habríais", "habrían",
];
const HABER_SUBJ_PRES: Endings = ["haya", "hayas", "hayas", "haya", "hayamos", "hayáis", "hayan"];
const HABER_SUBJ_IMPF: Endings = [
    "hubiera", "hubieras", "hubieras", "hubiera", "hubiéramos", "hubierais", "hubieran",
];
const HABER_SUBJ_IMPF_SE: Endings = [
    "hubiese", "hubieses", "hubieses", "hubiese", "hubiésemos", "hubieseis", "hubiesen",
];

fn person_index(person: Person) -> usize {
    Person::ALL
        .iter()
        .position(|p| *p == person)
        .unwrap_or_default()
}

pub fn strip_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect()
}

pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn stem(lemma: &str) -> &str {
    let mut chars = lemma.char_indices().rev();
    let cut = chars.nth(1).map(|(i, _)| i).unwrap_or(0);
    &lemma[..cut]
}

pub fn regular_participle(lemma: &str) -> Option<String> {
    let conj = Conjugation::of(lemma)?;
    let ending = match conj {
        Conjugation::Ar => "ado",
        Conjugation::Er | Conjugation::Ir => "ido",
    };
    Some(format!("{}{}", stem(lemma), ending))
}

pub fn regular_gerund(lemma: &str) -> Option<String> {
    let conj = Conjugation::of(lemma)?;
    let ending = match conj {
        Conjugation::Ar => "ando",
        Conjugation::Er | Conjugation::Ir => "iendo",
    };
    Some(format!("{}{}", stem(lemma), ending))
}

fn simple(lemma: &str, endings: &Endings, idx: usize) -> String {
    format!("{}{}", stem(lemma), endings[idx])
}

fn compound(aux: &Endings, idx: usize, participle: &str) -> String {
    format!("{} {}", aux[idx], participle)
}

/// Every accepted regular surface string for a cell, canonical spelling first.
/// Empty for virtual tenses, unknown conjugations, and 1st-person imperatives.
pub fn regular_candidates(
    lemma: &str,
    mood: Mood,
    tense: Tense,
    person: Option<Person>,
) -> Vec<String> {
    let Some(conj) = Conjugation::of(lemma) else {
        return Vec::new();
    };
    if tense.is_virtual() || tense.mood() != mood {
        return Vec::new();
    }

    if mood == Mood::Nonfinite {
        let participle = regular_participle(lemma).unwrap_or_default();
        return match tense {
            Tense::Inf => vec![lemma.to_string()],
            Tense::InfPerf => vec![format!("haber {}", participle)],
            Tense::Ger => regular_gerund(lemma).into_iter().collect(),
            Tense::Part => vec![participle],
            _ => Vec::new(),
        };
    }

    let Some(person) = person else {
        return Vec::new();
    };
    let idx = person_index(person);
    let is_vos = person == Person::SecondSingularVos;
    let infinitive = strip_accents(lemma);
    let participle = regular_participle(lemma).unwrap_or_default();

    let (subj_pres, subj_impf_ra, subj_impf_se, subj_fut) = match conj {
        Conjugation::Ar => (&SUBJ_PRES_AR, &SUBJ_IMPF_RA_AR, &SUBJ_IMPF_SE_AR, &SUBJ_FUT_AR),
        _ => (
            &SUBJ_PRES_ER_IR,
            &SUBJ_IMPF_RA_ER_IR,
            &SUBJ_IMPF_SE_ER_IR,
            &SUBJ_FUT_ER_IR,
        ),
    };
    let voseo_subj = match conj {
        Conjugation::Ar => "és",
        _ => "ás",
    };

    match tense {
        Tense::Pres => {
            let endings = match conj {
                Conjugation::Ar => &PRES_AR,
                Conjugation::Er => &PRES_ER,
                Conjugation::Ir => &PRES_IR,
            };
            vec![simple(lemma, endings, idx)]
        }
        Tense::PretIndef => {
            let endings = match conj {
                Conjugation::Ar => &PRET_AR,
                _ => &PRET_ER_IR,
            };
            vec![simple(lemma, endings, idx)]
        }
        Tense::Impf => {
            let endings = match conj {
                Conjugation::Ar => &IMPF_AR,
                _ => &IMPF_ER_IR,
            };
            vec![simple(lemma, endings, idx)]
        }
        Tense::Fut => vec![format!("{}{}", infinitive, FUT[idx])],
        Tense::Cond => vec![format!("{}{}", infinitive, COND[idx])],
        Tense::SubjPres => {
            let mut out = vec![simple(lemma, subj_pres, idx)];
            if is_vos {
                out.push(format!("{}{}", stem(lemma), voseo_subj));
            }
            out
        }
        Tense::SubjImpf => vec![
            simple(lemma, subj_impf_ra, idx),
            simple(lemma, subj_impf_se, idx),
        ],
        Tense::SubjFut => vec![simple(lemma, subj_fut, idx)],
        Tense::ImpAff => {
            if person == Person::FirstSingular {
                return Vec::new();
            }
            let endings = match conj {
                Conjugation::Ar => &IMP_AFF_AR,
                Conjugation::Er => &IMP_AFF_ER,
                Conjugation::Ir => &IMP_AFF_IR,
            };
            vec![simple(lemma, endings, idx)]
        }
        Tense::ImpNeg => {
            if person == Person::FirstSingular {
                return Vec::new();
            }
            let mut out = vec![format!("no {}", simple(lemma, subj_pres, idx))];
            if is_vos {
                out.push(format!("no {}{}", stem(lemma), voseo_subj));
            }
            out
        }
        Tense::PretPerf => vec![compound(&HABER_PRES, idx, &participle)],
        Tense::Plusc => vec![compound(&HABER_IMPF, idx, &participle)],
        Tense::FutPerf => vec![compound(&HABER_FUT, idx, &participle)],
        Tense::CondPerf => vec![compound(&HABER_COND, idx, &participle)],
        Tense::SubjPerf => {
            let mut out = vec![compound(&HABER_SUBJ_PRES, idx, &participle)];
            if is_vos {
                out.push(format!("hayás {}", participle));
            }
            out
        }
        Tense::SubjPlusc => vec![
            compound(&HABER_SUBJ_IMPF, idx, &participle),
            compound(&HABER_SUBJ_IMPF_SE, idx, &participle),
        ],
        _ => Vec::new(),
    }
}

pub fn regular_form_value(
    lemma: &str,
    mood: Mood,
    tense: Tense,
    person: Option<Person>,
) -> Option<String> {
    regular_candidates(lemma, mood, tense, person)
        .into_iter()
        .next()
}

/// Whether the surface string is exactly what the regular pattern predicts.
pub fn is_regular_value(
    lemma: &str,
    mood: Mood,
    tense: Tense,
    person: Option<Person>,
    value: &str,
) -> bool {
    let value = normalize(value);
    regular_candidates(lemma, mood, tense, person)
        .iter()
        .any(|candidate| normalize(candidate) == value)
}

pub fn is_regular_form(form: &Form) -> bool {
    is_regular_value(&form.lemma, form.mood, form.tense, form.person, &form.value)
}

/// Concrete (mood, tense) pairs that appear on forms, in table order.
pub const CONCRETE_TENSES: [Tense; 20] = [
    Tense::Pres,
    Tense::PretIndef,
    Tense::Impf,
    Tense::Fut,
    Tense::PretPerf,
    Tense::Plusc,
    Tense::FutPerf,
    Tense::Cond,
    Tense::CondPerf,
    Tense::SubjPres,
    Tense::SubjImpf,
    Tense::SubjFut,
    Tense::SubjPerf,
    Tense::SubjPlusc,
    Tense::ImpAff,
    Tense::ImpNeg,
    Tense::Inf,
    Tense::InfPerf,
    Tense::Ger,
    Tense::Part,
];

/// Canonical regular forms of one tense.
pub fn regular_tense_forms(lemma: &str, tense: Tense) -> Vec<Form> {
    let mood = tense.mood();
    let persons: Vec<Option<Person>> = if mood == Mood::Nonfinite {
        vec![None]
    } else {
        Person::ALL.into_iter().map(Some).collect()
    };

    persons
        .into_iter()
        .filter_map(|person| {
            regular_form_value(lemma, mood, tense, person)
                .map(|value| Form::new(lemma, mood, tense, person, value).with_type(VerbType::Regular))
        })
        .collect()
}

/// Full canonical regular paradigm.
pub fn regular_paradigm(lemma: &str) -> Vec<Form> {
    CONCRETE_TENSES
        .iter()
        .flat_map(|tense| regular_tense_forms(lemma, *tense))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(lemma: &str, tense: Tense, person: Person) -> String {
        regular_form_value(lemma, tense.mood(), tense, Some(person)).unwrap()
    }

    #[test]
    fn present_indicative_three_conjugations() {
        assert_eq!(first("hablar", Tense::Pres, Person::FirstSingular), "hablo");
        assert_eq!(first("hablar", Tense::Pres, Person::SecondSingularVos), "hablás");
        assert_eq!(first("comer", Tense::Pres, Person::SecondPluralVosotros), "coméis");
        assert_eq!(first("vivir", Tense::Pres, Person::SecondSingularVos), "vivís");
        assert_eq!(first("vivir", Tense::Pres, Person::FirstPlural), "vivimos");
    }

    #[test]
    fn preterite_and_imperfect() {
        assert_eq!(first("hablar", Tense::PretIndef, Person::ThirdSingular), "habló");
        assert_eq!(first("comer", Tense::PretIndef, Person::ThirdPlural), "comieron");
        assert_eq!(first("vivir", Tense::Impf, Person::FirstPlural), "vivíamos");
        assert_eq!(first("hablar", Tense::Impf, Person::FirstPlural), "hablábamos");
    }

    #[test]
    fn future_and_conditional_use_infinitive() {
        assert_eq!(first("comer", Tense::Fut, Person::ThirdPlural), "comerán");
        assert_eq!(first("vivir", Tense::Cond, Person::FirstSingular), "viviría");
    }

    #[test]
    fn compound_tenses_use_haber() {
        assert_eq!(first("hablar", Tense::PretPerf, Person::ThirdSingular), "ha hablado");
        assert_eq!(first("comer", Tense::SubjPlusc, Person::FirstPlural), "hubiéramos comido");
        assert!(is_regular_value(
            "comer",
            Mood::Subjunctive,
            Tense::SubjPlusc,
            Some(Person::FirstPlural),
            "hubiésemos comido"
        ));
    }

    #[test]
    fn imperatives() {
        assert_eq!(first("hablar", Tense::ImpAff, Person::SecondSingularTu), "habla");
        assert_eq!(first("hablar", Tense::ImpAff, Person::SecondSingularVos), "hablá");
        assert_eq!(first("vivir", Tense::ImpAff, Person::SecondPluralVosotros), "vivid");
        assert_eq!(first("comer", Tense::ImpNeg, Person::SecondSingularTu), "no comas");
        assert!(regular_candidates("hablar", Mood::Imperative, Tense::ImpAff, Some(Person::FirstSingular)).is_empty());
        assert!(is_regular_value(
            "hablar",
            Mood::Imperative,
            Tense::ImpNeg,
            Some(Person::SecondSingularVos),
            "no hablés"
        ));
    }

    #[test]
    fn nonfinite() {
        assert_eq!(regular_participle("vivir").unwrap(), "vivido");
        assert_eq!(regular_gerund("hablar").unwrap(), "hablando");
        assert_eq!(
            regular_form_value("comer", Mood::Nonfinite, Tense::InfPerf, None).unwrap(),
            "haber comido"
        );
    }

    #[test]
    fn irregular_values_fail_verification() {
        assert!(!is_regular_value(
            "tener",
            Mood::Indicative,
            Tense::Pres,
            Some(Person::FirstSingular),
            "tengo"
        ));
        assert!(is_regular_value(
            "tener",
            Mood::Indicative,
            Tense::Impf,
            Some(Person::FirstSingular),
            "tenía"
        ));
        assert!(!is_regular_value("xyz", Mood::Indicative, Tense::Pres, Some(Person::FirstSingular), "xyz"));
    }

    #[test]
    fn verification_normalizes_case_and_spacing() {
        assert!(is_regular_value(
            "hablar",
            Mood::Indicative,
            Tense::PretPerf,
            Some(Person::FirstSingular),
            "  He   Hablado "
        ));
    }

    #[test]
    fn paradigm_skips_first_person_imperatives() {
        let forms = regular_paradigm("hablar");
        assert!(forms
            .iter()
            .all(|f| !(f.mood == Mood::Imperative && f.person == Some(Person::FirstSingular))));
        // 14 finite tenses x 7 persons + 2 imperatives x 6 persons + 4 nonfinite
        assert_eq!(forms.len(), 14 * 7 + 2 * 6 + 4);
        assert!(forms.iter().all(is_regular_form));
    }
}
