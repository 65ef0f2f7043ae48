//! Enclitic pronouns on affirmative imperatives and the written accent they force.
//!
//! Adding syllables after the verb keeps the stress where it was, so the word may
//! become esdrújula (accent required) or stop needing the accent it had: `hablá` +
//! `lo` -> `hablalo`, `hablá` + `me` + `lo` -> `hablámelo`, `habla` + `lo` -> `háblalo`.

use rand::Rng;

use crate::types::{Form, Person, Tense};

const SINGLE: &[&str] = &["lo", "la", "los", "las", "me", "nos", "le", "les"];
const SINGLE_FIRST_PLURAL: &[&str] = &["lo", "la", "los", "las", "le", "les"];
const INDIRECT: &[&str] = &["me", "nos"];
const INDIRECT_FIRST_PLURAL: &[&str] = &["se"];
const DIRECT: &[&str] = &["lo", "la", "los", "las"];

fn is_vowel(c: char) -> bool {
    matches!(
        c,
        'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú' | 'ü'
    )
}

fn is_strong(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'o' | 'á' | 'é' | 'ó')
}

fn accented(c: char) -> char {
    match c {
        'a' => 'á',
        'e' => 'é',
        'i' => 'í',
        'o' => 'ó',
        'u' => 'ú',
        other => other,
    }
}

fn unaccented(c: char) -> char {
    match c {
        'á' => 'a',
        'é' => 'e',
        'í' => 'i',
        'ó' => 'o',
        'ú' => 'u',
        other => other,
    }
}

fn is_accented(c: char) -> bool {
    unaccented(c) != c
}

/// Vowel groups that carry one syllable each, as char indices.
fn nuclei(chars: &[char]) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    for (i, &c) in chars.iter().enumerate() {
        let silent_u = c == 'u'
            && i > 0
            && matches!(chars[i - 1], 'q' | 'g')
            && chars
                .get(i + 1)
                .map_or(false, |n| matches!(n, 'e' | 'i' | 'é' | 'í'));
        if !is_vowel(c) || silent_u {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(&prev) = current.last() {
            let p = chars[prev];
            let hiatus = (is_strong(p) && is_strong(c))
                || matches!(p, 'í' | 'ú')
                || matches!(c, 'í' | 'ú');
            if hiatus {
                out.push(std::mem::take(&mut current));
            }
        }
        current.push(i);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Index (from the start) of the stressed nucleus.
fn stressed_nucleus(chars: &[char], nuclei: &[Vec<usize>]) -> usize {
    if let Some(pos) = nuclei
        .iter()
        .position(|n| n.iter().any(|&i| is_accented(chars[i])))
    {
        return pos;
    }
    let last = nuclei.len().saturating_sub(1);
    match chars.last() {
        Some(c) if is_vowel(*c) || matches!(c, 'n' | 's') => last.saturating_sub(1),
        _ => last,
    }
}

fn marks_hiatus(chars: &[char], i: usize) -> bool {
    matches!(chars[i], 'í' | 'ú')
        && ((i > 0 && is_vowel(chars[i - 1])) || chars.get(i + 1).map_or(false, |c| is_vowel(*c)))
}

/// Attaches pronouns to an affirmative imperative and re-derives the accent.
pub fn attach_enclitics(verb: &str, person: Person, pronouns: &[&str]) -> String {
    if pronouns.is_empty() {
        return verb.to_string();
    }
    let chars: Vec<char> = verb.chars().collect();
    let base_nuclei = nuclei(&chars);
    if base_nuclei.is_empty() {
        return format!("{}{}", verb, pronouns.concat());
    }
    let stressed = stressed_nucleus(&chars, &base_nuclei);

    let mut base: Vec<char> = chars
        .iter()
        .enumerate()
        .map(|(i, &c)| if marks_hiatus(&chars, i) { c } else { unaccented(c) })
        .collect();

    // hablemos + nos -> hablémonos, hablad + os -> hablaos
    let first = pronouns[0];
    if person == Person::FirstPlural && matches!(first, "nos" | "se") && base.last() == Some(&'s') {
        base.pop();
    }
    if person == Person::SecondPluralVosotros && first == "os" && base.last() == Some(&'d') {
        base.pop();
    }

    let clitic_syllables: usize = pronouns
        .iter()
        .map(|p| nuclei(&p.chars().collect::<Vec<_>>()).len())
        .sum();
    let total = base_nuclei.len() + clitic_syllables;
    let from_end = total - stressed;

    if from_end >= 3 {
        let nucleus = &base_nuclei[stressed];
        let target = nucleus
            .iter()
            .copied()
            .find(|&i| is_strong(unaccented(chars[i])))
            .or_else(|| nucleus.last().copied());
        if let Some(i) = target {
            if i < base.len() {
                base[i] = accented(base[i]);
            }
        }
    }

    let mut word: String = base.into_iter().collect();
    word.push_str(&pronouns.concat());
    word
}

fn choose<'a, R: Rng + ?Sized>(options: &[&'a str], rng: &mut R) -> &'a str {
    options[rng.random_range(0..options.len())]
}

/// Picks one or two pronouns suited to the addressee.
pub fn pick_pronouns<R: Rng + ?Sized>(
    person: Person,
    double_chance: f64,
    rng: &mut R,
) -> Vec<&'static str> {
    let first_plural = person == Person::FirstPlural;
    if rng.random::<f64>() < double_chance {
        let indirect = if first_plural {
            INDIRECT_FIRST_PLURAL
        } else {
            INDIRECT
        };
        vec![choose(indirect, rng), choose(DIRECT, rng)]
    } else {
        let single = if first_plural { SINGLE_FIRST_PLURAL } else { SINGLE };
        vec![choose(single, rng)]
    }
}

/// Probabilistically turns an affirmative imperative into its enclitic variant.
pub fn maybe_attach<R: Rng + ?Sized>(
    form: Form,
    percentage: u8,
    double_chance: f64,
    rng: &mut R,
) -> Form {
    if form.tense != Tense::ImpAff || percentage == 0 || form.is_sentinel() {
        return form;
    }
    let Some(person) = form.person else {
        return form;
    };
    // multi-word values (reflexive datasets, notes) are left alone
    if form.value.trim().contains(' ') {
        return form;
    }
    if rng.random_range(0..100u32) >= u32::from(percentage) {
        return form;
    }

    let pronouns = pick_pronouns(person, double_chance, rng);
    let value = attach_enclitics(form.value.trim(), person, &pronouns);
    tracing::debug!(base = %form.value, value = %value, "attached enclitic pronouns");
    Form { value, ..form }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn voseo_accent_rule() {
        let vos = Person::SecondSingularVos;
        assert_eq!(attach_enclitics("hablá", vos, &[]), "hablá");
        assert_eq!(attach_enclitics("hablá", vos, &["lo"]), "hablalo");
        assert_eq!(attach_enclitics("hablá", vos, &["me", "lo"]), "hablámelo");
        assert_eq!(attach_enclitics("comé", vos, &["lo"]), "comelo");
        assert_eq!(attach_enclitics("viví", vos, &["me", "la"]), "vivímela");
    }

    #[test]
    fn tu_and_usted_gain_accent() {
        assert_eq!(attach_enclitics("habla", Person::SecondSingularTu, &["lo"]), "háblalo");
        assert_eq!(attach_enclitics("come", Person::SecondSingularTu, &["lo"]), "cómelo");
        assert_eq!(attach_enclitics("busque", Person::ThirdSingular, &["lo"]), "búsquelo");
        assert_eq!(attach_enclitics("hablen", Person::ThirdPlural, &["lo"]), "háblenlo");
    }

    #[test]
    fn monosyllables() {
        assert_eq!(attach_enclitics("di", Person::SecondSingularTu, &["me", "lo"]), "dímelo");
        assert_eq!(attach_enclitics("pon", Person::SecondSingularTu, &["lo"]), "ponlo");
        assert_eq!(attach_enclitics("haz", Person::SecondSingularTu, &["lo"]), "hazlo");
    }

    #[test]
    fn plural_stem_adjustments() {
        let p1 = Person::FirstPlural;
        assert_eq!(attach_enclitics("hablemos", p1, &["lo"]), "hablémoslo");
        assert_eq!(attach_enclitics("hablemos", p1, &["se", "lo"]), "hablémoselo");
        assert_eq!(
            attach_enclitics("hablad", Person::SecondPluralVosotros, &["lo"]),
            "habladlo"
        );
        assert_eq!(
            attach_enclitics("sentad", Person::SecondPluralVosotros, &["os"]),
            "sentaos"
        );
    }

    #[test]
    fn only_affirmative_imperatives_are_transformed() {
        let mut rng = StdRng::seed_from_u64(7);
        let neg = Form::new(
            "hablar",
            Tense::ImpNeg.mood(),
            Tense::ImpNeg,
            Some(Person::SecondSingularTu),
            "no hables",
        );
        let out = maybe_attach(neg.clone(), 100, 0.5, &mut rng);
        assert_eq!(out, neg);

        let aff = Form::new(
            "hablar",
            Tense::ImpAff.mood(),
            Tense::ImpAff,
            Some(Person::SecondSingularTu),
            "habla",
        );
        let out = maybe_attach(aff.clone(), 100, 0.0, &mut rng);
        assert_ne!(out.value, aff.value);
        assert!(out.value.starts_with("hábla"));
        assert_eq!(out.tense, Tense::ImpAff);

        let untouched = maybe_attach(aff.clone(), 0, 0.0, &mut rng);
        assert_eq!(untouched, aff);
    }
}
