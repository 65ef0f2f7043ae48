use crate::curriculum;
use crate::settings::VarietyState;
use crate::types::{Form, Person, Region};

/// Finds the next sequence position that has candidates, starting at the pointer
/// and wrapping.
fn next_populated(sequence: &[Person], start: usize, pool: &[&Form]) -> Option<usize> {
    (0..sequence.len())
        .map(|offset| (start + offset) % sequence.len())
        .find(|&idx| pool.iter().any(|f| f.person == Some(sequence[idx])))
}

/// Soft-boosts the current target person and advances the pointer one step past
/// the position where candidates were actually found.
pub fn rotate_persons<'a>(
    mut pool: Vec<&'a Form>,
    region: Region,
    state: &mut VarietyState,
    previous: Option<&Form>,
    boost: usize,
) -> Vec<&'a Form> {
    let sequence = curriculum::person_sequence(region);
    if sequence.is_empty() || pool.is_empty() {
        return pool;
    }

    let start = state.rotation_index % sequence.len();
    let Some(found) = next_populated(&sequence, start, &pool) else {
        return pool;
    };
    let person = sequence[found];

    let same_lemma = previous.map(|p| p.lemma.as_str()).filter(|lemma| {
        pool.iter()
            .any(|f| f.person == Some(person) && f.lemma == *lemma)
    });
    let targets: Vec<&Form> = pool
        .iter()
        .copied()
        .filter(|f| f.person == Some(person) && same_lemma.map_or(true, |l| f.lemma == l))
        .collect();

    for _ in 0..boost {
        pool.extend(targets.iter().copied());
    }

    state.rotation_index = (found + 1) % sequence.len();
    tracing::debug!(
        person = person.as_str(),
        requested = start,
        found,
        next = state.rotation_index,
        "person rotation"
    );
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mood, Tense};

    fn form(lemma: &str, person: Person) -> Form {
        Form::new(lemma, Mood::Indicative, Tense::Pres, Some(person), "x")
    }

    #[test]
    fn pointer_advances_from_found_position() {
        // rioplatense sequence: 1s, 2s_vos, 3s, 1p, 3p
        let a = form("hablar", Person::ThirdPlural);
        let b = form("hablar", Person::FirstSingular);
        let mut state = VarietyState { rotation_index: 1 };

        let out = rotate_persons(vec![&a, &b], Region::Rioplatense, &mut state, None, 4);
        // 2s_vos, 3s, 1p are empty; 3p at index 4 is found
        assert_eq!(state.rotation_index, 0);
        assert_eq!(out.iter().filter(|f| f.person == Some(Person::ThirdPlural)).count(), 5);
        assert_eq!(out.iter().filter(|f| f.person == Some(Person::FirstSingular)).count(), 1);

        let _ = rotate_persons(vec![&a, &b], Region::Rioplatense, &mut state, None, 4);
        assert_eq!(state.rotation_index, 1);
    }

    #[test]
    fn boost_prefers_previous_lemma() {
        let hablar = form("hablar", Person::FirstSingular);
        let comer = form("comer", Person::FirstSingular);
        let prev = form("comer", Person::ThirdSingular);
        let mut state = VarietyState::default();

        let out = rotate_persons(
            vec![&hablar, &comer],
            Region::LaGeneral,
            &mut state,
            Some(&prev),
            2,
        );
        assert_eq!(out.iter().filter(|f| f.lemma == "comer").count(), 3);
        assert_eq!(out.iter().filter(|f| f.lemma == "hablar").count(), 1);
    }

    #[test]
    fn personless_pool_leaves_pointer() {
        let part = Form::new("hablar", Mood::Nonfinite, Tense::Part, None, "hablado");
        let mut state = VarietyState { rotation_index: 2 };
        let out = rotate_persons(vec![&part], Region::Peninsular, &mut state, None, 4);
        assert_eq!(out.len(), 1);
        assert_eq!(state.rotation_index, 2);
    }
}
