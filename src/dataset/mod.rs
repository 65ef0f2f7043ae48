//! Verb and form data source.
//!
//! `InMemoryDataset` is built from a JSON document. Verbs that ship without explicit
//! forms get their regular paradigm generated on first access, a chunk of verbs at a
//! time, yielding to the runtime between chunks.

pub mod cache;

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::eligibility::VerbIndex;
use crate::error::DatasetError;
use crate::morphology;
use crate::types::{FrequencyBand, Form, Mood, Person, Region, Tense, Verb, VerbType};

use self::cache::{forms_key, verb_key, LookupCache};

pub const DEFAULT_CHUNK_SIZE: usize = 25;

/// Read-side contract the engine needs from its data source.
#[allow(async_fn_in_trait)]
pub trait VerbDataset {
    async fn get_all_verbs(&self) -> Vec<Verb>;

    async fn get_verb_by_lemma(&self, lemma: &str) -> Option<Verb>;

    async fn get_all_forms(&self) -> Vec<Form>;

    /// Direct scan for a mood/tense, bypassing any caller-side pool.
    async fn forms_for(&self, mood: Mood, tense: Tense) -> Vec<Form>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRecord {
    pub mood: Mood,
    pub tense: Tense,
    #[serde(default)]
    pub person: Option<Person>,
    pub value: String,
    #[serde(default)]
    pub region_tag: Option<Region>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbRecord {
    pub lemma: String,
    #[serde(rename = "type")]
    pub verb_type: VerbType,
    #[serde(default)]
    pub irregular_tenses: HashMap<Tense, bool>,
    #[serde(default)]
    pub frequency: FrequencyBand,
    #[serde(default)]
    pub families: Vec<String>,
    #[serde(default)]
    pub forms: Vec<FormRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetDocument {
    pub verbs: Vec<VerbRecord>,
    /// Forms listed outside their verb record, matched by lemma.
    #[serde(default)]
    pub forms: Vec<Form>,
}

impl VerbRecord {
    fn verb(&self) -> Verb {
        Verb {
            lemma: self.lemma.clone(),
            verb_type: self.verb_type,
            irregularity: self.irregular_tenses.clone(),
            frequency: self.frequency,
            families: self.families.clone(),
        }
    }
}

/// Explicit forms plus generated regular forms for tenses the record leaves
/// uncovered and does not flag as irregular.
fn expand_explicit(record: &VerbRecord, verb: &Verb) -> Result<Vec<Form>, DatasetError> {
    let mut out = Vec::with_capacity(record.forms.len());
    let mut covered: HashSet<Tense> = HashSet::new();

    for f in &record.forms {
        if f.value.trim().is_empty() {
            return Err(DatasetError::EmptyForm {
                lemma: record.lemma.clone(),
            });
        }
        covered.insert(f.tense);
        let mut form = Form::new(&record.lemma, f.mood, f.tense, f.person, f.value.trim());
        form.verb_type = Some(if verb.is_irregular_in(f.tense) {
            VerbType::Irregular
        } else {
            VerbType::Regular
        });
        form.region_tag = f.region_tag;
        out.push(form);
    }

    for tense in morphology::CONCRETE_TENSES {
        if covered.contains(&tense) || verb.is_irregular_in(tense) {
            continue;
        }
        out.extend(morphology::regular_tense_forms(&record.lemma, tense));
    }
    Ok(out)
}

pub struct InMemoryDataset {
    verbs: Vec<Verb>,
    index: VerbIndex,
    forms: RwLock<Vec<Form>>,
    pending: Mutex<VecDeque<String>>,
    chunk_size: usize,
    verb_cache: LookupCache<Option<Verb>>,
    form_cache: LookupCache<Arc<Vec<Form>>>,
}

impl InMemoryDataset {
    pub fn from_document(doc: DatasetDocument) -> Result<Self, DatasetError> {
        Self::with_cache(doc, cache::DEFAULT_CAPACITY, cache::DEFAULT_TTL)
    }

    pub fn with_cache(
        doc: DatasetDocument,
        capacity: usize,
        ttl: Duration,
    ) -> Result<Self, DatasetError> {
        let mut verbs = Vec::with_capacity(doc.verbs.len());
        let mut index = VerbIndex::new();
        let mut forms = Vec::new();
        let mut pending = VecDeque::new();

        let known: HashSet<&str> = doc.verbs.iter().map(|v| v.lemma.as_str()).collect();
        let mut loose: HashMap<String, Vec<FormRecord>> = HashMap::new();
        for form in &doc.forms {
            if !known.contains(form.lemma.as_str()) {
                return Err(DatasetError::UnknownVerb(form.lemma.clone()));
            }
            loose.entry(form.lemma.clone()).or_default().push(FormRecord {
                mood: form.mood,
                tense: form.tense,
                person: form.person,
                value: form.value.clone(),
                region_tag: form.region_tag,
            });
        }

        for record in &doc.verbs {
            if index.contains_key(&record.lemma) {
                return Err(DatasetError::DuplicateVerb(record.lemma.clone()));
            }
            let mut record = record.clone();
            if let Some(extra) = loose.remove(&record.lemma) {
                record.forms.extend(extra);
            }
            let record = &record;
            let verb = record.verb();

            if record.forms.is_empty() {
                if record.verb_type == VerbType::Regular {
                    pending.push_back(record.lemma.clone());
                } else {
                    tracing::warn!(lemma = %record.lemma, "irregular verb without forms");
                }
            } else {
                forms.extend(expand_explicit(record, &verb)?);
            }

            index.insert(verb.lemma.clone(), verb.clone());
            verbs.push(verb);
        }

        tracing::info!(
            verbs = verbs.len(),
            explicit_forms = forms.len(),
            pending = pending.len(),
            "dataset loaded"
        );

        Ok(Self {
            verbs,
            index,
            forms: RwLock::new(forms),
            pending: Mutex::new(pending),
            chunk_size: DEFAULT_CHUNK_SIZE,
            verb_cache: LookupCache::new(capacity, ttl),
            form_cache: LookupCache::new(capacity, ttl),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let doc: DatasetDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    pub async fn load(path: impl AsRef<Path>, capacity: usize, ttl: Duration) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "reading dataset file");
        let raw = tokio::fs::read_to_string(path).await?;
        let doc: DatasetDocument = serde_json::from_str(&raw)?;
        Self::with_cache(doc, capacity, ttl)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Lemma -> verb map used by filter and selector stages.
    pub fn verb_index(&self) -> &VerbIndex {
        &self.index
    }

    pub fn pending_verbs(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn cache_stats(&self) -> (cache::CacheStats, cache::CacheStats) {
        (self.verb_cache.stats(), self.form_cache.stats())
    }

    /// Generates outstanding regular paradigms chunk by chunk.
    pub async fn ensure_expanded(&self) {
        loop {
            let chunk: Vec<String> = {
                let mut pending = self.pending.lock();
                let take = self.chunk_size.min(pending.len());
                pending.drain(..take).collect()
            };
            if chunk.is_empty() {
                break;
            }

            let generated: Vec<Form> = chunk
                .iter()
                .flat_map(|lemma| morphology::regular_paradigm(lemma))
                .collect();
            tracing::debug!(
                verbs = chunk.len(),
                forms = generated.len(),
                "expanded regular paradigms"
            );
            self.forms.write().extend(generated);
            self.form_cache.clear();

            tokio::task::yield_now().await;
        }
    }
}

impl VerbDataset for InMemoryDataset {
    async fn get_all_verbs(&self) -> Vec<Verb> {
        self.verbs.clone()
    }

    async fn get_verb_by_lemma(&self, lemma: &str) -> Option<Verb> {
        let key = verb_key(lemma);
        if let Some(hit) = self.verb_cache.get(&key) {
            return hit;
        }
        let found = self.index.get(lemma).cloned();
        self.verb_cache.insert(key, found.clone());
        found
    }

    async fn get_all_forms(&self) -> Vec<Form> {
        self.ensure_expanded().await;
        self.forms.read().clone()
    }

    async fn forms_for(&self, mood: Mood, tense: Tense) -> Vec<Form> {
        self.ensure_expanded().await;
        let key = forms_key(mood, tense);
        if let Some(hit) = self.form_cache.get(&key) {
            return hit.as_ref().clone();
        }
        let matches: Vec<Form> = self
            .forms
            .read()
            .iter()
            .filter(|f| f.mood == mood && f.tense == tense)
            .cloned()
            .collect();
        self.form_cache.insert(key, Arc::new(matches.clone()));
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "verbs": [
            { "lemma": "hablar", "type": "regular", "frequency": "high" },
            { "lemma": "comer", "type": "regular" },
            {
                "lemma": "tener",
                "type": "irregular",
                "irregularTenses": { "pres": true },
                "forms": [
                    { "mood": "indicative", "tense": "pres", "person": "1s", "value": "tengo" }
                ]
            }
        ]
    }"#;

    #[tokio::test]
    async fn regular_paradigms_expand_lazily() {
        let dataset = InMemoryDataset::from_json_str(DOC)
            .unwrap()
            .with_chunk_size(1);
        assert_eq!(dataset.pending_verbs(), 2);

        let forms = dataset.get_all_forms().await;
        assert_eq!(dataset.pending_verbs(), 0);
        assert!(forms.iter().any(|f| f.lemma == "hablar" && f.value == "hablamos"));
        assert!(forms.iter().any(|f| f.lemma == "comer" && f.value == "comiendo"));
    }

    #[tokio::test]
    async fn explicit_irregular_tenses_are_not_generated() {
        let dataset = InMemoryDataset::from_json_str(DOC).unwrap();
        let pres = dataset.forms_for(Mood::Indicative, Tense::Pres).await;
        let tener: Vec<&Form> = pres.iter().filter(|f| f.lemma == "tener").collect();
        assert_eq!(tener.len(), 1);
        assert_eq!(tener[0].value, "tengo");
        assert_eq!(tener[0].verb_type, Some(VerbType::Irregular));

        // matrix is silent on impf and the global type is irregular
        let impf = dataset.forms_for(Mood::Indicative, Tense::Impf).await;
        assert!(!impf.iter().any(|f| f.lemma == "tener"));
    }

    #[tokio::test]
    async fn verb_lookup_is_cached() {
        let dataset = InMemoryDataset::from_json_str(DOC).unwrap();
        assert!(dataset.get_verb_by_lemma("hablar").await.is_some());
        assert!(dataset.get_verb_by_lemma("hablar").await.is_some());
        assert!(dataset.get_verb_by_lemma("zzz").await.is_none());
        let (verb_stats, _) = dataset.cache_stats();
        assert_eq!(verb_stats.hits, 1);
        assert_eq!(verb_stats.misses, 2);
    }

    #[test]
    fn duplicate_lemma_is_rejected() {
        let doc = r#"{ "verbs": [
            { "lemma": "hablar", "type": "regular" },
            { "lemma": "hablar", "type": "regular" }
        ] }"#;
        assert!(matches!(
            InMemoryDataset::from_json_str(doc),
            Err(DatasetError::DuplicateVerb(lemma)) if lemma == "hablar"
        ));
    }

    #[test]
    fn loose_form_for_unknown_verb_is_rejected() {
        let doc = r#"{
            "verbs": [ { "lemma": "hablar", "type": "regular" } ],
            "forms": [ { "lemma": "ir", "mood": "indicative", "tense": "pres", "person": "1s", "value": "voy" } ]
        }"#;
        assert!(matches!(
            InMemoryDataset::from_json_str(doc),
            Err(DatasetError::UnknownVerb(lemma)) if lemma == "ir"
        ));
    }

    #[test]
    fn empty_form_value_is_rejected() {
        let doc = r#"{ "verbs": [
            { "lemma": "ser", "type": "irregular",
              "forms": [ { "mood": "indicative", "tense": "pres", "person": "1s", "value": " " } ] }
        ] }"#;
        assert!(matches!(
            InMemoryDataset::from_json_str(doc),
            Err(DatasetError::EmptyForm { .. })
        ));
    }
}
