use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Indicative,
    Subjunctive,
    Imperative,
    Conditional,
    Nonfinite,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Self::Indicative,
        Self::Subjunctive,
        Self::Imperative,
        Self::Conditional,
        Self::Nonfinite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indicative => "indicative",
            Self::Subjunctive => "subjunctive",
            Self::Imperative => "imperative",
            Self::Conditional => "conditional",
            Self::Nonfinite => "nonfinite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "indicative" => Some(Self::Indicative),
            "subjunctive" => Some(Self::Subjunctive),
            "imperative" => Some(Self::Imperative),
            "conditional" => Some(Self::Conditional),
            "nonfinite" => Some(Self::Nonfinite),
            _ => None,
        }
    }

    /// Tense used when a request only pins the mood.
    pub fn most_common_tense(&self) -> Tense {
        match self {
            Self::Indicative => Tense::Pres,
            Self::Subjunctive => Tense::SubjPres,
            Self::Imperative => Tense::ImpAff,
            Self::Conditional => Tense::Cond,
            Self::Nonfinite => Tense::Ger,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tense {
    Pres,
    PretIndef,
    Impf,
    Fut,
    PretPerf,
    Plusc,
    FutPerf,
    Cond,
    CondPerf,
    SubjPres,
    SubjImpf,
    SubjFut,
    SubjPerf,
    SubjPlusc,
    ImpAff,
    ImpNeg,
    /// Affirmative and negative imperative drilled together.
    ImpMixed,
    Inf,
    InfPerf,
    Ger,
    Part,
    /// Gerund and participle drilled together.
    NonfiniteMixed,
}

impl Tense {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pres => "pres",
            Self::PretIndef => "pretIndef",
            Self::Impf => "impf",
            Self::Fut => "fut",
            Self::PretPerf => "pretPerf",
            Self::Plusc => "plusc",
            Self::FutPerf => "futPerf",
            Self::Cond => "cond",
            Self::CondPerf => "condPerf",
            Self::SubjPres => "subjPres",
            Self::SubjImpf => "subjImpf",
            Self::SubjFut => "subjFut",
            Self::SubjPerf => "subjPerf",
            Self::SubjPlusc => "subjPlusc",
            Self::ImpAff => "impAff",
            Self::ImpNeg => "impNeg",
            Self::ImpMixed => "impMixed",
            Self::Inf => "inf",
            Self::InfPerf => "infPerf",
            Self::Ger => "ger",
            Self::Part => "part",
            Self::NonfiniteMixed => "nonfiniteMixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let tense = match s.trim() {
            "pres" => Self::Pres,
            "pretIndef" => Self::PretIndef,
            "impf" => Self::Impf,
            "fut" => Self::Fut,
            "pretPerf" => Self::PretPerf,
            "plusc" => Self::Plusc,
            "futPerf" => Self::FutPerf,
            "cond" => Self::Cond,
            "condPerf" => Self::CondPerf,
            "subjPres" => Self::SubjPres,
            "subjImpf" => Self::SubjImpf,
            "subjFut" => Self::SubjFut,
            "subjPerf" => Self::SubjPerf,
            "subjPlusc" => Self::SubjPlusc,
            "impAff" => Self::ImpAff,
            "impNeg" => Self::ImpNeg,
            "impMixed" => Self::ImpMixed,
            "inf" => Self::Inf,
            "infPerf" => Self::InfPerf,
            "ger" => Self::Ger,
            "part" => Self::Part,
            "nonfiniteMixed" => Self::NonfiniteMixed,
            _ => return None,
        };
        Some(tense)
    }

    pub fn mood(&self) -> Mood {
        match self {
            Self::Pres
            | Self::PretIndef
            | Self::Impf
            | Self::Fut
            | Self::PretPerf
            | Self::Plusc
            | Self::FutPerf => Mood::Indicative,
            Self::Cond | Self::CondPerf => Mood::Conditional,
            Self::SubjPres | Self::SubjImpf | Self::SubjFut | Self::SubjPerf | Self::SubjPlusc => {
                Mood::Subjunctive
            }
            Self::ImpAff | Self::ImpNeg | Self::ImpMixed => Mood::Imperative,
            Self::Inf | Self::InfPerf | Self::Ger | Self::Part | Self::NonfiniteMixed => {
                Mood::Nonfinite
            }
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Self::PretPerf
                | Self::Plusc
                | Self::FutPerf
                | Self::CondPerf
                | Self::SubjPerf
                | Self::SubjPlusc
                | Self::InfPerf
        )
    }

    /// Virtual tenses only exist as practice requests, never on a form.
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::ImpMixed | Self::NonfiniteMixed)
    }

    /// Whether a form carrying `self` satisfies a request for `requested`.
    pub fn satisfies(&self, requested: Tense) -> bool {
        match requested {
            Self::ImpMixed => matches!(self, Self::ImpAff | Self::ImpNeg),
            Self::NonfiniteMixed => matches!(self, Self::Ger | Self::Part),
            other => *self == other,
        }
    }
}

impl fmt::Display for Tense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Person {
    #[serde(rename = "1s")]
    FirstSingular,
    #[serde(rename = "2s_tu")]
    SecondSingularTu,
    #[serde(rename = "2s_vos")]
    SecondSingularVos,
    #[serde(rename = "3s")]
    ThirdSingular,
    #[serde(rename = "1p")]
    FirstPlural,
    #[serde(rename = "2p_vosotros")]
    SecondPluralVosotros,
    #[serde(rename = "3p")]
    ThirdPlural,
}

impl Person {
    pub const ALL: [Person; 7] = [
        Self::FirstSingular,
        Self::SecondSingularTu,
        Self::SecondSingularVos,
        Self::ThirdSingular,
        Self::FirstPlural,
        Self::SecondPluralVosotros,
        Self::ThirdPlural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstSingular => "1s",
            Self::SecondSingularTu => "2s_tu",
            Self::SecondSingularVos => "2s_vos",
            Self::ThirdSingular => "3s",
            Self::FirstPlural => "1p",
            Self::SecondPluralVosotros => "2p_vosotros",
            Self::ThirdPlural => "3p",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s.trim())
    }

    pub fn is_third(&self) -> bool {
        matches!(self, Self::ThirdSingular | Self::ThirdPlural)
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CEFR proficiency tier. Variant order is the curriculum order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    #[serde(rename = "ALL")]
    All,
}

impl Level {
    pub const ORDERED: [Level; 6] = [Self::A1, Self::A2, Self::B1, Self::B2, Self::C1, Self::C2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
            Self::All => "ALL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Some(Self::A1),
            "A2" => Some(Self::A2),
            "B1" => Some(Self::B1),
            "B2" => Some(Self::B2),
            "C1" => Some(Self::C1),
            "C2" => Some(Self::C2),
            "ALL" => Some(Self::All),
            _ => None,
        }
    }

    /// Position in A1..C2, `None` for `ALL`.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::All => None,
            other => Self::ORDERED.iter().position(|l| l == other).map(|p| p as u8),
        }
    }

    pub fn is_at_least(&self, other: Level) -> bool {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => a >= b,
            (None, _) => true,
            (Some(_), None) => false,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Rioplatense,
    Peninsular,
    LaGeneral,
    #[default]
    Other,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rioplatense => "rioplatense",
            Self::Peninsular => "peninsular",
            Self::LaGeneral => "la_general",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rioplatense" => Some(Self::Rioplatense),
            "peninsular" => Some(Self::Peninsular),
            "la_general" => Some(Self::LaGeneral),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// A form tagged for one dialect is only visible to learners of that dialect;
    /// `other` learners see every tagged form.
    pub fn accepts_tag(&self, tag: Option<Region>) -> bool {
        match tag {
            None | Some(Region::Other) => true,
            Some(tag) => *self == Region::Other || *self == tag,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbType {
    Regular,
    Irregular,
}

impl VerbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Irregular => "irregular",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyBand {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    #[default]
    Practice,
    /// Placeholder produced when no data exists for a request.
    Error,
}

/// One inflected surface string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub lemma: String,
    pub mood: Mood,
    pub tense: Tense,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_tag: Option<Region>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub verb_type: Option<VerbType>,
    #[serde(default)]
    pub kind: FormKind,
}

impl Form {
    pub fn new(
        lemma: impl Into<String>,
        mood: Mood,
        tense: Tense,
        person: Option<Person>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            lemma: lemma.into(),
            mood,
            tense,
            person,
            value: value.into(),
            region_tag: None,
            verb_type: None,
            kind: FormKind::Practice,
        }
    }

    pub fn with_type(mut self, verb_type: VerbType) -> Self {
        self.verb_type = Some(verb_type);
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region_tag = Some(region);
        self
    }

    /// Visibly wrong placeholder so callers always have something to render.
    pub fn sentinel(mood: Mood, tense: Tense) -> Self {
        Self {
            lemma: "(sin datos)".to_string(),
            mood,
            tense,
            person: None,
            value: format!("(no hay formas para {}/{})", mood, tense),
            region_tag: None,
            verb_type: None,
            kind: FormKind::Error,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.kind == FormKind::Error
    }

    pub fn is_finite(&self) -> bool {
        self.mood != Mood::Nonfinite
    }

    /// Bare and perfect infinitives are reference forms, never drill answers.
    pub fn is_infinitive(&self) -> bool {
        matches!(self.tense, Tense::Inf | Tense::InfPerf)
    }

    pub fn matches_request(&self, mood: Option<Mood>, tense: Option<Tense>) -> bool {
        mood.map_or(true, |m| self.mood == m) && tense.map_or(true, |t| self.tense.satisfies(t))
    }

    pub fn cell(&self) -> Cell {
        Cell {
            mood: self.mood,
            tense: self.tense,
            person: self.person,
            lemma: self.lemma.clone(),
        }
    }

    /// Attempt history key: the cell plus the exact surface string shown.
    pub fn item_id(&self) -> String {
        format!("{}#{}", self.cell().id(), self.value)
    }

    pub fn same_item(&self, other: &Form) -> bool {
        self.lemma == other.lemma
            && self.mood == other.mood
            && self.tense == other.tense
            && self.person == other.person
            && self.value == other.value
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verb {
    pub lemma: String,
    #[serde(rename = "type")]
    pub verb_type: VerbType,
    #[serde(default, rename = "irregularTenses")]
    pub irregularity: HashMap<Tense, bool>,
    #[serde(default)]
    pub frequency: FrequencyBand,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub families: Vec<String>,
}

impl Verb {
    pub fn new(lemma: impl Into<String>, verb_type: VerbType) -> Self {
        Self {
            lemma: lemma.into(),
            verb_type,
            irregularity: HashMap::new(),
            frequency: FrequencyBand::Medium,
            families: Vec::new(),
        }
    }

    /// Per-tense irregularity; the global type only answers when the matrix is silent.
    pub fn is_irregular_in(&self, tense: Tense) -> bool {
        match self.irregularity.get(&tense) {
            Some(flag) => *flag,
            None => self.verb_type == VerbType::Irregular,
        }
    }
}

/// Practice unit identity that mastery is tracked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub mood: Mood,
    pub tense: Tense,
    pub person: Option<Person>,
    pub lemma: String,
}

impl Cell {
    pub fn id(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.mood,
            self.tense,
            self.person.map(|p| p.as_str()).unwrap_or("-"),
            self.lemma
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: Uuid,
    pub item_id: String,
    pub correct: bool,
    pub latency_ms: u64,
    pub hints_used: u32,
    pub created_at: DateTime<Utc>,
}

impl Attempt {
    pub fn new(
        item_id: impl Into<String>,
        correct: bool,
        latency_ms: u64,
        hints_used: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id: item_id.into(),
            correct,
            latency_ms,
            hints_used,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterySnapshot {
    pub score: f64,
    pub n: usize,
    pub weighted_attempts: f64,
    pub updated_at: DateTime<Utc>,
}
