//! Recency- and difficulty-weighted mastery scoring.
//!
//! Each attempt is weighted by how recent it is (exponential decay with time
//! constant τ) and by how hard the verb is. The item score is the weighted share
//! of correct attempts, less a capped penalty for hints used on correct answers.
//! Cells aggregate their items by weighted-attempt mass so that a single lucky
//! attempt on one variant does not outweigh a well-practised sibling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MasteryParams;
use crate::eligibility::VerbIndex;
use crate::error::StoreError;
use crate::store::PracticeStore;
use crate::types::{Attempt, Cell, FrequencyBand, Tense, Verb};

/// Score of one practice item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemScore {
    /// 0-100
    pub score: f64,
    /// Raw attempt count
    pub n: usize,
    /// Σ recency × difficulty over all attempts
    pub weighted_attempts: f64,
}

/// Aggregate over the items of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellScore {
    pub score: f64,
    pub n: usize,
    pub weighted_n: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confidence {
    pub level: ConfidenceLevel,
    /// Whether the score is trustworthy enough to classify.
    pub sufficient: bool,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryBand {
    Achieved,
    Attention,
    Critical,
    Insufficient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryAssessment {
    pub band: MasteryBand,
    pub recommendations: Vec<String>,
}

/// Attempts of one item together with the lemma they belong to.
#[derive(Debug, Clone, Copy)]
pub struct ItemHistory<'a> {
    pub lemma: &'a str,
    pub tense: Tense,
    pub attempts: &'a [Attempt],
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default)]
pub struct MasteryScorer {
    params: MasteryParams,
}

impl MasteryScorer {
    pub fn new(params: MasteryParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MasteryParams {
        &self.params
    }

    /// `exp(-Δdays / τ)` rounded to two decimals.
    pub fn recency_weight(&self, age_days: f64) -> f64 {
        let tau = self.params.recency_tau_days.max(f64::EPSILON);
        round2((-age_days.max(0.0) / tau).exp())
    }

    /// Regular in `tense` means the base multiplier, whatever the verb's global type.
    pub fn difficulty(&self, verb: Option<&Verb>, tense: Tense) -> f64 {
        let p = &self.params;
        let Some(verb) = verb else {
            return p.regular_difficulty;
        };
        let base = if verb.is_irregular_in(tense) {
            p.irregular_difficulty
                + match verb.frequency {
                    FrequencyBand::High => -p.frequency_adjustment,
                    FrequencyBand::Medium => 0.0,
                    FrequencyBand::Low => p.frequency_adjustment,
                }
        } else {
            p.regular_difficulty
        };
        base.clamp(p.min_difficulty, p.max_difficulty)
    }

    pub fn hint_penalty(&self, hints: u32) -> f64 {
        (f64::from(hints) * self.params.hint_penalty).min(self.params.hint_penalty_cap)
    }

    pub fn score_item(
        &self,
        attempts: &[Attempt],
        verb: Option<&Verb>,
        tense: Tense,
        now: DateTime<Utc>,
    ) -> ItemScore {
        if attempts.is_empty() {
            return ItemScore {
                score: self.params.neutral_score,
                n: 0,
                weighted_attempts: 0.0,
            };
        }

        let difficulty = self.difficulty(verb, tense);
        let mut total = 0.0;
        let mut correct = 0.0;
        let mut hints_on_correct = 0u32;

        for attempt in attempts {
            let age_days = (now - attempt.created_at).num_milliseconds() as f64 / 86_400_000.0;
            let value = self.recency_weight(age_days) * difficulty;
            total += value;
            if attempt.correct {
                correct += value;
                hints_on_correct = hints_on_correct.saturating_add(attempt.hints_used);
            }
        }

        let raw = if total > 0.0 {
            100.0 * correct / total
        } else {
            self.params.neutral_score
        };
        let score = (raw - self.hint_penalty(hints_on_correct)).clamp(0.0, 100.0);

        ItemScore {
            score,
            n: attempts.len(),
            weighted_attempts: total,
        }
    }

    pub fn score_cell(&self, items: &[ItemHistory<'_>], verbs: &VerbIndex, now: DateTime<Utc>) -> CellScore {
        let scores: Vec<ItemScore> = items
            .iter()
            .map(|item| self.score_item(item.attempts, verbs.get(item.lemma), item.tense, now))
            .collect();
        self.aggregate(&scores)
    }

    /// Mass-weighted mean of item scores; neutral when nothing carries weight.
    pub fn aggregate(&self, scores: &[ItemScore]) -> CellScore {
        let n = scores.iter().map(|s| s.n).sum();
        let weighted_n: f64 = scores.iter().map(|s| s.weighted_attempts).sum();
        let score = if weighted_n > 0.0 {
            scores
                .iter()
                .map(|s| s.score * s.weighted_attempts)
                .sum::<f64>()
                / weighted_n
        } else {
            self.params.neutral_score
        };
        CellScore {
            score,
            n,
            weighted_n,
        }
    }

    pub fn confidence(&self, weighted_n: f64) -> Confidence {
        if weighted_n >= self.params.high_confidence {
            Confidence {
                level: ConfidenceLevel::High,
                sufficient: true,
                message: "enough recent practice for a reliable score",
            }
        } else if weighted_n >= self.params.medium_confidence {
            Confidence {
                level: ConfidenceLevel::Medium,
                sufficient: true,
                message: "score is indicative; more practice will firm it up",
            }
        } else {
            Confidence {
                level: ConfidenceLevel::Low,
                sufficient: false,
                message: "not enough recent practice to judge",
            }
        }
    }

    pub fn classify(&self, score: f64, weighted_n: f64, avg_latency_ms: Option<f64>) -> MasteryAssessment {
        let p = &self.params;
        let confidence = self.confidence(weighted_n);

        let (band, mut recommendations) = if !confidence.sufficient {
            (
                MasteryBand::Insufficient,
                vec!["Keep practising this cell so its score can be assessed.".to_string()],
            )
        } else if score >= p.achieved_threshold {
            (
                MasteryBand::Achieved,
                vec!["Mastered: review occasionally and move on to new material.".to_string()],
            )
        } else if score >= p.attention_threshold {
            (
                MasteryBand::Attention,
                vec!["Needs attention: mix this cell into regular review.".to_string()],
            )
        } else {
            (
                MasteryBand::Critical,
                vec![
                    "Critical: drill this cell in short focused sessions.".to_string(),
                    "Review the conjugation pattern before practising again.".to_string(),
                ],
            )
        };

        if avg_latency_ms.map_or(false, |ms| ms > p.slow_latency_ms) {
            recommendations.push("Work on speed: aim to answer within a few seconds.".to_string());
        }

        MasteryAssessment {
            band,
            recommendations,
        }
    }
}

/// Mean response time of the given attempts.
pub fn average_latency_ms(attempts: &[Attempt]) -> Option<f64> {
    if attempts.is_empty() {
        return None;
    }
    let total: u64 = attempts.iter().map(|a| a.latency_ms).sum();
    Some(total as f64 / attempts.len() as f64)
}

/// Scores one item from the attempt history held by the store.
pub async fn calculate_mastery_for_item<S: PracticeStore>(
    store: &S,
    scorer: &MasteryScorer,
    user_id: &str,
    item_id: &str,
    verb: Option<&Verb>,
    tense: Tense,
    now: DateTime<Utc>,
) -> Result<ItemScore, StoreError> {
    let attempts = store.attempts_for_item(user_id, item_id).await?;
    Ok(scorer.score_item(&attempts, verb, tense, now))
}

/// Scores a cell from every item the store has recorded under it.
pub async fn calculate_mastery_for_cell<S: PracticeStore>(
    store: &S,
    scorer: &MasteryScorer,
    user_id: &str,
    cell: &Cell,
    verbs: &VerbIndex,
    now: DateTime<Utc>,
) -> Result<CellScore, StoreError> {
    let cell_id = cell.id();
    let item_ids = store.items_for_cell(user_id, &cell_id).await?;
    let verb = verbs.get(&cell.lemma);

    let mut scores = Vec::with_capacity(item_ids.len());
    for item_id in &item_ids {
        let attempts = store.attempts_for_item(user_id, item_id).await?;
        scores.push(scorer.score_item(&attempts, verb, cell.tense, now));
    }
    let cell_score = scorer.aggregate(&scores);
    tracing::debug!(
        cell = %cell_id,
        items = item_ids.len(),
        score = cell_score.score,
        weighted_n = cell_score.weighted_n,
        "cell mastery recomputed"
    );
    Ok(cell_score)
}
