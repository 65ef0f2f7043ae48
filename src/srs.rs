use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, SchedulerParams};
use crate::error::StoreError;
use crate::types::Cell;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewOutcome {
    pub correct: bool,
    /// Cell mastery after the answer was scored.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub cell: Cell,
    pub due_at: DateTime<Utc>,
    /// Current rung on the interval ladder; `None` until the first hit.
    pub step: Option<usize>,
    pub reps: u32,
    pub lapses: u32,
    pub interval_minutes: i64,
}

#[allow(async_fn_in_trait)]
pub trait SpacedRepetition {
    /// Cells whose due date has passed, earliest first.
    async fn get_due_items(&self, user_id: &str, now: DateTime<Utc>)
        -> Result<Vec<Cell>, StoreError>;

    async fn update_schedule(
        &self,
        user_id: &str,
        cell: &Cell,
        outcome: ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<ScheduleEntry, StoreError>;
}

/// A miss brings the cell back after a short relearning delay and resets its rung.
/// A hit climbs one rung; the rung's interval is scaled by the cell's mastery band.
pub struct IntervalScheduler {
    params: SchedulerParams,
    achieved_threshold: f64,
    attention_threshold: f64,
    entries: RwLock<HashMap<(String, String), ScheduleEntry>>,
}

impl IntervalScheduler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            params: config.scheduler.clone(),
            achieved_threshold: config.mastery.achieved_threshold,
            attention_threshold: config.mastery.attention_threshold,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn band_factor(&self, score: f64) -> f64 {
        if score >= self.achieved_threshold {
            self.params.achieved_factor
        } else if score >= self.attention_threshold {
            self.params.attention_factor
        } else {
            self.params.critical_factor
        }
    }

    /// Next state of an entry after one review.
    pub fn next_entry(&self, previous: Option<&ScheduleEntry>, cell: &Cell, outcome: ReviewOutcome, now: DateTime<Utc>) -> ScheduleEntry {
        let reps = previous.map_or(0, |e| e.reps) + 1;
        let lapses = previous.map_or(0, |e| e.lapses);

        if !outcome.correct {
            let minutes = self.params.relearn_minutes.max(1);
            return ScheduleEntry {
                cell: cell.clone(),
                due_at: now + Duration::minutes(minutes),
                step: None,
                reps,
                lapses: lapses + 1,
                interval_minutes: minutes,
            };
        }

        let top = self.params.ladder_days.len().saturating_sub(1);
        let step = match previous.and_then(|e| e.step) {
            Some(s) => (s + 1).min(top),
            None => 0,
        };
        let days = self.params.ladder_days.get(step).copied().unwrap_or(1) as f64;
        let minutes = ((days * self.band_factor(outcome.score) * 1440.0).round() as i64).max(1);

        ScheduleEntry {
            cell: cell.clone(),
            due_at: now + Duration::minutes(minutes),
            step: Some(step),
            reps,
            lapses,
            interval_minutes: minutes,
        }
    }

    /// Cell id -> due date, for feeding selection settings.
    pub fn due_schedule(&self, user_id: &str) -> HashMap<String, DateTime<Utc>> {
        self.entries
            .read()
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|((_, cell_id), entry)| (cell_id.clone(), entry.due_at))
            .collect()
    }

    pub fn entry(&self, user_id: &str, cell_id: &str) -> Option<ScheduleEntry> {
        self.entries
            .read()
            .get(&(user_id.to_string(), cell_id.to_string()))
            .cloned()
    }
}

impl SpacedRepetition for IntervalScheduler {
    async fn get_due_items(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Cell>, StoreError> {
        let mut due: Vec<(DateTime<Utc>, Cell)> = self
            .entries
            .read()
            .iter()
            .filter(|((user, _), entry)| user == user_id && entry.due_at <= now)
            .map(|(_, entry)| (entry.due_at, entry.cell.clone()))
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        Ok(due.into_iter().map(|(_, cell)| cell).collect())
    }

    async fn update_schedule(
        &self,
        user_id: &str,
        cell: &Cell,
        outcome: ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<ScheduleEntry, StoreError> {
        let key = (user_id.to_string(), cell.id());
        let mut entries = self.entries.write();
        let next = self.next_entry(entries.get(&key), cell, outcome, now);
        tracing::debug!(
            cell = %key.1,
            correct = outcome.correct,
            interval_minutes = next.interval_minutes,
            "rescheduled"
        );
        entries.insert(key, next.clone());
        Ok(next)
    }
}
