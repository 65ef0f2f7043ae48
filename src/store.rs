use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::types::{Attempt, MasterySnapshot};

#[allow(async_fn_in_trait)]
pub trait PracticeStore {
    /// Appends an attempt for an item that belongs to `cell_id`.
    async fn record_attempt(
        &self,
        user_id: &str,
        cell_id: &str,
        attempt: Attempt,
    ) -> Result<(), StoreError>;

    async fn attempts_for_item(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<Vec<Attempt>, StoreError>;

    /// Item ids recorded under a cell, in first-seen order.
    async fn items_for_cell(&self, user_id: &str, cell_id: &str)
        -> Result<Vec<String>, StoreError>;

    async fn save_mastery(
        &self,
        user_id: &str,
        cell_id: &str,
        snapshot: MasterySnapshot,
    ) -> Result<(), StoreError>;

    async fn mastery(
        &self,
        user_id: &str,
        cell_id: &str,
    ) -> Result<Option<MasterySnapshot>, StoreError>;

    /// Cell id -> latest mastery score for the user.
    async fn mastery_scores(&self, user_id: &str) -> Result<HashMap<String, f64>, StoreError>;
}

type UserKey = (String, String);

#[derive(Default)]
pub struct InMemoryStore {
    attempts: RwLock<HashMap<UserKey, Vec<Attempt>>>,
    cell_items: RwLock<HashMap<UserKey, Vec<String>>>,
    snapshots: RwLock<HashMap<UserKey, MasterySnapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots of a user, sorted by cell id.
    pub fn snapshots_for(&self, user_id: &str) -> Vec<(String, MasterySnapshot)> {
        let mut out: Vec<(String, MasterySnapshot)> = self
            .snapshots
            .read()
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|((_, cell), snap)| (cell.clone(), snap.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn attempt_count(&self, user_id: &str) -> usize {
        self.attempts
            .read()
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|(_, list)| list.len())
            .sum()
    }
}

fn key(user_id: &str, id: &str) -> UserKey {
    (user_id.to_string(), id.to_string())
}

fn require_user(user_id: &str) -> Result<(), StoreError> {
    if user_id.trim().is_empty() {
        return Err(StoreError::UnknownUser(user_id.to_string()));
    }
    Ok(())
}

impl PracticeStore for InMemoryStore {
    async fn record_attempt(
        &self,
        user_id: &str,
        cell_id: &str,
        attempt: Attempt,
    ) -> Result<(), StoreError> {
        require_user(user_id)?;
        {
            let mut items = self.cell_items.write();
            let list = items.entry(key(user_id, cell_id)).or_default();
            if !list.contains(&attempt.item_id) {
                list.push(attempt.item_id.clone());
            }
        }
        self.attempts
            .write()
            .entry(key(user_id, &attempt.item_id))
            .or_default()
            .push(attempt);
        Ok(())
    }

    async fn attempts_for_item(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<Vec<Attempt>, StoreError> {
        Ok(self
            .attempts
            .read()
            .get(&key(user_id, item_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn items_for_cell(
        &self,
        user_id: &str,
        cell_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self
            .cell_items
            .read()
            .get(&key(user_id, cell_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn save_mastery(
        &self,
        user_id: &str,
        cell_id: &str,
        snapshot: MasterySnapshot,
    ) -> Result<(), StoreError> {
        require_user(user_id)?;
        self.snapshots.write().insert(key(user_id, cell_id), snapshot);
        Ok(())
    }

    async fn mastery(
        &self,
        user_id: &str,
        cell_id: &str,
    ) -> Result<Option<MasterySnapshot>, StoreError> {
        Ok(self.snapshots.read().get(&key(user_id, cell_id)).cloned())
    }

    async fn mastery_scores(&self, user_id: &str) -> Result<HashMap<String, f64>, StoreError> {
        Ok(self
            .snapshots
            .read()
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|((_, cell), snap)| (cell.clone(), snap.score))
            .collect())
    }
}
