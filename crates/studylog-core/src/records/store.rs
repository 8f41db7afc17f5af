//! Capped, append-only study history plus per-path saved question states.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::record::{QuestionMark, QuestionState, StudyRecord};
use crate::hierarchy::{BankId, HierarchyStore};
use crate::path::{path_key, path_matches};

/// Default number of records kept in the history.
pub const DEFAULT_HISTORY_CAP: usize = 1000;

/// Saved cell states of a single path, keyed by question number.
pub type PathStates = BTreeMap<u32, QuestionMark>;

/// Record selection; every `None` field matches everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub bank_id: Option<BankId>,
    pub path_prefix: Option<Vec<String>>,
    /// Half-open `[from, to)` window on the record timestamp.
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bank(mut self, bank_id: BankId) -> Self {
        self.bank_id = Some(bank_id);
        self
    }

    pub fn path_prefix(mut self, path: Vec<String>) -> Self {
        self.path_prefix = Some(path);
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.date_range = Some((from, to));
        self
    }

    pub fn matches(&self, record: &StudyRecord) -> bool {
        if let Some(bank_id) = &self.bank_id {
            if &record.bank_id != bank_id {
                return false;
            }
        }
        if let Some(prefix) = &self.path_prefix {
            if !path_matches(&record.path, prefix) {
                return false;
            }
        }
        if let Some((from, to)) = &self.date_range {
            if record.timestamp < *from || record.timestamp >= *to {
                return false;
            }
        }
        true
    }
}

/// Iteration order of [`RecordStore::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryOrder {
    #[default]
    Insertion,
    /// Latest timestamp first; ties keep the later insertion first.
    NewestFirst,
}

/// What happened on [`RecordStore::append`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppendReport {
    pub record_id: String,
    /// Oldest records dropped to respect the cap.
    pub evicted: usize,
    /// Outcome keys that the record's path does not define.
    pub unknown_questions: Vec<u32>,
}

/// The study history and the saved question states.
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<StudyRecord>,
    capacity: usize,
    saved_states: IndexMap<String, PathStates>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAP)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity: capacity.max(1),
            saved_states: IndexMap::new(),
        }
    }

    /// Rebuild from persisted parts, trimming history that exceeds the cap.
    pub fn from_parts(
        records: Vec<StudyRecord>,
        saved_states: IndexMap<String, PathStates>,
        capacity: usize,
    ) -> Self {
        let mut store = Self {
            records,
            capacity: capacity.max(1),
            saved_states,
        };
        store.enforce_cap();
        store
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record in insertion order.
    pub fn records(&self) -> &[StudyRecord] {
        &self.records
    }

    pub fn saved_states(&self) -> &IndexMap<String, PathStates> {
        &self.saved_states
    }

    /// Append a record, dropping the oldest entries beyond the cap.
    ///
    /// Outcome keys the path does not define are reported and logged but the
    /// record is kept as-is; analytics tolerate the mismatch.
    pub fn append(&mut self, record: StudyRecord, hierarchy: &HierarchyStore) -> AppendReport {
        let known = hierarchy.questions_under(&record.bank_id, &record.path);
        let unknown_questions: Vec<u32> = record
            .per_question_outcome
            .keys()
            .copied()
            .filter(|number| !known.contains(number))
            .collect();
        if !unknown_questions.is_empty() {
            tracing::warn!(
                bank = %record.bank_id,
                path = ?record.path,
                unknown = unknown_questions.len(),
                "record references questions outside its path"
            );
        }

        let record_id = record.id.clone();
        self.records.push(record);
        let evicted = self.enforce_cap();
        if evicted > 0 {
            tracing::debug!(evicted, cap = self.capacity, "evicted oldest study records");
        }

        AppendReport {
            record_id,
            evicted,
            unknown_questions,
        }
    }

    fn enforce_cap(&mut self) -> usize {
        let excess = self.records.len().saturating_sub(self.capacity);
        if excess > 0 {
            self.records.drain(..excess);
        }
        excess
    }

    /// Lazily iterate the records matching `filter`.
    ///
    /// Each call starts a fresh iteration over the current history.
    pub fn query<'a>(
        &'a self,
        filter: &'a RecordFilter,
        order: QueryOrder,
    ) -> Box<dyn Iterator<Item = &'a StudyRecord> + 'a> {
        let matching = self.records.iter().filter(move |r| filter.matches(r));
        match order {
            QueryOrder::Insertion => Box::new(matching),
            QueryOrder::NewestFirst => {
                let mut newest: Vec<&StudyRecord> = matching.rev().collect();
                newest.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                Box::new(newest.into_iter())
            }
        }
    }

    /// Saved states for a path; empty when nothing was saved.
    pub fn load_state_for_path(&self, bank_id: &BankId, path: &[String]) -> PathStates {
        self.saved_states
            .get(&path_key(bank_id, path))
            .cloned()
            .unwrap_or_default()
    }

    /// Overwrite the saved states for a path. Last write wins.
    pub fn save_state_for_path(&mut self, bank_id: &BankId, path: &[String], states: PathStates) {
        self.saved_states.insert(path_key(bank_id, path), states);
    }

    /// Advance one saved cell through unset → correct → wrong → unset.
    pub fn toggle_question(&mut self, bank_id: &BankId, path: &[String], number: u32) -> QuestionState {
        self.update_mark(bank_id, path, number, |mark| {
            mark.toggle_state();
        })
        .state
    }

    /// Flip the bookmark of one saved cell, leaving its state alone.
    pub fn toggle_bookmark(&mut self, bank_id: &BankId, path: &[String], number: u32) -> bool {
        self.update_mark(bank_id, path, number, |mark| {
            mark.toggle_bookmark();
        })
        .bookmarked
    }

    fn update_mark(
        &mut self,
        bank_id: &BankId,
        path: &[String],
        number: u32,
        apply: impl FnOnce(&mut QuestionMark),
    ) -> QuestionMark {
        let states = self.saved_states.entry(path_key(bank_id, path)).or_default();
        let mark = states.entry(number).or_default();
        apply(mark);
        let result = *mark;
        if result.is_blank() {
            states.remove(&number);
        }
        result
    }
}
