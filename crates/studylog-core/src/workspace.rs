//! Load/flush lifecycle binding the stores to a key/value backend.

use chrono::Utc;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::{HierarchyError, Result};
use crate::hierarchy::{BankId, HierarchyStore, QuestionBank};
use crate::records::{AppendReport, PathStates, RecordStore, StudyRecord};
use crate::stats::ProgressAggregator;
use crate::storage::{AnalyticsConfig, Config, KeyValueStore};

/// Map of bank id to bank.
pub const KEY_BOOKS: &str = "books";
/// Display order of banks.
pub const KEY_BOOK_ORDER: &str = "bookOrder";
pub const KEY_STUDY_HISTORY: &str = "studyHistory";
/// Map of `bankId/path` to saved question marks.
pub const KEY_SAVED_STATES: &str = "savedQuestionStates";

/// Hierarchy and history loaded together from one store.
#[derive(Debug, Clone, Default)]
pub struct StudyWorkspace {
    pub hierarchy: HierarchyStore,
    pub records: RecordStore,
}

impl StudyWorkspace {
    /// Read every blob; missing keys yield empty stores.
    ///
    /// # Errors
    /// Returns `CoreError::Json` for a corrupt blob and propagates backend errors.
    pub fn load(store: &impl KeyValueStore, config: &Config) -> Result<Self> {
        let banks: IndexMap<BankId, QuestionBank> = read_blob(store, KEY_BOOKS)?.unwrap_or_default();
        let order: Vec<BankId> = read_blob(store, KEY_BOOK_ORDER)?.unwrap_or_default();
        let history: Vec<StudyRecord> = read_blob(store, KEY_STUDY_HISTORY)?.unwrap_or_default();
        let saved: IndexMap<String, PathStates> =
            read_blob(store, KEY_SAVED_STATES)?.unwrap_or_default();

        tracing::debug!(
            banks = banks.len(),
            records = history.len(),
            saved_paths = saved.len(),
            "loaded workspace"
        );

        Ok(Self {
            hierarchy: HierarchyStore::from_parts(banks, order),
            records: RecordStore::from_parts(history, saved, config.history.max_records),
        })
    }

    /// Write every blob back to the store in one batch.
    ///
    /// # Errors
    /// Propagates serialization and backend errors; a failed batch leaves
    /// the previously flushed blobs in place.
    pub fn flush(&self, store: &mut impl KeyValueStore) -> Result<()> {
        let entries = [
            (KEY_BOOKS, serde_json::to_string(self.hierarchy.banks_map())?),
            (KEY_BOOK_ORDER, serde_json::to_string(self.hierarchy.order())?),
            (KEY_STUDY_HISTORY, serde_json::to_string(self.records.records())?),
            (KEY_SAVED_STATES, serde_json::to_string(self.records.saved_states())?),
        ];
        store.set_many(&entries)?;
        tracing::debug!(
            banks = self.hierarchy.banks_map().len(),
            records = self.records.len(),
            "flushed workspace"
        );
        Ok(())
    }

    /// Save a study session: append it to the history and remember the
    /// marks as the path's saved state.
    ///
    /// # Errors
    /// Returns `BankNotFound` for an unknown or deleted bank.
    pub fn record_session(
        &mut self,
        bank_id: &BankId,
        path: Vec<String>,
        outcomes: PathStates,
    ) -> Result<AppendReport> {
        if self.hierarchy.live_bank(bank_id).is_none() {
            return Err(HierarchyError::BankNotFound(bank_id.to_string()).into());
        }
        self.records.save_state_for_path(bank_id, &path, outcomes.clone());
        let record = StudyRecord::new(bank_id.clone(), path, outcomes, Utc::now());
        Ok(self.records.append(record, &self.hierarchy))
    }

    pub fn aggregator<'a>(&'a self, config: &'a AnalyticsConfig) -> ProgressAggregator<'a> {
        ProgressAggregator::new(&self.hierarchy, &self.records, config)
    }
}

fn read_blob<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::hierarchy::{NodeKind, NumberingPolicy, QuestionRange};
    use crate::records::{QuestionMark, QuestionState};
    use crate::storage::MemoryStore;

    fn marks(correct: &[u32], wrong: &[u32]) -> PathStates {
        let mut states = PathStates::new();
        for n in correct {
            states.insert(*n, QuestionMark::new(QuestionState::Correct));
        }
        for n in wrong {
            states.insert(*n, QuestionMark::new(QuestionState::Wrong));
        }
        states
    }

    fn seeded() -> (StudyWorkspace, BankId) {
        let mut ws = StudyWorkspace::default();
        let bank = ws.hierarchy.create_bank("過去問", NumberingPolicy::Reset).unwrap();
        ws.hierarchy
            .add_node(&bank, &[], NodeKind::Subject, "民法", Some(QuestionRange::new(1, 10).unwrap()))
            .unwrap();
        (ws, bank)
    }

    #[test]
    fn test_load_empty_store() {
        let store = MemoryStore::new();
        let ws = StudyWorkspace::load(&store, &Config::default()).unwrap();
        assert_eq!(ws.hierarchy.banks().count(), 0);
        assert!(ws.records.is_empty());
    }

    #[test]
    fn test_flush_then_load_reproduces_aggregates() {
        let (mut ws, bank) = seeded();
        ws.record_session(&bank, vec!["民法".into()], marks(&[1, 2, 3], &[4]))
            .unwrap();

        let mut store = MemoryStore::new();
        ws.flush(&mut store).unwrap();
        assert_eq!(store.len(), 4);

        let config = Config::default();
        let loaded = StudyWorkspace::load(&store, &config).unwrap();
        let before = ws.aggregator(&config.analytics).overall_progress();
        let after = loaded.aggregator(&config.analytics).overall_progress();
        assert_eq!(before, after);
        assert_eq!(after.unique_answered, 4);
        assert_eq!(
            loaded
                .records
                .load_state_for_path(&bank, &["民法".to_string()])
                .len(),
            4
        );
        assert_eq!(loaded.hierarchy.order(), ws.hierarchy.order());
    }

    #[test]
    fn test_load_applies_history_cap() {
        let (mut ws, bank) = seeded();
        for _ in 0..5 {
            ws.record_session(&bank, vec!["民法".into()], marks(&[1], &[]))
                .unwrap();
        }
        let mut store = MemoryStore::new();
        ws.flush(&mut store).unwrap();

        let mut config = Config::default();
        config.history.max_records = 2;
        let loaded = StudyWorkspace::load(&store, &config).unwrap();
        assert_eq!(loaded.records.len(), 2);
    }

    #[test]
    fn test_record_session_rejects_deleted_bank() {
        let (mut ws, bank) = seeded();
        ws.hierarchy.delete_bank(&bank).unwrap();
        let err = ws
            .record_session(&bank, vec!["民法".into()], marks(&[1], &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Hierarchy(HierarchyError::BankNotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_blob_is_json_error() {
        let mut store = MemoryStore::new();
        store.set(KEY_STUDY_HISTORY, "{not json").unwrap();
        let err = StudyWorkspace::load(&store, &Config::default()).unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }
}
