//! # Studylog Core Library
//!
//! This library provides the core logic for tracking study progress over
//! hierarchical question banks. All operations are available via the
//! standalone `studylog` CLI binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Hierarchy**: question banks with a subject / chapter / section /
//!   subsection breakdown and numbered questions
//! - **Records**: a capped log of saved study sessions plus per-path saved
//!   question marks
//! - **Stats**: rates, coverage progress and rollups computed on demand
//! - **Storage**: string-keyed JSON blobs in SQLite and TOML configuration
//!
//! ## Key Components
//!
//! - [`HierarchyStore`]: banks and structural edits
//! - [`RecordStore`]: study history and saved question states
//! - [`ProgressAggregator`]: derived statistics
//! - [`StudyWorkspace`]: load/flush against a [`KeyValueStore`]

pub mod error;
pub mod hierarchy;
pub mod path;
pub mod records;
pub mod stats;
pub mod storage;
pub mod workspace;

pub use error::{ConfigError, CoreError, DatabaseError, HierarchyError};
pub use hierarchy::{BankId, HierarchyStore, NodeKind, NumberingPolicy, QuestionBank, QuestionRange};
pub use records::{QuestionMark, QuestionState, RecordFilter, RecordStore, StudyRecord};
pub use stats::ProgressAggregator;
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use workspace::StudyWorkspace;
