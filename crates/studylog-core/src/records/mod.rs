//! Study history: records of saved sessions and per-path question states.

mod record;
mod store;

pub use record::{QuestionMark, QuestionState, StudyRecord};
pub use store::{
    AppendReport, PathStates, QueryOrder, RecordFilter, RecordStore, DEFAULT_HISTORY_CAP,
};
