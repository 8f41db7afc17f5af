//! Question-bank hierarchy: banks, their subject trees and structural edits.

mod bank;
mod node;
mod store;

pub use bank::{BankId, NumberingPolicy, QuestionBank, QuestionRange};
pub use node::{HierarchyNode, NodeKind};
pub use store::{HierarchyStore, ImportSummary, OutlineRow};
