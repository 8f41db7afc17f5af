//! Question banks ("books") and their identifiers.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::node::{resolve, HierarchyNode};
use crate::error::HierarchyError;

/// Opaque identifier of a question bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankId(String);

impl BankId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(format!("book_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BankId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BankId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How question numbers are assigned to newly added nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingPolicy {
    /// Every node starts again at 1.
    #[default]
    Reset,
    /// Numbers continue across the whole bank.
    Continuous,
}

impl FromStr for NumberingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reset" => Ok(NumberingPolicy::Reset),
            "continuous" => Ok(NumberingPolicy::Continuous),
            other => Err(format!("unknown numbering policy: {other}")),
        }
    }
}

/// Inclusive range of question numbers. Only built through [`QuestionRange::new`]
/// and [`QuestionRange::with_count`], so `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionRange {
    start: u32,
    end: u32,
}

impl QuestionRange {
    /// # Errors
    /// Returns `HierarchyError::InvalidRange` if `start > end`.
    pub fn new(start: u32, end: u32) -> Result<Self, HierarchyError> {
        if start > end {
            return Err(HierarchyError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range of `count` questions beginning at `start`.
    ///
    /// # Errors
    /// Returns `HierarchyError::InvalidRange` if `count` is zero.
    pub fn with_count(start: u32, count: u32) -> Result<Self, HierarchyError> {
        if count == 0 {
            return Err(HierarchyError::InvalidRange {
                start,
                end: start.saturating_sub(1),
            });
        }
        Self::new(start, start.saturating_add(count - 1))
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn numbers(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// A named question collection with its subject tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBank {
    pub id: BankId,
    pub name: String,
    #[serde(default)]
    pub numbering_policy: NumberingPolicy,
    #[serde(default)]
    pub(crate) root: IndexMap<String, HierarchyNode>,
    /// Tombstone; deleted banks stay around so history keeps its meaning.
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl QuestionBank {
    pub fn new(
        id: BankId,
        name: impl Into<String>,
        numbering_policy: NumberingPolicy,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            numbering_policy,
            root: IndexMap::new(),
            deleted: false,
            created_at,
        }
    }

    /// Subject nodes in insertion order.
    pub fn subjects(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.root.values()
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn node(&self, path: &[String]) -> Option<&HierarchyNode> {
        resolve(&self.root, path)
    }

    pub fn count_questions(&self) -> usize {
        self.root.values().map(HierarchyNode::question_count).sum()
    }

    /// Question numbers implied by `path`; the whole bank for an empty path.
    pub fn questions_under(&self, path: &[String]) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        if path.is_empty() {
            for subject in self.root.values() {
                subject.collect_questions(&mut out);
            }
        } else if let Some(node) = self.node(path) {
            node.collect_questions(&mut out);
        }
        out
    }

    pub fn max_question(&self) -> Option<u32> {
        self.root.values().filter_map(HierarchyNode::max_question).max()
    }
}
