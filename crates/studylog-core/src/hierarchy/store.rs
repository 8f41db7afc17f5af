//! Owner of every question bank and the bank display order.

use std::collections::BTreeSet;

use chrono::Utc;
use indexmap::IndexMap;

use super::bank::{BankId, NumberingPolicy, QuestionBank, QuestionRange};
use super::node::{resolve_mut, HierarchyNode, NodeKind};
use crate::error::HierarchyError;

/// One row of a bank outline: up to four level names plus an optional range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub levels: Vec<String>,
    pub range: Option<QuestionRange>,
}

impl OutlineRow {
    /// Build a row from already-split fields
    /// `subject,chapter,section,subsection,startNum,endNum`.
    ///
    /// Empty level fields end the path. Start/end only count when both parse
    /// as numbers.
    ///
    /// # Errors
    /// `EmptyName` if the subject is blank, `InvalidName` if a level contains
    /// `/`, `InvalidRange` if start > end.
    pub fn from_fields(fields: &[&str]) -> Result<Self, HierarchyError> {
        let field = |i: usize| fields.get(i).map(|f| f.trim()).unwrap_or("");

        let levels = (0..4)
            .map(field)
            .take_while(|f| !f.is_empty())
            .map(node_name)
            .collect::<Result<Vec<_>, _>>()?;
        if levels.is_empty() {
            return Err(HierarchyError::EmptyName);
        }

        let range = match (field(4).parse::<u32>(), field(5).parse::<u32>()) {
            (Ok(start), Ok(end)) => Some(QuestionRange::new(start, end)?),
            _ => None,
        };

        Ok(Self { levels, range })
    }
}

/// Result of applying outline rows to a bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub nodes_created: usize,
    pub questions_attached: usize,
}

/// All question banks, keyed by id, plus their display order.
#[derive(Debug, Clone, Default)]
pub struct HierarchyStore {
    banks: IndexMap<BankId, QuestionBank>,
    order: Vec<BankId>,
}

impl HierarchyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts. Order entries without a bank are
    /// dropped and banks missing from the order are appended.
    pub fn from_parts(banks: IndexMap<BankId, QuestionBank>, order: Vec<BankId>) -> Self {
        let mut seen = BTreeSet::new();
        let mut normalized: Vec<BankId> = order
            .into_iter()
            .filter(|id| banks.contains_key(id) && seen.insert(id.clone()))
            .collect();
        for id in banks.keys() {
            if !seen.contains(id) {
                normalized.push(id.clone());
            }
        }
        Self {
            banks,
            order: normalized,
        }
    }

    pub fn banks_map(&self) -> &IndexMap<BankId, QuestionBank> {
        &self.banks
    }

    pub fn order(&self) -> &[BankId] {
        &self.order
    }

    /// Non-deleted banks in display order.
    pub fn banks(&self) -> impl Iterator<Item = &QuestionBank> {
        self.all_banks().filter(|bank| !bank.deleted)
    }

    /// Every bank in display order, tombstoned ones included.
    pub fn all_banks(&self) -> impl Iterator<Item = &QuestionBank> {
        self.order.iter().filter_map(|id| self.banks.get(id))
    }

    pub fn bank(&self, id: &BankId) -> Option<&QuestionBank> {
        self.banks.get(id)
    }

    /// A bank that exists and is not tombstoned.
    pub fn live_bank(&self, id: &BankId) -> Option<&QuestionBank> {
        self.banks.get(id).filter(|bank| !bank.deleted)
    }

    fn bank_mut(&mut self, id: &BankId) -> Result<&mut QuestionBank, HierarchyError> {
        self.banks
            .get_mut(id)
            .ok_or_else(|| HierarchyError::BankNotFound(id.to_string()))
    }

    /// Create an empty bank and append it to the display order.
    ///
    /// # Errors
    /// Returns `EmptyName` if the name is blank.
    pub fn create_bank(
        &mut self,
        name: &str,
        numbering_policy: NumberingPolicy,
    ) -> Result<BankId, HierarchyError> {
        let name = normalized_name(name)?;
        let id = BankId::generate();
        let bank = QuestionBank::new(id.clone(), name, numbering_policy, Utc::now());
        self.banks.insert(id.clone(), bank);
        self.order.push(id.clone());
        tracing::debug!(bank = %id, "created question bank");
        Ok(id)
    }

    pub fn rename_bank(&mut self, id: &BankId, name: &str) -> Result<(), HierarchyError> {
        let name = normalized_name(name)?;
        self.bank_mut(id)?.name = name;
        Ok(())
    }

    /// Mark a bank as deleted. Records referencing it are left untouched.
    pub fn delete_bank(&mut self, id: &BankId) -> Result<(), HierarchyError> {
        self.bank_mut(id)?.deleted = true;
        tracing::debug!(bank = %id, "tombstoned question bank");
        Ok(())
    }

    pub fn restore_bank(&mut self, id: &BankId) -> Result<(), HierarchyError> {
        self.bank_mut(id)?.deleted = false;
        Ok(())
    }

    /// Move a bank to `index` in the display order (clamped to the end).
    pub fn move_bank(&mut self, id: &BankId, index: usize) -> Result<(), HierarchyError> {
        let from = self
            .order
            .iter()
            .position(|b| b == id)
            .ok_or_else(|| HierarchyError::BankNotFound(id.to_string()))?;
        let bank = self.order.remove(from);
        let to = index.min(self.order.len());
        self.order.insert(to, bank);
        Ok(())
    }

    /// Add a node below `parent_path` (empty path = new subject).
    ///
    /// # Errors
    /// - `BankNotFound` / `PathNotFound` if the bank or parent is missing
    /// - `KindMismatch` if `kind` is not the parent's child kind
    /// - `DuplicateName` if a sibling already has `name`
    pub fn add_node(
        &mut self,
        bank_id: &BankId,
        parent_path: &[String],
        kind: NodeKind,
        name: &str,
        range: Option<QuestionRange>,
    ) -> Result<(), HierarchyError> {
        let name = node_name(name)?;
        let bank = self.bank_mut(bank_id)?;

        let (expected, siblings) = if parent_path.is_empty() {
            (Some(NodeKind::Subject), &mut bank.root)
        } else {
            let parent = resolve_mut(&mut bank.root, parent_path)
                .ok_or_else(|| HierarchyError::PathNotFound(parent_path.to_vec()))?;
            (parent.kind.child_kind(), &mut parent.children)
        };

        if expected != Some(kind) {
            let parent = parent_path
                .last()
                .map(|p| format!("'{p}'"))
                .unwrap_or_else(|| "the bank root".to_string());
            return Err(HierarchyError::KindMismatch {
                parent,
                child: kind.label().to_string(),
            });
        }
        if siblings.contains_key(&name) {
            return Err(HierarchyError::DuplicateName(name));
        }

        let mut node = HierarchyNode::new(kind, name.clone());
        if let Some(range) = range {
            node.questions.extend(range.numbers());
        }
        siblings.insert(name, node);
        Ok(())
    }

    /// Rename the node at `path`, keeping its position among its siblings.
    pub fn rename_node(
        &mut self,
        bank_id: &BankId,
        path: &[String],
        new_name: &str,
    ) -> Result<(), HierarchyError> {
        let new_name = node_name(new_name)?;
        let (old_name, siblings) = self.siblings_of(bank_id, path)?;
        if old_name == new_name {
            return Ok(());
        }
        if siblings.contains_key(&new_name) {
            return Err(HierarchyError::DuplicateName(new_name));
        }

        let renamed = std::mem::take(siblings)
            .into_iter()
            .map(|(key, mut node)| {
                if key == old_name {
                    node.name = new_name.clone();
                    (new_name.clone(), node)
                } else {
                    (key, node)
                }
            })
            .collect();
        *siblings = renamed;
        Ok(())
    }

    /// Replace the question numbers of the node at `path` with `start..=end`.
    pub fn set_question_range(
        &mut self,
        bank_id: &BankId,
        path: &[String],
        start: u32,
        end: u32,
    ) -> Result<(), HierarchyError> {
        let range = QuestionRange::new(start, end)?;
        let bank = self.bank_mut(bank_id)?;
        let node = resolve_mut(&mut bank.root, path)
            .ok_or_else(|| HierarchyError::PathNotFound(path.to_vec()))?;
        node.questions = range.numbers().collect();
        Ok(())
    }

    pub fn delete_node(&mut self, bank_id: &BankId, path: &[String]) -> Result<(), HierarchyError> {
        let (name, siblings) = self.siblings_of(bank_id, path)?;
        siblings.shift_remove(&name);
        Ok(())
    }

    fn siblings_of(
        &mut self,
        bank_id: &BankId,
        path: &[String],
    ) -> Result<(String, &mut IndexMap<String, HierarchyNode>), HierarchyError> {
        let not_found = || HierarchyError::PathNotFound(path.to_vec());
        let (name, parent_path) = path.split_last().ok_or_else(not_found)?;
        let bank = self.bank_mut(bank_id)?;
        let siblings = if parent_path.is_empty() {
            &mut bank.root
        } else {
            &mut resolve_mut(&mut bank.root, parent_path)
                .ok_or_else(not_found)?
                .children
        };
        if !siblings.contains_key(name) {
            return Err(not_found());
        }
        Ok((name.clone(), siblings))
    }

    /// Total question count of a bank; 0 for an unknown bank.
    pub fn count_questions(&self, bank_id: &BankId) -> usize {
        self.banks
            .get(bank_id)
            .map(QuestionBank::count_questions)
            .unwrap_or(0)
    }

    /// Question numbers implied by `path`; empty if the bank or path is gone.
    pub fn questions_under(&self, bank_id: &BankId, path: &[String]) -> BTreeSet<u32> {
        self.banks
            .get(bank_id)
            .map(|bank| bank.questions_under(path))
            .unwrap_or_default()
    }

    /// First question number for a node added under `parent_path`.
    pub fn next_question_start(
        &self,
        bank_id: &BankId,
        parent_path: &[String],
    ) -> Result<u32, HierarchyError> {
        let bank = self
            .banks
            .get(bank_id)
            .ok_or_else(|| HierarchyError::BankNotFound(bank_id.to_string()))?;
        if !parent_path.is_empty() && bank.node(parent_path).is_none() {
            return Err(HierarchyError::PathNotFound(parent_path.to_vec()));
        }
        Ok(match bank.numbering_policy {
            NumberingPolicy::Reset => 1,
            NumberingPolicy::Continuous => bank.max_question().map_or(1, |max| max + 1),
        })
    }

    /// Apply outline rows, creating missing nodes on the way down and merging
    /// each row's range into its deepest node.
    pub fn import_rows(
        &mut self,
        bank_id: &BankId,
        rows: &[OutlineRow],
    ) -> Result<ImportSummary, HierarchyError> {
        let bank = self.bank_mut(bank_id)?;
        let mut summary = ImportSummary::default();

        for row in rows {
            summary.rows += 1;
            let node = ensure_path(&mut bank.root, &row.levels, 0, &mut summary.nodes_created)
                .ok_or_else(|| HierarchyError::PathNotFound(row.levels.clone()))?;
            if let Some(range) = row.range {
                let before = node.questions.len();
                node.questions.extend(range.numbers());
                summary.questions_attached += node.questions.len() - before;
            }
        }

        tracing::debug!(bank = %bank_id, rows = summary.rows, "imported outline rows");
        Ok(summary)
    }
}

/// Walk `levels` from `siblings`, creating missing nodes with the kind of
/// their depth. `None` when the path is empty or deeper than a subsection.
fn ensure_path<'a>(
    siblings: &'a mut IndexMap<String, HierarchyNode>,
    levels: &[String],
    depth: usize,
    created: &mut usize,
) -> Option<&'a mut HierarchyNode> {
    let (name, rest) = levels.split_first()?;
    let kind = NodeKind::at_depth(depth)?;
    let node = siblings.entry(name.clone()).or_insert_with(|| {
        *created += 1;
        HierarchyNode::new(kind, name.clone())
    });
    if rest.is_empty() {
        Some(node)
    } else {
        ensure_path(&mut node.children, rest, depth + 1, created)
    }
}

fn normalized_name(name: &str) -> Result<String, HierarchyError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HierarchyError::EmptyName);
    }
    Ok(name.to_string())
}

/// Node names are path segments, so `/` is reserved.
fn node_name(name: &str) -> Result<String, HierarchyError> {
    let name = normalized_name(name)?;
    if name.contains('/') {
        return Err(HierarchyError::InvalidName(name));
    }
    Ok(name)
}
