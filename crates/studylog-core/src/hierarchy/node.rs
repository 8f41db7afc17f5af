//! Hierarchy nodes: subject → chapter → section → subsection.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Level of a node inside a question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Subject,
    Chapter,
    Section,
    Subsection,
}

impl NodeKind {
    /// The only kind allowed directly below this one.
    pub fn child_kind(&self) -> Option<NodeKind> {
        match self {
            NodeKind::Subject => Some(NodeKind::Chapter),
            NodeKind::Chapter => Some(NodeKind::Section),
            NodeKind::Section => Some(NodeKind::Subsection),
            NodeKind::Subsection => None,
        }
    }

    /// Kind of a node at the given depth (0 = subject).
    pub fn at_depth(depth: usize) -> Option<NodeKind> {
        match depth {
            0 => Some(NodeKind::Subject),
            1 => Some(NodeKind::Chapter),
            2 => Some(NodeKind::Section),
            3 => Some(NodeKind::Subsection),
            _ => None,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            NodeKind::Subject => 0,
            NodeKind::Chapter => 1,
            NodeKind::Section => 2,
            NodeKind::Subsection => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Subject => "subject",
            NodeKind::Chapter => "chapter",
            NodeKind::Section => "section",
            NodeKind::Subsection => "subsection",
        }
    }

    /// Marker used when rendering a bank as an ASCII tree.
    pub fn marker(&self) -> char {
        match self {
            NodeKind::Subject => '#',
            NodeKind::Chapter => '*',
            NodeKind::Section => '-',
            NodeKind::Subsection => '.',
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "subject" => Ok(NodeKind::Subject),
            "chapter" => Ok(NodeKind::Chapter),
            "section" => Ok(NodeKind::Section),
            "subsection" => Ok(NodeKind::Subsection),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}

/// A node of the question-bank tree.
///
/// A node may carry question numbers, children, both, or neither. When a node
/// carries question numbers they are authoritative for that subtree: counting
/// and question lookup stop there and the children are only a finer
/// breakdown for navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub(crate) kind: NodeKind,
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub(crate) children: IndexMap<String, HierarchyNode>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub(crate) questions: BTreeSet<u32>,
}

impl HierarchyNode {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            children: IndexMap::new(),
            questions: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &IndexMap<String, HierarchyNode> {
        &self.children
    }

    pub fn questions(&self) -> &BTreeSet<u32> {
        &self.questions
    }

    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }

    /// Number of questions in this subtree.
    pub fn question_count(&self) -> usize {
        if self.has_questions() {
            self.questions.len()
        } else {
            self.children.values().map(HierarchyNode::question_count).sum()
        }
    }

    /// Add every question number of this subtree to `out`.
    pub fn collect_questions(&self, out: &mut BTreeSet<u32>) {
        if self.has_questions() {
            out.extend(self.questions.iter().copied());
        } else {
            for child in self.children.values() {
                child.collect_questions(out);
            }
        }
    }

    /// Highest question number anywhere below this node, children included.
    pub fn max_question(&self) -> Option<u32> {
        let own = self.questions.last().copied();
        let deeper = self.children.values().filter_map(HierarchyNode::max_question).max();
        own.max(deeper)
    }
}

/// Resolve a path against a map of sibling nodes.
pub(crate) fn resolve<'a>(
    nodes: &'a IndexMap<String, HierarchyNode>,
    path: &[String],
) -> Option<&'a HierarchyNode> {
    let (first, rest) = path.split_first()?;
    let mut current = nodes.get(first)?;
    for name in rest {
        current = current.children.get(name)?;
    }
    Some(current)
}

pub(crate) fn resolve_mut<'a>(
    nodes: &'a mut IndexMap<String, HierarchyNode>,
    path: &[String],
) -> Option<&'a mut HierarchyNode> {
    let (first, rest) = path.split_first()?;
    let mut current = nodes.get_mut(first)?;
    for name in rest {
        current = current.children.get_mut(name)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: NodeKind, name: &str, range: std::ops::RangeInclusive<u32>) -> HierarchyNode {
        let mut node = HierarchyNode::new(kind, name);
        node.questions.extend(range);
        node
    }

    #[test]
    fn test_child_kind_chain() {
        assert_eq!(NodeKind::Subject.child_kind(), Some(NodeKind::Chapter));
        assert_eq!(NodeKind::Section.child_kind(), Some(NodeKind::Subsection));
        assert_eq!(NodeKind::Subsection.child_kind(), None);
        assert_eq!(NodeKind::at_depth(2), Some(NodeKind::Section));
        assert_eq!(NodeKind::at_depth(4), None);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Chapter".parse::<NodeKind>().unwrap(), NodeKind::Chapter);
        assert!("volume".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_question_count_sums_children() {
        let mut subject = HierarchyNode::new(NodeKind::Subject, "民法");
        subject
            .children
            .insert("総則".into(), leaf(NodeKind::Chapter, "総則", 1..=10));
        subject
            .children
            .insert("物権".into(), leaf(NodeKind::Chapter, "物権", 11..=15));
        assert_eq!(subject.question_count(), 15);
    }

    #[test]
    fn test_own_questions_stop_descent() {
        let mut chapter = leaf(NodeKind::Chapter, "総則", 1..=4);
        chapter
            .children
            .insert("通則".into(), leaf(NodeKind::Section, "通則", 1..=20));
        assert_eq!(chapter.question_count(), 4);

        let mut out = BTreeSet::new();
        chapter.collect_questions(&mut out);
        assert_eq!(out.len(), 4);
        assert_eq!(chapter.max_question(), Some(20));
    }

    #[test]
    fn test_resolve_walks_path() {
        let mut roots = IndexMap::new();
        let mut subject = HierarchyNode::new(NodeKind::Subject, "憲法");
        subject
            .children
            .insert("人権".into(), leaf(NodeKind::Chapter, "人権", 1..=3));
        roots.insert("憲法".to_string(), subject);

        let path = vec!["憲法".to_string(), "人権".to_string()];
        assert_eq!(resolve(&roots, &path).unwrap().question_count(), 3);
        assert!(resolve(&roots, &[]).is_none());
        assert!(resolve(&roots, &["行政法".to_string()]).is_none());
    }
}
