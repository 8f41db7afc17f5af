//! Question bank and hierarchy commands for CLI.

use std::collections::BTreeSet;

use clap::Subcommand;
use serde::Serialize;
use studylog_core::hierarchy::{HierarchyNode, NodeKind, NumberingPolicy, OutlineRow, QuestionRange};
use studylog_core::path::parse_path;
use studylog_core::BankId;

use super::{print_json, Session};

#[derive(Subcommand)]
pub enum BankAction {
    /// Create a new question bank
    Create {
        /// Bank name
        name: String,
        /// Question numbering: reset or continuous (default: reset)
        #[arg(long, default_value = "reset")]
        numbering: String,
    },
    /// List question banks
    List {
        /// Include deleted banks
        #[arg(long)]
        all: bool,
    },
    /// Rename a bank
    Rename {
        /// Bank ID
        id: String,
        /// New name
        name: String,
    },
    /// Delete a bank (history is kept)
    Delete {
        /// Bank ID
        id: String,
    },
    /// Restore a deleted bank
    Restore {
        /// Bank ID
        id: String,
    },
    /// Move a bank to a new position in the list
    Move {
        /// Bank ID
        id: String,
        /// Target position (0-based)
        index: usize,
    },
    /// Add a node under a parent path
    AddNode {
        /// Bank ID
        bank: String,
        /// Node name
        name: String,
        /// Parent path, e.g. "民法/総則" (default: bank root)
        #[arg(long, default_value = "")]
        parent: String,
        /// Node kind: subject, chapter, section or subsection (default: by depth)
        #[arg(long)]
        kind: Option<String>,
        /// First question number
        #[arg(long)]
        start: Option<u32>,
        /// Last question number
        #[arg(long)]
        end: Option<u32>,
        /// Number of questions, numbered from --start or the bank's next number
        #[arg(long, conflicts_with = "end")]
        count: Option<u32>,
    },
    /// Rename a node
    RenameNode {
        /// Bank ID
        bank: String,
        /// Node path, e.g. "民法/総則"
        path: String,
        /// New name
        name: String,
    },
    /// Replace the questions of a node with a range
    SetRange {
        /// Bank ID
        bank: String,
        /// Node path
        path: String,
        /// First question number
        start: u32,
        /// Last question number
        end: u32,
    },
    /// Delete a node and its subtree
    DeleteNode {
        /// Bank ID
        bank: String,
        /// Node path
        path: String,
    },
    /// Show the hierarchy of a bank
    Tree {
        /// Bank ID
        bank: String,
    },
    /// Import outline rows: subject,chapter,section,subsection,start,end
    Import {
        /// Bank ID
        bank: String,
        /// CSV file with one row per line
        file: std::path::PathBuf,
    },
}

#[derive(Serialize)]
struct BankSummary<'a> {
    id: &'a BankId,
    name: &'a str,
    numbering_policy: NumberingPolicy,
    subjects: usize,
    questions: usize,
    deleted: bool,
}

pub fn run(action: BankAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let hierarchy = &mut session.workspace.hierarchy;

    match action {
        BankAction::Create { name, numbering } => {
            let policy: NumberingPolicy = numbering.parse()?;
            let id = hierarchy.create_bank(&name, policy)?;
            println!("Bank created: {id}");
        }
        BankAction::List { all } => {
            let banks: Vec<_> = if all {
                hierarchy.all_banks().collect()
            } else {
                hierarchy.banks().collect()
            };
            let summaries: Vec<_> = banks
                .into_iter()
                .map(|bank| BankSummary {
                    id: &bank.id,
                    name: &bank.name,
                    numbering_policy: bank.numbering_policy,
                    subjects: bank.subjects().count(),
                    questions: bank.count_questions(),
                    deleted: bank.deleted,
                })
                .collect();
            print_json(&summaries)?;
            return Ok(());
        }
        BankAction::Rename { id, name } => {
            hierarchy.rename_bank(&BankId::from(id), &name)?;
            println!("Bank renamed");
        }
        BankAction::Delete { id } => {
            hierarchy.delete_bank(&BankId::from(id))?;
            println!("Bank deleted");
        }
        BankAction::Restore { id } => {
            hierarchy.restore_bank(&BankId::from(id))?;
            println!("Bank restored");
        }
        BankAction::Move { id, index } => {
            hierarchy.move_bank(&BankId::from(id), index)?;
            println!("Bank moved");
        }
        BankAction::AddNode {
            bank,
            name,
            parent,
            kind,
            start,
            end,
            count,
        } => {
            let bank = BankId::from(bank);
            let parent = parse_path(&parent);
            let kind = match kind {
                Some(kind) => kind.parse::<NodeKind>()?,
                None => NodeKind::at_depth(parent.len())
                    .ok_or("subsections cannot have children")?,
            };
            let range = match (start, end, count) {
                (Some(start), Some(end), _) => Some(QuestionRange::new(start, end)?),
                (start, None, Some(count)) => {
                    let start = match start {
                        Some(start) => start,
                        None => hierarchy.next_question_start(&bank, &parent)?,
                    };
                    Some(QuestionRange::with_count(start, count)?)
                }
                (None, None, None) => None,
                _ => return Err("--start needs --end or --count".into()),
            };
            hierarchy.add_node(&bank, &parent, kind, &name, range)?;
            println!("{} added: {name}", kind.label());
        }
        BankAction::RenameNode { bank, path, name } => {
            hierarchy.rename_node(&BankId::from(bank), &parse_path(&path), &name)?;
            println!("Node renamed");
        }
        BankAction::SetRange {
            bank,
            path,
            start,
            end,
        } => {
            hierarchy.set_question_range(&BankId::from(bank), &parse_path(&path), start, end)?;
            println!("Questions set: {start}-{end}");
        }
        BankAction::DeleteNode { bank, path } => {
            hierarchy.delete_node(&BankId::from(bank), &parse_path(&path))?;
            println!("Node deleted");
        }
        BankAction::Tree { bank } => {
            let id = BankId::from(bank);
            let bank = hierarchy
                .bank(&id)
                .ok_or_else(|| format!("bank not found: {id}"))?;
            print!("{}", render_tree(&bank.name, bank.subjects(), bank.count_questions()));
            return Ok(());
        }
        BankAction::Import { bank, file } => {
            let content = std::fs::read_to_string(&file)?;
            let rows = parse_outline(&content)?;
            let summary = hierarchy.import_rows(&BankId::from(bank), &rows)?;
            print_json(&summary)?;
        }
    }

    session.flush()?;
    Ok(())
}

/// Read CSV text into outline rows. Blank lines, `#` comments and a
/// leading header row are skipped.
fn parse_outline(content: &str) -> Result<Vec<OutlineRow>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let line = record.position().map_or(index as u64 + 1, |p| p.line());
        if record.iter().all(str::is_empty) {
            continue;
        }
        if index == 0 && record.get(0).is_some_and(|f| f.eq_ignore_ascii_case("subject")) {
            continue;
        }
        let fields: Vec<&str> = record.iter().collect();
        let row = OutlineRow::from_fields(&fields).map_err(|e| format!("line {line}: {e}"))?;
        rows.push(row);
    }
    Ok(rows)
}

fn render_tree<'a>(
    name: &str,
    subjects: impl Iterator<Item = &'a HierarchyNode>,
    total: usize,
) -> String {
    let mut output = format!("{name} ({total} questions)\n");
    for subject in subjects {
        render_node(subject, 1, &mut output);
    }
    output
}

fn render_node(node: &HierarchyNode, depth: usize, output: &mut String) {
    output.push_str(&"  ".repeat(depth));
    output.push(node.kind().marker());
    output.push(' ');
    output.push_str(node.name());
    if node.has_questions() {
        output.push_str(&format!(" [{}]", describe_questions(node.questions())));
    }
    output.push('\n');
    for child in node.children().values() {
        render_node(child, depth + 1, output);
    }
}

/// `1-20` for a contiguous run, otherwise `N questions`.
fn describe_questions(questions: &BTreeSet<u32>) -> String {
    match (questions.first(), questions.last()) {
        (Some(first), Some(last)) if (last - first) as usize + 1 == questions.len() => {
            format!("{first}-{last}")
        }
        _ => format!("{} questions", questions.len()),
    }
}
