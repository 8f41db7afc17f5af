//! Save a study session for a path.

use std::collections::BTreeSet;

use clap::Args;
use studylog_core::path::parse_path;
use studylog_core::records::{PathStates, QuestionMark, QuestionState};
use studylog_core::BankId;

use super::{print_json, Session};

#[derive(Args)]
pub struct MarkArgs {
    /// Bank ID
    pub bank: String,
    /// Path, e.g. "民法/総則"
    pub path: String,
    /// Questions answered correctly, e.g. "1-5,8"
    #[arg(long, default_value = "")]
    pub correct: String,
    /// Questions answered wrong
    #[arg(long, default_value = "")]
    pub wrong: String,
    /// Questions to bookmark
    #[arg(long, default_value = "")]
    pub bookmark: String,
}

pub fn run(args: MarkArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let bank = BankId::from(args.bank);
    let path = parse_path(&args.path);

    let mut outcomes = PathStates::new();
    for number in parse_numbers(&args.correct)? {
        outcomes.insert(number, QuestionMark::new(QuestionState::Correct));
    }
    for number in parse_numbers(&args.wrong)? {
        if outcomes.contains_key(&number) {
            return Err(format!("question {number} marked both correct and wrong").into());
        }
        outcomes.insert(number, QuestionMark::new(QuestionState::Wrong));
    }
    for number in parse_numbers(&args.bookmark)? {
        outcomes.entry(number).or_default().bookmarked = true;
    }
    if outcomes.is_empty() {
        return Err("nothing to record: pass --correct, --wrong or --bookmark".into());
    }

    let report = session.workspace.record_session(&bank, path, outcomes)?;
    session.flush()?;
    print_json(&report)
}

/// Parse `1-5,8,10` into question numbers.
pub fn parse_numbers(raw: &str) -> Result<BTreeSet<u32>, Box<dyn std::error::Error>> {
    let mut numbers = BTreeSet::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start.trim().parse()?;
                let end: u32 = end.trim().parse()?;
                if start > end {
                    return Err(format!("invalid range: {part}").into());
                }
                numbers.extend(start..=end);
            }
            None => {
                numbers.insert(part.parse()?);
            }
        }
    }
    Ok(numbers)
}
