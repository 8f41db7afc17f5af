//! Cycle a saved question state or flip its bookmark.

use clap::Args;
use studylog_core::path::parse_path;
use studylog_core::BankId;

use super::Session;

#[derive(Args)]
pub struct ToggleArgs {
    /// Bank ID
    pub bank: String,
    /// Path, e.g. "民法/総則"
    pub path: String,
    /// Question number
    pub number: u32,
    /// Flip the bookmark instead of the answer state
    #[arg(long)]
    pub bookmark: bool,
}

pub fn run(args: ToggleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let bank = BankId::from(args.bank);
    let path = parse_path(&args.path);
    let records = &mut session.workspace.records;

    if args.bookmark {
        let bookmarked = records.toggle_bookmark(&bank, &path, args.number);
        println!("Question {}: bookmarked={bookmarked}", args.number);
    } else {
        let state = records.toggle_question(&bank, &path, args.number);
        println!("Question {}: {}", args.number, state.as_str());
    }

    session.flush()
}
