use chrono::Local;
use clap::Subcommand;
use serde::Serialize;
use studylog_core::path::parse_path;
use studylog_core::BankId;

use super::{print_json, Session};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Correctness rate of a bank path
    Rate {
        /// Bank ID
        bank: String,
        /// Path prefix, e.g. "民法/総則" (default: whole bank)
        #[arg(default_value = "")]
        path: String,
    },
    /// Coverage progress and accuracy across all banks
    Overall,
    /// Per-subject correct/wrong totals
    Subjects {
        /// Limit to one bank
        #[arg(long)]
        bank: Option<String>,
    },
    /// Weakest subjects with enough answers
    Weak {
        /// Limit to one bank
        #[arg(long)]
        bank: Option<String>,
    },
    /// Per-day totals
    Daily {
        /// Only the configured trailing window
        #[arg(long)]
        recent: bool,
    },
    /// Activity heatmap over recent weeks
    Heatmap {
        /// Render as ASCII instead of JSON
        #[arg(long)]
        ascii: bool,
    },
    /// Current and longest study streak
    Streak,
    /// Radar chart data per subject
    Radar {
        /// Limit to one bank
        #[arg(long)]
        bank: Option<String>,
        /// Compare banks (comma-separated IDs)
        #[arg(long, conflicts_with = "bank")]
        compare: Option<String>,
    },
    /// Achievement badges
    Badges,
}

#[derive(Serialize)]
struct PathRate {
    bank_id: BankId,
    path: Vec<String>,
    correct: u64,
    wrong: u64,
    rate: u32,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;
    let agg = session.workspace.aggregator(&session.config.analytics);
    let today = Local::now().date_naive();

    match action {
        StatsAction::Rate { bank, path } => {
            let bank_id = BankId::from(bank);
            let path = parse_path(&path);
            let tally = agg.tally_for_path(&bank_id, &path);
            print_json(&PathRate {
                bank_id,
                path,
                correct: tally.correct,
                wrong: tally.wrong,
                rate: tally.rate(),
            })?;
        }
        StatsAction::Overall => print_json(&agg.overall_progress())?,
        StatsAction::Subjects { bank } => {
            let stats = match bank {
                Some(bank) => agg.book_subject_stats(&BankId::from(bank)),
                None => agg.subject_stats(),
            };
            print_json(&stats)?;
        }
        StatsAction::Weak { bank } => {
            let stats = match bank {
                Some(bank) => agg.book_subject_stats(&BankId::from(bank)),
                None => agg.subject_stats(),
            };
            print_json(&agg.weakest_subjects(&stats))?;
        }
        StatsAction::Daily { recent } => {
            let days = if recent {
                agg.recent_activity(today, &Local)
            } else {
                agg.daily_stats(&Local)
            };
            print_json(&days)?;
        }
        StatsAction::Heatmap { ascii } => {
            let heatmap = agg.activity_heatmap(today, &Local);
            if ascii {
                print!("{}", heatmap.render_ascii());
            } else {
                print_json(&heatmap)?;
            }
        }
        StatsAction::Streak => print_json(&agg.streak(today, &Local))?,
        StatsAction::Radar { bank, compare } => match (bank, compare) {
            (_, Some(ids)) => {
                let ids: Vec<BankId> = ids
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(BankId::from)
                    .collect();
                print_json(&agg.compare_series(&ids))?;
            }
            (Some(bank), None) => print_json(&agg.subject_rates(Some(&BankId::from(bank))))?,
            (None, None) => print_json(&agg.subject_rates(None))?,
        },
        StatsAction::Badges => print_json(&agg.badges(today, &Local))?,
    }
    Ok(())
}
