//! Study history queries.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, Utc};
use clap::Args;
use studylog_core::path::parse_path;
use studylog_core::records::{QueryOrder, RecordFilter};
use studylog_core::BankId;

use super::{print_json, Session};

#[derive(Args)]
pub struct HistoryArgs {
    /// Filter by bank ID
    #[arg(long)]
    pub bank: Option<String>,
    /// Filter by path prefix, e.g. "民法"
    #[arg(long)]
    pub path: Option<String>,
    /// First day to include (YYYY-MM-DD, local time)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD, local time)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Show newest records first
    #[arg(long)]
    pub newest: bool,
    /// Maximum number of records to show
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;

    let mut filter = RecordFilter::new();
    if let Some(bank) = args.bank {
        filter = filter.bank(BankId::from(bank));
    }
    if let Some(path) = args.path {
        filter = filter.path_prefix(parse_path(&path));
    }
    if args.from.is_some() || args.to.is_some() {
        let from = match args.from {
            Some(day) => start_of_day(day)?,
            None => DateTime::<Utc>::MIN_UTC,
        };
        let to = match args.to {
            Some(day) => {
                let next = day
                    .checked_add_days(Days::new(1))
                    .ok_or("date out of range")?;
                start_of_day(next)?
            }
            None => DateTime::<Utc>::MAX_UTC,
        };
        filter = filter.between(from, to);
    }

    let order = if args.newest {
        QueryOrder::NewestFirst
    } else {
        QueryOrder::Insertion
    };
    let records: Vec<_> = session
        .workspace
        .records
        .query(&filter, order)
        .take(args.limit.unwrap_or(usize::MAX))
        .collect();
    print_json(&records)
}

/// Local midnight of `day` as a UTC instant.
fn start_of_day(day: NaiveDate) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    let local = day
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| format!("no local midnight on {day}"))?;
    Ok(local.with_timezone(&Utc))
}
