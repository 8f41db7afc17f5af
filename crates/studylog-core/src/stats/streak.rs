//! Consecutive study days.

use chrono::{Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::aggregator::{DailyStats, ProgressAggregator};

/// Study streak summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStreak {
    /// Run of consecutive days ending today or yesterday; 0 once broken.
    pub current: u32,
    pub longest: u32,
    /// Days with at least one answered question.
    pub study_days: u32,
    pub last_study_date: Option<NaiveDate>,
}

impl StudyStreak {
    /// Days count only when something was answered. `daily` must be oldest first.
    pub fn from_daily(daily: &[DailyStats], today: NaiveDate) -> Self {
        let dates: Vec<NaiveDate> = daily
            .iter()
            .filter(|d| d.total > 0 && d.date <= today)
            .map(|d| d.date)
            .collect();

        let mut longest = 0;
        let mut run = 0;
        let mut previous: Option<NaiveDate> = None;
        for &date in &dates {
            run = match previous {
                Some(prev) if date - prev == Duration::days(1) => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            previous = Some(date);
        }

        let current = match previous {
            Some(last) if today - last <= Duration::days(1) => run,
            _ => 0,
        };

        Self {
            current,
            longest,
            study_days: dates.len() as u32,
            last_study_date: previous,
        }
    }
}

impl<'a> ProgressAggregator<'a> {
    pub fn streak<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz) -> StudyStreak {
        StudyStreak::from_daily(&self.daily_stats(tz), today)
    }
}
