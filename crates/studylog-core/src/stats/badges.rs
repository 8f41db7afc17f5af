//! Achievement badges.
//!
//! Badges are recomputed from the current snapshots on every call; nothing
//! about them is persisted.

use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::aggregator::{OverallProgress, ProgressAggregator};
use super::streak::StudyStreak;

/// Minimum answers before accuracy can earn a badge.
const SHARPSHOOTER_MIN_ANSWERS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    FirstSession,
    HundredAnswers,
    ThousandAnswers,
    WeekStreak,
    MonthStreak,
    HalfwayThere,
    FullCoverage,
    Sharpshooter,
}

impl Badge {
    pub const ALL: [Badge; 8] = [
        Badge::FirstSession,
        Badge::HundredAnswers,
        Badge::ThousandAnswers,
        Badge::WeekStreak,
        Badge::MonthStreak,
        Badge::HalfwayThere,
        Badge::FullCoverage,
        Badge::Sharpshooter,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Badge::FirstSession => "First Session",
            Badge::HundredAnswers => "Hundred Answers",
            Badge::ThousandAnswers => "Thousand Answers",
            Badge::WeekStreak => "Week Streak",
            Badge::MonthStreak => "Month Streak",
            Badge::HalfwayThere => "Halfway There",
            Badge::FullCoverage => "Full Coverage",
            Badge::Sharpshooter => "Sharpshooter",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Badge::FirstSession => "Save a first study session",
            Badge::HundredAnswers => "Answer 100 questions",
            Badge::ThousandAnswers => "Answer 1000 questions",
            Badge::WeekStreak => "Study 7 days in a row",
            Badge::MonthStreak => "Study 30 days in a row",
            Badge::HalfwayThere => "Cover half of all questions",
            Badge::FullCoverage => "Cover every question",
            Badge::Sharpshooter => "Keep 80% accuracy over at least 100 answers",
        }
    }

    fn is_earned(&self, progress: &OverallProgress, streak: &StudyStreak, sessions: usize) -> bool {
        match self {
            Badge::FirstSession => sessions > 0,
            Badge::HundredAnswers => progress.raw_answered >= 100,
            Badge::ThousandAnswers => progress.raw_answered >= 1000,
            Badge::WeekStreak => streak.longest >= 7,
            Badge::MonthStreak => streak.longest >= 30,
            Badge::HalfwayThere => progress.total_questions > 0 && progress.progress_percent >= 50,
            Badge::FullCoverage => {
                progress.total_questions > 0 && progress.unique_answered >= progress.total_questions
            }
            Badge::Sharpshooter => {
                progress.raw_answered >= SHARPSHOOTER_MIN_ANSWERS && progress.accuracy_percent >= 80
            }
        }
    }
}

/// A badge and whether it has been earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeStatus {
    pub badge: Badge,
    pub earned: bool,
    pub title: String,
    pub description: String,
}

impl<'a> ProgressAggregator<'a> {
    /// Every badge, earned or not, in a fixed order.
    pub fn badges<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz) -> Vec<BadgeStatus> {
        let progress = self.overall_progress();
        let streak = self.streak(today, tz);
        let sessions = self.records.len();

        Badge::ALL
            .iter()
            .map(|badge| BadgeStatus {
                badge: *badge,
                earned: badge.is_earned(&progress, &streak, sessions),
                title: badge.title().to_string(),
                description: badge.description().to_string(),
            })
            .collect()
    }
}
