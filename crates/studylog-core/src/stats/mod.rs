//! Statistics module for studylog
//!
//! This module derives analytics from the question-bank hierarchy and the
//! study history: correctness rates, coverage progress, subject rollups and
//! weakness ranking, daily activity, radar-chart data, an activity heatmap,
//! study streaks and badges.

mod aggregator;
mod badges;
mod heatmap;
mod radar;
mod streak;

pub use aggregator::{DailyStats, OverallProgress, ProgressAggregator, SubjectStats};
pub use badges::{Badge, BadgeStatus};
pub use heatmap::{ActivityHeatmap, HeatmapCell};
pub use radar::{RadarAxis, RadarChart, RadarSeries};
pub use streak::StudyStreak;

pub use crate::path::path_matches;

use serde::{Deserialize, Serialize};

use crate::records::StudyRecord;

/// Bucket for records whose path names no subject.
pub const UNKNOWN_SUBJECT: &str = "(unknown)";

/// `round(numerator / denominator × 100)`, or 0 when nothing was counted.
pub fn percent(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (numerator as f64 / denominator as f64 * 100.0).round() as u32
}

/// Correct and wrong answers; unset cells are never counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTally {
    pub correct: u64,
    pub wrong: u64,
}

impl AnswerTally {
    pub fn total(&self) -> u64 {
        self.correct + self.wrong
    }

    pub fn rate(&self) -> u32 {
        percent(self.correct, self.total())
    }

    pub fn add_record(&mut self, record: &StudyRecord) {
        self.correct += record.correct_count();
        self.wrong += record.wrong_count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_and_handles_zero() {
        assert_eq!(percent(6, 8), 75);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn test_tally_rate() {
        let tally = AnswerTally { correct: 1, wrong: 3 };
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.rate(), 25);
        assert_eq!(AnswerTally::default().rate(), 0);
    }
}
