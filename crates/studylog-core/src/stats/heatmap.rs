//! Activity heatmap module.
//!
//! Lays the daily answer counts out on a week-by-weekday grid ending at
//! today, so that study habits over the last few months are visible at a
//! glance.

use chrono::{Datelike, Days, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::aggregator::{DailyStats, ProgressAggregator};
use crate::storage::MAX_HEATMAP_WEEKS;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Heatmap cell data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    /// 0-6, Sunday=0
    pub day_of_week: u8,
    pub answered: u64,
    pub correct: u64,
    pub heat_intensity: f64,
}

impl HeatmapCell {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            day_of_week: date.weekday().num_days_from_sunday() as u8,
            answered: 0,
            correct: 0,
            heat_intensity: 0.0,
        }
    }

    /// Heat intensity from the answer count (0.0-1.0).
    pub fn calculate_heat(&mut self, max_answered: u64) {
        if max_answered == 0 {
            self.heat_intensity = 0.0;
        } else {
            // Square root keeps light days visible next to a cram day
            let normalized = self.answered as f64 / max_answered as f64;
            self.heat_intensity = normalized.sqrt().min(1.0);
        }
    }

    /// Get the character for ASCII heatmap visualization.
    pub fn heat_char(&self) -> char {
        if self.answered == 0 {
            ' '
        } else if self.answered <= 5 {
            '░'
        } else if self.answered <= 15 {
            '▒'
        } else if self.answered <= 30 {
            '▓'
        } else {
            '█'
        }
    }

    pub fn day_name(&self) -> &'static str {
        DAY_NAMES
            .get(self.day_of_week as usize)
            .copied()
            .unwrap_or("?")
    }
}

/// Complete activity heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityHeatmap {
    /// One cell per day from the first grid Sunday through `end`.
    pub cells: Vec<HeatmapCell>,
    pub weeks: u32,
    pub end: NaiveDate,
    pub total_answered: u64,
}

impl ActivityHeatmap {
    /// Build a grid of `weeks` columns whose last column contains `today`.
    ///
    /// Days outside the grid are ignored. Days after `today` are not laid out.
    pub fn build(daily: &[DailyStats], today: NaiveDate, weeks: u32) -> Self {
        let weeks = weeks.clamp(1, MAX_HEATMAP_WEEKS);
        let start = grid_start(today, weeks);
        let days = (today - start).num_days() + 1;

        let mut cells: Vec<HeatmapCell> = (0..days)
            .map(|offset| HeatmapCell::new(start + Duration::days(offset)))
            .collect();

        let mut total_answered = 0;
        for day in daily {
            if day.date < start || day.date > today {
                continue;
            }
            let idx = (day.date - start).num_days() as usize;
            if let Some(cell) = cells.get_mut(idx) {
                cell.answered += day.total;
                cell.correct += day.correct;
                total_answered += day.total;
            }
        }

        let max_answered = cells.iter().map(|c| c.answered).max().unwrap_or(0);
        for cell in &mut cells {
            cell.calculate_heat(max_answered);
        }

        Self {
            cells,
            weeks,
            end: today,
            total_answered,
        }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.cells.first().map(|c| c.date)
    }

    pub fn get_cell(&self, date: NaiveDate) -> Option<&HeatmapCell> {
        let start = self.start()?;
        if date < start {
            return None;
        }
        self.cells.get((date - start).num_days() as usize)
    }

    /// Days sorted by answer count (descending), ties broken by the later date.
    pub fn busiest_days(&self, limit: usize) -> Vec<(NaiveDate, u64)> {
        let mut days: Vec<_> = self
            .cells
            .iter()
            .filter(|c| c.answered > 0)
            .map(|c| (c.date, c.answered))
            .collect();
        days.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
        days.truncate(limit);
        days
    }

    /// Render heatmap as ASCII visualization.
    pub fn render_ascii(&self) -> String {
        let mut output = String::new();

        output.push_str("\nStudy Activity\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');

        if self.total_answered == 0 {
            output.push_str("No study activity in this period.\n");
            return output;
        }

        output.push_str(&format!("Answered in the last {} weeks: {}\n\n", self.weeks, self.total_answered));

        for (weekday, name) in DAY_NAMES.iter().enumerate() {
            output.push_str(&format!("{:<4}", name));
            for week in 0..self.weeks as usize {
                match self.cells.get(week * 7 + weekday) {
                    Some(cell) => output.push(cell.heat_char()),
                    None => output.push(' '),
                }
                output.push(' ');
            }
            output.push('\n');
        }

        output.push('\n');
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str("Legend: ░ (1-5) ▒ (6-15) ▓ (16-30) █ (31+)\n");

        let busiest = self.busiest_days(3);
        if !busiest.is_empty() {
            output.push_str("\nBusiest days:\n");
            for (date, answered) in busiest {
                output.push_str(&format!("  {date} - {answered} answered\n"));
            }
        }

        output
    }
}

/// Sunday of the first week in a grid of `weeks` columns ending at `today`.
/// Saturates at `NaiveDate::MIN`.
fn grid_start(today: NaiveDate, weeks: u32) -> NaiveDate {
    let back = u64::from(today.weekday().num_days_from_sunday())
        + u64::from(weeks.saturating_sub(1)) * 7;
    today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN)
}

impl<'a> ProgressAggregator<'a> {
    /// Heatmap over the configured number of weeks, ending at `today` in `tz`.
    pub fn activity_heatmap<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz) -> ActivityHeatmap {
        ActivityHeatmap::build(&self.daily_stats(tz), today, self.config.heatmap_weeks)
    }
}
