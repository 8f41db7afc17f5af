//! Radar-chart data: one rate per subject axis.
//!
//! Only the data is produced here; the polar layout belongs to whatever
//! renders it.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::aggregator::{ProgressAggregator, SubjectStats};
use crate::hierarchy::BankId;

/// One axis of a radar chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarAxis {
    pub category: String,
    pub rate: u32,
    pub total: u64,
}

/// Rates of one bank aligned to the chart categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarSeries {
    pub bank_id: BankId,
    pub name: String,
    pub rates: Vec<u32>,
}

/// Compare-mode radar: shared categories plus one series per bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarChart {
    pub categories: Vec<String>,
    pub series: Vec<RadarSeries>,
}

impl<'a> ProgressAggregator<'a> {
    /// Axes for one bank, or for the whole history when `bank_id` is `None`.
    ///
    /// Categories are the bank's subjects followed by any subject only seen in
    /// its history; the configured fallback list is used when both are empty.
    pub fn subject_rates(&self, bank_id: Option<&BankId>) -> Vec<RadarAxis> {
        let (categories, stats) = match bank_id {
            Some(id) => {
                let stats = self.book_subject_stats(id);
                let mut categories: IndexSet<String> = self
                    .hierarchy
                    .live_bank(id)
                    .map(|bank| bank.subject_names().map(str::to_string).collect())
                    .unwrap_or_default();
                categories.extend(stats.iter().map(|s| s.subject.clone()));
                (self.or_fallback(categories), stats)
            }
            None => (self.compare_categories(), self.subject_stats()),
        };

        categories
            .into_iter()
            .map(|category| {
                let found = stats.iter().find(|s| s.subject == category);
                RadarAxis {
                    rate: found.map_or(0, |s| s.rate),
                    total: found.map_or(0, |s| s.total),
                    category,
                }
            })
            .collect()
    }

    /// Union of every live bank's subjects and every record's subject, so that
    /// subjects only known from history of deleted banks still get an axis.
    pub fn compare_categories(&self) -> Vec<String> {
        let mut categories: IndexSet<String> = IndexSet::new();
        for bank in self.hierarchy.banks() {
            categories.extend(bank.subject_names().map(str::to_string));
        }
        for record in self.history() {
            if let Some(subject) = record.subject() {
                categories.insert(subject.to_string());
            }
        }
        self.or_fallback(categories)
    }

    /// One series per requested bank over [`compare_categories`](Self::compare_categories).
    pub fn compare_series(&self, bank_ids: &[BankId]) -> RadarChart {
        let categories = self.compare_categories();
        let series = bank_ids
            .iter()
            .map(|id| {
                let stats = self.book_subject_stats(id);
                RadarSeries {
                    bank_id: id.clone(),
                    name: self
                        .hierarchy
                        .bank(id)
                        .map_or_else(|| id.to_string(), |bank| bank.name.clone()),
                    rates: categories.iter().map(|c| rate_of(&stats, c)).collect(),
                }
            })
            .collect();
        RadarChart { categories, series }
    }

    fn or_fallback(&self, categories: IndexSet<String>) -> Vec<String> {
        if categories.is_empty() {
            self.config.fallback_categories.clone()
        } else {
            categories.into_iter().collect()
        }
    }
}

fn rate_of(stats: &[SubjectStats], category: &str) -> u32 {
    stats
        .iter()
        .find(|s| s.subject == category)
        .map_or(0, |s| s.rate)
}
