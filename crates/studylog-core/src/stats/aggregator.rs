//! Correctness rates, coverage progress and per-subject / per-day rollups.

use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate, TimeZone};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{percent, AnswerTally, UNKNOWN_SUBJECT};
use crate::hierarchy::{BankId, HierarchyStore};
use crate::path::path_matches;
use crate::records::{RecordStore, StudyRecord};
use crate::storage::AnalyticsConfig;

/// Coverage and accuracy over every bank and record.
///
/// Coverage counts each `(bank, path, question)` once; accuracy counts every
/// attempt. The two never share a denominator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallProgress {
    /// Questions defined in non-deleted banks.
    pub total_questions: u64,
    /// Distinct answered `(bank, path, question)` triples across all records.
    pub unique_answered: u64,
    /// Every answered attempt across the history.
    pub raw_answered: u64,
    pub raw_correct: u64,
    pub progress_percent: u32,
    pub accuracy_percent: u32,
}

/// Correct/wrong tally of one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub subject: String,
    pub correct: u64,
    pub wrong: u64,
    pub total: u64,
    pub rate: u32,
}

impl SubjectStats {
    fn from_tally(subject: String, tally: AnswerTally) -> Self {
        Self {
            subject,
            correct: tally.correct,
            wrong: tally.wrong,
            total: tally.total(),
            rate: tally.rate(),
        }
    }
}

/// Activity of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    /// Saved sessions on this day.
    pub sessions: u64,
    pub total: u64,
    pub correct: u64,
    pub wrong: u64,
}

impl DailyStats {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            sessions: 0,
            total: 0,
            correct: 0,
            wrong: 0,
        }
    }

    pub fn rate(&self) -> u32 {
        percent(self.correct, self.total)
    }
}

/// Read-only analytics over injected hierarchy and history snapshots.
///
/// Nothing is cached: every call scans the snapshots again, and no call can
/// fail. Missing banks or outcome maps simply contribute nothing.
pub struct ProgressAggregator<'a> {
    pub(crate) hierarchy: &'a HierarchyStore,
    pub(crate) records: &'a RecordStore,
    pub(crate) config: &'a AnalyticsConfig,
}

impl<'a> ProgressAggregator<'a> {
    pub fn new(
        hierarchy: &'a HierarchyStore,
        records: &'a RecordStore,
        config: &'a AnalyticsConfig,
    ) -> Self {
        Self {
            hierarchy,
            records,
            config,
        }
    }

    pub(crate) fn history(&self) -> impl Iterator<Item = &'a StudyRecord> {
        self.records.records().iter()
    }

    /// Correctness rate of every record in `bank_id` whose path starts with `path`.
    pub fn rate_for_path(&self, bank_id: &BankId, path: &[String]) -> u32 {
        self.tally_for_path(bank_id, path).rate()
    }

    pub fn tally_for_path(&self, bank_id: &BankId, path: &[String]) -> AnswerTally {
        let mut tally = AnswerTally::default();
        for record in self
            .history()
            .filter(|r| &r.bank_id == bank_id && path_matches(&r.path, path))
        {
            tally.add_record(record);
        }
        tally
    }

    pub fn overall_progress(&self) -> OverallProgress {
        let total_questions: u64 = self
            .hierarchy
            .banks()
            .map(|bank| bank.count_questions() as u64)
            .sum();

        let mut answered: HashSet<(&BankId, &[String], u32)> = HashSet::new();
        let mut raw = AnswerTally::default();
        for record in self.history() {
            raw.add_record(record);
            for number in record.answered_questions() {
                answered.insert((&record.bank_id, record.path.as_slice(), number));
            }
        }

        let unique_answered = answered.len() as u64;
        OverallProgress {
            total_questions,
            unique_answered,
            raw_answered: raw.total(),
            raw_correct: raw.correct,
            progress_percent: percent(unique_answered, total_questions).min(100),
            accuracy_percent: raw.rate(),
        }
    }

    /// Tallies grouped by subject (`path[0]`) across all records.
    pub fn subject_stats(&self) -> Vec<SubjectStats> {
        self.group_by_subject(|_| true)
    }

    /// Tallies grouped by subject for one bank, deleted or not.
    pub fn book_subject_stats(&self, bank_id: &BankId) -> Vec<SubjectStats> {
        self.group_by_subject(|r| &r.bank_id == bank_id)
    }

    fn group_by_subject(&self, keep: impl Fn(&StudyRecord) -> bool) -> Vec<SubjectStats> {
        let mut groups: IndexMap<String, AnswerTally> = IndexMap::new();
        for record in self.history().filter(|&r| keep(r)) {
            let subject = record.subject().unwrap_or(UNKNOWN_SUBJECT).to_string();
            groups.entry(subject).or_default().add_record(record);
        }
        groups
            .into_iter()
            .map(|(subject, tally)| SubjectStats::from_tally(subject, tally))
            .collect()
    }

    /// Lowest-rate subjects among those with enough answers, weakest first.
    pub fn weakest_subjects(&self, stats: &[SubjectStats]) -> Vec<SubjectStats> {
        let mut eligible: Vec<SubjectStats> = stats
            .iter()
            .filter(|s| s.total >= self.config.weakness_min_answers)
            .cloned()
            .collect();
        eligible.sort_by_key(|s| s.rate);
        eligible.truncate(self.config.weakness_limit);
        eligible
    }

    /// Per-day totals in `tz`, oldest day first. Days without records are absent.
    pub fn daily_stats<Tz: TimeZone>(&self, tz: &Tz) -> Vec<DailyStats> {
        let mut days: BTreeMap<NaiveDate, DailyStats> = BTreeMap::new();
        for record in self.history() {
            let date = record.timestamp.with_timezone(tz).date_naive();
            let day = days.entry(date).or_insert_with(|| DailyStats::empty(date));
            let correct = record.correct_count();
            let wrong = record.wrong_count();
            day.sessions += 1;
            day.correct += correct;
            day.wrong += wrong;
            day.total += correct + wrong;
        }
        days.into_values().collect()
    }

    /// Days with data inside the trailing activity window ending at `today`.
    pub fn recent_activity<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz) -> Vec<DailyStats> {
        let window = u64::from(self.config.activity_window_days.max(1));
        let first = today
            .checked_sub_days(Days::new(window - 1))
            .unwrap_or(NaiveDate::MIN);
        self.daily_stats(tz)
            .into_iter()
            .filter(|day| day.date >= first && day.date <= today)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{NodeKind, NumberingPolicy, QuestionRange};
    use crate::records::{PathStates, QuestionMark, QuestionState};
    use chrono::{DateTime, FixedOffset, Utc};

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn marks(correct: &[u32], wrong: &[u32], unset: &[u32]) -> PathStates {
        let mut states = PathStates::new();
        for n in correct {
            states.insert(*n, QuestionMark::new(QuestionState::Correct));
        }
        for n in wrong {
            states.insert(*n, QuestionMark::new(QuestionState::Wrong));
        }
        for n in unset {
            states.insert(*n, QuestionMark::new(QuestionState::Unset));
        }
        states
    }

    struct Fixture {
        hierarchy: HierarchyStore,
        records: RecordStore,
        config: AnalyticsConfig,
        bank: BankId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut hierarchy = HierarchyStore::new();
            let bank = hierarchy.create_bank("B", NumberingPolicy::Reset).unwrap();
            hierarchy
                .add_node(&bank, &[], NodeKind::Subject, "民法", Some(QuestionRange::new(1, 10).unwrap()))
                .unwrap();
            hierarchy
                .add_node(&bank, &[], NodeKind::Subject, "憲法", Some(QuestionRange::new(1, 10).unwrap()))
                .unwrap();
            Self {
                hierarchy,
                records: RecordStore::new(),
                config: AnalyticsConfig::default(),
                bank,
            }
        }

        fn record(&mut self, bank: &BankId, p: &[&str], states: PathStates, when: &str) {
            let record = StudyRecord::new(bank.clone(), path(p), states, at(when));
            self.records.append(record, &self.hierarchy);
        }

        fn aggregator(&self) -> ProgressAggregator<'_> {
            ProgressAggregator::new(&self.hierarchy, &self.records, &self.config)
        }
    }

    #[test]
    fn test_rate_for_path_example() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(
            &bank,
            &["民法"],
            marks(&[1, 2, 3, 4, 5, 6], &[7, 8], &[9, 10]),
            "2026-02-17T09:00:00Z",
        );
        assert_eq!(fx.aggregator().rate_for_path(&bank, &path(&["民法"])), 75);
    }

    #[test]
    fn test_rate_for_path_zero_when_nothing_answered() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        assert_eq!(fx.aggregator().rate_for_path(&bank, &path(&["民法"])), 0);

        fx.record(&bank, &["民法"], marks(&[], &[], &[1, 2]), "2026-02-17T09:00:00Z");
        assert_eq!(fx.aggregator().rate_for_path(&bank, &path(&["民法"])), 0);
        assert_eq!(
            fx.aggregator()
                .rate_for_path(&BankId::from("missing"), &path(&["民法"])),
            0
        );
    }

    #[test]
    fn test_rate_for_path_uses_prefix_scope() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(&bank, &["民法", "総則"], marks(&[1], &[], &[]), "2026-02-17T09:00:00Z");
        fx.record(&bank, &["民法", "物権"], marks(&[], &[1], &[]), "2026-02-17T10:00:00Z");
        fx.record(&bank, &["憲法"], marks(&[], &[1, 2], &[]), "2026-02-17T11:00:00Z");

        let agg = fx.aggregator();
        assert_eq!(agg.rate_for_path(&bank, &path(&["民法"])), 50);
        assert_eq!(agg.rate_for_path(&bank, &path(&["民法", "総則"])), 100);
        assert_eq!(agg.rate_for_path(&bank, &path(&["民法", "総則", "通則"])), 0);
    }

    #[test]
    fn test_overall_progress_deduplicates_coverage() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(&bank, &["民法"], marks(&[1, 2], &[3], &[4]), "2026-02-17T09:00:00Z");
        fx.record(&bank, &["民法"], marks(&[1], &[2], &[]), "2026-02-18T09:00:00Z");

        let progress = fx.aggregator().overall_progress();
        assert_eq!(progress.total_questions, 20);
        assert_eq!(progress.unique_answered, 3);
        assert_eq!(progress.raw_answered, 5);
        assert_eq!(progress.raw_correct, 3);
        assert_eq!(progress.progress_percent, 15);
        assert_eq!(progress.accuracy_percent, 60);
    }

    #[test]
    fn test_overall_progress_is_idempotent() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(&bank, &["憲法"], marks(&[1], &[2], &[]), "2026-02-17T09:00:00Z");
        let agg = fx.aggregator();
        assert_eq!(agg.overall_progress(), agg.overall_progress());
    }

    #[test]
    fn test_overall_progress_empty() {
        let hierarchy = HierarchyStore::new();
        let records = RecordStore::new();
        let config = AnalyticsConfig::default();
        let progress = ProgressAggregator::new(&hierarchy, &records, &config).overall_progress();
        assert_eq!(progress.progress_percent, 0);
        assert_eq!(progress.accuracy_percent, 0);
    }

    #[test]
    fn test_overall_progress_skips_deleted_bank_denominator() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        let other = fx.hierarchy.create_bank("Other", NumberingPolicy::Reset).unwrap();
        fx.hierarchy
            .add_node(&other, &[], NodeKind::Subject, "商法", Some(QuestionRange::new(1, 20).unwrap()))
            .unwrap();
        fx.record(&other, &["商法"], marks(&[1, 2], &[], &[]), "2026-02-17T09:00:00Z");
        fx.record(&bank, &["民法"], marks(&[1], &[], &[]), "2026-02-17T10:00:00Z");

        assert_eq!(fx.aggregator().overall_progress().total_questions, 40);

        fx.hierarchy.delete_bank(&other).unwrap();
        let progress = fx.aggregator().overall_progress();
        assert_eq!(progress.total_questions, 20);
        assert_eq!(progress.unique_answered, 3);
        assert_eq!(progress.raw_answered, 3);
        assert_eq!(progress.progress_percent, 15);
    }

    #[test]
    fn test_overall_progress_counts_deleted_bank_answers() {
        let mut hierarchy = HierarchyStore::new();
        let a = hierarchy.create_bank("A", NumberingPolicy::Reset).unwrap();
        let b = hierarchy.create_bank("B", NumberingPolicy::Reset).unwrap();
        for bank in [&a, &b] {
            hierarchy
                .add_node(bank, &[], NodeKind::Subject, "民法", Some(QuestionRange::new(1, 10).unwrap()))
                .unwrap();
        }
        let mut records = RecordStore::new();
        records.append(StudyRecord::new(
            b.clone(),
            path(&["民法"]),
            marks(&[1, 2, 3, 4, 5], &[], &[]),
            at("2026-02-17T09:00:00Z"),
        ), &hierarchy);
        hierarchy.delete_bank(&b).unwrap();

        let config = AnalyticsConfig::default();
        let progress = ProgressAggregator::new(&hierarchy, &records, &config).overall_progress();
        assert_eq!(progress.total_questions, 10);
        assert_eq!(progress.unique_answered, 5);
        assert_eq!(progress.progress_percent, 50);
    }

    #[test]
    fn test_overall_progress_clamped_to_hundred() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        let other = fx.hierarchy.create_bank("Other", NumberingPolicy::Reset).unwrap();
        fx.hierarchy
            .add_node(&other, &[], NodeKind::Subject, "商法", Some(QuestionRange::new(1, 30).unwrap()))
            .unwrap();
        let all: Vec<u32> = (1..=30).collect();
        fx.record(&other, &["商法"], marks(&all, &[], &[]), "2026-02-17T09:00:00Z");
        let ten: Vec<u32> = (1..=10).collect();
        fx.record(&bank, &["民法"], marks(&ten, &[], &[]), "2026-02-17T10:00:00Z");
        fx.hierarchy.delete_bank(&other).unwrap();

        let progress = fx.aggregator().overall_progress();
        assert_eq!(progress.total_questions, 20);
        assert_eq!(progress.unique_answered, 40);
        assert_eq!(progress.progress_percent, 100);
    }

    #[test]
    fn test_subject_stats_keep_deleted_bank_history() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(&bank, &["民法"], marks(&[1, 2], &[3], &[]), "2026-02-17T09:00:00Z");
        fx.record(&bank, &["憲法"], marks(&[1], &[], &[]), "2026-02-17T10:00:00Z");
        fx.hierarchy.delete_bank(&bank).unwrap();

        let stats = fx.aggregator().subject_stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].subject, "民法");
        assert_eq!((stats[0].correct, stats[0].wrong, stats[0].rate), (2, 1, 67));
        assert_eq!(fx.aggregator().book_subject_stats(&bank).len(), 2);
        assert_eq!(fx.aggregator().overall_progress().total_questions, 0);
    }

    #[test]
    fn test_book_subject_stats_filters_bank() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        let other = BankId::from("other");
        fx.record(&bank, &["民法"], marks(&[1], &[], &[]), "2026-02-17T09:00:00Z");
        fx.record(&other, &["商法"], marks(&[1], &[], &[]), "2026-02-17T09:00:00Z");
        fx.record(&other, &[], marks(&[], &[1], &[]), "2026-02-17T09:00:00Z");

        let stats = fx.aggregator().book_subject_stats(&other);
        let names: Vec<_> = stats.iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(names, vec!["商法", UNKNOWN_SUBJECT]);
    }

    #[test]
    fn test_weakest_subjects_threshold_and_order() {
        let fx = Fixture::new();
        let stats = vec![
            SubjectStats::from_tally("民法".into(), AnswerTally { correct: 4, wrong: 6 }),
            SubjectStats::from_tally("憲法".into(), AnswerTally { correct: 0, wrong: 4 }),
            SubjectStats::from_tally("行政法".into(), AnswerTally { correct: 9, wrong: 1 }),
            SubjectStats::from_tally("商法".into(), AnswerTally { correct: 1, wrong: 4 }),
        ];
        let weak = fx.aggregator().weakest_subjects(&stats);
        let names: Vec<_> = weak.iter().map(|s| s.subject.as_str()).collect();
        // 憲法 has the lowest rate but only 4 answers.
        assert_eq!(names, vec!["商法", "民法", "行政法"]);
    }

    #[test]
    fn test_weakest_subjects_limit() {
        let fx = Fixture::new();
        let stats: Vec<_> = (0..8)
            .map(|i| {
                SubjectStats::from_tally(format!("s{i}"), AnswerTally { correct: i, wrong: 10 })
            })
            .collect();
        let weak = fx.aggregator().weakest_subjects(&stats);
        assert_eq!(weak.len(), 5);
        assert_eq!(weak[0].subject, "s0");
    }

    #[test]
    fn test_daily_stats_merge_same_day() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(&bank, &["民法"], marks(&[1, 2], &[3], &[]), "2026-02-17T01:00:00Z");
        fx.record(&bank, &["憲法"], marks(&[1], &[], &[]), "2026-02-17T22:00:00Z");
        fx.record(&bank, &["憲法"], marks(&[], &[2], &[]), "2026-02-19T09:00:00Z");

        let days = fx.aggregator().daily_stats(&Utc);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());
        assert_eq!((days[0].sessions, days[0].total, days[0].correct, days[0].wrong), (2, 4, 3, 1));
        assert_eq!(days[1].total, 1);
    }

    #[test]
    fn test_daily_stats_use_given_timezone() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(&bank, &["民法"], marks(&[1], &[], &[]), "2026-02-17T01:00:00Z");
        fx.record(&bank, &["民法"], marks(&[2], &[], &[]), "2026-02-17T22:00:00Z");

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let days = fx.aggregator().daily_stats(&tokyo);
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2026, 2, 18).unwrap());
    }

    #[test]
    fn test_recent_activity_is_not_padded() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(&bank, &["民法"], marks(&[1], &[], &[]), "2026-02-01T09:00:00Z");
        fx.record(&bank, &["民法"], marks(&[1], &[], &[]), "2026-02-12T09:00:00Z");
        fx.record(&bank, &["民法"], marks(&[1], &[], &[]), "2026-02-17T09:00:00Z");

        let today = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        let recent = fx.aggregator().recent_activity(today, &Utc);
        let dates: Vec<_> = recent.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2026-02-12", "2026-02-17"]);
    }

    #[test]
    fn test_recent_activity_huge_window_keeps_all_days() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(&bank, &["民法"], marks(&[1], &[], &[]), "2026-02-01T09:00:00Z");
        fx.record(&bank, &["民法"], marks(&[1], &[], &[]), "2026-02-17T09:00:00Z");
        fx.config.activity_window_days = u32::MAX;

        let today = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        let recent = fx.aggregator().recent_activity(today, &Utc);
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_activity_heatmap_huge_weeks_is_clamped() {
        let mut fx = Fixture::new();
        let bank = fx.bank.clone();
        fx.record(&bank, &["民法"], marks(&[1, 2], &[], &[]), "2026-02-17T09:00:00Z");
        fx.config.heatmap_weeks = 100_000_000;

        let today = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        let heatmap = fx.aggregator().activity_heatmap(today, &Utc);
        assert_eq!(heatmap.weeks, crate::storage::MAX_HEATMAP_WEEKS);
        assert_eq!(heatmap.total_answered, 2);
    }
}
