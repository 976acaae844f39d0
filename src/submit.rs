use chrono::NaiveDate;

use crate::errors::ScoreboardError;
use crate::models::{NewScoreRecord, ScoreType};
use crate::roster::{self, RosterConfig};
use crate::week;

/// Accepted score deltas. The scoring form offers exactly these steps.
pub const SCORE_RANGE: std::ops::RangeInclusive<i32> = -3..=3;

/// One raw `CLASS=SCORE` pair as typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub class_id: String,
    pub score: String,
}

impl std::str::FromStr for RawEntry {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (class_id, score) = value
            .split_once('=')
            .ok_or_else(|| format!("expected CLASS=SCORE, got {value:?}"))?;
        Ok(RawEntry {
            class_id: class_id.trim().to_string(),
            score: score.trim().to_string(),
        })
    }
}

/// A validated batch, ready for a single atomic commit, plus the raw
/// entries that were dropped on the way so the rater can be told which of
/// their scores did not make it in.
#[derive(Debug)]
pub struct PreparedBatch {
    pub records: Vec<NewScoreRecord>,
    pub rejected: Vec<RawEntry>,
}

/// Validate a submission batch without touching the store.
///
/// Entries are validated independently; a failing entry lands in
/// `rejected` instead of aborting the batch. An empty input is refused as
/// `EmptyBatch` and an input with no survivors as `NoValidEntries`, so a
/// refused submission has no side effects at all. Every surviving record
/// shares the batch's date, week label, category, note and rater.
pub fn prepare_batch(
    entries: &[RawEntry],
    date: NaiveDate,
    score_type: ScoreType,
    note: Option<&str>,
    rater_uid: &str,
    roster: &RosterConfig,
) -> Result<PreparedBatch, ScoreboardError> {
    if entries.is_empty() {
        return Err(ScoreboardError::EmptyBatch);
    }

    let week = week::week_label(date);
    let mut records = Vec::new();
    let mut rejected = Vec::new();

    for entry in entries {
        match validate_entry(entry, roster) {
            Some((grade, score)) => records.push(NewScoreRecord {
                date,
                week: week.clone(),
                score_type,
                grade,
                class_id: entry.class_id.clone(),
                score,
                rater_uid: rater_uid.to_string(),
                note: note.map(str::to_string),
            }),
            None => rejected.push(entry.clone()),
        }
    }

    if records.is_empty() {
        return Err(ScoreboardError::NoValidEntries);
    }

    Ok(PreparedBatch { records, rejected })
}

fn validate_entry(entry: &RawEntry, roster: &RosterConfig) -> Option<(u32, i32)> {
    let (grade, _) = roster::split_class_id(&entry.class_id)?;
    if !roster.is_canonical(&entry.class_id) {
        return None;
    }
    let score: i32 = entry.score.parse().ok()?;
    if !SCORE_RANGE.contains(&score) {
        return None;
    }
    Some((grade, score))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn entry(class_id: &str, score: &str) -> RawEntry {
        RawEntry {
            class_id: class_id.to_string(),
            score: score.to_string(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 4).unwrap()
    }

    #[test]
    fn raw_entries_parse_from_cli_form() {
        let parsed: RawEntry = "101=2".parse().unwrap();
        assert_eq!(parsed, entry("101", "2"));
        let padded: RawEntry = " 205 = -1 ".parse().unwrap();
        assert_eq!(padded, entry("205", "-1"));
        assert!("101".parse::<RawEntry>().is_err());
    }

    #[test]
    fn empty_batch_is_refused_before_anything_else() {
        let result = prepare_batch(
            &[],
            date(),
            ScoreType::Classroom,
            None,
            "rater-a",
            &RosterConfig::default(),
        );
        assert!(matches!(result, Err(ScoreboardError::EmptyBatch)));
    }

    #[test]
    fn invalid_entries_drop_without_aborting_the_batch() {
        let entries = vec![entry("101", "2"), entry("bad", "x")];
        let batch = prepare_batch(
            &entries,
            date(),
            ScoreType::Classroom,
            None,
            "rater-a",
            &RosterConfig::default(),
        )
        .unwrap();

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].class_id, "101");
        assert_eq!(batch.records[0].score, 2);
        assert_eq!(batch.rejected, vec![entry("bad", "x")]);
    }

    #[test]
    fn all_invalid_means_no_valid_entries() {
        let entries = vec![entry("bad", "x"), entry("101", "seven")];
        let result = prepare_batch(
            &entries,
            date(),
            ScoreType::Classroom,
            None,
            "rater-a",
            &RosterConfig::default(),
        );
        assert!(matches!(result, Err(ScoreboardError::NoValidEntries)));
    }

    #[test]
    fn scores_outside_the_delta_range_are_rejected() {
        let entries = vec![entry("101", "7"), entry("102", "-4"), entry("103", "3")];
        let batch = prepare_batch(
            &entries,
            date(),
            ScoreType::Exterior,
            None,
            "rater-a",
            &RosterConfig::default(),
        )
        .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].class_id, "103");
        assert_eq!(batch.rejected.len(), 2);
    }

    #[test]
    fn out_of_roster_classes_are_rejected() {
        // Default roster has four grade-1 classes, so 105 does not exist.
        let entries = vec![entry("105", "1"), entry("104", "1")];
        let batch = prepare_batch(
            &entries,
            date(),
            ScoreType::Classroom,
            None,
            "rater-a",
            &RosterConfig::default(),
        )
        .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].class_id, "104");
    }

    #[test]
    fn batch_fields_are_shared_across_records() {
        let entries = vec![entry("101", "2"), entry("202", "-1")];
        let batch = prepare_batch(
            &entries,
            date(),
            ScoreType::Exterior,
            Some("storm day"),
            "rater-b",
            &RosterConfig::default(),
        )
        .unwrap();

        assert_eq!(batch.records.len(), 2);
        for record in &batch.records {
            assert_eq!(record.date, date());
            assert_eq!(record.week, "2026-W06");
            assert_eq!(record.score_type, ScoreType::Exterior);
            assert_eq!(record.note.as_deref(), Some("storm day"));
            assert_eq!(record.rater_uid, "rater-b");
        }
        assert_eq!(batch.records[0].grade, 1);
        assert_eq!(batch.records[1].grade, 2);
    }
}
