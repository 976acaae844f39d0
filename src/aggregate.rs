use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{ScoreRecord, ScoreType, WeeklyBreakdown};
use crate::roster::RosterConfig;
use crate::week;

/// Per-class breakdown for the week containing `target_date`.
///
/// Every canonical class id under the given roster appears in the result,
/// zero-filled when it has no records. Records whose class id falls outside
/// the current roster are skipped without error; they stay in raw history
/// but out of this view. Pure fold over the snapshot, no side effects.
pub fn aggregate(
    records: &[ScoreRecord],
    target_date: NaiveDate,
    roster: &RosterConfig,
) -> BTreeMap<String, WeeklyBreakdown> {
    let target_week = week::week_label(target_date);

    let mut stats: BTreeMap<String, WeeklyBreakdown> = roster
        .all_class_ids()
        .into_iter()
        .map(|class_id| (class_id, WeeklyBreakdown::default()))
        .collect();

    for record in records {
        if record.week != target_week {
            continue;
        }
        let Some(entry) = stats.get_mut(&record.class_id) else {
            continue;
        };
        match record.score_type {
            ScoreType::Classroom => entry.classroom += record.score,
            ScoreType::Exterior => entry.exterior += record.score,
        }
        entry.total += record.score;
    }

    stats
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::roster;

    fn record(class_id: &str, score_type: ScoreType, score: i32, date: NaiveDate) -> ScoreRecord {
        let (grade, _) = roster::split_class_id(class_id).unwrap();
        ScoreRecord {
            id: Uuid::new_v4(),
            date,
            week: week::week_label(date),
            score_type,
            grade,
            class_id: class_id.to_string(),
            score,
            created_at: Utc::now(),
            rater_uid: "rater-a".to_string(),
            note: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn zero_fills_every_canonical_class() {
        let roster = RosterConfig::default();
        let stats = aggregate(&[], day(2026, 2, 4), &roster);
        assert_eq!(stats.len(), 14);
        assert!(stats.values().all(|b| *b == WeeklyBreakdown::default()));
        assert!(stats.contains_key("104"));
        assert!(stats.contains_key("305"));
    }

    #[test]
    fn sums_by_category_and_total() {
        let roster = RosterConfig::default();
        let date = day(2026, 2, 4);
        let records = vec![
            record("101", ScoreType::Classroom, 2, date),
            record("101", ScoreType::Classroom, -1, date),
            record("101", ScoreType::Exterior, 3, date),
            record("202", ScoreType::Exterior, 1, date),
        ];
        let stats = aggregate(&records, date, &roster);
        assert_eq!(
            stats["101"],
            WeeklyBreakdown { classroom: 1, exterior: 3, total: 4 }
        );
        assert_eq!(
            stats["202"],
            WeeklyBreakdown { classroom: 0, exterior: 1, total: 1 }
        );
    }

    #[test]
    fn only_the_target_week_counts() {
        let roster = RosterConfig::default();
        let records = vec![
            record("101", ScoreType::Classroom, 2, day(2026, 2, 4)),
            record("101", ScoreType::Classroom, 5, day(2026, 2, 11)),
        ];
        let stats = aggregate(&records, day(2026, 2, 4), &roster);
        assert_eq!(stats["101"].classroom, 2);
    }

    #[test]
    fn iso_year_boundary_buckets_together() {
        // 2024-12-30 and 2025-01-03 are both 2025-W01.
        let roster = RosterConfig::default();
        let records = vec![
            record("101", ScoreType::Classroom, 1, day(2024, 12, 30)),
            record("101", ScoreType::Classroom, 2, day(2025, 1, 3)),
        ];
        let stats = aggregate(&records, day(2025, 1, 1), &roster);
        assert_eq!(stats["101"].total, 3);
    }

    #[test]
    fn out_of_roster_records_are_silently_excluded() {
        let date = day(2026, 2, 4);
        let records = vec![
            record("104", ScoreType::Classroom, 3, date),
            record("101", ScoreType::Classroom, 1, date),
        ];

        let four = RosterConfig::new(BTreeMap::from([(1, 4)]), None).unwrap();
        let stats = aggregate(&records, date, &four);
        assert_eq!(stats["104"].total, 3);

        // Shrinking the roster drops 104 from the view; the raw record is
        // still in the slice we were handed.
        let three = RosterConfig::new(BTreeMap::from([(1, 3)]), None).unwrap();
        let stats = aggregate(&records, date, &three);
        assert!(!stats.contains_key("104"));
        assert_eq!(stats["101"].total, 1);
        assert!(records.iter().any(|r| r.class_id == "104"));
    }

    #[test]
    fn disjoint_sets_aggregate_additively() {
        let roster = RosterConfig::default();
        let date = day(2026, 2, 4);
        let set_a = vec![
            record("101", ScoreType::Classroom, 2, date),
            record("201", ScoreType::Exterior, -1, date),
        ];
        let set_b = vec![
            record("101", ScoreType::Exterior, 1, date),
            record("301", ScoreType::Classroom, 3, date),
        ];

        let mut merged = set_a.clone();
        merged.extend(set_b.clone());

        let stats_a = aggregate(&set_a, date, &roster);
        let stats_b = aggregate(&set_b, date, &roster);
        let stats_merged = aggregate(&merged, date, &roster);

        for (class_id, combined) in &stats_merged {
            let a = stats_a[class_id];
            let b = stats_b[class_id];
            assert_eq!(combined.classroom, a.classroom + b.classroom);
            assert_eq!(combined.exterior, a.exterior + b.exterior);
            assert_eq!(combined.total, a.total + b.total);
        }
    }
}
