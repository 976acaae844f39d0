use std::collections::BTreeMap;

use crate::models::{RankEntry, ScoreRecord};
use crate::roster::{self, RosterConfig};

/// Grade-level rankings for one week.
///
/// Every canonical class id starts at zero, so classes with no activity
/// still rank (at the bottom, on the tie-break). Records outside the
/// current roster are ignored. Each grade's list is the full roster for
/// that grade; truncating for display is the caller's business.
///
/// Sort order is total descending, then class id ascending, which makes
/// ties deterministic.
pub fn rank(
    records: &[ScoreRecord],
    target_week: &str,
    roster: &RosterConfig,
) -> BTreeMap<u32, Vec<RankEntry>> {
    let mut totals: BTreeMap<String, i32> = roster
        .all_class_ids()
        .into_iter()
        .map(|class_id| (class_id, 0))
        .collect();

    for record in records {
        if record.week != target_week {
            continue;
        }
        if let Some(total) = totals.get_mut(&record.class_id) {
            *total += record.score;
        }
    }

    let mut rankings: BTreeMap<u32, Vec<RankEntry>> =
        roster.grades().map(|grade| (grade, Vec::new())).collect();

    for (class_id, total) in totals {
        let Some((grade, _)) = roster::split_class_id(&class_id) else {
            continue;
        };
        if let Some(entries) = rankings.get_mut(&grade) {
            entries.push(RankEntry { class_id, total });
        }
    }

    for entries in rankings.values_mut() {
        entries.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.class_id.cmp(&b.class_id))
        });
    }

    rankings
}
