use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::errors::ScoreboardError;

pub const MAX_CLASS_COUNT: u32 = 30;

// Class ids carry a single leading grade digit, so grades live in 1..=9.
pub const MIN_GRADE: u32 = 1;
pub const MAX_GRADE: u32 = 9;

/// Grade-to-class-count configuration. Changing it redefines the canonical
/// class set going forward; existing records are never rewritten, so
/// history for a class that falls out of range stays in raw storage but
/// disappears from aggregation and ranking.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    counts: BTreeMap<u32, u32>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig {
            counts: BTreeMap::from([(1, 4), (2, 5), (3, 5)]),
            updated_at: None,
        }
    }
}

impl RosterConfig {
    pub fn new(
        counts: BTreeMap<u32, u32>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ScoreboardError> {
        validate_counts(&counts)?;
        Ok(RosterConfig { counts, updated_at })
    }

    pub fn counts(&self) -> &BTreeMap<u32, u32> {
        &self.counts
    }

    pub fn grades(&self) -> impl Iterator<Item = u32> + '_ {
        self.counts.keys().copied()
    }

    pub fn count(&self, grade: u32) -> u32 {
        self.counts.get(&grade).copied().unwrap_or(0)
    }

    /// Canonical class ids for one grade, in sequence order.
    pub fn class_ids(&self, grade: u32) -> Vec<String> {
        (1..=self.count(grade)).map(|seq| class_id(grade, seq)).collect()
    }

    /// Canonical class ids across all grades, grade order then sequence order.
    pub fn all_class_ids(&self) -> Vec<String> {
        self.grades().flat_map(|grade| self.class_ids(grade)).collect()
    }

    pub fn is_canonical(&self, class_id: &str) -> bool {
        match split_class_id(class_id) {
            Some((grade, seq)) => seq >= 1 && seq <= self.count(grade),
            None => false,
        }
    }
}

/// Format a class id as `<grade><2-digit sequence>`, e.g. `(1, 1)` is `101`.
pub fn class_id(grade: u32, seq: u32) -> String {
    format!("{grade}{seq:02}")
}

/// Split a class id into grade and sequence. Anything that is not exactly
/// one grade digit followed by two sequence digits yields `None`.
pub fn split_class_id(class_id: &str) -> Option<(u32, u32)> {
    if class_id.len() != 3 || !class_id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let grade: u32 = class_id[..1].parse().ok()?;
    if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
        return None;
    }
    let seq: u32 = class_id[1..].parse().ok()?;
    Some((grade, seq))
}

/// Bounds check for a roster update, applied before anything is persisted.
pub fn validate_counts(counts: &BTreeMap<u32, u32>) -> Result<(), ScoreboardError> {
    for (&grade, &count) in counts {
        if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
            return Err(ScoreboardError::InvalidRoster(format!(
                "grade {grade} is outside {MIN_GRADE}..={MAX_GRADE}"
            )));
        }
        if count > MAX_CLASS_COUNT {
            return Err(ScoreboardError::InvalidRoster(format!(
                "grade {grade} class count {count} exceeds {MAX_CLASS_COUNT}"
            )));
        }
    }
    Ok(())
}
