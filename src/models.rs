use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::week;

/// Scoring category. Classroom tidiness and the exterior sweep zone are
/// scored separately and summed into a class's weekly total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreType {
    Classroom,
    Exterior,
}

impl ScoreType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreType::Classroom => "classroom",
            ScoreType::Exterior => "exterior",
        }
    }
}

impl std::str::FromStr for ScoreType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "classroom" => Ok(ScoreType::Classroom),
            "exterior" => Ok(ScoreType::Exterior),
            other => Err(format!("unknown score type {other:?}")),
        }
    }
}

impl std::fmt::Display for ScoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committed score delta. Records are immutable once stored; the only
/// lifecycle events are batch creation and deletion.
#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    /// Denormalized from `date` at submission time for week-bucketed queries.
    pub week: String,
    pub score_type: ScoreType,
    pub grade: u32,
    pub class_id: String,
    /// Additive contribution, not an absolute rating.
    pub score: i32,
    /// Server-assigned; used for history ordering only, never aggregation.
    pub created_at: DateTime<Utc>,
    pub rater_uid: String,
    /// Batch-level note, duplicated onto every record of the batch.
    pub note: Option<String>,
}

impl ScoreRecord {
    /// The stored week label must always be reproducible from the date.
    pub fn week_is_consistent(&self) -> bool {
        self.week == week::week_label(self.date)
    }
}

/// A record that passed submission validation but is not yet committed.
#[derive(Debug, Clone)]
pub struct NewScoreRecord {
    pub date: NaiveDate,
    pub week: String,
    pub score_type: ScoreType,
    pub grade: u32,
    pub class_id: String,
    pub score: i32,
    pub rater_uid: String,
    pub note: Option<String>,
}

/// Per-class weekly totals, split by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyBreakdown {
    pub classroom: i32,
    pub exterior: i32,
    pub total: i32,
}

/// One row of a grade's ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub class_id: String,
    pub total: i32,
}
