use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::errors::ScoreboardError;
use crate::models::{NewScoreRecord, ScoreRecord, ScoreType};
use crate::roster::{self, RosterConfig};
use crate::submit::{self, PreparedBatch};
use crate::week;

/// Upper bound on mutations in one atomic batch, matching the backing
/// store's per-batch write cap.
pub const MAX_BATCH_OPS: usize = 500;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let roster = RosterConfig::default();
    set_roster(pool, roster.counts()).await?;

    let records = vec![
        (
            "b4f1d2e0-3c55-4a2f-9e1d-6a7b8c9d0e1f",
            "2026-02-02",
            ScoreType::Classroom,
            "101",
            2,
            "Desks aligned, floor spotless",
        ),
        (
            "0a9b8c7d-6e5f-4d3c-b2a1-9f8e7d6c5b4a",
            "2026-02-02",
            ScoreType::Classroom,
            "103",
            -1,
            "Litter under the back row",
        ),
        (
            "7c6d5e4f-3a2b-4c1d-8e9f-0a1b2c3d4e5f",
            "2026-02-03",
            ScoreType::Exterior,
            "205",
            3,
            "Sweep zone cleared before first bell",
        ),
        (
            "2e3f4a5b-6c7d-4e8f-9a0b-1c2d3e4f5a6b",
            "2026-02-03",
            ScoreType::Exterior,
            "301",
            1,
            "Planters weeded",
        ),
    ];

    for (id, date, score_type, class_id, score, note) in records {
        let date = week::parse_date(date)?;
        let (grade, _) = roster::split_class_id(class_id)
            .context("seed class id does not match <grade><seq> format")?;
        sqlx::query(
            r#"
            INSERT INTO cleanliness.score_records
            (id, date, week, score_type, grade, class_id, score, rater_uid, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(date)
        .bind(week::week_label(date))
        .bind(score_type.as_str())
        .bind(grade as i32)
        .bind(class_id)
        .bind(score)
        .bind("seed-rater")
        .bind(note)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Full snapshot of the record collection, newest first.
///
/// There is no incremental sync; every command pulls the complete set and
/// works from that, the same way the live subscription in the original
/// client replaced its whole local view on each notification.
pub async fn fetch_records(pool: &PgPool) -> Result<Vec<ScoreRecord>, ScoreboardError> {
    let rows = sqlx::query(
        "SELECT id, date, week, score_type, grade, class_id, score, \
         created_at, rater_uid, note \
         FROM cleanliness.score_records \
         ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let type_raw: String = row.get("score_type");
        let score_type: ScoreType = type_raw
            .parse()
            .map_err(|_| ScoreboardError::UnknownScoreType(type_raw))?;
        let grade: i32 = row.get("grade");
        records.push(ScoreRecord {
            id: row.get("id"),
            date: row.get("date"),
            week: row.get("week"),
            score_type,
            grade: grade as u32,
            class_id: row.get("class_id"),
            score: row.get("score"),
            created_at: row.get("created_at"),
            rater_uid: row.get("rater_uid"),
            note: row.get("note"),
        });
    }

    Ok(records)
}

/// Point lookup of the roster document. An unconfigured store answers with
/// the default roster rather than an empty one.
pub async fn fetch_roster(pool: &PgPool) -> Result<RosterConfig, ScoreboardError> {
    let rows = sqlx::query(
        "SELECT grade, class_count, updated_at FROM cleanliness.roster ORDER BY grade",
    )
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(RosterConfig::default());
    }

    let mut counts = BTreeMap::new();
    let mut updated_at: Option<DateTime<Utc>> = None;
    for row in rows {
        let grade: i32 = row.get("grade");
        let count: i32 = row.get("class_count");
        counts.insert(grade as u32, count as u32);
        let row_updated: DateTime<Utc> = row.get("updated_at");
        updated_at = Some(updated_at.map_or(row_updated, |seen| seen.max(row_updated)));
    }

    RosterConfig::new(counts, updated_at)
}

/// Commit a prepared batch as one transaction. Either every record
/// persists or none does; `created_at` is the server clock inside the
/// transaction, so the whole batch carries one timestamp.
pub async fn submit_batch(
    pool: &PgPool,
    batch: &PreparedBatch,
) -> Result<usize, ScoreboardError> {
    let mut tx = pool.begin().await?;
    for record in &batch.records {
        sqlx::query(
            r#"
            INSERT INTO cleanliness.score_records
            (id, date, week, score_type, grade, class_id, score, rater_uid, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.date)
        .bind(&record.week)
        .bind(record.score_type.as_str())
        .bind(record.grade as i32)
        .bind(&record.class_id)
        .bind(record.score)
        .bind(&record.rater_uid)
        .bind(record.note.as_deref())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(batch.records.len())
}

/// Delete exactly one record. Deleting a record that is already gone is
/// `RecordNotFound`, not a silent success.
pub async fn delete_record(pool: &PgPool, id: Uuid) -> Result<(), ScoreboardError> {
    let result = sqlx::query("DELETE FROM cleanliness.score_records WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ScoreboardError::RecordNotFound(id));
    }
    Ok(())
}

#[derive(Debug)]
pub struct ClearSummary {
    pub deleted: usize,
}

/// Delete every record currently visible.
///
/// The id snapshot is read first, then deleted in chunks of
/// `MAX_BATCH_OPS`, each chunk its own atomic transaction. Records
/// committed by other writers between the read and a chunk's commit may
/// survive the pass: there is no isolation across the read and the
/// deletes, only within each chunk. A failure partway through reports how
/// many records were already gone instead of pretending the store is
/// untouched.
pub async fn clear_all(pool: &PgPool) -> Result<ClearSummary, ScoreboardError> {
    let rows = sqlx::query("SELECT id FROM cleanliness.score_records")
        .fetch_all(pool)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
    let total = ids.len();

    let mut deleted = 0usize;
    for chunk in ids.chunks(MAX_BATCH_OPS) {
        if let Err(source) = delete_chunk(pool, chunk).await {
            return Err(ScoreboardError::PartialClear {
                deleted,
                total,
                source,
            });
        }
        deleted += chunk.len();
    }

    Ok(ClearSummary { deleted })
}

async fn delete_chunk(pool: &PgPool, ids: &[Uuid]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM cleanliness.score_records WHERE id = ANY($1)")
        .bind(ids)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Replace the roster configuration. Bounds are checked before the store
/// is touched; the new counts are canonical for every subsequent
/// aggregation and ranking call, with no versioning against history.
pub async fn set_roster(
    pool: &PgPool,
    counts: &BTreeMap<u32, u32>,
) -> Result<(), ScoreboardError> {
    roster::validate_counts(counts)?;

    let grades: Vec<i32> = counts.keys().map(|&grade| grade as i32).collect();
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM cleanliness.roster WHERE grade <> ALL($1)")
        .bind(&grades)
        .execute(&mut *tx)
        .await?;
    for (&grade, &count) in counts {
        sqlx::query(
            r#"
            INSERT INTO cleanliness.roster (grade, class_count, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (grade) DO UPDATE
            SET class_count = EXCLUDED.class_count, updated_at = now()
            "#,
        )
        .bind(grade as i32)
        .bind(count as i32)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

#[derive(serde::Deserialize)]
struct CsvRow {
    date: NaiveDate,
    score_type: ScoreType,
    class_id: String,
    score: i32,
    rater_uid: String,
    note: Option<String>,
}

/// Imported rows pass the same shape checks as interactive submissions: a
/// well-formed class id and a score within the delta range. A bad row
/// fails the whole import before the transaction commits.
fn prepare_import_row(row: CsvRow) -> anyhow::Result<NewScoreRecord> {
    let (grade, _) = roster::split_class_id(&row.class_id)
        .with_context(|| format!("bad class id {:?} in CSV", row.class_id))?;
    anyhow::ensure!(
        submit::SCORE_RANGE.contains(&row.score),
        "score {} for class {} is outside {:?}",
        row.score,
        row.class_id,
        submit::SCORE_RANGE
    );
    Ok(NewScoreRecord {
        date: row.date,
        week: week::week_label(row.date),
        score_type: row.score_type,
        grade,
        class_id: row.class_id,
        score: row.score,
        rater_uid: row.rater_uid,
        note: row.note,
    })
}

/// Bulk-import score records from a CSV export. The whole file commits as
/// one transaction, and week labels are recomputed from each row's date
/// rather than trusted from the file.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let record = prepare_import_row(result?)?;
        sqlx::query(
            r#"
            INSERT INTO cleanliness.score_records
            (id, date, week, score_type, grade, class_id, score, rater_uid, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.date)
        .bind(&record.week)
        .bind(record.score_type.as_str())
        .bind(record.grade as i32)
        .bind(&record.class_id)
        .bind(record.score)
        .bind(&record.rater_uid)
        .bind(record.note.as_deref())
        .execute(&mut *tx)
        .await?;
        inserted += 1;
    }

    tx.commit().await?;
    Ok(inserted)
}
