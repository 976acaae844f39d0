use std::fmt::Write;

use crate::aggregate;
use crate::errors::ScoreboardError;
use crate::models::ScoreRecord;
use crate::ranking;
use crate::roster::RosterConfig;
use crate::week;

/// Render a markdown report for one week: per-grade rankings with the top
/// two called out, the full per-class breakdown, and recent batch notes.
pub fn build_report(
    target_week: &str,
    records: &[ScoreRecord],
    roster: &RosterConfig,
) -> Result<String, ScoreboardError> {
    let start = week::week_start(target_week)?;
    let rankings = ranking::rank(records, target_week, roster);
    let breakdown = aggregate::aggregate(records, start, roster);

    let mut output = String::new();
    let _ = writeln!(output, "# Weekly Cleanliness Report");
    let _ = writeln!(output, "Week {target_week} (starting {start})");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Rankings");

    if rankings.is_empty() {
        let _ = writeln!(output, "No grades configured.");
    }

    for (grade, entries) in &rankings {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Grade {grade}");
        if entries.is_empty() {
            let _ = writeln!(output, "No classes configured for this grade.");
            continue;
        }
        for (position, entry) in entries.iter().enumerate() {
            let marker = if position < 2 { " *" } else { "" };
            let _ = writeln!(
                output,
                "{}. class {} with {:+}{}",
                position + 1,
                entry.class_id,
                entry.total,
                marker
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Breakdown");
    if breakdown.is_empty() {
        let _ = writeln!(output, "No classes configured.");
    }
    for (class_id, stats) in &breakdown {
        let _ = writeln!(
            output,
            "- {}: classroom {:+}, exterior {:+}, total {:+}",
            class_id, stats.classroom, stats.exterior, stats.total
        );
    }

    let mut noted: Vec<&ScoreRecord> = records
        .iter()
        .filter(|record| record.week == target_week && record.note.is_some())
        .collect();
    noted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Notes");
    if noted.is_empty() {
        let _ = writeln!(output, "No notes recorded for this week.");
    } else {
        for record in noted.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}) on {}: {}",
                record.class_id,
                record.score_type,
                record.date,
                record.note.as_deref().unwrap_or_default()
            );
        }
    }

    Ok(output)
}
