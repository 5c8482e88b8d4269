//! Legacy diary tooling: convert the old plain-text diary to the JSON export
//! format, import that export into one user's diary, and summarize what ended
//! up in the store.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::diary::{parse_date, Diary, DiaryChanges, NewDiary};
use crate::models::mental::{MentalScore, MAX_MENTAL};
use crate::repositories::{DiaryRepository, RepositoryError};

/// Score used when the export has none (zero or negative).
pub const DEFAULT_LEGACY_SCORE: i32 = 5;

/// Number of most recent entries listed in a [`DiaryReport`].
pub const REPORT_LATEST: usize = 10;

/// Characters of body text shown per entry in a [`DiaryReport`].
pub const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Serialize, Deserialize)]
pub struct LegacyExport {
    pub entries: Vec<LegacyEntry>,
    #[serde(default)]
    pub total: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    pub date: String,
    pub mental: i32,
    pub content: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Missing scores fall back to the default and oversized ones are capped.
pub fn normalize_legacy_score(raw: i32) -> i32 {
    if raw <= 0 {
        DEFAULT_LEGACY_SCORE
    } else {
        raw.min(MAX_MENTAL)
    }
}

/// Count scores per value; index 0 holds score 1. Values outside 1..=10
/// are not counted.
pub fn score_histogram(scores: impl IntoIterator<Item = i32>) -> [usize; 10] {
    let mut histogram = [0; 10];
    for score in scores {
        if (1..=MAX_MENTAL).contains(&score) {
            histogram[(score - 1) as usize] += 1;
        }
    }
    histogram
}

/// Parse the plain-text diary. An entry starts at a line beginning with
/// `M/D` (optionally followed by a weekday kanji) and runs until the next
/// such line; a `・メンタルN` marker anywhere in it sets the score. Blank
/// lines are dropped and lines are trimmed. Entries without a marker keep
/// score 0 so the import falls back to the default.
pub fn parse_legacy_text(text: &str, year: i32) -> anyhow::Result<Vec<LegacyEntry>> {
    let date_line = Regex::new(r"^(\d{1,2})/(\d{1,2})[月火水木金土日]?")?;
    let mental_marker = Regex::new(r"・メンタル(\d+)")?;

    let mut entries = Vec::new();
    let mut current: Option<(LegacyEntry, Vec<&str>)> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = date_line.captures(line) {
            if let Some(done) = current.take() {
                entries.push(finish_entry(done));
            }
            let date = match (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
                (Ok(month), Ok(day)) => format!("{year}-{month:02}-{day:02}"),
                _ => caps[0].to_string(),
            };
            current = Some((
                LegacyEntry {
                    date,
                    mental: 0,
                    content: String::new(),
                },
                Vec::new(),
            ));
        }

        if let Some((entry, lines)) = current.as_mut() {
            if let Some(score) = mental_marker
                .captures(line)
                .and_then(|caps| caps[1].parse::<i32>().ok())
            {
                entry.mental = score;
            }
            lines.push(line);
        }
    }

    if let Some(done) = current.take() {
        entries.push(finish_entry(done));
    }
    Ok(entries)
}

fn finish_entry((mut entry, lines): (LegacyEntry, Vec<&str>)) -> LegacyEntry {
    entry.content = lines.join("\n");
    entry
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub date: NaiveDate,
    pub mental: i32,
    pub preview: String,
}

/// Overview of stored diaries after a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryReport {
    pub total: usize,
    /// Newest first.
    pub latest: Vec<ReportLine>,
    pub histogram: [usize; 10],
}

/// `diaries` must be in ascending date order, as the repositories return them.
pub fn summarize(diaries: &[Diary]) -> DiaryReport {
    let latest = diaries
        .iter()
        .rev()
        .take(REPORT_LATEST)
        .map(|d| ReportLine {
            date: d.date,
            mental: d.mental.value(),
            preview: preview(&d.diary),
        })
        .collect();

    DiaryReport {
        total: diaries.len(),
        latest,
        histogram: score_histogram(diaries.iter().map(|d| d.mental.value())),
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}

enum Outcome {
    Created,
    Updated,
}

/// Upsert every entry for `user_id`. A failing entry is logged and counted,
/// the rest still go through.
pub async fn import_entries(
    repo: &dyn DiaryRepository,
    user_id: Uuid,
    entries: &[LegacyEntry],
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for entry in entries {
        match import_entry(repo, user_id, entry).await {
            Ok(Outcome::Created) => summary.created += 1,
            Ok(Outcome::Updated) => summary.updated += 1,
            Err(e) => {
                tracing::warn!(date = %entry.date, error = %e, "Skipping legacy entry");
                summary.failed += 1;
            }
        }
    }

    summary
}

async fn import_entry(
    repo: &dyn DiaryRepository,
    user_id: Uuid,
    entry: &LegacyEntry,
) -> anyhow::Result<Outcome> {
    let date = parse_date(&entry.date)?;
    let mental = MentalScore::new(normalize_legacy_score(entry.mental))?;

    match repo.find_by_user_and_date(user_id, date).await {
        Ok(_) => {
            let changes = DiaryChanges {
                mental,
                diary: entry.content.clone(),
            };
            repo.update(user_id, date, changes).await?;
            tracing::debug!(date = %date, mental = %mental, "Legacy entry updated");
            Ok(Outcome::Updated)
        }
        Err(RepositoryError::NotFound(_)) => {
            repo.create(NewDiary {
                user_id,
                date,
                mental,
                diary: entry.content.clone(),
            })
            .await?;
            tracing::debug!(date = %date, mental = %mental, "Legacy entry created");
            Ok(Outcome::Created)
        }
        Err(e) => Err(e.into()),
    }
}
