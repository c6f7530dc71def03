// src/analytics.rs

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{DAILY_SERIES_DAYS, TOP_PERFORMERS_LIMIT};
use crate::models::attempt::Attempt;

/// Overall descriptive statistics for a quiz's submitted attempts.
/// Zero-valued (not absent) when there are no qualifying attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_attempts: i64,
    pub avg_score: f64,
    pub max_score: i64,
    pub min_score: i64,
    pub avg_duration: f64,
}

/// One calendar-date bucket of the daily series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    /// UTC calendar date, serialized as YYYY-MM-DD.
    pub date: NaiveDate,
    pub attempts: i64,
    pub avg_score: f64,
}

/// Learner identity attached to a leaderboard entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerInfo {
    pub name: String,
    pub email: String,
}

/// One leaderboard entry. Only score, duration and learner identity are
/// exposed; the rest of the attempt stays internal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEntry {
    pub score: i64,
    pub duration_sec: i64,
    pub learner: LearnerInfo,
}

/// The three analytics views, always produced together so callers never
/// branch on partial absence.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnalytics {
    pub summary: Summary,
    pub by_day: Vec<DayBucket>,
    pub top: Vec<TopEntry>,
}

/// Aggregates a quiz's attempts into summary, daily series and leaderboard.
///
/// Pure function over the snapshot it is handed: always recomputed from the
/// full attempt set, never incremental, so there is no cached intermediate
/// state to invalidate. Attempts without a `submitted_at` are excluded from
/// every view.
///
/// The daily series is sorted ascending and truncated to the 14 earliest
/// distinct dates present in the data. Truncating from the oldest end is the
/// historical behavior of this endpoint and is kept on purpose; see
/// DESIGN.md before changing it.
pub fn aggregate(attempts: &[Attempt], learners: &HashMap<i64, LearnerInfo>) -> QuizAnalytics {
    let submitted: Vec<&Attempt> = attempts
        .iter()
        .filter(|a| a.submitted_at.is_some())
        .collect();

    QuizAnalytics {
        summary: summarize(&submitted),
        by_day: daily_series(&submitted),
        top: top_performers(&submitted, learners),
    }
}

fn summarize(submitted: &[&Attempt]) -> Summary {
    if submitted.is_empty() {
        return Summary::default();
    }

    let count = submitted.len() as i64;
    let score_sum: i64 = submitted.iter().map(|a| a.score).sum();
    let duration_sum: i64 = submitted.iter().map(|a| a.duration_sec).sum();

    Summary {
        total_attempts: count,
        avg_score: score_sum as f64 / count as f64,
        max_score: submitted.iter().map(|a| a.score).max().unwrap_or(0),
        min_score: submitted.iter().map(|a| a.score).min().unwrap_or(0),
        avg_duration: duration_sum as f64 / count as f64,
    }
}

fn daily_series(submitted: &[&Attempt]) -> Vec<DayBucket> {
    // BTreeMap keeps the buckets in ascending date order for free.
    let mut buckets: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for attempt in submitted {
        let Some(submitted_at) = attempt.submitted_at else {
            continue;
        };
        let bucket = buckets.entry(submitted_at.date_naive()).or_insert((0, 0));
        bucket.0 += 1;
        bucket.1 += attempt.score;
    }

    buckets
        .into_iter()
        .take(DAILY_SERIES_DAYS)
        .map(|(date, (attempts, score_sum))| DayBucket {
            date,
            attempts,
            avg_score: score_sum as f64 / attempts as f64,
        })
        .collect()
}

fn top_performers(
    submitted: &[&Attempt],
    learners: &HashMap<i64, LearnerInfo>,
) -> Vec<TopEntry> {
    let mut ranked: Vec<&Attempt> = submitted.to_vec();
    // Score descending, then faster completion first among equal scores.
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.duration_sec.cmp(&b.duration_sec))
    });

    // The learner join happens after the cut: an attempt whose learner no
    // longer resolves is dropped, not backfilled.
    ranked
        .into_iter()
        .take(TOP_PERFORMERS_LIMIT)
        .filter_map(|attempt| {
            learners.get(&attempt.user_id).map(|learner| TopEntry {
                score: attempt.score,
                duration_sec: attempt.duration_sec,
                learner: learner.clone(),
            })
        })
        .collect()
}
