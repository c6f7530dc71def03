// src/handlers/analytics.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{FromRow, PgPool};

use crate::{
    analytics::{LearnerInfo, aggregate},
    error::AppError,
    handlers::quiz::fetch_quiz,
    models::attempt::Attempt,
    utils::{jwt::Claims, policy::ensure_can_manage},
};

/// Row for the learner-identity join.
#[derive(FromRow)]
struct LearnerRow {
    id: i64,
    name: String,
    email: String,
}

/// Aggregate analytics for one quiz: summary statistics, a daily series of
/// attempt volume and average score, and the top-performer leaderboard.
///
/// Only the quiz owner or an admin may read it. The handler materializes a
/// snapshot (submitted attempts + learner identities) and hands it to the
/// pure aggregator; everything is recomputed per request, never cached.
pub async fn quiz_analytics(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    ensure_can_manage(&claims, quiz.owner_id)?;

    let attempts: Vec<Attempt> = sqlx::query_as(
        "SELECT id, quiz_id, user_id, answers, score, max_score,
                started_at, submitted_at, duration_sec, created_at
         FROM attempts
         WHERE quiz_id = $1 AND submitted_at IS NOT NULL",
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch attempts for analytics: {:?}", e);
        AppError::from(e)
    })?;

    let learner_rows: Vec<LearnerRow> = sqlx::query_as(
        "SELECT DISTINCT u.id, u.name, u.email
         FROM users u
         JOIN attempts a ON a.user_id = u.id
         WHERE a.quiz_id = $1",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let learners: HashMap<i64, LearnerInfo> = learner_rows
        .into_iter()
        .map(|row| {
            (
                row.id,
                LearnerInfo {
                    name: row.name,
                    email: row.email,
                },
            )
        })
        .collect();

    let analytics = aggregate(&attempts, &learners);

    Ok(Json(json!({
        "quiz": { "id": quiz.id, "title": quiz.title },
        "analytics": analytics,
    })))
}
