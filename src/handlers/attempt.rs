// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{PgPool, types::Json as SqlJson};

use crate::{
    config::MY_ATTEMPTS_LIMIT,
    error::AppError,
    handlers::quiz::fetch_quiz,
    models::attempt::{Attempt, AttemptHistoryEntry, SubmitAttemptRequest},
    scoring::compute_score,
    utils::jwt::Claims,
};

const ATTEMPT_COLUMNS: &str = "id, quiz_id, user_id, answers, score, max_score, \
     started_at, submitted_at, duration_sec, created_at";

/// Submits an attempt against a published quiz.
///
/// The submission is scored exactly once, here, against the quiz's current
/// question list; the stored attempt is a point-in-time record and later
/// quiz edits never rescore it. Missing timestamps default to "submitted
/// now"; the derived duration is clamped to be non-negative.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    if !quiz.is_published {
        return Err(AppError::Forbidden("Quiz not published".to_string()));
    }

    let result = compute_score(&quiz.questions.0, &payload.answers);

    let submitted_at = payload.submitted_at.unwrap_or_else(Utc::now);
    let duration_sec = payload
        .started_at
        .map(|started| (submitted_at - started).num_seconds().max(0))
        .unwrap_or(0);

    let sql = format!(
        "INSERT INTO attempts
             (quiz_id, user_id, answers, score, max_score, started_at, submitted_at, duration_sec)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {ATTEMPT_COLUMNS}"
    );
    let attempt = sqlx::query_as::<_, Attempt>(&sql)
        .bind(id)
        .bind(claims.user_id())
        .bind(SqlJson(&payload.answers))
        .bind(result.score)
        .bind(result.max_score)
        .bind(payload.started_at)
        .bind(submitted_at)
        .bind(duration_sec)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record attempt: {:?}", e);
            AppError::from(e)
        })?;

    sqlx::query("UPDATE quizzes SET attempt_count = attempt_count + 1 WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Lists the caller's attempts, newest first, with quiz metadata joined.
pub async fn my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let entries: Vec<AttemptHistoryEntry> = sqlx::query_as(
        "SELECT a.id, a.quiz_id, q.title AS quiz_title, q.category AS quiz_category,
                a.score, a.max_score, a.duration_sec, a.submitted_at
         FROM attempts a
         JOIN quizzes q ON a.quiz_id = q.id
         WHERE a.user_id = $1
         ORDER BY a.submitted_at DESC
         LIMIT $2",
    )
    .bind(claims.user_id())
    .bind(MY_ATTEMPTS_LIMIT)
    .fetch_all(&pool)
    .await?;

    Ok(Json(entries))
}
