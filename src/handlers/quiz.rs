// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    error::AppError,
    models::quiz::{
        AddQuestionRequest, CreateQuizRequest, PublishRequest, Question, QuestionType, Quiz,
        QuizListItem, QuizListParams, QuizOption, UpdateQuestionRequest, UpdateQuizRequest,
    },
    utils::{html::clean_html, jwt::Claims, policy::ensure_can_manage},
};

pub(crate) const QUIZ_COLUMNS: &str = "id, owner_id, title, description, category, tags, \
     is_published, time_limit_sec, questions, attempt_count, created_at, updated_at";

const LIST_COLUMNS: &str =
    "id, owner_id, title, description, category, tags, is_published, attempt_count, created_at";

/// Fetches a quiz by id or fails with 404.
pub(crate) async fn fetch_quiz(pool: &PgPool, id: i64) -> Result<Quiz, AppError> {
    let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1");
    sqlx::query_as::<_, Quiz>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Persists a quiz's question list and returns the fresh row.
async fn save_questions(
    pool: &PgPool,
    quiz_id: i64,
    questions: &[Question],
) -> Result<Quiz, AppError> {
    let sql = format!(
        "UPDATE quizzes SET questions = $1, updated_at = now()
         WHERE id = $2
         RETURNING {QUIZ_COLUMNS}"
    );
    let quiz = sqlx::query_as::<_, Quiz>(&sql)
        .bind(SqlJson(questions))
        .bind(quiz_id)
        .fetch_one(pool)
        .await?;
    Ok(quiz)
}

fn coerce_question_type(raw: &str) -> QuestionType {
    if raw == "multi" {
        QuestionType::Multi
    } else {
        QuestionType::Single
    }
}

fn clamp_paging(params: &QuizListParams) -> (i64, i64, i64) {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, limit, (page - 1) * limit)
}

/// Creates a new, unpublished quiz with no questions.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let description = clean_html(payload.description.as_deref().unwrap_or(""));
    let category = payload.category.unwrap_or_else(|| "General".to_string());
    let tags = payload.tags.unwrap_or_default();

    let sql = format!(
        "INSERT INTO quizzes (owner_id, title, description, category, tags, time_limit_sec)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {QUIZ_COLUMNS}"
    );
    let quiz = sqlx::query_as::<_, Quiz>(&sql)
        .bind(claims.user_id())
        .bind(payload.title.trim())
        .bind(&description)
        .bind(&category)
        .bind(SqlJson(&tags))
        .bind(payload.time_limit_sec)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Lists published quizzes with paging, category filter and free-text search.
/// Question bodies are never included in listings.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit, offset) = clamp_paging(&params);

    fn apply_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, params: &'a QuizListParams) {
        if let Some(category) = &params.category {
            builder.push(" AND category = ").push_bind(category);
        }
        if let Some(search) = &params.search {
            let pattern = format!("%{}%", search);
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    let mut query = QueryBuilder::<Postgres>::new(format!(
        "SELECT {LIST_COLUMNS} FROM quizzes WHERE is_published = TRUE"
    ));
    apply_filters(&mut query, &params);
    if params.sort.as_deref() == Some("createdAt") {
        query.push(" ORDER BY created_at ASC");
    } else {
        query.push(" ORDER BY created_at DESC");
    }
    query
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let items: Vec<QuizListItem> = query.build_query_as().fetch_all(&pool).await?;

    let mut count_query =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM quizzes WHERE is_published = TRUE");
    apply_filters(&mut count_query, &params);
    let total: i64 = count_query.build_query_scalar().fetch_one(&pool).await?;

    Ok(Json(json!({
        "page": page,
        "limit": limit,
        "total": total,
        "items": items,
    })))
}

/// Lists the caller's own quizzes, newest first.
pub async fn list_my_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit, offset) = clamp_paging(&params);
    let owner_id = claims.user_id();

    let sql = format!(
        "SELECT {LIST_COLUMNS} FROM quizzes
         WHERE owner_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3"
    );
    let items: Vec<QuizListItem> = sqlx::query_as(&sql)
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "page": page,
        "limit": limit,
        "total": total,
        "items": items,
    })))
}

/// Fetches one quiz, including its questions.
/// Unpublished quizzes are only visible to their owner or an admin.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;

    if !quiz.is_published {
        ensure_can_manage(&claims, quiz.owner_id)?;
    }

    Ok(Json(quiz))
}

/// Partial metadata update. Question edits go through the question routes.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut quiz = fetch_quiz(&pool, id).await?;
    ensure_can_manage(&claims, quiz.owner_id)?;

    if let Some(title) = payload.title {
        quiz.title = title.trim().to_string();
    }
    if let Some(description) = payload.description {
        quiz.description = clean_html(&description);
    }
    if let Some(category) = payload.category {
        quiz.category = category;
    }
    if let Some(tags) = payload.tags {
        quiz.tags = SqlJson(tags);
    }
    if let Some(time_limit_sec) = payload.time_limit_sec {
        quiz.time_limit_sec = time_limit_sec;
    }

    let sql = format!(
        "UPDATE quizzes
         SET title = $1, description = $2, category = $3, tags = $4,
             time_limit_sec = $5, updated_at = now()
         WHERE id = $6
         RETURNING {QUIZ_COLUMNS}"
    );
    let quiz = sqlx::query_as::<_, Quiz>(&sql)
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.category)
        .bind(&quiz.tags)
        .bind(quiz.time_limit_sec)
        .bind(id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(quiz))
}

/// Deletes a quiz and every attempt recorded against it.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    ensure_can_manage(&claims, quiz.owner_id)?;

    sqlx::query("DELETE FROM attempts WHERE quiz_id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "ok": true })))
}

/// Sets the publication flag.
pub async fn publish_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<PublishRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    ensure_can_manage(&claims, quiz.owner_id)?;

    let sql = format!(
        "UPDATE quizzes SET is_published = $1, updated_at = now()
         WHERE id = $2
         RETURNING {QUIZ_COLUMNS}"
    );
    let quiz = sqlx::query_as::<_, Quiz>(&sql)
        .bind(payload.is_published)
        .bind(id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(quiz))
}

/// Appends a question to a quiz.
///
/// Question and option ids are minted here and stay stable for the life of
/// the question; they are what correctness is compared against. The correct
/// ids in the payload are taken as-is — clients typically patch them in
/// after seeing the generated option ids.
pub async fn add_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<AddQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = fetch_quiz(&pool, id).await?;
    ensure_can_manage(&claims, quiz.owner_id)?;

    let question = Question {
        id: Uuid::new_v4(),
        question_type: coerce_question_type(&payload.question_type),
        text: clean_html(&payload.text),
        options: payload
            .options
            .into_iter()
            .map(|input| QuizOption {
                id: Uuid::new_v4(),
                text: input.into_text(),
            })
            .collect(),
        correct_option_ids: payload.correct_option_ids,
        points: payload.points.unwrap_or(1),
    };

    let mut questions = quiz.questions.0;
    questions.push(question);
    let quiz = save_questions(&pool, id, &questions).await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Partial update of one question. Replacing the option list mints fresh
/// option ids, which invalidates any previously stored correct ids unless
/// the payload also resets them.
pub async fn update_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid)): Path<(i64, Uuid)>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = fetch_quiz(&pool, id).await?;
    ensure_can_manage(&claims, quiz.owner_id)?;

    let mut questions = quiz.questions.0;
    let question = questions
        .iter_mut()
        .find(|q| q.id == qid)
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    if let Some(text) = payload.text {
        question.text = clean_html(&text);
    }
    if let Some(question_type) = payload.question_type {
        question.question_type = coerce_question_type(&question_type);
    }
    if let Some(options) = payload.options {
        question.options = options
            .into_iter()
            .map(|input| QuizOption {
                id: Uuid::new_v4(),
                text: input.into_text(),
            })
            .collect();
    }
    if let Some(correct_option_ids) = payload.correct_option_ids {
        question.correct_option_ids = correct_option_ids;
    }
    if let Some(points) = payload.points {
        question.points = points;
    }

    let quiz = save_questions(&pool, id, &questions).await?;

    Ok(Json(quiz))
}

/// Removes one question from a quiz. Past attempts keep their scores.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((id, qid)): Path<(i64, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    ensure_can_manage(&claims, quiz.owner_id)?;

    let mut questions = quiz.questions.0;
    let before = questions.len();
    questions.retain(|q| q.id != qid);
    if questions.len() == before {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let quiz = save_questions(&pool, id, &questions).await?;

    Ok(Json(quiz))
}
