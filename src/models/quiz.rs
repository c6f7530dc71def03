// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use uuid::Uuid;
use validator::Validate;

/// Question type: exactly one correct option is logically expected for
/// 'single'; 'multi' allows any-size correct subset. Scoring treats both
/// identically (exact set match), so the type is informational for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multi,
}

/// One selectable option of a question. The id is minted when the option is
/// created and is stable for the life of the question; correctness is always
/// compared by option id, never by text or position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub id: Uuid,
    pub text: String,
}

/// A question embedded in a quiz. Stored inside the quiz row as JSONB,
/// mirroring the document shape this service was ported from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    #[serde(default)]
    pub options: Vec<QuizOption>,
    /// Option ids marked correct. May be empty: such a question is only
    /// correct against an empty selection.
    #[serde(default)]
    pub correct_option_ids: Vec<Uuid>,
    #[serde(default = "default_points")]
    pub points: i64,
}

fn default_points() -> i64 {
    1
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Json<Vec<String>>,
    pub is_published: bool,
    pub time_limit_sec: Option<i64>,
    pub questions: Json<Vec<Question>>,
    pub attempt_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Listing row: quiz metadata without the question bodies.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizListItem {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Json<Vec<String>>,
    pub is_published: bool,
    pub attempt_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new quiz. Quizzes start unpublished with no questions.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Title required."))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub time_limit_sec: Option<i64>,
}

/// DTO for partial quiz metadata updates.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Double Option so `"timeLimitSec": null` clears the limit while an
    /// absent field leaves it untouched.
    #[serde(default, deserialize_with = "deserialize_explicit")]
    pub time_limit_sec: Option<Option<i64>>,
}

fn deserialize_explicit<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub is_published: bool,
}

/// Options may be submitted as plain strings or `{ "text": ... }` objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OptionInput {
    Text(String),
    Object { text: String },
}

impl OptionInput {
    pub fn into_text(self) -> String {
        match self {
            OptionInput::Text(text) => text,
            OptionInput::Object { text } => text,
        }
    }
}

/// DTO for adding a question to a quiz. Option ids are minted server-side;
/// correct ids default to empty and are usually patched in afterwards, once
/// the client has seen the generated option ids.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionRequest {
    #[serde(rename = "type")]
    pub question_type: String,
    #[validate(length(min = 1, max = 2000, message = "Question text required."))]
    pub text: String,
    #[serde(default)]
    pub options: Vec<OptionInput>,
    #[serde(default)]
    pub correct_option_ids: Vec<Uuid>,
    #[validate(range(min = 0))]
    pub points: Option<i64>,
}

/// DTO for partial question updates. Replacing options mints fresh ids.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    #[serde(rename = "type")]
    pub question_type: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub text: Option<String>,
    pub options: Option<Vec<OptionInput>>,
    pub correct_option_ids: Option<Vec<Uuid>>,
    #[validate(range(min = 0))]
    pub points: Option<i64>,
}

/// Query parameters for quiz listings.
#[derive(Debug, Deserialize)]
pub struct QuizListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}
