// src/models/attempt.rs

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use uuid::Uuid;

/// One answered question within a submission: the question id plus the set
/// of option ids the learner selected for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: Uuid,
    #[serde(default)]
    pub selected_option_ids: Vec<Uuid>,
}

/// Represents the 'attempts' table in the database.
/// An attempt is a point-in-time record of what was scored and when; it is
/// never edited after creation, only deleted along with its quiz.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub answers: Json<Vec<Answer>>,
    pub score: i64,
    pub max_score: i64,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_sec: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for submitting an attempt.
///
/// The answers field is deliberately lenient: a missing or non-array value
/// degrades to "no answers" and entries that do not parse are skipped, so a
/// malformed submission is scored as all-unanswered rather than rejected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    #[serde(default, deserialize_with = "lenient_answers")]
    pub answers: Vec<Answer>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn lenient_answers<'de, D>(deserializer: D) -> Result<Vec<Answer>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Row for the attempt-history endpoint: attempt plus joined quiz metadata.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptHistoryEntry {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub quiz_category: String,
    pub score: i64,
    pub max_score: i64,
    pub duration_sec: i64,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_answers_field_degrades_to_empty() {
        let req: SubmitAttemptRequest = serde_json::from_str("{}").unwrap();
        assert!(req.answers.is_empty());
    }

    #[test]
    fn non_array_answers_degrade_to_empty() {
        let req: SubmitAttemptRequest =
            serde_json::from_str(r#"{"answers": "garbage"}"#).unwrap();
        assert!(req.answers.is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let qid = Uuid::new_v4();
        let body = serde_json::json!({
            "answers": [
                { "questionId": qid, "selectedOptionIds": [] },
                { "noQuestionId": true },
                42
            ]
        });
        let req: SubmitAttemptRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.answers.len(), 1);
        assert_eq!(req.answers[0].question_id, qid);
    }
}
