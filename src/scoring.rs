// src/scoring.rs

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::models::{attempt::Answer, quiz::Question};

/// Result of scoring one submission against one quiz snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: i64,
    pub max_score: i64,
}

/// Scores a raw answer submission against a quiz's current question list.
///
/// Pure function: no I/O, no side effects, same inputs always produce the
/// same result. Every question contributes its points to `max_score`
/// whether or not it was answered; a question scores its points iff the
/// selected option-id set is exactly equal to the correct option-id set.
/// This exact-match rule applies uniformly to 'single' and 'multi'
/// questions, and there is no partial credit.
///
/// Duplicate answers for the same question collapse to the last one seen.
/// Option ids that do not belong to the question are not rejected; they
/// simply can never satisfy the equality test.
pub fn compute_score(questions: &[Question], answers: &[Answer]) -> ScoreResult {
    let mut selections: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for answer in answers {
        selections.insert(
            answer.question_id,
            answer.selected_option_ids.iter().copied().collect(),
        );
    }

    let empty = HashSet::new();
    let mut score = 0;
    let mut max_score = 0;

    for question in questions {
        max_score += question.points;

        let correct: HashSet<Uuid> = question.correct_option_ids.iter().copied().collect();
        let selected = selections.get(&question.id).unwrap_or(&empty);

        // Set equality: same cardinality, every selected id is correct.
        // A question with no correct options is correct only against an
        // empty selection (both sets empty).
        if *selected == correct {
            score += question.points;
        }
    }

    ScoreResult { score, max_score }
}
