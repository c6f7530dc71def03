// tests/api_tests.rs

use quizhub::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    // 1. Create a pool
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        admin_name: None,
        admin_email: None,
        admin_password: None,
    };

    let state = AppState { pool, config };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_email(prefix: &str) -> String {
    format!(
        "{}_{}@example.com",
        prefix,
        &uuid::Uuid::new_v4().to_string()[..8]
    )
}

/// Registers a user and returns (token, user json).
async fn register_user(
    client: &reqwest::Client,
    address: &str,
    name: &str,
    email: &str,
    role: Option<&str>,
) -> (String, serde_json::Value) {
    let mut body = serde_json::json!({
        "name": name,
        "email": email,
        "password": "password123"
    });
    if let Some(role) = role {
        body["role"] = serde_json::json!(role);
    }

    let response = client
        .post(format!("{}/api/v1/auth/register", address))
        .json(&body)
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);

    let json: serde_json::Value = response.json().await.unwrap();
    let token = json["token"].as_str().expect("Token not found").to_string();
    (token, json["user"].clone())
}

#[tokio::test]
async fn health_check_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/v1/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn register_and_login_work() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("reg");

    let (_, user) = register_user(&client, &address, "Reg Tester", &email, None).await;
    assert_eq!(user["email"], email);
    assert_eq!(user["role"], "student");

    let response = client
        .post(format!("{}/api/v1/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(response.status().as_u16(), 200);

    let json: serde_json::Value = response.json().await.unwrap();
    assert!(json["token"].as_str().is_some());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("dup");

    register_user(&client, &address, "First", &email, None).await;

    let response = client
        .post(format!("{}/api/v1/auth/register", address))
        .json(&serde_json::json!({
            "name": "Second",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Password too short
    let response = client
        .post(format!("{}/api/v1/auth/register", address))
        .json(&serde_json::json!({
            "name": "Shorty",
            "email": unique_email("short"),
            "password": "abc"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn quiz_authoring_requires_admin() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (student_token, _) =
        register_user(&client, &address, "Student", &unique_email("stu"), None).await;

    let response = client
        .post(format!("{}/api/v1/quizzes", address))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&serde_json::json!({ "title": "Not allowed" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn full_quiz_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // 1. Register an owner (admin) and two learners
    let (owner_token, _) = register_user(
        &client,
        &address,
        "Owner",
        &unique_email("owner"),
        Some("admin"),
    )
    .await;
    let (fast_token, _) =
        register_user(&client, &address, "Fast Learner", &unique_email("fast"), None).await;
    let (slow_token, _) =
        register_user(&client, &address, "Slow Learner", &unique_email("slow"), None).await;

    // 2. Create a quiz
    let quiz: serde_json::Value = client
        .post(format!("{}/api/v1/quizzes", address))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({
            "title": "Capitals",
            "description": "European capitals",
            "category": "Geography"
        }))
        .send()
        .await
        .expect("Create quiz failed")
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["id"].as_i64().expect("Quiz id missing");
    assert_eq!(quiz["isPublished"], false);

    // 3. Add a question (options as plain strings), worth 2 points
    let quiz: serde_json::Value = client
        .post(format!("{}/api/v1/quizzes/{}/questions", address, quiz_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({
            "type": "single",
            "text": "Capital of France?",
            "options": ["Paris", "London", "Berlin"],
            "points": 2
        }))
        .send()
        .await
        .expect("Add question failed")
        .json()
        .await
        .unwrap();

    let question = &quiz["questions"][0];
    let question_id = question["id"].as_str().unwrap().to_string();
    let paris_id = question["options"][0]["id"].as_str().unwrap().to_string();
    let london_id = question["options"][1]["id"].as_str().unwrap().to_string();
    assert_eq!(question["options"][0]["text"], "Paris");

    // 4. Mark the correct option now that option ids are known
    let response = client
        .patch(format!(
            "{}/api/v1/quizzes/{}/questions/{}",
            address, quiz_id, question_id
        ))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "correctOptionIds": [paris_id] }))
        .send()
        .await
        .expect("Update question failed");
    assert_eq!(response.status().as_u16(), 200);

    // 5. Submitting against the unpublished quiz is forbidden
    let response = client
        .post(format!("{}/api/v1/quizzes/{}/attempts", address, quiz_id))
        .header("Authorization", format!("Bearer {}", fast_token))
        .json(&serde_json::json!({ "answers": [] }))
        .send()
        .await
        .expect("Submit failed");
    assert_eq!(response.status().as_u16(), 403);

    // 6. Publish
    let response = client
        .patch(format!("{}/api/v1/quizzes/{}/publish", address, quiz_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "isPublished": true }))
        .send()
        .await
        .expect("Publish failed");
    assert_eq!(response.status().as_u16(), 200);

    // 7. Fast learner answers correctly in 30 seconds
    let attempt: serde_json::Value = client
        .post(format!("{}/api/v1/quizzes/{}/attempts", address, quiz_id))
        .header("Authorization", format!("Bearer {}", fast_token))
        .json(&serde_json::json!({
            "answers": [{ "questionId": question_id, "selectedOptionIds": [paris_id] }],
            "startedAt": "2026-03-01T10:00:00Z",
            "submittedAt": "2026-03-01T10:00:30Z"
        }))
        .send()
        .await
        .expect("Submit failed")
        .json()
        .await
        .unwrap();
    assert_eq!(attempt["score"], 2);
    assert_eq!(attempt["maxScore"], 2);
    assert_eq!(attempt["durationSec"], 30);

    // 8. Slow learner answers wrong
    let attempt: serde_json::Value = client
        .post(format!("{}/api/v1/quizzes/{}/attempts", address, quiz_id))
        .header("Authorization", format!("Bearer {}", slow_token))
        .json(&serde_json::json!({
            "answers": [{ "questionId": question_id, "selectedOptionIds": [london_id] }],
            "startedAt": "2026-03-01T11:00:00Z",
            "submittedAt": "2026-03-01T11:02:00Z"
        }))
        .send()
        .await
        .expect("Submit failed")
        .json()
        .await
        .unwrap();
    assert_eq!(attempt["score"], 0);
    assert_eq!(attempt["maxScore"], 2);

    // 9. A learner may not read analytics
    let response = client
        .get(format!("{}/api/v1/quizzes/{}/analytics", address, quiz_id))
        .header("Authorization", format!("Bearer {}", fast_token))
        .send()
        .await
        .expect("Analytics request failed");
    assert_eq!(response.status().as_u16(), 403);

    // 10. The owner reads analytics
    let body: serde_json::Value = client
        .get(format!("{}/api/v1/quizzes/{}/analytics", address, quiz_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .send()
        .await
        .expect("Analytics request failed")
        .json()
        .await
        .unwrap();

    assert_eq!(body["quiz"]["title"], "Capitals");
    let analytics = &body["analytics"];
    assert_eq!(analytics["summary"]["totalAttempts"], 2);
    assert_eq!(analytics["summary"]["avgScore"], 1.0);
    assert_eq!(analytics["summary"]["maxScore"], 2);
    assert_eq!(analytics["summary"]["minScore"], 0);
    assert_eq!(analytics["byDay"].as_array().unwrap().len(), 1);
    assert_eq!(analytics["byDay"][0]["date"], "2026-03-01");
    assert_eq!(analytics["byDay"][0]["attempts"], 2);
    assert_eq!(analytics["top"][0]["score"], 2);
    assert_eq!(analytics["top"][0]["learner"]["name"], "Fast Learner");

    // 11. The learner sees their attempt history
    let history: serde_json::Value = client
        .get(format!("{}/api/v1/me/attempts", address))
        .header("Authorization", format!("Bearer {}", fast_token))
        .send()
        .await
        .expect("History request failed")
        .json()
        .await
        .unwrap();
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["quizTitle"], "Capitals");
    assert_eq!(entries[0]["score"], 2);
}

#[tokio::test]
async fn malformed_answers_degrade_to_zero_score() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_user(
        &client,
        &address,
        "Owner",
        &unique_email("mal"),
        Some("admin"),
    )
    .await;

    let quiz: serde_json::Value = client
        .post(format!("{}/api/v1/quizzes", address))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "title": "Lenient" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["id"].as_i64().unwrap();

    let quiz: serde_json::Value = client
        .post(format!("{}/api/v1/quizzes/{}/questions", address, quiz_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({
            "type": "single",
            "text": "Anything?",
            "options": ["Yes", "No"]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let question_id = quiz["questions"][0]["id"].as_str().unwrap().to_string();
    let yes_id = quiz["questions"][0]["options"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Mark "Yes" correct so an empty selection is actually wrong.
    client
        .patch(format!(
            "{}/api/v1/quizzes/{}/questions/{}",
            address, quiz_id, question_id
        ))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "correctOptionIds": [yes_id] }))
        .send()
        .await
        .unwrap();

    client
        .patch(format!("{}/api/v1/quizzes/{}/publish", address, quiz_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "isPublished": true }))
        .send()
        .await
        .unwrap();

    // Non-array answers are treated as "no answers", not rejected.
    let attempt: serde_json::Value = client
        .post(format!("{}/api/v1/quizzes/{}/attempts", address, quiz_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "answers": "garbage" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(attempt["score"], 0);
    assert_eq!(attempt["maxScore"], 1);
}
