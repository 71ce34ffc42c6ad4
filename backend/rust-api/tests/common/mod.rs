#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use exam_delivery_api::{config::Config, create_router, services::AppState};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::sync::Arc;
use tower::ServiceExt;

pub const PREFIX: &str = "mdl_";

const SCHEMA: &[&str] = &[
    "CREATE TABLE mdl_quiz_attempts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        quiz INTEGER NOT NULL DEFAULT 1,
        userid INTEGER NOT NULL,
        uniqueid INTEGER NOT NULL,
        timemodified INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE mdl_question_attempts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        questionusageid INTEGER NOT NULL,
        slot INTEGER NOT NULL,
        questionid INTEGER NOT NULL,
        maxmark NUMERIC NOT NULL,
        UNIQUE (questionusageid, slot)
    )",
    "CREATE TABLE mdl_question (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        qtype TEXT NOT NULL,
        questiontext TEXT NOT NULL
    )",
    "CREATE TABLE mdl_question_answers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question INTEGER NOT NULL,
        answer TEXT NOT NULL,
        fraction NUMERIC NOT NULL DEFAULT 0
    )",
    "CREATE TABLE mdl_question_attempt_steps (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        questionattemptid INTEGER NOT NULL,
        sequencenumber INTEGER NOT NULL,
        state TEXT NOT NULL,
        fraction NUMERIC,
        timecreated INTEGER NOT NULL,
        userid INTEGER,
        UNIQUE (questionattemptid, sequencenumber)
    )",
    "CREATE TABLE mdl_question_attempt_step_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        attemptstepid INTEGER NOT NULL,
        name TEXT NOT NULL,
        value TEXT
    )",
];

/// In-memory LMS database with the question engine tables
pub async fn create_test_pool() -> AnyPool {
    sqlx::any::install_default_drivers();

    // One long-lived connection: every new sqlite memory connection is a fresh database
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Failed to create LMS schema");
    }

    pool
}

pub fn test_config() -> Config {
    Config {
        lms_db_url: "sqlite::memory:".to_string(),
        table_prefix: PREFIX.to_string(),
        ..Config::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub pool: AnyPool,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(test_config()).await
}

pub async fn create_test_app_with(config: Config) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let pool = create_test_pool().await;
    let state = Arc::new(AppState::new(config, pool.clone()));

    TestApp {
        router: create_router(state.clone()),
        state,
        pool,
    }
}

pub async fn insert_attempt(pool: &AnyPool, user_id: i64, usage_id: i64) -> i64 {
    sqlx::query_scalar("INSERT INTO mdl_quiz_attempts (userid, uniqueid) VALUES (?, ?) RETURNING id")
        .bind(user_id)
        .bind(usage_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn insert_question(pool: &AnyPool, qtype: &str, text: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO mdl_question (qtype, questiontext) VALUES (?, ?) RETURNING id")
        .bind(qtype)
        .bind(text)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn insert_option(pool: &AnyPool, question_id: i64, answer: &str, fraction: f64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO mdl_question_answers (question, answer, fraction) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(question_id)
    .bind(answer)
    .bind(fraction)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_question_attempt(
    pool: &AnyPool,
    usage_id: i64,
    slot: i64,
    question_id: i64,
    max_mark: f64,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO mdl_question_attempts (questionusageid, slot, questionid, maxmark) \
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(usage_id)
    .bind(slot)
    .bind(question_id)
    .bind(max_mark)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Attempt with a multichoice question in slot 1; returns (attempt_id, question_attempt_id, option ids)
pub async fn seed_multichoice(pool: &AnyPool, usage_id: i64, options: &[&str]) -> (i64, i64, Vec<i64>) {
    let attempt_id = insert_attempt(pool, 5, usage_id).await;
    let question_id = insert_question(pool, "multichoice", "<p>Which planet is largest?</p>").await;
    let mut option_ids = Vec::new();
    for (i, answer) in options.iter().enumerate() {
        let fraction = if i == 0 { 1.0 } else { 0.0 };
        option_ids.push(insert_option(pool, question_id, answer, fraction).await);
    }
    let question_attempt_id = insert_question_attempt(pool, usage_id, 1, question_id, 2.5).await;
    (attempt_id, question_attempt_id, option_ids)
}

/// Attempt with an essay question in slot 1; returns (attempt_id, question_attempt_id)
pub async fn seed_essay(pool: &AnyPool, usage_id: i64) -> (i64, i64) {
    let attempt_id = insert_attempt(pool, 5, usage_id).await;
    let question_id = insert_question(pool, "essay", "<p>Explain orbital resonance.</p>").await;
    let question_attempt_id = insert_question_attempt(pool, usage_id, 1, question_id, 10.0).await;
    (attempt_id, question_attempt_id)
}

pub async fn post_json(router: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub async fn step_count(pool: &AnyPool, question_attempt_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM mdl_question_attempt_steps WHERE questionattemptid = ?")
        .bind(question_attempt_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
