use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chartquiz_core::api::error::ApiStatusError;
use chartquiz_core::api::{HttpQuizApi, QuizApi};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct StubState {
    history_calls: Arc<AtomicUsize>,
    last_answer: Arc<std::sync::Mutex<Option<Value>>>,
}

async fn get_quiz(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let id = match q.get("round").map(String::as_str) {
        Some("4") => 40,
        _ => 1,
    };
    Json(json!([{
        "id": id,
        "question": "Which company?",
        "options": [],
        "correctAnswer": "Samsung Electronics",
        "quiz_data": "[{\"date\":\"2025-01-02\",\"open_price\":\"100\",\"high_price\":\"110\",\"low_price\":\"90\",\"close_price\":\"105\"}]",
        "hint": "[\"Semiconductors\"]"
    }]))
}

// Fails once with 503, then succeeds.
async fn get_history(State(state): State<StubState>) -> (StatusCode, Json<Value>) {
    if state.history_calls.fetch_add(1, Ordering::SeqCst) == 0 {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"is_success": false})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "is_success": true,
            "history": [
                {"created_at": "2025-02-03T00:00:00Z", "round": 3},
                {"created_at": "2025-02-10T00:00:00Z", "round": "4"}
            ]
        })),
    )
}

async fn stock_list() -> Json<Value> {
    Json(json!({"is_success": true, "list": ["Samsung Electronics", "SK hynix", 7]}))
}

async fn check_answer(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    *state.last_answer.lock().unwrap() = Some(body.clone());
    if body["answer"] == "Samsung Electronics" {
        (StatusCode::OK, Json(json!({"is_success": true})))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"is_success": false, "message": "wrong answer"})),
        )
    }
}

async fn spawn_stub() -> (String, StubState) {
    let state = StubState::default();
    let app = Router::new()
        .route("/api/quiz/getQuiz", get(get_quiz))
        .route("/api/quiz/getQuizHistory", get(get_history))
        .route("/api/quiz/stockList", get(stock_list))
        .route("/api/quiz/checkAnswer", post(check_answer))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), state)
}

fn client(base_url: &str, retries: u32) -> HttpQuizApi {
    HttpQuizApi::new(base_url, Duration::from_secs(5), retries).unwrap()
}

#[tokio::test]
async fn fetches_current_and_round_quiz_sets() {
    let (base, _) = spawn_stub().await;
    let api = client(&base, 1);

    let current = api.fetch_current_quiz_set().await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, 1);
    assert_eq!(current[0].candles().unwrap()[0].close, 105.0);

    let round = api.fetch_round_quiz_set(4).await.unwrap();
    assert_eq!(round[0].id, 40);
}

#[tokio::test]
async fn retries_transient_history_failure() {
    let (base, state) = spawn_stub().await;
    let api = client(&base, 2);

    let history = api.fetch_history().await.unwrap();
    assert_eq!(history.iter().map(|h| h.round).collect::<Vec<_>>(), vec![3, 4]);
    assert_eq!(state.history_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn gives_up_after_configured_retries() {
    let (base, state) = spawn_stub().await;
    let api = client(&base, 1);

    let err = api.fetch_history().await.unwrap_err();
    let status = err.downcast_ref::<ApiStatusError>().unwrap();
    assert_eq!(status.status, StatusCode::SERVICE_UNAVAILABLE.as_u16());
    assert_eq!(state.history_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_route_is_not_retried() {
    let (base, _) = spawn_stub().await;
    let api = client(&format!("{base}/missing"), 3);

    let err = api.fetch_current_quiz_set().await.unwrap_err();
    let status = err.downcast_ref::<ApiStatusError>().unwrap();
    assert_eq!(status.status, 404);
    assert!(!status.is_retryable());
}

#[tokio::test]
async fn stock_list_keeps_only_names() {
    let (base, _) = spawn_stub().await;
    let names = client(&base, 1).fetch_stock_list().await.unwrap();
    assert_eq!(names, vec!["Samsung Electronics", "SK hynix"]);
}

#[tokio::test]
async fn check_answer_posts_camel_case_and_reads_verdict_on_any_status() {
    let (base, state) = spawn_stub().await;
    let api = client(&base, 1);

    let right = api.check_answer(1, "Samsung Electronics").await.unwrap();
    assert!(right.is_success);
    assert_eq!(
        state.last_answer.lock().unwrap().clone().unwrap(),
        json!({"quizId": 1, "answer": "Samsung Electronics"})
    );

    let wrong = api.check_answer(1, "Kakao").await.unwrap();
    assert!(!wrong.is_success);
    assert_eq!(wrong.extra.get("message"), Some(&json!("wrong answer")));
}
