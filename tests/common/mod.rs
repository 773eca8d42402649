//! In-process stand-in for the remote habit service.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "token-u1";

#[derive(Default)]
pub struct MockState {
    pub emails: Vec<String>,
    pub habits: Vec<Value>,
    pub next_id: u64,
    pub revoked: bool,
    pub fail_list: bool,
    pub garbled_list: bool,
    pub reset_requests: Vec<String>,
    pub questionnaires: Vec<Value>,
    pub progress_bodies: Vec<Value>,
}

#[derive(Clone)]
pub struct MockApi {
    pub base_url: String,
    pub state: Arc<Mutex<MockState>>,
}

impl MockApi {
    /// Serves on its own thread so it outlives any single test runtime.
    pub fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            emails: vec![EMAIL.to_string()],
            ..Default::default()
        }));
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock api");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let port = listener.local_addr().unwrap().port();

        let app = routes(state.clone());
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("mock runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app).await.expect("mock api stopped");
            });
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}/api"),
            state,
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Adds a habit directly, bypassing the HTTP surface.
    pub fn seed(&self, name: &str, frequency: &str, progress: Vec<Value>) -> String {
        self.with(|state| {
            state.next_id += 1;
            let id = format!("h{}", state.next_id);
            state.habits.push(json!({
                "_id": id,
                "name": name,
                "description": "",
                "category": "Saúde",
                "frequency": frequency,
                "progress": progress,
                "createdAt": "2024-01-01T09:00:00.000Z",
            }));
            id
        })
    }
}

type Shared = Arc<Mutex<MockState>>;

fn routes(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/habits", get(list_habits).post(create_habit))
        .route("/api/habits/:id", axum::routing::delete(delete_habit))
        .route("/api/habits/:id/progress", put(update_progress))
        .route("/api/questionnaire", post(submit_questionnaire))
        .route("/api/questionnaire/history", get(questionnaire_history))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {TOKEN}");
    !state.revoked
        && headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some(expected.as_str())
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let state = state.lock().unwrap();
    let identifier = body["identifier"].as_str().unwrap_or_default();
    if identifier != EMAIL || body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    let completed = !state.questionnaires.is_empty();
    Json(json!({
        "message": "Login successful",
        "token": TOKEN,
        "user": {
            "id": "u1",
            "email": EMAIL,
            "name": "Ana",
            "questionnaireCompleted": completed,
        },
    }))
    .into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if state.emails.contains(&email) {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    state.emails.push(email);
    (StatusCode::CREATED, Json(json!({ "message": "User created" }))).into_response()
}

async fn forgot_password(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if !state.emails.contains(&email) {
        return error(StatusCode::NOT_FOUND, "Email not found");
    }
    state.reset_requests.push(email);
    Json(json!({ "message": "Reset email sent" })).into_response()
}

async fn list_habits(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    if state.fail_list {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    if state.garbled_list {
        return Json(json!({ "message": "temporarily unavailable" })).into_response();
    }
    Json(json!({ "data": state.habits })).into_response()
}

async fn create_habit(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return error(StatusCode::BAD_REQUEST, "name is required");
    }
    state.next_id += 1;
    let mut habit = body;
    habit["_id"] = json!(format!("h{}", state.next_id));
    habit["progress"] = json!([]);
    habit["createdAt"] = json!("2024-01-08T09:00:00.000Z");
    state.habits.push(habit.clone());
    (StatusCode::CREATED, Json(habit)).into_response()
}

async fn update_progress(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    state.progress_bodies.push(body.clone());
    let Some(habit) = state.habits.iter_mut().find(|habit| habit["_id"] == id) else {
        return error(StatusCode::NOT_FOUND, "Habit not found");
    };
    if let Some(progress) = habit["progress"].as_array_mut() {
        progress.push(json!({ "date": body["date"], "completed": body["completed"] }));
    }
    Json(habit.clone()).into_response()
}

async fn delete_habit(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    let before = state.habits.len();
    state.habits.retain(|habit| habit["_id"] != id);
    if state.habits.len() == before {
        return error(StatusCode::NOT_FOUND, "Habit not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn submit_questionnaire(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    state.questionnaires.push(body);
    (StatusCode::CREATED, Json(json!({ "message": "saved" }))).into_response()
}

async fn questionnaire_history(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    Json(json!([
        {
            "generatedHabits": [
                { "_id": "s1", "name": "Drink water", "description": "8 glasses", "category": "Saúde", "frequency": "Todo dia" },
                { "_id": "s2", "name": "Read", "description": "10 pages", "category": "Estudo", "frequency": "Todo dia" },
                { "_id": "s3", "name": "Walk", "description": "", "category": "Saúde", "frequency": "Semanal" },
            ]
        },
        { "generatedHabits": [ { "_id": "old", "name": "Old idea" } ] },
    ]))
    .into_response()
}
