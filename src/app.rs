use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route("/register", post(handlers::register_submit))
        .route(
            "/forgot-password",
            get(handlers::forgot_password_page).post(handlers::forgot_password_submit),
        )
        .route("/logout", post(handlers::logout_submit))
        .route("/habits", post(handlers::create_habit_submit))
        .route("/habits/:id/toggle", post(handlers::toggle_submit))
        .route("/habits/:id/delete", post(handlers::delete_submit))
        .route("/habits/:id/notes", post(handlers::notes_submit))
        .route("/api/session", get(handlers::api_session))
        .route("/api/session/login", post(handlers::api_login))
        .route("/api/session/register", post(handlers::api_register))
        .route("/api/session/logout", post(handlers::api_logout))
        .route(
            "/api/session/forgot-password",
            post(handlers::api_forgot_password),
        )
        .route(
            "/api/habits",
            get(handlers::api_list_habits).post(handlers::api_create_habit),
        )
        .route("/api/habits/:id", axum::routing::delete(handlers::api_delete))
        .route("/api/habits/:id/toggle", post(handlers::api_toggle))
        .route("/api/habits/:id/notes", put(handlers::api_update_notes))
        .route("/api/notices", get(handlers::api_notices))
        .route(
            "/api/onboarding/questionnaire",
            post(handlers::api_submit_questionnaire),
        )
        .route("/api/onboarding/adopt", post(handlers::api_adopt))
        .with_state(state)
}
