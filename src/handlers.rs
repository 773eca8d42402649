use crate::errors::{AppError, HabitError};
use crate::manager::LOGIN_PATH;
use crate::models::{
    AdoptionReport, Category, Credentials, Frequency, HabitForm, NormalizedHabit,
    PasswordResetRequest, Profile, QuestionnaireAnswers, Registration, SuggestedHabit,
    ToggleOutcome,
};
use crate::notify::{Notification, Notifier};
use crate::state::AppState;
use crate::ui::{render_dashboard, render_forgot_password, render_login};
use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const FORGOT_PASSWORD_PATH: &str = "/forgot-password";

/// Raw dashboard form; empty inputs arrive as empty strings.
#[derive(Debug, Deserialize)]
pub struct HabitFormFields {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub frequency: String,
}

impl HabitFormFields {
    fn into_form(self) -> HabitForm {
        HabitForm {
            goal: self.goal.trim().parse().ok(),
            category: Category::parse_lenient(&self.category),
            frequency: Frequency::parse_lenient(&self.frequency),
            title: self.title,
            description: self.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NotesFields {
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct AdoptRequest {
    pub habits: Vec<SuggestedHabit>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub authenticated: bool,
    pub needs_onboarding: bool,
    pub profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub outcome: ToggleOutcome,
    pub habit: Option<NormalizedHabit>,
}

pub async fn index(State(state): State<AppState>) -> Response {
    if !state.session.is_authenticated().await {
        return Redirect::to(LOGIN_PATH).into_response();
    }
    if let Err(err) = state.habits.load().await {
        if matches!(err, HabitError::Unauthorized) {
            return follow(&state, LOGIN_PATH);
        }
        debug!(error = %err, "rendering dashboard with previous habits");
    }

    let habits = state.habits.habits().await;
    let profile = state.session.profile().await;
    let notices = state.notices.drain();
    Html(render_dashboard(
        &habits,
        profile.as_ref(),
        &notices,
        state.habits.today(),
    ))
    .into_response()
}

pub async fn login_page(State(state): State<AppState>) -> Response {
    if state.session.is_authenticated().await {
        return Redirect::to("/").into_response();
    }
    state.redirects.take();
    Html(render_login(&state.notices.drain())).into_response()
}

pub async fn login_submit(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> Redirect {
    match state.account.login(&credentials).await {
        Ok(_) => {
            state.redirects.take();
            Redirect::to("/")
        }
        Err(err) => {
            debug!(error = %err, "login rejected");
            Redirect::to(LOGIN_PATH)
        }
    }
}

pub async fn register_submit(
    State(state): State<AppState>,
    Form(registration): Form<Registration>,
) -> Redirect {
    if let Err(err) = state.account.register(&registration).await {
        debug!(error = %err, "registration rejected");
    }
    Redirect::to(LOGIN_PATH)
}

pub async fn forgot_password_page(State(state): State<AppState>) -> Html<String> {
    Html(render_forgot_password(&state.notices.drain()))
}

pub async fn forgot_password_submit(
    State(state): State<AppState>,
    Form(request): Form<PasswordResetRequest>,
) -> Redirect {
    match state.account.request_password_reset(&request.email).await {
        Ok(()) => Redirect::to(LOGIN_PATH),
        Err(err) => {
            debug!(error = %err, "password reset rejected");
            Redirect::to(FORGOT_PASSWORD_PATH)
        }
    }
}

pub async fn logout_submit(State(state): State<AppState>) -> Response {
    if let Err(err) = state.account.logout().await {
        debug!(error = %err, "logout failed");
    }
    follow(&state, LOGIN_PATH)
}

pub async fn create_habit_submit(
    State(state): State<AppState>,
    Form(fields): Form<HabitFormFields>,
) -> Response {
    match state.habits.create(&fields.into_form()).await {
        Err(HabitError::Validation(message)) => {
            state
                .notices
                .notify(Notification::destructive("Invalid habit", message));
        }
        Err(err) => debug!(error = %err, "create failed"),
        Ok(()) => {}
    }
    follow(&state, "/")
}

pub async fn toggle_submit(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if let Err(err) = state.habits.toggle_completion(&id).await {
        debug!(error = %err, habit_id = %id, "toggle failed");
    }
    follow(&state, "/")
}

pub async fn delete_submit(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if let Err(err) = state.habits.delete_habit(&id).await {
        debug!(error = %err, habit_id = %id, "delete failed");
    }
    follow(&state, "/")
}

pub async fn notes_submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<NotesFields>,
) -> Response {
    if let Err(err) = state.habits.update_notes(&id, &fields.notes).await {
        debug!(error = %err, habit_id = %id, "notes update failed");
    }
    follow(&state, "/")
}

pub async fn api_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(SessionView {
        authenticated: state.session.is_authenticated().await,
        needs_onboarding: state.account.needs_onboarding().await,
        profile: state.session.profile().await,
    })
}

pub async fn api_login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Profile>, AppError> {
    let profile = state.account.login(&credentials).await?;
    state.redirects.take();
    Ok(Json(profile))
}

pub async fn api_register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> Result<StatusCode, AppError> {
    state.account.register(&registration).await?;
    Ok(StatusCode::CREATED)
}

pub async fn api_forgot_password(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<StatusCode, AppError> {
    state.account.request_password_reset(&request.email).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn api_logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.account.logout().await?;
    state.redirects.take();
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_list_habits(
    State(state): State<AppState>,
) -> Result<Json<Vec<NormalizedHabit>>, AppError> {
    state.habits.load().await?;
    Ok(Json(state.habits.habits().await))
}

pub async fn api_create_habit(
    State(state): State<AppState>,
    Json(form): Json<HabitForm>,
) -> Result<(StatusCode, Json<Vec<NormalizedHabit>>), AppError> {
    state.habits.create(&form).await?;
    Ok((StatusCode::CREATED, Json(state.habits.habits().await)))
}

pub async fn api_toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let outcome = state.habits.toggle_completion(&id).await?;
    Ok(Json(ToggleResponse {
        outcome,
        habit: state.habits.habit(&id).await,
    }))
}

pub async fn api_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.habits.delete_habit(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_update_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<NotesFields>,
) -> Result<Json<NormalizedHabit>, AppError> {
    Ok(Json(state.habits.update_notes(&id, &fields.notes).await?))
}

pub async fn api_notices(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notices.drain())
}

pub async fn api_submit_questionnaire(
    State(state): State<AppState>,
    Json(answers): Json<QuestionnaireAnswers>,
) -> Result<Json<Vec<SuggestedHabit>>, AppError> {
    Ok(Json(state.account.submit_questionnaire(&answers).await?))
}

pub async fn api_adopt(
    State(state): State<AppState>,
    Json(request): Json<AdoptRequest>,
) -> Result<Json<AdoptionReport>, AppError> {
    if request.habits.is_empty() {
        return Err(AppError::bad_request("select at least one habit"));
    }
    Ok(Json(state.habits.adopt_suggestions(&request.habits).await?))
}

/// Honors a pending navigator redirect, otherwise goes to `default`.
fn follow(state: &AppState, default: &str) -> Response {
    let target = state
        .redirects
        .take()
        .unwrap_or_else(|| default.to_string());
    Redirect::to(&target).into_response()
}
