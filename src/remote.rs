use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{
    CreateHabitRequest, Credentials, LoginResponse, PasswordResetRequest, ProgressUpdate,
    QuestionnaireAnswers, QuestionnaireRecord, RawHabit, Registration,
};
use crate::payload::{parse_habit, parse_habit_list, unwrap_data};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Habit endpoints of the remote service. Every call carries the bearer token.
#[async_trait]
pub trait HabitApi: Send + Sync {
    async fn list_habits(&self, token: &str) -> Result<Vec<RawHabit>, ApiError>;

    /// The echoed record is informational only; callers re-list afterwards.
    async fn create_habit(
        &self,
        token: &str,
        request: &CreateHabitRequest,
    ) -> Result<Option<RawHabit>, ApiError>;

    async fn update_progress(
        &self,
        token: &str,
        habit_id: &str,
        update: &ProgressUpdate,
    ) -> Result<(), ApiError>;

    async fn delete_habit(&self, token: &str, habit_id: &str) -> Result<(), ApiError>;
}

/// Authentication and onboarding endpoints.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    async fn register(&self, registration: &Registration) -> Result<(), ApiError>;

    /// Asks the service to email a password reset link.
    async fn forgot_password(&self, request: &PasswordResetRequest) -> Result<(), ApiError>;

    async fn submit_questionnaire(
        &self,
        token: &str,
        answers: &QuestionnaireAnswers,
    ) -> Result<(), ApiError>;

    /// Newest questionnaire first.
    async fn questionnaire_history(&self, token: &str) -> Result<Vec<QuestionnaireRecord>, ApiError>;
}

#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    habits_path: String,
}

impl HttpApi {
    pub fn new(
        base_url: &str,
        habits_path: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            habits_path: format!("/{}", habits_path.trim_matches('/')),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, &config.habits_path, config.request_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn habits_url(&self) -> String {
        self.url(&self.habits_path)
    }

    fn habit_url(&self, habit_id: &str, suffix: &str) -> String {
        format!("{}/{}{}", self.habits_url(), habit_id, suffix)
    }
}

#[async_trait]
impl HabitApi for HttpApi {
    async fn list_habits(&self, token: &str) -> Result<Vec<RawHabit>, ApiError> {
        let response = self
            .client
            .get(self.habits_url())
            .bearer_auth(token)
            .send()
            .await?;
        let body: Value = decode(check(response).await?).await?;
        let habits = parse_habit_list(body)?;
        debug!(count = habits.len(), "fetched habits");
        Ok(habits)
    }

    async fn create_habit(
        &self,
        token: &str,
        request: &CreateHabitRequest,
    ) -> Result<Option<RawHabit>, ApiError> {
        let response = self
            .client
            .post(self.habits_url())
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        let response = check(response).await?;
        // Some deployments answer 201 with an empty body.
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let body: Value =
            serde_json::from_str(&text).map_err(|err| ApiError::Decode(err.to_string()))?;
        Ok(parse_habit(&unwrap_data(body)))
    }

    async fn update_progress(
        &self,
        token: &str,
        habit_id: &str,
        update: &ProgressUpdate,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.habit_url(habit_id, "/progress"))
            .bearer_auth(token)
            .json(update)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_habit(&self, token: &str, habit_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.habit_url(habit_id, ""))
            .bearer_auth(token)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await?;
        // A 401 here means bad credentials, not an expired session.
        if response.status() == StatusCode::UNAUTHORIZED {
            let message = error_message(response).await;
            return Err(ApiError::Status {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message,
            });
        }
        decode(check(response).await?).await
    }

    async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(registration)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn forgot_password(&self, request: &PasswordResetRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/auth/forgot-password"))
            .json(request)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn submit_questionnaire(
        &self,
        token: &str,
        answers: &QuestionnaireAnswers,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/questionnaire"))
            .bearer_auth(token)
            .json(answers)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn questionnaire_history(&self, token: &str) -> Result<Vec<QuestionnaireRecord>, ApiError> {
        let response = self
            .client
            .get(self.url("/questionnaire/history"))
            .bearer_auth(token)
            .send()
            .await?;
        let body: Value = decode(check(response).await?).await?;
        serde_json::from_value(unwrap_data(body)).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let message = error_message(response).await;
    warn!(status = status.as_u16(), path = %url, message = ?message, "habit api rejected request");

    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => ApiError::NotFound { message },
        StatusCode::CONFLICT => ApiError::Conflict { message },
        other => ApiError::Status {
            status: other.as_u16(),
            message,
        },
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Pulls `message` out of a JSON error body, falling back to plain text.
async fn error_message(response: Response) -> Option<String> {
    let text = response.text().await.ok()?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(body) => body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Err(_) => Some(text.to_string()),
    }
}
