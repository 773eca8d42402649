use crate::errors::{ApiError, HabitError};
use crate::manager::{HabitManager, LOGIN_PATH};
use crate::models::{
    Credentials, PasswordResetRequest, Profile, QuestionnaireAnswers, Registration, SuggestedHabit,
};
use crate::notify::{Navigator, Notification, Notifier};
use crate::remote::AccountApi;
use crate::session::SessionStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Login, registration, logout and the onboarding questionnaire.
pub struct AccountService {
    session: Arc<SessionStore>,
    api: Arc<dyn AccountApi>,
    habits: Arc<HabitManager>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl AccountService {
    pub fn new(
        session: Arc<SessionStore>,
        api: Arc<dyn AccountApi>,
        habits: Arc<HabitManager>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            api,
            habits,
            notifier,
            navigator,
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Profile, HabitError> {
        let response = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(err) => return Err(self.rejected(err, "Login failed", "Could not log in.")),
        };

        self.session.begin(response.token, response.user.clone()).await?;
        self.habits.clear().await;
        info!(user_id = %response.user.id, "logged in");
        self.notifier.notify(Notification::success(
            "Logged in",
            format!("Welcome, {}!", response.user.display_name()),
        ));
        Ok(response.user)
    }

    pub async fn register(&self, registration: &Registration) -> Result<(), HabitError> {
        if let Err(err) = self.api.register(registration).await {
            return Err(self.rejected(err, "Registration failed", "Could not create the account."));
        }
        info!(email = %registration.email, "account registered");
        self.notifier.notify(Notification::success(
            "Account created",
            "Log in to continue.",
        ));
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), HabitError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(HabitError::Validation("email must not be empty".to_string()));
        }
        let request = PasswordResetRequest {
            email: email.to_string(),
        };
        if let Err(err) = self.api.forgot_password(&request).await {
            return Err(self.rejected(err, "Could not send email", "Could not send the reset email."));
        }
        info!(email, "password reset requested");
        self.notifier.notify(Notification::success(
            "Email sent",
            "Check your inbox to reset your password.",
        ));
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), HabitError> {
        self.session.clear().await?;
        self.habits.clear().await;
        info!("logged out");
        self.navigator.redirect_to(LOGIN_PATH);
        Ok(())
    }

    pub async fn needs_onboarding(&self) -> bool {
        self.session
            .profile()
            .await
            .is_some_and(|profile| !profile.questionnaire_completed)
    }

    /// Sends the answers and returns the habits generated for them.
    pub async fn submit_questionnaire(
        &self,
        answers: &QuestionnaireAnswers,
    ) -> Result<Vec<SuggestedHabit>, HabitError> {
        let token = self.habits.require_token().await?;

        let result = match self.api.submit_questionnaire(&token, answers).await {
            Ok(()) => self.api.questionnaire_history(&token).await,
            Err(err) => Err(err),
        };
        let history = match result {
            Ok(history) => history,
            Err(ApiError::Unauthorized) => return Err(self.habits.expire_session().await),
            Err(err) => {
                warn!(error = %err, "questionnaire submission failed");
                let message = err.describe();
                self.notifier.notify(Notification::destructive(
                    "Could not submit questionnaire",
                    "Please try again.",
                ));
                return Err(HabitError::Transport { message });
            }
        };

        let suggestions = history
            .into_iter()
            .next()
            .map(|latest| latest.generated_habits)
            .unwrap_or_default();

        if let Some(mut profile) = self.session.profile().await {
            profile.questionnaire_completed = true;
            self.session.set_profile(profile).await?;
        }
        info!(suggestions = suggestions.len(), "questionnaire submitted");
        self.notifier.notify(Notification::success(
            "Questionnaire submitted",
            "Your answers were saved.",
        ));
        Ok(suggestions)
    }

    fn rejected(&self, err: ApiError, title: &str, fallback: &str) -> HabitError {
        warn!(error = %err, "{title}");
        let message = err
            .server_message()
            .unwrap_or(fallback)
            .to_string();
        self.notifier
            .notify(Notification::destructive(title, message.clone()));
        match err {
            ApiError::Conflict { .. } => HabitError::Conflict { message },
            ApiError::NotFound { .. } => HabitError::Validation(message),
            ApiError::Transport(_) | ApiError::Decode(_) => HabitError::Transport { message },
            ApiError::Status { status, .. } if status >= 500 => HabitError::Transport { message },
            _ => HabitError::AuthFailed { message },
        }
    }
}
