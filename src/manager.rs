//! In-memory habit collection for the active session.
//!
//! Every mutation goes through the remote service and the collection is
//! rebuilt from a fresh list afterwards; nothing derived is patched locally.
//! List responses are tagged with a ticket taken before the request is sent,
//! and a response only replaces the collection if no newer one has been
//! applied in the meantime.

use crate::clock::{Clock, SystemClock};
use crate::errors::{ApiError, HabitError};
use crate::models::{
    AdoptionReport, Frequency, HabitForm, NormalizedHabit, ProgressUpdate, SuggestedHabit,
    ToggleOutcome,
};
use crate::normalize::{is_completed_on, normalize, progress_percent, streak_days};
use crate::notify::{Navigator, Notification, Notifier};
use crate::remote::HabitApi;
use crate::session::SessionStore;
use chrono::{NaiveDate, SecondsFormat, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub const LOGIN_PATH: &str = "/login";

const GENERIC_CREATE_FAILURE: &str = "The habit could not be created. Please try again.";

#[derive(Default)]
struct Collection {
    habits: Vec<NormalizedHabit>,
    /// Session-local annotations keyed by habit id.
    notes: HashMap<String, String>,
    applied: u64,
}

impl Collection {
    fn replace(&mut self, habits: Vec<NormalizedHabit>) {
        self.notes
            .retain(|id, _| habits.iter().any(|habit| &habit.id == id));
        let notes = &self.notes;
        self.habits = habits
            .into_iter()
            .map(|mut habit| {
                habit.notes = notes.get(&habit.id).cloned();
                habit
            })
            .collect();
    }

    fn find(&self, habit_id: &str) -> Option<&NormalizedHabit> {
        self.habits.iter().find(|habit| habit.id == habit_id)
    }

    fn find_mut(&mut self, habit_id: &str) -> Option<&mut NormalizedHabit> {
        self.habits.iter_mut().find(|habit| habit.id == habit_id)
    }

    /// Records `today` on a habit without a fresh list from the service.
    fn mark_completed(&mut self, habit_id: &str, today: NaiveDate) {
        let Some(habit) = self.find_mut(habit_id) else {
            return;
        };
        if !habit.completed_dates.contains(&today) {
            habit.completed_dates.push(today);
        }
        habit.progress_percent = progress_percent(habit.frequency, &habit.completed_dates, today);
        habit.streak_days = streak_days(habit.frequency, &habit.completed_dates);
    }

    fn remove(&mut self, habit_id: &str) -> bool {
        let before = self.habits.len();
        self.habits.retain(|habit| habit.id != habit_id);
        self.notes.remove(habit_id);
        self.habits.len() != before
    }
}

pub struct HabitManager {
    session: Arc<SessionStore>,
    api: Arc<dyn HabitApi>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    state: Mutex<Collection>,
    issued: AtomicU64,
    toggling: StdMutex<HashSet<String>>,
}

impl HabitManager {
    pub fn new(
        session: Arc<SessionStore>,
        api: Arc<dyn HabitApi>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            api,
            notifier,
            navigator,
            clock: Arc::new(SystemClock),
            state: Mutex::new(Collection::default()),
            issued: AtomicU64::new(0),
            toggling: StdMutex::new(HashSet::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn habits(&self) -> Vec<NormalizedHabit> {
        self.state.lock().await.habits.clone()
    }

    pub async fn habit(&self, habit_id: &str) -> Option<NormalizedHabit> {
        self.state.lock().await.find(habit_id).cloned()
    }

    /// Replaces the collection with a fresh list from the service.
    pub async fn load(&self) -> Result<(), HabitError> {
        let token = self.require_token().await?;
        match self.refresh(&token).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fetch_failed(err).await),
        }
    }

    pub async fn create(&self, form: &HabitForm) -> Result<(), HabitError> {
        form.validate().map_err(HabitError::Validation)?;
        let token = self.require_token().await?;
        let request = form.to_request();

        match self.api.create_habit(&token, &request).await {
            Ok(echo) => {
                info!(name = %request.name, id = ?echo.map(|habit| habit.id), "habit created");
                self.notifier.notify(Notification::success(
                    "Habit created",
                    format!("\"{}\" was added to your habits.", request.name),
                ));
                self.load().await
            }
            Err(ApiError::Unauthorized) => Err(self.expire_session().await),
            Err(err) => {
                warn!(error = %err, "failed to create habit");
                let message = err
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| GENERIC_CREATE_FAILURE.to_string());
                self.notifier.notify(Notification::destructive(
                    "Could not create habit",
                    message.clone(),
                ));
                Err(HabitError::CreateFailed { message })
            }
        }
    }

    /// Marks the habit done for today. At most one completion per local day:
    /// a second call the same day, or one racing an in-flight call for the
    /// same habit, reports [`ToggleOutcome::AlreadyCompleted`] and sends nothing.
    pub async fn toggle_completion(&self, habit_id: &str) -> Result<ToggleOutcome, HabitError> {
        let token = self.require_token().await?;
        let Some(_guard) = ToggleGuard::acquire(&self.toggling, habit_id) else {
            debug!(habit_id, "completion already in flight");
            self.notify_already_completed();
            return Ok(ToggleOutcome::AlreadyCompleted);
        };

        let now = self.clock.now();
        let today = now.date_naive();
        let snapshot = self.state.lock().await.find(habit_id).map(|habit| {
            (
                habit.frequency,
                habit.completed_dates.len(),
                is_completed_on(habit, today),
            )
        });
        let (frequency, completed_days) = match snapshot {
            None => return Err(self.not_found(habit_id)),
            Some((_, _, true)) => {
                self.notify_already_completed();
                return Ok(ToggleOutcome::AlreadyCompleted);
            }
            Some((frequency, completed_days, false)) => (frequency, completed_days),
        };

        let update = ProgressUpdate {
            completed: true,
            date: now
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            frequency: (frequency == Frequency::EveryDay)
                .then(|| u32::try_from(completed_days + 1).unwrap_or(u32::MAX)),
        };
        if let Err(err) = self.api.update_progress(&token, habit_id, &update).await {
            return Err(self.mutation_failed(err, habit_id, "Could not update habit").await);
        }
        info!(habit_id, date = %today, "habit marked complete");

        if let Err(err) = self.refresh(&token).await {
            // The update landed; today counts even without a fresh list.
            self.state.lock().await.mark_completed(habit_id, today);
            if matches!(err, ApiError::Unauthorized) {
                return Err(self.expire_session().await);
            }
            warn!(error = %err, habit_id, "completed habit but could not refresh");
            self.notifier.notify(Notification::destructive(
                "Could not refresh habits",
                "The habit was marked as done, but the list could not be reloaded.",
            ));
            return Ok(ToggleOutcome::Completed);
        }
        self.notifier.notify(Notification::success(
            "Habit completed",
            "Nice work, keep it going!",
        ));
        Ok(ToggleOutcome::Completed)
    }

    /// Removes the habit locally once the service confirms the delete.
    pub async fn delete_habit(&self, habit_id: &str) -> Result<(), HabitError> {
        let token = self.require_token().await?;
        if let Err(err) = self.api.delete_habit(&token, habit_id).await {
            return Err(self.mutation_failed(err, habit_id, "Could not delete habit").await);
        }

        {
            let mut state = self.state.lock().await;
            state.remove(habit_id);
            // Lists requested before the delete could still contain it.
            state.applied = state.applied.max(self.issued.load(Ordering::SeqCst));
        }
        info!(habit_id, "habit deleted");
        self.notifier.notify(Notification::success(
            "Habit removed",
            "The habit was deleted.",
        ));
        Ok(())
    }

    /// Notes live only in this process; the service has no field for them.
    pub async fn update_notes(
        &self,
        habit_id: &str,
        text: &str,
    ) -> Result<NormalizedHabit, HabitError> {
        let text = text.trim();
        let note = (!text.is_empty()).then(|| text.to_string());

        let updated = {
            let mut state = self.state.lock().await;
            let Some(habit) = state.find_mut(habit_id) else {
                drop(state);
                return Err(self.not_found(habit_id));
            };
            habit.notes = note.clone();
            let updated = habit.clone();
            match note {
                Some(note) => state.notes.insert(habit_id.to_string(), note),
                None => state.notes.remove(habit_id),
            };
            updated
        };

        self.notifier.notify(Notification::success(
            "Notes updated",
            "Your notes were saved.",
        ));
        Ok(updated)
    }

    /// Creates the selected onboarding suggestions, skipping any whose name
    /// (case-insensitive, trimmed) already exists or repeats within the batch.
    pub async fn adopt_suggestions(
        &self,
        suggestions: &[SuggestedHabit],
    ) -> Result<AdoptionReport, HabitError> {
        let token = self.require_token().await?;
        let existing = match self.api.list_habits(&token).await {
            Ok(existing) => existing,
            Err(err) => return Err(self.fetch_failed(err).await),
        };

        let mut seen: HashSet<String> = existing.iter().map(|habit| name_key(&habit.name)).collect();
        let mut report = AdoptionReport::default();
        for suggestion in suggestions {
            let key = name_key(&suggestion.name);
            if key.is_empty() || !seen.insert(key) {
                debug!(name = %suggestion.name, "skipping duplicate suggestion");
                report.skipped += 1;
                continue;
            }
            match self.api.create_habit(&token, &suggestion.to_request()).await {
                Ok(_) => report.created += 1,
                Err(ApiError::Unauthorized) => return Err(self.expire_session().await),
                Err(err) => {
                    warn!(error = %err, name = %suggestion.name, "failed to create suggested habit");
                    let message = err.describe();
                    self.notifier.notify(Notification::destructive(
                        "Could not create habits",
                        message.clone(),
                    ));
                    if report.created > 0 {
                        if let Err(err) = self.refresh(&token).await {
                            warn!(error = %err, "could not reload after partial adoption");
                        }
                    }
                    return Err(HabitError::CreateFailed { message });
                }
            }
        }

        let mut description = format!("{} habits were created.", report.created);
        if report.skipped > 0 {
            description.push_str(&format!(" ({} already existed and were skipped)", report.skipped));
        }
        info!(created = report.created, skipped = report.skipped, "suggestions adopted");
        self.notifier
            .notify(Notification::success("Habits created", description));
        self.load().await?;
        Ok(report)
    }

    /// Drops everything held for the current user.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.habits.clear();
        state.notes.clear();
        state.applied = state.applied.max(self.issued.load(Ordering::SeqCst));
    }

    /// Clears the stored session and sends the user to the login page.
    pub(crate) async fn expire_session(&self) -> HabitError {
        warn!("session missing or expired");
        if let Err(err) = self.session.clear().await {
            error!(error = %err, "failed to clear session");
        }
        self.notifier.notify(Notification::destructive(
            "Session expired",
            "Please log in again.",
        ));
        self.navigator.redirect_to(LOGIN_PATH);
        HabitError::Unauthorized
    }

    pub(crate) async fn require_token(&self) -> Result<String, HabitError> {
        match self.session.token().await {
            Some(token) => Ok(token),
            None => Err(self.expire_session().await),
        }
    }

    async fn refresh(&self, token: &str) -> Result<(), ApiError> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let raw = self.api.list_habits(token).await?;

        let now = self.clock.now();
        let today = now.date_naive();
        let habits: Vec<_> = raw
            .iter()
            .map(|habit| normalize(habit, today, now.offset()))
            .collect();

        let mut state = self.state.lock().await;
        if ticket <= state.applied {
            debug!(ticket, applied = state.applied, "discarding stale habit list");
            return Ok(());
        }
        state.applied = ticket;
        let count = habits.len();
        state.replace(habits);
        info!(count, ticket, "habit collection refreshed");
        Ok(())
    }

    async fn fetch_failed(&self, err: ApiError) -> HabitError {
        if matches!(err, ApiError::Unauthorized) {
            return self.expire_session().await;
        }
        warn!(error = %err, "failed to fetch habits");
        let message = err.describe();
        self.notifier.notify(Notification::destructive(
            "Could not load habits",
            message.clone(),
        ));
        HabitError::FetchFailed { message }
    }

    async fn mutation_failed(&self, err: ApiError, habit_id: &str, title: &str) -> HabitError {
        warn!(error = %err, habit_id, "{title}");
        match err {
            ApiError::Unauthorized => self.expire_session().await,
            ApiError::NotFound { .. } => self.not_found(habit_id),
            ApiError::Conflict { message } => {
                let message =
                    message.unwrap_or_else(|| "The habit was changed elsewhere.".to_string());
                self.notifier
                    .notify(Notification::destructive(title, message.clone()));
                HabitError::Conflict { message }
            }
            other => {
                let message = other.describe();
                self.notifier
                    .notify(Notification::destructive(title, message.clone()));
                HabitError::Transport { message }
            }
        }
    }

    fn not_found(&self, habit_id: &str) -> HabitError {
        self.notifier.notify(Notification::destructive(
            "Habit not found",
            "This habit no longer exists.",
        ));
        HabitError::NotFound {
            habit_id: habit_id.to_string(),
        }
    }

    fn notify_already_completed(&self) {
        self.notifier.notify(Notification::info(
            "Already completed",
            "This habit is already marked as done today.",
        ));
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Marks a habit as having a completion request in flight until dropped.
struct ToggleGuard<'a> {
    set: &'a StdMutex<HashSet<String>>,
    habit_id: String,
}

impl<'a> ToggleGuard<'a> {
    fn acquire(set: &'a StdMutex<HashSet<String>>, habit_id: &str) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(habit_id.to_string());
        inserted.then(|| Self {
            set,
            habit_id: habit_id.to_string(),
        })
    }
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.habit_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Category, CreateHabitRequest, Profile, RawHabit, RawProgressEntry};
    use crate::notify::{NoticeBoard, NoticeKind};
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset};
    use tokio::sync::{Notify, oneshot};

    #[derive(Default)]
    struct FakeApi {
        habits: StdMutex<Vec<RawHabit>>,
        updates: StdMutex<Vec<(String, ProgressUpdate)>>,
        created: StdMutex<Vec<CreateHabitRequest>>,
        list_calls: AtomicU64,
        fail_list: StdMutex<Option<ApiError>>,
        fail_mutation: StdMutex<Option<ApiError>>,
        reject_name: StdMutex<Option<String>>,
        list_gate: StdMutex<Option<oneshot::Receiver<()>>>,
        list_entered: Notify,
    }

    impl FakeApi {
        fn with_habits(habits: Vec<RawHabit>) -> Arc<Self> {
            let api = Self::default();
            *api.habits.lock().unwrap() = habits;
            Arc::new(api)
        }

        fn fail_list_with(&self, err: ApiError) {
            *self.fail_list.lock().unwrap() = Some(err);
        }

        fn fail_mutation_with(&self, err: ApiError) {
            *self.fail_mutation.lock().unwrap() = Some(err);
        }

        fn take_mutation_failure(&self) -> Result<(), ApiError> {
            match self.fail_mutation.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl HabitApi for FakeApi {
        async fn list_habits(&self, _token: &str) -> Result<Vec<RawHabit>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.fail_list.lock().unwrap().take() {
                return Err(err);
            }
            let snapshot = self.habits.lock().unwrap().clone();
            let gate = self.list_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                self.list_entered.notify_one();
                let _ = gate.await;
            }
            Ok(snapshot)
        }

        async fn create_habit(
            &self,
            _token: &str,
            request: &CreateHabitRequest,
        ) -> Result<Option<RawHabit>, ApiError> {
            self.take_mutation_failure()?;
            if self.reject_name.lock().unwrap().as_deref() == Some(request.name.as_str()) {
                return Err(ApiError::Status {
                    status: 400,
                    message: Some("invalid habit".into()),
                });
            }
            self.created.lock().unwrap().push(request.clone());
            let mut habits = self.habits.lock().unwrap();
            let habit = RawHabit {
                id: format!("new-{}", habits.len() + 1),
                name: request.name.clone(),
                description: request.description.clone(),
                goal_count: request.goal,
                category: request.category,
                frequency: request.frequency,
                progress_entries: Vec::new(),
                created_at: None,
            };
            habits.push(habit.clone());
            Ok(Some(habit))
        }

        async fn update_progress(
            &self,
            _token: &str,
            habit_id: &str,
            update: &ProgressUpdate,
        ) -> Result<(), ApiError> {
            self.take_mutation_failure()?;
            let date = DateTime::parse_from_rfc3339(&update.date)
                .map_err(|err| ApiError::Decode(err.to_string()))?
                .with_timezone(&Utc);
            let mut habits = self.habits.lock().unwrap();
            let habit = habits
                .iter_mut()
                .find(|habit| habit.id == habit_id)
                .ok_or(ApiError::NotFound { message: None })?;
            habit.progress_entries.push(RawProgressEntry {
                date,
                completed: update.completed,
            });
            self.updates
                .lock()
                .unwrap()
                .push((habit_id.to_string(), update.clone()));
            Ok(())
        }

        async fn delete_habit(&self, _token: &str, habit_id: &str) -> Result<(), ApiError> {
            self.take_mutation_failure()?;
            let mut habits = self.habits.lock().unwrap();
            let before = habits.len();
            habits.retain(|habit| habit.id != habit_id);
            if habits.len() == before {
                return Err(ApiError::NotFound { message: None });
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        redirects: StdMutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect_to(&self, path: &str) {
            self.redirects.lock().unwrap().push(path.to_string());
        }
    }

    struct Harness {
        api: Arc<FakeApi>,
        session: Arc<SessionStore>,
        notices: Arc<NoticeBoard>,
        navigator: Arc<RecordingNavigator>,
        manager: Arc<HabitManager>,
    }

    fn wednesday_noon() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-10T12:00:00+00:00").unwrap()
    }

    fn raw(id: &str, frequency: Frequency, dates: &[&str]) -> RawHabit {
        RawHabit {
            id: id.into(),
            name: format!("Habit {id}"),
            description: String::new(),
            goal_count: None,
            category: Category::Health,
            frequency,
            progress_entries: dates
                .iter()
                .map(|date| RawProgressEntry {
                    date: DateTime::parse_from_rfc3339(date).unwrap().with_timezone(&Utc),
                    completed: true,
                })
                .collect(),
            created_at: None,
        }
    }

    async fn harness(habits: Vec<RawHabit>) -> Harness {
        let api = FakeApi::with_habits(habits);
        let session = Arc::new(SessionStore::in_memory());
        session
            .begin(
                "token",
                Profile {
                    id: "u1".into(),
                    email: "ana@example.com".into(),
                    name: "Ana".into(),
                    questionnaire_completed: true,
                },
            )
            .await
            .unwrap();
        let notices = Arc::new(NoticeBoard::new(50));
        let navigator = Arc::new(RecordingNavigator::default());
        let manager = HabitManager::new(
            session.clone(),
            api.clone(),
            notices.clone(),
            navigator.clone(),
        )
        .with_clock(Arc::new(FixedClock::new(wednesday_noon())));
        Harness {
            api,
            session,
            notices,
            navigator,
            manager: Arc::new(manager),
        }
    }

    fn kinds(notices: &NoticeBoard) -> Vec<NoticeKind> {
        notices.drain().into_iter().map(|notice| notice.kind).collect()
    }

    #[tokio::test]
    async fn load_replaces_collection_with_normalized_habits() {
        let h = harness(vec![
            raw("daily", Frequency::EveryDay, &["2024-01-10T08:00:00Z"]),
            raw(
                "weekly",
                Frequency::Weekly,
                &["2024-01-07T08:00:00Z", "2024-01-08T08:00:00Z", "2024-01-09T08:00:00Z"],
            ),
        ])
        .await;

        h.manager.load().await.unwrap();
        let habits = h.manager.habits().await;
        assert_eq!(habits.len(), 2);
        assert_eq!(habits[0].progress_percent, 100.0);
        assert_eq!(habits[0].streak_days, 1);
        assert!((habits[1].progress_percent - 300.0 / 7.0).abs() < 1e-9);
        assert_eq!(habits[1].goal, Some(1));
    }

    #[tokio::test]
    async fn load_with_expired_token_redirects_once() {
        let h = harness(vec![raw("a", Frequency::EveryDay, &[])]).await;
        h.manager.load().await.unwrap();
        h.api.fail_list_with(ApiError::Unauthorized);

        let err = h.manager.load().await.unwrap_err();
        assert!(matches!(err, HabitError::Unauthorized));
        assert_eq!(h.manager.habits().await.len(), 1);
        assert_eq!(*h.navigator.redirects.lock().unwrap(), vec![LOGIN_PATH.to_string()]);
        assert!(!h.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn load_without_session_never_calls_the_service() {
        let h = harness(vec![raw("a", Frequency::EveryDay, &[])]).await;
        h.session.clear().await.unwrap();

        let err = h.manager.load().await.unwrap_err();
        assert!(matches!(err, HabitError::Unauthorized));
        assert_eq!(h.api.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.navigator.redirects.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_state() {
        let h = harness(vec![raw("a", Frequency::EveryDay, &[])]).await;
        h.manager.load().await.unwrap();
        h.notices.drain();
        h.api.fail_list_with(ApiError::Status {
            status: 503,
            message: Some("maintenance".into()),
        });

        let err = h.manager.load().await.unwrap_err();
        assert!(matches!(err, HabitError::FetchFailed { ref message } if message == "maintenance"));
        assert_eq!(h.manager.habits().await.len(), 1);
        assert_eq!(kinds(&h.notices), vec![NoticeKind::Destructive]);
        assert!(h.navigator.redirects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn toggle_twice_records_one_completion() {
        let h = harness(vec![raw("a", Frequency::EveryDay, &["2024-01-09T08:00:00Z"])]).await;
        h.manager.load().await.unwrap();
        h.notices.drain();

        let first = h.manager.toggle_completion("a").await.unwrap();
        let after_first = h.manager.habits().await;
        let second = h.manager.toggle_completion("a").await.unwrap();

        assert_eq!(first, ToggleOutcome::Completed);
        assert_eq!(second, ToggleOutcome::AlreadyCompleted);
        assert_eq!(h.api.updates.lock().unwrap().len(), 1);
        assert_eq!(h.manager.habits().await, after_first);
        assert_eq!(after_first[0].progress_percent, 100.0);
        assert_eq!(after_first[0].streak_days, 2);
        assert_eq!(kinds(&h.notices), vec![NoticeKind::Success, NoticeKind::Info]);
    }

    #[tokio::test]
    async fn toggle_sends_running_counter_for_daily_habits_only() {
        let h = harness(vec![
            raw("daily", Frequency::EveryDay, &["2024-01-08T08:00:00Z", "2024-01-09T08:00:00Z"]),
            raw("weekly", Frequency::Weekly, &[]),
        ])
        .await;
        h.manager.load().await.unwrap();

        h.manager.toggle_completion("daily").await.unwrap();
        h.manager.toggle_completion("weekly").await.unwrap();

        let updates = h.api.updates.lock().unwrap().clone();
        assert_eq!(updates[0].1.frequency, Some(3));
        assert_eq!(updates[1].1.frequency, None);
        assert!(updates.iter().all(|(_, update)| update.completed));
        assert_eq!(updates[0].1.date, "2024-01-10T12:00:00.000Z");
    }

    #[tokio::test]
    async fn failed_toggle_leaves_state_untouched() {
        let h = harness(vec![raw("a", Frequency::EveryDay, &[])]).await;
        h.manager.load().await.unwrap();
        let before = h.manager.habits().await;
        h.notices.drain();
        h.api.fail_mutation_with(ApiError::Status {
            status: 500,
            message: None,
        });

        let err = h.manager.toggle_completion("a").await.unwrap_err();
        assert!(matches!(err, HabitError::Transport { .. }));
        assert_eq!(h.manager.habits().await, before);
        assert_eq!(kinds(&h.notices), vec![NoticeKind::Destructive]);

        // the in-flight guard is released after a failure
        assert_eq!(
            h.manager.toggle_completion("a").await.unwrap(),
            ToggleOutcome::Completed
        );
    }

    #[tokio::test]
    async fn toggle_with_failed_refresh_still_counts_for_today() {
        let h = harness(vec![raw("a", Frequency::EveryDay, &["2024-01-09T08:00:00Z"])]).await;
        h.manager.load().await.unwrap();
        h.notices.drain();
        h.api.fail_list_with(ApiError::Status {
            status: 503,
            message: None,
        });

        let first = h.manager.toggle_completion("a").await.unwrap();
        let second = h.manager.toggle_completion("a").await.unwrap();

        assert_eq!(first, ToggleOutcome::Completed);
        assert_eq!(second, ToggleOutcome::AlreadyCompleted);
        assert_eq!(h.api.updates.lock().unwrap().len(), 1);
        let habit = h.manager.habit("a").await.unwrap();
        assert_eq!(habit.progress_percent, 100.0);
        assert_eq!(habit.streak_days, 2);
        assert_eq!(kinds(&h.notices), vec![NoticeKind::Destructive, NoticeKind::Info]);
    }

    #[tokio::test]
    async fn toggle_with_expired_refresh_redirects() {
        let h = harness(vec![raw("a", Frequency::EveryDay, &[])]).await;
        h.manager.load().await.unwrap();
        h.api.fail_list_with(ApiError::Unauthorized);

        let err = h.manager.toggle_completion("a").await.unwrap_err();
        assert!(matches!(err, HabitError::Unauthorized));
        assert_eq!(h.api.updates.lock().unwrap().len(), 1);
        assert!(is_completed_on(&h.manager.habit("a").await.unwrap(), wednesday_noon().date_naive()));
        assert_eq!(*h.navigator.redirects.lock().unwrap(), vec![LOGIN_PATH.to_string()]);
    }

    #[tokio::test]
    async fn toggle_unknown_habit_is_not_found() {
        let h = harness(vec![]).await;
        h.manager.load().await.unwrap();
        let err = h.manager.toggle_completion("ghost").await.unwrap_err();
        assert!(matches!(err, HabitError::NotFound { .. }));
        assert!(h.api.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_only_after_confirmation() {
        let h = harness(vec![
            raw("a", Frequency::EveryDay, &[]),
            raw("b", Frequency::EveryDay, &[]),
        ])
        .await;
        h.manager.load().await.unwrap();

        h.api.fail_mutation_with(ApiError::Status {
            status: 502,
            message: None,
        });
        assert!(h.manager.delete_habit("a").await.is_err());
        assert!(h.manager.habit("a").await.is_some());

        h.manager.delete_habit("a").await.unwrap();
        assert!(h.manager.habit("a").await.is_none());
        h.manager.load().await.unwrap();
        let ids: Vec<_> = h.manager.habits().await.into_iter().map(|habit| habit.id).collect();
        assert_eq!(ids, ["b"]);
    }

    #[tokio::test]
    async fn delete_of_missing_habit_keeps_local_row() {
        let h = harness(vec![raw("a", Frequency::EveryDay, &[])]).await;
        h.manager.load().await.unwrap();
        h.api.habits.lock().unwrap().clear();

        let err = h.manager.delete_habit("a").await.unwrap_err();
        assert!(matches!(err, HabitError::NotFound { .. }));
        assert!(h.manager.habit("a").await.is_some());
    }

    #[tokio::test]
    async fn create_maps_form_and_reloads() {
        let h = harness(vec![]).await;
        h.manager
            .create(&HabitForm {
                title: "Meditate".into(),
                description: "5 minutes".into(),
                goal: Some(3),
                category: Category::Leisure,
                frequency: Frequency::EveryDay,
            })
            .await
            .unwrap();

        let created = h.api.created.lock().unwrap().clone();
        assert_eq!(created[0].name, "Meditate");
        assert_eq!(created[0].goal, None);
        let habits = h.manager.habits().await;
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].title, "Meditate");
    }

    #[tokio::test]
    async fn create_failure_passes_server_message() {
        let h = harness(vec![]).await;
        h.api.fail_mutation_with(ApiError::Status {
            status: 400,
            message: Some("name already used".into()),
        });
        let form = HabitForm {
            title: "Read".into(),
            description: String::new(),
            goal: None,
            category: Category::Study,
            frequency: Frequency::Weekly,
        };
        let err = h.manager.create(&form).await.unwrap_err();
        assert!(matches!(err, HabitError::CreateFailed { ref message } if message == "name already used"));

        h.api.fail_mutation_with(ApiError::Status {
            status: 500,
            message: None,
        });
        let err = h.manager.create(&form).await.unwrap_err();
        assert!(matches!(err, HabitError::CreateFailed { ref message } if message == GENERIC_CREATE_FAILURE));
    }

    #[tokio::test]
    async fn notes_survive_reload_but_not_delete() {
        let h = harness(vec![raw("a", Frequency::EveryDay, &[])]).await;
        h.manager.load().await.unwrap();

        let updated = h.manager.update_notes("a", "  felt great  ").await.unwrap();
        assert_eq!(updated.notes.as_deref(), Some("felt great"));
        h.manager.load().await.unwrap();
        assert_eq!(
            h.manager.habit("a").await.unwrap().notes.as_deref(),
            Some("felt great")
        );

        h.manager.update_notes("a", "").await.unwrap();
        assert_eq!(h.manager.habit("a").await.unwrap().notes, None);
        assert!(matches!(
            h.manager.update_notes("ghost", "x").await,
            Err(HabitError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn stale_list_response_is_discarded() {
        let h = harness(vec![]).await;
        let (release, gate) = oneshot::channel();
        *h.api.list_gate.lock().unwrap() = Some(gate);

        let slow = {
            let manager = h.manager.clone();
            tokio::spawn(async move { manager.load().await })
        };
        h.api.list_entered.notified().await;

        h.api.habits.lock().unwrap().push(raw("fresh", Frequency::EveryDay, &[]));
        h.manager.load().await.unwrap();
        release.send(()).unwrap();
        slow.await.unwrap().unwrap();

        let ids: Vec<_> = h.manager.habits().await.into_iter().map(|habit| habit.id).collect();
        assert_eq!(ids, ["fresh"]);
    }

    #[tokio::test]
    async fn adopting_suggestions_skips_existing_names() {
        let mut existing = raw("a", Frequency::EveryDay, &[]);
        existing.name = "Drink Water".into();
        let h = harness(vec![existing]).await;

        let suggestion = |id: &str, name: &str| SuggestedHabit {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: Category::Health,
            frequency: Frequency::Weekly,
        };
        let report = h
            .manager
            .adopt_suggestions(&[
                suggestion("s1", "  drink water "),
                suggestion("s2", "Walk"),
                suggestion("s3", "walk"),
                suggestion("s4", "Stretch"),
            ])
            .await
            .unwrap();

        assert_eq!(report, AdoptionReport { created: 2, skipped: 2 });
        assert_eq!(h.manager.habits().await.len(), 3);
    }

    #[tokio::test]
    async fn partial_adoption_shows_habits_created_before_the_failure() {
        let h = harness(vec![]).await;
        *h.api.reject_name.lock().unwrap() = Some("Stretch".into());

        let suggestion = |id: &str, name: &str| SuggestedHabit {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: Category::Health,
            frequency: Frequency::EveryDay,
        };
        let err = h
            .manager
            .adopt_suggestions(&[
                suggestion("s1", "Walk"),
                suggestion("s2", "Stretch"),
                suggestion("s3", "Read"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, HabitError::CreateFailed { ref message } if message == "invalid habit"));
        let names: Vec<_> = h.manager.habits().await.into_iter().map(|habit| habit.title).collect();
        assert_eq!(names, ["Walk"]);
    }
}
