use crate::account::AccountService;
use crate::manager::HabitManager;
use crate::notify::{NoticeBoard, RedirectSlot};
use crate::remote::{AccountApi, HabitApi};
use crate::session::SessionStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionStore>,
    pub habits: Arc<HabitManager>,
    pub account: Arc<AccountService>,
    pub notices: Arc<NoticeBoard>,
    pub redirects: Arc<RedirectSlot>,
}

impl AppState {
    pub fn new<A>(session: SessionStore, api: A, notice_capacity: usize) -> Self
    where
        A: HabitApi + AccountApi + 'static,
    {
        let api = Arc::new(api);
        let session = Arc::new(session);
        let notices = Arc::new(NoticeBoard::new(notice_capacity));
        let redirects = Arc::new(RedirectSlot::default());

        let habits = Arc::new(HabitManager::new(
            session.clone(),
            api.clone(),
            notices.clone(),
            redirects.clone(),
        ));
        let account = Arc::new(AccountService::new(
            session.clone(),
            api,
            habits.clone(),
            notices.clone(),
            redirects.clone(),
        ));

        Self {
            session,
            habits,
            account,
            notices,
            redirects,
        }
    }
}
