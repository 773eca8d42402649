pub mod account;
pub mod app;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod manager;
pub mod models;
pub mod normalize;
pub mod notify;
pub mod payload;
pub mod remote;
pub mod session;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use manager::HabitManager;
pub use remote::HttpApi;
pub use session::SessionStore;
pub use state::AppState;
