use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub api_base_url: String,
    pub habits_path: String,
    pub session_path: PathBuf,
    pub request_timeout: Duration,
    pub notice_capacity: usize,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", 8080),
            api_base_url: try_load(
                "HABIT_API_BASE_URL",
                "http://localhost:3000/api".to_string(),
            ),
            habits_path: try_load("HABIT_API_HABITS_PATH", "/habits".to_string()),
            session_path: try_load("APP_SESSION_PATH", PathBuf::from("data/session.json")),
            request_timeout: Duration::from_secs(try_load("HABIT_API_TIMEOUT_SECS", 15)),
            notice_capacity: try_load("NOTICE_CAPACITY", 20),
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|err| {
            warn!("Invalid {key} value {value:?}: {err}, using default: {default:?}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default:?}");
            default
        }
    }
}
