use crate::errors::StorageError;
use crate::models::Profile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::RwLock};
use tracing::{error, info};

/// On-disk shape of the session file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(rename = "userData", default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Profile>,
}

pub async fn load_session(path: &Path) -> SessionData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse session file: {err}");
                SessionData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => SessionData::default(),
        Err(err) => {
            error!("failed to read session file: {err}");
            SessionData::default()
        }
    }
}

pub async fn persist_session(path: &Path, data: &SessionData) -> Result<(), StorageError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

/// Bearer token and cached profile of the signed-in user.
///
/// Read from disk once by [`SessionStore::init`]; every mutation is written
/// back before it returns. A store built with [`SessionStore::in_memory`]
/// never touches the filesystem.
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    data: RwLock<SessionData>,
}

impl SessionStore {
    pub async fn init(path: PathBuf) -> Self {
        let data = load_session(&path).await;
        info!(
            path = %path.display(),
            authenticated = data.auth_token.is_some(),
            "session restored"
        );
        Self {
            path: Some(path),
            data: RwLock::new(data),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(SessionData::default()),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.data
            .read()
            .await
            .auth_token
            .clone()
            .filter(|token| !token.is_empty())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.data.read().await.user_data.clone()
    }

    pub async fn set_profile(&self, profile: Profile) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.user_data = Some(profile);
        self.persist(&data).await
    }

    /// Stores token and profile together.
    pub async fn begin(&self, token: impl Into<String>, profile: Profile) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.auth_token = Some(token.into());
        data.user_data = Some(profile);
        self.persist(&data).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        *data = SessionData::default();
        self.persist(&data).await
    }

    async fn persist(&self, data: &SessionData) -> Result<(), StorageError> {
        match &self.path {
            Some(path) => persist_session(path, data).await,
            None => Ok(()),
        }
    }
}
