//! Mock local login kept alongside the fantasy tokens.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::constants::storage_keys;
use crate::error::AppError;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub struct LocalSession {
    store: Arc<dyn KeyValueStore>,
}

impl LocalSession {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persists the token and the user as JSON
    pub fn login(&self, token: &str, user: &SessionUser) -> Result<(), AppError> {
        let user_json = serde_json::to_string(user)?;
        self.store.set(storage_keys::SESSION_TOKEN, token)?;
        self.store.set(storage_keys::SESSION_USER, &user_json)?;
        info!("Local session started for {}", user.username);
        Ok(())
    }

    /// Returns the stored user when both keys are present. A user record that
    /// does not parse clears the whole session.
    pub fn restore(&self) -> Result<Option<SessionUser>, AppError> {
        let token = self.store.get(storage_keys::SESSION_TOKEN)?;
        let user = self.store.get(storage_keys::SESSION_USER)?;

        let (Some(_), Some(user_json)) = (token, user) else {
            return Ok(None);
        };

        match serde_json::from_str::<SessionUser>(&user_json) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("Discarding malformed session user: {e}");
                self.logout()?;
                Ok(None)
            }
        }
    }

    pub fn token(&self) -> Result<Option<String>, AppError> {
        self.store.get(storage_keys::SESSION_TOKEN)
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.store.remove(storage_keys::SESSION_TOKEN)?;
        self.store.remove(storage_keys::SESSION_USER)
    }
}
