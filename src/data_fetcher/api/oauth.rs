//! OAuth2 authorization-code flow and token lifecycle for the fantasy provider.
//!
//! The manager owns the access/refresh pair. Every change is written through to
//! the [`KeyValueStore`] before the call that caused it returns, and a failed
//! refresh tears the whole session down.

use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::config::FantasyConfig;
use crate::constants::storage_keys;
use crate::data_fetcher::models::Provider;
use crate::error::AppError;
use crate::storage::KeyValueStore;

const CSRF_STATE_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Unauthenticated,
    /// Authorization URL handed out, waiting for the redirect with a code
    PendingCallback,
    Authenticated,
    Refreshing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderToken {
    pub access_token: String,
    pub refresh_token: String,
    pub obtained_at: DateTime<Utc>,
}

/// Token endpoint response body
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Default)]
struct TokenState {
    token: Option<ProviderToken>,
    pending_csrf: Option<String>,
    refreshing: bool,
}

pub struct TokenManager {
    client: Client,
    config: FantasyConfig,
    store: Arc<dyn KeyValueStore>,
    state: RwLock<TokenState>,
    refresh_lock: tokio::sync::Mutex<()>,
    used_codes: Mutex<HashSet<String>>,
}

impl TokenManager {
    /// Builds the manager and restores any token pair already in `store`
    pub fn new(client: Client, config: FantasyConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let token = restore_token(store.as_ref());
        if token.is_some() {
            info!("Restored fantasy session from storage");
        }
        Self {
            client,
            config,
            store,
            state: RwLock::new(TokenState {
                token,
                ..TokenState::default()
            }),
            refresh_lock: tokio::sync::Mutex::new(()),
            used_codes: Mutex::new(HashSet::new()),
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, TokenState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, TokenState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> AuthStatus {
        let state = self.read_state();
        if state.refreshing {
            AuthStatus::Refreshing
        } else if state.token.is_some() {
            AuthStatus::Authenticated
        } else if state.pending_csrf.is_some() {
            AuthStatus::PendingCallback
        } else {
            AuthStatus::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().token.is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read_state()
            .token
            .as_ref()
            .map(|token| token.access_token.clone())
    }

    pub fn token(&self) -> Option<ProviderToken> {
        self.read_state().token.clone()
    }

    fn client_id(&self) -> Result<&str, AppError> {
        self.config
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::auth_error("Fantasy client id is not configured"))
    }

    /// Builds the provider's consent URL with a fresh CSRF `state` and moves
    /// the flow to `PendingCallback`.
    pub fn authorization_url(&self) -> Result<String, AppError> {
        let client_id = self.client_id()?;
        let csrf = Alphanumeric.sample_string(&mut rand::rng(), CSRF_STATE_LENGTH);

        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", client_id),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.config.scope.as_str()),
                ("state", csrf.as_str()),
            ],
        )
        .map_err(|e| AppError::config_error(format!("Invalid fantasy auth URL: {e}")))?;

        self.write_state().pending_csrf = Some(csrf);
        debug!("Issued fantasy authorization URL");
        Ok(url.to_string())
    }

    /// Checks the redirect's `state` against the one last issued, then exchanges the code
    pub async fn complete_callback(&self, code: &str, state: Option<&str>) -> Result<(), AppError> {
        let expected = self.read_state().pending_csrf.clone();
        if let (Some(expected), Some(received)) = (expected.as_deref(), state)
            && expected != received
        {
            warn!("Fantasy OAuth callback state mismatch");
            return Err(AppError::auth_error("OAuth state does not match the issued request"));
        }
        self.exchange_code_for_tokens(code).await
    }

    /// Trades an authorization code for a token pair. Each code is accepted once,
    /// whether or not the exchange succeeds.
    #[instrument(skip(self, code))]
    pub async fn exchange_code_for_tokens(&self, code: &str) -> Result<(), AppError> {
        {
            let mut used = self.used_codes.lock().unwrap_or_else(PoisonError::into_inner);
            if !used.insert(code.to_string()) {
                return Err(AppError::auth_error("Authorization code was already used"));
            }
        }

        let client_id = self.client_id()?;
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", client_id),
            (
                "client_secret",
                self.config.client_secret.as_deref().unwrap_or_default(),
            ),
        ];
        let response = self.request_token(&params).await?;

        let refresh_token = response.refresh_token.ok_or_else(|| {
            AppError::auth_error("Token response did not include a refresh token")
        })?;
        self.set_tokens(ProviderToken {
            access_token: response.access_token,
            refresh_token,
            obtained_at: Utc::now(),
        })?;
        self.write_state().pending_csrf = None;
        info!("Fantasy login completed");
        Ok(())
    }

    /// Unconditionally refreshes the access token.
    pub async fn refresh_access_token(&self) -> Result<String, AppError> {
        self.refresh_if_current(None).await
    }

    /// Refreshes after `rejected` drew a 401. Concurrent callers share one
    /// refresh: whoever waits on the lock and finds a different access token
    /// already in place returns it without another round trip.
    #[instrument(skip(self, rejected))]
    pub(crate) async fn refresh_if_current(&self, rejected: Option<&str>) -> Result<String, AppError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.token();
        let Some(current) = current else {
            return Err(AppError::NotAuthenticated {
                provider: Provider::Fantasy,
            });
        };
        if let Some(rejected) = rejected
            && current.access_token != rejected
        {
            debug!("Access token already refreshed by another request");
            return Ok(current.access_token);
        }

        self.write_state().refreshing = true;
        let client_id = match self.client_id() {
            Ok(id) => id.to_string(),
            Err(e) => {
                self.write_state().refreshing = false;
                return Err(e);
            }
        };
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", current.refresh_token.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", client_id.as_str()),
            (
                "client_secret",
                self.config.client_secret.as_deref().unwrap_or_default(),
            ),
        ];
        let result = self.request_token(&params).await;
        self.write_state().refreshing = false;

        match result {
            Ok(response) => {
                let token = ProviderToken {
                    access_token: response.access_token,
                    refresh_token: response.refresh_token.unwrap_or(current.refresh_token),
                    obtained_at: Utc::now(),
                };
                let access_token = token.access_token.clone();
                self.set_tokens(token)?;
                info!("Fantasy access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                error!("Fantasy token refresh failed, ending session: {e}");
                self.clear_tokens()?;
                Err(e)
            }
        }
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.write_state().pending_csrf = None;
        self.clear_tokens()?;
        info!("Fantasy session logged out");
        Ok(())
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| AppError::auth_error(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Token endpoint returned {status}: {body}");
            return Err(AppError::auth_error(format!(
                "Token endpoint rejected the request ({status})"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AppError::auth_error(format!("Unreadable token response: {e}")))
    }

    /// Stored tokens are either the new pair or no access token at all
    fn set_tokens(&self, token: ProviderToken) -> Result<(), AppError> {
        self.store
            .set(storage_keys::FANTASY_ACCESS_TOKEN, &token.access_token)?;
        if let Err(e) = self
            .store
            .set(storage_keys::FANTASY_REFRESH_TOKEN, &token.refresh_token)
        {
            warn!("Could not store the refresh token, dropping the stored access token: {e}");
            if let Err(rollback) = self.store.remove(storage_keys::FANTASY_ACCESS_TOKEN) {
                warn!("Could not drop the stored access token: {rollback}");
            }
            return Err(e);
        }
        self.write_state().token = Some(token);
        Ok(())
    }

    /// Drops the in-memory pair first so no request picks it up while storage is updated
    pub(crate) fn clear_tokens(&self) -> Result<(), AppError> {
        self.write_state().token = None;
        self.store.remove(storage_keys::FANTASY_ACCESS_TOKEN)?;
        self.store.remove(storage_keys::FANTASY_REFRESH_TOKEN)
    }
}

fn restore_token(store: &dyn KeyValueStore) -> Option<ProviderToken> {
    let read = |key: &str| match store.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            warn!("Could not read {key} from storage: {e}");
            None
        }
    };
    let access_token = read(storage_keys::FANTASY_ACCESS_TOKEN)?;
    let refresh_token = read(storage_keys::FANTASY_REFRESH_TOKEN)?;
    Some(ProviderToken {
        access_token,
        refresh_token,
        obtained_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::api::http_client::create_test_http_client;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> FantasyConfig {
        FantasyConfig {
            auth_url: format!("{}/oauth2/request_auth", server.uri()),
            token_url: format!("{}/oauth2/get_token", server.uri()),
            client_id: Some("client-123".to_string()),
            client_secret: Some("secret".to_string()),
            ..FantasyConfig::default()
        }
    }

    fn manager(server: &MockServer, store: Arc<MemoryStore>) -> TokenManager {
        TokenManager::new(create_test_http_client(), config_for(server), store)
    }

    fn seeded_store(access: &str, refresh: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.set(storage_keys::FANTASY_ACCESS_TOKEN, access).unwrap();
        store.set(storage_keys::FANTASY_REFRESH_TOKEN, refresh).unwrap();
        store
    }

    #[tokio::test]
    async fn test_authorization_url_moves_to_pending_callback() {
        let server = MockServer::start().await;
        let tokens = manager(&server, Arc::new(MemoryStore::new()));
        assert_eq!(tokens.status(), AuthStatus::Unauthenticated);

        let url = Url::parse(&tokens.authorization_url().unwrap()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "fspt-r fspt-w");
        assert_eq!(params["state"].len(), CSRF_STATE_LENGTH);
        assert_eq!(tokens.status(), AuthStatus::PendingCallback);
    }

    #[tokio::test]
    async fn test_exchange_persists_tokens_and_rejects_reuse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 3600,
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let tokens = manager(&server, store.clone());
        tokens.exchange_code_for_tokens("abc").await.unwrap();

        assert!(tokens.is_authenticated());
        assert_eq!(tokens.access_token().as_deref(), Some("access-1"));
        assert_eq!(
            store.get(storage_keys::FANTASY_REFRESH_TOKEN).unwrap().as_deref(),
            Some("refresh-1")
        );

        let reused = tokens.exchange_code_for_tokens("abc").await;
        assert!(matches!(reused, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_rejected_exchange_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let tokens = manager(&server, Arc::new(MemoryStore::new()));
        let result = tokens.exchange_code_for_tokens("bad").await;
        assert!(matches!(result, Err(AppError::Auth(_))));
        assert!(!tokens.is_authenticated());
    }

    #[tokio::test]
    async fn test_callback_with_wrong_state_is_refused() {
        let server = MockServer::start().await;
        let tokens = manager(&server, Arc::new(MemoryStore::new()));
        tokens.authorization_url().unwrap();

        let result = tokens.complete_callback("abc", Some("forged")).await;
        assert!(matches!(result, Err(AppError::Auth(_))));
        assert_eq!(tokens.status(), AuthStatus::PendingCallback);
    }

    #[tokio::test]
    async fn test_tokens_restored_from_store() {
        let server = MockServer::start().await;
        let tokens = manager(&server, seeded_store("stored-access", "stored-refresh"));
        assert_eq!(tokens.status(), AuthStatus::Authenticated);
        assert_eq!(tokens.access_token().as_deref(), Some("stored-access"));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token_when_omitted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=stored-refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "access-2"})),
            )
            .mount(&server)
            .await;

        let store = seeded_store("stored-access", "stored-refresh");
        let tokens = manager(&server, store.clone());
        assert_eq!(tokens.refresh_access_token().await.unwrap(), "access-2");
        assert_eq!(
            store.get(storage_keys::FANTASY_ACCESS_TOKEN).unwrap().as_deref(),
            Some("access-2")
        );
        assert_eq!(tokens.token().unwrap().refresh_token, "stored-refresh");
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let store = seeded_store("stored-access", "stored-refresh");
        let tokens = manager(&server, store.clone());
        let result = tokens.refresh_access_token().await;

        assert!(matches!(result, Err(AppError::Auth(_))));
        assert_eq!(tokens.status(), AuthStatus::Unauthenticated);
        assert_eq!(store.get(storage_keys::FANTASY_ACCESS_TOKEN).unwrap(), None);
        assert_eq!(store.get(storage_keys::FANTASY_REFRESH_TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_rejections_share_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tokens = manager(&server, seeded_store("stale", "stored-refresh"));
        let (first, second) = tokio::join!(
            tokens.refresh_if_current(Some("stale")),
            tokens.refresh_if_current(Some("stale"))
        );
        assert_eq!(first.unwrap(), "fresh");
        assert_eq!(second.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_logout_clears_storage() {
        let server = MockServer::start().await;
        let store = seeded_store("a", "r");
        let tokens = manager(&server, store.clone());
        tokens.logout().unwrap();
        assert!(!tokens.is_authenticated());
        assert_eq!(store.get(storage_keys::FANTASY_ACCESS_TOKEN).unwrap(), None);
    }

    /// Store whose refresh token writes always fail
    struct RefreshWriteFails(MemoryStore);

    impl KeyValueStore for RefreshWriteFails {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
            if key == storage_keys::FANTASY_REFRESH_TOKEN {
                return Err(AppError::storage_error("disk full"));
            }
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), AppError> {
            self.0.remove(key)
        }
    }

    #[tokio::test]
    async fn test_partial_token_write_leaves_no_mixed_pair() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-2",
                "refresh_token": "refresh-2"
            })))
            .mount(&server)
            .await;

        let store = Arc::new(RefreshWriteFails(MemoryStore::new()));
        let tokens = TokenManager::new(create_test_http_client(), config_for(&server), store.clone());

        let result = tokens.exchange_code_for_tokens("code-1").await;
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert!(!tokens.is_authenticated());
        assert_eq!(store.get(storage_keys::FANTASY_ACCESS_TOKEN).unwrap(), None);
    }
}
