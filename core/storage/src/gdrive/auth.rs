//! OAuth2 authentication and token management for Google Drive.

use chrono::{DateTime, Duration, Utc};
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, Scope, TokenResponse,
    TokenUrl,
};
use serde::{Deserialize, Serialize};

use updrift_common::{Error, Result};

use super::token_store::TokenStore;

/// OAuth2 authorization endpoint.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// OAuth2 token endpoint.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google Drive OAuth2 scope (file-level access only).
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// OAuth2 credential with expiration tracking.
///
/// Serialized verbatim as the contents of the credential file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Access token for API requests.
    pub access_token: String,
    /// Refresh token for obtaining new access tokens.
    pub refresh_token: String,
    /// When the access token expires.
    pub expiry: DateTime<Utc>,
    /// Scope granted by the provider.
    pub scope: String,
    /// Token type, normally "Bearer".
    pub token_type: String,
}

impl Credential {
    /// Check if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        // Consider expired if less than 5 minutes remaining
        self.expiry < Utc::now() + Duration::minutes(5)
    }
}

/// Configuration for OAuth2 authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Redirect URL for the OAuth2 callback.
    pub redirect_url: String,
}

/// OAuth2 authentication manager for Google Drive.
pub struct AuthManager {
    client: BasicClient,
    config: AuthConfig,
}

impl AuthManager {
    /// Create a new authentication manager.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string())
                .map_err(|e| Error::InvalidInput(format!("Invalid auth URL: {}", e)))?,
            Some(
                TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
                    .map_err(|e| Error::InvalidInput(format!("Invalid token URL: {}", e)))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_url.clone())
                .map_err(|e| Error::InvalidInput(format!("Invalid redirect URL: {}", e)))?,
        );

        Ok(Self { client, config })
    }

    /// Generate the authorization URL for the operator to visit.
    ///
    /// Returns the URL and a CSRF token that should be verified on callback.
    pub fn authorization_url(&self) -> (String, String) {
        let (auth_url, csrf_token) = self
            .client
            .authorize_url(oauth2::CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        (auth_url.to_string(), csrf_token.secret().clone())
    }

    /// Exchange an authorization code for a credential.
    ///
    /// # Errors
    /// - Invalid or expired authorization code
    /// - Network errors
    pub async fn exchange_code(&self, code: &str) -> Result<Credential> {
        use oauth2::reqwest::async_http_client;
        use oauth2::AuthorizationCode;

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| Error::Authentication(format!("Token exchange failed: {}", e)))?;

        let refresh_token = token_result
            .refresh_token()
            .ok_or_else(|| {
                Error::Authentication(
                    "No refresh token received. Ensure 'offline' access and 'consent' prompt were requested.".to_string(),
                )
            })?
            .secret()
            .clone();

        Ok(Self::credential_from_response(&token_result, refresh_token))
    }

    /// Refresh an access token using the stored refresh token.
    ///
    /// # Errors
    /// - Invalid or revoked refresh token
    /// - Network errors
    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        use oauth2::reqwest::async_http_client;
        use oauth2::RefreshToken;

        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| Error::Authentication(format!("Token refresh failed: {}", e)))?;

        // Refresh tokens may or may not be returned in the refresh response
        let new_refresh_token = token_result
            .refresh_token()
            .map(|t| t.secret().clone())
            .unwrap_or_else(|| refresh_token.to_string());

        Ok(Self::credential_from_response(
            &token_result,
            new_refresh_token,
        ))
    }

    fn credential_from_response(
        token_result: &oauth2::basic::BasicTokenResponse,
        refresh_token: String,
    ) -> Credential {
        let expires_in = token_result
            .expires_in()
            .unwrap_or_else(|| std::time::Duration::from_secs(3600));
        let expiry =
            Utc::now() + Duration::from_std(expires_in).unwrap_or_else(|_| Duration::hours(1));

        let scope = token_result
            .scopes()
            .map(|scopes| {
                scopes
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_else(|| DRIVE_SCOPE.to_string());

        Credential {
            access_token: token_result.access_token().secret().clone(),
            refresh_token,
            expiry,
            scope,
            token_type: "Bearer".to_string(),
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

/// State of the authorization sequence.
///
/// The interactive flow advances NoToken -> AwaitingCode -> Exchanging ->
/// Authorized; loading a stored credential jumps straight to Authorized.
#[derive(Debug, Clone)]
pub enum AuthState {
    /// No stored credential and the interactive flow has not started.
    NoToken,
    /// The operator must visit the URL and supply the returned code.
    AwaitingCode {
        /// Authorization URL to visit out-of-band.
        auth_url: String,
        /// CSRF token bound to the URL.
        csrf_token: String,
    },
    /// The authorization code is being exchanged at the token endpoint.
    Exchanging,
    /// A usable credential is installed.
    Authorized(Credential),
}

/// Drives the authorization sequence against the token store.
///
/// Obtains a credential either by loading the persisted one or by handing
/// the caller an `AwaitingCode` state to resolve interactively. The blocking
/// read of the code stays with the caller; this type only models the states.
pub struct Authorizer {
    manager: AuthManager,
    store: TokenStore,
}

impl Authorizer {
    /// Create an authorizer over the given manager and store.
    pub fn new(manager: AuthManager, store: TokenStore) -> Self {
        Self { manager, store }
    }

    /// Start the sequence.
    ///
    /// A stored credential is installed verbatim with no validity check.
    /// Otherwise the returned state carries the authorization URL for the
    /// operator.
    ///
    /// # Errors
    /// - Malformed credential file
    pub fn begin(&self) -> Result<AuthState> {
        if let Some(credential) = self.store.read()? {
            return Ok(AuthState::Authorized(credential));
        }

        let (auth_url, csrf_token) = self.manager.authorization_url();
        Ok(AuthState::AwaitingCode {
            auth_url,
            csrf_token,
        })
    }

    /// Exchange the authorization code and persist the resulting credential.
    ///
    /// # Errors
    /// - Invalid/expired code, network failure
    /// - Credential file write failure
    pub async fn complete(&self, code: &str) -> Result<Credential> {
        let credential = self.manager.exchange_code(code.trim()).await?;
        self.store.write(&credential)?;
        Ok(credential)
    }

    /// Consume the authorizer, yielding its parts for the token manager.
    pub fn into_parts(self) -> (AuthManager, TokenStore) {
        (self.manager, self.store)
    }
}

/// Token manager that refreshes expired access tokens.
///
/// Refreshed credentials are persisted back through the token store so the
/// next startup reuses them.
pub struct TokenManager {
    manager: AuthManager,
    store: TokenStore,
    credential: tokio::sync::RwLock<Credential>,
}

impl TokenManager {
    /// Create a new token manager with an installed credential.
    pub fn new(manager: AuthManager, store: TokenStore, credential: Credential) -> Self {
        Self {
            manager,
            store,
            credential: tokio::sync::RwLock::new(credential),
        }
    }

    /// Get a valid access token, refreshing if necessary.
    ///
    /// # Errors
    /// - Token refresh failed
    pub async fn access_token(&self) -> Result<String> {
        let credential = self.credential.read().await;

        if !credential.is_expired() {
            return Ok(credential.access_token.clone());
        }

        drop(credential);

        let mut credential = self.credential.write().await;

        // Double-check after acquiring write lock
        if !credential.is_expired() {
            return Ok(credential.access_token.clone());
        }

        tracing::info!("Refreshing expired access token");

        let refreshed = self.manager.refresh(&credential.refresh_token).await?;
        self.store.write(&refreshed)?;
        *credential = refreshed;

        Ok(credential.access_token.clone())
    }

    /// Get the current credential.
    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            client_id: "test_id".to_string(),
            client_secret: "test_secret".to_string(),
            redirect_url: "http://localhost:8080/callback".to_string(),
        }
    }

    fn test_credential(expiry: DateTime<Utc>) -> Credential {
        Credential {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expiry,
            scope: DRIVE_SCOPE.to_string(),
            token_type: "Bearer".to_string(),
        }
    }

    #[test]
    fn test_credential_expiration() {
        assert!(test_credential(Utc::now() - Duration::hours(1)).is_expired());
        assert!(!test_credential(Utc::now() + Duration::hours(1)).is_expired());
    }

    #[test]
    fn test_credential_near_expiration() {
        // Expiring in 4 minutes is inside the 5 minute buffer
        assert!(test_credential(Utc::now() + Duration::minutes(4)).is_expired());
    }

    #[test]
    fn test_credential_serialization() {
        let credential = test_credential(Utc::now());
        let json = serde_json::to_string(&credential).unwrap();
        let restored: Credential = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.access_token, credential.access_token);
        assert_eq!(restored.refresh_token, credential.refresh_token);
        assert_eq!(restored.token_type, "Bearer");
    }

    #[test]
    fn test_authorization_url_generation() {
        let manager = AuthManager::new(test_config()).unwrap();
        let (url, csrf_token) = manager.authorization_url();

        assert!(url.contains("accounts.google.com"));
        assert!(url.contains("client_id=test_id"));
        assert!(url.contains("scope="));
        assert!(url.contains("access_type=offline"));
        assert!(!csrf_token.is_empty());
    }

    #[test]
    fn test_begin_with_stored_credential_is_authorized() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .write(&test_credential(Utc::now() + Duration::hours(1)))
            .unwrap();

        let authorizer = Authorizer::new(AuthManager::new(test_config()).unwrap(), store);

        match authorizer.begin().unwrap() {
            AuthState::Authorized(credential) => {
                assert_eq!(credential.access_token, "access");
                assert_eq!(credential.refresh_token, "refresh");
            }
            other => panic!("expected Authorized, got {:?}", other),
        }
    }

    #[test]
    fn test_begin_without_credential_awaits_code() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let authorizer = Authorizer::new(AuthManager::new(test_config()).unwrap(), store);

        match authorizer.begin().unwrap() {
            AuthState::AwaitingCode { auth_url, .. } => {
                assert!(auth_url.contains("accounts.google.com"));
            }
            other => panic!("expected AwaitingCode, got {:?}", other),
        }
    }

    #[test]
    fn test_begin_with_malformed_credential_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();

        let authorizer = Authorizer::new(
            AuthManager::new(test_config()).unwrap(),
            TokenStore::new(path),
        );
        assert!(authorizer.begin().is_err());
    }

    #[tokio::test]
    async fn test_token_manager_returns_unexpired_token_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let manager = AuthManager::new(test_config()).unwrap();
        let token_manager = TokenManager::new(
            manager,
            store,
            test_credential(Utc::now() + Duration::hours(1)),
        );

        let token = token_manager.access_token().await.unwrap();
        assert_eq!(token, "access");
    }
}
