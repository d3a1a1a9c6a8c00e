use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::sync::Mutex;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|error| AppError::Auth(format!("failed to read credentials {}: {}", path.display(), error)))?;
        Self::from_json(&raw).map_err(|error| match error {
            AppError::Auth(message) => AppError::Auth(format!("{}: {}", path.display(), message)),
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        let key: Self = serde_json::from_str(raw)
            .map_err(|error| AppError::Auth(format!("invalid service account key: {}", error)))?;
        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            return Err(AppError::Auth(
                "service account key needs client_email and private_key".to_string(),
            ));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(key: &ServiceAccountKey, scope: &str, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: key.client_email.clone(),
            scope: scope.to_string(),
            aud: key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

/// Exchanges signed service-account assertions for bearer tokens and reuses
/// each token until shortly before it expires.
#[derive(Debug)]
pub struct TokenProvider {
    key: ServiceAccountKey,
    scope: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            key,
            scope: scope.into(),
            http,
            cached: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_cached_token(key: ServiceAccountKey, access_token: &str) -> Self {
        Self {
            key,
            scope: SPREADSHEETS_SCOPE.to_string(),
            http: reqwest::Client::new(),
            cached: Mutex::new(Some(CachedToken {
                access_token: access_token.to_string(),
                expires_at: Utc::now() + Duration::seconds(ASSERTION_LIFETIME_SECS),
            })),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        let assertion = sign_assertion(&self.key, &self.scope, now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|error| AppError::Auth(format!("token request failed: {}", error)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!("token exchange rejected ({}): {}", status, body.trim())));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|error| AppError::Auth(format!("invalid token response: {}", error)))?;
        tracing::debug!(expires_in = token.expires_in, "obtained access token");

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        });
        Ok(access_token)
    }
}

pub fn sign_assertion(key: &ServiceAccountKey, scope: &str, now: DateTime<Utc>) -> AppResult<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|error| AppError::Auth(format!("invalid private key: {}", error)))?;
    Ok(jsonwebtoken::encode(&header, &AssertionClaims::new(key, scope, now), &encoding_key)?)
}
