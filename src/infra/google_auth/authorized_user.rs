use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

use super::{AuthError, Credential};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// User credentials in Google's authorized-user JSON layout (`token.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizedUserToken {
    /// The access token. Absent in files that only carry a refresh token.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    /// Fields we don't use (`universe_domain`, `account`, ...) survive a rewrite.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Body returned by the OAuth2 token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl AuthorizedUserToken {
    /// Loads the token file. A missing file is not an error.
    pub async fn load(path: &Path) -> Result<Option<Self>, AuthError> {
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(path).await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub async fn save(&self, path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).await?;
        Ok(())
    }

    /// Returns the access token if it is present and not about to expire.
    /// A token without an expiry is taken at face value.
    pub fn credential(&self, now: DateTime<Utc>) -> Option<Credential> {
        let token = self.token.as_ref().filter(|t| !t.is_empty())?;

        if let Some(expiry) = self.expiry {
            if expiry <= now + Duration::seconds(EXPIRY_MARGIN_SECS) {
                return None;
            }
        }

        Some(Credential {
            access_token: token.clone(),
            expires_at: self.expiry,
        })
    }

    /// Builds a token from a fresh token endpoint response.
    pub(crate) fn from_response(
        response: TokenResponse,
        client_id: &str,
        client_secret: &str,
        token_uri: &str,
        requested_scope: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let scopes = response
            .scope
            .as_deref()
            .unwrap_or(requested_scope)
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Self {
            token: Some(response.access_token),
            refresh_token: response.refresh_token,
            token_uri: token_uri.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scopes,
            expiry: response.expires_in.map(|secs| now + Duration::seconds(secs)),
            extra: HashMap::new(),
        }
    }

    /// Swaps the refresh token for a new access token, in place.
    pub async fn refresh(
        &mut self,
        client: &reqwest::Client,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let refresh_token = self
            .refresh_token
            .clone()
            .ok_or(AuthError::MissingAccessToken)?;

        let response = request_token(
            client,
            &self.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ],
        )
        .await?;

        self.apply_refresh(response, now);
        Ok(())
    }

    fn apply_refresh(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = Some(response.access_token);
        self.expiry = response.expires_in.map(|secs| now + Duration::seconds(secs));
        // Google usually omits the refresh token on refresh; keep the old one then.
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
    }
}

/// POSTs a form to the token endpoint and decodes the answer.
pub(crate) async fn request_token(
    client: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let response = client.post(token_uri).form(form).send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await?;
        return Err(AuthError::TokenEndpoint { status, body });
    }

    Ok(response.json().await?)
}
