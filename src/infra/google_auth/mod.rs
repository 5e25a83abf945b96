// =============================================================================
// GOOGLE AUTH MODULE
// =============================================================================
//
// Produces a bearer token for the read-only Sheets scope.
//
// **Authentication Options:**
// 1. **Installed app (default)**: a user token stored in `token.json`
//    (Google's authorized-user layout). Refreshed when it expires; when there is
//    no usable token, a browser consent flow runs against a loopback listener
//    using the OAuth client from `client_secret.json`.
// 2. **Service Account**: set `GOOGLE_SERVICE_ACCOUNT_KEY` (path) or
//    `GOOGLE_SERVICE_ACCOUNT_JSON` (content) and share the spreadsheet with the
//    service account email. No browser involved.

pub mod authorized_user;
pub mod installed_flow;
pub mod service_account;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use authorized_user::AuthorizedUserToken;
pub use installed_flow::{ClientSecret, InstalledAppFlow};
pub use service_account::ServiceAccountAuth;

/// The only scope the alert needs.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Errors raised while obtaining Google credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid credentials JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token exchange failed ({status}): {body}")]
    TokenEndpoint { status: u16, body: String },
    #[error("Invalid client secret file: {0}")]
    InvalidClientSecret(String),
    #[error("Authorization was denied: {0}")]
    AuthorizationDenied(String),
    #[error("Authorization response did not match the request state")]
    StateMismatch,
    #[error("Authorization response had no code")]
    MissingCode,
    #[error("Failed to sign service account assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Token endpoint returned no usable access token")]
    MissingAccessToken,
}

/// A usable access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Where the service account key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceAccountSource {
    KeyFile(PathBuf),
    Json(String),
}

/// Settings for [`CredentialProvider::from_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleAuthConfig {
    pub token_file: PathBuf,
    pub client_secret_file: PathBuf,
    pub service_account: Option<ServiceAccountSource>,
}

/// Hands out valid credentials, refreshing or re-authorizing as needed.
pub enum CredentialProvider {
    InstalledApp {
        token_file: PathBuf,
        client_secret_file: PathBuf,
        client: reqwest::Client,
    },
    ServiceAccount(ServiceAccountAuth),
}

impl CredentialProvider {
    pub async fn from_config(config: &GoogleAuthConfig) -> Result<Self, AuthError> {
        match &config.service_account {
            Some(source) => {
                let auth = match source {
                    ServiceAccountSource::KeyFile(path) => {
                        ServiceAccountAuth::from_file(path, SHEETS_READONLY_SCOPE).await?
                    }
                    ServiceAccountSource::Json(json) => {
                        ServiceAccountAuth::from_json(json, SHEETS_READONLY_SCOPE)?
                    }
                };
                tracing::info!("Using service account {}", auth.client_email());
                Ok(Self::ServiceAccount(auth))
            }
            None => Ok(Self::InstalledApp {
                token_file: config.token_file.clone(),
                client_secret_file: config.client_secret_file.clone(),
                client: reqwest::Client::new(),
            }),
        }
    }

    pub async fn get_valid_credentials(&self) -> Result<Credential, AuthError> {
        match self {
            Self::ServiceAccount(auth) => auth.fetch_token().await,
            Self::InstalledApp {
                token_file,
                client_secret_file,
                client,
            } => installed_app_credentials(client, token_file, client_secret_file).await,
        }
    }
}

/// Stored token -> refresh -> browser consent, saving whatever was obtained.
async fn installed_app_credentials(
    client: &reqwest::Client,
    token_file: &Path,
    client_secret_file: &Path,
) -> Result<Credential, AuthError> {
    let stored = match AuthorizedUserToken::load(token_file).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("Ignoring unreadable token file {}: {}", token_file.display(), e);
            None
        }
    };

    if let Some(token) = &stored {
        if let Some(credential) = token.credential(Utc::now()) {
            tracing::debug!("Using stored Google token");
            return Ok(credential);
        }
    }

    let refreshed = match stored {
        Some(mut token) if token.refresh_token.is_some() => {
            match token.refresh(client, Utc::now()).await {
                Ok(()) => {
                    tracing::info!("Refreshed Google access token");
                    Some(token)
                }
                Err(e) => {
                    tracing::warn!("Token refresh failed, starting authorization: {}", e);
                    None
                }
            }
        }
        _ => None,
    };

    let token = match refreshed {
        Some(token) => token,
        None => {
            let secret = ClientSecret::from_file(client_secret_file).await?;
            InstalledAppFlow::new(secret, SHEETS_READONLY_SCOPE)
                .run_local_server(client)
                .await?
        }
    };

    token.save(token_file).await?;

    token
        .credential(Utc::now())
        .ok_or(AuthError::MissingAccessToken)
}
