// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Alternative to the user token for unattended runs (cron, CI):
//
// 1. Create a service account in the Google Cloud Console and enable the
//    Google Sheets API for its project.
// 2. Create a JSON key for it.
// 3. Share the inventory spreadsheet with the service account email
//    (looks like: name@project.iam.gserviceaccount.com), "Viewer" access.
// 4. Set `GOOGLE_SERVICE_ACCOUNT_KEY` to the key path, or
//    `GOOGLE_SERVICE_ACCOUNT_JSON` to the key content.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::authorized_user::{request_token, DEFAULT_TOKEN_URI};
use super::{AuthError, Credential};

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// The token URI (where to exchange JWT for access token).
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    /// Max 1 hour after `iat`.
    exp: i64,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    scope: String,
    client: Client,
}

impl ServiceAccountAuth {
    /// Creates a new authenticator from a JSON key file path.
    pub async fn from_file(path: &Path, scope: &str) -> Result<Self, AuthError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content, scope)
    }

    /// Creates a new authenticator from JSON content.
    pub fn from_json(json: &str, scope: &str) -> Result<Self, AuthError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)?;
        Ok(Self {
            credentials,
            scope: scope.to_string(),
            client: Client::new(),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Signs a JWT assertion and exchanges it for an access token.
    pub async fn fetch_token(&self) -> Result<Credential, AuthError> {
        let now = Utc::now();
        let jwt = self.signed_assertion(now.timestamp())?;

        let response = request_token(
            &self.client,
            &self.credentials.token_uri,
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ],
        )
        .await?;

        tracing::info!(
            "Obtained service account token for {}",
            self.credentials.client_email
        );

        Ok(Credential {
            access_token: response.access_token,
            expires_at: response.expires_in.map(|secs| now + Duration::seconds(secs)),
        })
    }

    fn claims(&self, now: i64) -> JwtClaims {
        JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        }
    }

    fn signed_assertion(&self, now: i64) -> Result<String, AuthError> {
        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        Ok(encode(&header, &self.claims(now), &key)?)
    }
}
