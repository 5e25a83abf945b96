// Browser consent for desktop OAuth clients.
//
// The flow binds 127.0.0.1 on a random port, prints the consent URL and waits
// for Google to redirect the browser back with `?code=...&state=...`. The code
// is then exchanged for an access token and a refresh token.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use super::authorized_user::{request_token, AuthorizedUserToken, DEFAULT_TOKEN_URI};
use super::AuthError;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

const SUCCESS_PAGE: &str =
    "The authentication flow has completed. You may close this window.";

/// The OAuth client downloaded from the Google Cloud Console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecretSection>,
    web: Option<ClientSecretSection>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretSection {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    auth_uri: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

impl ClientSecret {
    pub async fn from_file(path: &Path) -> Result<Self, AuthError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AuthError::InvalidClientSecret(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Accepts both the `installed` and the `web` client layouts.
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let file: ClientSecretFile = serde_json::from_str(json)?;
        let section = file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidClientSecret("expected an 'installed' or 'web' section".to_string())
        })?;

        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
            auth_uri: section
                .auth_uri
                .unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: section
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }
}

/// What came back on the loopback redirect.
#[derive(Debug, PartialEq, Eq)]
enum Redirect {
    Code { code: String, state: Option<String> },
    Error(String),
}

pub struct InstalledAppFlow {
    secret: ClientSecret,
    scope: String,
}

impl InstalledAppFlow {
    pub fn new(secret: ClientSecret, scope: &str) -> Self {
        Self {
            secret,
            scope: scope.to_string(),
        }
    }

    /// Runs the whole consent round trip and returns the new user token.
    pub async fn run_local_server(
        &self,
        client: &reqwest::Client,
    ) -> Result<AuthorizedUserToken, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let redirect_uri = format!("http://localhost:{}/", listener.local_addr()?.port());
        let state = random_state();

        let url = self.authorization_url(&redirect_uri, &state)?;
        println!("Please visit this URL to authorize this application: {}", url);

        let redirect = wait_for_redirect(&listener).await?;
        drop(listener);

        let code = match redirect {
            Redirect::Error(reason) => return Err(AuthError::AuthorizationDenied(reason)),
            Redirect::Code {
                state: returned, ..
            } if returned.as_deref() != Some(state.as_str()) => {
                return Err(AuthError::StateMismatch)
            }
            Redirect::Code { code, .. } => code,
        };

        let response = request_token(
            client,
            &self.secret.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("client_id", self.secret.client_id.as_str()),
                ("client_secret", self.secret.client_secret.as_str()),
            ],
        )
        .await?;

        tracing::info!("Google authorization completed");

        Ok(AuthorizedUserToken::from_response(
            response,
            &self.secret.client_id,
            &self.secret.client_secret,
            &self.secret.token_uri,
            &self.scope,
            Utc::now(),
        ))
    }

    fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.secret.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.secret.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", self.scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
            ],
        )
        .map_err(|e| AuthError::InvalidClientSecret(format!("bad auth_uri: {}", e)))
    }
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

/// Accepts one connection, answers it and returns what the query string said.
async fn wait_for_redirect(listener: &TcpListener) -> Result<Redirect, AuthError> {
    let (mut stream, _) = listener.accept().await?;
    let (read_half, mut write_half) = stream.split();
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Drain the headers so the browser sees a clean response
    loop {
        let mut header = String::new();
        let read = reader.read_line(&mut header).await?;
        if read == 0 || header.trim_end().is_empty() {
            break;
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        SUCCESS_PAGE.len(),
        SUCCESS_PAGE
    );
    write_half.write_all(response.as_bytes()).await?;
    write_half.flush().await?;

    parse_redirect(&request_line)
}

/// Parses `GET /?code=...&state=... HTTP/1.1`.
fn parse_redirect(request_line: &str) -> Result<Redirect, AuthError> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or(AuthError::MissingCode)?;

    let url = Url::parse(&format!("http://localhost{}", target))
        .map_err(|_| AuthError::MissingCode)?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Ok(Redirect::Error(error));
    }

    code.map(|code| Redirect::Code { code, state })
        .ok_or(AuthError::MissingCode)
}
