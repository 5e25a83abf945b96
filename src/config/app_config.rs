// Configuration comes from environment variables (a `.env` file is loaded
// first by main). Every knob has a default except the mail settings, which must
// never live in the source.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::alert::{InventorySheet, Recipients, SenderIdentity};
use crate::core::stock::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::infra::google_auth::{GoogleAuthConfig, ServiceAccountSource};
use crate::infra::mail::SmtpSettings;

const DEFAULT_SPREADSHEET_ID: &str = "1TRRcioYisDrhTVMgJV-evNAW8j-5u9QWjYT5t2U9zDg";
const DEFAULT_STOCK_RANGE: &str = "2024!E2:E55";
const DEFAULT_NAME_RANGE: &str = "2024!A2:A55";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SIGNATURE_DEPARTMENT: &str = "Setor de Compras";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Everything needed to send the alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub smtp: SmtpSettings,
    pub recipients: Recipients,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sheet: InventorySheet,
    pub threshold: u64,
    pub google: GoogleAuthConfig,
    /// `Err` lists the missing variables; the run still happens, only the send is skipped.
    pub mail: Result<MailConfig, String>,
    pub sender: SenderIdentity,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let sheet = InventorySheet {
            spreadsheet_id: get_or("SPREADSHEET_ID", DEFAULT_SPREADSHEET_ID),
            stock_range: get_or("STOCK_RANGE", DEFAULT_STOCK_RANGE),
            name_range: get_or("NAME_RANGE", DEFAULT_NAME_RANGE),
        };

        let threshold = match get("LOW_STOCK_THRESHOLD") {
            Some(value) => parse_number("LOW_STOCK_THRESHOLD", &value)?,
            None => DEFAULT_LOW_STOCK_THRESHOLD,
        };

        let service_account = get("GOOGLE_SERVICE_ACCOUNT_KEY")
            .map(|path| ServiceAccountSource::KeyFile(PathBuf::from(path)))
            .or_else(|| get("GOOGLE_SERVICE_ACCOUNT_JSON").map(ServiceAccountSource::Json));

        let google = GoogleAuthConfig {
            token_file: PathBuf::from(get_or("GOOGLE_TOKEN_FILE", "token.json")),
            client_secret_file: PathBuf::from(get_or(
                "GOOGLE_CLIENT_SECRET_FILE",
                "client_secret.json",
            )),
            service_account,
        };

        let port = match get("SMTP_PORT") {
            Some(value) => parse_number("SMTP_PORT", &value)?,
            None => DEFAULT_SMTP_PORT,
        };

        let from = get("ALERT_FROM");
        let to = get("ALERT_TO");
        // Spaces can be part of a password, so only blank values are dropped
        let password = lookup("SMTP_PASSWORD").filter(|v| !v.trim().is_empty());

        let mail = match (from.clone(), to, password) {
            (Some(from), Some(to), Some(password)) => Ok(MailConfig {
                smtp: SmtpSettings {
                    host: get_or("SMTP_HOST", DEFAULT_SMTP_HOST),
                    port,
                    username: get("SMTP_USERNAME").unwrap_or_else(|| from.clone()),
                    password,
                },
                recipients: Recipients { from, to },
            }),
            (from, to, password) => {
                let missing: Vec<&str> = [
                    ("ALERT_FROM", from.is_none()),
                    ("ALERT_TO", to.is_none()),
                    ("SMTP_PASSWORD", password.is_none()),
                ]
                .iter()
                .filter(|(_, missing)| *missing)
                .map(|(name, _)| *name)
                .collect();
                Err(format!("{} not set", missing.join(", ")))
            }
        };

        let sender = SenderIdentity {
            name: get_or("ALERT_SIGNATURE_NAME", ""),
            department: get_or("ALERT_SIGNATURE_DEPARTMENT", DEFAULT_SIGNATURE_DEPARTMENT),
            organization: get_or("ALERT_SIGNATURE_ORGANIZATION", ""),
            email: get("ALERT_SIGNATURE_EMAIL")
                .or(from)
                .unwrap_or_default(),
            phone: get_or("ALERT_SIGNATURE_PHONE", ""),
        };

        Ok(Self {
            sheet,
            threshold,
            google,
            mail,
            sender,
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.sheet.spreadsheet_id, DEFAULT_SPREADSHEET_ID);
        assert_eq!(config.sheet.stock_range, "2024!E2:E55");
        assert_eq!(config.sheet.name_range, "2024!A2:A55");
        assert_eq!(config.threshold, 3);
        assert_eq!(config.google.token_file, PathBuf::from("token.json"));
        assert_eq!(config.google.service_account, None);
        assert_eq!(
            config.mail,
            Err("ALERT_FROM, ALERT_TO, SMTP_PASSWORD not set".to_string())
        );
        assert_eq!(
            config.sender,
            SenderIdentity {
                department: "Setor de Compras".to_string(),
                ..SenderIdentity::default()
            }
        );
    }

    #[test]
    fn test_full_mail_config() {
        let config = config(&[
            ("ALERT_FROM", "alerts@example.com"),
            ("ALERT_TO", "buyer@example.com"),
            ("SMTP_PASSWORD", "app-password"),
            ("SMTP_PORT", "2525"),
        ])
        .unwrap();

        let mail = config.mail.unwrap();
        assert_eq!(mail.smtp.host, "smtp.gmail.com");
        assert_eq!(mail.smtp.port, 2525);
        assert_eq!(mail.smtp.username, "alerts@example.com");
        assert_eq!(mail.recipients.to, "buyer@example.com");
        assert_eq!(config.sender.email, "alerts@example.com");
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let config = config(&[
            ("ALERT_FROM", "alerts@example.com"),
            ("ALERT_TO", "  "),
            ("SMTP_PASSWORD", "x"),
        ])
        .unwrap();

        assert_eq!(config.mail, Err("ALERT_TO not set".to_string()));
    }

    #[test]
    fn test_password_is_not_trimmed() {
        let spaced = config(&[
            ("ALERT_FROM", " alerts@example.com "),
            ("ALERT_TO", "buyer@example.com"),
            ("SMTP_PASSWORD", " pass word "),
        ])
        .unwrap();

        let mail = spaced.mail.unwrap();
        assert_eq!(mail.smtp.password, " pass word ");
        assert_eq!(mail.recipients.from, "alerts@example.com");

        let blank = config(&[
            ("ALERT_FROM", "alerts@example.com"),
            ("ALERT_TO", "buyer@example.com"),
            ("SMTP_PASSWORD", "   "),
        ])
        .unwrap();
        assert_eq!(blank.mail, Err("SMTP_PASSWORD not set".to_string()));
    }

    #[test]
    fn test_signature_overrides() {
        let config = config(&[
            ("ALERT_SIGNATURE_NAME", "Maria Souza"),
            ("ALERT_SIGNATURE_DEPARTMENT", "Almoxarifado"),
            ("ALERT_SIGNATURE_EMAIL", "maria@example.com"),
        ])
        .unwrap();

        assert_eq!(config.sender.name, "Maria Souza");
        assert_eq!(config.sender.department, "Almoxarifado");
        assert_eq!(config.sender.email, "maria@example.com");
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(
            config(&[("LOW_STOCK_THRESHOLD", "three")]).unwrap_err(),
            ConfigError::InvalidNumber {
                var: "LOW_STOCK_THRESHOLD",
                value: "three".to_string(),
            }
        );
        assert!(config(&[("SMTP_PORT", "70000")]).is_err());
    }

    #[test]
    fn test_service_account_key_wins_over_json() {
        let config = config(&[
            ("GOOGLE_SERVICE_ACCOUNT_KEY", "/secrets/sa.json"),
            ("GOOGLE_SERVICE_ACCOUNT_JSON", "{}"),
        ])
        .unwrap();

        assert_eq!(
            config.google.service_account,
            Some(ServiceAccountSource::KeyFile(PathBuf::from(
                "/secrets/sa.json"
            )))
        );
    }
}
