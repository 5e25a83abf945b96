// This is the entry point of the low-stock alert.
//
// **Architecture Overview:**
// - `core/` = Business logic (stock evaluation, email composition, the run itself)
// - `infra/` = Implementations of core traits (Google auth, Google Sheets, SMTP)
// - `config/` = Settings read from the environment
//
// This file's job is to:
// 1. Load configuration
// 2. Obtain Google credentials
// 3. Wire the services together (dependency injection)
// 4. Run once and report
//
// Every failure is logged; the process always exits normally.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "config/app_config.rs"]
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core::alert::{Delivery, Recipients, RunReport, StockAlertService};
use crate::core::stock::StockEvaluator;
use crate::infra::google_auth::CredentialProvider;
use crate::infra::google_sheets::GoogleSheetsClient;
use crate::infra::mail::SmtpMailer;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{:#}", e);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    // ========================================================================
    // CREDENTIALS
    // ========================================================================

    let provider = CredentialProvider::from_config(&config.google)
        .await
        .context("Failed to load Google credentials")?;
    let credential = provider
        .get_valid_credentials()
        .await
        .context("Failed to obtain Google credentials")?;
    if let Some(expires_at) = credential.expires_at {
        tracing::debug!("Google token valid until {}", expires_at);
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let reader = GoogleSheetsClient::new(credential);

    let (mailer, recipients) = match config.mail {
        Ok(mail) => (Ok(SmtpMailer::new(mail.smtp)), mail.recipients),
        Err(reason) => (Err(reason), Recipients::default()),
    };

    let service = StockAlertService::new(
        reader,
        mailer,
        StockEvaluator::new(config.threshold),
        config.sheet,
        recipients,
        config.sender,
    );

    match service.run().await {
        Ok(report) => print_report(&report),
        Err(e) => tracing::error!("Error accessing the API: {}", e),
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "📦 {} row(s) checked, {} low-stock product(s), {} unreadable quantit{}",
        report.rows_considered,
        report.low_stock.len(),
        report.parse_failures.len(),
        if report.parse_failures.len() == 1 { "y" } else { "ies" }
    );

    for entry in &report.low_stock {
        println!("   - {}: {}", entry.name, entry.quantity);
    }
    for failure in &report.parse_failures {
        println!("   ? row {}: '{}'", failure.row + 1, failure.raw_value);
    }

    match &report.delivery {
        Delivery::Sent => println!("✅ Email sent"),
        Delivery::Skipped(reason) => println!("⚠️ Email skipped: {}", reason),
        Delivery::Failed(reason) => println!("❌ Email failed: {}", reason),
    }
}
