// This is the alert workflow - it reads the inventory columns, finds the
// low-stock products and hands the composed email to a mailer.
// There is no Google or SMTP code in here; both sides come in as traits so the
// whole run can be tested with in-memory doubles.

use async_trait::async_trait;
use thiserror::Error;

use super::alert_composer::compose_alert;
use super::alert_models::{
    AlertEmail, Delivery, InventorySheet, Recipients, RunReport, SenderIdentity, ALERT_SUBJECT,
};
use crate::core::stock::StockEvaluator;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// The reader's or mailer's own error, kept intact behind the trait boundary.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by the collaborators of the alert workflow.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Failed to read spreadsheet range {range}: {source}")]
    Spreadsheet {
        range: String,
        #[source]
        source: SourceError,
    },
    #[error("Failed to send email: {0}")]
    Mail(#[source] SourceError),
}

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Read access to a spreadsheet, one range at a time.
#[async_trait]
pub trait SpreadsheetReader: Send + Sync {
    /// Returns the rows of `range`. Each row holds the cells of that row in
    /// column order; trailing empty cells and empty trailing rows may be missing.
    async fn get_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, AlertError>;
}

/// Delivers one composed alert.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &AlertEmail) -> Result<(), AlertError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct StockAlertService<R: SpreadsheetReader, M: Mailer> {
    reader: R,
    /// `Err` holds the reason when the mail settings are incomplete.
    mailer: Result<M, String>,
    evaluator: StockEvaluator,
    sheet: InventorySheet,
    recipients: Recipients,
    sender: SenderIdentity,
}

impl<R: SpreadsheetReader, M: Mailer> StockAlertService<R, M> {
    pub fn new(
        reader: R,
        mailer: Result<M, String>,
        evaluator: StockEvaluator,
        sheet: InventorySheet,
        recipients: Recipients,
        sender: SenderIdentity,
    ) -> Self {
        Self {
            reader,
            mailer,
            evaluator,
            sheet,
            recipients,
            sender,
        }
    }

    /// Runs one pass: quantities, names, evaluation, composition, delivery.
    ///
    /// A spreadsheet failure ends the run before anything is composed. A mail
    /// failure is recorded in the report instead of being returned.
    pub async fn run(&self) -> Result<RunReport, AlertError> {
        let quantities = self.read_column(&self.sheet.stock_range).await?;
        let names = self.read_column(&self.sheet.name_range).await?;

        tracing::info!(
            names = names.len(),
            quantities = quantities.len(),
            "Fetched inventory columns"
        );

        let evaluation = self.evaluator.evaluate(&names, &quantities);
        tracing::info!(
            "Found {} product(s) below {} units",
            evaluation.entries.len(),
            self.evaluator.threshold()
        );

        let email = AlertEmail {
            from: self.recipients.from.clone(),
            to: self.recipients.to.clone(),
            subject: ALERT_SUBJECT.to_string(),
            html_body: compose_alert(&evaluation.entries, &self.sender),
        };

        let delivery = match &self.mailer {
            Ok(mailer) => match mailer.send(&email).await {
                Ok(()) => {
                    tracing::info!("Email sent to {}", email.to);
                    Delivery::Sent
                }
                Err(e) => {
                    tracing::error!("Failed to send the email: {}", e);
                    Delivery::Failed(e.to_string())
                }
            },
            Err(reason) => {
                tracing::error!("Email not sent: {}", reason);
                Delivery::Skipped(reason.clone())
            }
        };

        Ok(RunReport {
            rows_considered: evaluation.considered,
            low_stock: evaluation.entries,
            parse_failures: evaluation.parse_failures,
            delivery,
        })
    }

    /// Reads a single-column range and keeps the first cell of every row.
    async fn read_column(&self, range: &str) -> Result<Vec<Option<String>>, AlertError> {
        let rows = self
            .reader
            .get_range(&self.sheet.spreadsheet_id, range)
            .await?;

        Ok(rows.into_iter().map(|row| row.into_iter().next()).collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct InMemorySheet {
        ranges: HashMap<String, Vec<Vec<String>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl InMemorySheet {
        fn new(stock: &[&str], names: &[&str]) -> Self {
            let mut ranges = HashMap::new();
            ranges.insert("Stock!E2:E55".to_string(), to_rows(stock));
            ranges.insert("Stock!A2:A55".to_string(), to_rows(names));
            Self {
                ranges,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    // An empty string becomes an empty row, like the Sheets API returns for blank cells
    fn to_rows(values: &[&str]) -> Vec<Vec<String>> {
        values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    Vec::new()
                } else {
                    vec![v.to_string()]
                }
            })
            .collect()
    }

    #[async_trait]
    impl SpreadsheetReader for InMemorySheet {
        async fn get_range(
            &self,
            _spreadsheet_id: &str,
            range: &str,
        ) -> Result<Vec<Vec<String>>, AlertError> {
            self.calls.lock().unwrap().push(range.to_string());
            self.ranges
                .get(range)
                .cloned()
                .ok_or_else(|| AlertError::Spreadsheet {
                    range: range.to_string(),
                    source: "403 PERMISSION_DENIED".into(),
                })
        }
    }

    #[derive(Clone, Default)]
    struct RecordingMailer {
        sent: Arc<Mutex<Vec<AlertEmail>>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &AlertEmail) -> Result<(), AlertError> {
            if self.fail {
                return Err(AlertError::Mail("535 authentication failed".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn sheet() -> InventorySheet {
        InventorySheet {
            spreadsheet_id: "sheet-1".to_string(),
            stock_range: "Stock!E2:E55".to_string(),
            name_range: "Stock!A2:A55".to_string(),
        }
    }

    fn recipients() -> Recipients {
        Recipients {
            from: "alerts@example.com".to_string(),
            to: "buyer@example.com".to_string(),
        }
    }

    fn service(
        reader: InMemorySheet,
        mailer: Result<RecordingMailer, String>,
    ) -> StockAlertService<InMemorySheet, RecordingMailer> {
        StockAlertService::new(
            reader,
            mailer,
            StockEvaluator::default(),
            sheet(),
            recipients(),
            SenderIdentity::default(),
        )
    }

    #[tokio::test]
    async fn test_run_sends_low_stock_alert() {
        let mailer = RecordingMailer::default();
        let sent = Arc::clone(&mailer.sent);
        let reader = InMemorySheet::new(&["1", "", "5", "N/A"], &["A", "B", "C", "D", "E"]);
        let calls = Arc::clone(&reader.calls);

        let report = service(reader, Ok(mailer)).run().await.unwrap();

        assert_eq!(report.rows_considered, 4);
        assert_eq!(report.low_stock.len(), 1);
        assert_eq!(report.low_stock[0].name, "A");
        assert_eq!(report.parse_failures.len(), 1);
        assert_eq!(report.delivery, Delivery::Sent);

        // Quantities are read before names
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["Stock!E2:E55".to_string(), "Stock!A2:A55".to_string()]
        );

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, ALERT_SUBJECT);
        assert_eq!(sent[0].to, "buyer@example.com");
        assert!(sent[0].html_body.contains("Produto: A, Estoque: 1"));
    }

    #[tokio::test]
    async fn test_run_sends_placeholder_when_nothing_is_low() {
        let mailer = RecordingMailer::default();
        let sent = Arc::clone(&mailer.sent);
        let reader = InMemorySheet::new(&["10", "7"], &["A", "B"]);

        let report = service(reader, Ok(mailer)).run().await.unwrap();

        assert!(report.low_stock.is_empty());
        let sent = sent.lock().unwrap();
        assert!(sent[0]
            .html_body
            .contains("<li>Nenhum produto com estoque baixo.</li>"));
    }

    #[tokio::test]
    async fn test_spreadsheet_error_stops_before_mail() {
        let mailer = RecordingMailer::default();
        let sent = Arc::clone(&mailer.sent);
        let mut reader = InMemorySheet::new(&["1"], &["A"]);
        reader.ranges.remove("Stock!A2:A55");

        let result = service(reader, Ok(mailer)).run().await;

        match result {
            Err(AlertError::Spreadsheet { range, source }) => {
                assert_eq!(range, "Stock!A2:A55");
                assert_eq!(source.to_string(), "403 PERMISSION_DENIED");
            }
            other => panic!("expected a spreadsheet error, got {:?}", other.map(|_| ())),
        }
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mail_failure_is_reported() {
        let mailer = RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        };
        let reader = InMemorySheet::new(&["0"], &["A"]);

        let report = service(reader, Ok(mailer)).run().await.unwrap();

        assert!(matches!(report.delivery, Delivery::Failed(ref msg) if msg.contains("535")));
        assert_eq!(report.low_stock.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_mail_settings_skip_delivery() {
        let reader = InMemorySheet::new(&["0"], &["A"]);

        let report = service(reader, Err("ALERT_TO is not set".to_string()))
            .run()
            .await
            .unwrap();

        assert_eq!(
            report.delivery,
            Delivery::Skipped("ALERT_TO is not set".to_string())
        );
    }
}
