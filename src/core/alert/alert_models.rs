use crate::core::stock::{LowStockEntry, ParseFailure};

/// Subject line used for every alert.
pub const ALERT_SUBJECT: &str = "Aviso Urgente: Estoque Baixo";

/// Who signs the alert. Empty fields are left out of the footer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderIdentity {
    pub name: String,
    pub department: String,
    pub organization: String,
    pub email: String,
    pub phone: String,
}

/// Where the inventory lives inside the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySheet {
    pub spreadsheet_id: String,
    /// Column holding stock quantities, e.g. `2024!E2:E55`.
    pub stock_range: String,
    /// Column holding product names, e.g. `2024!A2:A55`.
    pub name_range: String,
}

/// A fully composed message, ready for the mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Sender and recipient of the alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    pub from: String,
    pub to: String,
}

/// What happened with the email at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Mail settings were incomplete, so nothing was attempted.
    Skipped(String),
    Failed(String),
}

/// Summary of one run, for the final status lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub rows_considered: usize,
    pub low_stock: Vec<LowStockEntry>,
    pub parse_failures: Vec<ParseFailure>,
    pub delivery: Delivery,
}
