// Alert module - turns the inventory sheet into a low-stock email.

pub mod alert_composer;
pub mod alert_models;
pub mod alert_service;

#[allow(unused_imports)]
pub use alert_models::{
    AlertEmail, Delivery, InventorySheet, Recipients, RunReport, SenderIdentity, ALERT_SUBJECT,
};
pub use alert_service::{AlertError, Mailer, SpreadsheetReader, StockAlertService};
