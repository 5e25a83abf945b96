// =============================================================================
// GOOGLE SHEETS MODULE
// =============================================================================
//
// Infra side of the inventory read. The core only sees `SpreadsheetReader`;
// everything about URLs, bearer tokens and the Sheets JSON shape stays here.

pub mod google_sheets_client;

pub use google_sheets_client::GoogleSheetsClient;
