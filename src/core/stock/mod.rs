// Stock module - low-stock detection over raw spreadsheet columns.

pub mod stock_evaluator;
pub mod stock_models;

#[allow(unused_imports)]
pub use stock_evaluator::{parse_quantity, StockEvaluator, DEFAULT_LOW_STOCK_THRESHOLD};
#[allow(unused_imports)]
pub use stock_models::{Evaluation, LowStockEntry, ParseFailure};
