// ============================================================================
// DOMAIN MODELS
// ============================================================================
// Everything here lives for a single run. Nothing is mutated after creation.

/// A product whose stock is below the alert threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockEntry {
    /// Product name, trimmed.
    pub name: String,
    /// Quantity built from the digits of the raw cell.
    pub quantity: u64,
}

/// A quantity cell that had no digits in it at all (e.g. "N/A").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Zero-based row offset inside the fetched range.
    pub row: usize,
    /// The cell exactly as it came from the sheet.
    pub raw_value: String,
}

/// Result of evaluating one pair of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Low-stock products in sheet order.
    pub entries: Vec<LowStockEntry>,
    /// Number of rows inspected, i.e. `min(names.len(), quantities.len())`.
    pub considered: usize,
    pub parse_failures: Vec<ParseFailure>,
}
