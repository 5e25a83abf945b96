// Low-stock detection.
//
// The two columns come from separate range reads, so they are paired purely by
// row offset. Quantity cells are free text typed by people ("2 un", "approx 1",
// "N/A"), which is why parsing keeps every digit and throws everything else away.

use super::stock_models::{Evaluation, LowStockEntry, ParseFailure};

/// Products with strictly fewer units than this are reported.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 3;

/// First code point of every run of ten Unicode decimal digits (category Nd).
const DECIMAL_DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0,
    0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50, 0x11D50,
    0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6,
    0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950, 0x1FBF0,
];

/// Value of a decimal digit in any script: `'7'`, `'７'` and `'٧'` are all 7.
/// Other numeric characters (`'½'`, `'²'`, roman numerals) are not digits.
fn decimal_digit(c: char) -> Option<u32> {
    if c.is_ascii() {
        return c.to_digit(10);
    }
    if !c.is_numeric() {
        return None;
    }

    let code = c as u32;
    DECIMAL_DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .map(|zero| code - zero)
}

/// Builds an integer from every decimal digit in `raw`, in order.
///
/// Signs, decimal points and any other characters are dropped, so `"-3"` is `3`
/// and `"1-2"` is `12`. Returns `None` when there is no digit at all.
/// A digit run too long for `u64` saturates to `u64::MAX`; it is above any
/// threshold either way.
pub fn parse_quantity(raw: &str) -> Option<u64> {
    let digits: String = raw
        .chars()
        .filter_map(decimal_digit)
        .filter_map(|d| char::from_digit(d, 10))
        .collect();
    if digits.is_empty() {
        return None;
    }

    Some(digits.parse::<u64>().unwrap_or(u64::MAX))
}

/// Pairs product names with quantities and keeps the ones below the threshold.
#[derive(Debug, Clone, Copy)]
pub struct StockEvaluator {
    threshold: u64,
}

impl StockEvaluator {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Walks both columns up to the shorter length.
    ///
    /// A row is skipped when either cell is missing or blank. Parse failures are
    /// logged and collected but never stop the walk.
    pub fn evaluate(&self, names: &[Option<String>], quantities: &[Option<String>]) -> Evaluation {
        let considered = names.len().min(quantities.len());
        let mut evaluation = Evaluation {
            considered,
            ..Evaluation::default()
        };

        for (row, (name, quantity)) in names.iter().zip(quantities.iter()).enumerate() {
            let (Some(name), Some(raw_quantity)) = (non_empty(name), non_empty(quantity)) else {
                continue;
            };

            let Some(quantity) = parse_quantity(raw_quantity.trim()) else {
                tracing::warn!(row, "Value '{}' is not a valid number", raw_quantity);
                evaluation.parse_failures.push(ParseFailure {
                    row,
                    raw_value: raw_quantity.to_string(),
                });
                continue;
            };

            if quantity < self.threshold {
                evaluation.entries.push(LowStockEntry {
                    name: name.trim().to_string(),
                    quantity,
                });
            }
        }

        evaluation
    }
}

impl Default for StockEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_STOCK_THRESHOLD)
    }
}

fn non_empty(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    None
                } else {
                    Some(v.to_string())
                }
            })
            .collect()
    }

    #[test]
    fn test_parse_quantity_permissive() {
        assert_eq!(parse_quantity("5 units"), Some(5));
        assert_eq!(parse_quantity("approx 2 units"), Some(2));
        assert_eq!(parse_quantity("-3"), Some(3));
        assert_eq!(parse_quantity("1-2"), Some(12));
        assert_eq!(parse_quantity("2.5"), Some(25));
        assert_eq!(parse_quantity("N/A"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn test_parse_quantity_other_scripts() {
        assert_eq!(parse_quantity("３"), Some(3));
        assert_eq!(parse_quantity("٢ un"), Some(2));
        assert_eq!(parse_quantity("１0"), Some(10));
        assert_eq!(parse_quantity("½"), None);
        assert_eq!(parse_quantity("x²"), None);

        let result = StockEvaluator::default().evaluate(&column(&["A"]), &column(&["２"]));
        assert_eq!(
            result.entries,
            vec![LowStockEntry {
                name: "A".to_string(),
                quantity: 2,
            }]
        );
        assert!(result.parse_failures.is_empty());
    }

    #[test]
    fn test_parse_quantity_huge_value() {
        assert_eq!(parse_quantity("99999999999999999999999"), Some(u64::MAX));
    }

    #[test]
    fn test_threshold_boundary() {
        let evaluator = StockEvaluator::default();
        let result = evaluator.evaluate(&column(&["A", "B"]), &column(&["3", "2"]));

        assert_eq!(
            result.entries,
            vec![LowStockEntry {
                name: "B".to_string(),
                quantity: 2,
            }]
        );
    }

    #[test]
    fn test_skips_empty_quantity_and_high_stock() {
        let evaluator = StockEvaluator::default();
        let result = evaluator.evaluate(&column(&["A", "B", "C"]), &column(&["1", "", "5"]));

        assert_eq!(
            result.entries,
            vec![LowStockEntry {
                name: "A".to_string(),
                quantity: 1,
            }]
        );
        assert!(result.parse_failures.is_empty());
    }

    #[test]
    fn test_empty_string_cell_is_skipped() {
        let evaluator = StockEvaluator::default();
        let names = vec![Some("A".to_string()), Some(String::new())];
        let quantities = vec![Some(String::new()), Some("0".to_string())];

        let result = evaluator.evaluate(&names, &quantities);
        assert!(result.entries.is_empty());
        assert!(result.parse_failures.is_empty());
    }

    #[test]
    fn test_mismatched_lengths_only_consider_shorter() {
        let evaluator = StockEvaluator::default();
        let names = column(&["A", "B", "C", "D", "E"]);
        let quantities = column(&["5", "1", "9"]);

        let result = evaluator.evaluate(&names, &quantities);
        assert_eq!(result.considered, 3);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].name, "B");
    }

    #[test]
    fn test_parse_failure_is_recorded_and_skipped() {
        let evaluator = StockEvaluator::default();
        let result = evaluator.evaluate(&column(&["A", "B"]), &column(&["N/A", "0"]));

        assert_eq!(
            result.parse_failures,
            vec![ParseFailure {
                row: 0,
                raw_value: "N/A".to_string(),
            }]
        );
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].name, "B");
    }

    #[test]
    fn test_names_are_trimmed() {
        let evaluator = StockEvaluator::default();
        let result = evaluator.evaluate(&column(&["  Caneta azul  "]), &column(&[" 1 un "]));

        assert_eq!(result.entries[0].name, "Caneta azul");
        assert_eq!(result.entries[0].quantity, 1);
    }

    #[test]
    fn test_sign_is_stripped_before_threshold() {
        let evaluator = StockEvaluator::default();
        let result = evaluator.evaluate(&column(&["A", "B"]), &column(&["-3", "-1"]));

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].name, "B");
        assert_eq!(result.entries[0].quantity, 1);
    }

    #[test]
    fn test_evaluation_is_idempotent_and_bounded() {
        let evaluator = StockEvaluator::new(10);
        let names = column(&["A", "B", "", "D"]);
        let quantities = column(&["1", "x", "2", "11", "0"]);

        let first = evaluator.evaluate(&names, &quantities);
        let second = evaluator.evaluate(&names, &quantities);

        assert_eq!(first, second);
        assert!(first.entries.len() <= names.len().min(quantities.len()));
    }

    #[test]
    fn test_custom_threshold() {
        let evaluator = StockEvaluator::new(10);
        let result = evaluator.evaluate(&column(&["A", "B"]), &column(&["9", "10"]));

        assert_eq!(evaluator.threshold(), 10);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].quantity, 9);
    }
}
