//! Exchange rate quotes.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Rate for one ordered currency pair at a point in time.
/// Fetched fresh for every evaluation, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Base currency code
    #[serde(rename = "from")]
    pub base: CompactString,
    /// Quote currency code
    #[serde(rename = "to")]
    pub target: CompactString,
    /// Units of `target` per unit of `base`
    pub rate: f64,
    /// Provider date (YYYY-MM-DD)
    pub date: String,
    /// Provider timestamp in unix seconds
    pub timestamp: i64,
}

impl RateQuote {
    pub fn new(base: &str, target: &str, rate: f64, date: impl Into<String>, timestamp: i64) -> Self {
        Self {
            base: CompactString::new(base),
            target: CompactString::new(target),
            rate,
            date: date.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_wire_names() {
        let quote = RateQuote::new("EUR", "COP", 4600.5, "2024-01-15", 1705312800);
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["from"], "EUR");
        assert_eq!(json["to"], "COP");
        assert_eq!(json["rate"], 4600.5);
        assert_eq!(json["date"], "2024-01-15");
        assert_eq!(json["timestamp"], 1705312800);
    }
}
