use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Normalized ticker symbol.
///
/// Exchange suffixes are kept as part of the symbol (`SHOP.TO`, `VOD.L`,
/// `7203.T`), so numeric tickers are accepted as long as they are ASCII.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphanumeric() {
                return Err(ValidationError::SymbolInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || ch == '.' || ch == '-';
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    /// Parses a comma separated list, skipping blank items.
    pub fn parse_list(input: &str) -> Result<Vec<Self>, ValidationError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ticker without its exchange suffix, lowercased (`shop` for `SHOP.TO`).
    pub fn root_lowercase(&self) -> String {
        let root = self.0.split('.').next().unwrap_or(&self.0);
        root.to_ascii_lowercase()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_symbol() {
        let parsed = Symbol::parse(" shop.to ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "SHOP.TO");
        assert_eq!(parsed.root_lowercase(), "shop");
    }

    #[test]
    fn accepts_numeric_exchange_tickers() {
        let parsed = Symbol::parse("7203.T").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "7203.T");
    }

    #[test]
    fn rejects_invalid_start() {
        let err = Symbol::parse(".AAPL").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidStart { ch: '.' }));
    }

    #[test]
    fn rejects_invalid_chars() {
        let err = Symbol::parse("AAPL$").expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::SymbolInvalidChar { ch: '$', index: 4 }
        ));
    }

    #[test]
    fn rejects_overlong_symbols() {
        let err = Symbol::parse("ABCDEFGHIJKLMNOP").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolTooLong { len: 16, .. }));
    }

    #[test]
    fn parses_comma_separated_lists() {
        let parsed = Symbol::parse_list("aapl, msft,,nvda ").expect("list should parse");
        let names: Vec<&str> = parsed.iter().map(Symbol::as_str).collect();
        assert_eq!(names, ["AAPL", "MSFT", "NVDA"]);

        assert!(Symbol::parse_list("AAPL,$").is_err());
    }
}
