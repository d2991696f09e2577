use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ValidationError;

/// Point-in-time price snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub explanation: String,
    #[serde(with = "time::serde::rfc3339")]
    pub as_of: OffsetDateTime,
}

impl Quote {
    /// Builds a quote stamped with the current UTC time.
    pub fn new(
        symbol: impl Into<String>,
        price: f64,
        change: f64,
        change_percent: f64,
        explanation: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        validate_finite("change", change)?;
        validate_finite("change_percent", change_percent)?;

        Ok(Self {
            symbol: symbol.into(),
            price,
            change,
            change_percent,
            explanation: explanation.into(),
            as_of: OffsetDateTime::now_utc(),
        })
    }

    /// Derives change figures from the current price and the previous close.
    ///
    /// A non-positive previous close yields a zero percentage instead of a
    /// division by zero.
    pub fn from_previous_close(
        symbol: impl Into<String>,
        price: f64,
        previous_close: f64,
        explanation: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_finite("previous_close", previous_close)?;
        let change = price - previous_close;
        let change_percent = if previous_close > 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };
        Self::new(symbol, price, change, change_percent, explanation)
    }

    pub fn with_as_of(mut self, as_of: OffsetDateTime) -> Self {
        self.as_of = as_of;
        self
    }
}

/// Expected price direction of a symbol mentioned in a headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Market headline with the symbols it is expected to move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub explanation: String,
    #[serde(default)]
    pub impact: BTreeMap<String, Direction>,
}

impl NewsItem {
    pub fn new(
        headline: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let headline = headline.into();
        if headline.trim().is_empty() {
            return Err(ValidationError::EmptyHeadline);
        }

        Ok(Self {
            headline,
            explanation: explanation.into(),
            impact: BTreeMap::new(),
        })
    }

    pub fn with_impact(mut self, symbol: impl Into<String>, direction: Direction) -> Self {
        self.impact.insert(symbol.into(), direction);
        self
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
