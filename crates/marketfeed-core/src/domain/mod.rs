//! # Domain Models
//!
//! Plain data carried through the provider chains.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Quote`] | Price snapshot with change figures and an explanation |
//! | [`NewsItem`] | Headline with per-symbol [`Direction`] impact |
//! | [`Symbol`] | Validated ticker, exchange suffix included |
//! | [`MarketProfile`] | Country watchlist, indexes and currency |
//!
//! The chains never look inside these values; they only care whether a
//! source found one. Validation happens at construction so adapters can
//! map a bad payload to a malformed-response error in one place.

mod market;
mod models;
mod symbol;

pub use market::{validate_country_code, MarketProfile, DEFAULT_COUNTRY};
pub use models::{Direction, NewsItem, Quote};
pub use symbol::Symbol;
