//! Keyword sentiment for headline impact.

use std::collections::BTreeMap;

use crate::{Direction, Symbol};

const POSITIVE: &[&str] = &[
    "up", "gain", "rise", "surge", "boost", "profit", "beat", "strong",
];
const NEGATIVE: &[&str] = &["down", "fall", "drop", "decline", "loss", "miss", "weak"];

/// Direction per watched symbol mentioned in `text`.
///
/// A symbol counts as mentioned when its ticker root appears as a word
/// (`shop` for `SHOP.TO`). Words match keyword stems by prefix, so
/// "surged" and "gains" count. Text with both positive and negative
/// keywords, or neither, assigns no direction.
pub fn extract_impact(text: &str, symbols: &[Symbol]) -> BTreeMap<String, Direction> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    let has_any = |stems: &[&str]| {
        words
            .iter()
            .any(|word| stems.iter().any(|stem| word.starts_with(*stem)))
    };
    let direction = match (has_any(POSITIVE), has_any(NEGATIVE)) {
        (true, false) => Direction::Up,
        (false, true) => Direction::Down,
        _ => return BTreeMap::new(),
    };

    symbols
        .iter()
        .filter(|symbol| {
            let root = symbol.root_lowercase();
            words.iter().any(|word| *word == root)
        })
        .map(|symbol| (symbol.as_str().to_owned(), direction))
        .collect()
}
