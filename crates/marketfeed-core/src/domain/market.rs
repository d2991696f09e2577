use serde::{Deserialize, Serialize};

use crate::{Symbol, ValidationError};

/// Country used when none is configured.
pub const DEFAULT_COUNTRY: &str = "US";

struct MarketTable {
    code: &'static str,
    indexes: &'static [&'static str],
    watchlist: &'static [&'static str],
    currency: &'static str,
}

const US_WATCHLIST: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "META", "AVGO", "AMD", "CRM",
];

const MARKETS: &[MarketTable] = &[
    MarketTable {
        code: "US",
        indexes: &["S&P 500", "NASDAQ", "DOW"],
        watchlist: US_WATCHLIST,
        currency: "USD",
    },
    MarketTable {
        code: "CA",
        indexes: &["TSX", "TSX Venture"],
        watchlist: &[
            "SHOP.TO", "CNR.TO", "RY.TO", "TD.TO", "BNS.TO", "BMO.TO", "ENB.TO", "TRI.TO",
            "WCN.TO", "CP.TO",
        ],
        currency: "CAD",
    },
    MarketTable {
        code: "GB",
        indexes: &["FTSE 100", "FTSE 250"],
        watchlist: &[
            "SHEL.L", "AZN.L", "LSEG.L", "UU.L", "ULVR.L", "RDSA.L", "VOD.L", "BP.L", "HSBA.L",
            "GSK.L",
        ],
        currency: "GBP",
    },
    MarketTable {
        code: "DE",
        indexes: &["DAX", "MDAX"],
        watchlist: &[
            "SAP.DE", "ASML.AS", "NVDA", "TSLA", "META", "GOOGL", "AAPL", "MSFT", "AMZN", "AMD",
        ],
        currency: "EUR",
    },
    MarketTable {
        code: "JP",
        indexes: &["Nikkei 225", "TOPIX"],
        watchlist: &[
            "7203.T", "6758.T", "9984.T", "6861.T", "8306.T", "9432.T", "4063.T", "6098.T",
            "7974.T", "8035.T",
        ],
        currency: "JPY",
    },
    MarketTable {
        code: "IN",
        indexes: &["SENSEX", "NIFTY 50"],
        watchlist: &[
            "RELIANCE.NS",
            "TCS.NS",
            "HDFCBANK.NS",
            "INFY.NS",
            "HINDUNILVR.NS",
            "ICICIBANK.NS",
            "SBIN.NS",
            "BHARTIARTL.NS",
            "ITC.NS",
            "KOTAKBANK.NS",
        ],
        currency: "INR",
    },
];

/// Market metadata for a country: indexes, default watchlist and currency.
///
/// Countries without a dedicated table get the US watchlist under a
/// "Global Markets" index with `fallback` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketProfile {
    pub country: String,
    pub country_name: String,
    pub indexes: Vec<String>,
    pub watchlist: Vec<Symbol>,
    pub currency: String,
    pub fallback: bool,
}

impl MarketProfile {
    pub fn for_country(code: &str) -> Result<Self, ValidationError> {
        let country = validate_country_code(code)?;
        let table = MARKETS.iter().find(|table| table.code == country);

        let profile = match table {
            Some(table) => Self {
                country_name: country_name(&country),
                country,
                indexes: table.indexes.iter().map(|index| (*index).to_owned()).collect(),
                watchlist: parse_symbols(table.watchlist)?,
                currency: table.currency.to_owned(),
                fallback: false,
            },
            None => Self {
                country_name: country_name(&country),
                country,
                indexes: vec![String::from("Global Markets")],
                watchlist: parse_symbols(US_WATCHLIST)?,
                currency: String::from("USD"),
                fallback: true,
            },
        };

        Ok(profile)
    }

    pub fn is_supported(code: &str) -> bool {
        MARKETS
            .iter()
            .any(|table| table.code.eq_ignore_ascii_case(code.trim()))
    }
}

/// Validate and normalize a country to an uppercase 2-letter code.
pub fn validate_country_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 2 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCountry {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn country_name(code: &str) -> String {
    let name = match code {
        "US" => "United States",
        "CA" => "Canada",
        "GB" => "United Kingdom",
        "DE" => "Germany",
        "JP" => "Japan",
        "IN" => "India",
        "FR" => "France",
        "IT" => "Italy",
        "ES" => "Spain",
        "NL" => "Netherlands",
        "AU" => "Australia",
        "BR" => "Brazil",
        "MX" => "Mexico",
        "KR" => "South Korea",
        "CN" => "China",
        "SG" => "Singapore",
        "HK" => "Hong Kong",
        "CH" => "Switzerland",
        "SE" => "Sweden",
        "NO" => "Norway",
        "DK" => "Denmark",
        other => return format!("{other} (Global Market)"),
    };
    name.to_owned()
}

fn parse_symbols(raw: &[&str]) -> Result<Vec<Symbol>, ValidationError> {
    raw.iter().map(|symbol| Symbol::parse(symbol)).collect()
}
