use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;

use crate::{Direction, MarketProfile, NewsItem, Quote, ValidationError};

/// Price used for symbols without a known base price.
const UNKNOWN_BASE_PRICE: f64 = 100.0;
/// Largest simulated move, in percent, either way.
const MAX_MOVE_PERCENT: f64 = 4.0;

const US_PRICES: &[(&str, f64, &str)] = &[
    ("AAPL", 225.40, "Apple - iPhones, iPads, Mac computers"),
    ("MSFT", 415.60, "Microsoft - Windows, Office, Xbox, cloud"),
    ("GOOGL", 175.30, "Google - Search, YouTube, Android"),
    ("AMZN", 185.20, "Amazon - Online shopping + AWS cloud"),
    ("NVDA", 875.50, "NVIDIA - AI chips that power ChatGPT"),
    ("TSLA", 248.90, "Tesla - Electric cars and solar panels"),
    ("META", 520.80, "Meta - Facebook, Instagram, WhatsApp, VR"),
    ("AVGO", 1650.30, "Broadcom - Chips for phones, WiFi, AI servers"),
    ("AMD", 142.80, "AMD - Computer chips, competes with Intel/NVIDIA"),
    ("CRM", 285.40, "Salesforce - Business customer software"),
];

const CA_PRICES: &[(&str, f64, &str)] = &[
    ("SHOP.TO", 85.20, "Shopify - E-commerce platform for businesses"),
    ("CNR.TO", 165.40, "Canadian National Railway - Freight transportation"),
    ("RY.TO", 145.80, "Royal Bank of Canada - Major Canadian bank"),
    ("TD.TO", 78.90, "TD Bank - Banking and financial services"),
    ("BNS.TO", 72.30, "Bank of Nova Scotia - International banking"),
    ("BMO.TO", 135.60, "Bank of Montreal - Banking services"),
    ("ENB.TO", 58.40, "Enbridge - Oil and gas pipeline company"),
    ("TRI.TO", 195.20, "Thomson Reuters - News and information services"),
    ("WCN.TO", 185.70, "Waste Connections - Waste management services"),
    ("CP.TO", 108.50, "Canadian Pacific Railway - Transportation"),
];

const GB_PRICES: &[(&str, f64, &str)] = &[
    ("SHEL.L", 28.50, "Shell - Oil and gas energy company"),
    ("AZN.L", 125.40, "AstraZeneca - Pharmaceutical company"),
    ("LSEG.L", 95.80, "London Stock Exchange Group - Financial markets"),
    ("UU.L", 10.25, "United Utilities - Water and wastewater services"),
    ("ULVR.L", 45.60, "Unilever - Consumer goods (soap, food)"),
    ("RDSA.L", 28.90, "Royal Dutch Shell - Energy company"),
    ("VOD.L", 0.75, "Vodafone - Mobile telecommunications"),
    ("BP.L", 4.85, "BP - British oil and gas company"),
    ("HSBA.L", 6.95, "HSBC - International banking"),
    ("GSK.L", 15.80, "GlaxoSmithKline - Pharmaceutical company"),
];

type Template = (&'static str, &'static str, &'static [(&'static str, Direction)]);

const US_NEWS: &[Template] = &[
    (
        "OpenAI partners with Broadcom for custom AI chips",
        "Broadcom will make specialized chips for OpenAI, reducing NVIDIA dependence",
        &[("AVGO", Direction::Up), ("NVDA", Direction::Down)],
    ),
    (
        "Apple announces record iPhone sales",
        "Strong consumer demand despite economic concerns",
        &[("AAPL", Direction::Up)],
    ),
    (
        "Tesla Autopilot gets safety approval",
        "Self-driving cars closer to reality, Tesla leading",
        &[("TSLA", Direction::Up)],
    ),
    (
        "Meta VR headset sales exceed expectations",
        "Virtual reality gaining mainstream adoption",
        &[("META", Direction::Up)],
    ),
];

const CA_NEWS: &[Template] = &[
    (
        "Shopify expands into European markets",
        "E-commerce platform gaining international traction",
        &[("SHOP.TO", Direction::Up)],
    ),
    (
        "Canadian banks report strong quarterly results",
        "Interest rate environment boosting bank profits",
        &[
            ("RY.TO", Direction::Up),
            ("TD.TO", Direction::Up),
            ("BNS.TO", Direction::Up),
        ],
    ),
    (
        "Oil pipeline expansion approved",
        "Enbridge gets regulatory approval for new pipeline",
        &[("ENB.TO", Direction::Up)],
    ),
];

const GB_NEWS: &[Template] = &[
    (
        "Shell reports record quarterly profits",
        "Oil prices boost energy company revenues",
        &[("SHEL.L", Direction::Up), ("BP.L", Direction::Up)],
    ),
    (
        "AstraZeneca drug trial shows promising results",
        "New cancer treatment could boost pharmaceutical revenues",
        &[("AZN.L", Direction::Up), ("GSK.L", Direction::Up)],
    ),
    (
        "London Stock Exchange sees increased trading volume",
        "Market volatility driving higher transaction fees",
        &[("LSEG.L", Direction::Up)],
    ),
    (
        "UK utilities face regulatory pressure",
        "Government considering price caps on water companies",
        &[("UU.L", Direction::Down)],
    ),
];

const GLOBAL_NEWS: &[(&str, &str)] = &[
    (
        "Global markets show positive momentum",
        "International trade improving across regions",
    ),
    (
        "Technology sector leads market gains",
        "Digital transformation driving growth",
    ),
    (
        "Central bank policy supports market stability",
        "Monetary policy providing economic support",
    ),
];

/// Offline market simulation used as the chains' fallback generator.
///
/// Quotes move a random amount within ±4% of a per-market base price;
/// headlines are two or three templates for the market. Clones share one
/// random stream.
#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    profile: MarketProfile,
    rng: Arc<Mutex<fastrand::Rng>>,
}

impl SyntheticMarket {
    pub fn new(profile: MarketProfile) -> Self {
        Self {
            profile,
            rng: Arc::new(Mutex::new(fastrand::Rng::new())),
        }
    }

    pub fn for_country(code: &str) -> Result<Self, ValidationError> {
        MarketProfile::for_country(code).map(Self::new)
    }

    /// Reproducible simulation.
    pub fn with_seed(profile: MarketProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: Arc::new(Mutex::new(fastrand::Rng::with_seed(seed))),
        }
    }

    pub fn profile(&self) -> &MarketProfile {
        &self.profile
    }

    pub fn base_price(&self, symbol: &str) -> f64 {
        self.lookup(symbol)
            .map(|(_, price, _)| *price)
            .unwrap_or(UNKNOWN_BASE_PRICE)
    }

    /// Simulated quote for any symbol.
    pub fn quote(&self, symbol: &str) -> Quote {
        let base_price = self.base_price(symbol);
        let change_percent = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            (rng.f64() * 2.0 - 1.0) * MAX_MOVE_PERCENT
        };
        let change = base_price * change_percent / 100.0;

        Quote {
            symbol: symbol.to_owned(),
            price: base_price + change,
            change,
            change_percent,
            explanation: self.explanation(symbol, change_percent),
            as_of: OffsetDateTime::now_utc(),
        }
    }

    /// Quotes for the whole watchlist, in watchlist order.
    pub fn quotes(&self) -> Vec<Quote> {
        self.profile
            .watchlist
            .iter()
            .map(|symbol| self.quote(symbol.as_str()))
            .collect()
    }

    /// Two or three headlines for the market, in random order.
    pub fn news(&self) -> Vec<NewsItem> {
        let mut templates = self.templates();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.shuffle(&mut templates);
        let count = rng.usize(2..=3).min(templates.len());
        templates.truncate(count);
        templates
    }

    fn lookup(&self, symbol: &str) -> Option<&'static (&'static str, f64, &'static str)> {
        self.price_table()
            .iter()
            .find(|(known, _, _)| *known == symbol)
    }

    fn price_table(&self) -> &'static [(&'static str, f64, &'static str)] {
        match self.profile.country.as_str() {
            "CA" => CA_PRICES,
            "GB" => GB_PRICES,
            _ => US_PRICES,
        }
    }

    fn company(&self, symbol: &str) -> String {
        let has_descriptions = matches!(self.profile.country.as_str(), "US" | "CA" | "GB");
        match self.lookup(symbol) {
            Some((_, _, description)) if has_descriptions => (*description).to_owned(),
            _ if self
                .profile
                .watchlist
                .iter()
                .any(|watched| watched.as_str() == symbol) =>
            {
                format!("{symbol} - Major company")
            }
            _ => format!("{symbol} stock"),
        }
    }

    fn explanation(&self, symbol: &str, change_percent: f64) -> String {
        let company = self.company(symbol);
        if change_percent.abs() < 1.0 {
            format!("{company} - Normal trading")
        } else if change_percent > 0.0 {
            format!("📈 Strong performance - {company}")
        } else {
            format!("📉 Temporary dip - {company}")
        }
    }

    fn templates(&self) -> Vec<NewsItem> {
        let table = match self.profile.country.as_str() {
            "US" => US_NEWS,
            "CA" => CA_NEWS,
            "GB" => GB_NEWS,
            _ => return self.global_templates(),
        };

        table
            .iter()
            .map(|(headline, explanation, impact)| NewsItem {
                headline: (*headline).to_owned(),
                explanation: (*explanation).to_owned(),
                impact: impact
                    .iter()
                    .map(|(symbol, direction)| ((*symbol).to_owned(), *direction))
                    .collect(),
            })
            .collect()
    }

    fn global_templates(&self) -> Vec<NewsItem> {
        GLOBAL_NEWS
            .iter()
            .zip(self.profile.watchlist.iter())
            .map(|((headline, explanation), symbol)| NewsItem {
                headline: (*headline).to_owned(),
                explanation: (*explanation).to_owned(),
                impact: BTreeMap::from([(symbol.as_str().to_owned(), Direction::Up)]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(country: &str) -> SyntheticMarket {
        SyntheticMarket::with_seed(MarketProfile::for_country(country).expect("profile"), 7)
    }

    #[test]
    fn quote_stays_within_four_percent_of_base() {
        let market = market("US");

        for _ in 0..200 {
            let quote = market.quote("NVDA");
            assert!(quote.change_percent.abs() <= MAX_MOVE_PERCENT);
            assert!((quote.price - 875.50 - quote.change).abs() < 1e-9);
        }
    }

    #[test]
    fn unknown_symbol_uses_default_base_price() {
        let market = market("US");
        let quote = market.quote("ZZZZ");

        assert!(quote.price >= 96.0 && quote.price <= 104.0);
        assert!(quote.explanation.contains("ZZZZ stock"));
    }

    #[test]
    fn markets_use_their_own_price_tables() {
        assert_eq!(market("GB").base_price("VOD.L"), 0.75);
        assert_eq!(market("CA").base_price("SHOP.TO"), 85.20);
        assert_eq!(market("DE").base_price("SAP.DE"), UNKNOWN_BASE_PRICE);
        assert_eq!(market("DE").base_price("NVDA"), 875.50);
    }

    #[test]
    fn watchlist_quotes_follow_watchlist_order() {
        let market = market("CA");
        let symbols: Vec<String> = market.quotes().into_iter().map(|q| q.symbol).collect();

        assert_eq!(symbols.len(), 10);
        assert_eq!(symbols[0], "SHOP.TO");
        assert_eq!(symbols[9], "CP.TO");
    }

    #[test]
    fn news_picks_two_or_three_distinct_templates() {
        let market = market("GB");

        for _ in 0..50 {
            let news = market.news();
            assert!((2..=3).contains(&news.len()));
            assert_ne!(news[0].headline, news[1].headline);
        }
    }

    #[test]
    fn global_news_mentions_watchlist_heads() {
        let market = market("JP");
        let news = market.news();

        assert!(news
            .iter()
            .all(|item| item.impact.values().all(|direction| *direction == Direction::Up)));
        assert!(news
            .iter()
            .any(|item| item.impact.contains_key("7203.T")
                || item.impact.contains_key("6758.T")
                || item.impact.contains_key("9984.T")));
    }

    #[test]
    fn same_seed_same_quotes() {
        let first = market("US").quote("AAPL");
        let second = market("US").quote("AAPL");
        assert_eq!(first.change_percent, second.change_percent);
    }
}
