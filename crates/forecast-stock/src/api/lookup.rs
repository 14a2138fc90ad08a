//! Company-name to ticker lookup against Yahoo's search endpoint

use crate::cache::{CacheKey, ResponseCache};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::RateLimiter;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Longest query accepted
const MAX_QUERY_LEN: usize = 100;

/// One candidate ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub company_name: String,
    pub exchange: String,
}

/// Result of a lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "matches", rename_all = "snake_case")]
pub enum LookupOutcome {
    Matches(Vec<SymbolMatch>),
    NoResults,
}

impl LookupOutcome {
    pub fn matches(&self) -> &[SymbolMatch] {
        match self {
            Self::Matches(matches) => matches,
            Self::NoResults => &[],
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuote {
    symbol: Option<String>,
    #[serde(rename = "shortname")]
    short_name: Option<String>,
    #[serde(rename = "longname")]
    long_name: Option<String>,
    exch_disp: Option<String>,
    exchange: Option<String>,
    quote_type: Option<String>,
}

/// Symbol lookup client
#[derive(Clone)]
pub struct SymbolLookup {
    client: Client,
    endpoint: Url,
    max_results: usize,
    cache: ResponseCache<LookupOutcome>,
    rate_limiter: SharedRateLimiter,
}

impl SymbolLookup {
    /// Create a lookup client from `config`
    pub fn new(config: &StockConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = Url::parse(&config.lookup_url)
            .map_err(|e| StockError::ConfigError(format!("invalid lookup URL: {e}")))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            max_results: config.max_lookup_results,
            cache: ResponseCache::new(config.cache_ttl_lookup),
            rate_limiter: Arc::new(RateLimiter::direct(config.rate_quota()?)),
        })
    }

    /// Candidate tickers for a free-text company name
    pub async fn search(&self, query: &str) -> Result<LookupOutcome> {
        let query = normalize_query(query)?;
        let key = CacheKey::lookup(&query, self.max_results);
        if let Some(outcome) = self.cache.lookup(&key).await {
            debug!(%query, "Lookup served from cache");
            return Ok(outcome);
        }

        self.rate_limiter.until_ready().await;
        let outcome = self.fetch(&query).await?;
        self.cache.store(key, outcome.clone()).await;
        Ok(outcome)
    }

    async fn fetch(&self, query: &str) -> Result<LookupOutcome> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("quotesCount", &self.max_results.to_string())
            .append_pair("newsCount", "0");

        debug!(%url, "Symbol lookup request");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(StockError::ApiError(format!(
                "Symbol lookup returned {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_search_response(&body, self.max_results)
    }
}

fn normalize_query(query: &str) -> Result<String> {
    let query = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if query.is_empty() {
        return Err(StockError::InvalidQuery(
            "enter a company name or ticker".to_string(),
        ));
    }
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(StockError::InvalidQuery(format!(
            "query is longer than {MAX_QUERY_LEN} characters"
        )));
    }
    Ok(query)
}

/// Equity and ETF candidates from a search response body
pub fn parse_search_response(body: &str, max_results: usize) -> Result<LookupOutcome> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let matches: Vec<SymbolMatch> = response
        .quotes
        .into_iter()
        .filter(|q| {
            q.quote_type
                .as_deref()
                .is_none_or(|t| matches!(t, "EQUITY" | "ETF"))
        })
        .filter_map(|q| {
            let symbol = q.symbol?;
            Some(SymbolMatch {
                company_name: q.long_name.or(q.short_name).unwrap_or_else(|| symbol.clone()),
                exchange: q.exch_disp.or(q.exchange).unwrap_or_default(),
                symbol,
            })
        })
        .take(max_results)
        .collect();

    Ok(if matches.is_empty() {
        LookupOutcome::NoResults
    } else {
        LookupOutcome::Matches(matches)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const APPLE: &str = r#"{
        "count": 3,
        "quotes": [
            {"exchange": "NMS", "shortname": "Apple Inc.", "quoteType": "EQUITY",
             "symbol": "AAPL", "longname": "Apple Inc.", "exchDisp": "NASDAQ"},
            {"exchange": "OPR", "shortname": "AAPL Jan 2025 call", "quoteType": "OPTION",
             "symbol": "AAPL250117C00150000"},
            {"exchange": "GER", "shortname": "APPLE INC", "quoteType": "EQUITY",
             "symbol": "APC.DE", "exchDisp": "XETRA"}
        ],
        "news": []
    }"#;

    #[test]
    fn test_parse_keeps_equities() {
        let outcome = parse_search_response(APPLE, 10).unwrap();
        let matches = outcome.matches();

        assert_eq!(matches.len(), 2);
        assert_eq!(
            matches[0],
            SymbolMatch {
                symbol: "AAPL".to_string(),
                company_name: "Apple Inc.".to_string(),
                exchange: "NASDAQ".to_string(),
            }
        );
        assert_eq!(matches[1].company_name, "APPLE INC");
    }

    #[test]
    fn test_parse_respects_limit() {
        let outcome = parse_search_response(APPLE, 1).unwrap();
        assert_eq!(outcome.matches().len(), 1);
    }

    #[test]
    fn test_no_results() {
        let outcome = parse_search_response(r#"{"quotes": []}"#, 10).unwrap();
        assert_eq!(outcome, LookupOutcome::NoResults);

        let outcome = parse_search_response("{}", 10).unwrap();
        assert_eq!(outcome, LookupOutcome::NoResults);
    }

    #[test]
    fn test_malformed_body_is_upstream_error() {
        let err = parse_search_response("<html>", 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_query_normalisation() {
        assert_eq!(normalize_query("  apple   inc ").unwrap(), "apple inc");
        assert!(matches!(normalize_query("   "), Err(StockError::InvalidQuery(_))));
        assert!(normalize_query(&"x".repeat(101)).is_err());
    }

    #[tokio::test]
    async fn test_blank_query_fails_without_network() {
        let lookup = SymbolLookup::new(&StockConfig::default()).unwrap();
        let err = lookup.search("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(LookupOutcome::NoResults).unwrap();
        assert_eq!(json["status"], "no_results");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_search() {
        let lookup = SymbolLookup::new(&StockConfig::default()).unwrap();
        let outcome = lookup.search("Microsoft").await.unwrap();
        assert!(outcome.matches().iter().any(|m| m.symbol == "MSFT"));
    }
}
