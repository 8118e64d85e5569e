use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::error::RefineError;
use crate::taxonomy::{MatchType, Rank, TaxonMatch, TaxonQuery};

/// Name-matching service boundary. Remote, read-only, anonymous; assumed
/// deterministic for identical queries within one run.
pub trait BackboneClient: Send + Sync {
    fn match_name(&self, query: &TaxonQuery) -> Result<TaxonMatch, RefineError>;
}

#[derive(Clone)]
pub struct BackboneHttpClient {
    client: Client,
    base_url: String,
}

impl BackboneHttpClient {
    pub fn new() -> Result<Self, RefineError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("dwc-refine/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| RefineError::Filesystem(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| RefineError::BackboneHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: "https://api.gbif.org/v1".to_string(),
        })
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, RefineError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        std::thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        std::thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(RefineError::BackboneHttp(err.to_string()));
                }
            }
        }
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, RefineError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "backbone request failed".to_string());
        Err(RefineError::BackboneStatus { status, message })
    }
}

impl BackboneClient for BackboneHttpClient {
    fn match_name(&self, query: &TaxonQuery) -> Result<TaxonMatch, RefineError> {
        let url = format!("{}/species/match", self.base_url);
        let response = self.send_with_retries(|| {
            let mut request = self
                .client
                .get(&url)
                .query(&[("name", query.name.as_str()), ("strict", "false")]);
            if let Some(rank) = query.rank {
                request = request.query(&[("rank", rank.as_query_str())]);
            }
            let hints = &query.hints;
            for (param, value) in [
                ("kingdom", hints.kingdom.as_deref()),
                ("phylum", hints.phylum.as_deref()),
                ("class", hints.class.as_deref()),
                ("order", hints.order.as_deref()),
                ("family", hints.family.as_deref()),
                ("genus", hints.genus.as_deref()),
            ] {
                if let Some(value) = value {
                    request = request.query(&[(param, value)]);
                }
            }
            request
        })?;
        let response = Self::handle_status(response)?;
        let raw: Value = response
            .json()
            .map_err(|err| RefineError::BackboneHttp(err.to_string()))?;
        Ok(extract_match(&raw))
    }
}

/// Maps a raw backbone response onto a `TaxonMatch`. Unknown or missing
/// matchType values collapse to `None` so they are never trusted.
pub fn extract_match(raw: &Value) -> TaxonMatch {
    let get_str =
        |key: &str| -> Option<String> { raw.get(key).and_then(|v| v.as_str()).map(String::from) };

    let match_type = match raw.get("matchType").and_then(|v| v.as_str()) {
        Some("EXACT") => MatchType::Exact,
        Some("FUZZY") => MatchType::Fuzzy,
        Some("HIGHERRANK") => MatchType::HigherRank,
        _ => MatchType::None,
    };

    TaxonMatch {
        match_type,
        kingdom: get_str("kingdom"),
        phylum: get_str("phylum"),
        class: get_str("class"),
        order: get_str("order"),
        family: get_str("family"),
        genus: get_str("genus"),
        species: get_str("species"),
        scientific_name: get_str("scientificName"),
        rank: raw
            .get("rank")
            .and_then(|v| v.as_str())
            .and_then(|v| v.parse::<Rank>().ok()),
        status: raw
            .get("status")
            .and_then(|v| v.as_str())
            .map(|v| v.to_lowercase()),
        usage_key: raw.get("usageKey").and_then(|v| v.as_i64()),
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
