//! HTTP implementation of [`SearchApi`] for GitHub-style search endpoints

use super::link_header::parse_last_page;
use super::SearchApi;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::types::{Item, PageRequest, SearchResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use serde::Deserialize;

pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

#[derive(Debug, Deserialize)]
struct SearchBody {
    total_count: u64,
    #[serde(default)]
    items: Vec<Item>,
}

/// Issues `GET {endpoint}?q=..&per_page=..&page=..` requests.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpSearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        // The read timeout bounds the whole exchange once connected.
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.connect_timeout() + config.read_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl SearchApi for HttpSearchClient {
    async fn search(&self, request: &PageRequest) -> Result<SearchResult, SearchError> {
        log::debug!(
            "Execute query: '{}', page: {}, per_page: {}",
            request.query,
            request.page_number,
            request.page_size
        );

        let mut builder = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, "application/vnd.github+json")
            .query(&[
                ("q", request.query.as_str().to_string()),
                ("per_page", request.page_size.to_string()),
                ("page", request.page_number.to_string()),
            ]);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        log::debug!("Response status {} for '{}'", status, request.query);
        interpret_response(request.query.as_str(), status, &headers, &body)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Map a raw HTTP exchange onto the search outcome.
pub fn interpret_response(
    query: &str,
    status: u16,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<SearchResult, SearchError> {
    match status {
        200 => {
            let parsed: SearchBody =
                serde_json::from_slice(body).map_err(|e| SearchError::Parse(e.to_string()))?;
            log::debug!("Total items: {}", parsed.total_count);

            let Some(link) = header_str(headers, LINK) else {
                return Err(SearchError::no_results(query));
            };
            if parsed.total_count == 0 {
                return Err(SearchError::no_results(query));
            }

            log::debug!("Page links: {}", link);
            let last_page = match parse_last_page(link) {
                Ok(page) => {
                    log::debug!("Last page: {}", page);
                    Some(page)
                }
                Err(e) => {
                    log::debug!("Ignoring pagination metadata for '{}': {}", query, e);
                    None
                }
            };

            Ok(SearchResult {
                items: parsed.items,
                total_count: parsed.total_count,
                last_page,
            })
        }
        403 => {
            let remaining = header_str(headers, RATE_LIMIT_REMAINING)
                .and_then(|value| value.trim().parse::<u64>().ok());
            if remaining == Some(0) {
                Err(SearchError::RateLimited)
            } else {
                Err(SearchError::Http { status })
            }
        }
        other => Err(SearchError::Http { status: other }),
    }
}
