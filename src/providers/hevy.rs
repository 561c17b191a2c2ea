// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Hevy API provider: paged workout retrieval with credential fallback.
//!
//! The hosted API has been observed behind different gateways that disagree
//! on the API-key header spelling and on the list-response envelope, so the
//! provider sends all known header variants and resolves items from whichever
//! response field is populated. A `401` triggers exactly one retry with the
//! alternate credential framing before the fetch is reported as failed.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{FetchFailure, FetchOutcome, WorkoutProvider};
use crate::config::{AuthScheme, HevyConfig};
use crate::models::Workout;
use crate::normalizer::{normalize_detail_logs, normalize_workout};

const MAX_PAGE_SIZE: usize = 50;

/// Response envelope fields tried in order, latest-N mode.
const LATEST_FIELDS: &[&str] = &["items", "workouts", "data"];
/// Backfill mode checks `workouts` first; older exports nested there.
const BACKFILL_FIELDS: &[&str] = &["workouts", "items", "data"];

pub struct HevyProvider {
    client: Client,
    base_url: String,
    scheme: AuthScheme,
    api_key: Option<String>,
    token: Option<String>,
}

impl HevyProvider {
    pub fn new(config: &HevyConfig) -> Self {
        Self::with_credentials(
            &config.base_url,
            config.auth_scheme,
            config.api_key.clone(),
            config.token.clone(),
        )
    }

    pub fn with_credentials(
        base_url: &str,
        scheme: AuthScheme,
        api_key: Option<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            scheme,
            api_key,
            token,
        }
    }

    /// Headers for the configured scheme, falling back to whichever
    /// credential is present when the configured one is missing.
    fn primary_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        match (self.scheme, &self.token, &self.api_key) {
            (AuthScheme::Bearer, Some(token), _) => {
                insert_header(&mut headers, AUTHORIZATION.as_str(), &format!("Bearer {token}"));
            }
            (AuthScheme::ApiKey, _, Some(key)) => {
                insert_api_key_variants(&mut headers, key);
            }
            (_, Some(token), _) => {
                insert_header(&mut headers, AUTHORIZATION.as_str(), &format!("Bearer {token}"));
            }
            (_, _, Some(key)) => {
                insert_api_key_variants(&mut headers, key);
            }
            _ => {}
        }
        headers
    }

    /// One retry pass after a 401: API key framed as an `Authorization`
    /// scheme plus a query parameter, then bearer if a token exists.
    async fn retry_unauthorized(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Response, FetchFailure> {
        if let Some(key) = &self.api_key {
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
            insert_header(&mut headers, AUTHORIZATION.as_str(), &format!("Api-Key {key}"));
            insert_api_key_variants(&mut headers, key);

            let mut query = params.to_vec();
            query.push(("api_key", key.clone()));

            let resp = self
                .client
                .get(url)
                .headers(headers)
                .query(&query)
                .send()
                .await
                .map_err(|e| FetchFailure::Network(e.to_string()))?;
            if resp.status().as_u16() < 400 {
                debug!("401 fallback succeeded with api-key framing");
                return Ok(resp);
            }
        }

        if let Some(token) = &self.token {
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
            insert_header(&mut headers, AUTHORIZATION.as_str(), &format!("Bearer {token}"));

            let resp = self
                .client
                .get(url)
                .headers(headers)
                .query(params)
                .send()
                .await
                .map_err(|e| FetchFailure::Network(e.to_string()))?;
            if resp.status().as_u16() < 400 {
                debug!("401 fallback succeeded with bearer token");
                return Ok(resp);
            }
        }

        Err(FetchFailure::Unauthorized)
    }

    /// Fetch one list page. `Ok(None)` signals a 404, which backfill treats
    /// as "no more pages".
    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<Option<Value>, FetchFailure> {
        let url = format!("{}/v1/workouts", self.base_url);
        let params = [
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];

        let mut resp = self
            .client
            .get(&url)
            .headers(self.primary_headers())
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            let retry_params: Vec<(&str, String)> =
                params.iter().map(|(k, v)| (*k, v.clone())).collect();
            resp = self.retry_unauthorized(&url, &retry_params).await?;
        }

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => resp
                .json()
                .await
                .map(Some)
                .map_err(|e| FetchFailure::Decode(e.to_string())),
            s => Err(FetchFailure::Http(s.as_u16())),
        }
    }

    async fn fetch_detail(&self, workout_id: &str) -> Result<Value, FetchFailure> {
        let url = format!("{}/v1/workouts/{}", self.base_url, workout_id);
        let resp = self
            .client
            .get(&url)
            .headers(self.primary_headers())
            .send()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchFailure::Http(resp.status().as_u16()));
        }
        resp.json()
            .await
            .map_err(|e| FetchFailure::Decode(e.to_string()))
    }

    /// Normalize raw items, filling empty logs from the detail endpoint.
    /// Detail failures are swallowed; the workout keeps whatever resolved.
    async fn normalize_items(&self, items: Vec<Value>) -> Vec<Workout> {
        let mut workouts = Vec::with_capacity(items.len());
        for raw in items {
            let mut workout = normalize_workout(&raw);
            if workout.logs.is_empty() && !workout.id.is_empty() {
                match self.fetch_detail(&workout.id).await {
                    Ok(detail) => workout.logs = normalize_detail_logs(&detail),
                    Err(e) => debug!(workout.id = %workout.id, "detail fetch skipped: {e}"),
                }
            }
            workouts.push(workout);
        }
        workouts
    }
}

#[async_trait]
impl WorkoutProvider for HevyProvider {
    async fn fetch_latest(&self, limit: usize) -> FetchOutcome {
        let page_size = limit.clamp(1, MAX_PAGE_SIZE);
        let mut items: Vec<Value> = Vec::new();
        let mut pages = 0;
        let mut failure = None;
        let mut page = 1u32;

        while items.len() < limit {
            match self.fetch_page(page, page_size).await {
                Ok(Some(data)) => {
                    let page_items = resolve_items(&data, LATEST_FIELDS);
                    pages += 1;
                    debug!(page, page_items = page_items.len(), "fetched workout page");
                    if page_items.is_empty() {
                        break;
                    }
                    items.extend(page_items);
                    page += 1;
                }
                Ok(None) => {
                    failure = Some(FetchFailure::Http(404));
                    break;
                }
                Err(e) => {
                    warn!(page, "workout fetch failed: {e}");
                    failure = Some(e);
                    break;
                }
            }
        }

        let workouts = self.normalize_items(items).await;
        info!(
            fetched = workouts.len(),
            pages, "latest-workouts fetch finished"
        );
        FetchOutcome {
            workouts,
            pages,
            failure,
        }
    }

    async fn fetch_all(&self) -> FetchOutcome {
        let mut items: Vec<Value> = Vec::new();
        let mut pages = 0;
        let mut failure = None;
        let mut page = 1u32;

        loop {
            match self.fetch_page(page, MAX_PAGE_SIZE).await {
                Ok(Some(data)) => {
                    let page_items = resolve_items(&data, BACKFILL_FIELDS);
                    pages += 1;
                    info!(
                        page,
                        page_items = page_items.len(),
                        total = items.len() + page_items.len(),
                        "backfill page"
                    );
                    if page_items.is_empty() {
                        break;
                    }
                    items.extend(page_items);
                    page += 1;
                }
                // 404 marks the end of history, not an error.
                Ok(None) => {
                    info!(page, "backfill reached end of data");
                    break;
                }
                Err(e) => {
                    warn!(page, "backfill fetch failed: {e}");
                    failure = Some(e);
                    break;
                }
            }
        }

        let workouts = self.normalize_items(items).await;
        info!(fetched = workouts.len(), pages, "backfill fetch finished");
        FetchOutcome {
            workouts,
            pages,
            failure,
        }
    }

    fn provider_name(&self) -> &'static str {
        "hevy"
    }
}

/// Items from whichever envelope field is populated, or the bare array.
fn resolve_items(data: &Value, field_order: &[&str]) -> Vec<Value> {
    if let Some(arr) = data.as_array() {
        return arr.clone();
    }
    for field in field_order {
        if let Some(arr) = data.get(*field).and_then(Value::as_array) {
            return arr.clone();
        }
    }
    Vec::new()
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (
        name.parse::<reqwest::header::HeaderName>(),
        HeaderValue::from_str(value),
    ) {
        headers.insert(name, value);
    }
}

/// All API-key header spellings seen in the wild.
fn insert_api_key_variants(headers: &mut HeaderMap, key: &str) {
    for name in ["api-key", "x-api-key", "X-Api-Key"] {
        insert_header(headers, name, key);
    }
}
