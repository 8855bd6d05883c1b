//! HTTP data source client
//!
//! Fetches entity and category records, derives effectiveness, and caches the
//! result. Nothing in here returns an error to the caller once constructed:
//! every network problem ends up as a [`FetchOutcome`] or an empty list.
//!
//! # Retry policy
//!
//! | Response | Handling |
//! |----------|----------|
//! | 2xx with a decodable body | `Found` |
//! | 2xx with an undecodable body | `NotFound` (no retry) |
//! | 404 | `NotFound` (no retry) |
//! | other status / transport error | retried up to `max_retries` attempts, then `TransientFailure` |

use crate::analysis::effectiveness::EffectivenessEngine;
use crate::data::cache::{normalize_key, EntityCache};
use crate::data::payload::{CategoryPayload, EntityPayload};
use crate::types::{AppError, BaseStats, EntityRecord, FetchOutcome, Result};
use crate::utils::config::DataConfig;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Read side of the data layer, as seen by analysis code.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Look up one entity by identifier (case-insensitive).
    async fn fetch_entity(&self, name: &str) -> FetchOutcome<EntityRecord>;

    /// Identifiers tagged with `category`, in source order. Empty on any failure.
    async fn fetch_category_members(&self, category: &str) -> Vec<String>;
}

pub struct DataClient {
    http: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    retry_delay: Duration,
    cache: Arc<dyn EntityCache>,
    engine: EffectivenessEngine,
    /// Category member lists, memoized for the run
    members: RwLock<HashMap<String, Vec<String>>>,
    /// Per-identifier gates: at most one outstanding fetch per key
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    requests: AtomicU64,
}

impl DataClient {
    /// Create a client with an injected cache and effectiveness engine.
    pub fn new(
        config: &DataConfig,
        cache: Arc<dyn EntityCache>,
        engine: EffectivenessEngine,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| AppError::Configuration(format!("Invalid API token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            cache,
            engine,
            members: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            requests: AtomicU64::new(0),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &Arc<dyn EntityCache> {
        &self.cache
    }

    pub fn engine(&self) -> &EffectivenessEngine {
        &self.engine
    }

    /// Total HTTP requests issued, retries included.
    pub fn network_requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Build a record from a payload. A payload without a name falls back to
    /// the requested identifier; missing stats stay zero.
    pub fn build_record(&self, key: &str, payload: EntityPayload) -> EntityRecord {
        let types = payload.type_names();

        let mut stats = BaseStats::default();
        for entry in &payload.stats {
            stats.set(&entry.stat.name, entry.base_stat);
        }

        let effectiveness = self.engine.compute_raw(&types);
        let name = match normalize_key(&payload.name) {
            n if n.is_empty() => key.to_string(),
            n => n,
        };

        EntityRecord {
            name,
            types,
            stats,
            weaknesses: effectiveness.weaknesses,
            resistances: effectiveness.resistances,
        }
    }

    fn gate(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.in_flight
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop the gate for `key` once nobody else holds or waits on it.
    fn release(&self, key: &str, gate: &Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock();
        // One reference is ours, one is the map's. Waiters hold the rest.
        let idle = Arc::strong_count(gate) == 2
            && in_flight.get(key).is_some_and(|g| Arc::ptr_eq(g, gate));
        if idle {
            in_flight.remove(key);
        }
    }

    /// Identifiers with a gate currently registered.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.lock().len()
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> FetchOutcome<T> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            self.requests.fetch_add(1, Ordering::Relaxed);

            match self.http.get(url).send().await {
                Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                    tracing::debug!(url, "Data source returned 404");
                    return FetchOutcome::NotFound;
                }
                Ok(response) if response.status().is_success() => {
                    match response.json::<T>().await {
                        Ok(body) => return FetchOutcome::Found(body),
                        Err(e) if e.is_decode() => {
                            tracing::warn!(url, error = %e, "Unexpected payload shape");
                            return FetchOutcome::NotFound;
                        }
                        Err(e) => last_error = format!("body read failed: {}", e),
                    }
                }
                Ok(response) => last_error = format!("HTTP {}", response.status()),
                Err(e) => last_error = e.to_string(),
            }

            tracing::warn!(
                url,
                attempt,
                max_attempts = self.max_attempts,
                error = %last_error,
                "Data source request failed"
            );

            if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        FetchOutcome::TransientFailure {
            attempts: self.max_attempts,
            last_error,
        }
    }

    /// Network path of [`EntitySource::fetch_entity`]; caches what it finds.
    async fn fetch_uncached(&self, key: &str) -> FetchOutcome<EntityRecord> {
        let url = format!("{}/pokemon/{}", self.base_url, key);
        match self.get_json::<EntityPayload>(&url).await {
            FetchOutcome::Found(payload) => {
                let record = self.build_record(key, payload);
                if let Err(e) = self.cache.put(key, &record) {
                    tracing::warn!(name = %key, error = %e, "Failed to cache entity");
                }
                FetchOutcome::Found(record)
            }
            FetchOutcome::NotFound => FetchOutcome::NotFound,
            FetchOutcome::TransientFailure {
                attempts,
                last_error,
            } => {
                tracing::warn!(name = %key, attempts, error = %last_error, "Giving up on entity");
                FetchOutcome::TransientFailure {
                    attempts,
                    last_error,
                }
            }
        }
    }
}

#[async_trait]
impl EntitySource for DataClient {
    async fn fetch_entity(&self, name: &str) -> FetchOutcome<EntityRecord> {
        let key = normalize_key(name);
        if key.is_empty() {
            return FetchOutcome::NotFound;
        }

        let gate = self.gate(&key);
        let outcome = {
            let _guard = gate.lock().await;

            // Checked under the gate so a concurrent fetch of the same key is
            // observed here rather than repeated.
            match self.cache.get(&key) {
                Some(record) => {
                    tracing::debug!(name = %key, "Entity cache hit");
                    FetchOutcome::Found(record)
                }
                None => self.fetch_uncached(&key).await,
            }
        };

        self.release(&key, &gate);
        outcome
    }

    async fn fetch_category_members(&self, category: &str) -> Vec<String> {
        let key = normalize_key(category);
        if key.is_empty() {
            return Vec::new();
        }

        if let Some(members) = self.members.read().get(&key).cloned() {
            return members;
        }

        let url = format!("{}/type/{}", self.base_url, key);
        match self.get_json::<CategoryPayload>(&url).await {
            FetchOutcome::Found(payload) => {
                let members = payload.member_names();
                tracing::info!(category = %key, count = members.len(), "Fetched category members");
                self.members.write().insert(key, members.clone());
                members
            }
            FetchOutcome::NotFound => {
                tracing::warn!(category = %key, "Category not found at data source");
                Vec::new()
            }
            FetchOutcome::TransientFailure {
                attempts,
                last_error,
            } => {
                tracing::warn!(category = %key, attempts, error = %last_error, "Giving up on category");
                Vec::new()
            }
        }
    }
}
