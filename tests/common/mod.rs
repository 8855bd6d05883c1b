//! Shared fixtures for integration tests.
//!
//! Builders for data source payloads and a wiremock server standing in for
//! the HTTP API.

#![allow(dead_code)]

use oak::analysis::EffectivenessEngine;
use oak::data::{DataClient, EntityCache, MemoryEntityCache};
use oak::utils::config::DataConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Payload builders
// ============================================================================

/// `GET /pokemon/{name}` body. Types are assigned slots in order.
pub fn entity_json(name: &str, types: &[&str], stats: &[(&str, u32)]) -> Value {
    let types: Vec<Value> = types
        .iter()
        .enumerate()
        .map(|(i, t)| json!({"slot": i + 1, "type": {"name": t, "url": ""}}))
        .collect();
    let stats: Vec<Value> = stats
        .iter()
        .map(|(name, value)| json!({"base_stat": value, "effort": 0, "stat": {"name": name}}))
        .collect();

    json!({
        "id": 1,
        "name": name,
        "types": types,
        "stats": stats,
    })
}

/// `GET /type/{category}` body.
pub fn category_json(category: &str, members: &[&str]) -> Value {
    let pokemon: Vec<Value> = members
        .iter()
        .enumerate()
        .map(|(i, m)| json!({"pokemon": {"name": m, "url": ""}, "slot": i + 1}))
        .collect();
    json!({"name": category, "pokemon": pokemon})
}

// ============================================================================
// Mock server helpers
// ============================================================================

pub async fn mount_entity(server: &MockServer, name: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/pokemon/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_category(server: &MockServer, category: &str, members: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/type/{}", category)))
        .respond_with(ResponseTemplate::new(200).set_body_json(category_json(category, members)))
        .mount(server)
        .await;
}

/// Data source config pointed at a mock server, retrying without delay.
pub fn data_config(server: &MockServer) -> DataConfig {
    DataConfig {
        base_url: server.uri(),
        max_retries: 3,
        timeout_secs: 5,
        retry_delay_ms: 0,
        ..Default::default()
    }
}

pub fn client_with_cache(server: &MockServer, cache: Arc<dyn EntityCache>) -> Arc<DataClient> {
    Arc::new(
        DataClient::new(&data_config(server), cache, EffectivenessEngine::builtin())
            .expect("client builds"),
    )
}

pub fn client(server: &MockServer) -> Arc<DataClient> {
    client_with_cache(server, Arc::new(MemoryEntityCache::new()))
}
