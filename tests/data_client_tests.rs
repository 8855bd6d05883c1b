//! DataClient integration tests against a mocked data source.

mod common;

use common::*;
use oak::analysis::{Category, EffectivenessEngine};
use oak::data::{
    DataClient, DiskEntityCache, EntityCache, EntitySource, MemoryEntityCache, NoOpCache,
};
use oak::FetchOutcome;
use oak::utils::config::DataConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn charizard() -> serde_json::Value {
    entity_json(
        "charizard",
        &["fire", "flying"],
        &[
            ("hp", 78),
            ("attack", 84),
            ("defense", 78),
            ("special-attack", 109),
            ("special-defense", 85),
            ("speed", 100),
        ],
    )
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(charizard()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);

    let first = client.fetch_entity("charizard").await;
    let second = client.fetch_entity("Charizard").await;

    let record = first.into_option().expect("found");
    assert_eq!(second, FetchOutcome::Found(record.clone()));
    assert_eq!(client.network_requests(), 1);
    assert_eq!(record.stats.special_attack, 109);
    assert_eq!(
        record.weaknesses.iter().copied().collect::<Vec<_>>(),
        vec![
            Category::Water,
            Category::Electric,
            Category::Ground,
            Category::Rock
        ]
    );
    assert!(!record.weaknesses.contains(&Category::Ice));
}

#[tokio::test]
async fn test_noop_cache_fetches_every_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(charizard()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_with_cache(&server, Arc::new(NoOpCache::new()));
    assert!(client.fetch_entity("charizard").await.is_found());
    assert!(client.fetch_entity("charizard").await.is_found());
}

#[tokio::test]
async fn test_concurrent_fetches_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(charizard())
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let (a, b, c) = tokio::join!(
        client.fetch_entity("charizard"),
        client.fetch_entity("charizard"),
        client.fetch_entity("CHARIZARD"),
    );

    assert!(a.is_found() && b.is_found() && c.is_found());
    assert_eq!(client.network_requests(), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_waiters_serialized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(300)))
        .expect(3)
        .mount(&server)
        .await;

    let config = DataConfig {
        max_retries: 1,
        ..data_config(&server)
    };
    let client = DataClient::new(
        &config,
        Arc::new(MemoryEntityCache::new()),
        EffectivenessEngine::builtin(),
    )
    .unwrap();

    // The first caller fails while a second one waits on the same gate; a
    // third caller arriving afterwards must queue instead of racing the second.
    let started = Instant::now();
    let first_then_third = async {
        let first = client.fetch_entity("charizard").await;
        let third = client.fetch_entity("charizard").await;
        (first, third)
    };
    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.fetch_entity("charizard").await
    };
    let ((first, third), second) = tokio::join!(first_then_third, second);

    for outcome in [first, second, third] {
        assert!(matches!(outcome, FetchOutcome::TransientFailure { attempts: 1, .. }));
    }
    assert_eq!(client.network_requests(), 3);
    assert!(
        started.elapsed() >= Duration::from_millis(900),
        "fetches overlapped: {:?}",
        started.elapsed()
    );
    assert_eq!(client.in_flight_len(), 0);
}

#[tokio::test]
async fn test_corrupt_disk_entry_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(charizard()))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();

    // Populate the store, then damage the entry on disk.
    let cache = Arc::new(DiskEntityCache::open(dir.path()).unwrap());
    let entry = cache.entry_path("charizard");
    assert!(client_with_cache(&server, cache).fetch_entity("charizard").await.is_found());
    std::fs::write(&entry, b"{ not valid json").unwrap();

    // A fresh process sees only the damaged file.
    let cache = Arc::new(DiskEntityCache::open(dir.path()).unwrap());
    let client = client_with_cache(&server, cache.clone());
    let outcome = client.fetch_entity("charizard").await;

    assert!(outcome.is_found());
    assert_eq!(client.network_requests(), 1);
    assert_eq!(cache.stats().corrupt, 1);

    // The refetch rewrote a valid entry.
    let reopened = DiskEntityCache::open(dir.path()).unwrap();
    assert!(reopened.get("charizard").is_some());
}

#[tokio::test]
async fn test_disk_cache_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(charizard()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let first = client_with_cache(&server, Arc::new(DiskEntityCache::open(dir.path()).unwrap()));
    let record = first.fetch_entity("charizard").await.into_option().unwrap();

    let second = client_with_cache(&server, Arc::new(DiskEntityCache::open(dir.path()).unwrap()));
    assert_eq!(second.fetch_entity("charizard").await, FetchOutcome::Found(record));
    assert_eq!(second.network_requests(), 0);
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_entity(&server, "charizard", charizard()).await;

    let client = client(&server);
    assert!(client.fetch_entity("charizard").await.is_found());
    assert_eq!(client.network_requests(), 3);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server);
    match client.fetch_entity("charizard").await {
        FetchOutcome::TransientFailure {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("500"));
        }
        other => panic!("expected transient failure, got {:?}", other),
    }

    // Failures are not cached.
    assert_eq!(client.cache().stats().entries, 0);
}

#[tokio::test]
async fn test_404_is_not_found_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/missingno"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.fetch_entity("missingno").await, FetchOutcome::NotFound);
}

#[tokio::test]
async fn test_unexpected_payload_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.fetch_entity("charizard").await, FetchOutcome::NotFound);
}

#[tokio::test]
async fn test_missing_stats_default_to_zero() {
    let server = MockServer::start().await;
    mount_entity(&server, "ditto", entity_json("ditto", &["normal"], &[("hp", 48)])).await;

    let record = client(&server).fetch_entity("ditto").await.into_option().unwrap();
    assert_eq!(record.stats.hp, 48);
    assert_eq!(record.stats.speed, 0);
    assert_eq!(
        record.weaknesses.iter().copied().collect::<Vec<_>>(),
        vec![Category::Fighting]
    );
}

// ============================================================================
// Credentials and categories
// ============================================================================

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/charizard"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(charizard()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = data_config(&server);
    config.api_token = Some("s3cret".to_string());
    let client = oak::DataClient::new(
        &config,
        Arc::new(oak::data::MemoryEntityCache::new()),
        oak::EffectivenessEngine::builtin(),
    )
    .unwrap();

    assert!(client.fetch_entity("charizard").await.is_found());
}

#[tokio::test]
async fn test_category_members_are_memoized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/type/fire"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(category_json("fire", &["charmander", "vulpix", "growlithe"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.fetch_category_members("fire").await;
    let second = client.fetch_category_members("FIRE").await;

    assert_eq!(first, vec!["charmander", "vulpix", "growlithe"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_category_failure_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/type/fire"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    assert!(client(&server).fetch_category_members("fire").await.is_empty());
}
