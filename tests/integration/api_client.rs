//! Integration tests for the API client request path

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quran_data_collector::api::client::{ApiClientConfig, QuranApiClient};
use quran_data_collector::api::ApiError;
use quran_data_collector::VerseKey;

fn test_config(server: &MockServer) -> ApiClientConfig {
    ApiClientConfig {
        base_url: server.uri(),
        request_delay: Duration::from_millis(1),
        cooldown: Duration::from_millis(50),
        ..ApiClientConfig::default()
    }
}

fn chapters_body() -> serde_json::Value {
    json!({
        "chapters": [
            {
                "id": 1,
                "name_simple": "Al-Fatihah",
                "name_arabic": "الفاتحة",
                "verses_count": 7,
                "revelation_place": "makkah",
                "revelation_order": 5
            },
            {
                "id": 2,
                "name_simple": "Al-Baqarah",
                "name_arabic": "البقرة",
                "verses_count": 286,
                "revelation_place": "madinah",
                "revelation_order": 87
            }
        ]
    })
}

#[tokio::test]
async fn test_get_chapters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chapters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chapters_body()))
        .mount(&server)
        .await;

    let client = QuranApiClient::new(test_config(&server)).unwrap();
    let chapters = client.get_chapters().await.unwrap();

    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].name_simple, "Al-Fatihah");
    assert_eq!(chapters[1].verses_count, 286);
}

#[tokio::test]
async fn test_pagination_follows_next_page_until_absent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/verses/by_chapter/1"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "verses": [
                {"verse_key": "1:1", "verse_number": 1, "text_uthmani": "a"},
                {"verse_key": "1:2", "verse_number": 2, "text_uthmani": "b"}
            ],
            "pagination": {"current_page": 1, "next_page": 2, "total_pages": 2}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/verses/by_chapter/1"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "verses": [
                {"verse_key": "1:3", "verse_number": 3, "text_uthmani": "c"}
            ],
            "pagination": {"current_page": 2, "next_page": null, "total_pages": 2}
        })))
        .mount(&server)
        .await;

    let client = QuranApiClient::new(test_config(&server)).unwrap();
    let verses = client.get_all_verses_by_chapter(1, &[131]).await.unwrap();

    assert_eq!(verses.len(), 3);
    assert_eq!(verses[2].verse_key, "1:3");
}

#[tokio::test]
async fn test_transient_server_errors_are_retried() {
    let server = MockServer::start().await;

    // First two responses fail, then the endpoint recovers
    Mock::given(method("GET"))
        .and(path("/chapters"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chapters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chapters_body()))
        .mount(&server)
        .await;

    let client = QuranApiClient::new(test_config(&server)).unwrap();
    let chapters = client.get_chapters().await.unwrap();
    assert_eq!(chapters.len(), 2);
}

#[tokio::test]
async fn test_retry_budget_exhaustion_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chapters"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let config = ApiClientConfig {
        max_retries: 1,
        ..test_config(&server)
    };
    let client = QuranApiClient::new(config).unwrap();

    match client.get_chapters().await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 502),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chapters"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = QuranApiClient::new(test_config(&server)).unwrap();
    match client.get_chapters().await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "bad request");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_chapter_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chapters/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = QuranApiClient::new(test_config(&server)).unwrap();
    assert!(matches!(
        client.get_chapter(999).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_missing_tafsir_is_absent_value_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tafsirs/169/by_ayah/1:1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = QuranApiClient::new(test_config(&server)).unwrap();
    let tafsir = client
        .get_tafsir_by_ayah(169, VerseKey::new(1, 1))
        .await
        .unwrap();
    assert!(tafsir.is_none());
}

#[tokio::test]
async fn test_empty_tafsir_body_is_absent_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tafsirs/169/by_ayah/1:1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tafsir": {"text": ""}})))
        .mount(&server)
        .await;

    let client = QuranApiClient::new(test_config(&server)).unwrap();
    let tafsir = client
        .get_tafsir_by_ayah(169, VerseKey::new(1, 1))
        .await
        .unwrap();
    assert!(tafsir.is_none());
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chapters"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = QuranApiClient::new(test_config(&server)).unwrap();
    assert!(matches!(
        client.get_chapters().await,
        Err(ApiError::ParseError(_))
    ));
}

#[tokio::test]
async fn test_rate_limit_retry_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chapters"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let config = ApiClientConfig {
        // Trip immediately so the retry path sleeps the short cooldown
        // instead of the exponential pre-trip backoff
        failure_threshold: 1,
        cooldown: Duration::from_millis(10),
        max_rate_limit_retries: Some(2),
        ..test_config(&server)
    };
    let client = QuranApiClient::new(config).unwrap();

    match client.get_chapters().await {
        Err(ApiError::RateLimited(cap)) => assert_eq!(cap, 2),
        other => panic!("expected rate limited error, got {other:?}"),
    }
}
