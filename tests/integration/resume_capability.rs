//! Integration tests for chapter-level resume

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quran_data_collector::api::client::ApiClientConfig;
use quran_data_collector::collector::{Collector, CollectorConfig};

fn test_config(server: &MockServer, output: PathBuf) -> CollectorConfig {
    CollectorConfig {
        output_file: output,
        translations: vec![131],
        tafsirs: vec![],
        resume: true,
        api: ApiClientConfig {
            base_url: server.uri(),
            request_delay: Duration::from_millis(1),
            max_retries: 0,
            ..ApiClientConfig::default()
        },
        ..CollectorConfig::default()
    }
}

fn write_output_lines(path: &PathBuf, chapter: u32, verses: u32) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    for verse in 1..=verses {
        writeln!(file, r#"{{"verse_id":"{chapter}:{verse}"}}"#).unwrap();
    }
}

fn count_lines(path: &PathBuf) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

async fn mount_chapter(server: &MockServer, id: u32, verses_count: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/chapters/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chapter": {
                "id": id,
                "name_simple": format!("Chapter {id}"),
                "name_arabic": "سورة",
                "verses_count": verses_count
            }
        })))
        .mount(server)
        .await;
}

fn verses_body(chapter: u32, count: u32) -> serde_json::Value {
    let verses: Vec<serde_json::Value> = (1..=count)
        .map(|n| {
            json!({
                "verse_key": format!("{chapter}:{n}"),
                "verse_number": n,
                "text_uthmani": format!("آية {n}")
            })
        })
        .collect();
    json!({
        "verses": verses,
        "pagination": {"current_page": 1, "next_page": null, "total_pages": 1}
    })
}

#[tokio::test]
async fn test_complete_chapter_is_skipped_with_zero_requests() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("quran.jsonl");

    write_output_lines(&output, 1, 7);

    mount_chapter(&server, 1, 7).await;
    // The whole point of resume: no verse traffic for a complete chapter
    Mock::given(method("GET"))
        .and(path("/verses/by_chapter/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(verses_body(1, 7)))
        .expect(0)
        .mount(&server)
        .await;

    let mut collector = Collector::new(test_config(&server, output.clone())).unwrap();
    let stats = collector.collect_single(1).await.unwrap();

    assert_eq!(stats.chapters_skipped, 1);
    assert_eq!(stats.chapters_processed, 0);
    assert_eq!(stats.verses_collected, 0);
    assert_eq!(count_lines(&output), 7);
}

#[tokio::test]
async fn test_partial_chapter_is_refetched_and_appended() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("quran.jsonl");

    // 3 of 7 verses made it into the file before the interruption
    write_output_lines(&output, 1, 3);

    mount_chapter(&server, 1, 7).await;
    Mock::given(method("GET"))
        .and(path("/verses/by_chapter/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(verses_body(1, 7)))
        .mount(&server)
        .await;

    let mut collector = Collector::new(test_config(&server, output.clone())).unwrap();
    let stats = collector.collect_single(1).await.unwrap();

    assert_eq!(stats.chapters_processed, 1);
    assert_eq!(stats.verses_collected, 7);
    // Existing lines preserved, chapter re-fetched whole
    assert_eq!(count_lines(&output), 10);
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with(r#"{"verse_id":"1:1"}"#));
}

#[tokio::test]
async fn test_fresh_run_truncates_existing_output() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("quran.jsonl");

    write_output_lines(&output, 1, 7);

    mount_chapter(&server, 1, 7).await;
    Mock::given(method("GET"))
        .and(path("/verses/by_chapter/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(verses_body(1, 7)))
        .mount(&server)
        .await;

    let config = CollectorConfig {
        resume: false,
        ..test_config(&server, output.clone())
    };
    let mut collector = Collector::new(config).unwrap();
    let stats = collector.collect_single(1).await.unwrap();

    assert_eq!(stats.chapters_skipped, 0);
    assert_eq!(stats.chapters_processed, 1);
    // Old lines gone: the run started fresh
    assert_eq!(count_lines(&output), 7);
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("آية"));
}

#[tokio::test]
async fn test_torn_trailing_line_does_not_block_resume() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("quran.jsonl");

    write_output_lines(&output, 1, 7);
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&output)
        .unwrap();
    write!(file, r#"{{"verse_id":"2:1","trunc"#).unwrap();
    drop(file);

    mount_chapter(&server, 1, 7).await;
    Mock::given(method("GET"))
        .and(path("/verses/by_chapter/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(verses_body(1, 7)))
        .expect(0)
        .mount(&server)
        .await;

    let mut collector = Collector::new(test_config(&server, output.clone())).unwrap();
    let stats = collector.collect_single(1).await.unwrap();

    // Chapter 1 still recognized as complete despite the torn line
    assert_eq!(stats.chapters_skipped, 1);
}

#[tokio::test]
async fn test_fresh_run_without_existing_output() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("quran.jsonl");

    mount_chapter(&server, 1, 2).await;
    Mock::given(method("GET"))
        .and(path("/verses/by_chapter/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(verses_body(1, 2)))
        .mount(&server)
        .await;

    let mut collector = Collector::new(test_config(&server, output.clone())).unwrap();
    let stats = collector.collect_single(1).await.unwrap();

    assert_eq!(stats.chapters_processed, 1);
    assert_eq!(stats.verses_collected, 2);
    assert_eq!(count_lines(&output), 2);
}
