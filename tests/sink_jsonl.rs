// tests/sink_jsonl.rs
use news_digest::ingest::sink::{JsonLinesSink, MemorySink};
use news_digest::ingest::PersistenceSink;
use news_digest::News;
use std::fs;

fn read_ids(path: &std::path::Path) -> Vec<i64> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str::<News>(l).unwrap().id)
        .collect()
}

#[tokio::test]
async fn first_append_recreates_then_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("all_news.jsonl");
    fs::write(&path, "stale line from a previous run\n").unwrap();

    let sink = JsonLinesSink::new(&path);
    sink.append(&[News::new(1, "a", 0, 0, 0), News::new(2, "b", 0, 0, 0)])
        .await
        .unwrap();
    sink.append(&[News::new(3, "c", 0, 0, 0)]).await.unwrap();

    assert_eq!(read_ids(&path), vec![1, 2, 3]);
}

#[tokio::test]
async fn empty_batch_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nothing.jsonl");
    let sink = JsonLinesSink::new(&path);
    sink.append(&[]).await.unwrap();
    assert!(!path.exists());
}

#[tokio::test]
async fn write_all_replaces_stale_file_even_when_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("most_rated.jsonl");
    fs::write(&path, "{\"stale\":true}\n").unwrap();

    JsonLinesSink::new(&path).write_all(&[]).await.unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[tokio::test]
async fn write_all_then_append_keeps_both() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("top.jsonl");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "old\n").unwrap();

    let sink = JsonLinesSink::new(&path);
    sink.write_all(&[News::new(4, "d", 0, 0, 0)]).await.unwrap();
    sink.append(&[News::new(5, "e", 0, 0, 0)]).await.unwrap();
    assert_eq!(read_ids(&path), vec![4, 5]);
}

#[tokio::test]
async fn creates_missing_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("nested").join("top.jsonl");
    let sink = JsonLinesSink::new(&path);
    sink.append(&[News::new(9, "x", 0, 0, 0).with_rating(0.75)])
        .await
        .unwrap();

    let line = fs::read_to_string(&path).unwrap();
    let back: News = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(back.id, 9);
    assert_eq!(back.rating, Some(0.75));
}

#[tokio::test]
async fn write_errors_surface_to_caller() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should be.
    let sink = JsonLinesSink::new(dir.path());
    assert!(sink.append(&[News::new(1, "a", 0, 0, 0)]).await.is_err());
}

#[tokio::test]
async fn memory_sink_records_non_empty_batches() {
    let sink = MemorySink::new();
    sink.append(&[]).await.unwrap();
    sink.append(&[News::new(1, "a", 0, 0, 0)]).await.unwrap();
    let calls = sink.batches();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0].id, 1);
}
