//! End-to-end tests of the context routes over real HTTP.

mod common;

use anyhow::Result;
use serde_json::{Value, json};

async fn add(
    server: &common::TestServer,
    session_id: &str,
    role: &str,
    content: &str,
    timestamp: Option<&str>,
) -> Result<String> {
    let mut message = json!({"role": role, "content": content});
    if let Some(ts) = timestamp {
        message["timestamp"] = json!(ts);
    }

    let resp = server
        .post("/context/add")
        .json(&json!({"session_id": session_id, "message": message}))
        .send()
        .await?;
    assert!(resp.status().is_success(), "add should succeed");

    let body: Value = resp.json().await?;
    Ok(body["id"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn test_root_status() -> Result<()> {
    let server = common::TestServer::start().await?;
    add(&server, "s1", "user", "hello", None).await?;

    let body: Value = server.get("/").send().await?.json().await?;
    assert_eq!(body["service"], "Code Agent Context Service");
    assert_eq!(body["status"], "running");
    assert_eq!(body["total_contexts"], 1);

    Ok(())
}

#[tokio::test]
async fn test_round_trip_preserves_long_content() -> Result<()> {
    let server = common::TestServer::start().await?;
    let long = "fn main() {}\n".repeat(200);
    add(&server, "s1", "assistant", &long, None).await?;

    let body: Value = server
        .post("/context/recent?session_id=s1&limit=1")
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["total_count"], 1);
    assert_eq!(body["messages"][0]["content"], long.as_str());
    assert_eq!(
        body["messages"][0]["metadata"]["content_length"],
        long.chars().count()
    );

    Ok(())
}

#[tokio::test]
async fn test_duplicate_add_overwrites() -> Result<()> {
    let server = common::TestServer::start().await?;
    let ts = Some("2024-05-01T12:00:00Z");

    let first = add(&server, "s1", "user", "same text", ts).await?;
    let second = add(&server, "s1", "user", "same text", ts).await?;
    assert_eq!(first, second);

    let stats: Value = server.get("/context/stats/s1").send().await?.json().await?;
    assert_eq!(stats["total_messages"], 1);

    Ok(())
}

#[tokio::test]
async fn test_query_caps_results() -> Result<()> {
    let server = common::TestServer::start().await?;
    for i in 0..25 {
        add(&server, "s1", "user", &format!("note number {}", i), None).await?;
    }

    let body: Value = server
        .post("/context/query")
        .json(&json!({"session_id": "s1", "query": "note", "top_k": 50}))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["total_count"], 20);
    let distances: Vec<f64> = body["messages"]
        .as_array()
        .map(|m| m.iter().filter_map(|x| x["distance"].as_f64()).collect())
        .unwrap_or_default();
    assert_eq!(distances.len(), 20);
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));

    Ok(())
}

#[tokio::test]
async fn test_sessions_are_isolated() -> Result<()> {
    let server = common::TestServer::start().await?;
    add(&server, "alpha", "user", "alpha secret", None).await?;
    add(&server, "beta", "user", "beta secret", None).await?;

    let body: Value = server
        .post("/context/query")
        .json(&json!({"session_id": "alpha", "query": "secret", "top_k": 10}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["messages"][0]["metadata"]["session_id"], "alpha");

    let cleared: Value = server
        .post("/context/clear")
        .json(&json!({"session_id": "alpha"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(cleared["deleted_count"], 1);

    let beta: Value = server.get("/context/stats/beta").send().await?.json().await?;
    assert_eq!(beta["total_messages"], 1);

    Ok(())
}

#[tokio::test]
async fn test_stats_aggregation() -> Result<()> {
    let server = common::TestServer::start().await?;
    add(&server, "s1", "user", "first", Some("2024-01-01T00:00:00Z")).await?;
    add(&server, "s1", "user", "second", Some("2024-01-03T00:00:00Z")).await?;
    add(&server, "s1", "assistant", "reply", Some("2024-01-02T00:00:00Z")).await?;

    let stats: Value = server.get("/context/stats/s1").send().await?.json().await?;
    assert_eq!(stats["total_messages"], 3);
    assert_eq!(stats["by_type"], json!({"user_query": 2, "agent_response": 1}));
    assert!(stats["oldest_message"].as_str().unwrap_or_default().starts_with("2024-01-01"));
    assert!(stats["newest_message"].as_str().unwrap_or_default().starts_with("2024-01-03"));

    Ok(())
}

#[tokio::test]
async fn test_validation_errors_are_400() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .post("/context/add")
        .json(&json!({"session_id": "", "message": {"role": "user", "content": "x"}}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "bad_request");

    let resp = server
        .post("/context/add")
        .json(&json!({"session_id": "s1", "message": {"role": "user", "content": "x", "timestamp": "yesterday"}}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    Ok(())
}

#[tokio::test]
async fn test_purge_all() -> Result<()> {
    let server = common::TestServer::start().await?;
    add(&server, "s1", "user", "a", None).await?;
    add(&server, "s2", "user", "b", None).await?;

    let body: Value = server.delete("/context/all").send().await?.json().await?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "All context cleared");

    let root: Value = server.get("/").send().await?.json().await?;
    assert_eq!(root["total_contexts"], 0);

    Ok(())
}

#[tokio::test]
async fn test_sqlite_store_survives_restart() -> Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    let server = common::TestServer::start_sqlite(temp_dir).await?;
    add(&server, "s1", "user", "durable message", None).await?;
    let temp_dir = server.shutdown().await;

    let server = common::TestServer::start_sqlite(temp_dir).await?;
    let body: Value = server
        .post("/context/recent?session_id=s1")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["messages"][0]["content"], "durable message");

    Ok(())
}
