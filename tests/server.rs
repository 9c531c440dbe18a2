//! HTTP surface integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;

use sqlx::PgPool;

use seekr::server::{router, AppState};
use seekr::store::frontier::{self, FrontierStatus};
use seekr::store::index::{self, IndexEntry};
use seekr::store::{rank, Store};

async fn spawn_app(pool: PgPool) -> SocketAddr {
    let state = AppState {
        store: Store::from_pool(pool),
        assets_dir: "assets/web".into(),
    };
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn seed_doc(pool: &PgPool, url: &str, terms: &[(&str, i32)]) {
    let term_freqs: HashMap<String, i32> = terms
        .iter()
        .map(|(raw, tf)| (raw.to_string(), *tf))
        .collect();
    let len: i32 = terms.iter().map(|(_, tf)| *tf).sum();
    let entry = IndexEntry::new(url, format!("hash-of-{url}"), len, term_freqs).unwrap();

    let mut tx = pool.begin().await.unwrap();
    index::index_document(&mut tx, &entry).await.unwrap();
    frontier::update_status(&mut *tx, &entry.url_norm, FrontierStatus::Completed)
        .await
        .unwrap();
    tx.commit().await.unwrap();
}

#[sqlx::test]
async fn health_endpoint_reports_ok(pool: PgPool) {
    let addr = spawn_app(pool).await;
    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[sqlx::test]
async fn query_rejects_non_post(pool: PgPool) {
    let addr = spawn_app(pool).await;
    let response = reqwest::get(format!("http://{addr}/query")).await.unwrap();
    assert_eq!(response.status(), 405);
}

#[sqlx::test]
async fn query_rejects_empty_and_untokenizable(pool: PgPool) {
    let addr = spawn_app(pool).await;
    let client = reqwest::Client::new();

    for body in [
        r#"{"query": ""}"#,
        r#"{"query": "the and of"}"#,
        r#"{"query": "42 1234"}"#,
        r#"not json"#,
    ] {
        let response = client
            .post(format!("http://{addr}/query"))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "body: {body}");
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(error["error"].is_string());
    }
}

#[sqlx::test]
async fn query_returns_ranked_results(pool: PgPool) {
    seed_doc(
        &pool,
        "https://a.test/rust",
        &[("rust", 3), ("systems", 1)],
    )
    .await;
    seed_doc(&pool, "https://b.test/other", &[("cooking", 2), ("pasta", 1)]).await;
    rank::update_document_frequency(&pool).await.unwrap();

    let addr = spawn_app(pool).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/query"))
        .json(&serde_json::json!({ "query": "Rust systems" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let rankings = body["rankings"].as_array().unwrap();
    assert_eq!(rankings.len(), 1);
    assert_eq!(rankings[0]["url"], "https://a.test/rust");
    assert_eq!(rankings[0]["len"], 4);
    assert!(rankings[0]["score"].as_f64().unwrap() > 0.0);
}

#[sqlx::test]
async fn query_clamps_limit(pool: PgPool) {
    seed_doc(&pool, "https://a.test/1", &[("shared", 1), ("one", 1)]).await;
    seed_doc(&pool, "https://b.test/2", &[("shared", 1), ("two", 1)]).await;
    rank::update_document_frequency(&pool).await.unwrap();

    let addr = spawn_app(pool).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/query"))
        .json(&serde_json::json!({ "query": "shared", "limit": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["rankings"].as_array().unwrap().len(), 1);
}

#[sqlx::test]
async fn index_page_and_static_assets_are_served(pool: PgPool) {
    let addr = spawn_app(pool).await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let response = reqwest::get(format!("http://{addr}/static/app.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = reqwest::get(format!("http://{addr}/static/no-such-file.css"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
