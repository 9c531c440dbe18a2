//! End-to-end pipeline tests against a local HTTP fixture server.

use std::net::SocketAddr;
use std::time::Duration;

use axum::response::Html;
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use seekr::config::CrawlerConfig;
use seekr::pipeline::Pipeline;
use seekr::store::frontier::FrontierStatus;
use seekr::store::Store;

/// Serve fixed HTML pages on an ephemeral local port.
async fn fixture_server(routes: Vec<(&'static str, &'static str)>) -> SocketAddr {
    let mut router = Router::new();
    for (path, body) in routes {
        router = router.route(path, get(move || async move { Html(body) }));
    }
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn crawler_config(seeds: Vec<String>) -> CrawlerConfig {
    CrawlerConfig {
        seeds,
        crawl_duration_secs: 30,
        frontier_buffer: 8,
        timeout_secs: 5,
        ..CrawlerConfig::default()
    }
}

/// Poll until `check` passes or the deadline expires.
async fn wait_for<F, Fut>(mut check: F, what: &str)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("timed out waiting for {what}");
}

async fn status_counts(pool: &PgPool) -> (i64, i64) {
    let completed = seekr::store::frontier::count_by_status(pool, FrontierStatus::Completed)
        .await
        .unwrap();
    let failed = seekr::store::frontier::count_by_status(pool, FrontierStatus::Failed)
        .await
        .unwrap();
    (completed, failed)
}

#[sqlx::test]
async fn ingests_a_single_page(pool: PgPool) {
    let addr =
        fixture_server(vec![(
            "/a",
            r#"<html lang="en"><body>Hello Hello world</body></html>"#,
        )])
        .await;
    let seed = format!("http://{addr}/a");

    let store = Store::from_pool(pool.clone());
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new(store, &crawler_config(vec![seed.clone()]), cancel.clone())
        .await
        .unwrap();
    let handle = tokio::spawn(pipeline.run());

    wait_for(
        || async { status_counts(&pool).await.0 == 1 },
        "the page to be indexed",
    )
    .await;

    let (url, domain, hash, len): (String, String, String, i32) =
        sqlx::query_as("SELECT url, domain, hash, len FROM docs")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(url, seed);
    assert_eq!(domain, "127.0.0.1");
    assert_eq!(len, 3);

    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"hello");
    hasher.update(b"hello");
    hasher.update(b"world");
    assert_eq!(hash, format!("{:x}", hasher.finalize()));

    let (postings,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM postings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(postings, 2);

    cancel.cancel();
    handle.await.unwrap();
}

#[sqlx::test]
async fn duplicate_content_on_two_urls_indexes_once(pool: PgPool) {
    let body = r#"<html lang="en"><body>same content everywhere</body></html>"#;
    let addr = fixture_server(vec![("/a", body), ("/b", body)]).await;
    let seeds = vec![format!("http://{addr}/a"), format!("http://{addr}/b")];

    let store = Store::from_pool(pool.clone());
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new(store, &crawler_config(seeds), cancel.clone())
        .await
        .unwrap();
    let handle = tokio::spawn(pipeline.run());

    wait_for(
        || async {
            let (completed, failed) = status_counts(&pool).await;
            completed + failed == 2
        },
        "both items to reach a terminal status",
    )
    .await;

    let (completed, failed) = status_counts(&pool).await;
    assert_eq!(completed, 1);
    assert_eq!(failed, 1);

    let (docs,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM docs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(docs, 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[sqlx::test]
async fn unsupported_language_is_failed_without_indexing(pool: PgPool) {
    let addr = fixture_server(vec![(
        "/fr",
        r#"<html lang="fr"><body>bonjour le monde</body></html>"#,
    )])
    .await;
    let seed = format!("http://{addr}/fr");

    let store = Store::from_pool(pool.clone());
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new(store, &crawler_config(vec![seed]), cancel.clone())
        .await
        .unwrap();
    let handle = tokio::spawn(pipeline.run());

    wait_for(
        || async { status_counts(&pool).await.1 == 1 },
        "the item to be marked failed",
    )
    .await;

    for table in ["docs", "terms", "postings"] {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0, "{table} should be empty");
    }

    cancel.cancel();
    handle.await.unwrap();
}

#[sqlx::test]
async fn fetch_errors_mark_the_item_failed(pool: PgPool) {
    let addr = fixture_server(vec![("/ok", "<html></html>")]).await;
    // 404s under the fixture router.
    let seed = format!("http://{addr}/missing");

    let store = Store::from_pool(pool.clone());
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new(store, &crawler_config(vec![seed]), cancel.clone())
        .await
        .unwrap();
    let handle = tokio::spawn(pipeline.run());

    wait_for(
        || async { status_counts(&pool).await.1 == 1 },
        "the item to be marked failed",
    )
    .await;

    cancel.cancel();
    handle.await.unwrap();
}

#[sqlx::test]
async fn discovered_links_are_crawled_breadth_first(pool: PgPool) {
    let addr = fixture_server(vec![
        (
            "/root",
            r#"<html lang="en"><body>root page
                <a href="/left">left</a><a href="/right">right</a>
            </body></html>"#,
        ),
        (
            "/left",
            r#"<html lang="en"><body>left page <a href="/deep">deep</a></body></html>"#,
        ),
        (
            "/right",
            r#"<html lang="en"><body>right page here</body></html>"#,
        ),
        (
            "/deep",
            r#"<html lang="en"><body>deep page content</body></html>"#,
        ),
    ])
    .await;
    let seed = format!("http://{addr}/root");

    let store = Store::from_pool(pool.clone());
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new(store, &crawler_config(vec![seed]), cancel.clone())
        .await
        .unwrap();
    let handle = tokio::spawn(pipeline.run());

    wait_for(
        || async { status_counts(&pool).await.0 == 4 },
        "all four pages to be indexed",
    )
    .await;

    let depths: Vec<(String, i32)> =
        sqlx::query_as("SELECT url, depth FROM frontier ORDER BY depth")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(depths.len(), 4);
    assert_eq!(depths[0].1, 0);
    assert_eq!(depths[1].1, 1);
    assert_eq!(depths[2].1, 1);
    assert_eq!(depths[3].1, 2);
    assert!(depths[3].0.ends_with("/deep"));

    cancel.cancel();
    handle.await.unwrap();
}
