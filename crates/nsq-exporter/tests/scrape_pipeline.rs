//! End-to-end scrape tests.
//!
//! Runs a fake nsqd on an ephemeral port and drives the exporter router:
//! fake nsqd → StatsClient → Collector → router → exposition body.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use nsq_api::build_router;
use nsq_metrics::{Collector, ScrapeOutcome};
use nsq_stats::StatsClient;
use tower::ServiceExt;

type StatsBody = Arc<Mutex<String>>;

/// Serve whatever `body` currently holds on `/stats`.
async fn fake_nsqd(initial: serde_json::Value) -> (SocketAddr, StatsBody) {
    let body: StatsBody = Arc::new(Mutex::new(initial.to_string()));
    let app = Router::new()
        .route(
            "/stats",
            get(|State(body): State<StatsBody>| async move { body.lock().unwrap().clone() }),
        )
        .with_state(body.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, body)
}

async fn scrape(router: &Router, path: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(path).body(Body::empty()).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn series(body: &str) -> Vec<&str> {
    body.lines().filter(|l| !l.starts_with('#')).collect()
}

fn single_channel(depth: i64, clients: i64) -> serde_json::Value {
    serde_json::json!({
        "version": "1.3.0",
        "topics": [{
            "topic_name": "t1",
            "channels": [{
                "channel_name": "c1",
                "depth": depth,
                "backend_depth": 0,
                "in_flight_count": 1,
                "deferred_count": 0,
                "message_count": 42,
                "requeue_count": 0,
                "timeout_count": 0,
                "client_count": clients,
                "paused": false,
                "clients": []
            }]
        }]
    })
}

#[tokio::test]
async fn scrape_exposes_channel_gauges() {
    let (addr, _) = fake_nsqd(single_channel(5, 2)).await;
    let client = StatsClient::new(&format!("http://{addr}/stats")).unwrap();
    let router = build_router(Arc::new(Collector::new(client, "")), "/metrics").unwrap();

    let (status, body) = scrape(&router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("depth{topic=\"t1\",channel=\"c1\",paused=\"false\"} 5\n"));
    assert!(body.contains("client_count{topic=\"t1\",channel=\"c1\",paused=\"false\"} 2\n"));
    assert!(body.contains("message_count{topic=\"t1\",channel=\"c1\",paused=\"false\"} 42\n"));
    assert!(body.contains("in_flight_count{topic=\"t1\",channel=\"c1\",paused=\"false\"} 1\n"));
    assert_eq!(series(&body).len(), 4);
}

#[tokio::test]
async fn scrape_uses_default_namespace_prefix() {
    let (addr, _) = fake_nsqd(single_channel(5, 2)).await;
    let client = StatsClient::new(&format!("http://{addr}/stats")).unwrap();
    let router = build_router(Arc::new(Collector::new(client, "nsq")), "/metrics").unwrap();

    let (_, body) = scrape(&router, "/metrics").await;
    assert!(body.contains("# HELP nsq_depth Depth of the channel's queue\n"));
    assert!(body.contains("nsq_depth{topic=\"t1\",channel=\"c1\",paused=\"false\"} 5\n"));
}

#[tokio::test]
async fn repeated_scrapes_are_identical() {
    let (addr, _) = fake_nsqd(single_channel(5, 2)).await;
    let client = StatsClient::new(&format!("http://{addr}/stats")).unwrap();
    let router = build_router(Arc::new(Collector::new(client, "nsq")), "/metrics").unwrap();

    let (_, first) = scrape(&router, "/metrics").await;
    let (_, second) = scrape(&router, "/metrics").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn each_scrape_reflects_current_broker_state() {
    let (addr, body) = fake_nsqd(single_channel(5, 2)).await;
    let client = StatsClient::new(&format!("http://{addr}/stats")).unwrap();
    let router = build_router(Arc::new(Collector::new(client, "nsq")), "/metrics").unwrap();

    let (_, before) = scrape(&router, "/metrics").await;
    assert!(before.contains("nsq_depth{topic=\"t1\",channel=\"c1\",paused=\"false\"} 5\n"));

    *body.lock().unwrap() = single_channel(11, 3).to_string();
    let (_, after) = scrape(&router, "/metrics").await;
    assert!(after.contains("nsq_depth{topic=\"t1\",channel=\"c1\",paused=\"false\"} 11\n"));
    assert!(after.contains("nsq_client_count{topic=\"t1\",channel=\"c1\",paused=\"false\"} 3\n"));
}

#[tokio::test]
async fn deleted_channel_disappears() {
    let (addr, body) = fake_nsqd(single_channel(5, 2)).await;
    let client = StatsClient::new(&format!("http://{addr}/stats")).unwrap();
    let router = build_router(Arc::new(Collector::new(client, "nsq")), "/metrics").unwrap();

    assert_eq!(series(&scrape(&router, "/metrics").await.1).len(), 4);

    *body.lock().unwrap() = serde_json::json!({"version": "1.3.0", "topics": []}).to_string();
    let (status, after) = scrape(&router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(series(&after).is_empty());
}

#[tokio::test]
async fn broker_down_still_returns_200() {
    // Nothing listens on port 1.
    let client = StatsClient::new("http://127.0.0.1:1/stats").unwrap();
    let collector = Arc::new(Collector::new(client, "nsq"));
    let router = build_router(Arc::clone(&collector), "/metrics").unwrap();

    let (status, body) = scrape(&router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(series(&body).is_empty());
    assert!(body.contains("# TYPE nsq_depth gauge"));
    assert_eq!(collector.last_scrape().await, Some(ScrapeOutcome::Failed));

    // The exporter keeps serving after a failed scrape.
    let (status, _) = scrape(&router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_stats_still_returns_200() {
    let (addr, body) = fake_nsqd(single_channel(5, 2)).await;
    *body.lock().unwrap() = "{\"topics\": [".to_string();

    let client = StatsClient::new(&format!("http://{addr}/stats")).unwrap();
    let router = build_router(Arc::new(Collector::new(client, "nsq")), "/metrics").unwrap();

    let (status, body) = scrape(&router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(series(&body).is_empty());
}

#[tokio::test]
async fn landing_page_links_metrics() {
    let client = StatsClient::new("http://127.0.0.1:1/stats").unwrap();
    let router = build_router(Arc::new(Collector::new(client, "nsq")), "/metrics").unwrap();

    let (status, body) = scrape(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>NSQ Exporter</h1>"));
    assert!(body.contains("<a href=\"/metrics\">Metrics</a>"));
}
