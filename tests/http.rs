use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize, PartialEq)]
struct Point {
    id: u64,
    milestone: String,
    value: u8,
    annotation: Option<String>,
    category: String,
    metric: String,
}

#[derive(Debug, Deserialize)]
struct PointGroup {
    metric: String,
    points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct SeriesLine {
    values: Vec<Option<u8>>,
}

#[derive(Debug, Deserialize)]
struct ChartSeries {
    labels: Vec<String>,
    series: Vec<SeriesLine>,
}

#[derive(Debug, Deserialize)]
struct Statistics {
    count: usize,
    mean: Option<f64>,
    trend: String,
}

#[derive(Debug, Deserialize)]
struct JourneyView {
    metrics: Vec<String>,
    categories: Vec<String>,
    chart: ChartSeries,
    groups: Vec<PointGroup>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    points: usize,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("emotion_journey_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/journey")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_emotion_journey"))
        .env("PORT", port.to_string())
        .env("APP_BIND", "127.0.0.1")
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

/// Replaces the server journey with an empty one selecting `metrics`.
async fn reset(client: &Client, base_url: &str, metrics: &[&str]) {
    let response = client
        .post(format!("{base_url}/api/import"))
        .body(json!({ "metrics": ["confidence", "happiness"], "points": [] }).to_string())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .put(format!("{base_url}/api/selection"))
        .json(&json!({ "metrics": metrics, "filter": "all", "sort": "by_milestone" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

async fn add_point(client: &Client, base_url: &str, body: serde_json::Value) -> Point {
    let response = client
        .post(format!("{base_url}/api/points"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn view(client: &Client, base_url: &str) -> JourneyView {
    client
        .get(format!("{base_url}/api/view"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_added_point_appears_in_view() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    let point = add_point(
        &client,
        &server.base_url,
        json!({ "milestone": "W1", "value": 6, "annotation": "first week",
                "category": "Work", "metric": "confidence" }),
    )
    .await;
    assert_eq!(point.category, "Work");
    assert_eq!(point.annotation.as_deref(), Some("first week"));

    let view = view(&client, &server.base_url).await;
    assert_eq!(view.groups.len(), 1);
    assert_eq!(view.groups[0].metric, "confidence");
    assert_eq!(view.groups[0].points, [point]);
    assert_eq!(view.chart.labels, ["W1"]);
    assert_eq!(view.chart.series[0].values, [Some(6)]);
}

#[tokio::test]
async fn http_add_point_rejects_empty_milestone() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    let response = client
        .post(format!("{}/api/points", server.base_url))
        .json(&json!({ "milestone": "   ", "value": 4, "metric": "confidence" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(view(&client, &server.base_url).await.groups.is_empty());
}

#[tokio::test]
async fn http_register_metric_rejects_case_insensitive_duplicate() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    let first = client
        .post(format!("{}/api/metrics", server.base_url))
        .json(&json!({ "name": "Energy" }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client
        .post(format!("{}/api/metrics", server.base_url))
        .json(&json!({ "name": "energy" }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn http_update_and_delete_point() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    let point = add_point(
        &client,
        &server.base_url,
        json!({ "milestone": "W1", "value": 2, "metric": "confidence" }),
    )
    .await;

    let updated: Point = client
        .put(format!("{}/api/points/{}", server.base_url, point.id))
        .json(&json!({ "value": 8, "annotation": "better" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.id, point.id);
    assert_eq!(updated.value, 8);
    assert_eq!(updated.milestone, "W1");

    let response = client
        .delete(format!("{}/api/points/{}", server.base_url, point.id))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let again = client
        .delete(format!("{}/api/points/{}", server.base_url, point.id))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_statistics_report_rising_trend() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    for (milestone, value) in [("W1", 3), ("W2", 7), ("W3", 6), ("W4", 9)] {
        add_point(
            &client,
            &server.base_url,
            json!({ "milestone": milestone, "value": value, "metric": "confidence" }),
        )
        .await;
        // Keeps creation timestamps distinct.
        sleep(Duration::from_millis(5)).await;
    }

    let stats: Statistics = client
        .get(format!("{}/api/stats/confidence", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.count, 4);
    assert!((stats.mean.unwrap() - 6.25).abs() < 1e-9);
    assert_eq!(stats.trend, "Rising");

    let view = view(&client, &server.base_url).await;
    assert_eq!(view.statistics.unwrap().trend, "Rising");
}

#[tokio::test]
async fn http_deselecting_last_metric_is_refused() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    let response = client
        .delete(format!("{}/api/selection/metrics/confidence", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_save_then_load_restores_journey() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    add_point(
        &client,
        &server.base_url,
        json!({ "milestone": "W1", "value": 5, "metric": "happiness" }),
    )
    .await;
    let saved: StatusResponse = client
        .post(format!("{}/api/save", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved.points, 1);

    reset(&client, &server.base_url, &["confidence"]).await;
    let loaded: StatusResponse = client
        .post(format!("{}/api/load", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loaded.points, 1);
}

#[tokio::test]
async fn http_load_reports_names_of_legacy_journey() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    let response = client
        .post(format!("{}/api/import", server.base_url))
        .body(json!({ "metric": "Mood", "points": [{ "milestone": "W1", "value": 4 }] }).to_string())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let response = client
        .post(format!("{}/api/save", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    reset(&client, &server.base_url, &["confidence"]).await;
    assert!(!view(&client, &server.base_url).await.metrics.contains(&"mood".to_string()));

    let response = client
        .post(format!("{}/api/load", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let view = view(&client, &server.base_url).await;
    assert_eq!(view.metrics, ["mood"]);
    assert!(view.categories.contains(&"Other".to_string()));
    assert_eq!(view.groups[0].metric, "mood");
}

#[tokio::test]
async fn http_unreadable_bodies_are_bad_requests() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    let response = client
        .post(format!("{}/api/points", server.base_url))
        .json(&json!({ "milestone": "W1", "value": 5.5, "metric": "confidence" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .patch(format!("{}/api/selection", server.base_url))
        .json(&json!({ "sort": "sideways" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/metrics", server.base_url))
        .header("content-type", "application/json")
        .body("{")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(view(&client, &server.base_url).await.groups.is_empty());
}

#[tokio::test]
async fn http_malformed_import_keeps_journey() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;
    add_point(
        &client,
        &server.base_url,
        json!({ "milestone": "W1", "value": 5, "metric": "confidence" }),
    )
    .await;

    let response = client
        .post(format!("{}/api/import", server.base_url))
        .body(r#"{ "metrics": ["confidence"], "points": "nope" }"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(view(&client, &server.base_url).await.groups[0].points.len(), 1);
}

#[tokio::test]
async fn http_export_offers_download() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url, &["confidence"]).await;

    let response = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("emotion_journey.json"));

    let doc: serde_json::Value = response.json().await.unwrap();
    assert_eq!(doc["version"], 2);
    assert_eq!(doc["metrics"], json!(["confidence", "happiness"]));
}
