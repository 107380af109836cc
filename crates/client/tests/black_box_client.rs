use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use vuzoll_client::api::{Catalog, HealthCheck, OrderSender, ServerLogs};
use vuzoll_client::session::{Command, Notice, Session};
use vuzoll_client::types::{OrderLine, OrderRequest};
use vuzoll_client::{
    BackendError, ClientConfig, ConnectionProbe, ConnectivityStatus, HttpBackend, PollingConfig,
};
use vuzoll_core::{Action, ItemId, Operator};

/// In-process stand-in for the warehouse backend.
#[derive(Default)]
struct Fake {
    health_status: AtomicU16,
    orders: Mutex<Vec<Value>>,
    tunnel_headers: Mutex<Vec<Option<String>>>,
}

impl Fake {
    fn record_headers(&self, headers: &HeaderMap) {
        let value = headers
            .get("ngrok-skip-browser-warning")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.tunnel_headers.lock().unwrap().push(value);
    }
}

fn catalog() -> Vec<Value> {
    vec![
        json!({"id": "A", "name": "Bearing 6204", "quantity": 14, "location": "R1-S2"}),
        json!({"id": "B", "name": "V-belt A42", "quantity": 0, "location": null}),
    ]
}

async fn health(State(fake): State<Arc<Fake>>, headers: HeaderMap) -> StatusCode {
    fake.record_headers(&headers);
    StatusCode::from_u16(fake.health_status.load(Ordering::SeqCst)).unwrap()
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let q = params.get("q").cloned().unwrap_or_default().to_lowercase();
    let results: Vec<Value> = catalog()
        .into_iter()
        .filter(|item| item["name"].as_str().unwrap().to_lowercase().contains(&q))
        .map(|item| json!({"id": item["id"], "name": item["name"]}))
        .collect();
    Json(json!({ "results": results }))
}

async fn get_item(Query(params): Query<HashMap<String, String>>) -> Response {
    let id = params.get("id").cloned().unwrap_or_default();
    if id == "html" {
        return Html("<html>tunnel offline</html>").into_response();
    }
    match catalog().into_iter().find(|item| item["id"] == id.as_str()) {
        Some(item) => Json(item).into_response(),
        None => Json(json!({ "error": format!("Item {id} not found") })).into_response(),
    }
}

async fn submit_order(
    State(fake): State<Arc<Fake>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    fake.record_headers(&headers);
    let id = body["items"][0]["id"].as_str().unwrap_or_default().to_string();
    fake.orders.lock().unwrap().push(body);

    if id == "B" {
        Json(json!({ "success": false, "error": "Not enough stock" }))
    } else {
        Json(json!({ "success": true, "details": [format!("✅ {id} written off")] }))
    }
}

async fn logs() -> Json<Value> {
    Json(json!({ "logs": "12:00 bot started\n12:01 order #1" }))
}

struct TestServer {
    base_url: String,
    fake: Arc<Fake>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let fake = Arc::new(Fake {
            health_status: AtomicU16::new(200),
            ..Default::default()
        });
        let app = Router::new()
            .route("/api/health", get(health))
            .route("/api/search", get(search))
            .route("/api/get_item", get(get_item))
            .route("/api/submit_order", post(submit_order))
            .route("/api/logs", get(logs))
            .with_state(fake.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            fake,
            handle,
        }
    }

    fn backend(&self) -> HttpBackend {
        // Trailing slash is accepted and stripped.
        HttpBackend::new(format!("{}/", self.base_url), Duration::from_secs(2)).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn id(raw: &str) -> ItemId {
    ItemId::new(raw).unwrap()
}

#[tokio::test]
async fn health_maps_status_codes() {
    let srv = TestServer::spawn().await;
    let backend = srv.backend();

    assert_eq!(backend.health().await, Ok(()));

    srv.fake.health_status.store(204, Ordering::SeqCst);
    assert_eq!(backend.health().await, Ok(()));

    srv.fake.health_status.store(404, Ordering::SeqCst);
    assert_eq!(backend.health().await, Err(BackendError::Status(404)));

    srv.fake.health_status.store(500, Ordering::SeqCst);
    assert_eq!(backend.health().await, Err(BackendError::Status(500)));

    let headers = srv.fake.tunnel_headers.lock().unwrap().clone();
    assert!(headers.iter().all(|h| h.as_deref() == Some("true")));
}

#[tokio::test]
async fn get_item_distinguishes_items_refusals_and_non_json() {
    let srv = TestServer::spawn().await;
    let backend = srv.backend();

    let item = backend.get_item(&id("A")).await.unwrap();
    assert_eq!(item.name, "Bearing 6204");
    assert_eq!(item.quantity, 14);
    assert_eq!(item.location.as_deref(), Some("R1-S2"));

    assert_eq!(
        backend.get_item(&id("Z")).await,
        Err(BackendError::Rejected("Item Z not found".into()))
    );

    assert!(matches!(
        backend.get_item(&id("html")).await,
        Err(BackendError::UnexpectedContent(ct)) if ct.starts_with("text/html")
    ));
}

#[tokio::test]
async fn search_sends_query_and_decodes_hits() {
    let srv = TestServer::spawn().await;
    let hits = srv.backend().search("v-belt").await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, id("B"));
    assert_eq!(hits[0].name, "V-belt A42");
}

#[tokio::test]
async fn submit_order_reports_success_and_refusal() {
    let srv = TestServer::spawn().await;
    let backend = srv.backend();

    let order = |raw: &str| OrderRequest {
        user_id: Some(42),
        user_name: Some("Olena".into()),
        items: vec![OrderLine {
            id: id(raw),
            qty: 3,
            action: Action::Restock,
        }],
    };

    let ok = backend.submit_order(&order("A")).await.unwrap();
    assert!(ok.success);
    assert_eq!(ok.details, vec!["✅ A written off".to_string()]);

    let refused = backend.submit_order(&order("B")).await.unwrap();
    assert!(!refused.success);
    assert_eq!(refused.error.as_deref(), Some("Not enough stock"));

    let sent = srv.fake.orders.lock().unwrap().clone();
    assert_eq!(
        sent[0],
        json!({
            "user_id": 42,
            "user_name": "Olena",
            "items": [{"id": "A", "qty": 3, "action": "restock"}]
        })
    );
}

#[tokio::test]
async fn server_logs_are_returned_verbatim() {
    let srv = TestServer::spawn().await;
    let logs = srv.backend().fetch_logs().await.unwrap();
    assert_eq!(logs, "12:00 bot started\n12:01 order #1");
}

#[tokio::test]
async fn connectivity_is_lost_when_nothing_listens() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(format!("http://{}", addr), Duration::from_secs(1)).unwrap();
    assert!(matches!(backend.health().await, Err(BackendError::Network(_))));

    let probe = ConnectionProbe::new(Arc::new(backend), Duration::from_secs(1));
    assert_eq!(probe.probe().await, ConnectivityStatus::Disconnected);
    assert!(!probe.status().is_connected());
}

#[tokio::test]
async fn session_scans_submits_and_keeps_refused_line() {
    let srv = TestServer::spawn().await;
    let config = ClientConfig {
        api_url: srv.base_url.clone(),
        operator: Operator::new(Some(7), Some("Taras".into())),
        default_action: Action::Take,
        polling: PollingConfig::default(),
        request_timeout: Duration::from_secs(2),
        probe_timeout: Duration::from_secs(1),
    };
    let (mut session, monitor) = Session::launch(&config).unwrap();

    for _ in 0..50 {
        if monitor.status() == ConnectivityStatus::Connected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(monitor.status().is_connected());

    session.handle(Command::Scanned("A".into())).await;
    session.handle(Command::Scanned("B".into())).await;
    for raw in ["A", "B"] {
        session
            .handle(Command::SetQuantity { id: id(raw), raw: "2".into() })
            .await;
    }

    let notices = session.handle(Command::Submit).await;
    let [Notice::Report(report), Notice::Cart(left)] = notices.as_slice() else {
        panic!("expected report and cart, got {notices:?}");
    };
    assert_eq!(
        report.lines(),
        vec![
            "✅ A written off".to_string(),
            "❌ V-belt A42: Not enough stock".to_string(),
        ]
    );
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, id("B"));

    let orders = srv.fake.orders.lock().unwrap().clone();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o["user_id"] == 7 && o["items"].as_array().unwrap().len() == 1));

    monitor.shutdown().await;
}
