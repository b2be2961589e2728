//! Mock ads backend for data source integration tests
//!
//! Serves the three listing endpoints on an ephemeral local port, each level
//! with a different response envelope, and records every request it sees.
//!
//! - `POST /api/campaigns` → `{rows, lastRow}` (or 405 when POST is disabled)
//! - `GET  /api/campaigns?limit=<n>` → bare array
//! - `GET  /api/adsets?campaign_id=..` → `{data}`
//! - `GET  /api/ads?adset_id=..` → `{result: {rows}, totalCount}`
//! - `GET  /api/broken` → 200 with an HTML body

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Clone, Default)]
pub struct MockState {
    /// Answer root POSTs with 405 so the client falls back to GET
    pub root_post_fails: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockState {
    fn record(&self, method: &str, uri: &Uri) {
        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}", method, uri));
    }

    /// Requests seen so far, as `"METHOD /path?query"`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: MockState,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self::start_with(MockState::default()).await
    }

    pub async fn start_with(state: MockState) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/campaigns", get(list_campaigns_get).post(list_campaigns_post))
        .route("/api/adsets", get(list_adsets))
        .route("/api/ads", get(list_ads))
        .route("/api/broken", get(broken))
        .with_state(state)
}

pub fn campaigns() -> Vec<Value> {
    vec![
        json!({"id": "C100", "name": "Black Friday", "status": "ACTIVE", "spend": "1.234,56"}),
        json!({"id": "C200", "name": "Always On", "status": "PAUSED", "spend": "310,00"}),
        json!({"id": "C300", "name": "Retargeting", "status": "ERROR", "spend": "0"}),
        json!({"id": "C400", "name": "Brand", "status": "ACTIVE", "spend": "87,10"}),
        json!({"id": "C500", "name": "Launch", "status": "OFF", "spend": null}),
    ]
}

fn window<T: Clone>(items: &[T], start: u64, end: u64) -> Vec<T> {
    let start = (start as usize).min(items.len());
    let end = (end as usize).clamp(start, items.len());
    items[start..end].to_vec()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeBody {
    start_row: u64,
    end_row: u64,
}

async fn list_campaigns_post(
    State(state): State<MockState>,
    uri: Uri,
    Json(body): Json<RangeBody>,
) -> Response {
    state.record("POST", &uri);
    if state.root_post_fails.load(Ordering::SeqCst) {
        return (StatusCode::METHOD_NOT_ALLOWED, "POST not supported").into_response();
    }
    let all = campaigns();
    Json(json!({
        "rows": window(&all, body.start_row, body.end_row),
        "lastRow": all.len(),
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<u64>,
}

async fn list_campaigns_get(
    State(state): State<MockState>,
    uri: Uri,
    Query(query): Query<LimitQuery>,
) -> Response {
    state.record("GET", &uri);
    let all = campaigns();
    let limit = query.limit.unwrap_or(all.len() as u64);
    Json(Value::Array(window(&all, 0, limit))).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrillDownQuery {
    #[serde(rename = "campaign_id")]
    campaign_id: Option<String>,
    #[serde(rename = "adset_id")]
    adset_id: Option<String>,
    period: String,
    start_row: u64,
    end_row: u64,
}

fn known_period(period: &str) -> bool {
    matches!(period, "TODAY" | "YESTERDAY" | "LAST_7D")
}

async fn list_adsets(
    State(state): State<MockState>,
    uri: Uri,
    Query(query): Query<DrillDownQuery>,
) -> Response {
    state.record("GET", &uri);
    if !known_period(&query.period) {
        return (StatusCode::BAD_REQUEST, "invalid period").into_response();
    }
    let adsets = match query.campaign_id.as_deref() {
        Some("C100") => vec![json!({"id": "AS1", "name": "Adset 1"})],
        Some("C200") => vec![
            json!({"id": "AS2", "name": "Prospecting", "learning_progress": "3/4"}),
            json!({"id": "AS3", "name": "Lookalike", "learning_progress": "0/4"}),
        ],
        Some(other) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": format!("campaign {} not found", other)})),
            )
                .into_response()
        }
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"detail": "campaign_id is required"})),
            )
                .into_response()
        }
    };
    Json(json!({ "data": window(&adsets, query.start_row, query.end_row) })).into_response()
}

async fn list_ads(
    State(state): State<MockState>,
    uri: Uri,
    Query(query): Query<DrillDownQuery>,
) -> Response {
    state.record("GET", &uri);
    let Some(adset_id) = query.adset_id else {
        return (StatusCode::BAD_REQUEST, "adset_id is required").into_response();
    };
    let ads: Vec<Value> = (1..=3)
        .map(|i| json!({"id": format!("{}-AD{}", adset_id, i), "status": "ACTIVE"}))
        .collect();
    Json(json!({
        "result": { "rows": window(&ads, query.start_row, query.end_row) },
        "totalCount": ads.len(),
    }))
    .into_response()
}

async fn broken(State(state): State<MockState>, uri: Uri) -> Response {
    state.record("GET", &uri);
    (StatusCode::OK, "<html><body>session expired</body></html>").into_response()
}
