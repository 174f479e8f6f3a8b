//! Mock Gemini and Sheets endpoints served by axum on ephemeral ports.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;
use tracing_subscriber::fmt::MakeWriter;

pub const HEADERS: [&str; 4] = ["Número", "Concepto", "Argumentos", "Observaciones"];

/// Route test output through the test writer; RUST_LOG controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Thread-local subscriber writing into a buffer; events from this
/// (current-thread) test runtime land in it until the guard drops.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, LogBuffer) {
    let buf = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buf.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (tracing::subscriber::set_default(subscriber), buf)
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// =============================================================================
// Gemini
// =============================================================================

#[derive(Debug, Clone)]
pub struct GeminiCall {
    pub query: HashMap<String, String>,
    pub body: Value,
}

#[derive(Clone)]
pub struct MockGemini {
    pub status: StatusCode,
    pub reply: String,
    pub calls: Arc<Mutex<Vec<GeminiCall>>>,
}

impl MockGemini {
    /// Reply with a well-formed candidate carrying `text`.
    pub fn answering(text: &str) -> Self {
        Self::raw(
            StatusCode::OK,
            json!({
                "candidates": [ { "content": { "parts": [ { "text": text } ], "role": "model" } } ]
            })
            .to_string(),
        )
    }

    pub fn raw(status: StatusCode, reply: impl Into<String>) -> Self {
        Self {
            status,
            reply: reply.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<GeminiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Starts the server; returns the endpoint URL to hand to `GeminiClient::new`.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/v1beta/generate", post(gemini_handler))
            .with_state(self.clone());
        format!("{}/v1beta/generate", serve(app).await)
    }
}

async fn gemini_handler(
    State(mock): State<MockGemini>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    mock.calls.lock().unwrap().push(GeminiCall { query, body });
    (
        mock.status,
        [(header::CONTENT_TYPE, "application/json")],
        mock.reply.clone(),
    )
}

// =============================================================================
// Sheets
// =============================================================================

#[derive(Debug, Clone)]
pub struct SheetsPut {
    pub range: String,
    pub query: HashMap<String, String>,
    pub body: Value,
}

#[derive(Clone)]
pub struct MockSheets {
    pub title: String,
    pub sheet_titles: Vec<String>,
    /// Header row first, then data rows.
    pub values: Vec<Vec<String>>,
    pub reads: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    pub puts: Arc<Mutex<Vec<SheetsPut>>>,
    pub auth_headers: Arc<Mutex<Vec<String>>>,
    /// Row numbers whose PUT answers 500.
    pub failing_rows: Vec<usize>,
}

impl MockSheets {
    pub fn new(values: Vec<Vec<&str>>) -> Self {
        Self {
            title: "Evaluación".to_string(),
            sheet_titles: vec!["Resumen".to_string(), "Conceptos".to_string()],
            values: values
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
            reads: Arc::new(Mutex::new(Vec::new())),
            puts: Arc::new(Mutex::new(Vec::new())),
            auth_headers: Arc::new(Mutex::new(Vec::new())),
            failing_rows: Vec::new(),
        }
    }

    pub fn puts(&self) -> Vec<SheetsPut> {
        self.puts.lock().unwrap().clone()
    }

    pub fn reads(&self) -> Vec<(String, HashMap<String, String>)> {
        self.reads.lock().unwrap().clone()
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.auth_headers.lock().unwrap().clone()
    }

    /// Starts the server; returns the API root to hand to `with_base_url`.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/v4/spreadsheets/:id", get(metadata_handler))
            .route(
                "/v4/spreadsheets/:id/values/:range",
                get(values_get_handler).put(values_put_handler),
            )
            .with_state(self.clone());
        format!("{}/v4/spreadsheets/", serve(app).await)
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.auth_headers.lock().unwrap().push(value);
    }
}

async fn metadata_handler(
    State(mock): State<MockSheets>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    mock.record_auth(&headers);
    let sheets: Vec<Value> = mock
        .sheet_titles
        .iter()
        .enumerate()
        .map(|(i, t)| json!({ "properties": { "sheetId": 100 + i, "title": t, "index": i } }))
        .collect();
    Json(json!({ "properties": { "title": mock.title }, "sheets": sheets }))
}

async fn values_get_handler(
    State(mock): State<MockSheets>,
    Path((_id, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    mock.record_auth(&headers);
    mock.reads.lock().unwrap().push((range.clone(), query));
    Json(json!({ "range": range, "majorDimension": "ROWS", "values": mock.values }))
}

async fn values_put_handler(
    State(mock): State<MockSheets>,
    Path((_id, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    mock.record_auth(&headers);
    let failing = mock
        .failing_rows
        .iter()
        .any(|n| range.contains(&format!("!A{}:", n)));
    if failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "backend error".to_string());
    }
    mock.puts.lock().unwrap().push(SheetsPut {
        range: range.clone(),
        query,
        body,
    });
    (
        StatusCode::OK,
        json!({ "spreadsheetId": "doc", "updatedRange": range, "updatedRows": 1 }).to_string(),
    )
}
