/*!
Doubles de test pour les upstreams

- StubUpstream : vrai serveur HTTP local (127.0.0.1:0) qui enregistre chaque appel
  et répond avec un statut + corps fixés
- FixedSummary / CountingMetrics / RecordingSink / FixedSession : implémentations en mémoire des traits
*/

use crate::error::PulseError;
use crate::models::{
    MetricsPlaceholder, MetricsResult, PublishPayload, PublishResult, SessionGrant, SummaryRequest,
    SummaryText,
};
use crate::upstream::{MetricsSource, PublishSink, SessionIssuer, SummaryModel};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub uri: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    reply: Value,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

pub struct StubUpstream {
    pub base_url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl StubUpstream {
    pub async fn spawn(status: StatusCode, reply: Value) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = StubState { status, reply, calls: calls.clone() };
        let app = Router::new().fallback(record).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { base_url: format!("http://{addr}"), calls }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

async fn record(
    State(stub): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let call = RecordedCall {
        method,
        uri: uri.to_string(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    stub.calls.lock().unwrap().push(call);
    (stub.status, Json(stub.reply.clone()))
}

/// Modèle déterministe : renvoie toujours le même texte.
pub struct FixedSummary {
    pub text: String,
    pub calls: AtomicUsize,
}

impl FixedSummary {
    pub fn new(text: &str) -> Self {
        Self { text: text.to_string(), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryModel for FixedSummary {
    async fn summarize(&self, _request: SummaryRequest<'_>) -> Result<SummaryText, PulseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SummaryText::from(self.text.as_str()))
    }
}

pub struct FailingSummary;

#[async_trait]
impl SummaryModel for FailingSummary {
    async fn summarize(&self, _request: SummaryRequest<'_>) -> Result<SummaryText, PulseError> {
        Err(PulseError::MissingCredential("OPENAI_API_KEY"))
    }
}

#[derive(Default)]
pub struct CountingMetrics {
    pub calls: AtomicUsize,
}

#[async_trait]
impl MetricsSource for CountingMetrics {
    async fn fetch(&self, region: &Value) -> Result<MetricsResult, PulseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MetricsResult::Placeholder(MetricsPlaceholder::for_region(region)))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub payloads: Mutex<Vec<PublishPayload>>,
}

#[async_trait]
impl PublishSink for RecordingSink {
    async fn publish(&self, payload: PublishPayload) -> Result<PublishResult, PulseError> {
        self.payloads.lock().unwrap().push(payload);
        Ok(PublishResult::Acknowledged(serde_json::json!({"status": "success"})))
    }
}

/// Émetteur de session qui renvoie toujours la même réponse.
pub struct FixedSession(pub SessionGrant);

#[async_trait]
impl SessionIssuer for FixedSession {
    async fn create_session(&self) -> Result<SessionGrant, PulseError> {
        Ok(self.0.clone())
    }
}

/// Client sans proxy système, pour joindre les stubs locaux.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
