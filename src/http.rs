use crate::collectors::system::SourceFactory;
use crate::collectors::{
    self, cpu, disk, host, memory, CpuRecord, DiskRecord, HostRecord, MemoryRecord,
    MetricsSource, ProbeErrors, SystemSnapshot,
};
use crate::metrics::Metrics;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::error;

#[derive(Clone)]
pub struct HttpAppState {
    pub metrics: Arc<Metrics>,
    pub sources: SourceFactory,
    pub cpu_window: Duration,
}

impl HttpAppState {
    /// Runs a probe on the blocking pool against a fresh source. A probe that
    /// panics is answered with `fallback()`, never with an HTTP error.
    async fn probe<T, F, D>(&self, endpoint: &'static str, probe: F, fallback: D) -> T
    where
        F: FnOnce(&mut (dyn MetricsSource + 'static)) -> T + Send + 'static,
        D: FnOnce() -> T,
        T: Send + 'static,
    {
        self.metrics.inc_request(endpoint);
        let sources = self.sources.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut source = sources();
            probe(source.as_mut())
        });

        match task.await {
            Ok(value) => value,
            Err(err) => {
                error!(endpoint, error = %err, "сбор метрик завершился аварийно");
                fallback()
            }
        }
    }
}

pub fn build_router(
    metrics: Arc<Metrics>,
    sources: SourceFactory,
    cpu_window: Duration,
) -> Router {
    Router::new()
        .route("/", get(system_handler))
        .route("/cpu", get(cpu_handler))
        .route("/memory", get(memory_handler))
        .route("/disk", get(disk_handler))
        .route("/host", get(host_handler))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .with_state(HttpAppState {
            metrics,
            sources,
            cpu_window,
        })
}

async fn system_handler(State(state): State<HttpAppState>) -> Json<SystemSnapshot> {
    let window = state.cpu_window;
    let (snapshot, errors) = state
        .probe(
            "system",
            move |source| collectors::collect_system(source, window),
            || {
                (
                    SystemSnapshot::empty_at(SystemTime::now()),
                    ProbeErrors::default(),
                )
            },
        )
        .await;
    state.metrics.observe_system(&snapshot, &errors);
    Json(snapshot)
}

async fn cpu_handler(State(state): State<HttpAppState>) -> Json<Vec<CpuRecord>> {
    let window = state.cpu_window;
    let (records, errors) = state
        .probe(
            "cpu",
            move |source| cpu::collect_cpu(source, window),
            Default::default,
        )
        .await;
    state.metrics.observe_cpu(&records, errors);
    Json(records)
}

async fn memory_handler(State(state): State<HttpAppState>) -> Json<MemoryRecord> {
    let (record, errors) = state
        .probe(
            "memory",
            |source| memory::collect_memory(source),
            Default::default,
        )
        .await;
    state.metrics.observe_memory(&record, errors);
    Json(record)
}

async fn disk_handler(State(state): State<HttpAppState>) -> Json<DiskRecord> {
    let (record, errors) = state
        .probe("disk", |source| disk::collect_disk(source), Default::default)
        .await;
    state.metrics.observe_disk(&record, errors);
    Json(record)
}

async fn host_handler(State(state): State<HttpAppState>) -> Json<HostRecord> {
    let (record, errors) = state
        .probe(
            "host",
            |source| host::collect_host(source),
            || (HostRecord::empty_at(SystemTime::now()), 0),
        )
        .await;
    state.metrics.observe_host(&record, errors);
    Json(record)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler(State(state): State<HttpAppState>) -> Response {
    state.metrics.inc_scrape_count();
    match state.metrics.encode_metrics() {
        Ok(encoded) => {
            let mut response = Response::new(Body::from(encoded));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("ошибка кодирования метрик: {err}"),
        )
            .into_response(),
    }
}
