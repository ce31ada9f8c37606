//! HTTP surface for the detection pipeline.
//!
//! Handlers stay thin: parse the request, run the engine on a blocking
//! task, render the result or the error.

use crate::config::AppConfig;
use crate::detector::DetectionEngine;
use crate::error::PredictionError;
use crate::metrics::PipelineMetrics;
use crate::types::prediction::{FileOutcome, PredictionResult};
use crate::types::record::FeatureRecord;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DetectionEngine>,
    pub metrics: Arc<PipelineMetrics>,
    pub config: Arc<AppConfig>,
}

/// Create the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/model-info", get(model_info))
        .route("/available-files", get(available_files))
        .route("/process-file", post(process_file))
        .route("/results-file", get(results_file))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn model_info(State(state): State<AppState>) -> Json<Value> {
    let status = state.engine.artifact_status();
    Json(json!({
        "model_loaded": status.classifier_loaded,
        "scaler_loaded": status.scaler_loaded,
        "encoders_loaded": status.encoders_loaded,
        "status": if status.ready { "ready" } else { "not_ready" },
    }))
}

async fn predict(
    State(state): State<AppState>,
    Json(record): Json<FeatureRecord>,
) -> Result<Json<PredictionResult>, PredictionError> {
    let engine = state.engine.clone();
    let started = Instant::now();

    let result = tokio::task::spawn_blocking(move || engine.detect(&record))
        .await
        .map_err(|e| PredictionError::Classifier(format!("prediction task failed: {e}")))??;

    state
        .metrics
        .record_detection(started.elapsed(), result.is_attack, result.confidence);

    info!(
        prediction = ?result.prediction,
        confidence = ?result.confidence,
        elapsed_us = started.elapsed().as_micros() as u64,
        "prediction served"
    );

    Ok(Json(result))
}

async fn available_files(State(state): State<AppState>) -> Response {
    match list_data_files(&state.config.server.data_dir).await {
        Ok(files) => Json(json!({ "files": files })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("cannot list data directory: {e}") })),
        )
            .into_response(),
    }
}

async fn list_data_files(data_dir: &str) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(data_dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            if let Ok(name) = entry.file_name().into_string() {
                files.push(name);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Deserialize)]
struct ProcessFileRequest {
    #[serde(alias = "fileName")]
    file_name: String,
}

async fn process_file(
    State(state): State<AppState>,
    Json(request): Json<ProcessFileRequest>,
) -> Response {
    let file_name = request.file_name;

    // Plain file names only; nothing that walks out of the data directory.
    if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.contains("..") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid file name" })),
        )
            .into_response();
    }

    let path = Path::new(&state.config.server.data_dir).join(&file_name);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("file not found: {file_name}") })),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let engine = state.engine.clone();
    let started = Instant::now();
    let task_name = file_name.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.process_file(&task_name, &content))
        .await
        .map_err(|e| PredictionError::Classifier(format!("processing task failed: {e}")));

    match outcome {
        Ok(Ok(outcome)) => {
            if let FileOutcome::Batch(summary) = &outcome {
                state.metrics.record_detection(
                    started.elapsed(),
                    summary.prediction.is_attack(),
                    summary.confidence,
                );
            }
            info!(file = %file_name, "file processed");
            Json(outcome).into_response()
        }
        Ok(Err(e)) => e.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn results_file(State(state): State<AppState>) -> Response {
    let path = state.engine.sink().path().to_path_buf();
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"results.txt\"",
                ),
            ],
            content,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no results file yet" })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::testutil::write_bundle;
    use crate::sink::ResultSink;
    use crate::types::record::sample_normal_record;
    use axum::body::Body;
    use axum::http::Request;
    use std::fs;
    use tower::ServiceExt;

    fn test_state(dir: &Path) -> AppState {
        write_bundle(dir);
        state_with_model_dir(dir, dir)
    }

    fn state_with_model_dir(dir: &Path, model_dir: &Path) -> AppState {
        let engine = DetectionEngine::with_paths(
            crate::artifacts::ArtifactPaths::new(model_dir),
            ResultSink::new(dir.join("results.txt")),
        );

        let mut config = AppConfig::default();
        config.server.data_dir = dir.join("data").to_string_lossy().into_owned();
        fs::create_dir_all(&config.server.data_dir).unwrap();

        AppState {
            engine: Arc::new(engine),
            metrics: Arc::new(PipelineMetrics::new()),
            config: Arc::new(config),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, payload: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(payload).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_predict_classifies_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let record = serde_json::to_value(sample_normal_record()).unwrap();
        let response = app.oneshot(post_json("/predict", &record)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["prediction"], "normal");
        assert_eq!(json["is_attack"], false);
        assert!(json["confidence"].as_f64().unwrap() > 0.5);
    }

    #[tokio::test]
    async fn test_predict_rejects_an_incomplete_record() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let mut record = sample_normal_record();
        record.remove("duration");
        let payload = serde_json::to_value(record).unwrap();

        let response = app.oneshot(post_json("/predict", &payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("duration"));
    }

    #[tokio::test]
    async fn test_predict_without_artifacts_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_model_here");
        let app = create_router(state_with_model_dir(dir.path(), &missing));

        let record = serde_json::to_value(sample_normal_record()).unwrap();
        let response = app.oneshot(post_json("/predict", &record)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_model_info_reports_readiness() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_model_here");
        let app = create_router(state_with_model_dir(dir.path(), &missing));

        let json = body_json(app.oneshot(get_request("/model-info")).await.unwrap()).await;
        assert_eq!(json["model_loaded"], false);
        assert_eq!(json["status"], "not_ready");

        let dir2 = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir2.path()));
        let json = body_json(app.oneshot(get_request("/model-info")).await.unwrap()).await;
        assert_eq!(json["model_loaded"], true);
        assert_eq!(json["scaler_loaded"], true);
        assert_eq!(json["encoders_loaded"], true);
        assert_eq!(json["status"], "ready");
    }

    #[tokio::test]
    async fn test_available_files_lists_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        fs::write(
            Path::new(&state.config.server.data_dir).join("batch_a.csv"),
            "1,2\n",
        )
        .unwrap();
        fs::write(
            Path::new(&state.config.server.data_dir).join("batch_b.csv"),
            "3,4\n",
        )
        .unwrap();

        let app = create_router(state);
        let json = body_json(app.oneshot(get_request("/available-files")).await.unwrap()).await;

        let files: Vec<&str> = json["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(files, vec!["batch_a.csv", "batch_b.csv"]);
    }

    #[tokio::test]
    async fn test_process_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        // Two benign rows in the 41-column layout.
        let mut row = vec!["0".to_string(); 41];
        row[11] = "1".to_string(); // logged_in
        row[22] = "9".to_string(); // count
        row[28] = "1".to_string(); // same_srv_rate
        let line = row.join(",");
        fs::write(
            Path::new(&state.config.server.data_dir).join("batch.csv"),
            format!("{line}\n{line}\n"),
        )
        .unwrap();

        let app = create_router(state);
        let response = app
            .oneshot(post_json("/process-file", &json!({"fileName": "batch.csv"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["num_samples"], 2);
        assert_eq!(json["num_anomalies"], 0);
        assert_eq!(json["prediction"], "normal");
    }

    #[tokio::test]
    async fn test_process_file_unknown_name_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app
            .oneshot(post_json(
                "/process-file",
                &json!({"fileName": "nope.csv"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_process_file_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app
            .oneshot(post_json(
                "/process-file",
                &json!({"fileName": "../secrets.txt"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_results_file_after_a_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let record = serde_json::to_value(sample_normal_record()).unwrap();

        let app = create_router(state.clone());
        app.oneshot(post_json("/predict", &record)).await.unwrap();

        let app = create_router(state);
        let response = app.oneshot(get_request("/results-file")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"results.txt\""
        );

        let json = body_json(response).await;
        assert_eq!(json["prediction"], "normal");
    }

    #[tokio::test]
    async fn test_results_file_missing_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app.oneshot(get_request("/results-file")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
