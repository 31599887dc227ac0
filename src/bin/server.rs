//! HTTP front end.
//!
//! | Route            | Body                      | Response                          |
//! |------------------|---------------------------|-----------------------------------|
//! | `GET /health`    |                           | `{"status":"ok", ...}`            |
//! | `POST /segments` | `{"text"}`                | `{"segments","clips","unmatched"}` |
//! | `POST /tts`      | `{"text","speed"?,"voice"?}` | `audio/wav`                    |
//!
//! Usage:
//!   cargo run --features server --bin dangme-server -- --config dangme.json --port 8080

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use dangme_tts::{EngineConfig, Error, Speaker, SpeechPlan, Voice};
use serde::Deserialize;
use serde_json::json;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dangme-server", about = "Dãngme segment TTS over HTTP")]
struct Args {
    /// Engine config file (JSON). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<Error>() {
            Some(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            Some(Error::MissingSegment { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{:#}", self.0);
        }
        (status, Json(json!({ "error": format!("{:#}", self.0) }))).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SegmentsRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct TtsRequest {
    text: String,
    speed: Option<f32>,
    voice: Option<Voice>,
}

fn plan_text(speaker: &Speaker, text: &str) -> std::result::Result<SpeechPlan, Error> {
    if text.trim().is_empty() {
        return Err(Error::InvalidArgument("text is empty".into()));
    }
    speaker.plan(text)
}

async fn health(State(speaker): State<Arc<Speaker>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "segments": speaker.catalog().len(),
        "exceptions": speaker.exceptions().len(),
    }))
}

async fn segments(
    State(speaker): State<Arc<Speaker>>,
    Json(req): Json<SegmentsRequest>,
) -> std::result::Result<Json<SpeechPlan>, ApiError> {
    Ok(Json(plan_text(&speaker, &req.text)?))
}

async fn tts(
    State(speaker): State<Arc<Speaker>>,
    Json(req): Json<TtsRequest>,
) -> std::result::Result<Response, ApiError> {
    let wav = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let plan = plan_text(&speaker, &req.text)?;
        speaker.render_voice(&plan, req.speed, req.voice)?.to_wav_bytes()
    })
    .await
    .context("render task panicked")??;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav).into_response())
}

fn router(speaker: Arc<Speaker>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/segments", post(segments))
        .route("/tts", post(tts))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(speaker)
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("cannot listen for ctrl-c: {e}");
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("Cannot load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let speaker = Arc::new(Speaker::from_config(&config).context("Failed to build speaker")?);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    let listener = TcpListener::bind(addr).await.with_context(|| format!("Cannot bind {addr}"))?;
    info!(%addr, audio_dir = %config.audio_dir.display(), "listening");

    axum::serve(listener, router(speaker))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(Speaker::from_config(&EngineConfig::default()).unwrap()))
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn post_json(uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let resp = app().oneshot(json_request(uri, body)).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// A router whose audio directory holds a single 8 kHz clip, `5.wav`.
    fn app_with_clip(dir: &std::path::Path) -> Router {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut w = hound::WavWriter::create(dir.join("5.wav"), spec).unwrap();
        for i in 0..1_000i32 {
            w.write_sample(((i % 20 - 10) * 1_000) as i16).unwrap();
        }
        w.finalize().unwrap();

        let config = EngineConfig { audio_dir: dir.into(), ..EngineConfig::default() };
        router(Arc::new(Speaker::from_config(&config).unwrap()))
    }

    #[tokio::test]
    async fn test_tts_returns_wav() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app_with_clip(dir.path())
            .oneshot(json_request("/tts", r#"{"text": "5"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "audio/wav");

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.spec().channels, 1);
        // 6 % off the head and 25 % off the tail
        assert_eq!(reader.len(), 1_000 - 60 - 250);
    }

    #[tokio::test]
    async fn test_tts_female_voice_is_shorter() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_clip(dir.path());
        let resp = app
            .oneshot(json_request("/tts", r#"{"text": "5", "voice": "female", "speed": 2.0}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert!(reader.len() < 690);
    }

    #[tokio::test]
    async fn test_tts_missing_clip_file_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app_with_clip(dir.path())
            .oneshot(json_request("/tts", r#"{"text": "6"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_segments_for_mixed_text() {
        let (status, body) = post_json("/segments", r#"{"text": "ba14"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["segments"], json!(["ba", "10", "KƐ", "4"]));
        assert_eq!(body["clips"][0], "BA.wav");
        assert_eq!(body["unmatched"], json!([]));
    }

    #[tokio::test]
    async fn test_empty_text_is_bad_request() {
        let (status, body) = post_json("/segments", r#"{"text": "  "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_huge_number_is_bad_request() {
        let (status, _) = post_json("/segments", r#"{"text": "99999999999999999999999"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tts_bad_speed_is_bad_request() {
        let (status, _) = post_json("/tts", r#"{"text": "5", "speed": 10.0}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::get("/health").body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
