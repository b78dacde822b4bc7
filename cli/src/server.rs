//! HTTP front end: encode text to WAV and decode WAV uploads.
//!
//! Audio travels as base64 encoded WAV files inside JSON bodies. Modulation
//! and demodulation run on the blocking pool.

use crate::audio::{read_wav, write_wav};
use crate::error::CliError;
use crate::modem::{self, MessageReport, ModemSettings};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fskmodem_core::{Mode, DEFAULT_BLOCK_SIZE, DEFAULT_PREAMBLE, DEFAULT_TAIL};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Largest decode block a client may ask for
const MAX_BLOCK_SIZE: usize = 1 << 16;

const MAX_SAMPLE_RATE: u32 = 192_000;

/// Longest signal the encode endpoint will render, preamble and tail included
const MAX_ENCODE_SECONDS: f64 = 600.0;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<CliError> for ApiError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Io(e) => ApiError::Internal(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        tracing::warn!("request failed ({}): {}", status, message);
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModeInfo {
    pub name: String,
    pub baud: f64,
    pub mark: f64,
    pub space: f64,
    pub rx_delay: f64,
}

impl From<Mode> for ModeInfo {
    fn from(mode: Mode) -> Self {
        let plan = mode.params();
        Self {
            name: mode.name().to_string(),
            baud: plan.baud,
            mark: plan.mark,
            space: plan.space,
            rx_delay: plan.rx_delay,
        }
    }
}

fn default_mode() -> String {
    Mode::Bell103.name().to_string()
}

#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    #[serde(default = "default_mode")]
    pub mode: String,
    pub sample_rate: Option<u32>,
    pub preamble: Option<f64>,
    pub tail: Option<f64>,
    /// One transmission per entry
    pub messages: Vec<String>,
    /// Entries are base64 binary payloads rather than text
    #[serde(default)]
    pub base64: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncodeResponse {
    pub sample_rate: u32,
    pub samples: usize,
    pub duration_seconds: f64,
    pub wav_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    #[serde(default = "default_mode")]
    pub mode: String,
    pub wav_base64: String,
    pub block_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DecodeResponse {
    pub sample_rate: u32,
    pub duration_seconds: f64,
    pub messages: Vec<MessageReport>,
}

async fn list_modes() -> Json<Vec<ModeInfo>> {
    Json(Mode::ALL.into_iter().map(ModeInfo::from).collect())
}

fn encode_blocking(request: EncodeRequest) -> Result<EncodeResponse, ApiError> {
    let mode: Mode = request.mode.parse().map_err(CliError::from)?;
    let settings = ModemSettings {
        mode,
        sample_rate: request.sample_rate.unwrap_or(48000),
        preamble: request.preamble.unwrap_or(DEFAULT_PREAMBLE),
        tail: request.tail.unwrap_or(DEFAULT_TAIL),
        block_size: DEFAULT_BLOCK_SIZE,
    };

    if settings.sample_rate > MAX_SAMPLE_RATE {
        return Err(ApiError::BadRequest(format!(
            "sample rate {} Hz exceeds the {} Hz limit",
            settings.sample_rate, MAX_SAMPLE_RATE
        )));
    }
    let params = settings.params();
    params.validate().map_err(CliError::from)?;

    let payloads = request
        .messages
        .into_iter()
        .map(|message| {
            if request.base64 {
                STANDARD
                    .decode(message.as_bytes())
                    .map_err(|e| ApiError::BadRequest(format!("invalid base64 payload: {}", e)))
            } else {
                Ok(message.into_bytes())
            }
        })
        .collect::<Result<Vec<Vec<u8>>, ApiError>>()?;

    let bits: usize = payloads.iter().map(|payload| payload.len() * 10).sum();
    let seconds =
        payloads.len() as f64 * (params.preamble + params.tail) + bits as f64 / params.baud;
    if seconds > MAX_ENCODE_SECONDS {
        return Err(ApiError::BadRequest(format!(
            "request would produce {:.0} s of audio, the limit is {:.0} s",
            seconds, MAX_ENCODE_SECONDS
        )));
    }

    let samples = modem::encode(&settings, &payloads)?;
    let mut wav = Cursor::new(Vec::new());
    write_wav(&mut wav, &samples, settings.sample_rate)?;

    Ok(EncodeResponse {
        sample_rate: settings.sample_rate,
        samples: samples.len(),
        duration_seconds: samples.len() as f64 / f64::from(settings.sample_rate),
        wav_base64: STANDARD.encode(wav.into_inner()),
    })
}

fn decode_blocking(request: DecodeRequest) -> Result<DecodeResponse, ApiError> {
    let mode: Mode = request.mode.parse().map_err(CliError::from)?;
    let wav = STANDARD
        .decode(request.wav_base64.as_bytes())
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 audio: {}", e)))?;

    let block_size = request.block_size.unwrap_or(DEFAULT_BLOCK_SIZE);
    if block_size > MAX_BLOCK_SIZE {
        return Err(ApiError::BadRequest(format!(
            "block size {} exceeds the limit of {}",
            block_size, MAX_BLOCK_SIZE
        )));
    }

    let recording = read_wav(Cursor::new(wav))?;
    if recording.sample_rate > MAX_SAMPLE_RATE {
        return Err(ApiError::BadRequest(format!(
            "sample rate {} Hz exceeds the {} Hz limit",
            recording.sample_rate, MAX_SAMPLE_RATE
        )));
    }
    let messages = modem::decode(mode, block_size, &recording)?;

    Ok(DecodeResponse {
        sample_rate: recording.sample_rate,
        duration_seconds: recording.samples.len() as f64 / f64::from(recording.sample_rate),
        messages: messages.iter().map(MessageReport::from).collect(),
    })
}

async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::Internal(format!("worker failed: {}", e)))?
}

async fn encode(Json(request): Json<EncodeRequest>) -> Result<Json<EncodeResponse>, ApiError> {
    run_blocking(move || encode_blocking(request)).await.map(Json)
}

async fn decode(Json(request): Json<DecodeRequest>) -> Result<Json<DecodeResponse>, ApiError> {
    run_blocking(move || decode_blocking(request)).await.map(Json)
}

pub fn router() -> Router {
    Router::new()
        .route("/api/modes", get(list_modes))
        .route("/api/encode", post(encode))
        .route("/api/decode", post(decode))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
}
