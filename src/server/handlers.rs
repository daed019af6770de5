use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::dto::{
    AudioConfig, ChatMessage, ChatRequest, HealthResponse, PredictResponse, SynthesisInput, SynthesizeRequest,
    SynthesizeResponse, TtsRequest, VoiceSelection,
};
use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::quality::{self, CheatVerdict};
use crate::video::{VideoAnalyzer, VideoReport};

const UPLOAD_FIELD: &str = "file";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Landmarks of the person in the uploaded image.
pub async fn predict(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<PredictResponse>> {
    let bytes = read_upload(multipart).await?;
    let detector = state.detector();

    let pose = blocking(move || {
        let image = decode_image(&bytes)?.to_rgb8();
        Ok(detector.detect(&image)?)
    })
    .await?;

    debug!(detected = pose.is_some(), "predict");
    Ok(Json(PredictResponse::from_pose(pose.as_ref())))
}

pub async fn cheat_check(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<CheatVerdict>> {
    let bytes = read_upload(multipart).await?;
    let detector = state.detector();
    let thresholds = state.server_config().cheat;

    let verdict = blocking(move || {
        let image = decode_image(&bytes)?;
        let pose = detector.detect(&image.to_rgb8())?;
        Ok(quality::assess(pose.as_ref(), &image.to_luma8(), &thresholds))
    })
    .await?;

    if verdict.cheat {
        info!(reasons = ?verdict.reasons, "snapshot flagged");
    }
    Ok(Json(verdict))
}

/// Speaks the given text; accepts `{"text": ..}` or `?text=`.
pub async fn synthesize_tts(
    State(state): State<AppState>,
    Query(query): Query<TtsRequest>,
    body: Bytes,
) -> ApiResult<Response> {
    let key = state
        .tts_api_key()
        .ok_or_else(|| ApiError::internal("Google TTS key not configured"))?;

    let from_body = if body.is_empty() {
        TtsRequest::default()
    } else {
        serde_json::from_slice::<TtsRequest>(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?
    };
    let text = from_body
        .text
        .or(query.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing text"))?;

    let tts = &state.server_config().tts;
    let request = SynthesizeRequest {
        input: SynthesisInput { text: &text },
        voice: VoiceSelection {
            language_code: &tts.language_code,
            ssml_gender: &tts.ssml_gender,
        },
        audio_config: AudioConfig {
            audio_encoding: &tts.audio_encoding,
        },
    };

    let response = state
        .http()
        .post(&tts.endpoint)
        .query(&[("key", key)])
        .json(&request)
        .send()
        .await
        .map_err(|e| ApiError::internal(format!("Google TTS request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Upstream {
            service: "Google TTS",
            status: status.as_u16(),
        });
    }

    let payload: SynthesizeResponse = response
        .json()
        .await
        .map_err(|e| ApiError::internal(format!("Malformed Google TTS response: {e}")))?;
    let audio = STANDARD
        .decode(payload.audio_content)
        .map_err(|e| ApiError::internal(format!("Malformed Google TTS audio: {e}")))?;

    info!(chars = text.len(), bytes = audio.len(), "speech synthesized");
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

/// Forwards a test summary to the chat model and returns its raw reply.
pub async fn feedback(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(summary) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let key = state
        .feedback_api_key()
        .ok_or_else(|| ApiError::internal("OpenRouter key not configured"))?;

    let cfg = &state.server_config().feedback;
    let prompt = feedback_prompt(&summary);
    let request = ChatRequest {
        model: &cfg.model,
        messages: [
            ChatMessage {
                role: "system",
                content: &cfg.system_prompt,
            },
            ChatMessage {
                role: "user",
                content: &prompt,
            },
        ],
    };

    let response = state
        .http()
        .post(&cfg.endpoint)
        .bearer_auth(key)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .json(&request)
        .send()
        .await
        .map_err(|e| ApiError::internal(format!("OpenRouter request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Upstream {
            service: "OpenRouter",
            status: status.as_u16(),
        });
    }

    let reply: Value = response
        .json()
        .await
        .map_err(|e| ApiError::internal(format!("Malformed OpenRouter response: {e}")))?;
    Ok(Json(reply))
}

pub(crate) fn feedback_prompt(summary: &Value) -> String {
    format!(
        "Provide a concise feedback report based on the following test summary:\n{summary}\nBe specific and actionable."
    )
}

/// Runs every frame of the uploaded video through detection and a fresh
/// workout session.
pub async fn analyze_video(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<VideoReport>> {
    let decoder = state
        .video_decoder()
        .ok_or_else(|| ApiError::unavailable("Video analysis is not available"))?;
    let bytes = read_upload(multipart).await?;
    let detector = state.detector();
    let session = state
        .workout_session()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let report = blocking(move || {
        let mut analyzer = VideoAnalyzer::new(session);
        let frames = decoder.for_each_frame(&bytes, &mut |frame| {
            let pose = detector.detect(&frame).unwrap_or_else(|e| {
                warn!(error = %e, "detection failed, frame counted as empty");
                None
            });
            analyzer.observe(pose.as_ref());
        })?;

        if frames == 0 {
            return Err(ApiError::bad_request("Video contains no frames"));
        }
        Ok(analyzer.finish())
    })
    .await?;

    info!(score = report.score, reps = report.metrics.reps, "video analyzed");
    Ok(Json(report))
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Bytes> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            return field.bytes().await.map_err(upload_error);
        }
    }
    Err(ApiError::bad_request("Missing file field"))
}

fn upload_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::bad_request(format!("Invalid upload: {err}"))
    }
}

fn decode_image(bytes: &[u8]) -> ApiResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| {
        debug!(error = %e, "upload is not a decodable image");
        ApiError::bad_request("Invalid image")
    })
}

/// Detection and decoding are CPU bound; keep them off the async workers.
async fn blocking<T, F>(task: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::internal(format!("worker task failed: {e}")))?
}
