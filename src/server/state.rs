use std::sync::Arc;

use crate::config::{Config, ServerConfig};
use crate::exercise::ExerciseError;
use crate::inference::PoseDetector;
use crate::video::VideoDecoder;
use crate::workout::WorkoutSession;

/// Shared state handed to every handler.
///
/// The detector is constructed by the caller and injected here; it is the
/// only object shared across concurrent requests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    detector: Arc<dyn PoseDetector>,
    video_decoder: Option<Arc<dyn VideoDecoder>>,
    http: reqwest::Client,
    config: Config,
    feedback_api_key: Option<String>,
    tts_api_key: Option<String>,
}

impl AppState {
    pub fn builder(detector: Arc<dyn PoseDetector>, config: Config) -> AppStateBuilder {
        AppStateBuilder {
            feedback_api_key: std::env::var(&config.server.feedback.api_key_env).ok(),
            tts_api_key: std::env::var(&config.server.tts.api_key_env).ok(),
            detector,
            video_decoder: None,
            config,
        }
    }

    pub fn detector(&self) -> Arc<dyn PoseDetector> {
        Arc::clone(&self.inner.detector)
    }

    pub fn video_decoder(&self) -> Option<Arc<dyn VideoDecoder>> {
        self.inner.video_decoder.clone()
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.inner.config.server
    }

    pub fn feedback_api_key(&self) -> Option<&str> {
        self.inner.feedback_api_key.as_deref()
    }

    pub fn tts_api_key(&self) -> Option<&str> {
        self.inner.tts_api_key.as_deref()
    }

    /// Fresh session for one uploaded video.
    pub fn workout_session(&self) -> Result<WorkoutSession, ExerciseError> {
        self.inner.config.workout_session()
    }
}

pub struct AppStateBuilder {
    detector: Arc<dyn PoseDetector>,
    video_decoder: Option<Arc<dyn VideoDecoder>>,
    config: Config,
    feedback_api_key: Option<String>,
    tts_api_key: Option<String>,
}

impl AppStateBuilder {
    pub fn video_decoder(mut self, decoder: Arc<dyn VideoDecoder>) -> Self {
        self.video_decoder = Some(decoder);
        self
    }

    /// Overrides the key read from the environment.
    pub fn feedback_api_key(mut self, key: Option<String>) -> Self {
        self.feedback_api_key = key;
        self
    }

    pub fn tts_api_key(mut self, key: Option<String>) -> Self {
        self.tts_api_key = key;
        self
    }

    pub fn build(self) -> Result<AppState, ExerciseError> {
        self.config.validate()?;
        Ok(AppState {
            inner: Arc::new(AppStateInner {
                detector: self.detector,
                video_decoder: self.video_decoder,
                http: reqwest::Client::new(),
                config: self.config,
                feedback_api_key: self.feedback_api_key,
                tts_api_key: self.tts_api_key,
            }),
        })
    }
}
