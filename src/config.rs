use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::{ExerciseClassifier, DEFAULT_ANGLE_CHANGE_THRESHOLD};
use crate::exercise::{ExerciseDefinition, ExerciseError, ExerciseKind};
use crate::inference::InputLayout;
use crate::quality::CheatThresholds;
use crate::workout::WorkoutSession;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera_id: i32,
    pub model_path: String,
    pub model_input_size: u32,
    pub model_layout: InputLayout,
    /// Pose-presence probability below which a frame counts as empty.
    pub min_detection_confidence: f32,
    /// Joint visibility below which the active tracker is not updated.
    pub min_visibility: f32,
    pub window_title: String,
    pub angle_change_threshold: f32,
    pub exercises: ExerciseThresholds,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_id: 0,
            model_path: "models/pose_landmark_full.onnx".to_string(),
            model_input_size: 256,
            model_layout: InputLayout::Nhwc,
            min_detection_confidence: 0.5,
            min_visibility: 0.5,
            window_title: "Personal Trainer".to_string(),
            angle_change_threshold: DEFAULT_ANGLE_CHANGE_THRESHOLD,
            exercises: ExerciseThresholds::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Checks every exercise band and the classifier threshold.
    pub fn validate(&self) -> Result<(), ExerciseError> {
        self.workout_session().map(drop)
    }

    /// Exercise definitions in classifier order, thresholds validated.
    pub fn exercise_definitions(&self) -> Result<[ExerciseDefinition; 3], ExerciseError> {
        let t = &self.exercises;
        Ok([
            t.bicep_curl.definition(ExerciseKind::BicepCurl)?,
            t.squat.definition(ExerciseKind::Squat)?,
            t.push_up.definition(ExerciseKind::PushUp)?,
        ])
    }

    pub fn workout_session(&self) -> Result<WorkoutSession, ExerciseError> {
        Ok(WorkoutSession::new(
            self.exercise_definitions()?,
            ExerciseClassifier::new(self.angle_change_threshold)?,
            self.min_visibility,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub up: f32,
    pub down: f32,
}

impl Thresholds {
    fn definition(&self, kind: ExerciseKind) -> Result<ExerciseDefinition, ExerciseError> {
        ExerciseDefinition::with_thresholds(kind, self.up, self.down)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseThresholds {
    pub bicep_curl: Thresholds,
    pub squat: Thresholds,
    pub push_up: Thresholds,
}

impl Default for ExerciseThresholds {
    fn default() -> Self {
        let of = |def: ExerciseDefinition| Thresholds {
            up: def.up_threshold(),
            down: def.down_threshold(),
        };
        Self {
            bicep_curl: of(ExerciseDefinition::bicep_curl()),
            squat: of(ExerciseDefinition::squat()),
            push_up: of(ExerciseDefinition::push_up()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub cheat: CheatThresholds,
    pub feedback: FeedbackConfig,
    pub tts: TtsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            max_upload_bytes: 64 * 1024 * 1024,
            cheat: CheatThresholds::default(),
            feedback: FeedbackConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub endpoint: String,
    pub model: String,
    pub system_prompt: String,
    pub timeout_secs: u64,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "openai/gpt-3.5-turbo".to_string(),
            system_prompt: "You are a sports assessment assistant.".to_string(),
            timeout_secs: 30,
            api_key_env: "OPENROUTER_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub endpoint: String,
    pub language_code: String,
    pub ssml_gender: String,
    pub audio_encoding: String,
    pub api_key_env: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
            language_code: "en-US".to_string(),
            ssml_gender: "NEUTRAL".to_string(),
            audio_encoding: "MP3".to_string(),
            api_key_env: "GOOGLE_TTS_API_KEY".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            camera_id = 2
            angle_change_threshold = 12.5

            [exercises.squat]
            up = 150.0
            down = 80.0

            [server.cheat]
            min_sharpness = 25.0
            "#,
        )
        .unwrap();

        assert_eq!(config.camera_id, 2);
        assert_eq!(config.model_input_size, 256);
        assert_eq!(config.exercises.squat, Thresholds { up: 150.0, down: 80.0 });
        assert_eq!(config.exercises.bicep_curl, Thresholds { up: 160.0, down: 30.0 });
        assert_eq!(config.server.cheat.min_sharpness, 25.0);
        assert_eq!(config.server.cheat.min_bbox_area, 0.02);
        assert_eq!(config.server.feedback.timeout_secs, 30);

        let defs = config.exercise_definitions().unwrap();
        assert_eq!(defs[1].down_threshold(), 80.0);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = Config::default();
        config.exercises.push_up = Thresholds { up: 90.0, down: 160.0 };
        assert!(config.exercise_definitions().is_err());
        assert!(config.workout_session().is_err());
    }

    #[test]
    fn test_bad_change_threshold_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "angle_change_threshold = -1.0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExerciseError>(),
            Some(&ExerciseError::InvalidChangeThreshold { threshold: -1.0 })
        );

        let mut config = Config::default();
        config.angle_change_threshold = f32::NAN;
        assert!(config.validate().is_err());
        assert!(config.workout_session().is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.model_layout = InputLayout::Nchw;
        config.server.bind_addr = "127.0.0.1:9000".to_string();
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
