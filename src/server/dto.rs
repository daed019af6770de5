//! Request and response bodies of the pose service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pose::{Landmark, Pose};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Landmarks keyed `kp_0` .. `kp_32`, or null when nobody was detected.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub keypoints: Option<BTreeMap<String, Landmark>>,
}

impl PredictResponse {
    pub fn from_pose(pose: Option<&Pose>) -> Self {
        let keypoints = pose.map(|pose| {
            pose.landmarks()
                .iter()
                .enumerate()
                .map(|(i, lm)| (format!("kp_{i}"), *lm))
                .collect()
        });
        Self { keypoints }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SynthesizeRequest<'a> {
    pub input: SynthesisInput<'a>,
    pub voice: VoiceSelection<'a>,
    pub audio_config: AudioConfig<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SynthesisInput<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoiceSelection<'a> {
    pub language_code: &'a str,
    pub ssml_gender: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AudioConfig<'a> {
    pub audio_encoding: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SynthesizeResponse {
    pub audio_content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::LANDMARK_COUNT;

    #[test]
    fn test_predict_keys() {
        let pose = Pose::new([Landmark::new(0.1, 0.2, 0.3, 0.9); LANDMARK_COUNT]);
        let json = serde_json::to_value(PredictResponse::from_pose(Some(&pose))).unwrap();
        let keypoints = json["keypoints"].as_object().unwrap();
        assert_eq!(keypoints.len(), LANDMARK_COUNT);
        assert!(keypoints.contains_key("kp_0"));
        assert!(keypoints.contains_key("kp_32"));
        assert!((keypoints["kp_5"]["visibility"].as_f64().unwrap() - 0.9).abs() < 1e-6);

        let empty = serde_json::to_value(PredictResponse::from_pose(None)).unwrap();
        assert!(empty["keypoints"].is_null());
    }

    #[test]
    fn test_synthesize_request_shape() {
        let request = SynthesizeRequest {
            input: SynthesisInput { text: "go" },
            voice: VoiceSelection {
                language_code: "en-US",
                ssml_gender: "NEUTRAL",
            },
            audio_config: AudioConfig { audio_encoding: "MP3" },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"]["text"], "go");
        assert_eq!(json["voice"]["languageCode"], "en-US");
        assert_eq!(json["voice"]["ssmlGender"], "NEUTRAL");
        assert_eq!(json["audioConfig"]["audioEncoding"], "MP3");
    }
}
