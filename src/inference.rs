use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::VisionResult;
use crate::pose::Pose;

/// Single-person pose landmark detector.
///
/// Implementations are shared between concurrent HTTP requests, so `detect`
/// takes `&self` and must serialize any internal mutable state itself.
pub trait PoseDetector: Send + Sync {
    /// Returns `Ok(None)` when nobody is in the frame.
    fn detect(&self, image: &RgbImage) -> VisionResult<Option<Pose>>;
}

/// Tensor layout the landmark model expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    #[default]
    Nhwc,
    Nchw,
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxPoseDetector;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;

    use image::imageops::{self, FilterType};
    use image::RgbImage;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tracing::{debug, info};

    use super::{InputLayout, PoseDetector};
    use crate::error::{VisionError, VisionResult};
    use crate::pose::{Landmark, Pose, LANDMARK_COUNT};

    /// Per-landmark values in the flat BlazePose output: x, y, z, visibility, presence.
    const FLAT_STRIDE: usize = 5;

    /// BlazePose-style landmark model run through ONNX Runtime.
    ///
    /// The first output holds per-landmark `x, y, z, visibility[, presence]`
    /// in model-input pixels; an optional second single-value output is the
    /// pose presence probability.
    pub struct OnnxPoseDetector {
        // ort sessions need exclusive access to run
        session: Mutex<Session>,
        input_name: String,
        input_width: u32,
        input_height: u32,
        layout: InputLayout,
        min_detection_confidence: f32,
    }

    impl OnnxPoseDetector {
        pub fn new(
            model_path: &Path,
            input_size: u32,
            layout: InputLayout,
            min_detection_confidence: f32,
        ) -> VisionResult<Self> {
            info!(path = ?model_path, input_size, ?layout, "loading pose model");

            let session = Session::builder()
                .map_err(VisionError::model_load)?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(VisionError::model_load)?
                .commit_from_file(model_path)
                .map_err(VisionError::model_load)?;

            let input_name = session
                .inputs()
                .first()
                .map(|input| input.name().to_string())
                .ok_or_else(|| VisionError::model_load("No input names found"))?;

            Ok(Self {
                session: Mutex::new(session),
                input_name,
                input_width: input_size,
                input_height: input_size,
                layout,
                min_detection_confidence,
            })
        }

        fn preprocess(&self, frame: &RgbImage) -> VisionResult<Tensor<f32>> {
            let resized = imageops::resize(frame, self.input_width, self.input_height, FilterType::Triangle);

            let h = self.input_height as usize;
            let w = self.input_width as usize;
            let mut data = vec![0.0f32; 3 * h * w];

            for (x, y, pixel) in resized.enumerate_pixels() {
                let idx = y as usize * w + x as usize;
                for c in 0..3 {
                    let value = pixel[c] as f32 / 255.0;
                    match self.layout {
                        InputLayout::Nhwc => data[idx * 3 + c] = value,
                        InputLayout::Nchw => data[c * h * w + idx] = value,
                    }
                }
            }

            let shape: Vec<i64> = match self.layout {
                InputLayout::Nhwc => vec![1, h as i64, w as i64, 3],
                InputLayout::Nchw => vec![1, 3, h as i64, w as i64],
            };
            Tensor::from_array((shape, data)).map_err(VisionError::inference)
        }
    }

    impl PoseDetector for OnnxPoseDetector {
        fn detect(&self, frame: &RgbImage) -> VisionResult<Option<Pose>> {
            let input_tensor = self.preprocess(frame)?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input_tensor])
                .map_err(VisionError::inference)?;

            let mut tensors = outputs.iter().map(|(_, value)| value);
            let landmarks = tensors
                .next()
                .ok_or_else(|| VisionError::Output("No output found".to_string()))?;

            if let Some(score) = tensors.next() {
                let (_, score) = score.try_extract_tensor::<f32>().map_err(VisionError::inference)?;
                if let [presence] = score {
                    if *presence < self.min_detection_confidence {
                        debug!(presence = *presence, "pose presence below threshold");
                        return Ok(None);
                    }
                }
            }

            let (shape, values) = landmarks.try_extract_tensor::<f32>().map_err(VisionError::inference)?;
            let shape: Vec<i64> = shape.iter().copied().collect();
            decode_landmarks(&shape, values, self.input_width, self.input_height).map(Some)
        }
    }

    /// Per-landmark rows in model-input pixels to a normalized pose.
    fn decode_landmarks(shape: &[i64], values: &[f32], input_width: u32, input_height: u32) -> VisionResult<Pose> {
        let (count, stride) = match shape {
            [_, n, s] => (*n as usize, *s as usize),
            [_, flat] => (*flat as usize / FLAT_STRIDE, FLAT_STRIDE),
            other => {
                return Err(VisionError::Output(format!("unsupported landmark shape {other:?}")));
            }
        };
        if count < LANDMARK_COUNT || stride < 2 || values.len() < count * stride {
            return Err(VisionError::Output(format!(
                "expected {LANDMARK_COUNT} landmarks, got shape {shape:?}"
            )));
        }

        let w = input_width as f32;
        let h = input_height as f32;
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (i, lm) in landmarks.iter_mut().enumerate() {
            let v = &values[i * stride..(i + 1) * stride];
            *lm = Landmark {
                x: v[0] / w,
                y: v[1] / h,
                z: if stride > 2 { v[2] / w } else { 0.0 },
                visibility: if stride > 3 { sigmoid(v[3]) } else { 1.0 },
            };
        }

        Ok(Pose::new(landmarks))
    }

    fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-x).exp())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_decode_batched_rows() {
            let mut values = [128.0, 64.0, 32.0, 0.0, 0.0].repeat(39);
            values[0] = 256.0;
            let pose = decode_landmarks(&[1, 39, 5], &values, 256, 256).unwrap();
            let nose = pose.landmarks()[0];
            assert_eq!(nose.x, 1.0);
            assert_eq!(nose.y, 0.25);
            assert_eq!(nose.z, 0.125);
            assert!((nose.visibility - 0.5).abs() < 1e-6);
        }

        #[test]
        fn test_decode_flat_output() {
            let values = vec![25.6; 195];
            let pose = decode_landmarks(&[1, 195], &values, 256, 256).unwrap();
            assert!((pose.landmarks()[32].x - 0.1).abs() < 1e-6);
        }

        #[test]
        fn test_decode_rejects_short_output() {
            assert!(decode_landmarks(&[1, 17, 3], &[0.0; 51], 256, 256).is_err());
            assert!(decode_landmarks(&[4], &[0.0; 4], 256, 256).is_err());
        }
    }
}
