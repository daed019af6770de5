use thiserror::Error;

pub type VisionResult<T> = Result<T, VisionError>;

/// Failures of the pose detector and frame/video sources.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unexpected model output: {0}")]
    Output(String),

    #[error("Invalid image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Video decoding failed: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "camera")]
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl VisionError {
    pub fn model_load(msg: impl ToString) -> Self {
        Self::ModelLoad(msg.to_string())
    }

    pub fn inference(msg: impl ToString) -> Self {
        Self::Inference(msg.to_string())
    }
}
