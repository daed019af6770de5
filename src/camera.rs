use std::io::Write;

use anyhow::Result;
use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::debug;

use crate::error::{VisionError, VisionResult};
use crate::trainer::FrameSource;
use crate::video::VideoDecoder;

pub struct Camera {
    capture: VideoCapture,
}

impl Camera {
    pub fn new(device_id: i32) -> Result<Self> {
        let capture = VideoCapture::new(device_id, videoio::CAP_ANY)?;

        if !capture.is_opened()? {
            anyhow::bail!("Failed to open camera {device_id}");
        }

        Ok(Self { capture })
    }

    /// Next BGR frame; errors on an empty grab so the caller can skip it.
    pub fn read_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        self.capture.read(&mut frame)?;

        if frame.empty() {
            anyhow::bail!("Empty frame");
        }

        Ok(frame)
    }
}

impl FrameSource for Camera {
    type Frame = Mat;

    fn read_frame(&mut self) -> Result<Mat> {
        Camera::read_frame(self)
    }

    fn to_rgb(&self, frame: &Mat) -> VisionResult<RgbImage> {
        to_rgb_image(frame)
    }
}

/// Copies a BGR OpenCV frame into an RGB image buffer.
pub fn to_rgb_image(frame: &Mat) -> VisionResult<RgbImage> {
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(frame, &mut rgb, imgproc::COLOR_BGR2RGB)?;

    let rgb = if rgb.is_continuous() { rgb } else { rgb.try_clone()? };
    let width = rgb.cols() as u32;
    let height = rgb.rows() as u32;
    let bytes = rgb.data_bytes()?.to_vec();

    RgbImage::from_raw(width, height, bytes)
        .ok_or_else(|| VisionError::Decode(format!("frame buffer does not match {width}x{height}")))
}

/// Decodes uploaded videos with OpenCV's video I/O backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvVideoDecoder;

impl VideoDecoder for OpenCvVideoDecoder {
    fn for_each_frame(&self, video: &[u8], on_frame: &mut dyn FnMut(RgbImage)) -> VisionResult<usize> {
        // the capture backends only read from paths
        let mut file = tempfile::Builder::new().suffix(".mp4").tempfile()?;
        file.write_all(video)?;
        file.flush()?;

        let path = file.path().to_string_lossy().into_owned();
        let mut capture = VideoCapture::from_file(&path, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(VisionError::Decode("unsupported or corrupt video".to_string()));
        }

        let mut count = 0;
        let mut frame = Mat::default();
        while capture.read(&mut frame)? {
            if frame.empty() {
                break;
            }
            on_frame(to_rgb_image(&frame)?);
            count += 1;
        }
        debug!(frames = count, "video decoded");
        Ok(count)
    }
}
