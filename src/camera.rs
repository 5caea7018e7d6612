use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
    Camera,
};
use tracing::{info, warn};

use crate::config::CameraConfig;
use crate::{Error, Result};

/// Produces consecutive frames. A failed capture is transient; the caller
/// skips the tick and tries again.
pub trait FrameSource {
    fn capture(&mut self) -> Result<RgbImage>;
}

pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn new(config: &CameraConfig) -> Result<Self> {
        let cam_index = CameraIndex::Index(config.index);
        let format = CameraFormat::new_from(config.width, config.height, FrameFormat::MJPEG, config.fps);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));
        let mut camera = Camera::new(cam_index, requested)
            .map_err(|e| Error::Camera(format!("Failed to create camera instance: {}", e)))?;

        camera
            .open_stream()
            .map_err(|e| Error::Camera(format!("Failed to open camera stream: {}", e)))?;

        info!("Camera format: {}", camera.camera_format());

        Ok(Self { camera })
    }

    pub fn width(&self) -> u32 {
        self.camera.resolution().width()
    }

    pub fn height(&self) -> u32 {
        self.camera.resolution().height()
    }

    pub fn name(&self) -> String {
        self.camera.info().human_name()
    }
}

impl FrameSource for CameraSource {
    fn capture(&mut self) -> Result<RgbImage> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| Error::Camera(format!("Failed to get frame: {}", e)))?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::Camera(format!("Failed to decode frame: {}", e)))?;
        Ok(decoded)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        match self.camera.stop_stream() {
            Ok(()) => info!("Camera released"),
            Err(e) => warn!("Error releasing camera: {}", e),
        }
    }
}
