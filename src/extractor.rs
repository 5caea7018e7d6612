use image::{imageops::FilterType, RgbImage};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, info};

use crate::config::TrackingConfig;
use crate::types::{HandSnapshot, Keypoint, LandmarkName};
use crate::{Error, Result};

/// Locates hand keypoints in a frame.
pub trait LandmarkExtractor {
    fn name(&self) -> String;
    /// Hands found in `frame`, most confident first. Empty when none.
    fn extract(&mut self, frame: &RgbImage) -> Result<Vec<HandSnapshot>>;
}

/// Square input edge expected by the hand landmark model.
pub const INPUT_SIZE: u32 = 224;
pub const LANDMARK_COUNT: usize = 21;
/// Landmarks and hand presence.
pub const REQUIRED_OUTPUTS: usize = 2;

fn model_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Model(e.to_string())
}

/// MediaPipe 21-point hand landmark model run through ONNX Runtime.
///
/// The whole frame is fed to the model, so the hand should fill a good part
/// of the view. Keypoints are returned in reference units: the frame width is
/// mapped to `reference_width` so pixel thresholds do not depend on the
/// camera resolution.
pub struct OnnxHandLandmarker {
    session: Session,
    min_presence: f32,
    reference_width: f32,
}

impl OnnxHandLandmarker {
    pub fn new(config: &TrackingConfig) -> Result<Self> {
        if !Path::new(&config.model_path).exists() {
            return Err(Error::Model(format!(
                "hand landmark model not found at {}",
                config.model_path
            )));
        }

        info!("Loading hand landmark model from {}...", config.model_path);
        let session = Session::builder()
            .map_err(model_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_err)?
            .with_intra_threads(4)
            .map_err(model_err)?
            .commit_from_file(&config.model_path)
            .map_err(model_err)?;

        Ok(Self {
            session,
            min_presence: config.min_presence,
            reference_width: config.reference_width,
        })
    }
}

/// Map raw model output (x, y, z triples in input pixels) to a snapshot in
/// reference units for a frame of `frame_w` x `frame_h`.
pub fn decode_landmarks(
    raw: &[f32],
    frame_w: u32,
    frame_h: u32,
    reference_width: f32,
) -> Option<HandSnapshot> {
    if raw.len() < LANDMARK_COUNT * 3 || frame_w == 0 {
        return None;
    }

    let to_reference = reference_width / frame_w as f32;
    let sx = frame_w as f32 / INPUT_SIZE as f32 * to_reference;
    let sy = frame_h as f32 / INPUT_SIZE as f32 * to_reference;

    let max_x = reference_width;
    let max_y = frame_h as f32 * to_reference;

    let mut hand = HandSnapshot::new();
    for name in LandmarkName::ALL {
        let i = name.model_index();
        let x = raw[i * 3] * sx;
        let y = raw[i * 3 + 1] * sy;
        // Points the model placed outside the frame are dropped
        if x.is_finite() && y.is_finite() && (0.0..=max_x).contains(&x) && (0.0..=max_y).contains(&y) {
            hand.insert(name, Keypoint::new(x, y));
        }
    }
    Some(hand)
}

/// Fail with a model error instead of indexing past the session outputs.
pub fn check_output_count(count: usize) -> Result<()> {
    if count < REQUIRED_OUTPUTS {
        return Err(Error::Model(format!(
            "expected landmark and presence outputs, model has {}",
            count
        )));
    }
    Ok(())
}

impl LandmarkExtractor for OnnxHandLandmarker {
    fn name(&self) -> String {
        "Hand Landmarks (21 pts)".to_string()
    }

    fn extract(&mut self, frame: &RgbImage) -> Result<Vec<HandSnapshot>> {
        let resized = image::imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        // NHWC, normalized to [0, 1]
        let mut input_data = Vec::with_capacity((INPUT_SIZE * INPUT_SIZE * 3) as usize);
        for pixel in resized.pixels() {
            input_data.push(pixel[0] as f32 / 255.0);
            input_data.push(pixel[1] as f32 / 255.0);
            input_data.push(pixel[2] as f32 / 255.0);
        }

        let shape = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];
        let input = Tensor::from_array((shape, input_data)).map_err(model_err)?;
        let outputs = self.session.run(ort::inputs![input]).map_err(model_err)?;
        check_output_count(outputs.len())?;

        let (_shape, landmarks) = outputs[0].try_extract_tensor::<f32>().map_err(model_err)?;
        let (_shape, presence) = outputs[1].try_extract_tensor::<f32>().map_err(model_err)?;

        let score = presence.first().copied().unwrap_or(0.0);
        if score < self.min_presence {
            debug!("No hand (presence {:.2})", score);
            return Ok(Vec::new());
        }

        Ok(decode_landmarks(landmarks, frame.width(), frame.height(), self.reference_width)
            .into_iter()
            .collect())
    }
}

/// Replays a fixed sequence of per-frame results, then reports no hands.
#[derive(Debug, Default)]
pub struct ScriptedExtractor {
    frames: VecDeque<Result<Option<HandSnapshot>>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_hand(&mut self, hand: HandSnapshot) -> &mut Self {
        self.frames.push_back(Ok(Some(hand)));
        self
    }

    pub fn push_empty(&mut self) -> &mut Self {
        self.frames.push_back(Ok(None));
        self
    }

    pub fn push_error(&mut self, message: &str) -> &mut Self {
        self.frames.push_back(Err(Error::Model(message.to_string())));
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkExtractor for ScriptedExtractor {
    fn name(&self) -> String {
        "Scripted".to_string()
    }

    fn extract(&mut self, _frame: &RgbImage) -> Result<Vec<HandSnapshot>> {
        match self.frames.pop_front() {
            Some(Ok(hand)) => Ok(hand.into_iter().collect()),
            Some(Err(e)) => Err(e),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with(points: &[(usize, f32, f32)]) -> Vec<f32> {
        let mut raw = vec![0.0; LANDMARK_COUNT * 3];
        for &(i, x, y) in points {
            raw[i * 3] = x;
            raw[i * 3 + 1] = y;
        }
        raw
    }

    #[test]
    fn test_reference_scaling_is_resolution_independent() {
        let raw = raw_with(&[(4, 112.0, 112.0), (8, 224.0, 0.0)]);
        let small = decode_landmarks(&raw, 640, 480, 640.0).unwrap();
        let large = decode_landmarks(&raw, 1280, 960, 640.0).unwrap();
        let close = |a: Keypoint, b: Keypoint| a.distance(&b) < 1e-3;

        let thumb = small.get(LandmarkName::ThumbTip).unwrap();
        assert!(close(thumb, large.get(LandmarkName::ThumbTip).unwrap()));
        assert!(close(thumb, Keypoint::new(320.0, 240.0)));
        assert!(close(small.get(LandmarkName::IndexTip).unwrap(), Keypoint::new(640.0, 0.0)));
    }

    #[test]
    fn test_points_outside_frame_dropped() {
        let raw = raw_with(&[(20, -5.0, 10.0), (4, 300.0, 10.0), (8, 10.0, 230.0), (12, 200.0, 200.0)]);
        let hand = decode_landmarks(&raw, 640, 480, 640.0).unwrap();
        assert!(hand.get(LandmarkName::PinkyTip).is_none());
        // Past the right edge: 300 * 640 / 224 > 640
        assert!(hand.get(LandmarkName::ThumbTip).is_none());
        // Past the bottom edge: 230 * 480 / 224 > 480
        assert!(hand.get(LandmarkName::IndexTip).is_none());
        assert!(hand.get(LandmarkName::MiddleTip).is_some());
        assert!(hand.get(LandmarkName::Wrist).is_some());
    }

    #[test]
    fn test_output_count_checked() {
        assert!(matches!(check_output_count(1), Err(Error::Model(_))));
        assert!(matches!(check_output_count(0), Err(Error::Model(_))));
        assert!(check_output_count(2).is_ok());
        assert!(check_output_count(3).is_ok());
    }

    #[test]
    fn test_short_output_rejected() {
        assert!(decode_landmarks(&[0.0; 10], 640, 480, 640.0).is_none());
    }

    #[test]
    fn test_scripted_extractor_replays_then_empties() {
        let frame = RgbImage::new(4, 4);
        let mut ex = ScriptedExtractor::new();
        ex.push_hand(HandSnapshot::new()).push_empty().push_error("boom");

        assert_eq!(ex.extract(&frame).unwrap().len(), 1);
        assert!(ex.extract(&frame).unwrap().is_empty());
        assert!(ex.extract(&frame).is_err());
        assert!(ex.extract(&frame).unwrap().is_empty());
    }
}
