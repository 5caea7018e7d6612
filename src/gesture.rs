//! Discrete hand poses other than the pinch.
//!
//! Only the mode-cycle pose is recognized today: thumb and pinky tips both
//! extended away from the wrist. A recognized pose opens a dwell window during
//! which the same pose is ignored, so holding it cycles the mode once.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::GestureConfig;
use crate::types::{HandSnapshot, LandmarkName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    /// Advance to the next interaction mode.
    ModeCycle,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModeCycle => "mode-cycle",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GestureClassifier {
    extension_px: f32,
    dwell: Duration,
    last_recognized: Option<Instant>,
}

impl GestureClassifier {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            extension_px: config.extension_px,
            dwell: Duration::from_millis(config.dwell_ms),
            last_recognized: None,
        }
    }

    /// Recognize a gesture in this frame, honoring the dwell window.
    pub fn classify(&mut self, hand: &HandSnapshot, now: Instant) -> Option<Gesture> {
        if !self.is_mode_cycle_pose(hand) {
            return None;
        }
        if self.in_dwell(now) {
            debug!("Mode-cycle pose ignored during dwell");
            return None;
        }
        self.last_recognized = Some(now);
        Some(Gesture::ModeCycle)
    }

    /// Whether thumb and pinky tips are both extended. Missing points never match.
    pub fn is_mode_cycle_pose(&self, hand: &HandSnapshot) -> bool {
        let (Some(wrist), Some(thumb), Some(pinky)) = (
            hand.get(LandmarkName::Wrist),
            hand.get(LandmarkName::ThumbTip),
            hand.get(LandmarkName::PinkyTip),
        ) else {
            return false;
        };
        thumb.distance(&wrist) > self.extension_px && pinky.distance(&wrist) > self.extension_px
    }

    pub fn in_dwell(&self, now: Instant) -> bool {
        self.last_recognized
            .map(|at| now.saturating_duration_since(at) < self.dwell)
            .unwrap_or(false)
    }
}
