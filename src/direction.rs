//! Displacement-based direction from the pinch anchor.

use crate::config::DirectionConfig;
use crate::types::Keypoint;

/// Direction since the pinch began. Components are bounded by
/// `max_component` and the slope by `max_slope`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DirectionState {
    pub x: f32,
    pub y: f32,
    pub slope: f32,
}

#[derive(Debug, Clone)]
pub struct DirectionEstimator {
    config: DirectionConfig,
    state: DirectionState,
}

impl DirectionEstimator {
    pub fn new(config: &DirectionConfig) -> Self {
        Self {
            config: config.clone(),
            state: DirectionState::default(),
        }
    }

    /// Recompute from the anchor (not the previous frame) to `current`.
    pub fn estimate(&mut self, anchor: Keypoint, current: Keypoint) -> DirectionState {
        let dx = current.x - anchor.x;
        let dy = current.y - anchor.y;

        let slope = if dx.abs() > self.config.dead_zone_px {
            (dy / dx).clamp(-self.config.max_slope, self.config.max_slope)
        } else if dy > 0.0 {
            // Near vertical
            self.config.max_slope
        } else {
            -self.config.max_slope
        };

        self.state = DirectionState {
            x: self.axis(dx),
            y: self.axis(dy),
            slope,
        };
        self.state
    }

    fn axis(&self, delta: f32) -> f32 {
        if delta.abs() <= self.config.dead_zone_px {
            return 0.0;
        }
        (delta / self.config.scale_px).clamp(-self.config.max_component, self.config.max_component)
    }

    pub fn state(&self) -> DirectionState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = DirectionState::default();
    }
}
