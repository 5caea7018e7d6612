//! The per-session gesture context.
//!
//! [`GestureController`] owns every piece of cross-frame state (pinch session,
//! direction, mode, drag flag, click cooldown, gesture dwell) and advances it
//! one frame at a time. Nothing here reads the clock or touches the OS
//! directly; the caller passes the tick instant and the sink.

use std::time::{Duration, Instant};

use crate::actions::ActionSink;
use crate::config::AppConfig;
use crate::direction::{DirectionEstimator, DirectionState};
use crate::engine::{ActionEngine, InteractionMode};
use crate::gesture::{Gesture, GestureClassifier};
use crate::pinch::{PinchDetector, PinchPhase, PinchUpdate};
use crate::types::HandSnapshot;

/// What a tick observed, for the preview overlay and logging.
#[derive(Debug, Clone, Copy)]
pub struct TickOutcome {
    pub pinch: PinchUpdate,
    pub direction: DirectionState,
    pub mode: InteractionMode,
    pub gesture: Option<Gesture>,
    pub dragging: bool,
}

impl TickOutcome {
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_pinching()
    }

    pub fn duration(&self) -> Duration {
        self.pinch.duration
    }
}

pub struct GestureController {
    pinch: PinchDetector,
    direction: DirectionEstimator,
    gestures: GestureClassifier,
    engine: ActionEngine,
    gesture_requires_pinch: bool,
}

impl GestureController {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            pinch: PinchDetector::new(&config.pinch),
            direction: DirectionEstimator::new(&config.direction),
            gestures: GestureClassifier::new(&config.gesture),
            engine: ActionEngine::new(&config.cursor, &config.scroll, &config.zoom),
            gesture_requires_pinch: config.gesture.require_pinch,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.engine.mode()
    }

    pub fn is_dragging(&self) -> bool {
        self.engine.is_dragging()
    }

    pub fn click_cooldown(&self) -> u32 {
        self.engine.click_cooldown()
    }

    pub fn engine(&self) -> &ActionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ActionEngine {
        &mut self.engine
    }

    /// Process one frame. `hand` is the first tracked hand, if any.
    pub fn tick<S: ActionSink>(
        &mut self,
        hand: Option<&HandSnapshot>,
        now: Instant,
        sink: &mut S,
    ) -> TickOutcome {
        self.engine.begin_tick();

        let pinch = self.pinch.update(hand, now);

        match pinch.phase {
            PinchPhase::Started | PinchPhase::Held => {
                if let (Some(anchor), Some(position)) = (pinch.anchor, pinch.position) {
                    let direction = self.direction.estimate(anchor, position);
                    self.engine.on_pinching(pinch.duration, pinch.distance, direction, sink);
                }
            }
            PinchPhase::Released => {
                self.engine.on_pinch_released(pinch.duration, sink);
                self.direction.reset();
            }
            PinchPhase::Idle => {}
        }

        let gesture = match hand {
            Some(h) if pinch.is_pinching() || !self.gesture_requires_pinch => {
                self.gestures.classify(h, now)
            }
            _ => None,
        };
        if let Some(Gesture::ModeCycle) = gesture {
            self.engine.cycle_mode();
        }

        TickOutcome {
            pinch,
            direction: self.direction.state(),
            mode: self.engine.mode(),
            gesture,
            dragging: self.engine.is_dragging(),
        }
    }

    /// Release anything held on the OS side. Never fails.
    pub fn shutdown<S: ActionSink>(&mut self, sink: &mut S) {
        self.engine.shutdown(sink);
    }
}
