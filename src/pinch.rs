//! Thumb/index pinch detection and pinch session tracking.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::PinchConfig;
use crate::types::{HandSnapshot, Keypoint, LandmarkName};

/// Where the current frame sits in a pinch episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchPhase {
    /// No pinch this frame and none last frame.
    Idle,
    /// First pinching frame; a new session was opened.
    Started,
    /// Pinch continues from a previous frame.
    Held,
    /// Pinch ended this frame; `duration` holds the final session length.
    Released,
}

impl PinchPhase {
    pub fn is_pinching(&self) -> bool {
        matches!(self, Self::Started | Self::Held)
    }
}

/// An active pinch episode.
#[derive(Debug, Clone, Copy)]
pub struct PinchSession {
    /// Midpoint of thumb and index tips when the pinch began.
    pub anchor: Keypoint,
    pub started_at: Instant,
}

impl PinchSession {
    pub fn duration(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }
}

/// Result of feeding one frame to the detector.
#[derive(Debug, Clone, Copy)]
pub struct PinchUpdate {
    pub phase: PinchPhase,
    /// Thumb to index distance, 0 when either tip is missing.
    pub distance: f32,
    /// Session length; on `Released` this is the final length.
    pub duration: Duration,
    /// Session anchor while pinching.
    pub anchor: Option<Keypoint>,
    /// Current thumb/index midpoint, when both tips are present.
    pub position: Option<Keypoint>,
}

impl PinchUpdate {
    pub fn is_pinching(&self) -> bool {
        self.phase.is_pinching()
    }
}

/// Classifies frames as pinching or not and owns the single pinch session.
#[derive(Debug, Clone)]
pub struct PinchDetector {
    threshold_px: f32,
    session: Option<PinchSession>,
}

impl PinchDetector {
    pub fn new(config: &PinchConfig) -> Self {
        Self {
            threshold_px: config.threshold_px,
            session: None,
        }
    }

    /// Distance between thumb and index tips, and whether it counts as a pinch.
    /// Missing tips read as not pinching with distance 0.
    pub fn measure(&self, hand: &HandSnapshot) -> (bool, f32) {
        match (hand.get(LandmarkName::ThumbTip), hand.get(LandmarkName::IndexTip)) {
            (Some(thumb), Some(index)) => {
                let distance = thumb.distance(&index);
                (distance <= self.threshold_px, distance)
            }
            _ => (false, 0.0),
        }
    }

    /// Advance the session state with this frame. `None` means no hand was
    /// found, which closes any open session.
    pub fn update(&mut self, hand: Option<&HandSnapshot>, now: Instant) -> PinchUpdate {
        let (pinching, distance) = hand.map(|h| self.measure(h)).unwrap_or((false, 0.0));
        let position = hand.and_then(|h| {
            match (h.get(LandmarkName::ThumbTip), h.get(LandmarkName::IndexTip)) {
                (Some(thumb), Some(index)) => Some(thumb.midpoint(&index)),
                _ => None,
            }
        });

        match (self.session, pinching, position) {
            (None, true, Some(anchor)) => {
                debug!("Pinch started at ({:.1}, {:.1}), distance {:.1}", anchor.x, anchor.y, distance);
                self.session = Some(PinchSession {
                    anchor,
                    started_at: now,
                });
                PinchUpdate {
                    phase: PinchPhase::Started,
                    distance,
                    duration: Duration::ZERO,
                    anchor: Some(anchor),
                    position,
                }
            }
            (Some(session), true, _) => PinchUpdate {
                phase: PinchPhase::Held,
                distance,
                duration: session.duration(now),
                anchor: Some(session.anchor),
                position,
            },
            (Some(session), false, _) => {
                let duration = session.duration(now);
                self.session = None;
                debug!("Pinch released after {:.3}s", duration.as_secs_f32());
                PinchUpdate {
                    phase: PinchPhase::Released,
                    distance,
                    duration,
                    anchor: None,
                    position,
                }
            }
            _ => PinchUpdate {
                phase: PinchPhase::Idle,
                distance,
                duration: Duration::ZERO,
                anchor: None,
                position,
            },
        }
    }

    pub fn session(&self) -> Option<&PinchSession> {
        self.session.as_ref()
    }

    /// Current session length, zero when no session is open.
    pub fn duration(&self, now: Instant) -> Duration {
        self.session.map(|s| s.duration(now)).unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(thumb: (f32, f32), index: (f32, f32)) -> HandSnapshot {
        HandSnapshot::new()
            .with(LandmarkName::ThumbTip, Keypoint::new(thumb.0, thumb.1))
            .with(LandmarkName::IndexTip, Keypoint::new(index.0, index.1))
    }

    fn detector() -> PinchDetector {
        PinchDetector::new(&PinchConfig::default())
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let d = detector();
        assert_eq!(d.measure(&hand((100.0, 100.0), (155.0, 100.0))), (true, 55.0));
        let (pinching, distance) = d.measure(&hand((100.0, 100.0), (155.5, 100.0)));
        assert!(!pinching);
        assert!(distance > 55.0);
    }

    #[test]
    fn test_missing_tip_is_not_pinching() {
        let d = detector();
        let only_thumb = HandSnapshot::new().with(LandmarkName::ThumbTip, Keypoint::new(1.0, 1.0));
        assert_eq!(d.measure(&only_thumb), (false, 0.0));
    }

    #[test]
    fn test_session_lifecycle() {
        let mut d = detector();
        let t0 = Instant::now();
        let pinch = hand((100.0, 100.0), (120.0, 100.0));

        let first = d.update(Some(&pinch), t0);
        assert_eq!(first.phase, PinchPhase::Started);
        assert_eq!(first.duration, Duration::ZERO);
        assert_eq!(first.anchor, Some(Keypoint::new(110.0, 100.0)));

        let held = d.update(Some(&pinch), t0 + Duration::from_millis(100));
        assert_eq!(held.phase, PinchPhase::Held);
        assert_eq!(held.duration, Duration::from_millis(100));

        let open = hand((100.0, 100.0), (200.0, 100.0));
        let released = d.update(Some(&open), t0 + Duration::from_millis(250));
        assert_eq!(released.phase, PinchPhase::Released);
        assert_eq!(released.duration, Duration::from_millis(250));
        assert!(d.session().is_none());
        assert_eq!(d.duration(t0 + Duration::from_millis(300)), Duration::ZERO);

        let idle = d.update(Some(&open), t0 + Duration::from_millis(300));
        assert_eq!(idle.phase, PinchPhase::Idle);
        assert_eq!(idle.duration, Duration::ZERO);
    }

    #[test]
    fn test_duration_is_monotonic_while_held() {
        let mut d = detector();
        let t0 = Instant::now();
        let pinch = hand((10.0, 10.0), (20.0, 10.0));
        let mut last = Duration::ZERO;
        for i in 0..10 {
            let update = d.update(Some(&pinch), t0 + Duration::from_millis(33 * i));
            assert!(update.duration >= last);
            last = update.duration;
        }
    }

    #[test]
    fn test_anchor_stays_at_session_start() {
        let mut d = detector();
        let t0 = Instant::now();
        d.update(Some(&hand((100.0, 100.0), (110.0, 100.0))), t0);
        let moved = d.update(Some(&hand((150.0, 130.0), (160.0, 130.0))), t0 + Duration::from_millis(50));
        assert_eq!(moved.anchor, Some(Keypoint::new(105.0, 100.0)));
        assert_eq!(moved.position, Some(Keypoint::new(155.0, 130.0)));
    }

    #[test]
    fn test_lost_hand_closes_session() {
        let mut d = detector();
        let t0 = Instant::now();
        d.update(Some(&hand((0.0, 0.0), (5.0, 0.0))), t0);
        let update = d.update(None, t0 + Duration::from_millis(120));
        assert_eq!(update.phase, PinchPhase::Released);
        assert_eq!(update.duration, Duration::from_millis(120));
        assert_eq!(update.distance, 0.0);
    }

    #[test]
    fn test_lost_tip_closes_session() {
        let mut d = detector();
        let t0 = Instant::now();
        d.update(Some(&hand((0.0, 0.0), (5.0, 0.0))), t0);
        let thumb_only = HandSnapshot::new().with(LandmarkName::ThumbTip, Keypoint::new(0.0, 0.0));
        let update = d.update(Some(&thumb_only), t0 + Duration::from_millis(80));
        assert_eq!(update.phase, PinchPhase::Released);
    }
}
