//! The frame loop.
//!
//! One tick per captured frame, strictly sequential. Every exit path (stop
//! flag, quit key, frame limit, error return, panic) goes through
//! [`Runtime`]'s `Drop`, which releases an outstanding drag before the sink,
//! the extractor and the frame source are dropped in that order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::actions::ActionSink;
use crate::camera::FrameSource;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::controller::GestureController;
use crate::extractor::LandmarkExtractor;
use crate::output::{Overlay, WindowOutput};
use crate::Result;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stop flag raised (Ctrl+C).
    Interrupted,
    /// `q`/`Esc` pressed or the preview window was closed.
    QuitKey,
    FrameLimit,
}

/// Counts ticks and reports the rate once per second.
#[derive(Debug)]
struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            window_start: None,
            frames: 0,
            fps: 0,
        }
    }

    /// Returns the new rate when a one-second window closes.
    fn tick(&mut self, now: Instant) -> Option<u32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        if now.saturating_duration_since(start) >= Duration::from_secs(1) {
            self.fps = self.frames;
            self.frames = 0;
            self.window_start = Some(now);
            return Some(self.fps);
        }
        None
    }
}

// Field order is drop order: sink, then extractor, then frames and window.
pub struct Runtime<F: FrameSource, E: LandmarkExtractor, S: ActionSink, C: Clock> {
    controller: GestureController,
    sink: S,
    extractor: E,
    frames: F,
    window: Option<WindowOutput>,
    clock: C,
    stop: Arc<AtomicBool>,
    mirror: bool,
    max_frames: Option<u64>,
    reference_width: f32,
    dot_size: usize,
    ticks: u64,
    failed_captures: u64,
}

impl<F: FrameSource, E: LandmarkExtractor, S: ActionSink, C: Clock> Runtime<F, E, S, C> {
    pub fn new(config: &AppConfig, frames: F, extractor: E, sink: S, clock: C) -> Self {
        Self {
            controller: GestureController::new(config),
            sink,
            extractor,
            frames,
            window: None,
            clock,
            stop: Arc::new(AtomicBool::new(false)),
            mirror: config.camera.mirror,
            max_frames: None,
            reference_width: config.tracking.reference_width,
            dot_size: config.ui.landmark_dot_size,
            ticks: 0,
            failed_captures: 0,
        }
    }

    pub fn with_window(mut self, window: WindowOutput) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Shared flag; raising it stops the loop before the next tick.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn controller(&self) -> &GestureController {
        &self.controller
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn failed_captures(&self) -> u64 {
        self.failed_captures
    }

    /// Run until a stop condition. Extractor and window errors end the loop
    /// with an error; capture failures are skipped.
    pub fn run(&mut self) -> Result<StopReason> {
        info!("Starting gesture loop with {}", self.extractor.name());
        let mut fps = FpsCounter::new();

        let reason = loop {
            if self.stop.load(Ordering::SeqCst) {
                break StopReason::Interrupted;
            }
            if let Some(window) = &self.window {
                if !window.is_open() || window.quit_requested() {
                    break StopReason::QuitKey;
                }
            }
            if self.max_frames.is_some_and(|max| self.ticks >= max) {
                break StopReason::FrameLimit;
            }

            let mut frame = match self.frames.capture() {
                Ok(frame) => frame,
                Err(e) => {
                    self.failed_captures += 1;
                    // Avoid flooding the log while the camera is unavailable
                    if self.failed_captures == 1 || self.failed_captures % 30 == 0 {
                        warn!("Failed to capture frame ({} so far): {}", self.failed_captures, e);
                    }
                    std::thread::sleep(Duration::from_millis(10));
                    continue;
                }
            };
            if self.mirror {
                image::imageops::flip_horizontal_in_place(&mut frame);
            }

            let hands = self.extractor.extract(&frame).inspect_err(|e| {
                error!("Landmark extraction failed: {}", e);
            })?;
            let hand = hands.first();

            let now = self.clock.now();
            let outcome = self.controller.tick(hand, now, &mut self.sink);
            self.ticks += 1;

            if let Some(rate) = fps.tick(now) {
                debug!(
                    "FPS: {} mode={} pinching={} dragging={}",
                    rate,
                    outcome.mode.as_str(),
                    outcome.is_pinching(),
                    outcome.dragging
                );
            }

            if let Some(window) = self.window.as_mut() {
                let overlay = Overlay {
                    hand,
                    outcome: Some(&outcome),
                    scale: frame.width() as f32 / self.reference_width,
                    dot_size: self.dot_size,
                };
                window.show(&frame, &overlay)?;
            }
        };

        info!("Gesture loop stopped: {:?} after {} ticks", reason, self.ticks);
        Ok(reason)
    }

    /// Release an outstanding drag. Runs again from `Drop`, where it is a no-op.
    pub fn shutdown(&mut self) {
        self.controller.shutdown(&mut self.sink);
    }
}

impl<F: FrameSource, E: LandmarkExtractor, S: ActionSink, C: Clock> Drop for Runtime<F, E, S, C> {
    fn drop(&mut self) {
        info!("Cleaning up resources...");
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionKind, DryRunSink};
    use crate::clock::FixedStepClock;
    use crate::extractor::ScriptedExtractor;
    use crate::types::{HandSnapshot, Keypoint, LandmarkName};
    use crate::Error;
    use image::RgbImage;

    struct BlankFrames {
        fail_first: u32,
    }

    impl FrameSource for BlankFrames {
        fn capture(&mut self) -> Result<RgbImage> {
            if self.fail_first > 0 {
                self.fail_first -= 1;
                return Err(Error::Camera("no frame".to_string()));
            }
            Ok(RgbImage::new(64, 48))
        }
    }

    fn pinch() -> HandSnapshot {
        HandSnapshot::new()
            .with(LandmarkName::ThumbTip, Keypoint::new(300.0, 200.0))
            .with(LandmarkName::IndexTip, Keypoint::new(320.0, 200.0))
    }

    fn runtime(
        extractor: ScriptedExtractor,
        fail_first: u32,
    ) -> Runtime<BlankFrames, ScriptedExtractor, DryRunSink, FixedStepClock> {
        let mut config = AppConfig::default();
        config.camera.mirror = false;
        Runtime::new(
            &config,
            BlankFrames { fail_first },
            extractor,
            DryRunSink::new(1920, 1080),
            FixedStepClock::from_fps(10),
        )
    }

    #[test]
    fn test_frame_limit_stops_loop() {
        let mut rt = runtime(ScriptedExtractor::new(), 0).with_max_frames(Some(3));
        assert_eq!(rt.run().unwrap(), StopReason::FrameLimit);
        assert_eq!(rt.ticks(), 3);
    }

    #[test]
    fn test_capture_failures_are_skipped() {
        let mut rt = runtime(ScriptedExtractor::new(), 2).with_max_frames(Some(2));
        assert_eq!(rt.run().unwrap(), StopReason::FrameLimit);
        assert_eq!(rt.failed_captures(), 2);
        assert_eq!(rt.ticks(), 2);
    }

    #[test]
    fn test_stop_flag() {
        let mut rt = runtime(ScriptedExtractor::new(), 0);
        rt.stop_handle().store(true, Ordering::SeqCst);
        assert_eq!(rt.run().unwrap(), StopReason::Interrupted);
        assert_eq!(rt.ticks(), 0);
    }

    #[test]
    fn test_extractor_error_ends_loop_and_releases_drag() {
        let mut ex = ScriptedExtractor::new();
        for _ in 0..5 {
            ex.push_hand(pinch());
        }
        ex.push_error("model crashed");

        let mut rt = runtime(ex, 0);
        assert!(rt.run().is_err());
        assert!(rt.controller().is_dragging());
        assert!(rt.sink().is_button_down());

        rt.shutdown();
        assert!(!rt.controller().is_dragging());
        assert!(!rt.sink().is_button_down());
        assert_eq!(rt.sink().count(ActionKind::MouseUp), 1);
    }

    #[test]
    fn test_fps_counter_reports_once_per_second() {
        let mut counter = FpsCounter::new();
        let t0 = Instant::now();
        let mut reports = Vec::new();
        for i in 0..25 {
            if let Some(rate) = counter.tick(t0 + Duration::from_millis(100 * i)) {
                reports.push(rate);
            }
        }
        assert_eq!(reports, vec![11, 10]);
    }
}
