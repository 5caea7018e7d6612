//! Shutdown ordering: an outstanding drag is released exactly once, before
//! the frame source is let go, on every way out of the loop.

use image::RgbImage;
use pinch_pilot::actions::{ActionKind, ActionSink, DryRunSink, KeyCombo};
use pinch_pilot::camera::FrameSource;
use pinch_pilot::clock::FixedStepClock;
use pinch_pilot::config::AppConfig;
use pinch_pilot::extractor::ScriptedExtractor;
use pinch_pilot::runtime::{Runtime, StopReason};
use pinch_pilot::{Error, HandSnapshot, Keypoint, LandmarkName, Result};
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

type EventLog = Rc<RefCell<Vec<String>>>;

/// Dry-run sink that also writes each successful call into a shared log.
struct LoggingSink {
    inner: DryRunSink,
    log: EventLog,
}

impl LoggingSink {
    fn record(&self, result: Result<()>, event: &str) -> Result<()> {
        if result.is_ok() {
            self.log.borrow_mut().push(event.to_string());
        }
        result
    }
}

impl ActionSink for LoggingSink {
    fn move_cursor_to(&mut self, x: i32, y: i32) -> Result<()> {
        let r = self.inner.move_cursor_to(x, y);
        self.record(r, "move")
    }

    fn mouse_down(&mut self) -> Result<()> {
        let r = self.inner.mouse_down();
        self.record(r, "mouse_down")
    }

    fn mouse_up(&mut self) -> Result<()> {
        let r = self.inner.mouse_up();
        self.record(r, "mouse_up")
    }

    fn click(&mut self) -> Result<()> {
        let r = self.inner.click();
        self.record(r, "click")
    }

    fn scroll_by(&mut self, amount: i32) -> Result<()> {
        let r = self.inner.scroll_by(amount);
        self.record(r, "scroll")
    }

    fn send_hotkey(&mut self, combo: KeyCombo) -> Result<()> {
        let r = self.inner.send_hotkey(combo);
        self.record(r, "hotkey")
    }

    fn screen_size(&mut self) -> Result<(i32, i32)> {
        self.inner.screen_size()
    }

    fn cursor_position(&mut self) -> Result<(i32, i32)> {
        self.inner.cursor_position()
    }
}

impl Drop for LoggingSink {
    fn drop(&mut self) {
        self.log.borrow_mut().push("sink released".to_string());
    }
}

/// Blank frames; optionally panics on the given capture.
struct Frames {
    log: EventLog,
    captured: u32,
    panic_at: Option<u32>,
}

impl FrameSource for Frames {
    fn capture(&mut self) -> Result<RgbImage> {
        self.captured += 1;
        if self.panic_at == Some(self.captured) {
            panic!("camera driver crashed");
        }
        Ok(RgbImage::new(64, 48))
    }
}

impl Drop for Frames {
    fn drop(&mut self) {
        self.log.borrow_mut().push("frames released".to_string());
    }
}

fn pinch() -> HandSnapshot {
    HandSnapshot::new()
        .with(LandmarkName::ThumbTip, Keypoint::new(300.0, 200.0))
        .with(LandmarkName::IndexTip, Keypoint::new(340.0, 200.0))
}

/// Enough pinched frames at 10 fps for a drag to start.
fn dragging_script() -> ScriptedExtractor {
    let mut ex = ScriptedExtractor::new();
    for _ in 0..5 {
        ex.push_hand(pinch());
    }
    ex
}

fn build(
    extractor: ScriptedExtractor,
    panic_at: Option<u32>,
    log: &EventLog,
) -> Runtime<Frames, ScriptedExtractor, LoggingSink, FixedStepClock> {
    let mut config = AppConfig::default();
    config.camera.mirror = false;
    Runtime::new(
        &config,
        Frames {
            log: log.clone(),
            captured: 0,
            panic_at,
        },
        extractor,
        LoggingSink {
            inner: DryRunSink::new(1920, 1080),
            log: log.clone(),
        },
        FixedStepClock::from_fps(10),
    )
}

fn count(log: &EventLog, event: &str) -> usize {
    log.borrow().iter().filter(|e| e.as_str() == event).count()
}

fn position(log: &EventLog, event: &str) -> usize {
    log.borrow()
        .iter()
        .position(|e| e.as_str() == event)
        .unwrap_or_else(|| panic!("{} not logged", event))
}

fn assert_released_in_order(log: &EventLog) {
    assert_eq!(count(log, "mouse_down"), 1);
    assert_eq!(count(log, "mouse_up"), 1);
    let up = position(log, "mouse_up");
    let sink = position(log, "sink released");
    let frames = position(log, "frames released");
    assert!(up < sink, "drag released after sink: {:?}", log.borrow());
    assert!(sink < frames, "sink outlived frame source: {:?}", log.borrow());
}

#[test]
fn test_extractor_failure_releases_drag_before_resources() {
    let log = EventLog::default();
    let mut ex = dragging_script();
    ex.push_error("inference failed");

    {
        let mut rt = build(ex, None, &log);
        let err = rt.run().unwrap_err();
        assert!(matches!(err, Error::Model(_)));
        assert!(rt.controller().is_dragging());
        assert_eq!(count(&log, "mouse_up"), 0);
    }

    assert_released_in_order(&log);
}

#[test]
fn test_panic_in_loop_releases_drag() {
    let log = EventLog::default();
    let mut rt = build(dragging_script(), Some(6), &log);

    let result = panic::catch_unwind(AssertUnwindSafe(move || {
        let _ = rt.run();
    }));

    assert!(result.is_err());
    assert_released_in_order(&log);
}

#[test]
fn test_interrupt_while_dragging_releases_once() {
    let log = EventLog::default();
    {
        let mut rt = build(dragging_script(), None, &log).with_max_frames(Some(5));
        assert_eq!(rt.run().unwrap(), StopReason::FrameLimit);
        assert!(rt.sink().inner.is_button_down());

        // Explicit shutdown followed by Drop must not release twice
        rt.shutdown();
        assert!(!rt.sink().inner.is_button_down());
    }
    assert_released_in_order(&log);
}

#[test]
fn test_clean_exit_without_drag_sends_nothing_extra() {
    let log = EventLog::default();
    {
        let mut rt = build(ScriptedExtractor::new(), None, &log).with_max_frames(Some(3));
        rt.run().unwrap();
        assert_eq!(rt.sink().inner.count(ActionKind::MouseUp), 0);
    }
    assert_eq!(count(&log, "mouse_up"), 0);
    assert_eq!(position(&log, "sink released") + 1, position(&log, "frames released"));
}
