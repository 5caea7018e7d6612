//! Mode dispatch: turns pinch state and direction into pointer actions.
//!
//! The engine owns the interaction mode, the drag flag and the click cooldown.
//! Sink failures are logged and never abort a tick. Two failures change state
//! handling: a failed mouse-down leaves the drag flag clear, and a failed
//! mouse-up still clears it.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::actions::{ActionSink, KeyCombo};
use crate::config::{CursorConfig, ScrollConfig, ZoomConfig};
use crate::direction::DirectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionMode {
    #[default]
    Cursor,
    Scroll,
    Zoom,
}

impl InteractionMode {
    /// Next mode in the fixed cycle, wrapping around.
    pub fn next(&self) -> Self {
        match self {
            Self::Cursor => Self::Scroll,
            Self::Scroll => Self::Zoom,
            Self::Zoom => Self::Cursor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::Scroll => "scroll",
            Self::Zoom => "zoom",
        }
    }

    /// Preview color as 0RGB.
    pub fn color(&self) -> u32 {
        match self {
            Self::Cursor => 0x0000FF00,
            Self::Scroll => 0x000000FF,
            Self::Zoom => 0x00FF0000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionEngine {
    cursor: CursorConfig,
    scroll: ScrollConfig,
    zoom: ZoomConfig,
    mode: InteractionMode,
    dragging: bool,
    click_cooldown: u32,
    screen: Option<(i32, i32)>,
}

impl ActionEngine {
    pub fn new(cursor: &CursorConfig, scroll: &ScrollConfig, zoom: &ZoomConfig) -> Self {
        Self {
            cursor: cursor.clone(),
            scroll: scroll.clone(),
            zoom: zoom.clone(),
            mode: InteractionMode::default(),
            dragging: false,
            click_cooldown: 0,
            screen: None,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn click_cooldown(&self) -> u32 {
        self.click_cooldown
    }

    pub fn cycle_mode(&mut self) -> InteractionMode {
        self.mode = self.mode.next();
        info!("Mode switched to {}", self.mode.as_str());
        self.mode
    }

    /// Called once at the start of every tick.
    pub fn begin_tick(&mut self) {
        self.click_cooldown = self.click_cooldown.saturating_sub(1);
    }

    /// Dispatch for a frame in which the pinch is active.
    pub fn on_pinching<S: ActionSink>(
        &mut self,
        duration: Duration,
        distance: f32,
        direction: DirectionState,
        sink: &mut S,
    ) {
        match self.mode {
            InteractionMode::Cursor => {
                let secs = duration.as_secs_f32();
                if secs > self.cursor.drag_after_secs && !self.dragging {
                    match sink.mouse_down() {
                        Ok(()) => {
                            self.dragging = true;
                            debug!("Drag started after {:.3}s", secs);
                        }
                        Err(e) => warn!("Error in mouse_down: {}", e),
                    }
                }
                self.move_cursor(direction, self.speed_multiplier(duration), sink);
            }
            InteractionMode::Scroll => {
                let amount = self.scroll_amount(direction);
                if amount != 0 {
                    if let Err(e) = sink.scroll_by(amount) {
                        warn!("Error scrolling: {}", e);
                    }
                }
            }
            InteractionMode::Zoom => {
                if let Some(combo) = self.zoom_for_distance(distance) {
                    if let Err(e) = sink.send_hotkey(combo) {
                        warn!("Error zooming: {}", e);
                    }
                }
            }
        }
    }

    /// Dispatch for the frame in which the pinch ended.
    pub fn on_pinch_released<S: ActionSink>(&mut self, final_duration: Duration, sink: &mut S) {
        if self.dragging {
            self.release_drag(sink);
            return;
        }

        let secs = final_duration.as_secs_f32();
        if self.mode == InteractionMode::Cursor
            && secs > self.cursor.click_min_secs
            && secs < self.cursor.drag_after_secs
            && self.click_cooldown == 0
        {
            if let Err(e) = sink.click() {
                warn!("Error clicking: {}", e);
            }
            self.click_cooldown = self.cursor.click_cooldown_frames;
            debug!("Click after {:.3}s pinch", secs);
        }
    }

    /// Release an outstanding drag. Safe to call repeatedly; never fails.
    pub fn shutdown<S: ActionSink>(&mut self, sink: &mut S) {
        if self.dragging {
            info!("Releasing drag before shutdown");
            self.release_drag(sink);
        }
    }

    fn release_drag<S: ActionSink>(&mut self, sink: &mut S) {
        if let Err(e) = sink.mouse_up() {
            warn!("Error in mouse_up: {}", e);
        }
        self.dragging = false;
        debug!("Drag released");
    }

    /// Holding the pinch longer moves faster, up to `max_speed`.
    pub fn speed_multiplier(&self, duration: Duration) -> f32 {
        (1.0 + duration.as_secs_f32() / self.cursor.speed_ramp_secs).min(self.cursor.max_speed)
    }

    /// Cursor displacement for one tick. Steep gestures move vertically at
    /// full rate, shallow ones are damped by the slope.
    pub fn cursor_step(&self, direction: DirectionState, multiplier: f32) -> (f32, f32) {
        let step = self.cursor.base_step_px;
        let dx = direction.x * step * multiplier;
        let dy = if direction.slope.abs() > self.cursor.steep_slope {
            direction.y * step * multiplier
        } else {
            direction.y * direction.slope.abs() * self.cursor.shallow_gain * multiplier
        };
        (dx, dy)
    }

    /// Keep a target at least `safety_margin_px` away from every screen edge.
    pub fn safe_position(&self, x: f32, y: f32, screen: (i32, i32)) -> (i32, i32) {
        let margin = self.cursor.safety_margin_px;
        let x = (x.round() as i32).min(screen.0 - margin).max(margin);
        let y = (y.round() as i32).min(screen.1 - margin).max(margin);
        (x, y)
    }

    pub fn scroll_amount(&self, direction: DirectionState) -> i32 {
        (direction.y * direction.slope.abs() * self.scroll.gain) as i32
    }

    /// Zoom out below the lower bound, in above the upper bound, nothing between.
    pub fn zoom_for_distance(&self, distance: f32) -> Option<KeyCombo> {
        if distance < self.zoom.out_below_px {
            Some(KeyCombo::zoom_out())
        } else if distance > self.zoom.in_above_px {
            Some(KeyCombo::zoom_in())
        } else {
            None
        }
    }

    fn screen_size<S: ActionSink>(&mut self, sink: &mut S) -> Option<(i32, i32)> {
        if self.screen.is_none() {
            match sink.screen_size() {
                Ok(size) => {
                    info!("Screen size {}x{}", size.0, size.1);
                    self.screen = Some(size);
                }
                Err(e) => warn!("Error reading screen size: {}", e),
            }
        }
        self.screen
    }

    fn move_cursor<S: ActionSink>(&mut self, direction: DirectionState, multiplier: f32, sink: &mut S) {
        let Some(screen) = self.screen_size(sink) else {
            return;
        };
        let (x, y) = match sink.cursor_position() {
            Ok(pos) => pos,
            Err(e) => {
                warn!("Error reading cursor position: {}", e);
                return;
            }
        };
        let (dx, dy) = self.cursor_step(direction, multiplier);
        let (tx, ty) = self.safe_position(x as f32 + dx, y as f32 + dy, screen);
        if let Err(e) = sink.move_cursor_to(tx, ty) {
            warn!("Error moving cursor: {}", e);
        }
    }
}
