//! Preview window: camera frame, landmark dots, pinch indicator and mode color.
//! Also the in-window quit keys (`q` / `Esc`).

use image::RgbImage;

use crate::controller::TickOutcome;
use crate::types::{HandSnapshot, LandmarkName};
use crate::{Error, Result};

const PINCH_ON: u32 = 0x0000FF00;
const PINCH_OFF: u32 = 0x00FF0000;
const LANDMARK: u32 = 0x00FFFFFF;

/// What to draw on top of the frame.
pub struct Overlay<'a> {
    pub hand: Option<&'a HandSnapshot>,
    pub outcome: Option<&'a TickOutcome>,
    /// Multiplies keypoints back into frame pixels.
    pub scale: f32,
    pub dot_size: usize,
}

pub struct WindowOutput {
    window: minifb::Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                resize: true,
                ..minifb::WindowOptions::default()
            },
        )
        .map_err(|e| Error::Window(format!("Failed to create window: {}", e)))?;

        // ~60 FPS
        window.set_target_fps(60);

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn quit_requested(&self) -> bool {
        self.window.is_key_down(minifb::Key::Q) || self.window.is_key_down(minifb::Key::Escape)
    }

    pub fn show(&mut self, frame: &RgbImage, overlay: &Overlay) -> Result<()> {
        let target_w = frame.width() as usize;
        let target_h = frame.height() as usize;
        if target_w != self.width || target_h != self.height {
            self.width = target_w;
            self.height = target_h;
        }
        if self.buffer.len() != self.width * self.height {
            self.buffer.resize(self.width * self.height, 0);
        }

        for (i, pixel) in frame.pixels().enumerate() {
            if i >= self.buffer.len() {
                break;
            }
            let r = pixel[0] as u32;
            let g = pixel[1] as u32;
            let b = pixel[2] as u32;
            self.buffer[i] = (r << 16) | (g << 8) | b;
        }

        draw_overlay(&mut self.buffer, self.width, self.height, overlay);

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| Error::Window(format!("Window update failed: {}", e)))
    }
}

pub fn draw_overlay(buffer: &mut [u32], width: usize, height: usize, overlay: &Overlay) {
    if let Some(hand) = overlay.hand {
        let half = (overlay.dot_size / 2) as i32;
        for (name, point) in hand.iter() {
            let x = (point.x * overlay.scale) as i32;
            let y = (point.y * overlay.scale) as i32;
            let color = match name {
                LandmarkName::ThumbTip | LandmarkName::IndexTip => PINCH_ON,
                _ => LANDMARK,
            };
            fill_rect(buffer, width, height, x - half, y - half, overlay.dot_size, overlay.dot_size, color);
        }
    }

    if let Some(outcome) = overlay.outcome {
        // Mode bar across the top, pinch lamp below it
        fill_rect(buffer, width, height, 0, 0, width, 8, outcome.mode.color());
        let lamp = if outcome.is_pinching() { PINCH_ON } else { PINCH_OFF };
        fill_circle(buffer, width, height, 50, 100, 20, lamp);
    }
}

#[allow(clippy::too_many_arguments)]
pub fn fill_rect(
    buffer: &mut [u32],
    width: usize,
    height: usize,
    x: i32,
    y: i32,
    w: usize,
    h: usize,
    color: u32,
) {
    for dy in 0..h as i32 {
        for dx in 0..w as i32 {
            put_pixel(buffer, width, height, x + dx, y + dy, color);
        }
    }
}

pub fn fill_circle(buffer: &mut [u32], width: usize, height: usize, cx: i32, cy: i32, radius: i32, color: u32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(buffer, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel(buffer: &mut [u32], width: usize, height: usize, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
        return;
    }
    let idx = y as usize * width + x as usize;
    if idx < buffer.len() {
        buffer[idx] = color;
    }
}
