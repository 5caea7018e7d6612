//! Input injection surface.
//!
//! [`ActionSink`] is the boundary to the OS: every call reports success or
//! failure and the engine decides what a failure means for its own state.
//! [`EnigoSink`] drives the real pointer and keyboard; [`DryRunSink`] keeps a
//! virtual cursor and logs what would have been sent.

use std::collections::HashSet;
use tracing::info;

use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Control,
    Meta,
}

/// A single modifier plus a character key, pressed as one chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifier: Modifier,
    pub key: char,
}

impl KeyCombo {
    /// Platform zoom modifier: Cmd on macOS, Ctrl elsewhere.
    pub fn zoom_modifier() -> Modifier {
        if cfg!(target_os = "macos") {
            Modifier::Meta
        } else {
            Modifier::Control
        }
    }

    pub fn zoom_in() -> Self {
        Self {
            modifier: Self::zoom_modifier(),
            key: '+',
        }
    }

    pub fn zoom_out() -> Self {
        Self {
            modifier: Self::zoom_modifier(),
            key: '-',
        }
    }
}

/// An action that was sent to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveTo { x: i32, y: i32 },
    MouseDown,
    MouseUp,
    Click,
    /// Positive scrolls the wheel up.
    Scroll(i32),
    Hotkey(KeyCombo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    MoveTo,
    MouseDown,
    MouseUp,
    Click,
    Scroll,
    Hotkey,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::MoveTo { .. } => ActionKind::MoveTo,
            Self::MouseDown => ActionKind::MouseDown,
            Self::MouseUp => ActionKind::MouseUp,
            Self::Click => ActionKind::Click,
            Self::Scroll(_) => ActionKind::Scroll,
            Self::Hotkey(_) => ActionKind::Hotkey,
        }
    }
}

/// OS pointer/keyboard primitives plus screen geometry.
pub trait ActionSink {
    fn move_cursor_to(&mut self, x: i32, y: i32) -> Result<()>;
    fn mouse_down(&mut self) -> Result<()>;
    fn mouse_up(&mut self) -> Result<()>;
    fn click(&mut self) -> Result<()>;
    /// Positive amounts scroll the wheel up.
    fn scroll_by(&mut self, amount: i32) -> Result<()>;
    fn send_hotkey(&mut self, combo: KeyCombo) -> Result<()>;
    fn screen_size(&mut self) -> Result<(i32, i32)>;
    fn cursor_position(&mut self) -> Result<(i32, i32)>;
}

impl<T: ActionSink + ?Sized> ActionSink for Box<T> {
    fn move_cursor_to(&mut self, x: i32, y: i32) -> Result<()> {
        (**self).move_cursor_to(x, y)
    }

    fn mouse_down(&mut self) -> Result<()> {
        (**self).mouse_down()
    }

    fn mouse_up(&mut self) -> Result<()> {
        (**self).mouse_up()
    }

    fn click(&mut self) -> Result<()> {
        (**self).click()
    }

    fn scroll_by(&mut self, amount: i32) -> Result<()> {
        (**self).scroll_by(amount)
    }

    fn send_hotkey(&mut self, combo: KeyCombo) -> Result<()> {
        (**self).send_hotkey(combo)
    }

    fn screen_size(&mut self) -> Result<(i32, i32)> {
        (**self).screen_size()
    }

    fn cursor_position(&mut self) -> Result<(i32, i32)> {
        (**self).cursor_position()
    }
}

fn injection_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::Injection(format!("{:?}", e))
}

pub struct EnigoSink {
    enigo: Enigo,
}

impl EnigoSink {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| Error::Injection(format!("Failed to connect to input backend: {:?}", e)))?;
        Ok(Self { enigo })
    }

    fn modifier_key(modifier: Modifier) -> Key {
        match modifier {
            Modifier::Control => Key::Control,
            Modifier::Meta => Key::Meta,
        }
    }
}

impl ActionSink for EnigoSink {
    fn move_cursor_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.enigo.move_mouse(x, y, Coordinate::Abs).map_err(injection_err)
    }

    fn mouse_down(&mut self) -> Result<()> {
        self.enigo.button(Button::Left, Direction::Press).map_err(injection_err)
    }

    fn mouse_up(&mut self) -> Result<()> {
        self.enigo.button(Button::Left, Direction::Release).map_err(injection_err)
    }

    fn click(&mut self) -> Result<()> {
        self.enigo.button(Button::Left, Direction::Click).map_err(injection_err)
    }

    fn scroll_by(&mut self, amount: i32) -> Result<()> {
        // enigo scrolls down for positive lengths
        self.enigo.scroll(-amount, Axis::Vertical).map_err(injection_err)
    }

    fn send_hotkey(&mut self, combo: KeyCombo) -> Result<()> {
        let modifier = Self::modifier_key(combo.modifier);
        self.enigo.key(modifier, Direction::Press).map_err(injection_err)?;
        let pressed = self.enigo.key(Key::Unicode(combo.key), Direction::Click);
        // Release the modifier even when the key itself failed
        let released = self.enigo.key(modifier, Direction::Release);
        pressed.map_err(injection_err)?;
        released.map_err(injection_err)
    }

    fn screen_size(&mut self) -> Result<(i32, i32)> {
        self.enigo.main_display().map_err(injection_err)
    }

    fn cursor_position(&mut self) -> Result<(i32, i32)> {
        self.enigo.location().map_err(injection_err)
    }
}

/// Logs actions instead of injecting them, tracking a virtual cursor.
#[derive(Debug, Clone)]
pub struct DryRunSink {
    screen: (i32, i32),
    cursor: (i32, i32),
    button_down: bool,
    actions: Vec<Action>,
    failing: HashSet<ActionKind>,
}

impl DryRunSink {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            screen: (width, height),
            cursor: (width / 2, height / 2),
            button_down: false,
            actions: Vec::new(),
            failing: HashSet::new(),
        }
    }

    /// Every action sent so far, in order. Failed calls are not recorded.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind() == kind).count()
    }

    pub fn is_button_down(&self) -> bool {
        self.button_down
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
    }

    /// Make every call of `kind` fail until [`DryRunSink::recover`] is called.
    pub fn fail(&mut self, kind: ActionKind) {
        self.failing.insert(kind);
    }

    pub fn recover(&mut self, kind: ActionKind) {
        self.failing.remove(&kind);
    }

    fn send(&mut self, action: Action) -> Result<()> {
        if self.failing.contains(&action.kind()) {
            return Err(Error::Injection(format!("simulated failure for {:?}", action)));
        }
        info!("dry-run: {:?}", action);
        self.actions.push(action);
        Ok(())
    }
}

impl ActionSink for DryRunSink {
    fn move_cursor_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.send(Action::MoveTo { x, y })?;
        self.cursor = (x, y);
        Ok(())
    }

    fn mouse_down(&mut self) -> Result<()> {
        self.send(Action::MouseDown)?;
        self.button_down = true;
        Ok(())
    }

    fn mouse_up(&mut self) -> Result<()> {
        self.send(Action::MouseUp)?;
        self.button_down = false;
        Ok(())
    }

    fn click(&mut self) -> Result<()> {
        self.send(Action::Click)
    }

    fn scroll_by(&mut self, amount: i32) -> Result<()> {
        self.send(Action::Scroll(amount))
    }

    fn send_hotkey(&mut self, combo: KeyCombo) -> Result<()> {
        self.send(Action::Hotkey(combo))
    }

    fn screen_size(&mut self) -> Result<(i32, i32)> {
        Ok(self.screen)
    }

    fn cursor_position(&mut self) -> Result<(i32, i32)> {
        Ok(self.cursor)
    }
}
