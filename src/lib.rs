//! # Pinch Pilot
//!
//! Turns a live hand-tracking stream into pointer actions. A pinch between the
//! thumb and index fingertips drives the cursor, clicks, drags, scrolls and
//! zooms; spreading thumb and pinky away from the wrist cycles the mode.
//!
//! ## Frame pipeline
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐
//! │   Camera   │──▶│  Landmark  │──▶│   Pinch    │──▶│ Direction  │──▶│   Action   │
//! │  (frames)  │   │ Extractor  │   │  Detector  │   │ Estimator  │   │   Engine   │
//! └────────────┘   └────────────┘   └────────────┘   └────────────┘   └─────┬──────┘
//!                                          │                                │
//!                                          ▼                                ▼
//!                                   ┌────────────┐                   ┌────────────┐
//!                                   │  Gesture   │── mode cycle ────▶│   Action   │
//!                                   │ Classifier │                   │    Sink    │
//!                                   └────────────┘                   └────────────┘
//! ```
//!
//! - [`camera`]: frame sources (webcam via nokhwa)
//! - [`extractor`]: landmark extraction (ONNX hand landmark model via ort)
//! - [`pinch`], [`direction`], [`gesture`], [`engine`]: the gesture state machine
//! - [`controller`]: per-session context object that runs one tick
//! - [`actions`]: OS input injection (enigo) and the dry-run sink
//! - [`runtime`]: frame loop and shutdown ordering
//! - [`config`]: JSON configuration

pub mod actions;
pub mod camera;
pub mod clock;
pub mod config;
pub mod controller;
pub mod direction;
pub mod engine;
pub mod extractor;
pub mod gesture;
pub mod output;
pub mod pinch;
pub mod runtime;
pub mod types;

pub use actions::{Action, ActionSink, DryRunSink, EnigoSink, KeyCombo};
pub use controller::{GestureController, TickOutcome};
pub use engine::InteractionMode;
pub use types::{HandSnapshot, Keypoint, LandmarkName};

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Input injection error: {0}")]
    Injection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
