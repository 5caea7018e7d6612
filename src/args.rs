use clap::Parser;
use std::path::PathBuf;

use pinch_pilot::config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Control the mouse with hand gestures", long_about = None)]
pub struct Args {
    /// Camera index (overrides the config file)
    #[arg(short, long)]
    pub cam_index: Option<u32>,

    /// List available cameras and exit
    #[arg(long)]
    pub list: bool,

    /// Path to the JSON config file
    #[arg(long, default_value = AppConfig::DEFAULT_PATH)]
    pub config: PathBuf,

    /// Hand landmark ONNX model (overrides the config file)
    #[arg(long)]
    pub model: Option<String>,

    /// Mirror the camera image
    #[arg(long, overrides_with = "no_mirror")]
    pub mirror: bool,

    /// Do not mirror the camera image
    #[arg(long, overrides_with = "mirror")]
    pub no_mirror: bool,

    /// Run without the preview window
    #[arg(long)]
    pub headless: bool,

    /// Log actions instead of moving the real cursor
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after this many processed frames
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(index) = self.cam_index {
            config.camera.index = index;
        }
        if let Some(model) = &self.model {
            config.tracking.model_path = model.clone();
        }
        if self.mirror {
            config.camera.mirror = true;
        }
        if self.no_mirror {
            config.camera.mirror = false;
        }
        if self.headless {
            config.ui.show_preview = false;
        }
    }
}
