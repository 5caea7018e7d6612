use anyhow::Context;
use clap::Parser;
use colored::*;
use std::sync::atomic::Ordering;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod args;

use args::Args;
use pinch_pilot::camera::CameraSource;
use pinch_pilot::clock::SystemClock;
use pinch_pilot::config::AppConfig;
use pinch_pilot::extractor::{LandmarkExtractor, OnnxHandLandmarker};
use pinch_pilot::output::WindowOutput;
use pinch_pilot::runtime::Runtime;
use pinch_pilot::{ActionSink, DryRunSink, EnigoSink};

/// Virtual screen used by `--dry-run`.
const DRY_RUN_SCREEN: (i32, i32) = (1920, 1080);

fn list_cameras() -> anyhow::Result<()> {
    let cameras = nokhwa::query(nokhwa::utils::ApiBackend::Auto)?;
    println!("{}", "Available Cameras:".bold());
    println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!("{:<5} | {:<30} | {:?}", cam.index(), cam.human_name(), cam.misc());
    }
    Ok(())
}

fn print_controls() {
    println!("{}", "Controls:".bold());
    println!("  {}  move the cursor (cursor mode)", "pinch + move".cyan());
    println!("  {}  click", "short pinch".cyan());
    println!("  {}  drag", "long pinch".cyan());
    println!(
        "  {}  next mode (cursor -> scroll -> zoom)",
        "pinch with thumb and pinky spread".cyan()
    );
    println!("  {}  quit", "q / Esc / Ctrl+C".cyan());
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "pinch_pilot=debug" } else { "pinch_pilot=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if args.list {
        return list_cameras();
    }

    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    args.apply_to(&mut config);
    config.validate()?;

    let camera = CameraSource::new(&config.camera)
        .with_context(|| format!("opening camera {}", config.camera.index))?;
    println!("{}", format!("Opened camera: {}", camera.name()).green());
    let (width, height) = (camera.width(), camera.height());

    let extractor = OnnxHandLandmarker::new(&config.tracking).context("loading hand landmark model")?;
    info!("Active extractor: {}", extractor.name());

    let sink: Box<dyn ActionSink> = if args.dry_run {
        println!("{}", "Dry run: actions are logged, not injected".yellow());
        Box::new(DryRunSink::new(DRY_RUN_SCREEN.0, DRY_RUN_SCREEN.1))
    } else {
        Box::new(EnigoSink::new().context("initializing input injection")?)
    };

    let mut runtime = Runtime::new(&config, camera, extractor, sink, SystemClock)
        .with_max_frames(args.max_frames);

    if config.ui.show_preview {
        let window = WindowOutput::new(&config.ui.window_title, width as usize, height as usize)
            .context("creating preview window")?;
        runtime = runtime.with_window(window);
    }

    let stop = runtime.stop_handle();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })?;

    print_controls();

    match runtime.run() {
        Ok(reason) => {
            info!("Exiting ({:?})", reason);
            Ok(())
        }
        Err(e) => {
            warn!("Gesture loop failed, releasing input");
            Err(e.into())
        }
    }
}
