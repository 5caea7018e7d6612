//! Checks that an ONNX model fits the hand tracker: lists its inputs and
//! outputs next to what the tracker feeds and reads, then runs one blank
//! frame through the real extractor.

use anyhow::{Context, Result};
use colored::*;
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use pinch_pilot::config::{AppConfig, TrackingConfig};
use pinch_pilot::extractor::{
    check_output_count, LandmarkExtractor, OnnxHandLandmarker, INPUT_SIZE, LANDMARK_COUNT,
    REQUIRED_OUTPUTS,
};
use std::env;

fn main() -> Result<()> {
    let config = AppConfig::default();
    let tracking = TrackingConfig {
        model_path: env::args().nth(1).unwrap_or(config.tracking.model_path),
        ..config.tracking
    };
    println!("Inspecting model: {}", tracking.model_path);

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level1)?
        .with_intra_threads(1)?
        .commit_from_file(&tracking.model_path)
        .with_context(|| format!("loading {}", tracking.model_path))?;

    println!("\n--- Inputs ---");
    println!("Tracker feeds: [1, {0}, {0}, 3] f32 RGB in [0, 1]", INPUT_SIZE);
    for (i, input) in session.inputs.iter().enumerate() {
        println!("#{}: {} {:?}", i, input.name, input.input_type);
    }

    println!("\n--- Outputs ---");
    println!(
        "Tracker reads: #0 landmarks ({} x 3 f32), #1 presence score",
        LANDMARK_COUNT
    );
    for (i, output) in session.outputs.iter().enumerate() {
        println!("#{}: {} {:?}", i, output.name, output.output_type);
    }

    let output_count = session.outputs.len();
    if let Err(e) = check_output_count(output_count) {
        println!("{}", format!("Unusable: {}", e).red());
        return Ok(());
    }
    if output_count > REQUIRED_OUTPUTS {
        println!("Outputs past #{} are ignored", REQUIRED_OUTPUTS - 1);
    }
    drop(session);

    // One blank frame through the same path the live loop uses
    let mut extractor = OnnxHandLandmarker::new(&tracking)?;
    let frame = RgbImage::new(config.camera.width, config.camera.height);
    match extractor.extract(&frame) {
        Ok(hands) => println!(
            "{}",
            format!(
                "OK: {} outputs, blank {}x{} frame gave {} hand(s)",
                output_count,
                frame.width(),
                frame.height(),
                hands.len()
            )
            .green()
        ),
        Err(e) => println!("{}", format!("Inference failed: {}", e).red()),
    }

    Ok(())
}
