// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - `stream`: detect, resolve, build and run the pipeline
//! - `probe`: show what the detector found
//! - `pipeline`: show what would be streamed

use camstream::media::GstRuntime;
use camstream::{
    AppResult, DeviceProfile, EnvOverrides, PipelineController, SessionOutcome, StreamConfig,
    SystemProbe, build, detect, resolve,
};
use std::path::Path;
use tracing::error;

fn prepare(device: &Path) -> AppResult<(DeviceProfile, StreamConfig)> {
    let profile = detect(&SystemProbe::new(), device);
    let config = resolve(&profile, &EnvOverrides::from_env())?;
    Ok((profile, config))
}

/// Stream until end of stream, error or termination signal
pub fn stream(device: &Path) -> SessionOutcome {
    let (_, config) = match prepare(device) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!(error = %e, "Cannot start stream");
            eprintln!("Error: {}", e);
            return SessionOutcome::Failed(e);
        }
    };

    let graph = build(&config);

    let runtime = match GstRuntime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Cannot start stream");
            return SessionOutcome::Failed(e);
        }
    };

    let mut controller = PipelineController::new(runtime);
    let outcome = controller.run(&graph);
    if let SessionOutcome::Failed(e) = &outcome {
        eprintln!("Error: {}", e);
    }
    outcome
}

/// Print the detected device profile
pub fn probe(device: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let profile = detect(&SystemProbe::new(), device);
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

/// Print the resolved configuration and the pipeline description
pub fn print_pipeline(device: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (profile, config) = prepare(device)?;
    let graph = build(&config);

    let camera = if profile.has_v4l2_device {
        "webcam"
    } else {
        "camera module"
    };
    println!("Camera:      {}", camera);
    println!(
        "Video:       {}x{} @ {}fps ({})",
        config.video_width,
        config.video_height,
        config.video_framerate,
        if config.use_hardware_encoder {
            config.h264_encoder.as_str()
        } else {
            "native H.264"
        }
    );
    if config.audio_enabled {
        println!(
            "Audio:       {} Hz, {} bps AAC",
            config.audio_sample_rate, config.audio_bitrate
        );
    } else {
        println!("Audio:       disabled");
    }
    println!("Destination: {}", config.stream_url);
    println!();
    println!("Pipeline stream:");
    println!("{}", graph);
    Ok(())
}
