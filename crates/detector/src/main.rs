use anyhow::Context;
use detector::{Detector, DetectorConfig, logging::setup_logging, serialization};

fn main() -> anyhow::Result<()> {
    let config = DetectorConfig::from_env()?;

    setup_logging(&config);

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    let images: Vec<String> = std::env::args().skip(1).collect();
    if images.is_empty() {
        anyhow::bail!("Usage: detector <image> [<image>...]");
    }

    tracing::info!("Loading detection model");
    let detector = Detector::load(&config)?;
    tracing::info!(labels = detector.labels().len(), "Model loaded successfully");

    let mut failures = 0usize;
    for path in &images {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;

        match detector.detect(&bytes) {
            Ok(detections) => {
                tracing::info!(image = %path, detections = detections.len(), "Detection complete");
                println!("{}", serialization::to_json(&detections)?);
            }
            Err(e) => {
                failures += 1;
                tracing::error!(image = %path, error = %e, "Failed to process image");
            }
        }
    }

    detector.shutdown();

    if failures > 0 {
        anyhow::bail!("{} of {} images failed", failures, images.len());
    }

    Ok(())
}
