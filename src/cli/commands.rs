//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::backend::SoftwareBackend;
use crate::dsp::{FilterChain, NoiseType};
use crate::engine::{export_wav, EngineConfig, ExportFormat, NoiseEngine};
use crate::error::{NoiseError, Result};
use crate::signal::NoiseBuffer;

/// Load the engine config from `path`, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            info!("Loading config: {}", path.display());
            EngineConfig::from_json_file(path)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Render `seconds` of noise through a software engine.
pub fn render_noise(
    config: EngineConfig,
    noise: NoiseType,
    volume: f32,
    seconds: f64,
    sample_rate: u32,
) -> Result<Vec<f32>> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(NoiseError::InvalidConfig {
            reason: format!("render length must be positive, got {seconds}s"),
        });
    }

    let mut engine = NoiseEngine::with_config(SoftwareBackend::new(sample_rate), config);
    engine.start(noise, volume)?;

    let frames = (seconds * sample_rate as f64).round() as usize;
    let samples = engine
        .context()
        .map(|context| context.render_frames(frames))
        .ok_or_else(|| NoiseError::ContextUnavailable {
            reason: "engine has no context after start".to_string(),
        })?;

    engine.stop();
    Ok(samples)
}

/// Render noise into a WAV file.
pub fn render(
    config: EngineConfig,
    noise: Option<NoiseType>,
    volume: Option<f32>,
    seconds: f64,
    output: &Path,
    sample_rate: u32,
    bit_depth: u16,
) -> Result<()> {
    let noise = noise.unwrap_or(config.default_noise_type);
    let volume = volume.unwrap_or(config.default_volume);
    info!(
        "Rendering {seconds}s of {noise} noise at volume {volume:.2} to {}",
        output.display()
    );

    let samples = render_noise(config, noise, volume, seconds, sample_rate)?;
    export_wav(&samples, output, ExportFormat::new(sample_rate, bit_depth))?;

    let rendered = NoiseBuffer::from_samples(samples, sample_rate);
    println!("Wrote: {}", output.display());
    println!("Duration: {:.2}s", rendered.duration_secs());
    println!("Peak: {:.3}", rendered.peak());
    println!("RMS: {:.1} dBFS", rendered.rms_db());

    Ok(())
}

/// Print the filter chain for a noise type.
pub fn show_chain(noise: NoiseType) -> Result<()> {
    let chain = FilterChain::for_noise_type(noise);
    println!("{}", serde_json::to_string_pretty(&chain.to_json()?)?);
    Ok(())
}

/// Play one focus interval on an output device.
#[cfg(feature = "device")]
pub fn play(
    config: EngineConfig,
    noise: Option<NoiseType>,
    volume: Option<f32>,
    minutes: f64,
    device: Option<&str>,
) -> Result<()> {
    use std::time::{Duration, Instant};

    use crate::backend::DeviceBackend;
    use crate::lifecycle::LifecycleEvent;

    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(NoiseError::InvalidConfig {
            reason: format!("interval must be positive, got {minutes} min"),
        });
    }

    let noise = noise.unwrap_or(config.default_noise_type);
    let volume = volume.unwrap_or(config.default_volume);
    let backend = match device {
        Some(name) => DeviceBackend::with_device(name),
        None => DeviceBackend::new(),
    };

    let mut engine = NoiseEngine::with_config(backend, config);
    engine.start(noise, volume)?;
    println!("Playing {noise} noise for {minutes} min (Ctrl+C to stop)");

    let interval = Duration::from_secs_f64(minutes * 60.0);
    let started = Instant::now();
    while started.elapsed() < interval {
        let remaining = interval.saturating_sub(started.elapsed());
        info!("{}:{:02} remaining", remaining.as_secs() / 60, remaining.as_secs() % 60);
        std::thread::sleep(remaining.min(Duration::from_secs(60)));
    }

    engine.handle_lifecycle(LifecycleEvent::BeforeUnload);
    println!("Interval complete");
    Ok(())
}

/// List output devices.
#[cfg(feature = "device")]
pub fn list_devices() -> Result<()> {
    for name in crate::backend::list_output_devices()? {
        println!("{name}");
    }
    Ok(())
}
