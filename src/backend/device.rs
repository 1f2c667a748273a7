//! Live output through the default audio device
//!
//! Wraps a [`SoftwareContext`] and pulls it from a `cpal` output stream. The
//! stream callback runs on the platform's audio thread; the engine keeps
//! writing to the shared graph from its own thread.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use log::{error, info};

use super::software::{AutoplayPolicy, SoftwareContext, SoftwareRenderer};
use super::{SoftwareFilter, SoftwareGain, SoftwarePlayer};
use crate::dsp::FilterStage;
use crate::error::{NoiseError, Result};
use crate::graph::{AudioBackend, AudioContext, ContextState, NodeId, ResumeOutcome};
use crate::signal::NoiseBuffer;

/// Opens contexts on an output device
#[derive(Debug, Clone, Default)]
pub struct DeviceBackend {
    device_name: Option<String>,
}

impl DeviceBackend {
    /// Use the host's default output device
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the output device with this exact name
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }
}

/// Names of the available output devices
pub fn list_output_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.output_devices().map_err(|e| NoiseError::Device {
        reason: format!("failed to enumerate devices: {e}"),
    })?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

fn find_device(name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    match name {
        Some(wanted) => host
            .output_devices()
            .map_err(|e| NoiseError::ContextUnavailable {
                reason: format!("failed to enumerate devices: {e}"),
            })?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| NoiseError::ContextUnavailable {
                reason: format!("output device '{wanted}' not found"),
            }),
        None => host
            .default_output_device()
            .ok_or_else(|| NoiseError::ContextUnavailable {
                reason: "no default output device".to_string(),
            }),
    }
}

fn write_frames<T>(data: &mut [T], channels: usize, renderer: &SoftwareRenderer, scratch: &mut Vec<f32>)
where
    T: SizedSample + FromSample<f32>,
{
    let frames = data.len() / channels;
    scratch.resize(frames, 0.0);
    renderer.render(&mut scratch[..frames]);
    for (frame, &value) in data.chunks_mut(channels).zip(scratch.iter()) {
        for sample in frame.iter_mut() {
            *sample = T::from_sample(value);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    renderer: SoftwareRenderer,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    let mut scratch = Vec::new();
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                write_frames(data, channels, &renderer, &mut scratch)
            },
            |err| error!("output stream error: {err}"),
            None,
        )
        .map_err(|e| NoiseError::ContextUnavailable {
            reason: format!("failed to open output stream: {e}"),
        })
}

impl AudioBackend for DeviceBackend {
    type Context = DeviceContext;

    fn create_context(&mut self) -> Result<DeviceContext> {
        let device = find_device(self.device_name.as_deref())?;
        let supported = device
            .default_output_config()
            .map_err(|e| NoiseError::ContextUnavailable {
                reason: format!("no usable output config: {e}"),
            })?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        let inner = SoftwareContext::new(config.sample_rate.0, AutoplayPolicy::Allowed, true)?;
        let renderer = inner.renderer();
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, renderer)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, renderer)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, renderer)?,
            other => {
                return Err(NoiseError::UnsupportedFormat {
                    format: format!("device sample format {other:?}"),
                })
            }
        };

        info!(
            "opened output device '{}' ({} Hz, {} ch, {:?})",
            device.name().unwrap_or_default(),
            config.sample_rate.0,
            config.channels,
            sample_format
        );
        Ok(DeviceContext { inner, stream })
    }
}

/// A software graph rendered by a device stream
pub struct DeviceContext {
    inner: SoftwareContext,
    stream: cpal::Stream,
}

impl DeviceContext {
    pub fn software(&self) -> &SoftwareContext {
        &self.inner
    }
}

impl AudioContext for DeviceContext {
    type Player = SoftwarePlayer;
    type Filter = SoftwareFilter;
    type Gain = SoftwareGain;

    fn state(&self) -> ContextState {
        self.inner.state()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn resume(&mut self, user_initiated: bool) -> Result<ResumeOutcome> {
        let outcome = self.inner.resume(user_initiated)?;
        if outcome == ResumeOutcome::Resumed {
            self.stream.play().map_err(|e| NoiseError::ResumeFailed {
                reason: e.to_string(),
            })?;
        }
        Ok(outcome)
    }

    fn create_buffer_player(&mut self, buffer: Arc<NoiseBuffer>) -> Result<SoftwarePlayer> {
        self.inner.create_buffer_player(buffer)
    }

    fn create_filter(&mut self, stage: &FilterStage) -> Result<SoftwareFilter> {
        self.inner.create_filter(stage)
    }

    fn create_gain(&mut self, value: f32) -> Result<SoftwareGain> {
        self.inner.create_gain(value)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.inner.connect(from, to)
    }

    fn destination(&self) -> NodeId {
        self.inner.destination()
    }
}
