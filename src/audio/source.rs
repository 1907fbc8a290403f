use std::path::Path;

use crossbeam_channel::Receiver;
use hound::WavReader;

use super::AudioCapture;
use crate::config::AudioConfig;
use crate::error::{ModemError, Result};

/// Minimal capture capability consumed by the receive pipeline.
///
/// `next_block` blocks until a block of mono samples (normalized to
/// [-1, 1]) is available, and returns `None` when the source is exhausted
/// or the device goes away.
pub trait AudioSource {
    fn next_block(&mut self) -> Result<Option<Vec<f32>>>;
    fn sample_rate(&self) -> u32;
}

/// Live capture from the default input device.
pub struct DeviceSource {
    rx: Receiver<Vec<f32>>,
    sample_rate: u32,
    _capture: AudioCapture,
}

impl DeviceSource {
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(10);
        let capture = AudioCapture::new(config, tx)?;
        Ok(Self {
            rx,
            sample_rate: config.sample_rate,
            _capture: capture,
        })
    }
}

impl AudioSource for DeviceSource {
    fn next_block(&mut self) -> Result<Option<Vec<f32>>> {
        match self.rx.recv() {
            Ok(data) => Ok(Some(data)),
            Err(_) => Ok(None),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Mono WAV file replay, for decoding recordings offline.
pub struct WavFileSource {
    samples: Vec<f32>,
    position: usize,
    chunk_size: usize,
    sample_rate: u32,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
        let mut reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(ModemError::Config(format!(
                "Expected mono WAV file, got {} channels",
                spec.channels
            )));
        }

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<
                std::result::Result<Vec<_>, _>,
            >()?,
            hound::SampleFormat::Int => {
                let max_val = 2_i32.pow(spec.bits_per_sample as u32 - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        Ok(Self {
            samples,
            position: 0,
            chunk_size,
            sample_rate: spec.sample_rate,
        })
    }
}

impl AudioSource for WavFileSource {
    fn next_block(&mut self) -> Result<Option<Vec<f32>>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = (self.position + self.chunk_size).min(self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(Some(chunk))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
