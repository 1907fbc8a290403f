use std::collections::VecDeque;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Sender, bounded};
use hound::{WavSpec, WavWriter};

use crate::config::AudioConfig;
use crate::error::{ModemError, Result};

/// Time without forward progress after which a write or drain is declared
/// stalled. Normal writes are one bit period (~22 ms); anything near this
/// long means the output device stopped consuming.
const STALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimal playback capability consumed by the modulator.
///
/// `write` accepts full-scale signed 16-bit samples and may block while the
/// device works through earlier audio; a write that makes no progress for
/// `STALL_TIMEOUT` fails with `PlaybackStalled`. `drain` blocks until all
/// previously written audio has actually been played.
pub trait AudioSink {
    fn write(&mut self, samples: &[i16]) -> Result<()>;
    fn drain(&mut self) -> Result<()>;
}

/// Playback through the default output device.
///
/// Writes land in a bounded channel; the device callback pulls them out and
/// counts samples off as they are consumed, which is what `drain` waits on.
/// Underruns play silence rather than stale audio.
pub struct DeviceSink {
    tx: Sender<Vec<f32>>,
    pending: Arc<AtomicUsize>,
    sample_rate: u32,
    stream: cpal::Stream,
}

impl DeviceSink {
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| ModemError::AudioDevice("No output device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Output device: {:?}", desc),
            Err(_) => log::info!("Output device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size as u32),
        };

        let (tx, rx) = bounded::<Vec<f32>>(8);
        let pending = Arc::new(AtomicUsize::new(0));
        let consumed = Arc::clone(&pending);
        let mut carry: VecDeque<f32> = VecDeque::new();

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut filled = 0;
                    while filled < data.len() {
                        match carry.pop_front() {
                            Some(sample) => {
                                data[filled] = sample;
                                filled += 1;
                                consumed.fetch_sub(1, Ordering::SeqCst);
                            }
                            None => match rx.try_recv() {
                                Ok(block) => carry.extend(block),
                                Err(_) => break,
                            },
                        }
                    }
                    data[filled..].fill(0.0);
                },
                |err| log::error!("Playback stream error: {}", err),
                None,
            )
            .map_err(|e| ModemError::AudioStream(format!("{}", e)))?;

        stream
            .play()
            .map_err(|e| ModemError::AudioStream(format!("{}", e)))?;

        Ok(Self {
            tx,
            pending,
            sample_rate: config.sample_rate,
            stream,
        })
    }
}

impl AudioSink for DeviceSink {
    fn write(&mut self, samples: &[i16]) -> Result<()> {
        let block: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
        self.pending.fetch_add(block.len(), Ordering::SeqCst);

        if self.tx.send_timeout(block, STALL_TIMEOUT).is_err() {
            self.pending.fetch_sub(samples.len(), Ordering::SeqCst);
            return Err(ModemError::PlaybackStalled(STALL_TIMEOUT.as_secs_f32()));
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        // Expected drain time plus the stall margin.
        let queued = self.pending.load(Ordering::SeqCst);
        let playout = Duration::from_secs_f64(queued as f64 / self.sample_rate as f64);
        let deadline = Instant::now() + playout + STALL_TIMEOUT;

        while self.pending.load(Ordering::SeqCst) > 0 {
            if Instant::now() > deadline {
                return Err(ModemError::PlaybackStalled(STALL_TIMEOUT.as_secs_f32()));
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }
}

impl Drop for DeviceSink {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}

/// Sink that writes mono 16-bit PCM to a WAV file instead of a device.
pub struct WavFileSink {
    writer: WavWriter<BufWriter<File>>,
}

impl WavFileSink {
    pub fn new<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)?;
        Ok(Self { writer })
    }

    /// Finish the file and write the WAV header sizes.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

impl AudioSink for WavFileSink {
    fn write(&mut self, samples: &[i16]) -> Result<()> {
        for &sample in samples {
            self.writer.write_sample(sample)?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
