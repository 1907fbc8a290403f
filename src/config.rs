//! Configuration for the greenkeys RTTY modem.
//!
//! The line-protocol constants in `LineConfig::default()` (1400/1800 Hz,
//! 45 baud, 5-bit Baudot at 8000 Hz) are what compatible RTTY software and
//! hardware expect on the wire. Change them only if the peer changes too.

use std::time::Duration;

/// System-wide modem configuration
///
/// Use `ModemConfig::default()` for a modem that interoperates with the
/// standard 45.45-class setup.
///
/// # Example
/// ```
/// use greenkeys::config::ModemConfig;
///
/// let mut config = ModemConfig::default();
/// config.detector.start_threshold = 0.15;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModemConfig {
    /// Audio device configuration
    pub audio: AudioConfig,
    /// FSK line protocol parameters
    pub line: LineConfig,
    /// Tone detector tuning
    pub detector: DetectorConfig,
    /// Half-duplex turn-taking behavior
    pub turnaround: TurnaroundConfig,
}

/// Audio device configuration
///
/// The capture and playback paths share one rate and block size. The modem
/// runs mono; stereo devices are downmixed by the capture callback.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Sample rate in Hz for both directions
    pub sample_rate: u32,
    /// Capture/playback block size in samples
    pub buffer_size: usize,
}

impl AudioConfig {
    /// Wall-clock duration of one capture block.
    pub fn buffer_duration(&self) -> Duration {
        Duration::from_secs_f64(self.buffer_size as f64 / self.sample_rate as f64)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            buffer_size: 2048,
        }
    }
}

/// FSK line protocol parameters
///
/// These define the on-air format: two tones, a baud rate, and the 5-bit
/// frame (start = space, data LSB-first, stop = mark).
#[derive(Debug, Clone)]
pub struct LineConfig {
    /// Mark tone frequency in Hz (binary one, line idle)
    pub mark_hz: f64,
    /// Space tone frequency in Hz (binary zero, start bit)
    pub space_hz: f64,
    /// Symbol rate in bits per second
    pub baud_rate: u32,
    /// Data bits per character frame
    pub bits_per_char: u32,
}

impl LineConfig {
    /// Samples in one bit period, truncated as the original timing did.
    pub fn samples_per_bit(&self, sample_rate: u32) -> usize {
        (sample_rate / self.baud_rate) as usize
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            mark_hz: 1400.0,
            space_hz: 1800.0,
            baud_rate: 45,
            bits_per_char: 5,
        }
    }
}

/// Tone detector tuning
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Band-pass resonator bandwidth in Hz around each tone
    pub bandwidth_hz: f64,
    /// Envelope follower cutoff in Hz (defaults to the baud rate)
    pub envelope_cutoff_hz: f64,
    /// Minimum NRZ magnitude, in the space direction, that starts a frame
    pub start_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            bandwidth_hz: 50.0,
            envelope_cutoff_hz: 45.0,
            start_threshold: 0.1,
        }
    }
}

/// Half-duplex suppression policy
///
/// While transmitting, the receive path must not decode our own tones.
/// `Guarded` additionally holds suppression for a guard interval after the
/// transmitter drains, so tones still in flight through the capture buffer
/// cannot be decoded as an echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GuardPolicy {
    /// Re-enable reception the instant transmission stops
    Immediate,
    /// Hold suppression for the guard interval after transmission stops
    Guarded,
}

/// Half-duplex turn-taking configuration
#[derive(Debug, Clone)]
pub struct TurnaroundConfig {
    /// Suppression release policy (`Guarded` recommended)
    pub policy: GuardPolicy,
    /// Guard interval as a multiple of the capture buffer duration
    pub guard_buffers: f64,
}

impl TurnaroundConfig {
    /// Concrete guard interval for the given audio configuration.
    pub fn guard_interval(&self, audio: &AudioConfig) -> Duration {
        match self.policy {
            GuardPolicy::Immediate => Duration::ZERO,
            GuardPolicy::Guarded => audio.buffer_duration().mul_f64(self.guard_buffers),
        }
    }
}

impl Default for TurnaroundConfig {
    fn default() -> Self {
        Self {
            policy: GuardPolicy::Guarded,
            guard_buffers: 2.0,
        }
    }
}
