use greenkeys::Result;
use greenkeys::audio::AudioSink;
use greenkeys::config::ModemConfig;
use greenkeys::modulator::Modulator;

/// Sink that captures everything written to it.
pub struct MemorySink {
    pub samples: Vec<i16>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// The captured audio as the normalized floats the capture path sees.
    pub fn as_capture_blocks(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / 32768.0).collect()
    }
}

impl AudioSink for MemorySink {
    fn write(&mut self, samples: &[i16]) -> Result<()> {
        self.samples.extend_from_slice(samples);
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Modulate `text` (with a settling leader) and return the audio as the
/// receive path would capture it.
pub fn modulate(config: &ModemConfig, text: &str) -> Vec<f32> {
    let mut modulator = Modulator::new(&config.line, config.audio.sample_rate);
    let mut sink = MemorySink::new();

    modulator.send_idle(&mut sink, 8).unwrap();
    modulator.send_str(&mut sink, text).unwrap();
    modulator.send_idle(&mut sink, 4).unwrap();

    sink.as_capture_blocks()
}
