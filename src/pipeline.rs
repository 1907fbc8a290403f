use crate::config::ModemConfig;
use crate::demod::Demodulator;
use crate::dsp::ToneDetector;
use crate::turnaround::Turnaround;

/// Detector bank plus demodulator, driven block-at-a-time.
///
/// The filters run on every sample even while reception is suppressed, so
/// their state tracks the live signal; only the demodulator is held in
/// idle. This is also the piece offline decoding uses against WAV input.
pub struct ReceivePipeline {
    detector: ToneDetector,
    demod: Demodulator,
    turnaround: Turnaround,
}

impl ReceivePipeline {
    pub fn new(config: &ModemConfig, turnaround: Turnaround) -> Self {
        let sample_rate = config.audio.sample_rate;
        Self {
            detector: ToneDetector::new(&config.line, &config.detector, sample_rate as f64),
            demod: Demodulator::new(&config.line, &config.detector, sample_rate),
            turnaround,
        }
    }

    /// Run one block of mono samples; returns the characters decoded in it.
    pub fn process_block(&mut self, samples: &[f32]) -> Vec<char> {
        let mut decoded = Vec::new();

        for &sample in samples {
            let nrz = self.detector.process(sample as f64);

            if self.turnaround.is_suppressed() {
                self.demod.reset();
                continue;
            }

            if let Some(c) = self.demod.process(nrz) {
                decoded.push(c);
            }
        }

        decoded
    }
}
