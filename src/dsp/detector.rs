use crate::config::{DetectorConfig, LineConfig};
use crate::dsp::RecursiveFilter;

/// Mark/space tone detector bank
///
/// Two resonant band-pass filters, one per tone, each feeding a rectifier
/// and a one-pole envelope follower. The output per sample is the NRZ
/// value: mark envelope minus space envelope. Positive means the mark tone
/// dominates, negative means space.
pub struct ToneDetector {
    mark_bpf: RecursiveFilter,
    space_bpf: RecursiveFilter,
    mark_env: RecursiveFilter,
    space_env: RecursiveFilter,
}

impl ToneDetector {
    pub fn new(line: &LineConfig, detector: &DetectorConfig, sample_rate: f64) -> Self {
        Self {
            mark_bpf: RecursiveFilter::band_pass(line.mark_hz, detector.bandwidth_hz, sample_rate),
            space_bpf: RecursiveFilter::band_pass(
                line.space_hz,
                detector.bandwidth_hz,
                sample_rate,
            ),
            mark_env: RecursiveFilter::low_pass(detector.envelope_cutoff_hz, sample_rate),
            space_env: RecursiveFilter::low_pass(detector.envelope_cutoff_hz, sample_rate),
        }
    }

    /// Process one audio sample (normalized to [-1, 1]) into an NRZ value.
    pub fn process(&mut self, sample: f64) -> f64 {
        let mark = self.mark_bpf.process(sample);
        let space = self.space_bpf.process(sample);
        let mark_level = self.mark_env.process(mark.abs());
        let space_level = self.space_env.process(space.abs());
        mark_level - space_level
    }
}
