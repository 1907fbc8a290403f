use std::f64::consts::{E, PI};

/// Recursive (IIR) filter with an arbitrary, fixed number of taps
///
/// Direct-form difference equation:
/// `y[n] = Σ a[i]·x[n-i] + Σ b[j]·y[n-1-j]`, with history vectors the same
/// length as their coefficient vectors and the newest entry at index 0.
///
/// The two design constructors below build everything the tone detector
/// needs: a damped resonator centered on a tone, and a one-pole smoother
/// for envelope following. Filters are pure numeric transforms; there is
/// nothing to fail.
#[derive(Debug, Clone)]
pub struct RecursiveFilter {
    a: Vec<f64>,
    b: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl RecursiveFilter {
    /// Create a filter from explicit feed-forward (`a`) and feedback (`b`)
    /// coefficients. History starts at zero.
    pub fn new(a: Vec<f64>, b: Vec<f64>) -> Self {
        let x = vec![0.0; a.len()];
        let y = vec![0.0; b.len()];
        Self { a, b, x, y }
    }

    /// Design a resonant band-pass centered on `center_hz`.
    ///
    /// Pole radius `r = 1 - 3·(bandwidth/fs)` sets the resonance width and
    /// the gain term `k` balances the response, giving a 3-tap forward /
    /// 2-tap feedback damped resonator.
    pub fn band_pass(center_hz: f64, bandwidth_hz: f64, sample_rate: f64) -> Self {
        let w = 2.0 * PI * (center_hz / sample_rate);
        let norm_bw = bandwidth_hz / sample_rate;
        let r = 1.0 - 3.0 * norm_bw;
        let k = (1.0 - 2.0 * r * w.cos() + r * r) / (2.0 - 2.0 * w.cos());

        let a = vec![1.0 - 3.0 * norm_bw, 2.0 * (k - r) * w.cos(), r * r - k];
        let b = vec![2.0 * r * w.cos(), -r * r];

        Self::new(a, b)
    }

    /// Design a one-pole low-pass (exponential smoother) with the given
    /// cutoff.
    ///
    /// The decay coefficient follows the standard one-pole time-constant
    /// relation `d = e^(-2π·fc/fs)`, so the step response settles with time
    /// constant `fs / (2π·fc)` samples. Verified by the tests below rather
    /// than matched to any particular transcription of the formula.
    pub fn low_pass(cutoff_hz: f64, sample_rate: f64) -> Self {
        let d = E.powf(-2.0 * PI * cutoff_hz / sample_rate);
        Self::new(vec![1.0 - d], vec![d])
    }

    /// Run one sample through the filter and return the output.
    pub fn process(&mut self, sample: f64) -> f64 {
        for i in (1..self.x.len()).rev() {
            self.x[i] = self.x[i - 1];
        }
        if !self.x.is_empty() {
            self.x[0] = sample;
        }

        let mut y = 0.0;
        for (coeff, value) in self.a.iter().zip(self.x.iter()) {
            y += coeff * value;
        }
        for (coeff, value) in self.b.iter().zip(self.y.iter()) {
            y += coeff * value;
        }

        for i in (1..self.y.len()).rev() {
            self.y[i] = self.y[i - 1];
        }
        if !self.y.is_empty() {
            self.y[0] = y;
        }

        y
    }

    /// Process a buffer in-place.
    pub fn process_buffer(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Direct evaluation of the difference equation, kept separate from the
    /// shifting implementation so the two can be checked against each other.
    fn direct_form(a: &[f64], b: &[f64], input: &[f64]) -> Vec<f64> {
        let mut output: Vec<f64> = Vec::with_capacity(input.len());
        for n in 0..input.len() {
            let mut y = 0.0;
            for (i, coeff) in a.iter().enumerate() {
                if n >= i {
                    y += coeff * input[n - i];
                }
            }
            for (j, coeff) in b.iter().enumerate() {
                if n >= j + 1 {
                    y += coeff * output[n - 1 - j];
                }
            }
            output.push(y);
        }
        output
    }

    #[test]
    fn test_matches_direct_difference_equation() {
        let a = vec![0.3, -0.2, 0.1];
        let b = vec![0.5, -0.25];
        let input: Vec<f64> = (0..200).map(|i| ((i * 7) % 13) as f64 - 6.0).collect();

        let expected = direct_form(&a, &b, &input);
        let mut filter = RecursiveFilter::new(a, b);

        for (sample, want) in input.iter().zip(expected.iter()) {
            let got = filter.process(*sample);
            assert_relative_eq!(got, *want, max_relative = 1e-12);
        }
    }

    fn tone_rms(filter: &mut RecursiveFilter, freq: f64, sample_rate: f64) -> f64 {
        let n = 8000;
        let skip = 2000;
        let mut sum = 0.0;
        for i in 0..n {
            let s = (2.0 * PI * freq * i as f64 / sample_rate).sin();
            let y = filter.process(s);
            if i >= skip {
                sum += y * y;
            }
        }
        (sum / (n - skip) as f64).sqrt()
    }

    #[test]
    fn test_band_pass_response_peaks_at_center_frequency() {
        let sample_rate = 8000.0;
        let center = 1400.0;

        // Sweep the band in 100 Hz steps; the response maximum must land
        // on the configured center.
        let mut peak_freq = 0.0;
        let mut peak_rms = 0.0;
        let mut freq = 800.0;
        while freq <= 2000.0 {
            let rms = tone_rms(
                &mut RecursiveFilter::band_pass(center, 50.0, sample_rate),
                freq,
                sample_rate,
            );
            if rms > peak_rms {
                peak_rms = rms;
                peak_freq = freq;
            }
            freq += 100.0;
        }
        assert_eq!(peak_freq, center, "response peaked at {peak_freq} Hz");
    }

    #[test]
    fn test_band_pass_attenuates_out_of_band() {
        let sample_rate = 8000.0;
        let center = 1400.0;

        let in_band = tone_rms(
            &mut RecursiveFilter::band_pass(center, 50.0, sample_rate),
            center,
            sample_rate,
        );
        let below = tone_rms(
            &mut RecursiveFilter::band_pass(center, 50.0, sample_rate),
            center - 400.0,
            sample_rate,
        );
        let above = tone_rms(
            &mut RecursiveFilter::band_pass(center, 50.0, sample_rate),
            center + 400.0,
            sample_rate,
        );

        let below_db = 20.0 * (below / in_band).log10();
        let above_db = 20.0 * (above / in_band).log10();
        assert!(below_db < -20.0, "below-band only {below_db:.1} dB down");
        assert!(above_db < -20.0, "above-band only {above_db:.1} dB down");
    }

    #[test]
    fn test_band_pass_separates_mark_and_space() {
        let sample_rate = 8000.0;
        let mark = tone_rms(
            &mut RecursiveFilter::band_pass(1400.0, 50.0, sample_rate),
            1400.0,
            sample_rate,
        );
        let space_leak = tone_rms(
            &mut RecursiveFilter::band_pass(1400.0, 50.0, sample_rate),
            1800.0,
            sample_rate,
        );
        assert!(
            space_leak < mark * 0.1,
            "space tone leaks through the mark filter: {space_leak} vs {mark}"
        );
    }

    #[test]
    fn test_low_pass_step_response_monotonic() {
        let sample_rate = 8000.0;
        let cutoff = 45.0;
        let mut filter = RecursiveFilter::low_pass(cutoff, sample_rate);

        let mut previous = 0.0;
        let mut outputs = Vec::new();
        for _ in 0..4000 {
            let y = filter.process(1.0);
            assert!(y >= previous - 1e-12, "step response must not overshoot");
            previous = y;
            outputs.push(y);
        }

        // After one time constant the response should be near 1 - 1/e.
        let tau = (sample_rate / (2.0 * PI * cutoff)).round() as usize;
        let at_tau = outputs[tau - 1];
        assert!(
            (at_tau - (1.0 - 1.0 / E)).abs() < 0.05,
            "step response at tau was {at_tau}"
        );

        // And it should approach steady state.
        assert!(outputs.last().unwrap() > &0.99);
    }

    #[test]
    fn test_low_pass_dc_gain_is_unity() {
        let mut filter = RecursiveFilter::low_pass(45.0, 8000.0);
        let mut y = 0.0;
        for _ in 0..100_000 {
            y = filter.process(1.0);
        }
        assert_relative_eq!(y, 1.0, max_relative = 1e-6);
    }
}
