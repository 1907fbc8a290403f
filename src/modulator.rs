use std::f64::consts::PI;

use crate::audio::AudioSink;
use crate::baudot::{self, Shift};
use crate::config::LineConfig;
use crate::error::Result;

/// Baudot framer and FSK tone synthesizer.
///
/// Each 5-bit code goes out as start bit (space tone), five data bits
/// LSB-first, stop bit (mark tone), one bit period of sine apiece at full
/// signed 16-bit amplitude. The phase accumulator carries across bits and
/// frames, so tone transitions are click-free.
///
/// The sender-side shift mode persists across characters; a shift code is
/// only transmitted when the next character lives in the other table.
pub struct Modulator {
    shift: Shift,
    phase: f64,
    mark_step: f64,
    space_step: f64,
    samples_per_bit: usize,
    data_bits: u32,
    bit_buffer: Vec<i16>,
}

impl Modulator {
    pub fn new(line: &LineConfig, sample_rate: u32) -> Self {
        let step = |freq: f64| freq * 2.0 * PI / sample_rate as f64;
        let samples_per_bit = line.samples_per_bit(sample_rate);
        Self {
            shift: Shift::Letters,
            phase: 0.0,
            mark_step: step(line.mark_hz),
            space_step: step(line.space_hz),
            samples_per_bit,
            data_bits: line.bits_per_char,
            bit_buffer: Vec::with_capacity(samples_per_bit),
        }
    }

    fn send_bit(&mut self, sink: &mut dyn AudioSink, is_mark: bool) -> Result<()> {
        let step = if is_mark { self.mark_step } else { self.space_step };

        self.bit_buffer.clear();
        for _ in 0..self.samples_per_bit {
            self.phase += step;
            if self.phase > 2.0 * PI {
                self.phase -= 2.0 * PI;
            }
            self.bit_buffer.push((self.phase.sin() * 32767.0) as i16);
        }

        sink.write(&self.bit_buffer)
    }

    /// Hold the line at mark for `bit_periods` bit times. Used as a leader
    /// so a receiver's envelopes settle before the first start bit.
    pub fn send_idle(&mut self, sink: &mut dyn AudioSink, bit_periods: usize) -> Result<()> {
        for _ in 0..bit_periods {
            self.send_bit(sink, true)?;
        }
        Ok(())
    }

    /// Frame and send one raw 5-bit code.
    pub fn send_code(&mut self, sink: &mut dyn AudioSink, code: u8) -> Result<()> {
        self.send_bit(sink, false)?; // Start bit (space)
        for bit in 0..self.data_bits {
            self.send_bit(sink, code & (1 << bit) != 0)?;
        }
        self.send_bit(sink, true) // Stop bit (mark)
    }

    /// Encode and send one character, preceded by a shift code if the
    /// character lives in the other table. Unmapped characters are skipped.
    pub fn send_char(&mut self, sink: &mut dyn AudioSink, c: char) -> Result<()> {
        let Some((code, shift)) = baudot::encode(c) else {
            log::debug!("skipping unmapped character {:?}", c);
            return Ok(());
        };

        if shift != self.shift {
            self.shift = shift;
            self.send_code(sink, shift.code())?;
        }

        self.send_code(sink, code)
    }

    /// Send every character of `text` in order.
    pub fn send_str(&mut self, sink: &mut dyn AudioSink, text: &str) -> Result<()> {
        for c in text.chars() {
            self.send_char(sink, c)?;
        }
        Ok(())
    }
}
