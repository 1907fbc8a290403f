use crate::baudot::{self, Decoded, Shift};
use crate::config::{DetectorConfig, LineConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Line idle (mark); watching for a space-direction start bit
    AwaitingStart,
    /// Inside a frame; sampling bits at mid-bit intervals
    Framing,
}

/// Bit-timing state machine turning the NRZ stream into characters.
///
/// On a qualifying start-bit edge the bit timer is armed at 1.5 bit
/// periods so every later expiry lands mid-bit. Bits 0..4 fill the code
/// word LSB-first; slot 5 is the stop bit. A mark stop bit hands the word
/// to the Baudot decoder, anything else discards the frame. Both paths
/// resynchronize by returning to `AwaitingStart`.
///
/// The letters/figures shift mode is persistent across frames and is the
/// only state `reset` keeps.
pub struct Demodulator {
    phase: Phase,
    shift: Shift,
    samples_per_bit: usize,
    data_bits: u32,
    start_threshold: f64,
    bit_timer: usize,
    bit_index: u32,
    word: u8,
}

impl Demodulator {
    pub fn new(line: &LineConfig, detector: &DetectorConfig, sample_rate: u32) -> Self {
        Self {
            phase: Phase::AwaitingStart,
            shift: Shift::Letters,
            samples_per_bit: line.samples_per_bit(sample_rate),
            data_bits: line.bits_per_char,
            start_threshold: detector.start_threshold,
            bit_timer: 0,
            bit_index: 0,
            word: 0,
        }
    }

    /// Abandon any partial frame and go back to watching for a start bit.
    ///
    /// Called whenever reception is suppressed, so no partial frame can
    /// survive a transmit/receive transition.
    pub fn reset(&mut self) {
        self.phase = Phase::AwaitingStart;
    }

    /// Feed one NRZ sample; returns a character when a frame completes.
    ///
    /// Start-bit policy: the NRZ magnitude must exceed the noise threshold
    /// and the sign must be in the space direction. Plain noise below the
    /// threshold never starts a frame.
    pub fn process(&mut self, nrz: f64) -> Option<char> {
        let is_mark = nrz > 0.0;

        match self.phase {
            Phase::AwaitingStart => {
                if nrz.abs() > self.start_threshold && !is_mark {
                    self.phase = Phase::Framing;
                    self.bit_timer = self.samples_per_bit * 3 / 2;
                    self.bit_index = 0;
                    self.word = 0;
                }
                None
            }
            Phase::Framing => {
                self.bit_timer -= 1;
                if self.bit_timer > 0 {
                    return None;
                }
                self.bit_timer = self.samples_per_bit;

                if self.bit_index == self.data_bits {
                    // Stop-bit slot
                    self.phase = Phase::AwaitingStart;
                    if is_mark {
                        self.decode_word()
                    } else {
                        log::debug!("framing error, discarding word {:#07b}", self.word);
                        None
                    }
                } else {
                    if is_mark {
                        self.word |= 1 << self.bit_index;
                    }
                    self.bit_index += 1;
                    None
                }
            }
        }
    }

    fn decode_word(&mut self) -> Option<char> {
        match baudot::decode(self.word, self.shift) {
            Decoded::Shift(shift) => {
                self.shift = shift;
                None
            }
            Decoded::Char(c) => Some(c),
        }
    }
}
