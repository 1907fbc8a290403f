//! Baudot / ITU-2 codebook.
//!
//! Two shiftable 32-entry tables (letters and figures) plus the reserved
//! shift codes. The character assignments are the ones real teleprinter
//! gear expects; do not edit them without a peer on the other end that
//! agrees.

/// Reserved code: switch the receiver to the figures table.
pub const FIGURES_SHIFT: u8 = 0x1b;
/// Reserved code: switch the receiver to the letters table.
pub const LETTERS_SHIFT: u8 = 0x1f;

/// Which of the two code tables is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Letters,
    Figures,
}

impl Shift {
    /// The reserved code that selects this table on the wire.
    pub fn code(self) -> u8 {
        match self {
            Shift::Letters => LETTERS_SHIFT,
            Shift::Figures => FIGURES_SHIFT,
        }
    }
}

/// Letters-shift table, indexed by 5-bit code.
const LTRS_TABLE: [char; 32] = [
    ' ', 'E', '\n', 'A', ' ', 'S', 'I', 'U', //
    '\r', 'D', 'R', 'J', 'N', 'F', 'C', 'K', //
    'T', 'Z', 'L', 'W', 'H', 'Y', 'P', 'Q', //
    'O', 'B', 'G', ' ', 'M', 'X', 'V', ' ',
];

/// Figures-shift table, indexed by 5-bit code.
const FIGS_TABLE: [char; 32] = [
    ' ', '3', '\n', '-', ' ', '-', '8', '7', //
    '\r', '$', '4', '\'', ',', '!', ':', '(', //
    '5', '"', ')', '2', '=', '6', '0', '1', //
    '9', '?', '+', ' ', '.', '/', ';', ' ',
];

/// Reverse map from a 7-bit character to its canonical 5-bit code.
///
/// -1 means no mapping (the character is skipped on send). Bit 0x80 marks a
/// figures-table entry; the low five bits are the code. Lowercase letters
/// share the uppercase codes. The forward tables are not injective, so this
/// table fixes one canonical code per character.
const ENCODE_TABLE: [i16; 128] = [
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, 130, -1, -1, 136, -1, -1, -1, //
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, 132, 141, //
    145, -1, 137, -1, -1, 139, 143, 146, -1, 154, 140, 133, 156, 157, 150, //
    151, 147, 129, 138, 144, 149, 135, 134, 152, 142, 158, -1, 148, -1, //
    153, -1, 3, 25, 14, 9, 1, 13, 26, 20, 6, 11, 15, 18, 28, 12, 24, 22, 23, //
    10, 5, 16, 7, 30, 19, 29, 21, 17, -1, -1, -1, -1, -1, -1, 3, 25, 14, 9, //
    1, 13, 26, 20, 6, 11, 15, 18, 28, 12, 24, 22, 23, 10, 5, 16, 7, 30, 19, //
    29, 21, 17, -1, -1, -1, -1, -1,
];

/// What a received 5-bit code means under the current shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A printable character (or CR/LF)
    Char(char),
    /// A table switch; nothing is emitted
    Shift(Shift),
}

/// Decode a received 5-bit code under the given shift mode.
///
/// Deterministic: the same (code, shift) pair always yields the same result.
pub fn decode(code: u8, shift: Shift) -> Decoded {
    match code {
        FIGURES_SHIFT => Decoded::Shift(Shift::Figures),
        LETTERS_SHIFT => Decoded::Shift(Shift::Letters),
        _ => {
            let table = match shift {
                Shift::Letters => &LTRS_TABLE,
                Shift::Figures => &FIGS_TABLE,
            };
            Decoded::Char(table[(code & 0x1f) as usize])
        }
    }
}

/// Look up the canonical code and table for an outbound character.
///
/// Returns `None` for characters with no Baudot mapping; senders skip those.
pub fn encode(c: char) -> Option<(u8, Shift)> {
    let index = c as usize;
    if index >= ENCODE_TABLE.len() {
        return None;
    }
    let entry = ENCODE_TABLE[index];
    if entry < 0 {
        return None;
    }
    let shift = if entry & 0x80 != 0 {
        Shift::Figures
    } else {
        Shift::Letters
    };
    Some(((entry & 0x1f) as u8, shift))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_letters() {
        assert_eq!(decode(5, Shift::Letters), Decoded::Char('S'));
        assert_eq!(decode(24, Shift::Letters), Decoded::Char('O'));
        assert_eq!(decode(1, Shift::Letters), Decoded::Char('E'));
    }

    #[test]
    fn test_decode_figures() {
        assert_eq!(decode(1, Shift::Figures), Decoded::Char('3'));
        assert_eq!(decode(22, Shift::Figures), Decoded::Char('0'));
    }

    #[test]
    fn test_decode_shift_codes_emit_nothing() {
        assert_eq!(decode(FIGURES_SHIFT, Shift::Letters), Decoded::Shift(Shift::Figures));
        assert_eq!(decode(FIGURES_SHIFT, Shift::Figures), Decoded::Shift(Shift::Figures));
        assert_eq!(decode(LETTERS_SHIFT, Shift::Figures), Decoded::Shift(Shift::Letters));
    }

    #[test]
    fn test_encode_letters_and_digits() {
        assert_eq!(encode('S'), Some((5, Shift::Letters)));
        assert_eq!(encode('s'), Some((5, Shift::Letters)));
        assert_eq!(encode('3'), Some((1, Shift::Figures)));
    }

    #[test]
    fn test_encode_unmapped() {
        assert_eq!(encode('@'), None);
        assert_eq!(encode('~'), None);
        assert_eq!(encode('\t'), None);
        assert_eq!(encode('é'), None);
    }

    #[test]
    fn test_round_trip_every_encodable_character() {
        for index in 0u8..128 {
            let c = index as char;
            if let Some((code, shift)) = encode(c) {
                // Shift codes never come out of encode()
                assert_ne!(code, FIGURES_SHIFT, "char {:?}", c);
                assert_ne!(code, LETTERS_SHIFT, "char {:?}", c);

                let expected = c.to_ascii_uppercase();
                assert_eq!(
                    decode(code, shift),
                    Decoded::Char(expected),
                    "round trip failed for {:?}",
                    c
                );
            }
        }
    }

    #[test]
    fn test_forward_tables_not_injective_but_decode_is_deterministic() {
        // Space decodes from several codes; decode of a fixed code is stable.
        assert_eq!(decode(0, Shift::Letters), Decoded::Char(' '));
        assert_eq!(decode(4, Shift::Letters), Decoded::Char(' '));
        for _ in 0..3 {
            assert_eq!(decode(4, Shift::Figures), Decoded::Char(' '));
        }
    }
}
