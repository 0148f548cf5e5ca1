use encoding_rs::Encoding;

use crate::common::error::{QRError, QRResult};

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Mode {
    Terminator = 0b0000,
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    StructuredAppend = 0b0011,
    Byte = 0b0100,
    Fnc1First = 0b0101,
    Eci = 0b0111,
    Kanji = 0b1000,
    Fnc1Second = 0b1001,
    Hanzi = 0b1101,
}

impl Mode {
    pub fn from_bits(bits: u8) -> Option<Self> {
        let mode = match bits {
            0b0000 => Self::Terminator,
            0b0001 => Self::Numeric,
            0b0010 => Self::Alphanumeric,
            0b0011 => Self::StructuredAppend,
            0b0100 => Self::Byte,
            0b0101 => Self::Fnc1First,
            0b0111 => Self::Eci,
            0b1000 => Self::Kanji,
            0b1001 => Self::Fnc1Second,
            0b1101 => Self::Hanzi,
            _ => return None,
        };
        Some(mode)
    }

    #[inline]
    fn byte(&self, mode_digit: u8) -> u8 {
        match self {
            Self::Numeric => mode_digit + b'0',
            Self::Alphanumeric => ALPHANUMERIC_CHARSET[mode_digit as usize],
            _ => mode_digit,
        }
    }

    /// Expands one numeric (4, 7 or 10 bit) or alphanumeric (6 or 11 bit)
    /// chunk into characters. Values beyond the chunk's digit range are
    /// rejected.
    pub fn decode_chunk(&self, data: u16, bit_len: usize) -> QRResult<Vec<u8>> {
        match self {
            Self::Numeric => Self::decode_numeric_chunk(data, bit_len),
            Self::Alphanumeric => Self::decode_alphanumeric_chunk(data, bit_len),
            Self::Byte => Ok(vec![data as u8]),
            Self::Kanji => Ok(Self::decode_kanji_chunk(data).to_vec()),
            Self::Hanzi => Ok(Self::decode_hanzi_chunk(data).to_vec()),
            _ => Err(QRError::MalformedSegment),
        }
    }

    fn decode_numeric_chunk(mut data: u16, bit_len: usize) -> QRResult<Vec<u8>> {
        let (len, limit) = match bit_len {
            10 => (3, 1000),
            7 => (2, 100),
            4 => (1, 10),
            _ => return Err(QRError::MalformedSegment),
        };
        if data >= limit {
            return Err(QRError::MalformedSegment);
        }

        let mut res = vec![0; len];
        for i in 0..len {
            res[len - 1 - i] = Mode::Numeric.byte((data % 10) as u8);
            data /= 10;
        }
        Ok(res)
    }

    fn decode_alphanumeric_chunk(mut data: u16, bit_len: usize) -> QRResult<Vec<u8>> {
        let (len, limit) = match bit_len {
            11 => (2, 45 * 45),
            6 => (1, 45),
            _ => return Err(QRError::MalformedSegment),
        };
        if data >= limit {
            return Err(QRError::MalformedSegment);
        }

        let mut res = vec![0; len];
        for i in 0..len {
            res[len - 1 - i] = Mode::Alphanumeric.byte((data % 45) as u8);
            data /= 45;
        }
        Ok(res)
    }

    // 13 bit value to a Shift JIS double byte
    fn decode_kanji_chunk(data: u16) -> [u8; 2] {
        let msbyte = data / 0xC0;
        let lsbyte = data % 0xC0;
        let temp = ((msbyte << 8) | lsbyte) + 0x8140;
        let sjw = if temp <= 0x9FFC { temp } else { temp + 0x4000 };

        [(sjw >> 8) as u8, (sjw & 0xFF) as u8]
    }

    // 13 bit value to a GB2312 double byte
    fn decode_hanzi_chunk(data: u16) -> [u8; 2] {
        let assembled = ((data / 0x60) << 8) | (data % 0x60);
        let gb = if assembled < 0x0A00 { assembled + 0xA1A1 } else { assembled + 0xA6A1 };

        [(gb >> 8) as u8, (gb & 0xFF) as u8]
    }
}

pub static ALPHANUMERIC_CHARSET: [u8; 45] = *b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

#[cfg(test)]
mod mode_tests {
    use super::Mode::{self, *};
    use crate::common::error::QRError;

    #[test]
    fn test_from_bits() {
        assert_eq!(Mode::from_bits(0b0001), Some(Numeric));
        assert_eq!(Mode::from_bits(0b0111), Some(Eci));
        assert_eq!(Mode::from_bits(0b1101), Some(Hanzi));
        assert_eq!(Mode::from_bits(0b0110), None);
        assert_eq!(Mode::from_bits(0b1111), None);
    }

    #[test]
    fn test_numeric_decoding() {
        assert_eq!(Numeric.decode_chunk(0b0000001100, 10).unwrap(), b"012");
        assert_eq!(Numeric.decode_chunk(0b0101011001, 10).unwrap(), b"345");
        assert_eq!(Numeric.decode_chunk(0b1110000101, 10).unwrap(), b"901");
        assert_eq!(Numeric.decode_chunk(0b1000011, 7).unwrap(), b"67");
        assert_eq!(Numeric.decode_chunk(0b1000, 4).unwrap(), b"8");
    }

    #[test]
    fn test_numeric_out_of_range() {
        assert_eq!(Numeric.decode_chunk(1000, 10), Err(QRError::MalformedSegment));
        assert_eq!(Numeric.decode_chunk(100, 7), Err(QRError::MalformedSegment));
        assert_eq!(Numeric.decode_chunk(10, 4), Err(QRError::MalformedSegment));
    }

    #[test]
    fn test_alphanumeric_decoding() {
        assert_eq!(Alphanumeric.decode_chunk(0b00111001110, 11).unwrap(), b"AC");
        assert_eq!(Alphanumeric.decode_chunk(0b11100111001, 11).unwrap(), b"-4");
        assert_eq!(Alphanumeric.decode_chunk(0b000010, 6).unwrap(), b"2");
        assert_eq!(Alphanumeric.decode_chunk(44, 6).unwrap(), b":");
    }

    #[test]
    fn test_alphanumeric_out_of_range() {
        assert_eq!(Alphanumeric.decode_chunk(2025, 11), Err(QRError::MalformedSegment));
        assert_eq!(Alphanumeric.decode_chunk(45, 6), Err(QRError::MalformedSegment));
    }

    #[test]
    fn test_kanji_decoding() {
        // Examples from ISO/IEC 18004 8.4.5
        assert_eq!(Kanji.decode_chunk(0x0D9F, 13).unwrap(), [0x93, 0x5F]);
        assert_eq!(Kanji.decode_chunk(0x1AAA, 13).unwrap(), [0xE4, 0xAA]);
    }

    #[test]
    fn test_hanzi_decoding() {
        assert_eq!(Hanzi.decode_chunk(0, 13).unwrap(), [0xA1, 0xA1]);
        assert_eq!(Hanzi.decode_chunk(0x03C0, 13).unwrap(), [0xB0, 0xA1]);
    }
}

// Structured append & FNC1
//------------------------------------------------------------------------------

/// Header of a symbol that is one part of a multi-symbol message.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct StructuredAppend {
    /// Zero based position of this symbol.
    pub index: u8,
    /// Number of symbols in the message.
    pub total: u8,
    /// Parity of the complete message.
    pub parity: u8,
}

impl StructuredAppend {
    pub fn from_bits(bits: u16) -> Self {
        let seq = (bits >> 8) as u8;
        Self { index: seq >> 4, total: (seq & 0xF) + 1, parity: (bits & 0xFF) as u8 }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Fnc1 {
    /// GS1 formatted data.
    First,
    /// Industry application, with its application indicator.
    Second(u8),
}

// Extended channel interpretation
//------------------------------------------------------------------------------

/// Maps an ECI designator to a character set. Code page 437 has no
/// equivalent in `encoding_rs`, so its designators fall back to Windows-1252.
pub fn eci_encoding(designator: u32) -> Option<&'static Encoding> {
    let enc = match designator {
        0..=3 => encoding_rs::WINDOWS_1252,
        4 => encoding_rs::ISO_8859_2,
        5 => encoding_rs::ISO_8859_3,
        6 => encoding_rs::ISO_8859_4,
        7 => encoding_rs::ISO_8859_5,
        8 => encoding_rs::ISO_8859_6,
        9 => encoding_rs::ISO_8859_7,
        10 => encoding_rs::ISO_8859_8,
        11 => encoding_rs::WINDOWS_1254,
        12 => encoding_rs::ISO_8859_10,
        13 => encoding_rs::WINDOWS_874,
        15 => encoding_rs::ISO_8859_13,
        16 => encoding_rs::ISO_8859_14,
        17 => encoding_rs::ISO_8859_15,
        18 => encoding_rs::ISO_8859_16,
        20 => encoding_rs::SHIFT_JIS,
        21 => encoding_rs::WINDOWS_1250,
        22 => encoding_rs::WINDOWS_1251,
        23 | 27 | 170 => encoding_rs::WINDOWS_1252,
        24 => encoding_rs::WINDOWS_1256,
        25 => encoding_rs::UTF_16BE,
        26 => encoding_rs::UTF_8,
        28 => encoding_rs::BIG5,
        29 => encoding_rs::GB18030,
        30 => encoding_rs::EUC_KR,
        _ => return None,
    };
    Some(enc)
}

#[cfg(test)]
mod eci_tests {
    use super::{eci_encoding, StructuredAppend};

    #[test]
    fn test_eci_encoding() {
        assert_eq!(eci_encoding(26), Some(encoding_rs::UTF_8));
        assert_eq!(eci_encoding(20), Some(encoding_rs::SHIFT_JIS));
        assert_eq!(eci_encoding(7).map(|e| e.name()), Some("ISO-8859-5"));
        assert_eq!(eci_encoding(14), None);
        assert_eq!(eci_encoding(899), None);
    }

    #[test]
    fn test_structured_append() {
        let sa = StructuredAppend::from_bits(0x2545);
        assert_eq!(sa, StructuredAppend { index: 2, total: 6, parity: 0x45 });
    }
}
