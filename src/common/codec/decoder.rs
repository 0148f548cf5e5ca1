pub use decode::*;

// Decoded payload
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub text: String,
    /// Segment content before character decoding.
    pub bytes: Vec<u8>,
    pub structured_append: Option<super::StructuredAppend>,
    pub fnc1: Option<super::Fnc1>,
}

// Reader for encoded data
//------------------------------------------------------------------------------

mod reader {
    use std::cmp::min;

    use encoding_rs::{Encoding, GB18030, SHIFT_JIS, WINDOWS_1252};
    use num_traits::PrimInt;

    use super::Payload;
    use crate::common::bit_utils::BitStream;
    use crate::common::codec::{eci_encoding, Fnc1, Mode, StructuredAppend};
    use crate::common::error::{QRError, QRResult};
    use crate::common::metadata::Version;

    const GS: char = '\u{1D}';
    const GB2312_SUBSET: u8 = 1;

    /// Reads one segment into `out`. Returns false once the terminator is
    /// reached or fewer than 4 bits remain.
    pub fn write_segment(
        inp: &mut BitStream,
        ver: Version,
        eci: &mut Option<&'static Encoding>,
        out: &mut Payload,
    ) -> QRResult<bool> {
        let mode = take_mode(inp)?;

        match mode {
            Mode::Terminator => return Ok(false),
            Mode::Eci => {
                let designator = take_eci_designator(inp)?;
                *eci = Some(eci_encoding(designator).ok_or(QRError::MalformedSegment)?);
            }
            Mode::StructuredAppend => {
                let header = take(inp, 16)?;
                out.structured_append = Some(StructuredAppend::from_bits(header));
            }
            Mode::Fnc1First => out.fnc1 = Some(Fnc1::First),
            Mode::Fnc1Second => out.fnc1 = Some(Fnc1::Second(take(inp, 8)?)),
            Mode::Numeric => {
                let char_cnt = take_char_cnt(inp, ver, mode)?;
                write_numeric(inp, char_cnt, out)?;
            }
            Mode::Alphanumeric => {
                let char_cnt = take_char_cnt(inp, ver, mode)?;
                write_alphanumeric(inp, char_cnt, out)?;
            }
            Mode::Byte => {
                let char_cnt = take_char_cnt(inp, ver, mode)?;
                write_byte(inp, char_cnt, *eci, out)?;
            }
            Mode::Kanji => {
                let char_cnt = take_char_cnt(inp, ver, mode)?;
                write_double_byte(inp, mode, char_cnt, SHIFT_JIS, out)?;
            }
            Mode::Hanzi => {
                let subset: u8 = take(inp, 4)?;
                if subset != GB2312_SUBSET {
                    return Err(QRError::MalformedSegment);
                }
                let char_cnt = take_char_cnt(inp, ver, mode)?;
                write_double_byte(inp, mode, char_cnt, GB18030, out)?;
            }
        }

        Ok(true)
    }

    fn take<T: PrimInt>(inp: &mut BitStream, n: usize) -> QRResult<T> {
        inp.take_bits(n).ok_or(QRError::MalformedSegment)
    }

    fn take_mode(inp: &mut BitStream) -> QRResult<Mode> {
        if inp.remaining() < 4 {
            return Ok(Mode::Terminator);
        }
        let bits: u8 = take(inp, 4)?;
        Mode::from_bits(bits).ok_or(QRError::MalformedSegment)
    }

    fn take_char_cnt(inp: &mut BitStream, ver: Version, mode: Mode) -> QRResult<usize> {
        take(inp, ver.char_cnt_bits(mode))
    }

    // 1, 2 or 3 bytes depending on the leading bits of the first
    fn take_eci_designator(inp: &mut BitStream) -> QRResult<u32> {
        let first: u32 = take(inp, 8)?;
        if first & 0x80 == 0 {
            Ok(first & 0x7F)
        } else if first & 0xC0 == 0x80 {
            let second: u32 = take(inp, 8)?;
            Ok(((first & 0x3F) << 8) | second)
        } else if first & 0xE0 == 0xC0 {
            let rest: u32 = take(inp, 16)?;
            Ok(((first & 0x1F) << 16) | rest)
        } else {
            Err(QRError::MalformedSegment)
        }
    }

    fn write_numeric(inp: &mut BitStream, mut char_cnt: usize, out: &mut Payload) -> QRResult<()> {
        while char_cnt > 0 {
            let bit_len = if char_cnt > 2 { 10 } else { (char_cnt % 3) * 3 + 1 };
            let chunk = take(inp, bit_len)?;
            let decoded = Mode::Numeric.decode_chunk(chunk, bit_len)?;
            out.text.extend(decoded.iter().map(|&b| b as char));
            out.bytes.extend(decoded);
            char_cnt -= min(3, char_cnt);
        }

        Ok(())
    }

    fn write_alphanumeric(
        inp: &mut BitStream,
        mut char_cnt: usize,
        out: &mut Payload,
    ) -> QRResult<()> {
        let mut decoded = Vec::with_capacity(char_cnt);
        while char_cnt > 0 {
            let bit_len = if char_cnt > 1 { 11 } else { 6 };
            let chunk = take(inp, bit_len)?;
            decoded.extend(Mode::Alphanumeric.decode_chunk(chunk, bit_len)?);
            char_cnt -= min(2, char_cnt);
        }

        // In GS1 data "%" stands for the group separator and "%%" for "%"
        if out.fnc1.is_some() {
            let mut it = decoded.iter().peekable();
            while let Some(&b) = it.next() {
                match b {
                    b'%' if it.peek() == Some(&&b'%') => {
                        it.next();
                        out.text.push('%');
                    }
                    b'%' => out.text.push(GS),
                    _ => out.text.push(b as char),
                }
            }
        } else {
            out.text.extend(decoded.iter().map(|&b| b as char));
        }
        out.bytes.extend(decoded);

        Ok(())
    }

    fn write_byte(
        inp: &mut BitStream,
        char_cnt: usize,
        eci: Option<&'static Encoding>,
        out: &mut Payload,
    ) -> QRResult<()> {
        if inp.remaining() < char_cnt * 8 {
            return Err(QRError::MalformedSegment);
        }
        let mut bytes: Vec<u8> = Vec::with_capacity(char_cnt);
        for _ in 0..char_cnt {
            bytes.push(take(inp, 8)?);
        }

        match eci {
            Some(enc) => {
                let text = enc
                    .decode_without_bom_handling_and_without_replacement(&bytes)
                    .ok_or(QRError::MalformedSegment)?;
                out.text.push_str(&text);
            }
            None => match std::str::from_utf8(&bytes) {
                Ok(utf8) => out.text.push_str(utf8),
                Err(_) => {
                    let sjis = SHIFT_JIS.decode_without_bom_handling_and_without_replacement(&bytes);
                    match sjis {
                        Some(sjis) => out.text.push_str(&sjis),
                        None => {
                            let (latin1, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
                            out.text.push_str(&latin1);
                        }
                    }
                }
            },
        }
        out.bytes.extend(bytes);

        Ok(())
    }

    // Kanji and Hanzi: 13 bits per character
    fn write_double_byte(
        inp: &mut BitStream,
        mode: Mode,
        char_cnt: usize,
        enc: &'static Encoding,
        out: &mut Payload,
    ) -> QRResult<()> {
        if inp.remaining() < char_cnt * 13 {
            return Err(QRError::MalformedSegment);
        }
        let mut bytes = Vec::with_capacity(char_cnt * 2);
        for _ in 0..char_cnt {
            let chunk = take(inp, 13)?;
            bytes.extend(mode.decode_chunk(chunk, 13)?);
        }

        let text = enc
            .decode_without_bom_handling_and_without_replacement(&bytes)
            .ok_or(QRError::MalformedSegment)?;
        out.text.push_str(&text);
        out.bytes.extend(bytes);

        Ok(())
    }
}

// Decoder
//------------------------------------------------------------------------------

pub mod decode {
    use tracing::trace;

    use super::reader::write_segment;
    use super::Payload;
    use crate::common::bit_utils::BitStream;
    use crate::common::error::QRResult;
    use crate::common::metadata::Version;

    /// Parses the corrected data codewords of a symbol into its payload.
    pub fn decode(encoded: &mut BitStream, ver: Version) -> QRResult<Payload> {
        let mut res = Payload::default();
        let mut eci = None;
        let mut seg_cnt = 0;
        while write_segment(encoded, ver, &mut eci, &mut res)? {
            seg_cnt += 1;
        }
        trace!("Parsed {seg_cnt} segments, {} bytes", res.bytes.len());
        Ok(res)
    }

}
