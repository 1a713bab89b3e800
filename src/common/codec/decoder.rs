use std::cmp::min;

use encoding_rs::{SHIFT_JIS, WINDOWS_1252};

use super::types::Mode;
use crate::common::{
    bitstream::BitStream,
    error::{QRError, QRResult},
    metadata::Version,
};

// ECI designators with a dedicated charset
const ECI_ISO_8859_1: u32 = 3;
const ECI_SHIFT_JIS: u32 = 20;
const ECI_UTF8: u32 = 26;

// Decoder
//------------------------------------------------------------------------------

// Byte segments are buffered until a segment of another mode (or the end of the stream) is
// reached, since a multi-byte character can straddle two byte segments.
pub fn decode(inp: &mut BitStream, ver: Version) -> QRResult<String> {
    let mut out = String::with_capacity(inp.remaining() >> 3);
    let mut bytes = Vec::new();
    let mut eci = None;

    // Fewer than 4 bits left means the terminator was truncated at capacity
    while inp.remaining() >= 4 {
        let (mode, char_cnt) = take_header(inp, ver)?;
        if mode != Mode::Byte {
            flush_bytes(&mut bytes, eci, &mut out)?;
        }
        match mode {
            Mode::Terminator => break,
            Mode::Eci => eci = Some(take_eci_designator(inp)?),
            Mode::Numeric => write_numeric(inp, char_cnt, &mut out)?,
            Mode::Alphanumeric => write_alphanumeric(inp, char_cnt, &mut out)?,
            Mode::Byte => take_bytes(inp, char_cnt, &mut bytes)?,
            Mode::Kanji => write_kanji(inp, char_cnt, &mut out)?,
        }
    }
    flush_bytes(&mut bytes, eci, &mut out)?;

    Ok(out)
}

fn take_header(inp: &mut BitStream, ver: Version) -> QRResult<(Mode, usize)> {
    let mode_bits = inp.take_bits(4).ok_or(QRError::CorruptDataSegment)?;
    let mode = Mode::from_indicator(mode_bits).ok_or(QRError::InvalidMode(mode_bits as u8))?;

    let len_bits = ver.char_cnt_bits(mode);
    let char_cnt = inp.take_bits(len_bits).ok_or(QRError::CorruptDataSegment)?;

    Ok((mode, char_cnt.into()))
}

fn take_eci_designator(inp: &mut BitStream) -> QRResult<u32> {
    let mut take = |n| inp.take_bits(n).map(u32::from).ok_or(QRError::CorruptDataSegment);
    let first = take(8)?;
    match first {
        _ if first & 0x80 == 0 => Ok(first),
        _ if first & 0xc0 == 0x80 => Ok((first & 0x3f) << 8 | take(8)?),
        _ if first & 0xe0 == 0xc0 => Ok((first & 0x1f) << 16 | take(16)?),
        _ => Err(QRError::CorruptDataSegment),
    }
}

fn write_numeric(inp: &mut BitStream, mut char_cnt: usize, out: &mut String) -> QRResult<()> {
    while char_cnt > 0 {
        let bit_len = if char_cnt > 2 { 10 } else { char_cnt * 3 + 1 };
        let chunk = inp.take_bits(bit_len).ok_or(QRError::CorruptDataSegment)?;
        let decoded =
            Mode::Numeric.decode_chunk(chunk, bit_len).ok_or(QRError::CorruptDataSegment)?;
        out.extend(decoded.into_iter().map(char::from));
        char_cnt -= min(3, char_cnt);
    }

    Ok(())
}

fn write_alphanumeric(inp: &mut BitStream, mut char_cnt: usize, out: &mut String) -> QRResult<()> {
    while char_cnt > 0 {
        let bit_len = if char_cnt > 1 { 11 } else { 6 };
        let chunk = inp.take_bits(bit_len).ok_or(QRError::CorruptDataSegment)?;
        let decoded =
            Mode::Alphanumeric.decode_chunk(chunk, bit_len).ok_or(QRError::CorruptDataSegment)?;
        out.extend(decoded.into_iter().map(char::from));
        char_cnt -= min(2, char_cnt);
    }

    Ok(())
}

fn take_bytes(inp: &mut BitStream, char_cnt: usize, bytes: &mut Vec<u8>) -> QRResult<()> {
    bytes.reserve(char_cnt);
    for _ in 0..char_cnt {
        let chunk = inp.take_bits(8).ok_or(QRError::CorruptDataSegment)?;
        bytes.push(chunk as u8);
    }

    Ok(())
}

fn write_kanji(inp: &mut BitStream, char_cnt: usize, out: &mut String) -> QRResult<()> {
    let mut sjis = Vec::with_capacity(char_cnt * 2);
    for _ in 0..char_cnt {
        let chunk = inp.take_bits(13).ok_or(QRError::CorruptDataSegment)?;
        sjis.extend(Mode::Kanji.decode_chunk(chunk, 13).ok_or(QRError::CorruptDataSegment)?);
    }

    let (decoded, _, has_err) = SHIFT_JIS.decode(&sjis);
    if has_err {
        return Err(QRError::CorruptDataSegment);
    }
    out.push_str(&decoded);

    Ok(())
}

// Without an ECI designator the bytes are tried as UTF-8, then Shift JIS, then ISO-8859-1,
// which accepts any input
fn flush_bytes(bytes: &mut Vec<u8>, eci: Option<u32>, out: &mut String) -> QRResult<()> {
    if bytes.is_empty() {
        return Ok(());
    }

    match eci {
        Some(ECI_UTF8) => {
            let utf8 = std::str::from_utf8(bytes).map_err(|_| QRError::InvalidCharacterEncoding)?;
            out.push_str(utf8);
        }
        Some(ECI_SHIFT_JIS) => {
            let (decoded, _, has_err) = SHIFT_JIS.decode(bytes);
            if has_err {
                return Err(QRError::InvalidCharacterEncoding);
            }
            out.push_str(&decoded);
        }
        Some(ECI_ISO_8859_1) => out.push_str(&WINDOWS_1252.decode(bytes).0),
        _ => match std::str::from_utf8(bytes) {
            Ok(utf8) => out.push_str(utf8),
            Err(_) => {
                let (kanji, _, has_err) = SHIFT_JIS.decode(bytes);
                if has_err {
                    out.push_str(&WINDOWS_1252.decode(bytes).0);
                } else {
                    out.push_str(&kanji);
                }
            }
        },
    }
    bytes.clear();

    Ok(())
}

#[cfg(test)]
mod reader_tests {
    use super::{
        decode, take_bytes, take_header, write_alphanumeric, write_numeric, BitStream, Mode,
    };
    use crate::common::{
        codec::encoder::encode_with_version,
        error::QRError,
        metadata::{ECLevel, Version},
    };

    #[test]
    fn test_take_header_v1() {
        let data = [0b00011111, 0b11111100, 0b10111111, 0b11101001, 0b11111110];
        let ver = Version::new(1).unwrap();
        let mut bs = BitStream::from(&data[..]);
        assert_eq!(take_header(&mut bs, ver).unwrap(), (Mode::Numeric, 0b11_1111_1111));
        assert_eq!(take_header(&mut bs, ver).unwrap(), (Mode::Alphanumeric, 0b1_1111_1111));
        assert_eq!(take_header(&mut bs, ver).unwrap(), (Mode::Byte, 0b1111_1111));
    }

    #[test]
    fn test_take_header_v10() {
        let data =
            [0b00011111, 0b11111111, 0b00101111, 0b11111110, 0b10011111, 0b11111111, 0b11100000];
        let ver = Version::new(10).unwrap();
        let mut bs = BitStream::from(&data[..]);
        assert_eq!(take_header(&mut bs, ver).unwrap(), (Mode::Numeric, 0b1111_1111_1111));
        assert_eq!(take_header(&mut bs, ver).unwrap(), (Mode::Alphanumeric, 0b111_1111_1111));
        assert_eq!(take_header(&mut bs, ver).unwrap(), (Mode::Byte, 0xffff));
    }

    #[test]
    fn test_take_header_invalid_mode() {
        let data = [0b0011_0000, 0];
        let ver = Version::new(1).unwrap();
        let mut bs = BitStream::from(&data[..]);
        assert!(matches!(take_header(&mut bs, ver), Err(QRError::InvalidMode(0b0011))));
    }

    #[test]
    fn test_write_numeric() {
        let ver = Version::new(1).unwrap();
        let mut bs = encode_with_version(b"12345", ver, ECLevel::L).unwrap();
        let mut out = String::new();
        take_header(&mut bs, ver).unwrap();
        write_numeric(&mut bs, 3, &mut out).unwrap();
        assert_eq!(out, "123");
        out.clear();
        write_numeric(&mut bs, 2, &mut out).unwrap();
        assert_eq!(out, "45");
    }

    #[test]
    fn test_write_alphanumeric() {
        let ver = Version::new(1).unwrap();
        let mut bs = encode_with_version(b"AC-", ver, ECLevel::L).unwrap();
        let mut out = String::new();
        take_header(&mut bs, ver).unwrap();
        write_alphanumeric(&mut bs, 2, &mut out).unwrap();
        assert_eq!(out, "AC");
        out.clear();
        write_alphanumeric(&mut bs, 1, &mut out).unwrap();
        assert_eq!(out, "-");
    }

    #[test]
    fn test_take_bytes_out_of_data() {
        let data = [0x61];
        let mut bs = BitStream::from(&data[..]);
        let mut bytes = vec![];
        assert!(matches!(take_bytes(&mut bs, 2, &mut bytes), Err(QRError::CorruptDataSegment)));
    }

    #[test]
    fn test_decode_mixed_segments() {
        let data = "abcABCDEF1234567890123ABCDEFabc";
        let ver = Version::new(2).unwrap();
        let mut bs = encode_with_version(data.as_bytes(), ver, ECLevel::L).unwrap();
        assert_eq!(decode(&mut bs, ver).unwrap(), data);
    }

    #[test]
    fn test_decode_multiline_utf8() {
        let data = "Name: Zoë\nPhone: +91 98765 43210\n₹ 250";
        let ver = Version::new(5).unwrap();
        let mut bs = encode_with_version(data.as_bytes(), ver, ECLevel::H).unwrap();
        assert_eq!(decode(&mut bs, ver).unwrap(), data);
    }

    #[test]
    fn test_decode_utf8_split_across_segments() {
        let ver = Version::new(1).unwrap();
        let mut bs = BitStream::new(ver.data_bit_capacity(ECLevel::L));
        for b in [0xc3u8, 0xa9] {
            bs.push_bits(0b0100u8, 4);
            bs.push_bits(1u8, 8);
            bs.push_bits(b, 8);
        }
        bs.push_bits(0u8, 4);
        assert_eq!(decode(&mut bs, ver).unwrap(), "é");
    }

    #[test]
    fn test_decode_eci_utf8() {
        let ver = Version::new(1).unwrap();
        let mut bs = BitStream::new(ver.data_bit_capacity(ECLevel::L));
        bs.push_bits(0b0111u8, 4);
        bs.push_bits(26u8, 8);
        bs.push_bits(0b0100u8, 4);
        bs.push_bits(2u8, 8);
        bs.extend("é".as_bytes());
        bs.push_bits(0u8, 4);
        assert_eq!(decode(&mut bs, ver).unwrap(), "é");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        let ver = Version::new(1).unwrap();
        let mut bs = BitStream::new(ver.data_bit_capacity(ECLevel::L));
        bs.push_bits(0b0100u8, 4);
        bs.push_bits(1u8, 8);
        bs.push_bits(0xe9u8, 8);
        bs.push_bits(0u8, 4);
        assert_eq!(decode(&mut bs, ver).unwrap(), "é");
    }

    #[test]
    fn test_decode_kanji() {
        let ver = Version::new(1).unwrap();
        let mut bs = BitStream::new(ver.data_bit_capacity(ECLevel::L));
        bs.push_bits(0b1000u8, 4);
        bs.push_bits(1u8, 8);
        bs.push_bits(0x0d9fu16, 13);
        bs.push_bits(0u8, 4);
        assert_eq!(decode(&mut bs, ver).unwrap(), "点");
    }

    #[test]
    fn test_decode_full_capacity_without_terminator() {
        let ver = Version::new(1).unwrap();
        let data = "1".repeat(41);
        let mut bs = encode_with_version(data.as_bytes(), ver, ECLevel::L).unwrap();
        assert_eq!(decode(&mut bs, ver).unwrap(), data);
    }
}
