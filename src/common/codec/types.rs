use std::cmp::Ordering;

use crate::common::metadata::Version;

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
    Kanji = 0b1000,
    Eci = 0b0111,
    Terminator = 0b0000,
}

// Only the three encodable modes are ordered, from most to least compact
impl PartialOrd for Mode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (*self, *other) {
            (a, b) if a == b => Some(Ordering::Equal),
            (Self::Numeric, Self::Alphanumeric | Self::Byte) | (Self::Alphanumeric, Self::Byte) => {
                Some(Ordering::Less)
            }
            (Self::Alphanumeric | Self::Byte, Self::Numeric) | (Self::Byte, Self::Alphanumeric) => {
                Some(Ordering::Greater)
            }
            _ => None,
        }
    }
}

impl Mode {
    pub fn from_indicator(bits: u16) -> Option<Self> {
        match bits {
            0b0000 => Some(Self::Terminator),
            0b0001 => Some(Self::Numeric),
            0b0010 => Some(Self::Alphanumeric),
            0b0100 => Some(Self::Byte),
            0b0111 => Some(Self::Eci),
            0b1000 => Some(Self::Kanji),
            _ => None,
        }
    }

    #[inline]
    fn numeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Numeric.contains(char), "Invalid numeric data: {char}");
        (char - b'0') as u16
    }

    #[inline]
    fn alphanumeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Alphanumeric.contains(char), "Invalid alphanumeric data: {char}");
        ALPHANUMERIC_CHARSET.iter().position(|&c| c == char).unwrap_or(0) as u16
    }

    pub fn contains(&self, byte: u8) -> bool {
        match self {
            Self::Numeric => byte.is_ascii_digit(),
            Self::Alphanumeric => ALPHANUMERIC_CHARSET.contains(&byte),
            Self::Byte => true,
            Self::Kanji | Self::Eci | Self::Terminator => false,
        }
    }

    pub fn encode_chunk(&self, data: &[u8]) -> u16 {
        let len = data.len();
        match self {
            Self::Numeric => {
                debug_assert!(len <= 3, "Data is too long for numeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 10 + Self::numeric_digit(*b))
            }
            Self::Alphanumeric => {
                debug_assert!(len <= 2, "Data is too long for alphanumeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 45 + Self::alphanumeric_digit(*b))
            }
            Self::Byte => {
                debug_assert!(len == 1, "Data is too long for byte conversion: {len}");
                data[0] as u16
            }
            Self::Kanji | Self::Eci | Self::Terminator => {
                unreachable!("Cannot encode chunk in {self:?} mode")
            }
        }
    }

    // Returns None when a chunk decodes to a value outside the mode's alphabet
    pub fn decode_chunk(&self, data: u16, bit_len: usize) -> Option<Vec<u8>> {
        match self {
            Self::Numeric => {
                let len = bit_len / 3;
                if data >= 10u16.pow(len as u32) {
                    return None;
                }
                let mut res = vec![0; len];
                let mut data = data;
                for r in res.iter_mut().rev() {
                    *r = b'0' + (data % 10) as u8;
                    data /= 10;
                }
                Some(res)
            }
            Self::Alphanumeric => {
                let len = bit_len / 5;
                if data >= 45u16.pow(len as u32) {
                    return None;
                }
                let mut res = vec![0; len];
                let mut data = data;
                for r in res.iter_mut().rev() {
                    *r = ALPHANUMERIC_CHARSET[(data % 45) as usize];
                    data /= 45;
                }
                Some(res)
            }
            Self::Byte => Some(vec![data as u8]),
            Self::Kanji => {
                let temp = ((data / 0xc0) << 8 | (data % 0xc0)) + 0x8140;
                let sjis = if temp <= 0x9ffc { temp } else { temp + 0x4000 };
                Some(vec![(sjis >> 8) as u8, (sjis & 0xff) as u8])
            }
            Self::Eci | Self::Terminator => None,
        }
    }

    pub fn encoded_len(&self, len: usize) -> usize {
        match *self {
            Self::Numeric => (len * 10).div_ceil(3),
            Self::Alphanumeric => (len * 11).div_ceil(2),
            Self::Byte => len * 8,
            Self::Kanji => len * 13,
            Self::Eci | Self::Terminator => 0,
        }
    }
}


// Segment
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub mode: Mode,
    pub len_bits: usize, // Bit len of char count
    pub data: &'a [u8],
}

impl<'a> Segment<'a> {
    pub fn new(mode: Mode, ver: Version, data: &'a [u8]) -> Self {
        Self { mode, len_bits: ver.char_cnt_bits(mode), data }
    }

    pub fn bit_len(&self) -> usize {
        4 + self.len_bits + self.mode.encoded_len(self.data.len())
    }

    pub fn max_chars(&self) -> usize {
        (1 << self.len_bits) - 1
    }
}

#[cfg(test)]
mod segment_tests {
    use test_case::test_case;

    use super::{Mode, Segment};
    use crate::common::metadata::Version;

    #[test_case(1, Mode::Numeric, "123", 24)]
    #[test_case(1, Mode::Numeric, "45", 21)]
    #[test_case(10, Mode::Numeric, "6", 20)]
    #[test_case(27, Mode::Numeric, "123", 28)]
    #[test_case(1, Mode::Alphanumeric, "AZ", 24)]
    #[test_case(10, Mode::Alphanumeric, "-", 21)]
    #[test_case(27, Mode::Alphanumeric, "AZ", 28)]
    #[test_case(1, Mode::Byte, "a", 20)]
    #[test_case(10, Mode::Byte, "ab", 36)]
    #[test_case(27, Mode::Byte, "abc", 44)]
    fn test_bit_len(ver: usize, mode: Mode, data: &str, exp: usize) {
        let ver = Version::new(ver).unwrap();
        let seg = Segment::new(mode, ver, data.as_bytes());
        assert_eq!(seg.bit_len(), exp);
    }
}

// Global constants
//------------------------------------------------------------------------------

pub static PADDING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];

pub static MODES: [Mode; 3] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte];

pub static ALPHANUMERIC_CHARSET: [u8; 45] = *b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";
