use std::mem::swap;

use tracing::trace;

use super::types::{Mode, Segment, MODES, PADDING_CODEWORDS};
use crate::common::{
    bitstream::BitStream,
    error::{QRError, QRResult},
    metadata::{ECLevel, Version},
};

// Encoder
//------------------------------------------------------------------------------

pub fn encode(data: &[u8], ecl: ECLevel) -> QRResult<(BitStream, Version)> {
    let (ver, segs) = find_optimal_version_and_segments(data, ecl)?;
    Ok((write_segments(&segs, ver, ecl), ver))
}

pub fn encode_with_version(data: &[u8], ver: Version, ecl: ECLevel) -> QRResult<BitStream> {
    let bcap = ver.data_bit_capacity(ecl);
    let segs = compute_optimal_segments(data, ver);
    let sz: usize = segs.iter().map(Segment::bit_len).sum();
    if sz > bcap {
        return Err(QRError::EncodingTooLarge { len: data.len(), capacity: bcap >> 3 });
    }
    Ok(write_segments(&segs, ver, ecl))
}

fn write_segments(segs: &[Segment], ver: Version, ecl: ECLevel) -> BitStream {
    let mut bs = BitStream::new(ver.data_bit_capacity(ecl));
    for seg in segs {
        push_segment(seg, &mut bs);
    }
    push_terminator(&mut bs);
    pad_remaining_capacity(&mut bs);
    bs
}

fn find_optimal_version_and_segments(
    data: &[u8],
    ecl: ECLevel,
) -> QRResult<(Version, Vec<Segment<'_>>)> {
    let mut segs = vec![];
    let mut sz = 0;
    for v in 1..=40 {
        let ver = Version::new_unchecked(v);
        let bcap = ver.data_bit_capacity(ecl);

        // Character count widths only change at these versions
        if v == 1 || v == 10 || v == 27 {
            segs = compute_optimal_segments(data, ver);
            sz = segs.iter().map(Segment::bit_len).sum();
            trace!(version = v, bits = sz, segments = segs.len(), "Segmented payload");
        }
        if sz <= bcap {
            return Ok((ver, segs));
        }
    }

    let capacity = Version::new_unchecked(40).data_codewords(ecl);
    Err(QRError::EncodingTooLarge { len: data.len(), capacity })
}

// Dynamic programming over characters. Costs are kept in sixths of a bit so that the fractional
// per-character cost of numeric (10/3) and alphanumeric (11/2) modes stays integral.
fn compute_optimal_segments(data: &[u8], ver: Version) -> Vec<Segment<'_>> {
    if data.is_empty() {
        return vec![Segment::new(Mode::Byte, ver, data)];
    }

    let len = data.len();
    let mut prev_cost = [0usize; 3];
    for (i, &m) in MODES.iter().enumerate() {
        prev_cost[i] = (4 + ver.char_cnt_bits(m)) * 6;
    }
    let mut cur_cost = [usize::MAX; 3];
    let mut min_path = vec![[0usize; 3]; len];

    for (i, &b) in data.iter().enumerate() {
        for (j, to_mode) in MODES.iter().enumerate() {
            if !to_mode.contains(b) {
                continue;
            }
            let char_cost = match to_mode {
                Mode::Numeric => 20,
                Mode::Alphanumeric => 33,
                _ => 48,
            };
            for (k, from_mode) in MODES.iter().enumerate() {
                if prev_cost[k] == usize::MAX {
                    continue;
                }
                let mut cost = if to_mode == from_mode {
                    prev_cost[k]
                } else {
                    prev_cost[k].div_ceil(6) * 6 + (4 + ver.char_cnt_bits(*to_mode)) * 6
                };
                cost += char_cost;
                if cost < cur_cost[j] {
                    cur_cost[j] = cost;
                    min_path[i][j] = k;
                }
            }
        }
        swap(&mut prev_cost, &mut cur_cost);
        cur_cost.fill(usize::MAX);
    }

    let char_modes = trace_optimal_modes(&min_path, &prev_cost);
    build_segments(ver, &char_modes, data)
}

// Backtrack min_path from the cheapest final mode
fn trace_optimal_modes(min_path: &[[usize; 3]], final_cost: &[usize; 3]) -> Vec<Mode> {
    let mut mi = (0..3).min_by_key(|&i| final_cost[i]).unwrap_or(2);
    let mut modes = vec![Mode::Byte; min_path.len()];
    for i in (0..min_path.len()).rev() {
        modes[i] = MODES[mi];
        mi = min_path[i][mi];
    }
    modes
}

// Group consecutive chars of the same mode, splitting runs the char count field can't hold
fn build_segments<'a>(ver: Version, char_modes: &[Mode], data: &'a [u8]) -> Vec<Segment<'a>> {
    let mut segs: Vec<Segment> = vec![];
    let mut seg_start = 0;
    for i in 1..=data.len() {
        if i == data.len() || char_modes[i] != char_modes[seg_start] {
            let mode = char_modes[seg_start];
            let max_chars = Segment::new(mode, ver, &[]).max_chars();
            for chunk in data[seg_start..i].chunks(max_chars) {
                segs.push(Segment::new(mode, ver, chunk));
            }
            seg_start = i;
        }
    }
    segs
}


// Writer for encoded data
//------------------------------------------------------------------------------

fn push_segment(seg: &Segment, out: &mut BitStream) {
    push_header(seg, out);
    match seg.mode {
        Mode::Numeric => {
            for chunk in seg.data.chunks(3) {
                out.push_bits(Mode::Numeric.encode_chunk(chunk), Mode::Numeric.encoded_len(chunk.len()));
            }
        }
        Mode::Alphanumeric => {
            for chunk in seg.data.chunks(2) {
                let len = Mode::Alphanumeric.encoded_len(chunk.len());
                out.push_bits(Mode::Alphanumeric.encode_chunk(chunk), len);
            }
        }
        _ => out.extend(seg.data),
    }
}

fn push_header(seg: &Segment, out: &mut BitStream) {
    out.push_bits(seg.mode as u8, 4);
    let char_cnt = seg.data.len();
    debug_assert!(
        char_cnt <= seg.max_chars(),
        "Char count exceeds bit length: Char count {char_cnt}, Char count bits {}",
        seg.len_bits
    );
    out.push_bits(char_cnt as u16, seg.len_bits);
}

fn push_terminator(out: &mut BitStream) {
    let term_len = std::cmp::min(4, out.capacity() - out.len());
    out.push_bits(0u8, term_len);
}

fn pad_remaining_capacity(out: &mut BitStream) {
    let offset = out.len() & 7;
    if offset > 0 {
        out.push_bits(0u8, 8 - offset);
    }

    let remain_bytes = (out.capacity() - out.len()) >> 3;
    for &pc in PADDING_CODEWORDS.iter().cycle().take(remain_bytes) {
        out.push_bits(pc, 8);
    }
}

#[cfg(test)]
mod writer_tests {
    use super::{pad_remaining_capacity, push_header, push_segment, push_terminator};
    use crate::common::{
        bitstream::BitStream,
        codec::types::{Mode, Segment, PADDING_CODEWORDS},
        metadata::{ECLevel, Version},
    };

    #[test]
    fn test_push_header_v1() {
        let ver = Version::new(1).unwrap();
        let exp_vecs: Vec<Vec<u8>> = vec![
            vec![0b00011111, 0b11111100],
            vec![0b00101111, 0b11111000],
            vec![0b01001111, 0b11110000],
        ];
        let dummy = vec![0; 1023];
        let modes = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte];
        let counts = [1023, 511, 255];
        for ((mode, cnt), exp) in modes.iter().zip(counts).zip(exp_vecs) {
            let mut bs = BitStream::new(ver.data_bit_capacity(ECLevel::L));
            push_header(&Segment::new(*mode, ver, &dummy[..cnt]), &mut bs);
            assert_eq!(bs.data(), exp);
        }
    }

    #[test]
    fn test_push_numeric_segment() {
        let ver = Version::new(1).unwrap();
        let mut bs = BitStream::new(ver.data_bit_capacity(ECLevel::L));
        push_segment(&Segment::new(Mode::Numeric, ver, b"01234567"), &mut bs);
        // 0001 0000001000 0000001100 0101011001 1000011
        assert_eq!(bs.len(), 41);
        assert_eq!(bs.data(), [0x10, 0x20, 0x0c, 0x56, 0x61, 0x80]);
    }

    #[test]
    fn test_push_alphanumeric_segment() {
        let ver = Version::new(1).unwrap();
        let mut bs = BitStream::new(ver.data_bit_capacity(ECLevel::L));
        push_segment(&Segment::new(Mode::Alphanumeric, ver, b"AC-42"), &mut bs);
        // 0010 000000101 00111001110 11100111001 000010
        assert_eq!(bs.len(), 41);
        assert_eq!(bs.data(), [0x20, 0x29, 0xce, 0xe7, 0x21, 0x00]);
    }

    #[test]
    fn test_terminator_and_padding() {
        let ver = Version::new(1).unwrap();
        let mut bs = BitStream::new(ver.data_bit_capacity(ECLevel::L));
        bs.push_bits(1u8, 1);
        push_terminator(&mut bs);
        assert_eq!(bs.len(), 5);
        pad_remaining_capacity(&mut bs);
        let mut exp = vec![0b1000_0000];
        exp.extend(PADDING_CODEWORDS.iter().cycle().take(18));
        assert_eq!(bs.data(), exp);
    }

    #[test]
    fn test_terminator_truncated_at_capacity() {
        let mut bs = BitStream::new(10);
        bs.push_bits(0xffu8, 8);
        push_terminator(&mut bs);
        assert_eq!(bs.len(), 10);
    }
}
