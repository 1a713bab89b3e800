use std::ops::Deref;

use super::metadata::Color;
use crate::builder::QR;

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid masking pattern");
        Self(pattern & 0b111)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

mod mask_functions {
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        let rc = r as i32 * c as i32;
        (rc & 1) + (rc % 3) == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        let rc = r as i32 * c as i32;
        ((rc & 1) + (rc % 3)) & 1 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        let rc = r as i32 * c as i32;
        (((r + c) as i32 & 1) + (rc % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_functions(self) -> fn(i16, i16) -> bool {
        match *self {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            _ => mask_functions::meadow,
        }
    }
}


// Mask selection
//------------------------------------------------------------------------------

pub fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let best_mask = (0..8)
        .map(MaskPattern::new)
        .min_by_key(|&m| {
            let mut qr = qr.clone();
            qr.apply_mask(m);
            compute_total_penalty(&qr)
        })
        .unwrap_or(MaskPattern(0));
    qr.apply_mask(best_mask);
    best_mask
}

pub fn compute_total_penalty(qr: &QR) -> u32 {
    let adj_pen = compute_adjacent_penalty(qr);
    let blk_pen = compute_block_penalty(qr);
    let fp_pen_h = compute_finder_pattern_penalty(qr, true);
    let fp_pen_v = compute_finder_pattern_penalty(qr, false);
    let bal_pen = compute_balance_penalty(qr);
    adj_pen + blk_pen + fp_pen_h + fp_pen_v + bal_pen
}

// Runs of 5 or more same colored modules in a row or column
fn compute_adjacent_penalty(qr: &QR) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    for i in 0..w {
        for is_hor in [true, false] {
            let mut last = None;
            let mut run = 0;
            for j in 0..w {
                let clr = if is_hor { *qr.get(i, j) } else { *qr.get(j, i) };
                if last == Some(clr) {
                    run += 1;
                } else {
                    pen += run_penalty(run);
                    last = Some(clr);
                    run = 1;
                }
            }
            pen += run_penalty(run);
        }
    }
    pen
}

fn run_penalty(run: u32) -> u32 {
    if run >= 5 {
        run - 2
    } else {
        0
    }
}

// 2x2 blocks of same colored modules
fn compute_block_penalty(qr: &QR) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    for r in 0..w - 1 {
        for c in 0..w - 1 {
            let clr = *qr.get(r, c);
            if clr == *qr.get(r + 1, c) && clr == *qr.get(r, c + 1) && clr == *qr.get(r + 1, c + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}

// 1:1:3:1:1 finder-like runs with 4 light modules on either side. Modules beyond the symbol
// count as light.
fn compute_finder_pattern_penalty(qr: &QR, is_hor: bool) -> u32 {
    static PATTERN: [Color; 7] = [
        Color::Dark,
        Color::Light,
        Color::Dark,
        Color::Dark,
        Color::Dark,
        Color::Light,
        Color::Dark,
    ];

    let mut pen = 0;
    let w = qr.width() as i16;
    for i in 0..w {
        let get = |j: i16| {
            if !(0..w).contains(&j) {
                Color::Light
            } else if is_hor {
                *qr.get(i, j)
            } else {
                *qr.get(j, i)
            }
        };
        for j in 0..w - 6 {
            if (j..j + 7).map(get).ne(PATTERN.iter().copied()) {
                continue;
            }
            if (j - 4..j).all(|k| get(k) == Color::Light) {
                pen += 40;
            }
            if (j + 7..j + 11).all(|k| get(k) == Color::Light) {
                pen += 40;
            }
        }
    }
    pen
}

// 10 points for every 5% the dark ratio strays from 50%
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark = qr.count_dark_modules() as i64;
    let w = qr.width() as i64;
    let tot = w * w;
    let k = (dark * 20 - tot * 10).abs() / tot;
    (k * 10) as u32
}
