use std::cmp::max;

use tracing::trace;

use super::{
    binarize::BinaryImage,
    finder::FinderGroup,
    utils::{
        accumulate::LeftmostToLine,
        geometry::{BresenhamLine, Line, Point, X, Y},
        homography::Homography,
    },
};
use crate::{
    builder::{Module, QR},
    common::{
        bitstream::BitStream,
        ec::rectify_info,
        error::{QRError, QRResult},
        iter::EncRegionIter,
        mask::MaskPattern,
        metadata::{
            parse_format_info, Color, ECLevel, Version, FORMAT_ERROR_CAPACITY, FORMAT_INFOS,
            FORMAT_INFO_COORDS_QR_MAIN, FORMAT_INFO_COORDS_QR_SIDE, VERSION_ERROR_CAPACITY,
            VERSION_INFOS, VERSION_INFO_COORDS_BL, VERSION_INFO_COORDS_TR,
        },
    },
};

// Locates symbol based on a group of 3 finders
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SymbolLocation {
    // Maps grid coordinates (column, row) onto the image
    pub h: Homography,
    pub ver: Version,
}

impl SymbolLocation {
    pub fn locate(img: &mut BinaryImage, group: &FinderGroup) -> Option<Self> {
        let [bl, tl, tr] = &group.finders;

        // Provisional version from the number of timing modules
        let tpep = [bl.h.map(6.5, 0.5).ok()?, tl.h.map(6.5, 6.5).ok()?, tr.h.map(0.5, 6.5).ok()?];
        let hscan = timing_scan(img, &tpep[1], &tpep[2])?;
        let vscan = timing_scan(img, &tpep[1], &tpep[0])?;
        let size = (max(hscan, vscan) * 2 + 13) as usize;
        let ver = Version::new(size.checked_sub(15)? / 4).ok()?;
        trace!(hscan, vscan, version = *ver, "Timing scan");

        // Top left corner of the bottom right alignment stone, where the top edge of the bottom
        // left finder meets the left edge of the top right finder
        let bl_top = Line::new(&bl.corners[0], &bl.corners[1]);
        let tr_left = Line::new(&tr.corners[0], &tr.corners[3]);
        let mut align = bl_top.intersection(&tr_left)?;

        if ver.width() > 21 {
            if let Some(id) = find_alignment_pattern(img, group, align) {
                let seed = Point::from(img.region(id).seed);
                align = img.walk_region(id, LeftmostToLine::new(seed, group.hyp)).best;
            }
        }

        let h = setup_homography(img, group, align, ver)?;
        let mut loc = Self { h, ver };

        // Version info overrides the timing estimate, refitting the grid to the new size
        if *ver >= 7 {
            if let Some(read_ver) = read_version_info(img, &loc.h, ver) {
                if read_ver != ver {
                    trace!(from = *ver, to = *read_ver, "Correcting version");
                    loc = Self { h: setup_homography(img, group, align, read_ver)?, ver: read_ver };
                }
            }
        }

        Some(loc)
    }
}

// Counts light runs of at least 2 pixels that end on a dark pixel. None if the line leaves the
// image.
fn timing_scan(img: &BinaryImage, from: &Point, to: &Point) -> Option<u32> {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    if dx > dy {
        count_timing_runs(img, BresenhamLine::<X>::new(from, to))
    } else {
        count_timing_runs(img, BresenhamLine::<Y>::new(from, to))
    }
}

fn count_timing_runs(img: &BinaryImage, line: impl Iterator<Item = Point>) -> Option<u32> {
    let mut run_len = 0;
    let mut count = 0;
    for pt in line {
        match img.color_at(&pt)? {
            Color::Dark => {
                if run_len >= 2 {
                    count += 1;
                }
                run_len = 0;
            }
            Color::Light => run_len += 1,
        }
    }
    Some(count)
}

// Spirals out of the estimated point looking for a dark region roughly the size of one module
fn find_alignment_pattern(img: &mut BinaryImage, group: &FinderGroup, est: Point) -> Option<usize> {
    let [bl, _, tr] = &group.finders;

    // Area of a module around the estimate, from the neighbouring cells in both finder grids
    let (u, v) = bl.h.unmap(&est);
    let a = bl.h.map(u, v + 1.0).ok()?;
    let (u, v) = tr.h.unmap(&est);
    let c = tr.h.map(u + 1.0, v).ok()?;
    let b = est;
    let mod_area = ((a.x - b.x) as i64 * -((c.y - b.y) as i64) + (a.y - b.y) as i64 * (c.x - b.x) as i64)
        .unsigned_abs();

    // x & y increments w.r.t direction
    const DX: [i32; 4] = [1, 0, -1, 0];
    const DY: [i32; 4] = [0, -1, 0, 1];

    let mut pt = est;
    let mut dir = 0;
    let mut run_len: u64 = 1;

    while run_len * run_len < mod_area * 100 {
        for _ in 0..run_len {
            if let Some(id) = img.region_at(&pt) {
                let area = img.region(id).area as u64;
                if mod_area / 2 <= area && area <= mod_area * 2 {
                    return Some(id);
                }
            }
            pt.x += DX[dir];
            pt.y += DY[dir];
        }

        // Cycle direction
        dir = (dir + 1) & 3;
        if dir & 1 == 0 {
            run_len += 1;
        }
    }

    None
}

fn setup_homography(
    img: &BinaryImage,
    group: &FinderGroup,
    align: Point,
    ver: Version,
) -> Option<Homography> {
    let [bl, tl, tr] = &group.finders;
    let rect = [tl.corners[0], tr.corners[0], align, bl.corners[0]];
    let size = (ver.width() - 7) as f64;
    let h = Homography::from_rect(&rect, size, size).ok()?;

    Some(jiggle_homography(img, h, ver))
}

// Adjust the homography slightly to refine viewport of qr
fn jiggle_homography(img: &BinaryImage, mut h: Homography, ver: Version) -> Homography {
    let mut best = symbol_fitness(img, &h, ver);

    // Create an adjustment matrix by scaling the homography
    let mut adjustments = h.0.map(|x| x * 0.02);

    for _pass in 0..5 {
        for i in 0..16 {
            let j = i >> 1;
            let old = h[j];
            let step = adjustments[j];

            h[j] = if i & 1 == 0 { old - step } else { old + step };

            let test = symbol_fitness(img, &h, ver);
            if test > best {
                best = test
            } else {
                h[j] = old
            }
        }

        // Halve all adjustment steps
        adjustments = adjustments.map(|x| x * 0.5);
    }
    h
}

// Fitness
// Scores how well the function patterns of the projected grid line up with the image. Every
// sample that agrees with the expected color adds one, every disagreeing sample subtracts one.
//------------------------------------------------------------------------------

fn symbol_fitness(img: &BinaryImage, h: &Homography, ver: Version) -> i32 {
    let mut score = 0;
    let w = ver.width() as i32;

    // Timing patterns are dark on even modules
    for i in 7..w - 7 {
        let expect = if i & 1 == 0 { 1 } else { -1 };
        score += cell_fitness(img, h, i, 6) * expect;
        score += cell_fitness(img, h, 6, i) * expect;
    }

    score += finder_fitness(img, h, 0, 0);
    score += finder_fitness(img, h, w - 7, 0);
    score += finder_fitness(img, h, 0, w - 7);

    let aps = ver.alignment_pattern();
    let len = aps.len();
    if len < 2 {
        return score;
    }

    for &i in aps[1..len - 1].iter() {
        score += alignment_fitness(img, h, 6, i as i32);
        score += alignment_fitness(img, h, i as i32, 6);
    }
    for &i in aps[1..].iter() {
        for &j in aps[1..].iter() {
            score += alignment_fitness(img, h, i as i32, j as i32);
        }
    }

    score
}

fn finder_fitness(img: &BinaryImage, h: &Homography, x: i32, y: i32) -> i32 {
    let (x, y) = (x + 3, y + 3);
    cell_fitness(img, h, x, y) + ring_fitness(img, h, x, y, 1) - ring_fitness(img, h, x, y, 2)
        + ring_fitness(img, h, x, y, 3)
}

fn alignment_fitness(img: &BinaryImage, h: &Homography, x: i32, y: i32) -> i32 {
    cell_fitness(img, h, x, y) - ring_fitness(img, h, x, y, 1) + ring_fitness(img, h, x, y, 2)
}

fn ring_fitness(img: &BinaryImage, h: &Homography, cx: i32, cy: i32, r: i32) -> i32 {
    let mut score = 0;

    for i in 0..r * 2 {
        score += cell_fitness(img, h, cx - r + i, cy - r);
        score += cell_fitness(img, h, cx - r, cy + r - i);
        score += cell_fitness(img, h, cx + r, cy - r + i);
        score += cell_fitness(img, h, cx + r - i, cy + r);
    }

    score
}

fn cell_fitness(img: &BinaryImage, h: &Homography, x: i32, y: i32) -> i32 {
    const OFFSETS: [f64; 3] = [0.3, 0.5, 0.7];
    let mut score = 0;

    for dy in OFFSETS {
        for dx in OFFSETS {
            let Ok(pt) = h.map(x as f64 + dx, y as f64 + dy) else { continue };
            match img.color_at(&pt) {
                Some(Color::Dark) => score += 1,
                Some(Color::Light) => score -= 1,
                None => {}
            }
        }
    }
    score
}

// Samples the centre of a module, treating anything off the image as light
fn sample(img: &BinaryImage, h: &Homography, w: usize, r: i16, c: i16) -> Color {
    let w = w as i16;
    let r = if r < 0 { r + w } else { r };
    let c = if c < 0 { c + w } else { c };
    h.map(c as f64 + 0.5, r as f64 + 0.5)
        .ok()
        .and_then(|pt| img.color_at(&pt))
        .unwrap_or(Color::Light)
}

// Of the copies that can be corrected, the one needing the fewest corrections wins
fn rectify_copies(copies: [u32; 2], valid: &[u32], err_capacity: u32) -> Option<u32> {
    copies
        .into_iter()
        .filter_map(|n| rectify_info(n, valid, err_capacity).map(|v| ((n ^ v).count_ones(), v)))
        .min_by_key(|&(dist, _)| dist)
        .map(|(_, v)| v)
}

fn read_version_info(img: &BinaryImage, h: &Homography, ver: Version) -> Option<Version> {
    let w = ver.width();
    let read = |coords: &[(i16, i16)]| {
        coords.iter().fold(0, |n, &(r, c)| (n << 1) | sample(img, h, w, r, c).select(1, 0))
    };
    let copies = [read(&VERSION_INFO_COORDS_BL), read(&VERSION_INFO_COORDS_TR)];
    let info = rectify_copies(copies, &VERSION_INFOS, VERSION_ERROR_CAPACITY)?;
    Version::new(info as usize >> 12).ok()
}

// Symbol
// Module grid sampled from the image, along with the metadata needed to decode it
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Symbol {
    grid: Vec<Color>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mask: MaskPattern,
    // Outer corners clockwise from the top left of the symbol
    corners: [Point; 4],
}

impl Symbol {
    /// Samples the grid and reads the format info. Fails if neither format copy can be corrected.
    pub fn read(img: &BinaryImage, loc: &SymbolLocation) -> QRResult<Self> {
        let SymbolLocation { h, ver } = loc;
        let w = ver.width();

        let mut grid = Vec::with_capacity(w * w);
        for r in 0..w as i16 {
            for c in 0..w as i16 {
                grid.push(sample(img, h, w, r, c));
            }
        }

        let wf = w as f64;
        let corners = [h.map(0.0, 0.0)?, h.map(wf, 0.0)?, h.map(wf, wf)?, h.map(0.0, wf)?];

        let mut symbol =
            Self { grid, w, ver: *ver, ecl: ECLevel::L, mask: MaskPattern::new(0), corners };

        let copies =
            [symbol.get_number(&FORMAT_INFO_COORDS_QR_MAIN), symbol.get_number(&FORMAT_INFO_COORDS_QR_SIDE)];
        let format = rectify_copies(copies, &FORMAT_INFOS, FORMAT_ERROR_CAPACITY)
            .ok_or(QRError::InvalidFormatInfo)?;
        (symbol.ecl, symbol.mask) = parse_format_info(format);

        Ok(symbol)
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mask(&self) -> MaskPattern {
        self.mask
    }

    pub fn corners(&self) -> [Point; 4] {
        self.corners
    }

    pub fn get(&self, r: i16, c: i16) -> Color {
        let w = self.w as i16;
        debug_assert!(-w <= r && r < w, "row should be greater than or equal to w");
        debug_assert!(-w <= c && c < w, "column should be greater than or equal to w");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        self.grid[r as usize * self.w + c as usize]
    }

    pub fn get_number(&self, coords: &[(i16, i16)]) -> u32 {
        coords.iter().fold(0, |n, &(r, c)| (n << 1) | self.get(r, c).select(1, 0))
    }
}

// Extracts encoded data codewords and error correction codewords
//------------------------------------------------------------------------------

impl Symbol {
    pub fn extract_payload(&self) -> BitStream {
        let ver = self.ver;

        // Modules left empty in a bare symbol of the same version carry the payload
        let mut template = QR::new(ver, self.ecl);
        template.draw_all_function_patterns();
        template.reserve_format_area();
        template.draw_version_info();

        let mask_fn = self.mask.mask_functions();
        let total_bits = ver.total_codewords() << 3;
        let mut payload = BitStream::new(total_bits);

        for (r, c) in EncRegionIter::new(ver) {
            if payload.len() == total_bits {
                break;
            }
            if matches!(template.get(r, c), Module::Empty) {
                let bit = self.get(r, c) == Color::Dark;
                payload.push(bit ^ mask_fn(r, c));
            }
        }
        payload
    }
}
