use std::ops::Deref;

use image::{Rgba, RgbaImage};

use crate::common::{
    bitstream::BitStream,
    iter::EncRegionIter,
    mask::MaskPattern,
    metadata::{
        format_info, Color, ECLevel, Version, FORMAT_INFO_BIT_LEN, FORMAT_INFO_COORDS_QR_MAIN,
        FORMAT_INFO_COORDS_QR_SIDE, MAX_QR_SIZE, VERSION_INFO_BIT_LEN, VERSION_INFO_COORDS_BL,
        VERSION_INFO_COORDS_TR,
    },
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Func(Color),
    Version(Color),
    Format(Color),
    Data(Color),
}

impl Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Self::Target {
        match self {
            Module::Empty => &Color::Light,
            Module::Func(c) => c,
            Module::Version(c) => c,
            Module::Format(c) => c,
            Module::Data(c) => c,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QR {
    grid: Box<[Module; MAX_QR_SIZE]>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mask: Option<MaskPattern>,
}

// QR type for builder
//------------------------------------------------------------------------------

impl QR {
    pub fn new(ver: Version, ecl: ECLevel) -> Self {
        let w = ver.width();
        Self { grid: Box::new([Module::Empty; MAX_QR_SIZE]), w, ver, ecl, mask: None }
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid[..self.w * self.w].iter().filter(|&m| matches!(**m, Color::Dark)).count()
    }

    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let w = self.w as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.get(i, j) {
                    Module::Empty => '.',
                    Module::Func(Color::Dark) => 'f',
                    Module::Func(Color::Light) => 'F',
                    Module::Version(Color::Dark) => 'v',
                    Module::Version(Color::Light) => 'V',
                    Module::Format(Color::Dark) => 'm',
                    Module::Format(Color::Light) => 'M',
                    Module::Data(Color::Dark) => 'd',
                    Module::Data(Color::Light) => 'D',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.w as i16;
        debug_assert!(-w <= r && r < w, "row should be greater than or equal to w");
        debug_assert!(-w <= c && c < w, "column should be greater than or equal to w");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r * w + c) as _
    }

    pub fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub fn get_mut(&mut self, r: i16, c: i16) -> &mut Module {
        let index = self.coord_to_index(r, c);
        &mut self.grid[index]
    }

    pub fn set(&mut self, r: i16, c: i16, module: Module) {
        *self.get_mut(r, c) = module;
    }
}

#[cfg(test)]
mod qr_util_tests {
    use super::{Module, QR};
    use crate::common::metadata::{Color, ECLevel, Version};

    #[test]
    fn test_index_wrap() {
        let mut qr = QR::new(Version::new(1).unwrap(), ECLevel::L);
        let w = qr.w as i16;
        qr.set(-1, -1, Module::Func(Color::Dark));
        assert_eq!(qr.get(w - 1, w - 1), Module::Func(Color::Dark));
        qr.set(0, 0, Module::Func(Color::Dark));
        assert_eq!(qr.get(-w, -w), Module::Func(Color::Dark));
    }

    #[test]
    #[should_panic]
    fn test_row_out_of_bound() {
        let qr = QR::new(Version::new(1).unwrap(), ECLevel::L);
        let w = qr.w as i16;
        qr.get(w, 0);
    }

    #[test]
    #[should_panic]
    fn test_col_index_overwrap() {
        let qr = QR::new(Version::new(1).unwrap(), ECLevel::L);
        let w = qr.w as i16;
        qr.get(0, -(w + 1));
    }
}

// Function patterns
//------------------------------------------------------------------------------

impl QR {
    pub fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_pattern();
        self.draw_alignment_patterns();
    }

    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(3, -4);
        self.draw_finder_pattern_at(-4, 3);
    }

    // Draws the 7x7 pattern centred at (r, c) together with its light separator on the sides
    // facing the symbol
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_top, dr_bottom): (i16, i16) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_left, dc_right): (i16, i16) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_top..=dr_bottom {
            for j in dc_left..=dc_right {
                let ring = i16::max(i.abs(), j.abs());
                let clr = match ring {
                    4 | 2 => Color::Light,
                    _ => Color::Dark,
                };
                self.set(r + i, c + j, Module::Func(clr));
            }
        }
    }

    fn draw_timing_pattern(&mut self) {
        let w = self.w as i16;
        self.draw_line(6, 8, 6, w - 9);
        self.draw_line(8, 6, w - 9, 6);
    }

    fn draw_line(&mut self, r1: i16, c1: i16, r2: i16, c2: i16) {
        debug_assert!(r1 == r2 || c1 == c2, "Line is neither vertical nor horizontal");

        if r1 == r2 {
            for j in c1..=c2 {
                self.set(r1, j, Module::Func(Color::from(j & 1 == 0)));
            }
        } else {
            for i in r1..=r2 {
                self.set(i, c1, Module::Func(Color::from(i & 1 == 0)));
            }
        }
    }

    fn draw_alignment_patterns(&mut self) {
        let poses = self.ver.alignment_pattern();
        for &r in poses {
            for &c in poses {
                self.draw_alignment_pattern_at(r, c)
            }
        }
    }

    // Positions overlapping a finder pattern are skipped
    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.w as i16;
        if (r == 6 && (c == 6 || c - w == -7)) || (r - w == -7 && c == 6) {
            return;
        }
        for i in -2..=2i16 {
            for j in -2..=2i16 {
                let clr = Color::from(i16::max(i.abs(), j.abs()) != 1);
                self.set(r + i, c + j, Module::Func(clr));
            }
        }
    }
}


// Format & version info
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn reserve_format_area(&mut self) {
        self.draw_format_info((1 << FORMAT_INFO_BIT_LEN) - 1);
    }

    fn draw_format_info(&mut self, info: u32) {
        let (off, on) = (Module::Format(Color::Light), Module::Format(Color::Dark));
        self.draw_number(info, FORMAT_INFO_BIT_LEN, off, on, &FORMAT_INFO_COORDS_QR_MAIN);
        self.draw_number(info, FORMAT_INFO_BIT_LEN, off, on, &FORMAT_INFO_COORDS_QR_SIDE);
        // Dark module
        self.set(-8, 8, on);
    }

    pub(crate) fn draw_version_info(&mut self) {
        if *self.ver < 7 {
            return;
        }
        let info = self.ver.info();
        let (off, on) = (Module::Version(Color::Light), Module::Version(Color::Dark));
        self.draw_number(info, VERSION_INFO_BIT_LEN, off, on, &VERSION_INFO_COORDS_BL);
        self.draw_number(info, VERSION_INFO_BIT_LEN, off, on, &VERSION_INFO_COORDS_TR);
    }

    fn draw_number(
        &mut self,
        number: u32,
        bit_len: usize,
        off_clr: Module,
        on_clr: Module,
        coords: &[(i16, i16)],
    ) {
        let mut mask = 1 << (bit_len - 1);
        for &(r, c) in coords {
            self.set(r, c, if number & mask == 0 { off_clr } else { on_clr });
            mask >>= 1;
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    pub fn draw_encoding_region(&mut self, payload: BitStream) {
        self.reserve_format_area();
        self.draw_version_info();
        self.draw_payload(payload);

        debug_assert!(
            !self.grid[..self.w * self.w].contains(&Module::Empty),
            "Empty module found after drawing encoding region"
        );
    }

    fn draw_payload(&mut self, payload: BitStream) {
        let mut coords = EncRegionIter::new(self.ver);
        for bit in payload {
            let module = Module::Data(Color::from(bit));
            for (r, c) in coords.by_ref() {
                if matches!(self.get(r, c), Module::Empty) {
                    self.set(r, c, module);
                    break;
                }
            }
        }
        // Remainder bits
        for (r, c) in coords {
            if matches!(self.get(r, c), Module::Empty) {
                self.set(r, c, Module::Data(Color::Light));
            }
        }
    }

    // Xors data modules with the pattern, so applying a pattern twice undoes it
    pub fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask = Some(pattern);
        let mask_fn = pattern.mask_functions();
        let w = self.w as i16;
        for r in 0..w {
            for c in 0..w {
                if let Module::Data(clr) = self.get(r, c) {
                    if mask_fn(r, c) {
                        self.set(r, c, Module::Data(!clr))
                    }
                }
            }
        }
        self.draw_format_info(format_info(self.ecl, pattern));
    }
}

#[cfg(test)]
mod encoding_region_tests {
    use super::{Module, QR};
    use crate::common::{
        bitstream::BitStream,
        mask::MaskPattern,
        metadata::{Color, ECLevel, Version},
    };

    fn drawn_qr(ver: usize, ecl: ECLevel) -> QR {
        let ver = Version::new(ver).unwrap();
        let mut qr = QR::new(ver, ecl);
        qr.draw_all_function_patterns();
        let mut payload = BitStream::new(ver.total_codewords() << 3);
        payload.extend(&vec![0xff; ver.total_codewords()]);
        qr.draw_encoding_region(payload);
        qr
    }

    #[test]
    fn test_payload_fills_data_modules() {
        let qr = drawn_qr(1, ECLevel::M);
        assert_eq!(qr.get(20, 20), Module::Data(Color::Dark));
        assert_eq!(qr.get(9, 9), Module::Data(Color::Dark));
    }

    #[test]
    fn test_remainder_bits_are_light() {
        // Version 2 has 7 remainder bits, placed last in the bottom left region
        let qr = drawn_qr(2, ECLevel::M);
        let light = (0..qr.width() as i16)
            .flat_map(|r| (0..qr.width() as i16).map(move |c| (r, c)))
            .filter(|&(r, c)| qr.get(r, c) == Module::Data(Color::Light))
            .count();
        assert_eq!(light, 7);
    }

    #[test]
    fn test_apply_mask_only_touches_data() {
        let mut qr = drawn_qr(1, ECLevel::M);
        let before = qr.clone();
        qr.apply_mask(MaskPattern::new(1));
        assert_eq!(qr.mask(), Some(MaskPattern::new(1)));
        for r in 0..21 {
            for c in 0..21 {
                match (before.get(r, c), qr.get(r, c)) {
                    (Module::Data(a), Module::Data(b)) => assert_eq!(a != b, r & 1 == 0),
                    (Module::Func(a), Module::Func(b)) => assert_eq!(a, b),
                    (Module::Format(_), Module::Format(_)) => {}
                    (a, b) => panic!("Module kind changed at ({r}, {c}): {a:?} -> {b:?}"),
                }
            }
        }
    }
}

// Render
//------------------------------------------------------------------------------

impl QR {
    // Rasterizes the symbol with each module as a square of module_sz pixels, surrounded by a
    // quiet zone of border modules
    pub fn render(&self, module_sz: u32, border: u32, fg: Rgba<u8>, bg: Rgba<u8>) -> RgbaImage {
        let qz_sz = border * module_sz;
        let qr_sz = self.w as u32 * module_sz;
        let total_sz = qz_sz + qr_sz + qz_sz;

        RgbaImage::from_fn(total_sz, total_sz, |x, y| {
            if x < qz_sz || x >= qz_sz + qr_sz || y < qz_sz || y >= qz_sz + qr_sz {
                return bg;
            }
            let r = ((y - qz_sz) / module_sz) as i16;
            let c = ((x - qz_sz) / module_sz) as i16;
            self.get(r, c).select(fg, bg)
        })
    }
}

#[cfg(test)]
mod render_tests {
    use image::Rgba;

    use super::QR;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_render_dimensions_and_quiet_zone() {
        let mut qr = QR::new(Version::new(1).unwrap(), ECLevel::L);
        qr.draw_all_function_patterns();
        let (fg, bg) = (Rgba([10, 20, 30, 255]), Rgba([250, 240, 230, 255]));
        let img = qr.render(10, 4, fg, bg);
        assert_eq!(img.dimensions(), (290, 290));
        assert_eq!(*img.get_pixel(39, 39), bg);
        assert_eq!(*img.get_pixel(40, 40), fg);
        assert_eq!(*img.get_pixel(49, 49), fg);
        // Ring of light modules inside the top left finder
        assert_eq!(*img.get_pixel(55, 55), bg);
        assert_eq!(*img.get_pixel(75, 75), fg);
        assert_eq!(*img.get_pixel(289, 0), bg);
    }
}
