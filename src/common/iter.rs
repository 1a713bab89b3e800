use super::metadata::Version;

// Iterator for placing data in encoding region of QR
// Walks column pairs from the right edge, alternating upwards and downwards, and skips the
// vertical timing column. Function modules are yielded too and left to the caller to skip.
//------------------------------------------------------------------------------

pub struct EncRegionIter {
    r: i16,
    // Right column of the current pair
    c: i16,
    w: i16,
    upward: bool,
    right: bool,
}

impl EncRegionIter {
    pub fn new(ver: Version) -> Self {
        let w = ver.width() as i16;
        Self { r: w - 1, c: w - 1, w, upward: true, right: true }
    }
}

impl Iterator for EncRegionIter {
    type Item = (i16, i16);

    fn next(&mut self) -> Option<Self::Item> {
        if self.c < 0 {
            return None;
        }

        let res = if self.right { (self.r, self.c) } else { (self.r, self.c - 1) };
        if self.right {
            self.right = false;
            return Some(res);
        }

        self.right = true;
        let next_r = if self.upward { self.r - 1 } else { self.r + 1 };
        if (0..self.w).contains(&next_r) {
            self.r = next_r;
        } else {
            self.upward = !self.upward;
            self.c -= 2;
            if self.c == 6 {
                self.c = 5;
            }
        }
        Some(res)
    }
}

#[cfg(test)]
mod iter_tests {
    use super::EncRegionIter;
    use crate::builder::{Module, QRBuilder};
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_zigzag_start() {
        let coords = EncRegionIter::new(Version::new(1).unwrap()).take(6).collect::<Vec<_>>();
        assert_eq!(coords, [(20, 20), (20, 19), (19, 20), (19, 19), (18, 20), (18, 19)]);
    }

    #[test]
    fn test_column_turn_and_timing_skip() {
        let coords = EncRegionIter::new(Version::new(1).unwrap()).collect::<Vec<_>>();
        assert_eq!(coords.len(), 21 * 20);
        assert_eq!(coords[42], (0, 18));
        assert_eq!(coords[43], (0, 17));
        assert!(coords.iter().all(|&(_, c)| c != 6));
        assert_eq!(coords.last(), Some(&(20, 0)));
    }

    #[test]
    fn test_enc_region_iter() {
        for v in 1..=40 {
            let ver = Version::new(v).unwrap();
            let qr = QRBuilder::new(b"Hello, world!").version(ver).ec_level(ECLevel::L).build();
            let qr = qr.unwrap();
            let data_modules = EncRegionIter::new(ver)
                .filter(|&(r, c)| matches!(qr.get(r, c), Module::Data(_)))
                .count();
            assert_eq!(data_modules, ver.total_codewords() * 8 + ver.remainder_bits());
        }
    }
}
