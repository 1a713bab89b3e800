mod qr;

pub use qr::{Module, QR};

use std::ops::Deref;

use tracing::{debug, trace};

use crate::common::{
    bitstream::BitStream,
    codec::{encode, encode_with_version},
    ec::{blockify, Block},
    error::QRResult,
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
};

pub struct QRBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, version: None, ec_level: ECLevel::H, mask: None }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn metadata(&self) -> String {
        match self.version {
            Some(v) => format!("{{ Version: {:?}, Ec level: {:?} }}", *v, self.ec_level),
            None => format!("{{ Version: None, Ec level: {:?} }}", self.ec_level),
        }
    }
}

#[cfg(test)]
mod qrbuilder_util_tests {
    use super::QRBuilder;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_metadata() {
        let mut qr_builder = QRBuilder::new(b"Hello, world!");
        qr_builder.version(Version::new(1).unwrap()).ec_level(ECLevel::L);
        assert_eq!(qr_builder.metadata(), "{ Version: 1, Ec level: L }");
        qr_builder.unset_version();
        assert_eq!(qr_builder.metadata(), "{ Version: None, Ec level: L }");
    }
}

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        debug!(len = self.data.len(), metadata = %self.metadata(), "Generating QR");

        // Encode data optimally
        let (encoded_data, version) = match self.version {
            Some(v) => (encode_with_version(self.data, v, self.ec_level)?, v),
            None => encode(self.data, self.ec_level)?,
        };
        trace!(version = *version, bits = encoded_data.len(), "Encoded payload");

        // Compute error correction codewords, then interleave data & ecc
        let blocks = blockify(encoded_data.data(), version, self.ec_level);
        let mut payload = BitStream::new(version.total_codewords() << 3);
        payload.extend(&Self::interleave(&blocks.iter().map(Block::data).collect::<Vec<_>>()));
        payload.extend(&Self::interleave(&blocks.iter().map(Block::ecc).collect::<Vec<_>>()));

        let mut qr = QR::new(version, self.ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(payload);

        let mask = match self.mask {
            Some(m) => {
                qr.apply_mask(m);
                m
            }
            None => apply_best_mask(&mut qr),
        };

        debug!(
            version = *version,
            ec_level = ?self.ec_level,
            mask = *mask,
            ec_capacity = Self::ec_capacity(version, self.ec_level),
            dark_modules = qr.count_dark_modules(),
            "QR generated"
        );

        Ok(qr)
    }

    // Number of codewords the symbol can lose and still be read
    pub fn ec_capacity(version: Version, ec_level: ECLevel) -> usize {
        // Misdecode protection codewords for the smallest symbols
        let p = match (*version, ec_level) {
            (1, ECLevel::L) => 3,
            (1, ECLevel::M) | (2, ECLevel::L) => 2,
            (1, _) | (3, ECLevel::L) => 1,
            _ => 0,
        };

        let ec_bytes = version.block_count(ec_level) * version.ecc_per_block(ec_level);
        (ec_bytes - p) / 2
    }

    pub fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for b in blocks {
                if i < b.len() {
                    res.push(b[i]);
                }
            }
        }
        res
    }
}

#[cfg(test)]
mod builder_tests {
    use test_case::test_case;

    use super::QRBuilder;
    use crate::common::{
        error::QRError,
        mask::MaskPattern,
        metadata::{ECLevel, Version},
    };

    #[test]
    fn test_interleave() {
        let blocks = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9, 0]];
        let interleaved = QRBuilder::interleave(&blocks);
        assert_eq!(interleaved, vec![1, 4, 7, 2, 5, 8, 3, 6, 9, 0]);
    }

    #[test_case(1, ECLevel::L, 2)]
    #[test_case(1, ECLevel::H, 8)]
    #[test_case(5, ECLevel::Q, 36)]
    #[test_case(40, ECLevel::H, 1215)]
    fn test_ec_capacity(ver: usize, ecl: ECLevel, exp: usize) {
        assert_eq!(QRBuilder::ec_capacity(Version::new(ver).unwrap(), ecl), exp);
    }

    #[test_case("Hello, world!🌎", 1, ECLevel::L)]
    #[test_case("TEST", 1, ECLevel::M)]
    #[test_case("12345", 1, ECLevel::Q)]
    #[test_case("OK", 1, ECLevel::H)]
    #[test_case("A11111111111111", 7, ECLevel::M)]
    #[test_case("1234567890", 10, ECLevel::H)]
    fn test_build_with_version(data: &str, ver: usize, ecl: ECLevel) {
        let ver = Version::new(ver).unwrap();
        let qr = QRBuilder::new(data.as_bytes()).version(ver).ec_level(ecl).build().unwrap();
        assert_eq!(qr.version(), ver);
        assert_eq!(qr.ec_level(), ecl);
        assert!(qr.mask().is_some());
    }

    #[test]
    fn test_build_with_mask() {
        let qr = QRBuilder::new(b"mask").mask(MaskPattern::new(3)).build().unwrap();
        assert_eq!(qr.mask(), Some(MaskPattern::new(3)));
        assert_eq!(qr.ec_level(), ECLevel::H);
    }

    #[test]
    fn test_build_too_long_for_version() {
        let ver = Version::new(1).unwrap();
        let res = QRBuilder::new(&[b'a'; 20]).version(ver).build();
        assert!(matches!(res, Err(QRError::EncodingTooLarge { .. })));
    }
}
