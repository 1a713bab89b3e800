use super::{
    galois::{EXP_TABLE, G, LOG_TABLE},
    Block,
};
use crate::common::metadata::{ECLevel, Version};

// Reed-Solomon encoder
//------------------------------------------------------------------------------

impl Block {
    pub(super) fn compute_ecc(&mut self) {
        let ecc = ecc(self.data(), self.ec_len());
        let (dlen, len) = (self.dlen, self.len);
        self.data[dlen..len].copy_from_slice(&ecc);
    }
}

// Splits data codewords into short blocks followed by long blocks, and attaches ecc
pub fn blockify(data: &[u8], ver: Version, ecl: ECLevel) -> Vec<Block> {
    let (short_sz, short_cnt, long_sz, long_cnt) = ver.data_codewords_per_block(ecl);
    let ec_len = ver.ecc_per_block(ecl);
    let short_total = short_sz * short_cnt;

    debug_assert!(
        short_total + long_sz * long_cnt == data.len(),
        "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
        data.len(),
        short_total + long_sz * long_cnt
    );

    let mut blocks = Vec::with_capacity(short_cnt + long_cnt);
    blocks.extend(data[..short_total].chunks(short_sz).map(|b| Block::new(b, b.len() + ec_len)));
    if long_sz > 0 {
        blocks.extend(
            data[short_total..].chunks(long_sz).map(|b| Block::new(b, b.len() + ec_len)),
        );
    }
    blocks
}

// Monic generator polynomial with roots α^0..α^(n-1), in descending order of degree
pub(crate) fn generator_poly(n: usize) -> Vec<G> {
    let mut poly = vec![G(1)];
    for i in 0..n {
        let root = G::gen_pow(i);
        let mut next = vec![G(0); poly.len() + 1];
        for (j, &c) in poly.iter().enumerate() {
            next[j] += c;
            next[j + 1] += c * root;
        }
        poly = next;
    }
    poly
}

// Remainder of the data polynomial shifted by ecc_count, divided by the generator polynomial
pub fn ecc(block: &[u8], ecc_count: usize) -> Vec<u8> {
    let len = block.len();
    let gen_poly = generator_poly(ecc_count);

    let mut res = block.to_vec();
    res.resize(len + ecc_count, 0);

    for i in 0..len {
        let lead_coeff = res[i] as usize;
        if lead_coeff == 0 {
            continue;
        }

        let log_lead_coeff = LOG_TABLE[lead_coeff] as usize;
        for (u, g) in res[i + 1..].iter_mut().zip(gen_poly[1..].iter()) {
            if g.is_zero() {
                continue;
            }
            let log_sum = (LOG_TABLE[g.0 as usize] as usize + log_lead_coeff) % 255;
            *u ^= EXP_TABLE[log_sum];
        }
    }

    res.split_off(len)
}

#[cfg(test)]
mod ec_tests {
    use super::{blockify, ecc, generator_poly, G};
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_generator_poly() {
        // (x - 1)(x - α) = x^2 + 3x + 2
        assert_eq!(generator_poly(2), vec![G(1), G(3), G(2)]);
        let gen = generator_poly(7);
        let exp_logs = [0, 87, 229, 146, 149, 238, 102, 21];
        for (g, l) in gen.iter().zip(exp_logs) {
            assert_eq!(*g, G::gen_pow(l));
        }
    }

    #[test]
    fn test_poly_mod_1() {
        let res = ecc(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11", 10);
        assert_eq!(&*res, b"\xc4#'w\xeb\xd7\xe7\xe2]\x17");
    }

    #[test]
    fn test_poly_mod_2() {
        let res = ecc(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec", 13);
        assert_eq!(&*res, b"\xa8H\x16R\xd96\x9c\x00.\x0f\xb4z\x10");
    }

    #[test]
    fn test_poly_mod_3() {
        let res = ecc(b"CUF\x86W&U\xc2w2\x06\x12\x06g&", 18);
        assert_eq!(&*res, b"\xd5\xc7\x0b-s\xf7\xf1\xdf\xe5\xf8\x9au\x9aoV\xa1o'");
    }

    #[test]
    fn test_blockify_simple() {
        let msg = b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11";
        let blocks = blockify(msg, Version::new(1).unwrap(), ECLevel::M);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data(), msg);
        assert_eq!(blocks[0].ecc(), b"\xc4\x23\x27\x77\xeb\xd7\xe7\xe2\x5d\x17");
    }

    #[test]
    fn test_blockify_complex() {
        let msg = b"CUF\x86W&U\xc2w2\x06\x12\x06g&\xf6\xf6B\x07v\x86\xf2\x07&V\x16\xc6\xc7\x92\x06\
                    \xb6\xe6\xf7w2\x07v\x86W&R\x06\x86\x972\x07F\xf7vV\xc2\x06\x972\x10\xec\x11\xec\
                    \x11\xec\x11\xec";
        let exp_ecc = [
            b"\xd5\xc7\x0b\x2d\x73\xf7\xf1\xdf\xe5\xf8\x9a\x75\x9a\x6f\x56\xa1\x6f\x27",
            b"\x57\xcc\x60\x3c\xca\xb6\x7c\x9d\xc8\x86\x1b\x81\xd1\x11\xa3\xa3\x78\x85",
            b"\x94\x74\xb1\xd4\x4c\x85\x4b\xf2\xee\x4c\xc3\xe6\xbd\x0a\x6c\xf0\xc0\x8d",
            b"\xeb\x9f\x05\xad\x18\x93\x3b\x21\x6a\x28\xff\xac\x52\x02\x83\x20\xb2\xec",
        ];
        let blocks = blockify(msg, Version::new(5).unwrap(), ECLevel::Q);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks.iter().map(|b| b.data_len()).collect::<Vec<_>>(), [15, 15, 16, 16]);
        for (blk, exp) in blocks.iter().zip(exp_ecc) {
            assert_eq!(blk.ecc(), exp);
        }
    }
}
