use super::{
    galois::{eval_poly, G},
    Block, MAX_EC_SIZE,
};
use crate::common::error::{QRError, QRResult};

// Rectifier
//------------------------------------------------------------------------------

impl Block {
    pub fn rectify(&mut self) -> QRResult<&[u8]> {
        let ec_len = self.ec_len();

        // Compute syndromes
        let synd = match self.syndromes() {
            None => return Ok(self.data()),
            Some(s) => s,
        };

        // Error locator polynomial
        let (sig, l) = berlekamp_massey(&synd[..ec_len]);
        if 2 * l > ec_len {
            return Err(QRError::TooManyErrors);
        }

        // Sigma derivative
        let mut dsig = [G(0); MAX_EC_SIZE];
        for i in (1..=l).step_by(2) {
            dsig[i - 1] = sig[i];
        }

        // Error evaluator
        let omg = omega(&synd[..ec_len], &sig[..=l]);

        // Chien search for error positions, then Forney for magnitudes
        let mut err_cnt = 0;
        for pos in 0..self.len {
            let xinv = G::gen_pow(255 - pos);
            if !eval_poly(&sig[..=l], xinv).is_zero() {
                continue;
            }
            let dsig_x = eval_poly(&dsig[..l], xinv);
            if dsig_x.is_zero() {
                return Err(QRError::TooManyErrors);
            }
            let mag = G::gen_pow(pos) * eval_poly(&omg[..ec_len], xinv) / dsig_x;
            let idx = self.len - 1 - pos;
            self.data[idx] = (G(self.data[idx]) + mag).into();
            err_cnt += 1;
        }
        if err_cnt != l {
            return Err(QRError::TooManyErrors);
        }

        match self.syndromes() {
            None => Ok(self.data()),
            Some(_) => Err(QRError::TooManyErrors),
        }
    }

    // Syndrome i is the received polynomial evaluated at α^i, first codeword being the highest
    // degree coefficient
    fn syndromes(&self) -> Option<[G; MAX_EC_SIZE]> {
        let mut synd = [G(0); MAX_EC_SIZE];
        for (i, s) in synd.iter_mut().take(self.ec_len()).enumerate() {
            let x = G::gen_pow(i);
            *s = self.full().iter().fold(G(0), |acc, &b| acc * x + G(b));
        }

        if synd.iter().all(G::is_zero) {
            None
        } else {
            Some(synd)
        }
    }
}

// Returns the error locator polynomial and its degree
fn berlekamp_massey(synd: &[G]) -> ([G; MAX_EC_SIZE], usize) {
    let mut cx = [G(0); MAX_EC_SIZE];
    cx[0] = G(1);
    let mut bx = cx;
    let mut l = 0;
    let mut m = 1;
    let mut b = G(1);

    for k in 0..synd.len() {
        // Discrepancy
        let mut d = synd[k];
        for i in 1..=l {
            d += cx[i] * synd[k - i];
        }

        if d.is_zero() {
            m += 1;
            continue;
        }

        let tx = cx;
        let scale = d / b;
        for i in 0..MAX_EC_SIZE - m {
            cx[i + m] += scale * bx[i];
        }

        if 2 * l <= k {
            l = k + 1 - l;
            bx = tx;
            b = d;
            m = 1;
        } else {
            m += 1;
        }
    }

    (cx, l)
}

// S(x) * sigma(x) mod x^n
fn omega(synd: &[G], sig: &[G]) -> [G; MAX_EC_SIZE] {
    let n = synd.len();
    let mut omg = [G(0); MAX_EC_SIZE];
    for (i, &s) in synd.iter().enumerate() {
        for (j, &c) in sig.iter().enumerate().take(n - i) {
            omg[i + j] += s * c;
        }
    }
    omg
}

// Rectifier for format and version infos
pub fn rectify_info(info: u32, valid_numbers: &[u32], err_capacity: u32) -> Option<u32> {
    valid_numbers
        .iter()
        .copied()
        .min_by_key(|n| (info ^ n).count_ones())
        .filter(|n| (info ^ n).count_ones() <= err_capacity)
}
