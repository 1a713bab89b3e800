use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub};

// Galois field GF(256) with the QR primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
//------------------------------------------------------------------------------

const PRIMITIVE: u16 = 0x11d;

const fn exp_log_tables() -> ([u8; 256], [u8; 256]) {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];
    let mut x = 1u16;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    exp[255] = exp[0];
    (exp, log)
}

pub(crate) static EXP_TABLE: [u8; 256] = exp_log_tables().0;

pub(crate) static LOG_TABLE: [u8; 256] = exp_log_tables().1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct G(pub u8);

impl G {
    // α^i
    pub fn gen_pow(i: usize) -> Self {
        Self(EXP_TABLE[i % 255])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<G> for u8 {
    fn from(g: G) -> Self {
        g.0
    }
}

impl Add for G {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

// Subtraction and addition coincide in characteristic 2
impl Sub for G {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl Mul for G {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self(0);
        }
        let log_sum = LOG_TABLE[self.0 as usize] as usize + LOG_TABLE[rhs.0 as usize] as usize;
        Self(EXP_TABLE[log_sum % 255])
    }
}

impl MulAssign for G {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for G {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        debug_assert!(!rhs.is_zero(), "Division by zero in GF(256)");
        if self.is_zero() {
            return Self(0);
        }
        let log_diff =
            LOG_TABLE[self.0 as usize] as usize + 255 - LOG_TABLE[rhs.0 as usize] as usize;
        Self(EXP_TABLE[log_diff % 255])
    }
}

// Evaluates a polynomial with coefficients in ascending order of degree
pub(crate) fn eval_poly(poly: &[G], x: G) -> G {
    poly.iter().rev().fold(G(0), |acc, &c| acc * x + c)
}
