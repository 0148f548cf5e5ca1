use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub};

// Galois field GF(256) with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
//------------------------------------------------------------------------------

const PRIMITIVE: u16 = 0x11D;

// Doubled so products of two logs index without a modulo
static EXP_TABLE: [u8; 512] = build_exp_table();
static LOG_TABLE: [u8; 256] = build_log_table();

const fn build_exp_table() -> [u8; 512] {
    let mut res = [0u8; 512];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        res[i] = x as u8;
        res[i + 255] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    res[510] = res[0];
    res[511] = res[1];
    res
}

const fn build_log_table() -> [u8; 256] {
    let exp = build_exp_table();
    let mut res = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        res[exp[i] as usize] = i as u8;
        i += 1;
    }
    res
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct G(pub u8);

impl G {
    /// Returns alpha^i.
    pub fn gen_pow(i: usize) -> Self {
        G(EXP_TABLE[i % 255])
    }

    pub fn log(self) -> usize {
        debug_assert!(self.0 != 0, "Log of zero is undefined");
        LOG_TABLE[self.0 as usize] as usize
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn inv(self) -> Self {
        debug_assert!(self.0 != 0, "Zero has no inverse");
        G(EXP_TABLE[255 - self.log()])
    }
}

impl From<G> for u8 {
    fn from(g: G) -> u8 {
        g.0
    }
}

#[allow(clippy::suspicious_arithmetic_impl)]
impl Add for G {
    type Output = G;
    fn add(self, rhs: G) -> G {
        G(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    fn add_assign(&mut self, rhs: G) {
        *self = *self + rhs;
    }
}

#[allow(clippy::suspicious_arithmetic_impl)]
impl Sub for G {
    type Output = G;
    fn sub(self, rhs: G) -> G {
        G(self.0 ^ rhs.0)
    }
}

impl Mul for G {
    type Output = G;
    fn mul(self, rhs: G) -> G {
        if self.is_zero() || rhs.is_zero() {
            return G(0);
        }
        G(EXP_TABLE[self.log() + rhs.log()])
    }
}

impl MulAssign for G {
    fn mul_assign(&mut self, rhs: G) {
        *self = *self * rhs;
    }
}

impl Div for G {
    type Output = G;
    fn div(self, rhs: G) -> G {
        debug_assert!(!rhs.is_zero(), "Division by zero");
        if self.is_zero() || rhs.is_zero() {
            return G(0);
        }
        G(EXP_TABLE[self.log() + 255 - rhs.log()])
    }
}

#[cfg(test)]
mod galois_tests {
    use super::G;

    #[test]
    fn test_gen_pow() {
        assert_eq!(G::gen_pow(0), G(1));
        assert_eq!(G::gen_pow(1), G(2));
        assert_eq!(G::gen_pow(8), G(0x1D));
        assert_eq!(G::gen_pow(255), G(1));
        assert_eq!(G::gen_pow(25).log(), 25);
    }

    #[test]
    fn test_mul_div() {
        assert_eq!(G::gen_pow(100) * G::gen_pow(200), G::gen_pow(45));
        assert_eq!(G(2) * G(0x80), G(0x1D));
        assert_eq!(G(0) * G(7), G(0));
        for a in 1..=255u8 {
            let a = G(a);
            assert_eq!(a * a.inv(), G(1));
            assert_eq!((a * G(77)) / G(77), a);
        }
    }

    #[test]
    fn test_add() {
        assert_eq!(G(0b1010) + G(0b0110), G(0b1100));
        assert_eq!(G(9) - G(9), G(0));
    }
}
