use tracing::trace;

use super::{galois::G, Block};
use crate::common::error::{QRError, QRResult};

// Rectifier
//------------------------------------------------------------------------------

impl Block {
    /// Corrects the block in place and returns the number of codewords
    /// fixed. Fails when the error count exceeds half the ecc length or the
    /// corrected block does not verify.
    pub fn rectify(&mut self) -> QRResult<usize> {
        // Compute syndromes
        let synd = match self.syndromes() {
            None => return Ok(0),
            Some(s) => s,
        };

        // Error locator polynomial
        let sig = berlekamp_massey(&synd);
        let err_cnt = sig.len() - 1;
        if err_cnt * 2 > self.ec_len() {
            return Err(QRError::EccUncorrectable);
        }

        let err_loc = self.chien_search(&sig);
        if err_loc.len() != err_cnt {
            return Err(QRError::EccUncorrectable);
        }

        // Error evaluator & sigma derivative
        let omg = omega(&synd, &sig);
        let dsig: Vec<G> =
            (1..sig.len()).map(|i| if i & 1 == 1 { sig[i] } else { G(0) }).collect();

        // Forney
        let len = self.len();
        for &k in err_loc.iter() {
            let x = G::gen_pow(len - 1 - k);
            let xinv = x.inv();
            let den = eval_poly(&dsig, xinv);
            if den.is_zero() {
                return Err(QRError::EccUncorrectable);
            }
            let mag = x * eval_poly(&omg, xinv) / den;
            self.data[k] = (G(self.data[k]) + mag).into();
        }

        if self.syndromes().is_some() {
            return Err(QRError::EccUncorrectable);
        }

        trace!("Corrected {err_cnt} codewords in block of {len}");
        Ok(err_cnt)
    }

    // Evaluates the block polynomial at alpha^0 .. alpha^(ec_len - 1). The
    // first codeword is the highest degree coefficient.
    fn syndromes(&self) -> Option<Vec<G>> {
        let synd: Vec<G> = (0..self.ec_len())
            .map(|i| {
                let x = G::gen_pow(i);
                self.data.iter().fold(G(0), |acc, &b| acc * x + G(b))
            })
            .collect();

        if synd.iter().all(|s| s.is_zero()) {
            None
        } else {
            Some(synd)
        }
    }

    // Indices of codewords whose locator X^-1 is a root of sigma
    fn chien_search(&self, sig: &[G]) -> Vec<usize> {
        let len = self.len();
        (0..len).filter(|&k| eval_poly(sig, G::gen_pow(len - 1 - k).inv()).is_zero()).collect()
    }
}

// Sigma polynomial, lowest degree first, truncated to its degree
fn berlekamp_massey(synd: &[G]) -> Vec<G> {
    let mut cx = vec![G(1)];
    let mut bx = vec![G(1)];
    let mut l = 0usize;
    let mut m = 1usize;
    let mut b = G(1);

    for n in 0..synd.len() {
        // Discrepancy
        let mut d = synd[n];
        for i in 1..=l.min(cx.len() - 1) {
            d += cx[i] * synd[n - i];
        }

        if d.is_zero() {
            m += 1;
            continue;
        }

        let tx = cx.clone();
        let scale = d / b;
        if cx.len() < bx.len() + m {
            cx.resize(bx.len() + m, G(0));
        }
        for (i, &bi) in bx.iter().enumerate() {
            cx[i + m] += scale * bi;
        }

        if 2 * l <= n {
            l = n + 1 - l;
            bx = tx;
            b = d;
            m = 1;
        } else {
            m += 1;
        }
    }

    cx.resize(l + 1, G(0));
    cx
}

// Error evaluator: syndromes times sigma, mod x^ec_len
fn omega(synd: &[G], sig: &[G]) -> Vec<G> {
    let t = synd.len();
    let mut omg = vec![G(0); t];
    for (i, &s) in synd.iter().enumerate() {
        for (j, &si) in sig.iter().enumerate().take(t - i) {
            omg[i + j] += s * si;
        }
    }
    omg
}

// Lowest degree first
fn eval_poly(poly: &[G], x: G) -> G {
    poly.iter().rev().fold(G(0), |acc, &c| acc * x + c)
}

// Rectifier for format and version infos
//------------------------------------------------------------------------------

/// Snaps a read info codeword to the closest valid one, if it lies within
/// `err_capacity` bit flips.
pub fn rectify_info(info: u32, valid_numbers: &[u32], err_capacity: u32) -> Option<u32> {
    let res = *valid_numbers.iter().min_by_key(|&n| (info ^ n).count_ones())?;
    ((info ^ res).count_ones() <= err_capacity).then_some(res)
}
