use std::ops::{Index, IndexMut};

use crate::common::error::{QRError, QRResult};

use super::geometry::PointF;

// Homographic projection from module space onto the image
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Clone)]
pub struct Homography(pub [f64; 8]);

impl Index<usize> for Homography {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for Homography {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl Homography {
    /// Solves for the projection taking each `src[i]` onto `dst[i]`.
    pub fn compute(src: [(f64, f64); 4], dst: [(f64, f64); 4]) -> QRResult<Self> {
        // Two rows per correspondence, unknowns h11..h32 with h33 fixed to 1
        let mut a = [[0.0_f64; 8]; 8];
        let mut b = [0.0_f64; 8];

        for (i, (&(x, y), &(xp, yp))) in src.iter().zip(dst.iter()).enumerate() {
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -xp * x, -xp * y];
            b[2 * i] = xp;

            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -yp * x, -yp * y];
            b[2 * i + 1] = yp;
        }

        let h = solve_linear_system(a, b)?;
        Ok(Self(h))
    }

    /// Homography for a symbol of side `dim` from its three finder centres
    /// and a fourth point at module position `(br_pos, br_pos)`.
    pub fn anchored(
        finders: &[PointF; 3],
        br: PointF,
        br_pos: f64,
        dim: usize,
    ) -> QRResult<Self> {
        let [bl, tl, tr] = *finders;
        let far = dim as f64 - 3.5;
        let src = [(3.5, 3.5), (far, 3.5), (3.5, far), (br_pos, br_pos)];
        let dst = [(tl.x, tl.y), (tr.x, tr.y), (bl.x, bl.y), (br.x, br.y)];
        Self::compute(src, dst)
    }

    /// Projects a module space position into continuous image coordinates.
    pub fn project(&self, x: f64, y: f64) -> QRResult<PointF> {
        let xp = self[0] * x + self[1] * y + self[2];
        let yp = self[3] * x + self[4] * y + self[5];
        let w = self[6] * x + self[7] * y + 1.0;

        if w.abs() <= f64::EPSILON {
            return Err(QRError::PointAtInfinity);
        }

        Ok(PointF::new(xp / w, yp / w))
    }
}

// Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: [[f64; 8]; 8], mut b: [f64; 8]) -> QRResult<[f64; 8]> {
    for i in 0..8 {
        let max_row = (i..8)
            .max_by(|&r1, &r2| a[r1][i].abs().total_cmp(&a[r2][i].abs()))
            .unwrap_or(i);
        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }

        if a[i][i].abs() < f64::EPSILON {
            return Err(QRError::SingularMatrix);
        }

        let pivot = a[i][i];
        for c in i..8 {
            a[i][c] /= pivot;
        }
        b[i] /= pivot;

        for r in (i + 1)..8 {
            let factor = a[r][i];
            if factor == 0.0 {
                continue;
            }
            for c in i..8 {
                a[r][c] -= factor * a[i][c];
            }
            b[r] -= factor * b[i];
        }
    }

    // Back substitution
    let mut x = [0.0; 8];
    for r in (0..8).rev() {
        let sum: f64 = ((r + 1)..8).map(|c| a[r][c] * x[c]).sum();
        x[r] = b[r] - sum;
    }
    Ok(x)
}
