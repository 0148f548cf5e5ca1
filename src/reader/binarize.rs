use std::collections::VecDeque;

use num_traits::ToPrimitive;

use crate::common::error::{QRError, QRResult};

use super::luma::LumaGrid;
use super::utils::geometry::PointF;

// Bit matrix
//------------------------------------------------------------------------------

/// Monochrome grid where `true` is a dark module. Holds both the binarized
/// page and the sampled module grid of a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    pub w: u32,
    pub h: u32,
    bits: Vec<bool>,
}

impl BitMatrix {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h, bits: vec![false; (w * h) as usize] }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return None;
        }
        Some(y as usize * self.w as usize + x as usize)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<bool> {
        self.index(x, y).map(|i| self.bits[i])
    }

    /// Out of bounds reads as light.
    #[inline]
    pub fn is_dark(&self, x: i32, y: i32) -> bool {
        self.get(x, y).unwrap_or(false)
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, dark: bool) {
        if let Some(i) = self.index(x, y) {
            self.bits[i] = dark;
        }
    }

    pub fn count_dark(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Samples the pixel under a continuous position. Positions up to one
    /// pixel outside the image are clamped onto the border.
    pub fn sample(&self, p: PointF) -> QRResult<bool> {
        let (w, h) = (self.w as f64, self.h as f64);
        if !(-1.0..=w + 1.0).contains(&p.x) || !(-1.0..=h + 1.0).contains(&p.y) {
            return Err(QRError::SymbolOutOfBounds);
        }
        let x = p.x.floor().to_i32().ok_or(QRError::SymbolOutOfBounds)?;
        let y = p.y.floor().to_i32().ok_or(QRError::SymbolOutOfBounds)?;
        let x = x.clamp(0, self.w as i32 - 1);
        let y = y.clamp(0, self.h as i32 - 1);
        Ok(self.is_dark(x, y))
    }
}

// Exclusion painting
//------------------------------------------------------------------------------

impl BitMatrix {
    /// Paints every pixel in the inclusive rectangle, clipped to the image.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, dark: bool) {
        let (x0, y0) = (x0.max(0), y0.max(0));
        let (x1, y1) = (x1.min(self.w as i32 - 1), y1.min(self.h as i32 - 1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set(x, y, dark);
            }
        }
    }

    /// Paints every pixel whose centre lies inside the convex quadrilateral.
    /// Corners may wind either way but must be in order around the outline.
    pub fn fill_quad(&mut self, quad: &[PointF; 4], dark: bool) {
        let min_x = quad.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = quad.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = quad.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = quad.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let clip = |v: f64, hi: u32| v.floor().max(0.0).min(hi as f64 - 1.0).to_i32();
        let (Some(x0), Some(x1), Some(y0), Some(y1)) =
            (clip(min_x, self.w), clip(max_x, self.w), clip(min_y, self.h), clip(max_y, self.h))
        else {
            return;
        };

        for y in y0..=y1 {
            for x in x0..=x1 {
                let c = PointF::new(x as f64 + 0.5, y as f64 + 0.5);
                if inside_convex(quad, &c) {
                    self.set(x, y, dark);
                }
            }
        }
    }
}

fn inside_convex(quad: &[PointF; 4], p: &PointF) -> bool {
    let mut pos = false;
    let mut neg = false;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let side = (b - a).cross(&(*p - a));
        pos |= side > 0.0;
        neg |= side < 0.0;
    }
    !(pos && neg)
}

// Binarizer
// 1. Splits the image into 8x8 blocks, partial at the right and bottom edges
// 2. Blocks with max - min > 24 take the midpoint of their range as threshold
// 3. Low contrast blocks inherit the threshold of the nearest high contrast
//    block, found by a breadth first flood over the block grid
// 4. Thresholds are smoothed over the 5x5 block neighbourhood
// 5. A pixel is dark when its value is less than or equal to the threshold
//------------------------------------------------------------------------------

const BLOCK_SIZE: u32 = 8;
const MIN_DYNAMIC_RANGE: u8 = 24;

impl BitMatrix {
    pub fn prepare(img: &LumaGrid) -> QRResult<Self> {
        let (bw, bh) = (img.w.div_ceil(BLOCK_SIZE), img.h.div_ceil(BLOCK_SIZE));
        let local = block_thresholds(img, bw, bh)?;
        let thresh = smooth_thresholds(&local, bw, bh);

        let mut res = Self::new(img.w, img.h);
        for y in 0..img.h {
            let row_off = (y / BLOCK_SIZE) * bw;
            for x in 0..img.w {
                let t = thresh[(row_off + x / BLOCK_SIZE) as usize];
                if img.get(x, y) <= t {
                    res.bits[(y * img.w + x) as usize] = true;
                }
            }
        }
        Ok(res)
    }
}

fn block_thresholds(img: &LumaGrid, bw: u32, bh: u32) -> QRResult<Vec<u8>> {
    let len = (bw * bh) as usize;
    let mut min_max = vec![(u8::MAX, u8::MIN); len];
    for y in 0..img.h {
        let row_off = (y / BLOCK_SIZE) * bw;
        for x in 0..img.w {
            let p = img.get(x, y);
            let mm = &mut min_max[(row_off + x / BLOCK_SIZE) as usize];
            mm.0 = mm.0.min(p);
            mm.1 = mm.1.max(p);
        }
    }

    let mut thresh: Vec<Option<u8>> = min_max
        .iter()
        .map(|&(mn, mx)| {
            (mx - mn > MIN_DYNAMIC_RANGE).then(|| ((mn as u16 + mx as u16) / 2) as u8)
        })
        .collect();

    // Multi source flood from every high contrast block, in index order
    let mut queue: VecDeque<usize> = (0..len).filter(|&i| thresh[i].is_some()).collect();
    if queue.is_empty() {
        return Err(QRError::Binarization);
    }

    let (bw, bh) = (bw as usize, bh as usize);
    while let Some(i) = queue.pop_front() {
        let t = thresh[i];
        let (bx, by) = (i % bw, i / bw);
        let mut nbrs = [None; 4];
        if by > 0 {
            nbrs[0] = Some(i - bw);
        }
        if bx > 0 {
            nbrs[1] = Some(i - 1);
        }
        if bx + 1 < bw {
            nbrs[2] = Some(i + 1);
        }
        if by + 1 < bh {
            nbrs[3] = Some(i + bw);
        }
        for n in nbrs.into_iter().flatten() {
            if thresh[n].is_none() {
                thresh[n] = t;
                queue.push_back(n);
            }
        }
    }

    Ok(thresh.into_iter().map(|t| t.unwrap_or(u8::MAX / 2)).collect())
}

fn smooth_thresholds(local: &[u8], bw: u32, bh: u32) -> Vec<u8> {
    let (bw, bh) = (bw as i64, bh as i64);
    let mut res = vec![0u8; local.len()];
    for by in 0..bh {
        for bx in 0..bw {
            let (mut sum, mut cnt) = (0u32, 0u32);
            for ny in (by - 2).max(0)..=(by + 2).min(bh - 1) {
                for nx in (bx - 2).max(0)..=(bx + 2).min(bw - 1) {
                    sum += local[(ny * bw + nx) as usize] as u32;
                    cnt += 1;
                }
            }
            res[(by * bw + bx) as usize] = (sum / cnt) as u8;
        }
    }
    res
}
