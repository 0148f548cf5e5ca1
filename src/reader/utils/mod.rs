use geometry::{Axis, Point};

use super::binarize::BitMatrix;

pub mod geometry;
pub mod homography;

// Run ratio check shared by the row scanner and the cross checks
//------------------------------------------------------------------------------

/// Checks run lengths against a pattern such as 1:1:3:1:1. Each run may
/// deviate from its expected length by `tol` times that length.
pub fn matches_ratio(runs: &[u32], pattern: &[f64], tol: f64) -> bool {
    let total: u32 = runs.iter().sum();
    let units: f64 = pattern.iter().sum();
    if (total as f64) < units {
        return false;
    }

    let module = total as f64 / units;
    runs.iter().zip(pattern).all(|(&r, &p)| (module * p - r as f64).abs() < module * p * tol)
}

// Cross section through a seed pixel
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSection {
    /// Centre of the middle run relative to the seed pixel's leading edge,
    /// in steps along the axis.
    pub offset: f64,
    /// Sum of all runs.
    pub total: u32,
}

/// Collects the runs around `seed` along axis `A`, centred on the run
/// containing the seed, and validates them against `pattern`. Used for the
/// 1:1:3:1:1 finder and the 1:1:1 alignment cross checks.
pub fn verify_pattern<A: Axis>(
    img: &BitMatrix,
    seed: &Point,
    pattern: &[f64],
    max_run: u32,
    tol: f64,
) -> Option<CrossSection> {
    let centre = img.get(seed.x, seed.y)?;
    let len = pattern.len();
    let half = len / 2;
    let mut runs = vec![0u32; len];

    // Count backwards, excluding the seed
    let mut i = half;
    let mut color = centre;
    let mut pos = *seed;
    loop {
        pos = A::shift(&pos, -1);
        match img.get(pos.x, pos.y) {
            None => break,
            Some(c) if c != color => {
                if i == 0 {
                    break;
                }
                i -= 1;
                color = c;
            }
            _ => {}
        }
        runs[i] += 1;
        if runs[i] > max_run {
            return None;
        }
    }
    let back = runs[half];

    // Count forwards, including the seed
    let mut i = half;
    let mut color = centre;
    let mut pos = *seed;
    loop {
        match img.get(pos.x, pos.y) {
            None => break,
            Some(c) if c != color => {
                if i == len - 1 {
                    break;
                }
                i += 1;
                color = c;
            }
            _ => {}
        }
        runs[i] += 1;
        if runs[i] > max_run {
            return None;
        }
        pos = A::shift(&pos, 1);
    }
    let fwd = runs[half] - back;

    // Unfinished runs at the image border
    if runs.contains(&0) || !matches_ratio(&runs, pattern, tol) {
        return None;
    }

    let offset = (fwd as f64 - back as f64) / 2.0;
    Some(CrossSection { offset, total: runs.iter().sum() })
}

#[cfg(test)]
mod pattern_tests {
    use super::geometry::{Diag, Point, X, Y};
    use super::{matches_ratio, verify_pattern};
    use crate::reader::binarize::BitMatrix;

    const FINDER: [f64; 5] = [1.0, 1.0, 3.0, 1.0, 1.0];

    // 7x7 finder at 3 px per module with its top left corner at (2, 2)
    fn finder_image() -> BitMatrix {
        let mut img = BitMatrix::new(27, 27);
        img.fill_rect(2, 2, 22, 22, true);
        img.fill_rect(5, 5, 19, 19, false);
        img.fill_rect(8, 8, 16, 16, true);
        img
    }

    #[test]
    fn test_matches_ratio() {
        assert!(matches_ratio(&[4, 4, 12, 4, 4], &FINDER, 0.5));
        assert!(matches_ratio(&[3, 5, 11, 4, 5], &FINDER, 0.5));
        assert!(!matches_ratio(&[4, 4, 4, 4, 4], &FINDER, 0.5));
        assert!(!matches_ratio(&[1, 1, 1, 1, 1], &FINDER, 0.5));
        assert!(matches_ratio(&[5, 6, 5], &[1.0, 1.0, 1.0], 0.5));
    }

    #[test]
    fn test_verify_finder() {
        let img = finder_image();
        let seed = Point::new(10, 12);

        let cs = verify_pattern::<X>(&img, &seed, &FINDER, 30, 0.5).unwrap();
        assert_eq!(cs.total, 21);
        assert_eq!(10.0 + cs.offset, 12.5);

        let cs = verify_pattern::<Y>(&img, &seed, &FINDER, 30, 0.5).unwrap();
        assert_eq!(12.0 + cs.offset, 12.5);

        assert!(verify_pattern::<Diag>(&img, &Point::new(12, 12), &FINDER, 30, 0.5).is_some());
    }

    #[test]
    fn test_verify_rejects() {
        let img = finder_image();
        // Seed on the ring
        assert!(verify_pattern::<X>(&img, &Point::new(3, 12), &FINDER, 30, 0.5).is_none());
        // Runs longer than allowed
        assert!(verify_pattern::<X>(&img, &Point::new(12, 12), &FINDER, 5, 0.5).is_none());
        // Outside the image
        assert!(verify_pattern::<X>(&img, &Point::new(-1, 12), &FINDER, 30, 0.5).is_none());
    }

    #[test]
    fn test_pattern_at_border() {
        // Finder touching the left edge still verifies, the outer run ends
        // at the border
        let mut img = BitMatrix::new(24, 21);
        img.fill_rect(0, 0, 20, 20, true);
        img.fill_rect(3, 3, 17, 17, false);
        img.fill_rect(6, 6, 14, 14, true);
        let cs = verify_pattern::<X>(&img, &Point::new(10, 10), &FINDER, 30, 0.5).unwrap();
        assert_eq!(10.0 + cs.offset, 10.5);
    }
}
