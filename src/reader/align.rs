use num_traits::ToPrimitive;
use tracing::trace;

use super::binarize::BitMatrix;
use super::finder::FinderGroup;
use super::utils::{
    geometry::{Point, PointF, X, Y},
    verify_pattern,
};

const ALIGNMENT_PATTERN: [f64; 3] = [1.0, 1.0, 1.0];

// Search radii in modules, tried in order
const ALLOWANCES: [f64; 3] = [4.0, 8.0, 16.0];

// Locate alignment pattern
//------------------------------------------------------------------------------

/// Expected centre of the bottom right alignment pattern of a symbol of side
/// `dim`. It sits three modules inside the virtual bottom right finder.
pub fn predict_alignment(group: &FinderGroup, dim: usize) -> PointF {
    let tl = group.tl();
    let frac = 1.0 - 3.0 / (dim as f64 - 7.0);
    tl + (group.virtual_br() - tl) * frac
}

/// Searches growing windows around the predicted centre and returns the
/// confirmed centre nearest to the prediction. Version 1 has no alignment
/// pattern.
pub fn locate_alignment(img: &BitMatrix, group: &FinderGroup, dim: usize) -> Option<PointF> {
    if dim < 25 {
        return None;
    }

    let pred = predict_alignment(group, dim);
    for allowance in ALLOWANCES {
        let best = search_window(img, pred, group, allowance)
            .into_iter()
            .min_by(|a, b| a.dist(&pred).total_cmp(&b.dist(&pred)));
        if let Some(centre) = best {
            trace!("Alignment found at {centre:?}, predicted {pred:?}");
            return Some(centre);
        }
    }

    trace!("No alignment pattern near {pred:?}");
    None
}

fn search_window(
    img: &BitMatrix,
    pred: PointF,
    group: &FinderGroup,
    allowance: f64,
) -> Vec<PointF> {
    let r = allowance * group.module;
    // Length of one module along an image row or column
    let (u, v) = group.axes();
    let step = group.module / u.x.abs().max(u.y.abs());
    let clip = |v: f64, hi: u32| v.max(0.0).min(hi as f64 - 1.0).to_i32();
    let (Some(x0), Some(x1), Some(y0), Some(y1)) = (
        clip((pred.x - r).floor(), img.w),
        clip((pred.x + r).ceil(), img.w),
        clip((pred.y - r).floor(), img.h),
        clip((pred.y + r).ceil(), img.h),
    ) else {
        return Vec::new();
    };

    let mut res = Vec::new();
    for y in y0..=y1 {
        let mut start = None;
        // One step past the window closes a trailing run
        for x in x0..=x1 + 1 {
            let dark = x <= x1 && img.is_dark(x, y);
            match (dark, start) {
                (true, None) => start = Some(x),
                (false, Some(s)) => {
                    start = None;
                    let len = (x - s) as f64;
                    if !agrees(len, step) {
                        continue;
                    }
                    let seed = PointF::new(s as f64 + len / 2.0, y as f64 + 0.5);
                    if let Some(c) = confirm(img, seed, step, (u, v), group.module) {
                        res.push(c);
                    }
                }
                _ => {}
            }
        }
    }
    res
}

#[inline]
fn agrees(len: f64, module: f64) -> bool {
    (len - module).abs() <= (module / 2.0).max(1.0)
}

// Light-dark-light cross sections along both image axes, then light inner
// ring corners and dark outer ring corners along the symbol axes
fn confirm(
    img: &BitMatrix,
    seed: PointF,
    step: f64,
    (u, v): (PointF, PointF),
    module: f64,
) -> Option<PointF> {
    let max_run = (step * 2.0).ceil().to_u32()? + 1;

    let seed_px = seed.to_pixel()?;
    let vert = verify_pattern::<Y>(img, &seed_px, &ALIGNMENT_PATTERN, max_run, 0.5)?;
    if !agrees(vert.total as f64 / 3.0, step) {
        return None;
    }
    let cy = seed_px.y as f64 + vert.offset;

    let seed_px = PointF::new(seed.x, cy).to_pixel()?;
    let horz = verify_pattern::<X>(img, &seed_px, &ALIGNMENT_PATTERN, max_run, 0.5)?;
    if !agrees(horz.total as f64 / 3.0, step) {
        return None;
    }
    let cx = seed_px.x as f64 + horz.offset;

    let centre = PointF::new(cx, cy);
    for (dx, dy) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
        let corner = u * dx + v * dy;
        let Point { x, y } = (centre + corner * module).to_pixel()?;
        if img.is_dark(x, y) {
            return None;
        }
        let Point { x, y } = (centre + corner * (2.0 * module)).to_pixel()?;
        if !img.is_dark(x, y) {
            return None;
        }
    }
    Some(centre)
}

#[cfg(test)]
mod align_tests {
    use image::Luma;
    use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
    use qrcode::EcLevel;

    use super::{locate_alignment, predict_alignment};
    use crate::reader::binarize::BitMatrix;
    use crate::reader::finder::{group_finders, locate_finders};
    use crate::reader::luma::Luminance;
    use crate::reader::test_utils::{qr_code, render};

    fn prepare(ver: i16) -> BitMatrix {
        let code = qr_code("ALIGNMENT 0123", ver, EcLevel::M);
        let img = render(&code, 4, 4).to_luma_grid().unwrap();
        BitMatrix::prepare(&img).unwrap()
    }

    #[test]
    fn test_predict_alignment() {
        let img = prepare(2);
        let groups = group_finders(&img, &locate_finders(&img, 16));
        assert_eq!(groups.len(), 1);
        let pred = predict_alignment(&groups[0], 25);
        // Module 18.5 at 4 px per module after a 16 px margin
        assert!((pred.x - 90.0).abs() < 1e-9);
        assert!((pred.y - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_locate_alignment() {
        for ver in [2, 7, 14] {
            let img = prepare(ver);
            let groups = group_finders(&img, &locate_finders(&img, 16));
            assert_eq!(groups.len(), 1);
            let dim = groups[0].dim;
            assert_eq!(dim, ver as usize * 4 + 17);

            let centre = locate_alignment(&img, &groups[0], dim).unwrap();
            let exp = 16.0 + (dim as f64 - 6.5) * 4.0;
            assert_eq!((centre.x, centre.y), (exp, exp), "version {ver}");
        }
    }

    #[test]
    fn test_locate_alignment_tilted() {
        let code = qr_code("ALIGNMENT 0123", 5, EcLevel::M);
        let img = render(&code, 4, 14);
        let img = rotate_about_center(&img, 0.7, Interpolation::Bilinear, Luma([255]));
        let img = BitMatrix::prepare(&img.to_luma_grid().unwrap()).unwrap();

        let groups = group_finders(&img, &locate_finders(&img, 16));
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        let pred = predict_alignment(g, g.dim);
        let centre = locate_alignment(&img, g, g.dim).unwrap();
        assert!(centre.dist(&pred) < 2.0 * g.module, "{centre:?} vs {pred:?}");
    }

    #[test]
    fn test_missing_alignment() {
        let img = prepare(2);
        let groups = group_finders(&img, &locate_finders(&img, 16));
        // Version 1 never has one
        assert_eq!(locate_alignment(&img, &groups[0], 21), None);

        // Keep the finders only
        let mut bare = BitMatrix::new(img.w, img.h);
        for (ox, oy) in [(16, 16), (88, 16), (16, 88)] {
            for y in oy..oy + 28 {
                for x in ox..ox + 28 {
                    bare.set(x, y, img.is_dark(x, y));
                }
            }
        }
        assert_eq!(locate_alignment(&bare, &groups[0], 25), None);
    }
}
