use tracing::{debug, trace};

use super::binarize::BitMatrix;
use super::utils::{
    geometry::{AntiDiag, Diag, LineWalk, Point, PointF, X, Y},
    homography::Homography,
    matches_ratio, verify_pattern,
};

pub(crate) const FINDER_PATTERN: [f64; 5] = [1.0, 1.0, 3.0, 1.0, 1.0];

// Each run may be off by half its expected length
const RUN_TOLERANCE: f64 = 0.5;
// Diagonals cross pixels at 45 degrees and get more slack
const DIAG_TOLERANCE: f64 = 0.75;
// Patterns confirmed by fewer rows are discarded
const MIN_ROW_HITS: u32 = 2;

// Finder pattern
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderPattern {
    pub centre: PointF,
    /// Estimated module size in pixels.
    pub module: f64,
    /// Number of row hits merged into this pattern.
    pub count: u32,
}

impl FinderPattern {
    fn is_near(&self, other: &FinderPattern) -> bool {
        let d = self.centre - other.centre;
        d.x.abs() <= self.module
            && d.y.abs() <= self.module
            && (self.module - other.module).abs() <= self.module
    }

    fn merge(&mut self, other: &FinderPattern) {
        let (n, m) = (self.count as f64, other.count as f64);
        let avg = |a: f64, b: f64| (a * n + b * m) / (n + m);
        self.centre =
            PointF::new(avg(self.centre.x, other.centre.x), avg(self.centre.y, other.centre.y));
        self.module = avg(self.module, other.module);
        self.count += other.count;
    }
}

// Row hit: 1:1:3:1:1 found on one row
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct RowHit {
    x: f64, // Centre of the middle run
    y: u32,
    total: u32,
}

// Run length state machine over one row
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct LineScanner {
    buffer: [u32; 6],   // Run lengths, newest last
    prev: Option<bool>, // Last observed colour
    flips: u32,         // Runs started on this row
    pos: u32,           // Pixels consumed on this row
    y: u32,
}

impl LineScanner {
    fn new() -> Self {
        Self { buffer: [0; 6], prev: None, flips: 0, pos: 0, y: 0 }
    }

    fn reset(&mut self, y: u32) {
        *self = Self { y, ..Self::new() };
    }

    // Feeds the next pixel. Completing a dark run may complete a pattern.
    fn advance(&mut self, dark: bool) -> Option<RowHit> {
        self.pos += 1;

        if self.prev == Some(dark) {
            self.buffer[5] += 1;
            return None;
        }

        self.buffer.rotate_left(1);
        self.buffer[5] = 1;
        self.prev = Some(dark);
        self.flips += 1;

        // The five finished runs must end with a dark one
        if dark || self.flips < 6 {
            return None;
        }
        if !matches_ratio(&self.buffer[..5], &FINDER_PATTERN, RUN_TOLERANCE) {
            return None;
        }

        let end = (self.pos - 1) as f64;
        let x = end - (self.buffer[4] + self.buffer[3]) as f64 - self.buffer[2] as f64 / 2.0;
        Some(RowHit { x, y: self.y, total: self.buffer[..5].iter().sum() })
    }
}

// Locate finders
//------------------------------------------------------------------------------

/// Scans every row for 1:1:3:1:1 cross sections, confirms each along the
/// vertical, horizontal and both diagonals, and merges confirmations of the
/// same pattern. At most `max_candidates` patterns are returned, best
/// supported first.
pub fn locate_finders(img: &BitMatrix, max_candidates: usize) -> Vec<FinderPattern> {
    let mut finders: Vec<FinderPattern> = Vec::new();
    let mut scanner = LineScanner::new();

    for y in 0..img.h {
        scanner.reset(y);
        for x in 0..img.w {
            if let Some(hit) = scanner.advance(img.is_dark(x as i32, y as i32)) {
                add_confirmed(img, &hit, &mut finders);
            }
        }

        // Flushes a pattern touching the right edge
        if let Some(hit) = scanner.advance(false) {
            add_confirmed(img, &hit, &mut finders);
        }
    }

    finders.retain(|f| f.count >= MIN_ROW_HITS);
    finders.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(a.centre.y.total_cmp(&b.centre.y))
            .then(a.centre.x.total_cmp(&b.centre.x))
    });
    finders.truncate(max_candidates);

    trace!("Located {} finder candidates", finders.len());
    finders
}

fn add_confirmed(img: &BitMatrix, hit: &RowHit, finders: &mut Vec<FinderPattern>) {
    let Some(cand) = confirm(img, hit) else {
        return;
    };

    match finders.iter_mut().find(|f| f.is_near(&cand)) {
        Some(f) => f.merge(&cand),
        None => finders.push(cand),
    }
}

// Cross checks a row hit. The vertical pass refines y, a second horizontal
// pass refines x, then both diagonals must agree.
fn confirm(img: &BitMatrix, hit: &RowHit) -> Option<FinderPattern> {
    let max_run = hit.total;
    let seed = PointF::new(hit.x, hit.y as f64 + 0.5).to_pixel()?;

    let vert = verify_pattern::<Y>(img, &seed, &FINDER_PATTERN, max_run, RUN_TOLERANCE)?;
    if 5 * hit.total.abs_diff(vert.total) >= 2 * hit.total {
        return None;
    }
    let cy = seed.y as f64 + vert.offset;

    let seed = PointF::new(hit.x, cy).to_pixel()?;
    let horz = verify_pattern::<X>(img, &seed, &FINDER_PATTERN, max_run, RUN_TOLERANCE)?;
    let cx = seed.x as f64 + horz.offset;

    let seed = PointF::new(cx, cy).to_pixel()?;
    let max_diag = max_run * 2;
    verify_pattern::<Diag>(img, &seed, &FINDER_PATTERN, max_diag, DIAG_TOLERANCE)?;
    verify_pattern::<AntiDiag>(img, &seed, &FINDER_PATTERN, max_diag, DIAG_TOLERANCE)?;

    let module = (horz.total + vert.total) as f64 / 14.0;
    Some(FinderPattern { centre: PointF::new(cx, cy), module, count: 1 })
}


// Groups finders in 3, which form potential symbols
//------------------------------------------------------------------------------

// Largest ratio between module sizes in one group
const MAX_MODULE_RATIO: f64 = 1.4;
// Largest |cos| of the corner angle at the top left finder
const MAX_CORNER_COS: f64 = 0.25;
// Largest relative difference between the two legs
const MAX_LEG_SKEW: f64 = 0.25;
// Largest relative disagreement between dimension estimates
const MAX_DIM_SKEW: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct FinderGroup {
    pub finders: [PointF; 3], // [BL, TL, TR]
    pub module: f64,          // Mean module size
    pub dim: usize,           // Provisional grid size, 17 + 4v
    pub timing_errors: usize, // Wrong modules on provisional timing patterns
    pub variance: f64,        // Variance of the three module sizes
    ids: [usize; 3],          // Indices into the located finders
}

impl FinderGroup {
    pub fn bl(&self) -> PointF {
        self.finders[0]
    }

    pub fn tl(&self) -> PointF {
        self.finders[1]
    }

    pub fn tr(&self) -> PointF {
        self.finders[2]
    }

    /// Fourth corner of the parallelogram spanned by the finders.
    pub fn virtual_br(&self) -> PointF {
        self.tr() + self.bl() - self.tl()
    }

    /// Unit directions of the symbol's x and y axes in the image.
    pub fn axes(&self) -> (PointF, PointF) {
        let unit = |v: PointF| v * (1.0 / v.norm());
        (unit(self.tr() - self.tl()), unit(self.bl() - self.tl()))
    }
}

/// Forms symbol candidates from located finders. Every triple that is
/// roughly an isosceles right triangle with agreeing module sizes and
/// plausible timing patterns is a candidate. Candidates are ranked by timing
/// errors, module size variance and position, then picked greedily so that
/// no finder serves two symbols.
pub fn group_finders(img: &BitMatrix, finders: &[FinderPattern]) -> Vec<FinderGroup> {
    let mut all_groups = Vec::new();
    let n = finders.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                if let Some(g) = try_group(img, finders, [i, j, k]) {
                    all_groups.push(g);
                }
            }
        }
    }

    all_groups.sort_by(|a, b| {
        a.timing_errors
            .cmp(&b.timing_errors)
            .then(a.variance.total_cmp(&b.variance))
            .then(a.tl().y.total_cmp(&b.tl().y))
            .then(a.tl().x.total_cmp(&b.tl().x))
    });

    let mut used = vec![false; n];
    let mut res = Vec::new();
    for g in all_groups {
        if g.ids.iter().any(|&i| used[i]) {
            continue;
        }
        g.ids.iter().for_each(|&i| used[i] = true);
        res.push(g);
    }

    debug!("Grouped {} finders into {} candidate symbols", n, res.len());
    res
}

fn try_group(img: &BitMatrix, finders: &[FinderPattern], ids: [usize; 3]) -> Option<FinderGroup> {
    let f = ids.map(|i| finders[i]);

    // Module sizes agree
    let mods = f.map(|p| p.module);
    let min_mod = mods.iter().copied().fold(f64::INFINITY, f64::min);
    let max_mod = mods.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_mod > min_mod * MAX_MODULE_RATIO {
        return None;
    }

    // Top left is opposite the longest side
    let side = |a: usize, b: usize| f[a].centre.dist(&f[b].centre);
    let opposite = [side(1, 2), side(0, 2), side(0, 1)];
    let tl_idx = (0..3).max_by(|&a, &b| opposite[a].total_cmp(&opposite[b]))?;
    let (p1_idx, p2_idx) = ((tl_idx + 1) % 3, (tl_idx + 2) % 3);

    let tl = f[tl_idx].centre;
    let (v1, v2) = (f[p1_idx].centre - tl, f[p2_idx].centre - tl);
    let (l1, l2) = (v1.norm(), v2.norm());
    if l1 <= f64::EPSILON || l2 <= f64::EPSILON {
        return None;
    }
    if (v1.dot(&v2) / (l1 * l2)).abs() > MAX_CORNER_COS {
        return None;
    }
    if (l1 - l2).abs() > MAX_LEG_SKEW * l1.max(l2) {
        return None;
    }

    // Clockwise from TR to BL on screen
    let (tr_idx, bl_idx) = if v1.cross(&v2) > 0.0 { (p1_idx, p2_idx) } else { (p2_idx, p1_idx) };
    let (bl, tr) = (f[bl_idx].centre, f[tr_idx].centre);

    // Cross checks run along the image axes and overestimate the module of a
    // tilted symbol by 1 / cos of the tilt
    let tilt = (axis_cos(v1 * (1.0 / l1)) + axis_cos(v2 * (1.0 / l2))) / 2.0;
    let mods = mods.map(|m| m * tilt);
    let module = mods.iter().sum::<f64>() / 3.0;
    let variance = mods.iter().map(|m| (m - module).powi(2)).sum::<f64>() / 3.0;

    // Dimension from finder spacing and from the timing patterns
    let leg = (l1 + l2) / 2.0;
    let spaced = leg / module + 7.0;
    let top = count_timing_runs(img, tl, tr, bl, module)? as f64 + 12.0;
    let left = count_timing_runs(img, tl, bl, tr, module)? as f64 + 12.0;
    if (top - left).abs() > MAX_DIM_SKEW * top.max(left) {
        return None;
    }
    let timed = (top + left) / 2.0;
    if (timed - spaced).abs() > MAX_DIM_SKEW * spaced {
        return None;
    }

    // Both estimates may round to different sizes. The one whose timing
    // patterns sample cleaner wins.
    let finders = [bl, tl, tr];
    let (dim, timing_errors) = [timed, spaced]
        .into_iter()
        .filter_map(snap_dimension)
        .filter_map(|dim| Some((dim, check_timing(img, &finders, dim)?)))
        .min_by_key(|&(_, errors)| errors)?;

    // Finder spacing along the symbol axes is the most reliable module size
    let module = leg / (dim - 7) as f64;

    let ids = [ids[bl_idx], ids[tl_idx], ids[tr_idx]];
    Some(FinderGroup { finders, module, dim, timing_errors, variance, ids })
}

// Cosine between a unit direction and the nearest image axis
#[inline]
fn axis_cos(dir: PointF) -> f64 {
    dir.x.abs().max(dir.y.abs())
}

// Counts runs along the timing line from the `from` finder towards the `to`
// finder. The line is offset three modules towards `side`, onto the outer
// ring of both finders. A symbol of side n shows n - 12 runs.
fn count_timing_runs(
    img: &BitMatrix,
    from: PointF,
    to: PointF,
    side: PointF,
    module: f64,
) -> Option<usize> {
    let dir = side - from;
    let shift = dir * (3.0 * module / dir.norm());
    let mut walk = LineWalk::new(from + shift, to + shift);

    let first = walk.next()?;
    let mut prev = img.is_dark(first.x, first.y);
    let mut runs = 1;
    for Point { x, y } in walk {
        let dark = img.is_dark(x, y);
        if dark != prev {
            runs += 1;
            prev = dark;
        }
    }
    Some(runs)
}

// Nearest valid grid size
fn snap_dimension(dim: f64) -> Option<usize> {
    let ver = ((dim - 17.0) / 4.0).round();
    if !(1.0..=40.0).contains(&ver) {
        return None;
    }
    Some(ver as usize * 4 + 17)
}

// Samples both timing patterns through the provisional homography and
// counts wrong modules. Fails when more than a quarter are wrong.
fn check_timing(img: &BitMatrix, finders: &[PointF; 3], dim: usize) -> Option<usize> {
    let br = finders[2] + finders[0] - finders[1];
    let far = dim as f64 - 3.5;
    let h = Homography::anchored(finders, br, far, dim).ok()?;

    let mut errors = 0;
    let mut total = 0;
    for i in 8..(dim - 8) {
        let expect = i % 2 == 0;
        let c = i as f64 + 0.5;
        for (x, y) in [(c, 6.5), (6.5, c)] {
            let dark = img.sample(h.project(x, y).ok()?).ok()?;
            total += 1;
            if dark != expect {
                errors += 1;
            }
        }
    }

    (errors * 4 <= total).then_some(errors)
}
