use std::ops::{Add, Mul, Sub};

use num_traits::ToPrimitive;

// Point
//------------------------------------------------------------------------------

/// Integer pixel position.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Continuous image position. Pixel `(x, y)` covers `[x, x + 1) × [y, y + 1)`,
/// so its centre is at `(x + 0.5, y + 0.5)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dist(&self, other: &PointF) -> f64 {
        let (dx, dy) = (self.x - other.x, self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: &PointF) -> f64 {
        self.x * other.x + self.y * other.y
    }

    // Positive when `other` is clockwise from `self` on screen (y down)
    pub fn cross(&self, other: &PointF) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Pixel containing this position, if it fits in `i32`.
    pub fn to_pixel(&self) -> Option<Point> {
        Some(Point { x: self.x.floor().to_i32()?, y: self.y.floor().to_i32()? })
    }
}

impl Add for PointF {
    type Output = PointF;
    fn add(self, rhs: PointF) -> PointF {
        PointF::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PointF {
    type Output = PointF;
    fn sub(self, rhs: PointF) -> PointF {
        PointF::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for PointF {
    type Output = PointF;
    fn mul(self, rhs: f64) -> PointF {
        PointF::new(self.x * rhs, self.y * rhs)
    }
}

// Scan directions for cross checks
//------------------------------------------------------------------------------

pub trait Axis {
    const DX: i32;
    const DY: i32;

    #[inline]
    fn shift(pos: &Point, steps: i32) -> Point {
        Point { x: pos.x + Self::DX * steps, y: pos.y + Self::DY * steps }
    }
}

pub struct X;
impl Axis for X {
    const DX: i32 = 1;
    const DY: i32 = 0;
}

pub struct Y;
impl Axis for Y {
    const DX: i32 = 0;
    const DY: i32 = 1;
}

// Top left to bottom right
pub struct Diag;
impl Axis for Diag {
    const DX: i32 = 1;
    const DY: i32 = 1;
}

// Bottom left to top right
pub struct AntiDiag;
impl Axis for AntiDiag {
    const DX: i32 = 1;
    const DY: i32 = -1;
}

// Digital line walk
//------------------------------------------------------------------------------

/// Pixels visited by a straight walk from `from` to `to`, one pixel per step
/// along the dominant direction. Both ends are included.
#[derive(Debug, Clone)]
pub struct LineWalk {
    cur: PointF,
    inc: PointF,
    left: usize,
}

impl LineWalk {
    pub fn new(from: PointF, to: PointF) -> Self {
        let d = to - from;
        let steps = d.x.abs().max(d.y.abs()).ceil().to_usize().unwrap_or(0);
        let inc = if steps == 0 { PointF::default() } else { d * (1.0 / steps as f64) };
        Self { cur: from, inc, left: steps + 1 }
    }
}

impl Iterator for LineWalk {
    type Item = Point;

    fn next(&mut self) -> Option<Self::Item> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;

        let res = self.cur.to_pixel();
        self.cur = self.cur + self.inc;
        res
    }
}

#[cfg(test)]
mod geometry_tests {
    use super::{Axis, LineWalk, Point, PointF, AntiDiag, Diag};

    #[test]
    fn test_vector_ops() {
        let a = PointF::new(3.0, 0.0);
        let b = PointF::new(0.0, 4.0);
        assert_eq!(a.dist(&b), 5.0);
        assert_eq!(a.dot(&b), 0.0);
        assert!(a.cross(&b) > 0.0);
        assert!(b.cross(&a) < 0.0);
        assert_eq!((a + b) * 2.0, PointF::new(6.0, 8.0));
        assert_eq!((b - a).norm(), 5.0);
    }

    #[test]
    fn test_to_pixel() {
        assert_eq!(PointF::new(2.9, 0.1).to_pixel(), Some(Point::new(2, 0)));
        assert_eq!(PointF::new(-0.5, 3.0).to_pixel(), Some(Point::new(-1, 3)));
        assert_eq!(PointF::new(f64::NAN, 3.0).to_pixel(), None);
        assert_eq!(PointF::new(1e12, 3.0).to_pixel(), None);
    }

    #[test]
    fn test_axis_shift() {
        let p = Point::new(5, 5);
        assert_eq!(Diag::shift(&p, 2), Point::new(7, 7));
        assert_eq!(AntiDiag::shift(&p, 2), Point::new(7, 3));
        assert_eq!(AntiDiag::shift(&p, -1), Point::new(4, 6));
    }

    #[test]
    fn test_line_walk() {
        let pts: Vec<Point> =
            LineWalk::new(PointF::new(0.5, 0.5), PointF::new(4.5, 2.5)).collect();
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], Point::new(0, 0));
        assert_eq!(pts[2], Point::new(2, 1));
        assert_eq!(pts[4], Point::new(4, 2));

        let single: Vec<Point> =
            LineWalk::new(PointF::new(1.5, 1.5), PointF::new(1.5, 1.5)).collect();
        assert_eq!(single, vec![Point::new(1, 1)]);
    }
}
