use super::metadata::Version;

// Iterator over the data region of a symbol
//------------------------------------------------------------------------------

/// Yields `(x, y)` of every module that carries codeword bits, in placement
/// order: two-column strips from the right edge, alternating upwards and
/// downwards, skipping the vertical timing column and all function patterns.
#[derive(Clone)]
pub struct DataRegionIter {
    x: i32,
    y: i32,
    w: i32,
    ap: Vec<i32>, // Alignment pattern centres
    ver: Version,
}

const VERT_TIMING_COL: i32 = 6;

impl DataRegionIter {
    pub fn new(ver: Version) -> Self {
        let w = ver.width() as i32;
        Self { x: w - 1, y: w - 1, w, ap: ver.alignment_pattern(), ver }
    }
}

/// Checks if the module belongs to a finder, separator, timing, alignment,
/// format or version region.
pub fn is_function_module(ver: Version, ap: &[i32], x: i32, y: i32) -> bool {
    let w = ver.width() as i32;

    // Top left finder & format info
    if x < 9 && y < 9 {
        return true;
    }

    // Top right finder & format info
    if x >= w - 8 && y < 9 {
        return true;
    }

    // Bottom left finder, format info & dark module
    if x < 9 && y >= w - 8 {
        return true;
    }

    if x == VERT_TIMING_COL || y == VERT_TIMING_COL {
        return true;
    }

    if *ver >= 7 {
        if (w - 11..=w - 9).contains(&x) && (0..=5).contains(&y) {
            return true;
        }
        if (0..=5).contains(&x) && (w - 11..=w - 9).contains(&y) {
            return true;
        }
    }

    let last = w - 7;
    for &ax in ap {
        for &ay in ap {
            if (ax == 6 && (ay == 6 || ay == last)) || (ax == last && ay == 6) {
                continue;
            }
            if (ax - 2..=ax + 2).contains(&x) && (ay - 2..=ay + 2).contains(&y) {
                return true;
            }
        }
    }

    false
}

impl Iterator for DataRegionIter {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.x < 0 {
            return None;
        }

        let res = (self.x, self.y);

        loop {
            let adjusted_x = if self.x <= VERT_TIMING_COL { self.x + 1 } else { self.x };
            let col_type = (self.w - adjusted_x) % 4;

            match col_type {
                2 if self.y > 0 => {
                    self.y -= 1;
                    self.x += 1;
                }
                0 if self.y < self.w - 1 => {
                    self.y += 1;
                    self.x += 1;
                }
                0 | 2 if self.x == VERT_TIMING_COL + 1 => {
                    self.x -= 2;
                }
                _ => {
                    self.x -= 1;
                }
            }

            if self.x < 0 || !is_function_module(self.ver, &self.ap, self.x, self.y) {
                break;
            }
        }

        Some(res)
    }
}

#[cfg(test)]
mod iter_tests {
    use super::{is_function_module, DataRegionIter};
    use crate::common::metadata::Version;

    #[test]
    fn test_data_region_iter() {
        for v in 1..=40 {
            let ver = Version::new(v).unwrap();
            let count = DataRegionIter::new(ver).count();
            assert_eq!(count, ver.raw_data_modules(), "Version {v}");
        }
    }

    #[test]
    fn test_data_region_order() {
        let ver = Version::new(1).unwrap();
        let head: Vec<_> = DataRegionIter::new(ver).take(6).collect();
        assert_eq!(head, [(20, 20), (19, 20), (20, 19), (19, 19), (20, 18), (19, 18)]);

        // First strip turns downwards at the top
        let turn: Vec<_> = DataRegionIter::new(ver).skip(24).take(2).collect();
        assert_eq!(turn, [(18, 9), (17, 9)]);
    }

    #[test]
    fn test_no_duplicates() {
        let ver = Version::new(7).unwrap();
        let mut coords: Vec<_> = DataRegionIter::new(ver).collect();
        let len = coords.len();
        coords.sort_unstable();
        coords.dedup();
        assert_eq!(coords.len(), len);
    }

    #[test]
    fn test_function_modules() {
        let ver = Version::new(7).unwrap();
        let ap = ver.alignment_pattern();
        assert!(is_function_module(ver, &ap, 22, 22));
        assert!(is_function_module(ver, &ap, 34, 0));
        assert!(is_function_module(ver, &ap, 8, 37));
        assert!(!is_function_module(ver, &ap, 6 + 3, 22 + 3));
        // Hidden alignment positions collide with finders
        assert!(!is_function_module(ver, &ap, 10, 38));
    }
}
