use std::ops::Deref;

// Mask pattern
//------------------------------------------------------------------------------

/// One of the 8 data masks. A module at column `x`, row `y` is inverted when
/// the mask condition holds.
#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid masking pattern");
        Self(pattern & 0b111)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

mod mask_conditions {
    pub fn checkerboard(x: i32, y: i32) -> bool {
        (x + y) & 1 == 0
    }

    pub fn horizontal_lines(_: i32, y: i32) -> bool {
        y & 1 == 0
    }

    pub fn vertical_lines(x: i32, _: i32) -> bool {
        x % 3 == 0
    }

    pub fn diagonal_lines(x: i32, y: i32) -> bool {
        (x + y) % 3 == 0
    }

    pub fn large_checkerboard(x: i32, y: i32) -> bool {
        ((y >> 1) + (x / 3)) & 1 == 0
    }

    pub fn fields(x: i32, y: i32) -> bool {
        ((x * y) & 1) + ((x * y) % 3) == 0
    }

    pub fn diamonds(x: i32, y: i32) -> bool {
        (((x * y) & 1) + ((x * y) % 3)) & 1 == 0
    }

    pub fn meadow(x: i32, y: i32) -> bool {
        (((x + y) & 1) + ((x * y) % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_condition(self) -> fn(i32, i32) -> bool {
        match self.0 {
            0b000 => mask_conditions::checkerboard,
            0b001 => mask_conditions::horizontal_lines,
            0b010 => mask_conditions::vertical_lines,
            0b011 => mask_conditions::diagonal_lines,
            0b100 => mask_conditions::large_checkerboard,
            0b101 => mask_conditions::fields,
            0b110 => mask_conditions::diamonds,
            _ => mask_conditions::meadow,
        }
    }

    /// Removes the mask from a sampled module value.
    #[inline]
    pub fn unmask(self, x: i32, y: i32, dark: bool) -> bool {
        dark ^ (self.mask_condition())(x, y)
    }
}
