use std::fmt::{Display, Formatter};
use std::ops::Deref;

use super::mask::MaskPattern;

// Version
//------------------------------------------------------------------------------

/// QR model 2 version, 1 to 40.
#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct Version(usize);

impl Deref for Version {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{}", self.0)
    }
}

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    pub fn new(ver: usize) -> Option<Self> {
        (1..=40).contains(&ver).then_some(Self(ver))
    }

    pub fn from_grid_size(size: usize) -> Option<Self> {
        if size < 21 || (size - 17) % 4 != 0 {
            return None;
        }
        Self::new((size - 17) / 4)
    }

    /// Side length of the module grid.
    pub const fn width(self) -> usize {
        self.0 * 4 + 17
    }

    /// Centre coordinates of alignment patterns along one axis. The full set
    /// is the cartesian product, minus the three corners hidden by finders.
    pub fn alignment_pattern(self) -> Vec<i32> {
        let ver = self.0 as i32;
        if ver == 1 {
            return Vec::new();
        }
        let count = ver / 7 + 2;
        let step = if ver == 32 { 26 } else { (ver * 4 + count * 2 + 1) / (count * 2 - 2) * 2 };
        let mut res = vec![6; count as usize];
        let mut pos = self.width() as i32 - 7;
        for i in (1..count as usize).rev() {
            res[i] = pos;
            pos -= step;
        }
        res
    }

    /// Number of modules left for codewords once every function pattern is
    /// placed, remainder bits included.
    pub fn raw_data_modules(self) -> usize {
        let ver = self.0;
        let mut res = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let count = ver / 7 + 2;
            res -= (25 * count - 10) * count - 55;
            if ver >= 7 {
                res -= 36;
            }
        }
        res
    }

    pub fn total_codewords(self) -> usize {
        self.raw_data_modules() >> 3
    }

    pub fn ecc_per_block(self, ecl: ECLevel) -> usize {
        ECC_PER_BLOCK[ecl as usize][self.0] as usize
    }

    pub fn block_count(self, ecl: ECLevel) -> usize {
        BLOCK_COUNT[ecl as usize][self.0] as usize
    }

    pub fn data_codewords(self, ecl: ECLevel) -> usize {
        self.total_codewords() - self.ecc_per_block(ecl) * self.block_count(ecl)
    }

    /// Block layout as (block1 data size, block1 count, block2 data size,
    /// block2 count). Group 1 blocks are one codeword shorter than group 2.
    pub fn data_codewords_per_block(self, ecl: ECLevel) -> (usize, usize, usize, usize) {
        let total = self.total_codewords();
        let blocks = self.block_count(ecl);
        let ec_len = self.ecc_per_block(ecl);

        let b2c = total % blocks;
        let b1c = blocks - b2c;
        let b1s = total / blocks - ec_len;
        let b2s = if b2c > 0 { b1s + 1 } else { 0 };
        (b1s, b1c, b2s, b2c)
    }

    /// Width of the character count indicator for a mode.
    pub fn char_cnt_bits(self, mode: super::codec::Mode) -> usize {
        use super::codec::Mode;

        let idx = match self.0 {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        match mode {
            Mode::Numeric => [10, 12, 14][idx],
            Mode::Alphanumeric => [9, 11, 13][idx],
            Mode::Byte => [8, 16, 16][idx],
            Mode::Kanji | Mode::Hanzi => [8, 10, 12][idx],
            Mode::Eci | Mode::StructuredAppend | Mode::Fnc1First | Mode::Fnc1Second => 0,
            Mode::Terminator => 0,
        }
    }
}


// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    /// Decodes the 2 bit indicator used in format info.
    pub fn from_format_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b01 => Self::L,
            0b00 => Self::M,
            0b11 => Self::Q,
            _ => Self::H,
        }
    }
}

// Format & version info
//------------------------------------------------------------------------------

pub const FORMAT_MASK: u32 = 0b101010000010010;
pub const FORMAT_ERROR_CAPACITY: u32 = 3;

pub const VERSION_ERROR_BIT_LEN: usize = 12;
pub const VERSION_ERROR_CAPACITY: u32 = 3;

/// Masked format codewords indexed by the 5 bit format data.
pub static FORMAT_INFOS_QR: [u32; 32] = build_format_infos();

/// Version codewords for versions 7 to 40.
pub static VERSION_INFOS: [u32; 34] = build_version_infos();

const fn build_format_infos() -> [u32; 32] {
    let mut res = [0u32; 32];
    let mut data = 0;
    while data < 32 {
        let mut rem = data as u32;
        let mut i = 0;
        while i < 10 {
            rem = (rem << 1) ^ ((rem >> 9) * 0x537);
            i += 1;
        }
        res[data] = (((data as u32) << 10) | rem) ^ FORMAT_MASK;
        data += 1;
    }
    res
}

const fn build_version_infos() -> [u32; 34] {
    let mut res = [0u32; 34];
    let mut ver = 7;
    while ver <= 40 {
        let mut rem = ver as u32;
        let mut i = 0;
        while i < 12 {
            rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
            i += 1;
        }
        res[ver - 7] = ((ver as u32) << 12) | rem;
        ver += 1;
    }
    res
}

/// Splits an unmasked format codeword into its error correction level and
/// mask pattern.
pub fn parse_format_info_qr(info: u32) -> (ECLevel, MaskPattern) {
    let data = info >> 10;
    let ecl = ECLevel::from_format_bits(data >> 3);
    let mask = MaskPattern::new((data & 0b111) as u8);
    (ecl, mask)
}

// Coordinates are (x, y); negative values count from the far edge. Listed
// most significant bit first.
pub static FORMAT_INFO_COORDS_QR_MAIN: [(i32, i32); 15] = [
    (0, 8),
    (1, 8),
    (2, 8),
    (3, 8),
    (4, 8),
    (5, 8),
    (7, 8),
    (8, 8),
    (8, 7),
    (8, 5),
    (8, 4),
    (8, 3),
    (8, 2),
    (8, 1),
    (8, 0),
];

pub static FORMAT_INFO_COORDS_QR_SIDE: [(i32, i32); 15] = [
    (8, -1),
    (8, -2),
    (8, -3),
    (8, -4),
    (8, -5),
    (8, -6),
    (8, -7),
    (-8, 8),
    (-7, 8),
    (-6, 8),
    (-5, 8),
    (-4, 8),
    (-3, 8),
    (-2, 8),
    (-1, 8),
];

pub static VERSION_INFO_COORDS_TR: [(i32, i32); 18] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];

pub static VERSION_INFO_COORDS_BL: [(i32, i32); 18] = [
    (5, -9),
    (5, -10),
    (5, -11),
    (4, -9),
    (4, -10),
    (4, -11),
    (3, -9),
    (3, -10),
    (3, -11),
    (2, -9),
    (2, -10),
    (2, -11),
    (1, -9),
    (1, -10),
    (1, -11),
    (0, -9),
    (0, -10),
    (0, -11),
];


// Block structure tables, indexed by [ec level][version]
//------------------------------------------------------------------------------

static ECC_PER_BLOCK: [[u8; 41]; 4] = [
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ],
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
];

static BLOCK_COUNT: [[u8; 41]; 4] = [
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ],
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ],
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ],
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ],
];
