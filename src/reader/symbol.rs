use tracing::{debug, trace};

use super::{
    align::locate_alignment,
    binarize::BitMatrix,
    finder::FinderGroup,
    result::DecodedResult,
    utils::{geometry::PointF, homography::Homography},
};
use crate::common::{
    bit_utils::BitStream,
    codec::decode,
    ec::{deinterleave, rectify_info},
    error::{QRError, QRResult},
    iter::DataRegionIter,
    mask::MaskPattern,
    metadata::{
        parse_format_info_qr, ECLevel, Version, FORMAT_ERROR_CAPACITY, FORMAT_INFOS_QR,
        FORMAT_INFO_COORDS_QR_MAIN, FORMAT_INFO_COORDS_QR_SIDE, FORMAT_MASK,
        VERSION_ERROR_BIT_LEN, VERSION_ERROR_CAPACITY, VERSION_INFOS, VERSION_INFO_COORDS_BL,
        VERSION_INFO_COORDS_TR,
    },
};

// Symbol sampled from a finder group
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Symbol {
    grid: BitMatrix,
    ver: Version,
    h: Homography,
    corners: [PointF; 4],
}

impl Symbol {
    /// Samples the module grid at the group's provisional dimension.
    pub fn locate(img: &BitMatrix, group: &FinderGroup) -> QRResult<Self> {
        let ver = Version::from_grid_size(group.dim).ok_or(QRError::VersionInfo)?;
        Self::sample_version(img, group, ver)
    }

    /// Anchors the homography on the three finders plus the bottom right
    /// alignment pattern, or the virtual bottom right finder when no
    /// alignment pattern is found, and samples every module centre.
    pub fn sample_version(img: &BitMatrix, group: &FinderGroup, ver: Version) -> QRResult<Self> {
        let dim = ver.width();
        let (br, br_pos) = match locate_alignment(img, group, dim) {
            Some(centre) => (centre, dim as f64 - 6.5),
            None => (group.virtual_br(), dim as f64 - 3.5),
        };
        let h = Homography::anchored(&group.finders, br, br_pos, dim)?;

        let mut grid = BitMatrix::new(dim as u32, dim as u32);
        for y in 0..dim as i32 {
            for x in 0..dim as i32 {
                let p = h.project(x as f64 + 0.5, y as f64 + 0.5)?;
                grid.set(x, y, img.sample(p)?);
            }
        }

        let d = dim as f64;
        let corners = [
            h.project(0.0, 0.0)?,
            h.project(d, 0.0)?,
            h.project(d, d)?,
            h.project(0.0, d)?,
        ];

        trace!("Sampled {ver} symbol with corners {corners:?}");
        Ok(Self { grid, ver, h, corners })
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn grid(&self) -> &BitMatrix {
        &self.grid
    }

    /// Outer corners of the module grid in image space, clockwise from top
    /// left.
    pub fn corners(&self) -> [PointF; 4] {
        self.corners
    }

    /// Module grid grown by one module on every side, clockwise from top
    /// left. Covers the whole symbol when excluding it from later passes.
    pub fn region(&self) -> QRResult<[PointF; 4]> {
        let far = self.ver.width() as f64 + 1.0;
        Ok([
            self.h.project(-1.0, -1.0)?,
            self.h.project(far, -1.0)?,
            self.h.project(far, far)?,
            self.h.project(-1.0, far)?,
        ])
    }
}

// Format & version info
//------------------------------------------------------------------------------

impl Symbol {
    /// Reads both format copies and keeps the one closest to a valid
    /// codeword.
    pub fn read_format_info(&self) -> QRResult<(ECLevel, MaskPattern)> {
        let copies = [&FORMAT_INFO_COORDS_QR_MAIN[..], &FORMAT_INFO_COORDS_QR_SIDE[..]];
        let format = self
            .best_info(&copies, &FORMAT_INFOS_QR, FORMAT_ERROR_CAPACITY)
            .ok_or(QRError::FormatInfo)?;
        Ok(parse_format_info_qr(format ^ FORMAT_MASK))
    }

    /// Version 7 and above carry two version copies, bottom left is
    /// preferred on a tie.
    pub fn read_version_info(&self) -> QRResult<Version> {
        let copies = [&VERSION_INFO_COORDS_BL[..], &VERSION_INFO_COORDS_TR[..]];
        let info = self
            .best_info(&copies, &VERSION_INFOS, VERSION_ERROR_CAPACITY)
            .ok_or(QRError::VersionInfo)?;
        Version::new(info as usize >> VERSION_ERROR_BIT_LEN).ok_or(QRError::VersionInfo)
    }

    fn best_info(&self, copies: &[&[(i32, i32)]], valid: &[u32], capacity: u32) -> Option<u32> {
        copies
            .iter()
            .filter_map(|coords| {
                let read = self.get_number(coords);
                let info = rectify_info(read, valid, capacity)?;
                Some(((read ^ info).count_ones(), info))
            })
            .min_by_key(|&(dist, _)| dist)
            .map(|(_, info)| info)
    }

    /// Reads modules MSB first. Negative coordinates count from the far
    /// edge.
    fn get_number(&self, coords: &[(i32, i32)]) -> u32 {
        let w = self.ver.width() as i32;
        coords.iter().fold(0, |num, &(x, y)| {
            let dark = self.grid.is_dark(x.rem_euclid(w), y.rem_euclid(w));
            (num << 1) | dark as u32
        })
    }
}

// Codewords & decoding
//------------------------------------------------------------------------------

impl Symbol {
    /// Unmasked codewords in placement order. Remainder bits are left out.
    pub fn extract_codewords(&self, mask: MaskPattern) -> Vec<u8> {
        let total = self.ver.total_codewords();
        let mut bs = BitStream::new();
        for (x, y) in DataRegionIter::new(self.ver).take(total << 3) {
            bs.push(mask.unmask(x, y, self.grid.is_dark(x, y)));
        }
        bs.data().to_vec()
    }

    /// Decodes the sampled grid. A version 7+ symbol whose version info
    /// disagrees with the provisional dimension is sampled again first.
    pub fn decode(self, img: &BitMatrix, group: &FinderGroup) -> QRResult<DecodedResult> {
        let mut sym = self;
        if *sym.ver >= 7 {
            let ver = sym.read_version_info()?;
            if ver != sym.ver {
                debug!("Version info reads {ver}, provisional {}; resampling", sym.ver);
                sym = Self::sample_version(img, group, ver)?;
            }
        }
        let ver = sym.ver;

        let (ecl, mask) = sym.read_format_info()?;
        trace!("Format info: {ecl:?}, mask {}", *mask);

        let codewords = sym.extract_codewords(mask);
        let mut blocks = deinterleave(&codewords, ver, ecl)?;

        let mut corrected = 0;
        let mut data = Vec::with_capacity(ver.data_codewords(ecl));
        for blk in blocks.iter_mut() {
            corrected += blk.rectify()?;
            data.extend_from_slice(blk.data());
        }
        if corrected > 0 {
            debug!("Corrected {corrected} codewords");
        }

        let payload = decode(&mut BitStream::from(&data), ver)?;
        Ok(DecodedResult {
            text: payload.text,
            bytes: payload.bytes,
            version: ver,
            ec_level: ecl,
            mask,
            corrected,
            corners: sym.corners,
            structured_append: payload.structured_append,
            fnc1: payload.fnc1,
        })
    }
}
