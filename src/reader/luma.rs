use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::common::error::{QRError, QRResult};

// Luminance grid
//------------------------------------------------------------------------------

/// One brightness byte per pixel, row major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaGrid {
    pub w: u32,
    pub h: u32,
    data: Vec<u8>,
}

impl LumaGrid {
    /// Wraps a raw row major buffer. Rejects zero dimensions and buffers
    /// whose length is not `w * h`.
    pub fn from_raw(w: u32, h: u32, data: Vec<u8>) -> QRResult<Self> {
        if w == 0 || h == 0 {
            return Err(QRError::ImageDecode("zero sized image"));
        }
        if data.len() as u64 != w as u64 * h as u64 {
            return Err(QRError::ImageDecode("buffer length does not match dimensions"));
        }
        Ok(Self { w, h, data })
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.w + x) as usize]
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Adds `delta` to every sample, saturating at the ends of the range.
    pub fn shifted(&self, delta: i16) -> Self {
        let data = self
            .data
            .iter()
            .map(|&p| (p as i16 + delta).clamp(0, 255) as u8)
            .collect();
        Self { w: self.w, h: self.h, data }
    }
}

// Conversion from pixel grids
//------------------------------------------------------------------------------

#[inline]
fn weigh(r: u8, g: u8, b: u8) -> u8 {
    ((306 * r as u32 + 601 * g as u32 + 117 * b as u32 + 512) >> 10) as u8
}

// Composite over a white page
#[inline]
fn over_white(c: u8, a: u8) -> u8 {
    let (c, a) = (c as u32, a as u32);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

pub trait Luminance {
    fn to_luma_grid(&self) -> QRResult<LumaGrid>;
}

impl Luminance for LumaGrid {
    fn to_luma_grid(&self) -> QRResult<LumaGrid> {
        Ok(self.clone())
    }
}

impl Luminance for GrayImage {
    fn to_luma_grid(&self) -> QRResult<LumaGrid> {
        let (w, h) = self.dimensions();
        LumaGrid::from_raw(w, h, self.as_raw().clone())
    }
}

impl Luminance for RgbImage {
    fn to_luma_grid(&self) -> QRResult<LumaGrid> {
        let (w, h) = self.dimensions();
        let data = self.pixels().map(|p| weigh(p[0], p[1], p[2])).collect();
        LumaGrid::from_raw(w, h, data)
    }
}

impl Luminance for RgbaImage {
    fn to_luma_grid(&self) -> QRResult<LumaGrid> {
        let (w, h) = self.dimensions();
        let data = self
            .pixels()
            .map(|p| {
                let a = p[3];
                weigh(over_white(p[0], a), over_white(p[1], a), over_white(p[2], a))
            })
            .collect();
        LumaGrid::from_raw(w, h, data)
    }
}

impl Luminance for DynamicImage {
    fn to_luma_grid(&self) -> QRResult<LumaGrid> {
        match self {
            DynamicImage::ImageLuma8(img) => img.to_luma_grid(),
            DynamicImage::ImageRgb8(img) => img.to_luma_grid(),
            DynamicImage::ImageRgba8(img) => img.to_luma_grid(),
            DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
                self.to_rgba8().to_luma_grid()
            }
            DynamicImage::ImageLuma16(_) => self.to_luma8().to_luma_grid(),
            _ if self.color().has_alpha() => self.to_rgba8().to_luma_grid(),
            _ => self.to_rgb8().to_luma_grid(),
        }
    }
}
