pub mod align;
pub mod binarize;
pub mod finder;
pub mod luma;
pub mod result;
pub mod search;
pub mod symbol;
pub mod utils;

use image::DynamicImage;
use tracing::{debug, info_span};

use crate::common::error::{QRError, QRResult};
use binarize::BitMatrix;
use luma::{LumaGrid, Luminance};
use result::ResultSet;

// Reader
//------------------------------------------------------------------------------

/// Decodes every QR symbol on a page.
///
/// ```rust,no_run
/// use pageqr::QRReader;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("page.jpg")?;
/// let res = QRReader::new().max_symbols(8).decode(&img)?;
/// for sym in &res {
///     println!("{} ({:?}): {}", sym.version, sym.ec_level, sym.text);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QRReader {
    max_symbols: usize,
    max_passes: usize,
    max_finder_candidates: usize,
}

impl Default for QRReader {
    fn default() -> Self {
        Self { max_symbols: 32, max_passes: 4, max_finder_candidates: 64 }
    }
}

impl QRReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop once this many symbols are decoded.
    pub fn max_symbols(&mut self, max_symbols: usize) -> &mut Self {
        self.max_symbols = max_symbols;
        self
    }

    /// Upper bound on finder search passes over the page.
    pub fn max_passes(&mut self, max_passes: usize) -> &mut Self {
        self.max_passes = max_passes;
        self
    }

    /// Finder patterns kept per pass, strongest first.
    pub fn max_finder_candidates(&mut self, max_finder_candidates: usize) -> &mut Self {
        self.max_finder_candidates = max_finder_candidates;
        self
    }

    pub fn decode<I: Luminance>(&self, img: &I) -> QRResult<ResultSet> {
        let luma = img.to_luma_grid()?;
        self.decode_grid(&luma)
    }

    /// Decodes a raw row major luminance buffer.
    pub fn decode_luma(&self, w: u32, h: u32, data: Vec<u8>) -> QRResult<ResultSet> {
        let luma = LumaGrid::from_raw(w, h, data)?;
        self.decode_grid(&luma)
    }

    fn decode_grid(&self, luma: &LumaGrid) -> QRResult<ResultSet> {
        let _span = info_span!("decode", w = luma.w, h = luma.h).entered();

        // A page without contrast holds no symbol
        let page = match BitMatrix::prepare(luma) {
            Ok(page) => page,
            Err(QRError::Binarization) => {
                debug!("No contrast anywhere on the page");
                return Ok(ResultSet::new());
            }
            Err(e) => return Err(e),
        };

        let res = search::search(&page, self);
        debug!("Decoded {} symbols, {} failures", res.len(), res.failures().len());
        Ok(res)
    }
}

/// Decodes every symbol on the page with the default options.
pub fn decode_multiple(img: &DynamicImage) -> QRResult<ResultSet> {
    QRReader::new().decode(img)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use image::{GrayImage, Luma};
    use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
    use qrcode::{Color, EcLevel, QrCode, Version};

    pub(crate) fn qr_code(data: &str, ver: i16, ecl: EcLevel) -> QrCode {
        QrCode::with_version(data, Version::Normal(ver), ecl).expect("Data exceeds capacity")
    }

    /// Draws the dark modules with the top left module at `(x, y)`.
    pub(crate) fn draw_code(img: &mut GrayImage, code: &QrCode, x: i32, y: i32, scale: u32) {
        let w = code.width();
        for (i, c) in code.to_colors().into_iter().enumerate() {
            if c != Color::Dark {
                continue;
            }
            let (mx, my) = ((i % w) as i32, (i / w) as i32);
            let s = scale as i32;
            let rect = Rect::at(x + mx * s, y + my * s).of_size(scale, scale);
            draw_filled_rect_mut(img, rect, Luma([0]));
        }
    }

    /// Renders a symbol with a quiet zone of `quiet` modules.
    pub(crate) fn render(code: &QrCode, scale: u32, quiet: u32) -> GrayImage {
        let side = (code.width() as u32 + 2 * quiet) * scale;
        let mut img = GrayImage::from_pixel(side, side, Luma([255]));
        let off = (quiet * scale) as i32;
        draw_code(&mut img, code, off, off, scale);
        img
    }
}
