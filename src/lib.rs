//! # pageqr
//!
//! Extracts the payload of every QR code printed on a rasterized document page.
//!
//! ## Features
//!
//! - **Adaptive Binarization**: Block-local thresholds that survive uneven lighting and scanner noise
//! - **Multi-Symbol Search**: Finds any number of symbols per page, excluding each decoded symbol from later passes
//! - **Perspective Correction**: Homography anchored on finder and alignment patterns
//! - **Reed-Solomon Error Correction**: Recovers damaged codewords at all levels (L, M, Q, H)
//! - **Full Segment Support**: Numeric, alphanumeric, byte, Kanji, ECI, structured append and FNC1
//! - **Document Rasterization**: Optional Ghostscript adapter turning PDF pages into images
//!
//! ## Quick Start
//!
//! ### Reading Every Symbol on a Page
//!
//! ```rust,no_run
//! use pageqr::decode_multiple;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("page.png")?;
//! let res = decode_multiple(&img)?;
//!
//! // Symbols come in reading order: top to bottom, then left to right
//! for sym in res.results() {
//!     println!("{} at {:?}: {}", sym.version, sym.position(), sym.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Configuring the Search
//!
//! ```rust,no_run
//! use pageqr::QRReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("page.png")?.to_luma8();
//! let res = QRReader::new()
//!     .max_symbols(4)             // Stop after 4 symbols - defaults to 32
//!     .max_passes(2)              // Search passes over the page - defaults to 4
//!     .max_finder_candidates(32)  // Finder patterns kept per pass - defaults to 64
//!     .decode(&img)?;
//!
//! println!("{}", res.joined());
//! for failure in res.failures() {
//!     eprintln!("Skipped symbol: {}", failure.error);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Scanning a PDF
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pageqr::{scan_document, Ghostscript, RasterConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cfg = RasterConfig::new("invoice.pdf");
//! cfg.pages(1, 1).dpi(200);
//!
//! let text = scan_document(&Ghostscript::new(), &cfg, Path::new("page.jpg"))?;
//! println!("QR: {text}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Decoding fails as a whole only for malformed pixel buffers. A page without
//! any symbol, or without any contrast, yields an empty [`ResultSet`]. Symbols
//! that are found but cannot be decoded are listed in [`ResultSet::failures`].

pub(crate) mod common;
pub mod raster;
pub mod reader;

pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{ECLevel, Version};
pub use common::codec::{Fnc1, StructuredAppend};
pub use raster::{scan_document, scan_file, Ghostscript, RasterConfig, Rasterizer, ScanError};
pub use reader::binarize::BitMatrix;
pub use reader::luma::{LumaGrid, Luminance};
pub use reader::result::{DecodedResult, Failure, ResultSet};
pub use reader::utils::geometry::PointF;
pub use reader::{decode_multiple, QRReader};
