use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info_span};

use crate::common::error::QRError;
use crate::reader::decode_multiple;

// Error
//------------------------------------------------------------------------------

/// Failures of the file and rasterizer surface.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Decode(#[from] QRError),
    #[error("Failed to load image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Rasterizer failed: {0}")]
    Rasterizer(String),
}

// Rasterizer config
//------------------------------------------------------------------------------

pub const DEFAULT_DPI: u32 = 144;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterConfig {
    pub source: PathBuf,
    /// Inclusive first and last page, all pages when absent.
    pub pages: Option<(u32, u32)>,
    pub dpi: u32,
}

impl RasterConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self { source: source.into(), pages: None, dpi: DEFAULT_DPI }
    }

    pub fn pages(&mut self, first: u32, last: u32) -> &mut Self {
        self.pages = Some((first, last));
        self
    }

    pub fn dpi(&mut self, dpi: u32) -> &mut Self {
        self.dpi = dpi;
        self
    }
}

/// Renders a source document into a single raster image file at `out`.
pub trait Rasterizer {
    fn rasterize(&self, config: &RasterConfig, out: &Path) -> Result<(), ScanError>;
}

// Ghostscript adapter
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ghostscript {
    program: PathBuf,
}

impl Default for Ghostscript {
    fn default() -> Self {
        Self { program: PathBuf::from("gs") }
    }
}

impl Ghostscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a different executable, such as `gswin64c`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// Command line for one conversion to baseline JPEG. Both paths are
    /// made absolute.
    pub fn args(&self, config: &RasterConfig, out: &Path) -> io::Result<Vec<OsString>> {
        let mut args: Vec<OsString> = ["-dQUIET", "-dSAFER", "-dBATCH", "-dNOPAUSE", "-sDEVICE=jpeg"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(format!("-r{}", config.dpi).into());
        if let Some((first, last)) = config.pages {
            args.push(format!("-dFirstPage={first}").into());
            args.push(format!("-dLastPage={last}").into());
        }

        let mut out_arg = OsString::from("-sOutputFile=");
        out_arg.push(std::path::absolute(out)?);
        args.push(out_arg);
        args.push(std::path::absolute(&config.source)?.into_os_string());
        Ok(args)
    }
}

impl Rasterizer for Ghostscript {
    fn rasterize(&self, config: &RasterConfig, out: &Path) -> Result<(), ScanError> {
        let args = self.args(config, out)?;
        debug!("Running {} {args:?}", self.program.display());

        let output = Command::new(&self.program).args(&args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::Rasterizer(format!("{}: {}", output.status, stderr.trim())));
        }
        Ok(())
    }
}

// Scanning entry points
//------------------------------------------------------------------------------

/// Loads an image file and returns the texts of all symbols on it, one per
/// line.
pub fn scan_file(path: impl AsRef<Path>) -> Result<String, ScanError> {
    let path = path.as_ref();
    let _span = info_span!("scan_file", path = %path.display()).entered();

    let img = image::open(path)?;
    let res = decode_multiple(&img)?;
    Ok(res.joined())
}

/// Rasterizes a document to `out`, then scans the resulting image.
pub fn scan_document<R: Rasterizer>(
    rasterizer: &R,
    config: &RasterConfig,
    out: &Path,
) -> Result<String, ScanError> {
    rasterizer.rasterize(config, out)?;
    scan_file(out)
}

#[cfg(test)]
mod raster_tests {
    use std::ffi::OsString;
    use std::path::{Path, PathBuf};

    use qrcode::EcLevel;

    use super::{scan_document, scan_file, Ghostscript, RasterConfig, Rasterizer, ScanError};
    use crate::reader::test_utils::{qr_code, render};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pageqr-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_config_builder() {
        let mut cfg = RasterConfig::new("doc.pdf");
        assert_eq!(cfg.dpi, 144);
        assert_eq!(cfg.pages, None);
        cfg.pages(2, 3).dpi(300);
        assert_eq!((cfg.pages, cfg.dpi), (Some((2, 3)), 300));
    }

    #[test]
    fn test_ghostscript_args() {
        let cfg = RasterConfig::new("/docs/invoice.pdf");
        let args = Ghostscript::new().args(&cfg, Path::new("/tmp/page.jpg")).unwrap();
        let exp: Vec<OsString> = [
            "-dQUIET",
            "-dSAFER",
            "-dBATCH",
            "-dNOPAUSE",
            "-sDEVICE=jpeg",
            "-r144",
            "-sOutputFile=/tmp/page.jpg",
            "/docs/invoice.pdf",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        assert_eq!(args, exp);
    }

    #[test]
    fn test_ghostscript_page_range() {
        let mut cfg = RasterConfig::new("/docs/invoice.pdf");
        cfg.pages(2, 2).dpi(200);
        let args = Ghostscript::new().args(&cfg, Path::new("/tmp/page.jpg")).unwrap();
        assert_eq!(args[5], "-r200");
        assert_eq!(args[6], "-dFirstPage=2");
        assert_eq!(args[7], "-dLastPage=2");
    }

    #[test]
    fn test_relative_paths_made_absolute() {
        let cfg = RasterConfig::new("invoice.pdf");
        let args = Ghostscript::new().args(&cfg, Path::new("page.jpg")).unwrap();
        let src = PathBuf::from(args.last().unwrap());
        assert!(src.is_absolute());
        assert!(src.ends_with("invoice.pdf"));
    }

    #[test]
    fn test_missing_program() {
        let gs = Ghostscript::with_program("pageqr-no-such-program");
        let cfg = RasterConfig::new("invoice.pdf");
        let err = gs.rasterize(&cfg, &temp_path("missing.jpg")).unwrap_err();
        assert!(matches!(err, ScanError::Io(_)));
    }

    #[test]
    fn test_scan_file() {
        let path = temp_path("scan.png");
        render(&qr_code("SCAN ME", 1, EcLevel::M), 4, 4).save(&path).unwrap();
        let text = scan_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(text, "SCAN ME");

        assert!(matches!(scan_file(temp_path("absent.png")), Err(ScanError::Image(_))));
    }

    // Writes a prepared page instead of running a real rasterizer
    struct Stub(&'static str);

    impl Rasterizer for Stub {
        fn rasterize(&self, _config: &RasterConfig, out: &Path) -> Result<(), ScanError> {
            render(&qr_code(self.0, 2, EcLevel::L), 3, 4).save(out)?;
            Ok(())
        }
    }

    #[test]
    fn test_scan_document() {
        let out = temp_path("document.png");
        let cfg = RasterConfig::new("invoice.pdf");
        let text = scan_document(&Stub("PV-923050005-3857"), &cfg, &out).unwrap();
        std::fs::remove_file(&out).unwrap();
        assert_eq!(text, "PV-923050005-3857");
    }
}
