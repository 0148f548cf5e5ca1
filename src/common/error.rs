use thiserror::Error;

// Error
//------------------------------------------------------------------------------

/// Every failure the decoding pipeline can report.
///
/// `ImageDecode` and `Binarization` abort a whole decode call. The remaining
/// variants are local to one symbol: the multi-symbol search records them as
/// diagnostics and moves on to the next candidate.
#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    // Whole image
    #[error("Invalid pixel grid: {0}")]
    ImageDecode(&'static str),
    #[error("No block in the image meets the minimum contrast")]
    Binarization,

    // Symbol geometry
    #[error("Cannot compute homography")]
    SingularMatrix,
    #[error("Projected point is at infinity")]
    PointAtInfinity,
    #[error("Symbol projects outside the image")]
    SymbolOutOfBounds,

    // Symbol content
    #[error("Invalid format info detected")]
    FormatInfo,
    #[error("Invalid version info detected")]
    VersionInfo,
    #[error("Too many errors to correct successfully")]
    EccUncorrectable,
    #[error("Malformed data segment")]
    MalformedSegment,
}

impl QRError {
    /// True for errors that only invalidate the current symbol.
    pub fn is_symbol_local(&self) -> bool {
        !matches!(self, Self::ImageDecode(_) | Self::Binarization)
    }
}

pub type QRResult<T> = Result<T, QRError>;

#[cfg(test)]
mod error_tests {
    use super::QRError;

    #[test]
    fn test_scope() {
        assert!(!QRError::ImageDecode("empty").is_symbol_local());
        assert!(!QRError::Binarization.is_symbol_local());
        assert!(QRError::FormatInfo.is_symbol_local());
        assert!(QRError::EccUncorrectable.is_symbol_local());
        assert!(QRError::SymbolOutOfBounds.is_symbol_local());
    }

    #[test]
    fn test_display() {
        assert_eq!(QRError::ImageDecode("zero width").to_string(), "Invalid pixel grid: zero width");
        assert_eq!(QRError::MalformedSegment.to_string(), "Malformed data segment");
    }
}
