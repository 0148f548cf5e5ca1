use crate::common::codec::{Fnc1, StructuredAppend};
use crate::common::error::QRError;
use crate::common::mask::MaskPattern;
use crate::common::metadata::{ECLevel, Version};

use super::utils::geometry::PointF;

// Decoded symbol
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedResult {
    pub text: String,
    /// Segment content before character set decoding.
    pub bytes: Vec<u8>,
    pub version: Version,
    pub ec_level: ECLevel,
    pub mask: MaskPattern,
    /// Codewords fixed by Reed-Solomon across all blocks.
    pub corrected: usize,
    /// Projected outer corners of the module grid: top left, top right,
    /// bottom right, bottom left.
    pub corners: [PointF; 4],
    pub structured_append: Option<StructuredAppend>,
    pub fnc1: Option<Fnc1>,
}

impl DecodedResult {
    /// Rounded (row, column) of the top left module corner.
    pub fn position(&self) -> (i64, i64) {
        let tl = self.corners[0];
        (tl.y.round() as i64, tl.x.round() as i64)
    }
}

/// A symbol candidate that was dropped, with the corners of its module grid
/// when it got as far as sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub error: QRError,
    pub corners: Option<[PointF; 4]>,
}

// Result set
//------------------------------------------------------------------------------

/// Decoded symbols of one page in reading order, plus the failures met on
/// the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    results: Vec<DecodedResult>,
    failures: Vec<Failure>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, res: DecodedResult) {
        self.results.push(res);
    }

    pub(crate) fn push_failure(&mut self, error: QRError, corners: Option<[PointF; 4]>) {
        self.failures.push(Failure { error, corners });
    }

    /// Orders results by row, then column. Ties keep discovery order.
    pub(crate) fn finish(mut self) -> Self {
        self.results.sort_by_key(DecodedResult::position);
        self
    }

    pub fn results(&self) -> &[DecodedResult] {
        &self.results
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecodedResult> {
        self.results.iter()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.text.as_str()).collect()
    }

    /// Texts joined by newlines, one line per symbol.
    pub fn joined(&self) -> String {
        self.texts().join("\n")
    }
}

impl IntoIterator for ResultSet {
    type Item = DecodedResult;
    type IntoIter = std::vec::IntoIter<DecodedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a DecodedResult;
    type IntoIter = std::slice::Iter<'a, DecodedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
