use crate::common::error::{QRError, QRResult};
use crate::common::metadata::{ECLevel, Version};

// Block
//------------------------------------------------------------------------------

/// One Reed-Solomon block: data codewords followed by error correction
/// codewords.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Block {
    pub(super) data: Vec<u8>,
    // Data length
    dlen: usize,
}

impl Block {
    pub fn with_encoded(encoded: &[u8], dlen: usize) -> Self {
        debug_assert!(dlen <= encoded.len(), "Data length exceeds block length");
        Self { data: encoded.to_vec(), dlen }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn ec_len(&self) -> usize {
        self.data.len() - self.dlen
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlen]
    }
}

#[cfg(test)]
impl Block {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data_len(&self) -> usize {
        self.dlen
    }

    pub fn full(&self) -> &[u8] {
        &self.data
    }

    pub fn ecc(&self) -> &[u8] {
        &self.data[self.dlen..]
    }
}

// Deinterleave
//------------------------------------------------------------------------------

/// Splits the codeword sequence read from a symbol into its blocks. Data
/// codewords are interleaved first, then error correction codewords; the
/// shorter blocks come first and drop out of the last data round.
pub fn deinterleave(codewords: &[u8], ver: Version, ecl: ECLevel) -> QRResult<Vec<Block>> {
    if codewords.len() != ver.total_codewords() {
        return Err(QRError::EccUncorrectable);
    }

    let (b1s, b1c, b2s, b2c) = ver.data_codewords_per_block(ecl);
    let ec_len = ver.ecc_per_block(ecl);
    let blk_cnt = b1c + b2c;
    let dlens: Vec<usize> = (0..blk_cnt).map(|i| if i < b1c { b1s } else { b2s }).collect();

    let mut raw: Vec<Vec<u8>> = dlens.iter().map(|d| Vec::with_capacity(d + ec_len)).collect();
    let mut it = codewords.iter().copied();

    let max_dlen = b1s.max(b2s);
    for i in 0..max_dlen {
        for (blk, &dlen) in raw.iter_mut().zip(&dlens) {
            if i < dlen {
                blk.extend(it.next());
            }
        }
    }
    for _ in 0..ec_len {
        for blk in raw.iter_mut() {
            blk.extend(it.next());
        }
    }

    Ok(raw.iter().zip(dlens).map(|(blk, dlen)| Block::with_encoded(blk, dlen)).collect())
}
