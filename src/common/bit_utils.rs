use num_traits::PrimInt;

// Bit stream
//------------------------------------------------------------------------------

/// MSB-first bit buffer. Decoding reads it front to back through a cursor;
/// pushing is mostly used to assemble payloads.
#[derive(Debug, Clone, Default)]
pub struct BitStream {
    data: Vec<u8>,
    // Bit length
    len: usize,
    // Pointer to take bits
    cursor: usize,
}

impl BitStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(inp: &[u8]) -> Self {
        Self { data: inp.to_vec(), len: inp.len() << 3, cursor: 0 }
    }

    /// Bits not yet taken.
    pub fn remaining(&self) -> usize {
        self.len - self.cursor
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..(self.len + 7) >> 3]
    }
}

// Push bits for bit stream
//------------------------------------------------------------------------------

impl BitStream {
    pub fn push(&mut self, bit: bool) {
        let offset = self.len & 7;
        if offset == 0 {
            self.data.push(0);
        }
        if bit {
            let pos = self.len >> 3;
            self.data[pos] |= 0b10000000 >> offset;
        }
        self.len += 1;
    }
}

// Assembles segments for codec tests
#[cfg(test)]
impl BitStream {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_bits<T: PrimInt>(&mut self, bits: T, size: usize) {
        debug_assert!(size <= 32, "Cannot push more than 32 bits: Size {size}");
        let bits = bits.to_u64().unwrap_or(0);
        debug_assert!(
            size >= 64 - bits.leading_zeros() as usize,
            "Bit count shouldn't exceed bit length: Length {size}, Bits {bits}"
        );

        for i in (0..size).rev() {
            self.push((bits >> i) & 1 == 1);
        }
    }

    pub fn extend(&mut self, arr: &[u8]) {
        arr.iter().for_each(|b| self.push_bits(*b, 8));
    }
}

// Take bits for bit stream
//------------------------------------------------------------------------------

impl BitStream {
    /// Reads the next `n` bits as an integer, or `None` when fewer than `n`
    /// bits remain.
    pub fn take_bits<T: PrimInt>(&mut self, n: usize) -> Option<T> {
        debug_assert!(n <= 32, "Cannot take more than 32 bits: N {n}");

        if self.cursor + n > self.len {
            return None;
        }

        let mut res = 0u64;
        let mut left = n;
        while left > 0 {
            let offset = self.cursor & 7;
            let avail = 8 - offset;
            let size = avail.min(left);
            let byte = self.data[self.cursor >> 3] as u64;
            res = (res << size) | ((byte >> (avail - size)) & ((1 << size) - 1));
            self.cursor += size;
            left -= size;
        }

        T::from(res)
    }

    pub fn take_bit(&mut self) -> Option<bool> {
        if self.cursor == self.len {
            return None;
        }

        let offset = self.cursor & 7;
        let pos = self.cursor >> 3;
        let bit = (self.data[pos] << offset) >> 7;

        self.cursor += 1;

        Some(bit != 0)
    }
}

impl Iterator for BitStream {
    type Item = bool;
    fn next(&mut self) -> Option<Self::Item> {
        self.take_bit()
    }
}

#[cfg(test)]
mod bit_stream_tests {
    use super::BitStream;

    #[test]
    fn test_len() {
        let mut bs = BitStream::new();
        assert!(bs.is_empty());
        bs.push_bits(0u8, 0);
        assert_eq!(bs.len(), 0);
        bs.push_bits(0b1000u8, 4);
        assert_eq!(bs.len(), 4);
        bs.push_bits(0b1000u16, 8);
        assert_eq!(bs.len(), 12);
        bs.push_bits(0b1111111u8, 7);
        assert_eq!(bs.len(), 19);
        bs.push_bits(0b111111111111u32, 16);
        assert_eq!(bs.len(), 35);
        assert_eq!(bs.data().len(), 5);
    }

    #[test]
    fn test_push() {
        let mut bs = BitStream::new();
        bs.push(false);
        assert_eq!(bs.data(), [0b00000000]);
        bs.push(true);
        assert_eq!(bs.data(), [0b01000000]);
    }

    #[test]
    fn test_take_bits() {
        let data = [
            0b11010010, 0b00110100, 0b10001101, 0b00100011, 0b01001000, 0b11010010, 0b00110100,
            0b10001101, 0b00100011, 0b01001000, 0b11010010, 0b00110100, 0b10001100,
        ];
        let mut bs = BitStream::from(&data);
        assert_eq!(bs.take_bits::<u16>(0), Some(0));
        assert_eq!(bs.take_bits::<u16>(4), Some(0b1101));
        assert_eq!(bs.take_bits::<u16>(4), Some(0b0010));
        assert_eq!(bs.take_bits::<u16>(8), Some(0b00110100));
        assert_eq!(bs.take_bits::<u16>(9), Some(0b100011010));
        assert_eq!(bs.take_bits::<u16>(7), Some(0b0100011));
        assert_eq!(bs.take_bits::<u16>(16), Some(0b01001000_11010010));
        assert_eq!(bs.take_bits::<u8>(1), Some(0b0));
        assert_eq!(bs.take_bits::<u16>(11), Some(0b01101001000));
        assert_eq!(bs.take_bits::<u32>(14), Some(0b11010010001101));
        assert_eq!(bs.take_bits::<u32>(20), Some(0b0010001101001000_1101));
        assert_eq!(bs.remaining(), 10);
        assert_eq!(bs.take_bits::<u16>(11), None);
        assert_eq!(bs.take_bits::<u16>(10), Some(0b0010001100));
        assert_eq!(bs.take_bit(), None);
    }

    #[test]
    fn test_push_then_take() {
        let exp_vec = [210, 52, 141, 35, 72, 210, 183, 42, 7, 219, 91, 14, 253, 68, 120, 193];
        let mut inp = BitStream::from(&exp_vec);
        let mut out = BitStream::new();
        for n in [0, 1, 2, 3, 4, 5, 6, 7, 8, 4, 8, 9, 11, 15, 16, 5, 16, 8] {
            let bits: u32 = inp.take_bits(n).unwrap();
            out.push_bits(bits, n);
        }
        assert_eq!(out.data(), exp_vec);
    }

    #[test]
    fn test_take_bits_narrow_type() {
        let mut bs = BitStream::from(&[0xFF, 0xFF]);
        assert_eq!(bs.take_bits::<u8>(9), None);
    }
}
