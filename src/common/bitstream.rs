use num_traits::{PrimInt, Unsigned};

// Bit stream
// Bits are packed most significant bit first, which matches the order codewords are laid out in
// the symbol.
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    data: Vec<u8>,
    // Bit length
    len: usize,
    // Max bit capacity
    capacity: usize,
    // Read cursor
    cursor: usize,
}

impl BitStream {
    pub fn new(capacity: usize) -> Self {
        Self { data: vec![0; capacity.div_ceil(8)], len: 0, capacity, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.len.div_ceil(8)]
    }
}

impl From<&[u8]> for BitStream {
    fn from(bytes: &[u8]) -> Self {
        let capacity = bytes.len() << 3;
        Self { data: bytes.to_vec(), len: capacity, capacity, cursor: 0 }
    }
}

// Writer
//------------------------------------------------------------------------------

impl BitStream {
    pub fn push_bits<T>(&mut self, bits: T, size: usize)
    where
        T: PrimInt + Unsigned,
    {
        let max = T::zero().count_zeros() as usize;
        debug_assert!(size <= max, "Bit count exceeds width of integer: Size {size}, Max {max}");
        debug_assert!(
            size == max || bits >> size == T::zero(),
            "Bits don't fit in given size: Size {size}"
        );
        debug_assert!(
            self.len + size <= self.capacity,
            "Insufficient capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + size
        );

        for i in (0..size).rev() {
            self.push((bits >> i) & T::one() == T::one());
        }
    }

    pub fn push(&mut self, bit: bool) {
        debug_assert!(
            self.len < self.capacity,
            "Insufficient capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + 1
        );

        if bit {
            let offset = self.len & 7;
            let pos = self.len >> 3;
            self.data[pos] |= 0b1000_0000 >> offset;
        }

        self.len += 1;
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push_bits(b, 8);
        }
    }
}

// Reader
//------------------------------------------------------------------------------

impl BitStream {
    pub fn remaining(&self) -> usize {
        self.len - self.cursor
    }

    pub fn take_bit(&mut self) -> Option<bool> {
        if self.cursor >= self.len {
            return None;
        }

        let offset = self.cursor & 7;
        let pos = self.cursor >> 3;
        self.cursor += 1;

        Some(self.data[pos] & (0b1000_0000 >> offset) != 0)
    }

    pub fn take_bits(&mut self, size: usize) -> Option<u16> {
        debug_assert!(size <= 16, "Cannot take more than 16 bits at once: {size}");

        if size > self.remaining() {
            return None;
        }

        let mut res = 0u16;
        for _ in 0..size {
            res = (res << 1) | self.take_bit()? as u16;
        }
        Some(res)
    }
}

impl Iterator for BitStream {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        self.take_bit()
    }
}
