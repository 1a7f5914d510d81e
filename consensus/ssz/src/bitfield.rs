use crate::descriptor::bytes_for_bit_len;
use smallvec::{smallvec, SmallVec};

/// Returned when a `Bitfield` operation fails.
#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// The index `i` is not less than the bit length `len`.
    OutOfBounds { i: usize, len: usize },
    /// The given number of bytes cannot hold (or is too large for) the declared bit length.
    InvalidByteCount { given: usize, expected: usize },
    /// Bits beyond the declared length are set in the final byte.
    ExcessBits { last_byte: u8 },
    /// A bitlist encoding does not contain the length delimiter bit.
    MissingLengthInformation,
    /// A bitlist encoding declares more bits than its limit permits.
    LimitExceeded { len: usize, limit: usize },
}

/// A sequence of bits, stored packed and little-endian.
///
/// Bit `i` lives in byte `i / 8` at position `i % 8` (least-significant bit first). Bits in the
/// final byte beyond `len` are always zero.
///
/// The same structure backs both SSZ `Bitvector` (where `len` is fixed by the type) and
/// `Bitlist` (where `len` may be anything up to the type's limit).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bitfield {
    bytes: SmallVec<[u8; 32]>,
    len: usize,
}

impl Bitfield {
    /// Create a new bitfield with `len` bits, all set to `false`.
    pub fn with_len(len: usize) -> Self {
        Self {
            bytes: smallvec![0; bytes_for_bit_len(len)],
            len,
        }
    }

    /// Create a new bitfield from an iterator of bits.
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut bitfield = Self::default();
        for bit in bits {
            bitfield.push(bit);
        }
        bitfield
    }

    /// Create a new bitfield of `len` bits from its packed representation.
    ///
    /// Returns an error if `bytes` is not exactly the right size for `len` bits or if any bit at
    /// or beyond `len` is set.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Result<Self, Error> {
        let expected = bytes_for_bit_len(len);
        if bytes.len() != expected {
            return Err(Error::InvalidByteCount {
                given: bytes.len(),
                expected,
            });
        }

        if let Some(last_byte) = bytes.last().copied() {
            let used_bits = len - (expected - 1) * 8;
            if used_bits < 8 && last_byte >> used_bits != 0 {
                return Err(Error::ExcessBits { last_byte });
            }
        }

        Ok(Self {
            bytes: SmallVec::from_slice(bytes),
            len,
        })
    }

    /// Parse the SSZ representation of a bitlist: the bits followed by a single `1` bit which
    /// marks the length.
    ///
    /// Returns an error if there is no delimiter bit or if the declared length exceeds `limit`.
    /// The length is known from the final byte alone, so the limit is checked before any bits
    /// are copied.
    pub fn from_bitlist_bytes(bytes: &[u8], limit: usize) -> Result<Self, Error> {
        let last_byte = match bytes.last() {
            Some(byte) if *byte != 0 => *byte,
            _ => return Err(Error::MissingLengthInformation),
        };

        // The delimiter is the highest set bit of the final byte.
        let delimiter = 7 - last_byte.leading_zeros() as usize;
        let len = (bytes.len() - 1) * 8 + delimiter;

        if len > limit {
            return Err(Error::LimitExceeded { len, limit });
        }

        let mut packed = SmallVec::from_slice(bytes);
        // Removing the delimiter may leave an entire trailing byte empty.
        if delimiter == 0 {
            packed.pop();
        } else if let Some(last) = packed.last_mut() {
            *last ^= 1 << delimiter;
        }

        Ok(Self { bytes: packed, len })
    }

    /// Returns the SSZ representation of this bitfield as a bitlist (i.e., with the length
    /// delimiter bit appended).
    pub fn to_bitlist_bytes(&self) -> Vec<u8> {
        let mut bytes = self.bytes.to_vec();
        if self.len % 8 == 0 {
            bytes.push(1);
        } else if let Some(last) = bytes.last_mut() {
            *last |= 1 << (self.len % 8);
        }
        bytes
    }

    /// Read the value of a bit.
    pub fn get(&self, i: usize) -> Result<bool, Error> {
        if i < self.len {
            Ok(self.bytes[i / 8] & (1 << (i % 8)) != 0)
        } else {
            Err(Error::OutOfBounds { i, len: self.len })
        }
    }

    /// Set the value of a bit. The bitfield is never grown.
    pub fn set(&mut self, i: usize, value: bool) -> Result<(), Error> {
        if i >= self.len {
            return Err(Error::OutOfBounds { i, len: self.len });
        }

        let byte = &mut self.bytes[i / 8];
        if value {
            *byte |= 1 << (i % 8)
        } else {
            *byte &= !(1 << (i % 8))
        }

        Ok(())
    }

    /// Append a bit, growing the bitfield by one.
    pub fn push(&mut self, value: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        self.len += 1;
        // The new bit is always in bounds.
        let i = self.len - 1;
        if value {
            self.bytes[i / 8] |= 1 << (i % 8);
        }
    }

    /// Returns the number of bits in this bitfield.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if all bits are set to `false`.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|byte| *byte == 0)
    }

    pub fn num_set_bits(&self) -> usize {
        self.bytes
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    /// The packed bits, without any length delimiter.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bytes[i / 8] & (1 << (i % 8)) != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set() {
        let mut bitfield = Bitfield::with_len(10);
        assert_eq!(bitfield.as_bytes(), &[0, 0]);

        bitfield.set(0, true).unwrap();
        bitfield.set(9, true).unwrap();
        assert_eq!(bitfield.as_bytes(), &[0b0000_0001, 0b0000_0010]);
        assert_eq!(bitfield.get(9), Ok(true));
        assert_eq!(bitfield.get(8), Ok(false));
        assert_eq!(bitfield.num_set_bits(), 2);

        bitfield.set(0, false).unwrap();
        assert_eq!(bitfield.as_bytes(), &[0, 0b0000_0010]);

        assert_eq!(bitfield.get(10), Err(Error::OutOfBounds { i: 10, len: 10 }));
        assert_eq!(
            bitfield.set(10, true),
            Err(Error::OutOfBounds { i: 10, len: 10 })
        );
    }

    #[test]
    fn from_bits() {
        let bitfield = Bitfield::from_bits(vec![true, false, true, false]);
        assert_eq!(bitfield.len(), 4);
        assert_eq!(bitfield.as_bytes(), &[0b0000_0101]);
        assert_eq!(
            bitfield.iter().collect::<Vec<_>>(),
            vec![true, false, true, false]
        );
    }

    #[test]
    fn from_bytes_padding() {
        assert!(Bitfield::from_bytes(&[0b0000_1111], 4).is_ok());
        assert_eq!(
            Bitfield::from_bytes(&[0b0001_0000], 4),
            Err(Error::ExcessBits {
                last_byte: 0b0001_0000
            })
        );
        assert!(Bitfield::from_bytes(&[0xff, 0xff], 16).is_ok());
        assert_eq!(
            Bitfield::from_bytes(&[0xff], 16),
            Err(Error::InvalidByteCount {
                given: 1,
                expected: 2
            })
        );
    }

    #[test]
    fn bitlist_bytes() {
        let empty = Bitfield::default();
        assert_eq!(empty.to_bitlist_bytes(), vec![0b0000_0001]);
        assert_eq!(Bitfield::from_bitlist_bytes(&[1], 8), Ok(empty));

        let bitfield = Bitfield::from_bits(vec![true, false, true]);
        assert_eq!(bitfield.to_bitlist_bytes(), vec![0b0000_1101]);
        assert_eq!(Bitfield::from_bitlist_bytes(&[0b0000_1101], 8), Ok(bitfield));

        let full_byte = Bitfield::from_bits(vec![true; 8]);
        assert_eq!(full_byte.to_bitlist_bytes(), vec![0xff, 0b0000_0001]);
        assert_eq!(
            Bitfield::from_bitlist_bytes(&[0xff, 0b0000_0001], 8),
            Ok(full_byte)
        );
    }

    #[test]
    fn bitlist_bytes_invalid() {
        assert_eq!(
            Bitfield::from_bitlist_bytes(&[], 8),
            Err(Error::MissingLengthInformation)
        );
        assert_eq!(
            Bitfield::from_bitlist_bytes(&[0b0000_0001, 0], 8),
            Err(Error::MissingLengthInformation)
        );
        assert_eq!(
            Bitfield::from_bitlist_bytes(&[0, 0b0000_0010], 8),
            Err(Error::LimitExceeded { len: 9, limit: 8 })
        );
        assert_eq!(
            Bitfield::from_bitlist_bytes(&[0, 0, 1], 8),
            Err(Error::LimitExceeded { len: 16, limit: 8 })
        );
    }
}
