//! Scoped byte buffers for packed keys and values.
//!
//! One `PackedBuffer` holds one encoded key or value for the duration of a
//! single store call. Small payloads stay inline in the caller's frame; larger
//! ones spill to the heap. Both cases are released when the buffer goes out of
//! scope, including `?` early returns.

use derive_more::{Deref, DerefMut};
use smallvec::SmallVec;
use std::io;

/// Largest payload that never touches the heap.
pub const FAST_BUFFER_BYTES: usize = 512;

///
/// PackedBuffer
///

#[derive(Clone, Debug, Default, Deref, DerefMut, Eq, PartialEq)]
#[deref(forward)]
#[deref_mut(forward)]
pub struct PackedBuffer(SmallVec<[u8; FAST_BUFFER_BYTES]>);

impl PackedBuffer {
    /// Empty buffer with room for `size` bytes.
    #[must_use]
    pub fn acquire(size: usize) -> Self {
        Self(SmallVec::with_capacity(size))
    }

    /// Buffer of `size` zero bytes, used as a read destination.
    #[must_use]
    pub fn zeroed(size: usize) -> Self {
        Self(SmallVec::from_elem(0, size))
    }

    /// Whether the bytes still live inline.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        !self.0.spilled()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    pub fn push(&mut self, byte: u8) {
        self.0.push(byte);
    }
}

impl AsRef<[u8]> for PackedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl io::Write for PackedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn threshold_sized_buffer_stays_inline() {
        let mut buf = PackedBuffer::acquire(FAST_BUFFER_BYTES);
        buf.extend_from_slice(&[7u8; FAST_BUFFER_BYTES]);

        assert!(buf.is_inline());
        assert_eq!(buf.len(), FAST_BUFFER_BYTES);
    }

    #[test]
    fn one_byte_over_threshold_spills() {
        let buf = PackedBuffer::acquire(FAST_BUFFER_BYTES + 1);

        assert!(!buf.is_inline());
        assert!(buf.is_empty());
    }

    #[test]
    fn growth_past_threshold_spills_and_keeps_bytes() {
        let mut buf = PackedBuffer::acquire(4);
        for i in 0..=FAST_BUFFER_BYTES {
            buf.push((i % 251) as u8);
        }

        assert!(!buf.is_inline());
        assert_eq!(buf.len(), FAST_BUFFER_BYTES + 1);
        assert_eq!(buf[FAST_BUFFER_BYTES], (FAST_BUFFER_BYTES % 251) as u8);
    }

    #[test]
    fn zeroed_buffer_is_writable_in_place() {
        let mut buf = PackedBuffer::zeroed(3);
        buf[1] = 9;

        assert_eq!(buf.as_slice(), &[0, 9, 0]);
    }

    #[test]
    fn io_write_appends() {
        let mut buf = PackedBuffer::default();
        buf.write_all(b"ab").unwrap();
        buf.write_all(b"cd").unwrap();

        assert_eq!(buf.as_slice(), b"abcd");
    }
}
