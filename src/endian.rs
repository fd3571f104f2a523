//! Byte-order aware readers for the datx index buffer
//!
//! The datx format mixes byte orders: the header is big-endian, the
//! first-level index and payload offsets are little-endian, and record keys
//! are raw network-order IPv4 bytes. Each field width gets its own statically
//! typed reader.
//!
//! All readers are bounds-checked and return `None` when the requested range
//! runs past the end of the buffer.
//!
//! ```rust
//! use datx::endian::{read_u32_be, read_u32_le, read_u24_le};
//!
//! let buffer = [0x12, 0x34, 0x56, 0x78];
//! assert_eq!(read_u32_be(&buffer, 0), Some(0x12345678));
//! assert_eq!(read_u32_le(&buffer, 0), Some(0x78563412));
//! assert_eq!(read_u24_le(&buffer, 1), Some(0x785634));
//! assert_eq!(read_u32_le(&buffer, 1), None);
//! ```

#[inline(always)]
fn array_at<const N: usize>(buffer: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    buffer.get(offset..end)?.try_into().ok()
}

/// Read an unsigned byte
#[inline(always)]
pub fn read_u8(buffer: &[u8], offset: usize) -> Option<u8> {
    buffer.get(offset).copied()
}

/// Read a u16 in big-endian format
#[inline(always)]
pub fn read_u16_be(buffer: &[u8], offset: usize) -> Option<u16> {
    array_at(buffer, offset).map(u16::from_be_bytes)
}

/// Read a 24-bit little-endian value, zero-extended to u32
#[inline(always)]
pub fn read_u24_le(buffer: &[u8], offset: usize) -> Option<u32> {
    let [b0, b1, b2] = array_at::<3>(buffer, offset)?;
    Some(u32::from_le_bytes([b0, b1, b2, 0]))
}

/// Read a u32 in big-endian (network) format
#[inline(always)]
pub fn read_u32_be(buffer: &[u8], offset: usize) -> Option<u32> {
    array_at(buffer, offset).map(u32::from_be_bytes)
}

/// Read a u32 in little-endian format
#[inline(always)]
pub fn read_u32_le(buffer: &[u8], offset: usize) -> Option<u32> {
    array_at(buffer, offset).map(u32::from_le_bytes)
}

/// Read four raw bytes (an IPv4 key in network order)
#[inline(always)]
pub fn read_bytes4(buffer: &[u8], offset: usize) -> Option<[u8; 4]> {
    array_at(buffer, offset)
}
