//! LEB128 variable-length integer encoding/decoding.
//!
//! This is the low-level varint primitive the accessor builds on; the
//! accessor itself never reasons about byte-level encoding beyond calling
//! into this module and [`crate::wire`].

use bytes::Buf;

use crate::error::AccessError;

/// Types that can be encoded/decoded as a LEB128 variable-length integer.
pub trait LebCodec: Sized {
    /// Maximum number of bytes a LEB128 encoding of `Self` can occupy.
    const MAX_LEB_BYTES: u32;

    /// Decodes a LEB128 integer from the front of `buf`, advancing it past
    /// the bytes consumed. Returns the value and the number of bytes read.
    fn decode_leb128_buf<B: Buf>(buf: &mut B) -> Result<(Self, usize), AccessError>;

    /// Encodes `self` as a LEB128 integer into `buf`.
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B);

    /// The number of bytes `self` would occupy when LEB128-encoded.
    fn encoded_leb128_len(self) -> usize;
}

impl LebCodec for u64 {
    const MAX_LEB_BYTES: u32 = 10;

    #[inline]
    fn decode_leb128_buf<B: Buf>(buf: &mut B) -> Result<(Self, usize), AccessError> {
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        let mut bytes_read = 0usize;

        loop {
            if !buf.has_remaining() {
                return Err(AccessError::parse("unexpected end of buffer reading varint"));
            }
            if bytes_read == Self::MAX_LEB_BYTES as usize {
                return Err(AccessError::parse("varint too long"));
            }
            let byte = buf.get_u8();
            bytes_read += 1;

            // The 10th byte of a u64 varint can only carry a single
            // significant bit (bits 0-63 have already been consumed).
            if bytes_read == Self::MAX_LEB_BYTES as usize && byte > 0x01 {
                return Err(AccessError::parse("varint overflows u64"));
            }

            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok((value, bytes_read));
            }
            shift += 7;
        }
    }

    #[inline]
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) {
        let mut value = self;
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                buf.put_u8(byte);
                return;
            }
            buf.put_u8(byte | 0x80);
        }
    }

    #[inline]
    fn encoded_leb128_len(self) -> usize {
        // 7 bits per byte, minimum 1 byte for value 0.
        let significant_bits = 64 - self.leading_zeros();
        core::cmp::max(1, significant_bits.div_ceil(7) as usize)
    }
}

impl LebCodec for u32 {
    const MAX_LEB_BYTES: u32 = 5;

    #[inline]
    fn decode_leb128_buf<B: Buf>(buf: &mut B) -> Result<(Self, usize), AccessError> {
        let (value, bytes_read) = u64::decode_leb128_buf(buf)?;
        if bytes_read > Self::MAX_LEB_BYTES as usize || value > u64::from(u32::MAX) {
            return Err(AccessError::parse("varint overflows u32"));
        }
        Ok((value as u32, bytes_read))
    }

    #[inline]
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) {
        u64::from(self).encode_leb128(buf)
    }

    #[inline]
    fn encoded_leb128_len(self) -> usize {
        u64::from(self).encoded_leb128_len()
    }
}

/// Zig-zag encodes a signed 32-bit integer for `sint32` fields.
#[inline]
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Zig-zag decodes a `sint32` varint payload.
#[inline]
pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zig-zag encodes a signed 64-bit integer for `sint64` fields.
#[inline]
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Zig-zag decodes a `sint64` varint payload.
#[inline]
pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
