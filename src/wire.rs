//! Wire format for Google's Protocol Buffers, aka [protobuf](https://protobuf.dev).

use bytes::Buf;

use crate::error::AccessError;
use crate::leb128::LebCodec;
use crate::util::{likely, unlikely, CastFrom};

/// Minimum value of a protobuf field number.
pub const MIN_FIELD_NUMBER: u32 = 1;
/// Maximum value of a protobuf field number.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Denotes the type of a field in an encoded protobuf message.
///
/// Protobuf messages are a series of key-value pairs. Each key-value pair is
/// a record consisting of a field number, a [`WireType`], and a payload. The
/// [`WireType`] indicates how large the proceeding payload is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for `int32`, `int64`, `uint32`, `uint64`, `sint32`, `sint64`, `bool`.
    Varint = 0,
    /// 64-bit integer.
    ///
    /// Used for `fixed64`, `sfixed64`, `double`.
    I64 = 1,
    /// Length-delimited payload.
    ///
    /// Used for `string`, `bytes`, embedded messages, and packed `repeated` fields.
    Len = 2,
    /// Group start (deprecated, unsupported).
    SGroup = 3,
    /// Group end (deprecated, unsupported).
    EGroup = 4,
    /// 32-bit integer.
    ///
    /// Used for `fixed32`, `sfixed32`, `float`.
    I32 = 5,
}

impl WireType {
    #[inline(always)]
    const fn try_from_val(value: u8) -> Option<Self> {
        match value {
            0 => Some(WireType::Varint),
            1 => Some(WireType::I64),
            2 => Some(WireType::Len),
            3 => Some(WireType::SGroup),
            4 => Some(WireType::EGroup),
            5 => Some(WireType::I32),
            _ => None,
        }
    }

    /// Returns the raw value for this [`WireType`].
    #[inline(always)]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = AccessError;

    #[inline(always)]
    fn try_from(value: u8) -> Result<Self, AccessError> {
        WireType::try_from_val(value).ok_or(AccessError::parse("invalid wire type"))
    }
}

/// A decoded `(field_number, wire_type)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub field_number: u32,
    pub wire_type: WireType,
}

/// Encodes a tag (field number + wire type) as a protobuf key varint.
#[inline]
pub fn encode_tag<B: bytes::BufMut>(field_number: u32, wire_type: WireType, buf: &mut B) {
    let key = (field_number << 3) | u32::cast_from(wire_type.into_val());
    key.encode_leb128(buf);
}

/// Decodes a tag from the front of `buf`.
///
/// Field numbers outside `1..=MAX_FIELD_NUMBER` or wire types `3`/`4`
/// (groups) are rejected with [`AccessError::parse`] — the indexer never
/// produces a `Tag` for a group.
#[inline]
pub fn decode_tag<B: Buf>(buf: &mut B) -> Result<Tag, AccessError> {
    if unlikely(!buf.has_remaining()) {
        return Err(AccessError::parse("unexpected end of buffer reading tag"));
    }
    let (raw, _) = u32::decode_leb128_buf(buf)?;

    let wire_type_raw = (raw & 0b111) as u8;
    let wire_type = WireType::try_from_val(wire_type_raw)
        .ok_or(AccessError::parse("invalid wire type in tag"))?;
    if matches!(wire_type, WireType::SGroup | WireType::EGroup) {
        return Err(AccessError::parse("group encoding is not supported"));
    }

    let field_number = raw >> 3;
    if unlikely(field_number < MIN_FIELD_NUMBER || field_number > MAX_FIELD_NUMBER) {
        return Err(AccessError::parse("field number out of range"));
    }

    Ok(Tag { field_number, wire_type })
}

/// Decodes the length prefix for a length-delimited field.
#[inline]
pub fn decode_len<B: Buf>(buf: &mut B) -> Result<usize, AccessError> {
    let chunk = buf.chunk();
    if likely(!chunk.is_empty() && chunk[0] < 0x80) {
        let len = usize::cast_from(chunk[0]);
        buf.advance(1);
        Ok(len)
    } else {
        let (len, _) = u64::decode_leb128_buf(buf)?;
        usize::try_from(len).map_err(|_| AccessError::parse("length prefix too large"))
    }
}

/// Measures and skips the payload bytes a field of `wire_type` occupies at
/// the front of `buf`, without copying or interpreting the payload. Returns
/// the payload length (excluding any length prefix for `Len`).
///
/// This is the core primitive the indexer uses to record byte ranges
/// without decoding values.
#[inline]
pub fn skip_field<B: Buf>(wire_type: WireType, buf: &mut B) -> Result<usize, AccessError> {
    let skip_len = match wire_type {
        WireType::Varint => {
            let (_, bytes_read) = u64::decode_leb128_buf(buf)?;
            return Ok(bytes_read);
        }
        WireType::I64 => 8,
        WireType::Len => decode_len(buf)?,
        WireType::I32 => 4,
        WireType::SGroup | WireType::EGroup => {
            return Err(AccessError::parse("group encoding is not supported"));
        }
    };

    if buf.remaining() < skip_len {
        return Err(AccessError::parse("unexpected end of buffer skipping field"));
    }
    buf.advance(skip_len);
    Ok(skip_len)
}

#[cfg(test)]
mod test {
    use alloc::vec::Vec;
    use proptest::prelude::*;

    use super::*;

    fn arb_field_number() -> impl Strategy<Value = u32> {
        MIN_FIELD_NUMBER..=MAX_FIELD_NUMBER
    }

    fn arb_wire_type() -> impl Strategy<Value = WireType> {
        prop_oneof![
            Just(WireType::Varint),
            Just(WireType::I64),
            Just(WireType::Len),
            Just(WireType::I32),
        ]
    }

    proptest! {
        #[test]
        fn tag_roundtrips(field_number in arb_field_number(), wire_type in arb_wire_type()) {
            let mut buf = Vec::new();
            encode_tag(field_number, wire_type, &mut buf);
            let tag = decode_tag(&mut &buf[..]).unwrap();
            prop_assert_eq!(tag.field_number, field_number);
            prop_assert_eq!(tag.wire_type, wire_type);
        }
    }

    #[test]
    fn rejects_group_wire_types() {
        let mut buf = Vec::new();
        encode_tag(1, WireType::Varint, &mut buf);
        buf[0] = (buf[0] & !0b111) | 3; // SGroup
        assert!(decode_tag(&mut &buf[..]).is_err());
    }

    #[test]
    fn rejects_field_number_zero() {
        // Raw key with tag=0, wire_type=varint encodes to a single zero byte.
        let buf = [0u8];
        assert!(decode_tag(&mut &buf[..]).is_err());
    }

    #[test]
    fn rejects_field_number_above_max() {
        let mut buf = Vec::new();
        encode_tag(MAX_FIELD_NUMBER + 1, WireType::Varint, &mut buf);
        assert!(decode_tag(&mut &buf[..]).is_err());
    }

    #[test]
    fn decode_len_examples() {
        assert_eq!(decode_len(&mut &[0u8][..]).unwrap(), 0);
        assert_eq!(decode_len(&mut &[127u8][..]).unwrap(), 127);
        assert_eq!(decode_len(&mut &[0x80, 0x01][..]).unwrap(), 128);
        assert_eq!(decode_len(&mut &[0xAC, 0x02][..]).unwrap(), 300);
    }

    #[test]
    fn skip_field_varint() {
        let mut buf = &[0x80u8, 0x01, 99][..];
        let n = skip_field(WireType::Varint, &mut buf).unwrap();
        assert_eq!(n, 2);
        assert_eq!(buf, &[99]);
    }

    #[test]
    fn skip_field_len() {
        let mut buf = &[3u8, 1, 2, 3, 99][..];
        let n = skip_field(WireType::Len, &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(buf, &[99]);
    }

    #[test]
    fn skip_field_groups_error() {
        let mut buf = &[0u8][..];
        assert!(skip_field(WireType::SGroup, &mut buf).is_err());
        assert!(skip_field(WireType::EGroup, &mut buf).is_err());
    }
}
