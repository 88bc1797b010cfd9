//! Per-wire-type decode/encode for the fifteen scalar proto types the
//! accessor's typed access layer exposes.
//!
//! These functions don't implement a generic `ProtoDecode`/`ProtoEncode`
//! trait keyed on a Rust type — the accessor is schema-unaware, so the
//! *proto* type (`Int32` vs `Sint32` vs `Sfixed32`, all three backed by
//! `i32`) has to be tracked explicitly alongside the decoded value.

use alloc::string::String;
use bytes::{Buf, Bytes};

use crate::error::AccessError;
use crate::leb128::{self, LebCodec};
use crate::util::ReinterpretCastFrom;
use crate::wire::{self, WireType};

/// Identifies one of the fifteen [scalar proto
/// types](https://protobuf.dev/programming-guides/proto3/#scalar).
///
/// Several kinds share a Rust value representation (`Int32`/`Sint32`/
/// `Sfixed32` are all `i32`) but differ in wire type and/or encoding
/// algorithm, so a field decoded as one kind is not compatible with a read
/// requesting another, even when the underlying bits would reinterpret
/// cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int32,
    Uint32,
    Sint32,
    Int64,
    Uint64,
    Sint64,
    Fixed32,
    Sfixed32,
    Fixed64,
    Sfixed64,
    Float,
    Double,
    String,
    Bytes,
}

impl ScalarKind {
    /// The wire type a write of this kind always produces.
    pub const fn canonical_wire_type(self) -> WireType {
        match self {
            ScalarKind::Bool
            | ScalarKind::Int32
            | ScalarKind::Uint32
            | ScalarKind::Sint32
            | ScalarKind::Int64
            | ScalarKind::Uint64
            | ScalarKind::Sint64 => WireType::Varint,
            ScalarKind::Fixed64 | ScalarKind::Sfixed64 | ScalarKind::Double => WireType::I64,
            ScalarKind::String | ScalarKind::Bytes => WireType::Len,
            ScalarKind::Fixed32 | ScalarKind::Sfixed32 | ScalarKind::Float => WireType::I32,
        }
    }
}

/// A decoded, cached scalar value (the `Decoded` entry variant's payload).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int32(i32),
    Uint32(u32),
    Sint32(i32),
    Int64(i64),
    Uint64(u64),
    Sint64(i64),
    Fixed32(u32),
    Sfixed32(i32),
    Fixed64(u64),
    Sfixed64(i64),
    Float(f32),
    Double(f64),
    /// UTF-8-validated string payload, stored as shared bytes like the
    /// teacher's `ProtoString` rather than an owned `String`, so a cached
    /// string field is cheap to clone during [`crate::accessor::Accessor::shallow_copy`].
    String(Bytes),
    Bytes(Bytes),
}

impl Scalar {
    pub const fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Int32(_) => ScalarKind::Int32,
            Scalar::Uint32(_) => ScalarKind::Uint32,
            Scalar::Sint32(_) => ScalarKind::Sint32,
            Scalar::Int64(_) => ScalarKind::Int64,
            Scalar::Uint64(_) => ScalarKind::Uint64,
            Scalar::Sint64(_) => ScalarKind::Sint64,
            Scalar::Fixed32(_) => ScalarKind::Fixed32,
            Scalar::Sfixed32(_) => ScalarKind::Sfixed32,
            Scalar::Fixed64(_) => ScalarKind::Fixed64,
            Scalar::Sfixed64(_) => ScalarKind::Sfixed64,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Double(_) => ScalarKind::Double,
            Scalar::String(_) => ScalarKind::String,
            Scalar::Bytes(_) => ScalarKind::Bytes,
        }
    }

    pub const fn wire_type(&self) -> WireType {
        self.kind().canonical_wire_type()
    }

    /// Encodes the payload only (no tag) to `buf`.
    pub fn encode_payload<B: bytes::BufMut>(&self, buf: &mut B) {
        match self {
            Scalar::Bool(v) => u64::from(*v as u8).encode_leb128(buf),
            Scalar::Int32(v) => u64::reinterpret_cast_from(i64::from(*v)).encode_leb128(buf),
            Scalar::Uint32(v) => u64::from(*v).encode_leb128(buf),
            Scalar::Sint32(v) => leb128::zigzag_encode32(*v).encode_leb128(buf),
            Scalar::Int64(v) => u64::reinterpret_cast_from(*v).encode_leb128(buf),
            Scalar::Uint64(v) => v.encode_leb128(buf),
            Scalar::Sint64(v) => leb128::zigzag_encode64(*v).encode_leb128(buf),
            Scalar::Fixed32(v) => buf.put_u32_le(*v),
            Scalar::Sfixed32(v) => buf.put_i32_le(*v),
            Scalar::Fixed64(v) => buf.put_u64_le(*v),
            Scalar::Sfixed64(v) => buf.put_i64_le(*v),
            Scalar::Float(v) => buf.put_f32_le(*v),
            Scalar::Double(v) => buf.put_f64_le(*v),
            Scalar::String(s) => {
                (s.len() as u64).encode_leb128(buf);
                buf.put_slice(s);
            }
            Scalar::Bytes(b) => {
                (b.len() as u64).encode_leb128(buf);
                buf.put_slice(b);
            }
        }
    }

    /// Returns the encoded length of the payload only (no tag).
    pub fn encoded_payload_len(&self) -> usize {
        match self {
            Scalar::Bool(_) => 1,
            Scalar::Int32(v) => u64::reinterpret_cast_from(i64::from(*v)).encoded_leb128_len(),
            Scalar::Uint32(v) => u64::from(*v).encoded_leb128_len(),
            Scalar::Sint32(v) => leb128::zigzag_encode32(*v).encoded_leb128_len(),
            Scalar::Int64(v) => u64::reinterpret_cast_from(*v).encoded_leb128_len(),
            Scalar::Uint64(v) => v.encoded_leb128_len(),
            Scalar::Sint64(v) => leb128::zigzag_encode64(*v).encoded_leb128_len(),
            Scalar::Fixed32(_) | Scalar::Sfixed32(_) | Scalar::Float(_) => 4,
            Scalar::Fixed64(_) | Scalar::Sfixed64(_) | Scalar::Double(_) => 8,
            Scalar::String(s) => (s.len() as u64).encoded_leb128_len() + s.len(),
            Scalar::Bytes(b) => (b.len() as u64).encoded_leb128_len() + b.len(),
        }
    }
}

/// Decodes one value of `kind` from the front of `payload`, advancing it
/// past the bytes consumed. Used both for a singular field's one exact
/// range and, element by element, for a packed repeated field's
/// concatenated payload.
pub fn decode_scalar_from(kind: ScalarKind, payload: &mut &[u8]) -> Result<Scalar, AccessError> {
    Ok(match kind {
        ScalarKind::Bool => {
            let (v, _) = u64::decode_leb128_buf(payload)?;
            Scalar::Bool(v != 0)
        }
        ScalarKind::Int32 => {
            let (v, _) = u64::decode_leb128_buf(payload)?;
            Scalar::Int32(i64::reinterpret_cast_from(v) as i32)
        }
        ScalarKind::Uint32 => {
            let (v, _) = u64::decode_leb128_buf(payload)?;
            Scalar::Uint32(v as u32)
        }
        ScalarKind::Sint32 => {
            let (v, _) = u32::decode_leb128_buf(payload)?;
            Scalar::Sint32(leb128::zigzag_decode32(v))
        }
        ScalarKind::Int64 => {
            let (v, _) = u64::decode_leb128_buf(payload)?;
            Scalar::Int64(i64::reinterpret_cast_from(v))
        }
        ScalarKind::Uint64 => {
            let (v, _) = u64::decode_leb128_buf(payload)?;
            Scalar::Uint64(v)
        }
        ScalarKind::Sint64 => {
            let (v, _) = u64::decode_leb128_buf(payload)?;
            Scalar::Sint64(leb128::zigzag_decode64(v))
        }
        ScalarKind::Fixed32 => Scalar::Fixed32(read_fixed::<4>(payload)?.to_u32_le()),
        ScalarKind::Sfixed32 => Scalar::Sfixed32(read_fixed::<4>(payload)?.to_i32_le()),
        ScalarKind::Float => Scalar::Float(read_fixed::<4>(payload)?.to_f32_le()),
        ScalarKind::Fixed64 => Scalar::Fixed64(read_fixed::<8>(payload)?.to_u64_le()),
        ScalarKind::Sfixed64 => Scalar::Sfixed64(read_fixed::<8>(payload)?.to_i64_le()),
        ScalarKind::Double => Scalar::Double(read_fixed::<8>(payload)?.to_f64_le()),
        ScalarKind::String => {
            let bytes = read_len_delimited(payload)?;
            core::str::from_utf8(&bytes)
                .map_err(|_| AccessError::parse("invalid UTF-8 in string field"))?;
            Scalar::String(bytes)
        }
        ScalarKind::Bytes => Scalar::Bytes(read_len_delimited(payload)?),
    })
}

/// Decodes a single field occurrence's exact byte range (as recorded by the
/// indexer) as `kind`. Trailing bytes left over after a well-formed value
/// are ignored, since the indexer always records a range sized to exactly
/// one tag's payload.
pub fn decode_scalar(kind: ScalarKind, payload: &[u8]) -> Result<Scalar, AccessError> {
    let mut cursor = payload;
    decode_scalar_from(kind, &mut cursor)
}

/// Fixed-size little-endian byte window, used to keep the `read_fixed`
/// helper generic over the four/eight-byte scalar kinds.
struct FixedBytes<const N: usize>([u8; N]);

impl FixedBytes<4> {
    fn to_u32_le(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }
    fn to_i32_le(&self) -> i32 {
        i32::from_le_bytes(self.0)
    }
    fn to_f32_le(&self) -> f32 {
        f32::from_le_bytes(self.0)
    }
}

impl FixedBytes<8> {
    fn to_u64_le(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }
    fn to_i64_le(&self) -> i64 {
        i64::from_le_bytes(self.0)
    }
    fn to_f64_le(&self) -> f64 {
        f64::from_le_bytes(self.0)
    }
}

fn read_fixed<const N: usize>(payload: &mut &[u8]) -> Result<FixedBytes<N>, AccessError> {
    if payload.remaining() < N {
        return Err(AccessError::parse("wrong payload length for fixed-width scalar"));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&payload[..N]);
    payload.advance(N);
    Ok(FixedBytes(out))
}

fn read_len_delimited(payload: &mut &[u8]) -> Result<Bytes, AccessError> {
    let len = wire::decode_len(payload)?;
    if payload.remaining() < len {
        return Err(AccessError::parse("length-delimited payload truncated"));
    }
    let bytes = Bytes::copy_from_slice(&payload[..len]);
    payload.advance(len);
    Ok(bytes)
}

/// Validates and narrows an `f64` for `set_float`: the value must either
/// already be representable as an `f32`-range finite value, or be
/// NaN/infinite (which survive narrowing unchanged).
pub fn narrow_to_f32(value: f64) -> Result<f32, AccessError> {
    if value.is_nan() || value.is_infinite() {
        return Ok(value as f32);
    }
    let narrowed = value as f32;
    if narrowed.is_finite() {
        Ok(narrowed)
    } else {
        Err(AccessError::value_type_invalid(
            "double value is out of range for a single-precision float field",
        ))
    }
}

/// Returns a `Bytes` known to be valid UTF-8, for constructing a `String`
/// scalar from a caller-provided `&str`/`String` without re-validating.
pub fn bytes_from_string(s: String) -> Bytes {
    Bytes::from(s.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn payload_for(kind: ScalarKind, scalar: &Scalar) -> Vec<u8> {
        let _ = kind;
        let mut buf = Vec::new();
        scalar.encode_payload(&mut buf);
        buf
    }

    #[test]
    fn bool_roundtrip() {
        let buf = payload_for(ScalarKind::Bool, &Scalar::Bool(true));
        assert_eq!(buf, [0x01]);
        assert_eq!(decode_scalar(ScalarKind::Bool, &buf).unwrap(), Scalar::Bool(true));
    }

    #[test]
    fn sint32_uses_zigzag() {
        let buf = payload_for(ScalarKind::Sint32, &Scalar::Sint32(-2));
        assert_eq!(buf, [0x03]);
        assert_eq!(decode_scalar(ScalarKind::Sint32, &buf).unwrap(), Scalar::Sint32(-2));
    }

    #[test]
    fn fixed32_roundtrip() {
        let buf = payload_for(ScalarKind::Fixed32, &Scalar::Fixed32(1));
        assert_eq!(buf, [1, 0, 0, 0]);
        assert_eq!(decode_scalar(ScalarKind::Fixed32, &buf).unwrap(), Scalar::Fixed32(1));
    }

    #[test]
    fn string_validates_utf8() {
        let bad = [0x01, 0xFF];
        assert!(decode_scalar(ScalarKind::String, &bad).is_err());
    }

    #[test]
    fn narrow_float_rejects_overflow() {
        assert!(narrow_to_f32(f64::MAX).is_err());
        assert!(narrow_to_f32(1.6).is_ok());
        assert!(narrow_to_f32(f64::NAN).unwrap().is_nan());
    }
}
