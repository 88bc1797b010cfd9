//! The core accessor: construction, the lazy indexer, typed singular and
//! repeated scalar access, sub-message attach/detach, shallow copy, and
//! serialization.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use bytes::{Buf, BufMut, Bytes};

use crate::entry::{AccessorHandle, Entry, MessageEntry, RawEntry, RawRange, RepeatedEntry};
use crate::error::{AccessError, Checks};
use crate::leb128::LebCodec;
use crate::scalar::{self, Scalar, ScalarKind};
use crate::storage::Storage;
use crate::wire::{self, WireType};

/// Default pivot: field numbers below this use dense storage.
pub const DEFAULT_PIVOT: u32 = 24;

impl From<Bytes> for Accessor {
    fn from(bytes: Bytes) -> Self {
        Self::from_buffer(bytes)
    }
}

impl From<Vec<u8>> for Accessor {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_buffer(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Accessor {
    fn from(bytes: &[u8]) -> Self {
        Self::from_buffer(Bytes::copy_from_slice(bytes))
    }
}

/// A lazy, mutable view over a protobuf-encoded buffer.
///
/// See the crate-level docs for the overall contract. An `Accessor` is not
/// `Send`/`Sync` — it and any sub-message accessors attached to it form one
/// ownership domain via `Rc`.
pub struct Accessor {
    source: Option<Bytes>,
    storage: Storage,
    indexed: bool,
    checks: Checks,
}

impl Accessor {
    /// Creates an accessor with no backing buffer (`createEmpty`).
    pub fn new_empty() -> Self {
        Self::new_empty_with_pivot(DEFAULT_PIVOT)
    }

    pub fn new_empty_with_pivot(pivot: u32) -> Self {
        Self { source: None, storage: Storage::new(pivot), indexed: true, checks: Checks::default() }
    }

    /// Wraps an accessor around encoded bytes (`fromBuffer`). No parsing
    /// happens until the first operation that needs the index.
    pub fn from_buffer(bytes: impl Into<Bytes>) -> Self {
        Self::from_buffer_with_pivot(bytes, DEFAULT_PIVOT)
    }

    pub fn from_buffer_with_pivot(bytes: impl Into<Bytes>, pivot: u32) -> Self {
        Self {
            source: Some(bytes.into()),
            storage: Storage::new(pivot),
            indexed: false,
            checks: Checks::default(),
        }
    }

    /// Wraps this accessor for sharing with a sub-message wrapper.
    pub fn into_handle(self) -> AccessorHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn with_checks(mut self, checks: Checks) -> Self {
        self.checks = checks;
        self
    }

    pub fn checks(&self) -> Checks {
        self.checks
    }

    /// The storage-representation hint this accessor was built with.
    /// Semantically inert.
    pub fn get_pivot(&self) -> u32 {
        self.storage.pivot()
    }

    /// Number of fields with a present value. Forces the index to be
    /// built, same as any other access.
    pub fn len(&mut self) -> Result<usize, AccessError> {
        self.ensure_indexed()?;
        Ok(self.storage.iter_ascending().filter(|(_, e)| e.is_present()).count())
    }

    pub fn is_empty(&mut self) -> Result<bool, AccessError> {
        Ok(self.len()? == 0)
    }

    fn check_bounds(&self, field_number: u32) -> Result<(), AccessError> {
        if self.checks.bounds
            && !(wire::MIN_FIELD_NUMBER..=wire::MAX_FIELD_NUMBER).contains(&field_number)
        {
            return Err(AccessError::out_of_range(field_number));
        }
        Ok(())
    }

    // ---- Indexer ------------------------------------------------------

    fn ensure_indexed(&mut self) -> Result<(), AccessError> {
        if self.indexed {
            return Ok(());
        }
        let Some(source) = self.source.clone() else {
            self.indexed = true;
            return Ok(());
        };
        let total_len = source.len();
        let mut cursor: &[u8] = &source;
        while cursor.has_remaining() {
            let tag = wire::decode_tag(&mut cursor)?;
            let value_start = total_len - cursor.remaining();
            wire::skip_field(tag.wire_type, &mut cursor)?;
            let value_end = total_len - cursor.remaining();

            let offset = u32::try_from(value_start)
                .map_err(|_| AccessError::parse("buffer too large to index"))?;
            let len = u32::try_from(value_end - value_start)
                .map_err(|_| AccessError::parse("field payload too large to index"))?;
            let range = RawRange { offset, len, wire_type: tag.wire_type };

            if let Some(Entry::Raw(raw)) = self.storage.get_mut(tag.field_number) {
                raw.push(range);
            } else {
                self.storage.set(tag.field_number, Entry::Raw(RawEntry::single(range)));
            }
        }
        self.indexed = true;
        Ok(())
    }

    fn range_bytes(&self, range: RawRange) -> Result<Bytes, AccessError> {
        let source =
            self.source.as_ref().ok_or_else(|| AccessError::parse("raw entry without source"))?;
        Ok(source.slice(range.as_usize_range()))
    }

    // ---- Typed singular scalar access ----------------------------------

    fn get_scalar(&mut self, field_number: u32, kind: ScalarKind) -> Result<Option<Scalar>, AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;

        let last_range = match self.storage.get(field_number) {
            None | Some(Entry::EmptyCleared) => return Ok(None),
            Some(Entry::Decoded(scalar)) => {
                return if scalar.kind() == kind {
                    Ok(Some(scalar.clone()))
                } else if self.checks.critical_type {
                    Err(AccessError::wire_type_mismatch(kind.canonical_wire_type(), scalar.wire_type()))
                } else {
                    Ok(None)
                };
            }
            Some(Entry::Raw(raw)) => {
                raw.last_wire_type().zip(raw.ranges.last().copied()).map(|(_, r)| r)
            }
            Some(Entry::Message(_)) => {
                return if self.checks.critical_type {
                    Err(AccessError::wire_type_mismatch(kind.canonical_wire_type(), WireType::Len))
                } else {
                    Ok(None)
                };
            }
            Some(Entry::Repeated(r)) => {
                let wt = r.wire_type;
                return if self.checks.critical_type {
                    Err(AccessError::wire_type_mismatch(kind.canonical_wire_type(), wt))
                } else {
                    Ok(None)
                };
            }
        };

        let Some(range) = last_range else {
            return Err(AccessError::parse("raw entry unexpectedly empty"));
        };
        if self.checks.critical_type && range.wire_type != kind.canonical_wire_type() {
            return Err(AccessError::wire_type_mismatch(kind.canonical_wire_type(), range.wire_type));
        }

        let bytes = self.range_bytes(range)?;
        let decoded = scalar::decode_scalar(kind, &bytes)?;
        self.storage.set(field_number, Entry::Decoded(decoded.clone()));
        Ok(Some(decoded))
    }

    fn set_scalar(&mut self, field_number: u32, scalar: Scalar) -> Result<(), AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        self.storage.set(field_number, Entry::Decoded(scalar));
        Ok(())
    }

    /// `setFloat` narrows and range-checks a double-precision input before
    /// storing it, the way JavaScript's `Math.fround` would.
    pub fn set_float(&mut self, field_number: u32, value: f64) -> Result<(), AccessError> {
        let narrowed = scalar::narrow_to_f32(value)?;
        self.set_scalar(field_number, Scalar::Float(narrowed))
    }

    pub fn get_float_with_default(&mut self, field_number: u32, default: f32) -> Result<f32, AccessError> {
        match self.get_scalar(field_number, ScalarKind::Float)? {
            Some(Scalar::Float(v)) => Ok(v),
            Some(_) | None => Ok(default),
        }
    }

    pub fn get_float(&mut self, field_number: u32) -> Result<f32, AccessError> {
        self.get_float_with_default(field_number, 0.0)
    }

    pub fn set_string(&mut self, field_number: u32, value: impl Into<String>) -> Result<(), AccessError> {
        self.set_scalar(field_number, Scalar::String(scalar::bytes_from_string(value.into())))
    }

    pub fn get_string_with_default<'a>(
        &'a mut self,
        field_number: u32,
        default: &'a str,
    ) -> Result<StringValue<'a>, AccessError> {
        match self.get_scalar(field_number, ScalarKind::String)? {
            Some(Scalar::String(bytes)) => Ok(StringValue::Owned(bytes)),
            Some(_) | None => Ok(StringValue::Borrowed(default)),
        }
    }

    pub fn get_string(&mut self, field_number: u32) -> Result<StringValue<'_>, AccessError> {
        self.get_string_with_default(field_number, "")
    }

    pub fn set_bytes(&mut self, field_number: u32, value: impl Into<Bytes>) -> Result<(), AccessError> {
        self.set_scalar(field_number, Scalar::Bytes(value.into()))
    }

    pub fn get_bytes_with_default(
        &mut self,
        field_number: u32,
        default: Bytes,
    ) -> Result<Bytes, AccessError> {
        match self.get_scalar(field_number, ScalarKind::Bytes)? {
            Some(Scalar::Bytes(b)) => Ok(b),
            Some(_) | None => Ok(default),
        }
    }

    pub fn get_bytes(&mut self, field_number: u32) -> Result<Bytes, AccessError> {
        self.get_bytes_with_default(field_number, Bytes::new())
    }

    // ---- Generic operations ---------------------------------------------

    pub fn has_field_number(&mut self, field_number: u32) -> Result<bool, AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        Ok(self.storage.get(field_number).map(Entry::is_present).unwrap_or(false))
    }

    /// `clearField`.
    pub fn clear_field(&mut self, field_number: u32) -> Result<(), AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        self.storage.set(field_number, Entry::EmptyCleared);
        Ok(())
    }

    // ---- Repeated scalar access -----------------------------------------

    fn get_repeated(&mut self, field_number: u32, kind: ScalarKind) -> Result<Vec<Scalar>, AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;

        let ranges: Vec<RawRange> = match self.storage.get(field_number) {
            None | Some(Entry::EmptyCleared) => return Ok(Vec::new()),
            Some(Entry::Repeated(r)) => {
                return if self.checks.critical_type && r.wire_type != kind.canonical_wire_type() {
                    Err(AccessError::wire_type_mismatch(kind.canonical_wire_type(), r.wire_type))
                } else {
                    Ok(r.values.clone())
                };
            }
            Some(Entry::Decoded(s)) => {
                return if self.checks.critical_type {
                    Err(AccessError::wire_type_mismatch(kind.canonical_wire_type(), s.wire_type()))
                } else {
                    Ok(Vec::new())
                };
            }
            Some(Entry::Message(_)) => {
                return if self.checks.critical_type {
                    Err(AccessError::wire_type_mismatch(kind.canonical_wire_type(), WireType::Len))
                } else {
                    Ok(Vec::new())
                };
            }
            Some(Entry::Raw(raw)) => raw.ranges.iter().copied().collect(),
        };

        let mut values = Vec::with_capacity(ranges.len());
        let mut was_packed = false;
        for range in &ranges {
            let bytes = self.range_bytes(*range)?;
            if range.wire_type == WireType::Len && kind.canonical_wire_type() != WireType::Len {
                was_packed = true;
                decode_packed_into(kind, &bytes, &mut values)?;
            } else if range.wire_type == kind.canonical_wire_type() {
                values.push(scalar::decode_scalar(kind, &bytes)?);
            } else if self.checks.critical_type {
                return Err(AccessError::wire_type_mismatch(kind.canonical_wire_type(), range.wire_type));
            } else {
                values.push(scalar::decode_scalar(kind, &bytes)?);
            }
        }

        let entry = RepeatedEntry { wire_type: kind.canonical_wire_type(), values: values.clone(), was_packed };
        self.storage.set(field_number, Entry::Repeated(entry));
        Ok(values)
    }

    pub fn get_repeated_iterable(
        &mut self,
        field_number: u32,
        kind: ScalarKind,
    ) -> Result<Vec<Scalar>, AccessError> {
        self.get_repeated(field_number, kind)
    }

    fn add_unpacked_element(&mut self, field_number: u32, kind: ScalarKind, value: Scalar) -> Result<(), AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        // Force any Raw ranges to decode first so values already on the
        // wire aren't silently dropped.
        let existing = self.get_repeated(field_number, kind)?;
        let mut entry = match self.storage.get_mut(field_number) {
            Some(Entry::Repeated(r)) => core::mem::replace(
                r,
                RepeatedEntry { wire_type: kind.canonical_wire_type(), values: Vec::new(), was_packed: false },
            ),
            _ => RepeatedEntry { wire_type: kind.canonical_wire_type(), values: existing, was_packed: false },
        };
        entry.values.push(value);
        self.storage.set(field_number, Entry::Repeated(entry));
        Ok(())
    }

    pub fn add_unpacked_iterable(
        &mut self,
        field_number: u32,
        kind: ScalarKind,
        values: impl IntoIterator<Item = Scalar>,
    ) -> Result<(), AccessError> {
        for value in values {
            self.add_unpacked_element(field_number, kind, value)?;
        }
        Ok(())
    }

    /// Replaces a repeated field's contents outright, to be re-emitted in
    /// packed form. Protobuf allows either packed or unpacked encoding for
    /// any repeated scalar field; a reader must accept both.
    pub fn set_packed_iterable(
        &mut self,
        field_number: u32,
        kind: ScalarKind,
        values: impl IntoIterator<Item = Scalar>,
    ) -> Result<(), AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        let entry = RepeatedEntry {
            wire_type: kind.canonical_wire_type(),
            values: values.into_iter().collect(),
            was_packed: true,
        };
        self.storage.set(field_number, Entry::Repeated(entry));
        Ok(())
    }

    // ---- Sub-message access ---------------------------------------------

    fn child_from_ranges(&self, ranges: &[RawRange], pivot: u32) -> Result<AccessorHandle, AccessError> {
        // Proto3 merge semantics: concatenate the payloads of every
        // length-delimited range for this field into one child buffer.
        let mut merged = bytes::BytesMut::new();
        for range in ranges {
            if range.wire_type != WireType::Len {
                return Err(AccessError::wire_type_mismatch(WireType::Len, range.wire_type));
            }
            let record = self.range_bytes(*range)?;
            let mut cursor: &[u8] = &record;
            let len = wire::decode_len(&mut cursor)?;
            if cursor.remaining() < len {
                return Err(AccessError::parse("sub-message payload truncated"));
            }
            merged.put_slice(&cursor[..len]);
        }
        Ok(Accessor::from_buffer_with_pivot(merged.freeze(), pivot).into_handle())
    }

    /// `getMessage`: immutable snapshot path. Never attaches and never
    /// caches the returned wrapper — each call over a raw field builds a
    /// fresh transient child from the current ranges, leaving the field's
    /// storage untouched so a later `serialize()` still re-emits the
    /// original bytes verbatim. A field already attached by one of the
    /// other message operations instead returns that attachment's cached
    /// wrapper, since at that point the field's authoritative
    /// representation already is the attached child.
    pub fn get_message<W: Clone + 'static>(
        &mut self,
        field_number: u32,
        creator: impl FnOnce(AccessorHandle) -> W,
    ) -> Result<W, AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        match self.storage.get(field_number) {
            None | Some(Entry::EmptyCleared) => Ok(creator(Accessor::new_empty().into_handle())),
            Some(Entry::Message(me)) => Ok(me.wrapper_or_create(creator)),
            Some(Entry::Raw(raw)) => {
                let ranges: Vec<RawRange> = raw.ranges.iter().copied().collect();
                let child = self.child_from_ranges(&ranges, DEFAULT_PIVOT)?;
                if let Some(Entry::Raw(raw_mut)) = self.storage.get_mut(field_number) {
                    raw_mut.immutable_snapshot = true;
                }
                Ok(creator(child))
            }
            Some(Entry::Decoded(s)) => {
                Err(AccessError::wire_type_mismatch(WireType::Len, s.wire_type()))
            }
            Some(Entry::Repeated(r)) => Err(AccessError::wire_type_mismatch(WireType::Len, r.wire_type)),
        }
    }

    /// `getMessageOrNull`: attaches (and caches) the child if the field is
    /// present, guarded against a prior immutable snapshot of the same raw
    /// field via `get_message`.
    pub fn get_message_or_null<W: Clone + 'static>(
        &mut self,
        field_number: u32,
        creator: impl FnOnce(AccessorHandle) -> W,
    ) -> Result<Option<W>, AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        match self.storage.get(field_number) {
            None | Some(Entry::EmptyCleared) => Ok(None),
            Some(Entry::Message(me)) => Ok(Some(me.wrapper_or_create(creator))),
            Some(Entry::Raw(raw)) => {
                if self.checks.ty && raw.immutable_snapshot {
                    return Err(AccessError::invalid_state(
                        "field already materialized via the immutable message accessor",
                    ));
                }
                let ranges: Vec<RawRange> = raw.ranges.iter().copied().collect();
                let child = self.child_from_ranges(&ranges, DEFAULT_PIVOT)?;
                let me = MessageEntry::new(child);
                let w = me.wrapper_or_create(creator);
                self.storage.set(field_number, Entry::Message(me));
                Ok(Some(w))
            }
            Some(Entry::Decoded(s)) => {
                Err(AccessError::wire_type_mismatch(WireType::Len, s.wire_type()))
            }
            Some(Entry::Repeated(r)) => Err(AccessError::wire_type_mismatch(WireType::Len, r.wire_type)),
        }
    }

    /// `getMessageAttach`: like `getMessageOrNull` but also materializes an
    /// empty, attached child when the field is absent.
    pub fn get_message_attach<W: Clone + 'static>(
        &mut self,
        field_number: u32,
        creator: impl FnOnce(AccessorHandle) -> W,
        pivot: Option<u32>,
    ) -> Result<W, AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        match self.storage.get(field_number) {
            None | Some(Entry::EmptyCleared) => {
                let child = Accessor::new_empty_with_pivot(pivot.unwrap_or(DEFAULT_PIVOT)).into_handle();
                let me = MessageEntry::new(child);
                let w = me.wrapper_or_create(creator);
                self.storage.set(field_number, Entry::Message(me));
                Ok(w)
            }
            Some(Entry::Message(me)) => Ok(me.wrapper_or_create(creator)),
            Some(Entry::Raw(raw)) => {
                if self.checks.ty && raw.immutable_snapshot {
                    return Err(AccessError::invalid_state(
                        "field already materialized via the immutable message accessor",
                    ));
                }
                let ranges: Vec<RawRange> = raw.ranges.iter().copied().collect();
                let child = self.child_from_ranges(&ranges, pivot.unwrap_or(DEFAULT_PIVOT))?;
                let me = MessageEntry::new(child);
                let w = me.wrapper_or_create(creator);
                self.storage.set(field_number, Entry::Message(me));
                Ok(w)
            }
            Some(Entry::Decoded(s)) => {
                Err(AccessError::wire_type_mismatch(WireType::Len, s.wire_type()))
            }
            Some(Entry::Repeated(r)) => Err(AccessError::wire_type_mismatch(WireType::Len, r.wire_type)),
        }
    }

    /// `getMessageAccessorOrNull`: exposes the child accessor directly.
    /// When the field is present but not yet attached, a fresh transient
    /// accessor is built and returned uncached.
    pub fn get_message_accessor_or_null(
        &mut self,
        field_number: u32,
        pivot: Option<u32>,
    ) -> Result<Option<AccessorHandle>, AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        match self.storage.get(field_number) {
            None | Some(Entry::EmptyCleared) => Ok(None),
            Some(Entry::Message(me)) => Ok(Some(Rc::clone(&me.child))),
            Some(Entry::Raw(raw)) => {
                let ranges: Vec<RawRange> = raw.ranges.iter().copied().collect();
                let child = self.child_from_ranges(&ranges, pivot.unwrap_or(DEFAULT_PIVOT))?;
                Ok(Some(child))
            }
            Some(Entry::Decoded(s)) => {
                Err(AccessError::wire_type_mismatch(WireType::Len, s.wire_type()))
            }
            Some(Entry::Repeated(r)) => Err(AccessError::wire_type_mismatch(WireType::Len, r.wire_type)),
        }
    }

    /// `setMessage`: installs `wrapper`'s accessor as the field's
    /// authoritative representation. The accessor is shared, not copied.
    pub fn set_message<W: Clone + 'static>(
        &mut self,
        field_number: u32,
        wrapper: &W,
        accessor: AccessorHandle,
    ) -> Result<(), AccessError> {
        self.check_bounds(field_number)?;
        self.ensure_indexed()?;
        let me = MessageEntry::new(accessor);
        me.set_wrapper(wrapper.clone());
        self.storage.set(field_number, Entry::Message(me));
        Ok(())
    }

    // ---- Shallow copy -----------------------------------------------

    pub fn shallow_copy(&self) -> Self {
        Self {
            source: self.source.clone(),
            storage: self.storage.clone(),
            indexed: self.indexed,
            checks: self.checks,
        }
    }

    // ---- Serializer -----------------------------------------------------

    /// Produces a canonical byte sequence for every live field, in
    /// ascending field-number order.
    pub fn serialize(&mut self) -> Result<Bytes, AccessError> {
        self.ensure_indexed()?;
        let mut out = bytes::BytesMut::new();
        for (field_number, entry) in self.storage.iter_ascending() {
            self.serialize_entry(field_number, entry, &mut out)?;
        }
        Ok(out.freeze())
    }

    fn serialize_entry(
        &self,
        field_number: u32,
        entry: &Entry,
        out: &mut bytes::BytesMut,
    ) -> Result<(), AccessError> {
        match entry {
            Entry::EmptyCleared => {}
            Entry::Raw(raw) => {
                for range in &raw.ranges {
                    wire::encode_tag(field_number, range.wire_type, out);
                    out.put_slice(&self.range_bytes(*range)?);
                }
            }
            Entry::Decoded(scalar) => {
                wire::encode_tag(field_number, scalar.wire_type(), out);
                scalar.encode_payload(out);
            }
            Entry::Repeated(repeated) => {
                if repeated.values.is_empty() {
                    return Ok(());
                }
                if repeated.was_packed && repeated.wire_type != WireType::Len {
                    wire::encode_tag(field_number, WireType::Len, out);
                    let payload_len: usize =
                        repeated.values.iter().map(Scalar::encoded_payload_len).sum();
                    (payload_len as u64).encode_leb128(out);
                    for value in &repeated.values {
                        value.encode_payload(out);
                    }
                } else {
                    for value in &repeated.values {
                        wire::encode_tag(field_number, value.wire_type(), out);
                        value.encode_payload(out);
                    }
                }
            }
            Entry::Message(me) => {
                let payload = me.child.borrow_mut().serialize()?;
                wire::encode_tag(field_number, WireType::Len, out);
                (payload.len() as u64).encode_leb128(out);
                out.put_slice(&payload);
            }
        }
        Ok(())
    }
}

fn decode_packed_into(kind: ScalarKind, record: &[u8], out: &mut Vec<Scalar>) -> Result<(), AccessError> {
    let mut cursor = record;
    let len = wire::decode_len(&mut cursor)?;
    if cursor.remaining() < len {
        return Err(AccessError::parse("packed payload truncated"));
    }
    let mut data = &cursor[..len];
    while !data.is_empty() {
        out.push(scalar::decode_scalar_from(kind, &mut data)?);
    }
    Ok(())
}

/// A string field's value: either freshly decoded owned bytes or the
/// caller-supplied default, avoiding an allocation on the default path.
pub enum StringValue<'a> {
    Owned(Bytes),
    Borrowed(&'a str),
}

impl<'a> StringValue<'a> {
    pub fn as_str(&self) -> &str {
        match self {
            // Safety/validity: `Owned` bytes are only ever produced by
            // `decode_scalar`'s `String` arm, which UTF-8-validates before
            // constructing the `Scalar::String`.
            StringValue::Owned(b) => core::str::from_utf8(b).unwrap_or(""),
            StringValue::Borrowed(s) => s,
        }
    }
}

impl core::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Accessor")
            .field("pivot", &self.storage.pivot())
            .field("indexed", &self.indexed)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

macro_rules! scalar_accessor {
    ($get_default:ident, $get:ident, $set:ident, $kind:expr, $ty:ty, $variant:ident) => {
        impl Accessor {
            #[doc = concat!("Typed accessor for the `", stringify!($variant), "` scalar kind.")]
            pub fn $get_default(&mut self, field_number: u32, default: $ty) -> Result<$ty, AccessError> {
                match self.get_scalar(field_number, $kind)? {
                    Some(Scalar::$variant(v)) => Ok(v),
                    Some(_) | None => Ok(default),
                }
            }

            pub fn $get(&mut self, field_number: u32) -> Result<$ty, AccessError> {
                self.$get_default(field_number, <$ty>::default())
            }

            pub fn $set(&mut self, field_number: u32, value: $ty) -> Result<(), AccessError> {
                self.set_scalar(field_number, Scalar::$variant(value))
            }
        }
    };
}

scalar_accessor!(get_bool_with_default, get_bool, set_bool, ScalarKind::Bool, bool, Bool);
scalar_accessor!(get_int32_with_default, get_int32, set_int32, ScalarKind::Int32, i32, Int32);
scalar_accessor!(get_uint32_with_default, get_uint32, set_uint32, ScalarKind::Uint32, u32, Uint32);
scalar_accessor!(get_sint32_with_default, get_sint32, set_sint32, ScalarKind::Sint32, i32, Sint32);
scalar_accessor!(get_int64_with_default, get_int64, set_int64, ScalarKind::Int64, i64, Int64);
scalar_accessor!(get_uint64_with_default, get_uint64, set_uint64, ScalarKind::Uint64, u64, Uint64);
scalar_accessor!(get_sint64_with_default, get_sint64, set_sint64, ScalarKind::Sint64, i64, Sint64);
scalar_accessor!(get_fixed32_with_default, get_fixed32, set_fixed32, ScalarKind::Fixed32, u32, Fixed32);
scalar_accessor!(
    get_sfixed32_with_default,
    get_sfixed32,
    set_sfixed32,
    ScalarKind::Sfixed32,
    i32,
    Sfixed32
);
scalar_accessor!(get_fixed64_with_default, get_fixed64, set_fixed64, ScalarKind::Fixed64, u64, Fixed64);
scalar_accessor!(
    get_sfixed64_with_default,
    get_sfixed64,
    set_sfixed64,
    ScalarKind::Sfixed64,
    i64,
    Sfixed64
);
scalar_accessor!(get_double_with_default, get_double, set_double, ScalarKind::Double, f64, Double);

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Bytes {
        let bytes: Vec<u8> = (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect();
        Bytes::from(bytes)
    }

    #[test]
    fn s1_bool_read() {
        let mut a = Accessor::from_buffer(hex("0801"));
        assert!(a.get_bool_with_default(1, false).unwrap());
        assert_eq!(a.serialize().unwrap(), hex("0801"));
    }

    #[test]
    fn s2_bool_last_wins_without_write() {
        let mut a = Accessor::from_buffer(hex("08010800"));
        assert!(!a.get_bool_with_default(1, true).unwrap());
    }

    #[test]
    fn s3_set_overwrites() {
        let mut a = Accessor::from_buffer(hex("08010800"));
        a.set_bool(1, true).unwrap();
        assert_eq!(a.serialize().unwrap(), hex("0801"));
    }

    #[test]
    fn s6_float_canonicalizes_through_f32() {
        let mut a = Accessor::new_empty();
        a.set_float(1, 1.6).unwrap();
        assert_eq!(a.get_float_with_default(1, 0.0).unwrap(), 1.6f32);
    }

    #[test]
    fn s7_fixed32() {
        let mut a = Accessor::from_buffer(hex("0D01000000"));
        assert_eq!(a.get_fixed32_with_default(1, 0).unwrap(), 1);
    }

    #[test]
    fn s8_string() {
        let mut a = Accessor::from_buffer(hex("0A0161"));
        let v = a.get_string(1).unwrap();
        assert_eq!(v.as_str(), "a");
    }

    #[test]
    fn s9_shallow_copy_clear_is_isolated() {
        let mut a = Accessor::new_empty();
        a.set_bool(1, true).unwrap();
        let mut copy = a.shallow_copy();
        copy.clear_field(1).unwrap();
        assert!(a.has_field_number(1).unwrap());
        assert!(!copy.has_field_number(1).unwrap());
    }

    #[test]
    fn invariant_has_false_on_empty_and_cleared() {
        let mut a = Accessor::new_empty();
        assert!(!a.has_field_number(1).unwrap());
        a.set_bool(1, true).unwrap();
        a.clear_field(1).unwrap();
        assert!(!a.has_field_number(1).unwrap());
    }

    #[test]
    fn invariant_bounds_rejected() {
        let mut a = Accessor::new_empty();
        assert!(a.get_bool_with_default(0, false).is_err());
        assert!(a.set_bool(wire::MAX_FIELD_NUMBER + 1, true).is_err());
    }

    #[test]
    fn repeated_mixes_packed_and_unpacked() {
        // field 1 unpacked int32 values 1, 2, then packed [3, 4].
        let mut a = Accessor::from_buffer(hex("080108020A020304"));
        let values = a.get_repeated_iterable(1, ScalarKind::Int32).unwrap();
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn get_message_is_a_snapshot_that_does_not_touch_raw_storage() {
        let mut a = Accessor::from_buffer(hex("0A0208010A021001"));
        let snapshot: AccessorHandle = a.get_message(1, |h| h).unwrap();
        assert!(snapshot.borrow_mut().get_bool_with_default(1, false).unwrap());
        // The field wasn't attached, so re-serializing still reproduces the
        // original, unmerged ranges exactly.
        assert_eq!(a.serialize().unwrap(), hex("0A0208010A021001"));
    }

    #[test]
    fn get_message_then_attach_is_rejected() {
        let mut a = Accessor::from_buffer(hex("0A0208010A021001"));
        let _snapshot: AccessorHandle = a.get_message(1, |h| h).unwrap();
        assert!(
            a.get_message_or_null(1, |h| h).unwrap_err().kind()
                == crate::error::ErrorKind::InvalidState
        );
    }
}
