//! Errors raised by the accessor, and the check-level configuration that
//! decides which of them are actually enforced.

use core::fmt;

use crate::wire::WireType;

/// Discriminant for [`AccessError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Field number outside `1..=MAX_FIELD_NUMBER`.
    OutOfRange,
    /// The wire type recorded for a field is incompatible with the
    /// requested operation.
    WireTypeMismatch,
    /// A value given to a setter falls outside the type's acceptable range
    /// (e.g. a `double` that doesn't fit in `f32` for `set_float`).
    ValueTypeInvalid,
    /// Malformed or truncated wire bytes were encountered while indexing or
    /// lazily decoding.
    Parse,
    /// A mutable sub-message view was requested after an immutable one had
    /// already been materialized for the same field.
    InvalidState,
}

/// An error produced by an [`crate::accessor::Accessor`] operation.
///
/// Carries enough context to format a precise message (`"Expected wire
/// type: X but found: Y"`, and friends) without requiring the caller to
/// reconstruct it from the `ErrorKind` alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessError {
    kind: ErrorKind,
    detail: Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Detail {
    None,
    FieldNumber(u32),
    WireTypes { expected: WireType, found: WireType },
    Message(&'static str),
}

impl AccessError {
    /// Field number outside the legal range.
    pub const fn out_of_range(field_number: u32) -> Self {
        Self { kind: ErrorKind::OutOfRange, detail: Detail::FieldNumber(field_number) }
    }

    pub const fn wire_type_mismatch(expected: WireType, found: WireType) -> Self {
        Self { kind: ErrorKind::WireTypeMismatch, detail: Detail::WireTypes { expected, found } }
    }

    pub const fn value_type_invalid(detail: &'static str) -> Self {
        Self { kind: ErrorKind::ValueTypeInvalid, detail: Detail::Message(detail) }
    }

    pub const fn parse(detail: &'static str) -> Self {
        Self { kind: ErrorKind::Parse, detail: Detail::Message(detail) }
    }

    pub const fn invalid_state(detail: &'static str) -> Self {
        Self { kind: ErrorKind::InvalidState, detail: Detail::Message(detail) }
    }

    /// The kind of error that occurred.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[allow(dead_code)]
    const fn bare(kind: ErrorKind) -> Self {
        Self { kind, detail: Detail::None }
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.detail) {
            (ErrorKind::OutOfRange, Detail::FieldNumber(n)) => {
                write!(f, "field number {n} is out of range")
            }
            (ErrorKind::WireTypeMismatch, Detail::WireTypes { expected, found }) => {
                write!(f, "Expected wire type: {expected:?} but found: {found:?}")
            }
            (ErrorKind::ValueTypeInvalid, Detail::Message(m)) => write!(f, "{m}"),
            (ErrorKind::Parse, Detail::Message(m)) => write!(f, "parse error: {m}"),
            (ErrorKind::InvalidState, Detail::Message(m)) => write!(f, "invalid state: {m}"),
            _ => write!(f, "{:?}", self.kind),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AccessError {}

/// Which classes of checks are enforced.
///
/// Disabled checks are not merely skipped at the call site — the operations
/// compile to the unchecked path, so a [`Checks::RELEASE`] accessor pays no
/// cost for validation it doesn't want.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checks {
    /// `CHECK_BOUNDS`: field-number range checks.
    pub bounds: bool,
    /// `CHECK_TYPE`: non-critical type/state checks, including the
    /// mutable-after-immutable sub-message guard and set-side bounds.
    pub ty: bool,
    /// `CHECK_CRITICAL_TYPE`: value-type checks on setters, wire-type checks
    /// on getters.
    pub critical_type: bool,
    /// `CHECK_CRITICAL_STATE`: parse/state checks that would otherwise
    /// silently produce corrupted output.
    pub critical_state: bool,
}

impl Checks {
    /// All checks enabled. The default for freshly constructed accessors.
    pub const DEBUG: Self =
        Self { bounds: true, ty: true, critical_type: true, critical_state: true };

    /// All checks disabled except `critical_state`, which guards against
    /// silently corrupting output and is never worth skipping.
    pub const RELEASE: Self =
        Self { bounds: false, ty: false, critical_type: false, critical_state: true };
}

impl Default for Checks {
    fn default() -> Self {
        Self::DEBUG
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn wire_type_mismatch_message() {
        let err = AccessError::wire_type_mismatch(WireType::Varint, WireType::Len);
        assert_eq!(format!("{err}"), "Expected wire type: Varint but found: Len");
    }
}
