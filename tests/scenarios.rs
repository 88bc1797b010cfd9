//! Integration tests for the literal scenarios and cross-module invariants
//! that don't fit neatly inside a single module's unit tests.

use bytes::Bytes;
use protolazy::{Accessor, AccessorHandle, Checks, ScalarKind};

fn hex(s: &str) -> Bytes {
    let bytes: Vec<u8> =
        (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect();
    Bytes::from(bytes)
}

/// S4: sub-message merge on read. Two length-delimited occurrences of field 1
/// pass through verbatim until a message read merges their payloads into one.
#[test]
fn s4_sub_message_merge_on_read() {
    let mut a = Accessor::from_buffer(hex("0A0208010A021001"));
    assert_eq!(a.serialize().unwrap(), hex("0A0208010A021001"));

    let _child: AccessorHandle = a.get_message_or_null(1, |h| h).unwrap().unwrap();
    assert_eq!(a.serialize().unwrap(), hex("0A0408011001"));
}

/// S5: nested set. A sub-message built from two message-valued fields is
/// attached to an outer accessor and re-serialized in full.
#[test]
fn s5_nested_set() {
    let msg1 = Accessor::from_buffer(hex("0801")).into_handle();
    let msg2 = Accessor::from_buffer(hex("0802")).into_handle();

    let mut sub_a = Accessor::new_empty();
    sub_a.set_message(1, &msg1, msg1.clone()).unwrap();
    sub_a.set_message(2, &msg2, msg2.clone()).unwrap();
    let sub_a_handle = sub_a.into_handle();

    let mut a = Accessor::new_empty();
    a.set_message(1, &sub_a_handle, sub_a_handle.clone()).unwrap();

    assert_eq!(a.serialize().unwrap(), hex("0A080A02080112020802"));
}

/// A three-way merge (more than the two occurrences S4 exercises) still
/// concatenates in file order.
#[test]
fn sub_message_merge_handles_more_than_two_ranges() {
    let mut a = Accessor::from_buffer(hex("0A01080A01100A0113"));
    let _child: AccessorHandle = a.get_message_or_null(1, |h| h).unwrap().unwrap();
    assert_eq!(a.serialize().unwrap(), hex("0A03081013"));
}

/// Repeated field mixing unpacked and packed occurrences on the wire decodes
/// to the concatenation of both forms, in file order.
#[test]
fn repeated_field_mixes_packed_and_unpacked_forms() {
    // field 1: unpacked int32 = 1, unpacked int32 = 2, then packed [3, 4].
    let mut a = Accessor::from_buffer(hex("080108020A020304"));
    let values = a.get_repeated_iterable(1, ScalarKind::Int32).unwrap();
    let as_ints: Vec<i32> = values
        .into_iter()
        .map(|s| match s {
            protolazy::Scalar::Int32(v) => v,
            other => panic!("unexpected scalar {other:?}"),
        })
        .collect();
    assert_eq!(as_ints, vec![1, 2, 3, 4]);
}

/// A field set via `set_packed_iterable` re-serializes in packed form even
/// though it was never present on the wire.
#[test]
fn set_packed_iterable_round_trips_packed() {
    use protolazy::Scalar;
    let mut a = Accessor::new_empty();
    a.set_packed_iterable(1, ScalarKind::Int32, vec![Scalar::Int32(1), Scalar::Int32(2)]).unwrap();
    assert_eq!(a.serialize().unwrap(), hex("0A020102"));
}

/// With `Checks::RELEASE`, an out-of-range field number is not rejected.
#[test]
fn release_checks_skip_bounds_validation() {
    let too_big = protolazy::wire::MAX_FIELD_NUMBER + 1;
    let mut a = Accessor::new_empty().with_checks(Checks::RELEASE);
    assert!(a.set_bool(too_big, true).is_ok());
}

/// With the default (debug) checks, the same call is rejected.
#[test]
fn debug_checks_enforce_bounds_validation() {
    let too_big = protolazy::wire::MAX_FIELD_NUMBER + 1;
    let mut a = Accessor::new_empty();
    assert!(a.set_bool(too_big, true).is_err());
}

/// Shallow copy shares sub-message children by reference: mutating through
/// one handle is visible through the other, since both wrap the same `Rc`.
#[test]
fn shallow_copy_shares_sub_message_children() {
    let mut a = Accessor::new_empty();
    let child = Accessor::new_empty().into_handle();
    a.set_message(1, &child, child.clone()).unwrap();

    let copy = a.shallow_copy();
    child.borrow_mut().set_bool(1, true).unwrap();

    let mut copy = copy;
    let reread: AccessorHandle = copy.get_message_or_null(1, |h| h).unwrap().unwrap();
    assert!(reread.borrow_mut().has_field_number(1).unwrap());
}

/// `len`/`is_empty` count only present fields, not cleared tombstones.
#[test]
fn len_counts_present_fields_only() {
    let mut a = Accessor::new_empty();
    assert!(a.is_empty().unwrap());
    a.set_bool(1, true).unwrap();
    a.set_int32(2, 5).unwrap();
    assert_eq!(a.len().unwrap(), 2);
    a.clear_field(1).unwrap();
    assert_eq!(a.len().unwrap(), 1);
}

/// `From<&[u8]>`/`From<Vec<u8>>` construct an accessor equivalent to
/// `from_buffer`.
#[test]
fn from_impls_match_from_buffer() {
    let by_slice: Accessor = (&b"\x08\x01"[..]).into();
    let by_vec: Accessor = alloc_owned_vec().into();
    let mut by_slice = by_slice;
    let mut by_vec = by_vec;
    assert!(by_slice.get_bool_with_default(1, false).unwrap());
    assert!(by_vec.get_bool_with_default(1, false).unwrap());
}

fn alloc_owned_vec() -> Vec<u8> {
    vec![0x08, 0x01]
}
