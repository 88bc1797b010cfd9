//! The tagged union of field states an [`crate::accessor::Accessor`]'s
//! storage map holds, plus the sub-message plumbing that lets a generated
//! wrapper type and its backing accessor behave as one logical object.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;

use smallvec::SmallVec;

use crate::accessor::Accessor;
use crate::scalar::Scalar;
use crate::wire::WireType;

/// Shared handle to a child accessor. This crate is single-threaded by
/// design: `Rc`, not `Arc`; `RefCell`, not a mutex.
pub type AccessorHandle = Rc<RefCell<Accessor>>;

/// A byte range within an accessor's source buffer, recorded by the indexer
/// without interpreting the bytes it spans.
///
/// Offsets are `u32` rather than `usize`: a buffer larger than 4 GiB is
/// treated as a parse error when indexed (see [`crate::accessor::Accessor`]),
/// matching how real wire buffers are sized in practice.
///
/// The wire type travels with each range rather than the entry as a whole:
/// a repeated field can mix packed (`Len`) and unpacked (scalar wire type)
/// occurrences on the wire (see [protobuf.dev's encoding guide on packed
/// repeated fields](https://protobuf.dev/programming-guides/encoding/#packed)),
/// so a single entry-level wire type can't describe every range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRange {
    pub offset: u32,
    pub len: u32,
    pub wire_type: WireType,
}

impl RawRange {
    pub fn as_usize_range(&self) -> core::ops::Range<usize> {
        self.offset as usize..(self.offset as usize + self.len as usize)
    }
}

/// One or more encoded, not-yet-decoded occurrences of a field. Most
/// fields occur once, so the ranges live inline via `SmallVec` rather than
/// heap-allocating a `Vec` for the common case.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub ranges: SmallVec<[RawRange; 1]>,
    /// Set once `getMessage` has taken an immutable snapshot of this field.
    /// The ranges themselves are left untouched — a snapshot must not
    /// change what a later `serialize()` emits for a field nobody attached
    /// — this only blocks a later attach on the same field.
    pub immutable_snapshot: bool,
}

impl RawEntry {
    pub fn single(range: RawRange) -> Self {
        let mut ranges = SmallVec::new();
        ranges.push(range);
        Self { ranges, immutable_snapshot: false }
    }

    pub fn push(&mut self, range: RawRange) {
        self.ranges.push(range);
    }

    /// The wire type of the most recently encountered range — what a
    /// singular-scalar read decodes and checks against. Protobuf says that
    /// when a non-repeated field appears more than once, the last one on
    /// the wire wins.
    pub fn last_wire_type(&self) -> Option<WireType> {
        self.ranges.last().map(|r| r.wire_type)
    }
}

/// An ordered sequence of decoded values for a repeated scalar field.
/// Packed and unpacked wire forms decode into the same representation;
/// `was_packed` only records the input form so the serializer can
/// preserve it when the field was never mutated.
#[derive(Debug, Clone)]
pub struct RepeatedEntry {
    pub wire_type: WireType,
    pub values: Vec<Scalar>,
    pub was_packed: bool,
}

/// A sub-message field: the child accessor plus the cached wrapper the
/// caller's creator closure produced for it.
///
/// The wrapper is type-erased because a single non-generic `Entry` must be
/// able to hold sub-messages of any generated type; each field is expected
/// to always be accessed with the same concrete `W`, so the `downcast_ref`
/// in [`MessageEntry::wrapper_or_create`] never actually fails in correct
/// usage.
pub struct MessageEntry {
    pub child: AccessorHandle,
    wrapper: RefCell<Option<Box<dyn Any>>>,
}

impl MessageEntry {
    pub fn new(child: AccessorHandle) -> Self {
        Self { child, wrapper: RefCell::new(None) }
    }

    /// Returns the cached wrapper if one of type `W` already exists,
    /// otherwise builds one via `creator` and caches it. Guarantees
    /// reference equality across repeated calls for a given field, so a
    /// caller that reaches the same sub-message twice always gets the same
    /// wrapper instance back.
    pub fn wrapper_or_create<W: Clone + 'static>(
        &self,
        creator: impl FnOnce(AccessorHandle) -> W,
    ) -> W {
        if let Some(existing) = self.wrapper.borrow().as_ref() {
            if let Some(w) = existing.downcast_ref::<W>() {
                return w.clone();
            }
        }
        let w = creator(self.child.clone());
        *self.wrapper.borrow_mut() = Some(Box::new(w.clone()));
        w
    }

    pub fn set_wrapper<W: Clone + 'static>(&self, wrapper: W) {
        *self.wrapper.borrow_mut() = Some(Box::new(wrapper));
    }
}

impl Clone for MessageEntry {
    /// Shares the child accessor by reference — a shallow copy's sub-
    /// message children are shared, never deep-copied — but each copy
    /// starts with its own wrapper cache, since a wrapper obtained through
    /// the original accessor isn't necessarily the type callers will use
    /// through the copy.
    fn clone(&self) -> Self {
        Self { child: Rc::clone(&self.child), wrapper: RefCell::new(None) }
    }
}

impl core::fmt::Debug for MessageEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageEntry").finish_non_exhaustive()
    }
}

/// The tagged union a storage map entry can be in.
#[derive(Debug, Clone)]
pub enum Entry {
    Raw(RawEntry),
    Decoded(Scalar),
    Message(MessageEntry),
    Repeated(RepeatedEntry),
    /// Tombstone for an explicitly cleared field.
    EmptyCleared,
}

impl Entry {
    /// True unless the entry is cleared, an empty repeated list, or a raw
    /// entry with no ranges (which the indexer never actually produces,
    /// but is handled for completeness).
    pub fn is_present(&self) -> bool {
        match self {
            Entry::EmptyCleared => false,
            Entry::Raw(r) => !r.ranges.is_empty(),
            Entry::Repeated(r) => !r.values.is_empty(),
            Entry::Decoded(_) | Entry::Message(_) => true,
        }
    }

    pub fn wire_type(&self) -> Option<WireType> {
        match self {
            Entry::Raw(r) => r.last_wire_type(),
            Entry::Decoded(s) => Some(s.wire_type()),
            Entry::Message(_) => Some(WireType::Len),
            Entry::Repeated(r) => Some(r.wire_type),
            Entry::EmptyCleared => None,
        }
    }
}
