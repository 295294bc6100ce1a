//! Method labels, instance variable slots, and public method tags.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// The index of a method in a class's method vector.
///
/// Labels are allocated monotonically per class table and are never reused while the table
/// is alive. Every class taking part in an inheritance chain shares the labels of the table it
/// was composed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Label(usize);

impl Label {
    pub(crate) fn from_usize(x: usize) -> Self {
        Self(x)
    }

    pub fn to_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The index of an instance variable in an object's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Slot(usize);

impl Slot {
    pub(crate) fn from_usize(x: usize) -> Self {
        Self(x)
    }

    pub fn to_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// The dispatch tag of a public method, computed from its name.
///
/// Two unrelated classes declaring a public method with the same name agree on its tag, which
/// is what lets a call site dispatch on objects of any class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Tag(i32);

impl Tag {
    /// Computes the tag of a public method name.
    ///
    /// The result is a 31-bit signed integer: the hash is folded into the range
    /// `-2^30 .. 2^30`.
    pub fn of(name: &str) -> Self {
        let mut accu: i32 = 0;
        for &byte in name.as_bytes() {
            accu = accu.wrapping_mul(223).wrapping_add(i32::from(byte));
        }
        accu &= 0x7fff_ffff;
        if accu > 0x3fff_ffff {
            accu |= i32::MIN;
        }
        Self(accu)
    }

    pub fn to_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The unique identity of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Returns a fresh identity, distinct from every identity handed out before.
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn to_u64(self) -> u64 {
        self.0
    }
}

/// Rounds `n` up to the next power of two. Values of 2 and below are returned unchanged.
pub fn fit_size(n: usize) -> usize {
    if n <= 2 {
        n
    } else {
        fit_size((n + 1) / 2) * 2
    }
}
