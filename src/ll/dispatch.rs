//! Public method dispatch through per-call-site caches.

use std::rc::Rc;

#[cfg(feature = "trace-dispatch")]
use tracing::trace;

use super::{
    error::{Error, Inconsistency},
    labels::{Label, Tag},
    methods::{CacheCell, Method, MethodVector},
    object::Object,
};

/// A dynamic send site.
///
/// Each call site remembers the offset at which it last found the tag it dispatched on. The
/// remembered offset is only ever a hint: it is re-validated against the receiver's method
/// vector on every send, so a stale cell costs a scan but never resolves to a wrong method.
#[derive(Debug, Clone)]
pub struct CallSite {
    /// The label of the cache cell in the owning class's method vector, if any.
    label: Option<Label>,
    cell: CacheCell,
}

impl CallSite {
    pub(crate) fn in_table(label: Label, cell: CacheCell) -> Self {
        Self { label: Some(label), cell }
    }

    /// Creates a call site that does not belong to any class. Host code sending messages to
    /// objects uses these.
    pub fn detached() -> Self {
        Self { label: None, cell: CacheCell::default() }
    }

    /// Returns the label of this call site's cache cell.
    pub fn label(&self) -> Option<Label> {
        self.label
    }

    /// Returns the offset currently remembered by the cache cell.
    pub fn cached_offset(&self) -> usize {
        self.cell.get()
    }

    /// Returns whether both call sites share one cache cell.
    pub fn shares_cell_with(&self, other: &CallSite) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Default for CallSite {
    fn default() -> Self {
        Self::detached()
    }
}

/// Looks the tag up in the public region of the method vector, scanning tag positions from the
/// last public method backward.
fn scan(methods: &MethodVector, tag: Tag) -> Result<usize, Error> {
    let mut i = methods.public_count() * 2 + 1;
    while i >= 3 {
        if methods.has_tag_at(i, tag) {
            return Ok(i);
        }
        i -= 2;
    }
    Err(Inconsistency::MethodNotFound { tag }.into())
}

/// Resolves the public method with the given tag on an object, going through the call site's
/// cache.
pub fn get_public_method(object: &Object, tag: Tag, site: &CallSite) -> Result<Method, Error> {
    let methods = object.methods().borrow();
    let cached = site.cell.get();
    let offset = if methods.has_tag_at(cached, tag) {
        cached
    } else {
        let offset = scan(&methods, tag)?;
        #[cfg(feature = "trace-dispatch")]
        trace!(%tag, previous = cached, offset, "dispatch cache miss");
        site.cell.set(offset);
        offset
    };
    methods.method(Label::from_usize(offset - 1))
}
