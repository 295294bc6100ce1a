//! Process-wide counters describing how much the object runtime has been used.

use std::sync::atomic::{AtomicUsize, Ordering};

static CLASSES: AtomicUsize = AtomicUsize::new(0);
static METHODS: AtomicUsize = AtomicUsize::new(0);
static INSTANCE_VARIABLES: AtomicUsize = AtomicUsize::new(0);

/// A snapshot of the runtime's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Number of class tables created.
    pub classes: usize,
    /// Number of methods stored into class tables.
    pub methods: usize,
    /// Number of instance variable slots in finalized classes.
    pub instance_variables: usize,
}

/// Returns the current values of the runtime's counters.
pub fn stats() -> Stats {
    Stats {
        classes: CLASSES.load(Ordering::Relaxed),
        methods: METHODS.load(Ordering::Relaxed),
        instance_variables: INSTANCE_VARIABLES.load(Ordering::Relaxed),
    }
}

pub(crate) fn count_class() {
    CLASSES.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn count_method() {
    METHODS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn count_instance_variables(n: usize) {
    INSTANCE_VARIABLES.fetch_add(n, Ordering::Relaxed);
}
