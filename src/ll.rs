//! The **l**ow-**l**evel (`ll`) object runtime: class tables, method vectors, dispatch and
//! object construction.
//!
//! Class definitions usually want the [high-level API][crate] instead, which wraps these into
//! class descriptors and declarative method descriptions.

pub mod dispatch;
pub mod error;
pub mod labels;
pub mod methods;
pub mod object;
pub mod stats;
pub mod table;
pub mod value;
