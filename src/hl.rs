//! This module contains the class definition API: class descriptors, inheritance and
//! declarative method descriptions.

mod class;
mod method_impl;

pub use class::*;
pub use method_impl::*;
