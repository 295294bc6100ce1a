//! Error reporting.

use std::{borrow::Cow, fmt, rc::Rc};

use super::labels::{Label, Slot, Tag};

/// A violation of the runtime's internal invariants.
///
/// These indicate a corrupted class table or a class definition that does not uphold the
/// runtime's contract, such as a `widen` without a matching `narrow`. They are never recovered
/// from by the runtime itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// `widen` was called without a matching `narrow`.
    EmptySnapshotStack,
    /// A dispatch scan ran past the public region without finding the tag.
    MethodNotFound { tag: Tag },
    /// A label was resolved, but no method was ever stored under it.
    UndefinedMethod { label: Label },
    /// A label that is not part of the table's current scope was used.
    UnknownLabel { label: Label },
    /// An instance variable slot lies outside of the object's storage.
    SlotOutOfRange { slot: Slot, size: usize },
    /// An instance variable used as an environment does not hold a tuple.
    NotAnEnvironment { slot: Slot },
    /// An environment tuple is too short for the requested index.
    EnvIndexOutOfRange { slot: Slot, index: usize },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySnapshotStack => f.write_str("widen called without a matching narrow"),
            Self::MethodNotFound { tag } => {
                write!(f, "object does not implement a public method with tag {tag}")
            }
            Self::UndefinedMethod { label } => write!(f, "method {label} was never defined"),
            Self::UnknownLabel { label } => {
                write!(f, "label {label} is not in the current scope of the class table")
            }
            Self::SlotOutOfRange { slot, size } => {
                write!(f, "slot {slot} is out of range for an object of size {size}")
            }
            Self::NotAnEnvironment { slot } => {
                write!(f, "instance variable {slot} does not hold an environment")
            }
            Self::EnvIndexOutOfRange { slot, index } => {
                write!(f, "environment in {slot} has no entry at index {index}")
            }
        }
    }
}

/// An error.
#[derive(Debug)]
pub enum Error {
    /// An instance variable was looked up before being declared in the class table.
    UndeclaredVariable { name: Rc<str> },
    /// The runtime's internal invariants were violated.
    Inconsistency(Inconsistency),
    /// An initializer failed while constructing an object.
    Initializer {
        /// The position of the failing initializer in execution order.
        index: usize,
        error: Box<Error>,
    },
    /// A type mismatch occured.
    TypeMismatch {
        /// The name of the expected type.
        expected: Cow<'static, str>,
        /// The name of the actual type obtained.
        got: Cow<'static, str>,
    },
    /// Incorrect amount of arguments passed to a method or a function.
    ArgumentCount {
        /// The number of arguments that was expected.
        expected: usize,
        /// The actual number of arguments obtained.
        got: usize,
    },
    /// A class was used before its recursive definition was completed.
    UndefinedRecursiveClass { location: Rc<str> },
    /// A user-defined error.
    User(Box<dyn std::error::Error>),
}

impl From<Inconsistency> for Error {
    fn from(inconsistency: Inconsistency) -> Self {
        Self::Inconsistency(inconsistency)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndeclaredVariable { name } => {
                write!(f, "instance variable '{name}' is not declared")
            }
            Self::Inconsistency(inconsistency) => {
                write!(f, "internal inconsistency: {inconsistency}")
            }
            Self::Initializer { index, error } => {
                write!(f, "initializer {index} failed: {error}")
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch, expected {expected} but got {got}")
            }
            Self::ArgumentCount { expected, got } => {
                write!(f, "{expected} arguments expected but got {got}")
            }
            Self::UndefinedRecursiveClass { location } => {
                write!(f, "class defined at {location} was used before its definition completed")
            }
            Self::User(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Initializer { error, .. } => Some(error.as_ref()),
            Self::User(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

/// Extensions for converting foreign [`Result`]s into ones carrying an [`Error`].
pub trait ResultExt<T, E> {
    /// Maps the error in the result to an [`Error::User`].
    fn user(self) -> Result<T, Error>;
}

/// Transparent wrapper that implements [`std::error::Error`] for a user-defined error.
#[repr(transparent)]
struct UserError<T>(T);

impl<T> fmt::Debug for UserError<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<T> fmt::Display for UserError<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<T> std::error::Error for UserError<T> where T: fmt::Debug + fmt::Display {}

impl<T, E> ResultExt<T, E> for Result<T, E>
where
    E: fmt::Debug + fmt::Display + 'static,
{
    fn user(self) -> Result<T, Error> {
        self.map_err(|error| Error::User(Box::new(UserError(error))))
    }
}
