//! Dynamically typed values.

use std::{borrow::Cow, fmt, rc::Rc};

use super::{error::Error, object::Object};

/// The kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Boolean,
    Number,
    String,
    Tuple,
    Object,
}

impl ValueKind {
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Nil => "Nil",
            Self::Boolean => "Boolean",
            Self::Number => "Number",
            Self::String => "String",
            Self::Tuple => "Tuple",
            Self::Object => "Object",
        }
    }
}

/// A value stored in an instance variable, passed to a method, or returned from one.
#[derive(Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    /// A fixed-size block of values. Classes defined inside functions keep their captured
    /// environment in one of these.
    Tuple(Rc<[Value]>),
    Object(Object),
}

impl Value {
    /// Returns the kind of value stored.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Nil => ValueKind::Nil,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::Object(_) => ValueKind::Object,
        }
    }

    fn type_error(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected: Cow::from(expected),
            got: Cow::from(self.kind().type_name()),
        }
    }

    /// Ensures the value is a `Boolean`, returning a type mismatch error if that's not the case.
    pub fn ensure_boolean(&self) -> Result<bool, Error> {
        if let Self::Boolean(b) = self {
            Ok(*b)
        } else {
            Err(self.type_error("Boolean"))
        }
    }

    /// Ensures the value is a `Number`, returning a type mismatch error if that's not the case.
    pub fn ensure_number(&self) -> Result<f64, Error> {
        if let Self::Number(n) = self {
            Ok(*n)
        } else {
            Err(self.type_error("Number"))
        }
    }

    /// Ensures the value is a `String`, returning a type mismatch error if that's not the case.
    pub fn ensure_string(&self) -> Result<&Rc<str>, Error> {
        if let Self::String(s) = self {
            Ok(s)
        } else {
            Err(self.type_error("String"))
        }
    }

    /// Ensures the value is a `Tuple`, returning a type mismatch error if that's not the case.
    pub fn ensure_tuple(&self) -> Result<&Rc<[Value]>, Error> {
        if let Self::Tuple(t) = self {
            Ok(t)
        } else {
            Err(self.type_error("Tuple"))
        }
    }

    /// Ensures the value is an `Object`, returning a type mismatch error if that's not the case.
    pub fn ensure_object(&self) -> Result<&Object, Error> {
        if let Self::Object(o) = self {
            Ok(o)
        } else {
            Err(self.type_error("Object"))
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Tuple(t) => {
                f.write_str("(")?;
                for (i, value) in t.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value:?}")?;
                }
                f.write_str(")")
            }
            Self::Object(o) => write!(f, "<object {}>", o.id().to_u64()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Tuple(Rc::from(values))
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

/// Arguments passed to a method or a function.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    inner: &'a [Value],
}

impl<'a> Arguments<'a> {
    pub fn new(inner: &'a [Value]) -> Self {
        Self { inner }
    }

    /// Returns the number of arguments passed.
    pub fn count(&self) -> usize {
        self.inner.len()
    }

    /// Raises an error if there weren't exactly `n` arguments passed.
    pub fn expect_exactly(&self, n: usize) -> Result<(), Error> {
        if self.count() != n {
            Err(Error::ArgumentCount { expected: n, got: self.count() })
        } else {
            Ok(())
        }
    }

    /// Returns the `n`th argument, or an argument count error if it wasn't passed.
    pub fn nth(&self, n: usize) -> Result<&'a Value, Error> {
        self.inner.get(n).ok_or(Error::ArgumentCount { expected: n + 1, got: self.count() })
    }

    /// Returns an iterator over the arguments.
    pub fn iter(&self) -> impl Iterator<Item = &'a Value> {
        self.inner.iter()
    }
}
