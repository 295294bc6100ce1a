//! The method vector shared by a class and all of its instances.

use std::{
    cell::{Cell, Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

use super::{
    error::{Error, Inconsistency},
    labels::{fit_size, Label, Tag},
    object::Object,
    value::{Arguments, Value},
};

/// A method body. The receiver is passed explicitly as the first argument.
#[derive(Clone)]
pub struct Method(Rc<dyn Fn(&Object, Arguments<'_>) -> Result<Value, Error>>);

impl Method {
    pub fn new(f: impl Fn(&Object, Arguments<'_>) -> Result<Value, Error> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Calls the method with the given receiver and arguments.
    pub fn call(&self, receiver: &Object, arguments: &[Value]) -> Result<Value, Error> {
        (self.0)(receiver, Arguments::new(arguments))
    }

    /// Returns whether both methods are the same closure.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<method {:p}>", Rc::as_ptr(&self.0))
    }
}

/// A plain function, not bound to any receiver.
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(Arguments<'_>) -> Result<Value, Error>>);

impl Function {
    pub fn new(f: impl Fn(Arguments<'_>) -> Result<Value, Error> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, arguments: &[Value]) -> Result<Value, Error> {
        (self.0)(Arguments::new(arguments))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {:p}>", Rc::as_ptr(&self.0))
    }
}

/// A dispatch cache cell. Holds the offset of the tag that was last resolved through it.
pub type CacheCell = Rc<Cell<usize>>;

/// A single entry in a method vector.
#[derive(Debug, Clone, Default)]
pub enum MethodSlot {
    /// A slot that was allocated but not filled in yet, or one of the header slots.
    #[default]
    Empty,
    Method(Method),
    /// The tag of the public method stored right before this slot.
    Tag(Tag),
    Cache(CacheCell),
}

/// The method vector of a class.
///
/// The first two slots are reserved for the header. The implementation of the `i`th public
/// method lives at index `2i + 2`, and its tag at `2i + 3`. The region up to
/// `2 * capacity + 2` is reserved for public methods; private methods and cache cells are
/// appended after it.
///
/// The vector only ever grows: existing slots never move, because every instance of the class
/// refers to them by offset.
#[derive(Debug)]
pub struct MethodVector {
    public_count: usize,
    capacity: usize,
    slots: Vec<MethodSlot>,
}

impl MethodVector {
    /// Creates a method vector for the given public method tags.
    pub fn new(tags: &[Tag]) -> Self {
        let public_count = tags.len();
        let mut slots = vec![MethodSlot::Empty; public_count * 2 + 2];
        for (i, &tag) in tags.iter().enumerate() {
            slots[i * 2 + 3] = MethodSlot::Tag(tag);
        }
        Self { public_count, capacity: fit_size(public_count), slots }
    }

    /// Returns the number of public methods.
    pub fn public_count(&self) -> usize {
        self.public_count
    }

    /// Returns the end of the public region.
    pub fn public_region_end(&self) -> usize {
        self.capacity * 2 + 2
    }

    /// Returns whether the index lies on a tag position in the public region.
    pub fn is_tag_position(&self, index: usize) -> bool {
        index % 2 == 1 && index < self.public_region_end()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Grows the vector to at least `new_len` slots. Never shrinks it.
    pub fn grow(&mut self, new_len: usize) {
        if new_len > self.slots.len() {
            self.slots.resize(new_len, MethodSlot::Empty);
        }
    }

    /// Stores a slot at the given label, growing the vector if needed.
    pub fn put(&mut self, label: Label, slot: MethodSlot) {
        let index = label.to_usize();
        self.grow(index + 1);
        self.slots[index] = slot;
    }

    /// Returns the slot at the given index.
    pub fn get(&self, index: usize) -> Option<&MethodSlot> {
        self.slots.get(index)
    }

    /// Returns the method stored under the given label.
    pub fn method(&self, label: Label) -> Result<Method, Error> {
        match self.slots.get(label.to_usize()) {
            Some(MethodSlot::Method(method)) => Ok(method.clone()),
            _ => Err(Inconsistency::UndefinedMethod { label }.into()),
        }
    }

    /// Returns whether the slot at `index` holds the given tag.
    pub fn has_tag_at(&self, index: usize, tag: Tag) -> bool {
        matches!(self.slots.get(index), Some(MethodSlot::Tag(t)) if *t == tag)
    }
}

/// A shared handle to a method vector.
#[derive(Debug, Clone)]
pub struct MethodsHandle(Rc<RefCell<MethodVector>>);

impl MethodsHandle {
    pub fn new(vector: MethodVector) -> Self {
        Self(Rc::new(RefCell::new(vector)))
    }

    pub fn borrow(&self) -> Ref<'_, MethodVector> {
        self.0.borrow()
    }

    /// Mutably borrows the vector. Only class construction does this, and construction is
    /// never reentered from a method body.
    pub(crate) fn borrow_mut(&self) -> RefMut<'_, MethodVector> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}
