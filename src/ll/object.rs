//! Object instances and their construction.

use std::{cell::RefCell, fmt, rc::Rc};

use super::{
    dispatch::{get_public_method, CallSite},
    error::{Error, Inconsistency},
    labels::{Label, ObjectId, Slot, Tag},
    methods::MethodsHandle,
    table::Class,
    value::Value,
};

struct ObjectData {
    id: ObjectId,
    methods: MethodsHandle,
    vars: RefCell<Vec<Value>>,
}

/// An instance of a class.
///
/// This is a cheap, reference-counted handle. Two handles are equal if they refer to the same
/// instance.
#[derive(Clone)]
pub struct Object(Rc<ObjectData>);

impl Object {
    /// Allocates a new instance of the class, with every instance variable set to nil.
    ///
    /// No initializers are run.
    pub fn new(class: &Class) -> Self {
        Self(Rc::new(ObjectData {
            id: ObjectId::fresh(),
            methods: class.methods().clone(),
            vars: RefCell::new(vec![Value::Nil; class.size()]),
        }))
    }

    /// Returns the unique identity of this object.
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Returns the method vector this object dispatches through.
    pub fn methods(&self) -> &MethodsHandle {
        &self.0.methods
    }

    /// Returns whether the object is an instance of exactly this class.
    pub fn is_instance_of(&self, class: &Class) -> bool {
        MethodsHandle::ptr_eq(&self.0.methods, class.methods())
    }

    /// Returns the number of instance variable slots.
    pub fn size(&self) -> usize {
        self.0.vars.borrow().len()
    }

    /// Returns the value of an instance variable.
    pub fn get(&self, slot: Slot) -> Result<Value, Error> {
        let vars = self.0.vars.borrow();
        vars.get(slot.to_usize())
            .cloned()
            .ok_or(Inconsistency::SlotOutOfRange { slot, size: vars.len() }.into())
    }

    /// Sets the value of an instance variable.
    pub fn set(&self, slot: Slot, value: impl Into<Value>) -> Result<(), Error> {
        let mut vars = self.0.vars.borrow_mut();
        let size = vars.len();
        let var = vars
            .get_mut(slot.to_usize())
            .ok_or(Inconsistency::SlotOutOfRange { slot, size })?;
        *var = value.into();
        Ok(())
    }

    /// Calls the method stored under the given label, bypassing public dispatch. This is how a
    /// method calls other methods of its own class, private ones included.
    pub fn call(&self, label: Label, arguments: &[Value]) -> Result<Value, Error> {
        let method = self.0.methods.borrow().method(label)?;
        method.call(self, arguments)
    }

    /// Sends a message to the object, resolving the public method through the call site.
    pub fn send(&self, site: &CallSite, tag: Tag, arguments: &[Value]) -> Result<Value, Error> {
        let method = get_public_method(self, tag, site)?;
        method.call(self, arguments)
    }

    /// Same as [`send`][Self::send], but computes the tag from a method name.
    pub fn send_named(
        &self,
        site: &CallSite,
        name: &str,
        arguments: &[Value],
    ) -> Result<Value, Error> {
        self.send(site, Tag::of(name), arguments)
    }

    /// Creates a shallow copy of the object with a fresh identity.
    pub fn duplicate(&self) -> Self {
        Self(Rc::new(ObjectData {
            id: ObjectId::fresh(),
            methods: self.0.methods.clone(),
            vars: RefCell::new(self.0.vars.borrow().clone()),
        }))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Object {}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("id", &self.0.id.to_u64()).finish_non_exhaustive()
    }
}

/// Allocates a new instance of the class.
pub fn create_object(class: &Class) -> Object {
    Object::new(class)
}

/// Returns `existing` if there is one, otherwise allocates a new instance of the class.
///
/// Constructors take an optional existing object so that a subclass constructor can allocate
/// the instance once and then thread it through its ancestors' constructors.
pub fn create_object_opt(existing: Option<&Object>, class: &Class) -> Object {
    match existing {
        Some(object) => object.clone(),
        None => Object::new(class),
    }
}

/// Runs the class's initializers on the object, in the order they were added.
///
/// The first failing initializer stops the chain; initializers that already ran are not undone.
pub fn run_initializers(object: &Object, class: &Class) -> Result<(), Error> {
    for (index, initializer) in class.initializers().iter().enumerate() {
        initializer
            .run(object)
            .map_err(|error| Error::Initializer { index, error: Box::new(error) })?;
    }
    Ok(())
}

/// Runs the class's initializers unless the object already existed before the constructor was
/// called, in which case the outermost constructor takes care of them.
pub fn run_initializers_opt(
    existing: Option<&Object>,
    object: Object,
    class: &Class,
) -> Result<Object, Error> {
    if existing.is_none() {
        run_initializers(&object, class)?;
    }
    Ok(object)
}

/// Allocates and initializes a new instance, unless `existing` is given.
pub fn create_object_and_run_initializers(
    existing: Option<&Object>,
    class: &Class,
) -> Result<Object, Error> {
    match existing {
        Some(object) => Ok(object.clone()),
        None => {
            let object = Object::new(class);
            run_initializers(&object, class)?;
            Ok(object)
        }
    }
}
