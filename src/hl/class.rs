//! Class descriptors and inheritance.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    ll::{
        labels::Slot,
        methods::Method,
        table::ClassTable,
        value::{Arguments, Value},
    },
    Error, Object,
};

/// Builds an object, or finishes building one that a subclass constructor already allocated.
///
/// The first argument is the pre-existing instance, if any. Constructors pass it on to their
/// ancestors' constructors so that a single object flows through the whole init chain.
#[derive(Clone)]
pub struct Constructor(Rc<dyn Fn(Option<&Object>, Arguments<'_>) -> Result<Object, Error>>);

impl Constructor {
    pub fn new(
        f: impl Fn(Option<&Object>, Arguments<'_>) -> Result<Object, Error> + 'static,
    ) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, existing: Option<&Object>, arguments: &[Value]) -> Result<Object, Error> {
        (self.0)(existing, Arguments::new(arguments))
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<constructor {:p}>", Rc::as_ptr(&self.0))
    }
}

/// Produces a class's constructor from the environment the class was defined in.
#[derive(Clone)]
pub struct EnvInit(Rc<dyn Fn(&Value) -> Constructor>);

impl EnvInit {
    pub fn new(f: impl Fn(&Value) -> Constructor + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Wraps a constructor of a class that does not capture any environment.
    pub fn ignoring_env(constructor: Constructor) -> Self {
        Self::new(move |_| constructor.clone())
    }

    pub fn instantiate(&self, env: &Value) -> Constructor {
        (self.0)(env)
    }
}

impl fmt::Debug for EnvInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<env init {:p}>", Rc::as_ptr(&self.0))
    }
}

/// Fills a class table with a class's members.
///
/// This runs once for the class itself, and once more for every subclass inheriting from it,
/// each time against the subclass's table.
#[derive(Clone)]
pub struct ClassInit(Rc<dyn Fn(&mut ClassTable) -> Result<EnvInit, Error>>);

impl ClassInit {
    pub fn new(f: impl Fn(&mut ClassTable) -> Result<EnvInit, Error> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn run(&self, table: &mut ClassTable) -> Result<EnvInit, Error> {
        (self.0)(table)
    }
}

impl fmt::Debug for ClassInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class init {:p}>", Rc::as_ptr(&self.0))
    }
}

/// A fully built class.
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    /// Creates instances of the class. This is the only entry point host code needs.
    pub constructor: Constructor,
    /// Used by subclasses to compose this class into their own tables.
    pub class_init: ClassInit,
    pub env_init: EnvInit,
    /// The environment the constructor was instantiated with.
    pub env: Value,
}

impl ClassDescriptor {
    /// Creates a new instance of the class.
    pub fn construct(&self, arguments: &[Value]) -> Result<Object, Error> {
        self.constructor.call(None, arguments)
    }
}

/// Builds a class with the given public methods.
pub fn make_class(
    public_methods: &[&str],
    class_init: ClassInit,
) -> Result<ClassDescriptor, Error> {
    let mut table = ClassTable::new(public_methods);
    let env_init = class_init.run(&mut table)?;
    table.init_class();
    let env = Value::Nil;
    let constructor = env_init.instantiate(&env);
    Ok(ClassDescriptor { constructor, class_init, env_init, env })
}

/// Late-bound storage for the initialization functions of a class, filled in by
/// [`make_class_store`].
#[derive(Debug, Default)]
pub struct ClassStore {
    class_init: RefCell<Option<ClassInit>>,
    env_init: RefCell<Option<EnvInit>>,
}

impl ClassStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_init(&self) -> Option<ClassInit> {
        self.class_init.borrow().clone()
    }

    pub fn env_init(&self) -> Option<EnvInit> {
        self.env_init.borrow().clone()
    }

    /// Returns whether the store was filled in.
    pub fn is_filled(&self) -> bool {
        self.env_init.borrow().is_some()
    }
}

/// Builds a class and stores its initialization functions, instead of returning a descriptor.
pub fn make_class_store(
    public_methods: &[&str],
    class_init: ClassInit,
    store: &ClassStore,
) -> Result<(), Error> {
    let mut table = ClassTable::new(public_methods);
    let env_init = class_init.run(&mut table)?;
    table.init_class();
    *store.class_init.borrow_mut() = Some(class_init);
    *store.env_init.borrow_mut() = Some(env_init);
    Ok(())
}

/// Returns a placeholder for a class whose recursive definition is not complete yet. Every one
/// of its functions fails with [`Error::UndefinedRecursiveClass`].
pub fn dummy_class(location: &str) -> ClassDescriptor {
    let location: Rc<str> = Rc::from(location);
    let constructor = {
        let location = Rc::clone(&location);
        Constructor::new(move |_, _| {
            Err(Error::UndefinedRecursiveClass { location: Rc::clone(&location) })
        })
    };
    let class_init = {
        let location = Rc::clone(&location);
        ClassInit::new(move |_| {
            Err(Error::UndefinedRecursiveClass { location: Rc::clone(&location) })
        })
    };
    let env_init = EnvInit::ignoring_env(constructor.clone());
    ClassDescriptor { constructor, class_init, env_init, env: Value::Nil }
}

/// What a subclass gets to call to run its parent's part of construction.
#[derive(Debug, Clone)]
pub enum ParentInit {
    /// The parent's constructor, already instantiated with the parent's environment.
    Object(Constructor),
    /// The parent's environment initializer, for classes nested inside functions that must
    /// supply the environment themselves.
    Env(EnvInit),
}

/// The result of composing a parent class into a subclass's table.
#[derive(Debug, Clone)]
pub struct Inheritance {
    pub init: ParentInit,
    /// Slots of the inherited instance variables, in the order they were requested.
    pub variables: Vec<Slot>,
    /// The parent's implementations of the inherited concrete methods, in the order they were
    /// requested. These are what `super` calls resolve to.
    pub methods: Vec<Method>,
}

impl Inheritance {
    /// Returns the parent's constructor, if the parent was inherited at the top level.
    pub fn constructor(&self) -> Option<&Constructor> {
        match &self.init {
            ParentInit::Object(constructor) => Some(constructor),
            ParentInit::Env(_) => None,
        }
    }
}

/// Composes `parent` into `table`.
///
/// The parent's class initializer runs against the table narrowed down to the given instance
/// variables, virtual methods and concrete methods; the table is widened back afterwards. With
/// `top`, the parent's constructor is instantiated with its own environment.
pub fn inherits(
    table: &mut ClassTable,
    vars: &[&str],
    virtual_methods: &[&str],
    concrete_methods: &[&str],
    parent: &ClassDescriptor,
    top: bool,
) -> Result<Inheritance, Error> {
    table.narrow(vars, virtual_methods, concrete_methods);
    let init = parent.class_init.run(table).map(|env_init| {
        if top {
            ParentInit::Object(env_init.instantiate(&parent.env))
        } else {
            ParentInit::Env(env_init)
        }
    });
    // Narrows and widens stay balanced even when the parent fails.
    let widened = table.widen();
    let init = init?;
    widened?;

    let variables = table.get_variables(vars)?;
    let methods = concrete_methods
        .iter()
        .map(|name| {
            let label = table.get_method_label(name);
            table.get_method(label)
        })
        .collect::<Result<_, _>>()?;
    Ok(Inheritance { init, variables, methods })
}
