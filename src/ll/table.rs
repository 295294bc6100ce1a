//! Class tables: slot allocation, method registration and inheritance composition.

use std::{
    cell::{Cell, RefCell},
    fmt, mem,
    rc::Rc,
};

use hashbrown::HashMap;
use tracing::{debug, trace};

use super::{
    dispatch::CallSite,
    error::{Error, Inconsistency},
    labels::{Label, Slot, Tag},
    methods::{CacheCell, Method, MethodSlot, MethodVector, MethodsHandle},
    object::Object,
    stats,
};

/// A function run on every freshly constructed instance of a class.
#[derive(Clone)]
pub struct Initializer(Rc<dyn Fn(&Object) -> Result<(), Error>>);

impl Initializer {
    pub fn new(f: impl Fn(&Object) -> Result<(), Error> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn run(&self, object: &Object) -> Result<(), Error> {
        (self.0)(object)
    }
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<initializer {:p}>", Rc::as_ptr(&self.0))
    }
}

#[derive(Debug)]
struct ClassCore {
    methods: MethodsHandle,
    size: Cell<usize>,
    initializers: RefCell<Vec<Initializer>>,
}

/// The part of a class table that outlives its construction: the method vector, the size of
/// instances, and the initializers.
///
/// Constructors capture this handle while the class is still being built, so the size and
/// initializer list are visible to them once the class is finalized.
#[derive(Debug, Clone)]
pub struct Class(Rc<ClassCore>);

impl Class {
    /// Returns the method vector shared by all instances of this class.
    pub fn methods(&self) -> &MethodsHandle {
        &self.0.methods
    }

    /// Returns the number of instance variable slots in instances of this class.
    pub fn size(&self) -> usize {
        self.0.size.get()
    }

    /// Returns the initializers of this class, in execution order.
    pub fn initializers(&self) -> Vec<Initializer> {
        self.0.initializers.borrow().clone()
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

/// State saved by [`ClassTable::narrow`] and restored by [`ClassTable::widen`].
#[derive(Debug)]
struct Snapshot {
    methods_by_name: HashMap<Rc<str>, Label>,
    methods_by_label: HashMap<Label, bool>,
    hidden_methods: Vec<(Label, Method)>,
    vars: HashMap<Rc<str>, Slot>,
    virtual_labels: Vec<Label>,
    var_names: Vec<Rc<str>>,
}

/// A class under construction.
#[derive(Debug)]
pub struct ClassTable {
    class: Class,
    /// Mapping from method names to labels, restricted to the current inheritance scope.
    methods_by_name: HashMap<Rc<str>, Label>,
    /// Whether a label is currently visible. Methods defined for invisible labels are kept in
    /// `hidden_methods` instead of the method vector.
    methods_by_label: HashMap<Label, bool>,
    /// One snapshot per `narrow` that has not been `widen`ed yet.
    previous_states: Vec<Snapshot>,
    /// Defined but not yet exposed methods, oldest first.
    hidden_methods: Vec<(Label, Method)>,
    /// Mapping from instance variable names to slots.
    vars: HashMap<Rc<str>, Slot>,
}

impl ClassTable {
    /// Creates a table for a class with the given public methods.
    pub fn new(public_methods: &[&str]) -> Self {
        stats::count_class();

        let tags: Vec<_> = public_methods.iter().map(|name| Tag::of(name)).collect();
        let class = Class(Rc::new(ClassCore {
            methods: MethodsHandle::new(MethodVector::new(&tags)),
            size: Cell::new(0),
            initializers: RefCell::new(Vec::new()),
        }));
        let mut table = Self {
            class,
            methods_by_name: HashMap::new(),
            methods_by_label: HashMap::new(),
            previous_states: Vec::new(),
            hidden_methods: Vec::new(),
            vars: HashMap::new(),
        };
        for (i, &name) in public_methods.iter().enumerate() {
            let label = Label::from_usize(i * 2 + 2);
            table.methods_by_name.insert(Rc::from(name), label);
            table.methods_by_label.insert(label, true);
        }

        debug!(public_methods = public_methods.len(), "created class table");
        table
    }

    /// Returns the shared, finalizable part of this table.
    pub fn class(&self) -> Class {
        self.class.clone()
    }

    /// Returns the number of instance variable slots allocated so far.
    pub fn size(&self) -> usize {
        self.class.size()
    }

    /// Returns how many `narrow`s are currently awaiting their `widen`.
    pub fn nesting_depth(&self) -> usize {
        self.previous_states.len()
    }

    pub fn methods_by_name(&self) -> &HashMap<Rc<str>, Label> {
        &self.methods_by_name
    }

    pub fn methods_by_label(&self) -> &HashMap<Label, bool> {
        &self.methods_by_label
    }

    /// Returns the labels of hidden methods, oldest first.
    pub fn hidden_labels(&self) -> Vec<Label> {
        self.hidden_methods.iter().map(|&(label, _)| label).collect()
    }

    /// Allocates a new method slot at the end of the method vector.
    pub fn new_method(&mut self) -> Label {
        let mut methods = self.class.methods().borrow_mut();
        let index = methods.len();
        methods.grow(index + 1);
        Label::from_usize(index)
    }

    /// Returns the label of the method with the given name, allocating a visible label if the
    /// name was not seen before.
    pub fn get_method_label(&mut self, name: &str) -> Label {
        if let Some(&label) = self.methods_by_name.get(name) {
            return label;
        }
        let label = self.new_method();
        self.methods_by_name.insert(Rc::from(name), label);
        self.methods_by_label.insert(label, true);
        trace!(method = name, %label, "allocated method label");
        label
    }

    pub fn get_method_labels(&mut self, names: &[&str]) -> Vec<Label> {
        names.iter().map(|name| self.get_method_label(name)).collect()
    }

    /// Defines the method under the given label.
    ///
    /// Visible methods go straight into the method vector. Invisible ones are kept aside until
    /// a `widen` decides whether they get exposed.
    pub fn set_method(&mut self, label: Label, method: Method) -> Result<(), Error> {
        stats::count_method();
        match self.methods_by_label.get(&label).copied() {
            Some(true) => self.class.methods().borrow_mut().put(label, MethodSlot::Method(method)),
            Some(false) => self.hidden_methods.push((label, method)),
            None => return Err(Inconsistency::UnknownLabel { label }.into()),
        }
        Ok(())
    }

    /// Returns the method currently defined under the given label.
    pub fn get_method(&self, label: Label) -> Result<Method, Error> {
        if let Some((_, method)) = self.hidden_methods.iter().rev().find(|(l, _)| *l == label) {
            return Ok(method.clone());
        }
        self.class.methods().borrow().method(label)
    }

    /// Allocates a new instance variable slot.
    pub fn new_slot(&mut self) -> Slot {
        let index = self.class.0.size.get();
        self.class.0.size.set(index + 1);
        Slot::from_usize(index)
    }

    /// Returns the slot of the instance variable with the given name, allocating one if it does
    /// not exist yet. An empty name always allocates a fresh, unnamed slot.
    pub fn new_variable(&mut self, name: &str) -> Slot {
        if let Some(&slot) = self.vars.get(name) {
            return slot;
        }
        let slot = self.new_slot();
        if !name.is_empty() {
            self.vars.insert(Rc::from(name), slot);
        }
        slot
    }

    /// Resolves method labels and instance variable slots in one go.
    pub fn new_methods_variables(
        &mut self,
        methods: &[&str],
        vars: &[&str],
    ) -> (Vec<Label>, Vec<Slot>) {
        let labels = self.get_method_labels(methods);
        let slots = vars.iter().map(|name| self.new_variable(name)).collect();
        (labels, slots)
    }

    /// Returns the slot of an instance variable that must have been declared already.
    pub fn get_variable(&self, name: &str) -> Result<Slot, Error> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndeclaredVariable { name: Rc::from(name) })
    }

    pub fn get_variables(&self, names: &[&str]) -> Result<Vec<Slot>, Error> {
        names.iter().map(|name| self.get_variable(name)).collect()
    }

    /// Registers an initializer. Initializers run in the order they were added.
    pub fn add_initializer(&mut self, initializer: Initializer) {
        self.class.0.initializers.borrow_mut().push(initializer);
    }

    /// Allocates a dispatch cache cell for one call site.
    pub fn new_cache(&mut self) -> CallSite {
        let mut label = self.new_method();
        if self.class.methods().borrow().is_tag_position(label.to_usize()) {
            label = self.new_method();
        }
        let cell = CacheCell::default();
        self.class.methods().borrow_mut().put(label, MethodSlot::Cache(Rc::clone(&cell)));
        trace!(%label, "allocated dispatch cache cell");
        CallSite::in_table(label, cell)
    }

    /// Restricts the table to the given members, so that a parent class's construction code
    /// sees only the names it was written against.
    ///
    /// Concrete methods keep their current visibility, virtual ones become invisible. Every
    /// `narrow` must be followed by exactly one [`widen`][Self::widen].
    pub fn narrow(&mut self, vars: &[&str], virtual_methods: &[&str], concrete_methods: &[&str]) {
        let virtual_labels = self.get_method_labels(virtual_methods);
        let concrete_labels = self.get_method_labels(concrete_methods);
        let var_names: Vec<Rc<str>> = vars.iter().map(|&name| Rc::from(name)).collect();

        let narrowed_vars = self
            .vars
            .iter()
            .filter(|(name, _)| var_names.contains(*name))
            .map(|(name, &slot)| (Rc::clone(name), slot))
            .collect();

        let mut by_name = HashMap::new();
        let mut by_label = HashMap::new();
        for (&name, &label) in concrete_methods.iter().zip(&concrete_labels) {
            by_name.insert(Rc::from(name), label);
            let visible = self.methods_by_label.get(&label).copied().unwrap_or(true);
            by_label.insert(label, visible);
        }
        for (&name, &label) in virtual_methods.iter().zip(&virtual_labels) {
            by_name.insert(Rc::from(name), label);
            by_label.insert(label, false);
        }

        let narrowed_hidden = self
            .hidden_methods
            .iter()
            .filter(|(label, _)| !virtual_labels.contains(label))
            .cloned()
            .collect();

        let snapshot = Snapshot {
            methods_by_name: mem::replace(&mut self.methods_by_name, by_name),
            methods_by_label: mem::replace(&mut self.methods_by_label, by_label),
            hidden_methods: mem::replace(&mut self.hidden_methods, narrowed_hidden),
            vars: mem::replace(&mut self.vars, narrowed_vars),
            virtual_labels,
            var_names,
        };
        self.previous_states.push(snapshot);
        debug!(depth = self.previous_states.len(), "narrowed class table");
    }

    /// Undoes the most recent [`narrow`][Self::narrow].
    ///
    /// Instance variables named in the `narrow` are re-resolved to their current slots, since
    /// the parent may have allocated them afresh. Hidden methods defined in the meantime are
    /// kept, unless they implement one of the narrowed virtual methods.
    pub fn widen(&mut self) -> Result<(), Error> {
        let snapshot = self.previous_states.last().ok_or(Inconsistency::EmptySnapshotStack)?;
        let restored_vars = snapshot
            .var_names
            .iter()
            .map(|name| Ok((Rc::clone(name), self.get_variable(name)?)))
            .collect::<Result<Vec<_>, Error>>()?;

        let Some(snapshot) = self.previous_states.pop() else {
            return Err(Inconsistency::EmptySnapshotStack.into());
        };
        let mut vars = snapshot.vars;
        vars.extend(restored_vars);
        self.vars = vars;
        self.methods_by_name = snapshot.methods_by_name;
        self.methods_by_label = snapshot.methods_by_label;

        let current_hidden = mem::replace(&mut self.hidden_methods, snapshot.hidden_methods);
        for (label, method) in current_hidden {
            if snapshot.virtual_labels.contains(&label) {
                continue;
            }
            let already_saved = self
                .hidden_methods
                .iter()
                .any(|(l, m)| *l == label && Method::ptr_eq(m, &method));
            if !already_saved {
                self.hidden_methods.push((label, method));
            }
        }

        debug!(depth = self.previous_states.len(), "widened class table");
        Ok(())
    }

    /// Finalizes the class: reserves the whole public region of the method vector.
    pub fn init_class(&mut self) {
        let size = self.size();
        stats::count_instance_variables(size);
        let mut methods = self.class.methods().borrow_mut();
        let region_end = methods.public_region_end();
        methods.grow(region_end);
        debug!(size, methods = methods.len(), "finalized class");
    }
}
