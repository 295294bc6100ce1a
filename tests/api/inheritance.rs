//! Composition of parent classes into subclasses.

use std::{cell::RefCell, rc::Rc};

use tessera::{
    create_object_opt, inherits, make_class, run_initializers_opt, set_methods, CallSite,
    ClassDescriptor, ClassInit, ClassTable, Constructor, EnvInit, Error, Initializer, Method,
    MethodImpl, Operand, Value,
};

use super::RevealResultExt;

type Log = Rc<RefCell<Vec<&'static str>>>;

fn logging(log: &Log, entry: &'static str) -> Initializer {
    let log = Rc::clone(log);
    Initializer::new(move |_| {
        log.borrow_mut().push(entry);
        Ok(())
    })
}

fn base(log: &Log) -> ClassDescriptor {
    let log = Rc::clone(log);
    make_class(
        &["name"],
        ClassInit::new(move |table| {
            let name = table.get_method_label("name");
            set_methods(table, [(name, MethodImpl::Get(Operand::Const(Value::from("base"))))])?;
            table.add_initializer(logging(&log, "base 1"));
            table.add_initializer(logging(&log, "base 2"));
            let class = table.class();
            Ok(EnvInit::ignoring_env(Constructor::new(move |existing, _| {
                let object = create_object_opt(existing, &class);
                run_initializers_opt(existing, object, &class)
            })))
        }),
    )
    .reveal()
}

fn derived(log: &Log, parent: ClassDescriptor) -> ClassDescriptor {
    let log = Rc::clone(log);
    make_class(
        &["name"],
        ClassInit::new(move |table| {
            let inheritance = inherits(table, &[], &[], &["name"], &parent, true)?;
            let Some(parent_init) = inheritance.constructor().cloned() else {
                unreachable!("top-level inheritance yields a constructor");
            };
            table.add_initializer(logging(&log, "derived"));
            let class = table.class();
            Ok(EnvInit::ignoring_env(Constructor::new(move |existing, arguments| {
                let object = create_object_opt(existing, &class);
                arguments.expect_exactly(0)?;
                parent_init.call(Some(&object), &[])?;
                run_initializers_opt(existing, object, &class)
            })))
        }),
    )
    .reveal()
}

#[test]
fn initializers_run_once_in_registration_order() {
    let log = Log::default();
    let derived = derived(&log, base(&log));
    let object = derived.construct(&[]).reveal();
    assert_eq!(*log.borrow(), ["base 1", "base 2", "derived"]);
    let name = object.send_named(&CallSite::detached(), "name", &[]).reveal();
    assert_eq!(name, Value::from("base"));

    derived.constructor.call(Some(&object), &[]).reveal();
    assert_eq!(log.borrow().len(), 3);
}

#[test]
fn parents_keep_their_own_initializers() {
    let log = Log::default();
    let base = base(&log);
    derived(&log, base.clone());
    log.borrow_mut().clear();

    base.construct(&[]).reveal();
    assert_eq!(*log.borrow(), ["base 1", "base 2"]);
}

#[test]
fn narrow_then_widen_restores_the_table() {
    let mut table = ClassTable::new(&["print", "color"]);
    table.new_variable("c");
    table.get_method_label("draw");
    let names = table.methods_by_name().clone();
    let labels = table.methods_by_label().clone();
    let hidden_labels = table.hidden_labels();

    table.narrow(&["x"], &["color"], &["print"]);
    let x = table.new_variable("x");
    let print = table.get_method_label("print");
    let color = table.get_method_label("color");
    table.set_method(print, Method::new(|_, _| Ok(Value::from("print")))).reveal();
    table.set_method(color, Method::new(|_, _| Ok(Value::from("color")))).reveal();
    assert_eq!(table.hidden_labels(), [color]);
    table.widen().reveal();

    assert_eq!(table.methods_by_name(), &names);
    assert_eq!(table.methods_by_label(), &labels);
    assert_eq!(table.hidden_labels(), hidden_labels);
    assert_eq!(table.get_variable("x").reveal(), x);
    assert!(table.get_variable("c").is_ok());
}

#[test]
fn a_failing_parent_leaves_the_table_balanced() {
    let failing = make_class(
        &[],
        ClassInit::new(|table| {
            table.get_variable("nowhere")?;
            unreachable!("the variable is never declared");
        }),
    );
    assert!(failing.is_err());

    let parent = tessera::dummy_class("parent.rs:1");
    let mut table = ClassTable::new(&["a"]);
    match inherits(&mut table, &[], &[], &["a"], &parent, true) {
        Err(Error::UndefinedRecursiveClass { .. }) => (),
        other => panic!("expected the parent to fail, got {other:?}"),
    }
    assert_eq!(table.nesting_depth(), 0);
}
