//! Building classes and instantiating them.

use tessera::{
    create_object_opt, inherits, make_class, run_initializers_opt, set_methods, CallSite,
    ClassDescriptor, ClassInit, ClassTable, Constructor, EnvInit, Error, MethodImpl, Operand,
    Value,
};

use super::RevealResultExt;

/// `Point`: one public method `get_x` returning the instance variable `x`.
pub fn point() -> ClassDescriptor {
    make_class(
        &["get_x"],
        ClassInit::new(|table| {
            let (labels, slots) = table.new_methods_variables(&["get_x"], &["x"]);
            let x = slots[0];
            set_methods(table, [(labels[0], MethodImpl::Get(Operand::Var(x)))])?;
            let class = table.class();
            Ok(EnvInit::ignoring_env(Constructor::new(move |existing, arguments| {
                let object = create_object_opt(existing, &class);
                object.set(x, arguments.nth(0)?.clone())?;
                run_initializers_opt(existing, object, &class)
            })))
        }),
    )
    .reveal()
}

/// `ColoredPoint`: inherits `x` and `get_x` from `parent`, and adds `color`.
pub fn colored_point(parent: ClassDescriptor) -> ClassDescriptor {
    make_class(
        &["get_x", "color"],
        ClassInit::new(move |table| {
            let (labels, slots) = table.new_methods_variables(&["color"], &["c"]);
            let c = slots[0];
            set_methods(table, [(labels[0], MethodImpl::Get(Operand::Var(c)))])?;

            let inheritance = inherits(table, &["x"], &[], &["get_x"], &parent, true)?;
            let Some(parent_init) = inheritance.constructor().cloned() else {
                unreachable!("top-level inheritance yields a constructor");
            };

            let class = table.class();
            Ok(EnvInit::ignoring_env(Constructor::new(move |existing, arguments| {
                let object = create_object_opt(existing, &class);
                object.set(c, arguments.nth(1)?.clone())?;
                parent_init.call(Some(&object), &[arguments.nth(0)?.clone()])?;
                run_initializers_opt(existing, object, &class)
            })))
        }),
    )
    .reveal()
}

#[test]
fn point_returns_its_coordinate() {
    let point = point();
    let p = point.construct(&[Value::from(5)]).reveal();
    let x = p.send_named(&CallSite::detached(), "get_x", &[]).reveal();
    assert_eq!(x, Value::from(5));
}

#[test]
fn colored_point_inherits_get_x() {
    let colored = colored_point(point());
    let p = colored.construct(&[Value::from(3), Value::from("red")]).reveal();
    let site = CallSite::detached();
    assert_eq!(p.send_named(&site, "color", &[]).reveal(), Value::from("red"));
    assert_eq!(p.send_named(&site, "get_x", &[]).reveal(), Value::from(3));
    assert_eq!(p.size(), 2);
}

#[test]
fn instances_do_not_share_state() {
    let point = point();
    let a = point.construct(&[Value::from(1)]).reveal();
    let b = point.construct(&[Value::from(2)]).reveal();
    let site = CallSite::detached();
    assert_eq!(a.send_named(&site, "get_x", &[]).reveal(), Value::from(1));
    assert_eq!(b.send_named(&site, "get_x", &[]).reveal(), Value::from(2));
    assert_ne!(a.id(), b.id());
}

#[test]
fn undeclared_variables_cannot_be_looked_up() {
    let mut table = ClassTable::new(&["get_x"]);
    match table.get_variable("missing") {
        Err(Error::UndeclaredVariable { name }) => assert_eq!(&*name, "missing"),
        other => panic!("expected a lookup error, got {other:?}"),
    }
    let slot = table.new_variable("missing");
    assert_eq!(table.get_variable("missing").reveal(), slot);
}

#[test]
fn missing_constructor_arguments_are_reported() {
    let point = point();
    match point.construct(&[]) {
        Err(error @ Error::ArgumentCount { .. }) => {
            assert_eq!(error.to_string(), "1 arguments expected but got 0")
        }
        other => panic!("expected an argument count error, got {other:?}"),
    }
}
