//! Declarative method descriptions.
//!
//! Most methods of a class are trivial: they read an instance variable, write one, call
//! another method, or pass a value to a function. Rather than writing a closure for each of
//! them, class definitions can describe them with a [`MethodImpl`] and let [`set_methods`]
//! build the closure.

use crate::{
    ll::{
        error::Inconsistency,
        labels::{Label, Slot, Tag},
        methods::{Function, Method},
        table::ClassTable,
        value::Value,
    },
    Error, Object,
};

/// A value computed from the receiver of a method.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A constant.
    Const(Value),
    /// An instance variable of the receiver.
    Var(Slot),
    /// An entry of the environment tuple stored in an instance variable of the receiver.
    Env { env: Slot, index: usize },
    /// The result of calling a method of the receiver without arguments.
    Method(Label),
}

impl Operand {
    /// Evaluates the operand against a receiver.
    pub fn evaluate(&self, receiver: &Object) -> Result<Value, Error> {
        match self {
            Self::Const(value) => Ok(value.clone()),
            Self::Var(slot) => receiver.get(*slot),
            Self::Env { env, index } => match receiver.get(*env)? {
                Value::Tuple(entries) => entries.get(*index).cloned().ok_or_else(|| {
                    Inconsistency::EnvIndexOutOfRange { slot: *env, index: *index }.into()
                }),
                _ => Err(Inconsistency::NotAnEnvironment { slot: *env }.into()),
            },
            Self::Method(label) => receiver.call(*label, &[]),
        }
    }
}

/// A description of a method's body.
#[derive(Debug, Clone)]
pub enum MethodImpl {
    /// An arbitrary closure.
    Closure(Method),
    /// Returns the operand.
    Get(Operand),
    /// Stores the first argument into an instance variable and returns nil.
    SetVar(Slot),
    /// Calls a function with one operand.
    Apply(Function, Operand),
    /// Calls a function with two operands.
    Apply2(Function, Operand, Operand),
    /// Calls a method of the receiver, passing the operand as its argument.
    MethodApply(Label, Operand),
    /// Sends a message without arguments to the object the operand evaluates to. Every such
    /// method gets its own dispatch cache cell.
    Send(Tag, Operand),
}

impl MethodImpl {
    fn build(self, table: &mut ClassTable) -> Method {
        match self {
            Self::Closure(method) => method,
            Self::Get(operand) => Method::new(move |receiver, _| operand.evaluate(receiver)),
            Self::SetVar(slot) => Method::new(move |receiver, arguments| {
                receiver.set(slot, arguments.nth(0)?.clone())?;
                Ok(Value::Nil)
            }),
            Self::Apply(function, x) => {
                Method::new(move |receiver, _| function.call(&[x.evaluate(receiver)?]))
            }
            Self::Apply2(function, x, y) => Method::new(move |receiver, _| {
                function.call(&[x.evaluate(receiver)?, y.evaluate(receiver)?])
            }),
            Self::MethodApply(label, x) => Method::new(move |receiver, _| {
                let argument = x.evaluate(receiver)?;
                receiver.call(label, &[argument])
            }),
            Self::Send(tag, target) => {
                let site = table.new_cache();
                Method::new(move |receiver, _| {
                    let target = target.evaluate(receiver)?;
                    target.ensure_object()?.send(&site, tag, &[])
                })
            }
        }
    }
}

/// Builds and defines several methods at once.
pub fn set_methods(
    table: &mut ClassTable,
    methods: impl IntoIterator<Item = (Label, MethodImpl)>,
) -> Result<(), Error> {
    for (label, description) in methods {
        let method = description.build(table);
        table.set_method(label, method)?;
    }
    Ok(())
}
