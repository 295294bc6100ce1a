//! Tessera is a table-driven object runtime.
//!
//! It backs a class-based object model with class tables, inherited and overridden methods,
//! instance variables, and per-call-site method caches. Class definitions are supplied as
//! closures; the runtime turns them into [`ClassDescriptor`]s whose constructors produce
//! [`Object`]s.
//!
//! ```
//! use tessera::{
//!     make_class, set_methods, CallSite, ClassInit, Constructor, EnvInit, MethodImpl, Operand,
//!     Value,
//! };
//!
//! let point = make_class(
//!     &["get_x"],
//!     ClassInit::new(|table| {
//!         let (labels, slots) = table.new_methods_variables(&["get_x"], &["x"]);
//!         let x = slots[0];
//!         set_methods(table, [(labels[0], MethodImpl::Get(Operand::Var(x)))])?;
//!         let class = table.class();
//!         Ok(EnvInit::ignoring_env(Constructor::new(move |existing, arguments| {
//!             let object = tessera::create_object_opt(existing, &class);
//!             object.set(x, arguments.nth(0)?.clone())?;
//!             tessera::run_initializers_opt(existing, object, &class)
//!         })))
//!     }),
//! )?;
//!
//! let p = point.construct(&[Value::from(5)])?;
//! assert_eq!(p.send_named(&CallSite::detached(), "get_x", &[])?, Value::from(5));
//! # Ok::<(), tessera::Error>(())
//! ```

mod hl;
pub mod ll;

pub use hl::*;
pub use ll::{
    dispatch::{get_public_method, CallSite},
    error::{Error, Inconsistency, ResultExt},
    labels::{Label, ObjectId, Slot, Tag},
    methods::{Function, Method},
    object::{
        create_object, create_object_and_run_initializers, create_object_opt, run_initializers,
        run_initializers_opt, Object,
    },
    stats::{stats, Stats},
    table::{Class, ClassTable, Initializer},
    value::{Arguments, Value, ValueKind},
};
