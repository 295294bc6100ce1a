//! Properties that must hold for arbitrary sequences of class table operations.

use std::collections::HashMap;

use proptest::prelude::*;
use tessera::{ClassTable, Label, Method, Value};

#[derive(Debug, Clone)]
enum Step {
    Label(String),
    Slot,
    Method,
    Variable(String),
    Cache,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[a-e]{1,2}".prop_map(Step::Label),
        Just(Step::Slot),
        Just(Step::Method),
        "[v-z]{0,2}".prop_map(Step::Variable),
        Just(Step::Cache),
    ]
}

proptest! {
    #[test]
    fn method_labels_are_stable(
        public in prop::collection::hash_set("[a-c]", 0..3),
        steps in prop::collection::vec(step(), 0..64),
    ) {
        let public: Vec<_> = public.iter().map(String::as_str).collect();
        let mut table = ClassTable::new(&public);
        let mut seen: HashMap<String, Label> = HashMap::new();
        for step in steps {
            match step {
                Step::Label(name) => {
                    let label = table.get_method_label(&name);
                    let first = *seen.entry(name).or_insert(label);
                    prop_assert_eq!(label, first);
                }
                Step::Slot => { table.new_slot(); }
                Step::Method => { table.new_method(); }
                Step::Variable(name) => { table.new_variable(&name); }
                Step::Cache => { table.new_cache(); }
            }
        }
    }
}

proptest! {
    #[test]
    fn slots_and_labels_only_grow(
        public in prop::collection::hash_set("[a-c]", 0..3),
        steps in prop::collection::vec(step(), 0..64),
    ) {
        let public: Vec<_> = public.iter().map(String::as_str).collect();
        let mut table = ClassTable::new(&public);
        let mut last_slot = None;
        let mut last_label = None;
        for step in steps {
            match step {
                Step::Slot => {
                    let slot = table.new_slot();
                    prop_assert!(last_slot.map_or(true, |last| slot > last));
                    last_slot = Some(slot);
                }
                Step::Method => {
                    let label = table.new_method();
                    prop_assert!(last_label.map_or(true, |last| label > last));
                    last_label = Some(label);
                }
                Step::Cache => {
                    let site = table.new_cache();
                    if let Some(label) = site.label() {
                        prop_assert!(last_label.map_or(true, |last| label > last));
                        last_label = Some(label);
                    }
                }
                Step::Label(name) => {
                    let known = table.methods_by_name().contains_key(name.as_str());
                    let label = table.get_method_label(&name);
                    if !known {
                        prop_assert!(last_label.map_or(true, |last| label > last));
                        last_label = Some(label);
                    }
                }
                Step::Variable(name) => {
                    let known = table.get_variable(&name).is_ok();
                    let slot = table.new_variable(&name);
                    if !known {
                        prop_assert!(last_slot.map_or(true, |last| slot > last));
                        last_slot = Some(slot);
                    }
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn widen_undoes_narrow(
        vars in prop::collection::vec("[v-z]", 0..4),
        concrete in prop::collection::hash_set("[a-c]", 0..3),
        virtuals in prop::collection::hash_set("[d-f]", 0..3),
        redeclared in prop::collection::vec("[v-z]", 0..4),
        seed_hidden in any::<bool>(),
    ) {
        let narrowed: Vec<_> = redeclared.iter().map(String::as_str).collect();
        let concrete: Vec<_> = concrete.iter().map(String::as_str).collect();
        let virtuals: Vec<_> = virtuals.iter().map(String::as_str).collect();

        let mut table = ClassTable::new(&["a", "b", "c"]);
        for name in &vars {
            table.new_variable(name);
        }
        table.get_method_label("private");
        if seed_hidden {
            // Hidden methods only exist below an enclosing narrow.
            let enclosing: Vec<_> = vars.iter().map(String::as_str).collect();
            table.narrow(&enclosing, &["h"], &["a", "b", "c", "private"]);
            let h = table.get_method_label("h");
            table.set_method(h, Method::new(|_, _| Ok(Value::from("h")))).unwrap();
        }
        // Narrowing allocates labels for unseen names in the enclosing scope.
        table.get_method_labels(&virtuals);
        let names = table.methods_by_name().clone();
        let labels = table.methods_by_label().clone();
        let hidden = table.hidden_labels();

        table.narrow(&narrowed, &virtuals, &concrete);
        let mut fresh = HashMap::new();
        for &name in &narrowed {
            fresh.insert(name, table.new_variable(name));
        }
        for &name in &virtuals {
            let label = table.get_method_label(name);
            table.set_method(label, Method::new(|_, _| Ok(Value::Nil))).unwrap();
        }
        table.widen().unwrap();

        prop_assert_eq!(table.methods_by_name(), &names);
        prop_assert_eq!(table.methods_by_label(), &labels);
        prop_assert_eq!(table.hidden_labels(), hidden);
        prop_assert_eq!(table.nesting_depth(), usize::from(seed_hidden));
        if seed_hidden {
            let h = table.get_method_label("h");
            prop_assert_eq!(table.hidden_labels(), vec![h]);
            prop_assert!(table.get_method(h).is_ok());
        }
        for (name, slot) in fresh {
            prop_assert_eq!(table.get_variable(name).unwrap(), slot);
        }
        for name in &vars {
            prop_assert!(table.get_variable(name).is_ok());
        }
    }
}
