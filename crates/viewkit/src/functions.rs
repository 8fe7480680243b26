//! Named functions callable from templates.
//!
//! A [`FunctionRegistry`] maps a name to a callable. Every bundle binds the
//! full registry when it is compiled, so templates can call the functions by
//! name and the builder can reject names that resolve to nothing.
//!
//! Registries compose by [`merge`](FunctionRegistry::merge): entries from the
//! incoming registry replace same-named entries, all other entries are kept.
//!
//! ```rust
//! use viewkit::FunctionRegistry;
//!
//! let mut functions = FunctionRegistry::with_defaults();
//! functions.insert("shout", |s: String| s.to_uppercase());
//!
//! assert!(functions.contains("shout"));
//! assert!(functions.contains("coalesce"));
//! ```

use std::collections::BTreeMap;

use minijinja::functions::Function;
use minijinja::value::{FunctionArgs, FunctionResult};
use minijinja::{Environment, Value};

/// Mapping from function name to a template-callable value.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Value>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in helpers:
    ///
    /// - `coalesce(a, b)`: `a` if it is truthy, otherwise `b`
    /// - `contains_errors(errors, field=none)`: whether a form error map has
    ///   an error for `field`, or any error at all when `field` is omitted
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert("coalesce", coalesce);
        registry.insert("contains_errors", contains_errors);
        registry
    }

    /// Registers `f` under `name`, replacing any previous entry.
    pub fn insert<F, Rv, Args>(&mut self, name: impl Into<String>, f: F)
    where
        F: Function<Rv, Args>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a, Output = Args>,
    {
        self.functions.insert(name.into(), Value::from_function(f));
    }

    /// Registers an already-built callable value.
    pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
        self.functions.insert(name.into(), value);
    }

    /// Copies every entry of `other` into this registry. Same-named entries
    /// are overwritten by `other`.
    pub fn merge(&mut self, other: &FunctionRegistry) {
        for (name, value) in &other.functions {
            self.functions.insert(name.clone(), value.clone());
        }
    }

    /// Returns true if a function is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Returns the callable registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.functions.get(name)
    }

    /// Registered names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Binds every function as a global of `env`.
    pub(crate) fn register(&self, env: &mut Environment<'static>) {
        for (name, value) in &self.functions {
            env.add_global(name.clone(), value.clone());
        }
    }
}

fn coalesce(value: Value, fallback: Value) -> Value {
    if value.is_true() {
        value
    } else {
        fallback
    }
}

fn contains_errors(errors: Value, field: Option<String>) -> bool {
    match field {
        Some(field) => errors
            .get_attr(&field)
            .map(|message| message.is_true())
            .unwrap_or(false),
        None => errors.len().is_some_and(|n| n > 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn render(registry: &FunctionRegistry, source: &str, ctx: serde_json::Value) -> String {
        let mut env = Environment::new();
        registry.register(&mut env);
        env.render_str(source, ctx).unwrap()
    }

    #[test]
    fn test_defaults_registered() {
        let registry = FunctionRegistry::with_defaults();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["coalesce", "contains_errors"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut registry = FunctionRegistry::new();
        registry.insert("greet", || "first");
        registry.insert("greet", || "second");

        assert_eq!(registry.len(), 1);
        assert_eq!(render(&registry, "{{ greet() }}", json!({})), "second");
    }

    #[test]
    fn test_merge_overwrites_and_preserves() {
        let mut base = FunctionRegistry::new();
        base.insert("kept", || "base");
        base.insert("shared", || "base");

        let mut supplied = FunctionRegistry::new();
        supplied.insert("shared", || "supplied");
        supplied.insert("added", || "supplied");

        base.merge(&supplied);

        assert_eq!(base.len(), 3);
        assert_eq!(
            render(&base, "{{ kept() }}/{{ shared() }}/{{ added() }}", json!({})),
            "base/supplied/supplied"
        );
    }

    #[test]
    fn test_coalesce() {
        let registry = FunctionRegistry::with_defaults();
        let ctx = json!({"empty": "", "name": "Ada"});
        assert_eq!(
            render(&registry, "{{ coalesce(empty, 'anon') }}", ctx.clone()),
            "anon"
        );
        assert_eq!(render(&registry, "{{ coalesce(name, 'anon') }}", ctx), "Ada");
    }

    #[test]
    fn test_contains_errors() {
        let registry = FunctionRegistry::with_defaults();
        let ctx = json!({"errors": {"email": "is required"}, "clean": {}});
        let check = |expr: &str| {
            render(
                &registry,
                &format!("{{% if {expr} %}}yes{{% else %}}no{{% endif %}}"),
                ctx.clone(),
            )
        };

        assert_eq!(check("contains_errors(errors, 'email')"), "yes");
        assert_eq!(check("contains_errors(errors, 'name')"), "no");
        assert_eq!(check("contains_errors(errors)"), "yes");
        assert_eq!(check("contains_errors(clean)"), "no");
    }

    proptest! {
        /// Merging never loses a name from either side.
        #[test]
        fn merge_keeps_union_of_names(
            base in prop::collection::btree_set("[a-z]{1,6}", 0..12),
            supplied in prop::collection::btree_set("[a-z]{1,6}", 0..12),
        ) {
            let mut left = FunctionRegistry::new();
            for name in &base {
                left.insert_value(name.clone(), Value::from("base"));
            }
            let mut right = FunctionRegistry::new();
            for name in &supplied {
                right.insert_value(name.clone(), Value::from("supplied"));
            }

            left.merge(&right);

            let union: std::collections::BTreeSet<&String> = base.iter().chain(&supplied).collect();
            prop_assert_eq!(left.len(), union.len());
            for name in &supplied {
                prop_assert_eq!(left.get(name), Some(&Value::from("supplied")));
            }
            for name in base.difference(&supplied) {
                prop_assert_eq!(left.get(name), Some(&Value::from("base")));
            }
        }
    }
}
