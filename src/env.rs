//! Naming tables: the in-scope variable name for each input id.
//!
//! A table is an immutable linked list of bindings. Binding a name returns a
//! new table that shadows any earlier binding of the same name, so one base
//! table can be shared across steps while each step layers its own names on
//! top. Step outputs are bound under dot-separated names (`step.output`).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// An individual binding of a name to a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding<T> {
    name: String,
    value: T,
}

impl<T> Binding<T> {
    pub fn new(name: String, value: T) -> Self {
        Self { name, value }
    }

    /// Namespaced names are dot-separated.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Display> fmt::Display for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

/// Immutable environment of bindings, newest first.
#[derive(Debug, Clone)]
pub struct Bindings<T> {
    head: Option<Arc<Node<T>>>,
}

#[derive(Debug)]
struct Node<T> {
    binding: Binding<T>,
    next: Option<Arc<Node<T>>>,
}

/// Input id to target variable name.
pub type NamingTable = Bindings<String>;

impl<T> Default for Bindings<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Bindings<T> {
    pub fn new() -> Self {
        Self { head: None }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of unique (unshadowed) bindings.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Return a new environment with a binding added.
    ///
    /// Any existing binding with the same name is shadowed.
    pub fn bind(&self, name: impl Into<String>, value: T) -> Self {
        let node = Node {
            binding: Binding::new(name.into(), value),
            next: self.head.clone(),
        };
        Self {
            head: Some(Arc::new(node)),
        }
    }

    pub fn resolve_binding(&self, name: &str) -> Option<&Binding<T>> {
        let mut current = self.head.as_deref();
        while let Some(node) = current {
            if node.binding.name == name {
                return Some(&node.binding);
            }
            current = node.next.as_deref();
        }
        None
    }

    pub fn resolve(&self, name: &str) -> Option<&T> {
        self.resolve_binding(name).map(|b| b.value())
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.resolve_binding(name).is_some()
    }

    /// Iterator over unique bindings, most recent first.
    pub fn iter(&self) -> BindingIterator<'_, T> {
        BindingIterator {
            current: self.head.as_deref(),
            seen: HashSet::new(),
        }
    }
}

impl NamingTable {
    /// A table binding every id to itself.
    pub fn identity<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        ids.into_iter()
            .fold(Bindings::new(), |env, id| env.bind(id, id.to_string()))
    }

    /// Key under which a step output is bound.
    pub fn step_output_key(step: &str, output: &str) -> String {
        format!("{}.{}", step, output)
    }
}

impl<T, N: Into<String>> FromIterator<(N, T)> for Bindings<T> {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Bindings::new(), |env, (name, value)| env.bind(name, value))
    }
}

/// Iterator over bindings in an environment.
pub struct BindingIterator<'a, T> {
    current: Option<&'a Node<T>>,
    seen: HashSet<&'a str>,
}

impl<'a, T> Iterator for BindingIterator<'a, T> {
    type Item = &'a Binding<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.current {
            self.current = node.next.as_deref();
            if self.seen.insert(node.binding.name()) {
                return Some(&node.binding);
            }
        }
        None
    }
}
