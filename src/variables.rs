// src/variables.rs
use crate::value::Value;
use indexmap::IndexMap;

/// Name -> value bindings. Used both for the per-record transient scope and
/// for the persistent scope behind `lastVarValue`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    bindings: IndexMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.bindings.iter()
    }

    pub fn into_bindings(self) -> IndexMap<String, Value> {
        self.bindings
    }
}

/// Variables that persist across records of one query run
#[derive(Debug, Default)]
pub struct VariableStore {
    persistent: Scope,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `name` as of the end of the previous record's pass
    pub fn persistent(&self) -> &Scope {
        &self.persistent
    }

    /// Fold a finished pass into the persistent scope. Every binding made
    /// during the pass overwrites the stored one; names the pass never set
    /// keep their older value.
    pub fn commit(&mut self, transient: &Scope) {
        for (name, value) in transient.iter() {
            self.persistent.set(name.clone(), value.clone());
        }
    }
}
