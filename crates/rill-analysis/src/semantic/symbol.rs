use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rill_common::{SemanticError, Span};

use super::types::TypeTag;

/// The kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Parameter,
    Global,
    Getter,
    Setter,
}

/// A declared symbol: a scope-frame local or a registry signature entry.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// The table key: a plain identifier for locals, a signature key
    /// (`name#arity`, `get:name`, `set:name`, `@name`) for registry entries.
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeTag,
    pub defined: bool,
    pub global: bool,
    /// Parameter count for callables.
    pub arity: Option<usize>,
    /// Path label of the owning scope ("global" for registry builtins,
    /// a class name for registry user entries).
    pub scope_path: String,
    /// Synthesized codegen name; references copy it from here.
    pub target_name: Option<String>,
    pub defined_at: Span,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, defined: bool, defined_at: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty: TypeTag::Unknown,
            defined,
            global: false,
            arity: None,
            scope_path: String::new(),
            target_name: None,
            defined_at,
        }
    }
}

enum Probe {
    Found(usize),
    Vacant(usize),
    Full,
}

/// Open-addressed hash table from identifier to symbol.
///
/// Linear probing with wraparound, fixed capacity chosen at construction,
/// append-only. Because entries are never removed, a probe chain ends at the
/// first empty bucket; a full cycle without a match means the key is absent.
#[derive(Debug)]
pub struct SymbolTable {
    buckets: Vec<Option<Symbol>>,
    len: usize,
}

impl SymbolTable {
    /// Capacity is fixed for the table's lifetime; size generously.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: (0..capacity.max(1)).map(|_| None).collect(),
            len: 0,
        }
    }

    fn home_bucket(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.buckets.len()
    }

    fn probe(&self, key: &str) -> Probe {
        let capacity = self.buckets.len();
        let start = self.home_bucket(key);
        for step in 0..capacity {
            let idx = (start + step) % capacity;
            match &self.buckets[idx] {
                Some(symbol) if symbol.name == key => return Probe::Found(idx),
                Some(_) => continue,
                None => return Probe::Vacant(idx),
            }
        }
        Probe::Full
    }

    /// Look up a symbol by key.
    pub fn find(&self, key: &str) -> Option<&Symbol> {
        match self.probe(key) {
            Probe::Found(idx) => self.buckets[idx].as_ref(),
            _ => None,
        }
    }

    /// Look up a symbol mutably by key.
    pub fn find_mut(&mut self, key: &str) -> Option<&mut Symbol> {
        match self.probe(key) {
            Probe::Found(idx) => self.buckets[idx].as_mut(),
            _ => None,
        }
    }

    /// Insert a symbol. Idempotent: if the key already exists the table is
    /// left untouched and `Ok(false)` is returned. A full table is an
    /// internal error.
    pub fn insert(&mut self, symbol: Symbol) -> Result<bool, SemanticError> {
        match self.probe(&symbol.name) {
            Probe::Found(_) => Ok(false),
            Probe::Vacant(idx) => {
                self.buckets[idx] = Some(symbol);
                self.len += 1;
                Ok(true)
            }
            Probe::Full => Err(SemanticError::internal(
                format!("symbol table overflow inserting '{}'", symbol.name),
                symbol.defined_at,
            )),
        }
    }

    /// Iterate over all entries, in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.buckets.iter().filter_map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
