use rill_common::{SemanticError, Span};

use super::symbol::{Symbol, SymbolKind, SymbolTable};
use super::types::TypeTag;

/// Room for builtins plus user signatures of a large program.
const REGISTRY_CAPACITY: usize = 1024;

pub fn function_key(name: &str, arity: usize) -> String {
    format!("{name}#{arity}")
}

pub fn getter_key(name: &str) -> String {
    format!("get:{name}")
}

pub fn setter_key(name: &str) -> String {
    format!("set:{name}")
}

pub fn sentinel_key(name: &str) -> String {
    format!("@{name}")
}

/// Program-wide table of callable signatures.
///
/// Keys are `name#arity` for functions, `get:name` / `set:name` for
/// accessors, and `@name` sentinels marking "some overload of this base
/// name exists" (used to tell wrong-arity apart from undefined).
///
/// Uniqueness is per owning class: re-registering a key under the same
/// owner is a redefinition error, while the same key under a different
/// class silently shares the first entry.
#[derive(Debug)]
pub struct Registry {
    table: SymbolTable,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::with_capacity(REGISTRY_CAPACITY),
        }
    }

    /// Register a function, getter, or setter signature.
    pub fn insert_callable(
        &mut self,
        kind: SymbolKind,
        base: &str,
        arity: usize,
        owner: &str,
        returns: TypeTag,
        target_name: String,
        span: Span,
    ) -> Result<(), SemanticError> {
        let key = match kind {
            SymbolKind::Getter => getter_key(base),
            SymbolKind::Setter => setter_key(base),
            _ => function_key(base, arity),
        };

        if let Some(existing) = self.table.find(&key) {
            if existing.scope_path == owner {
                let what = match kind {
                    SymbolKind::Getter => format!("getter '{base}'"),
                    SymbolKind::Setter => format!("setter '{base}'"),
                    _ => format!("function '{base}/{arity}'"),
                };
                return Err(SemanticError::redefinition(
                    format!("{what} is already defined in class '{owner}'"),
                    span,
                ));
            }
            // Same signature under a different class: share the first entry.
            return Ok(());
        }

        let mut symbol = Symbol::new(key, kind, true, span);
        symbol.arity = Some(arity);
        symbol.ty = returns;
        symbol.scope_path = owner.to_string();
        symbol.target_name = Some(target_name);
        self.table.insert(symbol)?;
        Ok(())
    }

    /// Record that some overload of `base` exists. Idempotent.
    pub fn insert_sentinel(&mut self, base: &str, span: Span) -> Result<(), SemanticError> {
        let symbol = Symbol::new(sentinel_key(base), SymbolKind::Function, true, span);
        self.table.insert(symbol)?;
        Ok(())
    }

    pub fn find(&self, key: &str) -> Option<&Symbol> {
        self.table.find(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.table.find(key).is_some()
    }
}
