use rill_common::{SemanticError, Span};

use super::symbol::{Symbol, SymbolKind, SymbolTable};
use super::type_rules;
use super::types::TypeTag;

/// Room for every distinct `$`-name a realistic program uses.
const GLOBALS_CAPACITY: usize = 256;

/// Whether `name` follows the implicit-global naming convention.
pub fn is_global_name(name: &str) -> bool {
    name.starts_with('$')
}

/// Codegen name for a `$`-global: the prefix would not survive most
/// backends, so it is rewritten to `g_`.
pub fn global_target_name(name: &str) -> String {
    format!("g_{}", name.trim_start_matches('$'))
}

/// A `$`-global handed to the caller after analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalBinding {
    pub name: String,
    pub ty: TypeTag,
}

/// Process-wide state for `$`-convention identifiers.
///
/// These names bypass lexical scoping entirely, and the code generator
/// consumes them after both passes' scopes are gone, so they live on the
/// analysis context rather than in any frame. Reset before every run.
#[derive(Debug)]
pub struct GlobalRegistry {
    /// First-seen order, for a deterministic copy-out.
    order: Vec<String>,
    table: SymbolTable,
}

impl Default for GlobalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalRegistry {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            table: SymbolTable::with_capacity(GLOBALS_CAPACITY),
        }
    }

    pub fn reset(&mut self) {
        self.order.clear();
        self.table = SymbolTable::with_capacity(GLOBALS_CAPACITY);
    }

    /// Record a sighting of `name` (read or assignment target).
    pub fn record(&mut self, name: &str) -> Result<(), SemanticError> {
        if self.table.find(name).is_none() {
            let mut symbol = Symbol::new(name, SymbolKind::Global, false, Span::dummy());
            symbol.global = true;
            symbol.target_name = Some(global_target_name(name));
            self.table.insert(symbol)?;
            self.order.push(name.to_string());
        }
        Ok(())
    }

    /// Apply the assignment learning rule to `name`.
    pub fn learn(&mut self, name: &str, incoming: TypeTag) -> Result<(), SemanticError> {
        self.record(name)?;
        if let Some(symbol) = self.table.find_mut(name) {
            symbol.ty = type_rules::learn(symbol.ty, incoming);
            symbol.defined = true;
        }
        Ok(())
    }

    /// Current learned tag for `name`; `Unknown` if never assigned.
    pub fn lookup(&self, name: &str) -> TypeTag {
        self.table
            .find(name)
            .map(|symbol| symbol.ty)
            .unwrap_or(TypeTag::Unknown)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Copy-out accessor: hand the caller ownership of the deduplicated
    /// global list with learned tags.
    pub fn into_bindings(self) -> Vec<GlobalBinding> {
        let GlobalRegistry { order, table } = self;
        order
            .into_iter()
            .map(|name| {
                let ty = table
                    .find(&name)
                    .map(|symbol| symbol.ty)
                    .unwrap_or(TypeTag::Unknown);
                GlobalBinding { name, ty }
            })
            .collect()
    }
}
