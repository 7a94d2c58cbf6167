use rill_common::{SemanticError, Span};

use super::symbol::{Symbol, SymbolKind, SymbolTable};

/// Locals per block are few; this leaves ample probe room.
const FRAME_CAPACITY: usize = 128;

/// One lexical block's locals plus its hierarchical path label.
///
/// The symbol table and the path travel together in a single frame so the
/// two can never drift apart across push/pop.
#[derive(Debug)]
pub struct ScopeFrame {
    pub table: SymbolTable,
    /// Hierarchical label: roots are "1", "2", …; children "<parent>.<n>".
    pub path: String,
    /// Running child counter; siblings are numbered in document order.
    children: usize,
    parent: Option<usize>,
}

/// Synthesize the codegen name for a declaration in the frame at `path`.
pub fn codegen_name(identifier: &str, path: &str) -> String {
    let flat: String = path.chars().filter(|c| *c != '.').collect();
    format!("{identifier}_{flat}")
}

/// Stack of nested scopes for lexical scoping.
///
/// Frames are stored in a flat `Vec` and linked by parent indices. `leave`
/// closes a frame without destroying it, so the resolution pass can
/// `reenter` frames by the index recorded on each block instead of replaying
/// declaration order.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
    current: Option<usize>,
    roots: usize,
    depth: usize,
    max_depth: usize,
}

impl ScopeStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            current: None,
            roots: 0,
            depth: 0,
            max_depth,
        }
    }

    /// Open a new frame as a child of the current one (or a new root), and
    /// return its index. Exceeding the nesting limit is a hard error.
    pub fn enter(&mut self, span: &Span) -> Result<usize, SemanticError> {
        if self.depth >= self.max_depth {
            return Err(SemanticError::internal(
                format!("scope nesting exceeds the limit of {}", self.max_depth),
                span.clone(),
            ));
        }
        let path = match self.current {
            None => {
                self.roots += 1;
                self.roots.to_string()
            }
            Some(parent) => {
                let frame = &mut self.frames[parent];
                frame.children += 1;
                format!("{}.{}", frame.path, frame.children)
            }
        };
        let idx = self.frames.len();
        self.frames.push(ScopeFrame {
            table: SymbolTable::with_capacity(FRAME_CAPACITY),
            path,
            children: 0,
            parent: self.current,
        });
        self.current = Some(idx);
        self.depth += 1;
        Ok(idx)
    }

    /// Close the current frame and return its index.
    pub fn leave(&mut self, span: &Span) -> Result<usize, SemanticError> {
        match self.current {
            None => Err(SemanticError::internal("scope stack underflow", span.clone())),
            Some(idx) => {
                self.current = self.frames[idx].parent;
                self.depth -= 1;
                Ok(idx)
            }
        }
    }

    /// Re-activate a frame recorded on a block during the declaration pass.
    /// The frame must be a direct child of the current frame.
    pub fn reenter(&mut self, idx: usize, span: &Span) -> Result<(), SemanticError> {
        let parent = match self.frames.get(idx) {
            Some(frame) => frame.parent,
            None => {
                return Err(SemanticError::internal(
                    format!("scope annotation {idx} out of range"),
                    span.clone(),
                ))
            }
        };
        if parent != self.current {
            return Err(SemanticError::internal(
                format!("scope annotation {idx} entered out of order"),
                span.clone(),
            ));
        }
        self.current = Some(idx);
        self.depth += 1;
        Ok(())
    }

    /// Declare a local in the current frame. Returns `Ok(false)` only when
    /// the name already exists in the current frame; shadowing an outer
    /// frame's name is always permitted.
    pub fn declare_local(&mut self, mut symbol: Symbol) -> Result<bool, SemanticError> {
        let idx = self.active_frame(&symbol.defined_at)?;
        let frame = &mut self.frames[idx];
        if frame.table.find(&symbol.name).is_some() {
            return Ok(false);
        }
        symbol.scope_path = frame.path.clone();
        frame.table.insert(symbol)?;
        Ok(true)
    }

    /// Idempotent insert into the current frame, for callables registering
    /// themselves in their enclosing scope (overloads share one name).
    pub fn insert_symbol(&mut self, mut symbol: Symbol) -> Result<(), SemanticError> {
        let idx = self.active_frame(&symbol.defined_at)?;
        let frame = &mut self.frames[idx];
        symbol.scope_path = frame.path.clone();
        frame.table.insert(symbol)?;
        Ok(())
    }

    /// Look up a name, innermost frame outward (shadowing semantics).
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut idx = self.current;
        while let Some(i) = idx {
            if let Some(symbol) = self.frames[i].table.find(name) {
                return Some(symbol);
            }
            idx = self.frames[i].parent;
        }
        None
    }

    /// Look up a name mutably, innermost frame outward.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let mut idx = self.current;
        let target = loop {
            let i = idx?;
            if self.frames[i].table.find(name).is_some() {
                break i;
            }
            idx = self.frames[i].parent;
        };
        self.frames[target].table.find_mut(name)
    }

    /// Look up a data binding (variable, constant, or parameter),
    /// innermost frame outward. Callables registered under their bare name
    /// do not shadow data in enclosing frames.
    pub fn lookup_value(&self, name: &str) -> Option<&Symbol> {
        let mut idx = self.current;
        while let Some(i) = idx {
            if let Some(symbol) = self.frames[i].table.find(name) {
                if is_value_kind(symbol.kind) {
                    return Some(symbol);
                }
            }
            idx = self.frames[i].parent;
        }
        None
    }

    /// Look up a data binding mutably, innermost frame outward.
    pub fn lookup_value_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let mut idx = self.current;
        let target = loop {
            let i = idx?;
            if let Some(symbol) = self.frames[i].table.find(name) {
                if is_value_kind(symbol.kind) {
                    break i;
                }
            }
            idx = self.frames[i].parent;
        };
        self.frames[target].table.find_mut(name)
    }

    /// Search only the current (innermost) frame.
    pub fn lookup_in_current(&self, name: &str) -> Option<&Symbol> {
        self.current
            .and_then(|idx| self.frames[idx].table.find(name))
    }

    /// Path label of the active frame, or "global" outside any frame.
    pub fn current_path(&self) -> &str {
        match self.current {
            Some(idx) => &self.frames[idx].path,
            None => "global",
        }
    }

    pub fn frame(&self, idx: usize) -> Option<&ScopeFrame> {
        self.frames.get(idx)
    }

    /// Drop every frame.
    pub fn dispose(&mut self) {
        self.frames.clear();
        self.current = None;
        self.roots = 0;
        self.depth = 0;
    }

    fn active_frame(&self, span: &Span) -> Result<usize, SemanticError> {
        self.current
            .ok_or_else(|| SemanticError::internal("declaration outside any scope", span.clone()))
    }
}

fn is_value_kind(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::Variable | SymbolKind::Constant | SymbolKind::Parameter
    )
}
