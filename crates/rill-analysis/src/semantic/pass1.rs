use rill_common::SemanticError;

use crate::ast::nodes::*;

use super::globals::is_global_name;
use super::registry::{function_key, sentinel_key, setter_key};
use super::scope::codegen_name;
use super::symbol::{Symbol, SymbolKind};
use super::type_rules::{self, literal_tag, ParamMatch};
use super::types::TypeTag;
use super::Context;

/// Declaration pass: collect every callable signature, then walk bodies to
/// populate scope frames, assign scope labels, synthesize codegen names for
/// declarations, and run the checks that need no type inference (flow
/// control, assignment-target legality, literal-only operator and builtin
/// argument checks).
pub(crate) fn run(ctx: &mut Context, program: &mut Program) -> Result<(), SemanticError> {
    collect_headers(ctx, program)?;
    let mut walker = Walker {
        ctx,
        loop_depth: 0,
        func_depth: 0,
    };
    for class in &mut program.classes {
        walker.walk_block(&mut class.body)?;
    }
    Ok(())
}

// ============================================================================
// Header collection
// ============================================================================

fn collect_headers(ctx: &mut Context, program: &Program) -> Result<(), SemanticError> {
    let mut seen_main = false;
    for class in &program.classes {
        collect_block_headers(ctx, &class.body, &class.name, &mut seen_main)?;
    }
    // Only judged after the full scan: main may live in any class.
    if !seen_main {
        return Err(SemanticError::definition(
            "no 'main' function with zero parameters is defined",
            program.span.clone(),
        ));
    }
    Ok(())
}

/// Scan a class body for callable signatures. Recurses through nested
/// blocks and control-flow bodies, but never into function, getter, or
/// setter bodies.
fn collect_block_headers(
    ctx: &mut Context,
    block: &Block,
    owner: &str,
    seen_main: &mut bool,
) -> Result<(), SemanticError> {
    for stmt in &block.stmts {
        match stmt {
            Stmt::Func(f) => {
                let arity = f.params.len();
                if f.name == "main" {
                    if arity != 0 {
                        return Err(SemanticError::definition(
                            format!("'main' must take no parameters, found {arity}"),
                            f.span.clone(),
                        ));
                    }
                    *seen_main = true;
                }
                ctx.registry.insert_callable(
                    SymbolKind::Function,
                    &f.name,
                    arity,
                    owner,
                    TypeTag::Unknown,
                    format!("{}_{}", f.name, arity),
                    f.span.clone(),
                )?;
                if !ctx.builtins.is_builtin_qname(&f.name) {
                    ctx.registry.insert_sentinel(&f.name, f.span.clone())?;
                }
            }
            Stmt::Getter(g) => {
                ctx.registry.insert_callable(
                    SymbolKind::Getter,
                    &g.name,
                    0,
                    owner,
                    TypeTag::Unknown,
                    format!("get_{}", g.name),
                    g.span.clone(),
                )?;
            }
            Stmt::Setter(s) => {
                ctx.registry.insert_callable(
                    SymbolKind::Setter,
                    &s.name,
                    1,
                    owner,
                    TypeTag::Unknown,
                    format!("set_{}", s.name),
                    s.span.clone(),
                )?;
            }
            Stmt::Block(b) => collect_block_headers(ctx, b, owner, seen_main)?,
            Stmt::If(i) => {
                collect_block_headers(ctx, &i.then_branch, owner, seen_main)?;
                if let Some(ref else_branch) = i.else_branch {
                    collect_block_headers(ctx, else_branch, owner, seen_main)?;
                }
            }
            Stmt::While(w) => collect_block_headers(ctx, &w.body, owner, seen_main)?,
            _ => {}
        }
    }
    Ok(())
}

// ============================================================================
// Body walk
// ============================================================================

struct Walker<'a> {
    ctx: &'a mut Context,
    loop_depth: u32,
    func_depth: u32,
}

impl Walker<'_> {
    fn walk_block(&mut self, block: &mut Block) -> Result<(), SemanticError> {
        let idx = self.ctx.scopes.enter(&block.span)?;
        block.scope = Some(idx);
        for stmt in &mut block.stmts {
            self.walk_stmt(stmt)?;
        }
        self.ctx.scopes.leave(&block.span)?;
        Ok(())
    }

    fn walk_stmt(&mut self, stmt: &mut Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Var(v) => self.walk_var(v),
            Stmt::Const(c) => self.walk_const(c),
            Stmt::Func(f) => self.walk_func(f),
            Stmt::Getter(g) => self.walk_getter(g),
            Stmt::Setter(s) => self.walk_setter(s),
            Stmt::Assign(a) => self.walk_assign(a),
            Stmt::Expr(e) => self.walk_expr(&mut e.expr),
            Stmt::If(i) => {
                self.walk_expr(&mut i.condition)?;
                self.walk_block(&mut i.then_branch)?;
                if let Some(ref mut else_branch) = i.else_branch {
                    self.walk_block(else_branch)?;
                }
                Ok(())
            }
            Stmt::While(w) => {
                self.walk_expr(&mut w.condition)?;
                self.loop_depth += 1;
                let result = self.walk_block(&mut w.body);
                self.loop_depth -= 1;
                result
            }
            Stmt::Break(b) => {
                if self.loop_depth == 0 {
                    return Err(SemanticError::flow_control(
                        "'break' outside of a loop",
                        b.span.clone(),
                    ));
                }
                Ok(())
            }
            Stmt::Continue(c) => {
                if self.loop_depth == 0 {
                    return Err(SemanticError::flow_control(
                        "'continue' outside of a loop",
                        c.span.clone(),
                    ));
                }
                Ok(())
            }
            Stmt::Return(r) => {
                if self.func_depth == 0 {
                    return Err(SemanticError::flow_control(
                        "'return' outside of a function",
                        r.span.clone(),
                    ));
                }
                if let Some(ref mut value) = r.value {
                    self.walk_expr(value)?;
                }
                Ok(())
            }
            Stmt::Block(b) => self.walk_block(b),
        }
    }

    fn walk_var(&mut self, v: &mut VarDecl) -> Result<(), SemanticError> {
        // Check the initializer before the name exists.
        if let Some(ref mut init) = v.initializer {
            self.walk_expr(init)?;
        }
        let name = codegen_name(&v.name, self.ctx.scopes.current_path());
        let mut symbol = Symbol::new(&v.name, SymbolKind::Variable, v.initializer.is_some(), v.span.clone());
        symbol.target_name = Some(name.clone());
        if !self.ctx.scopes.declare_local(symbol)? {
            return Err(SemanticError::redefinition(
                format!("'{}' is already declared in this block", v.name),
                v.span.clone(),
            ));
        }
        v.target_name = Some(name);
        Ok(())
    }

    fn walk_const(&mut self, c: &mut ConstDecl) -> Result<(), SemanticError> {
        let name = codegen_name(&c.name, self.ctx.scopes.current_path());
        let mut symbol = Symbol::new(&c.name, SymbolKind::Constant, true, c.span.clone());
        symbol.ty = literal_tag(&c.value);
        symbol.target_name = Some(name.clone());
        if !self.ctx.scopes.declare_local(symbol)? {
            return Err(SemanticError::redefinition(
                format!("'{}' is already declared in this block", c.name),
                c.span.clone(),
            ));
        }
        c.target_name = Some(name);
        Ok(())
    }

    fn walk_func(&mut self, f: &mut FuncDecl) -> Result<(), SemanticError> {
        // The callable registers under its bare name in the enclosing
        // scope; overloads share the one symbol.
        let symbol = Symbol::new(&f.name, SymbolKind::Function, true, f.span.clone());
        self.ctx.scopes.insert_symbol(symbol)?;
        f.target_name = Some(format!("{}_{}", f.name, f.params.len()));

        // One merged frame holds the parameters and the top-level body
        // statements; the body block gets no frame of its own.
        let idx = self.ctx.scopes.enter(&f.span)?;
        f.body.scope = Some(idx);
        for param in &mut f.params {
            self.declare_param(param)?;
        }
        self.walk_callable_body(&mut f.body)?;
        self.ctx.scopes.leave(&f.body.span)?;
        Ok(())
    }

    fn walk_getter(&mut self, g: &mut GetterDecl) -> Result<(), SemanticError> {
        let symbol = Symbol::new(&g.name, SymbolKind::Function, true, g.span.clone());
        self.ctx.scopes.insert_symbol(symbol)?;
        g.target_name = Some(format!("get_{}", g.name));

        let idx = self.ctx.scopes.enter(&g.span)?;
        g.body.scope = Some(idx);
        self.walk_callable_body(&mut g.body)?;
        self.ctx.scopes.leave(&g.body.span)?;
        Ok(())
    }

    fn walk_setter(&mut self, s: &mut SetterDecl) -> Result<(), SemanticError> {
        let symbol = Symbol::new(&s.name, SymbolKind::Function, true, s.span.clone());
        self.ctx.scopes.insert_symbol(symbol)?;
        s.target_name = Some(format!("set_{}", s.name));

        let idx = self.ctx.scopes.enter(&s.span)?;
        s.body.scope = Some(idx);
        self.declare_param(&mut s.param)?;
        self.walk_callable_body(&mut s.body)?;
        self.ctx.scopes.leave(&s.body.span)?;
        Ok(())
    }

    /// Walk a callable's body statements inside the already-entered merged
    /// frame. A loop in the caller never reaches into a callable body.
    fn walk_callable_body(&mut self, body: &mut Block) -> Result<(), SemanticError> {
        let prev_loops = self.loop_depth;
        self.loop_depth = 0;
        self.func_depth += 1;
        let mut result = Ok(());
        for stmt in &mut body.stmts {
            result = self.walk_stmt(stmt);
            if result.is_err() {
                break;
            }
        }
        self.func_depth -= 1;
        self.loop_depth = prev_loops;
        result
    }

    fn declare_param(&mut self, param: &mut Param) -> Result<(), SemanticError> {
        let name = codegen_name(&param.name, self.ctx.scopes.current_path());
        let mut symbol = Symbol::new(&param.name, SymbolKind::Parameter, true, param.span.clone());
        symbol.target_name = Some(name.clone());
        if !self.ctx.scopes.declare_local(symbol)? {
            return Err(SemanticError::redefinition(
                format!("duplicate parameter '{}'", param.name),
                param.span.clone(),
            ));
        }
        param.target_name = Some(name);
        Ok(())
    }

    fn walk_assign(&mut self, a: &mut AssignStmt) -> Result<(), SemanticError> {
        self.walk_expr(&mut a.value)?;

        // A legal target is an existing local/parameter in any enclosing
        // frame, a property with a setter, or a `$`-global.
        if let Some(symbol) = self.ctx.scopes.lookup_value(&a.target) {
            if symbol.kind == SymbolKind::Constant {
                return Err(SemanticError::definition(
                    format!("cannot assign to constant '{}'", a.target),
                    a.span.clone(),
                ));
            }
            return Ok(());
        }
        if self.ctx.registry.has(&setter_key(&a.target)) {
            return Ok(());
        }
        if is_global_name(&a.target) {
            self.ctx.globals.record(&a.target)?;
            return Ok(());
        }
        Err(SemanticError::definition(
            format!("cannot assign to undefined name '{}'", a.target),
            a.span.clone(),
        ))
    }

    fn walk_expr(&mut self, expr: &mut Expr) -> Result<(), SemanticError> {
        let span = expr.span.clone();
        match &mut expr.kind {
            ExprKind::Literal(_) => Ok(()),
            // Identifier reads resolve in the next pass.
            ExprKind::Identifier { .. } => Ok(()),
            ExprKind::Binary { left, op, right } => {
                self.walk_expr(left)?;
                self.walk_expr(right)?;
                // Fast fail when both sides are compile-time constants.
                if let (Some(lk), Some(rk)) =
                    (type_rules::literal_kind(left), type_rules::literal_kind(right))
                {
                    type_rules::check_literal_binary(*op, lk, rk)
                        .map_err(|msg| SemanticError::expression_type(msg, span))?;
                }
                Ok(())
            }
            ExprKind::Unary { operand, .. } => self.walk_expr(operand),
            ExprKind::Call { name, args, .. } => {
                for arg in args.iter_mut() {
                    self.walk_expr(arg)?;
                }
                self.check_call(name, args, &span)
            }
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                self.walk_expr(condition)?;
                self.walk_expr(then_expr)?;
                self.walk_expr(else_expr)
            }
            ExprKind::TypeTest { value, .. } => self.walk_expr(value),
            ExprKind::Grouping(inner) => self.walk_expr(inner),
        }
    }

    /// Opportunistic arity checks, plus literal argument kinds for builtins.
    fn check_call(
        &mut self,
        name: &str,
        args: &[Expr],
        span: &rill_common::Span,
    ) -> Result<(), SemanticError> {
        let arity = args.len();
        if self.ctx.builtins.is_builtin_qname(name) {
            if !self.ctx.registry.has(&function_key(name, arity)) {
                return Err(SemanticError::argument_count(
                    format!("builtin '{name}' does not take {arity} argument(s)"),
                    span.clone(),
                ));
            }
            let params = self
                .ctx
                .builtins
                .param_spec(name)
                .expect("enabled builtin has a param spec");
            for (position, (arg, kind)) in args.iter().zip(params.iter()).enumerate() {
                // Only literal arguments are judged here; the rest wait for
                // inference.
                if let Some(lit) = type_rules::literal_kind(arg) {
                    if let ParamMatch::Mismatch(wanted) = type_rules::match_param(*kind, lit) {
                        return Err(SemanticError::argument_count(
                            format!(
                                "builtin '{}' expects a {} for argument {}, got {} literal",
                                name,
                                wanted,
                                position + 1,
                                lit.display_name()
                            ),
                            arg.span.clone(),
                        ));
                    }
                }
            }
            return Ok(());
        }

        if self.ctx.registry.has(&function_key(name, arity)) {
            return Ok(());
        }
        if self.ctx.registry.has(&sentinel_key(name)) {
            return Err(SemanticError::argument_count(
                format!("no overload of '{name}' takes {arity} argument(s)"),
                span.clone(),
            ));
        }
        // Unknown name: deferred to the resolution pass.
        Ok(())
    }
}
