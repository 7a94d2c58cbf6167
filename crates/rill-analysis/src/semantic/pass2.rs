use rill_common::SemanticError;

use crate::ast::nodes::*;

use super::globals::{global_target_name, is_global_name};
use super::registry::{function_key, getter_key, sentinel_key, setter_key};
use super::type_rules::{self, literal_tag};
use super::types::TypeTag;
use super::Context;

/// Resolution pass: re-walk the AST through the frames recorded by the
/// declaration pass, resolve every identifier and call, infer and validate
/// expression types, learn symbol types from assignments, and copy codegen
/// names onto reference and call sites.
pub(crate) fn run(ctx: &mut Context, program: &mut Program) -> Result<(), SemanticError> {
    let mut walker = Walker { ctx };
    for class in &mut program.classes {
        walker.walk_block(&mut class.body)?;
    }
    Ok(())
}

struct Walker<'a> {
    ctx: &'a mut Context,
}

impl Walker<'_> {
    /// Re-activate the frame recorded on `block` in the declaration pass.
    fn reenter(&mut self, block: &Block) -> Result<(), SemanticError> {
        let idx = block.scope.ok_or_else(|| {
            SemanticError::internal("block carries no scope annotation", block.span.clone())
        })?;
        self.ctx.scopes.reenter(idx, &block.span)
    }

    fn walk_block(&mut self, block: &mut Block) -> Result<(), SemanticError> {
        self.reenter(block)?;
        for stmt in &mut block.stmts {
            self.walk_stmt(stmt)?;
        }
        self.ctx.scopes.leave(&block.span)?;
        Ok(())
    }

    /// Walk a callable body inside its merged frame (parameters live in the
    /// same frame as the top-level statements).
    fn walk_callable_body(&mut self, body: &mut Block) -> Result<(), SemanticError> {
        self.reenter(body)?;
        for stmt in &mut body.stmts {
            self.walk_stmt(stmt)?;
        }
        self.ctx.scopes.leave(&body.span)?;
        Ok(())
    }

    fn walk_stmt(&mut self, stmt: &mut Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Var(v) => {
                if let Some(ref mut init) = v.initializer {
                    let ty = self.infer_expr(init)?;
                    if let Some(symbol) = self.ctx.scopes.lookup_value_mut(&v.name) {
                        symbol.ty = type_rules::learn(symbol.ty, ty);
                        symbol.defined = true;
                    }
                }
                Ok(())
            }
            // Constants were typed from their literal at declaration.
            Stmt::Const(_) => Ok(()),
            Stmt::Func(f) => self.walk_callable_body(&mut f.body),
            Stmt::Getter(g) => self.walk_callable_body(&mut g.body),
            Stmt::Setter(s) => self.walk_callable_body(&mut s.body),
            Stmt::Assign(a) => self.walk_assign(a),
            Stmt::Expr(e) => self.infer_expr(&mut e.expr).map(|_| ()),
            Stmt::If(i) => {
                self.infer_expr(&mut i.condition)?;
                self.walk_block(&mut i.then_branch)?;
                if let Some(ref mut else_branch) = i.else_branch {
                    self.walk_block(else_branch)?;
                }
                Ok(())
            }
            Stmt::While(w) => {
                self.infer_expr(&mut w.condition)?;
                self.walk_block(&mut w.body)
            }
            // Flow legality was settled in the declaration pass.
            Stmt::Break(_) | Stmt::Continue(_) => Ok(()),
            Stmt::Return(r) => {
                if let Some(ref mut value) = r.value {
                    self.infer_expr(value)?;
                }
                Ok(())
            }
            Stmt::Block(b) => self.walk_block(b),
        }
    }

    fn walk_assign(&mut self, a: &mut AssignStmt) -> Result<(), SemanticError> {
        let rhs = self.infer_expr(&mut a.value)?;

        if let Some(symbol) = self.ctx.scopes.lookup_value_mut(&a.target) {
            symbol.ty = type_rules::learn(symbol.ty, rhs);
            symbol.defined = true;
            a.target_name = symbol.target_name.clone();
            return Ok(());
        }
        if let Some(entry) = self.ctx.registry.find(&setter_key(&a.target)) {
            a.target_name = entry.target_name.clone();
            return Ok(());
        }
        if is_global_name(&a.target) {
            self.ctx.globals.learn(&a.target, rhs)?;
            a.target_name = Some(global_target_name(&a.target));
            return Ok(());
        }
        Err(SemanticError::definition(
            format!("cannot assign to undefined name '{}'", a.target),
            a.span.clone(),
        ))
    }

    // ========================================================================
    // Bottom-up inference
    // ========================================================================

    fn infer_expr(&mut self, expr: &mut Expr) -> Result<TypeTag, SemanticError> {
        let span = expr.span.clone();
        match &mut expr.kind {
            ExprKind::Literal(lit) => Ok(literal_tag(lit)),

            ExprKind::Identifier { name, target_name } => {
                // Resolution order: local/parameter, then accessor, then
                // `$`-global, otherwise undefined.
                if let Some(symbol) = self.ctx.scopes.lookup_value(name) {
                    *target_name = symbol.target_name.clone();
                    return Ok(symbol.ty);
                }
                if let Some(entry) = self.ctx.registry.find(&getter_key(name)) {
                    let ty = entry.ty;
                    *target_name = entry.target_name.clone();
                    return Ok(ty);
                }
                if self.ctx.registry.has(&setter_key(name)) {
                    return Err(SemanticError::definition(
                        format!("property '{name}' has a setter but no getter and cannot be read"),
                        span,
                    ));
                }
                if is_global_name(name) {
                    self.ctx.globals.record(name)?;
                    *target_name = Some(global_target_name(name));
                    return Ok(self.ctx.globals.lookup(name));
                }
                Err(SemanticError::definition(
                    format!("undefined identifier '{name}'"),
                    span,
                ))
            }

            ExprKind::Binary { left, op, right } => {
                let op = *op;
                let lhs = self.infer_expr(left)?;
                let rhs = self.infer_expr(right)?;
                type_rules::binary_result(lhs, op, rhs)
                    .map_err(|msg| SemanticError::expression_type(msg, span))
            }

            ExprKind::Unary { op, operand } => {
                let op = *op;
                let ty = self.infer_expr(operand)?;
                type_rules::unary_result(op, ty)
                    .map_err(|msg| SemanticError::expression_type(msg, span))
            }

            ExprKind::Call {
                name,
                args,
                target_name,
            } => {
                for arg in args.iter_mut() {
                    self.infer_expr(arg)?;
                }
                let arity = args.len();

                if self.ctx.builtins.is_builtin_qname(name) {
                    // Builtins admit no overloads: exact arity or nothing.
                    return match self.ctx.registry.find(&function_key(name, arity)) {
                        Some(entry) => {
                            let ty = entry.ty;
                            *target_name = entry.target_name.clone();
                            Ok(ty)
                        }
                        None => Err(SemanticError::argument_count(
                            format!("builtin '{name}' does not take {arity} argument(s)"),
                            span,
                        )),
                    };
                }

                if let Some(entry) = self.ctx.registry.find(&function_key(name, arity)) {
                    let ty = entry.ty;
                    *target_name = entry.target_name.clone();
                    return Ok(ty);
                }
                if self.ctx.registry.has(&sentinel_key(name)) {
                    return Err(SemanticError::argument_count(
                        format!("no overload of '{name}' takes {arity} argument(s)"),
                        span,
                    ));
                }
                Err(SemanticError::definition(
                    format!("undefined function '{name}'"),
                    span,
                ))
            }

            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                // Both branches are visited for their effects; the merged
                // value stays untyped.
                self.infer_expr(condition)?;
                self.infer_expr(then_expr)?;
                self.infer_expr(else_expr)?;
                Ok(TypeTag::Unknown)
            }

            ExprKind::TypeTest { value, type_name } => {
                self.infer_expr(value)?;
                if !matches!(type_name.as_str(), "Num" | "String" | "Null") {
                    return Err(SemanticError::expression_type(
                        format!(
                            "right side of 'is' must be Num, String, or Null, got '{type_name}'"
                        ),
                        span,
                    ));
                }
                Ok(TypeTag::Bool)
            }

            ExprKind::Grouping(inner) => self.infer_expr(inner),
        }
    }
}
