//! AST builders for analyzer tests. The parser lives outside this
//! workspace, so tests assemble trees by hand.

use rill_common::Span;

use crate::ast::nodes::*;

pub fn sp() -> Span {
    Span::dummy()
}

// -- Expressions --

pub fn lit_int(value: i64) -> Expr {
    Expr::new(ExprKind::Literal(Literal::Int(value)), sp())
}

pub fn lit_double(value: f64) -> Expr {
    Expr::new(ExprKind::Literal(Literal::Double(value)), sp())
}

pub fn lit_str(value: &str) -> Expr {
    Expr::new(ExprKind::Literal(Literal::String(value.into())), sp())
}

pub fn lit_bool(value: bool) -> Expr {
    Expr::new(ExprKind::Literal(Literal::Bool(value)), sp())
}

pub fn lit_null() -> Expr {
    Expr::new(ExprKind::Literal(Literal::Null), sp())
}

pub fn ident(name: &str) -> Expr {
    Expr::new(
        ExprKind::Identifier {
            name: name.into(),
            target_name: None,
        },
        sp(),
    )
}

pub fn bin(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        sp(),
    )
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        sp(),
    )
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::new(
        ExprKind::Call {
            name: name.into(),
            args,
            target_name: None,
        },
        sp(),
    )
}

pub fn ternary(condition: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
    Expr::new(
        ExprKind::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        },
        sp(),
    )
}

pub fn type_test(value: Expr, type_name: &str) -> Expr {
    Expr::new(
        ExprKind::TypeTest {
            value: Box::new(value),
            type_name: type_name.into(),
        },
        sp(),
    )
}

// -- Statements --

pub fn var(name: &str) -> Stmt {
    Stmt::Var(VarDecl {
        name: name.into(),
        initializer: None,
        target_name: None,
        span: sp(),
    })
}

pub fn var_init(name: &str, initializer: Expr) -> Stmt {
    Stmt::Var(VarDecl {
        name: name.into(),
        initializer: Some(initializer),
        target_name: None,
        span: sp(),
    })
}

pub fn const_decl(name: &str, value: Literal) -> Stmt {
    Stmt::Const(ConstDecl {
        name: name.into(),
        value,
        target_name: None,
        span: sp(),
    })
}

pub fn assign(target: &str, value: Expr) -> Stmt {
    Stmt::Assign(AssignStmt {
        target: target.into(),
        value,
        target_name: None,
        span: sp(),
    })
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(ExprStmt { expr, span: sp() })
}

pub fn if_stmt(condition: Expr, then_stmts: Vec<Stmt>) -> Stmt {
    Stmt::If(IfStmt {
        condition,
        then_branch: block(then_stmts),
        else_branch: None,
        span: sp(),
    })
}

pub fn while_stmt(condition: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While(WhileStmt {
        condition,
        body: block(body),
        span: sp(),
    })
}

pub fn brk() -> Stmt {
    Stmt::Break(BreakStmt { span: sp() })
}

pub fn cont() -> Stmt {
    Stmt::Continue(ContinueStmt { span: sp() })
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::Return(ReturnStmt { value, span: sp() })
}

pub fn block_stmt(stmts: Vec<Stmt>) -> Stmt {
    Stmt::Block(block(stmts))
}

pub fn block(stmts: Vec<Stmt>) -> Block {
    Block {
        stmts,
        scope: None,
        span: sp(),
    }
}

pub fn param(name: &str) -> Param {
    Param {
        name: name.into(),
        target_name: None,
        span: sp(),
    }
}

pub fn func(name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
    Stmt::Func(FuncDecl {
        name: name.into(),
        params: params.iter().map(|p| param(p)).collect(),
        body: block(body),
        target_name: None,
        span: sp(),
    })
}

pub fn getter(name: &str, body: Vec<Stmt>) -> Stmt {
    Stmt::Getter(GetterDecl {
        name: name.into(),
        body: block(body),
        target_name: None,
        span: sp(),
    })
}

pub fn setter(name: &str, param_name: &str, body: Vec<Stmt>) -> Stmt {
    Stmt::Setter(SetterDecl {
        name: name.into(),
        param: param(param_name),
        body: block(body),
        target_name: None,
        span: sp(),
    })
}

// -- Program --

pub fn class(name: &str, stmts: Vec<Stmt>) -> ClassDecl {
    ClassDecl {
        name: name.into(),
        body: block(stmts),
        span: sp(),
    }
}

pub fn program(classes: Vec<ClassDecl>) -> Program {
    Program { classes, span: sp() }
}

/// One class holding `func main()` with the given body.
pub fn main_program(stmts: Vec<Stmt>) -> Program {
    program(vec![class("Main", vec![func("main", &[], stmts)])])
}
