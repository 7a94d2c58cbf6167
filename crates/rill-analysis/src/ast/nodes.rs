use serde::{Deserialize, Serialize};

use rill_common::Span;

// ============================================================================
// Program (top-level)
// ============================================================================

/// A complete parsed Rill program.
///
/// Produced by the parser (external to this workspace) and consumed here.
/// On successful analysis the tree carries scope annotations on blocks and
/// codegen names on declarations, parameters, references, and calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
    pub span: Span,
}

// ============================================================================
// Declarations
// ============================================================================

/// ```rill
/// class Greeter {
///     var greeting
///     func hello(name) { println(greeting .. name) }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub body: Block,
    pub span: Span,
}

/// A variable declaration. The type is learned later from assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub initializer: Option<Expr>,
    /// Codegen name, filled during analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    pub span: Span,
}

/// A constant declaration. The initializer must be a literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: String,
    pub value: Literal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    pub span: Span,
}

/// ```rill
/// func area(w, h) { return w * h }
/// ```
///
/// Functions overload by arity: `area(w)` and `area(w, h)` may coexist
/// within one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    pub span: Span,
}

/// ```rill
/// get radius { return _r }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetterDecl {
    pub name: String,
    pub body: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    pub span: Span,
}

/// ```rill
/// set radius(value) { _r = value }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetterDecl {
    pub name: String,
    pub param: Param,
    pub body: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

/// A lexical block. `scope` is the analyzer's frame index, assigned in the
/// declaration pass and re-entered in the resolution pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<usize>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Var(VarDecl),
    Const(ConstDecl),
    Func(FuncDecl),
    Getter(GetterDecl),
    Setter(SetterDecl),
    Assign(AssignStmt),
    Expr(ExprStmt),
    If(IfStmt),
    While(WhileStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Return(ReturnStmt),
    Block(Block),
}

/// Assignment to a bare name: a local, a property with a setter, or a
/// `$`-global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignStmt {
    pub target: String,
    pub value: Expr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Block,
    pub else_branch: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakStmt {
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinueStmt {
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Literal),

    /// A bare-name read: local/parameter, getter property, or `$`-global.
    Identifier {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_name: Option<String>,
    },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// A bare-name call, resolved by (name, arity) against the registry.
    Call {
        name: String,
        args: Vec<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_name: Option<String>,
    },

    /// `cond ? a : b`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    /// `value is Num` — the right side is one of the literal type names.
    TypeTest {
        value: Box<Expr>,
        type_name: String,
    },

    Grouping(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Int(i64),
    Double(f64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `..` string concatenation.
    Concat,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Concat => "..",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    /// Postfix `?`: true when the operand is not null.
    NotNull,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_slots_are_absent_until_filled() {
        let decl = VarDecl {
            name: "x".into(),
            initializer: None,
            target_name: None,
            span: Span::dummy(),
        };
        let json = serde_json::to_string(&decl).unwrap();
        assert!(!json.contains("target_name"));

        let annotated = VarDecl {
            target_name: Some("x_11".into()),
            ..decl
        };
        let json = serde_json::to_string(&annotated).unwrap();
        assert!(json.contains("\"target_name\":\"x_11\""));
    }

    #[test]
    fn parser_output_without_annotations_deserializes() {
        // A parser that knows nothing of analysis omits `scope` and
        // `target_name` entirely.
        let json = r#"{
            "stmts": [],
            "span": {"file": "", "start": {"line": 0, "column": 0, "offset": 0},
                     "end": {"line": 0, "column": 0, "offset": 0}}
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert!(block.scope.is_none());
    }
}
