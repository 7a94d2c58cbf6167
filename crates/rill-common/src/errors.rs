use thiserror::Error;

use crate::span::Span;

/// A semantic-analysis failure.
///
/// Analysis is fail-fast: the first error anywhere aborts the walk and
/// propagates unchanged to the entry point. Each variant maps to a stable
/// positive exit code via [`SemanticError::code`].
#[derive(Debug, Clone, Error)]
pub enum SemanticError {
    /// Missing/malformed `main`, use of an undefined name, or a read of a
    /// setter-only property.
    #[error("definition error: {message}")]
    Definition { message: String, span: Span },

    /// Duplicate signature or accessor within one class, or a local
    /// redeclared within one block.
    #[error("redefinition error: {message}")]
    Redefinition { message: String, span: Span },

    /// Call arity mismatch, or a literal argument whose coarse kind does not
    /// match a builtin's parameter table.
    #[error("argument count error: {message}")]
    ArgumentCount { message: String, span: Span },

    /// Illegal operator/operand combination, or a malformed `is` right side.
    #[error("expression type error: {message}")]
    ExpressionType { message: String, span: Span },

    /// `break`/`continue` outside a loop, `return` outside a function.
    #[error("flow control error: {message}")]
    FlowControl { message: String, span: Span },

    /// Table overflow, scope-stack underflow, depth overflow, or a missing
    /// scope annotation. Always fatal.
    #[error("internal error: {message}")]
    Internal { message: String, span: Span },
}

impl SemanticError {
    pub fn definition(message: impl Into<String>, span: Span) -> Self {
        Self::Definition {
            message: message.into(),
            span,
        }
    }

    pub fn redefinition(message: impl Into<String>, span: Span) -> Self {
        Self::Redefinition {
            message: message.into(),
            span,
        }
    }

    pub fn argument_count(message: impl Into<String>, span: Span) -> Self {
        Self::ArgumentCount {
            message: message.into(),
            span,
        }
    }

    pub fn expression_type(message: impl Into<String>, span: Span) -> Self {
        Self::ExpressionType {
            message: message.into(),
            span,
        }
    }

    pub fn flow_control(message: impl Into<String>, span: Span) -> Self {
        Self::FlowControl {
            message: message.into(),
            span,
        }
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::Internal {
            message: message.into(),
            span,
        }
    }

    /// Stable positive exit code for this error kind.
    pub fn code(&self) -> i32 {
        match self {
            Self::Definition { .. } => 1,
            Self::Redefinition { .. } => 2,
            Self::ArgumentCount { .. } => 3,
            Self::ExpressionType { .. } => 4,
            Self::FlowControl { .. } => 5,
            Self::Internal { .. } => 6,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Self::Definition { span, .. }
            | Self::Redefinition { span, .. }
            | Self::ArgumentCount { span, .. }
            | Self::ExpressionType { span, .. }
            | Self::FlowControl { span, .. }
            | Self::Internal { span, .. } => span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Definition { message, .. }
            | Self::Redefinition { message, .. }
            | Self::ArgumentCount { message, .. }
            | Self::ExpressionType { message, .. }
            | Self::FlowControl { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}
