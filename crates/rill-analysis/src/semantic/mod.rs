pub mod builtins;
pub mod globals;
pub mod registry;
pub mod scope;
pub mod symbol;
pub mod type_rules;
pub mod types;

mod pass1;
mod pass2;

#[cfg(test)]
pub(crate) mod testutil;

use rill_common::{AnalysisConfig, SemanticError};

use crate::ast::nodes::Program;

pub use globals::GlobalBinding;
pub use types::TypeTag;

/// Everything one analysis run owns: the scope frames, the signature
/// registry, the enabled builtins, and the `$`-global registry. Dropped as
/// a unit on the first error; the global registry is moved out on success.
pub(crate) struct Context {
    pub scopes: scope::ScopeStack,
    pub registry: registry::Registry,
    pub builtins: builtins::Builtins,
    pub globals: globals::GlobalRegistry,
}

impl Context {
    pub(crate) fn new(config: &AnalysisConfig) -> Self {
        Self {
            scopes: scope::ScopeStack::new(config.limits.max_scope_depth),
            registry: registry::Registry::new(),
            builtins: builtins::Builtins::new(config),
            globals: globals::GlobalRegistry::new(),
        }
    }
}

/// Output of a successful analysis. The AST itself now carries scope
/// annotations and codegen names; this adds what lives outside the tree.
#[derive(Debug)]
pub struct Analysis {
    /// Deduplicated `$`-globals, in first-seen order, with learned tags.
    pub globals: Vec<GlobalBinding>,
}

/// Run semantic analysis over a parsed program.
///
/// Two passes over the same tree: the declaration pass collects callable
/// signatures and populates scope frames, the resolution pass resolves
/// names and infers types through the recorded frames. The first error
/// aborts the walk and is returned unchanged.
pub fn analyze(
    program: &mut Program,
    config: &AnalysisConfig,
) -> Result<Analysis, SemanticError> {
    let mut ctx = Context::new(config);
    ctx.globals.reset();
    ctx.builtins.install(&mut ctx.registry)?;
    pass1::run(&mut ctx, program)?;
    pass2::run(&mut ctx, program)?;
    Ok(Analysis {
        globals: ctx.globals.into_bindings(),
    })
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use crate::ast::nodes::{BinaryOp, Literal, Stmt, UnaryOp};

    fn analyze_main(stmts: Vec<Stmt>) -> Result<Analysis, SemanticError> {
        let mut program = main_program(stmts);
        analyze(&mut program, &AnalysisConfig::default())
    }

    // -- main() gate --

    #[test]
    fn missing_main_is_rejected() {
        let mut program = program(vec![class("Main", vec![func("helper", &[], vec![])])]);
        let err = analyze(&mut program, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SemanticError::Definition { .. }));
    }

    #[test]
    fn main_with_parameters_is_rejected() {
        let mut program = program(vec![class("Main", vec![func("main", &["p"], vec![])])]);
        let err = analyze(&mut program, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SemanticError::Definition { .. }));
    }

    #[test]
    fn zero_arity_main_is_accepted() {
        assert!(analyze_main(vec![]).is_ok());
    }

    // -- Literal-only arithmetic --

    #[test]
    fn literal_numeric_addition_passes() {
        let result = analyze_main(vec![expr_stmt(bin(lit_int(3), BinaryOp::Add, lit_int(4)))]);
        assert!(result.is_ok());
    }

    #[test]
    fn literal_double_widening_and_null_equality_pass() {
        let result = analyze_main(vec![
            expr_stmt(bin(lit_int(1), BinaryOp::Add, lit_double(2.5))),
            expr_stmt(bin(lit_null(), BinaryOp::Eq, lit_int(1))),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn literal_string_plus_number_fails() {
        let err = analyze_main(vec![expr_stmt(bin(lit_str("a"), BinaryOp::Add, lit_int(3)))])
            .unwrap_err();
        assert!(matches!(err, SemanticError::ExpressionType { .. }));
    }

    #[test]
    fn literal_string_repetition_requires_left_string() {
        // "ab" * 3 passes the literal fast check.
        assert!(
            analyze_main(vec![expr_stmt(bin(lit_str("ab"), BinaryOp::Mul, lit_int(3)))]).is_ok()
        );
        // 3 * "ab" fails it: the literal rule wants the string on the left.
        let err = analyze_main(vec![expr_stmt(bin(lit_int(3), BinaryOp::Mul, lit_str("ab")))])
            .unwrap_err();
        assert!(matches!(err, SemanticError::ExpressionType { .. }));
    }

    #[test]
    fn inferred_repetition_accepts_either_order() {
        // Through variables the literal fast path defers, and the inferred
        // rule accepts (Int, String) too.
        let result = analyze_main(vec![
            var_init("n", lit_int(3)),
            var_init("s", lit_str("ab")),
            expr_stmt(bin(ident("n"), BinaryOp::Mul, ident("s"))),
        ]);
        assert!(result.is_ok());
    }

    // -- Flow control --

    #[test]
    fn break_outside_loop_fails() {
        let err = analyze_main(vec![brk()]).unwrap_err();
        assert!(matches!(err, SemanticError::FlowControl { .. }));
    }

    #[test]
    fn break_inside_while_passes() {
        let result = analyze_main(vec![while_stmt(lit_bool(true), vec![brk()])]);
        assert!(result.is_ok());
    }

    #[test]
    fn loop_counter_restores_after_nested_loops() {
        // Two nested loops unwind cleanly...
        let nested = while_stmt(
            lit_bool(true),
            vec![while_stmt(lit_bool(true), vec![brk(), cont()])],
        );
        assert!(analyze_main(vec![nested.clone()]).is_ok());
        // ...so a break after both exits still sees zero enclosing loops.
        let err = analyze_main(vec![nested, brk()]).unwrap_err();
        assert!(matches!(err, SemanticError::FlowControl { .. }));
    }

    #[test]
    fn return_outside_function_fails() {
        let mut prog = program(vec![class("Main", vec![func("main", &[], vec![]), ret(None)])]);
        let err = analyze(&mut prog, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SemanticError::FlowControl { .. }));
    }

    // -- Shadowing and learned types --

    #[test]
    fn shadowed_variable_types_independently() {
        // main() { var x; x = 1; if (x < 2) { var x; x = "s"; } }
        let mut prog = main_program(vec![
            var("x"),
            assign("x", lit_int(1)),
            if_stmt(
                bin(ident("x"), BinaryOp::Lt, lit_int(2)),
                vec![var("x"), assign("x", lit_str("s"))],
            ),
        ]);

        let config = AnalysisConfig::default();
        let mut ctx = Context::new(&config);
        ctx.builtins.install(&mut ctx.registry).unwrap();
        pass1::run(&mut ctx, &mut prog).unwrap();
        pass2::run(&mut ctx, &mut prog).unwrap();

        // Frame 0: class root "1"; frame 1: main's merged frame "1.1";
        // frame 2: the if-branch "1.1.1".
        let outer = ctx.scopes.frame(1).unwrap();
        assert_eq!(outer.path, "1.1");
        assert_eq!(outer.table.find("x").unwrap().ty, TypeTag::Int);
        let inner = ctx.scopes.frame(2).unwrap();
        assert_eq!(inner.path, "1.1.1");
        assert_eq!(inner.table.find("x").unwrap().ty, TypeTag::String);
    }

    #[test]
    fn conflicting_assignments_degrade_to_unknown() {
        let mut prog = main_program(vec![
            var_init("x", lit_int(1)),
            assign("x", lit_str("s")),
        ]);
        let config = AnalysisConfig::default();
        let mut ctx = Context::new(&config);
        ctx.builtins.install(&mut ctx.registry).unwrap();
        pass1::run(&mut ctx, &mut prog).unwrap();
        pass2::run(&mut ctx, &mut prog).unwrap();
        let frame = ctx.scopes.frame(1).unwrap();
        assert_eq!(frame.table.find("x").unwrap().ty, TypeTag::Unknown);
    }

    // -- Redeclaration --

    #[test]
    fn redeclaring_in_same_block_fails() {
        let err = analyze_main(vec![var("x"), var("x")]).unwrap_err();
        assert!(matches!(err, SemanticError::Redefinition { .. }));
    }

    #[test]
    fn shadowing_parent_declaration_succeeds() {
        let result = analyze_main(vec![var("x"), block_stmt(vec![var("x")])]);
        assert!(result.is_ok());
    }

    // -- Overloads --

    #[test]
    fn duplicate_overload_in_one_class_fails() {
        let mut prog = program(vec![class(
            "A",
            vec![
                func("main", &[], vec![]),
                func("f", &["a", "b"], vec![]),
                func("f", &["x", "y"], vec![]),
            ],
        )]);
        let err = analyze(&mut prog, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SemanticError::Redefinition { .. }));
    }

    #[test]
    fn same_signature_across_classes_passes() {
        let mut prog = program(vec![
            class("A", vec![func("main", &[], vec![]), func("f", &["a", "b"], vec![])]),
            class("B", vec![func("f", &["a", "b"], vec![])]),
        ]);
        assert!(analyze(&mut prog, &AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn arity_overloads_resolve_by_argument_count() {
        let mut prog = program(vec![class(
            "A",
            vec![
                func("f", &["a"], vec![]),
                func("f", &["a", "b"], vec![]),
                func(
                    "main",
                    &[],
                    vec![
                        expr_stmt(call("f", vec![lit_int(1)])),
                        expr_stmt(call("f", vec![lit_int(1), lit_int(2)])),
                    ],
                ),
            ],
        )]);
        assert!(analyze(&mut prog, &AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn known_name_wrong_arity_is_argument_count_error() {
        let mut prog = program(vec![class(
            "A",
            vec![
                func("f", &["a"], vec![]),
                func("main", &[], vec![expr_stmt(call("f", vec![]))]),
            ],
        )]);
        let err = analyze(&mut prog, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SemanticError::ArgumentCount { .. }));
    }

    #[test]
    fn unknown_function_is_definition_error() {
        let err = analyze_main(vec![expr_stmt(call("nope", vec![]))]).unwrap_err();
        assert!(matches!(err, SemanticError::Definition { .. }));
    }

    // -- Builtins --

    #[test]
    fn builtin_literal_kind_mismatch() {
        // length takes a string; a numeric literal is rejected up front.
        let err = analyze_main(vec![expr_stmt(call("length", vec![lit_int(5)]))]).unwrap_err();
        assert!(matches!(err, SemanticError::ArgumentCount { .. }));
    }

    #[test]
    fn builtin_exact_call_passes_and_types() {
        let result = analyze_main(vec![
            var_init("n", call("length", vec![lit_str("abc")])),
            expr_stmt(bin(ident("n"), BinaryOp::Add, lit_int(1))),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn builtin_wrong_arity_fails() {
        let err = analyze_main(vec![expr_stmt(call(
            "length",
            vec![lit_str("a"), lit_str("b")],
        ))])
        .unwrap_err();
        assert!(matches!(err, SemanticError::ArgumentCount { .. }));
    }

    #[test]
    fn builtin_non_literal_argument_defers() {
        let result = analyze_main(vec![
            var("x"),
            expr_stmt(call("length", vec![ident("x")])),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn disabled_extension_builtin_is_undefined() {
        let mut config = AnalysisConfig::default();
        config.extensions.math = false;
        let mut prog = main_program(vec![expr_stmt(call("math:sqrt", vec![lit_int(2)]))]);
        let err = analyze(&mut prog, &config).unwrap_err();
        assert!(matches!(err, SemanticError::Definition { .. }));
    }

    // -- Accessors --

    #[test]
    fn setter_only_property_write_ok_read_fails() {
        let class_stmts = vec![
            var("backing"),
            setter("p", "value", vec![assign("backing", ident("value"))]),
            func("main", &[], vec![assign("p", lit_int(5))]),
        ];
        assert!(analyze(&mut program(vec![class("A", class_stmts.clone())]), &AnalysisConfig::default()).is_ok());

        let mut with_read = program(vec![class(
            "A",
            vec![
                var("backing"),
                setter("p", "value", vec![assign("backing", ident("value"))]),
                func("main", &[], vec![var_init("x", ident("p"))]),
            ],
        )]);
        let err = analyze(&mut with_read, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SemanticError::Definition { .. }));
    }

    #[test]
    fn getter_read_resolves() {
        let mut prog = program(vec![class(
            "A",
            vec![
                getter("p", vec![ret(Some(lit_int(1)))]),
                func("main", &[], vec![var_init("x", ident("p"))]),
            ],
        )]);
        assert!(analyze(&mut prog, &AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn duplicate_getter_in_class_fails() {
        let mut prog = program(vec![class(
            "A",
            vec![
                getter("p", vec![]),
                getter("p", vec![]),
                func("main", &[], vec![]),
            ],
        )]);
        let err = analyze(&mut prog, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SemanticError::Redefinition { .. }));
    }

    // -- Assignment targets --

    #[test]
    fn assignment_to_undefined_name_fails() {
        let err = analyze_main(vec![assign("nope", lit_int(1))]).unwrap_err();
        assert!(matches!(err, SemanticError::Definition { .. }));
    }

    #[test]
    fn assignment_to_constant_fails() {
        let err = analyze_main(vec![
            const_decl("limit", Literal::Int(10)),
            assign("limit", lit_int(20)),
        ])
        .unwrap_err();
        assert!(matches!(err, SemanticError::Definition { .. }));
    }

    // -- Globals --

    #[test]
    fn global_names_bypass_scoping_and_learn_types() {
        let analysis = analyze_main(vec![
            assign("$count", lit_int(1)),
            var_init("x", ident("$count")),
            expr_stmt(bin(ident("x"), BinaryOp::Add, lit_int(1))),
            assign("$count", ident("x")),
        ])
        .unwrap();
        assert_eq!(analysis.globals.len(), 1);
        assert_eq!(analysis.globals[0].name, "$count");
        assert_eq!(analysis.globals[0].ty, TypeTag::Int);
    }

    #[test]
    fn undefined_plain_identifier_fails() {
        let err = analyze_main(vec![var_init("x", ident("mystery"))]).unwrap_err();
        assert!(matches!(err, SemanticError::Definition { .. }));
    }

    // -- Type tests and operators --

    #[test]
    fn is_accepts_only_literal_type_names() {
        assert!(analyze_main(vec![
            var("x"),
            expr_stmt(type_test(ident("x"), "Num")),
            expr_stmt(type_test(ident("x"), "String")),
            expr_stmt(type_test(ident("x"), "Null")),
        ])
        .is_ok());

        let err = analyze_main(vec![var("x"), expr_stmt(type_test(ident("x"), "Bool"))])
            .unwrap_err();
        assert!(matches!(err, SemanticError::ExpressionType { .. }));
    }

    #[test]
    fn ternary_result_stays_unknown() {
        // x adopts nothing from a ternary, so the later mixed-type use is
        // skipped rather than rejected.
        let result = analyze_main(vec![
            var_init("x", ternary(lit_bool(true), lit_int(1), lit_str("s"))),
            expr_stmt(bin(ident("x"), BinaryOp::Add, lit_int(1))),
            expr_stmt(bin(ident("x"), BinaryOp::Add, lit_str("t"))),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn not_and_not_null_produce_bool() {
        let result = analyze_main(vec![
            var_init("x", lit_int(1)),
            var_init("b", unary(UnaryOp::Not, lit_bool(false))),
            expr_stmt(bin(
                unary(UnaryOp::NotNull, ident("x")),
                BinaryOp::And,
                ident("b"),
            )),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn typed_variables_reject_illegal_operators() {
        let err = analyze_main(vec![
            var_init("s", lit_str("a")),
            var_init("n", lit_int(1)),
            expr_stmt(bin(ident("s"), BinaryOp::Sub, ident("n"))),
        ])
        .unwrap_err();
        assert!(matches!(err, SemanticError::ExpressionType { .. }));
    }

    #[test]
    fn equality_is_always_legal() {
        let result = analyze_main(vec![
            var_init("s", lit_str("a")),
            var_init("n", lit_int(1)),
            expr_stmt(bin(ident("s"), BinaryOp::Eq, ident("n"))),
        ]);
        assert!(result.is_ok());
    }

    // -- Codegen names --

    #[test]
    fn declarations_and_references_share_codegen_names() {
        let mut prog = main_program(vec![
            var("x"),
            assign("x", lit_int(1)),
            var_init("y", ident("x")),
        ]);
        analyze(&mut prog, &AnalysisConfig::default()).unwrap();

        let body = &prog.classes[0].body;
        let Stmt::Func(main_fn) = &body.stmts[0] else {
            panic!("expected main");
        };
        // main's merged frame has path "1.1".
        let Stmt::Var(x_decl) = &main_fn.body.stmts[0] else {
            panic!("expected var");
        };
        assert_eq!(x_decl.target_name.as_deref(), Some("x_11"));
        let Stmt::Assign(x_assign) = &main_fn.body.stmts[1] else {
            panic!("expected assign");
        };
        assert_eq!(x_assign.target_name.as_deref(), Some("x_11"));
        let Stmt::Var(y_decl) = &main_fn.body.stmts[2] else {
            panic!("expected var");
        };
        let Some(crate::ast::nodes::Expr {
            kind: crate::ast::nodes::ExprKind::Identifier { target_name, .. },
            ..
        }) = &y_decl.initializer
        else {
            panic!("expected identifier initializer");
        };
        assert_eq!(target_name.as_deref(), Some("x_11"));
    }

    #[test]
    fn parameters_get_frame_scoped_names() {
        let mut prog = program(vec![class(
            "A",
            vec![
                func("main", &[], vec![]),
                func("f", &["a"], vec![var_init("b", ident("a"))]),
            ],
        )]);
        analyze(&mut prog, &AnalysisConfig::default()).unwrap();
        let body = &prog.classes[0].body;
        let Stmt::Func(f) = &body.stmts[1] else {
            panic!("expected f");
        };
        // f's merged frame is the second child of the class root.
        assert_eq!(f.params[0].target_name.as_deref(), Some("a_12"));
        assert_eq!(f.target_name.as_deref(), Some("f_1"));
    }

    #[test]
    fn call_sites_copy_registry_names() {
        let mut prog = program(vec![class(
            "A",
            vec![
                func("f", &["a", "b"], vec![]),
                func(
                    "main",
                    &[],
                    vec![expr_stmt(call("f", vec![lit_int(1), lit_int(2)]))],
                ),
            ],
        )]);
        analyze(&mut prog, &AnalysisConfig::default()).unwrap();
        let body = &prog.classes[0].body;
        let Stmt::Func(main_fn) = &body.stmts[1] else {
            panic!("expected main");
        };
        let Stmt::Expr(e) = &main_fn.body.stmts[0] else {
            panic!("expected expr stmt");
        };
        let crate::ast::nodes::ExprKind::Call { target_name, .. } = &e.expr.kind else {
            panic!("expected call");
        };
        assert_eq!(target_name.as_deref(), Some("f_2"));
    }

    // -- Depth limit --

    #[test]
    fn scope_depth_limit_is_fatal() {
        let mut config = AnalysisConfig::default();
        config.limits.max_scope_depth = 3;
        // class root + merged main frame + two nested blocks = 4 deep.
        let mut prog = main_program(vec![block_stmt(vec![block_stmt(vec![])])]);
        let err = analyze(&mut prog, &config).unwrap_err();
        assert!(matches!(err, SemanticError::Internal { .. }));
    }

    // -- Nested functions stay callable-locally only --

    #[test]
    fn function_bodies_are_skipped_by_header_collection() {
        // g is declared inside f's body, so it never reaches the registry
        // and calling it from main is an undefined-function error.
        let mut prog = program(vec![class(
            "A",
            vec![
                func("f", &[], vec![func("g", &[], vec![])]),
                func("main", &[], vec![expr_stmt(call("g", vec![]))]),
            ],
        )]);
        let err = analyze(&mut prog, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SemanticError::Definition { .. }));
    }
}
