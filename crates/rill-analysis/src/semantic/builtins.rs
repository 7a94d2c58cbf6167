use std::collections::HashMap;

use rill_common::{AnalysisConfig, SemanticError, Span};

use super::registry::Registry;
use super::symbol::SymbolKind;
use super::types::TypeTag;

/// Coarse parameter kind constraint for a builtin argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    Str,
    Num,
}

/// Which family a builtin belongs to. Core is always installed; the rest
/// follow the `[extensions]` flags in Rill.toml.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Core,
    Math,
    Str,
    Io,
}

/// One row of the builtin table: qualified name, arity, ordered parameter
/// kinds, return tag.
#[derive(Debug)]
pub struct BuiltinSpec {
    pub name: &'static str,
    pub arity: usize,
    pub params: &'static [ParamKind],
    pub returns: TypeTag,
    pub extension: Extension,
}

const TABLE: &[BuiltinSpec] = &[
    // -- Core --
    BuiltinSpec {
        name: "print",
        arity: 1,
        params: &[ParamKind::Any],
        returns: TypeTag::Void,
        extension: Extension::Core,
    },
    BuiltinSpec {
        name: "println",
        arity: 1,
        params: &[ParamKind::Any],
        returns: TypeTag::Void,
        extension: Extension::Core,
    },
    BuiltinSpec {
        name: "length",
        arity: 1,
        params: &[ParamKind::Str],
        returns: TypeTag::Int,
        extension: Extension::Core,
    },
    BuiltinSpec {
        name: "str",
        arity: 1,
        params: &[ParamKind::Any],
        returns: TypeTag::String,
        extension: Extension::Core,
    },
    BuiltinSpec {
        name: "num",
        arity: 1,
        params: &[ParamKind::Str],
        returns: TypeTag::Double,
        extension: Extension::Core,
    },
    BuiltinSpec {
        name: "clock",
        arity: 0,
        params: &[],
        returns: TypeTag::Double,
        extension: Extension::Core,
    },
    // -- Math --
    BuiltinSpec {
        name: "math:abs",
        arity: 1,
        params: &[ParamKind::Num],
        returns: TypeTag::Double,
        extension: Extension::Math,
    },
    BuiltinSpec {
        name: "math:sqrt",
        arity: 1,
        params: &[ParamKind::Num],
        returns: TypeTag::Double,
        extension: Extension::Math,
    },
    BuiltinSpec {
        name: "math:floor",
        arity: 1,
        params: &[ParamKind::Num],
        returns: TypeTag::Int,
        extension: Extension::Math,
    },
    BuiltinSpec {
        name: "math:ceil",
        arity: 1,
        params: &[ParamKind::Num],
        returns: TypeTag::Int,
        extension: Extension::Math,
    },
    BuiltinSpec {
        name: "math:pow",
        arity: 2,
        params: &[ParamKind::Num, ParamKind::Num],
        returns: TypeTag::Double,
        extension: Extension::Math,
    },
    BuiltinSpec {
        name: "math:random",
        arity: 0,
        params: &[],
        returns: TypeTag::Double,
        extension: Extension::Math,
    },
    // -- Strings --
    BuiltinSpec {
        name: "str:upper",
        arity: 1,
        params: &[ParamKind::Str],
        returns: TypeTag::String,
        extension: Extension::Str,
    },
    BuiltinSpec {
        name: "str:lower",
        arity: 1,
        params: &[ParamKind::Str],
        returns: TypeTag::String,
        extension: Extension::Str,
    },
    BuiltinSpec {
        name: "str:trim",
        arity: 1,
        params: &[ParamKind::Str],
        returns: TypeTag::String,
        extension: Extension::Str,
    },
    BuiltinSpec {
        name: "str:find",
        arity: 2,
        params: &[ParamKind::Str, ParamKind::Str],
        returns: TypeTag::Int,
        extension: Extension::Str,
    },
    BuiltinSpec {
        name: "str:substr",
        arity: 3,
        params: &[ParamKind::Str, ParamKind::Num, ParamKind::Num],
        returns: TypeTag::String,
        extension: Extension::Str,
    },
    // -- IO --
    BuiltinSpec {
        name: "io:read_line",
        arity: 0,
        params: &[],
        returns: TypeTag::String,
        extension: Extension::Io,
    },
    BuiltinSpec {
        name: "io:write",
        arity: 1,
        params: &[ParamKind::Any],
        returns: TypeTag::Void,
        extension: Extension::Io,
    },
];

/// The enabled builtin set for one analysis run.
#[derive(Debug)]
pub struct Builtins {
    enabled: HashMap<&'static str, &'static BuiltinSpec>,
}

impl Builtins {
    pub fn new(config: &AnalysisConfig) -> Self {
        let enabled = TABLE
            .iter()
            .filter(|spec| match spec.extension {
                Extension::Core => true,
                Extension::Math => config.extensions.math,
                Extension::Str => config.extensions.string,
                Extension::Io => config.extensions.io,
            })
            .map(|spec| (spec.name, spec))
            .collect();
        Self { enabled }
    }

    /// Seed the registry with the enabled builtin signatures. Must run
    /// before user headers are collected.
    pub fn install(&self, registry: &mut Registry) -> Result<(), SemanticError> {
        for spec in self.enabled.values() {
            registry.insert_callable(
                SymbolKind::Function,
                spec.name,
                spec.arity,
                "global",
                spec.returns,
                spec.name.to_string(),
                Span::dummy(),
            )?;
        }
        Ok(())
    }

    /// Whether `name` is an enabled builtin's fully-qualified name.
    pub fn is_builtin_qname(&self, name: &str) -> bool {
        self.enabled.contains_key(name)
    }

    /// Ordered coarse parameter kinds for an enabled builtin.
    pub fn param_spec(&self, name: &str) -> Option<&'static [ParamKind]> {
        self.enabled.get(name).map(|spec| spec.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_is_always_enabled() {
        let mut config = AnalysisConfig::default();
        config.extensions.math = false;
        config.extensions.string = false;
        config.extensions.io = false;
        let builtins = Builtins::new(&config);
        assert!(builtins.is_builtin_qname("length"));
        assert!(builtins.is_builtin_qname("print"));
        assert!(!builtins.is_builtin_qname("math:sqrt"));
        assert!(!builtins.is_builtin_qname("io:write"));
    }

    #[test]
    fn extensions_follow_config_flags() {
        let mut config = AnalysisConfig::default();
        config.extensions.io = true;
        let builtins = Builtins::new(&config);
        assert!(builtins.is_builtin_qname("math:sqrt"));
        assert!(builtins.is_builtin_qname("str:upper"));
        assert!(builtins.is_builtin_qname("io:read_line"));
    }

    #[test]
    fn param_specs_are_ordered() {
        let builtins = Builtins::new(&AnalysisConfig::default());
        assert_eq!(builtins.param_spec("length"), Some(&[ParamKind::Str][..]));
        assert_eq!(
            builtins.param_spec("str:substr"),
            Some(&[ParamKind::Str, ParamKind::Num, ParamKind::Num][..])
        );
    }

    #[test]
    fn install_seeds_signature_keys() {
        let builtins = Builtins::new(&AnalysisConfig::default());
        let mut registry = Registry::new();
        builtins.install(&mut registry).unwrap();
        assert!(registry.has("length#1"));
        assert!(registry.has("math:pow#2"));
        let entry = registry.find("length#1").unwrap();
        assert_eq!(entry.ty, TypeTag::Int);
        assert_eq!(entry.scope_path, "global");
    }

    #[test]
    fn table_arities_match_param_lists() {
        for spec in TABLE {
            assert_eq!(spec.arity, spec.params.len(), "{}", spec.name);
        }
    }
}
