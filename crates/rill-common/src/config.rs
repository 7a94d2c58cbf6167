use std::path::{Path, PathBuf};

use serde::Deserialize;

/// The parsed Rill.toml manifest, controlling which builtin extensions the
/// analyzer installs and the resource limits it enforces.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub project: Option<ProjectSection>,
    pub extensions: ExtensionFlags,
    pub limits: Limits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Which optional builtin families are enabled. Core builtins are always on.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionFlags {
    #[serde(default = "default_true")]
    pub math: bool,
    #[serde(default = "default_true")]
    pub string: bool,
    #[serde(default)]
    pub io: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExtensionFlags {
    fn default() -> Self {
        Self {
            math: true,
            string: true,
            io: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    #[serde(default = "default_max_scope_depth")]
    pub max_scope_depth: usize,
}

fn default_max_scope_depth() -> usize {
    64
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_scope_depth: default_max_scope_depth(),
        }
    }
}

/// Raw TOML structure for deserialization.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    project: Option<ProjectSection>,
    #[serde(default)]
    extensions: Option<ExtensionFlags>,
    #[serde(default)]
    limits: Option<Limits>,
}

/// Errors that can occur when loading a Rill.toml manifest.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read Rill.toml: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid Rill.toml: {0}")]
    ParseError(String),
    #[error("invalid Rill.toml: max_scope_depth must be at least 1")]
    ZeroScopeDepth,
}

/// Walk up from `start_dir` looking for `Rill.toml`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join("Rill.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load and validate a Rill.toml manifest from a file path.
pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate a Rill.toml manifest from a string.
pub fn parse_config(content: &str) -> Result<AnalysisConfig, ConfigError> {
    let raw: RawConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let config = AnalysisConfig {
        project: raw.project,
        extensions: raw.extensions.unwrap_or_default(),
        limits: raw.limits.unwrap_or_default(),
    };

    if config.limits.max_scope_depth == 0 {
        return Err(ConfigError::ZeroScopeDepth);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_uses_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.extensions.math);
        assert!(config.extensions.string);
        assert!(!config.extensions.io);
        assert_eq!(config.limits.max_scope_depth, 64);
    }

    #[test]
    fn full_manifest() {
        let config = parse_config(
            r#"
            [project]
            name = "demo"
            version = "0.1.0"

            [extensions]
            math = false
            io = true

            [limits]
            max_scope_depth = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.project.unwrap().name, "demo");
        assert!(!config.extensions.math);
        assert!(config.extensions.string);
        assert!(config.extensions.io);
        assert_eq!(config.limits.max_scope_depth, 16);
    }

    #[test]
    fn zero_depth_rejected() {
        let err = parse_config("[limits]\nmax_scope_depth = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroScopeDepth));
    }

    #[test]
    fn bad_toml_rejected() {
        assert!(matches!(
            parse_config("[extensions\nmath = true"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
