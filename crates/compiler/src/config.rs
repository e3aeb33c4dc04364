//! Compiler configuration
//!
//! Settings can be built in code with the `with_*` builders or loaded from
//! a TOML file:
//!
//! ```toml
//! [compiler]
//! max_nesting_depth = 128
//! max_expression_depth = 4096
//! emit_header = false
//! verify_ir = true
//! indent = "  "
//! ```
//!
//! Every key is optional; missing keys keep their defaults. Both depth
//! limits must be at least 1. Configurations built in code are checked when
//! compilation starts.

use crate::error::CompileError;
use crate::parser::{DEFAULT_MAX_EXPRESSION_DEPTH, DEFAULT_MAX_NESTING_DEPTH};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Bound on nested constructs (parentheses, `if`, `let`, call
    /// arguments), which bounds parser recursion
    pub max_nesting_depth: usize,

    /// Bound on expression tree height, counting each operator of a flat
    /// chain. Lowering recurses over the tree, so this bounds its stack use.
    pub max_expression_depth: usize,

    /// Print the comment banner at the top of rendered output
    pub emit_header: bool,

    /// Run the IR verifier on the lowered program
    pub verify_ir: bool,

    /// Indentation of instructions in rendered output
    pub indent: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
            emit_header: true,
            verify_ir: false,
            indent: "    ".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    compiler: CompilerConfig,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }

    pub fn with_header(mut self, emit: bool) -> Self {
        self.emit_header = emit;
        self
    }

    pub fn with_verify_ir(mut self, verify: bool) -> Self {
        self.verify_ir = verify;
        self
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, CompileError> {
        let file: ConfigFile = toml::from_str(toml_str)
            .map_err(|e| CompileError::Config(format!("Failed to parse config: {}", e)))?;
        let config = file.compiler;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which no program could compile
    pub fn validate(&self) -> Result<(), CompileError> {
        for (key, value) in [
            ("max_nesting_depth", self.max_nesting_depth),
            ("max_expression_depth", self.max_expression_depth),
        ] {
            if value == 0 {
                return Err(CompileError::Config(format!("{} must be at least 1", key)));
            }
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| CompileError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
        assert_eq!(config.max_expression_depth, DEFAULT_MAX_EXPRESSION_DEPTH);
        assert!(config.emit_header);
        assert!(!config.verify_ir);
        assert_eq!(config.indent, "    ");
    }

    #[test]
    fn test_config_builder() {
        let config = CompilerConfig::new()
            .with_max_nesting_depth(16)
            .with_header(false)
            .with_verify_ir(true)
            .with_indent("\t");

        assert_eq!(config.max_nesting_depth, 16);
        assert!(!config.emit_header);
        assert!(config.verify_ir);
        assert_eq!(config.indent, "\t");
    }

    #[test]
    fn test_from_toml_partial() {
        let config = CompilerConfig::from_toml("[compiler]\nverify_ir = true\n").unwrap();
        assert!(config.verify_ir);
        assert!(config.emit_header);
        assert_eq!(config.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_from_toml_empty() {
        assert_eq!(
            CompilerConfig::from_toml("").unwrap(),
            CompilerConfig::default()
        );
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = CompilerConfig::from_toml("[compiler]\noptimize = true\n").unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
    }

    #[test]
    fn test_from_toml_rejects_zero_depth() {
        let err = CompilerConfig::from_toml("[compiler]\nmax_nesting_depth = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_nesting_depth"));

        let err =
            CompilerConfig::from_toml("[compiler]\nmax_expression_depth = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_expression_depth"));
    }

    #[test]
    fn test_validate_builder_config() {
        assert!(CompilerConfig::default().validate().is_ok());

        let err = CompilerConfig::new()
            .with_max_nesting_depth(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
        assert!(err.to_string().contains("max_nesting_depth"));

        let err = CompilerConfig::new()
            .with_max_expression_depth(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_expression_depth"));
    }
}
