//! Squawk Compiler Library
//!
//! Compiles Squawk source text to pseudo-assembly through four
//! representations:
//!
//! ```text
//! source --lexer--> tokens --parser--> AST --fir--> functional IR
//!        --transform--> imperative IR --codegen--> text
//! ```
//!
//! The library performs no I/O of its own except in [`compile_file`], and
//! never prints or exits; failures are returned as [`CompileError`].
//!
//! ```rust,ignore
//! use squawkc::{CompilerConfig, compile_to_asm_with_config};
//!
//! let config = CompilerConfig::new().with_verify_ir(true);
//! let asm = compile_to_asm_with_config("fn id(x: Int) -> Int = x", &config)?;
//! ```

pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod fir;
pub mod imperative;
pub mod lexer;
pub mod parser;
pub mod transform;
pub mod validate;

pub use ast::Program;
pub use config::CompilerConfig;
pub use error::{CompileError, LexError, ParseError};
pub use imperative::{ImperativeFunction, ImperativeProgram, Instruction, Value};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::Parser;
pub use transform::transform;

use std::fs;
use std::path::Path;
use tracing::debug;

/// Tokenize and parse source text into an AST
pub fn parse_source(source: &str, config: &CompilerConfig) -> Result<Program, CompileError> {
    config.validate()?;

    let tokens = tokenize(source)?;
    debug!(tokens = tokens.len(), "tokenized source");

    let program = Parser::with_max_depth(&tokens, config.max_nesting_depth)
        .with_max_expression_depth(config.max_expression_depth)
        .parse()?;
    debug!(functions = program.functions.len(), "parsed program");

    Ok(program)
}

/// Lower a parsed program to imperative IR, verifying it when configured
pub fn lower_program(
    program: &Program,
    config: &CompilerConfig,
) -> Result<ImperativeProgram, CompileError> {
    let fir = fir::from_ast(program);
    let ir = transform(&fir);
    debug!(
        functions = ir.functions.len(),
        instructions = ir.instruction_count(),
        "transformed to imperative IR"
    );

    if config.verify_ir {
        validate::validate_program(&ir).map_err(CompileError::Invalid)?;
        debug!("imperative IR verified");
    }

    Ok(ir)
}

/// Compile source string to imperative IR
pub fn compile_to_ir(source: &str) -> Result<ImperativeProgram, CompileError> {
    compile_to_ir_with_config(source, &CompilerConfig::default())
}

/// Compile source string to imperative IR with custom configuration
pub fn compile_to_ir_with_config(
    source: &str,
    config: &CompilerConfig,
) -> Result<ImperativeProgram, CompileError> {
    let program = parse_source(source, config)?;
    lower_program(&program, config)
}

/// Compile source string to pseudo-assembly text
pub fn compile_to_asm(source: &str) -> Result<String, CompileError> {
    compile_to_asm_with_config(source, &CompilerConfig::default())
}

/// Compile source string to pseudo-assembly text with custom configuration
pub fn compile_to_asm_with_config(
    source: &str,
    config: &CompilerConfig,
) -> Result<String, CompileError> {
    let ir = compile_to_ir_with_config(source, config)?;
    let output = codegen::render_program(&ir, config);
    debug!(lines = output.lines().count(), "rendered output");
    Ok(output)
}

/// Compile a source file, writing pseudo-assembly to `output_path`
pub fn compile_file(
    source_path: &Path,
    output_path: &Path,
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    let source = fs::read_to_string(source_path).map_err(|e| CompileError::Io {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let output = compile_to_asm_with_config(&source, config)?;

    fs::write(output_path, output).map_err(|e| CompileError::Io {
        path: output_path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_to_asm_identity() {
        let asm = compile_to_asm("fn identity(x: Int) -> Int = x").unwrap();
        assert!(asm.contains("function identity(x):"));
        assert!(asm.contains("    mov t0, x"));
        assert!(asm.contains("    ret t0"));
    }

    #[test]
    fn test_lex_error_surfaces() {
        let err = compile_to_ir("fn f() -> Int = 1 $ 2").unwrap_err();
        assert_eq!(err.kind(), "lex");
        assert_eq!(err.position(), Some((1, 19)));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = compile_to_ir("fn f(x: Int) -> Int = (x + 1").unwrap_err();
        assert!(matches!(err, CompileError::Parse(ParseError::Unexpected { .. })));
    }

    #[test]
    fn test_verify_ir_accepts_lowered_output() {
        let config = CompilerConfig::new().with_verify_ir(true);
        let source = "fn f(a: Int) -> Int = let b = if a > 0 then a else 0 - a in b * g(b, true)";
        assert!(compile_to_ir_with_config(source, &config).is_ok());
    }

    #[test]
    fn test_configured_nesting_limit() {
        let config = CompilerConfig::new().with_max_nesting_depth(4);
        let err = compile_to_ir_with_config("fn f() -> Int = ((((1))))", &config).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Parse(ParseError::NestingTooDeep { limit: 4, .. })
        ));
    }

    #[test]
    fn test_long_operator_chain_with_default_config() {
        let source = format!("fn f(x: Int) -> Int = x{}", " + 1".repeat(300));
        let ir = compile_to_ir(&source).unwrap();
        assert_eq!(
            ir.functions[0].instructions.last(),
            Some(&Instruction::Return(Value::var("t0")))
        );

        let deeper = format!("fn f(x: Int) -> Int = x{}", " + 1".repeat(5000));
        let err = compile_to_ir(&deeper).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Parse(ParseError::ExpressionTooDeep { limit: 4096, .. })
        ));
    }

    #[test]
    fn test_zero_depth_from_builder_is_rejected() {
        let config = CompilerConfig::new().with_max_nesting_depth(0);
        let err = compile_to_ir_with_config("fn f() -> Int = 1", &config).unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}
