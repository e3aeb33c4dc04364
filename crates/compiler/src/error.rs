//! Compiler error types.
//!
//! Lexing and parsing failures are fatal to the current compilation: the
//! first error stops the pipeline and no partial result is returned.
//! Lowering has no user-facing failure mode.

use crate::validate::Violation;
use std::path::PathBuf;

/// Error raised by the tokenizer.
///
/// Positions are 1-indexed, matching what a user sees in an editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character that matches no token rule
    UnexpectedChar { ch: char, line: usize, column: usize },
    /// An integer literal that does not fit in an `i64`
    IntegerOverflow {
        literal: String,
        line: usize,
        column: usize,
    },
}

impl LexError {
    pub fn position(&self) -> (usize, usize) {
        match self {
            LexError::UnexpectedChar { line, column, .. }
            | LexError::IntegerOverflow { line, column, .. } => (*line, *column),
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::UnexpectedChar { ch, line, column } => write!(
                f,
                "Lexer error at line {}, column {}: unexpected character {:?}",
                line, column, ch
            ),
            LexError::IntegerOverflow {
                literal,
                line,
                column,
            } => write!(
                f,
                "Lexer error at line {}, column {}: integer literal {} is out of range",
                line, column, literal
            ),
        }
    }
}

impl std::error::Error for LexError {}

/// Error raised by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An expected grammar construct was not found at the current token.
    ///
    /// `found` describes the actual token, or is `end of input`.
    Unexpected {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    /// Nested constructs exceeded the configured limit
    NestingTooDeep {
        limit: usize,
        line: usize,
        column: usize,
    },
    /// An expression tree grew taller than the configured limit
    ExpressionTooDeep {
        limit: usize,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub fn position(&self) -> (usize, usize) {
        match self {
            ParseError::Unexpected { line, column, .. }
            | ParseError::NestingTooDeep { line, column, .. }
            | ParseError::ExpressionTooDeep { line, column, .. } => (*line, *column),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Unexpected {
                expected,
                found,
                line,
                column,
            } => write!(
                f,
                "Parser error at line {}, column {}: expected {}, found {}",
                line, column, expected, found
            ),
            ParseError::NestingTooDeep {
                limit,
                line,
                column,
            } => write!(
                f,
                "Parser error at line {}, column {}: expression nesting exceeds maximum depth of {}",
                line, column, limit
            ),
            ParseError::ExpressionTooDeep {
                limit,
                line,
                column,
            } => write!(
                f,
                "Parser error at line {}, column {}: expression exceeds maximum depth of {}",
                line, column, limit
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Any failure surfaced by the compilation pipeline.
#[derive(Debug)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    /// The lowered program broke an IR invariant (only checked when
    /// `CompilerConfig::verify_ir` is set)
    Invalid(Vec<Violation>),
    /// Malformed compiler configuration
    Config(String),
    Io { path: PathBuf, message: String },
    /// A stage could not be written out in the requested format
    Output(String),
}

impl CompileError {
    /// Short name of the failing stage, for driver output
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::Lex(_) => "lex",
            CompileError::Parse(_) => "parse",
            CompileError::Invalid(_) => "invalid-ir",
            CompileError::Config(_) => "config",
            CompileError::Io { .. } => "io",
            CompileError::Output(_) => "output",
        }
    }

    /// Source position (line, column) when the error points into the input
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            CompileError::Lex(e) => Some(e.position()),
            CompileError::Parse(e) => Some(e.position()),
            _ => None,
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Lex(e) => write!(f, "{}", e),
            CompileError::Parse(e) => write!(f, "{}", e),
            CompileError::Invalid(violations) => {
                write!(f, "Lowered IR failed verification:")?;
                for v in violations {
                    write!(f, "\n  {}", v)?;
                }
                Ok(())
            }
            CompileError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CompileError::Io { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
            CompileError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Lex(e) => Some(e),
            CompileError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LexError> for CompileError {
    fn from(e: LexError) -> Self {
        CompileError::Lex(e)
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_display() {
        let err = LexError::UnexpectedChar {
            ch: '@',
            line: 2,
            column: 5,
        };
        assert_eq!(
            err.to_string(),
            "Lexer error at line 2, column 5: unexpected character '@'"
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::Unexpected {
            expected: "')'".to_string(),
            found: "end of input".to_string(),
            line: 1,
            column: 28,
        };
        assert_eq!(
            err.to_string(),
            "Parser error at line 1, column 28: expected ')', found end of input"
        );
    }

    #[test]
    fn test_compile_error_kind_and_position() {
        let err: CompileError = ParseError::NestingTooDeep {
            limit: 8,
            line: 3,
            column: 1,
        }
        .into();
        assert_eq!(err.kind(), "parse");
        assert_eq!(err.position(), Some((3, 1)));

        let err = CompileError::Config("bad".to_string());
        assert_eq!(err.kind(), "config");
        assert_eq!(err.position(), None);
    }
}
