//! Recursive-descent parser for Squawk
//!
//! Grammar:
//! ```text
//! program    := function*
//! function   := "fn" IDENT "(" (param ("," param)*)? ")" "->" type "=" expr
//! param      := IDENT ":" type
//! type       := "Int" | "Bool"
//! expr       := additive (("==" | "!=" | "<" | ">" | "<=" | ">=") additive)*
//! additive   := term (("+" | "-") term)*
//! term       := primary (("*" | "/") primary)*
//! primary    := INT | "true" | "false" | "(" expr ")"
//!             | "if" expr "then" expr "else" expr
//!             | "let" IDENT "=" expr "in" expr
//!             | IDENT "(" (expr ("," expr)*)? ")"
//!             | IDENT
//! ```
//!
//! Every choice is made on the kind of the next token. Newlines are skipped
//! before primaries, types, parameters, the `then`/`else`/`in` keywords and
//! inside parenthesized lists. They are not skipped before a binary
//! operator, so an operator at the start of a line does not continue the
//! previous expression.
//!
//! Two limits keep recursion bounded. The nesting limit counts nested
//! constructs (parentheses, `if`, `let`, call arguments), which is how deep
//! the parser itself recurses. The expression depth limit counts the height
//! of the finished tree, where each operator in a flat chain such as
//! `a + b + c` adds a level; later passes recurse over that height.

use crate::ast::{BinaryOp, Expr, FunctionDef, Parameter, Program, Type};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

/// Default bound on nested constructs
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

/// Default bound on the height of an expression tree
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 4096;

/// An expression together with the depth of its tree
struct Parsed {
    expr: Expr,
    depth: usize,
}

impl Parsed {
    fn leaf(expr: Expr) -> Self {
        Parsed { expr, depth: 1 }
    }
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Current number of active `parse_expression` frames
    nesting: usize,
    max_depth: usize,
    max_expression_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self::with_max_depth(tokens, DEFAULT_MAX_NESTING_DEPTH)
    }

    pub fn with_max_depth(tokens: &'a [Token], max_depth: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            nesting: 0,
            max_depth,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
        }
    }

    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        self.skip_newlines();
        while !self.is_at_end() {
            let function = self.parse_function()?;
            program.functions.push(function);
            self.skip_newlines();
        }

        Ok(program)
    }

    fn parse_function(&mut self) -> Result<FunctionDef, ParseError> {
        self.skip_newlines();
        self.expect(TokenKind::Fn)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        self.skip_newlines();
        if !self.check(&TokenKind::RParen) {
            params.push(self.parse_parameter()?);
            self.skip_newlines();
            while self.consume(&TokenKind::Comma) {
                params.push(self.parse_parameter()?);
                self.skip_newlines();
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        let return_type = self.parse_type()?;
        self.expect(TokenKind::Assign)?;

        let body = self.parse_expression()?.expr;

        Ok(FunctionDef {
            name,
            params,
            return_type,
            body,
        })
    }

    fn parse_parameter(&mut self) -> Result<Parameter, ParseError> {
        self.skip_newlines();
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok(Parameter { name, ty })
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        self.skip_newlines();
        let ty = match self.peek_kind() {
            Some(TokenKind::IntType) => Type::Int,
            Some(TokenKind::BoolType) => Type::Bool,
            _ => return Err(self.unexpected("type")),
        };
        self.pos += 1;
        Ok(ty)
    }

    fn parse_expression(&mut self) -> Result<Parsed, ParseError> {
        self.nesting += 1;
        if self.nesting > self.max_depth {
            return Err(self.too_deep());
        }
        let result = self.parse_comparison();
        self.nesting -= 1;
        result
    }

    fn parse_comparison(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.peek_kind().and_then(comparison_op) {
            self.pos += 1;
            let right = self.parse_additive()?;
            left = self.fold(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op) = self.peek_kind().and_then(additive_op) {
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = self.fold(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.parse_primary()?;
        while let Some(op) = self.peek_kind().and_then(multiplicative_op) {
            self.pos += 1;
            let right = self.parse_primary()?;
            left = self.fold(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Parsed, ParseError> {
        self.skip_newlines();
        match self.peek_kind() {
            Some(TokenKind::Integer(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(Parsed::leaf(Expr::IntLiteral(n)))
            }
            Some(TokenKind::True) => {
                self.pos += 1;
                Ok(Parsed::leaf(Expr::BoolLiteral(true)))
            }
            Some(TokenKind::False) => {
                self.pos += 1;
                Ok(Parsed::leaf(Expr::BoolLiteral(false)))
            }
            Some(TokenKind::LParen) => {
                self.pos += 1;
                let inner = self.parse_expression()?;
                self.skip_newlines();
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            Some(TokenKind::If) => self.parse_if(),
            Some(TokenKind::Let) => self.parse_let(),
            Some(TokenKind::Identifier(_)) => self.parse_identifier(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// A call when directly followed by `(`, a variable reference otherwise
    fn parse_identifier(&mut self) -> Result<Parsed, ParseError> {
        let name = self.expect_identifier()?;
        if !self.consume(&TokenKind::LParen) {
            return Ok(Parsed::leaf(Expr::Variable(name)));
        }

        let mut args = Vec::new();
        let mut depth = 1;
        self.skip_newlines();
        if !self.check(&TokenKind::RParen) {
            loop {
                let arg = self.parse_expression()?;
                depth = depth.max(arg.depth + 1);
                args.push(arg.expr);
                self.skip_newlines();
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.check_depth(depth)?;

        Ok(Parsed {
            expr: Expr::Call {
                function: name,
                args,
            },
            depth,
        })
    }

    fn parse_if(&mut self) -> Result<Parsed, ParseError> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_expression()?;
        self.skip_newlines();
        self.expect(TokenKind::Then)?;
        let then_branch = self.parse_expression()?;
        self.skip_newlines();
        self.expect(TokenKind::Else)?;
        let else_branch = self.parse_expression()?;

        let depth = 1 + condition
            .depth
            .max(then_branch.depth)
            .max(else_branch.depth);
        self.check_depth(depth)?;

        Ok(Parsed {
            expr: Expr::If {
                condition: Box::new(condition.expr),
                then_branch: Box::new(then_branch.expr),
                else_branch: Box::new(else_branch.expr),
            },
            depth,
        })
    }

    fn parse_let(&mut self) -> Result<Parsed, ParseError> {
        self.expect(TokenKind::Let)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        self.skip_newlines();
        self.expect(TokenKind::In)?;
        let body = self.parse_expression()?;

        let depth = 1 + value.depth.max(body.depth);
        self.check_depth(depth)?;

        Ok(Parsed {
            expr: Expr::Let {
                name,
                value: Box::new(value.expr),
                body: Box::new(body.expr),
            },
            depth,
        })
    }

    fn fold(&self, op: BinaryOp, left: Parsed, right: Parsed) -> Result<Parsed, ParseError> {
        let depth = 1 + left.depth.max(right.depth);
        self.check_depth(depth)?;
        Ok(Parsed {
            expr: Expr::binary(op, left.expr, right.expr),
            depth,
        })
    }

    fn check_depth(&self, depth: usize) -> Result<(), ParseError> {
        if depth > self.max_expression_depth {
            let (line, column) = self.position();
            Err(ParseError::ExpressionTooDeep {
                limit: self.max_expression_depth,
                line,
                column,
            })
        } else {
            Ok(())
        }
    }

    fn too_deep(&self) -> ParseError {
        let (line, column) = self.position();
        ParseError::NestingTooDeep {
            limit: self.max_depth,
            line,
            column,
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let (line, column) = self.position();
        let found = match self.peek_kind() {
            Some(kind) => kind.to_string(),
            None => TokenKind::Eof.to_string(),
        };
        ParseError::Unexpected {
            expected: expected.to_string(),
            found,
            line,
            column,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.consume(&kind) {
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Identifier(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    /// Position of the current token, or of the last token once exhausted
    fn position(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| (t.line, t.column))
            .unwrap_or((1, 1))
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), None | Some(TokenKind::Eof))
    }
}

fn comparison_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::EqEq => Some(BinaryOp::Equal),
        TokenKind::NotEq => Some(BinaryOp::NotEqual),
        TokenKind::Less => Some(BinaryOp::LessThan),
        TokenKind::Greater => Some(BinaryOp::GreaterThan),
        TokenKind::LessEq => Some(BinaryOp::LessEqual),
        TokenKind::GreaterEq => Some(BinaryOp::GreaterEqual),
        _ => None,
    }
}

fn additive_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Subtract),
        _ => None,
    }
}

fn multiplicative_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Star => Some(BinaryOp::Multiply),
        TokenKind::Slash => Some(BinaryOp::Divide),
        _ => None,
    }
}

/// Parse a token sequence with the default nesting limit
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    Parser::new(tokens).parse()
}
