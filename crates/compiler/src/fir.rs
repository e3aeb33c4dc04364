//! Functional IR
//!
//! Structurally the same tree as the AST, with the operator set renamed to
//! the short mnemonics used by the later stages. This is the input contract
//! of the state transformer: it never looks at AST types directly.

use crate::ast;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FirType {
    Int,
    Bool,
}

impl From<ast::Type> for FirType {
    fn from(ty: ast::Type) -> Self {
        match ty {
            ast::Type::Int => FirType::Int,
            ast::Type::Bool => FirType::Bool,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FirOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Neq,
    Lt,
    Gt,
    Leq,
    Geq,
}

impl From<ast::BinaryOp> for FirOp {
    fn from(op: ast::BinaryOp) -> Self {
        match op {
            ast::BinaryOp::Add => FirOp::Add,
            ast::BinaryOp::Subtract => FirOp::Sub,
            ast::BinaryOp::Multiply => FirOp::Mul,
            ast::BinaryOp::Divide => FirOp::Div,
            ast::BinaryOp::Equal => FirOp::Eq,
            ast::BinaryOp::NotEqual => FirOp::Neq,
            ast::BinaryOp::LessThan => FirOp::Lt,
            ast::BinaryOp::GreaterThan => FirOp::Gt,
            ast::BinaryOp::LessEqual => FirOp::Leq,
            ast::BinaryOp::GreaterEqual => FirOp::Geq,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FirExpr {
    Int(i64),
    Bool(bool),
    Var(String),
    BinOp {
        op: FirOp,
        left: Box<FirExpr>,
        right: Box<FirExpr>,
    },
    If {
        condition: Box<FirExpr>,
        then_branch: Box<FirExpr>,
        else_branch: Box<FirExpr>,
    },
    Call {
        function: String,
        args: Vec<FirExpr>,
    },
    Let {
        name: String,
        value: Box<FirExpr>,
        body: Box<FirExpr>,
    },
}

impl From<&ast::Expr> for FirExpr {
    fn from(expr: &ast::Expr) -> Self {
        match expr {
            ast::Expr::IntLiteral(n) => FirExpr::Int(*n),
            ast::Expr::BoolLiteral(b) => FirExpr::Bool(*b),
            ast::Expr::Variable(name) => FirExpr::Var(name.clone()),
            ast::Expr::Binary { op, left, right } => FirExpr::BinOp {
                op: (*op).into(),
                left: Box::new(left.as_ref().into()),
                right: Box::new(right.as_ref().into()),
            },
            ast::Expr::If {
                condition,
                then_branch,
                else_branch,
            } => FirExpr::If {
                condition: Box::new(condition.as_ref().into()),
                then_branch: Box::new(then_branch.as_ref().into()),
                else_branch: Box::new(else_branch.as_ref().into()),
            },
            ast::Expr::Call { function, args } => FirExpr::Call {
                function: function.clone(),
                args: args.iter().map(FirExpr::from).collect(),
            },
            ast::Expr::Let { name, value, body } => FirExpr::Let {
                name: name.clone(),
                value: Box::new(value.as_ref().into()),
                body: Box::new(body.as_ref().into()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirFunction {
    pub name: String,
    pub params: Vec<(String, FirType)>,
    pub return_type: FirType,
    pub body: FirExpr,
}

impl From<&ast::FunctionDef> for FirFunction {
    fn from(func: &ast::FunctionDef) -> Self {
        FirFunction {
            name: func.name.clone(),
            params: func
                .params
                .iter()
                .map(|p| (p.name.clone(), p.ty.into()))
                .collect(),
            return_type: func.return_type.into(),
            body: (&func.body).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FirProgram {
    pub functions: Vec<FirFunction>,
}

/// Convert a parsed program into functional IR
pub fn from_ast(program: &ast::Program) -> FirProgram {
    FirProgram {
        functions: program.functions.iter().map(FirFunction::from).collect(),
    }
}
