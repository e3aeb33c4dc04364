//! Imperative IR
//!
//! The output of the state transformer: each function is a flat list of
//! instructions over named storage locations. Names are plain strings:
//! compiler temporaries (`t0`, `t1`, ...), parameters and let-bound names
//! all live in one namespace per function.

use crate::fir::FirOp;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImpOp {
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

impl ImpOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            ImpOp::Add => "add",
            ImpOp::Sub => "sub",
            ImpOp::Mul => "mul",
            ImpOp::Div => "div",
            ImpOp::Eq => "eq",
            ImpOp::Neq => "neq",
            ImpOp::Lt => "lt",
            ImpOp::Gt => "gt",
            ImpOp::Leq => "leq",
            ImpOp::Geq => "geq",
        }
    }
}

impl From<FirOp> for ImpOp {
    fn from(op: FirOp) -> Self {
        match op {
            FirOp::Add => ImpOp::Add,
            FirOp::Sub => ImpOp::Sub,
            FirOp::Mul => ImpOp::Mul,
            FirOp::Div => ImpOp::Div,
            FirOp::Eq => ImpOp::Eq,
            FirOp::Neq => ImpOp::Neq,
            FirOp::Lt => ImpOp::Lt,
            FirOp::Gt => ImpOp::Gt,
            FirOp::Leq => ImpOp::Leq,
            FirOp::Geq => ImpOp::Geq,
        }
    }
}

/// An operand
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Var(String),
}

impl Value {
    pub fn var(name: impl Into<String>) -> Self {
        Value::Var(name.into())
    }

    /// The variable this value reads, if any
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Value::Var(name) => Some(name.as_str()),
            Value::Int(_) | Value::Bool(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(true) => write!(f, "1"),
            Value::Bool(false) => write!(f, "0"),
            Value::Var(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Instruction {
    Assign {
        dest: String,
        value: Value,
    },
    BinOp {
        dest: String,
        op: ImpOp,
        left: Value,
        right: Value,
    },
    Label(String),
    Jump(String),
    /// Two-way branch: control goes to `true_target` when `condition` is
    /// non-zero, to `false_target` otherwise
    CondJump {
        condition: Value,
        true_target: String,
        false_target: String,
    },
    Call {
        dest: Option<String>,
        function: String,
        args: Vec<Value>,
    },
    Return(Value),
}

impl Instruction {
    /// The name this instruction writes, if any
    pub fn defines(&self) -> Option<&str> {
        match self {
            Instruction::Assign { dest, .. } | Instruction::BinOp { dest, .. } => Some(dest.as_str()),
            Instruction::Call { dest, .. } => dest.as_deref(),
            Instruction::Label(_)
            | Instruction::Jump(_)
            | Instruction::CondJump { .. }
            | Instruction::Return(_) => None,
        }
    }

    /// Variables read by this instruction, in operand order
    pub fn uses(&self) -> Vec<&str> {
        match self {
            Instruction::Assign { value, .. } | Instruction::Return(value) => {
                value.as_var().into_iter().collect()
            }
            Instruction::BinOp { left, right, .. } => {
                left.as_var().into_iter().chain(right.as_var()).collect()
            }
            Instruction::CondJump { condition, .. } => condition.as_var().into_iter().collect(),
            Instruction::Call { args, .. } => args.iter().filter_map(Value::as_var).collect(),
            Instruction::Label(_) | Instruction::Jump(_) => Vec::new(),
        }
    }

    /// Labels this instruction may transfer control to
    pub fn jump_targets(&self) -> Vec<&str> {
        match self {
            Instruction::Jump(target) => vec![target.as_str()],
            Instruction::CondJump {
                true_target,
                false_target,
                ..
            } => vec![true_target.as_str(), false_target.as_str()],
            _ => Vec::new(),
        }
    }

    /// Whether control never falls through to the next instruction
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Jump(_) | Instruction::CondJump { .. } | Instruction::Return(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImperativeFunction {
    pub name: String,
    /// Parameter names; declared types are erased
    pub params: Vec<String>,
    pub instructions: Vec<Instruction>,
}

impl ImperativeFunction {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Label(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Names of all functions called from this one, in emission order
    pub fn callees(&self) -> impl Iterator<Item = &str> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Call { function, .. } => Some(function.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImperativeProgram {
    pub functions: Vec<ImperativeFunction>,
}

impl ImperativeProgram {
    pub fn find_function(&self, name: &str) -> Option<&ImperativeFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn instruction_count(&self) -> usize {
        self.functions.iter().map(|f| f.instructions.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Bool(true).to_string(), "1");
        assert_eq!(Value::Bool(false).to_string(), "0");
        assert_eq!(Value::var("t4").to_string(), "t4");
    }

    #[test]
    fn test_defines_and_uses() {
        let binop = Instruction::BinOp {
            dest: "t2".to_string(),
            op: ImpOp::Add,
            left: Value::var("t0"),
            right: Value::Int(1),
        };
        assert_eq!(binop.defines(), Some("t2"));
        assert_eq!(binop.uses(), vec!["t0"]);

        let call = Instruction::Call {
            dest: None,
            function: "f".to_string(),
            args: vec![Value::var("a"), Value::Bool(true), Value::var("b")],
        };
        assert_eq!(call.defines(), None);
        assert_eq!(call.uses(), vec!["a", "b"]);
    }

    #[test]
    fn test_jump_targets() {
        let cj = Instruction::CondJump {
            condition: Value::var("t0"),
            true_target: "then0".to_string(),
            false_target: "else1".to_string(),
        };
        assert_eq!(cj.jump_targets(), vec!["then0", "else1"]);
        assert!(cj.is_terminator());
        assert!(!Instruction::Label("end_if2".to_string()).is_terminator());
    }
}
