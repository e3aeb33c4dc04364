//! State Transformer
//!
//! Lowers functional IR into imperative IR. Each expression is lowered
//! into a named destination, recursively, left to right:
//!
//! - literals and variables become a single `assign`
//! - a binary expression lowers both operands into fresh temporaries and
//!   combines them with one `binop`
//! - a conditional branches on a temporary and writes the *same*
//!   destination from both arms, so no merge instruction is needed
//! - a call lowers each argument into its own temporary
//! - a let writes the bound name directly, then lowers the body
//!
//! Let-bound names and parameters share the function's flat namespace.
//! A nested `let` of an existing name overwrites it for the rest of the
//! function, including code after the inner `let` ends textually.
//!
//! # Module Structure
//!
//! - `state.rs`: per-function lowering context (counters, instruction buffer)
//! - `control_flow.rs`: conditionals, let-bindings and calls

mod control_flow;
mod state;

use crate::fir::{FirExpr, FirFunction, FirProgram};
use crate::imperative::{ImperativeFunction, ImperativeProgram, Instruction, Value};
use state::LoweringContext;

/// Lower a whole program. Functions are lowered independently, in order.
pub fn transform(program: &FirProgram) -> ImperativeProgram {
    let functions = program.functions.iter().map(transform_function).collect();
    ImperativeProgram { functions }
}

/// Lower a single function with a fresh context.
///
/// The body is lowered into a result temporary (always `t0`), which the
/// final `return` reads.
pub fn transform_function(func: &FirFunction) -> ImperativeFunction {
    let mut ctx = LoweringContext::new();

    let result = ctx.fresh_temp();
    ctx.lower_expr(&func.body, &result);
    ctx.emit(Instruction::Return(Value::Var(result)));

    tracing::trace!(
        function = %func.name,
        temps = ctx.temps_allocated(),
        labels = ctx.labels_allocated(),
        "lowered function"
    );

    ImperativeFunction {
        name: func.name.clone(),
        params: func.params.iter().map(|(name, _)| name.clone()).collect(),
        instructions: ctx.finish(),
    }
}

impl LoweringContext {
    /// Lower `expr` so that its value ends up in `dest`
    fn lower_expr(&mut self, expr: &FirExpr, dest: &str) {
        match expr {
            FirExpr::Int(n) => self.emit(Instruction::Assign {
                dest: dest.to_string(),
                value: Value::Int(*n),
            }),
            FirExpr::Bool(b) => self.emit(Instruction::Assign {
                dest: dest.to_string(),
                value: Value::Bool(*b),
            }),
            FirExpr::Var(name) => self.emit(Instruction::Assign {
                dest: dest.to_string(),
                value: Value::var(name.as_str()),
            }),
            FirExpr::BinOp { op, left, right } => {
                let left_temp = self.fresh_temp();
                self.lower_expr(left, &left_temp);

                let right_temp = self.fresh_temp();
                self.lower_expr(right, &right_temp);

                self.emit(Instruction::BinOp {
                    dest: dest.to_string(),
                    op: (*op).into(),
                    left: Value::Var(left_temp),
                    right: Value::Var(right_temp),
                });
            }
            FirExpr::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(condition, then_branch, else_branch, dest),
            FirExpr::Call { function, args } => self.lower_call(function, args, dest),
            FirExpr::Let { name, value, body } => self.lower_let(name, value, body, dest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fir::from_ast;
    use crate::imperative::ImpOp;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn lower(source: &str) -> ImperativeProgram {
        let tokens = tokenize(source).unwrap();
        let program = parse(&tokens).unwrap();
        transform(&from_ast(&program))
    }

    fn assign(dest: &str, value: Value) -> Instruction {
        Instruction::Assign {
            dest: dest.to_string(),
            value,
        }
    }

    fn label(name: &str) -> Instruction {
        Instruction::Label(name.to_string())
    }

    #[test]
    fn test_identity() {
        let program = lower("fn identity(x: Int) -> Int = x");
        assert_eq!(program.functions.len(), 1);
        let func = &program.functions[0];
        assert_eq!(func.name, "identity");
        assert_eq!(func.params, vec!["x"]);
        assert_eq!(
            func.instructions,
            vec![
                assign("t0", Value::var("x")),
                Instruction::Return(Value::var("t0")),
            ]
        );
    }

    #[test]
    fn test_binary_operands_in_temporaries() {
        let program = lower("fn add(a: Int, b: Int) -> Int = a + b");
        assert_eq!(
            program.functions[0].instructions,
            vec![
                assign("t1", Value::var("a")),
                assign("t2", Value::var("b")),
                Instruction::BinOp {
                    dest: "t0".to_string(),
                    op: ImpOp::Add,
                    left: Value::var("t1"),
                    right: Value::var("t2"),
                },
                Instruction::Return(Value::var("t0")),
            ]
        );
    }

    #[test]
    fn test_literals() {
        let program = lower("fn f() -> Bool = true\nfn g() -> Int = -7");
        assert_eq!(
            program.functions[0].instructions[0],
            assign("t0", Value::Bool(true))
        );
        assert_eq!(
            program.functions[1].instructions[0],
            assign("t0", Value::Int(-7))
        );
    }

    #[test]
    fn test_conditional_writes_same_destination() {
        let program = lower("fn max(a: Int, b: Int) -> Int = if a > b then a else b");
        let func = &program.functions[0];
        assert_eq!(
            func.instructions,
            vec![
                assign("t2", Value::var("a")),
                assign("t3", Value::var("b")),
                Instruction::BinOp {
                    dest: "t1".to_string(),
                    op: ImpOp::Gt,
                    left: Value::var("t2"),
                    right: Value::var("t3"),
                },
                Instruction::CondJump {
                    condition: Value::var("t1"),
                    true_target: "then0".to_string(),
                    false_target: "else1".to_string(),
                },
                label("then0"),
                assign("t0", Value::var("a")),
                Instruction::Jump("end_if2".to_string()),
                label("else1"),
                assign("t0", Value::var("b")),
                label("end_if2"),
                Instruction::Return(Value::var("t0")),
            ]
        );
        assert_eq!(func.labels().count(), 3);
    }

    #[test]
    fn test_call_arguments_left_to_right() {
        let program = lower("fn f(x: Int) -> Int = g(x, 2)");
        assert_eq!(
            program.functions[0].instructions,
            vec![
                assign("t1", Value::var("x")),
                assign("t2", Value::Int(2)),
                Instruction::Call {
                    dest: Some("t0".to_string()),
                    function: "g".to_string(),
                    args: vec![Value::var("t1"), Value::var("t2")],
                },
                Instruction::Return(Value::var("t0")),
            ]
        );
    }

    #[test]
    fn test_let_binds_name_directly() {
        let program = lower("fn f(x: Int) -> Int = let y = x in y");
        assert_eq!(
            program.functions[0].instructions,
            vec![
                assign("t1", Value::var("x")),
                assign("y", Value::var("t1")),
                assign("t0", Value::var("y")),
                Instruction::Return(Value::var("t0")),
            ]
        );
    }

    #[test]
    fn test_nested_let_overwrites_outer_binding() {
        // The inner `x` is not scoped: the read after the inner let sees 2
        let program = lower("fn f() -> Int = let x = 1 in (let x = 2 in x) + x");
        let writes: Vec<_> = program.functions[0]
            .instructions
            .iter()
            .filter(|i| i.defines() == Some("x"))
            .collect();
        assert_eq!(
            writes,
            vec![
                &assign("x", Value::var("t1")),
                &assign("x", Value::var("t3")),
            ]
        );
        let last_read = program.functions[0]
            .instructions
            .iter()
            .rposition(|i| i.uses() == vec!["x"])
            .unwrap();
        let second_write = program.functions[0]
            .instructions
            .iter()
            .rposition(|i| i.defines() == Some("x"))
            .unwrap();
        assert!(second_write < last_read);
    }

    #[test]
    fn test_recursive_call() {
        let program =
            lower("fn factorial(n: Int) -> Int = if n <= 1 then 1 else n * factorial(n - 1)");
        let func = &program.functions[0];
        assert!(func.callees().any(|c| c == "factorial"));
    }

    #[test]
    fn test_numbering_restarts_per_function() {
        let program = lower(
            "fn f(a: Int) -> Int = if a > 0 then a else 0\nfn g(b: Int) -> Int = if b > 0 then b else 0",
        );
        let f_labels: Vec<_> = program.functions[0].labels().collect();
        let g_labels: Vec<_> = program.functions[1].labels().collect();
        assert_eq!(f_labels, vec!["then0", "else1", "end_if2"]);
        assert_eq!(f_labels, g_labels);
    }

    #[test]
    fn test_parameter_types_erased() {
        let program = lower("fn f(a: Int, flag: Bool, b: Int) -> Int = a");
        assert_eq!(program.functions[0].params, vec!["a", "flag", "b"]);
    }
}
