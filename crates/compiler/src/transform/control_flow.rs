//! Conditionals, let-bindings and calls

use super::LoweringContext;
use crate::fir::FirExpr;
use crate::imperative::{Instruction, Value};

impl LoweringContext {
    /// Lower `if condition then a else b` into `dest`.
    ///
    /// Emits:
    /// ```text
    ///   <condition into tc>
    ///   condjump tc, thenN, elseN+1
    /// thenN:
    ///   <a into dest>
    ///   jump end_ifN+2
    /// elseN+1:
    ///   <b into dest>
    /// end_ifN+2:
    /// ```
    pub(super) fn lower_if(
        &mut self,
        condition: &FirExpr,
        then_branch: &FirExpr,
        else_branch: &FirExpr,
        dest: &str,
    ) {
        let cond_temp = self.fresh_temp();
        self.lower_expr(condition, &cond_temp);

        let then_label = self.fresh_label("then");
        let else_label = self.fresh_label("else");
        let end_label = self.fresh_label("end_if");

        self.emit(Instruction::CondJump {
            condition: Value::Var(cond_temp),
            true_target: then_label.clone(),
            false_target: else_label.clone(),
        });

        self.emit(Instruction::Label(then_label));
        self.lower_expr(then_branch, dest);
        self.emit(Instruction::Jump(end_label.clone()));

        self.emit(Instruction::Label(else_label));
        self.lower_expr(else_branch, dest);

        self.emit(Instruction::Label(end_label));
    }

    pub(super) fn lower_call(&mut self, function: &str, args: &[FirExpr], dest: &str) {
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            let temp = self.fresh_temp();
            self.lower_expr(arg, &temp);
            arg_values.push(Value::Var(temp));
        }

        self.emit(Instruction::Call {
            dest: Some(dest.to_string()),
            function: function.to_string(),
            args: arg_values,
        });
    }

    /// The bound name is written as-is, never renamed
    pub(super) fn lower_let(&mut self, name: &str, value: &FirExpr, body: &FirExpr, dest: &str) {
        let value_temp = self.fresh_temp();
        self.lower_expr(value, &value_temp);

        self.emit(Instruction::Assign {
            dest: name.to_string(),
            value: Value::Var(value_temp),
        });

        self.lower_expr(body, dest);
    }
}
