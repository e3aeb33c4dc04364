//! Imperative IR verifier
//!
//! Checks the invariants the state transformer guarantees by construction:
//!
//! - every label is defined exactly once
//! - every jump target is a label of the same function
//! - every variable is assigned on all paths before it is read
//!   (parameters are assigned on entry)
//! - control cannot fall off the end of a function
//!
//! The definite-assignment check is a forward dataflow over the instruction
//! sequence: the set of assigned names at an instruction is the
//! intersection of the sets flowing in from every predecessor.

use crate::imperative::{ImperativeFunction, ImperativeProgram, Instruction};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    DuplicateLabel { label: String },
    UndefinedLabel { label: String, index: usize },
    UseBeforeAssign { name: String, index: usize },
    MissingReturn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub function: String,
    pub kind: ViolationKind,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "in function '{}': ", self.function)?;
        match &self.kind {
            ViolationKind::DuplicateLabel { label } => {
                write!(f, "label '{}' is defined more than once", label)
            }
            ViolationKind::UndefinedLabel { label, index } => write!(
                f,
                "instruction {} jumps to undefined label '{}'",
                index, label
            ),
            ViolationKind::UseBeforeAssign { name, index } => write!(
                f,
                "instruction {} reads '{}' before it is assigned on every path",
                index, name
            ),
            ViolationKind::MissingReturn => write!(f, "control reaches the end without a return"),
        }
    }
}

/// Verify every function of a program, collecting all violations
pub fn validate_program(program: &ImperativeProgram) -> Result<(), Vec<Violation>> {
    let violations: Vec<Violation> = program
        .functions
        .iter()
        .filter_map(|f| validate_function(f).err())
        .flatten()
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

pub fn validate_function(func: &ImperativeFunction) -> Result<(), Vec<Violation>> {
    let mut kinds = Vec::new();

    let mut label_index: HashMap<&str, usize> = HashMap::new();
    for (index, instruction) in func.instructions.iter().enumerate() {
        if let Instruction::Label(name) = instruction
            && label_index.insert(name.as_str(), index).is_some()
        {
            kinds.push(ViolationKind::DuplicateLabel {
                label: name.clone(),
            });
        }
    }

    for (index, instruction) in func.instructions.iter().enumerate() {
        for target in instruction.jump_targets() {
            if !label_index.contains_key(target) {
                kinds.push(ViolationKind::UndefinedLabel {
                    label: target.to_string(),
                    index,
                });
            }
        }
    }

    // Structural errors make the control flow meaningless
    if kinds.is_empty() {
        kinds.extend(check_definite_assignment(func, &label_index));
    }

    if kinds.is_empty() {
        Ok(())
    } else {
        Err(kinds
            .into_iter()
            .map(|kind| Violation {
                function: func.name.clone(),
                kind,
            })
            .collect())
    }
}

/// Successor indices of instruction `index`; `len` stands for "falls off the end"
fn successors(
    instructions: &[Instruction],
    index: usize,
    label_index: &HashMap<&str, usize>,
) -> Vec<usize> {
    let instruction = &instructions[index];
    if !instruction.is_terminator() {
        return vec![index + 1];
    }
    instruction
        .jump_targets()
        .into_iter()
        .filter_map(|t| label_index.get(t).copied())
        .collect()
}

fn check_definite_assignment(
    func: &ImperativeFunction,
    label_index: &HashMap<&str, usize>,
) -> Vec<ViolationKind> {
    let instructions = &func.instructions;
    let len = instructions.len();
    if len == 0 {
        return vec![ViolationKind::MissingReturn];
    }

    // `None` means no path has reached the instruction yet
    let mut assigned_in: Vec<Option<BTreeSet<&str>>> = vec![None; len];
    assigned_in[0] = Some(func.params.iter().map(String::as_str).collect());

    let mut worklist = vec![0];
    let mut falls_off_end = false;
    while let Some(index) = worklist.pop() {
        let Some(mut assigned) = assigned_in[index].clone() else {
            continue;
        };
        if let Some(dest) = instructions[index].defines() {
            assigned.insert(dest);
        }

        for succ in successors(instructions, index, label_index) {
            if succ >= len {
                falls_off_end = true;
                continue;
            }
            let merged = match &assigned_in[succ] {
                None => assigned.clone(),
                Some(existing) => existing.intersection(&assigned).copied().collect(),
            };
            if assigned_in[succ].as_ref() != Some(&merged) {
                assigned_in[succ] = Some(merged);
                worklist.push(succ);
            }
        }
    }

    let mut kinds = Vec::new();
    for (index, instruction) in instructions.iter().enumerate() {
        let Some(assigned) = &assigned_in[index] else {
            continue;
        };
        for name in instruction.uses() {
            if !assigned.contains(name) {
                kinds.push(ViolationKind::UseBeforeAssign {
                    name: name.to_string(),
                    index,
                });
            }
        }
    }
    if falls_off_end {
        kinds.push(ViolationKind::MissingReturn);
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imperative::Value;

    fn function(params: &[&str], instructions: Vec<Instruction>) -> ImperativeFunction {
        ImperativeFunction {
            name: "f".to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            instructions,
        }
    }

    fn assign(dest: &str, value: Value) -> Instruction {
        Instruction::Assign {
            dest: dest.to_string(),
            value,
        }
    }

    #[test]
    fn test_valid_straight_line() {
        let func = function(
            &["x"],
            vec![
                assign("t0", Value::var("x")),
                Instruction::Return(Value::var("t0")),
            ],
        );
        assert!(validate_function(&func).is_ok());
    }

    #[test]
    fn test_use_before_assign() {
        let func = function(
            &[],
            vec![
                assign("t0", Value::var("y")),
                Instruction::Return(Value::var("t0")),
            ],
        );
        let errs = validate_function(&func).unwrap_err();
        assert_eq!(
            errs[0].kind,
            ViolationKind::UseBeforeAssign {
                name: "y".to_string(),
                index: 0
            }
        );
    }

    #[test]
    fn test_assignment_on_one_branch_only() {
        let func = function(
            &["c"],
            vec![
                Instruction::CondJump {
                    condition: Value::var("c"),
                    true_target: "a".to_string(),
                    false_target: "b".to_string(),
                },
                Instruction::Label("a".to_string()),
                assign("t0", Value::Int(1)),
                Instruction::Jump("end".to_string()),
                Instruction::Label("b".to_string()),
                Instruction::Label("end".to_string()),
                Instruction::Return(Value::var("t0")),
            ],
        );
        let errs = validate_function(&func).unwrap_err();
        assert!(matches!(
            &errs[0].kind,
            ViolationKind::UseBeforeAssign { name, index: 6 } if name == "t0"
        ));
    }

    #[test]
    fn test_label_errors() {
        let func = function(
            &[],
            vec![
                Instruction::Label("L0".to_string()),
                Instruction::Label("L0".to_string()),
                Instruction::Jump("L9".to_string()),
            ],
        );
        let errs = validate_function(&func).unwrap_err();
        let kinds: Vec<_> = errs.into_iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::DuplicateLabel {
                    label: "L0".to_string()
                },
                ViolationKind::UndefinedLabel {
                    label: "L9".to_string(),
                    index: 2
                },
            ]
        );
    }

    #[test]
    fn test_code_after_return_is_unreachable() {
        let func = function(
            &[],
            vec![
                Instruction::Return(Value::Int(0)),
                assign("t0", Value::var("ghost")),
            ],
        );
        assert!(validate_function(&func).is_ok());
    }

    #[test]
    fn test_missing_return() {
        let func = function(&[], vec![assign("t0", Value::Int(1))]);
        let errs = validate_function(&func).unwrap_err();
        assert_eq!(errs[0].kind, ViolationKind::MissingReturn);
        assert_eq!(
            errs[0].to_string(),
            "in function 'f': control reaches the end without a return"
        );
    }
}
