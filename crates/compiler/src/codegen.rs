//! Pseudo-assembly rendering
//!
//! Maps each imperative instruction to one line of text (a conditional
//! jump takes two: `jmpif` to the true target, then `jmp` to the false
//! one). Functions are separated by a blank line and a `function` header.
//!
//! ```text
//! ; Squawk Compiler Output
//! ; Generated from functional code
//!
//! function max(a, b):
//!     mov t2, a
//!     mov t3, b
//!     gt t1, t2, t3
//!     jmpif t1, then0
//!     jmp else1
//! then0:
//!     mov t0, a
//!     jmp end_if2
//! ...
//! ```

use crate::config::CompilerConfig;
use crate::imperative::{ImperativeFunction, ImperativeProgram, Instruction};
use std::fmt;

pub const HEADER: [&str; 2] = ["; Squawk Compiler Output", "; Generated from functional code"];

/// A renderable view of a lowered program
pub struct Listing<'a> {
    program: &'a ImperativeProgram,
    indent: &'a str,
    header: bool,
}

impl<'a> Listing<'a> {
    pub fn new(program: &'a ImperativeProgram, config: &'a CompilerConfig) -> Self {
        Listing {
            program,
            indent: &config.indent,
            header: config.emit_header,
        }
    }

    fn write_function(&self, f: &mut fmt::Formatter<'_>, func: &ImperativeFunction) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "function {}({}):", func.name, func.params.join(", "))?;
        for instruction in &func.instructions {
            self.write_instruction(f, instruction)?;
        }
        Ok(())
    }

    fn write_instruction(&self, f: &mut fmt::Formatter<'_>, instruction: &Instruction) -> fmt::Result {
        let indent = self.indent;
        match instruction {
            Instruction::Assign { dest, value } => writeln!(f, "{}mov {}, {}", indent, dest, value),
            Instruction::BinOp {
                dest,
                op,
                left,
                right,
            } => writeln!(
                f,
                "{}{} {}, {}, {}",
                indent,
                op.mnemonic(),
                dest,
                left,
                right
            ),
            Instruction::Label(name) => writeln!(f, "{}:", name),
            Instruction::Jump(target) => writeln!(f, "{}jmp {}", indent, target),
            Instruction::CondJump {
                condition,
                true_target,
                false_target,
            } => {
                writeln!(f, "{}jmpif {}, {}", indent, condition, true_target)?;
                writeln!(f, "{}jmp {}", indent, false_target)
            }
            Instruction::Call {
                dest,
                function,
                args,
            } => {
                let args = args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                match dest {
                    Some(dest) => writeln!(f, "{}call {} = {}({})", indent, dest, function, args),
                    None => writeln!(f, "{}call {}({})", indent, function, args),
                }
            }
            Instruction::Return(value) => writeln!(f, "{}ret {}", indent, value),
        }
    }
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.header {
            for line in HEADER {
                writeln!(f, "{}", line)?;
            }
        }
        for func in &self.program.functions {
            self.write_function(f, func)?;
        }
        Ok(())
    }
}

/// Render a lowered program as pseudo-assembly text
pub fn render_program(program: &ImperativeProgram, config: &CompilerConfig) -> String {
    Listing::new(program, config).to_string()
}
