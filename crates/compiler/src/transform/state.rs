//! Lowering context
//!
//! Holds the per-function state of the state transformer: the temporary
//! and label counters and the instruction buffer. A fresh context is
//! created for every function, so numbering restarts at zero and no state
//! is shared between functions.

use crate::imperative::Instruction;

/// Prefix of compiler-generated temporaries
pub(super) const TEMP_PREFIX: &str = "t";

#[derive(Debug, Default)]
pub(super) struct LoweringContext {
    temp_counter: usize,
    label_counter: usize,
    instructions: Vec<Instruction>,
}

impl LoweringContext {
    pub(super) fn new() -> Self {
        LoweringContext::default()
    }

    /// Generate a fresh temporary name
    pub(super) fn fresh_temp(&mut self) -> String {
        let name = format!("{}{}", TEMP_PREFIX, self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// Generate a fresh label; all prefixes share one counter
    pub(super) fn fresh_label(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.label_counter);
        self.label_counter += 1;
        name
    }

    pub(super) fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub(super) fn temps_allocated(&self) -> usize {
        self.temp_counter
    }

    pub(super) fn labels_allocated(&self) -> usize {
        self.label_counter
    }

    pub(super) fn finish(self) -> Vec<Instruction> {
        self.instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_names_are_monotonic() {
        let mut ctx = LoweringContext::new();
        assert_eq!(ctx.fresh_temp(), "t0");
        assert_eq!(ctx.fresh_temp(), "t1");
        assert_eq!(ctx.fresh_label("then"), "then0");
        assert_eq!(ctx.fresh_label("else"), "else1");
        assert_eq!(ctx.fresh_temp(), "t2");
        assert_eq!(ctx.temps_allocated(), 3);
        assert_eq!(ctx.labels_allocated(), 2);
    }

    #[test]
    fn test_new_context_restarts_numbering() {
        let mut first = LoweringContext::new();
        first.fresh_temp();
        first.fresh_label("L");

        let mut second = LoweringContext::new();
        assert_eq!(second.fresh_temp(), "t0");
        assert_eq!(second.fresh_label("L"), "L0");
    }
}
