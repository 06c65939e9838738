//! Abstract frames: the operand stack and local state at one instruction.
//!
//! A [`Frame`] captures what the analysis knows about every stack slot and
//! local variable immediately *before* an instruction executes. Frames from
//! different control-flow predecessors merge per slot with the disagreement
//! rule of [`AbstractValue::merge`]; a stack-depth mismatch between
//! predecessors means the input is malformed.

use crate::{
    analysis::{AbstractValue, ConstValue},
    Result,
};

/// The abstract operand stack and local-variable state at one instruction.
#[derive(Debug, Clone)]
pub struct Frame {
    stack: Vec<AbstractValue>,
    locals: Vec<AbstractValue>,
}

impl Frame {
    /// The frame at method entry: empty stack, every local unknown.
    ///
    /// Parameters live in locals like any other slot; nothing is known about
    /// them.
    #[must_use]
    pub fn entry(max_locals: u16) -> Self {
        Self {
            stack: Vec::new(),
            locals: vec![AbstractValue::Unknown; max_locals as usize],
        }
    }

    /// Pushes a value on the operand stack.
    pub fn push(&mut self, value: AbstractValue) {
        self.stack.push(value);
    }

    /// Pushes a known constant on the operand stack.
    pub fn push_known(&mut self, value: ConstValue) {
        self.stack.push(AbstractValue::Known(value));
    }

    /// Pops the top of the operand stack.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] on underflow.
    pub fn pop(&mut self) -> Result<AbstractValue> {
        self.stack
            .pop()
            .ok_or_else(|| malformed_error!("operand stack underflow"))
    }

    /// The value on top of the stack, if any.
    #[must_use]
    pub fn top(&self) -> Option<&AbstractValue> {
        self.stack.last()
    }

    /// The stack slot at `index` (0 is the bottom), if in range.
    #[must_use]
    pub fn stack(&self, index: usize) -> Option<&AbstractValue> {
        self.stack.get(index)
    }

    /// Current operand stack depth.
    #[must_use]
    pub fn stack_size(&self) -> usize {
        self.stack.len()
    }

    /// The value of a local variable slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the slot is out of range.
    pub fn local(&self, slot: u16) -> Result<&AbstractValue> {
        self.locals
            .get(slot as usize)
            .ok_or_else(|| malformed_error!("local slot {slot} out of range"))
    }

    /// Stores a value into a local variable slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the slot is out of range.
    pub fn set_local(&mut self, slot: u16, value: AbstractValue) -> Result<()> {
        let entry = self
            .locals
            .get_mut(slot as usize)
            .ok_or_else(|| malformed_error!("local slot {slot} out of range"))?;
        *entry = value;
        Ok(())
    }

    /// The frame an exception handler entry observes when this frame's
    /// instruction throws: locals carried over, stack replaced by the single
    /// in-flight exception (unknown).
    #[must_use]
    pub(crate) fn for_handler(&self) -> Frame {
        Frame {
            stack: vec![AbstractValue::Unknown],
            locals: self.locals.clone(),
        }
    }

    /// Merges another predecessor's frame into this one per slot.
    ///
    /// Returns `true` if any slot changed, which is exactly the condition for
    /// re-queueing the instruction in the fixpoint loop.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the stack depths or local
    /// counts disagree - merged frames must describe the same program point.
    pub fn merge(&mut self, other: &Frame) -> Result<bool> {
        if self.stack.len() != other.stack.len() {
            return Err(malformed_error!(
                "stack depth mismatch at join: {} vs {}",
                self.stack.len(),
                other.stack.len()
            ));
        }
        if self.locals.len() != other.locals.len() {
            return Err(malformed_error!(
                "local count mismatch at join: {} vs {}",
                self.locals.len(),
                other.locals.len()
            ));
        }

        let mut changed = false;
        for (mine, theirs) in self
            .stack
            .iter_mut()
            .chain(self.locals.iter_mut())
            .zip(other.stack.iter().chain(other.locals.iter()))
        {
            let merged = mine.merge(theirs);
            if !merged.identical(mine) {
                *mine = merged;
                changed = true;
            }
        }
        Ok(changed)
    }
}
