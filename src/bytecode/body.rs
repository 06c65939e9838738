//! Method body representation: instruction arena, label table and exception handlers.
//!
//! A [`MethodBody`] owns a method's instructions in program order and resolves
//! every [`Label`] through a side table of stable instruction indices. Keeping
//! labels out of the instruction stream (instead of modelling them as
//! pseudo-instructions) makes rewriting a pure index-remapping exercise: a new
//! stream keeps the same label identities and only re-points the table.
//!
//! # Invariants
//!
//! - Every label referenced by an instruction or exception handler resolves to
//!   exactly one position in `0..=len` (the index `len` addresses the end of
//!   the stream and is only meaningful as an exclusive range bound).
//! - Exception handler ranges are end-exclusive: `[start, end)` is protected.

use crate::bytecode::{Instruction, Label};
use std::sync::Arc;

/// An unbound label points here until [`MethodBody::bind`] places it.
const UNBOUND: usize = usize::MAX;

/// A try/catch region of a method body.
///
/// Ranges are label-addressed so they survive rewriting without adjustment;
/// only the body's label table changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionHandler {
    /// First protected instruction.
    pub start: Label,
    /// End of the protected range (exclusive).
    pub end: Label,
    /// Handler entry point.
    pub handler: Label,
    /// Internal name of the caught class, or `None` for a catch-all clause.
    pub catch_type: Option<Arc<str>>,
}

/// A method's instruction stream with its label table and exception handlers.
///
/// Built by an external class-file loader (or by hand in tests), analyzed and
/// rewritten by [`crate::simplify::JumpSimplifier`]. Instructions are
/// addressed by their position; control transfers reference positions through
/// [`Label`] identities.
///
/// # Example
///
/// ```rust
/// use jarscope::bytecode::{Condition, Instruction, MethodBody};
///
/// let mut body = MethodBody::new(1);
/// let target = body.new_label();
/// body.push(Instruction::PushInt(0));
/// body.push(Instruction::Branch { condition: Condition::EqZero, target });
/// body.push(Instruction::Return);
/// body.bind(target);
/// body.push(Instruction::Return);
///
/// assert_eq!(body.len(), 4);
/// assert_eq!(body.target(target), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBody {
    instructions: Vec<Instruction>,
    /// Label table: `labels[label.id()]` is the instruction index the label
    /// resolves to.
    labels: Vec<usize>,
    handlers: Vec<ExceptionHandler>,
    max_locals: u16,
}

impl MethodBody {
    /// Creates an empty body with the given number of local variable slots.
    #[must_use]
    pub fn new(max_locals: u16) -> Self {
        Self {
            instructions: Vec::new(),
            labels: Vec::new(),
            handlers: Vec::new(),
            max_locals,
        }
    }

    /// Appends an instruction and returns its index.
    pub fn push(&mut self, insn: Instruction) -> usize {
        self.instructions.push(insn);
        self.instructions.len() - 1
    }

    /// Creates a fresh, unbound label.
    ///
    /// The label must be bound with [`MethodBody::bind`] before the body is
    /// analyzed; an unbound label violates the body's resolution invariant.
    pub fn new_label(&mut self) -> Label {
        self.labels.push(UNBOUND);
        Label((self.labels.len() - 1) as u32)
    }

    /// Binds a label to the next instruction to be pushed.
    ///
    /// Binding after the final push points the label at the end of the
    /// stream, which is only valid as an exception-range end.
    pub fn bind(&mut self, label: Label) {
        self.labels[label.0 as usize] = self.instructions.len();
    }

    /// Creates a label already bound to the next instruction to be pushed.
    pub fn label_here(&mut self) -> Label {
        let label = self.new_label();
        self.bind(label);
        label
    }

    /// Resolves a label to its instruction index.
    #[must_use]
    pub fn target(&self, label: Label) -> usize {
        self.labels[label.0 as usize]
    }

    /// Registers an exception handler.
    pub fn add_handler(&mut self, handler: ExceptionHandler) {
        self.handlers.push(handler);
    }

    /// The exception handler table.
    #[must_use]
    pub fn handlers(&self) -> &[ExceptionHandler] {
        &self.handlers
    }

    /// The instructions in program order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The instruction at `index`, if in range.
    #[must_use]
    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if the body holds no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of local variable slots.
    #[must_use]
    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    /// Control-flow successors of the instruction at `index`, excluding
    /// exception edges.
    ///
    /// The returned indices may include `len` when execution would fall off
    /// the end of the stream (malformed input); callers must range-check.
    #[must_use]
    pub fn successors(&self, index: usize) -> Vec<usize> {
        match &self.instructions[index] {
            Instruction::Branch { target, .. } => vec![index + 1, self.target(*target)],
            Instruction::Goto(target) => vec![self.target(*target)],
            Instruction::TableSwitch {
                targets, default, ..
            }
            | Instruction::LookupSwitch {
                targets, default, ..
            } => {
                let mut successors: Vec<usize> =
                    targets.iter().map(|t| self.target(*t)).collect();
                successors.push(self.target(*default));
                successors
            }
            Instruction::Return | Instruction::ReturnValue | Instruction::Throw => Vec::new(),
            _ => vec![index + 1],
        }
    }

    /// Raw label table, parallel to label ids.
    pub(crate) fn label_targets(&self) -> &[usize] {
        &self.labels
    }

    /// Builds a rewritten body from a new instruction stream.
    ///
    /// `index_map` maps every old instruction index (plus the end-of-stream
    /// index) to the position of its first replacement in `instructions`;
    /// labels keep their identities and are re-pointed through it.
    pub(crate) fn with_remapped(
        &self,
        instructions: Vec<Instruction>,
        index_map: &[usize],
    ) -> MethodBody {
        let end = self.instructions.len();
        let labels = self
            .labels
            .iter()
            .map(|&target| index_map[target.min(end)])
            .collect();
        MethodBody {
            instructions,
            labels,
            handlers: self.handlers.clone(),
            max_locals: self.max_locals,
        }
    }

    /// Replaces the full body contents after dead-code elimination.
    pub(crate) fn replace(
        &mut self,
        instructions: Vec<Instruction>,
        labels: Vec<usize>,
        handlers: Vec<ExceptionHandler>,
    ) {
        self.instructions = instructions;
        self.labels = labels;
        self.handlers = handlers;
    }
}
