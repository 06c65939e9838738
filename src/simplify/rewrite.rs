//! Instruction stream rewriting.
//!
//! One traversal of the original stream, emitting a new stream under the
//! verdicts of the branch predictor and switch resolver. The branch
//! instruction always pops its operands, so a decided branch is replaced by
//! a pop of matching width, followed by a `goto` when it was always taken.
//! Everything else - including any instruction whose frame is missing or
//! whose prediction failed - is copied verbatim.
//!
//! Labels keep their identities; the new body's label table re-points every
//! label through the old-index → new-index map. Every old instruction emits
//! at least one replacement, so the map is total and labels into replaced
//! branches land on the replacing pop.

use crate::{
    analysis::Frame,
    bytecode::{Condition, Instruction, MethodBody},
    events::{EventKind, EventLog},
    simplify::{predict_branch, resolve_switch, BranchPrediction},
};

/// Result of rewriting one method body.
pub(crate) struct RewrittenMethod {
    /// The replacement body; dead code not yet eliminated.
    pub body: MethodBody,
    /// Conditional branches removed.
    pub jumps_removed: usize,
    /// Switches resolved to direct jumps.
    pub switches_resolved: usize,
}

/// Rewrites a method body under the given per-instruction frames.
///
/// Returns `None` when no instruction was simplified; the caller must then
/// leave the method untouched (and skip dead-code elimination).
pub(crate) fn rewrite_method(
    owner: &str,
    body: &MethodBody,
    frames: &[Option<Frame>],
    events: &EventLog,
) -> Option<RewrittenMethod> {
    let mut instructions = Vec::with_capacity(body.len());
    let mut index_map = Vec::with_capacity(body.len() + 1);
    let mut jumps_removed = 0;
    let mut switches_resolved = 0;

    for (index, insn) in body.instructions().iter().enumerate() {
        index_map.push(instructions.len());
        let frame = frames.get(index).and_then(Option::as_ref);

        match insn {
            Instruction::Branch { condition, target } => {
                let Some(frame) = frame else {
                    instructions.push(insn.clone());
                    continue;
                };
                match predict_branch(frame, *condition) {
                    Ok(BranchPrediction::AlwaysTaken) => {
                        instructions.push(pop_of_width(*condition));
                        instructions.push(Instruction::Goto(*target));
                        jumps_removed += 1;
                        events
                            .record(EventKind::BranchSimplified)
                            .at(owner, index)
                            .message(format!("{condition} always taken"));
                    }
                    Ok(BranchPrediction::AlwaysNotTaken) => {
                        instructions.push(pop_of_width(*condition));
                        jumps_removed += 1;
                        events
                            .record(EventKind::BranchSimplified)
                            .at(owner, index)
                            .message(format!("{condition} never taken"));
                    }
                    Ok(BranchPrediction::Unpredictable) => instructions.push(insn.clone()),
                    Err(e) => {
                        // Documented policy: a malformed region keeps its
                        // instruction and the rest of the method still
                        // simplifies.
                        events
                            .record(EventKind::Error)
                            .at(owner, index)
                            .message(format!("invalid stack: {e}"));
                        instructions.push(insn.clone());
                    }
                }
            }

            Instruction::TableSwitch { .. } | Instruction::LookupSwitch { .. } => {
                match frame.and_then(|f| resolve_switch(f, insn)) {
                    Some(target) => {
                        instructions.push(Instruction::Pop);
                        instructions.push(Instruction::Goto(target));
                        switches_resolved += 1;
                        events
                            .record(EventKind::SwitchSimplified)
                            .at(owner, index)
                            .message(format!("{} resolved", insn.mnemonic()));
                    }
                    None => instructions.push(insn.clone()),
                }
            }

            _ => instructions.push(insn.clone()),
        }
    }

    if jumps_removed + switches_resolved == 0 {
        return None;
    }

    index_map.push(instructions.len());
    Some(RewrittenMethod {
        body: body.with_remapped(instructions, &index_map),
        jumps_removed,
        switches_resolved,
    })
}

/// The pop matching a condition's operand width.
fn pop_of_width(condition: Condition) -> Instruction {
    if condition.operand_count() == 2 {
        Instruction::Pop2
    } else {
        Instruction::Pop
    }
}
