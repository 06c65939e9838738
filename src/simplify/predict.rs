//! Branch outcome prediction.
//!
//! A pure function from the frame before a conditional branch and the branch's
//! condition to a verdict: always taken, never taken, or not decidable from
//! the known stack values. The predictor never mutates the frame - the
//! rewriter owns the consequence (the branch pops its operands, so a decided
//! branch must be replaced by a pop of matching width).

use crate::{
    analysis::{ConstValue, Frame},
    bytecode::Condition,
    Result,
};

/// Verdict for a conditional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchPrediction {
    /// The outcome depends on values the analysis does not know.
    Unpredictable,
    /// The branch is taken on every execution.
    AlwaysTaken,
    /// The branch falls through on every execution.
    AlwaysNotTaken,
}

/// Predicts the outcome of a conditional branch from the frame before it.
///
/// An unknown operand (or a stack too shallow to hold the operands) yields
/// [`BranchPrediction::Unpredictable`]. A *known* operand of the wrong kind
/// for the condition's family - an integer test over a known string, a null
/// test over a known integer - is a malformed stack.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] on a kind mismatch as described above.
/// Callers recover locally by keeping the branch.
pub fn predict_branch(frame: &Frame, condition: Condition) -> Result<BranchPrediction> {
    let size = frame.stack_size();
    if size < condition.operand_count() {
        return Ok(BranchPrediction::Unpredictable);
    }

    if condition.operand_count() == 1 {
        let Some(value) = frame.stack(size - 1).and_then(|v| v.known()) else {
            return Ok(BranchPrediction::Unpredictable);
        };
        let holds = match condition {
            Condition::EqZero
            | Condition::NeZero
            | Condition::LtZero
            | Condition::GeZero
            | Condition::GtZero
            | Condition::LeZero => {
                let v = value.as_int().ok_or_else(|| {
                    malformed_error!("integer zero test over non-integer constant {value}")
                })?;
                match condition {
                    Condition::EqZero => v == 0,
                    Condition::NeZero => v != 0,
                    Condition::LtZero => v < 0,
                    Condition::GeZero => v >= 0,
                    Condition::GtZero => v > 0,
                    Condition::LeZero => v <= 0,
                    _ => unreachable!(),
                }
            }
            Condition::IsNull | Condition::NonNull => {
                let is_null = match value {
                    ConstValue::Null => true,
                    ConstValue::Str(_) | ConstValue::Reference(_) => false,
                    _ => {
                        return Err(malformed_error!(
                            "null test over non-reference constant {value}"
                        ))
                    }
                };
                (condition == Condition::IsNull) == is_null
            }
            _ => unreachable!(),
        };
        return Ok(verdict(holds));
    }

    // Two-operand families: the operand pushed first sits below the top.
    let (Some(second), Some(first)) = (
        frame.stack(size - 1).and_then(|v| v.known()),
        frame.stack(size - 2).and_then(|v| v.known()),
    ) else {
        return Ok(BranchPrediction::Unpredictable);
    };

    let holds = match condition {
        Condition::RefEq => first == second,
        Condition::RefNe => first != second,
        _ => {
            let a = first.as_int().ok_or_else(|| {
                malformed_error!("integer comparison over non-integer constant {first}")
            })?;
            let b = second.as_int().ok_or_else(|| {
                malformed_error!("integer comparison over non-integer constant {second}")
            })?;
            match condition {
                Condition::IntEq => a == b,
                Condition::IntNe => a != b,
                Condition::IntLt => a < b,
                Condition::IntGe => a >= b,
                Condition::IntGt => a > b,
                Condition::IntLe => a <= b,
                _ => unreachable!(),
            }
        }
    };
    Ok(verdict(holds))
}

const fn verdict(holds: bool) -> BranchPrediction {
    if holds {
        BranchPrediction::AlwaysTaken
    } else {
        BranchPrediction::AlwaysNotTaken
    }
}
