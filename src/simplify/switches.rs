//! Switch target resolution.
//!
//! The switch counterpart of the branch predictor: given the frame before a
//! `tableswitch` or `lookupswitch` and the instruction itself, compute the
//! one target the switch must take, or decline. There is no error path - a
//! missing, unknown or non-integer key simply leaves the switch untouched.

use crate::{
    analysis::Frame,
    bytecode::{Instruction, Label},
};

/// Resolves a switch to its only possible target.
///
/// Returns `None` unless the top stack slot is a known 32-bit integer and
/// `insn` is a switch. Table switches match `min ≤ key ≤ max` and index the
/// dense target list with `key - min`; lookup switches match the sparse key
/// list. A non-matching key resolves to the default target.
#[must_use]
pub fn resolve_switch(frame: &Frame, insn: &Instruction) -> Option<Label> {
    let key = frame.top()?.as_int()?;
    match insn {
        Instruction::TableSwitch {
            min,
            max,
            targets,
            default,
        } => {
            if key >= *min && key <= *max {
                let index = (i64::from(key) - i64::from(*min)) as usize;
                Some(targets.get(index).copied().unwrap_or(*default))
            } else {
                Some(*default)
            }
        }
        Instruction::LookupSwitch {
            keys,
            targets,
            default,
        } => {
            let resolved = keys
                .iter()
                .position(|k| *k == key)
                .and_then(|index| targets.get(index).copied())
                .unwrap_or(*default);
            Some(resolved)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AbstractValue, ConstValue};

    fn frame_with_key(value: AbstractValue) -> Frame {
        let mut frame = Frame::entry(0);
        frame.push(value);
        frame
    }

    fn table(min: i32, max: i32) -> (Instruction, Vec<Label>, Label) {
        let count = (max - min + 1) as usize;
        let targets: Vec<Label> = (0..count as u32).map(Label).collect();
        let default = Label(99);
        let insn = Instruction::TableSwitch {
            min,
            max,
            targets: targets.clone(),
            default,
        };
        (insn, targets, default)
    }

    #[test]
    fn test_table_in_range() {
        let (insn, targets, _) = table(2, 4);
        for key in 2..=4 {
            let frame = frame_with_key(AbstractValue::Known(ConstValue::Int(key)));
            assert_eq!(
                resolve_switch(&frame, &insn),
                Some(targets[(key - 2) as usize])
            );
        }
    }

    #[test]
    fn test_table_out_of_range_takes_default() {
        let (insn, _, default) = table(0, 2);
        for key in [-1, 3, 7, i32::MIN, i32::MAX] {
            let frame = frame_with_key(AbstractValue::Known(ConstValue::Int(key)));
            assert_eq!(resolve_switch(&frame, &insn), Some(default));
        }
    }

    #[test]
    fn test_lookup_matches_key() {
        let insn = Instruction::LookupSwitch {
            keys: vec![-10, 0, 1000],
            targets: vec![Label(0), Label(1), Label(2)],
            default: Label(9),
        };
        let frame = frame_with_key(AbstractValue::Known(ConstValue::Int(1000)));
        assert_eq!(resolve_switch(&frame, &insn), Some(Label(2)));

        let frame = frame_with_key(AbstractValue::Known(ConstValue::Int(17)));
        assert_eq!(resolve_switch(&frame, &insn), Some(Label(9)));
    }

    #[test]
    fn test_unknown_or_wrong_kind_declines() {
        let (insn, _, _) = table(0, 1);
        let frame = frame_with_key(AbstractValue::Unknown);
        assert_eq!(resolve_switch(&frame, &insn), None);

        let frame = frame_with_key(AbstractValue::Known(ConstValue::Str("0".into())));
        assert_eq!(resolve_switch(&frame, &insn), None);

        let frame = frame_with_key(AbstractValue::Known(ConstValue::Long(0)));
        assert_eq!(resolve_switch(&frame, &insn), None);

        let empty = Frame::entry(0);
        assert_eq!(resolve_switch(&empty, &insn), None);
    }
}
