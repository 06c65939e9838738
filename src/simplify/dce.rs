//! Dead code elimination.
//!
//! Post-pass over a rewritten body: every instruction unreachable from the
//! method entry or from a live exception-handler entry is removed. A handler
//! entry is live only while some instruction of its protected range is
//! reachable, which requires iterating handler discovery and the reachability
//! walk to a fixpoint (a handler's code can itself make another handler's
//! range live).
//!
//! Labels survive removal by rank mapping: each label is re-pointed to the
//! number of surviving instructions before its old target, which keeps labels
//! aimed into removed regions pointing at the next surviving instruction and
//! keeps end-exclusive handler ranges well-formed. Handlers whose protected
//! range shrinks to nothing are dropped.

use crate::bytecode::MethodBody;

/// Removes unreachable instructions from a body.
///
/// Returns the number of instructions removed.
pub fn remove_dead_code(body: &mut MethodBody) -> usize {
    let len = body.len();
    if len == 0 {
        return 0;
    }

    let mut reachable = vec![false; len];
    let mut worklist = vec![0usize];

    loop {
        while let Some(index) = worklist.pop() {
            if reachable[index] {
                continue;
            }
            reachable[index] = true;
            for successor in body.successors(index) {
                if successor < len && !reachable[successor] {
                    worklist.push(successor);
                }
            }
        }

        // Pull in handlers whose protected range became reachable.
        let mut grew = false;
        for handler in body.handlers() {
            let entry = body.target(handler.handler);
            if entry >= len || reachable[entry] {
                continue;
            }
            let start = body.target(handler.start);
            let end = body.target(handler.end).min(len);
            if (start..end).any(|index| reachable[index]) {
                worklist.push(entry);
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }

    let removed = reachable.iter().filter(|live| !**live).count();
    if removed == 0 {
        return 0;
    }

    // rank[i] = surviving instructions before index i; rank[len] closes the
    // end-of-stream position.
    let mut rank = Vec::with_capacity(len + 1);
    let mut surviving = 0;
    for live in &reachable {
        rank.push(surviving);
        if *live {
            surviving += 1;
        }
    }
    rank.push(surviving);

    let instructions = body
        .instructions()
        .iter()
        .zip(&reachable)
        .filter(|(_, live)| **live)
        .map(|(insn, _)| insn.clone())
        .collect();
    let labels = body
        .label_targets()
        .iter()
        .map(|&target| rank[target.min(len)])
        .collect();
    let handlers = body
        .handlers()
        .iter()
        .filter(|handler| {
            let start = body.target(handler.start).min(len);
            let end = body.target(handler.end).min(len);
            rank[start] < rank[end]
        })
        .cloned()
        .collect();

    body.replace(instructions, labels, handlers);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{ExceptionHandler, Instruction};

    #[test]
    fn test_straight_line_keeps_everything() {
        let mut body = MethodBody::new(0);
        body.push(Instruction::PushInt(1));
        body.push(Instruction::Pop);
        body.push(Instruction::Return);

        assert_eq!(remove_dead_code(&mut body), 0);
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn test_code_behind_goto_is_removed() {
        let mut body = MethodBody::new(0);
        let target = body.new_label();
        body.push(Instruction::Goto(target));
        body.push(Instruction::PushInt(1));
        body.push(Instruction::Pop);
        body.bind(target);
        body.push(Instruction::Return);

        assert_eq!(remove_dead_code(&mut body), 2);
        assert_eq!(body.len(), 2);
        assert_eq!(body.target(target), 1);
        assert!(matches!(body.instructions()[1], Instruction::Return));
    }

    #[test]
    fn test_handler_of_dead_range_is_dropped() {
        let mut body = MethodBody::new(0);
        let skip = body.new_label();
        body.push(Instruction::Goto(skip));
        let try_start = body.label_here();
        body.push(Instruction::PushInt(1)); // dead, protected
        let try_end = body.new_label();
        body.bind(try_end);
        let handler = body.label_here();
        body.push(Instruction::Return); // dead handler code
        body.bind(skip);
        body.push(Instruction::Return);
        body.add_handler(ExceptionHandler {
            start: try_start,
            end: try_end,
            handler,
            catch_type: None,
        });

        assert_eq!(remove_dead_code(&mut body), 2);
        assert!(body.handlers().is_empty());
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_live_handler_keeps_its_code() {
        let mut body = MethodBody::new(0);
        let try_start = body.label_here();
        body.push(Instruction::PushInt(1));
        body.push(Instruction::Pop);
        let try_end = body.new_label();
        let done = body.new_label();
        body.push(Instruction::Goto(done));
        body.bind(try_end);
        let handler = body.label_here();
        body.push(Instruction::Pop);
        body.push(Instruction::Return);
        body.bind(done);
        body.push(Instruction::Return);
        body.add_handler(ExceptionHandler {
            start: try_start,
            end: try_end,
            handler,
            catch_type: None,
        });

        assert_eq!(remove_dead_code(&mut body), 0);
        assert_eq!(body.handlers().len(), 1);
        assert_eq!(body.target(handler), 3);
    }
}
