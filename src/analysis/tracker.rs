//! Constant frame analysis.
//!
//! An iterative dataflow pass over a method's instruction stream that
//! computes, for every instruction, the abstract operand stack and locals
//! *before* that instruction executes. The control-flow graph is derived
//! directly from the stream: sequential fallthrough, every branch and switch
//! edge, and an edge from each protected instruction to its exception
//! handlers.
//!
//! # Algorithm
//!
//! Standard worklist iteration. An instruction is processed by cloning its
//! incoming frame, pushing the frame's handler projection along any exception
//! edges, applying the transfer function, and merging the outgoing frame into
//! every successor; a successor whose frame changed is re-queued. Termination
//! follows from the finite height of the value domain - a slot moves from
//! known to unknown at most once - with an iteration budget as a safeguard
//! against implementation error.
//!
//! # Failure isolation
//!
//! A transfer failure (stack underflow, bad local index, invalid descriptor)
//! is local: it is logged against the owning method, the instruction's
//! successors simply receive no frame from that edge, and the rest of the
//! method converges normally. Resolver failures are caught at the resolver
//! boundary and degrade to unknown values.

use std::collections::VecDeque;

use crate::{
    analysis::{AbstractValue, ConstValue, ConstantResolver, Frame},
    bytecode::{parse_method_descriptor, BinaryOp, Instruction, InvokeKind, MethodBody, UnaryOp},
    events::{EventKind, EventLog},
    Error, Result,
};

/// Worklist steps allowed per instruction before the fixpoint is declared
/// divergent. The domain's finite height makes this generous.
const STEPS_PER_INSN: usize = 16;

/// Computes one abstract [`Frame`] per instruction of a method body.
///
/// The tracker is stateless between runs; it borrows a resolver for field
/// and call results and an event log for failure visibility.
pub struct ConstantTracker<'a, R: ConstantResolver + ?Sized> {
    resolver: &'a R,
    events: &'a EventLog,
}

impl<'a, R: ConstantResolver + ?Sized> ConstantTracker<'a, R> {
    /// Creates a tracker over the given resolver and event log.
    pub fn new(resolver: &'a R, events: &'a EventLog) -> Self {
        Self { resolver, events }
    }

    /// Runs the analysis to a fixpoint.
    ///
    /// Returns one entry per instruction: the frame before it, or `None` if
    /// the instruction is unreachable or its incoming frames never became
    /// computable. The rewriter treats `None` as "leave untouched".
    ///
    /// # Errors
    ///
    /// Returns [`Error::IterationLimit`] if the worklist exceeds its budget;
    /// per-instruction failures are logged and isolated instead.
    pub fn analyze(&self, owner: &str, body: &MethodBody) -> Result<Vec<Option<Frame>>> {
        let len = body.len();
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut frames: Vec<Option<Frame>> = vec![None; len];
        frames[0] = Some(Frame::entry(body.max_locals()));

        let mut queued = vec![false; len];
        let mut worklist = VecDeque::with_capacity(len);
        worklist.push_back(0);
        queued[0] = true;

        let budget = len.saturating_mul(STEPS_PER_INSN).saturating_add(64);
        let mut steps = 0usize;

        while let Some(index) = worklist.pop_front() {
            queued[index] = false;
            steps += 1;
            if steps > budget {
                return Err(Error::IterationLimit(budget));
            }

            let Some(frame) = frames[index].clone() else {
                continue;
            };

            // Exception edges observe the state before the instruction.
            for handler in body.handlers() {
                let start = body.target(handler.start);
                let end = body.target(handler.end);
                if index >= start && index < end {
                    let entry = body.target(handler.handler);
                    self.flow_into(
                        owner,
                        entry,
                        frame.for_handler(),
                        &mut frames,
                        &mut worklist,
                        &mut queued,
                    );
                }
            }

            let mut out = frame;
            match self.transfer(owner, index, &body.instructions()[index], &mut out) {
                Ok(()) => {
                    for successor in body.successors(index) {
                        if successor >= len {
                            self.events
                                .record(EventKind::Error)
                                .at(owner, index)
                                .message("control flow runs past the end of the method");
                            continue;
                        }
                        self.flow_into(
                            owner,
                            successor,
                            out.clone(),
                            &mut frames,
                            &mut worklist,
                            &mut queued,
                        );
                    }
                }
                Err(e) => {
                    self.events
                        .record(EventKind::Error)
                        .at(owner, index)
                        .message(format!("invalid stack: {e}"));
                }
            }
        }

        Ok(frames)
    }

    /// Merges a frame flowing along one edge into its target, queueing the
    /// target when its state changed.
    fn flow_into(
        &self,
        owner: &str,
        target: usize,
        incoming: Frame,
        frames: &mut [Option<Frame>],
        worklist: &mut VecDeque<usize>,
        queued: &mut [bool],
    ) {
        let changed = if let Some(existing) = frames[target].as_mut() {
            match existing.merge(&incoming) {
                Ok(changed) => changed,
                Err(e) => {
                    self.events
                        .record(EventKind::Error)
                        .at(owner, target)
                        .message(format!("invalid stack: {e}"));
                    return;
                }
            }
        } else {
            frames[target] = Some(incoming);
            true
        };
        if changed && !queued[target] {
            queued[target] = true;
            worklist.push_back(target);
        }
    }

    /// Applies one instruction's abstract semantics to `frame`.
    fn transfer(
        &self,
        owner: &str,
        index: usize,
        insn: &Instruction,
        frame: &mut Frame,
    ) -> Result<()> {
        match insn {
            Instruction::Nop | Instruction::Goto(_) | Instruction::Return => {}

            Instruction::PushInt(v) => frame.push_known(ConstValue::Int(*v)),
            Instruction::PushLong(v) => frame.push_known(ConstValue::Long(*v)),
            Instruction::PushFloat(v) => frame.push_known(ConstValue::Float(*v)),
            Instruction::PushString(s) => frame.push_known(ConstValue::Str(s.clone())),
            Instruction::PushNull => frame.push_known(ConstValue::Null),

            Instruction::Load(slot) => {
                let value = frame.local(*slot)?.clone();
                frame.push(value);
            }
            Instruction::Store(slot) => {
                let value = frame.pop()?;
                frame.set_local(*slot, value)?;
            }

            Instruction::ArrayLoad => {
                frame.pop()?;
                frame.pop()?;
                frame.push(AbstractValue::Unknown);
            }
            Instruction::ArrayStore => {
                frame.pop()?;
                frame.pop()?;
                frame.pop()?;
            }

            Instruction::Pop => {
                frame.pop()?;
            }
            Instruction::Pop2 => {
                frame.pop()?;
                frame.pop()?;
            }
            Instruction::Dup => {
                let top = frame.pop()?;
                frame.push(top.clone());
                frame.push(top);
            }
            Instruction::Swap => {
                let b = frame.pop()?;
                let a = frame.pop()?;
                frame.push(b);
                frame.push(a);
            }

            Instruction::Unary(op) => {
                let value = frame.pop()?;
                frame.push(Self::eval_unary(*op, &value));
            }
            Instruction::Binary(op) => {
                let b = frame.pop()?;
                let a = frame.pop()?;
                frame.push(Self::eval_binary(*op, &a, &b));
            }

            Instruction::GetStatic {
                owner: field_owner,
                name,
                descriptor,
            } => {
                let value = self.resolve_field(owner, index, field_owner, name, descriptor);
                frame.push(value);
            }
            Instruction::GetField {
                owner: field_owner,
                name,
                descriptor,
            } => {
                frame.pop()?;
                let value = self.resolve_field(owner, index, field_owner, name, descriptor);
                frame.push(value);
            }
            Instruction::PutStatic { .. } => {
                frame.pop()?;
            }
            Instruction::PutField { .. } => {
                frame.pop()?;
                frame.pop()?;
            }

            Instruction::Invoke {
                kind,
                owner: method_owner,
                name,
                descriptor,
            } => {
                let signature = parse_method_descriptor(descriptor)?;
                for _ in 0..signature.arguments {
                    frame.pop()?;
                }
                let receiver = if *kind == InvokeKind::Static {
                    None
                } else {
                    Some(frame.pop()?)
                };

                // Only a no-argument call on a known receiver can resolve;
                // everything else is an unknown result.
                let result = match receiver {
                    Some(AbstractValue::Known(value)) if signature.arguments == 0 => {
                        self.resolve_call(owner, index, &value, method_owner, name, descriptor)
                    }
                    _ => AbstractValue::Unknown,
                };
                if signature.returns {
                    frame.push(result);
                }
            }

            Instruction::New(_) => frame.push(AbstractValue::Unknown),

            Instruction::Branch { condition, .. } => {
                for _ in 0..condition.operand_count() {
                    frame.pop()?;
                }
            }
            Instruction::TableSwitch { .. }
            | Instruction::LookupSwitch { .. }
            | Instruction::ReturnValue
            | Instruction::Throw => {
                frame.pop()?;
            }
        }
        Ok(())
    }

    fn eval_unary(op: UnaryOp, value: &AbstractValue) -> AbstractValue {
        let Some(known) = value.known() else {
            return AbstractValue::Unknown;
        };
        match op {
            UnaryOp::Neg => known.negate(),
        }
        .map_or(AbstractValue::Unknown, AbstractValue::Known)
    }

    fn eval_binary(op: BinaryOp, a: &AbstractValue, b: &AbstractValue) -> AbstractValue {
        let (Some(a), Some(b)) = (a.known(), b.known()) else {
            return AbstractValue::Unknown;
        };
        match op {
            BinaryOp::Add => a.add(b),
            BinaryOp::Sub => a.sub(b),
            BinaryOp::Mul => a.mul(b),
            BinaryOp::Div => a.div(b),
            BinaryOp::Rem => a.rem(b),
            BinaryOp::And => a.bitwise_and(b),
            BinaryOp::Or => a.bitwise_or(b),
            BinaryOp::Xor => a.bitwise_xor(b),
            BinaryOp::Shl => a.shl(b),
            BinaryOp::Shr => a.shr(b),
            BinaryOp::Ushr => a.ushr(b),
            BinaryOp::LongCmp => a.long_cmp(b),
            BinaryOp::FloatCmpL => a.float_cmp(b, -1),
            BinaryOp::FloatCmpG => a.float_cmp(b, 1),
        }
        .map_or(AbstractValue::Unknown, AbstractValue::Known)
    }

    fn resolve_field(
        &self,
        owner: &str,
        index: usize,
        field_owner: &str,
        name: &str,
        descriptor: &str,
    ) -> AbstractValue {
        match self.resolver.field_value(field_owner, name, descriptor) {
            Ok(Some(value)) => AbstractValue::Known(value),
            Ok(None) => AbstractValue::Unknown,
            Err(e) => {
                self.events
                    .record(EventKind::Error)
                    .at(owner, index)
                    .message(format!("resolver failed for {field_owner}.{name}: {e}"));
                AbstractValue::Unknown
            }
        }
    }

    fn resolve_call(
        &self,
        owner: &str,
        index: usize,
        receiver: &ConstValue,
        method_owner: &str,
        name: &str,
        descriptor: &str,
    ) -> AbstractValue {
        match self
            .resolver
            .method_return(receiver, method_owner, name, descriptor)
        {
            Ok(Some(value)) => AbstractValue::Known(value),
            Ok(None) => AbstractValue::Unknown,
            Err(e) => {
                self.events
                    .record(EventKind::Error)
                    .at(owner, index)
                    .message(format!("resolver failed for {method_owner}.{name}: {e}"));
                AbstractValue::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::EmptyResolver;
    use crate::bytecode::Condition;

    fn analyze(body: &MethodBody) -> Vec<Option<Frame>> {
        let events = EventLog::new();
        ConstantTracker::new(&EmptyResolver, &events)
            .analyze("Test.m", body)
            .unwrap()
    }

    #[test]
    fn test_straight_line_constants() {
        let mut body = MethodBody::new(1);
        body.push(Instruction::PushInt(2));
        body.push(Instruction::PushInt(3));
        body.push(Instruction::Binary(BinaryOp::Mul));
        body.push(Instruction::Store(0));
        body.push(Instruction::Load(0));
        body.push(Instruction::ReturnValue);

        let frames = analyze(&body);
        // Before the final return the reloaded product is on the stack.
        let frame = frames[5].as_ref().unwrap();
        assert_eq!(frame.top().unwrap().as_int(), Some(6));
    }

    #[test]
    fn test_join_disagreement_goes_unknown() {
        // Diamond storing 1 on one arm and 2 on the other.
        let mut body = MethodBody::new(2);
        let else_arm = body.new_label();
        let join = body.new_label();
        body.push(Instruction::Load(0));
        body.push(Instruction::Branch {
            condition: Condition::EqZero,
            target: else_arm,
        });
        body.push(Instruction::PushInt(1));
        body.push(Instruction::Store(1));
        body.push(Instruction::Goto(join));
        body.bind(else_arm);
        body.push(Instruction::PushInt(2));
        body.push(Instruction::Store(1));
        body.bind(join);
        body.push(Instruction::Load(1));
        body.push(Instruction::ReturnValue);

        let frames = analyze(&body);
        let join_frame = frames[7].as_ref().unwrap();
        assert!(!join_frame.local(1).unwrap().is_known());
    }

    #[test]
    fn test_join_agreement_stays_known() {
        let mut body = MethodBody::new(2);
        let else_arm = body.new_label();
        let join = body.new_label();
        body.push(Instruction::Load(0));
        body.push(Instruction::Branch {
            condition: Condition::EqZero,
            target: else_arm,
        });
        body.push(Instruction::PushInt(7));
        body.push(Instruction::Store(1));
        body.push(Instruction::Goto(join));
        body.bind(else_arm);
        body.push(Instruction::PushInt(7));
        body.push(Instruction::Store(1));
        body.bind(join);
        body.push(Instruction::Load(1));
        body.push(Instruction::ReturnValue);

        let frames = analyze(&body);
        let join_frame = frames[7].as_ref().unwrap();
        assert_eq!(join_frame.local(1).unwrap().as_int(), Some(7));
    }

    #[test]
    fn test_loop_converges_to_unknown_counter() {
        // i = 0; loop: i = i + 1; if i unknown-compare goto loop
        let mut body = MethodBody::new(1);
        let loop_head = body.new_label();
        body.push(Instruction::PushInt(0));
        body.push(Instruction::Store(0));
        body.bind(loop_head);
        body.push(Instruction::Load(0));
        body.push(Instruction::PushInt(1));
        body.push(Instruction::Binary(BinaryOp::Add));
        body.push(Instruction::Store(0));
        body.push(Instruction::Load(0));
        body.push(Instruction::Branch {
            condition: Condition::LtZero,
            target: loop_head,
        });
        body.push(Instruction::Return);

        let frames = analyze(&body);
        // The loop-carried counter must collapse to unknown at the head.
        let head_frame = frames[2].as_ref().unwrap();
        assert!(!head_frame.local(0).unwrap().is_known());
    }

    #[test]
    fn test_transfer_failure_is_isolated() {
        // Pop on an empty stack, then a well-formed tail reachable from a branch
        // above the failure point.
        let mut body = MethodBody::new(0);
        let tail = body.new_label();
        body.push(Instruction::PushInt(1));
        body.push(Instruction::Branch {
            condition: Condition::NeZero,
            target: tail,
        });
        body.push(Instruction::Pop); // stack is empty here: malformed
        body.push(Instruction::Return);
        body.bind(tail);
        body.push(Instruction::Return);

        let events = EventLog::new();
        let frames = ConstantTracker::new(&EmptyResolver, &events)
            .analyze("Test.m", &body)
            .unwrap();

        // The malformed instruction was reached and logged, its successor got
        // no frame, and the branch target still converged.
        assert!(frames[2].is_some());
        assert!(frames[3].is_none());
        assert!(frames[4].is_some());
        assert_eq!(events.count_kind(EventKind::Error), 1);
    }

    #[test]
    fn test_handler_sees_unknown_exception_and_merged_locals() {
        let mut body = MethodBody::new(1);
        let try_start = body.new_label();
        let try_end = body.new_label();
        let handler = body.new_label();
        let done = body.new_label();

        body.bind(try_start);
        body.push(Instruction::PushInt(5));
        body.push(Instruction::Store(0));
        body.push(Instruction::Invoke {
            kind: InvokeKind::Static,
            owner: "X".into(),
            name: "m".into(),
            descriptor: "()V".into(),
        });
        body.bind(try_end);
        body.push(Instruction::Goto(done));
        body.bind(handler);
        body.push(Instruction::Pop);
        body.push(Instruction::Load(0));
        body.push(Instruction::ReturnValue);
        body.bind(done);
        body.push(Instruction::Return);
        body.add_handler(crate::bytecode::ExceptionHandler {
            start: try_start,
            end: try_end,
            handler,
            catch_type: None,
        });

        let frames = analyze(&body);
        let entry = frames[4].as_ref().unwrap();
        assert_eq!(entry.stack_size(), 1);
        assert!(!entry.top().unwrap().is_known());
        // Local 0 is unknown at the handler: the store may not have run yet
        // when the protected region throws.
        assert!(!entry.local(0).unwrap().is_known());
    }

    #[test]
    fn test_empty_body() {
        let body = MethodBody::new(0);
        assert!(analyze(&body).is_empty());
    }
}
