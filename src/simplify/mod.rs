//! Predictable control-flow simplification.
//!
//! The pass this crate exists for: remove conditional jumps and switches
//! whose outcome is statically pinned down by known operand-stack values.
//! Flow obfuscators plant exactly such branches - `push 5; ifeq L` can never
//! jump, an opaque `lookupswitch` over a constant key always takes one arm -
//! and stripping them restores decompilable control flow.
//!
//! Per method the pass runs the constant frame analysis to a fixpoint,
//! rewrites the instruction stream under the predictor/resolver verdicts,
//! and - only when something changed - replaces the body and eliminates the
//! code that became unreachable. Methods and classes are independent;
//! [`JumpSimplifier::simplify_all`] fans classes out across the rayon pool
//! and combines the per-method counters by summation.
//!
//! # Example
//!
//! ```rust,ignore
//! use jarscope::{EventLog, JumpSimplifier, analysis::StringMethodResolver};
//!
//! let simplifier = JumpSimplifier::new(StringMethodResolver);
//! let events = EventLog::new();
//! let stats = simplifier.simplify_all(&mut classes, &events);
//! println!(
//!     "removed {} conditional jumps and {} switches",
//!     stats.jumps_removed, stats.switches_resolved
//! );
//! ```

mod dce;
mod predict;
mod rewrite;
mod switches;

pub use dce::remove_dead_code;
pub use predict::{predict_branch, BranchPrediction};
pub use switches::resolve_switch;

use std::{
    iter::Sum,
    ops::{Add, AddAssign},
};

use rayon::prelude::*;

use crate::{
    analysis::{ConstantResolver, ConstantTracker},
    bytecode::{Class, Method},
    events::{EventKind, EventLog},
};

/// Aggregate counters of one simplification run.
///
/// Combination is associative and order-independent, so per-method results
/// from a parallel run can be reduced in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyStats {
    /// Conditional branches removed.
    pub jumps_removed: usize,
    /// Switches resolved to direct jumps.
    pub switches_resolved: usize,
    /// Instructions eliminated as unreachable after rewriting.
    pub instructions_removed: usize,
    /// Methods whose body was replaced.
    pub methods_rewritten: usize,
}

impl SimplifyStats {
    /// Returns `true` if the run changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.methods_rewritten == 0
    }
}

impl Add for SimplifyStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            jumps_removed: self.jumps_removed + other.jumps_removed,
            switches_resolved: self.switches_resolved + other.switches_resolved,
            instructions_removed: self.instructions_removed + other.instructions_removed,
            methods_rewritten: self.methods_rewritten + other.methods_rewritten,
        }
    }
}

impl AddAssign for SimplifyStats {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for SimplifyStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Removes predictable conditional jumps and switches from method bodies.
///
/// The simplifier owns a [`ConstantResolver`] supplying external constant
/// knowledge and is otherwise stateless: each method is analyzed and
/// rewritten independently, and all visibility into a run goes through the
/// returned [`SimplifyStats`] and the caller's [`EventLog`].
pub struct JumpSimplifier<R> {
    resolver: R,
}

impl<R: ConstantResolver> JumpSimplifier<R> {
    /// Creates a simplifier over the given resolver.
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// The resolver this simplifier consults.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Simplifies a single method.
    ///
    /// The body is replaced only if at least one branch or switch was
    /// removed; otherwise the method is left byte-identical. Analysis
    /// failures are logged and yield zero simplifications - they never
    /// propagate.
    pub fn simplify_method(
        &self,
        class_name: &str,
        method: &mut Method,
        events: &EventLog,
    ) -> SimplifyStats {
        if !method.has_code() {
            return SimplifyStats::default();
        }
        let Some(body) = method.body.as_ref() else {
            return SimplifyStats::default();
        };
        if body.is_empty() {
            return SimplifyStats::default();
        }

        let owner = format!("{class_name}.{}", method.name);
        let tracker = ConstantTracker::new(&self.resolver, events);
        let frames = match tracker.analyze(&owner, body) {
            Ok(frames) => frames,
            Err(e) => {
                events
                    .record(EventKind::Error)
                    .method(owner)
                    .message(format!("analysis aborted: {e}"));
                return SimplifyStats::default();
            }
        };

        let Some(rewritten) = rewrite::rewrite_method(&owner, body, &frames, events) else {
            return SimplifyStats::default();
        };

        let mut new_body = rewritten.body;
        let instructions_removed = remove_dead_code(&mut new_body);
        if instructions_removed > 0 {
            events
                .record(EventKind::InstructionRemoved)
                .method(owner.clone())
                .message(format!("{instructions_removed} unreachable instructions"));
        }
        events.record(EventKind::MethodRewritten).method(owner).message(format!(
            "{} jumps, {} switches removed",
            rewritten.jumps_removed, rewritten.switches_resolved
        ));

        method.body = Some(new_body);
        SimplifyStats {
            jumps_removed: rewritten.jumps_removed,
            switches_resolved: rewritten.switches_resolved,
            instructions_removed,
            methods_rewritten: 1,
        }
    }

    /// Simplifies every method of a class.
    pub fn simplify_class(&self, class: &mut Class, events: &EventLog) -> SimplifyStats {
        let class_name = class.name.clone();
        class
            .methods
            .iter_mut()
            .map(|method| self.simplify_method(&class_name, method, events))
            .sum()
    }

    /// Simplifies a class collection in parallel.
    ///
    /// Classes (and methods) are independent, so the only shared state is
    /// the append-only event log; the per-class counters are summed by
    /// rayon's reduction.
    pub fn simplify_all(&self, classes: &mut [Class], events: &EventLog) -> SimplifyStats {
        classes
            .par_iter_mut()
            .map(|class| self.simplify_class(class, events))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_sum_is_order_independent() {
        let a = SimplifyStats {
            jumps_removed: 1,
            switches_resolved: 2,
            instructions_removed: 3,
            methods_rewritten: 1,
        };
        let b = SimplifyStats {
            jumps_removed: 10,
            switches_resolved: 0,
            instructions_removed: 5,
            methods_rewritten: 2,
        };
        assert_eq!(a + b, b + a);
        assert_eq!([a, b].into_iter().sum::<SimplifyStats>(), a + b);
        assert!(!(a + b).is_noop());
        assert!(SimplifyStats::default().is_noop());
    }
}
