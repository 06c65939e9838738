// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # jarscope
//!
//! A high-performance, cross-platform framework for analyzing and simplifying JVM bytecode.
//! Built in pure Rust, `jarscope` removes the predictable control flow that obfuscators
//! plant in class files: conditional jumps whose outcome is pinned down by constant
//! operand-stack values, and switches over statically known keys.
//!
//! ## Features
//!
//! - **🔍 Constant frame analysis** - Worklist dataflow computing the known operand stack
//!   and locals before every instruction, including loops and exception edges
//! - **⚡ Branch and switch prediction** - Exact per-opcode semantics for all eight
//!   comparison families, `tableswitch` and `lookupswitch`
//! - **🔧 Safe stream surgery** - Label-preserving rewriting with exception-table-aware
//!   dead code elimination
//! - **🧩 Pluggable constant resolution** - Inject field values and call results through
//!   the [`analysis::ConstantResolver`] seam
//! - **📊 Structured reporting** - Per-run counters plus a thread-safe [`EventLog`];
//!   a malformed method is logged and skipped, never fatal
//! - **🛡️ Embarrassingly parallel** - Classes fan out across the rayon pool with an
//!   associative counter reduction
//!
//! ## Quick Start
//!
//! ```rust
//! use jarscope::{
//!     analysis::StringMethodResolver,
//!     bytecode::{Class, Condition, Instruction, Method, MethodAccessFlags, MethodBody},
//!     EventLog, JumpSimplifier,
//! };
//!
//! // push 5; ifeq L; ... - the jump can never be taken.
//! let mut body = MethodBody::new(0);
//! let target = body.new_label();
//! body.push(Instruction::PushInt(5));
//! body.push(Instruction::Branch { condition: Condition::EqZero, target });
//! body.push(Instruction::Return);
//! body.bind(target);
//! body.push(Instruction::Return);
//!
//! let mut class = Class::new(
//!     "com/example/Main",
//!     vec![Method::new("run", "()V", MethodAccessFlags::PUBLIC, body)],
//! );
//!
//! let simplifier = JumpSimplifier::new(StringMethodResolver);
//! let events = EventLog::new();
//! let stats = simplifier.simplify_class(&mut class, &events);
//! assert_eq!(stats.jumps_removed, 1);
//! ```
//!
//! ## Architecture
//!
//! `jarscope` is organized into several key modules:
//!
//! - [`bytecode`] - In-memory instruction model: label-addressed streams, exception
//!   handler tables, class/method containers
//! - [`analysis`] - The abstract value domain, per-instruction frames and the fixpoint
//!   dataflow engine, with the [`analysis::ConstantResolver`] extension point
//! - [`simplify`] - Branch predictor, switch resolver, stream rewriter, dead code
//!   eliminator and the [`JumpSimplifier`] entry point
//! - [`events`] - Structured event log shared by every pass
//!
//! Parsing the class-file container into this model (and writing it back out) is the
//! job of a loader built on top of this crate; all analysis here is pure and in-memory.

#[macro_use]
pub(crate) mod error;

pub mod analysis;
pub mod bytecode;
pub mod events;
pub mod simplify;

/// Convenient result alias over this library's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;
pub use events::{Event, EventKind, EventLog};
pub use simplify::{JumpSimplifier, SimplifyStats};

/// Convenient re-exports of the most commonly used types.
pub mod prelude {
    pub use crate::{
        analysis::{
            AbstractValue, ConstValue, ConstantResolver, EmptyResolver, Frame,
            StringMethodResolver,
        },
        bytecode::{
            Class, Condition, ExceptionHandler, Instruction, Label, Method, MethodAccessFlags,
            MethodBody,
        },
        simplify::{remove_dead_code, BranchPrediction, JumpSimplifier, SimplifyStats},
        Error, EventKind, EventLog, Result,
    };
}
