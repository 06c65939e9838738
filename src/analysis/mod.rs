//! Constant tracking over JVM method bodies.
//!
//! This module provides the abstract-interpretation layer of the simplifier:
//! a shallow constant domain, per-instruction frames, and the worklist
//! dataflow engine that computes them. Field reads and known-receiver call
//! results are delegated to a pluggable [`ConstantResolver`].
//!
//! # Key Components
//!
//! - [`AbstractValue`] / [`ConstValue`] - the value domain
//! - [`Frame`] - operand stack and locals at one instruction
//! - [`ConstantTracker`] - the fixpoint dataflow engine
//! - [`ConstantResolver`] - external constant knowledge, with
//!   [`EmptyResolver`] and [`StringMethodResolver`] implementations

mod frame;
mod resolver;
mod tracker;
mod value;

pub use frame::Frame;
pub use resolver::{ConstantResolver, EmptyResolver, StringMethodResolver};
pub use tracker::ConstantTracker;
pub use value::{AbstractValue, ConstValue};
