//! In-memory bytecode model for JVM method bodies.
//!
//! This module provides the mutable representation the analysis and rewriting
//! passes operate on: a structured [`Instruction`] set, label-addressed
//! control transfers resolved through a per-body table, exception handler
//! ranges, and the [`Class`]/[`Method`] containers an external class-file
//! loader populates.
//!
//! # Key Components
//!
//! - [`Instruction`] / [`Condition`] - the analyzed stack-machine subset
//! - [`MethodBody`] - instruction arena with label table and handlers
//! - [`Class`] / [`Method`] - ownership containers with access flags
//! - [`parse_method_descriptor`] - descriptor shape extraction

mod body;
mod class;
mod descriptor;
mod insn;

pub use body::{ExceptionHandler, MethodBody};
pub use class::{Class, Method, MethodAccessFlags};
pub use descriptor::{parse_method_descriptor, MethodDescriptor};
pub use insn::{BinaryOp, Condition, Instruction, InvokeKind, Label, UnaryOp};
