//! Class and method containers.
//!
//! Minimal in-memory owners for the instruction streams this crate
//! transforms. Parsing the class-file container into these types (and
//! serializing the result back out) is the responsibility of an external
//! loader.

use bitflags::bitflags;

use crate::bytecode::MethodBody;
use std::sync::Arc;

bitflags! {
    /// Method access and property flags from the class-file format.
    ///
    /// Only the flags the simplifier consults are interpreted; the rest are
    /// carried through untouched for the loader's benefit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodAccessFlags: u16 {
        /// Declared `public`.
        const PUBLIC = 0x0001;
        /// Declared `private`.
        const PRIVATE = 0x0002;
        /// Declared `protected`.
        const PROTECTED = 0x0004;
        /// Declared `static`.
        const STATIC = 0x0008;
        /// Declared `final`.
        const FINAL = 0x0010;
        /// Declared `synchronized`.
        const SYNCHRONIZED = 0x0020;
        /// Implemented in native code; carries no bytecode.
        const NATIVE = 0x0100;
        /// Declared `abstract`; carries no bytecode.
        const ABSTRACT = 0x0400;
        /// Compiler-generated, not present in source.
        const SYNTHETIC = 0x1000;
    }
}

/// A single method of a class.
#[derive(Debug, Clone)]
pub struct Method {
    /// Method name.
    pub name: Arc<str>,
    /// Method descriptor, e.g. `(I)V`.
    pub descriptor: Arc<str>,
    /// Access and property flags.
    pub flags: MethodAccessFlags,
    /// The instruction stream, absent for `abstract` and `native` methods.
    pub body: Option<MethodBody>,
}

impl Method {
    /// Creates a method with a body.
    #[must_use]
    pub fn new(
        name: impl Into<Arc<str>>,
        descriptor: impl Into<Arc<str>>,
        flags: MethodAccessFlags,
        body: MethodBody,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            flags,
            body: Some(body),
        }
    }

    /// Creates a bodyless (`abstract` or `native`) method.
    #[must_use]
    pub fn without_code(
        name: impl Into<Arc<str>>,
        descriptor: impl Into<Arc<str>>,
        flags: MethodAccessFlags,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            flags,
            body: None,
        }
    }

    /// Returns `true` if this method carries bytecode to analyze.
    #[must_use]
    pub fn has_code(&self) -> bool {
        self.body.is_some()
            && !self
                .flags
                .intersects(MethodAccessFlags::NATIVE | MethodAccessFlags::ABSTRACT)
    }
}

/// A class with its methods.
#[derive(Debug, Clone)]
pub struct Class {
    /// Internal class name, e.g. `com/example/Main`.
    pub name: Arc<str>,
    /// The class's methods.
    pub methods: Vec<Method>,
}

impl Class {
    /// Creates a class from its internal name and methods.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, methods: Vec<Method>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| &*m.name == name)
    }
}
