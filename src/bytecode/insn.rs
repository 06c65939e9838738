//! Structured instruction representation for JVM method bodies.
//!
//! This module defines the in-memory instruction model the analysis and
//! rewriting passes operate on. Instructions are held in program order by a
//! [`crate::bytecode::MethodBody`] and reference control-transfer targets
//! through opaque [`Label`] identities; the body's label table maps every
//! label to a stable instruction index. A loader for the class-file container
//! format is expected to lower real bytecode into this model and to raise the
//! rewritten stream back out of it.
//!
//! # Stack model
//!
//! The operand stack is modelled one value per slot: wide (category-2) values
//! such as `long` occupy a *single* slot here, unlike the raw class-file
//! encoding. [`Instruction::Pop2`] removes the two topmost slots and is only
//! emitted for pairs of single-width values (the two operands of an integer
//! or reference comparison).

use std::{fmt, sync::Arc};

use strum::{EnumCount, EnumIter};

/// Opaque identity of a position in an instruction stream.
///
/// A label is only meaningful together with the [`crate::bytecode::MethodBody`]
/// that created it; the body's label table resolves it to an instruction
/// index. Label identities are stable across rewriting - a rewritten body
/// keeps the same labels and only re-points the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub(crate) u32);

impl Label {
    /// Returns the raw table slot of this label.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// The condition tested by a two-way conditional branch.
///
/// The sixteen conditions fall into the comparison families of the JVM
/// instruction set: integer tests against zero, reference null tests,
/// two-operand integer comparisons and two-operand reference comparisons.
/// [`Condition::operand_count`] gives the number of stack slots the branch
/// consumes, which is also the width of the pop a simplified branch must emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter)]
pub enum Condition {
    /// Branch if the top integer is zero (`ifeq`).
    EqZero,
    /// Branch if the top integer is not zero (`ifne`).
    NeZero,
    /// Branch if the top integer is negative (`iflt`).
    LtZero,
    /// Branch if the top integer is zero or positive (`ifge`).
    GeZero,
    /// Branch if the top integer is positive (`ifgt`).
    GtZero,
    /// Branch if the top integer is zero or negative (`ifle`).
    LeZero,
    /// Branch if the top reference is null (`ifnull`).
    IsNull,
    /// Branch if the top reference is not null (`ifnonnull`).
    NonNull,
    /// Branch if the two top integers are equal (`if_icmpeq`).
    IntEq,
    /// Branch if the two top integers differ (`if_icmpne`).
    IntNe,
    /// Branch if the first-pushed integer is less than the top (`if_icmplt`).
    IntLt,
    /// Branch if the first-pushed integer is greater or equal (`if_icmpge`).
    IntGe,
    /// Branch if the first-pushed integer is greater than the top (`if_icmpgt`).
    IntGt,
    /// Branch if the first-pushed integer is less or equal (`if_icmple`).
    IntLe,
    /// Branch if the two top references are equal (`if_acmpeq`).
    RefEq,
    /// Branch if the two top references differ (`if_acmpne`).
    RefNe,
}

impl Condition {
    /// Number of stack slots this condition consumes (one or two).
    #[must_use]
    pub const fn operand_count(self) -> usize {
        match self {
            Self::EqZero
            | Self::NeZero
            | Self::LtZero
            | Self::GeZero
            | Self::GtZero
            | Self::LeZero
            | Self::IsNull
            | Self::NonNull => 1,
            _ => 2,
        }
    }

    /// The class-file mnemonic of the branch testing this condition.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::EqZero => "ifeq",
            Self::NeZero => "ifne",
            Self::LtZero => "iflt",
            Self::GeZero => "ifge",
            Self::GtZero => "ifgt",
            Self::LeZero => "ifle",
            Self::IsNull => "ifnull",
            Self::NonNull => "ifnonnull",
            Self::IntEq => "if_icmpeq",
            Self::IntNe => "if_icmpne",
            Self::IntLt => "if_icmplt",
            Self::IntGe => "if_icmpge",
            Self::IntGt => "if_icmpgt",
            Self::IntLe => "if_icmple",
            Self::RefEq => "if_acmpeq",
            Self::RefNe => "if_acmpne",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Unary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation (`ineg`/`lneg`/`fneg`).
    Neg,
}

/// Binary arithmetic, bitwise and fused-comparison operators.
///
/// Each operator covers the integer and long forms of the corresponding JVM
/// opcode pair; the abstract interpreter selects the form from the operand
/// payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition (`iadd`/`ladd`).
    Add,
    /// Subtraction (`isub`/`lsub`).
    Sub,
    /// Multiplication (`imul`/`lmul`).
    Mul,
    /// Division (`idiv`/`ldiv`).
    Div,
    /// Remainder (`irem`/`lrem`).
    Rem,
    /// Bitwise and (`iand`/`land`).
    And,
    /// Bitwise or (`ior`/`lor`).
    Or,
    /// Bitwise exclusive or (`ixor`/`lxor`).
    Xor,
    /// Left shift (`ishl`/`lshl`).
    Shl,
    /// Arithmetic right shift (`ishr`/`lshr`).
    Shr,
    /// Logical right shift (`iushr`/`lushr`).
    Ushr,
    /// Three-way long comparison pushing -1/0/1 (`lcmp`).
    LongCmp,
    /// Floating comparison, NaN collates low (`fcmpl`/`dcmpl`).
    FloatCmpL,
    /// Floating comparison, NaN collates high (`fcmpg`/`dcmpg`).
    FloatCmpG,
}

/// Dispatch kind of a method invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    /// Virtual dispatch on an instance (`invokevirtual`).
    Virtual,
    /// Static call, no receiver (`invokestatic`).
    Static,
    /// Direct call to a constructor or private method (`invokespecial`).
    Special,
    /// Interface dispatch (`invokeinterface`).
    Interface,
}

/// A single instruction of the stack-machine subset this crate analyzes.
///
/// Non-control instructions are opaque to the rewriter and copied verbatim;
/// only conditional branches and switches are ever replaced. The variants
/// cover exactly the semantics the constant frame analysis models - a loader
/// may conservatively lower any unsupported opcode to an [`Instruction`]
/// sequence with equivalent stack behavior (typically an invocation, which
/// the analysis treats as producing an unknown value).
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// No operation.
    Nop,
    /// Push a 32-bit integer constant (`iconst`/`bipush`/`sipush`/`ldc`).
    PushInt(i32),
    /// Push a 64-bit integer constant (`lconst`/`ldc2_w`).
    PushLong(i64),
    /// Push a floating constant (`fconst`/`dconst`/`ldc`).
    PushFloat(f64),
    /// Push a string constant from the constant pool (`ldc`).
    PushString(Arc<str>),
    /// Push the null reference (`aconst_null`).
    PushNull,
    /// Push the value of a local variable slot (`iload`/`aload`/...).
    Load(u16),
    /// Pop into a local variable slot (`istore`/`astore`/...).
    Store(u16),
    /// Pop index and array reference, push an element (`iaload`/`aaload`/...).
    ArrayLoad,
    /// Pop value, index and array reference (`iastore`/`aastore`/...).
    ArrayStore,
    /// Discard the top stack slot (`pop`).
    Pop,
    /// Discard the two topmost stack slots (`pop2` over single-width values).
    Pop2,
    /// Duplicate the top stack slot (`dup`).
    Dup,
    /// Exchange the two top stack slots (`swap`).
    Swap,
    /// Apply a unary operator to the top slot.
    Unary(UnaryOp),
    /// Apply a binary operator to the two top slots.
    Binary(BinaryOp),
    /// Push a static field's value (`getstatic`).
    GetStatic {
        /// Internal name of the declaring class.
        owner: Arc<str>,
        /// Field name.
        name: Arc<str>,
        /// Field type descriptor.
        descriptor: Arc<str>,
    },
    /// Pop a value into a static field (`putstatic`).
    PutStatic {
        /// Internal name of the declaring class.
        owner: Arc<str>,
        /// Field name.
        name: Arc<str>,
        /// Field type descriptor.
        descriptor: Arc<str>,
    },
    /// Pop a receiver, push an instance field's value (`getfield`).
    GetField {
        /// Internal name of the declaring class.
        owner: Arc<str>,
        /// Field name.
        name: Arc<str>,
        /// Field type descriptor.
        descriptor: Arc<str>,
    },
    /// Pop a value and a receiver into an instance field (`putfield`).
    PutField {
        /// Internal name of the declaring class.
        owner: Arc<str>,
        /// Field name.
        name: Arc<str>,
        /// Field type descriptor.
        descriptor: Arc<str>,
    },
    /// Invoke a method (`invokevirtual`/`invokestatic`/...).
    Invoke {
        /// Dispatch kind.
        kind: InvokeKind,
        /// Internal name of the declaring class.
        owner: Arc<str>,
        /// Method name.
        name: Arc<str>,
        /// Method descriptor, e.g. `(Ljava/lang/String;)I`.
        descriptor: Arc<str>,
    },
    /// Allocate an uninitialized instance (`new`).
    New(Arc<str>),
    /// Two-way conditional branch.
    Branch {
        /// The tested condition; determines the pop width.
        condition: Condition,
        /// Jump target when the condition holds.
        target: Label,
    },
    /// Unconditional jump (`goto`).
    Goto(Label),
    /// Dense-range multi-way branch (`tableswitch`).
    TableSwitch {
        /// Smallest matched key.
        min: i32,
        /// Largest matched key; `targets` has `max - min + 1` entries.
        max: i32,
        /// Jump targets for keys `min..=max` in order.
        targets: Vec<Label>,
        /// Jump target for out-of-range keys.
        default: Label,
    },
    /// Sparse-key multi-way branch (`lookupswitch`).
    LookupSwitch {
        /// Matched keys, parallel to `targets`.
        keys: Vec<i32>,
        /// Jump targets, parallel to `keys`.
        targets: Vec<Label>,
        /// Jump target when no key matches.
        default: Label,
    },
    /// Return without a value (`return`).
    Return,
    /// Pop and return the top slot (`ireturn`/`areturn`/...).
    ReturnValue,
    /// Pop and throw the top reference (`athrow`).
    Throw,
}

impl Instruction {
    /// Check if this instruction can transfer control to a label.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Self::Branch { .. } | Self::Goto(_) | Self::TableSwitch { .. } | Self::LookupSwitch { .. }
        )
    }

    /// Check if execution never falls through to the next instruction.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Goto(_)
                | Self::TableSwitch { .. }
                | Self::LookupSwitch { .. }
                | Self::Return
                | Self::ReturnValue
                | Self::Throw
        )
    }

    /// A short mnemonic for tracing and event messages.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::PushInt(_) => "push.i",
            Self::PushLong(_) => "push.l",
            Self::PushFloat(_) => "push.f",
            Self::PushString(_) => "push.str",
            Self::PushNull => "aconst_null",
            Self::Load(_) => "load",
            Self::Store(_) => "store",
            Self::ArrayLoad => "arrayload",
            Self::ArrayStore => "arraystore",
            Self::Pop => "pop",
            Self::Pop2 => "pop2",
            Self::Dup => "dup",
            Self::Swap => "swap",
            Self::Unary(_) => "neg",
            Self::Binary(_) => "binop",
            Self::GetStatic { .. } => "getstatic",
            Self::PutStatic { .. } => "putstatic",
            Self::GetField { .. } => "getfield",
            Self::PutField { .. } => "putfield",
            Self::Invoke { .. } => "invoke",
            Self::New(_) => "new",
            Self::Branch { condition, .. } => condition.mnemonic(),
            Self::Goto(_) => "goto",
            Self::TableSwitch { .. } => "tableswitch",
            Self::LookupSwitch { .. } => "lookupswitch",
            Self::Return => "return",
            Self::ReturnValue => "return.v",
            Self::Throw => "athrow",
        }
    }
}
