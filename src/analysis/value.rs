//! Abstract values for constant tracking.
//!
//! The analysis domain is deliberately shallow: a slot either holds a
//! [`ConstValue`] the analysis has proven, or it is [`AbstractValue::Unknown`].
//! There is no range or non-null tier - anything the interpreter cannot fold
//! collapses to `Unknown`, and once a slot is `Unknown` it never becomes known
//! again. That absorption gives the domain finite height and guarantees the
//! dataflow fixpoint terminates.
//!
//! # Equality
//!
//! `Unknown` never compares equal to anything, including another `Unknown` -
//! two unknown values may be different at runtime. For that reason
//! [`AbstractValue`] does not implement `PartialEq`; the two comparisons the
//! analysis needs are explicit:
//!
//! - [`AbstractValue::same_as`] - provably-the-same-constant, used by the
//!   branch predictor for reference equality
//! - [`AbstractValue::identical`] - same lattice point, used only for
//!   fixpoint change detection (there, `Unknown` equals `Unknown`)

use std::{fmt, sync::Arc};

/// A constant value proven by the analysis.
///
/// Integers and strings compare by value; object references compare by the
/// opaque identity a resolver assigned them; `Null` is distinct from every
/// non-null value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// 32-bit signed integer.
    Int(i32),

    /// 64-bit signed integer.
    Long(i64),

    /// Floating value (covers both `float` and `double` slots).
    Float(f64),

    /// Fully-evaluated string constant.
    Str(Arc<str>),

    /// The null reference.
    Null,

    /// A known non-null object reference, identified opaquely by its
    /// resolver-assigned identity.
    Reference(u64),
}

impl ConstValue {
    /// Returns `true` if this is the null constant.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if this is an integer constant.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Long(_))
    }

    /// Returns the constant as an i32 if it is a 32-bit integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the constant as an i64, widening a 32-bit integer.
    #[must_use]
    pub const fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            Self::Int(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Returns the string payload if this is a string constant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to negate this constant.
    #[must_use]
    pub fn negate(&self) -> Option<Self> {
        match self {
            Self::Int(v) => Some(Self::Int(v.wrapping_neg())),
            Self::Long(v) => Some(Self::Long(v.wrapping_neg())),
            Self::Float(v) => Some(Self::Float(-v)),
            _ => None,
        }
    }

    /// Attempts to add two constants.
    #[must_use]
    pub fn add(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a.wrapping_add(*b))),
            (Self::Long(a), Self::Long(b)) => Some(Self::Long(a.wrapping_add(*b))),
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a + b)),
            _ => None,
        }
    }

    /// Attempts to subtract two constants.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a.wrapping_sub(*b))),
            (Self::Long(a), Self::Long(b)) => Some(Self::Long(a.wrapping_sub(*b))),
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a - b)),
            _ => None,
        }
    }

    /// Attempts to multiply two constants.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a.wrapping_mul(*b))),
            (Self::Long(a), Self::Long(b)) => Some(Self::Long(a.wrapping_mul(*b))),
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a * b)),
            _ => None,
        }
    }

    /// Attempts to divide two constants. Integer division by zero is not a
    /// value (the instruction throws at runtime), so it yields `None`.
    #[must_use]
    pub fn div(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(_), Self::Int(0)) | (Self::Long(_), Self::Long(0)) => None,
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a.wrapping_div(*b))),
            (Self::Long(a), Self::Long(b)) => Some(Self::Long(a.wrapping_div(*b))),
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a / b)),
            _ => None,
        }
    }

    /// Attempts to take the remainder of two constants, with the same
    /// zero-divisor rule as [`ConstValue::div`].
    #[must_use]
    pub fn rem(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(_), Self::Int(0)) | (Self::Long(_), Self::Long(0)) => None,
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a.wrapping_rem(*b))),
            (Self::Long(a), Self::Long(b)) => Some(Self::Long(a.wrapping_rem(*b))),
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a % b)),
            _ => None,
        }
    }

    /// Attempts bitwise and.
    #[must_use]
    pub fn bitwise_and(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a & b)),
            (Self::Long(a), Self::Long(b)) => Some(Self::Long(a & b)),
            _ => None,
        }
    }

    /// Attempts bitwise or.
    #[must_use]
    pub fn bitwise_or(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a | b)),
            (Self::Long(a), Self::Long(b)) => Some(Self::Long(a | b)),
            _ => None,
        }
    }

    /// Attempts bitwise exclusive or.
    #[must_use]
    pub fn bitwise_xor(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a ^ b)),
            (Self::Long(a), Self::Long(b)) => Some(Self::Long(a ^ b)),
            _ => None,
        }
    }

    /// Attempts a left shift. The shift amount is an `Int` and is masked the
    /// way the instruction set masks it (5 bits for `Int`, 6 for `Long`).
    #[must_use]
    pub fn shl(&self, amount: &Self) -> Option<Self> {
        match (self, amount) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a.wrapping_shl(*b as u32 & 0x1f))),
            (Self::Long(a), Self::Int(b)) => Some(Self::Long(a.wrapping_shl(*b as u32 & 0x3f))),
            _ => None,
        }
    }

    /// Attempts an arithmetic right shift, with the same masking as
    /// [`ConstValue::shl`].
    #[must_use]
    pub fn shr(&self, amount: &Self) -> Option<Self> {
        match (self, amount) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a.wrapping_shr(*b as u32 & 0x1f))),
            (Self::Long(a), Self::Int(b)) => Some(Self::Long(a.wrapping_shr(*b as u32 & 0x3f))),
            _ => None,
        }
    }

    /// Attempts a logical right shift, with the same masking as
    /// [`ConstValue::shl`].
    #[must_use]
    pub fn ushr(&self, amount: &Self) -> Option<Self> {
        match (self, amount) {
            (Self::Int(a), Self::Int(b)) => {
                Some(Self::Int(((*a as u32) >> (*b as u32 & 0x1f)) as i32))
            }
            (Self::Long(a), Self::Int(b)) => {
                Some(Self::Long(((*a as u64) >> (*b as u32 & 0x3f)) as i64))
            }
            _ => None,
        }
    }

    /// Three-way long comparison pushing -1, 0 or 1.
    #[must_use]
    pub fn long_cmp(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Long(a), Self::Long(b)) => Some(Self::Int(match a.cmp(b) {
                std::cmp::Ordering::Less => -1,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Greater => 1,
            })),
            _ => None,
        }
    }

    /// Three-way floating comparison. `nan_result` is pushed when either
    /// operand is NaN (-1 for the `l` form, 1 for the `g` form).
    #[must_use]
    pub fn float_cmp(&self, other: &Self, nan_result: i32) -> Option<Self> {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => {
                let result = if a.is_nan() || b.is_nan() {
                    nan_result
                } else if a < b {
                    -1
                } else if a > b {
                    1
                } else {
                    0
                };
                Some(Self::Int(result))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Null => write!(f, "null"),
            Self::Reference(id) => write!(f, "ref@{id}"),
        }
    }
}

/// A statically tracked, possibly-known operand value.
///
/// `Unknown` is the absorbing element of the merge operation: any
/// disagreement between control-flow predecessors collapses the slot, and
/// nothing resurrects it.
#[derive(Debug, Clone, Default)]
pub enum AbstractValue {
    /// The value's concrete content is not statically determined.
    #[default]
    Unknown,
    /// The value is the given constant on every path reaching it.
    Known(ConstValue),
}

impl AbstractValue {
    /// Returns `true` if the value is a known constant.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Returns the known constant, if any.
    #[must_use]
    pub const fn known(&self) -> Option<&ConstValue> {
        match self {
            Self::Known(c) => Some(c),
            Self::Unknown => None,
        }
    }

    /// Returns the value as an i32 if it is a known 32-bit integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        self.known().and_then(ConstValue::as_int)
    }

    /// Whether two abstract values are provably the same constant.
    ///
    /// `Unknown` is never the same as anything, including another `Unknown`.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => a == b,
            _ => false,
        }
    }

    /// Whether two abstract values are the same lattice point.
    ///
    /// Unlike [`AbstractValue::same_as`] this treats two `Unknown`s as equal;
    /// it exists solely so the fixpoint loop can detect that a merge changed
    /// nothing, and must not be used to compare runtime values.
    #[must_use]
    pub(crate) fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unknown, Self::Unknown) => true,
            (Self::Known(a), Self::Known(b)) => a == b,
            _ => false,
        }
    }

    /// Merges two abstract values at a control-flow join.
    ///
    /// Identical known constants survive; any disagreement is `Unknown`.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        if self.same_as(other) {
            self.clone()
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for AbstractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "?"),
            Self::Known(c) => write!(f, "{c}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_agreement_survives() {
        let a = AbstractValue::Known(ConstValue::Int(5));
        let b = AbstractValue::Known(ConstValue::Int(5));
        assert!(a.merge(&b).same_as(&a));
    }

    #[test]
    fn test_merge_disagreement_collapses() {
        let a = AbstractValue::Known(ConstValue::Int(5));
        let b = AbstractValue::Known(ConstValue::Int(6));
        assert!(!a.merge(&b).is_known());

        let null = AbstractValue::Known(ConstValue::Null);
        assert!(!a.merge(&null).is_known());
    }

    #[test]
    fn test_unknown_never_equal() {
        let unknown = AbstractValue::Unknown;
        assert!(!unknown.same_as(&AbstractValue::Unknown));
        assert!(!unknown.same_as(&AbstractValue::Known(ConstValue::Null)));

        // Fixpoint detection still sees one lattice point.
        assert!(unknown.identical(&AbstractValue::Unknown));
    }

    #[test]
    fn test_null_distinct_from_references() {
        let null = ConstValue::Null;
        assert_ne!(null, ConstValue::Reference(0));
        assert_ne!(null, ConstValue::Str("".into()));
        assert_eq!(null, ConstValue::Null);
    }

    #[test]
    fn test_reference_identity() {
        assert_eq!(ConstValue::Reference(7), ConstValue::Reference(7));
        assert_ne!(ConstValue::Reference(7), ConstValue::Reference(8));
    }

    #[test]
    fn test_integer_folding() {
        let a = ConstValue::Int(i32::MAX);
        let b = ConstValue::Int(1);
        assert_eq!(a.add(&b), Some(ConstValue::Int(i32::MIN)));

        assert_eq!(ConstValue::Int(7).div(&ConstValue::Int(0)), None);
        assert_eq!(
            ConstValue::Int(i32::MIN).div(&ConstValue::Int(-1)),
            Some(ConstValue::Int(i32::MIN))
        );
        assert_eq!(
            ConstValue::Int(-8).ushr(&ConstValue::Int(1)),
            Some(ConstValue::Int(0x7fff_fffc))
        );
        assert_eq!(
            ConstValue::Int(1).shl(&ConstValue::Int(33)),
            Some(ConstValue::Int(2))
        );
    }

    #[test]
    fn test_mixed_widths_do_not_fold() {
        assert_eq!(ConstValue::Int(1).add(&ConstValue::Long(1)), None);
        assert_eq!(ConstValue::Long(1).bitwise_and(&ConstValue::Int(1)), None);
    }

    #[test]
    fn test_long_cmp() {
        let small = ConstValue::Long(-3);
        let big = ConstValue::Long(9);
        assert_eq!(small.long_cmp(&big), Some(ConstValue::Int(-1)));
        assert_eq!(big.long_cmp(&small), Some(ConstValue::Int(1)));
        assert_eq!(big.long_cmp(&big), Some(ConstValue::Int(0)));
    }

    #[test]
    fn test_float_cmp_nan() {
        let nan = ConstValue::Float(f64::NAN);
        let one = ConstValue::Float(1.0);
        assert_eq!(nan.float_cmp(&one, -1), Some(ConstValue::Int(-1)));
        assert_eq!(nan.float_cmp(&one, 1), Some(ConstValue::Int(1)));
        assert_eq!(one.float_cmp(&one, -1), Some(ConstValue::Int(0)));
    }
}
