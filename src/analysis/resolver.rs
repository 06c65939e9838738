//! Constant resolution capability.
//!
//! The frame analysis treats two kinds of external knowledge as pluggable:
//! the values of field reads, and the return values of no-argument calls on a
//! receiver the analysis has already proven constant. Implementations of
//! [`ConstantResolver`] supply either, or decline with `Ok(None)`.
//!
//! Declining is not an error - it simply leaves the slot unknown. A real
//! error (`Err`) signals an internal failure of the resolver itself; the
//! analysis catches it at the call boundary, logs it and proceeds with the
//! slot unknown, so a broken resolver can never abort a pass.

use crate::{analysis::ConstValue, Result};

/// Supplies constant field values and call results to the frame analysis.
///
/// All methods take `&self`; implementations must be safe to share across the
/// worker threads of a parallel run.
pub trait ConstantResolver: Sync {
    /// The value of the named field, if statically known.
    ///
    /// Consulted for both static and instance field reads; `owner` is the
    /// internal name of the class the reference is resolved against.
    ///
    /// # Errors
    ///
    /// Implementations may fail internally; the analysis treats any error as
    /// "unresolvable" after logging it.
    fn field_value(&self, owner: &str, name: &str, descriptor: &str)
        -> Result<Option<ConstValue>>;

    /// The return value of a no-argument call on a known receiver.
    ///
    /// Only consulted when the receiver's abstract value is a known constant
    /// and the descriptor takes no arguments.
    ///
    /// # Errors
    ///
    /// Implementations may fail internally; the analysis treats any error as
    /// "unresolvable" after logging it.
    fn method_return(
        &self,
        receiver: &ConstValue,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<Option<ConstValue>>;
}

/// A resolver that resolves nothing.
///
/// Useful as the baseline for passes that should only fold values the
/// bytecode itself pins down.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResolver;

impl ConstantResolver for EmptyResolver {
    fn field_value(&self, _: &str, _: &str, _: &str) -> Result<Option<ConstValue>> {
        Ok(None)
    }

    fn method_return(
        &self,
        _: &ConstValue,
        _: &str,
        _: &str,
        _: &str,
    ) -> Result<Option<ConstValue>> {
        Ok(None)
    }
}

/// Evaluates the read-only no-argument methods of `java/lang/String`.
///
/// This is a closed enumeration, not reflective dispatch: each supported
/// method is simulated directly over the known receiver string, and anything
/// outside the list is declined. String obfuscators lean on exactly these
/// calls to disguise constants (`"abc".length()` instead of `3`), which is
/// what makes the enumeration worth carrying.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMethodResolver;

impl StringMethodResolver {
    /// The `String.hashCode` recurrence over UTF-16 code units.
    fn string_hash(s: &str) -> i32 {
        s.encode_utf16()
            .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
    }
}

impl ConstantResolver for StringMethodResolver {
    fn field_value(&self, _: &str, _: &str, _: &str) -> Result<Option<ConstValue>> {
        Ok(None)
    }

    fn method_return(
        &self,
        receiver: &ConstValue,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<Option<ConstValue>> {
        if owner != "java/lang/String" || !descriptor.starts_with("()") {
            return Ok(None);
        }
        let Some(s) = receiver.as_str() else {
            return Ok(None);
        };

        // length/hashCode operate on UTF-16 code units, like the runtime.
        let value = match name {
            "length" => ConstValue::Int(s.encode_utf16().count() as i32),
            "isEmpty" => ConstValue::Int(i32::from(s.is_empty())),
            "hashCode" => ConstValue::Int(Self::string_hash(s)),
            "trim" => ConstValue::Str(s.trim_matches(|c: char| c <= ' ').into()),
            "strip" => ConstValue::Str(s.trim().into()),
            "toLowerCase" => ConstValue::Str(s.to_lowercase().into()),
            "toUpperCase" => ConstValue::Str(s.to_uppercase().into()),
            "toString" | "intern" => ConstValue::Str(s.into()),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}
