//! Method descriptor scanning.
//!
//! The abstract interpreter only needs two facts about an invoked method:
//! how many argument slots it pops and whether it pushes a result. This
//! module extracts both from the descriptor string without building a full
//! type representation. Wide types count as one slot, matching the stack
//! model of [`crate::bytecode`].

use crate::Result;

/// Shape of a method descriptor as seen by the operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Number of argument slots popped (receiver excluded).
    pub arguments: usize,
    /// Whether the call pushes a result.
    pub returns: bool,
}

/// Parses a method descriptor such as `(ILjava/lang/String;[J)V`.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the descriptor is not well-formed.
pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodDescriptor> {
    let bytes = descriptor.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(malformed_error!("method descriptor missing '(': {descriptor}"));
    }

    let mut position = 1;
    let mut arguments = 0;
    while position < bytes.len() && bytes[position] != b')' {
        position = skip_field_type(bytes, position)
            .ok_or_else(|| malformed_error!("bad argument type in descriptor: {descriptor}"))?;
        arguments += 1;
    }

    if position >= bytes.len() {
        return Err(malformed_error!("method descriptor missing ')': {descriptor}"));
    }
    position += 1;

    let returns = match bytes.get(position) {
        Some(b'V') => {
            position += 1;
            false
        }
        Some(_) => {
            position = skip_field_type(bytes, position)
                .ok_or_else(|| malformed_error!("bad return type in descriptor: {descriptor}"))?;
            true
        }
        None => {
            return Err(malformed_error!("method descriptor missing return type: {descriptor}"))
        }
    };

    if position != bytes.len() {
        return Err(malformed_error!("trailing bytes in descriptor: {descriptor}"));
    }

    Ok(MethodDescriptor { arguments, returns })
}

/// Advances past a single field type starting at `position`, returning the
/// index just after it, or `None` if no valid type starts there.
fn skip_field_type(bytes: &[u8], mut position: usize) -> Option<usize> {
    // Array dimensions prefix the component type.
    while bytes.get(position) == Some(&b'[') {
        position += 1;
    }

    match bytes.get(position)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(position + 1),
        b'L' => {
            let semicolon = bytes[position..].iter().position(|&b| b == b';')?;
            Some(position + semicolon + 1)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let sig = parse_method_descriptor("()V").unwrap();
        assert_eq!(sig.arguments, 0);
        assert!(!sig.returns);
    }

    #[test]
    fn test_mixed_arguments() {
        let sig = parse_method_descriptor("(ILjava/lang/String;[JD)I").unwrap();
        assert_eq!(sig.arguments, 4);
        assert!(sig.returns);
    }

    #[test]
    fn test_object_return() {
        let sig = parse_method_descriptor("()Ljava/lang/String;").unwrap();
        assert_eq!(sig.arguments, 0);
        assert!(sig.returns);
    }

    #[test]
    fn test_array_of_objects() {
        let sig = parse_method_descriptor("([[Ljava/lang/Object;)Z").unwrap();
        assert_eq!(sig.arguments, 1);
        assert!(sig.returns);
    }

    #[test]
    fn test_malformed() {
        assert!(parse_method_descriptor("I)V").is_err());
        assert!(parse_method_descriptor("(Q)V").is_err());
        assert!(parse_method_descriptor("(I").is_err());
        assert!(parse_method_descriptor("(I)").is_err());
        assert!(parse_method_descriptor("(I)VV").is_err());
        assert!(parse_method_descriptor("(Ljava/lang/String)V").is_err());
    }
}
