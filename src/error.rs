use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Nothing here is globally fatal: every error is caught at the granularity of a single
/// instruction or a single method, logged to the [`crate::events::EventLog`], and analysis
/// of the remaining methods continues. A method that fails analysis simply contributes zero
/// simplifications.
///
/// # Error Categories
///
/// - [`Error::Malformed`] - Corrupt operand-stack state (underflow, type mismatch) detected
///   while computing a frame or predicting a branch
/// - [`Error::IterationLimit`] - Dataflow fixpoint failed to converge within its budget
/// - [`Error::Resolver`] - A constant resolver implementation failed internally
#[derive(Error, Debug)]
pub enum Error {
    /// The operand stack or local state is damaged at some instruction.
    ///
    /// This error occurs when the abstract interpreter finds a stack underflow, an
    /// out-of-range local slot, or a known value of the wrong kind for an operation
    /// (e.g. an integer test applied to a known string). The error includes the source
    /// location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The dataflow worklist exceeded its iteration budget.
    ///
    /// The value domain has finite height, so the fixpoint is guaranteed to terminate
    /// on well-formed input. A budget of a small multiple of the instruction count is
    /// enforced as a safeguard; exceeding it means the input (or the implementation)
    /// violated that property. The associated value is the budget that was exhausted.
    #[error("Reached the dataflow iteration budget - {0}")]
    IterationLimit(usize),

    /// A constant resolver failed internally.
    ///
    /// Resolver implementations signal internal failures (not "unresolvable", which is
    /// an ordinary `None` result) through this variant. The analysis catches it at the
    /// resolver boundary, logs it, and treats the value as unknown.
    #[error("Constant resolver failed - {0}")]
    Resolver(String),
}
