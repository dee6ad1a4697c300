#[cfg(not(feature = "std"))]
use alloc::string::String;
use core::fmt;

/// Parser error.
///
/// The engine collapses every parse failure into one user-facing message;
/// the message kept here is for diagnostics and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserError {
    message: String,
}

impl ParserError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParserError {}

/// A help function to create a parser error.
pub(crate) fn parse_error<R>(message: impl Into<String>) -> Result<R, ParserError> {
    Err(ParserError::new(message))
}
