use std::fmt;

/// Engine error.
///
/// The carried message is the user-facing text (German, like the rest of
/// the dialect surface) and `Display` prints it verbatim; the variants
/// only classify where in the pipeline a query died.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The statement did not parse.
    Parse(String),
    /// The statement parsed but cannot be executed as written.
    Semantic(String),
    /// A predicate failed while evaluating rows.
    Eval(String),
    /// A delegated DML applier failed.
    Dml(String),
}

impl EngineError {
    /// The user-facing message.
    pub fn message(&self) -> &str {
        match self {
            EngineError::Parse(message)
            | EngineError::Semantic(message)
            | EngineError::Eval(message)
            | EngineError::Dml(message) => message,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for EngineError {}
