//! Code generation error types.

/// Error type for code generation operations.
///
/// Allows proper error propagation using `?` for both logical errors
/// (undeclared identifiers, unknown struct members, malformed lvalues) and
/// formatting errors from writing into the output buffer.
#[derive(Debug)]
pub enum CodeGenError {
    /// A logical error in code generation (e.g., use of an undeclared name).
    Logic(String),
    /// A formatting error while writing assembly text.
    Format(std::fmt::Error),
}

impl std::fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeGenError::Logic(s) => write!(f, "{}", s),
            CodeGenError::Format(e) => write!(f, "code generation write error: {}", e),
        }
    }
}

impl std::error::Error for CodeGenError {}

impl From<String> for CodeGenError {
    fn from(s: String) -> Self {
        CodeGenError::Logic(s)
    }
}

impl From<std::fmt::Error> for CodeGenError {
    fn from(e: std::fmt::Error) -> Self {
        CodeGenError::Format(e)
    }
}
