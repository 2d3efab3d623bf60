//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Every failure of the generator is fatal. Errors raised deep inside the schema resolver are
//! wrapped with the identity of the schema, property, parameter or operation being processed
//! as they travel outwards, so the final message reads as a chain of contexts.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Malformed, unsupported or unmapped `$ref`.
    #[from(ignore)]
    #[display("Reference Error: {_0}")]
    Reference(String),

    /// Incompatible `allOf` members.
    #[from(ignore)]
    #[display("Composition Error: {_0}")]
    Composition(String),

    /// Unsupported type/format combination or unknown schema type.
    #[from(ignore)]
    #[display("Format Error: {_0}")]
    Format(String),

    /// Parameter without schema or content.
    #[from(ignore)]
    #[display("Parameter Error: {_0}")]
    Parameter(String),

    /// Declared path parameters disagree with the URI template.
    #[from(ignore)]
    #[display("Path Error: {_0}")]
    PathMismatch(String),

    /// Default operation id could not be derived.
    #[from(ignore)]
    #[display("Operation Error: {_0}")]
    OperationId(String),

    /// Vendor extension present but not decodable.
    #[from(ignore)]
    #[display("Extension Error: {_0}")]
    Extension(String),

    /// The input document could not be deserialized or serialized.
    #[from(ignore)]
    #[display("Document Error: {_0}")]
    Document(String),

    /// Template registration, rendering or output formatting failed.
    #[from(ignore)]
    #[display("Template Error: {_0}")]
    Template(String),

    /// An inner error annotated with the item being processed.
    #[from(ignore)]
    #[display("{context}: {source}")]
    Context {
        /// Identity of the schema, parameter or operation being processed.
        context: String,
        /// The wrapped failure.
        source: Box<AppError>,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Wraps `self` with a context message.
    pub fn context(self, context: impl Into<String>) -> Self {
        AppError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping every `Context` layer.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            AppError::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// Adds context to the error side of an `AppResult`.
pub trait ResultExt<T> {
    /// Wraps the error with a fixed message.
    fn context(self, context: impl Into<String>) -> AppResult<T>;

    /// Wraps the error with a lazily built message.
    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for AppResult<T> {
    fn context(self, context: impl Into<String>) -> AppResult<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}
