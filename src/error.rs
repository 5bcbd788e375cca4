//! Error types for ferro-kb
//!
//! Every fallible operation in the crate returns [`FerroError`]. Errors fall
//! into three families:
//! - notation parse errors (variant, position and histone grammars)
//! - attribute errors raised while assembling a selection query
//! - construction errors for query primitives built with invalid arguments
//!
//! Parse errors may carry a [`Diagnostic`] with an error code, the offending
//! input, a highlighted span and the pattern that was expected.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Notation errors (E1xxx)
    /// Input shorter than the minimum notation length
    TooShort = 1001,
    /// Coordinate system prefix not recognized
    UnknownPrefix = 1002,
    /// Missing `.` after the prefix
    MissingSeparator = 1003,
    /// Position text does not match the prefix grammar
    InvalidPosition = 1004,
    /// Input does not match the continuous or discontinuous grammar
    PatternMismatch = 1005,
    /// Variant type suffix not recognized
    UnrecognizedType = 1006,
    /// Variant type not allowed for the coordinate system
    InvalidSubtype = 1007,
    /// Histone notation does not match
    InvalidHistone = 1008,

    // Attribute errors (E2xxx)
    /// Condition names an attribute the class does not define
    UnknownAttribute = 2001,
    /// Return projection names an attribute the class does not define
    InvalidReturnProperty = 2002,
    /// Value failed the property cast
    CastFailed = 2003,
    /// Value outside the property's controlled vocabulary
    ControlledVocabulary = 2004,
    /// Reserved key used where it is not allowed
    ReservedKey = 2005,
    /// Class not present in the schema
    UnknownClass = 2006,

    // Construction errors (E3xxx)
    /// Query primitive built with invalid arguments
    InvalidUsage = 3001,

    // IO errors (E9xxx)
    /// File IO error
    IoError = 9001,
    /// JSON parsing error
    JsonError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E1001")
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a brief description of this error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::TooShort => "notation too short",
            ErrorCode::UnknownPrefix => "unknown coordinate prefix",
            ErrorCode::MissingSeparator => "missing '.' after prefix",
            ErrorCode::InvalidPosition => "invalid position format",
            ErrorCode::PatternMismatch => "notation does not match the grammar",
            ErrorCode::UnrecognizedType => "unrecognized variant type",
            ErrorCode::InvalidSubtype => "variant type not allowed for prefix",
            ErrorCode::InvalidHistone => "invalid histone notation",
            ErrorCode::UnknownAttribute => "unknown attribute",
            ErrorCode::InvalidReturnProperty => "invalid return property",
            ErrorCode::CastFailed => "value failed to cast",
            ErrorCode::ControlledVocabulary => "value outside controlled vocabulary",
            ErrorCode::ReservedKey => "reserved key misuse",
            ErrorCode::UnknownClass => "unknown class",
            ErrorCode::InvalidUsage => "invalid construction arguments",
            ErrorCode::IoError => "file I/O error",
            ErrorCode::JsonError => "JSON parsing error",
            ErrorCode::ConfigError => "configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A span in the source input indicating error location
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceSpan {
    /// Starting byte offset (0-indexed)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
}

impl SourceSpan {
    /// Create a new source span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Locate `fragment` inside `source`, falling back to the whole input
    pub fn locate(source: &str, fragment: &str) -> Self {
        match source.find(fragment) {
            Some(start) if !fragment.is_empty() => Self::new(start, start + fragment.len()),
            _ => Self::new(0, source.len()),
        }
    }

    /// Format the source with the span underlined
    ///
    /// ```text
    /// p.R10Kfs*
    ///       ^~~
    /// ```
    pub fn highlight(&self, source: &str) -> String {
        if source.is_empty() {
            return String::new();
        }

        let start = self.start.min(source.len());
        let end = self.end.min(source.len()).max(start);

        let mut pointer = " ".repeat(start);
        pointer.push('^');
        if end > start + 1 {
            pointer.push_str(&"~".repeat(end - start - 1));
        }

        format!("{}\n{}", source, pointer)
    }
}

/// Diagnostic information for an error
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostic {
    /// Error code
    pub code: Option<ErrorCode>,
    /// Source span for highlighting
    pub span: Option<SourceSpan>,
    /// The original input
    pub source: Option<String>,
    /// The pattern that was expected
    pub hint: Option<String>,
    /// A corrected form of the input, when one is obvious
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a new empty diagnostic
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Format the diagnostic as a detailed error message
    pub fn format(&self, primary_message: &str) -> String {
        let mut result = String::new();

        if let Some(code) = &self.code {
            result.push_str(&format!("[{}] ", code));
        }

        result.push_str(primary_message);

        if let (Some(span), Some(source)) = (&self.span, &self.source) {
            result.push_str("\n\n");
            result.push_str(&span.highlight(source));
        }

        if let Some(hint) = &self.hint {
            result.push_str("\n\nExpected: ");
            result.push_str(hint);
        }

        if let Some(suggestion) = &self.suggestion {
            result.push_str("\n\nDid you mean: ");
            result.push_str(suggestion);
        }

        result
    }
}

/// Main error type for ferro-kb operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FerroError {
    /// Notation did not match any accepted production
    #[error("Parse error in '{input}': {msg}")]
    Parse {
        input: String,
        msg: String,
        diagnostic: Option<Box<Diagnostic>>,
    },

    /// Requested attribute, class or option is not valid for the query
    #[error("Attribute error: {msg}")]
    Attribute { code: ErrorCode, msg: String },

    /// A condition value failed its property cast
    #[error("Attribute error: cannot cast '{value}' for attribute '{field}': {cause}")]
    Cast {
        field: String,
        value: String,
        cause: String,
    },

    /// A condition value is outside the property's choices
    #[error("Attribute error: the attribute {field} violates the expected controlled vocabulary ('{value}' is not one of: {choices})")]
    ControlledVocabulary {
        field: String,
        value: String,
        choices: String,
    },

    /// A query primitive was constructed with invalid arguments
    #[error("Invalid usage: {msg}")]
    Usage { msg: String },

    /// Configuration could not be loaded
    #[error("Configuration error: {msg}")]
    Config { msg: String },

    /// IO error (for file operations)
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON parsing error
    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl FerroError {
    /// Create a parse error without diagnostic
    pub fn parse(input: impl Into<String>, msg: impl Into<String>) -> Self {
        FerroError::Parse {
            input: input.into(),
            msg: msg.into(),
            diagnostic: None,
        }
    }

    /// Create a parse error with diagnostic information
    pub fn parse_with_diagnostic(
        input: impl Into<String>,
        msg: impl Into<String>,
        diagnostic: Diagnostic,
    ) -> Self {
        FerroError::Parse {
            input: input.into(),
            msg: msg.into(),
            diagnostic: Some(Box::new(diagnostic)),
        }
    }

    /// Create a parse error tagged with a code and the pattern that was expected
    pub fn parse_expected(
        input: impl Into<String>,
        msg: impl Into<String>,
        code: ErrorCode,
        expected: impl Into<String>,
    ) -> Self {
        let input = input.into();
        let diagnostic = Diagnostic::new()
            .with_code(code)
            .with_source(input.clone())
            .with_span(SourceSpan::new(0, input.len()))
            .with_hint(expected);
        Self::parse_with_diagnostic(input, msg, diagnostic)
    }

    pub fn attribute(msg: impl Into<String>) -> Self {
        Self::attribute_with_code(ErrorCode::UnknownAttribute, msg)
    }

    pub fn attribute_with_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        FerroError::Attribute {
            code,
            msg: msg.into(),
        }
    }

    pub fn unknown_class(name: &str) -> Self {
        Self::attribute_with_code(
            ErrorCode::UnknownClass,
            format!("Unable to find a class model named '{}'", name),
        )
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        FerroError::Usage { msg: msg.into() }
    }

    /// The input string of a parse error
    pub fn input(&self) -> Option<&str> {
        match self {
            FerroError::Parse { input, .. } => Some(input),
            _ => None,
        }
    }

    /// The pattern a parse error expected, if recorded
    pub fn expected(&self) -> Option<&str> {
        match self {
            FerroError::Parse {
                diagnostic: Some(d),
                ..
            } => d.hint.as_deref(),
            _ => None,
        }
    }

    /// The bare message, without the variant prefix added by `Display`
    pub fn message(&self) -> String {
        match self {
            FerroError::Parse { msg, .. } => msg.clone(),
            FerroError::Attribute { msg, .. }
            | FerroError::Usage { msg }
            | FerroError::Config { msg }
            | FerroError::Io { msg }
            | FerroError::Json { msg } => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Get the error code if available
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            FerroError::Parse {
                diagnostic: Some(d),
                ..
            } => d.code,
            FerroError::Parse { .. } => None,
            FerroError::Attribute { code, .. } => Some(*code),
            FerroError::Cast { .. } => Some(ErrorCode::CastFailed),
            FerroError::ControlledVocabulary { .. } => Some(ErrorCode::ControlledVocabulary),
            FerroError::Usage { .. } => Some(ErrorCode::InvalidUsage),
            FerroError::Config { .. } => Some(ErrorCode::ConfigError),
            FerroError::Io { .. } => Some(ErrorCode::IoError),
            FerroError::Json { .. } => Some(ErrorCode::JsonError),
        }
    }

    /// True for the attribute family (unknown names, casts, vocabularies)
    pub fn is_attribute_error(&self) -> bool {
        matches!(
            self,
            FerroError::Attribute { .. }
                | FerroError::Cast { .. }
                | FerroError::ControlledVocabulary { .. }
        )
    }

    /// Get a formatted error with full diagnostic output
    pub fn detailed_message(&self) -> String {
        match self {
            FerroError::Parse {
                input,
                msg,
                diagnostic: Some(d),
            } => d.format(&format!("Parse error in '{}': {}", input, msg)),
            _ => self.to_string(),
        }
    }
}

impl From<std::io::Error> for FerroError {
    fn from(err: std::io::Error) -> Self {
        FerroError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FerroError {
    fn from(err: serde_json::Error) -> Self {
        FerroError::Json {
            msg: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FerroError {
    fn from(err: toml::de::Error) -> Self {
        FerroError::Config {
            msg: err.to_string(),
        }
    }
}
