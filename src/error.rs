//! Structured Error Handling for fuzzy-anemia
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured error responses (JSON-friendly)
//! - Context preservation through error chains
//!
//! # Error Categories
//!
//! - `ConfigurationError` - Malformed variable, term or rule definitions
//! - `InvalidInput` - Missing or non-numeric crisp inputs from a caller
//! - `NoRuleFired` - Defuzzification had nothing to work with
//! - `OutOfRange` - Crisp output fell outside the category table
//! - Config file errors - Problems loading `fuzzy-anemia.toml`
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzzy_anemia::error::{AnemiaError, ErrorCode};
//!
//! fn read_hgb(raw: &str) -> Result<f64, AnemiaError> {
//!     raw.trim().parse::<f64>().map_err(|_| {
//!         AnemiaError::invalid_input(format!("'{}' is not a number", raw))
//!             .with_context("field", "hgb")
//!     })
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Definition errors (1xxx)
    /// Generic malformed definition
    ConfigurationError = 1000,
    /// Universe bounds or step are unusable
    InvalidUniverse = 1001,
    /// Membership breakpoints are decreasing or not finite
    InvalidBreakpoints = 1002,
    /// Two terms share a name within a variable
    DuplicateTerm = 1003,
    /// A rule references a variable or term that does not exist
    UnknownReference = 1004,

    // Input errors (2xxx)
    /// Generic invalid input
    InvalidInput = 2000,
    /// A required input was not supplied
    MissingInput = 2001,
    /// Input is not a finite number
    NonNumericInput = 2002,

    // Inference outcomes (3xxx)
    /// No rule fired, the aggregated output is identically zero
    NoRuleFired = 3000,
    /// Crisp output outside of the category table
    OutOfRange = 3001,

    // Config file errors (7xxx)
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Invalid config value
    InvalidConfigValue = 7004,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ConfigurationError => "Configuration error",
            ErrorCode::InvalidUniverse => "Invalid universe of discourse",
            ErrorCode::InvalidBreakpoints => "Invalid membership breakpoints",
            ErrorCode::DuplicateTerm => "Duplicate term",
            ErrorCode::UnknownReference => "Unknown variable or term",

            ErrorCode::InvalidInput => "Invalid input",
            ErrorCode::MissingInput => "Missing input",
            ErrorCode::NonNumericInput => "Non-numeric input",

            ErrorCode::NoRuleFired => "No rule fired",
            ErrorCode::OutOfRange => "Output out of range",

            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Whether a diagnosis should fall back to the inconclusive sentinel
    /// instead of surfacing this error.
    pub fn is_inconclusive(&self) -> bool {
        matches!(self, ErrorCode::NoRuleFired | ErrorCode::OutOfRange)
    }

    /// Whether the error was caused by the caller's input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::InvalidInput | ErrorCode::MissingInput | ErrorCode::NonNumericInput
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for fuzzy-anemia
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnemiaError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl AnemiaError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods
    // ========================================================================

    /// Create a definition error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }

    /// Create an invalid universe error
    pub fn invalid_universe(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidUniverse, message)
    }

    /// Create an invalid breakpoints error
    pub fn invalid_breakpoints(term: &str, points: &[f64]) -> Self {
        Self::new(
            ErrorCode::InvalidBreakpoints,
            format!("Breakpoints {:?} of term '{}' must be finite and non-decreasing", points, term),
        )
        .with_context("term", term)
    }

    /// Create an unknown reference error
    pub fn unknown_reference(variable: &str, term: Option<&str>) -> Self {
        let message = match term {
            Some(term) => format!("Unknown term '{}' on variable '{}'", term, variable),
            None => format!("Unknown variable '{}'", variable),
        };
        Self::new(ErrorCode::UnknownReference, message)
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a missing input error
    pub fn missing_input(variable: &str) -> Self {
        Self::new(
            ErrorCode::MissingInput,
            format!("No value supplied for input '{}'", variable),
        )
        .with_context("field", variable)
    }

    /// Create a non-numeric input error
    pub fn non_numeric(variable: &str, raw: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NonNumericInput,
            format!("Value '{}' for input '{}' is not a finite number", raw, variable),
        )
        .with_context("field", variable)
        .with_hint("Please ensure all fields contain valid numbers.")
    }

    /// Create a no-rule-fired error
    pub fn no_rule_fired(output: &str) -> Self {
        Self::new(
            ErrorCode::NoRuleFired,
            format!("No rule fired for output '{}', centroid is undefined", output),
        )
    }

    /// Create an out-of-range error
    pub fn out_of_range(value: f64, low: f64, high: f64) -> Self {
        Self::new(
            ErrorCode::OutOfRange,
            format!("Crisp output {} is outside [{}, {})", value, low, high),
        )
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Look up a context field
    pub fn context_field(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.fields.get(key))
            .map(String::as_str)
    }

    /// Check if a diagnosis should report "Diagnosis Inconclusive" for this error
    pub fn is_inconclusive(&self) -> bool {
        self.code.is_inconclusive()
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for AnemiaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for AnemiaError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<crate::config::ConfigError> for AnemiaError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        let code = match &err {
            ConfigError::NotFound(_) => ErrorCode::ConfigNotFound,
            ConfigError::ParseError(..) => ErrorCode::InvalidConfigSyntax,
            ConfigError::InvalidValue { .. } => ErrorCode::InvalidConfigValue,
            ConfigError::IoError(..) | ConfigError::SerializeError(_) => ErrorCode::InternalError,
        };
        AnemiaError::new(code, err.to_string())
    }
}

/// A Result type using AnemiaError
pub type AnemiaResult<T> = Result<T, AnemiaError>;

// ============================================================================
// Error response for callers
// ============================================================================

/// Serializable error body for a calling layer (form handler, CLI, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error indicator
    pub error: bool,
    /// Error code (string form)
    pub code: String,
    /// Numeric error code
    pub code_num: u32,
    /// Error message
    pub message: String,
    /// Additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    /// Hint for resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&AnemiaError> for ErrorResponse {
    fn from(err: &AnemiaError) -> Self {
        Self {
            error: true,
            code: format!("{:?}", err.code),
            code_num: err.code.code(),
            message: err.message.clone(),
            details: err.context.as_ref().map(|c| c.fields.clone()),
            hint: err.hint.clone(),
        }
    }
}

impl From<AnemiaError> for ErrorResponse {
    fn from(err: AnemiaError) -> Self {
        Self::from(&err)
    }
}

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create an AnemiaError with context from the current location
#[macro_export]
macro_rules! anemia_error {
    ($code:expr, $msg:expr) => {
        $crate::error::AnemiaError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::AnemiaError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! anemia_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::anemia_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::anemia_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! anemia_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::anemia_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::anemia_bail!($code, $fmt, $($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = AnemiaError::configuration("bad term");
        assert_eq!(err.code, ErrorCode::ConfigurationError);
        assert_eq!(err.message, "bad term");
    }

    #[test]
    fn test_non_numeric_carries_field() {
        let err = AnemiaError::non_numeric("mcv", "abc");
        assert_eq!(err.code, ErrorCode::NonNumericInput);
        assert_eq!(err.context_field("field"), Some("mcv"));
        assert!(err.hint.is_some());
        assert!(err.code.is_input_error());
    }

    #[test]
    fn test_inconclusive_codes() {
        assert!(AnemiaError::no_rule_fired("anemia").is_inconclusive());
        assert!(AnemiaError::out_of_range(10.5, 0.0, 10.0).is_inconclusive());
        assert!(!AnemiaError::invalid_input("x").is_inconclusive());
        assert!(!AnemiaError::configuration("x").is_inconclusive());
    }

    #[test]
    fn test_error_display() {
        let err = AnemiaError::unknown_reference("hgb", Some("extreme"))
            .at("knowledge.rs:12")
            .with_cause("rule 7")
            .with_hint("Check the rule base");

        let display = err.to_string();
        assert!(display.contains("[1004]"));
        assert!(display.contains("extreme"));
        assert!(display.contains("knowledge.rs:12"));
        assert!(display.contains("rule 7"));
        assert!(display.contains("Check the rule base"));
    }

    #[test]
    fn test_error_to_json() {
        let err = AnemiaError::missing_input("hgb");
        let json = err.to_json();
        assert!(json.contains("MISSING_INPUT"));
        assert!(json.contains("hgb"));
    }

    #[test]
    fn test_error_response_from_error() {
        let err = AnemiaError::non_numeric("mchc", "");
        let resp = ErrorResponse::from(&err);
        assert!(resp.error);
        assert_eq!(resp.code_num, 2002);
        assert_eq!(resp.details.unwrap().get("field"), Some(&"mchc".to_string()));
    }

    fn ensure_positive(x: f64) -> AnemiaResult<f64> {
        anemia_ensure!(x > 0.0, ErrorCode::InvalidInput, "{} is not positive", x);
        Ok(x)
    }

    #[test]
    fn test_ensure_macro() {
        assert!(ensure_positive(1.0).is_ok());
        let err = ensure_positive(-1.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.context.unwrap().location.unwrap().contains("error.rs"));
    }
}
