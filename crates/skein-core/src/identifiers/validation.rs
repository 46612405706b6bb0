//! Identifier validation rules and utilities

use std::fmt;

/// Maximum length for all identifier types
pub const MAX_ID_LENGTH: usize = 128;

/// Error type for identifier validation failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    /// The identifier string is empty
    Empty,
    /// The identifier contains only whitespace
    WhitespaceOnly,
    /// The identifier has leading or trailing whitespace
    LeadingTrailingWhitespace,
    /// The identifier contains invalid characters
    InvalidCharacters,
    /// The identifier exceeds the maximum length
    TooLong { length: usize, max: usize },
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Identifier cannot be empty"),
            Self::WhitespaceOnly => write!(f, "Identifier cannot be whitespace-only"),
            Self::LeadingTrailingWhitespace => {
                write!(f, "Identifier cannot have leading or trailing whitespace")
            }
            Self::InvalidCharacters => write!(
                f,
                "Identifier can only contain alphanumeric characters, hyphens, underscores, and dots"
            ),
            Self::TooLong { length, max } => {
                write!(f, "Identifier too long ({} chars, max {})", length, max)
            }
        }
    }
}

impl std::error::Error for IdValidationError {}

/// Validator for identifier strings
pub struct IdValidator;

impl IdValidator {
    /// Validate an identifier string according to Skein rules
    ///
    /// # Validation Rules
    ///
    /// - Non-empty (minimum 1 character)
    /// - Maximum 128 characters
    /// - No leading or trailing whitespace
    /// - Only alphanumeric characters, hyphens (`-`), underscores (`_`), and dots (`.`)
    ///
    /// Remote services mint identifiers like `thread_aBc123` and
    /// `run_Xy9`; all of them fall inside this charset, so the rules
    /// reject malformed references without ever rejecting real ones.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use skein_core::identifiers::IdValidator;
    ///
    /// // Valid identifiers
    /// assert!(IdValidator::validate("thread_abc123").is_ok());
    /// assert!(IdValidator::validate("display_quiz").is_ok());
    /// assert!(IdValidator::validate("run.42").is_ok());
    ///
    /// // Invalid identifiers
    /// assert!(IdValidator::validate("").is_err());
    /// assert!(IdValidator::validate("  ").is_err());
    /// assert!(IdValidator::validate("run/42").is_err());
    /// ```
    pub fn validate(id: &str) -> Result<&str, IdValidationError> {
        if id.is_empty() {
            return Err(IdValidationError::Empty);
        }

        if id.trim().is_empty() {
            return Err(IdValidationError::WhitespaceOnly);
        }

        if id != id.trim() {
            return Err(IdValidationError::LeadingTrailingWhitespace);
        }

        if id.len() > MAX_ID_LENGTH {
            return Err(IdValidationError::TooLong {
                length: id.len(),
                max: MAX_ID_LENGTH,
            });
        }

        if !id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(IdValidationError::InvalidCharacters);
        }

        Ok(id)
    }

    /// Check if a character is valid in an identifier
    pub fn is_valid_char(c: char) -> bool {
        c.is_alphanumeric() || c == '-' || c == '_' || c == '.'
    }
}
