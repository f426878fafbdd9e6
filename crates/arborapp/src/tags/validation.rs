//! Tag name validation.
//!
//! Valid tags:
//! - Start with a letter or digit
//! - Contain only letters, digits, underscores (`_`), hyphens (`-`), dots (`.`)
//!   and slashes (`/`)
//! - Never contain whitespace or the `:` delimiter

/// Validates a tag name (without its leading `:`).
///
/// # Examples
/// ```
/// use arborapp::tags::validation::validate_tag_name;
///
/// assert!(validate_tag_name("work").is_ok());
/// assert!(validate_tag_name("2024").is_ok());
/// assert!(validate_tag_name("home/garden").is_ok());
/// assert!(validate_tag_name("büro").is_ok());
///
/// assert!(validate_tag_name("").is_err());
/// assert!(validate_tag_name(")").is_err());
/// assert!(validate_tag_name("two words").is_err());
/// assert!(validate_tag_name("a:b").is_err());
/// ```
pub fn validate_tag_name(name: &str) -> Result<(), TagValidationError> {
    let mut chars = name.chars();
    let Some(first_char) = chars.next() else {
        return Err(TagValidationError::Empty);
    };
    if !first_char.is_alphanumeric() {
        return Err(TagValidationError::InvalidStart(first_char));
    }

    match chars.find(|ch| !is_valid_tag_char(*ch)) {
        Some(ch) => Err(TagValidationError::InvalidCharacter(ch)),
        None => Ok(()),
    }
}

fn is_valid_tag_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | '/')
}

/// Error type for tag name validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    /// Tag name is empty
    Empty,
    /// Tag name starts with something other than a letter or digit
    InvalidStart(char),
    /// Tag name contains an invalid character
    InvalidCharacter(char),
}

impl std::fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValidationError::Empty => write!(f, "tag name cannot be empty"),
            TagValidationError::InvalidStart(ch) => {
                write!(f, "tag name must start with a letter or digit, found '{}'", ch)
            }
            TagValidationError::InvalidCharacter(ch) => {
                write!(f, "tag name contains invalid character '{}'", ch)
            }
        }
    }
}

impl std::error::Error for TagValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tags() {
        assert!(validate_tag_name("foo").is_ok());
        assert!(validate_tag_name("foo-bar_baz").is_ok());
        assert!(validate_tag_name("v1.2").is_ok());
        assert!(validate_tag_name("7days").is_ok());
    }

    #[test]
    fn test_invalid_empty() {
        assert_eq!(validate_tag_name(""), Err(TagValidationError::Empty));
    }

    #[test]
    fn test_invalid_start() {
        assert_eq!(
            validate_tag_name("-foo"),
            Err(TagValidationError::InvalidStart('-'))
        );
        assert_eq!(
            validate_tag_name(")"),
            Err(TagValidationError::InvalidStart(')'))
        );
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            validate_tag_name("foo bar"),
            Err(TagValidationError::InvalidCharacter(' '))
        );
        assert_eq!(
            validate_tag_name("foo:bar"),
            Err(TagValidationError::InvalidCharacter(':'))
        );
        assert_eq!(
            validate_tag_name("foo#bar"),
            Err(TagValidationError::InvalidCharacter('#'))
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            TagValidationError::Empty.to_string(),
            "tag name cannot be empty"
        );
        assert_eq!(
            TagValidationError::InvalidCharacter('@').to_string(),
            "tag name contains invalid character '@'"
        );
    }
}
