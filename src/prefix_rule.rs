use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocator::DEFAULT_WIDTH;

static PREFIX_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("prefix pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefixRuleError {
    #[error("prefix must be ASCII alphanumeric and start with a letter, got {0:?}")]
    InvalidPrefix(String),
    #[error("pad width must be at least 1")]
    ZeroWidth,
}

/// Per-kind allocation settings: the literal prefix a client configured for
/// that record kind, and the pad width of the numeric suffix. The allocator
/// itself never sees an empty or malformed prefix because construction
/// rejects it here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    pub width: usize,
}

impl PrefixRule {
    pub fn new(prefix: impl Into<String>, width: usize) -> Result<Self, PrefixRuleError> {
        let prefix = prefix.into();
        if !PREFIX_SHAPE.is_match(&prefix) {
            return Err(PrefixRuleError::InvalidPrefix(prefix));
        }
        if width == 0 {
            return Err(PrefixRuleError::ZeroWidth);
        }
        Ok(PrefixRule { prefix, width })
    }

    pub fn with_default_width(prefix: impl Into<String>) -> Result<Self, PrefixRuleError> {
        Self::new(prefix, DEFAULT_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_width_is_four() {
        let rule = PrefixRule::with_default_width("SM").unwrap();
        assert_eq!(rule.prefix, "SM");
        assert_eq!(rule.width, 4);
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        assert_eq!(
            PrefixRule::new("", 4),
            Err(PrefixRuleError::InvalidPrefix(String::new()))
        );
    }

    #[test]
    fn test_prefix_with_separator_is_rejected() {
        assert!(matches!(
            PrefixRule::new("SM-", 4),
            Err(PrefixRuleError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_prefix_starting_with_digit_is_rejected() {
        assert!(matches!(
            PrefixRule::new("1SM", 4),
            Err(PrefixRuleError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_zero_width_is_rejected() {
        assert_eq!(PrefixRule::new("SM", 0), Err(PrefixRuleError::ZeroWidth));
    }

    #[test]
    fn test_mixed_case_alphanumeric_prefix_is_accepted() {
        assert!(PrefixRule::new("Appu2", 4).is_ok());
    }
}
