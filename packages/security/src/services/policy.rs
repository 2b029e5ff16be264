//! Password strength policy
//!
//! All rules are checked independently; every violated rule is reported,
//! in rule order, rather than stopping at the first failure.

use std::fmt;

use crate::error::SecurityError;

/// Symbols accepted by the symbol rule.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Minimum password length in characters.
const MIN_LENGTH: usize = 8;

/// A single violated strength rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSymbol,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => {
                write!(f, "password must be at least {} characters long", MIN_LENGTH)
            }
            Self::MissingUppercase => {
                write!(f, "password must contain at least one uppercase letter")
            }
            Self::MissingLowercase => {
                write!(f, "password must contain at least one lowercase letter")
            }
            Self::MissingDigit => write!(f, "password must contain at least one digit"),
            Self::MissingSymbol => {
                write!(f, "password must contain at least one special character")
            }
        }
    }
}

/// Check a password against every strength rule.
///
/// Returns the violated rules in rule order; an empty list means the
/// password satisfies the policy.
pub fn validate(password: &str) -> Vec<PolicyViolation> {
    let mut violations = Vec::new();

    if password.chars().count() < MIN_LENGTH {
        violations.push(PolicyViolation::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push(PolicyViolation::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push(PolicyViolation::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PolicyViolation::MissingDigit);
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        violations.push(PolicyViolation::MissingSymbol);
    }

    violations
}

/// Validate a password, converting violations into a [`SecurityError`].
pub fn enforce(password: &str) -> Result<(), SecurityError> {
    let violations = validate(password);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(SecurityError::WeakPassword(
            violations.iter().map(ToString::to_string).collect(),
        ))
    }
}
