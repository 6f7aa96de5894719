//! Validated Instagram profile handle.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Instagram caps usernames at 30 characters.
pub const MAX_HANDLE_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("profile handle is empty")]
    Empty,

    #[error("profile handle is longer than {MAX_HANDLE_LEN} characters")]
    TooLong,

    #[error("profile handle contains disallowed character {0:?}")]
    DisallowedChar(char),
}

/// A non-empty profile identifier made of ASCII letters, digits, `.` and `_`.
///
/// Construct with [`ProfileHandle::parse`]; the inner string cannot be
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProfileHandle(String);

impl ProfileHandle {
    /// Parses user input into a handle.
    ///
    /// Surrounding whitespace and a single leading `@` are stripped before
    /// validation, so `" @chef_ana "` and `"chef_ana"` are the same handle.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError`] when the handle is empty, too long, or contains
    /// a character outside `[A-Za-z0-9._]`.
    pub fn parse(raw: &str) -> Result<Self, HandleError> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed);

        if trimmed.is_empty() {
            return Err(HandleError::Empty);
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '_'))
        {
            return Err(HandleError::DisallowedChar(bad));
        }
        if trimmed.len() > MAX_HANDLE_LEN {
            return Err(HandleError::TooLong);
        }

        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProfileHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
