use serde::Deserialize;
use std::fmt;
use validator::Validate;

use crate::domain::error::{AppError, Result};

/// Portal login. Held only for the lifetime of the client that owns it.
#[derive(Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Rejects empty usernames or passwords before anything touches the network.
    pub fn ensure_present(&self) -> Result<()> {
        self.validate().map_err(|_| {
            AppError::ConfigurationError(format!(
                "Missing either/both user/pass (username: {})",
                self.username
            ))
        })
    }
}

// Keep the password out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_credentials_pass() {
        assert!(Credentials::new("alice", "secret").ensure_present().is_ok());
    }

    #[test]
    fn test_missing_password_rejected() {
        let err = Credentials::new("alice", "").ensure_present().unwrap_err();
        assert!(matches!(err, AppError::ConfigurationError(_)));
        assert!(err.to_string().contains("alice"));
    }

    #[test]
    fn test_missing_username_rejected() {
        let err = Credentials::new("", "secret").ensure_present().unwrap_err();
        assert!(matches!(err, AppError::ConfigurationError(_)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("alice", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }
}
