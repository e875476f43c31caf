// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("malformed document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A write to the store that did not go through. Writes are never retried;
/// the caller decides what to do with its own state.
#[derive(Debug, Error)]
#[error("{op} failed: {reason}")]
pub struct WriteError {
    pub op: &'static str,
    #[source]
    pub reason: StoreError,
}

impl WriteError {
    pub fn new(op: &'static str, reason: StoreError) -> Self {
        Self { op, reason }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a session for user '{active}' is already active; stop it first")]
    AlreadyActive { active: String },
}

/// An authentication failure, carrying a stable `auth/...` code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} ({code})")]
pub struct AuthError {
    pub code: String,
    pub message: String,
}

impl AuthError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Text suitable for showing to the user. Known codes get a friendlier
    /// wording, anything else passes the underlying message through.
    pub fn friendly_message(&self) -> String {
        match self.code.as_str() {
            "auth/quota-exceeded" => {
                "Too many login attempts. Please try again later.".to_string()
            }
            "auth/wrong-password" => "Incorrect password. Please try again.".to_string(),
            "auth/user-not-found" => "No account found with this email.".to_string(),
            "auth/invalid-email" => "Invalid email address.".to_string(),
            "auth/unauthorized-domain" => {
                "This client is not authorized for authentication.".to_string()
            }
            _ => self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_auth_codes_get_friendly_text() {
        let err = AuthError::new("auth/wrong-password", "INVALID_PASSWORD");
        assert_eq!(err.friendly_message(), "Incorrect password. Please try again.");
        let err = AuthError::new("auth/user-not-found", "EMAIL_NOT_FOUND");
        assert_eq!(err.friendly_message(), "No account found with this email.");
    }

    #[test]
    fn unknown_auth_codes_pass_message_through() {
        let err = AuthError::new("auth/email-already-in-use", "Email already registered.");
        assert_eq!(err.friendly_message(), "Email already registered.");
    }

    #[test]
    fn write_error_names_the_operation() {
        let err = WriteError::new(
            "delete transaction",
            StoreError::NotFound {
                collection: "transactions".into(),
                id: "x1".into(),
            },
        );
        assert_eq!(
            err.to_string(),
            "delete transaction failed: document 'x1' not found in 'transactions'"
        );
    }
}
