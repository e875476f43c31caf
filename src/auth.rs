// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Sign-up, sign-in and the signed-in user.
//!
//! Failures are [`AuthError`]s with `auth/...` codes so the front end can
//! map them to friendly text with [`AuthError::friendly_message`].

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{OptionalExtension, params};

use crate::error::AuthError;
use crate::store::SqliteStore;
use crate::utils::random_id;

const UID_LEN: usize = 28;
const MIN_PASSWORD_LEN: usize = 6;
const SESSION_KEY: &str = "session_uid";

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub uid: String,
    pub email: String,
}

pub trait Auth {
    fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError>;
    fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;
    fn sign_out(&self) -> Result<(), AuthError>;
    /// The user signed in on this device, if any.
    fn current_user(&self) -> Result<Option<User>, AuthError>;
}

/// Accounts kept in the local database, passwords hashed with bcrypt. The
/// signed-in user survives restarts through the `settings` table.
pub struct LocalAuth {
    store: Rc<SqliteStore>,
    cost: u32,
}

fn internal(err: impl std::fmt::Display) -> AuthError {
    AuthError::new("auth/internal-error", err.to_string())
}

impl LocalAuth {
    pub fn new(store: Rc<SqliteStore>, cost: u32) -> Self {
        Self { store, cost }
    }

    fn normalize_email(email: &str) -> Result<String, AuthError> {
        let email = email.trim().to_lowercase();
        if !EMAIL.is_match(&email) {
            return Err(AuthError::new(
                "auth/invalid-email",
                format!("'{}' is not a valid email address.", email),
            ));
        }
        Ok(email)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<(User, String)>, AuthError> {
        self.store
            .connection()
            .query_row(
                "SELECT uid, email, password_hash FROM users WHERE email=?1",
                params![email],
                |r| {
                    Ok((
                        User {
                            uid: r.get(0)?,
                            email: r.get(1)?,
                        },
                        r.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(internal)
    }

    fn remember(&self, uid: &str) -> Result<(), AuthError> {
        self.store
            .connection()
            .execute(
                "INSERT INTO settings(key, value) VALUES(?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value",
                params![SESSION_KEY, uid],
            )
            .map_err(internal)?;
        Ok(())
    }
}

impl Auth for LocalAuth {
    fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Self::normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::new(
                "auth/weak-password",
                format!("Password should be at least {} characters.", MIN_PASSWORD_LEN),
            ));
        }
        if self.find_by_email(&email)?.is_some() {
            return Err(AuthError::new(
                "auth/email-already-in-use",
                "An account already exists for this email.",
            ));
        }
        let hash = bcrypt::hash(password, self.cost).map_err(internal)?;
        let user = User {
            uid: random_id(UID_LEN),
            email,
        };
        self.store
            .connection()
            .execute(
                "INSERT INTO users(uid, email, password_hash) VALUES (?1, ?2, ?3)",
                params![user.uid, user.email, hash],
            )
            .map_err(internal)?;
        self.remember(&user.uid)?;
        tracing::info!(uid = %user.uid, "account created");
        Ok(user)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Self::normalize_email(email)?;
        let Some((user, hash)) = self.find_by_email(&email)? else {
            return Err(AuthError::new("auth/user-not-found", "EMAIL_NOT_FOUND"));
        };
        if !bcrypt::verify(password, &hash).map_err(internal)? {
            return Err(AuthError::new("auth/wrong-password", "INVALID_PASSWORD"));
        }
        self.remember(&user.uid)?;
        tracing::info!(uid = %user.uid, "signed in");
        Ok(user)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        self.store
            .connection()
            .execute("DELETE FROM settings WHERE key=?1", params![SESSION_KEY])
            .map_err(internal)?;
        tracing::info!("signed out");
        Ok(())
    }

    fn current_user(&self) -> Result<Option<User>, AuthError> {
        self.store
            .connection()
            .query_row(
                "SELECT u.uid, u.email FROM settings s JOIN users u ON u.uid = s.value
                 WHERE s.key=?1",
                params![SESSION_KEY],
                |r| {
                    Ok(User {
                        uid: r.get(0)?,
                        email: r.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn auth() -> LocalAuth {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        LocalAuth::new(Rc::new(SqliteStore::new(conn)), 4)
    }

    #[test]
    fn sign_up_signs_in() {
        let auth = auth();
        let user = auth.sign_up("Ann@Example.com ", "hunter22").unwrap();
        assert_eq!(user.email, "ann@example.com");
        assert_eq!(user.uid.len(), UID_LEN);
        assert_eq!(auth.current_user().unwrap(), Some(user));
    }

    #[test]
    fn sign_in_checks_password() {
        let auth = auth();
        let user = auth.sign_up("ann@example.com", "hunter22").unwrap();
        auth.sign_out().unwrap();
        assert_eq!(auth.current_user().unwrap(), None);

        let err = auth.sign_in("ann@example.com", "hunter23").unwrap_err();
        assert_eq!(err.code, "auth/wrong-password");
        assert_eq!(auth.current_user().unwrap(), None);

        assert_eq!(auth.sign_in("ANN@example.com", "hunter22").unwrap(), user);
        assert_eq!(auth.current_user().unwrap(), Some(user));
    }

    #[test]
    fn unknown_email_is_user_not_found() {
        let err = auth().sign_in("nobody@example.com", "whatever").unwrap_err();
        assert_eq!(err.code, "auth/user-not-found");
        assert_eq!(err.friendly_message(), "No account found with this email.");
    }

    #[test]
    fn sign_up_validation() {
        let auth = auth();
        assert_eq!(
            auth.sign_up("not-an-email", "hunter22").unwrap_err().code,
            "auth/invalid-email"
        );
        assert_eq!(
            auth.sign_up("ann@example.com", "123").unwrap_err().code,
            "auth/weak-password"
        );
        auth.sign_up("ann@example.com", "hunter22").unwrap();
        let dup = auth.sign_up("ann@example.com", "hunter22").unwrap_err();
        assert_eq!(dup.code, "auth/email-already-in-use");
        assert_eq!(dup.friendly_message(), "An account already exists for this email.");
    }

    #[test]
    fn sign_out_without_session_is_fine() {
        let auth = auth();
        auth.sign_out().unwrap();
        assert!(auth.current_user().unwrap().is_none());
    }
}
