// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ties the signed-in user to the mirror's session.

use std::rc::Rc;

use anyhow::{Result, bail};
use rusqlite::Connection;

use crate::auth::{Auth, LocalAuth, User};
use crate::config::Config;
use crate::db;
use crate::mirror::{Mirror, SessionPolicy};
use crate::notify::ViewNotifier;
use crate::store::SqliteStore;

pub struct App {
    pub auth: LocalAuth,
    pub mirror: Mirror<SqliteStore>,
}

impl App {
    pub fn open(config: &Config) -> Result<Self> {
        let conn = db::open_or_init(&config.db_path)?;
        Ok(Self::with_connection(
            conn,
            config.session_policy,
            config.bcrypt_cost,
        ))
    }

    /// `conn` must already have the schema.
    pub fn with_connection(conn: Connection, policy: SessionPolicy, bcrypt_cost: u32) -> Self {
        let store = Rc::new(SqliteStore::new(conn));
        Self {
            auth: LocalAuth::new(Rc::clone(&store), bcrypt_cost),
            mirror: Mirror::new(store, policy),
        }
    }

    pub fn subscribe(&self, view: Rc<dyn ViewNotifier>) {
        self.mirror.subscribe(view);
    }

    /// Picks up whoever is signed in on this device and starts their session.
    pub fn restore(&self) -> Result<Option<User>> {
        match self.auth.current_user()? {
            Some(user) => {
                self.activate(&user.uid)?;
                Ok(Some(user))
            }
            None => {
                self.mirror.stop_session();
                Ok(None)
            }
        }
    }

    pub fn sign_up(&self, email: &str, password: &str) -> Result<User> {
        let user = self.auth.sign_up(email, password)?;
        self.activate(&user.uid)?;
        Ok(user)
    }

    /// A failed sign-in leaves nobody signed in.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        match self.auth.sign_in(email, password) {
            Ok(user) => {
                self.activate(&user.uid)?;
                Ok(user)
            }
            Err(err) => {
                self.mirror.stop_session();
                self.auth.sign_out()?;
                Err(err.into())
            }
        }
    }

    pub fn sign_out(&self) -> Result<()> {
        self.auth.sign_out()?;
        self.mirror.stop_session();
        Ok(())
    }

    /// The signed-in user's id, or an error telling them to sign in.
    pub fn require_user(&self) -> Result<String> {
        match self.mirror.active_user() {
            Some(uid) => Ok(uid),
            None => bail!("Not signed in. Run `spendwise auth login` first."),
        }
    }

    fn activate(&self, uid: &str) -> Result<()> {
        // always stop first so a lingering feed cannot leak into the new user
        if self.mirror.active_user().as_deref() != Some(uid) {
            self.mirror.stop_session();
        }
        self.mirror.start_session(uid)?;
        Ok(())
    }
}
