// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::db;
use crate::mirror::SessionPolicy;

pub const DB_ENV: &str = "SPENDWISE_DB";
pub const SESSION_POLICY_ENV: &str = "SPENDWISE_SESSION_POLICY";
pub const BCRYPT_COST_ENV: &str = "SPENDWISE_BCRYPT_COST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub session_policy: SessionPolicy,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Reads the global CLI options, falling back to the environment and then
    /// to defaults. `--db` already carries `SPENDWISE_DB` through clap.
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        Self::from_parts(
            m.get_one::<String>("db").map(String::as_str),
            env::var(SESSION_POLICY_ENV).ok().as_deref(),
            env::var(BCRYPT_COST_ENV).ok().as_deref(),
        )
    }

    pub fn from_parts(db: Option<&str>, policy: Option<&str>, cost: Option<&str>) -> Result<Self> {
        let db_path = match db.map(str::trim).filter(|s| !s.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => db::default_db_path()?,
        };
        let session_policy = match policy {
            Some(p) => p.parse::<SessionPolicy>().map_err(|e| anyhow!(e))?,
            None => SessionPolicy::default(),
        };
        let bcrypt_cost = match cost {
            Some(c) => c
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid {} '{}'", BCRYPT_COST_ENV, c))?,
            None => bcrypt::DEFAULT_COST,
        };
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(anyhow!("{} must be between 4 and 31", BCRYPT_COST_ENV));
        }
        Ok(Self {
            db_path,
            session_policy,
            bcrypt_cost,
        })
    }
}
