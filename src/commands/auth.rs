// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io;

use anyhow::{Context, Result, anyhow, bail};

use crate::app::App;
use crate::auth::Auth;
use crate::error::AuthError;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("signup", sub)) => signup(app, sub)?,
        Some(("login", sub)) => login(app, sub)?,
        Some(("logout", _)) => {
            app.sign_out()?;
            println!("Signed out");
        }
        Some(("whoami", _)) => match app.auth.current_user()? {
            Some(user) => println!("{} ({})", user.email, user.uid),
            None => println!("Not signed in"),
        },
        _ => {}
    }
    Ok(())
}

/// Replaces an [`AuthError`] with the message a user should see.
pub fn friendly(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<AuthError>() {
        Some(auth) => anyhow!(auth.friendly_message()),
        None => err,
    }
}

fn signup(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let email = sub.get_one::<String>("email").map(String::as_str).unwrap_or_default();
    let password = password_arg(sub, "password", "Password: ")?;
    let confirm = password_arg(sub, "confirm", "Confirm password: ")?;
    check_confirmation(&password, &confirm)?;
    let user = app.sign_up(email, &password).map_err(friendly)?;
    println!("Signed up and signed in as {}", user.email);
    Ok(())
}

fn login(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let email = sub.get_one::<String>("email").map(String::as_str).unwrap_or_default();
    let password = password_arg(sub, "password", "Password: ")?;
    let user = app.sign_in(email, &password).map_err(friendly)?;
    println!("Signed in as {}", user.email);
    Ok(())
}

pub fn check_confirmation(password: &str, confirm: &str) -> Result<()> {
    if password != confirm {
        bail!("Passwords do not match");
    }
    Ok(())
}

fn password_arg(sub: &clap::ArgMatches, id: &str, prompt: &str) -> Result<String> {
    if let Some(p) = sub.get_one::<String>(id) {
        return Ok(p.clone());
    }
    match rpassword::prompt_password(prompt) {
        Ok(p) => Ok(p),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => bail!("No password given"),
        Err(e) => Err(e).context("Could not read password from stdin"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friendly_rewrites_auth_errors_only() {
        let err = friendly(AuthError::new("auth/wrong-password", "INVALID_PASSWORD").into());
        assert_eq!(err.to_string(), "Incorrect password. Please try again.");
        let other = friendly(anyhow!("disk full"));
        assert_eq!(other.to_string(), "disk full");
    }

    #[test]
    fn confirmation_must_match() {
        assert!(check_confirmation("hunter22", "hunter22").is_ok());
        let err = check_confirmation("hunter22", "hunter23").unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }
}
