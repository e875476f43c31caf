// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};

use crate::app::App;
use crate::mirror::RemoveOutcome;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let uid = app.require_user()?;
            let name = sub.get_one::<String>("name").map(|s| s.trim()).unwrap_or_default();
            if name.is_empty() {
                bail!("Category name must not be empty");
            }
            app.mirror.add_category(&uid, name)?;
            println!("Added category '{}'", name);
        }
        Some(("list", sub)) => {
            app.require_user()?;
            let data: Vec<Vec<String>> = app
                .mirror
                .display_categories()
                .into_iter()
                .map(|c| {
                    let kind = if c.is_default() { "default" } else { "custom" };
                    vec![c.name, kind.to_string()]
                })
                .collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                println!("{}", pretty_table(&["Category", "Kind"], data));
            }
        }
        Some(("rm", sub)) => {
            app.require_user()?;
            let name = sub.get_one::<String>("name").map(|s| s.trim()).unwrap_or_default();
            let Some(category) = app
                .mirror
                .display_categories()
                .into_iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
            else {
                bail!("No category named '{}'", name);
            };
            // defaults are refused with an alert from the mirror
            if app.mirror.remove_category(&category)? == RemoveOutcome::Removed {
                println!("Removed category '{}'", category.name);
            }
        }
        _ => {}
    }
    Ok(())
}
