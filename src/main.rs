// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::rc::Rc;

use anyhow::Result;
use tracing::debug;

use spendwise::app::App;
use spendwise::config::Config;
use spendwise::notify::TerminalNotifier;
use spendwise::{cli, commands, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    logging::init(matches.get_count("verbose"));

    let config = Config::from_matches(&matches)?;
    debug!(db = %config.db_path.display(), policy = ?config.session_policy, "opening");
    let app = App::open(&config)?;
    app.subscribe(Rc::new(TerminalNotifier));
    if let Some(user) = app.restore()? {
        debug!(uid = %user.uid, "restored session");
    }

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", config.db_path.display());
        }
        Some(("auth", sub)) => commands::auth::handle(&app, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&app, sub)?,
        Some(("category", sub)) => commands::categories::handle(&app, sub)?,
        Some(("report", sub)) => commands::reports::handle(&app, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&app, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
