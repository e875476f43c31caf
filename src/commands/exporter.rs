// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result, bail};

use crate::app::App;
use crate::export;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(app, sub),
        _ => Ok(()),
    }
}

fn export_transactions(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    app.require_user()?;
    let fmt = sub
        .get_one::<String>("format")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    let out = sub
        .get_one::<String>("out")
        .map(String::as_str)
        .unwrap_or("transactions.csv");
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let txs = app.mirror.snapshot();
    let file = File::create(out).with_context(|| format!("Cannot create {}", out))?;
    let mut writer = BufWriter::new(file);
    if fmt == "csv" {
        export::write_csv(&txs, &mut writer)?;
    } else {
        export::write_json(&txs, &mut writer)?;
    }
    writer.flush()?;
    println!("Exported {} transactions to {}", txs.len(), out);
    Ok(())
}
