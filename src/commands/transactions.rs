// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::{self, BufRead, Write};

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::app::App;
use crate::filter::{CategoryFilter, TransactionFilter};
use crate::models::{NewTransaction, TxType};
use crate::utils::{fmt_usd, maybe_print_json, parse_amount, parse_date, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        Some(("rm", sub)) => rm(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let uid = app.require_user()?;
    let tx = new_transaction(sub)?;
    let id = app.mirror.add_transaction(&uid, &tx)?;
    println!(
        "Recorded {} {} on {} in '{}' (id: {})",
        tx.r#type,
        fmt_usd(&tx.amount),
        tx.date,
        tx.category,
        id
    );
    Ok(())
}

/// Reads and validates the `tx add` arguments.
pub fn new_transaction(sub: &clap::ArgMatches) -> Result<NewTransaction> {
    let kind: TxType = sub
        .get_one::<String>("type")
        .map(String::as_str)
        .unwrap_or_default()
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let amount = parse_amount(sub.get_one::<String>("amount").map(String::as_str).unwrap_or_default())?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let category = sub
        .get_one::<String>("category")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Category must not be empty"))?;
    let note = sub
        .get_one::<String>("note")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Ok(NewTransaction {
        r#type: kind,
        amount,
        date,
        category,
        note,
    })
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(app, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.r#type.clone(),
                    r.category.clone(),
                    r.display_amount(),
                    r.note.clone(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Type", "Category", "Amount", "Note", "ID"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub category: String,
    pub amount: String,
    pub note: String,
}

impl TransactionRow {
    fn display_amount(&self) -> String {
        let amount = self.amount.parse().unwrap_or_default();
        if self.r#type == TxType::Expense.as_str() {
            format!("-{}", fmt_usd(&amount))
        } else {
            format!("+{}", fmt_usd(&amount))
        }
    }
}

/// The signed-in user's transactions matching `--search` and `--category`,
/// newest first, cut to `--limit`.
pub fn query_rows(app: &App, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    app.require_user()?;
    let query = sub.get_one::<String>("search").map(String::as_str).unwrap_or_default();
    let category = match sub.get_one::<String>("category") {
        Some(c) => c.parse::<CategoryFilter>().unwrap_or_default(),
        None => CategoryFilter::All,
    };
    let filter = TransactionFilter::new(query, category);
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);

    Ok(app
        .mirror
        .apply_filter(&filter)
        .into_iter()
        .take(limit)
        .map(|t| TransactionRow {
            id: t.id.unwrap_or_default(),
            date: t.date.to_string(),
            r#type: t.r#type.to_string(),
            category: t.category,
            amount: t.amount.to_string(),
            note: t.note.unwrap_or_default(),
        })
        .collect())
}

fn rm(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    app.require_user()?;
    let id = sub.get_one::<String>("id").map(String::as_str).unwrap_or_default();
    if !sub.get_flag("yes") && !confirm(&format!("Delete transaction {}?", id))? {
        println!("Kept {}", id);
        return Ok(());
    }
    app.mirror.remove_transaction(id)?;
    println!("Deleted {}", id);
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
