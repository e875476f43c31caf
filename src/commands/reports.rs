// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::aggregate::{Analytics, BalancePoint, Dashboard, running_balance_series};
use crate::app::App;
use crate::utils::{fmt_percent, fmt_usd, maybe_print_json, pretty_table};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("dashboard", sub)) => dashboard(app, sub)?,
        Some(("analytics", sub)) => analytics(app, sub)?,
        Some(("trend", sub)) => trend(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn dashboard(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    app.require_user()?;
    let dash = app.mirror.aggregates().dashboard;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &dash)? {
        return Ok(());
    }
    println!("{}", pretty_table(&["", "Amount"], dashboard_rows(&dash)));
    let recent: Vec<Vec<String>> = dash
        .recent
        .iter()
        .map(|t| {
            vec![
                t.date.to_string(),
                t.category.clone(),
                fmt_usd(&t.signed_amount()),
                t.note.clone().unwrap_or_default(),
            ]
        })
        .collect();
    if recent.is_empty() {
        println!("No transactions yet.");
    } else {
        println!(
            "{}",
            pretty_table(&["Date", "Category", "Amount", "Note"], recent)
        );
    }
    Ok(())
}

pub fn dashboard_rows(dash: &Dashboard) -> Vec<Vec<String>> {
    vec![
        vec!["Total balance".into(), fmt_usd(&dash.total_balance)],
        vec!["Income this month".into(), fmt_usd(&dash.this_month.income)],
        vec!["Expenses this month".into(), fmt_usd(&dash.this_month.expense)],
    ]
}

fn analytics(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    app.require_user()?;
    let stats = app.mirror.aggregates().analytics;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &stats)? {
        return Ok(());
    }
    println!("{}", pretty_table(&["Metric", "Value"], analytics_rows(&stats)));
    if !stats.breakdown.is_empty() {
        let rows = stats
            .breakdown
            .iter()
            .map(|c| vec![c.category.clone(), fmt_usd(&c.total)])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent"], rows));
    }
    Ok(())
}

pub fn analytics_rows(stats: &Analytics) -> Vec<Vec<String>> {
    let top = match &stats.top_category {
        Some(c) => format!("{} ({})", c.category, fmt_usd(&c.total)),
        None => "None".to_string(),
    };
    vec![
        vec!["Total income".into(), fmt_usd(&stats.totals.income)],
        vec!["Total expenses".into(), fmt_usd(&stats.totals.expense)],
        vec!["Saving rate".into(), fmt_percent(&stats.saving_rate)],
        vec!["Top expense category".into(), top],
        vec![
            "Average monthly expense".into(),
            fmt_usd(&stats.average_monthly_expense),
        ],
    ]
}

fn trend(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    app.require_user()?;
    let points: Vec<BalancePoint> = running_balance_series(&app.mirror.snapshot()).iter().collect();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &points)? {
        return Ok(());
    }
    let rows = points
        .iter()
        .map(|p| vec![p.date.to_string(), fmt_usd(&p.balance)])
        .collect();
    println!("{}", pretty_table(&["Date", "Balance"], rows));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregates, CategoryTotal};
    use crate::models::{Transaction, TxType};
    use chrono::NaiveDate;

    fn tx(kind: TxType, amount: &str, category: &str, day: u32) -> Transaction {
        Transaction {
            id: None,
            uid: "u1".into(),
            r#type: kind,
            amount: amount.parse().unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            category: category.into(),
            note: None,
            created_at: None,
        }
    }

    #[test]
    fn analytics_rows_format_money_and_rate() {
        let txs = vec![
            tx(TxType::Income, "1000", "Salary", 20),
            tx(TxType::Expense, "150", "Rent", 15),
            tx(TxType::Expense, "50", "Food", 10),
        ];
        let agg = Aggregates::compute(&txs, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let rows = analytics_rows(&agg.analytics);
        assert_eq!(rows[0][1], "$1,000.00");
        assert_eq!(rows[1][1], "$200.00");
        assert_eq!(rows[2][1], "80.0%");
        assert_eq!(rows[3][1], "Rent ($150.00)");
        assert_eq!(rows[4][1], "$200.00");
        assert_eq!(
            agg.analytics.top_category,
            Some(CategoryTotal {
                category: "Rent".into(),
                total: "150".parse().unwrap()
            })
        );
    }

    #[test]
    fn empty_analytics_show_none() {
        let rows = analytics_rows(&Aggregates::default().analytics);
        assert_eq!(rows[2][1], "0.0%");
        assert_eq!(rows[3][1], "None");
    }

    #[test]
    fn dashboard_rows_show_negative_balance() {
        let txs = vec![tx(TxType::Expense, "20", "Food", 3)];
        let agg = Aggregates::compute(&txs, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let rows = dashboard_rows(&agg.dashboard);
        assert_eq!(rows[0][1], "-$20.00");
        assert_eq!(rows[2][1], "$20.00");
    }
}
