// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use spendwise::app::App;
use spendwise::mirror::SessionPolicy;
use spendwise::{cli, commands::transactions, db};

fn signed_in_app() -> App {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let app = App::with_connection(conn, SessionPolicy::Replace, 4);
    app.sign_up("ann@example.com", "hunter22").unwrap();
    app
}

fn run(app: &App, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["spendwise", "tx"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("tx", tx_m)) => transactions::handle(app, tx_m),
        _ => panic!("no tx subcommand"),
    }
}

fn rows(app: &App, args: &[&str]) -> Vec<transactions::TransactionRow> {
    let mut argv = vec!["spendwise", "tx", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            return transactions::query_rows(app, list_m).unwrap();
        }
    }
    panic!("no tx list subcommand");
}

fn seed(app: &App) {
    for (day, category, note) in [
        ("2025-01-01", "Food", "groceries"),
        ("2025-01-02", "Transport", "bus pass"),
        ("2025-01-03", "Food", "coffee"),
    ] {
        run(
            app,
            &[
                "add", "--type", "expense", "--amount", "10", "--date", day, "--category",
                category, "--note", note,
            ],
        )
        .unwrap();
    }
}

#[test]
fn list_limit_respected() {
    let app = signed_in_app();
    seed(&app);
    let data = rows(&app, &["--limit", "2"]);
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].date, "2025-01-03");
    assert_eq!(data[1].date, "2025-01-02");
}

#[test]
fn list_filters_by_search_and_category() {
    let app = signed_in_app();
    seed(&app);

    let coffee = rows(&app, &["--search", "COF"]);
    assert_eq!(coffee.len(), 1);
    assert_eq!(coffee[0].note, "coffee");

    let food = rows(&app, &["--category", "food"]);
    assert_eq!(food.len(), 2);
    assert!(food.iter().all(|r| r.category == "Food"));

    // the query also matches category names
    assert_eq!(rows(&app, &["--search", "trans"]).len(), 1);
    assert!(rows(&app, &["--search", "coffee", "--category", "Transport"]).is_empty());
}

#[test]
fn add_rejects_negative_amount() {
    let app = signed_in_app();
    let err = run(
        &app,
        &["add", "--type", "expense", "--amount", "-5", "--category", "Food"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("must not be negative"));
    assert!(app.mirror.snapshot().is_empty());
}

#[test]
fn rm_deletes_by_id() {
    let app = signed_in_app();
    seed(&app);
    let id = rows(&app, &[])[0].id.clone();
    run(&app, &["rm", &id, "--yes"]).unwrap();
    let left = rows(&app, &[]);
    assert_eq!(left.len(), 2);
    assert!(left.iter().all(|r| r.id != id));
    assert!(run(&app, &["rm", &id, "--yes"]).is_err());
}

#[test]
fn commands_require_sign_in() {
    let app = signed_in_app();
    app.sign_out().unwrap();
    let err = run(
        &app,
        &["add", "--type", "income", "--amount", "5", "--category", "Salary"],
    )
    .unwrap_err();
    assert!(err.to_string().starts_with("Not signed in"));
}

#[test]
fn users_only_see_their_own_transactions() {
    let app = signed_in_app();
    seed(&app);
    app.sign_up("bob@example.com", "hunter22").unwrap();
    assert!(rows(&app, &[]).is_empty());
    app.sign_in("ann@example.com", "hunter22").unwrap();
    assert_eq!(rows(&app, &[]).len(), 3);
}

#[test]
fn rm_refuses_another_users_transaction() {
    let app = signed_in_app();
    seed(&app);
    let ann_id = rows(&app, &[])[0].id.clone();

    app.sign_up("bob@example.com", "hunter22").unwrap();
    let err = run(&app, &["rm", &ann_id, "--yes"]).unwrap_err();
    assert!(err.to_string().starts_with("delete transaction failed"));

    app.sign_in("ann@example.com", "hunter22").unwrap();
    let left = rows(&app, &[]);
    assert_eq!(left.len(), 3);
    assert!(left.iter().any(|r| r.id == ann_id));
}

#[test]
fn blank_category_lists_everything() {
    let app = signed_in_app();
    seed(&app);
    assert_eq!(rows(&app, &["--category", ""]).len(), 3);
    assert_eq!(rows(&app, &["--category", "  "]).len(), 3);
}
