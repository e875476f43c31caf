// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

use crate::config::DB_ENV;

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn credentials(cmd: Command) -> Command {
    cmd.arg(Arg::new("email").long("email").required(true))
        .arg(
            Arg::new("password")
                .long("password")
                .help("Prompted for when omitted"),
        )
}

pub fn build_cli() -> Command {
    Command::new("spendwise")
        .about("Track income and expenses, with dashboards and analytics")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env(DB_ENV)
                .help("Database file (defaults to the platform data dir)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("More log output on stderr (-v info, -vv debug)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("auth")
                .about("Accounts and sign-in")
                .subcommand_required(true)
                .subcommand(credentials(
                    Command::new("signup").about("Create an account and sign in"),
                )
                .arg(Arg::new("confirm").long("confirm").help("Password again")))
                .subcommand(credentials(Command::new("login").about("Sign in")))
                .subcommand(Command::new("logout").about("Sign out"))
                .subcommand(Command::new("whoami").about("Show the signed-in user")),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction")
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, defaults to today"))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transactions, newest first")
                        .arg(
                            Arg::new("search")
                                .long("search")
                                .help("Match against note or category"),
                        )
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .default_value("all"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction")
                        .arg(Arg::new("id").required(true))
                        .arg(
                            Arg::new("yes")
                                .long("yes")
                                .short('y')
                                .action(ArgAction::SetTrue)
                                .help("Do not ask for confirmation"),
                        ),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Categories")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a category")
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(json_flags(Command::new("list").about("List categories")))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a category")
                        .arg(Arg::new("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Dashboards and analytics")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("dashboard")
                        .about("Balance, this month, recent transactions"),
                ))
                .subcommand(json_flags(
                    Command::new("analytics")
                        .about("Saving rate, top category, averages, breakdown"),
                ))
                .subcommand(json_flags(
                    Command::new("trend").about("Running balance over time"),
                )),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand_required(true)
                .subcommand(
                    Command::new("transactions")
                        .about("Write all transactions to a file")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(
                            Arg::new("out")
                                .long("out")
                                .default_value("transactions.csv"),
                        ),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn list_defaults_to_all_categories() {
        let m = build_cli().get_matches_from(["spendwise", "tx", "list"]);
        let (_, tx) = m.subcommand().unwrap();
        let (_, list) = tx.subcommand().unwrap();
        assert_eq!(list.get_one::<String>("category").unwrap(), "all");
        assert!(list.get_one::<usize>("limit").is_none());
    }
}
