// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

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
            .help("Print one JSON object per line"),
    )
}

fn global_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("store")
            .long("store")
            .env("PENNYWISE_STORE")
            .global(true)
            .help("Store descriptor as JSON, e.g. {\"path\":\"ledger.sqlite\"}; unset runs on fixture data"),
    )
    .arg(
        Arg::new("user")
            .long("user")
            .env("PENNYWISE_USER")
            .global(true)
            .help("Signed-in user id"),
    )
    .arg(
        Arg::new("email")
            .long("email")
            .env("PENNYWISE_EMAIL")
            .global(true)
            .help("Signed-in user email"),
    )
    .arg(
        Arg::new("api-key")
            .long("api-key")
            .env("PENNYWISE_API_KEY")
            .hide_env_values(true)
            .global(true)
            .help("API key for the advice service"),
    )
    .arg(
        Arg::new("ai-endpoint")
            .long("ai-endpoint")
            .env("PENNYWISE_AI_ENDPOINT")
            .global(true)
            .help("Base URL of the text-generation API"),
    )
    .arg(
        Arg::new("ai-model")
            .long("ai-model")
            .env("PENNYWISE_AI_MODEL")
            .global(true)
            .help("Model used for advice"),
    )
    .arg(
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::Count)
            .global(true)
            .help("More log output on stderr (-v, -vv)"),
    )
}

pub fn build_cli() -> Command {
    let cmd = Command::new("pennywise")
        .about("Personal finance tracker: accounts, transactions, dashboards, AI advice")
        .version(clap::crate_version!());
    global_args(cmd)
        .subcommand(
            json_flags(
                Command::new("dashboard")
                    .about("Total balance, this month's income/expense, recent activity")
                    .arg(Arg::new("month").long("month").help("YYYY-MM (default: current month)"))
                    .arg(
                        Arg::new("recent")
                            .long("recent")
                            .value_parser(value_parser!(usize))
                            .default_value("5"),
                    )
                    .arg(
                        Arg::new("advice")
                            .long("advice")
                            .action(ArgAction::SetTrue)
                            .help("Also ask the AI for advice"),
                    ),
            ),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("balance")
                                .long("balance")
                                .default_value("0")
                                .allow_negative_numbers(true),
                        )
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("checking")
                                .help("checking|savings|credit|cash|investment"),
                        )
                        .arg(Arg::new("color").long("color")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("update")
                        .arg(Arg::new("account").long("account").required(true).help("Id or name"))
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("balance").long("balance").allow_negative_numbers(true))
                        .arg(Arg::new("type").long("type"))
                        .arg(Arg::new("color").long("color")),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("account").long("account").required(true).help("Id or name")),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Show the built-in categories")
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("account").long("account").required(true).help("Id or name"))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("expense")
                                .help("income|expense"),
                        )
                        .arg(Arg::new("category").long("category").required(true).help("Id or name"))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD (default: today)"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("search").long("search").help("Filter by note text"))
                        .arg(Arg::new("account").long("account").help("Id or name"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Charts data")
                .subcommand(json_flags(
                    Command::new("by-category")
                        .about("Expense totals per category")
                        .arg(Arg::new("month").long("month").help("YYYY-MM (default: all time)")),
                ))
                .subcommand(json_flags(
                    Command::new("trend")
                        .about("Income and expense for each month of a year")
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .value_parser(value_parser!(i32))
                                .help("Default: current year"),
                        ),
                )),
        )
        .subcommand(Command::new("advice").about("Ask the AI for three suggestions"))
        .subcommand(
            Command::new("watch")
                .about("Re-render the dashboard whenever the data changes")
                .arg(
                    Arg::new("interval-ms")
                        .long("interval-ms")
                        .value_parser(value_parser!(u64))
                        .default_value("1000")
                        .help("How often to look for writes from other processes"),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .value_parser(value_parser!(usize))
                        .help("Exit after this many updates"),
                ),
        )
        .subcommand(Command::new("doctor").about("Check data quality"))
}
