// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print as JSON")
}

fn month_arg() -> Arg {
    Arg::new("month").long("month").help("Month as YYYY-MM")
}

fn type_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .value_parser(["income", "expense"])
        .help("income | expense")
}

pub fn build_cli() -> Command {
    Command::new("pocketledger")
        .about("Personal income/expense tracker with monthly summaries")
        .version(clap::crate_version!())
        .arg(
            Arg::new("data")
                .long("data")
                .global(true)
                .help("Path to the ledger JSON file"),
        )
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the ledger file if missing"))
        .subcommand(
            Command::new("tx")
                .about("Record and inspect transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(type_arg().required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("memo").long("memo")),
                )
                .subcommand(
                    Command::new("update")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("date").long("date"))
                        .arg(type_arg())
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("memo").long("memo")),
                )
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true)))
                .subcommand(
                    Command::new("list")
                        .arg(month_arg())
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("id").long("id"))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("icon").long("icon"))
                        .arg(type_arg().required(true)),
                )
                .subcommand(Command::new("list").arg(json_flag())),
        )
        .subcommand(
            Command::new("report")
                .about("Monthly summaries and category breakdowns")
                .subcommand(Command::new("month").arg(month_arg()).arg(json_flag()))
                .subcommand(Command::new("months").arg(json_flag()))
                .subcommand(
                    Command::new("breakdown")
                        .arg(type_arg().default_value("expense"))
                        .arg(month_arg())
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("month")
                                .help("Across every month"),
                        )
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import CSV or JSON")
                .subcommand(Command::new("csv").arg(Arg::new("path").long("path").required(true)))
                .subcommand(Command::new("json").arg(Arg::new("path").long("path").required(true))),
        )
        .subcommand(
            Command::new("export")
                .about("Export CSV or JSON")
                .subcommand(Command::new("json").arg(Arg::new("out").long("out").required(true)))
                .subcommand(
                    Command::new("csv")
                        .arg(Arg::new("out").long("out").required(true))
                        .arg(Arg::new("from").long("from").help("First day, YYYY-MM-DD"))
                        .arg(Arg::new("to").long("to").help("Last day, YYYY-MM-DD")),
                ),
        )
}
