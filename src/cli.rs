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
            .help("Print JSON instead of a table"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn req(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).required(true).help(help)
}

fn opt(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).help(help)
}

fn deal_arg() -> Arg {
    Arg::new("deal")
        .long("deal")
        .required(true)
        .value_parser(value_parser!(i64))
        .help("Deal id")
}

fn window_args(cmd: Command) -> Command {
    cmd.arg(opt("from", "First day, YYYY-MM-DD"))
        .arg(opt("to", "Last day, YYYY-MM-DD"))
}

pub fn build_cli() -> Command {
    Command::new("dealdesk")
        .about("Deal ledger, NAV and point-of-sale administration")
        .version(clap::crate_version!())
        .arg(
            Arg::new("as")
                .long("as")
                .global(true)
                .help("Act as this user (or set DEALDESK_USER)"),
        )
        .arg(
            Arg::new("session")
                .long("session")
                .global(true)
                .help("Cart session key (or DEALDESK_SESSION; defaults to the acting user)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Log more (-v info, -vv debug)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("doctor")
                .about("Check stored data for inconsistencies")
                .arg(
                    Arg::new("purge-carts")
                        .long("purge-carts")
                        .action(ArgAction::SetTrue)
                        .help("Delete carts idle longer than session_ttl_hours"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Runtime settings")
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("get").arg(req("key", "Setting name")))
                .subcommand(
                    Command::new("set")
                        .arg(req("key", "Setting name"))
                        .arg(req("value", "New value")),
                ),
        )
        .subcommand(
            Command::new("user")
                .about("Accounts and roles")
                .subcommand(
                    Command::new("add")
                        .arg(req("username", "Login name"))
                        .arg(req("role", "OWNER, MANAGER, CASHIER or INVESTOR"))
                        .arg(opt("first-name", "Given name"))
                        .arg(opt("last-name", "Family name"))
                        .arg(opt("email", "E-mail address"))
                        .arg(opt("asset", "Assigned asset name")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("toggle").arg(req("username", "User to (de)activate")))
                .subcommand(
                    Command::new("update")
                        .arg(req("username", "User to change"))
                        .arg(opt("role", "New role"))
                        .arg(opt("asset", "New asset name, or 'none'"))
                        .arg(opt("email", "New e-mail, empty to clear"))
                        .arg(opt("first-name", "Given name"))
                        .arg(opt("last-name", "Family name")),
                ),
        )
        .subcommand(
            Command::new("asset")
                .about("Investment targets")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Unique asset name"))
                        .arg(req("type", "REAL_ESTATE, BUSINESS or OTHER"))
                        .arg(opt("location", "Where it is"))
                        .arg(opt("description", "Free text"))
                        .arg(opt("tin", "Tax id, 000-000-000[-000]"))
                        .arg(opt("phone", "Contact number")),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("deal")
                .about("Share offerings")
                .subcommand(
                    Command::new("add")
                        .arg(req("asset", "Asset name"))
                        .arg(req("title", "Deal title"))
                        .arg(req("target", "Target raise amount"))
                        .arg(
                            req("shares", "Total shares offered")
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(req("launch", "Launch date, YYYY-MM-DD"))
                        .arg(
                            Arg::new("active")
                                .long("active")
                                .action(ArgAction::SetTrue)
                                .help("Open the deal immediately"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")).arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Include inactive deals"),
                ))
                .subcommand(json_flags(Command::new("show").arg(deal_arg())))
                .subcommand(
                    Command::new("update")
                        .arg(deal_arg())
                        .arg(opt("title", "New title"))
                        .arg(opt("target", "New target raise amount"))
                        .arg(opt("shares", "New share count").value_parser(value_parser!(i64)))
                        .arg(opt("launch", "New launch date"))
                        .arg(
                            opt("active", "true or false")
                                .value_parser(value_parser!(bool)),
                        ),
                )
                .subcommand(Command::new("rm").arg(deal_arg())),
        )
        .subcommand(
            Command::new("valuation")
                .about("Point-in-time valuations")
                .subcommand(
                    Command::new("add")
                        .arg(deal_arg())
                        .arg(req("date", "Valuation date, YYYY-MM-DD"))
                        .arg(req("amount", "Total valuation"))
                        .arg(req("method", "How it was valued")),
                )
                .subcommand(json_flags(Command::new("list").arg(deal_arg()))),
        )
        .subcommand(
            Command::new("tx")
                .about("Deal cash-flow ledger")
                .subcommand(
                    Command::new("add")
                        .arg(deal_arg())
                        .arg(req("type", "INCOME, EXPENSE or DISTRIBUTION"))
                        .arg(req("amount", "Positive amount"))
                        .arg(req("description", "What it was"))
                        .arg(opt("date", "When, YYYY-MM-DD[ HH:MM]; defaults to now")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(deal_arg()).arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize))
                            .help("Newest N only"),
                    ),
                )),
        )
        .subcommand(
            Command::new("category")
                .about("POS categories")
                .subcommand(
                    Command::new("add")
                        .arg(req("asset", "Asset name"))
                        .arg(req("name", "Category name")),
                )
                .subcommand(json_flags(Command::new("list").arg(req("asset", "Asset name"))))
                .subcommand(
                    Command::new("rename")
                        .arg(req("asset", "Asset name"))
                        .arg(req("name", "Current name"))
                        .arg(req("new-name", "New name")),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(req("asset", "Asset name"))
                        .arg(req("name", "Category name")),
                ),
        )
        .subcommand(
            Command::new("item")
                .about("POS items")
                .subcommand(
                    Command::new("add")
                        .arg(req("asset", "Asset name"))
                        .arg(req("category", "Category name"))
                        .arg(req("name", "Item name"))
                        .arg(opt("description", "Free text")),
                )
                .subcommand(json_flags(Command::new("list").arg(req("asset", "Asset name"))))
                .subcommand(
                    Command::new("rm").arg(
                        req("item", "Item id").value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("variant")
                .about("Priced item variants")
                .subcommand(
                    Command::new("add")
                        .arg(req("item", "Item id").value_parser(value_parser!(i64)))
                        .arg(req("name", "Variant name"))
                        .arg(req("price", "Unit price")),
                )
                .subcommand(json_flags(Command::new("list").arg(req("asset", "Asset name"))))
                .subcommand(
                    Command::new("set-price")
                        .arg(req("variant", "Variant id").value_parser(value_parser!(i64)))
                        .arg(req("price", "New unit price")),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(req("variant", "Variant id").value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(
            Command::new("pos")
                .about("Point of sale")
                .subcommand(
                    Command::new("add")
                        .arg(deal_arg())
                        .arg(req("variant", "Variant id").value_parser(value_parser!(i64))),
                )
                .subcommand(
                    Command::new("remove")
                        .arg(req("variant", "Variant id").value_parser(value_parser!(i64))),
                )
                .subcommand(json_flags(Command::new("cart")))
                .subcommand(Command::new("clear"))
                .subcommand(json_flags(
                    Command::new("checkout")
                        .arg(deal_arg())
                        .arg(opt("customer", "Customer name; Walk-in when omitted")),
                )),
        )
        .subcommand(
            Command::new("holding")
                .about("Investor positions")
                .subcommand(
                    Command::new("subscribe")
                        .arg(deal_arg())
                        .arg(req("investor", "Investor username"))
                        .arg(req("shares", "Shares bought").value_parser(value_parser!(i64))),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(
                            Arg::new("deal")
                                .long("deal")
                                .value_parser(value_parser!(i64))
                                .help("Only this deal"),
                        )
                        .arg(opt("investor", "Only this investor")),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Sales and income reports")
                .subcommand(json_flags(window_args(
                    Command::new("sales").arg(req("asset", "Asset name")),
                )))
                .subcommand(json_flags(window_args(
                    Command::new("ledger").arg(req("asset", "Asset name")),
                )))
                .subcommand(json_flags(
                    Command::new("daily").arg(opt("date", "Day to report, defaults to today")),
                )),
        )
        .subcommand(
            Command::new("export")
                .about("Write reports to CSV or JSON files")
                .subcommand(export_cmd("sales"))
                .subcommand(export_cmd("ledger")),
        )
}

fn export_cmd(name: &'static str) -> Command {
    window_args(
        Command::new(name)
            .arg(req("asset", "Asset name"))
            .arg(
                Arg::new("format")
                    .long("format")
                    .default_value("csv")
                    .value_parser(["csv", "json"])
                    .help("csv or json"),
            )
            .arg(req("out", "Output file")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }
}
