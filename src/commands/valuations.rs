// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, arg_i64, json_flags, Context};
use crate::ledger::{add_valuation, list_valuations};
use crate::settings::Settings;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, ctx, sub),
        Some(("list", sub)) => list(conn, sub),
        _ => Ok(()),
    }
}

fn add(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let v = add_valuation(
        conn,
        &actor,
        arg_i64(sub, "deal")?,
        parse_date(arg(sub, "date")?)?,
        parse_decimal(arg(sub, "amount")?)?,
        arg(sub, "method")?,
    )?;
    println!(
        "Recorded valuation of {} for deal #{} on {}",
        v.total_valuation, v.deal_id, v.valuation_date
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let vals = list_valuations(conn, arg_i64(sub, "deal")?)?;
    let (json, jsonl) = json_flags(sub);
    if !maybe_print_json(json, jsonl, &vals)? {
        let ccy = Settings::load(conn)?.currency;
        let rows = vals
            .iter()
            .map(|v| {
                vec![
                    v.valuation_date.to_string(),
                    fmt_money(&v.total_valuation, &ccy),
                    v.valuation_method.clone(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Date", "Valuation", "Method"], rows));
    }
    Ok(())
}
