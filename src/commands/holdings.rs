// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, arg_i64, json_flags, Context};
use crate::holdings::{list_holdings, subscribe};
use crate::settings::Settings;
use crate::utils::{fmt_money, id_for_user, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("subscribe", sub)) => {
            let actor = ctx.actor(conn)?;
            let investor = arg(sub, "investor")?;
            let investor_id = id_for_user(conn, investor)?;
            let h = subscribe(
                conn,
                &actor,
                investor_id,
                arg_i64(sub, "deal")?,
                arg_i64(sub, "shares")?,
                ctx.now.date(),
            )?;
            println!(
                "{} now holds {} shares of deal #{} (cost basis {})",
                investor.trim(),
                h.shares_held,
                h.deal_id,
                h.total_cost_basis
            );
        }
        Some(("list", sub)) => list(conn, ctx, sub)?,
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let investor_id = sub
        .get_one::<String>("investor")
        .map(|u| id_for_user(conn, u))
        .transpose()?;
    let views = list_holdings(conn, &actor, sub.get_one::<i64>("deal").copied(), investor_id)?;
    let (json, jsonl) = json_flags(sub);
    if !maybe_print_json(json, jsonl, &views)? {
        let ccy = Settings::load(conn)?.currency;
        let rows = views
            .iter()
            .map(|v| {
                vec![
                    v.deal_title.clone(),
                    v.investor.clone(),
                    v.holding.shares_held.to_string(),
                    fmt_money(&v.holding.total_cost_basis, &ccy),
                    fmt_money(&v.market_value, &ccy),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Deal", "Investor", "Shares", "Cost Basis", "Value"], rows)
        );
    }
    Ok(())
}
