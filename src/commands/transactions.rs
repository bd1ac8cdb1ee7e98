// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, arg_i64, json_flags, Context};
use crate::ledger::{list_transactions, record_transaction, NewTransaction};
use crate::models::{Transaction, TransactionType};
use crate::utils::{maybe_print_json, parse_datetime, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, ctx, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let transaction_date = match sub.get_one::<String>("date") {
        Some(d) => parse_datetime(d)?,
        None => ctx.now,
    };
    let new = NewTransaction {
        deal_id: arg_i64(sub, "deal")?,
        transaction_type: arg(sub, "type")?.parse::<TransactionType>()?,
        amount: parse_decimal(arg(sub, "amount")?)?,
        description: arg(sub, "description")?.to_string(),
        transaction_date,
    };
    let tx = record_transaction(conn, &actor, &new)?;
    println!(
        "Recorded {} of {} on deal #{} at {}",
        tx.transaction_type,
        tx.amount,
        tx.deal_id,
        tx.transaction_date.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let limit = sub.get_one::<usize>("limit").copied();
    Ok(list_transactions(conn, arg_i64(sub, "deal")?, limit)?)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    let (json, jsonl) = json_flags(sub);
    if !maybe_print_json(json, jsonl, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.transaction_date.format("%Y-%m-%d %H:%M").to_string(),
                    t.transaction_type.to_string(),
                    t.amount.to_string(),
                    t.description.clone(),
                    t.sale_id.map(|s| format!("#{}", s)).unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["When", "Type", "Amount", "Description", "Sale"], rows)
        );
    }
    Ok(())
}
