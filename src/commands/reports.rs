// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, json_flags, window, Context};
use crate::reports::{daily_summary, income_ledger, sales_report, Rollup};
use crate::settings::Settings;
use crate::utils::{fmt_money, id_for_asset, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("sales", sub)) => sales(conn, ctx, sub),
        Some(("ledger", sub)) => ledger(conn, ctx, sub),
        Some(("daily", sub)) => daily(conn, ctx, sub),
        _ => Ok(()),
    }
}

fn rollup_rows(v: &[Rollup], ccy: &str) -> Vec<Vec<String>> {
    v.iter()
        .map(|r| vec![r.name.clone(), r.quantity.to_string(), fmt_money(&r.revenue, ccy)])
        .collect()
}

fn sales(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let settings = Settings::load(conn)?;
    let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
    let report = sales_report(conn, &actor, asset_id, window(sub)?, settings.vat_rate)?;
    let (json, jsonl) = json_flags(sub);
    if maybe_print_json(json, jsonl, &report)? {
        return Ok(());
    }
    let ccy = settings.currency.as_str();
    println!(
        "{}",
        pretty_table(
            &["Sales", "Total", "VATable", "VAT"],
            vec![vec![
                report.sale_count.to_string(),
                fmt_money(&report.total_sales, ccy),
                fmt_money(&report.vatable_sales, ccy),
                fmt_money(&report.vat_amount, ccy),
            ]],
        )
    );
    println!("{}", pretty_table(&["Category", "Qty", "Revenue"], rollup_rows(&report.by_category, ccy)));
    println!("{}", pretty_table(&["Item", "Qty", "Revenue"], rollup_rows(&report.by_item, ccy)));
    let lines = report
        .lines
        .iter()
        .map(|l| {
            vec![
                format!("#{}", l.sale_id),
                l.created_at.format("%Y-%m-%d %H:%M").to_string(),
                l.cashier.clone(),
                l.customer_name.clone(),
                l.item.clone(),
                l.quantity.to_string(),
                fmt_money(&l.price_at_sale, ccy),
                fmt_money(&l.line_total, ccy),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Sale", "When", "Cashier", "Customer", "Item", "Qty", "Price", "Line Total"],
            lines
        )
    );
    Ok(())
}

fn ledger(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let ccy = Settings::load(conn)?.currency;
    let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
    let report = income_ledger(conn, &actor, asset_id, window(sub)?)?;
    let (json, jsonl) = json_flags(sub);
    if !maybe_print_json(json, jsonl, &report)? {
        let rows = report
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.time.clone(),
                    r.description.clone(),
                    r.amount.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Date", "Time", "Description", "Amount"], rows));
        println!("Total sales: {}", fmt_money(&report.total, &ccy));
    }
    Ok(())
}

fn daily(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let ccy = Settings::load(conn)?.currency;
    let day = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => ctx.now.date(),
    };
    let summary = daily_summary(conn, &actor, day)?;
    let (json, jsonl) = json_flags(sub);
    if maybe_print_json(json, jsonl, &summary)? {
        return Ok(());
    }
    if summary.is_empty() {
        println!("No assets had sales on {}", day);
        return Ok(());
    }
    let rows = summary
        .iter()
        .map(|s| {
            vec![
                s.asset_name.clone(),
                s.transaction_count.to_string(),
                fmt_money(&s.total_sales, &ccy),
                if s.recipients.is_empty() {
                    "(none)".to_string()
                } else {
                    s.recipients.join(", ")
                },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Asset", "Transactions", "Total", "Recipients"], rows)
    );
    Ok(())
}
