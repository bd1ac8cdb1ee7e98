// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, window, Context};
use crate::access::Actor;
use crate::reports::{income_ledger, sales_report};
use crate::settings::Settings;
use crate::utils::id_for_asset;
use anyhow::{bail, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    match m.subcommand() {
        Some(("sales", sub)) => export_sales(conn, &actor, sub),
        Some(("ledger", sub)) => export_ledger(conn, &actor, sub),
        _ => Ok(()),
    }
}

fn format_of(sub: &clap::ArgMatches) -> Result<String> {
    let fmt = sub
        .get_one::<String>("format")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }
    Ok(fmt)
}

/// Sales line items; JSON carries the full report with totals and rollups.
pub fn export_sales(conn: &Connection, actor: &Actor, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = format_of(sub)?;
    let out = arg(sub, "out")?;
    let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
    let vat_rate = Settings::load(conn)?.vat_rate;
    let report = sales_report(conn, actor, asset_id, window(sub)?, vat_rate)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "sale_id", "date", "time", "cashier", "customer", "category", "item", "quantity",
                "price_at_sale", "line_total",
            ])?;
            for l in &report.lines {
                wtr.write_record([
                    l.sale_id.to_string(),
                    l.created_at.format("%Y-%m-%d").to_string(),
                    l.created_at.format("%H:%M").to_string(),
                    l.cashier.clone(),
                    l.customer_name.clone(),
                    l.category.clone(),
                    l.item.clone(),
                    l.quantity.to_string(),
                    l.price_at_sale.to_string(),
                    l.line_total.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        _ => std::fs::write(out, serde_json::to_string_pretty(&report)?)?,
    }
    println!("Exported {} sale lines to {}", report.lines.len(), out);
    Ok(())
}

/// Income ledger in the Date, Time, Description, Amount layout.
pub fn export_ledger(conn: &Connection, actor: &Actor, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = format_of(sub)?;
    let out = arg(sub, "out")?;
    let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
    let report = income_ledger(conn, actor, asset_id, window(sub)?)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["Date", "Time", "Description", "Amount"])?;
            for r in &report.rows {
                wtr.write_record([
                    r.date.as_str(),
                    r.time.as_str(),
                    r.description.as_str(),
                    r.amount.to_string().as_str(),
                ])?;
            }
            wtr.flush()?;
        }
        _ => std::fs::write(out, serde_json::to_string_pretty(&report.rows)?)?,
    }
    println!("Exported {} ledger rows to {}", report.rows.len(), out);
    Ok(())
}
