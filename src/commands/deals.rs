// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, arg_i64, json_flags, Context};
use crate::access::{is_authorized, Actor};
use crate::errors::CoreError;
use crate::ledger::{create_deal, delete_deal, get_deal, list_deals, update_deal, DealChanges, NewDeal};
use crate::models::Deal;
use crate::nav::{deal_snapshot, DealSnapshot};
use crate::settings::Settings;
use crate::utils::{fmt_money, id_for_asset, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, ctx, sub),
        Some(("list", sub)) => list(conn, ctx, sub),
        Some(("show", sub)) => show(conn, ctx, sub),
        Some(("update", sub)) => update(conn, ctx, sub),
        Some(("rm", sub)) => rm(conn, ctx, sub),
        _ => Ok(()),
    }
}

fn add(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let new = NewDeal {
        asset_id: id_for_asset(conn, arg(sub, "asset")?)?,
        title: arg(sub, "title")?.to_string(),
        target_raise_amount: parse_decimal(arg(sub, "target")?)?,
        total_shares_offered: arg_i64(sub, "shares")?,
        launch_date: parse_date(arg(sub, "launch")?)?,
        is_active: sub.get_flag("active"),
    };
    let deal = create_deal(conn, &actor, &new)?;
    println!(
        "Created deal #{} '{}' ({} shares at {} each)",
        deal.id,
        deal.title,
        deal.total_shares_offered,
        deal.price_per_share()
    );
    Ok(())
}

/// Deals the actor can see: all for owners, their asset's for staff.
pub fn visible_deals(conn: &Connection, actor: &Actor, include_inactive: bool) -> Result<Vec<Deal>> {
    Ok(list_deals(conn, include_inactive)?
        .into_iter()
        .filter(|d| is_authorized(actor.role, actor.assigned_asset_id, d.asset_id))
        .collect())
}

fn snapshot_rows(snaps: &[DealSnapshot], ccy: &str) -> Vec<Vec<String>> {
    snaps
        .iter()
        .map(|s| {
            vec![
                s.deal.id.to_string(),
                s.deal.title.clone(),
                s.deal.launch_date.to_string(),
                fmt_money(&s.price_per_share, ccy),
                fmt_money(&s.current_share_value, ccy),
                format!("{}/{}", s.shares_sold, s.deal.total_shares_offered),
                s.shares_available.to_string(),
                format!("{:.2}%", s.percentage_sold),
                if s.deal.is_active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect()
}

const SNAPSHOT_HEADERS: [&str; 9] = [
    "ID", "Title", "Launch", "Offer Price", "NAV/Share", "Sold", "Available", "% Sold", "Active",
];

fn list(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let settings = Settings::load(conn)?;
    let mut snaps = Vec::new();
    for d in visible_deals(conn, &actor, sub.get_flag("all"))? {
        snaps.push(deal_snapshot(conn, &d)?);
    }
    let (json, jsonl) = json_flags(sub);
    if !maybe_print_json(json, jsonl, &snaps)? {
        println!(
            "{}",
            pretty_table(&SNAPSHOT_HEADERS, snapshot_rows(&snaps, &settings.currency))
        );
    }
    Ok(())
}

fn show(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let deal = get_deal(conn, arg_i64(sub, "deal")?)?;
    if !is_authorized(actor.role, actor.assigned_asset_id, deal.asset_id) {
        return Err(CoreError::permission(format!(
            "{} is not assigned to this deal's asset",
            actor.username
        ))
        .into());
    }
    let settings = Settings::load(conn)?;
    let snap = deal_snapshot(conn, &deal)?;
    let (json, jsonl) = json_flags(sub);
    if !maybe_print_json(json, jsonl, &snap)? {
        let ccy = settings.currency.as_str();
        println!(
            "{}",
            pretty_table(&SNAPSHOT_HEADERS, snapshot_rows(std::slice::from_ref(&snap), ccy))
        );
        println!("Target raise: {}", fmt_money(&deal.target_raise_amount, ccy));
        match &snap.latest_valuation {
            Some(v) => println!(
                "Latest valuation: {} on {} ({})",
                fmt_money(&v.total_valuation, ccy),
                v.valuation_date,
                v.valuation_method
            ),
            None => println!("Latest valuation: none, NAV follows the offering price"),
        }
    }
    Ok(())
}

fn update(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let changes = DealChanges {
        title: sub.get_one::<String>("title").cloned(),
        target_raise_amount: sub
            .get_one::<String>("target")
            .map(|s| parse_decimal(s))
            .transpose()?,
        total_shares_offered: sub.get_one::<i64>("shares").copied(),
        launch_date: sub
            .get_one::<String>("launch")
            .map(|s| parse_date(s))
            .transpose()?,
        is_active: sub.get_one::<bool>("active").copied(),
    };
    let deal = update_deal(conn, &actor, arg_i64(sub, "deal")?, &changes)?;
    println!("Updated deal #{} '{}'", deal.id, deal.title);
    Ok(())
}

fn rm(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let id = arg_i64(sub, "deal")?;
    delete_deal(conn, &actor, id)?;
    println!("Deleted deal #{}", id);
    Ok(())
}
