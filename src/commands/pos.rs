// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg_i64, json_flags, Context};
use crate::cart::Cart;
use crate::pos::{add_to_cart, checkout, clear_cart, remove_from_cart, view_cart};
use crate::session::SqliteSessionStore;
use crate::settings::Settings;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    let key = ctx.session_key()?;
    let settings = Settings::load(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let actor = ctx.actor(conn)?;
            let store = SqliteSessionStore::new(conn, settings.session_ttl_hours, ctx.now);
            let cart = add_to_cart(
                conn,
                &store,
                &key,
                &actor,
                arg_i64(sub, "deal")?,
                arg_i64(sub, "variant")?,
            )?;
            print_cart(&cart, &settings.currency)?;
        }
        Some(("remove", sub)) => {
            let actor = ctx.actor(conn)?;
            let store = SqliteSessionStore::new(conn, settings.session_ttl_hours, ctx.now);
            let cart = remove_from_cart(conn, &store, &key, &actor, arg_i64(sub, "variant")?)?;
            print_cart(&cart, &settings.currency)?;
        }
        Some(("cart", sub)) => {
            let store = SqliteSessionStore::new(conn, settings.session_ttl_hours, ctx.now);
            let cart = view_cart(&store, &key)?;
            let (json, jsonl) = json_flags(sub);
            if !maybe_print_json(json, jsonl, &cart)? {
                print_cart(&cart, &settings.currency)?;
            }
        }
        Some(("clear", _)) => {
            let actor = ctx.actor(conn)?;
            let store = SqliteSessionStore::new(conn, settings.session_ttl_hours, ctx.now);
            clear_cart(conn, &store, &key, &actor)?;
            println!("Cart cleared");
        }
        Some(("checkout", sub)) => {
            let actor = ctx.actor(conn)?;
            let customer = sub.get_one::<String>("customer").map(|s| s.as_str());
            let receipt = checkout(conn, &key, &actor, arg_i64(sub, "deal")?, customer, ctx.now)?;
            let (json, jsonl) = json_flags(sub);
            if !maybe_print_json(json, jsonl, &receipt)? {
                println!(
                    "Sale #{} for {} completed: {}",
                    receipt.sale_id,
                    receipt.customer_name,
                    fmt_money(&receipt.total_amount, &settings.currency)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn print_cart(cart: &Cart, ccy: &str) -> Result<()> {
    if cart.is_empty() {
        println!("Cart is empty");
        return Ok(());
    }
    let mut rows = Vec::new();
    for l in cart.lines() {
        rows.push(vec![
            l.variant_id.to_string(),
            l.display_name.clone(),
            l.quantity.to_string(),
            fmt_money(&l.unit_price, ccy),
            fmt_money(&l.line_total()?, ccy),
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Variant", "Item", "Qty", "Unit", "Line Total"], rows)
    );
    println!("Total: {}", fmt_money(&cart.total()?, ccy));
    Ok(())
}
