// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, arg_i64, json_flags, Context};
use crate::catalog::{
    add_category, add_item, add_variant, delete_category, delete_item, delete_variant,
    list_categories, list_items, list_variants, rename_category, set_variant_price,
};
use crate::settings::Settings;
use crate::utils::{
    fmt_money, id_for_asset, id_for_category, maybe_print_json, parse_decimal, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle_category(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let actor = ctx.actor(conn)?;
            let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
            let cat = add_category(conn, &actor, asset_id, arg(sub, "name")?)?;
            println!("Added category '{}'", cat.name);
        }
        Some(("list", sub)) => {
            let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
            let cats = list_categories(conn, asset_id)?;
            let (json, jsonl) = json_flags(sub);
            if !maybe_print_json(json, jsonl, &cats)? {
                let rows = cats
                    .iter()
                    .map(|c| vec![c.id.to_string(), c.name.clone()])
                    .collect();
                println!("{}", pretty_table(&["ID", "Category"], rows));
            }
        }
        Some(("rename", sub)) => {
            let actor = ctx.actor(conn)?;
            let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
            let id = id_for_category(conn, asset_id, arg(sub, "name")?)?;
            let cat = rename_category(conn, &actor, id, arg(sub, "new-name")?)?;
            println!("Renamed category to '{}'", cat.name);
        }
        Some(("rm", sub)) => {
            let actor = ctx.actor(conn)?;
            let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
            let name = arg(sub, "name")?;
            delete_category(conn, &actor, id_for_category(conn, asset_id, name)?)?;
            println!("Deleted category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_item(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let actor = ctx.actor(conn)?;
            let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
            let cat = id_for_category(conn, asset_id, arg(sub, "category")?)?;
            let desc = sub.get_one::<String>("description").cloned().unwrap_or_default();
            let item = add_item(conn, &actor, cat, arg(sub, "name")?, &desc)?;
            println!("Added item #{} '{}'", item.id, item.name);
        }
        Some(("list", sub)) => {
            let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
            let items = list_items(conn, asset_id)?;
            let (json, jsonl) = json_flags(sub);
            if !maybe_print_json(json, jsonl, &items)? {
                let rows = items
                    .iter()
                    .map(|i| {
                        vec![
                            i.item.id.to_string(),
                            i.category_name.clone(),
                            i.item.name.clone(),
                            i.item.description.clone(),
                            i.variant_count.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Category", "Item", "Description", "Variants"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let actor = ctx.actor(conn)?;
            let id = arg_i64(sub, "item")?;
            delete_item(conn, &actor, id)?;
            println!("Deleted item #{}", id);
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_variant(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let actor = ctx.actor(conn)?;
            let price = parse_decimal(arg(sub, "price")?)?;
            let v = add_variant(conn, &actor, arg_i64(sub, "item")?, arg(sub, "name")?, price)?;
            println!("Added variant #{} '{}' at {}", v.variant.id, v.display_name(), v.variant.price);
        }
        Some(("list", sub)) => {
            let asset_id = id_for_asset(conn, arg(sub, "asset")?)?;
            let variants = list_variants(conn, asset_id)?;
            let (json, jsonl) = json_flags(sub);
            if !maybe_print_json(json, jsonl, &variants)? {
                let ccy = Settings::load(conn)?.currency;
                let rows = variants
                    .iter()
                    .map(|v| {
                        vec![
                            v.variant.id.to_string(),
                            v.category_name.clone(),
                            v.item_name.clone(),
                            v.variant.name.clone(),
                            fmt_money(&v.variant.price, &ccy),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Category", "Item", "Variant", "Price"], rows)
                );
            }
        }
        Some(("set-price", sub)) => {
            let actor = ctx.actor(conn)?;
            let price = parse_decimal(arg(sub, "price")?)?;
            let v = set_variant_price(conn, &actor, arg_i64(sub, "variant")?, price)?;
            println!("'{}' now costs {}", v.display_name(), v.variant.price);
        }
        Some(("rm", sub)) => {
            let actor = ctx.actor(conn)?;
            let id = arg_i64(sub, "variant")?;
            delete_variant(conn, &actor, id)?;
            println!("Deleted variant #{}", id);
        }
        _ => {}
    }
    Ok(())
}
