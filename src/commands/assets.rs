// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, json_flags, Context};
use crate::directory::{create_asset, list_assets, NewAsset};
use crate::models::AssetType;
use crate::utils::{maybe_print_json, pretty_table};
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
    let new = NewAsset {
        name: arg(sub, "name")?.to_string(),
        asset_type: arg(sub, "type")?.parse::<AssetType>()?,
        location: sub.get_one::<String>("location").cloned().unwrap_or_default(),
        description: sub
            .get_one::<String>("description")
            .cloned()
            .unwrap_or_default(),
        tin_number: sub.get_one::<String>("tin").cloned(),
        phone_number: sub.get_one::<String>("phone").cloned(),
    };
    let asset = create_asset(conn, &actor, &new)?;
    println!("Added asset {} ({})", asset.name, asset.asset_type);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let assets = list_assets(conn)?;
    let (json, jsonl) = json_flags(sub);
    if !maybe_print_json(json, jsonl, &assets)? {
        let rows = assets
            .iter()
            .map(|a| {
                vec![
                    a.id.to_string(),
                    a.name.clone(),
                    a.asset_type.to_string(),
                    a.location.clone(),
                    a.tin_number.clone().unwrap_or_default(),
                    a.phone_number.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Type", "Location", "TIN", "Phone"], rows)
        );
    }
    Ok(())
}
