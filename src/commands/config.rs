// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, json_flags, Context};
use crate::access::Capability;
use crate::settings::{get_setting, set_setting, Settings, KEYS};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{bail, Result};
use rusqlite::Connection;
use serde::Serialize;

#[derive(Serialize)]
struct Entry {
    key: &'static str,
    value: String,
}

pub fn handle(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(conn, sub),
        Some(("get", sub)) => get(conn, sub),
        Some(("set", sub)) => set(conn, ctx, sub),
        _ => Ok(()),
    }
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let entries: Vec<Entry> = Settings::load(conn)?
        .entries()
        .into_iter()
        .map(|(key, value)| Entry { key, value })
        .collect();
    let (json, jsonl) = json_flags(sub);
    if !maybe_print_json(json, jsonl, &entries)? {
        let rows = entries
            .iter()
            .map(|e| vec![e.key.to_string(), e.value.clone()])
            .collect();
        println!("{}", pretty_table(&["Key", "Value"], rows));
    }
    Ok(())
}

fn get(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let key = arg(sub, "key")?.trim();
    if !KEYS.contains(&key) {
        bail!("Unknown setting '{}'", key);
    }
    // unset keys report their default
    let value = match get_setting(conn, key)? {
        Some(v) => v,
        None => Settings::default()
            .entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .unwrap_or_default(),
    };
    println!("{}", value);
    Ok(())
}

fn set(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    actor.require(Capability::ManageDeals, None)?;
    let key = arg(sub, "key")?;
    let value = arg(sub, "value")?;
    set_setting(conn, key, value)?;
    println!("Set {} = {}", key.trim(), value.trim());
    Ok(())
}
