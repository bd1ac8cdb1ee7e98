// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, json_flags, Context};
use crate::directory::{
    list_users, register_user, toggle_active, update_user, user_count, NewUser, UserChanges,
};
use crate::models::Role;
use crate::utils::{id_for_asset, id_for_user, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub fn handle(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, ctx, sub),
        Some(("list", sub)) => list(conn, ctx, sub),
        Some(("toggle", sub)) => toggle(conn, ctx, sub),
        Some(("update", sub)) => update(conn, ctx, sub),
        _ => Ok(()),
    }
}

fn add(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    // An empty directory is bootstrapped without an acting user.
    let actor = if user_count(conn)? == 0 {
        None
    } else {
        Some(ctx.actor(conn)?)
    };
    let assigned_asset_id = match sub.get_one::<String>("asset") {
        Some(name) => Some(id_for_asset(conn, name)?),
        None => None,
    };
    let new = NewUser {
        username: arg(sub, "username")?.to_string(),
        first_name: sub.get_one::<String>("first-name").cloned().unwrap_or_default(),
        last_name: sub.get_one::<String>("last-name").cloned().unwrap_or_default(),
        email: sub.get_one::<String>("email").cloned(),
        role: arg(sub, "role")?.parse::<Role>()?,
        assigned_asset_id,
    };
    let user = register_user(conn, actor.as_ref(), &new)?;
    println!("Registered {} as {}", user.username, user.role);
    Ok(())
}

fn asset_name(conn: &Connection, id: Option<i64>) -> Result<String> {
    let Some(id) = id else {
        return Ok(String::new());
    };
    let name: Option<String> = conn
        .query_row("SELECT name FROM assets WHERE id=?1", params![id], |r| r.get(0))
        .optional()?;
    Ok(name.unwrap_or_default())
}

fn list(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let users = list_users(conn, &actor)?;
    let (json, jsonl) = json_flags(sub);
    if !maybe_print_json(json, jsonl, &users)? {
        let mut rows = Vec::new();
        for u in &users {
            rows.push(vec![
                u.username.clone(),
                format!("{} {}", u.first_name, u.last_name).trim().to_string(),
                u.role.to_string(),
                asset_name(conn, u.assigned_asset_id)?,
                u.email.clone().unwrap_or_default(),
                if u.is_active { "yes" } else { "no" }.to_string(),
            ]);
        }
        println!(
            "{}",
            pretty_table(&["Username", "Name", "Role", "Asset", "Email", "Active"], rows)
        );
    }
    Ok(())
}

fn toggle(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let target = id_for_user(conn, arg(sub, "username")?)?;
    let user = toggle_active(conn, &actor, target)?;
    println!(
        "User '{}' has been {}.",
        user.username,
        if user.is_active { "activated" } else { "deactivated" }
    );
    Ok(())
}

fn update(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let actor = ctx.actor(conn)?;
    let target = id_for_user(conn, arg(sub, "username")?)?;
    let assigned_asset_id = match sub.get_one::<String>("asset").map(|s| s.trim()) {
        Some(n) if n.eq_ignore_ascii_case("none") => Some(None),
        Some(n) => Some(Some(id_for_asset(conn, n)?)),
        None => None,
    };
    let changes = UserChanges {
        role: sub
            .get_one::<String>("role")
            .map(|r| r.parse::<Role>())
            .transpose()?,
        assigned_asset_id,
        email: sub.get_one::<String>("email").cloned(),
        first_name: sub.get_one::<String>("first-name").cloned(),
        last_name: sub.get_one::<String>("last-name").cloned(),
    };
    let user = update_user(conn, &actor, target, &changes)?;
    println!("Updated {} ({})", user.username, user.role);
    Ok(())
}
