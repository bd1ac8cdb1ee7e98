// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Users and assets.

use crate::access::{Actor, Capability};
use crate::db::is_constraint;
use crate::errors::{CoreError, CoreResult, OptionalRow};
use crate::models::{Asset, AssetType, Role, User};
use crate::utils::is_valid_tin;
use rusqlite::{params, Connection};
use tracing::info;

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub asset_type: AssetType,
    pub location: String,
    pub description: String,
    pub tin_number: Option<String>,
    pub phone_number: Option<String>,
}

pub fn create_asset(conn: &Connection, actor: &Actor, new: &NewAsset) -> CoreResult<Asset> {
    actor.require(Capability::ManageDeals, None)?;
    let name = new.name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("asset name cannot be empty"));
    }
    let tin = new
        .tin_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(t) = tin {
        if !is_valid_tin(t) {
            return Err(CoreError::validation(format!(
                "TIN '{}' must look like 000-000-000 or 000-000-000-000",
                t
            )));
        }
    }
    let phone = new
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    match conn.execute(
        "INSERT INTO assets(name, asset_type, location, description, tin_number, phone_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            name,
            new.asset_type.as_str(),
            new.location.trim(),
            new.description.trim(),
            tin,
            phone
        ],
    ) {
        Ok(_) => {}
        Err(e) if is_constraint(&e) => {
            return Err(CoreError::validation(format!("asset '{}' already exists", name)));
        }
        Err(e) => return Err(e.into()),
    }
    info!(asset = name, "asset created");
    get_asset(conn, conn.last_insert_rowid())
}

pub fn get_asset(conn: &Connection, asset_id: i64) -> CoreResult<Asset> {
    conn.query_row(
        &format!("SELECT {} FROM assets WHERE id=?1", Asset::COLUMNS),
        params![asset_id],
        Asset::from_row,
    )
    .or_not_found(|| format!("Asset #{}", asset_id))
}

pub fn list_assets(conn: &Connection) -> CoreResult<Vec<Asset>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM assets ORDER BY name", Asset::COLUMNS))?;
    let rows = stmt.query_map([], Asset::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub assigned_asset_id: Option<i64>,
}

pub fn get_user(conn: &Connection, user_id: i64) -> CoreResult<User> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id=?1", User::COLUMNS),
        params![user_id],
        User::from_row,
    )
    .or_not_found(|| format!("User #{}", user_id))
}

pub fn user_count(conn: &Connection) -> CoreResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
}

fn needs_asset(role: Role) -> bool {
    matches!(role, Role::Manager | Role::Cashier)
}

/// Register a user.
///
/// With no acting user only the very first account can be created, and it
/// must be an owner. Owners register any role; managers register cashiers
/// for their own asset.
pub fn register_user(conn: &Connection, actor: Option<&Actor>, new: &NewUser) -> CoreResult<User> {
    let mut assigned = new.assigned_asset_id;
    match actor {
        None => {
            if user_count(conn)? > 0 {
                return Err(CoreError::permission("an acting user (--as) is required"));
            }
            if new.role != Role::Owner {
                return Err(CoreError::validation("the first user must be an OWNER"));
            }
        }
        Some(a) => {
            a.require(Capability::ManageUsers, a.assigned_asset_id.or(assigned))?;
            if a.role == Role::Manager {
                if new.role != Role::Cashier {
                    return Err(CoreError::permission("managers may only register cashiers"));
                }
                if assigned.is_some() && assigned != a.assigned_asset_id {
                    return Err(CoreError::permission(
                        "managers may only register cashiers for their own asset",
                    ));
                }
                assigned = a.assigned_asset_id;
            }
        }
    }

    let username = new.username.trim();
    if username.is_empty() {
        return Err(CoreError::validation("username cannot be empty"));
    }
    if needs_asset(new.role) && assigned.is_none() {
        return Err(CoreError::validation(format!(
            "a {} must be assigned to an asset",
            new.role
        )));
    }
    if let Some(asset_id) = assigned {
        get_asset(conn, asset_id)?;
    }
    let email = new
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    match conn.execute(
        "INSERT INTO users(username, first_name, last_name, email, role, assigned_asset_id, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
        params![
            username,
            new.first_name.trim(),
            new.last_name.trim(),
            email,
            new.role.as_str(),
            assigned
        ],
    ) {
        Ok(_) => {}
        Err(e) if is_constraint(&e) => {
            return Err(CoreError::validation(format!(
                "username '{}' is already taken",
                username
            )));
        }
        Err(e) => return Err(e.into()),
    }
    info!(username, role = new.role.as_str(), "user registered");
    get_user(conn, conn.last_insert_rowid())
}

/// Owners see every user; managers see the staff of their asset.
pub fn list_users(conn: &Connection, actor: &Actor) -> CoreResult<Vec<User>> {
    let scope = match actor.role {
        Role::Owner => None,
        Role::Manager => {
            actor.require(Capability::ManageUsers, actor.assigned_asset_id)?;
            actor.assigned_asset_id
        }
        _ => return Err(CoreError::permission("only owners and managers may list users")),
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE (?1 IS NULL OR assigned_asset_id = ?1) ORDER BY username",
        User::COLUMNS
    ))?;
    let rows = stmt.query_map(params![scope], User::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn may_manage(actor: &Actor, target: &User) -> CoreResult<()> {
    if actor.user_id == target.id {
        return Err(CoreError::permission("users cannot change their own account"));
    }
    match actor.role {
        Role::Owner => Ok(()),
        Role::Manager
            if target.role == Role::Cashier
                && target.assigned_asset_id.is_some()
                && target.assigned_asset_id == actor.assigned_asset_id =>
        {
            Ok(())
        }
        _ => Err(CoreError::permission(format!(
            "{} may not manage '{}'",
            actor.username, target.username
        ))),
    }
}

/// Flip a user's active flag; returns the new state.
pub fn toggle_active(conn: &Connection, actor: &Actor, user_id: i64) -> CoreResult<User> {
    let target = get_user(conn, user_id)?;
    may_manage(actor, &target)?;
    conn.execute(
        "UPDATE users SET is_active = NOT is_active WHERE id=?1",
        params![user_id],
    )?;
    let user = get_user(conn, user_id)?;
    info!(username = %user.username, active = user.is_active, "user toggled");
    Ok(user)
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub role: Option<Role>,
    /// `Some(None)` unassigns.
    pub assigned_asset_id: Option<Option<i64>>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub fn update_user(
    conn: &Connection,
    actor: &Actor,
    user_id: i64,
    changes: &UserChanges,
) -> CoreResult<User> {
    let mut user = get_user(conn, user_id)?;
    may_manage(actor, &user)?;
    if actor.role != Role::Owner && (changes.role.is_some() || changes.assigned_asset_id.is_some())
    {
        return Err(CoreError::permission(
            "only owners may change roles or asset assignments",
        ));
    }
    if let Some(role) = changes.role {
        user.role = role;
    }
    if let Some(asset) = changes.assigned_asset_id {
        if let Some(id) = asset {
            get_asset(conn, id)?;
        }
        user.assigned_asset_id = asset;
    }
    if let Some(email) = &changes.email {
        let e = email.trim();
        user.email = (!e.is_empty()).then(|| e.to_string());
    }
    if let Some(v) = &changes.first_name {
        user.first_name = v.trim().to_string();
    }
    if let Some(v) = &changes.last_name {
        user.last_name = v.trim().to_string();
    }
    if needs_asset(user.role) && user.assigned_asset_id.is_none() {
        return Err(CoreError::validation(format!(
            "a {} must be assigned to an asset",
            user.role
        )));
    }
    conn.execute(
        "UPDATE users SET role=?1, assigned_asset_id=?2, email=?3, first_name=?4, last_name=?5
         WHERE id=?6",
        params![
            user.role.as_str(),
            user.assigned_asset_id,
            user.email,
            user.first_name,
            user.last_name,
            user.id
        ],
    )?;
    Ok(user)
}
