// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Who may do what, and on which asset.

use crate::errors::{CoreError, CoreResult, OptionalRow};
use crate::models::{Role, User};
use rusqlite::{params, Connection};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Ring up sales at an asset's point of sale.
    Pos,
    /// Maintain categories, items and variants.
    ManageCatalog,
    ViewReports,
    /// Register, update and (de)activate users.
    ManageUsers,
    /// Assets, deals, valuations, ledger entries and subscriptions.
    ManageDeals,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Pos => "point of sale",
            Capability::ManageCatalog => "catalog management",
            Capability::ViewReports => "reports",
            Capability::ManageUsers => "user management",
            Capability::ManageDeals => "deal management",
        };
        f.write_str(s)
    }
}

/// Asset scope check shared by every gated operation: owners reach every
/// asset, managers and cashiers only the one they are assigned to.
pub fn is_authorized(role: Role, assigned_asset: Option<i64>, target_asset: i64) -> bool {
    match role {
        Role::Owner => true,
        Role::Manager | Role::Cashier => assigned_asset == Some(target_asset),
        Role::Investor => false,
    }
}

pub fn role_grants(role: Role, cap: Capability) -> bool {
    match role {
        Role::Owner => true,
        Role::Manager => matches!(
            cap,
            Capability::Pos
                | Capability::ManageCatalog
                | Capability::ViewReports
                | Capability::ManageUsers
        ),
        Role::Cashier => cap == Capability::Pos,
        Role::Investor => false,
    }
}

/// The user a command runs on behalf of.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub assigned_asset_id: Option<i64>,
}

impl Actor {
    pub fn from_user(user: &User) -> Actor {
        Actor {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            assigned_asset_id: user.assigned_asset_id,
        }
    }

    /// Resolve an active user by name.
    pub fn load(conn: &Connection, username: &str) -> CoreResult<Actor> {
        let username = username.trim();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username=?1", User::COLUMNS),
                params![username],
                User::from_row,
            )
            .or_not_found(|| format!("User '{}'", username))?;
        if !user.is_active {
            return Err(CoreError::permission(format!(
                "user '{}' is deactivated",
                username
            )));
        }
        Ok(Actor::from_user(&user))
    }

    /// `target_asset` is `None` for operations that are not tied to one asset;
    /// those are open only to roles that are not asset-scoped.
    pub fn require(&self, cap: Capability, target_asset: Option<i64>) -> CoreResult<()> {
        if !role_grants(self.role, cap) {
            return Err(CoreError::permission(format!(
                "{} ({}) may not use {}",
                self.username, self.role, cap
            )));
        }
        let in_scope = match target_asset {
            Some(asset) => is_authorized(self.role, self.assigned_asset_id, asset),
            None => self.role == Role::Owner,
        };
        if !in_scope {
            return Err(CoreError::permission(format!(
                "{} is not assigned to this asset",
                self.username
            )));
        }
        Ok(())
    }
}
