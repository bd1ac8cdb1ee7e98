// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod assets;
pub mod catalog;
pub mod config;
pub mod deals;
pub mod doctor;
pub mod exporter;
pub mod holdings;
pub mod pos;
pub mod reports;
pub mod transactions;
pub mod users;
pub mod valuations;

use crate::access::Actor;
use crate::reports::DateWindow;
use crate::utils::parse_date;
use anyhow::{bail, Context as _, Result};
use chrono::{Local, NaiveDateTime};
use clap::ArgMatches;
use rusqlite::Connection;

pub const USER_ENV: &str = "DEALDESK_USER";
pub const SESSION_ENV: &str = "DEALDESK_SESSION";

/// Who is acting and which cart they are working on.
#[derive(Debug, Clone)]
pub struct Context {
    pub actor_name: Option<String>,
    pub session: Option<String>,
    pub now: NaiveDateTime,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Context {
    /// Flags win over the environment.
    pub fn from_matches(m: &ArgMatches) -> Self {
        Context {
            actor_name: non_blank(m.get_one::<String>("as").cloned())
                .or_else(|| non_blank(std::env::var(USER_ENV).ok())),
            session: non_blank(m.get_one::<String>("session").cloned())
                .or_else(|| non_blank(std::env::var(SESSION_ENV).ok())),
            now: Local::now().naive_local(),
        }
    }

    pub fn acting(username: &str) -> Self {
        Context {
            actor_name: Some(username.to_string()),
            session: None,
            now: Local::now().naive_local(),
        }
    }

    pub fn actor(&self, conn: &Connection) -> Result<Actor> {
        let Some(name) = &self.actor_name else {
            bail!("No acting user: pass --as <username> or set {}", USER_ENV);
        };
        Ok(Actor::load(conn, name)?)
    }

    pub fn actor_opt(&self, conn: &Connection) -> Result<Option<Actor>> {
        match &self.actor_name {
            Some(_) => Ok(Some(self.actor(conn)?)),
            None => Ok(None),
        }
    }

    /// Explicit session key, else the acting username.
    pub fn session_key(&self) -> Result<String> {
        self.session
            .clone()
            .or_else(|| self.actor_name.clone())
            .with_context(|| format!("No cart session: pass --session or set {}", SESSION_ENV))
    }
}

pub(crate) fn arg<'a>(m: &'a ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(|s| s.as_str())
        .with_context(|| format!("--{} is required", id))
}

pub(crate) fn arg_i64(m: &ArgMatches, id: &str) -> Result<i64> {
    m.get_one::<i64>(id)
        .copied()
        .with_context(|| format!("--{} is required", id))
}

pub(crate) fn window(m: &ArgMatches) -> Result<DateWindow> {
    let from = m.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = m.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            bail!("--from {} is after --to {}", f, t);
        }
    }
    Ok(DateWindow { from, to })
}

pub(crate) fn json_flags(m: &ArgMatches) -> (bool, bool) {
    (m.get_flag("json"), m.get_flag("jsonl"))
}
