// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime configuration kept in the `settings` table.

use crate::errors::{CoreError, CoreResult};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

pub const CURRENCY: &str = "currency";
pub const VAT_RATE: &str = "vat_rate";
pub const SESSION_TTL_HOURS: &str = "session_ttl_hours";
pub const ALLOW_OVERSUBSCRIPTION: &str = "allow_oversubscription";
pub const NAV_COUNTS_DISTRIBUTIONS: &str = "nav_counts_distributions";

pub const KEYS: [&str; 5] = [
    CURRENCY,
    VAT_RATE,
    SESSION_TTL_HOURS,
    ALLOW_OVERSUBSCRIPTION,
    NAV_COUNTS_DISTRIBUTIONS,
];

#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub currency: String,
    /// VAT share already included in POS prices, e.g. 0.12.
    pub vat_rate: Decimal,
    pub session_ttl_hours: i64,
    pub allow_oversubscription: bool,
    /// Whether DISTRIBUTION entries reduce the NAV cash-flow sum.
    pub nav_counts_distributions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            currency: "PHP".to_string(),
            vat_rate: Decimal::new(12, 2),
            session_ttl_hours: 12,
            allow_oversubscription: true,
            nav_counts_distributions: false,
        }
    }
}

impl Settings {
    pub fn load(conn: &Connection) -> CoreResult<Settings> {
        let mut s = Settings::default();
        let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            s.apply(&key, &value)?;
        }
        Ok(s)
    }

    fn apply(&mut self, key: &str, value: &str) -> CoreResult<()> {
        let value = value.trim();
        match key {
            CURRENCY => {
                if value.is_empty() {
                    return Err(CoreError::validation("currency cannot be empty"));
                }
                self.currency = value.to_uppercase();
            }
            VAT_RATE => {
                let rate = value
                    .parse::<Decimal>()
                    .map_err(|_| CoreError::validation(format!("invalid vat_rate '{}'", value)))?;
                if rate.is_sign_negative() || rate >= Decimal::ONE {
                    return Err(CoreError::validation("vat_rate must be in [0, 1)"));
                }
                self.vat_rate = rate;
            }
            SESSION_TTL_HOURS => {
                let hours = value.parse::<i64>().map_err(|_| {
                    CoreError::validation(format!("invalid session_ttl_hours '{}'", value))
                })?;
                if hours <= 0 {
                    return Err(CoreError::validation("session_ttl_hours must be positive"));
                }
                self.session_ttl_hours = hours;
            }
            ALLOW_OVERSUBSCRIPTION => self.allow_oversubscription = parse_flag(key, value)?,
            NAV_COUNTS_DISTRIBUTIONS => self.nav_counts_distributions = parse_flag(key, value)?,
            // Unknown keys from older builds are ignored on load.
            _ => {}
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (CURRENCY, self.currency.clone()),
            (VAT_RATE, self.vat_rate.to_string()),
            (SESSION_TTL_HOURS, self.session_ttl_hours.to_string()),
            (ALLOW_OVERSUBSCRIPTION, self.allow_oversubscription.to_string()),
            (NAV_COUNTS_DISTRIBUTIONS, self.nav_counts_distributions.to_string()),
        ]
    }
}

fn parse_flag(key: &str, value: &str) -> CoreResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CoreError::validation(format!(
            "invalid boolean '{}' for {}",
            value, key
        ))),
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> CoreResult<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

/// Validate and persist one setting.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> CoreResult<()> {
    let key = key.trim();
    if !KEYS.contains(&key) {
        return Err(CoreError::validation(format!(
            "unknown setting '{}' (expected one of {})",
            key,
            KEYS.join(", ")
        )));
    }
    let mut candidate = Settings::default();
    candidate.apply(key, value)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    #[test]
    fn defaults_without_rows() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let s = Settings::load(&conn).unwrap();
        assert_eq!(s.currency, "PHP");
        assert_eq!(s.vat_rate, Decimal::new(12, 2));
        assert!(s.allow_oversubscription);
        assert!(!s.nav_counts_distributions);
    }

    #[test]
    fn set_validates_and_overrides() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        set_setting(&conn, "allow_oversubscription", "no").unwrap();
        set_setting(&conn, "vat_rate", "0.10").unwrap();
        assert!(set_setting(&conn, "vat_rate", "1.5").is_err());
        assert!(set_setting(&conn, "colour", "red").is_err());

        let s = Settings::load(&conn).unwrap();
        assert!(!s.allow_oversubscription);
        assert_eq!(s.vat_rate.to_string(), "0.10");
        assert_eq!(get_setting(&conn, "vat_rate").unwrap().as_deref(), Some("0.10"));
    }
}
