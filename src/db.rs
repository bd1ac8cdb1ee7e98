// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{CoreError, CoreResult};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, Row};
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Dealdesk", "dealdesk"));

/// Environment variable that points the CLI at a specific database file.
pub const DB_ENV: &str = "DEALDESK_DB";

const BUSY_TIMEOUT: Duration = Duration::from_millis(2_000);

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p.trim()));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("dealdesk.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS assets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        asset_type TEXT NOT NULL CHECK(asset_type IN ('REAL_ESTATE','BUSINESS','OTHER')),
        location TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        tin_number TEXT,
        phone_number TEXT
    );

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        email TEXT,
        role TEXT NOT NULL CHECK(role IN ('OWNER','MANAGER','CASHIER','INVESTOR')),
        assigned_asset_id INTEGER,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(assigned_asset_id) REFERENCES assets(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS deals(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        asset_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        target_raise_amount TEXT NOT NULL,
        total_shares_offered INTEGER NOT NULL CHECK(total_shares_offered >= 0),
        launch_date TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(asset_id) REFERENCES assets(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS valuations(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deal_id INTEGER NOT NULL,
        valuation_date TEXT NOT NULL,
        total_valuation TEXT NOT NULL,
        valuation_method TEXT NOT NULL,
        UNIQUE(deal_id, valuation_date),
        FOREIGN KEY(deal_id) REFERENCES deals(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        asset_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(asset_id, name),
        FOREIGN KEY(asset_id) REFERENCES assets(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS items(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE RESTRICT
    );

    CREATE TABLE IF NOT EXISTS variants(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        item_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        price TEXT NOT NULL,
        FOREIGN KEY(item_id) REFERENCES items(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS sales(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deal_id INTEGER NOT NULL,
        cashier_id INTEGER NOT NULL,
        customer_name TEXT,
        total_amount TEXT NOT NULL DEFAULT '0.00',
        created_at TEXT NOT NULL,
        FOREIGN KEY(deal_id) REFERENCES deals(id) ON DELETE CASCADE,
        FOREIGN KEY(cashier_id) REFERENCES users(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_sales_created ON sales(created_at);

    CREATE TABLE IF NOT EXISTS sale_items(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sale_id INTEGER NOT NULL,
        variant_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL CHECK(quantity > 0),
        price_at_sale TEXT NOT NULL,
        FOREIGN KEY(sale_id) REFERENCES sales(id) ON DELETE CASCADE,
        FOREIGN KEY(variant_id) REFERENCES variants(id) ON DELETE RESTRICT
    );

    -- sale_id is set only for POS-generated income; UNIQUE keeps it one per sale
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deal_id INTEGER NOT NULL,
        transaction_date TEXT NOT NULL,
        transaction_type TEXT NOT NULL CHECK(transaction_type IN ('INCOME','EXPENSE','DISTRIBUTION')),
        amount TEXT NOT NULL,
        description TEXT NOT NULL,
        sale_id INTEGER UNIQUE,
        FOREIGN KEY(deal_id) REFERENCES deals(id) ON DELETE CASCADE,
        FOREIGN KEY(sale_id) REFERENCES sales(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_deal_date ON transactions(deal_id, transaction_date);

    CREATE TABLE IF NOT EXISTS holdings(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        investor_id INTEGER NOT NULL,
        deal_id INTEGER NOT NULL,
        shares_held INTEGER NOT NULL CHECK(shares_held >= 0),
        total_cost_basis TEXT NOT NULL,
        UNIQUE(investor_id, deal_id),
        FOREIGN KEY(investor_id) REFERENCES users(id) ON DELETE RESTRICT,
        FOREIGN KEY(deal_id) REFERENCES deals(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS pos_sessions(
        session_key TEXT PRIMARY KEY,
        deal_id INTEGER NOT NULL,
        cart TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(deal_id) REFERENCES deals(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}

/// Read a decimal stored as TEXT, surfacing malformed values as a conversion error.
pub fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str_exact(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a TEXT column through the type's `FromStr` implementation.
pub fn parsed_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Unique, check and foreign-key failures all report as constraint violations.
pub fn is_constraint(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn is_busy(err: &CoreError) -> bool {
    match err {
        CoreError::Database(rusqlite::Error::SqliteFailure(e, _)) => {
            matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        }
        _ => false,
    }
}

/// Run `op` again when SQLite reports the database busy or locked.
///
/// Every attempt must be a complete transaction on its own; a failed attempt
/// has already rolled back when it returns.
pub fn retry_on_busy<T>(attempts: u32, mut op: impl FnMut() -> CoreResult<T>) -> CoreResult<T> {
    let mut tries = 0;
    loop {
        match op() {
            Err(err) if is_busy(&err) => {
                tries += 1;
                if tries >= attempts {
                    return Err(CoreError::Conflict(format!(
                        "database still busy after {} attempts",
                        tries
                    )));
                }
                warn!(attempt = tries, "database busy, retrying");
                std::thread::sleep(Duration::from_millis(25 * u64::from(tries)));
            }
            other => return other,
        }
    }
}
