// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Where carts live between commands.

use crate::cart::Cart;
use crate::errors::CoreResult;
use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

pub trait SessionStore {
    fn load_cart(&self, key: &str) -> CoreResult<Option<Cart>>;
    /// Storing an empty cart drops the session.
    fn store_cart(&self, key: &str, cart: &Cart) -> CoreResult<()>;
    fn clear_cart(&self, key: &str) -> CoreResult<()>;
}

/// Carts persisted as JSON in `pos_sessions`. Works on a plain connection or
/// inside an open transaction.
pub struct SqliteSessionStore<'c> {
    conn: &'c Connection,
    ttl: Duration,
    now: NaiveDateTime,
}

impl<'c> SqliteSessionStore<'c> {
    pub fn new(conn: &'c Connection, ttl_hours: i64, now: NaiveDateTime) -> Self {
        SqliteSessionStore {
            conn,
            ttl: Duration::hours(ttl_hours),
            now,
        }
    }

    fn expired(&self, updated_at: NaiveDateTime) -> bool {
        updated_at + self.ttl < self.now
    }
}

impl SessionStore for SqliteSessionStore<'_> {
    fn load_cart(&self, key: &str) -> CoreResult<Option<Cart>> {
        let row: Option<(String, NaiveDateTime)> = self
            .conn
            .query_row(
                "SELECT cart, updated_at FROM pos_sessions WHERE session_key=?1",
                params![key],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let Some((payload, updated_at)) = row else {
            return Ok(None);
        };
        if self.expired(updated_at) {
            debug!(session = key, %updated_at, "discarding expired cart");
            self.clear_cart(key)?;
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&payload)?))
    }

    fn store_cart(&self, key: &str, cart: &Cart) -> CoreResult<()> {
        let Some(deal_id) = cart.deal_id.filter(|_| !cart.is_empty()) else {
            return self.clear_cart(key);
        };
        let payload = serde_json::to_string(cart)?;
        self.conn.execute(
            "INSERT INTO pos_sessions(session_key, deal_id, cart, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_key) DO UPDATE SET
               deal_id=excluded.deal_id, cart=excluded.cart, updated_at=excluded.updated_at",
            params![key, deal_id, payload, self.now],
        )?;
        Ok(())
    }

    fn clear_cart(&self, key: &str) -> CoreResult<()> {
        self.conn
            .execute("DELETE FROM pos_sessions WHERE session_key=?1", params![key])?;
        Ok(())
    }
}

/// Sessions untouched for longer than the TTL, oldest first.
pub fn expired_sessions(
    conn: &Connection,
    ttl_hours: i64,
    now: NaiveDateTime,
) -> CoreResult<Vec<(String, NaiveDateTime)>> {
    let cutoff = now - Duration::hours(ttl_hours);
    let mut stmt = conn.prepare(
        "SELECT session_key, updated_at FROM pos_sessions WHERE updated_at < ?1 ORDER BY updated_at",
    )?;
    let rows = stmt.query_map(params![cutoff], |r| Ok((r.get(0)?, r.get(1)?)))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn purge_expired(conn: &Connection, ttl_hours: i64, now: NaiveDateTime) -> CoreResult<usize> {
    let cutoff = now - Duration::hours(ttl_hours);
    let n = conn.execute(
        "DELETE FROM pos_sessions WHERE updated_at < ?1",
        params![cutoff],
    )?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO assets(name, asset_type) VALUES ('Stall', 'BUSINESS');
             INSERT INTO deals(asset_id, title, target_raise_amount, total_shares_offered, launch_date, is_active)
             VALUES (1, 'Seed', '1000.00', 100, '2024-01-01', 1);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn store_load_and_expire() {
        let conn = setup();
        let mut cart = Cart::for_deal(1);
        cart.add(5, "Coffee", dec!(90));
        SqliteSessionStore::new(&conn, 12, at(8))
            .store_cart("cashier1", &cart)
            .unwrap();

        let fresh = SqliteSessionStore::new(&conn, 12, at(19));
        assert_eq!(fresh.load_cart("cashier1").unwrap(), Some(cart));
        assert_eq!(expired_sessions(&conn, 12, at(19)).unwrap().len(), 0);

        let late = SqliteSessionStore::new(&conn, 2, at(19));
        assert_eq!(late.load_cart("cashier1").unwrap(), None);
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM pos_sessions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn storing_empty_cart_drops_session() {
        let conn = setup();
        let store = SqliteSessionStore::new(&conn, 12, at(8));
        let mut cart = Cart::for_deal(1);
        cart.add(5, "Coffee", dec!(90));
        store.store_cart("k", &cart).unwrap();
        cart.clear();
        store.store_cart("k", &cart).unwrap();
        assert_eq!(store.load_cart("k").unwrap(), None);
    }

    #[test]
    fn purge_removes_only_stale_sessions() {
        let conn = setup();
        let mut cart = Cart::for_deal(1);
        cart.add(5, "Coffee", dec!(90));
        SqliteSessionStore::new(&conn, 12, at(1)).store_cart("old", &cart).unwrap();
        SqliteSessionStore::new(&conn, 12, at(10)).store_cart("new", &cart).unwrap();
        assert_eq!(purge_expired(&conn, 4, at(12)).unwrap(), 1);
        assert!(SqliteSessionStore::new(&conn, 4, at(12))
            .load_cart("new")
            .unwrap()
            .is_some());
    }
}
