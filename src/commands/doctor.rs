// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::decimal_at;
use crate::session::{expired_sessions, purge_expired};
use crate::settings::Settings;
use crate::utils::{pretty_table, round_money};
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub issue: &'static str,
    pub detail: String,
}

fn finding(issue: &'static str, detail: String) -> Finding {
    Finding { issue, detail }
}

pub fn findings(conn: &Connection, now: NaiveDateTime) -> Result<Vec<Finding>> {
    let mut out = Vec::new();

    // 1) Holdings beyond the offering
    let mut stmt = conn.prepare(
        "SELECT d.id, d.title, d.total_shares_offered, SUM(h.shares_held)
         FROM deals d JOIN holdings h ON h.deal_id = d.id
         GROUP BY d.id HAVING SUM(h.shares_held) > d.total_shares_offered",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let (id, title, offered, sold): (i64, String, i64, i64) =
            (r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?);
        out.push(finding(
            "deal_oversold",
            format!("#{} {}: {} of {} shares", id, title, sold, offered),
        ));
    }

    // 2) Stored sale totals that no longer match their lines
    let mut stmt = conn.prepare(
        "SELECT s.id, s.total_amount,
                (SELECT COUNT(*) FROM transactions t WHERE t.sale_id = s.id)
         FROM sales s ORDER BY s.id",
    )?;
    let sales = stmt
        .query_map([], |r| Ok((r.get::<_, i64>(0)?, decimal_at(r, 1)?, r.get::<_, i64>(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut lines = conn.prepare("SELECT quantity, price_at_sale FROM sale_items WHERE sale_id=?1")?;
    for (sale_id, stored, linked) in sales {
        let mut sum = Decimal::ZERO;
        let rows = lines.query_map([sale_id], |r| Ok((r.get::<_, i64>(0)?, decimal_at(r, 1)?)))?;
        for row in rows {
            let (q, p) = row?;
            sum += p * Decimal::from(q);
        }
        if round_money(sum) != stored {
            out.push(finding(
                "sale_total_mismatch",
                format!("sale #{}: stored {} vs lines {}", sale_id, stored, round_money(sum)),
            ));
        }
        if linked != 1 {
            out.push(finding(
                "sale_ledger_link",
                format!("sale #{} has {} ledger entries", sale_id, linked),
            ));
        }
    }

    // 3) Active deals with nothing to price against
    let mut stmt =
        conn.prepare("SELECT id, title FROM deals WHERE is_active=1 AND total_shares_offered=0")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let (id, title): (i64, String) = (r.get(0)?, r.get(1)?);
        out.push(finding("deal_without_shares", format!("#{} {}", id, title)));
    }

    // 4) Staff without an asset
    let mut stmt = conn.prepare(
        "SELECT username, role FROM users
         WHERE role IN ('MANAGER','CASHIER') AND assigned_asset_id IS NULL",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let (u, role): (String, String) = (r.get(0)?, r.get(1)?);
        out.push(finding("staff_unassigned", format!("{} ({})", u, role)));
    }

    // 5) Abandoned carts
    let ttl = Settings::load(conn)?.session_ttl_hours;
    for (key, at) in expired_sessions(conn, ttl, now)? {
        out.push(finding(
            "expired_cart",
            format!("session '{}' idle since {}", key, at.format("%Y-%m-%d %H:%M")),
        ));
    }

    Ok(out)
}

pub fn handle(conn: &Connection, now: NaiveDateTime, purge_carts: bool) -> Result<()> {
    if purge_carts {
        let ttl = Settings::load(conn)?.session_ttl_hours;
        let n = purge_expired(conn, ttl, now)?;
        println!("Purged {} expired cart(s)", n);
    }
    let rows: Vec<Vec<String>> = findings(conn, now)?
        .into_iter()
        .map(|f| vec![f.issue.to_string(), f.detail])
        .collect();
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
