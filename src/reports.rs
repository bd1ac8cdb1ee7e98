// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only aggregates over sales and the income ledger.

use crate::access::{Actor, Capability};
use crate::db::decimal_at;
use crate::errors::CoreResult;
use crate::utils::{round_money, start_of_day};
use chrono::{Days, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Inclusive date window; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn day(d: NaiveDate) -> Self {
        DateWindow {
            from: Some(d),
            to: Some(d),
        }
    }

    fn lower(&self) -> Option<NaiveDateTime> {
        self.from.map(start_of_day)
    }

    /// Exclusive upper bound: midnight after `to`.
    fn upper(&self) -> Option<NaiveDateTime> {
        self.to
            .map(|d| start_of_day(d.checked_add_days(Days::new(1)).unwrap_or(d)))
    }
}

/// Split a VAT-inclusive total into its net and tax parts.
pub fn vat_split(total: Decimal, vat_rate: Decimal) -> (Decimal, Decimal) {
    let vatable = round_money(total / (Decimal::ONE + vat_rate));
    (vatable, round_money(total - vatable))
}

#[derive(Debug, Clone, Serialize)]
pub struct Rollup {
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleLine {
    pub sale_id: i64,
    pub created_at: NaiveDateTime,
    pub cashier: String,
    pub customer_name: String,
    pub category: String,
    pub item: String,
    pub quantity: i64,
    pub price_at_sale: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub asset_id: i64,
    pub window: DateWindow,
    pub sale_count: i64,
    pub total_sales: Decimal,
    pub vatable_sales: Decimal,
    pub vat_amount: Decimal,
    pub by_category: Vec<Rollup>,
    pub by_item: Vec<Rollup>,
    pub lines: Vec<SaleLine>,
}

fn rollup(map: BTreeMap<String, (i64, Decimal)>) -> Vec<Rollup> {
    let mut v: Vec<Rollup> = map
        .into_iter()
        .map(|(name, (quantity, revenue))| Rollup {
            name,
            quantity,
            revenue: round_money(revenue),
        })
        .collect();
    v.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    v
}

pub fn sales_report(
    conn: &Connection,
    actor: &Actor,
    asset_id: i64,
    window: DateWindow,
    vat_rate: Decimal,
) -> CoreResult<SalesReport> {
    actor.require(Capability::ViewReports, Some(asset_id))?;

    let (sale_count, total_sales) = {
        let mut stmt = conn.prepare(
            "SELECT s.total_amount FROM sales s JOIN deals d ON d.id = s.deal_id
             WHERE d.asset_id=?1
               AND (?2 IS NULL OR s.created_at >= ?2)
               AND (?3 IS NULL OR s.created_at < ?3)",
        )?;
        let rows = stmt.query_map(params![asset_id, window.lower(), window.upper()], |r| {
            decimal_at(r, 0)
        })?;
        let mut n = 0;
        let mut total = Decimal::ZERO;
        for t in rows {
            total += t?;
            n += 1;
        }
        (n, round_money(total))
    };

    let mut stmt = conn.prepare(
        "SELECT s.id, s.created_at, u.username, COALESCE(s.customer_name, ''),
                c.name, i.name || ' - ' || v.name, si.quantity, si.price_at_sale
         FROM sale_items si
         JOIN sales s ON s.id = si.sale_id
         JOIN deals d ON d.id = s.deal_id
         JOIN users u ON u.id = s.cashier_id
         JOIN variants v ON v.id = si.variant_id
         JOIN items i ON i.id = v.item_id
         JOIN categories c ON c.id = i.category_id
         WHERE d.asset_id=?1
           AND (?2 IS NULL OR s.created_at >= ?2)
           AND (?3 IS NULL OR s.created_at < ?3)
         ORDER BY s.created_at DESC, s.id DESC, si.id",
    )?;
    let rows = stmt.query_map(params![asset_id, window.lower(), window.upper()], |r| {
        let quantity: i64 = r.get(6)?;
        let price = decimal_at(r, 7)?;
        Ok(SaleLine {
            sale_id: r.get(0)?,
            created_at: r.get(1)?,
            cashier: r.get(2)?,
            customer_name: r.get(3)?,
            category: r.get(4)?,
            item: r.get(5)?,
            quantity,
            price_at_sale: price,
            line_total: price * Decimal::from(quantity),
        })
    })?;
    let lines = rows.collect::<rusqlite::Result<Vec<_>>>()?;

    let mut cats: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();
    let mut items: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();
    for l in &lines {
        let c = cats.entry(l.category.clone()).or_default();
        c.0 += l.quantity;
        c.1 += l.line_total;
        let i = items.entry(l.item.clone()).or_default();
        i.0 += l.quantity;
        i.1 += l.line_total;
    }

    let (vatable_sales, vat_amount) = vat_split(total_sales, vat_rate);
    Ok(SalesReport {
        asset_id,
        window,
        sale_count,
        total_sales,
        vatable_sales,
        vat_amount,
        by_category: rollup(cats),
        by_item: rollup(items),
        lines,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    pub date: String,
    pub time: String,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerReport {
    pub asset_id: i64,
    pub window: DateWindow,
    pub rows: Vec<LedgerRow>,
    pub total: Decimal,
}

/// INCOME entries across the asset's deals, newest first.
pub fn income_ledger(
    conn: &Connection,
    actor: &Actor,
    asset_id: i64,
    window: DateWindow,
) -> CoreResult<LedgerReport> {
    actor.require(Capability::ViewReports, Some(asset_id))?;
    let mut stmt = conn.prepare(
        "SELECT t.transaction_date, t.description, t.amount
         FROM transactions t JOIN deals d ON d.id = t.deal_id
         WHERE d.asset_id=?1 AND t.transaction_type='INCOME'
           AND (?2 IS NULL OR t.transaction_date >= ?2)
           AND (?3 IS NULL OR t.transaction_date < ?3)
         ORDER BY t.transaction_date DESC, t.id DESC",
    )?;
    let rows = stmt.query_map(params![asset_id, window.lower(), window.upper()], |r| {
        let at: NaiveDateTime = r.get(0)?;
        Ok(LedgerRow {
            date: at.format("%Y-%m-%d").to_string(),
            time: at.format("%H:%M").to_string(),
            description: r.get(1)?,
            amount: decimal_at(r, 2)?,
        })
    })?;
    let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    let total = round_money(rows.iter().map(|r| r.amount).sum());
    Ok(LedgerReport {
        asset_id,
        window,
        rows,
        total,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyAssetSummary {
    pub asset_id: i64,
    pub asset_name: String,
    pub transaction_count: i64,
    pub total_sales: Decimal,
    pub recipients: Vec<String>,
}

/// Per-asset INCOME for one day with the e-mail recipients for each asset:
/// active owners plus active holders of the asset's deals.
pub fn daily_summary(
    conn: &Connection,
    actor: &Actor,
    day: NaiveDate,
) -> CoreResult<Vec<DailyAssetSummary>> {
    actor.require(Capability::ViewReports, None)?;
    let window = DateWindow::day(day);

    let owners: BTreeSet<String> = {
        let mut stmt = conn.prepare(
            "SELECT email FROM users
             WHERE role='OWNER' AND is_active=1 AND email IS NOT NULL AND email <> ''",
        )?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, t.amount
         FROM transactions t
         JOIN deals d ON d.id = t.deal_id
         JOIN assets a ON a.id = d.asset_id
         WHERE t.transaction_type='INCOME'
           AND t.transaction_date >= ?1 AND t.transaction_date < ?2
         ORDER BY a.name",
    )?;
    let rows = stmt.query_map(params![window.lower(), window.upper()], |r| {
        Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?, decimal_at(r, 2)?))
    })?;
    let mut per_asset: BTreeMap<(String, i64), (i64, Decimal)> = BTreeMap::new();
    for row in rows {
        let (id, name, amount) = row?;
        let e = per_asset.entry((name, id)).or_default();
        e.0 += 1;
        e.1 += amount;
    }

    let mut holders = conn.prepare(
        "SELECT DISTINCT u.email FROM holdings h
         JOIN users u ON u.id = h.investor_id
         JOIN deals d ON d.id = h.deal_id
         WHERE d.asset_id=?1 AND u.is_active=1 AND u.email IS NOT NULL AND u.email <> ''",
    )?;
    let mut out = Vec::new();
    for ((asset_name, asset_id), (count, total)) in per_asset {
        let mut recipients = owners.clone();
        let emails = holders.query_map(params![asset_id], |r| r.get::<_, String>(0))?;
        for e in emails {
            recipients.insert(e?);
        }
        out.push(DailyAssetSummary {
            asset_id,
            asset_name,
            transaction_count: count,
            total_sales: round_money(total),
            recipients: recipients.into_iter().collect(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn vat_split_is_inclusive() {
        assert_eq!(vat_split(dec!(112.00), dec!(0.12)), (dec!(100.00), dec!(12.00)));
        assert_eq!(vat_split(dec!(375.50), dec!(0.12)), (dec!(335.27), dec!(40.23)));
        assert_eq!(vat_split(Decimal::ZERO, dec!(0.12)), (dec!(0.00), dec!(0.00)));
    }

    #[test]
    fn window_upper_bound_is_next_midnight() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let w = DateWindow::day(d);
        assert_eq!(w.upper().unwrap().to_string(), "2024-03-01 00:00:00");
        assert_eq!(DateWindow::default().lower(), None);
    }
}
