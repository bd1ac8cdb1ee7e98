// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Net asset value per share.
//!
//! The latest valuation anchors the computation; every INCOME and EXPENSE
//! recorded strictly after the start of the valuation day is rolled on top of
//! it. Without a valuation the offering price stands.

use crate::errors::CoreResult;
use crate::ledger::latest_valuation;
use crate::models::{Deal, TransactionType, Valuation};
use crate::settings::Settings;
use crate::utils::{round_money, start_of_day};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Sum of signed cash flows for a deal, optionally only those after `since`.
pub fn net_cash_flow(
    conn: &Connection,
    deal_id: i64,
    since: Option<NaiveDateTime>,
    counts_distributions: bool,
) -> CoreResult<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT transaction_type, amount FROM transactions
         WHERE deal_id=?1 AND (?2 IS NULL OR transaction_date > ?2)
         ORDER BY transaction_date, id",
    )?;
    let rows = stmt.query_map(params![deal_id, since], |r| {
        Ok((
            crate::db::parsed_at::<TransactionType>(r, 0)?,
            crate::db::decimal_at(r, 1)?,
        ))
    })?;

    let mut net = Decimal::ZERO;
    for row in rows {
        let (kind, amount) = row?;
        match kind {
            TransactionType::Income => net += amount,
            TransactionType::Expense => net -= amount,
            TransactionType::Distribution if counts_distributions => net -= amount,
            TransactionType::Distribution => {}
        }
    }
    Ok(net)
}

/// NAV spread over the offered shares; zero when nothing is offered.
pub fn nav_per_share(current_nav: Decimal, total_shares_offered: i64) -> Decimal {
    if total_shares_offered <= 0 {
        return round_money(Decimal::ZERO);
    }
    round_money(current_nav / Decimal::from(total_shares_offered))
}

pub fn calculate_current_share_value(conn: &Connection, deal: &Deal) -> CoreResult<Decimal> {
    let settings = Settings::load(conn)?;
    current_share_value_with(conn, deal, settings.nav_counts_distributions)
}

pub fn current_share_value_with(
    conn: &Connection,
    deal: &Deal,
    counts_distributions: bool,
) -> CoreResult<Decimal> {
    let Some(valuation) = latest_valuation(conn, deal.id)? else {
        debug!(deal_id = deal.id, "no valuation, using offering price");
        return Ok(deal.price_per_share());
    };
    let since = start_of_day(valuation.valuation_date);
    let flow = net_cash_flow(conn, deal.id, Some(since), counts_distributions)?;
    let current_nav = valuation.total_valuation + flow;
    let per_share = nav_per_share(current_nav, deal.total_shares_offered);
    debug!(
        deal_id = deal.id,
        valuation = %valuation.total_valuation,
        net_cash_flow = %flow,
        %current_nav,
        %per_share,
        "nav computed"
    );
    Ok(per_share)
}

/// Shares held across all holdings of the deal.
pub fn shares_sold(conn: &Connection, deal_id: i64) -> CoreResult<i64> {
    let n: i64 = conn.query_row(
        "SELECT COALESCE(SUM(shares_held), 0) FROM holdings WHERE deal_id=?1",
        params![deal_id],
        |r| r.get(0),
    )?;
    Ok(n)
}

#[derive(Debug, Clone, Serialize)]
pub struct DealSnapshot {
    pub deal: Deal,
    pub price_per_share: Decimal,
    pub current_share_value: Decimal,
    pub shares_sold: i64,
    pub shares_available: i64,
    pub percentage_sold: f64,
    pub latest_valuation: Option<Valuation>,
}

pub fn deal_snapshot(conn: &Connection, deal: &Deal) -> CoreResult<DealSnapshot> {
    let sold = shares_sold(conn, deal.id)?;
    Ok(DealSnapshot {
        deal: deal.clone(),
        price_per_share: deal.price_per_share(),
        current_share_value: calculate_current_share_value(conn, deal)?,
        shares_sold: sold,
        shares_available: deal.shares_available(sold),
        percentage_sold: deal.percentage_sold(sold),
        latest_valuation: latest_valuation(conn, deal.id)?,
    })
}
