// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::access::{Actor, Capability};
use crate::db::{decimal_at, retry_on_busy};
use crate::errors::{CoreError, CoreResult, OptionalRow};
use crate::ledger::get_deal;
use crate::models::{Holding, User};
use crate::nav::{current_share_value_with, shares_sold};
use crate::settings::Settings;
use crate::utils::round_money;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

const SUBSCRIBE_ATTEMPTS: u32 = 5;

/// Record `shares` more shares for `investor_id` at the deal's offering price.
/// The deal must be active and already launched on `today`.
pub fn subscribe(
    conn: &mut Connection,
    actor: &Actor,
    investor_id: i64,
    deal_id: i64,
    shares: i64,
    today: NaiveDate,
) -> CoreResult<Holding> {
    if shares <= 0 {
        return Err(CoreError::validation("shares must be a positive number"));
    }
    retry_on_busy(SUBSCRIBE_ATTEMPTS, || {
        subscribe_once(conn, actor, investor_id, deal_id, shares, today)
    })
}

fn subscribe_once(
    conn: &mut Connection,
    actor: &Actor,
    investor_id: i64,
    deal_id: i64,
    shares: i64,
    today: NaiveDate,
) -> CoreResult<Holding> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let deal = get_deal(&tx, deal_id)?;
    actor.require(Capability::ManageDeals, Some(deal.asset_id))?;
    if !deal.is_active {
        return Err(CoreError::validation(format!("deal #{} is not active", deal_id)));
    }
    if deal.launch_date > today {
        return Err(CoreError::validation(format!(
            "deal #{} opens on {}",
            deal_id, deal.launch_date
        )));
    }

    let investor = tx
        .query_row(
            &format!("SELECT {} FROM users WHERE id=?1", User::COLUMNS),
            params![investor_id],
            User::from_row,
        )
        .or_not_found(|| format!("User #{}", investor_id))?;
    if !investor.is_active {
        return Err(CoreError::validation(format!(
            "investor '{}' is deactivated",
            investor.username
        )));
    }

    let settings = Settings::load(&tx)?;
    let sold = shares_sold(&tx, deal_id)?;
    let sold_after = sold
        .checked_add(shares)
        .ok_or_else(|| CoreError::validation("share count overflows"))?;
    if sold_after > deal.total_shares_offered {
        if !settings.allow_oversubscription {
            return Err(CoreError::validation(format!(
                "only {} of {} shares remain in deal #{}",
                deal.shares_available(sold).max(0),
                deal.total_shares_offered,
                deal_id
            )));
        }
        warn!(
            deal_id,
            offered = deal.total_shares_offered,
            sold_after,
            "deal oversubscribed"
        );
    }

    let delta = Decimal::from(shares)
        .checked_mul(deal.price_per_share())
        .map(round_money)
        .ok_or_else(|| CoreError::validation("subscription cost overflows"))?;
    let existing: Option<Holding> = tx
        .query_row(
            &format!(
                "SELECT {} FROM holdings WHERE investor_id=?1 AND deal_id=?2",
                Holding::COLUMNS
            ),
            params![investor_id, deal_id],
            Holding::from_row,
        )
        .optional()?;

    let holding_id = match existing {
        Some(h) => {
            let held = h
                .shares_held
                .checked_add(shares)
                .ok_or_else(|| CoreError::validation("share count overflows"))?;
            let basis = h
                .total_cost_basis
                .checked_add(delta)
                .ok_or_else(|| CoreError::validation("cost basis overflows"))?;
            tx.execute(
                "UPDATE holdings SET shares_held=?1, total_cost_basis=?2 WHERE id=?3",
                params![held, round_money(basis).to_string(), h.id],
            )?;
            h.id
        }
        None => {
            tx.execute(
                "INSERT INTO holdings(investor_id, deal_id, shares_held, total_cost_basis)
                 VALUES (?1, ?2, ?3, ?4)",
                params![investor_id, deal_id, shares, delta.to_string()],
            )?;
            tx.last_insert_rowid()
        }
    };
    let holding = tx.query_row(
        &format!("SELECT {} FROM holdings WHERE id=?1", Holding::COLUMNS),
        params![holding_id],
        Holding::from_row,
    )?;
    tx.commit()?;

    info!(
        deal_id,
        investor = %investor.username,
        shares,
        cost = %delta,
        shares_held = holding.shares_held,
        "holding subscribed"
    );
    Ok(holding)
}

#[derive(Debug, Clone, Serialize)]
pub struct HoldingView {
    pub holding: Holding,
    pub investor: String,
    pub deal_title: String,
    /// `shares_held` at the deal's current share value.
    pub market_value: Decimal,
}

/// Holdings filtered by deal and/or investor. Owners see everything; other
/// users only their own positions.
pub fn list_holdings(
    conn: &Connection,
    actor: &Actor,
    deal_id: Option<i64>,
    investor_id: Option<i64>,
) -> CoreResult<Vec<HoldingView>> {
    let investor_id = if actor.require(Capability::ManageDeals, None).is_ok() {
        investor_id
    } else {
        match investor_id {
            Some(id) if id != actor.user_id => {
                return Err(CoreError::permission("only owners may list other users' holdings"));
            }
            _ => Some(actor.user_id),
        }
    };

    let settings = Settings::load(conn)?;
    let mut stmt = conn.prepare(
        "SELECT h.id, h.investor_id, h.deal_id, h.shares_held, h.total_cost_basis,
                u.username, d.title
         FROM holdings h
         JOIN users u ON u.id = h.investor_id
         JOIN deals d ON d.id = h.deal_id
         WHERE (?1 IS NULL OR h.deal_id = ?1) AND (?2 IS NULL OR h.investor_id = ?2)
         ORDER BY d.title, u.username",
    )?;
    let rows = stmt.query_map(params![deal_id, investor_id], |r| {
        Ok((
            Holding {
                id: r.get(0)?,
                investor_id: r.get(1)?,
                deal_id: r.get(2)?,
                shares_held: r.get(3)?,
                total_cost_basis: decimal_at(r, 4)?,
            },
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (holding, investor, deal_title) = row?;
        let deal = get_deal(conn, holding.deal_id)?;
        let value = current_share_value_with(conn, &deal, settings.nav_counts_distributions)?;
        out.push(HoldingView {
            market_value: round_money(value * Decimal::from(holding.shares_held)),
            holding,
            investor,
            deal_title,
        });
    }
    Ok(out)
}
