// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Deals and their valuation / cash-flow ledger.

use crate::access::{Actor, Capability};
use crate::db::is_constraint;
use crate::errors::{CoreError, CoreResult, OptionalRow};
use crate::models::{Deal, Transaction, TransactionType, Valuation};
use crate::utils::{fits_digits, round_money, AMOUNT_DIGITS};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use tracing::info;

pub fn get_deal(conn: &Connection, deal_id: i64) -> CoreResult<Deal> {
    conn.query_row(
        &format!("SELECT {} FROM deals WHERE id=?1", Deal::COLUMNS),
        params![deal_id],
        Deal::from_row,
    )
    .or_not_found(|| format!("Deal #{}", deal_id))
}

pub fn list_deals(conn: &Connection, include_inactive: bool) -> CoreResult<Vec<Deal>> {
    let sql = if include_inactive {
        format!("SELECT {} FROM deals ORDER BY launch_date DESC, id DESC", Deal::COLUMNS)
    } else {
        format!(
            "SELECT {} FROM deals WHERE is_active=1 ORDER BY launch_date DESC, id DESC",
            Deal::COLUMNS
        )
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], Deal::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[derive(Debug, Clone)]
pub struct NewDeal {
    pub asset_id: i64,
    pub title: String,
    pub target_raise_amount: Decimal,
    pub total_shares_offered: i64,
    pub launch_date: NaiveDate,
    pub is_active: bool,
}

/// Partial update; `None` leaves the column alone.
#[derive(Debug, Clone, Default)]
pub struct DealChanges {
    pub title: Option<String>,
    pub target_raise_amount: Option<Decimal>,
    pub total_shares_offered: Option<i64>,
    pub launch_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

fn check_amount(amount: Decimal, what: &str) -> CoreResult<()> {
    if !fits_digits(amount, AMOUNT_DIGITS) {
        return Err(CoreError::validation(format!(
            "{} {} exceeds {} digits",
            what, amount, AMOUNT_DIGITS
        )));
    }
    Ok(())
}

fn check_offering(target: Decimal, shares: i64) -> CoreResult<()> {
    if target.is_sign_negative() {
        return Err(CoreError::validation("target raise amount cannot be negative"));
    }
    check_amount(target, "target raise amount")?;
    if shares < 0 {
        return Err(CoreError::validation("total shares offered cannot be negative"));
    }
    Ok(())
}

pub fn create_deal(conn: &Connection, actor: &Actor, new: &NewDeal) -> CoreResult<Deal> {
    actor.require(Capability::ManageDeals, Some(new.asset_id))?;
    let title = new.title.trim();
    if title.is_empty() {
        return Err(CoreError::validation("deal title cannot be empty"));
    }
    check_offering(new.target_raise_amount, new.total_shares_offered)?;
    conn.query_row(
        "SELECT id FROM assets WHERE id=?1",
        params![new.asset_id],
        |r| r.get::<_, i64>(0),
    )
    .or_not_found(|| format!("Asset #{}", new.asset_id))?;

    conn.execute(
        "INSERT INTO deals(asset_id, title, target_raise_amount, total_shares_offered, launch_date, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new.asset_id,
            title,
            round_money(new.target_raise_amount).to_string(),
            new.total_shares_offered,
            new.launch_date,
            new.is_active
        ],
    )?;
    let deal = get_deal(conn, conn.last_insert_rowid())?;
    info!(deal_id = deal.id, asset_id = deal.asset_id, "deal created");
    Ok(deal)
}

pub fn update_deal(
    conn: &Connection,
    actor: &Actor,
    deal_id: i64,
    changes: &DealChanges,
) -> CoreResult<Deal> {
    let mut deal = get_deal(conn, deal_id)?;
    actor.require(Capability::ManageDeals, Some(deal.asset_id))?;

    if let Some(t) = &changes.title {
        let t = t.trim();
        if t.is_empty() {
            return Err(CoreError::validation("deal title cannot be empty"));
        }
        deal.title = t.to_string();
    }
    if let Some(v) = changes.target_raise_amount {
        check_amount(v, "target raise amount")?;
        deal.target_raise_amount = round_money(v);
    }
    if let Some(v) = changes.total_shares_offered {
        deal.total_shares_offered = v;
    }
    if let Some(v) = changes.launch_date {
        deal.launch_date = v;
    }
    if let Some(v) = changes.is_active {
        deal.is_active = v;
    }
    check_offering(deal.target_raise_amount, deal.total_shares_offered)?;

    conn.execute(
        "UPDATE deals SET title=?1, target_raise_amount=?2, total_shares_offered=?3,
                          launch_date=?4, is_active=?5
         WHERE id=?6",
        params![
            deal.title,
            deal.target_raise_amount.to_string(),
            deal.total_shares_offered,
            deal.launch_date,
            deal.is_active,
            deal.id
        ],
    )?;
    Ok(deal)
}

/// Removes the deal together with everything it owns.
pub fn delete_deal(conn: &Connection, actor: &Actor, deal_id: i64) -> CoreResult<()> {
    let deal = get_deal(conn, deal_id)?;
    actor.require(Capability::ManageDeals, Some(deal.asset_id))?;
    conn.execute("DELETE FROM deals WHERE id=?1", params![deal_id])?;
    info!(deal_id, "deal deleted");
    Ok(())
}

pub fn add_valuation(
    conn: &Connection,
    actor: &Actor,
    deal_id: i64,
    valuation_date: NaiveDate,
    total_valuation: Decimal,
    method: &str,
) -> CoreResult<Valuation> {
    let deal = get_deal(conn, deal_id)?;
    actor.require(Capability::ManageDeals, Some(deal.asset_id))?;
    let method = method.trim();
    if method.is_empty() {
        return Err(CoreError::validation("valuation method cannot be empty"));
    }
    check_amount(total_valuation, "valuation")?;

    let res = conn.execute(
        "INSERT INTO valuations(deal_id, valuation_date, total_valuation, valuation_method)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            deal_id,
            valuation_date,
            round_money(total_valuation).to_string(),
            method
        ],
    );
    match res {
        Ok(_) => {}
        Err(e) if is_constraint(&e) => {
            return Err(CoreError::validation(format!(
                "a valuation for deal #{} on {} already exists",
                deal_id, valuation_date
            )));
        }
        Err(e) => return Err(e.into()),
    }
    let id = conn.last_insert_rowid();
    info!(deal_id, valuation_id = id, %valuation_date, "valuation recorded");
    conn.query_row(
        &format!("SELECT {} FROM valuations WHERE id=?1", Valuation::COLUMNS),
        params![id],
        Valuation::from_row,
    )
    .map_err(CoreError::from)
}

/// Newest first.
pub fn list_valuations(conn: &Connection, deal_id: i64) -> CoreResult<Vec<Valuation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM valuations WHERE deal_id=?1 ORDER BY valuation_date DESC",
        Valuation::COLUMNS
    ))?;
    let rows = stmt.query_map(params![deal_id], Valuation::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn latest_valuation(conn: &Connection, deal_id: i64) -> CoreResult<Option<Valuation>> {
    Ok(list_valuations(conn, deal_id)?.into_iter().next())
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub deal_id: i64,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub transaction_date: NaiveDateTime,
}

/// Manual ledger entry. POS income is written by the sale finalizer instead.
pub fn record_transaction(
    conn: &Connection,
    actor: &Actor,
    new: &NewTransaction,
) -> CoreResult<Transaction> {
    let deal = get_deal(conn, new.deal_id)?;
    actor.require(Capability::ManageDeals, Some(deal.asset_id))?;
    if new.amount <= Decimal::ZERO {
        return Err(CoreError::validation("transaction amount must be positive"));
    }
    check_amount(new.amount, "transaction amount")?;
    let description = new.description.trim();
    if description.is_empty() {
        return Err(CoreError::validation("transaction description cannot be empty"));
    }
    conn.execute(
        "INSERT INTO transactions(deal_id, transaction_date, transaction_type, amount, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new.deal_id,
            new.transaction_date,
            new.transaction_type.as_str(),
            round_money(new.amount).to_string(),
            description
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(
        deal_id = new.deal_id,
        transaction_id = id,
        kind = new.transaction_type.as_str(),
        amount = %new.amount,
        "transaction recorded"
    );
    get_transaction(conn, id)
}

pub fn get_transaction(conn: &Connection, id: i64) -> CoreResult<Transaction> {
    conn.query_row(
        &format!("SELECT {} FROM transactions WHERE id=?1", Transaction::COLUMNS),
        params![id],
        Transaction::from_row,
    )
    .or_not_found(|| format!("Transaction #{}", id))
}

/// Ledger in display order: newest first, later insertions first on equal timestamps.
pub fn list_transactions(
    conn: &Connection,
    deal_id: i64,
    limit: Option<usize>,
) -> CoreResult<Vec<Transaction>> {
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM transactions WHERE deal_id=?1
         ORDER BY transaction_date DESC, id DESC LIMIT ?2",
        Transaction::COLUMNS
    ))?;
    let rows = stmt.query_map(params![deal_id, limit], Transaction::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
