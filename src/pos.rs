// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Point of sale: cart maintenance and the checkout that turns a cart into a
//! sale plus its ledger income.

use crate::access::{role_grants, Actor, Capability};
use crate::cart::{Cart, CartLine};
use crate::catalog::get_variant;
use crate::errors::{CoreError, CoreResult};
use crate::ledger::get_deal;
use crate::models::{Deal, TransactionType};
use crate::session::{SessionStore, SqliteSessionStore};
use crate::settings::Settings;
use crate::utils::{fits_digits, round_money, PRICE_DIGITS};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, TransactionBehavior};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

pub const WALK_IN: &str = "Walk-in";

#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub sale_id: i64,
    pub transaction_id: i64,
    pub deal_id: i64,
    pub cashier: String,
    pub customer_name: String,
    pub created_at: NaiveDateTime,
    pub lines: Vec<CartLine>,
    pub total_amount: Decimal,
}

fn active_deal(conn: &Connection, deal_id: i64) -> CoreResult<Deal> {
    let deal = get_deal(conn, deal_id)?;
    if !deal.is_active {
        return Err(CoreError::validation(format!(
            "deal #{} is not active",
            deal_id
        )));
    }
    Ok(deal)
}

/// Put one unit of a variant into the session cart at its current price.
pub fn add_to_cart<S: SessionStore>(
    conn: &Connection,
    store: &S,
    session_key: &str,
    actor: &Actor,
    deal_id: i64,
    variant_id: i64,
) -> CoreResult<Cart> {
    let deal = active_deal(conn, deal_id)?;
    actor.require(Capability::Pos, Some(deal.asset_id))?;
    let variant = get_variant(conn, variant_id)?;
    if variant.asset_id != deal.asset_id {
        return Err(CoreError::validation(format!(
            "variant '{}' is not sold at this deal's asset",
            variant.display_name()
        )));
    }

    let mut cart = store.load_cart(session_key)?.unwrap_or_default();
    cart.bind(deal_id)?;
    cart.add(variant_id, &variant.display_name(), variant.variant.price);
    check_sale_total(cart.total()?)?;
    store.store_cart(session_key, &cart)?;
    Ok(cart)
}

fn check_sale_total(total: Decimal) -> CoreResult<()> {
    if !fits_digits(total, PRICE_DIGITS) {
        return Err(CoreError::validation(format!(
            "sale total {} exceeds {} digits",
            total, PRICE_DIGITS
        )));
    }
    Ok(())
}

/// Point-of-sale access to an existing cart: scoped to the asset of the deal
/// the cart is bound to.
fn require_cart_access(conn: &Connection, actor: &Actor, cart: &Cart) -> CoreResult<()> {
    match cart.deal_id {
        Some(deal_id) => {
            let deal = get_deal(conn, deal_id)?;
            actor.require(Capability::Pos, Some(deal.asset_id))
        }
        None if role_grants(actor.role, Capability::Pos) => Ok(()),
        None => Err(CoreError::permission(format!(
            "{} ({}) may not use {}",
            actor.username,
            actor.role,
            Capability::Pos
        ))),
    }
}

pub fn remove_from_cart<S: SessionStore>(
    conn: &Connection,
    store: &S,
    session_key: &str,
    actor: &Actor,
    variant_id: i64,
) -> CoreResult<Cart> {
    let mut cart = store.load_cart(session_key)?.unwrap_or_default();
    require_cart_access(conn, actor, &cart)?;
    if cart.remove(variant_id).is_some() {
        store.store_cart(session_key, &cart)?;
    }
    Ok(cart)
}

pub fn view_cart<S: SessionStore>(store: &S, session_key: &str) -> CoreResult<Cart> {
    Ok(store.load_cart(session_key)?.unwrap_or_default())
}

pub fn clear_cart<S: SessionStore>(
    conn: &Connection,
    store: &S,
    session_key: &str,
    actor: &Actor,
) -> CoreResult<()> {
    let cart = store.load_cart(session_key)?.unwrap_or_default();
    require_cart_access(conn, actor, &cart)?;
    store.clear_cart(session_key)
}

/// Write the sale, its lines and the single INCOME entry for it.
///
/// Only accepts an open transaction: the caller commits, and dropping the
/// transaction on error leaves no partial sale behind.
pub fn finalize_sale(
    tx: &rusqlite::Transaction<'_>,
    cart: &Cart,
    deal_id: i64,
    cashier: &Actor,
    customer_name: Option<&str>,
    now: NaiveDateTime,
) -> CoreResult<SaleReceipt> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    let customer = customer_name
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(WALK_IN)
        .to_string();

    tx.execute(
        "INSERT INTO sales(deal_id, cashier_id, customer_name, total_amount, created_at)
         VALUES (?1, ?2, ?3, '0.00', ?4)",
        params![deal_id, cashier.user_id, customer, now],
    )?;
    let sale_id = tx.last_insert_rowid();

    let mut total = Decimal::ZERO;
    {
        let mut ins = tx.prepare(
            "INSERT INTO sale_items(sale_id, variant_id, quantity, price_at_sale)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for line in cart.lines() {
            let price = round_money(line.unit_price);
            ins.execute(params![
                sale_id,
                line.variant_id,
                line.quantity,
                price.to_string()
            ])?;
            total = price
                .checked_mul(Decimal::from(line.quantity))
                .and_then(|l| total.checked_add(l))
                .ok_or_else(|| {
                    CoreError::validation(format!("sale total overflows at '{}'", line.display_name))
                })?;
        }
    }
    let total = round_money(total);
    check_sale_total(total)?;

    tx.execute(
        "UPDATE sales SET total_amount=?1 WHERE id=?2",
        params![total.to_string(), sale_id],
    )?;
    tx.execute(
        "INSERT INTO transactions(deal_id, transaction_date, transaction_type, amount, description, sale_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            deal_id,
            now,
            TransactionType::Income.as_str(),
            total.to_string(),
            format!("POS Sale #{} (Cashier: {})", sale_id, cashier.username),
            sale_id
        ],
    )?;
    let transaction_id = tx.last_insert_rowid();

    Ok(SaleReceipt {
        sale_id,
        transaction_id,
        deal_id,
        cashier: cashier.username.clone(),
        customer_name: customer,
        created_at: now,
        lines: cart.lines().cloned().collect(),
        total_amount: total,
    })
}

/// Check out the session's cart against `deal_id`.
///
/// The write lock is taken before the cart is read, so a concurrent second
/// checkout of the same session finds the cart already cleared.
pub fn checkout(
    conn: &mut Connection,
    session_key: &str,
    actor: &Actor,
    deal_id: i64,
    customer_name: Option<&str>,
    now: NaiveDateTime,
) -> CoreResult<SaleReceipt> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let deal = active_deal(&tx, deal_id)?;
    actor.require(Capability::Pos, Some(deal.asset_id))?;

    let settings = Settings::load(&tx)?;
    let store = SqliteSessionStore::new(&tx, settings.session_ttl_hours, now);
    let cart = store.load_cart(session_key)?.unwrap_or_default();
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    if cart.deal_id != Some(deal_id) {
        return Err(CoreError::validation(format!(
            "cart belongs to deal #{}, not #{}",
            cart.deal_id.unwrap_or_default(),
            deal_id
        )));
    }

    let receipt = finalize_sale(&tx, &cart, deal_id, actor, customer_name, now)?;
    store.clear_cart(session_key)?;
    tx.commit()?;

    info!(
        sale_id = receipt.sale_id,
        deal_id,
        cashier = %actor.username,
        total = %receipt.total_amount,
        lines = receipt.lines.len(),
        "sale finalized"
    );
    Ok(receipt)
}
