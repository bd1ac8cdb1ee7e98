// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{asset, at, fixture, user};
use dealdesk::catalog::{add_category, add_item, add_variant, delete_variant, set_variant_price};
use dealdesk::errors::CoreError;
use dealdesk::ledger::{create_deal, update_deal, DealChanges, NewDeal};
use dealdesk::models::{Role, Sale, SaleItem};
use dealdesk::pos::{add_to_cart, checkout, clear_cart, remove_from_cart, view_cart};
use dealdesk::session::SqliteSessionStore;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const SESSION: &str = "till-1";

fn add(f: &common::Fixture, variant: i64) {
    let store = SqliteSessionStore::new(&f.conn, 12, at(2024, 5, 1, 9, 0));
    add_to_cart(&f.conn, &store, SESSION, &f.cashier, f.deal.id, variant).unwrap();
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

#[test]
fn checkout_writes_sale_lines_and_one_income() {
    let mut f = fixture();
    add(&f, f.variant_a);
    add(&f, f.variant_a);
    add(&f, f.variant_b);

    let now = at(2024, 5, 1, 9, 30);
    let cashier = f.cashier.clone();
    let receipt = checkout(&mut f.conn, SESSION, &cashier, f.deal.id, None, now).unwrap();
    assert_eq!(receipt.total_amount, dec!(375.50));
    assert_eq!(receipt.customer_name, "Walk-in");

    let sale: Sale = f
        .conn
        .query_row(
            &format!("SELECT {} FROM sales WHERE id=?1", Sale::COLUMNS),
            params![receipt.sale_id],
            Sale::from_row,
        )
        .unwrap();
    assert_eq!(sale.total_amount, dec!(375.50));
    assert_eq!(sale.cashier_id, f.cashier.user_id);

    let (kind, amount, desc, date, sale_id): (String, String, String, chrono::NaiveDateTime, i64) = f
        .conn
        .query_row(
            "SELECT transaction_type, amount, description, transaction_date, sale_id FROM transactions",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(kind, "INCOME");
    assert_eq!(amount, "375.50");
    assert_eq!(desc, format!("POS Sale #{} (Cashier: cashier)", receipt.sale_id));
    assert_eq!(date, sale.created_at);
    assert_eq!(sale_id, receipt.sale_id);

    assert_eq!(count(&f.conn, "sale_items"), 2);
    assert_eq!(count(&f.conn, "transactions"), 1);
    assert_eq!(count(&f.conn, "pos_sessions"), 0);
}

#[test]
fn sold_price_survives_later_price_change() {
    let mut f = fixture();
    add(&f, f.variant_a);
    // a repeat add re-prices the whole line
    set_variant_price(&f.conn, &f.manager, f.variant_a, dec!(160.00)).unwrap();
    add(&f, f.variant_a);

    let cashier = f.cashier.clone();
    let receipt = checkout(&mut f.conn, SESSION, &cashier, f.deal.id, Some("Ana"), at(2024, 5, 1, 10, 0)).unwrap();
    assert_eq!(receipt.total_amount, dec!(320.00));
    assert_eq!(receipt.customer_name, "Ana");

    set_variant_price(&f.conn, &f.manager, f.variant_a, dec!(10.00)).unwrap();
    let item: SaleItem = f
        .conn
        .query_row(
            &format!("SELECT {} FROM sale_items", SaleItem::COLUMNS),
            [],
            SaleItem::from_row,
        )
        .unwrap();
    assert_eq!(item.price_at_sale, dec!(160.00));
    assert_eq!(item.quantity, 2);
    assert_eq!(item.line_total(), dec!(320.00));

    // referenced by a sale line now
    assert!(matches!(
        delete_variant(&f.conn, &f.manager, f.variant_a),
        Err(CoreError::Validation(_))
    ));
}

#[test]
fn failed_checkout_leaves_no_partial_sale() {
    let mut f = fixture();
    add(&f, f.variant_a);
    add(&f, f.variant_b);
    // the second line's variant disappears before checkout
    delete_variant(&f.conn, &f.manager, f.variant_b).unwrap();

    let cashier = f.cashier.clone();
    let res = checkout(&mut f.conn, SESSION, &cashier, f.deal.id, None, at(2024, 5, 1, 9, 30));
    assert!(res.is_err());

    assert_eq!(count(&f.conn, "sales"), 0);
    assert_eq!(count(&f.conn, "sale_items"), 0);
    assert_eq!(count(&f.conn, "transactions"), 0);
    assert_eq!(count(&f.conn, "pos_sessions"), 1);
    let store = SqliteSessionStore::new(&f.conn, 12, at(2024, 5, 1, 9, 30));
    assert_eq!(view_cart(&store, SESSION).unwrap().len(), 2);
}

#[test]
fn oversized_cart_total_is_rejected() {
    let f = fixture();
    set_variant_price(&f.conn, &f.manager, f.variant_a, dec!(99999999.99)).unwrap();
    add(&f, f.variant_a);
    let store = SqliteSessionStore::new(&f.conn, 12, at(2024, 5, 1, 9, 0));
    assert!(matches!(
        add_to_cart(&f.conn, &store, SESSION, &f.cashier, f.deal.id, f.variant_a),
        Err(CoreError::Validation(_))
    ));
    assert_eq!(view_cart(&store, SESSION).unwrap().lines().next().unwrap().quantity, 1);
}

#[test]
fn empty_cart_checkout_writes_nothing() {
    let mut f = fixture();
    let cashier = f.cashier.clone();
    let res = checkout(&mut f.conn, SESSION, &cashier, f.deal.id, None, at(2024, 5, 1, 9, 0));
    assert!(matches!(res, Err(CoreError::EmptyCart)));
    assert_eq!(count(&f.conn, "sales"), 0);
    assert_eq!(count(&f.conn, "transactions"), 0);
}

#[test]
fn second_checkout_of_same_cart_fails() {
    let mut f = fixture();
    add(&f, f.variant_b);
    let cashier = f.cashier.clone();
    let now = at(2024, 5, 1, 9, 5);
    checkout(&mut f.conn, SESSION, &cashier, f.deal.id, None, now).unwrap();
    let again = checkout(&mut f.conn, SESSION, &cashier, f.deal.id, None, now);
    assert!(matches!(again, Err(CoreError::EmptyCart)));
    assert_eq!(count(&f.conn, "sales"), 1);
    assert_eq!(count(&f.conn, "transactions"), 1);
}

#[test]
fn concurrent_checkouts_produce_one_sale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pos.sqlite");
    let setup = Connection::open(&path).unwrap();
    dealdesk::db::init_schema(&setup).unwrap();
    let owner = user(&setup, None, "owner", Role::Owner, None);
    let asset_id = asset(&setup, &owner, "Stall");
    let cashier = user(&setup, Some(&owner), "till", Role::Cashier, Some(asset_id));
    let deal = create_deal(
        &setup,
        &owner,
        &NewDeal {
            asset_id,
            title: "Stall".into(),
            target_raise_amount: dec!(1000),
            total_shares_offered: 10,
            launch_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_active: true,
        },
    )
    .unwrap();
    let cat = add_category(&setup, &owner, asset_id, "Drinks").unwrap();
    let item = add_item(&setup, &owner, cat.id, "Coffee", "").unwrap();
    let v = add_variant(&setup, &owner, item.id, "Hot", dec!(90)).unwrap();
    let store = SqliteSessionStore::new(&setup, 12, at(2024, 5, 1, 9, 0));
    add_to_cart(&setup, &store, SESSION, &cashier, deal.id, v.variant.id).unwrap();
    drop(setup);

    let deal_id = deal.id;
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            let cashier = cashier.clone();
            std::thread::spawn(move || {
                let mut conn = Connection::open(&path).unwrap();
                conn.busy_timeout(std::time::Duration::from_secs(5)).unwrap();
                checkout(&mut conn, SESSION, &cashier, deal_id, None, at(2024, 5, 1, 9, 1))
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(CoreError::EmptyCart))));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(count(&conn, "sales"), 1);
    assert_eq!(count(&conn, "transactions"), 1);
}

#[test]
fn persisted_sale_totals_match_their_lines() {
    let mut f = fixture();
    let cashier = f.cashier.clone();
    for (i, variants) in [vec![f.variant_a], vec![f.variant_b, f.variant_b, f.variant_a]]
        .into_iter()
        .enumerate()
    {
        for v in variants {
            add(&f, v);
        }
        checkout(&mut f.conn, SESSION, &cashier, f.deal.id, None, at(2024, 5, 1, 10, i as u32)).unwrap();
    }

    let mut stmt = f
        .conn
        .prepare(&format!("SELECT {} FROM sales", Sale::COLUMNS))
        .unwrap();
    let sales: Vec<Sale> = stmt
        .query_map([], Sale::from_row)
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(sales.len(), 2);
    for sale in sales {
        let mut s = f
            .conn
            .prepare(&format!("SELECT {} FROM sale_items WHERE sale_id=?1", SaleItem::COLUMNS))
            .unwrap();
        let sum: Decimal = s
            .query_map([sale.id], SaleItem::from_row)
            .unwrap()
            .map(|r| r.unwrap().line_total())
            .sum();
        assert_eq!(sale.total_amount, sum);
    }
}

#[test]
fn cashier_cannot_sell_for_other_asset() {
    let f = fixture();
    let other = asset(&f.conn, &f.owner, "Food Stall");
    let deal = create_deal(
        &f.conn,
        &f.owner,
        &NewDeal {
            asset_id: other,
            title: "Stall".into(),
            target_raise_amount: dec!(1000),
            total_shares_offered: 10,
            launch_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_active: true,
        },
    )
    .unwrap();
    let store = SqliteSessionStore::new(&f.conn, 12, at(2024, 5, 1, 9, 0));
    let res = add_to_cart(&f.conn, &store, SESSION, &f.cashier, deal.id, f.variant_a);
    assert!(matches!(res, Err(CoreError::Permission(_))));

    // owner may, but the variant is not on that asset's catalog
    let res = add_to_cart(&f.conn, &store, SESSION, &f.owner, deal.id, f.variant_a);
    assert!(matches!(res, Err(CoreError::Validation(_))));
}

#[test]
fn cart_is_bound_to_one_deal() {
    let mut f = fixture();
    add(&f, f.variant_a);
    let second = create_deal(
        &f.conn,
        &f.owner,
        &NewDeal {
            asset_id: f.asset_id,
            title: "Phase 2".into(),
            target_raise_amount: dec!(5000),
            total_shares_offered: 50,
            launch_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            is_active: true,
        },
    )
    .unwrap();
    let store = SqliteSessionStore::new(&f.conn, 12, at(2024, 5, 1, 9, 0));
    assert!(matches!(
        add_to_cart(&f.conn, &store, SESSION, &f.cashier, second.id, f.variant_b),
        Err(CoreError::Validation(_))
    ));
    drop(store);
    let cashier = f.cashier.clone();
    assert!(matches!(
        checkout(&mut f.conn, SESSION, &cashier, second.id, None, at(2024, 5, 1, 9, 1)),
        Err(CoreError::Validation(_))
    ));
}

#[test]
fn inactive_deal_rejects_sales() {
    let f = fixture();
    update_deal(
        &f.conn,
        &f.owner,
        f.deal.id,
        &DealChanges {
            is_active: Some(false),
            ..DealChanges::default()
        },
    )
    .unwrap();
    let store = SqliteSessionStore::new(&f.conn, 12, at(2024, 5, 1, 9, 0));
    assert!(matches!(
        add_to_cart(&f.conn, &store, SESSION, &f.cashier, f.deal.id, f.variant_a),
        Err(CoreError::Validation(_))
    ));
}

#[test]
fn remove_and_view_cart() {
    let f = fixture();
    add(&f, f.variant_a);
    add(&f, f.variant_b);
    let store = SqliteSessionStore::new(&f.conn, 12, at(2024, 5, 1, 9, 10));
    let cart = remove_from_cart(&f.conn, &store, SESSION, &f.cashier, f.variant_a).unwrap();
    assert_eq!(cart.total().unwrap(), dec!(75.50));
    // removing an absent line is a no-op
    let cart = remove_from_cart(&f.conn, &store, SESSION, &f.cashier, 9999).unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(view_cart(&store, SESSION).unwrap().total().unwrap(), dec!(75.50));
}

#[test]
fn only_pos_staff_of_the_asset_edit_a_cart() {
    let f = fixture();
    add(&f, f.variant_a);
    let other = asset(&f.conn, &f.owner, "Food Stall");
    let outsider = user(&f.conn, Some(&f.owner), "outsider", Role::Cashier, Some(other));
    let investor = user(&f.conn, Some(&f.owner), "ivy", Role::Investor, None);
    let store = SqliteSessionStore::new(&f.conn, 12, at(2024, 5, 1, 9, 10));

    for actor in [&outsider, &investor] {
        assert!(matches!(
            remove_from_cart(&f.conn, &store, SESSION, actor, f.variant_a),
            Err(CoreError::Permission(_))
        ));
        assert!(matches!(
            clear_cart(&f.conn, &store, SESSION, actor),
            Err(CoreError::Permission(_))
        ));
    }
    assert_eq!(view_cart(&store, SESSION).unwrap().len(), 1);

    clear_cart(&f.conn, &store, SESSION, &f.cashier).unwrap();
    assert!(view_cart(&store, SESSION).unwrap().is_empty());
    // an empty session still needs a point-of-sale role
    assert!(matches!(
        clear_cart(&f.conn, &store, SESSION, &investor),
        Err(CoreError::Permission(_))
    ));
}
