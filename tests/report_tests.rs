// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use chrono::NaiveDate;
use common::{at, fixture, today, user, Fixture};
use dealdesk::errors::CoreError;
use dealdesk::holdings::subscribe;
use dealdesk::ledger::{record_transaction, NewTransaction};
use dealdesk::models::{Role, TransactionType};
use dealdesk::pos::{add_to_cart, checkout};
use dealdesk::reports::{daily_summary, income_ledger, sales_report, DateWindow};
use dealdesk::session::SqliteSessionStore;
use rust_decimal_macros::dec;

fn sell(f: &mut Fixture, variants: &[i64], when: chrono::NaiveDateTime) -> i64 {
    {
        let store = SqliteSessionStore::new(&f.conn, 12, when);
        for v in variants {
            add_to_cart(&f.conn, &store, "till", &f.cashier, f.deal.id, *v).unwrap();
        }
    }
    let cashier = f.cashier.clone();
    checkout(&mut f.conn, "till", &cashier, f.deal.id, None, when)
        .unwrap()
        .sale_id
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

#[test]
fn sales_report_splits_vat_and_rolls_up() {
    let mut f = fixture();
    let (a, b) = (f.variant_a, f.variant_b);
    sell(&mut f, &[a, a, b], at(2024, 5, 1, 9, 0));
    sell(&mut f, &[b], at(2024, 5, 2, 15, 0));
    sell(&mut f, &[a], at(2024, 5, 3, 8, 0));

    let window = DateWindow {
        from: Some(day(1)),
        to: Some(day(2)),
    };
    let r = sales_report(&f.conn, &f.manager, f.asset_id, window, dec!(0.12)).unwrap();
    assert_eq!(r.sale_count, 2);
    assert_eq!(r.total_sales, dec!(451.00));
    assert_eq!(r.vatable_sales, dec!(402.68));
    assert_eq!(r.vat_amount, dec!(48.32));
    assert_eq!(r.lines.len(), 3);

    assert_eq!(r.by_category[0].name, "Rooms");
    assert_eq!(r.by_category[0].quantity, 2);
    assert_eq!(r.by_category[0].revenue, dec!(300.00));
    assert_eq!(r.by_category[1].name, "Food");
    assert_eq!(r.by_category[1].quantity, 2);
    assert_eq!(r.by_category[1].revenue, dec!(151.00));
    assert_eq!(r.by_item[0].name, "Cottage - Day Use");
}

#[test]
fn reports_are_limited_to_the_managers_asset() {
    let f = fixture();
    let r = sales_report(&f.conn, &f.cashier, f.asset_id, DateWindow::default(), dec!(0.12));
    assert!(matches!(r, Err(CoreError::Permission(_))));
    let r = income_ledger(&f.conn, &f.owner, f.asset_id, DateWindow::default()).unwrap();
    assert!(r.rows.is_empty());
}

#[test]
fn ledger_lists_income_newest_first() {
    let mut f = fixture();
    let a = f.variant_a;
    let sale = sell(&mut f, &[a], at(2024, 5, 1, 9, 15));
    record_transaction(
        &f.conn,
        &f.owner,
        &NewTransaction {
            deal_id: f.deal.id,
            transaction_type: TransactionType::Income,
            amount: dec!(1000),
            description: "Event booking".into(),
            transaction_date: at(2024, 5, 1, 18, 45),
        },
    )
    .unwrap();
    record_transaction(
        &f.conn,
        &f.owner,
        &NewTransaction {
            deal_id: f.deal.id,
            transaction_type: TransactionType::Expense,
            amount: dec!(400),
            description: "Supplies".into(),
            transaction_date: at(2024, 5, 1, 12, 0),
        },
    )
    .unwrap();

    let r = income_ledger(&f.conn, &f.manager, f.asset_id, DateWindow::day(day(1))).unwrap();
    assert_eq!(r.rows.len(), 2);
    assert_eq!(r.rows[0].description, "Event booking");
    assert_eq!(r.rows[0].time, "18:45");
    assert_eq!(r.rows[1].description, format!("POS Sale #{} (Cashier: cashier)", sale));
    assert_eq!(r.rows[1].date, "2024-05-01");
    assert_eq!(r.total, dec!(1150.00));

    let next_day = income_ledger(&f.conn, &f.manager, f.asset_id, DateWindow::day(day(2))).unwrap();
    assert!(next_day.rows.is_empty());
}

#[test]
fn daily_summary_collects_owner_and_holder_emails() {
    let mut f = fixture();
    let ivy = user(&f.conn, Some(&f.owner), "ivy", Role::Investor, None);
    let _quiet = user(&f.conn, Some(&f.owner), "quiet", Role::Investor, None);
    let owner = f.owner.clone();
    subscribe(&mut f.conn, &owner, ivy.user_id, f.deal.id, 5, today()).unwrap();

    let (a, b) = (f.variant_a, f.variant_b);
    sell(&mut f, &[a], at(2024, 5, 1, 9, 0));
    sell(&mut f, &[b], at(2024, 5, 1, 20, 0));

    let s = daily_summary(&f.conn, &f.owner, day(1)).unwrap();
    assert_eq!(s.len(), 1);
    assert_eq!(s[0].asset_name, "Beach Resort");
    assert_eq!(s[0].transaction_count, 2);
    assert_eq!(s[0].total_sales, dec!(225.50));
    assert_eq!(
        s[0].recipients,
        vec!["ivy@example.com".to_string(), "owner@example.com".to_string()]
    );

    assert!(daily_summary(&f.conn, &f.owner, day(2)).unwrap().is_empty());
    assert!(daily_summary(&f.conn, &f.manager, day(1)).is_err());
}
