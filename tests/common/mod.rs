// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use dealdesk::access::Actor;
use dealdesk::catalog::{add_category, add_item, add_variant};
use dealdesk::db::init_schema;
use dealdesk::directory::{create_asset, register_user, NewAsset, NewUser};
use dealdesk::ledger::{create_deal, NewDeal};
use dealdesk::models::{AssetType, Deal, Role};
use rusqlite::Connection;
use rust_decimal_macros::dec;

pub struct Fixture {
    pub conn: Connection,
    pub owner: Actor,
    pub manager: Actor,
    pub cashier: Actor,
    pub asset_id: i64,
    pub deal: Deal,
    /// 150.00
    pub variant_a: i64,
    /// 75.50
    pub variant_b: i64,
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// A day inside the fixture deal's offering window.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

pub fn user(conn: &Connection, by: Option<&Actor>, name: &str, role: Role, asset: Option<i64>) -> Actor {
    let u = register_user(
        conn,
        by,
        &NewUser {
            username: name.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: Some(format!("{}@example.com", name)),
            role,
            assigned_asset_id: asset,
        },
    )
    .unwrap();
    Actor::from_user(&u)
}

pub fn asset(conn: &Connection, owner: &Actor, name: &str) -> i64 {
    create_asset(
        conn,
        owner,
        &NewAsset {
            name: name.into(),
            asset_type: AssetType::Business,
            location: "Cebu".into(),
            description: String::new(),
            tin_number: Some("123-456-789-000".into()),
            phone_number: None,
        },
    )
    .unwrap()
    .id
}

pub fn fixture() -> Fixture {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();

    let owner = user(&conn, None, "owner", Role::Owner, None);
    let asset_id = asset(&conn, &owner, "Beach Resort");
    let manager = user(&conn, Some(&owner), "manager", Role::Manager, Some(asset_id));
    let cashier = user(&conn, Some(&manager), "cashier", Role::Cashier, None);

    let deal = create_deal(
        &conn,
        &owner,
        &NewDeal {
            asset_id,
            title: "Resort Phase 1".into(),
            target_raise_amount: dec!(1000000),
            total_shares_offered: 10000,
            launch_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_active: true,
        },
    )
    .unwrap();

    let cat = add_category(&conn, &manager, asset_id, "Rooms").unwrap();
    let item = add_item(&conn, &manager, cat.id, "Cottage", "").unwrap();
    let a = add_variant(&conn, &manager, item.id, "Day Use", dec!(150.00)).unwrap();
    let cat2 = add_category(&conn, &manager, asset_id, "Food").unwrap();
    let item2 = add_item(&conn, &manager, cat2.id, "Halo-halo", "").unwrap();
    let b = add_variant(&conn, &manager, item2.id, "Regular", dec!(75.50)).unwrap();

    Fixture {
        conn,
        owner,
        manager,
        cashier,
        asset_id,
        deal,
        variant_a: a.variant.id,
        variant_b: b.variant.id,
    }
}
