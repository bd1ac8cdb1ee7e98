// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{asset, fixture, user};
use dealdesk::access::Actor;
use dealdesk::db::init_schema;
use dealdesk::directory::{
    create_asset, list_users, register_user, toggle_active, update_user, NewAsset, NewUser,
    UserChanges,
};
use dealdesk::errors::CoreError;
use dealdesk::models::{AssetType, Role};
use rusqlite::Connection;

fn new_user(name: &str, role: Role, asset: Option<i64>) -> NewUser {
    NewUser {
        username: name.into(),
        first_name: String::new(),
        last_name: String::new(),
        email: None,
        role,
        assigned_asset_id: asset,
    }
}

#[test]
fn first_user_must_be_owner() {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    assert!(matches!(
        register_user(&conn, None, &new_user("mgr", Role::Manager, None)),
        Err(CoreError::Validation(_))
    ));
    register_user(&conn, None, &new_user("boss", Role::Owner, None)).unwrap();
    assert!(matches!(
        register_user(&conn, None, &new_user("boss2", Role::Owner, None)),
        Err(CoreError::Permission(_))
    ));
}

#[test]
fn managers_register_cashiers_for_their_asset_only() {
    let f = fixture();
    let other = asset(&f.conn, &f.owner, "Food Stall");
    assert!(matches!(
        register_user(&f.conn, Some(&f.manager), &new_user("m2", Role::Manager, None)),
        Err(CoreError::Permission(_))
    ));
    assert!(matches!(
        register_user(&f.conn, Some(&f.manager), &new_user("c2", Role::Cashier, Some(other))),
        Err(CoreError::Permission(_))
    ));
    let c = register_user(&f.conn, Some(&f.manager), &new_user("c3", Role::Cashier, None)).unwrap();
    assert_eq!(c.assigned_asset_id, Some(f.asset_id));
    assert!(matches!(
        register_user(&f.conn, Some(&f.cashier), &new_user("c4", Role::Cashier, None)),
        Err(CoreError::Permission(_))
    ));
}

#[test]
fn staff_need_an_asset_and_unique_names() {
    let f = fixture();
    assert!(matches!(
        register_user(&f.conn, Some(&f.owner), &new_user("m9", Role::Manager, None)),
        Err(CoreError::Validation(_))
    ));
    assert!(matches!(
        register_user(&f.conn, Some(&f.owner), &new_user("cashier", Role::Investor, None)),
        Err(CoreError::Validation(_))
    ));
}

#[test]
fn manager_toggles_own_cashiers_only() {
    let f = fixture();
    let other = asset(&f.conn, &f.owner, "Food Stall");
    let stranger = user(&f.conn, Some(&f.owner), "stranger", Role::Cashier, Some(other));

    let off = toggle_active(&f.conn, &f.manager, f.cashier.user_id).unwrap();
    assert!(!off.is_active);
    assert!(matches!(
        Actor::load(&f.conn, "cashier"),
        Err(CoreError::Permission(_))
    ));
    let on = toggle_active(&f.conn, &f.manager, f.cashier.user_id).unwrap();
    assert!(on.is_active);

    assert!(matches!(
        toggle_active(&f.conn, &f.manager, stranger.user_id),
        Err(CoreError::Permission(_))
    ));
    assert!(matches!(
        toggle_active(&f.conn, &f.owner, f.owner.user_id),
        Err(CoreError::Permission(_))
    ));
    toggle_active(&f.conn, &f.owner, f.manager.user_id).unwrap();
}

#[test]
fn only_owners_reassign() {
    let f = fixture();
    let other = asset(&f.conn, &f.owner, "Food Stall");
    let move_cashier = UserChanges {
        assigned_asset_id: Some(Some(other)),
        ..UserChanges::default()
    };
    assert!(matches!(
        update_user(&f.conn, &f.manager, f.cashier.user_id, &move_cashier),
        Err(CoreError::Permission(_))
    ));
    let moved = update_user(&f.conn, &f.owner, f.cashier.user_id, &move_cashier).unwrap();
    assert_eq!(moved.assigned_asset_id, Some(other));

    let unassign = UserChanges {
        assigned_asset_id: Some(None),
        ..UserChanges::default()
    };
    assert!(matches!(
        update_user(&f.conn, &f.owner, f.cashier.user_id, &unassign),
        Err(CoreError::Validation(_))
    ));
}

#[test]
fn user_listing_is_scoped() {
    let f = fixture();
    assert_eq!(list_users(&f.conn, &f.owner).unwrap().len(), 3);
    let staff = list_users(&f.conn, &f.manager).unwrap();
    assert_eq!(staff.len(), 2);
    assert!(list_users(&f.conn, &f.cashier).is_err());
}

#[test]
fn asset_tin_is_validated() {
    let f = fixture();
    let bad = NewAsset {
        name: "Farm".into(),
        asset_type: AssetType::Other,
        location: String::new(),
        description: String::new(),
        tin_number: Some("12-34".into()),
        phone_number: None,
    };
    assert!(matches!(
        create_asset(&f.conn, &f.owner, &bad),
        Err(CoreError::Validation(_))
    ));
    let ok = NewAsset {
        tin_number: Some(" ".into()),
        ..bad.clone()
    };
    let a = create_asset(&f.conn, &f.owner, &ok).unwrap();
    assert_eq!(a.tin_number, None);
    assert!(matches!(
        create_asset(&f.conn, &f.manager, &ok),
        Err(CoreError::Permission(_))
    ));
}
