// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Category → Item → Variant, scoped per asset.

use crate::access::{Actor, Capability};
use crate::db::{decimal_at, is_constraint};
use crate::errors::{CoreError, CoreResult, OptionalRow};
use crate::models::{Category, Item, Variant};
use crate::utils::{fits_digits, round_money, PRICE_DIGITS};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

/// A variant joined with the catalog path it hangs off.
#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    pub variant: Variant,
    pub item_name: String,
    pub category_name: String,
    pub asset_id: i64,
}

impl VariantView {
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.item_name, self.variant.name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub item: Item,
    pub category_name: String,
    pub variant_count: i64,
}

fn non_empty<'a>(value: &'a str, what: &str) -> CoreResult<&'a str> {
    let v = value.trim();
    if v.is_empty() {
        return Err(CoreError::validation(format!("{} cannot be empty", what)));
    }
    Ok(v)
}

fn check_price(price: Decimal) -> CoreResult<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CoreError::validation("price cannot be negative"));
    }
    if !fits_digits(price, PRICE_DIGITS) {
        return Err(CoreError::validation(format!(
            "price {} exceeds {} digits",
            price, PRICE_DIGITS
        )));
    }
    Ok(round_money(price))
}

pub fn get_category(conn: &Connection, category_id: i64) -> CoreResult<Category> {
    conn.query_row(
        &format!("SELECT {} FROM categories WHERE id=?1", Category::COLUMNS),
        params![category_id],
        Category::from_row,
    )
    .or_not_found(|| format!("Category #{}", category_id))
}

pub fn add_category(
    conn: &Connection,
    actor: &Actor,
    asset_id: i64,
    name: &str,
) -> CoreResult<Category> {
    actor.require(Capability::ManageCatalog, Some(asset_id))?;
    let name = non_empty(name, "category name")?;
    match conn.execute(
        "INSERT INTO categories(asset_id, name) VALUES (?1, ?2)",
        params![asset_id, name],
    ) {
        Ok(_) => {}
        Err(e) if is_constraint(&e) => {
            return Err(CoreError::validation(format!(
                "category '{}' already exists for this asset",
                name
            )));
        }
        Err(e) => return Err(e.into()),
    }
    get_category(conn, conn.last_insert_rowid())
}

pub fn list_categories(conn: &Connection, asset_id: i64) -> CoreResult<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM categories WHERE asset_id=?1 ORDER BY name",
        Category::COLUMNS
    ))?;
    let rows = stmt.query_map(params![asset_id], Category::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn rename_category(
    conn: &Connection,
    actor: &Actor,
    category_id: i64,
    new_name: &str,
) -> CoreResult<Category> {
    let cat = get_category(conn, category_id)?;
    actor.require(Capability::ManageCatalog, Some(cat.asset_id))?;
    let new_name = non_empty(new_name, "category name")?;
    match conn.execute(
        "UPDATE categories SET name=?1 WHERE id=?2",
        params![new_name, category_id],
    ) {
        Ok(_) => get_category(conn, category_id),
        Err(e) if is_constraint(&e) => Err(CoreError::validation(format!(
            "category '{}' already exists for this asset",
            new_name
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Refused while the category still has items.
pub fn delete_category(conn: &Connection, actor: &Actor, category_id: i64) -> CoreResult<()> {
    let cat = get_category(conn, category_id)?;
    actor.require(Capability::ManageCatalog, Some(cat.asset_id))?;
    match conn.execute("DELETE FROM categories WHERE id=?1", params![category_id]) {
        Ok(_) => Ok(()),
        Err(e) if is_constraint(&e) => Err(CoreError::validation(format!(
            "category '{}' still has items",
            cat.name
        ))),
        Err(e) => Err(e.into()),
    }
}

pub fn get_item(conn: &Connection, item_id: i64) -> CoreResult<(Item, i64)> {
    conn.query_row(
        "SELECT i.id, i.category_id, i.name, i.description, c.asset_id
         FROM items i JOIN categories c ON c.id = i.category_id
         WHERE i.id=?1",
        params![item_id],
        |r| Ok((Item::from_row(r)?, r.get(4)?)),
    )
    .or_not_found(|| format!("Item #{}", item_id))
}

pub fn add_item(
    conn: &Connection,
    actor: &Actor,
    category_id: i64,
    name: &str,
    description: &str,
) -> CoreResult<Item> {
    let cat = get_category(conn, category_id)?;
    actor.require(Capability::ManageCatalog, Some(cat.asset_id))?;
    let name = non_empty(name, "item name")?;
    conn.execute(
        "INSERT INTO items(category_id, name, description) VALUES (?1, ?2, ?3)",
        params![category_id, name, description.trim()],
    )?;
    Ok(get_item(conn, conn.last_insert_rowid())?.0)
}

pub fn list_items(conn: &Connection, asset_id: i64) -> CoreResult<Vec<ItemView>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.category_id, i.name, i.description, c.name,
                (SELECT COUNT(*) FROM variants v WHERE v.item_id = i.id)
         FROM items i JOIN categories c ON c.id = i.category_id
         WHERE c.asset_id=?1
         ORDER BY c.name, i.name",
    )?;
    let rows = stmt.query_map(params![asset_id], |r| {
        Ok(ItemView {
            item: Item::from_row(r)?,
            category_name: r.get(4)?,
            variant_count: r.get(5)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Drops the item and its variants; refused once any variant has been sold.
pub fn delete_item(conn: &Connection, actor: &Actor, item_id: i64) -> CoreResult<()> {
    let (item, asset_id) = get_item(conn, item_id)?;
    actor.require(Capability::ManageCatalog, Some(asset_id))?;
    match conn.execute("DELETE FROM items WHERE id=?1", params![item_id]) {
        Ok(_) => Ok(()),
        Err(e) if is_constraint(&e) => Err(CoreError::validation(format!(
            "item '{}' has variants referenced by past sales",
            item.name
        ))),
        Err(e) => Err(e.into()),
    }
}

const VARIANT_VIEW_SQL: &str = "SELECT v.id, v.item_id, v.name, v.price, i.name, c.name, c.asset_id
     FROM variants v
     JOIN items i ON i.id = v.item_id
     JOIN categories c ON c.id = i.category_id";

fn variant_view(r: &rusqlite::Row<'_>) -> rusqlite::Result<VariantView> {
    Ok(VariantView {
        variant: Variant {
            id: r.get(0)?,
            item_id: r.get(1)?,
            name: r.get(2)?,
            price: decimal_at(r, 3)?,
        },
        item_name: r.get(4)?,
        category_name: r.get(5)?,
        asset_id: r.get(6)?,
    })
}

pub fn get_variant(conn: &Connection, variant_id: i64) -> CoreResult<VariantView> {
    conn.query_row(
        &format!("{} WHERE v.id=?1", VARIANT_VIEW_SQL),
        params![variant_id],
        variant_view,
    )
    .or_not_found(|| format!("Variant #{}", variant_id))
}

pub fn add_variant(
    conn: &Connection,
    actor: &Actor,
    item_id: i64,
    name: &str,
    price: Decimal,
) -> CoreResult<VariantView> {
    let (_, asset_id) = get_item(conn, item_id)?;
    actor.require(Capability::ManageCatalog, Some(asset_id))?;
    let name = non_empty(name, "variant name")?;
    let price = check_price(price)?;
    conn.execute(
        "INSERT INTO variants(item_id, name, price) VALUES (?1, ?2, ?3)",
        params![item_id, name, price.to_string()],
    )?;
    get_variant(conn, conn.last_insert_rowid())
}

pub fn list_variants(conn: &Connection, asset_id: i64) -> CoreResult<Vec<VariantView>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE c.asset_id=?1 ORDER BY c.name, i.name, v.name",
        VARIANT_VIEW_SQL
    ))?;
    let rows = stmt.query_map(params![asset_id], variant_view)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Carts and past sales keep the price they captured.
pub fn set_variant_price(
    conn: &Connection,
    actor: &Actor,
    variant_id: i64,
    price: Decimal,
) -> CoreResult<VariantView> {
    let view = get_variant(conn, variant_id)?;
    actor.require(Capability::ManageCatalog, Some(view.asset_id))?;
    let price = check_price(price)?;
    conn.execute(
        "UPDATE variants SET price=?1 WHERE id=?2",
        params![price.to_string(), variant_id],
    )?;
    get_variant(conn, variant_id)
}

pub fn delete_variant(conn: &Connection, actor: &Actor, variant_id: i64) -> CoreResult<()> {
    let view = get_variant(conn, variant_id)?;
    actor.require(Capability::ManageCatalog, Some(view.asset_id))?;
    match conn.execute("DELETE FROM variants WHERE id=?1", params![variant_id]) {
        Ok(_) => Ok(()),
        Err(e) if is_constraint(&e) => Err(CoreError::validation(format!(
            "variant '{}' is referenced by past sales",
            view.display_name()
        ))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::models::Role;
    use rust_decimal_macros::dec;

    fn manager(asset: i64) -> Actor {
        Actor {
            user_id: 2,
            username: "mgr".into(),
            role: Role::Manager,
            assigned_asset_id: Some(asset),
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO assets(name, asset_type) VALUES ('Resort', 'REAL_ESTATE');
             INSERT INTO assets(name, asset_type) VALUES ('Stall', 'BUSINESS');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn category_names_unique_per_asset() {
        let conn = setup();
        add_category(&conn, &manager(1), 1, "Rooms").unwrap();
        assert!(matches!(
            add_category(&conn, &manager(1), 1, "Rooms"),
            Err(CoreError::Validation(_))
        ));
        add_category(&conn, &manager(2), 2, "Rooms").unwrap();
    }

    #[test]
    fn category_with_items_cannot_be_deleted() {
        let conn = setup();
        let m = manager(1);
        let cat = add_category(&conn, &m, 1, "Food").unwrap();
        let item = add_item(&conn, &m, cat.id, "Burger", "").unwrap();
        assert!(matches!(
            delete_category(&conn, &m, cat.id),
            Err(CoreError::Validation(_))
        ));
        delete_item(&conn, &m, item.id).unwrap();
        delete_category(&conn, &m, cat.id).unwrap();
    }

    #[test]
    fn manager_limited_to_own_asset() {
        let conn = setup();
        let cat = add_category(&conn, &manager(1), 1, "Food").unwrap();
        assert!(matches!(
            add_item(&conn, &manager(2), cat.id, "Burger", ""),
            Err(CoreError::Permission(_))
        ));
    }

    #[test]
    fn variant_prices_are_two_places_and_non_negative() {
        let conn = setup();
        let m = manager(1);
        let cat = add_category(&conn, &m, 1, "Food").unwrap();
        let item = add_item(&conn, &m, cat.id, "Burger", "").unwrap();
        let v = add_variant(&conn, &m, item.id, "Large", dec!(99.5)).unwrap();
        assert_eq!(v.variant.price.to_string(), "99.50");
        assert_eq!(v.display_name(), "Burger - Large");
        assert!(add_variant(&conn, &m, item.id, "Free", dec!(-1)).is_err());
        let v = set_variant_price(&conn, &m, v.variant.id, dec!(120)).unwrap();
        assert_eq!(v.variant.price, dec!(120.00));
        assert_eq!(list_variants(&conn, 1).unwrap().len(), 1);
        assert_eq!(list_items(&conn, 1).unwrap()[0].variant_count, 1);
    }

    #[test]
    fn prices_capped_at_ten_digits() {
        let conn = setup();
        let m = manager(1);
        let cat = add_category(&conn, &m, 1, "Food").unwrap();
        let item = add_item(&conn, &m, cat.id, "Burger", "").unwrap();
        let v = add_variant(&conn, &m, item.id, "Top", dec!(99999999.99)).unwrap();
        for price in [dec!(100000000), Decimal::MAX] {
            assert!(matches!(
                add_variant(&conn, &m, item.id, "Huge", price),
                Err(CoreError::Validation(_))
            ));
            assert!(matches!(
                set_variant_price(&conn, &m, v.variant.id, price),
                Err(CoreError::Validation(_))
            ));
        }
    }
}
