// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{decimal_at, parsed_at};
use crate::errors::CoreError;
use crate::utils::{round_money, round_percent};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::validation(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    RealEstate,
    Business,
    Other,
}

text_enum!(AssetType {
    RealEstate => "REAL_ESTATE",
    Business => "BUSINESS",
    Other => "OTHER",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Manager,
    Cashier,
    Investor,
}

text_enum!(Role {
    Owner => "OWNER",
    Manager => "MANAGER",
    Cashier => "CASHIER",
    Investor => "INVESTOR",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
    Distribution,
}

text_enum!(TransactionType {
    Income => "INCOME",
    Expense => "EXPENSE",
    Distribution => "DISTRIBUTION",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub asset_type: AssetType,
    pub location: String,
    pub description: String,
    pub tin_number: Option<String>,
    pub phone_number: Option<String>,
}

impl Asset {
    pub const COLUMNS: &'static str =
        "id, name, asset_type, location, description, tin_number, phone_number";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Asset {
            id: r.get(0)?,
            name: r.get(1)?,
            asset_type: parsed_at(r, 2)?,
            location: r.get(3)?,
            description: r.get(4)?,
            tin_number: r.get(5)?,
            phone_number: r.get(6)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub assigned_asset_id: Option<i64>,
    pub is_active: bool,
}

impl User {
    pub const COLUMNS: &'static str =
        "id, username, first_name, last_name, email, role, assigned_asset_id, is_active";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: r.get(0)?,
            username: r.get(1)?,
            first_name: r.get(2)?,
            last_name: r.get(3)?,
            email: r.get(4)?,
            role: parsed_at(r, 5)?,
            assigned_asset_id: r.get(6)?,
            is_active: r.get(7)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    pub asset_id: i64,
    pub title: String,
    pub target_raise_amount: Decimal,
    pub total_shares_offered: i64,
    pub launch_date: NaiveDate,
    pub is_active: bool,
}

impl Deal {
    pub const COLUMNS: &'static str =
        "id, asset_id, title, target_raise_amount, total_shares_offered, launch_date, is_active";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Deal {
            id: r.get(0)?,
            asset_id: r.get(1)?,
            title: r.get(2)?,
            target_raise_amount: decimal_at(r, 3)?,
            total_shares_offered: r.get(4)?,
            launch_date: r.get(5)?,
            is_active: r.get(6)?,
        })
    }

    /// Offering price: target raise spread over the shares offered.
    /// Zero when nothing is offered.
    pub fn price_per_share(&self) -> Decimal {
        if self.total_shares_offered <= 0 || self.target_raise_amount.is_zero() {
            return round_money(Decimal::ZERO);
        }
        round_money(self.target_raise_amount / Decimal::from(self.total_shares_offered))
    }

    /// May be negative: subscriptions beyond the offering are not blocked by default.
    pub fn shares_available(&self, shares_sold: i64) -> i64 {
        self.total_shares_offered - shares_sold
    }

    pub fn percentage_sold(&self, shares_sold: i64) -> f64 {
        if self.total_shares_offered <= 0 {
            return 0.0;
        }
        round_percent(shares_sold as f64 / self.total_shares_offered as f64 * 100.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Valuation {
    pub id: i64,
    pub deal_id: i64,
    pub valuation_date: NaiveDate,
    pub total_valuation: Decimal,
    pub valuation_method: String,
}

impl Valuation {
    pub const COLUMNS: &'static str =
        "id, deal_id, valuation_date, total_valuation, valuation_method";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Valuation {
            id: r.get(0)?,
            deal_id: r.get(1)?,
            valuation_date: r.get(2)?,
            total_valuation: decimal_at(r, 3)?,
            valuation_method: r.get(4)?,
        })
    }
}

/// A cash-flow entry on a deal's ledger. Amounts are stored positive; the
/// type decides the sign when the ledger is summed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub deal_id: i64,
    pub transaction_date: NaiveDateTime,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub sale_id: Option<i64>,
}

impl Transaction {
    pub const COLUMNS: &'static str =
        "id, deal_id, transaction_date, transaction_type, amount, description, sale_id";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: r.get(0)?,
            deal_id: r.get(1)?,
            transaction_date: r.get(2)?,
            transaction_type: parsed_at(r, 3)?,
            amount: decimal_at(r, 4)?,
            description: r.get(5)?,
            sale_id: r.get(6)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub id: i64,
    pub investor_id: i64,
    pub deal_id: i64,
    pub shares_held: i64,
    pub total_cost_basis: Decimal,
}

impl Holding {
    pub const COLUMNS: &'static str = "id, investor_id, deal_id, shares_held, total_cost_basis";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Holding {
            id: r.get(0)?,
            investor_id: r.get(1)?,
            deal_id: r.get(2)?,
            shares_held: r.get(3)?,
            total_cost_basis: decimal_at(r, 4)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub asset_id: i64,
    pub name: String,
}

impl Category {
    pub const COLUMNS: &'static str = "id, asset_id, name";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Category {
            id: r.get(0)?,
            asset_id: r.get(1)?,
            name: r.get(2)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: String,
}

impl Item {
    pub const COLUMNS: &'static str = "id, category_id, name, description";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Item {
            id: r.get(0)?,
            category_id: r.get(1)?,
            name: r.get(2)?,
            description: r.get(3)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    pub item_id: i64,
    pub name: String,
    pub price: Decimal,
}

impl Variant {
    pub const COLUMNS: &'static str = "id, item_id, name, price";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Variant {
            id: r.get(0)?,
            item_id: r.get(1)?,
            name: r.get(2)?,
            price: decimal_at(r, 3)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub deal_id: i64,
    pub cashier_id: i64,
    pub customer_name: Option<String>,
    pub total_amount: Decimal,
    pub created_at: NaiveDateTime,
}

impl Sale {
    pub const COLUMNS: &'static str =
        "id, deal_id, cashier_id, customer_name, total_amount, created_at";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Sale {
            id: r.get(0)?,
            deal_id: r.get(1)?,
            cashier_id: r.get(2)?,
            customer_name: r.get(3)?,
            total_amount: decimal_at(r, 4)?,
            created_at: r.get(5)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub variant_id: i64,
    pub quantity: i64,
    pub price_at_sale: Decimal,
}

impl SaleItem {
    pub const COLUMNS: &'static str = "id, sale_id, variant_id, quantity, price_at_sale";

    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SaleItem {
            id: r.get(0)?,
            sale_id: r.get(1)?,
            variant_id: r.get(2)?,
            quantity: r.get(3)?,
            price_at_sale: decimal_at(r, 4)?,
        })
    }

    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price_at_sale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn deal(target: Decimal, shares: i64) -> Deal {
        Deal {
            id: 1,
            asset_id: 1,
            title: "Series A".into(),
            target_raise_amount: target,
            total_shares_offered: shares,
            launch_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_active: true,
        }
    }

    #[test]
    fn price_per_share_rounds_half_up() {
        assert_eq!(deal(dec!(1000000), 10000).price_per_share(), dec!(100.00));
        assert_eq!(deal(dec!(10), 3).price_per_share(), dec!(3.33));
        assert_eq!(deal(dec!(0.05), 2).price_per_share(), dec!(0.03));
    }

    #[test]
    fn zero_shares_never_divides() {
        let d = deal(dec!(500000), 0);
        assert_eq!(d.price_per_share(), Decimal::ZERO);
        assert_eq!(d.percentage_sold(10), 0.0);
        assert_eq!(d.shares_available(10), -10);
    }

    #[test]
    fn oversold_deal_reports_negative_availability() {
        let d = deal(dec!(1000), 100);
        assert_eq!(d.shares_available(120), -20);
        assert_eq!(d.percentage_sold(120), 120.0);
        assert_eq!(d.percentage_sold(1), 1.0);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("real-estate".parse::<AssetType>().unwrap(), AssetType::RealEstate);
        assert_eq!("cashier".parse::<Role>().unwrap(), Role::Cashier);
        assert_eq!(
            "Distribution".parse::<TransactionType>().unwrap(),
            TransactionType::Distribution
        );
        assert!("refund".parse::<TransactionType>().is_err());
    }
}
