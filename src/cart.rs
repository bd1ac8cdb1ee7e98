// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{CoreError, CoreResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_id: i64,
    pub display_name: String,
    /// Variant price as of the latest add.
    pub unit_price: Decimal,
    pub quantity: i64,
}

impl CartLine {
    pub fn line_total(&self) -> CoreResult<Decimal> {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| overflow(&self.display_name))
    }
}

fn overflow(what: &str) -> CoreError {
    CoreError::validation(format!("amount for '{}' is too large", what))
}

/// Point-of-sale cart, bound to the deal whose ledger the sale will hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub deal_id: Option<i64>,
    lines: BTreeMap<i64, CartLine>,
}

impl Cart {
    pub fn for_deal(deal_id: i64) -> Self {
        Cart {
            deal_id: Some(deal_id),
            lines: BTreeMap::new(),
        }
    }

    /// Bind an empty cart to `deal_id`; a non-empty cart must already belong to it.
    pub fn bind(&mut self, deal_id: i64) -> CoreResult<()> {
        match self.deal_id {
            Some(bound) if bound != deal_id && !self.is_empty() => {
                Err(CoreError::validation(format!(
                    "cart already holds items for deal #{}; check out or clear it first",
                    bound
                )))
            }
            _ => {
                self.deal_id = Some(deal_id);
                Ok(())
            }
        }
    }

    /// Returns the new quantity of the line. Every add re-prices the whole
    /// line at `unit_price`.
    pub fn add(&mut self, variant_id: i64, display_name: &str, unit_price: Decimal) -> i64 {
        let line = self.lines.entry(variant_id).or_insert_with(|| CartLine {
            variant_id,
            display_name: display_name.to_string(),
            unit_price,
            quantity: 0,
        });
        line.unit_price = unit_price;
        line.quantity = line.quantity.saturating_add(1);
        line.quantity
    }

    pub fn remove(&mut self, variant_id: i64) -> Option<CartLine> {
        self.lines.remove(&variant_id)
    }

    pub fn total(&self) -> CoreResult<Decimal> {
        let mut total = Decimal::ZERO;
        for line in self.lines.values() {
            total = total
                .checked_add(line.line_total()?)
                .ok_or_else(|| overflow("cart total"))?;
        }
        Ok(total)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }
}
