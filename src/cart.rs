//! Shopper-side cart.
//!
//! The cart lives in the client until checkout. Prices here are the ones displayed to the
//! shopper; the order service re-prices every line from the catalogue before persisting.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::orders::CartLine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LensSelection {
    pub lens_type: String,
    pub options: Vec<SelectedLensOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SelectedLensOption {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
}

impl LensSelection {
    pub fn surcharge(&self) -> i64 {
        self.options.iter().map(|o| o.price).sum()
    }

    fn same_configuration(&self, other: &LensSelection) -> bool {
        let mut a: Vec<Uuid> = self.options.iter().map(|o| o.id).collect();
        let mut b: Vec<Uuid> = other.options.iter().map(|o| o.id).collect();
        a.sort();
        b.sort();
        self.lens_type == other.lens_type && a == b
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub variant_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub color_name: String,
    pub size: Option<String>,
    pub lens: Option<LensSelection>,
    pub unit_price: i64,
    pub quantity: i32,
}

impl CartItem {
    fn lens_surcharge(&self) -> i64 {
        self.lens.as_ref().map_or(0, LensSelection::surcharge)
    }

    /// A cart line is identified by its variant and lens configuration.
    fn is_line(&self, variant_id: Uuid, lens: Option<&LensSelection>) -> bool {
        if self.variant_id != variant_id {
            return false;
        }
        match (self.lens.as_ref(), lens) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_configuration(b),
            _ => false,
        }
    }

    fn matches(&self, other: &CartItem) -> bool {
        self.is_line(other.variant_id, other.lens.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line, merging quantities with an identical variant + lens configuration.
    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(&item)) {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }
    }

    /// Removes the line with this variant and lens configuration only.
    pub fn remove_item(&mut self, variant_id: Uuid, lens: Option<&LensSelection>) {
        self.items.retain(|i| !i.is_line(variant_id, lens));
    }

    /// Quantities below one are ignored; removal goes through `remove_item`.
    pub fn update_quantity(&mut self, variant_id: Uuid, lens: Option<&LensSelection>, quantity: i32) {
        if quantity < 1 {
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.is_line(variant_id, lens)) {
            item.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> i32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn subtotal(&self) -> i64 {
        self.items
            .iter()
            .map(|i| i.unit_price * i64::from(i.quantity))
            .sum()
    }

    pub fn lens_total(&self) -> i64 {
        self.items
            .iter()
            .map(|i| i.lens_surcharge() * i64::from(i.quantity))
            .sum()
    }

    pub fn total(&self) -> i64 {
        self.subtotal() + self.lens_total()
    }

    pub fn to_order_lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .map(|item| CartLine {
                variant_id: item.variant_id,
                quantity: item.quantity,
                lens_type: item.lens.as_ref().map(|l| l.lens_type.clone()),
                lens_option_ids: item
                    .lens
                    .as_ref()
                    .map(|l| l.options.iter().map(|o| o.id).collect())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(variant_id: Uuid, price: i64, quantity: i32) -> CartItem {
        CartItem {
            variant_id,
            product_id: Uuid::new_v4(),
            product_name: "Monture Lyon".into(),
            color_name: "Écaille".into(),
            size: Some("52".into()),
            lens: None,
            unit_price: price,
            quantity,
        }
    }

    fn anti_glare() -> SelectedLensOption {
        SelectedLensOption {
            id: Uuid::from_u128(7),
            name: "Antireflet".into(),
            price: 4_000,
        }
    }

    #[test]
    fn adding_the_same_variant_merges_quantities() {
        let variant = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(frame(variant, 10_000, 1));
        cart.add_item(frame(variant, 10_000, 2));

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), 30_000);
    }

    #[test]
    fn different_lens_configurations_stay_separate_lines() {
        let variant = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(frame(variant, 10_000, 1));
        let mut with_lens = frame(variant, 10_000, 1);
        with_lens.lens = Some(LensSelection {
            lens_type: "unifocaux".into(),
            options: vec![anti_glare()],
        });
        cart.add_item(with_lens);

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.subtotal(), 20_000);
        assert_eq!(cart.lens_total(), 4_000);
        assert_eq!(cart.total(), 24_000);
    }

    #[test]
    fn quantity_updates_below_one_are_ignored() {
        let variant = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(frame(variant, 6_000, 2));
        cart.update_quantity(variant, None, 0);
        assert_eq!(cart.item_count(), 2);
        cart.update_quantity(variant, None, 4);
        assert_eq!(cart.item_count(), 4);
        cart.remove_item(variant, None);
        assert!(cart.is_empty());
    }

    #[test]
    fn line_edits_leave_other_lens_configurations_alone() {
        let variant = Uuid::new_v4();
        let single_vision = LensSelection {
            lens_type: "unifocaux".into(),
            options: vec![anti_glare()],
        };
        let mut cart = Cart::new();
        cart.add_item(frame(variant, 10_000, 1));
        let mut with_lens = frame(variant, 10_000, 1);
        with_lens.lens = Some(single_vision.clone());
        cart.add_item(with_lens);

        cart.update_quantity(variant, Some(&single_vision), 3);
        assert_eq!(cart.items[0].quantity, 1);
        assert_eq!(cart.items[1].quantity, 3);

        let progressive = LensSelection {
            lens_type: "progressifs".into(),
            options: vec![anti_glare()],
        };
        cart.remove_item(variant, Some(&progressive));
        assert_eq!(cart.items.len(), 2);

        cart.remove_item(variant, None);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].lens.as_ref(), Some(&single_vision));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn order_lines_carry_lens_option_ids() {
        let variant = Uuid::new_v4();
        let mut cart = Cart::new();
        let mut item = frame(variant, 10_000, 1);
        item.lens = Some(LensSelection {
            lens_type: "progressifs".into(),
            options: vec![anti_glare()],
        });
        cart.add_item(item);

        let lines = cart.to_order_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].lens_type.as_deref(), Some("progressifs"));
        assert_eq!(lines[0].lens_option_ids, vec![Uuid::from_u128(7)]);
        cart.clear();
        assert_eq!(cart.total(), 0);
    }
}
