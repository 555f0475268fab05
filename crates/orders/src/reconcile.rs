//! Stock reconciliation for order-status transitions.
//!
//! Stock reflects the demand of non-cancelled orders, so only transitions
//! that cross the `Cancelled` boundary move stock:
//!
//! ```text
//! non-Cancelled -> Cancelled      Restore  (+qty per line)
//! Cancelled     -> non-Cancelled  Deduct   (-qty per line, no floor)
//! anything else                   None
//! ```

use std::collections::BTreeMap;

use storefront_core::ProductId;

use crate::{LineItem, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockMovement {
    /// Give the order's quantities back to the products.
    Restore,
    /// Take the order's quantities from the products again.
    Deduct,
    None,
}

pub fn reconcile(current: &OrderStatus, target: &OrderStatus) -> StockMovement {
    match (current.is_cancelled(), target.is_cancelled()) {
        (false, true) => StockMovement::Restore,
        (true, false) => StockMovement::Deduct,
        _ => StockMovement::None,
    }
}

impl StockMovement {
    /// Signed delta per product. Lines for the same product are merged and
    /// the result is ordered by product id so stores apply it in a stable order.
    pub fn deltas(self, items: &[LineItem]) -> Vec<(ProductId, i64)> {
        let sign = match self {
            StockMovement::Restore => 1,
            StockMovement::Deduct => -1,
            StockMovement::None => return Vec::new(),
        };

        let mut merged: BTreeMap<ProductId, i64> = BTreeMap::new();
        for item in items {
            let delta = merged.entry(item.product_id).or_default();
            *delta = delta.saturating_add(item.quantity.saturating_mul(sign));
        }
        merged.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: ProductId, quantity: i64) -> LineItem {
        LineItem {
            product_id,
            name: "Tee".to_string(),
            category: "Tops".to_string(),
            quantity,
            size: None,
            price: "₹499".to_string(),
        }
    }

    #[test]
    fn transition_table() {
        use OrderStatus as S;
        assert_eq!(reconcile(&S::PENDING, &S::CANCELLED), StockMovement::Restore);
        assert_eq!(reconcile(&S::SHIPPED, &S::CANCELLED), StockMovement::Restore);
        assert_eq!(reconcile(&S::CANCELLED, &S::CANCELLED), StockMovement::None);
        assert_eq!(reconcile(&S::CANCELLED, &S::SHIPPED), StockMovement::Deduct);
        assert_eq!(reconcile(&S::CANCELLED, &S::PENDING), StockMovement::Deduct);
        assert_eq!(reconcile(&S::PENDING, &S::SHIPPED), StockMovement::None);
        assert_eq!(reconcile(&S::SHIPPED, &S::DELIVERED), StockMovement::None);
    }

    #[test]
    fn deltas_merge_repeated_products() {
        let a = ProductId::new();
        let b = ProductId::new();
        let items = vec![line(a, 2), line(b, 1), line(a, 3)];

        let mut restore = StockMovement::Restore.deltas(&items);
        restore.sort();
        let mut expected = vec![(a, 5), (b, 1)];
        expected.sort();
        assert_eq!(restore, expected);

        assert!(StockMovement::None.deltas(&items).is_empty());
    }

    #[test]
    fn huge_quantities_saturate_instead_of_wrapping() {
        let a = ProductId::new();
        let items = vec![line(a, i64::MAX), line(a, 2)];

        assert_eq!(StockMovement::Restore.deltas(&items), vec![(a, i64::MAX)]);
        assert_eq!(StockMovement::Deduct.deltas(&items), vec![(a, i64::MIN)]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn status() -> impl Strategy<Value = OrderStatus> {
            prop_oneof![
                Just(OrderStatus::PENDING),
                Just(OrderStatus::IN_PROGRESS),
                Just(OrderStatus::SHIPPED),
                Just(OrderStatus::DELIVERED),
                Just(OrderStatus::CANCELLED),
                "[A-Za-z ]{1,12}".prop_map(|s| OrderStatus::parse(&s).unwrap_or(OrderStatus::PENDING)),
            ]
        }

        proptest! {
            /// Property: transitions that stay on one side of Cancelled never move stock.
            #[test]
            fn same_side_transitions_are_stock_neutral(from in status(), to in status()) {
                let movement = reconcile(&from, &to);
                if from.is_cancelled() == to.is_cancelled() {
                    prop_assert_eq!(movement, StockMovement::None);
                } else {
                    prop_assert_ne!(movement, StockMovement::None);
                }
            }

            /// Property: cancel followed by un-cancel nets to zero per product.
            #[test]
            fn restore_then_deduct_cancels_out(qtys in proptest::collection::vec(1i64..50, 1..6)) {
                let ids: Vec<ProductId> = (0..3).map(|_| ProductId::new()).collect();
                let items: Vec<LineItem> = qtys
                    .iter()
                    .enumerate()
                    .map(|(i, q)| line(ids[i % ids.len()], *q))
                    .collect();

                let restore = StockMovement::Restore.deltas(&items);
                let deduct = StockMovement::Deduct.deltas(&items);
                prop_assert_eq!(restore.len(), deduct.len());
                for ((pa, da), (pb, db)) in restore.iter().zip(deduct.iter()) {
                    prop_assert_eq!(pa, pb);
                    prop_assert_eq!(da + db, 0);
                }
                let total: i64 = restore.iter().map(|(_, d)| d).sum();
                prop_assert_eq!(total, qtys.iter().sum::<i64>());
            }
        }
    }
}
