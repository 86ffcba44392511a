/*
[INPUT]:  Parsed amount/price pairs from the BBO channel
[OUTPUT]: Order and OrderBookUpdate values
[POS]:    Types layer - consumer-facing model
[UPDATE]: When adding fields to the normalized update
*/

use serde::{Deserialize, Serialize};
use std::fmt;

/// A quantity/price pair on one side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Order {
    pub amount: f64,
    pub price: f64,
}

impl Order {
    pub fn new(amount: f64, price: f64) -> Self {
        Self { amount, price }
    }
}

/// Best offer and best bid for the subscribed pair.
///
/// Values emitted by the reader always satisfy `ask.price > bid.price`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct OrderBookUpdate {
    pub ask: Order,
    pub bid: Order,
}

impl OrderBookUpdate {
    /// Build an update, returning `None` for a crossed or locked market.
    pub fn new(ask: Order, bid: Order) -> Option<Self> {
        if ask.price <= bid.price {
            return None;
        }
        Some(Self { ask, bid })
    }

    pub fn spread(&self) -> f64 {
        self.ask.price - self.bid.price
    }

    pub fn mid_price(&self) -> f64 {
        (self.ask.price + self.bid.price) / 2.0
    }
}

impl fmt::Display for OrderBookUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ask {}@{} bid {}@{}",
            self.ask.amount, self.ask.price, self.bid.amount, self.bid.price
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_rejects_crossed_market() {
        assert!(OrderBookUpdate::new(Order::new(1.0, 9.0), Order::new(1.0, 10.0)).is_none());
    }

    #[test]
    fn test_update_rejects_locked_market() {
        assert!(OrderBookUpdate::new(Order::new(1.0, 10.0), Order::new(2.0, 10.0)).is_none());
    }

    #[test]
    fn test_update_spread_and_mid() {
        let update = OrderBookUpdate::new(Order::new(3.0, 4.0), Order::new(1.0, 2.0))
            .expect("non-crossed market");
        assert_eq!(update.spread(), 2.0);
        assert_eq!(update.mid_price(), 3.0);
        assert_eq!(update.to_string(), "ask 3@4 bid 1@2");
    }

    #[test]
    fn test_update_serializes_with_field_names() {
        let update = OrderBookUpdate::new(Order::new(3.0, 4.0), Order::new(1.0, 2.0))
            .expect("non-crossed market");
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ask": { "amount": 3.0, "price": 4.0 },
                "bid": { "amount": 1.0, "price": 2.0 },
            })
        );
    }
}
