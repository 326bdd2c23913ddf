//! Order representation used inside the book.
//!
//! An [`Order`] has an immutable identity (id, side, kind, price, original
//! quantity, arrival sequence) and one mutable field, the remaining quantity.
//! Remaining quantity only ever goes down: through fills ([`Order::reduce`])
//! or cancellation ([`Order::cancel`]). An order whose remaining quantity is
//! zero is terminal and never stays in the book.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::order_kind::OrderKind;
use crate::side::Side;

/// Price in integer minor units (ticks).
pub type Price = u64;

/// Quantity in whole units.
pub type Quantity = u64;

/// Arrival sequence number; strictly increasing within one book.
pub type Sequence = u64;

/// Order identifier, unique for the lifetime of a book.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite placement key: side, then price advantage, then arrival.
///
/// `a < b` means `a` is matched before `b`. Bids rank higher prices first,
/// asks rank lower prices first, and equal prices fall back to the earlier
/// sequence. Keys of different sides are never competing for the same fill;
/// they are ordered bids-before-asks only to keep the ordering total.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PriorityKey {
    pub side: Side,
    pub price: Price,
    pub sequence: Sequence,
}

impl PriorityKey {
    fn side_rank(side: Side) -> u8 {
        match side {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }
}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_side = Self::side_rank(self.side).cmp(&Self::side_rank(other.side));
        let by_price = match self.side {
            Side::Buy => other.price.cmp(&self.price),
            Side::Sell => self.price.cmp(&other.price),
        };
        by_side
            .then(by_price)
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    id: OrderId,
    side: Side,
    kind: OrderKind,
    price: Price,
    quantity: Quantity,
    remaining: Quantity,
    sequence: Sequence,
}

impl Order {
    /// Construct a freshly submitted order with `remaining == quantity`.
    ///
    /// The caller (normally the engine) owns the id and sequence counters and
    /// must hand out strictly increasing sequences. Nothing is allocated from
    /// those counters here, so a rejected order leaves them untouched.
    pub fn submit(
        id: OrderId,
        sequence: Sequence,
        side: Side,
        kind: OrderKind,
        price: Price,
        quantity: Quantity,
    ) -> Result<Self, EngineError> {
        validate(price, quantity)?;
        Ok(Order {
            id,
            side,
            kind,
            price,
            quantity,
            remaining: quantity,
            sequence,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Original quantity at submission.
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn remaining(&self) -> Quantity {
        self.remaining
    }

    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// Quantity traded or cancelled so far.
    pub fn filled_quantity(&self) -> Quantity {
        self.quantity - self.remaining
    }

    /// Returns `true` once nothing remains (filled or cancelled).
    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    pub fn priority(&self) -> PriorityKey {
        PriorityKey {
            side: self.side,
            price: self.price,
            sequence: self.sequence,
        }
    }

    /// Whether this order may trade against a resting level at `level_price`.
    pub fn crosses(&self, level_price: Price) -> bool {
        match self.kind {
            OrderKind::Limit => match self.side {
                Side::Buy => level_price <= self.price,
                Side::Sell => level_price >= self.price,
            },
        }
    }

    /// Reduce the remaining quantity by exactly `amount`.
    pub fn reduce(&mut self, amount: Quantity) -> Result<(), EngineError> {
        if amount == 0 || amount > self.remaining {
            return Err(EngineError::InvalidQuantity {
                requested: amount,
                remaining: self.remaining,
            });
        }
        self.remaining -= amount;
        Ok(())
    }

    /// Force the remaining quantity to zero, returning what was cancelled.
    pub fn cancel(&mut self) -> Result<Quantity, EngineError> {
        if self.remaining == 0 {
            return Err(EngineError::AlreadyFilled(self.id));
        }
        let cancelled = self.remaining;
        self.remaining = 0;
        Ok(cancelled)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}/{}@{} #{}",
            self.id, self.side, self.kind, self.remaining, self.quantity, self.price, self.sequence
        )
    }
}

/// Submission-time checks shared by [`Order::submit`] and the engine.
pub fn validate(price: Price, quantity: Quantity) -> Result<(), EngineError> {
    if price == 0 {
        return Err(EngineError::InvalidPrice(price));
    }
    if quantity == 0 {
        return Err(EngineError::InvalidQuantity {
            requested: quantity,
            remaining: 0,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(id: u64, seq: u64, side: Side, price: Price, qty: Quantity) -> Order {
        Order::submit(OrderId(id), seq, side, OrderKind::Limit, price, qty).unwrap()
    }

    #[test]
    fn submit_starts_with_full_remaining() {
        let order = limit(1, 1, Side::Buy, 100, 10);
        assert_eq!(order.remaining(), 10);
        assert_eq!(order.quantity(), 10);
        assert_eq!(order.filled_quantity(), 0);
        assert!(!order.is_filled());
    }

    #[test]
    fn submit_rejects_zero_price_and_quantity() {
        let zero_price = Order::submit(OrderId(1), 1, Side::Buy, OrderKind::Limit, 0, 10);
        assert_eq!(zero_price, Err(EngineError::InvalidPrice(0)));

        let zero_qty = Order::submit(OrderId(1), 1, Side::Sell, OrderKind::Limit, 100, 0);
        assert!(matches!(zero_qty, Err(EngineError::InvalidQuantity { .. })));
    }

    #[test]
    fn reduce_is_exact_and_bounded() {
        let mut order = limit(1, 1, Side::Sell, 100, 5);
        order.reduce(3).unwrap();
        assert_eq!(order.remaining(), 2);

        assert_eq!(
            order.reduce(3),
            Err(EngineError::InvalidQuantity { requested: 3, remaining: 2 })
        );
        assert!(order.reduce(0).is_err());
        assert_eq!(order.remaining(), 2);

        order.reduce(2).unwrap();
        assert!(order.is_filled());
    }

    #[test]
    fn cancel_twice_fails() {
        let mut order = limit(7, 1, Side::Buy, 100, 5);
        order.reduce(1).unwrap();
        assert_eq!(order.cancel(), Ok(4));
        assert_eq!(order.cancel(), Err(EngineError::AlreadyFilled(OrderId(7))));
    }

    #[test]
    fn limit_crossing_rules() {
        let buy = limit(1, 1, Side::Buy, 100, 1);
        assert!(buy.crosses(99));
        assert!(buy.crosses(100));
        assert!(!buy.crosses(101));

        let sell = limit(2, 2, Side::Sell, 100, 1);
        assert!(sell.crosses(101));
        assert!(sell.crosses(100));
        assert!(!sell.crosses(99));
    }

    #[test]
    fn priority_prefers_price_then_sequence() {
        let bid_hi = limit(1, 5, Side::Buy, 101, 1).priority();
        let bid_lo_early = limit(2, 1, Side::Buy, 100, 1).priority();
        let bid_lo_late = limit(3, 9, Side::Buy, 100, 1).priority();
        assert!(bid_hi < bid_lo_early);
        assert!(bid_lo_early < bid_lo_late);

        let ask_lo = limit(4, 8, Side::Sell, 99, 1).priority();
        let ask_hi = limit(5, 2, Side::Sell, 100, 1).priority();
        assert!(ask_lo < ask_hi);
    }

    #[test]
    fn display_is_compact() {
        let mut order = limit(42, 3, Side::Sell, 250, 8);
        order.reduce(2).unwrap();
        assert_eq!(order.to_string(), "42 S LO 6/8@250 #3");
    }
}
