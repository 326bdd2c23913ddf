//! Read-only views of book state.
//!
//! These are plain copies: once taken they no longer borrow the book, so they
//! can be handed to other threads (the sequencer publishes them through a
//! `watch` channel) without holding up matching.

use serde::{Deserialize, Serialize};

use crate::order::{Price, Quantity};

/// Aggregate of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub price: Price,
    /// Total remaining quantity at this price.
    pub quantity: Quantity,
    /// Number of resting orders at this price.
    pub orders: usize,
}

/// Best bid and best ask of a single book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bid: Option<LevelSummary>,
    pub ask: Option<LevelSummary>,
}

impl BookSnapshot {
    pub fn new(bid: Option<LevelSummary>, ask: Option<LevelSummary>) -> Self {
        BookSnapshot { bid, ask }
    }

    pub fn best_bid_price(&self) -> Option<Price> {
        self.bid.map(|level| level.price)
    }

    pub fn best_ask_price(&self) -> Option<Price> {
        self.ask.map(|level| level.price)
    }

    /// Ask minus bid, when both sides are present.
    pub fn spread(&self) -> Option<Price> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => ask.price.checked_sub(bid.price),
            _ => None,
        }
    }

    /// Returns `true` if there is *no* bid and *no* ask.
    pub fn is_empty(&self) -> bool {
        self.bid.is_none() && self.ask.is_none()
    }

    /// Best bid at or above best ask. Never true for a settled book.
    pub fn is_crossed(&self) -> bool {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => bid.price >= ask.price,
            _ => false,
        }
    }
}

/// Several levels per side, best first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Highest price first.
    pub bids: Vec<LevelSummary>,
    /// Lowest price first.
    pub asks: Vec<LevelSummary>,
}

impl DepthSnapshot {
    pub fn top(&self) -> BookSnapshot {
        BookSnapshot::new(self.bids.first().copied(), self.asks.first().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: Price, quantity: Quantity) -> LevelSummary {
        LevelSummary { price, quantity, orders: 1 }
    }

    #[test]
    fn spread_and_crossing() {
        let snap = BookSnapshot::new(Some(level(99, 5)), Some(level(101, 3)));
        assert_eq!(snap.spread(), Some(2));
        assert!(!snap.is_crossed());

        let crossed = BookSnapshot::new(Some(level(101, 5)), Some(level(101, 3)));
        assert!(crossed.is_crossed());
        assert_eq!(crossed.spread(), Some(0));
    }

    #[test]
    fn one_sided_book_has_no_spread() {
        let snap = BookSnapshot::new(None, Some(level(101, 3)));
        assert_eq!(snap.spread(), None);
        assert!(!snap.is_crossed());
        assert!(!snap.is_empty());
        assert!(BookSnapshot::default().is_empty());
    }

    #[test]
    fn depth_top_is_first_levels() {
        let depth = DepthSnapshot {
            bids: vec![level(100, 1), level(99, 2)],
            asks: vec![],
        };
        assert_eq!(depth.top(), BookSnapshot::new(Some(level(100, 1)), None));
    }
}
