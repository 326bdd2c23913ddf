//! Single-instrument order book with price-time priority.
//!
//! - Bids: keyed by price, best = highest.
//! - Asks: keyed by price, best = lowest.
//! - FIFO (time priority) within each price level.
//!
//! Resting orders are owned by an [`OrderArena`] keyed by id; levels store
//! ids only. That makes cancellation a direct lookup instead of a scan over
//! every level, and lets the matching loop mutate an order and its level
//! without aliasing.
//!
//! The book itself does no matching. It offers the primitives the
//! [`MatchingEngine`](crate::MatchingEngine) drives: find the best opposing
//! level, reduce a resting order, pop exhausted heads, drop empty levels,
//! and rest a remainder.

use std::collections::btree_map::{self, BTreeMap};
use std::iter::Rev;

use crate::arena::OrderArena;
use crate::error::EngineError;
use crate::order::{Order, OrderId, Price, Quantity};
use crate::price_level::PriceLevel;
use crate::side::Side;
use crate::top_of_book::{BookSnapshot, DepthSnapshot, LevelSummary};

/// A resting order taken out of the book by cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancelled {
    /// The order as it was removed (`remaining == 0`).
    pub order: Order,
    /// Quantity that was still resting when it was cancelled.
    pub quantity: Quantity,
}

#[derive(Debug, Default, Clone)]
pub struct OrderBook {
    /// Iterated in reverse for best-first.
    bids: BTreeMap<Price, PriceLevel>,

    /// Iterated forwards for best-first.
    asks: BTreeMap<Price, PriceLevel>,

    orders: OrderArena,
}

/// Best-first iteration over either side: asks walk the map forwards, bids
/// walk it in reverse.
enum LevelIter<'a> {
    Fwd(btree_map::Values<'a, Price, PriceLevel>),
    Rev(Rev<btree_map::Values<'a, Price, PriceLevel>>),
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = &'a PriceLevel;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            LevelIter::Fwd(iter) => iter.next(),
            LevelIter::Rev(iter) => iter.next(),
        }
    }
}

impl OrderBook {
    pub fn new() -> Self {
        OrderBook::default()
    }

    fn side_levels(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Levels of `side`, best price first.
    pub fn levels(&self, side: Side) -> impl Iterator<Item = &PriceLevel> + '_ {
        match side {
            Side::Buy => LevelIter::Rev(self.bids.values().rev()),
            Side::Sell => LevelIter::Fwd(self.asks.values()),
        }
    }

    /// Best level on `side` itself.
    pub fn best_level(&self, side: Side) -> Option<&PriceLevel> {
        self.levels(side).next()
    }

    /// Best level on the side an order of `side` would trade against.
    pub fn best_opposing(&self, side: Side) -> Option<&PriceLevel> {
        self.best_level(side.opposite())
    }

    pub fn level(&self, side: Side, price: Price) -> Option<&PriceLevel> {
        self.side_levels(side).get(&price)
    }

    /// Rest a non-exhausted order at the tail of its price level, creating
    /// the level if this is the first order at that price.
    pub fn insert_resting(&mut self, order: Order) -> Result<(), EngineError> {
        if order.is_filled() {
            return Err(EngineError::InvalidQuantity {
                requested: order.quantity(),
                remaining: 0,
            });
        }
        if self.orders.contains(order.id()) {
            return Err(EngineError::DuplicateOrderId(order.id()));
        }

        let levels = match order.side() {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels
            .entry(order.price())
            .or_insert_with(|| PriceLevel::new(order.price()));

        debug_assert!(
            level
                .back()
                .and_then(|tail| self.orders.get(tail))
                .map_or(true, |tail| tail.priority() < order.priority()),
            "resting order {} would jump the queue",
            order.id()
        );

        level.enqueue(&order)?;
        self.orders.insert(order);
        Ok(())
    }

    /// Drop the level at `price` on `side` if it holds no orders.
    pub fn remove_if_empty(&mut self, side: Side, price: Price) -> bool {
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        match levels.get(&price) {
            Some(level) if level.is_empty() => levels.remove(&price).is_some(),
            _ => false,
        }
    }

    /// Apply a fill of `amount` to a resting order.
    pub fn reduce_resting(&mut self, id: OrderId, amount: Quantity) -> Result<(), EngineError> {
        self.orders
            .get_mut(id)
            .ok_or(EngineError::NotFound(id))?
            .reduce(amount)
    }

    /// Pop the head of the level at `price` if it is exhausted, releasing
    /// it from the arena.
    pub fn pop_if_exhausted(&mut self, side: Side, price: Price) -> Option<Order> {
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels.get_mut(&price)?;
        let id = level.pop_if_exhausted(&self.orders)?;
        let order = self.orders.remove(id)?;

        debug_assert!(
            level
                .peek()
                .ok()
                .and_then(|head| self.orders.get(head))
                .map_or(true, |head| order.priority() < head.priority()),
            "order {} left the queue out of priority order",
            order.id()
        );
        Some(order)
    }

    /// Cancel a resting order and take it out of the book.
    pub fn cancel(&mut self, id: OrderId) -> Result<Cancelled, EngineError> {
        let order = self.orders.get_mut(id).ok_or(EngineError::NotFound(id))?;
        let quantity = order.cancel()?;
        let (side, price) = (order.side(), order.price());

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(level) = levels.get_mut(&price) {
            level.remove(id);
        }
        self.remove_if_empty(side, price);

        let order = self.orders.remove(id).ok_or(EngineError::NotFound(id))?;
        Ok(Cancelled { order, quantity })
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.orders.contains(id)
    }

    /// Resting orders of `side` in the exact order they would be matched.
    pub fn resting_orders(&self, side: Side) -> impl Iterator<Item = &Order> + '_ {
        self.levels(side)
            .flat_map(|level| level.iter())
            .filter_map(move |id| self.orders.get(id))
    }

    fn summarize(&self, level: &PriceLevel) -> LevelSummary {
        LevelSummary {
            price: level.price(),
            quantity: level.total_quantity(&self.orders),
            orders: level.len(),
        }
    }

    pub fn best_bid(&self) -> Option<LevelSummary> {
        self.best_level(Side::Buy).map(|level| self.summarize(level))
    }

    pub fn best_ask(&self) -> Option<LevelSummary> {
        self.best_level(Side::Sell).map(|level| self.summarize(level))
    }

    pub fn top_of_book(&self) -> BookSnapshot {
        BookSnapshot::new(self.best_bid(), self.best_ask())
    }

    /// Up to `levels` aggregated levels per side, best first.
    pub fn depth(&self, levels: usize) -> DepthSnapshot {
        let collect = |side: Side| -> Vec<LevelSummary> {
            self.levels(side)
                .take(levels)
                .map(|level| self.summarize(level))
                .collect()
        };
        DepthSnapshot {
            bids: collect(Side::Buy),
            asks: collect(Side::Sell),
        }
    }

    /// Number of resting orders on both sides.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn level_count(&self, side: Side) -> usize {
        self.side_levels(side).len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Best bid at or above best ask. Only ever true mid-match.
    pub fn is_crossed(&self) -> bool {
        match (self.best_level(Side::Buy), self.best_level(Side::Sell)) {
            (Some(bid), Some(ask)) => bid.price() >= ask.price(),
            _ => false,
        }
    }

    /// Remove every resting order.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
    }
}
